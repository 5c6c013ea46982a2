//! Field delimiter detection from a leading byte sample.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::IngestError;

/// Number of leading bytes inspected when sniffing
pub const SAMPLE_BYTES: usize = 4096;

/// Candidate delimiters in preference order
pub const CANDIDATES: &[u8] = b",\t;|:";

/// Read up to [`SAMPLE_BYTES`] from the start of a file and sniff it
pub fn detect_file_delimiter(path: &Path) -> Result<u8, IngestError> {
    let file = File::open(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut sample = Vec::with_capacity(SAMPLE_BYTES);
    file.take(SAMPLE_BYTES as u64)
        .read_to_end(&mut sample)
        .map_err(|source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let truncated = sample.len() == SAMPLE_BYTES;
    detect_delimiter(&sample, truncated)
}

/// Infer the delimiter of a sample.
///
/// A candidate qualifies when it appears the same non-zero number of times
/// (outside double quotes) on every non-empty line. When `truncated` is set
/// the last line is assumed partial and ignored, unless it is the only one.
pub fn detect_delimiter(sample: &[u8], truncated: bool) -> Result<u8, IngestError> {
    let text = String::from_utf8_lossy(sample);
    let mut lines: Vec<&str> = text
        .lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.trim().is_empty())
        .collect();

    if truncated && lines.len() > 1 {
        lines.pop();
    }

    if lines.is_empty() {
        return Err(IngestError::DelimiterDetection(
            "sample contains no lines".to_string(),
        ));
    }

    for &candidate in CANDIDATES {
        let first = count_unquoted(lines[0], candidate);
        if first == 0 {
            continue;
        }
        if lines.iter().all(|line| count_unquoted(line, candidate) == first) {
            tracing::debug!(
                "Detected delimiter {:?} ({} per line over {} lines)",
                candidate as char,
                first,
                lines.len()
            );
            return Ok(candidate);
        }
    }

    Err(IngestError::DelimiterDetection(format!(
        "no consistent delimiter among {:?} in {} sampled lines",
        CANDIDATES.iter().map(|&c| c as char).collect::<String>(),
        lines.len()
    )))
}

/// Count occurrences of `delimiter` that are not inside a quoted field
fn count_unquoted(line: &str, delimiter: u8) -> usize {
    let mut in_quotes = false;
    let mut count = 0;
    for byte in line.bytes() {
        if byte == b'"' {
            in_quotes = !in_quotes;
        } else if byte == delimiter && !in_quotes {
            count += 1;
        }
    }
    count
}
