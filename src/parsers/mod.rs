pub mod delimiter;
pub mod obd;
pub mod types;

pub use delimiter::{detect_delimiter, detect_file_delimiter};
pub use obd::ObdCsv;
pub use types::{LogTable, Parseable, RawRecord};
