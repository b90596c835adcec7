pub mod extract;
pub mod sniff;

pub use extract::{extract_manager_zip, extract_zip, locate_seven_zip, Extractor};
pub use sniff::{classify, ArchiveKind};
