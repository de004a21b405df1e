pub mod json;
pub mod srt;
pub mod time;
pub mod tsv;
pub mod txt;
