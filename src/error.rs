use thiserror::Error;

/// Failures raised by the timing core.
///
/// Record-level variants (`Unresolvable`, `EmptyAfterCleaning`,
/// `DegenerateSpan`) only ever drop the offending record. `NoUsableRecords`
/// and `InvalidConfig` are terminal for the batch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimingError {
    #[error("no usable start/end time fields in record")]
    Unresolvable,

    #[error("record text is empty after cleaning")]
    EmptyAfterCleaning,

    #[error("record span is degenerate: start={start}, end={end}")]
    DegenerateSpan { start: f64, end: f64 },

    #[error("no usable timing records in payload")]
    NoUsableRecords,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
