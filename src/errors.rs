use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    IO(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("could not fetch dashboard page: {0}")]
    Fetch(String),
    #[error("could not connect to InfluxDB: {0}")]
    StorageConnect(String),
    #[error("could not write to InfluxDB: {0}")]
    StorageWrite(String),
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self { AppError::IO(format!("{}", e)) }
}

/// Why a single "last heard" row was dropped. Never escalates past the row.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowRejected {
    #[error("expected 8 columns, got {0}")]
    ColumnCount(usize),
    #[error("transmission still in progress")]
    InProgress,
    #[error("bad timestamp '{0}'")]
    Timestamp(String),
    #[error("{field}: not a number '{text}'")]
    Number { field: &'static str, text: String },
    #[error("{field}: out of range '{text}'")]
    OutOfRange { field: &'static str, text: String },
}
