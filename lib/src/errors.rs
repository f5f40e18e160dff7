use std::result::Result as StdResult;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScreenError {
    #[error("failed to load/read/write file: {0:?}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse the fasta/fastq file: {0}")]
    SequenceParse(#[from] needletail::errors::ParseError),
    #[error("json error: {0:?}")]
    Json(#[from] serde_json::Error),
    #[error("failed to parse as integer")]
    IntError(#[from] core::num::ParseIntError),
    #[error("did not find sequence records in mixture inputs")]
    EmptyInput,
    #[error("screen error: {0}")]
    Message(String),
}

pub type ScreenResult<T> = StdResult<T, ScreenError>;

#[doc(hidden)]
#[macro_export]
macro_rules! bail {
    ($e:expr) => {
        return Err($crate::errors::ScreenError::Message($e.to_owned()));
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::errors::ScreenError::Message(format!($fmt, $($arg)*)))
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! format_err {
    ($($arg:tt)*) => { $crate::errors::ScreenError::Message(format!($($arg)*)) }
}
