pub mod codec;
pub mod command;
pub mod response;
pub mod transport;

#[cfg(test)]
pub mod fake;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtoError {
    #[error("I/O error: {:?}", _0)]
    Io(#[from] std::io::Error),

    #[error("Serial I/O error: {:?}", _0)]
    Serial(#[from] tokio_serial::Error),

    #[error("Connection was closed")]
    Closed,

    #[error("Failed to find XDM1000 with serial suffix {}", .0.as_deref().unwrap_or("(any)"))]
    InstrumentNotFound(Option<String>),

    #[error("Unknown {} token: {:?}", kind, value)]
    UnrecognizedToken { value: String, kind: &'static str },

    #[error("Empty response during measurement (MEAS?)")]
    EmptyResponse,

    #[error("Non-numeric MEAS? response: {:?}", _0)]
    NonNumericResponse(String),
}

pub type Result<T> = std::result::Result<T, ProtoError>;
