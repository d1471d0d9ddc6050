//! Error types for the EPOC record codecs.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("out of memory")]
    OutOfMemory,

    #[error("parse error: {0}")]
    Parse(String),

    #[error("generate error: {0}")]
    Generate(String),

    #[error("{0}")]
    Other(String),

    #[error("I/O error: {0}")]
    Io(io::Error),
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => Error::Parse("unexpected end of data".to_owned()),
            io::ErrorKind::InvalidData => Error::Parse(err.to_string()),
            io::ErrorKind::InvalidInput => Error::Generate(err.to_string()),
            io::ErrorKind::OutOfMemory => Error::OutOfMemory,
            _ => Error::Io(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_mapping() {
        let eof = io::Error::from(io::ErrorKind::UnexpectedEof);
        assert!(matches!(Error::from(eof), Error::Parse(_)));

        let oom = io::Error::from(io::ErrorKind::OutOfMemory);
        assert!(matches!(Error::from(oom), Error::OutOfMemory));

        let input = io::Error::new(io::ErrorKind::InvalidInput, "too large");
        assert!(matches!(Error::from(input), Error::Generate(_)));

        let other = io::Error::from(io::ErrorKind::PermissionDenied);
        assert!(matches!(Error::from(other), Error::Io(_)));
    }
}
