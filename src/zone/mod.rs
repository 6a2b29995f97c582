pub mod detect;
pub mod resolver;
pub mod table;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ZoneError {
    #[error("invalid UTC offset '{0}', expected [+|-]H[:MM]")]
    InvalidOffset(String),
    #[error("cannot find a GMT offset in date representation '{0}'")]
    InvalidDateRepr(String),
    #[error("timezone index {index} out of range for {len} entries")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("unknown IANA timezone '{0}'")]
    UnknownIanaZone(String),
    #[error("unknown timezone '{0}'")]
    UnknownZone(String),
}
