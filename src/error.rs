//! Error type for table operations.

use crate::Id;
use core::fmt;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// The requested bin count is zero or not a power of two.
    BinCountNotPowerOfTwo(usize),
    /// No live item has this id: it was never issued or was already removed.
    UnknownId(Id),
    /// The handle's item was already removed.
    StaleHandle,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BinCountNotPowerOfTwo(n) => {
                write!(f, "bin count must be a power of two, got {n}")
            }
            Error::UnknownId(id) => write!(f, "no live item with id {id}"),
            Error::StaleHandle => f.write_str("handle refers to a removed item"),
        }
    }
}

impl std::error::Error for Error {}
