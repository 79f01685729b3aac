//! Error type and Return values used by the packed Serializer.

use serde::ser;
use thiserror::Error;

/// Represents all possible errors that can happen during Serialization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The value contains a type that has no packed Solidity representation.
    ///
    /// For example floating point numbers, options, enums and maps. Enums can
    /// be written with [serde_repr](https://github.com/dtolnay/serde-repr) or a
    /// custom serialize method if they are really needed.
    #[error("type is not representable in packed encoding: {0}")]
    TypeNotRepresentable(&'static str),
    /// Representable in Solidity, but not implemented by the Serializer.
    /// Currently only dynamic arrays, whose elements are padded to 32 bytes
    /// even in packed mode.
    #[error("type is not yet implemented: {0}")]
    TypeNotYetSupported(&'static str),
    /// Raised by a `Serialize` implementation through [ser::Error::custom].
    #[error("{0}")]
    Custom(String),
}

impl ser::Error for Error {
    fn custom<T>(msg: T) -> Self
    where
        T: core::fmt::Display,
    {
        Error::Custom(msg.to_string())
    }
}

/// Alias for `Result` using the [Error] returned by the Serializer.
pub type Result<T> = core::result::Result<T, Error>;
