//! # Error Definitions
//!
//! The engine-level error and its coarse classification. Hosts match on
//! [`ErrorKind`] to tell bad input apart from a broken handler.

use crate::invoke::UserCodeError;

/// Coarse classification of an invocation failure.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ErrorKind {
    /// The handler identifier is malformed.
    InvalidDescriptor,
    /// No overload survived selection.
    NotFound,
    /// Every declared overload is malformed.
    InvalidShape,
    /// The payload does not fit the selected overload.
    TypeMismatch,
    /// The handler itself failed.
    UserCode,
    /// The handler returned a value of another type than it declared.
    ReturnType,
    /// The returned value could not be encoded.
    Encode,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::InvalidDescriptor => "invalid-descriptor",
            Self::NotFound => "not-found",
            Self::InvalidShape => "invalid-shape",
            Self::TypeMismatch => "type-mismatch",
            Self::UserCode => "user-code",
            Self::ReturnType => "return-type",
            Self::Encode => "encode",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug)]
pub enum Error {
    Descriptor(crate::descriptor::Error),
    Resolution(crate::select::Error),
    Decode(crate::decode::Error),
    UserCode(UserCodeError),
    Encode(crate::encode::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Descriptor(_) => ErrorKind::InvalidDescriptor,
            Self::Resolution(crate::select::Error::NotFound { .. }) => ErrorKind::NotFound,
            Self::Resolution(crate::select::Error::InvalidShape { .. }) => ErrorKind::InvalidShape,
            Self::Decode(crate::decode::Error::TypeMismatch { .. }) => ErrorKind::TypeMismatch,
            Self::UserCode(_) => ErrorKind::UserCode,
            Self::Encode(crate::encode::Error::ReturnMismatch { .. }) => ErrorKind::ReturnType,
            Self::Encode(crate::encode::Error::Codec(_)) => ErrorKind::Encode,
        }
    }

    /// Whether the failure happened before any user code ran.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Descriptor(_) | Self::Resolution(_) | Self::Decode(_))
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Descriptor(e) => write!(f, "Descriptor error: {}", e),
            Self::Resolution(e) => write!(f, "Resolution error: {}", e),
            Self::Decode(e) => write!(f, "Decode error: {}", e),
            Self::UserCode(e) => write!(f, "User code error: {}", e),
            Self::Encode(e) => write!(f, "Encode error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Descriptor(e) => Some(e),
            Self::Resolution(e) => Some(e),
            Self::Decode(e) => Some(e),
            Self::UserCode(e) => Some(e),
            Self::Encode(e) => Some(e),
        }
    }
}

impl From<crate::descriptor::Error> for Error {
    fn from(e: crate::descriptor::Error) -> Self {
        Self::Descriptor(e)
    }
}

impl From<crate::select::Error> for Error {
    fn from(e: crate::select::Error) -> Self {
        Self::Resolution(e)
    }
}

impl From<crate::decode::Error> for Error {
    fn from(e: crate::decode::Error) -> Self {
        Self::Decode(e)
    }
}

impl From<UserCodeError> for Error {
    fn from(e: UserCodeError) -> Self {
        Self::UserCode(e)
    }
}

impl From<crate::encode::Error> for Error {
    fn from(e: crate::encode::Error) -> Self {
        Self::Encode(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
