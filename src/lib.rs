/// Object identity and capability casting.
pub mod object;

/// Operating system module: windows, window events and their backends.
pub mod os;

/// Keyboard and mouse state kept in sync with window events.
pub mod input;

/// Graphics module: device contexts, buffers and formats.
pub mod gfx;

/// JSON configuration for windows and rendering backends.
pub mod config;

/// Use bitmask for flags
#[macro_use]
extern crate bitflags;

pub use object::{cast, cast_to, try_cast, Cast, CastExt, ClassId, Object, ObjectId, StaticClass};

/// Process wide result codes, every `Error` carries one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ResultCode {
    Success = 0,
    UnknownError,
    InvalidParam,
    InvalidCast,
    SystemError,
    AllocationError,
    Uninitialized,
}

/// Errors carry a code for programmatic handling and a message for humans.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("blaze error ({code:?}): {msg}")]
pub struct Error {
    pub code: ResultCode,
    pub msg: String,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn new(code: ResultCode, msg: impl Into<String>) -> Self {
        Error {
            code,
            msg: msg.into(),
        }
    }

    pub fn unknown(msg: impl Into<String>) -> Self {
        Self::new(ResultCode::UnknownError, msg)
    }

    pub fn invalid_param(msg: impl Into<String>) -> Self {
        Self::new(ResultCode::InvalidParam, msg)
    }

    pub fn invalid_cast(msg: impl Into<String>) -> Self {
        Self::new(ResultCode::InvalidCast, msg)
    }

    pub fn system(msg: impl Into<String>) -> Self {
        Self::new(ResultCode::SystemError, msg)
    }

    pub fn allocation(msg: impl Into<String>) -> Self {
        Self::new(ResultCode::AllocationError, msg)
    }

    pub fn uninitialized(msg: impl Into<String>) -> Self {
        Self::new(ResultCode::Uninitialized, msg)
    }

    pub fn code(&self) -> ResultCode {
        self.code
    }
}

/// Collapses a result into its code, `Ok` maps to `ResultCode::Success`
pub fn result_code<T>(result: &Result<T>) -> ResultCode {
    match result {
        Ok(_) => ResultCode::Success,
        Err(err) => err.code,
    }
}

// conversion for windows-rs win32 errors
#[cfg(target_os = "windows")]
impl From<windows::core::Error> for Error {
    fn from(err: windows::core::Error) -> Error {
        Error::system(err.to_string())
    }
}

// std errors
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::unknown(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error::invalid_param(err.to_string())
    }
}

impl From<libloading::Error> for Error {
    fn from(err: libloading::Error) -> Error {
        Error::unknown(err.to_string())
    }
}
