//! Error types for the Dreambox video backend

use crate::host::WindowId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("dreambox hardware not detected")]
    Unavailable,

    #[error("EGL error: {0}")]
    Egl(String),

    #[error("can't find any configuration for OpenGL ES")]
    NoMatchingConfiguration,

    #[error("OpenGL ES context does not belong to this window")]
    ContextMismatch,

    #[error("OpenGL ES surface is not initialized for this window")]
    NoSurface,

    #[error("OpenGL ES context is not initialized for this window")]
    NoContext,

    #[error("unknown window {0:?}")]
    UnknownWindow(WindowId),

    #[error("window {0:?} already exists")]
    WindowExists(WindowId),

    #[error("window {0:?} was not created with OpenGL ES support")]
    NotOpenGl(WindowId),

    #[error("operation not supported: {0}")]
    Unsupported(&'static str),

    #[error("GL library error: {0}")]
    Library(String),

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("application not compiled with host version {major}.{minor}")]
    VersionMismatch { major: u8, minor: u8 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for an EGL failure of the named call
    pub(crate) fn egl(call: &str, err: impl std::fmt::Display) -> Self {
        Error::Egl(format!("{}: {}", call, err))
    }
}
