//! Error types for the µDCN implementation.

use thiserror::Error;

/// All possible errors that can occur within the µDCN implementation.
#[derive(Error, Debug)]
pub enum Error {
    /// A name failed to parse: too long, too many components, or empty.
    #[error("name error: {0}")]
    Name(String),

    /// Malformed ICN wire packet (short header, bad TLV, unknown type).
    #[error("wire format error: {0}")]
    Wire(String),

    /// A FIB-update control command failed to parse or apply.
    #[error("control command error: {0}")]
    Control(String),

    /// A control command named a VERB other than `ADD`/`DEL`. Kept
    /// distinct from [`Error::Control`] so callers can ignore it silently
    /// instead of logging a warning, per the control plane's unknown-verb
    /// handling.
    #[error("unknown control verb: {0}")]
    UnknownVerb(String),

    /// Router configuration failed to load.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors.
    #[error("other error: {0}")]
    Other(String),
}
