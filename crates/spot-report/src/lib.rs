/// Spot report messaging library.
///
/// A [`model::SpotReport`] is serialized into a Geomessage XML document by
/// [`sender::SpotReportSender`], which hands the bytes to a [`transport::MessageSink`].
/// Grid-reference conversion is delegated to a [`coord::GridReference`] implementation
/// supplied by the caller.
use std::sync::Once;

use thiserror::Error;

pub mod config;
pub mod coord;
pub mod model;
pub mod protocol;
pub mod sender;
pub mod time;
pub mod transport;

/// Result type for this library
pub type SRResult<T> = std::result::Result<T, Error>;

/// Error type for this library
#[derive(Debug, Error)]
pub enum Error {
    #[error("XML error: {0}")]
    Xml(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Invalid coordinate: {0}")]
    InvalidCoord(String),
    #[error("Config error: {0}")]
    Config(String),
}

impl From<nom::error::Error<&str>> for Error {
    fn from(err: nom::error::Error<&str>) -> Self {
        Error::ParseError(format!("{:?}", err))
    }
}

/// Test binary helper to init tracing. This is usually the responsibility of the consumer of the
/// library crate.
pub fn lazy_init_tracing() {
    {
        static INIT: Once = Once::new();
        &INIT
    }
    .call_once(|| {
        tracing_subscriber::fmt::init();
    });
}
