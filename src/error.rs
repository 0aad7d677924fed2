// Crate error type. Every variant states *where* things went wrong.
// Not-ready geometry is never an error; it shows up as `None` instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("window init error: {0}")]
    WindowInit(String),
    #[error("window update error: {0}")]
    WindowUpdate(String),
    #[error("camera init error: {0}")]
    CameraInit(String),
    #[error("camera frame error: {0}")]
    CameraFrame(String),
    #[error("export error: {0}")]
    Export(String),
    #[error("config error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
