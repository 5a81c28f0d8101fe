// Crate-wide error type. Every variant states *where* things went wrong so a
// log line is enough to locate the failing stage.

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

    #[error("segmentation error: {0}")]
    Segmentation(String),

    #[error("buffer size mismatch: {0}")]
    SizeMismatch(String),

    #[error("snapshot error: {0}")]
    Snapshot(String),
}
