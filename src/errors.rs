use thiserror::Error;

/// Failures of the cross-process memory channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("access denied opening process {pid}")]
    AccessDenied { pid: u32 },
    #[error("process {pid} not found")]
    ProcessNotFound { pid: u32 },
    #[error("failed to open process {pid}: {reason}")]
    OpenFailed { pid: u32, reason: String },
    #[error("failed to allocate {size} bytes in the foreign process")]
    AllocationFailed { size: usize },
    #[error("foreign memory transfer at {address:#x} moved {actual} of {expected} bytes")]
    TransferFailed {
        address: usize,
        expected: usize,
        actual: usize,
    },
    #[error("failed to release foreign buffer at {address:#x}")]
    ReleaseFailed { address: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("item text is not valid UTF-16")]
pub struct DecodeError;

/// Operation-level failures. Only these abort a scan or restore.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("desktop icon list control not found")]
    LocatorNotFound,
    #[error("icon list control is no longer valid")]
    ControlUnavailable,
    #[error("could not open the shell process: {0}")]
    ProcessOpenFailed(#[source] ChannelError),
    #[error("could not stage buffers in the shell process: {0}")]
    StagingFailed(#[source] ChannelError),
}
