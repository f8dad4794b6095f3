use std::fmt::Display;

use error_stack::Context;

/// Failure classes surfaced to callers of the rental services.
///
/// Everything except `Internal` maps one-to-one onto a response the transport
/// layer can translate; `Internal` is the residual class for driver failures.
#[derive(Debug)]
pub enum KernelError {
    NotFound,
    InvalidState,
    InvalidArgument,
    Conflict,
    Unavailable,
    Internal,
}

impl Display for KernelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KernelError::NotFound => write!(f, "Entity not found"),
            KernelError::InvalidState => write!(f, "Entity is not in a valid state for this operation"),
            KernelError::InvalidArgument => write!(f, "Invalid argument"),
            KernelError::Conflict => write!(f, "Operation conflicts with current entity state"),
            KernelError::Unavailable => write!(f, "Backing store is unavailable"),
            KernelError::Internal => write!(f, "Internal kernel error"),
        }
    }
}

impl Context for KernelError {}
