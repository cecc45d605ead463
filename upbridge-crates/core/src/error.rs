use thiserror::Error;

use crate::handles::Handle;

/// Contract violations at the user-propagator boundary.
///
/// These indicate a usage bug in the integrating code and are reported immediately; they are
/// never transient. An engine declining a consequence or a decision override is not an error and
/// is reported as `false` instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// The handle was never allocated, has been released, or refers to an object of another kind.
    #[error("{0} does not refer to a live object of the expected kind")]
    InvalidHandle(Handle),
    /// A protocol operation was used outside the callback it requires, or a lifecycle operation
    /// was attempted while the owning engine context is mid-search.
    #[error("illegal state: {0}")]
    IllegalState(&'static str),
    /// A term of an unsupported sort, or a malformed premise or consequence.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
