//! Error types and handling for Framelink

/// Result type alias for Framelink operations
pub type Result<T> = std::result::Result<T, FramelinkError>;

/// Error types for the Framelink buffer transport
///
/// All variants are local, recoverable failures returned to the immediate
/// caller. No component retries internally and none of these should
/// terminate the process. Unknown codec or pixel-format identifiers are not
/// errors at all; lookups return `Option::None` instead.
#[derive(Debug, thiserror::Error)]
pub enum FramelinkError {
    /// OS shared-memory object creation, truncation or mapping failure
    #[error("Resource error: {message}")]
    Resource {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Reader-mode attach to a nonexistent or already-removed segment
    #[error("Attach failed: {message}")]
    Attach { message: String },

    /// Malformed binary input (lacing buffers, plane payloads)
    #[error("Format error: {message}")]
    Format { message: String },

    /// Operation called on a frame or packet in the wrong lifecycle state
    #[error("Invalid state: {message}")]
    InvalidState { message: String },

    /// Invalid parameters or configuration
    #[error("Invalid parameter: {parameter} - {message}")]
    InvalidParameter { parameter: String, message: String },
}

impl FramelinkError {
    /// Create a resource error without an OS error source
    pub fn resource(message: impl Into<String>) -> Self {
        Self::Resource {
            message: message.into(),
            source: None,
        }
    }

    /// Create a resource error from a failed OS call
    pub fn resource_os(context: &str, errno: nix::errno::Errno) -> Self {
        Self::Resource {
            message: format!("{}: {}", context, errno.desc()),
            source: Some(std::io::Error::from_raw_os_error(errno as i32)),
        }
    }

    /// Create a resource error from a standard I/O error
    pub fn from_io(source: std::io::Error, context: &str) -> Self {
        Self::Resource {
            message: format!("{}: {}", context, source),
            source: Some(source),
        }
    }

    /// Create an attach error
    pub fn attach(message: impl Into<String>) -> Self {
        Self::Attach {
            message: message.into(),
        }
    }

    /// Create a format error
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    /// Create an invalid state error
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for FramelinkError {
    fn from(err: std::io::Error) -> Self {
        Self::from_io(err, "I/O operation failed")
    }
}
