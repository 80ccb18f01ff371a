use std::process::ExitStatus;

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of [`Error`], stable across variants that carry
/// different payloads for the same class of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    UnknownReference,
    UnknownProcessNode,
    InvalidState,
    ExternalToolFailure,
    Io,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("can not connect system `{id}` to itself")]
    SelfConnection { id: String },

    #[error("a system named `{id}` already exists")]
    DuplicateIdentifier { id: String },

    #[error("{context} references `{id}` but no system with that name exists")]
    UnknownReference { id: String, context: String },

    #[error("process includes a node named `{id}` but no system or input/output with that name exists")]
    UnknownProcessNode { id: String },

    #[error("invalid diagram: {message}")]
    InvalidState { message: String },

    #[error("`{command}` failed ({status})")]
    ExternalTool { command: String, status: ToolStatus },

    #[error("invalid diagram description: {message}")]
    Description { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// How an external tool invocation ended.
#[derive(Debug)]
pub enum ToolStatus {
    /// The process could not be started at all.
    Spawn(std::io::Error),
    Exit(ExitStatus),
}

impl std::fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolStatus::Spawn(err) => write!(f, "could not start: {err}"),
            ToolStatus::Exit(status) => write!(f, "{status}"),
        }
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidArgument { .. }
            | Error::SelfConnection { .. }
            | Error::DuplicateIdentifier { .. }
            | Error::Description { .. } => ErrorKind::InvalidArgument,
            Error::UnknownReference { .. } => ErrorKind::UnknownReference,
            Error::UnknownProcessNode { .. } => ErrorKind::UnknownProcessNode,
            Error::InvalidState { .. } => ErrorKind::InvalidState,
            Error::ExternalTool { .. } => ErrorKind::ExternalToolFailure,
            Error::Io(_) | Error::Json(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument {
            message: message.into(),
        }
    }

    pub(crate) fn unknown_reference(id: &str, context: impl Into<String>) -> Self {
        Error::UnknownReference {
            id: id.to_string(),
            context: context.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_connection_is_an_invalid_argument() {
        let err = Error::SelfConnection { id: "D1".into() };
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(err.to_string(), "can not connect system `D1` to itself");
    }

    #[test]
    fn unknown_reference_names_context() {
        let err = Error::unknown_reference("ghost", "connection `opt-ghost`");
        assert_eq!(err.kind(), ErrorKind::UnknownReference);
        assert!(err.to_string().contains("connection `opt-ghost`"));
        assert!(err.to_string().contains("`ghost`"));
    }
}
