use super::domain::{DocumentType, VerificationStatus};
use super::ports::{IdentityError, RepositoryError, StorageError};

/// A named publish precondition that was not met. Each blocker is reported
/// on its own so callers can render the exact remediation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PublishBlocker {
    #[error("owner KYC is not verified")]
    KycUnverified,
    #[error("no {} document attached", .0.label())]
    TrustDocumentMissing(DocumentType),
    #[error("{} document is {}, must be verified", .doc_type.label(), .status.label())]
    TrustDocumentUnverified {
        doc_type: DocumentType,
        status: VerificationStatus,
    },
    #[error("completeness score {score} is below the publish threshold {required}")]
    CompletenessBelowThreshold { score: u8, required: u8 },
}

/// Error raised by the listing managers.
#[derive(Debug, thiserror::Error)]
pub enum ListingError {
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("publish blocked: {0}")]
    Guard(#[from] PublishBlocker),
    #[error("upstream failure during {context}: {message}")]
    Upstream {
        context: &'static str,
        message: String,
    },
}

/// Coarse classification used by transports and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Auth,
    NotFound,
    Validation,
    Conflict,
    GuardFailed,
    Unknown,
}

impl ErrorKind {
    pub const fn label(self) -> &'static str {
        match self {
            ErrorKind::Auth => "auth",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Validation => "validation",
            ErrorKind::Conflict => "conflict",
            ErrorKind::GuardFailed => "guard_failed",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl ListingError {
    pub fn missing_org() -> Self {
        Self::Auth("caller has no organization context".to_string())
    }

    pub fn upstream(context: &'static str, cause: impl std::fmt::Display) -> Self {
        Self::Upstream {
            context,
            message: cause.to_string(),
        }
    }

    pub const fn kind(&self) -> ErrorKind {
        match self {
            ListingError::Auth(_) => ErrorKind::Auth,
            ListingError::NotFound(_) => ErrorKind::NotFound,
            ListingError::Validation(_) => ErrorKind::Validation,
            ListingError::Conflict(_) => ErrorKind::Conflict,
            ListingError::Guard(_) => ErrorKind::GuardFailed,
            ListingError::Upstream { .. } => ErrorKind::Unknown,
        }
    }
}

impl From<RepositoryError> for ListingError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound => ListingError::NotFound("record"),
            RepositoryError::Conflict => ListingError::Conflict("record already exists".to_string()),
            RepositoryError::Unavailable(message) => ListingError::Upstream {
                context: "persistence",
                message,
            },
        }
    }
}

impl From<StorageError> for ListingError {
    fn from(value: StorageError) -> Self {
        ListingError::upstream("object storage", value)
    }
}

impl From<IdentityError> for ListingError {
    fn from(value: IdentityError) -> Self {
        match value {
            IdentityError::Unresolved(message) => ListingError::Auth(message),
        }
    }
}
