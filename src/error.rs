use crate::sltp::ParseError;
use crate::validator::ValidationError;
use std::{fmt, path::PathBuf};
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Identifier families that must be unique across a mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Group,
    Unit,
}

impl fmt::Display for IdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IdKind::Group => "group",
            IdKind::Unit => "unit",
        })
    }
}

/// Errors raised by the archive container and the mission model.
/// Every variant carries enough context (path, field, offending value) to be rendered as is.
#[derive(Debug, Error)]
pub enum Error {
    #[error("file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("{subject}: expected {expected}, found {found}")]
    TypeMismatch {
        subject: String,
        expected: String,
        found: String,
    },

    #[error("corrupt archive {}: {source}", path.display())]
    CorruptArchive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("missing archive member: {}", path.display())]
    MissingMember { path: PathBuf },

    #[error("failed to parse `{member}`: {source}")]
    Parse {
        member: String,
        #[source]
        source: ParseError,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("duplicate {kind} id: {id}")]
    DuplicateId { kind: IdKind, id: i64 },

    #[error("missing field `{path}`")]
    MissingField { path: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot encode `{member}`: {reason}")]
    Encode { member: String, reason: String },

    #[error("destination already exists: {}", path.display())]
    DestinationExists { path: PathBuf },

    #[error("invalid archive session: {0}")]
    Usage(&'static str),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn type_mismatch(
        subject: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Error::TypeMismatch {
            subject: subject.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }
}
