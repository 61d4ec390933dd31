//! Error handling for the gitlab-migration crate.
use std::{error::Error as StdError, fmt};

/// Error type for the gitlab-migration crate.
#[derive(Debug)]
pub struct MigrationError {
    /// Inner error.
    inner: Box<Inner>,
}

impl MigrationError {
    /// Create a new error.
    pub(crate) fn new(kind: MigrationErrorKind) -> Self {
        Self {
            inner: Box::new(Inner { kind, source: None }),
        }
    }

    /// Create a new error with a text source (typically an API response body).
    pub(crate) fn with_text(mut self, text: &str) -> Self {
        self.inner.source = Some(Box::new(std::io::Error::other(text)));
        self
    }

    /// Get the error kind.
    pub(crate) fn kind(&self) -> &MigrationErrorKind {
        &self.inner.kind
    }

    /// Whether this error must abort the whole invocation instead of a
    /// single batch item. Only an ambiguous group name qualifies: the
    /// migration target is unknown, so continuing could create projects in
    /// the wrong namespace.
    pub(crate) fn is_fatal(&self) -> bool {
        matches!(self.inner.kind, MigrationErrorKind::AmbiguousNamespace)
    }
}

/// Type alias for a boxed error.
pub(crate) type BoxError = Box<dyn StdError + Send + Sync>;

/// Inner error type for the gitlab-migration crate.
#[derive(Debug)]
struct Inner {
    /// Error kind.
    kind: MigrationErrorKind,

    /// Source error.
    source: Option<BoxError>,
}

/// Error kinds for the gitlab-migration crate.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum MigrationErrorKind {
    /// Error related to the reqwest crate.
    Reqwest,

    /// Error related to serde.
    Serde,

    /// Error related to git2.
    Git2,

    /// A URL that does not end in `<name>.git`.
    MalformedUrl,

    /// A namespace search that returned more than one result.
    AmbiguousNamespace,

    /// A namespace search that returned no result.
    NamespaceNotFound,

    /// Non-success status while creating a project.
    ProjectCreation,

    /// Non-success status while listing projects, groups or variables.
    ApiListing,

    /// Non-success status while creating a group variable.
    VariableCreation,

    /// A local repository without a usable `origin` remote.
    MissingOrigin,

    /// Error related to the filesystem or the input file.
    Io,
}

impl fmt::Display for MigrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner.source {
            Some(source) => write!(f, "{:?}: {}", self.inner.kind, source),
            None => write!(f, "{:?}", self.inner.kind),
        }
    }
}

impl StdError for MigrationError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.source.as_ref().map(|e| &**e as _)
    }
}

impl From<reqwest::Error> for MigrationError {
    fn from(e: reqwest::Error) -> Self {
        Self {
            inner: Box::new(Inner {
                kind: MigrationErrorKind::Reqwest,
                source: Some(Box::new(e)),
            }),
        }
    }
}

impl From<serde_json::Error> for MigrationError {
    fn from(e: serde_json::Error) -> Self {
        Self {
            inner: Box::new(Inner {
                kind: MigrationErrorKind::Serde,
                source: Some(Box::new(e)),
            }),
        }
    }
}

impl From<std::io::Error> for MigrationError {
    fn from(e: std::io::Error) -> Self {
        Self {
            inner: Box::new(Inner {
                kind: MigrationErrorKind::Io,
                source: Some(Box::new(e)),
            }),
        }
    }
}

impl From<git2::Error> for MigrationError {
    fn from(e: git2::Error) -> Self {
        Self {
            inner: Box::new(Inner {
                kind: MigrationErrorKind::Git2,
                source: Some(Box::new(e)),
            }),
        }
    }
}
