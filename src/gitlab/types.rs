//! Payload types for the GitLab v4 API.
use serde::{Deserialize, Serialize};

/// A project, as returned by `GET /api/v4/projects`.
#[derive(Deserialize, Debug, Clone)]
pub struct GitlabProject {
    /// SSH push/pull URL of the repository.
    pub ssh_url_to_repo: String,
}

/// A group, as returned by `GET /api/v4/groups`.
#[derive(Deserialize, Debug, Clone)]
pub struct GitlabGroup {
    /// Numeric group ID.
    pub id: u64,
}

/// A namespace search result from `GET /api/v4/namespaces`.
#[derive(Deserialize, Debug, Clone)]
pub struct GitlabNamespace {
    /// Numeric namespace ID.
    pub id: u64,
}

/// Body for `POST /api/v4/projects`.
#[derive(Serialize, Debug, Clone)]
pub struct NewProject {
    /// Project name.
    pub name: String,

    /// Namespace the project is created under.
    pub namespace_id: u64,

    /// Project visibility, `"internal"` for migrated projects.
    pub visibility: String,
}

/// A group-level CI variable.
///
/// Only `key` and `value` are interpreted; every other field the source
/// instance returns (`variable_type`, `protected`, `masked`, ...) is carried
/// opaquely and re-posted unchanged at the target.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct GroupVariable {
    /// Variable key.
    pub key: String,

    /// Variable value.
    pub value: String,

    /// Platform-specific fields, passed through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
