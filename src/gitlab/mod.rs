//! GitLab REST API (v4) client.
pub mod client;
pub mod types;

pub use client::GitlabApi;
pub use types::GroupVariable;
