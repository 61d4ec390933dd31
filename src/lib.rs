//! # gitlab-migration
//!
//! Migrate repositories and group CI variables between GitLab instances
//!
//! ## Usage
//!
//! ```txt
//! Usage: gitlab-migration [OPTIONS] <COMMAND>
//!
//! Commands:
//!   projects   Commands for migrating projects
//!   variables  Commands for migrating group variables
//!   help       Print this message or the help of the given subcommand(s)
//!
//! Options:
//!   -k, --insecure    Accept invalid TLS certificates (self-signed instances)
//!   -v, --verbose...  Verbose mode (-v, -vv)
//!   -h, --help        Print help
//!   -V, --version     Print version
//! ```

#![warn(clippy::all, rust_2018_idioms)]
#![deny(
    missing_docs,
    clippy::all,
    clippy::missing_docs_in_private_items,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![warn(clippy::multiple_crate_versions)]

pub(crate) mod cli;
pub(crate) mod errors;
pub(crate) mod gitlab;
pub(crate) mod local;
pub(crate) mod migrate;
pub(crate) mod remote_url;
pub(crate) mod variables;

pub use cli::{run, Command, GitlabMigrationCli, ProjectsCommand, VariablesCommand};
pub use errors::MigrationError;
pub use gitlab::{GitlabApi, GroupVariable};
pub use local::{update_local_repo, update_local_repos};
pub use migrate::{migrate_from_csv, migrate_repo};
pub use remote_url::{api_base_from_push_url, build_target_url, repo_name_from_url};
pub use variables::migrate_variables;
