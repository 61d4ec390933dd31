//! Command line options for the gitlab-migration tool
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use crate::errors::MigrationError;
use crate::gitlab::GitlabApi;
use crate::local::update_local_repos;
use crate::migrate::migrate_from_csv;
use crate::variables::migrate_variables;

/// gitlab-migration - Migrate repositories and group CI variables between GitLab instances
#[derive(Parser, Debug, Clone)]
#[command(version)]
pub struct GitlabMigrationCli {
    /// Accept invalid TLS certificates (self-signed instances)
    #[arg(short = 'k', long, global = true)]
    pub insecure: bool,

    /// Verbose mode (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// What to migrate
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level command groups.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Commands for migrating projects
    #[command(subcommand)]
    Projects(ProjectsCommand),

    /// Commands for migrating group variables
    #[command(subcommand)]
    Variables(VariablesCommand),
}

/// Project migration commands.
#[derive(Subcommand, Debug, Clone)]
pub enum ProjectsCommand {
    /// Migrate every repository listed in a csv to the target instance
    ///
    /// The csv must contain two columns: the source repository URL and the
    /// target group. The target base URL must include everything up to the
    /// group name, e.g. `https://gitlab.example.com/` or
    /// `git@gitlab.example.com:`.
    FromCsv {
        /// Csv file with `source_url,target_group` lines
        csv: PathBuf,

        /// Base push URL of the target instance
        target_base_url: String,

        /// API token valid on the target instance
        target_token: String,
    },

    /// Write the SSH URL of every non-archived project to a csv
    ///
    /// WARNING: silently overwrites the file if it already exists.
    ToCsv {
        /// Output file, one `<ssh-url>,` line per project
        csv: PathBuf,

        /// Base URL of the instance to list, e.g. `https://gitlab.example.com`
        gitlab_url: String,

        /// API token valid on that instance
        token: String,
    },

    /// Rewrite remotes for every git working copy directly under a path
    UpdateLocal {
        /// Directory whose subdirectories are inspected
        path: PathBuf,

        /// Base push URL of the new instance
        new_base_url: String,

        /// Base URL the current origin must contain
        old_base_url: String,

        /// Group the repositories were migrated to
        target_group: String,

        /// Replace "origin" with the new URL, saving the old one as remote
        /// "old" (default)
        #[arg(long, conflicts_with = "set_as_new")]
        set_as_origin: bool,

        /// Add the new URL as remote "new", leaving "origin" untouched
        #[arg(long)]
        set_as_new: bool,
    },
}

/// Group variable migration commands.
#[derive(Subcommand, Debug, Clone)]
pub enum VariablesCommand {
    /// Migrate group variables from 1+ groups on one instance to a single
    /// group on another
    Migrate {
        /// Only migrate variables from this group; leave blank to migrate
        /// the variables of every group visible to the source token
        #[arg(long)]
        source_group: Option<String>,

        /// Group on the target instance receiving the variables
        target_group: String,

        /// Base URL of the source instance
        src_gitlab_url: String,

        /// Base URL of the target instance
        target_gitlab_url: String,

        /// API token valid on the source instance
        src_token: String,

        /// API token valid on the target instance
        target_token: String,
    },
}

/// Run the parsed command line invocation.
/// # Errors
/// Error if the invoked command fails.
pub async fn run(args: GitlabMigrationCli) -> Result<(), MigrationError> {
    let insecure = args.insecure;
    match args.command {
        Command::Projects(ProjectsCommand::FromCsv {
            csv,
            target_base_url,
            target_token,
        }) => migrate_from_csv(&csv, &target_base_url, &target_token, insecure).await,
        Command::Projects(ProjectsCommand::ToCsv {
            csv,
            gitlab_url,
            token,
        }) => {
            log::info!("fetching all project SSH URLs from {gitlab_url}...");
            let api = GitlabApi::new(&gitlab_url, &token, insecure)?;
            let urls = api.project_urls().await?;
            let mut file = File::create(&csv)?;
            for url in &urls {
                writeln!(file, "{url},")?;
            }
            log::info!("wrote {} URLs to {}", urls.len(), csv.display());
            Ok(())
        }
        Command::Projects(ProjectsCommand::UpdateLocal {
            path,
            new_base_url,
            old_base_url,
            target_group,
            set_as_origin,
            set_as_new,
        }) => update_local_repos(
            &path,
            &old_base_url,
            &new_base_url,
            &target_group,
            set_as_origin || !set_as_new,
        ),
        Command::Variables(VariablesCommand::Migrate {
            source_group,
            target_group,
            src_gitlab_url,
            target_gitlab_url,
            src_token,
            target_token,
        }) => {
            let source = GitlabApi::new(&src_gitlab_url, &src_token, insecure)?;
            let target = GitlabApi::new(&target_gitlab_url, &target_token, insecure)?;
            migrate_variables(&source, &target, source_group.as_deref(), &target_group).await
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path as url_path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn to_csv_writes_one_trailing_comma_line_per_project() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(url_path("/api/v4/projects"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "ssh_url_to_repo": "git@host:group/a.git" },
                { "ssh_url_to_repo": "git@host:group/b.git" }
            ])))
            .mount(&server)
            .await;

        let out = tempfile::NamedTempFile::new().unwrap();
        let args = GitlabMigrationCli {
            insecure: false,
            verbose: 0,
            command: Command::Projects(ProjectsCommand::ToCsv {
                csv: out.path().to_path_buf(),
                gitlab_url: server.uri(),
                token: "token".to_string(),
            }),
        };
        run(args).await.unwrap();

        let written = std::fs::read_to_string(out.path()).unwrap();
        assert_eq!(written, "git@host:group/a.git,\ngit@host:group/b.git,\n");
    }

    #[test]
    fn parses_from_csv_invocation() {
        let args = GitlabMigrationCli::parse_from([
            "gitlab-migration",
            "-k",
            "projects",
            "from-csv",
            "repos.csv",
            "git@gitlab.example.com:",
            "token",
        ]);
        assert!(args.insecure);
        match args.command {
            Command::Projects(ProjectsCommand::FromCsv {
                csv,
                target_base_url,
                ..
            }) => {
                assert_eq!(csv, PathBuf::from("repos.csv"));
                assert_eq!(target_base_url, "git@gitlab.example.com:");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn update_local_defaults_to_set_as_origin() {
        let args = GitlabMigrationCli::parse_from([
            "gitlab-migration",
            "projects",
            "update-local",
            "/repos",
            "git@new:",
            "old-host",
            "group",
        ]);
        match args.command {
            Command::Projects(ProjectsCommand::UpdateLocal {
                set_as_origin,
                set_as_new,
                ..
            }) => {
                // neither flag given: replacing origin is the default
                assert!(!set_as_origin);
                assert!(!set_as_new);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn update_local_rejects_conflicting_flags() {
        let result = GitlabMigrationCli::try_parse_from([
            "gitlab-migration",
            "projects",
            "update-local",
            "/repos",
            "git@new:",
            "old-host",
            "group",
            "--set-as-origin",
            "--set-as-new",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn parses_variables_migrate_with_source_group() {
        let args = GitlabMigrationCli::parse_from([
            "gitlab-migration",
            "variables",
            "migrate",
            "--source-group",
            "legacy",
            "devops",
            "https://src",
            "https://dst",
            "src-token",
            "dst-token",
        ]);
        match args.command {
            Command::Variables(VariablesCommand::Migrate {
                source_group,
                target_group,
                ..
            }) => {
                assert_eq!(source_group.as_deref(), Some("legacy"));
                assert_eq!(target_group, "devops");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
