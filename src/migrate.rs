//! Repository migration: create the target project, clone, push.
use git2::Cred;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use std::fs::{read_to_string, remove_dir_all};
use std::path::{Path, PathBuf};

use crate::errors::MigrationError;
use crate::gitlab::GitlabApi;
use crate::remote_url::{api_base_from_push_url, build_target_url, repo_name_from_url};

/// Remote name the target instance is pushed through in the temp clone.
const TARGET_REMOTE: &str = "new";

/// Migrate one repository to the target instance.
///
/// Creates the project via the API, bare-clones `source_url` into a fresh
/// temporary directory, pushes every ref to the transformed target URL and
/// removes the temporary directory, success or failure. When project
/// creation fails, clone and push are not attempted.
/// # Errors
/// Error on a malformed source URL, project-creation failure, or any git
/// failure while cloning or pushing.
pub async fn migrate_repo(
    source_url: &str,
    target_base_url: &str,
    target_group: &str,
    token: &str,
    accept_invalid_certs: bool,
) -> Result<(), MigrationError> {
    let repo_name = repo_name_from_url(source_url)?;
    let api = GitlabApi::new(
        &api_base_from_push_url(target_base_url),
        token,
        accept_invalid_certs,
    )?;
    api.create_project(target_group, repo_name).await?;

    let target_url = build_target_url(source_url, target_base_url, target_group)?;
    let tmp_repo_path = temp_clone_dir(repo_name);
    let result = clone_and_push(source_url, &target_url, &tmp_repo_path);
    if tmp_repo_path.exists() {
        if let Err(e) = remove_dir_all(&tmp_repo_path) {
            log::warn!("could not clean up {}: {e}", tmp_repo_path.display());
        }
    }
    result
}

/// Migrate every repository listed in a CSV file.
///
/// Each line is `source_url,target_group`. Items are processed in file
/// order; a failed item is logged and skipped. Only an ambiguous target
/// group aborts the whole run.
/// # Errors
/// Error if the file can't be read or a group name is ambiguous.
pub async fn migrate_from_csv(
    csv_path: &Path,
    target_base_url: &str,
    token: &str,
    accept_invalid_certs: bool,
) -> Result<(), MigrationError> {
    let contents = read_to_string(csv_path)?;
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((source_url, target_group)) = line.split_once(',') else {
            log::error!("skipping malformed line (expected 'source_url,target_group'): {line}");
            continue;
        };
        let (source_url, target_group) = (source_url.trim(), target_group.trim());
        log::info!("working on {source_url}...");
        match migrate_repo(
            source_url,
            target_base_url,
            target_group,
            token,
            accept_invalid_certs,
        )
        .await
        {
            Ok(_) => log::info!("{source_url}: migrated"),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => log::error!("{source_url}: skipping, {e}"),
        }
    }
    Ok(())
}

/// Fresh per-attempt directory under the system temp dir.
fn temp_clone_dir(repo_name: &str) -> PathBuf {
    let rand_string: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(10)
        .map(char::from)
        .collect();
    std::env::temp_dir().join(format!("gitlab-migration-{rand_string}-{repo_name}.git"))
}

/// Remote callbacks authenticating through the SSH agent.
fn ssh_agent_callbacks() -> git2::RemoteCallbacks<'static> {
    let mut callbacks = git2::RemoteCallbacks::new();
    callbacks.credentials(|_url, username_from_url, _allowed| {
        let username = username_from_url.unwrap_or("git");
        Cred::ssh_key_from_agent(username)
    });
    callbacks
}

/// Bare-clone the source and push every ref to the target.
fn clone_and_push(
    source_url: &str,
    target_url: &str,
    tmp_repo_path: &Path,
) -> Result<(), MigrationError> {
    let mut builder = git2::build::RepoBuilder::new();
    builder.bare(true);
    let mut fetch_opts = git2::FetchOptions::new();
    fetch_opts.remote_callbacks(ssh_agent_callbacks());
    builder.fetch_options(fetch_opts);

    log::info!(
        "cloning from '{}' to '{}'...",
        source_url,
        tmp_repo_path.display()
    );
    let repo = builder.clone(source_url, tmp_repo_path)?;

    let mut remote = repo.remote(TARGET_REMOTE, target_url)?;
    log::info!("pushing to '{target_url}'...");
    remote.connect_auth(git2::Direction::Push, Some(ssh_agent_callbacks()), None)?;

    let refs = repo.references()?;
    for reference in refs {
        let reference = reference?;
        let ref_name = match reference.name() {
            Some(name) => name,
            None => continue,
        };
        log::debug!("pushing '{ref_name}'...");
        let ref_remote = format!("+{ref_name}:{ref_name}");
        let mut opts = git2::PushOptions::new();
        opts.remote_callbacks(ssh_agent_callbacks());
        remote.push(&[&ref_remote], Some(&mut opts))?;
    }
    Ok(())
}
