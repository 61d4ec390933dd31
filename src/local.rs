//! Remote rewriting for repositories already cloned on disk.
use git2::Repository;
use std::fs::read_dir;
use std::path::Path;

use crate::errors::{MigrationError, MigrationErrorKind};
use crate::remote_url::build_target_url;

/// Remote name the previous origin URL is saved under.
const OLD_REMOTE: &str = "old";

/// Remote name used when the origin is left untouched.
const NEW_REMOTE: &str = "new";

/// Point an existing working copy at the target instance.
///
/// No-op (logged) when `old_base_url` is not a substring of the current
/// `origin` URL. With `set_as_origin`, the current origin URL is saved as
/// remote `old` (skipped with a warning when `old` already exists) and
/// `origin` is recreated at the new URL; otherwise the new URL is added as
/// remote `new` and `origin` is left untouched.
/// # Errors
/// Error if the repository can't be opened, has no usable `origin`, or a
/// remote operation fails.
pub fn update_local_repo(
    path: &Path,
    old_base_url: &str,
    target_base_url: &str,
    target_group: &str,
    set_as_origin: bool,
) -> Result<(), MigrationError> {
    let repo = Repository::open(path)?;
    let origin_url = {
        let origin = repo.find_remote("origin")?;
        match origin.url() {
            Some(url) => url.to_string(),
            None => {
                return Err(MigrationError::new(MigrationErrorKind::MissingOrigin)
                    .with_text(&format!("origin URL is not utf-8 in {}", path.display())))
            }
        }
    };
    if !origin_url.contains(old_base_url) {
        log::info!(
            "skipping {}: old base URL not present in origin URL",
            path.display()
        );
        return Ok(());
    }
    let new_url = build_target_url(&origin_url, target_base_url, target_group)?;
    if set_as_origin {
        let remotes = repo.remotes()?;
        if remotes.iter().flatten().any(|name| name == OLD_REMOTE) {
            log::warn!(
                "a remote named '{OLD_REMOTE}' already exists in {}, not saving the previous origin",
                path.display()
            );
        } else {
            repo.remote(OLD_REMOTE, &origin_url)?;
        }
        repo.remote_delete("origin")?;
        repo.remote("origin", &new_url)?;
        log::info!("{}: origin is now {new_url}", path.display());
    } else {
        repo.remote(NEW_REMOTE, &new_url)?;
        log::info!("{}: added remote '{NEW_REMOTE}' at {new_url}", path.display());
    }
    Ok(())
}

/// Rewrite remotes for every immediate subdirectory of `dir` that is a git
/// working copy. Per-repository failures are logged and skipped.
/// # Errors
/// Error if `dir` can't be listed.
pub fn update_local_repos(
    dir: &Path,
    old_base_url: &str,
    target_base_url: &str,
    target_group: &str,
    set_as_origin: bool,
) -> Result<(), MigrationError> {
    for entry in read_dir(dir)? {
        let child = entry?.path();
        if !child.is_dir() || !child.join(".git").is_dir() {
            continue;
        }
        if let Err(e) = update_local_repo(
            &child,
            old_base_url,
            target_base_url,
            target_group,
            set_as_origin,
        ) {
            log::error!("{}: skipping, {e}", child.display());
        }
    }
    Ok(())
}
