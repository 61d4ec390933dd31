//! URL transforms between source and target instances.
//!
//! Both SSH (`git@host:group/name.git`) and HTTPS
//! (`https://host/group/name.git`) push URLs are handled with plain string
//! operations; the only shape requirement is a `/` followed by the bare
//! repository name and a `.git` suffix.
use crate::errors::{MigrationError, MigrationErrorKind};

/// Extract the bare repository name from a remote URL.
///
/// The name is the trailing path segment before the `.git` suffix and is
/// restricted to the charset `[-_.A-Za-z0-9]`.
/// # Errors
/// Error if the URL does not end in `/<name>.git`.
pub fn repo_name_from_url(url: &str) -> Result<&str, MigrationError> {
    let malformed = || {
        MigrationError::new(MigrationErrorKind::MalformedUrl)
            .with_text(&format!("project name not found in url: {url}"))
    };
    let stem = url.strip_suffix(".git").ok_or_else(malformed)?;
    let slash = stem.rfind('/').ok_or_else(malformed)?;
    let name = &stem[slash + 1..];
    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(malformed());
    }
    Ok(name)
}

/// Build the push URL of a repository on the target instance.
///
/// `target_base_url` must include everything up to the group name, e.g.
/// `https://gitlab.example.com/` or `git@gitlab.example.com:`; the separator
/// is appended when missing.
/// # Errors
/// Error if `old_url` does not end in `/<name>.git`.
pub fn build_target_url(
    old_url: &str,
    target_base_url: &str,
    target_group: &str,
) -> Result<String, MigrationError> {
    let name = repo_name_from_url(old_url)?;
    let mut base = target_base_url.to_string();
    if base.starts_with("git@") && !base.ends_with(':') {
        base.push(':');
    }
    if base.starts_with("https://") && !base.ends_with('/') {
        base.push('/');
    }
    Ok(format!("{base}{target_group}/{name}.git"))
}

/// Derive the HTTPS API base from a push-URL base.
///
/// An SSH base like `git@gitlab.example.com:` maps to
/// `https://gitlab.example.com`; an HTTPS base is passed through. The result
/// never carries a trailing slash.
pub fn api_base_from_push_url(target_base_url: &str) -> String {
    let base = match target_base_url.split_once('@') {
        Some((_, host)) => {
            let host = host.trim_end_matches(':').trim_end_matches('/');
            format!("https://{host}")
        }
        None => target_base_url.to_string(),
    };
    base.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn name_from_https_url() {
        assert_eq!(
            repo_name_from_url("https://host/group/proj.git").unwrap(),
            "proj"
        );
    }

    #[test]
    fn name_from_ssh_url() {
        assert_eq!(
            repo_name_from_url("git@host:group/sub-group/my_repo.v2.git").unwrap(),
            "my_repo.v2"
        );
    }

    #[test]
    fn name_requires_git_suffix() {
        assert!(repo_name_from_url("https://host/group/proj").is_err());
    }

    #[test]
    fn name_requires_path_separator() {
        assert!(repo_name_from_url("proj.git").is_err());
        assert!(repo_name_from_url("https://host/group/.git").is_err());
    }

    #[test]
    fn name_rejects_bad_charset() {
        assert!(repo_name_from_url("https://host/group/pr oj.git").is_err());
    }

    #[test]
    fn target_url_ssh_base() {
        assert_eq!(
            build_target_url("https://src/old-group/old.git", "git@host", "group").unwrap(),
            "git@host:group/old.git"
        );
        // separator already present
        assert_eq!(
            build_target_url("https://src/old-group/old.git", "git@host:", "group").unwrap(),
            "git@host:group/old.git"
        );
    }

    #[test]
    fn target_url_https_base() {
        assert_eq!(
            build_target_url("git@src:old-group/old.git", "https://host", "group").unwrap(),
            "https://host/group/old.git"
        );
        assert_eq!(
            build_target_url("git@src:old-group/old.git", "https://host/", "group").unwrap(),
            "https://host/group/old.git"
        );
    }

    #[test]
    fn target_url_propagates_malformed_source() {
        assert!(build_target_url("https://src/old", "https://host/", "group").is_err());
    }

    #[test]
    fn api_base_from_ssh_push_url() {
        assert_eq!(
            api_base_from_push_url("git@gitlab.example.com:"),
            "https://gitlab.example.com"
        );
        assert_eq!(api_base_from_push_url("git@host"), "https://host");
    }

    #[test]
    fn api_base_from_https_push_url() {
        assert_eq!(
            api_base_from_push_url("https://gitlab.example.com/"),
            "https://gitlab.example.com"
        );
    }
}
