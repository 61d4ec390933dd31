//! Authenticated client for one GitLab instance.
use reqwest::header::{HeaderValue, ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;

use super::types::{GitlabGroup, GitlabNamespace, GitlabProject, GroupVariable, NewProject};
use crate::errors::{MigrationError, MigrationErrorKind};

/// Header carrying the private API token.
const PRIVATE_TOKEN: &str = "PRIVATE-TOKEN";

/// Response header naming the next page; absent or empty on the last page.
const NEXT_PAGE: &str = "x-next-page";

/// Client for the v4 REST API of a single GitLab instance.
///
/// One instance per (base URL, token) pair; requests are issued one at a
/// time.
#[derive(Debug, Clone)]
pub struct GitlabApi {
    /// Underlying HTTP client.
    client: reqwest::Client,

    /// Instance base URL without trailing slash, e.g. `https://gitlab.example.com`.
    base_url: String,

    /// Private API token.
    token: String,
}

impl GitlabApi {
    /// Create a client for `base_url` authenticated with `token`.
    ///
    /// `accept_invalid_certs` disables TLS certificate verification for this
    /// client only. Self-hosted instances with self-signed certificates need
    /// it; everything else should leave it off.
    /// # Errors
    /// Error if the underlying HTTP client can't be built.
    pub fn new(
        base_url: &str,
        token: &str,
        accept_invalid_certs: bool,
    ) -> Result<Self, MigrationError> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// GET a single JSON resource.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, MigrationError> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .header(PRIVATE_TOKEN, &self.token)
            .header(ACCEPT, "application/json")
            .query(query)
            .send()
            .await?;
        if !response.status().is_success() {
            let text = response.text().await?;
            return Err(MigrationError::new(MigrationErrorKind::ApiListing).with_text(&text));
        }
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// GET a paginated collection, following the `X-Next-Page` cursor until
    /// it is absent or empty.
    async fn get_paginated<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, MigrationError> {
        let mut page = String::from("1");
        let mut items = vec![];
        loop {
            let response = self
                .client
                .get(format!("{}{}", self.base_url, path))
                .header(PRIVATE_TOKEN, &self.token)
                .header(ACCEPT, "application/json")
                .query(query)
                .query(&[("page", page.as_str())])
                .send()
                .await?;
            if !response.status().is_success() {
                let text = response.text().await?;
                return Err(MigrationError::new(MigrationErrorKind::ApiListing).with_text(&text));
            }
            let next_page = response
                .headers()
                .get(NEXT_PAGE)
                .and_then(|v: &HeaderValue| v.to_str().ok())
                .map(str::to_string);
            let text = response.text().await?;
            let batch: Vec<T> = serde_json::from_str(&text)?;
            log::debug!("requested {path} (page {page}): {} items", batch.len());
            items.extend(batch);
            match next_page {
                Some(next) if !next.is_empty() => page = next,
                _ => break,
            }
        }
        Ok(items)
    }

    /// List the SSH URLs of every non-archived project visible to the token.
    /// # Errors
    /// Error on any non-success status.
    pub async fn project_urls(&self) -> Result<Vec<String>, MigrationError> {
        let projects: Vec<GitlabProject> = self
            .get_paginated("/api/v4/projects", &[("archived", "false")])
            .await?;
        Ok(projects.into_iter().map(|p| p.ssh_url_to_repo).collect())
    }

    /// Resolve a group name to its namespace ID.
    ///
    /// The search must match exactly one namespace: an ambiguous name would
    /// leave the migration target unknown.
    /// # Errors
    /// Error on zero or multiple matches, or any non-success status.
    pub async fn resolve_namespace_id(&self, group_name: &str) -> Result<u64, MigrationError> {
        let results: Vec<GitlabNamespace> = self
            .get_json("/api/v4/namespaces", &[("search", group_name)])
            .await?;
        match results.as_slice() {
            [] => Err(MigrationError::new(MigrationErrorKind::NamespaceNotFound)
                .with_text(&format!("no namespace found for: {group_name}"))),
            [namespace] => Ok(namespace.id),
            _ => Err(MigrationError::new(MigrationErrorKind::AmbiguousNamespace)
                .with_text(&format!(
                    "too many namespace results returned, group name is ambiguous: {group_name}"
                ))),
        }
    }

    /// Create a project named `repo_name` under `group_name` with
    /// `"internal"` visibility.
    /// # Errors
    /// Error if the group name resolves to zero or multiple namespaces, or
    /// on any non-success status (carrying the response body).
    pub async fn create_project(
        &self,
        group_name: &str,
        repo_name: &str,
    ) -> Result<(), MigrationError> {
        let namespace_id = self.resolve_namespace_id(group_name).await?;
        log::info!("creating project {group_name}/{repo_name}...");
        let body = NewProject {
            name: repo_name.to_string(),
            namespace_id,
            visibility: "internal".to_string(),
        };
        let response = self
            .client
            .post(format!("{}/api/v4/projects", self.base_url))
            .header(PRIVATE_TOKEN, &self.token)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            let text = response.text().await?;
            return Err(MigrationError::new(MigrationErrorKind::ProjectCreation).with_text(&text));
        }
        Ok(())
    }

    /// List the IDs of every group visible to the token.
    /// # Errors
    /// Error on any non-success status.
    pub async fn group_ids(&self) -> Result<Vec<u64>, MigrationError> {
        let groups: Vec<GitlabGroup> = self
            .get_paginated("/api/v4/groups", &[("all_available", "true")])
            .await?;
        Ok(groups.into_iter().map(|g| g.id).collect())
    }

    /// List group-level CI variables.
    ///
    /// With a group ID, that group's variables only; without, the variables
    /// of every group visible to the token, concatenated.
    /// # Errors
    /// Error on any non-success status.
    pub async fn group_variables(
        &self,
        group_id: Option<u64>,
    ) -> Result<Vec<GroupVariable>, MigrationError> {
        let group_ids = match group_id {
            Some(id) => vec![id],
            None => self.group_ids().await?,
        };
        let mut variables = vec![];
        for gid in group_ids {
            let batch: Vec<GroupVariable> = self
                .get_json(&format!("/api/v4/groups/{gid}/variables"), &[])
                .await?;
            variables.extend(batch);
        }
        Ok(variables)
    }

    /// Create one group-level CI variable.
    /// # Errors
    /// Error on any non-success status (carrying the response body); callers
    /// log it and continue with the next variable.
    pub async fn create_group_variable(
        &self,
        group_id: u64,
        variable: &GroupVariable,
    ) -> Result<(), MigrationError> {
        let response = self
            .client
            .post(format!(
                "{}/api/v4/groups/{group_id}/variables",
                self.base_url
            ))
            .header(PRIVATE_TOKEN, &self.token)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .json(variable)
            .send()
            .await?;
        if !response.status().is_success() {
            let text = response.text().await?;
            return Err(MigrationError::new(MigrationErrorKind::VariableCreation).with_text(&text));
        }
        Ok(())
    }
}
