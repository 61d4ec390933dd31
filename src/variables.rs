//! Group-level CI variable migration between instances.
use crate::errors::MigrationError;
use crate::gitlab::GitlabApi;

/// Copy group CI variables from one instance to another.
///
/// With `source_group`, only that group's variables are copied; without, the
/// variables of every group visible to the source token. All of them are
/// created at `target_group` on the target instance. A variable that fails
/// to create is logged and the batch continues.
/// # Errors
/// Error if a group name can't be resolved or listing variables fails.
pub async fn migrate_variables(
    source: &GitlabApi,
    target: &GitlabApi,
    source_group: Option<&str>,
    target_group: &str,
) -> Result<(), MigrationError> {
    let source_group_id = match source_group {
        Some(name) => Some(source.resolve_namespace_id(name).await?),
        None => None,
    };
    let target_group_id = target.resolve_namespace_id(target_group).await?;

    let variables = source.group_variables(source_group_id).await?;
    log::info!("migrating {} variables to {target_group}", variables.len());
    for variable in &variables {
        match target.create_group_variable(target_group_id, variable).await {
            Ok(_) => log::info!("variable '{}' created", variable.key),
            Err(e) => log::error!("variable '{}' not created: {e}", variable.key),
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn namespace(server: &MockServer, name: &str, id: u64) {
        Mock::given(method("GET"))
            .and(path("/api/v4/namespaces"))
            .and(query_param("search", name))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": id }])))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn variables_are_copied_with_opaque_fields() {
        let source_server = MockServer::start().await;
        let target_server = MockServer::start().await;
        namespace(&source_server, "legacy", 3).await;
        namespace(&target_server, "devops", 8).await;
        Mock::given(method("GET"))
            .and(path("/api/v4/groups/3/variables"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!([{ "key": "TOKEN", "value": "s3cret", "masked": true }]),
            ))
            .mount(&source_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v4/groups/8/variables"))
            .and(body_json(json!({
                "key": "TOKEN",
                "value": "s3cret",
                "masked": true
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
            .expect(1)
            .mount(&target_server)
            .await;

        let source = GitlabApi::new(&source_server.uri(), "src-token", false).unwrap();
        let target = GitlabApi::new(&target_server.uri(), "dst-token", false).unwrap();
        migrate_variables(&source, &target, Some("legacy"), "devops")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn failed_variable_does_not_halt_the_batch() {
        let source_server = MockServer::start().await;
        let target_server = MockServer::start().await;
        namespace(&source_server, "legacy", 3).await;
        namespace(&target_server, "devops", 8).await;
        Mock::given(method("GET"))
            .and(path("/api/v4/groups/3/variables"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "key": "FIRST", "value": "1" },
                { "key": "SECOND", "value": "2" }
            ])))
            .mount(&source_server)
            .await;
        // both variables are attempted even though the first one fails
        Mock::given(method("POST"))
            .and(path("/api/v4/groups/8/variables"))
            .and(body_json(json!({ "key": "FIRST", "value": "1" })))
            .respond_with(ResponseTemplate::new(400).set_body_string("key has already been taken"))
            .expect(1)
            .mount(&target_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v4/groups/8/variables"))
            .and(body_json(json!({ "key": "SECOND", "value": "2" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
            .expect(1)
            .mount(&target_server)
            .await;

        let source = GitlabApi::new(&source_server.uri(), "src-token", false).unwrap();
        let target = GitlabApi::new(&target_server.uri(), "dst-token", false).unwrap();
        migrate_variables(&source, &target, Some("legacy"), "devops")
            .await
            .unwrap();
    }
}
