//! Integration tests for build-state reconciliation

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use mhub_net::{GitHubApi, NetClient, NetConfig, RetryConfig};
    use mhub_state::*;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::tempdir;
    use tokio::fs;

    fn client() -> NetClient {
        NetClient::new(NetConfig {
            retry: RetryConfig {
                max_retries: 2,
                initial_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(5),
                backoff_multiplier: 2.0,
                jitter_factor: 0.0,
            },
            ..NetConfig::default()
        })
        .unwrap()
    }

    async fn manifest(root: &Path, name: &str, body: &str) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).await.unwrap();
        fs::write(dir.join("manifest.yaml"), body).await.unwrap();
    }

    async fn exporters() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        manifest(
            dir.path(),
            "node_exporter",
            "name: node_exporter\nversion: v1.8.2\nupstream:\n  type: github\n  repo: prometheus/node_exporter\n",
        )
        .await;
        manifest(
            dir.path(),
            "redis_exporter",
            "name: redis_exporter\nversion: 1.62.0\nupstream:\n  type: github\n  repo: oliver006/redis_exporter\n",
        )
        .await;
        manifest(dir.path(), "broken", "version: [unterminated").await;
        // a directory without a manifest is not an exporter
        fs::create_dir_all(dir.path().join("templates")).await.unwrap();
        dir
    }

    #[tokio::test]
    async fn test_local_state_skips_bad_manifest() {
        let dir = exporters().await;
        let state = LocalState::load(dir.path()).await.unwrap();

        assert_eq!(state.versions.len(), 2);
        assert_eq!(state.versions["node_exporter"], "1.8.2");
        assert_eq!(state.invalid.len(), 1);
        assert!(state.invalid[0].0.starts_with(dir.path().join("broken")));
    }

    #[tokio::test]
    async fn test_missing_exporters_dir_is_empty() {
        let dir = tempdir().unwrap();
        let state = LocalState::load(&dir.path().join("nope")).await.unwrap();
        assert!(state.versions.is_empty());
    }

    #[tokio::test]
    async fn test_reconcile_against_legacy_catalog() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/catalog.json");
            then.status(200).body(
                r#"{"_note": "deprecated", "exporters": [
                    {"name": "node_exporter", "version": "1.8.2"},
                    {"name": "redis_exporter", "version": "1.63.0"}
                ]}"#,
            );
        });

        let dir = exporters().await;
        let report = reconcile_from(
            &client(),
            dir.path(),
            &server.url("/catalog.json"),
            &ReconcileOptions::default(),
        )
        .await
        .unwrap();

        mock.assert();
        assert_eq!(report.published, 2);
        assert_eq!(report.invalid, 1);
        // published is newer: a rollback still rebuilds
        assert_eq!(report.plan.selected(), vec!["redis_exporter"]);
    }

    #[tokio::test]
    async fn test_not_found_catalog_means_everything_is_new() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/catalog.json");
            then.status(404);
        });

        let dir = exporters().await;
        let report = reconcile_from(
            &client(),
            dir.path(),
            &server.url("/catalog.json"),
            &ReconcileOptions::default(),
        )
        .await
        .unwrap();

        mock.assert_hits(1);
        assert_eq!(report.published, 0);
        assert_eq!(report.plan.selected(), vec!["node_exporter", "redis_exporter"]);
        assert!(report
            .plan
            .decisions
            .iter()
            .all(|d| d.reason == Reason::New));
    }

    #[tokio::test]
    async fn test_server_error_is_retried_then_empty() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/catalog.json");
            then.status(502);
        });

        let catalog = fetch_published(&client(), &server.url("/catalog.json")).await;
        mock.assert_hits(3);
        assert!(catalog.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_body_is_empty() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/catalog.json");
            then.status(200).body("<html>maintenance</html>");
        });

        let catalog = fetch_published(&client(), &server.url("/catalog.json")).await;
        assert!(catalog.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_empty() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let catalog =
            fetch_published(&client(), &format!("http://127.0.0.1:{port}/catalog.json")).await;
        assert!(catalog.is_empty());
    }

    #[tokio::test]
    async fn test_targeted_forced_run() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/index.json");
            then.status(200).body(
                r#"{"version": "3.0", "exporters": [
                    {"name": "node_exporter", "version": "1.8.2", "category": "System", "last_updated": null}
                ]}"#,
            );
        });

        let dir = exporters().await;
        let report = reconcile_from(
            &client(),
            dir.path(),
            &server.url("/index.json"),
            &ReconcileOptions {
                force: true,
                target: Some("node_exporter".to_string()),
            },
        )
        .await
        .unwrap();

        assert_eq!(report.plan.selected(), vec!["node_exporter"]);
        assert_eq!(report.plan.decisions[0].reason, Reason::Forced);
    }

    fn latest(server: &MockServer, repo: &str, tag: &str) {
        let path = format!("/repos/{repo}/releases/latest");
        let body = format!(r#"{{"tag_name": "{tag}", "assets": []}}"#);
        server.mock(move |when, then| {
            when.method(GET)
                .path(path)
                .header("accept", "application/vnd.github+json");
            then.status(200).body(body);
        });
    }

    async fn watched() -> tempfile::TempDir {
        let dir = exporters().await;
        manifest(
            dir.path(),
            "custom_exporter",
            "name: custom_exporter\nversion: 0.1.0\nupstream:\n  type: local\n  local_binary: bin/custom\n",
        )
        .await;
        dir
    }

    #[tokio::test]
    async fn test_watch_reports_without_touching_manifests() {
        let server = MockServer::start();
        latest(&server, "prometheus/node_exporter", "v1.9.0");
        latest(&server, "oliver006/redis_exporter", "v1.62.0");

        let dir = watched().await;
        let path = dir.path().join("node_exporter/manifest.yaml");
        let before = fs::read_to_string(&path).await.unwrap();

        let api = GitHubApi::new(client(), &server.base_url(), None);
        let report = watch(&api, dir.path(), &WatchOptions::default())
            .await
            .unwrap();

        assert_eq!(report.available(), vec!["node_exporter"]);
        assert!(report.updated().is_empty());
        assert_eq!(report.skipped, vec!["custom_exporter"]);
        assert_eq!(report.invalid, 1);
        let redis = report.checks.iter().find(|c| c.name == "redis_exporter").unwrap();
        assert_eq!(redis.status, WatchStatus::UpToDate);
        assert_eq!(redis.latest.as_deref(), Some("v1.62.0"));
        assert_eq!(fs::read_to_string(&path).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_watch_update_rewrites_behind_manifests() {
        let server = MockServer::start();
        let node = server.mock(|when, then| {
            when.method(GET)
                .path("/repos/prometheus/node_exporter/releases/latest")
                .header("authorization", "Bearer secret");
            then.status(200)
                .body(r#"{"tag_name": "v1.9.0", "assets": []}"#);
        });
        // no release yet: reported, not fatal
        server.mock(|when, then| {
            when.method(GET)
                .path("/repos/oliver006/redis_exporter/releases/latest");
            then.status(404);
        });

        let dir = watched().await;
        let api = GitHubApi::new(client(), &server.base_url(), Some("secret".to_string()));
        let report = watch(&api, dir.path(), &WatchOptions { update: true })
            .await
            .unwrap();

        node.assert();
        assert_eq!(report.updated(), vec!["node_exporter"]);
        let redis = report.checks.iter().find(|c| c.name == "redis_exporter").unwrap();
        assert_eq!(redis.status, WatchStatus::Unreachable);
        assert!(redis.latest.is_none());

        let state = LocalState::load(dir.path()).await.unwrap();
        assert_eq!(state.exporters["node_exporter"].manifest.version, "v1.9.0");
        assert_eq!(state.versions["node_exporter"], "1.9.0");
        assert_eq!(state.versions["redis_exporter"], "1.62.0");

        // a second pass finds nothing left to do
        let again = watch(&api, dir.path(), &WatchOptions { update: true })
            .await
            .unwrap();
        assert!(again.updated().is_empty());
    }
}
