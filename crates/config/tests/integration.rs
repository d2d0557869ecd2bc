//! Integration tests for config

#[cfg(test)]
mod tests {
    use mhub_config::*;
    use mhub_types::{ColorChoice, OutputFormat};
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[tokio::test]
    async fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[general]
default_output = "plain"
color = "never"

[paths]
exporters_dir = "/srv/hub/exporters"

[network]
retries = 5
retry_delay_ms = 50

[repository]
github_repo = "acme/packages"
supported_distros = ["el9"]

[repository.deb_codenames]
"ubuntu-24.04" = "noble"
        "#
        )
        .unwrap();

        let config = Config::load_from_file(temp_file.path()).await.unwrap();
        assert_eq!(config.general.default_output, OutputFormat::Plain);
        assert_eq!(config.general.color, ColorChoice::Never);
        assert_eq!(
            config.exporters_dir(),
            std::path::PathBuf::from("/srv/hub/exporters")
        );
        assert_eq!(config.network.retries, 5);
        assert_eq!(config.network.retry_delay_ms, 50);
        // unspecified fields keep their defaults
        assert!((config.network.backoff_multiplier - 2.0).abs() < f64::EPSILON);
        assert_eq!(config.repository.github_repo, "acme/packages");
        assert_eq!(config.repository.supported_distros, vec!["el9"]);
        assert_eq!(config.deb_codename("ubuntu-24.04"), Some("noble"));
        assert_eq!(config.deb_codename("debian-12"), None);
        assert_eq!(config.rpm_arch("amd64"), "x86_64");
    }

    #[tokio::test]
    async fn test_invalid_toml_is_parse_error() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[network\nretries = ").unwrap();

        let err = Config::load_from_file(temp_file.path()).await.unwrap_err();
        assert!(err.to_string().contains("parse error"));
    }

    #[tokio::test]
    async fn test_explicit_missing_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(Config::load_or_default(Some(&missing)).await.is_err());
    }

    #[tokio::test]
    async fn test_out_of_range_values_rejected() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[network]\njitter_factor = 1.5").unwrap();
        assert!(Config::load_from_file(temp_file.path()).await.is_err());
    }

    #[test]
    fn test_merge_env() {
        let mut config = Config::default();
        config
            .merge_env_with(env(&[
                ("CATALOG_URL", "http://localhost:8080/catalog.json"),
                ("FORCE_REBUILD", "true"),
                ("TARGET_EXPORTER", "node_exporter"),
                ("GITHUB_TOKEN", "ghp_test"),
                ("MHUB_COLOR", "always"),
                ("MHUB_OUTPUT", "json"),
                ("MHUB_RETRIES", "1"),
            ]))
            .unwrap();

        assert_eq!(config.catalog.url, "http://localhost:8080/catalog.json");
        assert!(config.catalog.force_rebuild);
        assert_eq!(config.catalog.target_exporter.as_deref(), Some("node_exporter"));
        assert_eq!(config.repository.github_token.as_deref(), Some("ghp_test"));
        assert_eq!(config.general.color, ColorChoice::Always);
        assert_eq!(config.general.default_output, OutputFormat::Json);
        assert_eq!(config.network.retries, 1);
    }

    #[test]
    fn test_empty_target_exporter_means_no_filter() {
        let mut config = Config::default();
        config.catalog.target_exporter = Some("stale".to_string());
        config
            .merge_env_with(env(&[("TARGET_EXPORTER", ""), ("FORCE_REBUILD", "")]))
            .unwrap();
        assert!(config.catalog.target_exporter.is_none());
        assert!(!config.catalog.force_rebuild);
    }

    #[test]
    fn test_merge_env_rejects_bad_values() {
        let mut config = Config::default();
        assert!(config
            .merge_env_with(env(&[("FORCE_REBUILD", "perhaps")]))
            .is_err());
        assert!(config.merge_env_with(env(&[("MHUB_COLOR", "rainbow")])).is_err());
        assert!(config.merge_env_with(env(&[("MHUB_RETRIES", "many")])).is_err());
    }

    #[test]
    fn test_token_is_never_serialized() {
        let mut config = Config::default();
        config.repository.github_token = Some("secret".to_string());
        let rendered = toml::to_string(&config).unwrap();
        assert!(!rendered.contains("secret"));
    }
}
