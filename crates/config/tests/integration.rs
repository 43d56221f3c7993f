//! Integration tests for config

#[cfg(test)]
mod tests {
    use lxpkg_config::*;
    use lxpkg_types::ColorChoice;
    use std::collections::HashMap;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
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
color = "never"

[paths]
source_root = "/srv/sources"
install_root = "/opt/local"

[network]
timeout = 60
retries = 5

[build]
shell = "bash"

[build.escalation]
mode = "passthrough"
        "#
        )
        .unwrap();

        let config = Config::load_from_file(temp_file.path()).await.unwrap();
        assert_eq!(config.general.color, ColorChoice::Never);
        assert_eq!(config.network.timeout, 60);
        assert_eq!(config.network.retries, 5);
        // unspecified keys keep their defaults
        assert_eq!(config.network.retry_delay, 1);
        assert_eq!(config.build.shell, "bash");
        assert_eq!(config.build.escalation.mode, EscalationMode::Passthrough);
        assert_eq!(config.build.escalation.program, "pkexec");

        let roots = config.roots();
        assert_eq!(roots.source_tree, PathBuf::from("/srv/sources"));
        assert_eq!(roots.build, PathBuf::from("/srv/sources/build"));
        assert_eq!(roots.install, PathBuf::from("/opt/local"));
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let result = Config::load_from_file(std::path::Path::new("/nonexistent/lxpkg.toml")).await;
        assert!(matches!(
            result,
            Err(lxpkg_errors::Error::Config(
                lxpkg_errors::ConfigError::NotFound { .. }
            ))
        ));
    }

    #[tokio::test]
    async fn test_unreadable_file_keeps_io_error() {
        // a directory exists but cannot be read as a file
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load_from_file(dir.path()).await;
        match result {
            Err(lxpkg_errors::Error::Io { kind, path, .. }) => {
                assert_ne!(kind, std::io::ErrorKind::NotFound);
                assert_eq!(path.as_deref(), Some(dir.path()));
            }
            other => panic!("expected an I/O error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_toml_is_parse_error() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[network\ntimeout = ").unwrap();

        let result = Config::load_from_file(temp_file.path()).await;
        assert!(matches!(
            result,
            Err(lxpkg_errors::Error::Config(
                lxpkg_errors::ConfigError::ParseError { .. }
            ))
        ));
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.general.color, ColorChoice::Auto);
        assert_eq!(config.network.timeout, 300);
        assert_eq!(config.network.retries, 3);
        assert_eq!(config.build.shell, "sh");
        assert_eq!(config.build.escalation.mode, EscalationMode::FrontEnd);
        assert_eq!(config.build.escalation.program, "pkexec");
        assert_eq!(config.install_root(), PathBuf::from("/usr"));
        assert!(config.source_root().ends_with("sources"));
        assert_eq!(config.build_root(), config.source_root().join("build"));
    }

    #[test]
    fn test_merge_env() {
        let mut config = Config::default();
        config
            .merge_env_from(lookup(&[
                ("LXPKG_SOURCE_ROOT", "/tmp/src"),
                ("LXPKG_INSTALL_ROOT", "/tmp/prefix"),
                ("LXPKG_COLOR", "always"),
                ("LXPKG_ESCALATION", "doas-front"),
                ("LXPKG_NETWORK_TIMEOUT", "42"),
            ]))
            .unwrap();

        assert_eq!(config.general.color, ColorChoice::Always);
        assert_eq!(config.build.escalation.program, "doas-front");
        assert_eq!(config.build.escalation.mode, EscalationMode::FrontEnd);
        assert_eq!(config.network.timeout, 42);
        assert_eq!(
            config.roots(),
            Roots::new("/tmp/src", "/tmp/src/build", "/tmp/prefix")
        );
    }

    #[test]
    fn test_env_passthrough_escalation() {
        let mut config = Config::default();
        config
            .merge_env_from(lookup(&[("LXPKG_ESCALATION", "passthrough")]))
            .unwrap();
        assert_eq!(config.build.escalation.mode, EscalationMode::Passthrough);
    }

    #[test]
    fn test_invalid_env_value() {
        let mut config = Config::default();
        let result = config.merge_env_from(lookup(&[("LXPKG_COLOR", "sometimes")]));
        assert!(result.is_err());

        let mut config = Config::default();
        let result = config.merge_env_from(lookup(&[("LXPKG_NETWORK_TIMEOUT", "soon")]));
        assert!(matches!(
            result,
            Err(lxpkg_errors::Error::Config(
                lxpkg_errors::ConfigError::InvalidValue { ref field, .. }
            )) if field == "LXPKG_NETWORK_TIMEOUT"
        ));
    }
}
