mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config = parse_config(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}

/// Parse and validate configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./config.toml",
        "./clipvault.toml",
        "~/.config/clipvault/config.toml",
        "/etc/clipvault/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.storage.roots.is_empty() {
        anyhow::bail!("At least one storage root must be configured");
    }

    if config.storage.min_fragment_len == 0 {
        anyhow::bail!("storage.min_fragment_len must be at least 1");
    }

    if config.storage.min_numeric_token_len == 0 {
        anyhow::bail!("storage.min_numeric_token_len must be at least 1");
    }

    if config.storage.canonical_extension.trim_start_matches('.').is_empty() {
        anyhow::bail!("storage.canonical_extension cannot be empty");
    }

    for kind in [RootKind::Canonical, RootKind::LegacyUpload, RootKind::Intake] {
        let count = config.storage.roots.iter().filter(|r| r.kind == kind).count();
        if count > 1 {
            tracing::warn!(
                ?kind,
                count,
                "Multiple storage roots of the same kind; only the first is used by its strategy"
            );
        }
    }

    for root in &config.storage.roots {
        if !root.path.exists() {
            tracing::warn!("Storage root does not exist: {:?}", root.path);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.storage.canonical_extension, "mp4");
        assert!(config.storage.first_root(RootKind::Canonical).is_some());
    }

    #[test]
    fn test_parse_storage_roots_in_order() {
        let config = parse_config(
            r#"
            [storage]
            upload_root = "/srv/uploads"

            [[storage.roots]]
            kind = "canonical"
            path = "/srv/block"

            [[storage.roots]]
            kind = "intake"
            path = "/srv/misc"

            [[storage.roots]]
            kind = "archive"
            path = "/srv/block/videos"
            "#,
        )
        .unwrap();

        let kinds: Vec<RootKind> = config.storage.roots.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![RootKind::Canonical, RootKind::Intake, RootKind::Archive]
        );
        assert_eq!(
            config.storage.first_root(RootKind::Intake),
            Some(Path::new("/srv/misc"))
        );
        assert!(config.storage.first_root(RootKind::LegacyUpload).is_none());
    }

    #[test]
    fn test_scan_roots_dedupes_and_appends_upload_root() {
        let config = parse_config(
            r#"
            [storage]
            upload_root = "/srv/uploads"

            [[storage.roots]]
            kind = "canonical"
            path = "/srv/block"

            [[storage.roots]]
            kind = "archive"
            path = "/srv/block"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.storage.scan_roots(),
            vec![Path::new("/srv/block"), Path::new("/srv/uploads")]
        );
    }

    #[test]
    fn test_rejects_zero_port() {
        let err = parse_config("[server]\nport = 0\n").unwrap_err();
        assert!(err.to_string().contains("port"));
    }

    #[test]
    fn test_rejects_empty_roots() {
        let err = parse_config("[storage]\nroots = []\n").unwrap_err();
        assert!(err.to_string().contains("storage root"));
    }

    #[test]
    fn test_rejects_unknown_root_kind() {
        let result = parse_config(
            r#"
            [[storage.roots]]
            kind = "tape"
            path = "/srv/tape"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[server]\nport = 9090\npublic_hosts = [\"videos.internal\"]\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.public_hosts, vec!["videos.internal"]);
        assert!(!config.server.diagnostics);
    }
}
