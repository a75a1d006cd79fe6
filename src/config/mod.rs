mod types;

pub use types::*;

use anyhow::{Context, Result};
use mediaforge_av::ToolPaths;
use std::path::{Path, PathBuf};

/// Environment variable overriding `storage.upload_dir`.
pub const ENV_UPLOAD_DIR: &str = "MEDIAFORGE_UPLOAD_DIR";
/// Environment variable overriding `storage.output_dir`.
pub const ENV_OUTPUT_DIR: &str = "MEDIAFORGE_OUTPUT_DIR";

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./mediaforge.toml",
        "~/.config/mediaforge/config.toml",
        "/etc/mediaforge/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    let mut config = Config::default();
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config)?;
    Ok(config)
}

/// Apply directory overrides from `lookup` (normally the process environment).
pub fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    let dir = |key: &str| {
        lookup(key)
            .filter(|v| !v.trim().is_empty())
            .map(|v| PathBuf::from(shellexpand::tilde(&v).as_ref()))
    };
    if let Some(path) = dir(ENV_UPLOAD_DIR) {
        config.storage.upload_dir = path;
    }
    if let Some(path) = dir(ENV_OUTPUT_DIR) {
        config.storage.output_dir = path;
    }
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.jobs.relay_capacity == 0 {
        anyhow::bail!("jobs.relay_capacity cannot be 0");
    }

    if config.jobs.diagnostic_tail_lines == 0 {
        anyhow::bail!("jobs.diagnostic_tail_lines cannot be 0");
    }

    if config.jobs.sweep_interval_secs == 0 {
        anyhow::bail!("jobs.sweep_interval_secs cannot be 0");
    }

    for (name, path) in [
        ("ffmpeg", &config.tools.ffmpeg_path),
        ("ffprobe", &config.tools.ffprobe_path),
        ("imagemagick", &config.tools.imagemagick_path),
    ] {
        if let Some(path) = path {
            if !path.exists() {
                tracing::warn!("Configured {} path does not exist: {:?}", name, path);
            }
        }
    }

    Ok(())
}

impl ToolsConfig {
    /// Resolve the configured overrides against `PATH`.
    pub fn resolve(&self) -> ToolPaths {
        ToolPaths::resolve(
            self.ffmpeg_path.as_deref(),
            self.ffprobe_path.as_deref(),
            self.imagemagick_path.as_deref(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.jobs.relay_capacity, 100);
        assert_eq!(config.jobs.diagnostic_tail_lines, 200);
        assert_eq!(config.jobs.max_job_age_secs, 3600);
        assert!(config.jobs.remove_input_on_success);
        assert_eq!(config.storage.output_dir, PathBuf::from("outputs"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
[storage]
output_dir = "/srv/converted"

[jobs]
relay_capacity = 16
"#,
        )
        .unwrap();
        assert_eq!(config.storage.output_dir, PathBuf::from("/srv/converted"));
        assert_eq!(config.storage.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.jobs.relay_capacity, 16);
        assert_eq!(config.jobs.sweep_interval_secs, 300);
    }

    #[test]
    fn test_overrides_from_lookup() {
        let mut config = Config::default();
        apply_env_overrides(&mut config, |key| match key {
            ENV_OUTPUT_DIR => Some("/data/out".to_string()),
            ENV_UPLOAD_DIR => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(config.storage.output_dir, PathBuf::from("/data/out"));
        assert_eq!(config.storage.upload_dir, PathBuf::from("uploads"));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let mut config = Config::default();
        config.jobs.relay_capacity = 0;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.jobs.diagnostic_tail_lines = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("diagnostic_tail_lines"));
    }
}
