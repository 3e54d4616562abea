pub mod settings;
pub mod toml_config;

use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{validate_path, Validate};
use settings::{CompareSettings, Schedule};
use toml_config::TomlConfig;

#[cfg(feature = "cli")]
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(Parser))]
#[cfg_attr(feature = "cli", command(name = "cid-compare"))]
#[cfg_attr(
    feature = "cli",
    command(about = "Compare a hotel's price across affiliate CIDs")
)]
pub struct CliConfig {
    /// 飯店詳細頁 URL（需含 cid 參數）
    pub url: String,

    #[cfg_attr(feature = "cli", arg(long, help = "TOML config file"))]
    pub config: Option<String>,

    #[cfg_attr(feature = "cli", arg(long, help = "Probe one CID at a time"))]
    pub sequential: bool,

    #[cfg_attr(feature = "cli", arg(long, help = "Parallel probe width"))]
    pub concurrency: Option<usize>,

    #[cfg_attr(feature = "cli", arg(long, help = "Number of random CIDs to add"))]
    pub random_codes: Option<usize>,

    #[cfg_attr(feature = "cli", arg(long))]
    pub max_attempts: Option<u32>,

    #[cfg_attr(feature = "cli", arg(long, help = "Stop waiting after N seconds"))]
    pub run_timeout_secs: Option<u64>,

    #[cfg_attr(feature = "cli", arg(long, help = "Write a zip report to this directory"))]
    pub export_dir: Option<String>,

    #[cfg_attr(feature = "cli", arg(long, help = "Print the response as JSON"))]
    pub json: bool,

    #[cfg_attr(feature = "cli", arg(long, help = "Enable verbose output"))]
    pub verbose: bool,

    #[cfg_attr(feature = "cli", arg(skip))]
    #[serde(skip)]
    pub file: Option<TomlConfig>,
}

impl CliConfig {
    /// 讀入 `--config` 指定的檔案；沒有指定時不做事
    pub fn load_file(mut self) -> Result<Self> {
        if let Some(path) = &self.config {
            tracing::debug!("📄 Loading config file {}", path);
            self.file = Some(TomlConfig::from_file(path)?);
        }
        Ok(self)
    }

    fn apply_overrides(&self, settings: &mut CompareSettings) {
        if self.sequential {
            settings.schedule = Schedule::Sequential;
        } else if let Some(width) = self.concurrency {
            settings.schedule = Schedule::Parallel { width };
        }
        if let Some(count) = self.random_codes {
            settings.random_code_count = count;
        }
        if let Some(max_attempts) = self.max_attempts {
            settings.max_attempts = max_attempts;
        }
        if self.run_timeout_secs.is_some() {
            settings.run_timeout_secs = self.run_timeout_secs;
        }
    }
}

impl ConfigProvider for CliConfig {
    fn compare_settings(&self) -> Result<CompareSettings> {
        let mut settings = match &self.file {
            Some(file) => file.to_settings()?,
            None => CompareSettings::default(),
        };
        self.apply_overrides(&mut settings);
        Ok(settings)
    }

    fn export_dir(&self) -> Option<&str> {
        self.export_dir
            .as_deref()
            .or_else(|| self.file.as_ref().and_then(|file| file.export_dir()))
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(file) = &self.file {
            file.validate()?;
        }
        self.compare_settings()?.validate()?;
        if let Some(dir) = self.export_dir() {
            validate_path("export_dir", dir)?;
        }
        Ok(())
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const URL: &str = "https://www.agoda.com/h/seoul.html?cid=-1";

    #[test]
    fn test_defaults_without_flags() {
        let config = CliConfig::parse_from(["cid-compare", URL]);
        assert_eq!(config.url, URL);
        assert_eq!(config.compare_settings().unwrap(), CompareSettings::default());
        assert!(config.export_dir().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = CliConfig::parse_from([
            "cid-compare",
            URL,
            "--concurrency",
            "3",
            "--random-codes",
            "0",
            "--max-attempts",
            "5",
            "--run-timeout-secs",
            "30",
        ]);
        let settings = config.compare_settings().unwrap();
        assert_eq!(settings.schedule, Schedule::Parallel { width: 3 });
        assert_eq!(settings.random_code_count, 0);
        assert_eq!(settings.max_attempts, 5);
        assert_eq!(settings.run_timeout_secs, Some(30));
    }

    #[test]
    fn test_sequential_wins_over_concurrency() {
        let config =
            CliConfig::parse_from(["cid-compare", URL, "--sequential", "--concurrency", "8"]);
        assert_eq!(
            config.compare_settings().unwrap().schedule,
            Schedule::Sequential
        );
    }

    #[test]
    fn test_flags_override_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[compare]\nmax_attempts = 2\nwidth = 4\n\n[output]\nexport_dir = \"./from-file\"\n")
            .unwrap();
        let path = temp_file.path().to_string_lossy().to_string();

        let config = CliConfig::parse_from(["cid-compare", URL, "--config", &path])
            .load_file()
            .unwrap();
        let settings = config.compare_settings().unwrap();
        assert_eq!(settings.max_attempts, 2);
        assert_eq!(settings.schedule, Schedule::Parallel { width: 4 });
        assert_eq!(config.export_dir(), Some("./from-file"));

        let config = CliConfig::parse_from([
            "cid-compare",
            URL,
            "--config",
            &path,
            "--max-attempts",
            "4",
            "--export-dir",
            "./from-flag",
        ])
        .load_file()
        .unwrap();
        assert_eq!(config.compare_settings().unwrap().max_attempts, 4);
        assert_eq!(config.export_dir(), Some("./from-flag"));
    }

    #[test]
    fn test_invalid_override_fails_validation() {
        let config = CliConfig::parse_from(["cid-compare", URL, "--max-attempts", "0"]);
        assert!(config.validate().is_err());
    }
}
