use crate::config::settings::{CompareSettings, Schedule};
use crate::core::extractor::PricePath;
use crate::core::ConfigProvider;
use crate::domain::model::{AffiliateLink, ProbeTarget};
use crate::domain::session::Session;
use crate::utils::error::{CompareError, Result};
use crate::utils::validation::{validate_path, validate_url, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 設定檔結構，所有區段皆可省略，省略時使用 `CompareSettings::default()`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub compare: CompareConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    pub session: Option<Session>,
    #[serde(default)]
    pub extract: ExtractConfig,
    pub affiliates: Option<Vec<AffiliateLink>>,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    pub origin: Option<String>,
    pub domain: Option<String>,
    pub accept_language: Option<String>,
    pub locale: Option<String>,
    pub user_agent: Option<String>,
    pub page_timeout_secs: Option<u64>,
    pub api_timeout_secs: Option<u64>,
    pub marker_selector: Option<String>,
    pub endpoint_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompareConfig {
    /// "parallel" 或 "sequential"
    pub mode: Option<String>,
    pub width: Option<usize>,
    pub max_attempts: Option<u32>,
    pub backoff_base_ms: Option<u64>,
    pub min_delay_ms: Option<u64>,
    pub max_delay_ms: Option<u64>,
    pub run_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// 取代內建的精選 CID 清單
    pub codes: Option<Vec<ProbeTarget>>,
    pub random_code_count: Option<usize>,
    pub random_code_min: Option<u64>,
    pub random_code_max: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractConfig {
    pub price_paths: Option<Vec<PricePath>>,
    pub hotel_name_path: Option<String>,
    pub hotel_name_fallback: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    pub export_dir: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(CompareError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| CompareError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${SESSION_COOKIE})，找不到的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| CompareError::UnexpectedError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    fn schedule(&self) -> Result<Option<Schedule>> {
        let width = self.compare.width;
        match self.compare.mode.as_deref() {
            None => Ok(width.map(|width| Schedule::Parallel { width })),
            Some("sequential") => Ok(Some(Schedule::Sequential)),
            Some("parallel") => Ok(Some(Schedule::Parallel {
                width: width.unwrap_or(Schedule::default().width()),
            })),
            Some(other) => Err(CompareError::InvalidConfigValueError {
                field: "compare.mode".to_string(),
                value: other.to_string(),
                reason: "Valid modes: parallel, sequential".to_string(),
            }),
        }
    }

    /// 把檔案內容疊加在預設值上
    pub fn to_settings(&self) -> Result<CompareSettings> {
        let mut settings = CompareSettings::default();

        let site = &self.site;
        if let Some(origin) = &site.origin {
            settings.site_origin = origin.clone();
        }
        if let Some(domain) = &site.domain {
            settings.site_domain = domain.clone();
        }
        if let Some(accept_language) = &site.accept_language {
            settings.accept_language = accept_language.clone();
        }
        if let Some(locale) = &site.locale {
            settings.locale = locale.clone();
        }
        if let Some(user_agent) = &site.user_agent {
            settings.user_agent = user_agent.clone();
        }
        if let Some(secs) = site.page_timeout_secs {
            settings.page_timeout_secs = secs;
        }
        if let Some(secs) = site.api_timeout_secs {
            settings.api_timeout_secs = secs;
        }
        if let Some(selector) = &site.marker_selector {
            settings.marker_selector = selector.clone();
        }
        if let Some(key) = &site.endpoint_key {
            settings.endpoint_key = key.clone();
        }

        if let Some(schedule) = self.schedule()? {
            settings.schedule = schedule;
        }
        let compare = &self.compare;
        if let Some(max_attempts) = compare.max_attempts {
            settings.max_attempts = max_attempts;
        }
        if let Some(ms) = compare.backoff_base_ms {
            settings.backoff_base_ms = ms;
        }
        if let Some(ms) = compare.min_delay_ms {
            settings.min_delay_ms = ms;
        }
        if let Some(ms) = compare.max_delay_ms {
            settings.max_delay_ms = ms;
        }
        if compare.run_timeout_secs.is_some() {
            settings.run_timeout_secs = compare.run_timeout_secs;
        }

        let catalog = &self.catalog;
        if let Some(codes) = &catalog.codes {
            settings.curated_codes = codes.clone();
        }
        if let Some(count) = catalog.random_code_count {
            settings.random_code_count = count;
        }
        if let Some(min) = catalog.random_code_min {
            settings.random_code_min = min;
        }
        if let Some(max) = catalog.random_code_max {
            settings.random_code_max = max;
        }

        if let Some(session) = &self.session {
            settings.session = session.clone();
        }

        if let Some(paths) = &self.extract.price_paths {
            settings.price_paths = paths.clone();
        }
        if let Some(path) = &self.extract.hotel_name_path {
            settings.hotel_name_path = path.clone();
        }
        if let Some(fallback) = &self.extract.hotel_name_fallback {
            settings.hotel_name_fallback = fallback.clone();
        }

        if let Some(affiliates) = &self.affiliates {
            settings.affiliate_links = affiliates.clone();
        }

        Ok(settings)
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        self.to_settings()?.validate()?;

        if let Some(affiliates) = &self.affiliates {
            for link in affiliates {
                validate_url("affiliates.url", &link.url)?;
            }
        }

        if let Some(dir) = &self.output.export_dir {
            validate_path("output.export_dir", dir)?;
        }

        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn compare_settings(&self) -> Result<CompareSettings> {
        self.to_settings()
    }

    fn export_dir(&self) -> Option<&str> {
        self.output.export_dir.as_deref()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
