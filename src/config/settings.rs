use crate::core::extractor::{PriceFormat, PricePath};
use crate::domain::model::{AffiliateLink, ProbeTarget};
use crate::domain::session::Session;
use crate::utils::error::{CompareError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_range, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_ORIGIN: &str = "https://www.agoda.com";
pub const DEFAULT_DOMAIN: &str = "agoda.com";
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "ko,ko-KR;q=0.9,en-US;q=0.8,en;q=0.7";
pub const DEFAULT_LOCALE: &str = "ko-kr";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
pub const DEFAULT_MARKER_SELECTOR: &str = r#"script[data-selenium="script-initparam"]"#;
pub const DEFAULT_ENDPOINT_KEY: &str = "apiUrl";
pub const HOTEL_NAME_NOT_FOUND: &str = "Hotel name not found";

/// 排程方式：依序或固定寬度的平行
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Schedule {
    Sequential,
    Parallel { width: usize },
}

impl Schedule {
    pub fn width(&self) -> usize {
        match self {
            Schedule::Sequential => 1,
            Schedule::Parallel { width } => (*width).max(1),
        }
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Schedule::Parallel { width: 6 }
    }
}

/// 比價引擎所有可調整的參數
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareSettings {
    pub site_origin: String,
    pub site_domain: String,
    pub accept_language: String,
    pub locale: String,
    pub user_agent: String,
    pub page_timeout_secs: u64,
    pub api_timeout_secs: u64,
    pub marker_selector: String,
    pub endpoint_key: String,

    pub schedule: Schedule,
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    pub run_timeout_secs: Option<u64>,

    pub curated_codes: Vec<ProbeTarget>,
    pub random_code_count: usize,
    pub random_code_min: u64,
    pub random_code_max: u64,

    pub price_paths: Vec<PricePath>,
    pub hotel_name_path: String,
    pub hotel_name_fallback: String,

    pub session: Session,
    pub affiliate_links: Vec<AffiliateLink>,
}

impl Default for CompareSettings {
    fn default() -> Self {
        Self {
            site_origin: DEFAULT_ORIGIN.to_string(),
            site_domain: DEFAULT_DOMAIN.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            locale: DEFAULT_LOCALE.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            page_timeout_secs: 10,
            api_timeout_secs: 8,
            marker_selector: DEFAULT_MARKER_SELECTOR.to_string(),
            endpoint_key: DEFAULT_ENDPOINT_KEY.to_string(),
            schedule: Schedule::default(),
            max_attempts: 3,
            backoff_base_ms: 500,
            min_delay_ms: 100,
            max_delay_ms: 300,
            run_timeout_secs: None,
            curated_codes: crate::core::catalog::curated_codes(),
            random_code_count: 10,
            random_code_min: 1_000_000,
            random_code_max: 1_999_999,
            price_paths: default_price_paths(),
            hotel_name_path: "hotelInfo.name".to_string(),
            hotel_name_fallback: HOTEL_NAME_NOT_FOUND.to_string(),
            session: Session::default(),
            affiliate_links: default_affiliate_links(),
        }
    }
}

pub fn default_price_paths() -> Vec<PricePath> {
    vec![
        PricePath::new("discount", "discount.cheapestPrice", PriceFormat::Number),
        PricePath::new(
            "mosaic-discount",
            "mosaicInitData.discount.cheapestPrice",
            PriceFormat::Number,
        ),
        PricePath::new(
            "first-room",
            "rooms.0.directPrice.originalPrice",
            PriceFormat::Number,
        ),
        PricePath::new(
            "discount-text",
            "discount.cheapestPriceWithCurrency",
            PriceFormat::Formatted,
        ),
    ]
}

pub fn default_affiliate_links() -> Vec<AffiliateLink> {
    vec![
        AffiliateLink {
            label: "Agoda Partners".to_string(),
            url: "https://partners.agoda.com/".to_string(),
        },
        AffiliateLink {
            label: "Agoda Coupons".to_string(),
            url: "https://www.agoda.com/ko-kr/deals".to_string(),
        },
    ]
}

impl CompareSettings {
    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn run_timeout(&self) -> Option<Duration> {
        self.run_timeout_secs.map(Duration::from_secs)
    }

    pub fn delay_range_ms(&self) -> (u64, u64) {
        (self.min_delay_ms, self.max_delay_ms.max(self.min_delay_ms))
    }
}

impl Validate for CompareSettings {
    fn validate(&self) -> Result<()> {
        validate_url("site.origin", &self.site_origin)?;
        validate_non_empty_string("site.domain", &self.site_domain)?;
        validate_non_empty_string("site.marker_selector", &self.marker_selector)?;
        validate_non_empty_string("site.endpoint_key", &self.endpoint_key)?;
        validate_range("compare.max_attempts", self.max_attempts, 1, 10)?;
        validate_positive_number("compare.page_timeout_secs", self.page_timeout_secs as usize, 1)?;
        validate_positive_number("compare.api_timeout_secs", self.api_timeout_secs as usize, 1)?;

        if let Schedule::Parallel { width } = self.schedule {
            validate_range("compare.schedule.width", width, 1, 32)?;
        }

        if self.min_delay_ms > self.max_delay_ms {
            return Err(CompareError::ConfigValidationError {
                field: "compare.min_delay_ms".to_string(),
                message: "min_delay_ms must not exceed max_delay_ms".to_string(),
            });
        }

        if self.random_code_min > self.random_code_max {
            return Err(CompareError::ConfigValidationError {
                field: "catalog.random_code_min".to_string(),
                message: "random code range is empty".to_string(),
            });
        }

        if self.price_paths.is_empty() {
            return Err(CompareError::MissingConfigError {
                field: "extract.price_paths".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = CompareSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.max_attempts, 3);
        assert_eq!(settings.schedule.width(), 6);
    }

    #[test]
    fn test_sequential_width_is_one() {
        assert_eq!(Schedule::Sequential.width(), 1);
        assert_eq!(Schedule::Parallel { width: 0 }.width(), 1);
    }

    #[test]
    fn test_rejects_inverted_delay_range() {
        let settings = CompareSettings {
            min_delay_ms: 500,
            max_delay_ms: 100,
            ..CompareSettings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_attempts() {
        let settings = CompareSettings {
            max_attempts: 0,
            ..CompareSettings::default()
        };
        assert!(settings.validate().is_err());
    }
}
