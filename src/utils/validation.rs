use crate::core::rewrite::has_code;
use crate::utils::error::{CompareError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(CompareError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(CompareError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(CompareError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(CompareError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(CompareError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(CompareError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CompareError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(CompareError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// 驗證使用者輸入的飯店詳細頁 URL，回傳去除空白後的 URL
///
/// 檢查順序：空值、URL 格式、網域、搜尋頁、cid 參數。
pub fn validate_listing_url(raw: &str, domain: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(rejected("Please enter a hotel page URL"));
    }

    let url = Url::parse(trimmed)
        .map_err(|_| rejected("The input is not a valid URL"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(rejected("The URL must start with http:// or https://"));
    }

    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    let domain = domain.to_ascii_lowercase();
    if host != domain && !host.ends_with(&format!(".{}", domain)) {
        return Err(rejected(&format!("The URL must point to {}", domain)));
    }

    if url.path().contains("/search") {
        return Err(rejected(
            "Search result pages are not supported; open a single hotel page and copy its URL",
        ));
    }

    // 與改寫使用同一套規則，fragment 內的 cid 不算
    let before_fragment = trimmed.split_once('#').map_or(trimmed, |(head, _)| head);
    if !has_code(before_fragment) {
        return Err(rejected("The URL must contain a cid parameter"));
    }

    Ok(trimmed.to_string())
}

fn rejected(message: &str) -> CompareError {
    CompareError::ValidationError {
        message: message.to_string(),
    }
}
