//! 從頁面 HTML 找出內部 API 路徑
//!
//! 流程：以 CSS selector 找到標記的 inline script → 找 key token →
//! 開頭引號 → 對應的結尾引號 → 還原 HTML entity。

use scraper::{Html, Selector};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmbedError {
    #[error("marker script '{0}' not found in page")]
    MarkerMissing(String),

    #[error("key '{0}' with a quoted value not found in marker script")]
    KeyMissing(String),

    #[error("value for '{0}' has no closing quote")]
    UnterminatedLiteral(String),

    #[error("value for '{0}' is empty")]
    EmptyLiteral(String),

    #[error("invalid marker selector '{0}'")]
    InvalidSelector(String),
}

/// 標記 script 的位置與其中的 key
#[derive(Debug, Clone)]
pub struct EndpointLocator {
    selector: String,
    key: String,
}

impl EndpointLocator {
    pub fn new(selector: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            key: key.into(),
        }
    }

    /// 從整頁 HTML 取出端點路徑（已還原 entity）
    pub fn endpoint_from_page(&self, html: &str) -> Result<String, EmbedError> {
        let script = self.marker_text(html)?;
        let raw = extract_embedded_literal(&script, &self.key)?;
        Ok(decode_entities(&raw))
    }

    fn marker_text(&self, html: &str) -> Result<String, EmbedError> {
        let selector = Selector::parse(&self.selector)
            .map_err(|_| EmbedError::InvalidSelector(self.selector.clone()))?;
        let document = Html::parse_document(html);
        document
            .select(&selector)
            .next()
            .map(|el| el.text().collect::<String>())
            .ok_or_else(|| EmbedError::MarkerMissing(self.selector.clone()))
    }
}

/// 找出 `key = "value"` 中第一個符合語法的 value（不做格式驗證）
pub fn extract_embedded_literal(text: &str, key: &str) -> Result<String, EmbedError> {
    if key.is_empty() {
        return Err(EmbedError::KeyMissing(String::new()));
    }

    for (pos, _) in text.match_indices(key) {
        let preceded_by_ident = text[..pos]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$');
        if preceded_by_ident {
            continue;
        }

        let rest = text[pos + key.len()..].trim_start();
        let Some(rest) = rest.strip_prefix('=') else {
            continue;
        };
        let Some(body) = rest.trim_start().strip_prefix('"') else {
            continue;
        };

        let end = closing_quote(body).ok_or_else(|| EmbedError::UnterminatedLiteral(key.to_string()))?;
        if end == 0 {
            return Err(EmbedError::EmptyLiteral(key.to_string()));
        }
        return Ok(body[..end].to_string());
    }

    Err(EmbedError::KeyMissing(key.to_string()))
}

fn closing_quote(body: &str) -> Option<usize> {
    let mut escaped = false;
    for (idx, c) in body.char_indices() {
        match c {
            '\\' if !escaped => escaped = true,
            '"' if !escaped => return Some(idx),
            '\n' => return None,
            _ => escaped = false,
        }
    }
    None
}

/// 還原頁面裡被 HTML 轉義的字元（例如查詢字串中的 `&amp;`）
pub fn decode_entities(value: &str) -> String {
    const ENTITIES: [(&str, &str); 6] = [
        ("&amp;", "&"),
        ("&quot;", "\""),
        ("&#39;", "'"),
        ("&lt;", "<"),
        ("&gt;", ">"),
        ("&#x2F;", "/"),
    ];

    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(idx) = rest.find('&') {
        out.push_str(&rest[..idx]);
        let tail = &rest[idx..];
        match ENTITIES.iter().find(|(entity, _)| tail.starts_with(entity)) {
            Some((entity, replacement)) => {
                out.push_str(replacement);
                rest = &tail[entity.len()..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
