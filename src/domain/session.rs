use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

static CODE_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(cid=)-?\d+").expect("valid code pattern"));
static TICK_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(tick=)\d+").expect("valid tick pattern"));

/// 預熱過的瀏覽狀態（cookies）
///
/// 每個 probe 取得自己的副本：`for_code` 只改寫白名單內 cookie 的 cid 與時間戳，
/// 原本的 Session 不會被修改，平行執行時不互相干擾。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub cookies: BTreeMap<String, String>,
    #[serde(default = "default_rewritable")]
    pub rewritable: Vec<String>,
}

fn default_rewritable() -> Vec<String> {
    vec!["agoda.attr.03".to_string(), "agoda.lastclicks".to_string()]
}

impl Default for Session {
    fn default() -> Self {
        Self::new(BTreeMap::new())
    }
}

impl Session {
    pub fn new(cookies: BTreeMap<String, String>) -> Self {
        Self {
            cookies,
            rewritable: default_rewritable(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn for_code(&self, code: u64, now: DateTime<Utc>) -> Session {
        let code_value = format!("${{1}}{}", code);
        let tick_value = format!("${{1}}{}", now.timestamp_millis());

        let cookies = self
            .cookies
            .iter()
            .map(|(name, value)| {
                if !self.rewritable.iter().any(|allowed| allowed == name) {
                    return (name.clone(), value.clone());
                }
                let value = CODE_FIELD.replace_all(value, code_value.as_str());
                let value = TICK_FIELD.replace_all(&value, tick_value.as_str());
                (name.clone(), value.into_owned())
            })
            .collect();

        Session {
            cookies,
            rewritable: self.rewritable.clone(),
        }
    }

    /// 疊加使用者瀏覽器帶來的 cookies（同名時以使用者的為準），白名單不變
    pub fn with_cookies(&self, extra: &BTreeMap<String, String>) -> Session {
        let mut cookies = self.cookies.clone();
        cookies.extend(extra.iter().map(|(name, value)| (name.clone(), value.clone())));
        Session {
            cookies,
            rewritable: self.rewritable.clone(),
        }
    }

    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}
