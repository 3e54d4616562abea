use regex::Regex;
use std::sync::LazyLock;

static CODE_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([?&])cid=-?\d+([&#]|$)").expect("valid cid pattern"));

/// 把 URL 中第一個 cid 參數換成新的代碼，其他參數保持不變
pub fn replace_code(url: &str, code: u64) -> String {
    CODE_PARAM
        .replacen(url, 1, format!("${{1}}cid={}${{2}}", code).as_str())
        .into_owned()
}

/// URL 是否帶有 `replace_code` 能改寫的 cid 參數（未經 percent-encoding 的整數）
pub fn has_code(url: &str) -> bool {
    CODE_PARAM.is_match(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replaces_existing_code() {
        let url = "https://www.agoda.com/h/x.html?checkIn=2025-07-01&cid=1844104&los=1";
        assert_eq!(
            replace_code(url, 1563295),
            "https://www.agoda.com/h/x.html?checkIn=2025-07-01&cid=1563295&los=1"
        );
    }

    #[test]
    fn test_has_code() {
        assert!(has_code("https://www.agoda.com/h.html?cid=-1"));
        assert!(has_code("https://www.agoda.com/h.html?los=1&cid=7#rooms"));
        assert!(!has_code("https://www.agoda.com/h.html?cid=%2B1844104"));
        assert!(!has_code("https://www.agoda.com/h.html?cid=12abc"));
        assert!(!has_code("https://www.agoda.com/h.html?tcid=5"));
    }

    #[test]
    fn test_keeps_fragment_after_code() {
        assert_eq!(
            replace_code("https://www.agoda.com/h.html?cid=1#rooms", 42),
            "https://www.agoda.com/h.html?cid=42#rooms"
        );
    }

    #[test]
    fn test_replaces_placeholder_code() {
        assert_eq!(
            replace_code("https://www.agoda.com/h.html?cid=-1", 1800120),
            "https://www.agoda.com/h.html?cid=1800120"
        );
    }

    #[test]
    fn test_ignores_similarly_named_params() {
        let url = "https://www.agoda.com/h.html?tcid=5&cid=7";
        assert_eq!(replace_code(url, 9), "https://www.agoda.com/h.html?tcid=5&cid=9");
    }

    #[test]
    fn test_url_without_code_is_unchanged() {
        let url = "https://www.agoda.com/h.html?los=1";
        assert_eq!(replace_code(url, 9), url);
    }
}
