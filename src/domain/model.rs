use serde::{Deserialize, Serialize};

/// 一個要檢查的 CID（標籤 + 代碼）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeTarget {
    pub label: String,
    #[serde(rename = "cid")]
    pub code: u64,
}

impl ProbeTarget {
    pub fn new(label: impl Into<String>, code: u64) -> Self {
        Self {
            label: label.into(),
            code,
        }
    }
}

/// 單一 CID 的檢查結果，每個 ProbeTarget 恰好產生一筆
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeResult {
    pub label: String,
    #[serde(rename = "cid")]
    pub code: u64,
    #[serde(rename = "url")]
    pub rewritten_url: String,
    pub price: f64,
    pub sold_out: bool,
    pub hotel_name: Option<String>,
}

impl ProbeResult {
    /// 依報價建立結果；價格為 0 時必為售罄
    pub fn from_quote(target: &ProbeTarget, rewritten_url: String, quote: OfferQuote) -> Self {
        Self {
            label: target.label.clone(),
            code: target.code,
            rewritten_url,
            price: quote.price,
            sold_out: quote.sold_out,
            hotel_name: quote.hotel_name,
        }
    }

    /// 重試用盡時的售罄結果
    pub fn sold_out(target: &ProbeTarget, rewritten_url: String) -> Self {
        Self::from_quote(target, rewritten_url, OfferQuote::unavailable())
    }

    pub fn is_bookable(&self) -> bool {
        !self.sold_out && self.price > 0.0
    }
}

/// Extractor 的輸出
#[derive(Debug, Clone, PartialEq)]
pub struct OfferQuote {
    pub price: f64,
    pub sold_out: bool,
    pub hotel_name: Option<String>,
}

impl OfferQuote {
    pub fn new(price: Option<f64>, hotel_name: Option<String>) -> Self {
        let price = price.filter(|p| p.is_finite() && *p > 0.0).unwrap_or(0.0);
        Self {
            price,
            sold_out: price == 0.0,
            hotel_name,
        }
    }

    pub fn unavailable() -> Self {
        Self::new(None, None)
    }
}

/// 內部 API 的原始回應，只存在於單次嘗試中
#[derive(Debug, Clone, PartialEq)]
pub struct RawOfferDocument {
    pub endpoint_url: String,
    pub body: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffiliateLink {
    pub label: String,
    pub url: String,
}

/// 一次比價的彙總結果
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateReport {
    pub hotel_name: String,
    pub all_results: Vec<ProbeResult>,
    pub cheapest: Option<ProbeResult>,
    pub affiliate_links: Vec<AffiliateLink>,
    /// 依目錄順序第一份成功取得的原始回應，供除錯下載
    pub first_raw_response: Option<RawOfferDocument>,
}

/// 對外回應格式
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertResponse {
    pub success: bool,
    pub hotel: String,
    pub priced: Vec<ProbeResult>,
    pub cheapest: Option<ProbeResult>,
    pub affiliate_links: Vec<AffiliateLink>,
    pub total_cids: usize,
    pub collected_results: usize,
    /// 使用者原本 URL 的價格，取不到時為 0
    #[serde(default)]
    pub initial_price: f64,
}

impl ConvertResponse {
    pub fn from_report(report: &AggregateReport, total_cids: usize, initial_price: f64) -> Self {
        Self {
            success: true,
            initial_price,
            hotel: report.hotel_name.clone(),
            priced: report.all_results.clone(),
            cheapest: report.cheapest.clone(),
            affiliate_links: report.affiliate_links.clone(),
            total_cids,
            collected_results: report.all_results.len(),
        }
    }
}

/// 串流模式推送給訂閱者的事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RunEvent {
    Progress { percentage: u8 },
    Complete { result: ConvertResponse },
    Error { message: String },
}

impl RunEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunEvent::Progress { .. })
    }
}
