use crate::domain::model::OfferQuote;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 價格欄位的格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceFormat {
    /// JSON 數字
    Number,
    /// 含貨幣符號、千分位的字串，例如 "₩ 123,456"
    Formatted,
}

/// 一條具名的價格欄位路徑，例如 `rooms.0.directPrice.originalPrice`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePath {
    pub name: String,
    pub path: String,
    pub format: PriceFormat,
}

impl PricePath {
    pub fn new(name: &str, path: &str, format: PriceFormat) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            format,
        }
    }

    /// 取得可用的正數價格，沒有就回傳 None
    pub fn price_in(&self, doc: &Value) -> Option<f64> {
        let value = lookup_path(doc, &self.path)?;
        let price = match self.format {
            PriceFormat::Number => value.as_f64()?,
            PriceFormat::Formatted => parse_formatted_price(value.as_str()?)?,
        };
        (price.is_finite() && price > 0.0).then_some(price)
    }
}

/// 依序套用價格路徑，第一個有正數價格的路徑勝出
#[derive(Debug, Clone)]
pub struct OfferExtractor {
    price_paths: Vec<PricePath>,
    hotel_name_path: String,
}

impl OfferExtractor {
    pub fn new(price_paths: Vec<PricePath>, hotel_name_path: impl Into<String>) -> Self {
        Self {
            price_paths,
            hotel_name_path: hotel_name_path.into(),
        }
    }

    pub fn extract(&self, doc: &Value) -> OfferQuote {
        let matched = self
            .price_paths
            .iter()
            .find_map(|path| path.price_in(doc).map(|price| (path, price)));

        match matched {
            Some((path, price)) => tracing::trace!("price {} taken from '{}'", price, path.name),
            None => tracing::trace!("no price path matched; treating as sold out"),
        }

        OfferQuote::new(matched.map(|(_, price)| price), self.hotel_name(doc))
    }

    fn hotel_name(&self, doc: &Value) -> Option<String> {
        lookup_path(doc, &self.hotel_name_path)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
    }
}

impl Default for OfferExtractor {
    fn default() -> Self {
        Self::new(
            crate::config::settings::default_price_paths(),
            "hotelInfo.name",
        )
    }
}

/// 以點分隔的路徑取值，數字段落對應陣列索引
pub fn lookup_path<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(doc, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|idx| items.get(idx)),
            _ => None,
        })
        .filter(|value| !value.is_null())
}

/// 去掉貨幣符號與千分位後重新解析
fn parse_formatted_price(text: &str) -> Option<f64> {
    let digits: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let digits = digits.trim_matches('.');
    if digits.is_empty() {
        return None;
    }
    digits.parse::<f64>().ok()
}
