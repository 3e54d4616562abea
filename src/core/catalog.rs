use crate::domain::model::ProbeTarget;
use std::collections::HashSet;
use std::ops::RangeInclusive;

pub const AUTO_LABEL_PREFIX: &str = "AUTO-";

/// 固定的 CID 清單（順序與代碼不變）
pub fn curated_codes() -> Vec<ProbeTarget> {
    [
        // 搜尋引擎
        ("Google Maps 1", 1833982),
        ("Google Maps 2", 1917615),
        ("Google Maps 3", 1829668),
        ("Google Search 1", 1908617),
        ("Google Search 2", 1921868),
        ("Google Search 3", 1922847),
        ("Naver", 1881505),
        ("Bing", 1911217),
        ("Daum", 1908762),
        ("DuckDuckGo", 1895204),
        // 信用卡
        ("KB Kookmin Card", 1563295),
        ("Woori Card", 1654104),
        ("Woori Card (Master)", 1932810),
        ("BC Card", 1748498),
        ("Shinhan Card", 1760133),
        ("Shinhan Card (Master)", 1917257),
        ("Toss", 1917334),
        ("Hana Card", 1729471),
        ("Kakao Pay", 1845109),
        ("Mastercard", 1889572),
        ("UnionPay", 1801110),
        ("Visa", 1889319),
        // 航空公司
        ("Korean Air", 1904827),
        ("Asiana Airlines", 1806212),
        ("Air Seoul", 1800120),
    ]
    .into_iter()
    .map(|(label, code)| ProbeTarget::new(label, code))
    .collect()
}

/// 產生每次執行要檢查的 CID 清單：固定清單 + 隨機代碼
#[derive(Debug, Clone)]
pub struct CodeCatalog {
    curated: Vec<ProbeTarget>,
    random_count: usize,
    random_range: RangeInclusive<u64>,
}

impl CodeCatalog {
    pub fn new(curated: Vec<ProbeTarget>, random_count: usize, random_range: RangeInclusive<u64>) -> Self {
        Self {
            curated,
            random_count,
            random_range,
        }
    }

    pub fn build_catalog(&self) -> Vec<ProbeTarget> {
        self.build_catalog_with(&mut fastrand::Rng::new())
    }

    /// 以指定的亂數來源產生清單（測試時可固定 seed）
    ///
    /// 隨機代碼彼此不重複，也不與固定清單重複（比只在隨機代碼間去重更嚴格）。
    /// 範圍為空時不產生隨機代碼。
    pub fn build_catalog_with(&self, rng: &mut fastrand::Rng) -> Vec<ProbeTarget> {
        let mut targets = self.curated.clone();
        let curated: HashSet<u64> = self.curated.iter().map(|t| t.code).collect();
        if self.random_range.is_empty() {
            tracing::warn!(
                "🔶 Random code range {:?} is empty, using curated codes only",
                self.random_range
            );
            return targets;
        }

        // 範圍內可用的代碼數不足時，只產生能產生的數量
        let span = self
            .random_range
            .end()
            .saturating_sub(*self.random_range.start())
            .saturating_add(1);
        let available = span.saturating_sub(
            curated
                .iter()
                .filter(|code| self.random_range.contains(code))
                .count() as u64,
        );
        let wanted = (self.random_count as u64).min(available) as usize;

        let mut generated = HashSet::with_capacity(wanted);
        while generated.len() < wanted {
            let code = rng.u64(self.random_range.clone());
            if curated.contains(&code) || !generated.insert(code) {
                continue;
            }
            targets.push(ProbeTarget::new(format!("{}{}", AUTO_LABEL_PREFIX, code), code));
        }

        tracing::debug!(
            "🗂️ Catalog built: {} curated + {} generated codes",
            self.curated.len(),
            generated.len()
        );
        targets
    }
}
