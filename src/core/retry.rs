use crate::core::extractor::OfferExtractor;
use crate::core::rewrite::replace_code;
use crate::core::{OfferQuote, OfferSource, ProbeResult, ProbeTarget, RawOfferDocument, Result};
use crate::domain::session::Session;
use std::sync::Arc;
use std::time::Duration;

/// 重試次數與遞增等待時間
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_base: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_base,
        }
    }

    /// 第 n 次失敗後的等待時間（線性遞增）
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_base.saturating_mul(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(500))
    }
}

/// 單一 CID 的處理結果，附帶原始回應與嘗試次數
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub result: ProbeResult,
    pub raw: Option<RawOfferDocument>,
    pub attempts: u32,
}

/// 對單一 CID 執行 resolve → fetch → extract，失敗時重試
///
/// 不會回傳錯誤：重試用盡時回傳價格 0、售罄的結果。
pub struct Prober<S: OfferSource> {
    source: Arc<S>,
    extractor: OfferExtractor,
    policy: RetryPolicy,
    session: Session,
    page_url: String,
}

impl<S: OfferSource> Prober<S> {
    pub fn new(
        source: Arc<S>,
        extractor: OfferExtractor,
        policy: RetryPolicy,
        session: Session,
        page_url: String,
    ) -> Self {
        Self {
            source,
            extractor,
            policy,
            session,
            page_url,
        }
    }

    /// 尚未改寫的 session 樣板
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub async fn probe(&self, target: &ProbeTarget) -> ProbeResult {
        self.probe_detailed(target).await.result
    }

    pub async fn probe_detailed(&self, target: &ProbeTarget) -> ProbeOutcome {
        let url = replace_code(&self.page_url, target.code);
        let session = self.session.for_code(target.code, chrono::Utc::now());

        let mut attempt = 1;
        loop {
            match self.attempt(&url, &session).await {
                Ok(raw) => {
                    let quote = self.extractor.extract(&raw.body);
                    tracing::debug!(
                        "✅ {} ({}): price={} sold_out={} after {} attempt(s)",
                        target.label,
                        target.code,
                        quote.price,
                        quote.sold_out,
                        attempt
                    );
                    return ProbeOutcome {
                        result: ProbeResult::from_quote(target, url, quote),
                        raw: Some(raw),
                        attempts: attempt,
                    };
                }
                Err(e) if attempt < self.policy.max_attempts => {
                    let wait = self.policy.backoff(attempt);
                    tracing::warn!(
                        "🔁 {} ({}): attempt {}/{} failed: {}; retrying in {:?}",
                        target.label,
                        target.code,
                        attempt,
                        self.policy.max_attempts,
                        e,
                        wait
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        "🔶 {} ({}): giving up after {} attempt(s): {}",
                        target.label,
                        target.code,
                        attempt,
                        e
                    );
                    return ProbeOutcome {
                        result: ProbeResult::sold_out(target, url),
                        raw: None,
                        attempts: attempt,
                    };
                }
            }
        }
    }

    /// 使用者原本的 URL 與未改寫的 session，只試一次
    pub async fn initial_quote(&self) -> OfferQuote {
        match self.attempt(&self.page_url, &self.session).await {
            Ok(raw) => self.extractor.extract(&raw.body),
            Err(e) => {
                tracing::debug!("🔶 Initial price unavailable: {}", e);
                OfferQuote::unavailable()
            }
        }
    }

    async fn attempt(&self, url: &str, session: &Session) -> Result<RawOfferDocument> {
        let endpoint_path = self.source.resolve(url, session).await?;
        self.source.fetch(&endpoint_path, url, session).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::CompareError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// 前 `failures` 次 resolve 失敗，之後回傳固定價格
    struct FlakySource {
        failures: u32,
        resolves: AtomicU32,
        fetches: AtomicU32,
    }

    impl FlakySource {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                resolves: AtomicU32::new(0),
                fetches: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl OfferSource for FlakySource {
        async fn resolve(&self, page_url: &str, _session: &Session) -> Result<String> {
            let n = self.resolves.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= self.failures {
                return Err(CompareError::ResolutionError {
                    url: page_url.to_string(),
                    reason: "marker script missing".to_string(),
                });
            }
            Ok("/api/offer".to_string())
        }

        async fn fetch(
            &self,
            endpoint_path: &str,
            _page_url: &str,
            _session: &Session,
        ) -> Result<RawOfferDocument> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(RawOfferDocument {
                endpoint_url: endpoint_path.to_string(),
                body: serde_json::json!({
                    "rooms": [{"directPrice": {"originalPrice": 50000}}],
                    "hotelInfo": {"name": "Test Hotel"}
                }),
            })
        }
    }

    fn prober(source: Arc<FlakySource>) -> Prober<FlakySource> {
        Prober::new(
            source,
            OfferExtractor::default(),
            RetryPolicy::new(3, Duration::from_millis(1)),
            Session::default(),
            "https://www.agoda.com/h.html?cid=-1".to_string(),
        )
    }

    #[test]
    fn test_backoff_is_non_decreasing() {
        let policy = RetryPolicy::new(3, Duration::from_millis(500));
        assert_eq!(policy.backoff(1), Duration::from_millis(500));
        assert_eq!(policy.backoff(2), Duration::from_millis(1000));
        assert!(policy.backoff(3) >= policy.backoff(2));
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let source = Arc::new(FlakySource::new(0));
        let outcome = prober(source.clone())
            .probe_detailed(&ProbeTarget::new("A", 100))
            .await;

        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.result.price, 50000.0);
        assert!(!outcome.result.sold_out);
        assert_eq!(outcome.result.rewritten_url, "https://www.agoda.com/h.html?cid=100");
        assert_eq!(outcome.result.hotel_name.as_deref(), Some("Test Hotel"));
        assert!(outcome.raw.is_some());
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let source = Arc::new(FlakySource::new(2));
        let outcome = prober(source.clone())
            .probe_detailed(&ProbeTarget::new("A", 100))
            .await;

        assert_eq!(outcome.attempts, 3);
        assert_eq!(source.resolves.load(Ordering::SeqCst), 3);
        assert_eq!(outcome.result.price, 50000.0);
    }

    #[tokio::test]
    async fn test_initial_quote_tries_once() {
        let source = Arc::new(FlakySource::new(0));
        let quote = prober(source.clone()).initial_quote().await;
        assert_eq!(quote.price, 50000.0);
        assert_eq!(quote.hotel_name.as_deref(), Some("Test Hotel"));

        let source = Arc::new(FlakySource::new(u32::MAX));
        let quote = prober(source.clone()).initial_quote().await;
        assert!(quote.sold_out);
        assert_eq!(source.resolves.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_exactly_max_attempts() {
        let source = Arc::new(FlakySource::new(u32::MAX));
        let result = prober(source.clone()).probe(&ProbeTarget::new("B", 200)).await;

        assert_eq!(source.resolves.load(Ordering::SeqCst), 3);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 0);
        assert_eq!(
            result,
            ProbeResult {
                label: "B".to_string(),
                code: 200,
                rewritten_url: "https://www.agoda.com/h.html?cid=200".to_string(),
                price: 0.0,
                sold_out: true,
                hotel_name: None,
            }
        );
    }
}
