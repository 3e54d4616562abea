use crate::config::settings::CompareSettings;
use crate::core::aggregator::aggregate;
use crate::core::catalog::CodeCatalog;
use crate::core::extractor::OfferExtractor;
use crate::core::retry::{Prober, RetryPolicy};
use crate::core::scheduler::FanOut;
use crate::core::OfferSource;
use crate::domain::model::{AggregateReport, ConvertResponse, RunEvent};
use crate::domain::session::Session;
use crate::utils::error::{CompareError, Result};
use crate::utils::validation::validate_listing_url;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

/// 一次完整比價的結果
#[derive(Debug, Clone)]
pub struct ComparisonRun {
    pub report: AggregateReport,
    pub total_cids: usize,
    pub timed_out: bool,
    /// 使用者原本 URL 的價格，取不到時為 0
    pub initial_price: f64,
}

impl ComparisonRun {
    pub fn response(&self) -> ConvertResponse {
        ConvertResponse::from_report(&self.report, self.total_cids, self.initial_price)
    }
}

pub struct CompareEngine<S: OfferSource> {
    source: Arc<S>,
    settings: Arc<CompareSettings>,
}

impl<S: OfferSource + 'static> CompareEngine<S> {
    pub fn new(source: S, settings: CompareSettings) -> Self {
        Self {
            source: Arc::new(source),
            settings: Arc::new(settings),
        }
    }

    pub fn settings(&self) -> &CompareSettings {
        &self.settings
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn catalog(&self) -> CodeCatalog {
        CodeCatalog::new(
            self.settings.curated_codes.clone(),
            self.settings.random_code_count,
            self.settings.random_code_min..=self.settings.random_code_max,
        )
    }

    pub async fn compare(&self, raw_url: &str) -> Result<ConvertResponse> {
        self.run(raw_url, None).await.map(|run| run.response())
    }

    /// 使用設定檔中的 session 樣板
    pub async fn run(
        &self,
        raw_url: &str,
        progress: Option<&UnboundedSender<RunEvent>>,
    ) -> Result<ComparisonRun> {
        self.run_with_session(raw_url, &self.settings.session, progress)
            .await
    }

    /// 驗證 URL 後執行整批比價；驗證失敗時不發出任何請求
    pub async fn run_with_session(
        &self,
        raw_url: &str,
        session: &Session,
        progress: Option<&UnboundedSender<RunEvent>>,
    ) -> Result<ComparisonRun> {
        let page_url = validate_listing_url(raw_url, &self.settings.site_domain)?;
        let catalog = self.catalog().build_catalog();
        tracing::info!("🚀 Comparing {} codes for {}", catalog.len(), page_url);

        let prober = Prober::new(
            Arc::clone(&self.source),
            OfferExtractor::new(
                self.settings.price_paths.clone(),
                self.settings.hotel_name_path.clone(),
            ),
            RetryPolicy::new(self.settings.max_attempts, self.settings.backoff_base()),
            session.clone(),
            page_url,
        );

        let fan_out = FanOut::from_settings(&self.settings);
        let (initial, output) = tokio::join!(
            prober.initial_quote(),
            fan_out.run_all(&prober, &catalog, progress)
        );

        let report = aggregate(
            output.results,
            self.settings.affiliate_links.clone(),
            &self.settings.hotel_name_fallback,
            output.first_raw,
        );
        tracing::info!(
            "✅ Collected {}/{} results for '{}'",
            report.all_results.len(),
            catalog.len(),
            report.hotel_name
        );

        Ok(ComparisonRun {
            report,
            total_cids: catalog.len(),
            timed_out: output.timed_out,
            initial_price: initial.price,
        })
    }

    /// 立即回傳訂閱通道：先收到數個 progress，最後是一個 complete 或 error，之後通道關閉
    pub fn compare_streaming(self: &Arc<Self>, raw_url: String) -> UnboundedReceiver<RunEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.spawn_run(raw_url, None, tx);
        rx
    }

    /// 在背景執行比價並把事件送進 `tx`；送出終止事件後丟棄 `tx`
    ///
    /// `session` 為 None 時使用設定檔中的樣板。
    pub fn spawn_run(
        self: &Arc<Self>,
        raw_url: String,
        session: Option<Session>,
        tx: UnboundedSender<RunEvent>,
    ) -> JoinHandle<()> {
        let engine = Arc::clone(self);

        tokio::spawn(async move {
            let progress = tx.clone();
            let job = tokio::spawn(async move {
                let session = session.unwrap_or_else(|| engine.settings.session.clone());
                engine
                    .run_with_session(&raw_url, &session, Some(&progress))
                    .await
            });

            let event = match job.await {
                Ok(Ok(run)) => RunEvent::Complete {
                    result: run.response(),
                },
                Ok(Err(e)) => {
                    tracing::error!("❌ Comparison failed: {}", e);
                    RunEvent::Error {
                        message: e.user_friendly_message(),
                    }
                }
                Err(join_error) => {
                    let e = CompareError::UnexpectedError {
                        message: join_error.to_string(),
                    };
                    tracing::error!("❌ Comparison task aborted: {}", e);
                    RunEvent::Error {
                        message: e.user_friendly_message(),
                    }
                }
            };
            let _ = tx.send(event);
        })
    }
}
