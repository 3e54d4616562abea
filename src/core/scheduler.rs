use crate::config::settings::{CompareSettings, Schedule};
use crate::core::retry::{ProbeOutcome, Prober};
use crate::core::{OfferSource, ProbeResult, ProbeTarget, RawOfferDocument};
use crate::domain::model::RunEvent;
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// 整批執行的結果（依目錄順序）
#[derive(Debug, Clone, Default)]
pub struct RunOutput {
    pub results: Vec<ProbeResult>,
    pub first_raw: Option<RawOfferDocument>,
    pub timed_out: bool,
}

/// 將所有 CID 分派給 Prober，再依目錄順序重組結果
#[derive(Debug, Clone)]
pub struct FanOut {
    schedule: Schedule,
    delay_range_ms: (u64, u64),
    run_timeout: Option<Duration>,
}

impl FanOut {
    pub fn new(schedule: Schedule, delay_range_ms: (u64, u64), run_timeout: Option<Duration>) -> Self {
        Self {
            schedule,
            delay_range_ms,
            run_timeout,
        }
    }

    pub fn from_settings(settings: &CompareSettings) -> Self {
        Self::new(
            settings.schedule,
            settings.delay_range_ms(),
            settings.run_timeout(),
        )
    }

    /// 執行全部 CID
    ///
    /// Sequential 等同寬度 1：前一個完成後才開始下一個。
    /// 超過 `run_timeout` 時，尚未完成的 CID 直接捨棄，不列入結果。
    pub async fn run_all<S: OfferSource>(
        &self,
        prober: &Prober<S>,
        catalog: &[ProbeTarget],
        progress: Option<&UnboundedSender<RunEvent>>,
    ) -> RunOutput {
        let total = catalog.len();
        let width = self.schedule.width();
        tracing::info!("📡 Probing {} codes (width {})", total, width);

        // 每個 future 擁有自己的 target，整個 run 才能交給 tokio::spawn
        let pending: Vec<BoxFuture<'_, (usize, ProbeOutcome)>> = catalog
            .iter()
            .cloned()
            .enumerate()
            .map(|(index, target)| {
                let pause = self.pacing_delay();
                async move {
                    if !pause.is_zero() {
                        tokio::time::sleep(pause).await;
                    }
                    (index, prober.probe_detailed(&target).await)
                }
                .boxed()
            })
            .collect();
        let mut in_flight = stream::iter(pending).buffer_unordered(width);

        let deadline = self
            .run_timeout
            .map(|limit| tokio::time::Instant::now() + limit);
        let mut done: HashMap<usize, ProbeOutcome> = HashMap::with_capacity(total);
        let mut timed_out = false;

        loop {
            let next = match deadline {
                Some(at) => match tokio::time::timeout_at(at, in_flight.next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        timed_out = true;
                        break;
                    }
                },
                None => in_flight.next().await,
            };
            let Some((index, outcome)) = next else {
                break;
            };

            done.insert(index, outcome);
            if let Some(tx) = progress {
                // 訂閱端已關閉時忽略
                let _ = tx.send(RunEvent::Progress {
                    percentage: percent_complete(done.len(), total),
                });
            }
        }

        if timed_out {
            tracing::warn!(
                "⏱️ Run deadline reached: {}/{} codes completed, the rest are dropped",
                done.len(),
                total
            );
        }

        let mut first_raw = None;
        let results = (0..total)
            .filter_map(|index| done.remove(&index))
            .map(|outcome| {
                if first_raw.is_none() {
                    first_raw = outcome.raw;
                }
                outcome.result
            })
            .collect();

        RunOutput {
            results,
            first_raw,
            timed_out,
        }
    }

    fn pacing_delay(&self) -> Duration {
        let (min, max) = self.delay_range_ms;
        if max == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(fastrand::u64(min..=max))
    }
}

pub fn percent_complete(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((completed as f64 / total as f64) * 100.0).round().min(100.0) as u8
}
