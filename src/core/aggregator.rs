use crate::core::{ProbeResult, RawOfferDocument};
use crate::domain::model::{AffiliateLink, AggregateReport};

/// 由全部結果計算飯店名稱與最低價
///
/// 最低價只考慮未售罄且價格為正的結果；同價時取目錄順序較前者。
pub fn aggregate(
    results: Vec<ProbeResult>,
    affiliate_links: Vec<AffiliateLink>,
    hotel_name_fallback: &str,
    first_raw_response: Option<RawOfferDocument>,
) -> AggregateReport {
    let hotel_name = results
        .iter()
        .find_map(|r| r.hotel_name.clone())
        .unwrap_or_else(|| hotel_name_fallback.to_string());

    let cheapest = results
        .iter()
        .filter(|r| r.is_bookable())
        .min_by(|a, b| a.price.total_cmp(&b.price))
        .cloned();

    match &cheapest {
        Some(best) => tracing::info!(
            "💰 Cheapest: {} (cid {}) at {}",
            best.label,
            best.code,
            best.price
        ),
        None => tracing::info!("🔶 No bookable offer among {} results", results.len()),
    }

    AggregateReport {
        hotel_name,
        all_results: results,
        cheapest,
        affiliate_links,
        first_raw_response,
    }
}
