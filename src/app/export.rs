use crate::core::engine::ComparisonRun;
use crate::core::{ProbeResult, Storage};
use crate::utils::error::{CompareError, Result};
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

/// 把比價結果打包成 zip（CSV + 完整 JSON + 第一份原始回應）
pub struct ReportExporter<S: Storage> {
    storage: S,
}

impl<S: Storage> ReportExporter<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// 回傳寫入的檔名
    pub async fn export(&self, run: &ComparisonRun) -> Result<String> {
        let filename = format!(
            "cid_report_{}.zip",
            chrono::Utc::now().format("%Y%m%d_%H%M%S")
        );
        let zip_data = build_archive(run)?;

        tracing::debug!("Writing report archive ({} bytes) to storage", zip_data.len());
        self.storage.write_file(&filename, &zip_data).await?;

        tracing::info!("💾 Report exported: {}", filename);
        Ok(filename)
    }
}

pub fn build_archive(run: &ComparisonRun) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

    zip.start_file::<_, ()>("results.csv", FileOptions::default())?;
    zip.write_all(results_csv(&run.report.all_results)?.as_bytes())?;

    zip.start_file::<_, ()>("report.json", FileOptions::default())?;
    let json_data = serde_json::to_string_pretty(&run.response())?;
    zip.write_all(json_data.as_bytes())?;

    // 除錯用：依目錄順序第一份成功的原始回應
    if let Some(raw) = &run.report.first_raw_response {
        zip.start_file::<_, ()>("first_response.json", FileOptions::default())?;
        let raw_json = serde_json::to_string_pretty(&serde_json::json!({
            "endpoint": raw.endpoint_url,
            "body": raw.body,
        }))?;
        zip.write_all(raw_json.as_bytes())?;
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

pub fn results_csv(results: &[ProbeResult]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["label", "cid", "url", "price", "sold_out", "hotel_name"])?;

    for result in results {
        let code = result.code.to_string();
        let price = result.price.to_string();
        writer.write_record([
            result.label.as_str(),
            code.as_str(),
            result.rewritten_url.as_str(),
            price.as_str(),
            if result.sold_out { "true" } else { "false" },
            result.hotel_name.as_deref().unwrap_or(""),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| CompareError::IoError(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| CompareError::UnexpectedError {
        message: format!("CSV output is not UTF-8: {}", e),
    })
}
