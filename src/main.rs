use cid_compare::core::ConfigProvider;
use cid_compare::utils::error::{CompareError, ErrorSeverity};
use cid_compare::utils::{logger, validation::Validate};
use cid_compare::{CliConfig, CompareEngine, ComparisonRun, HttpOfferSource, LocalStorage, ReportExporter};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting cid-compare CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    let config = match config.load_file().and_then(|config| {
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&config).await {
        tracing::error!(
            "❌ Comparison failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 建議: {}", e.recovery_suggestion());

        // 根據錯誤嚴重程度決定退出碼
        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

async fn run(config: &CliConfig) -> Result<(), CompareError> {
    let settings = config.compare_settings()?;
    let source = HttpOfferSource::from_settings(&settings)?;
    let engine = CompareEngine::new(source, settings);

    let run = engine.run(&config.url, None).await?;
    if run.timed_out {
        tracing::warn!("⏰ Run deadline reached, partial results only");
    }

    if config.json {
        println!("{}", serde_json::to_string_pretty(&run.response())?);
    } else {
        print_summary(&run);
    }

    if let Some(dir) = config.export_dir() {
        let exporter = ReportExporter::new(LocalStorage::new(dir.to_string()));
        let filename = exporter.export(&run).await?;
        println!("📁 Report saved to: {}/{}", dir, filename);
    }

    Ok(())
}

fn print_summary(run: &ComparisonRun) {
    let report = &run.report;
    println!("🏨 {}", report.hotel_name);
    println!(
        "   {} priced / {} collected / {} CIDs{}",
        report.all_results.iter().filter(|r| r.is_bookable()).count(),
        report.all_results.len(),
        run.total_cids,
        if run.timed_out { " (timed out)" } else { "" }
    );
    println!();

    for result in &report.all_results {
        let price = if result.sold_out {
            "sold out".to_string()
        } else {
            format!("{:.0}", result.price)
        };
        println!("{:<28} {:>9} {:>12}", result.label, result.code, price);
    }

    println!();
    match &report.cheapest {
        Some(cheapest) => {
            println!(
                "✅ Cheapest: {} (cid {}) {:.0}",
                cheapest.label, cheapest.code, cheapest.price
            );
            println!("🔗 {}", cheapest.rewritten_url);
        }
        None => println!("❌ No CID returned a bookable price"),
    }
}
