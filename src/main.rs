use clap::Parser;
use futures::StreamExt;
use nlrb_scrape::config::Command;
use nlrb_scrape::core::output;
use nlrb_scrape::domain::model::CaseType;
use nlrb_scrape::domain::ports::{LogObserver, Storage};
use nlrb_scrape::utils::error::ErrorSeverity;
use nlrb_scrape::utils::{logger, validation::Validate};
use nlrb_scrape::{
    CaseRows, Cancellation, CliConfig, LocalStorage, PortalClient, PortalConfig, ReqwestFetcher,
    Result, WebDriverLauncher,
};
use std::collections::BTreeMap;
use tokio::sync::watch;

fn load_portal_config(cli: &CliConfig) -> Result<PortalConfig> {
    let mut portal = match &cli.config {
        Some(path) => {
            tracing::info!("📋 Loading configuration from {}", path);
            PortalConfig::from_file(path)?
        }
        None => PortalConfig::default(),
    };

    if let Command::Export {
        poll_deadline_seconds: Some(seconds),
        ..
    } = &cli.command
    {
        portal.export.poll_deadline_seconds = Some(*seconds);
    }

    portal.validate()?;
    Ok(portal)
}

fn print_counts(counts: &BTreeMap<CaseType, usize>) {
    for (case_type, count) in counts {
        println!("  {:<4}{}", case_type.code(), count);
    }
    println!("  total {}", counts.values().sum::<usize>());
}

async fn run(
    cli: &CliConfig,
    client: &mut PortalClient<ReqwestFetcher>,
    storage: &LocalStorage,
    cancel: &Cancellation,
) -> Result<String> {
    match &cli.command {
        Command::Search { query, limit } => {
            let query = query.to_query();
            let stream = client.search(&query)?;
            let mut stream = std::pin::pin!(stream);

            let mut summaries = Vec::new();
            while let Some(summary) = stream.next().await {
                cancel.check("search")?;
                summaries.push(summary?);
                if limit.is_some_and(|limit| summaries.len() >= limit) {
                    tracing::info!("✂️ Reached limit of {} cases", summaries.len());
                    break;
                }
            }

            let csv = output::summaries_csv(&summaries)?;
            storage.write_file("cases.csv", &csv).await?;
            println!("🔍 {} case(s) found", summaries.len());
            Ok(storage.full_path("cases.csv"))
        }
        Command::Case { case_number } => {
            let detail = client.case_detail(case_number, cancel).await?;
            let file_name = format!("{}.json", detail.case_number);
            let json = serde_json::to_vec_pretty(&detail)?;
            storage.write_file(&file_name, &json).await?;
            println!(
                "📄 {} ({}): {} docket rows, {} participants",
                detail.name,
                detail.case_type,
                detail.docket.len(),
                detail.participants.len()
            );
            Ok(storage.full_path(&file_name))
        }
        Command::Export { query, .. } => {
            let query = query.to_query();
            let rows = client.export_rows(&query, &LogObserver, cancel).await?;
            let (csv, counts) = output::rows_with_type_csv(rows)?;
            storage.write_file("export.csv", &csv).await?;
            println!("📦 Exported rows by case type:");
            print_counts(&counts);
            Ok(storage.full_path("export.csv"))
        }
        Command::Rows { path } => {
            let counts = output::count_by_type(CaseRows::from_path(path)?)?;
            println!("📊 Rows by case type in {}:", path);
            print_counts(&counts);
            Ok(path.clone())
        }
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting nlrb-scrape CLI");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 驗證配置
    let portal = match cli.validate().and_then(|_| load_portal_config(&cli)) {
        Ok(portal) => portal,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    // Ctrl-C 觸發取消，所有等待點都會收到
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("🛑 Interrupt received, cancelling");
            let _ = shutdown_tx.send(true);
        }
    });
    let cancel = Cancellation::with_shutdown(shutdown_rx);

    let storage = LocalStorage::new(cli.output_path.clone());
    let fetcher = ReqwestFetcher::new(&portal)?;
    let launcher = WebDriverLauncher::new(&portal)?;
    let mut client = PortalClient::new(fetcher, launcher, portal);

    let outcome = run(&cli, &mut client, &storage, &cancel).await;
    if let Err(e) = client.shutdown().await {
        tracing::warn!("⚠️ Browser shutdown failed: {}", e);
    }

    match outcome {
        Ok(output_path) => {
            tracing::info!("✅ Completed successfully!");
            tracing::info!("📁 Output: {}", output_path);
            println!("📁 Output: {}", output_path);
        }
        Err(e) => {
            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                ErrorSeverity::Low => 4,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            std::process::exit(exit_code);
        }
    }

    Ok(())
}
