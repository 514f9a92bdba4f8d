use anyhow::Result;
use clap::Parser;
use log::{error, info};

use jobmail::config::{Config, StoreConfig};
use jobmail::job::run_job;
use jobmail::sheets;

#[derive(Parser)]
#[command(name = "jobmail")]
#[command(about = "Labels job-application emails and logs them to two sheets")]
#[command(version = "0.1.0")]
struct Args {
    /// Dry-run mode: search and classify without labeling threads or writing sheets
    #[arg(short, long)]
    dry_run: bool,

    /// Daemon mode: run the job at the configured schedule times
    #[arg(long)]
    daemon: bool,

    /// Check the configuration without connecting
    #[arg(long)]
    check_config: bool,

    /// Create the configured workbook in the sheet store, then exit
    #[arg(long)]
    create_workbook: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    dotenv::dotenv().ok();

    let args = Args::parse();

    env_logger::init();

    if args.dry_run {
        info!("🧪 Starting jobmail in DRY-RUN mode");
    } else {
        info!("🚀 Starting jobmail");
    }

    let config = Config::new()?;

    if args.check_config {
        println!("✅ Configuration valid!");
        println!("📧 Gmail API OAuth2");
        println!("🔑 Credentials: {}", config.gmail.credentials_path);
        println!("💾 Token cache: {}", config.gmail.token_cache_path);
        match &config.store {
            StoreConfig::Csv { sheets_dir } => println!("📁 CSV sheets: {}/{}", sheets_dir, config.job.spreadsheet_id),
            StoreConfig::Postgres(db) => println!(
                "🗄️  Database: {}@{}:{}/{} (workbook {})",
                db.username, db.host, db.port, db.database, config.job.spreadsheet_id
            ),
        }
        println!("📋 Sheets: '{}', '{}'", config.job.confirmation.sheet_name, config.job.action.sheet_name);
        println!("🏷️  Labels: '{}', '{}'", config.job.confirmation.label_name, config.job.action.label_name);
        println!("🔎 Confirmation query: {}", config.job.confirmation.search_query);
        println!("🔎 Action query: {}", config.job.action.search_query);
        return Ok(());
    }

    if args.create_workbook {
        sheets::create_workbook(&config.store, &config.job.spreadsheet_id).await?;
        return Ok(());
    }

    if args.daemon {
        info!("🔄 Starting in daemon mode");
        run_daemon_mode(config, args.dry_run).await?;
        return Ok(());
    }

    // One-shot mode (default)
    match run_job(&config, args.dry_run).await {
        Ok(report) => {
            info!(
                "✅ Job finished: {} confirmation entries, {} actionable entries ({} labeled)",
                report.confirmation.rows_logged, report.action.rows_logged, report.action.labeled
            );
        }
        Err(e) => {
            error!("❌ Job failed: {:#}", e);
            return Err(e);
        }
    }

    Ok(())
}

async fn run_daemon_mode(config: Config, dry_run: bool) -> Result<()> {
    use chrono::{Local, Timelike};
    use tokio_cron_scheduler::{Job, JobScheduler};

    if !config.scheduler.enabled {
        error!("❌ Daemon mode requires SCHEDULER_ENABLED=true");
        anyhow::bail!("Scheduler not enabled in configuration");
    }

    if config.scheduler.schedule_times.is_empty() {
        error!("❌ No schedule times defined (SCHEDULER_TIMES)");
        anyhow::bail!("No schedule times defined");
    }

    info!("📅 Configured run times: {:?}", config.scheduler.schedule_times);

    let scheduler = JobScheduler::new().await?;

    for schedule_time in &config.scheduler.schedule_times {
        let Some((hour, minute)) = schedule_time.split_once(':') else {
            error!("❌ Invalid schedule time: {}. Use the HH:MM format", schedule_time);
            continue;
        };

        // Cron format: "sec min hour * * *" (every day)
        let cron_expr = format!("0 {} {} * * *", minute, hour);
        info!("📆 Adding scheduled job: {} (cron: {})", schedule_time, cron_expr);

        let config_clone = config.clone();
        let schedule_time_clone = schedule_time.clone();

        let job = Job::new_async(cron_expr.as_str(), move |_uuid, _l| {
            let config = config_clone.clone();
            let schedule_time = schedule_time_clone.clone();

            Box::pin(async move {
                info!("⏰ Scheduled run at {} - scanning mailbox...", schedule_time);

                match run_job(&config, dry_run).await {
                    Ok(report) => info!(
                        "✅ Scheduled run at {} done: {} confirmation, {} actionable entries",
                        schedule_time, report.confirmation.rows_logged, report.action.rows_logged
                    ),
                    Err(e) => error!("❌ Scheduled run at {} failed: {:#}", schedule_time, e),
                }
            })
        })?;

        scheduler.add(job).await?;
    }

    scheduler.start().await?;

    info!("✅ Daemon started. Waiting for scheduled times...");
    info!("⏸️  Press Ctrl+C to stop the daemon");

    // Keep the process alive
    loop {
        tokio::time::sleep(tokio::time::Duration::from_secs(60)).await;

        let now = Local::now();
        if now.minute() == 0 {
            info!("💓 Daemon alive - {}", now.format("%Y-%m-%d %H:%M"));
        }
    }
}
