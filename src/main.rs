use billing_fetch::utils::{error::Result, logger};
use billing_fetch::{
    write_report, BillingEngine, CliConfig, Clock, FixedClock, PeriodResolver, SystemClock,
};
use clap::Parser;

#[tokio::main]
async fn main() {
    let config = CliConfig::parse();

    if config.log_json {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting billing-fetch");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = run(config).await {
        tracing::error!("❌ billing-fetch failed: {}", e);
        eprintln!("{}", CliConfig::failure_message(&e));
        std::process::exit(e.exit_code());
    }
}

async fn run(config: CliConfig) -> Result<()> {
    let clock: Box<dyn Clock> = match config.today {
        Some(date) => Box::new(FixedClock(date)),
        None => Box::new(SystemClock),
    };
    let periods = PeriodResolver::new(clock).resolve(config.target_tokens()?)?;

    let settings = config.settings()?;
    let engine = BillingEngine::new(settings.build_source()?, settings.layout.clone());

    let records = engine.run(&periods).await?;
    write_report(&records, settings.format, settings.output_path.as_deref())?;

    tracing::info!("✅ Fetched {} billing amount(s)", records.len());
    Ok(())
}
