//! Loadings command implementation.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use intramom_signals::{
    AggregatorConfig, IntradayMomentum, IntradayMomentumConfig, LoadingAggregator,
};
use intramom_traits::TradingCalendar;

use crate::config::Settings;
use crate::data::{self, Sources};

/// Options of the `loadings` command.
#[derive(Debug)]
pub(crate) struct LoadingsArgs {
    pub(crate) start: String,
    pub(crate) end: Option<String>,
    pub(crate) all_days: bool,
    pub(crate) save: bool,
    pub(crate) days: usize,
    pub(crate) workers: usize,
    pub(crate) cooldown_secs: u64,
}

/// Compute intraday momentum loadings over a date range.
pub(crate) async fn run_loadings(settings: &Settings, args: LoadingsArgs) -> Result<()> {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                 Intraday Momentum Loadings                   ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let start = data::parse_date(&args.start)?;
    let end = args.end.as_deref().map(data::parse_date).transpose()?;

    println!("Period:    {} to {}", start, end.map_or_else(|| "-".to_string(), |d| d.to_string()));
    println!("Dates:     {}", if args.all_days { "every trading day" } else { "month ends" });
    println!("Lookback:  {} days", args.days);
    println!("Workers:   {}", args.workers);
    println!("Cooldown:  {}s", args.cooldown_secs);
    println!("Save:      {}", args.save);
    println!();

    let sources = Sources::open(settings)?;
    let securities = data::load_securities(settings)?;
    println!("Universe:  {} securities", securities.len());
    println!();

    let calendar: Arc<dyn TradingCalendar> = sources.calendar;
    let calculator = IntradayMomentum::new(
        IntradayMomentumConfig {
            days: args.days,
            ..IntradayMomentumConfig::default()
        },
        sources.market,
        Arc::clone(&calendar),
    );
    let aggregator = LoadingAggregator::new(
        AggregatorConfig {
            workers: args.workers,
            cooldown: Duration::from_secs(args.cooldown_secs),
            month_end_only: !args.all_days,
            save: args.save,
            ..AggregatorConfig::default()
        },
        calculator,
        calendar,
        Arc::new(securities),
        sources.store,
    );

    let reports = aggregator.run(start, end).await?;

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("LOADINGS");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

    if reports.is_empty() {
        println!("No calculation dates in range.");
        return Ok(());
    }

    println!(
        "  {:<12} {:<12} {:>8} {:>12} {:>8}",
        "Calc Date", "Label", "Rows", "Insufficient", "Failed"
    );
    println!("  {}", "─".repeat(56));
    for report in &reports {
        println!(
            "  {:<12} {:<12} {:>8} {:>12} {:>8}",
            report.calc_date.to_string(),
            report.label_date.to_string(),
            report.table.len(),
            report.insufficient,
            report.failed.len()
        );
    }
    println!();

    if let Some(last) = reports.last() {
        let frame = last.table.to_frame()?;
        println!("Latest table ({}):", last.calc_date);
        println!("{}", frame.head(Some(10)));
    }

    Ok(())
}
