//! Backtest command implementation.

use anyhow::Result;
use intramom_eval::{Backtest, BacktestConfig};

use crate::config::Settings;
use crate::data::{self, Sources};

/// Run the monthly rebalanced backtest of the synthetic factor.
pub(crate) fn run_backtest(
    settings: &Settings,
    start: &str,
    end: &str,
    format: &str,
) -> Result<()> {
    let start_date = data::parse_date(start)?;
    let end_date = data::parse_date(end)?;
    let json = format == "json";

    if !json {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                       Backtesting                            ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("Period:   {} to {}", start_date, end_date);
        println!("Output:   {}", settings.backtest_dir.display());
        println!("Format:   {}", format);
        println!();
    }

    let sources = Sources::open(settings)?;
    let backtest = Backtest::new(
        BacktestConfig {
            output_dir: settings.backtest_dir.clone(),
            ..BacktestConfig::default()
        },
        sources.market,
        sources.calendar,
        sources.store,
    );
    let result = backtest.run(start_date, end_date)?;

    if json {
        let json = serde_json::to_string_pretty(&result)
            .map_err(|e| anyhow::anyhow!("JSON serialization error: {}", e))?;
        println!("{}", json);
        return Ok(());
    }

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("BACKTEST RESULTS");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

    println!("Performance Metrics:");
    println!(
        "  Total Return:      {:>10.2}%",
        result.total_return * 100.0
    );
    println!("  Sharpe Ratio:      {:>10.2}", result.sharpe_ratio);
    println!(
        "  Max Drawdown:      {:>10.2}%",
        result.max_drawdown * 100.0
    );
    println!();

    println!("Portfolio:");
    println!("  Rebalances:        {:>10}", result.rebalances);
    println!("  Holdings at End:   {:>10}", result.holdings);
    if let Some(last) = result.nav.last() {
        println!("  Final NAV:         {:>10.4}  ({})", last.nav, last.date);
    }
    println!();

    Ok(())
}
