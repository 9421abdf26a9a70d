//! Synthesize command implementation.

use anyhow::{Context, Result};
use intramom_combine::{FactorSynthesizer, SynthesizerConfig, WeightSchedule};

use crate::config::Settings;
use crate::data::{self, Sources};

/// Weight the stored loadings into the synthetic factor.
pub(crate) fn run_synthesize(
    settings: &Settings,
    start: &str,
    end: Option<&str>,
    all_days: bool,
    save: bool,
) -> Result<()> {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                Synthetic Intraday Momentum                   ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let start = data::parse_date(start)?;
    let end = end.map(data::parse_date).transpose()?;

    println!("Period:   {} to {}", start, end.map_or_else(|| "-".to_string(), |d| d.to_string()));
    println!("Weights:  {}", settings.weight_file.display());
    println!("Save:     {}", save);
    println!();

    let weights = WeightSchedule::from_csv(&settings.weight_file)
        .with_context(|| format!("reading weights {}", settings.weight_file.display()))?;
    let sources = Sources::open(settings)?;

    let synthesizer = FactorSynthesizer::new(
        SynthesizerConfig {
            month_end_only: !all_days,
            save,
            ..SynthesizerConfig::default()
        },
        weights,
        sources.calendar,
        sources.store,
    );
    let done = synthesizer.synthesize_range(start, end)?;

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("SYNTHESIZED");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

    if done.is_empty() {
        println!("Nothing synthesized; see the log for skipped dates.");
        return Ok(());
    }
    for (date, rows) in &done {
        println!("  {}  {:>6} rows", date, rows);
    }
    println!();

    Ok(())
}
