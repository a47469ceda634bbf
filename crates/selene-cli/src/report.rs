//! Plain-text renderings shared by the subcommands and the menu.

use std::io::Write;

use anyhow::Result;
use chrono::NaiveDate;
use selene_core::{
    DaySignals, ForecastError, Forecaster, HistoryMode, PhaseInput, estimate_ovulation,
    estimate_phase, parse_date,
};
use selene_store::HistoryStore;

const RULE_WIDTH: usize = 60;

fn rule(out: &mut impl Write) -> Result<()> {
    writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
    Ok(())
}

fn heading(out: &mut impl Write, title: &str) -> Result<()> {
    writeln!(out)?;
    rule(out)?;
    writeln!(out, "{title}")?;
    rule(out)
}

pub fn write_history(out: &mut impl Write, store: &HistoryStore, limit: usize) -> Result<()> {
    let entries = store.history(limit);
    if entries.is_empty() {
        writeln!(out, "No period history recorded yet.")?;
        return Ok(());
    }

    heading(
        out,
        &format!("Period History (showing last {} entries)", entries.len()),
    )?;
    writeln!(out)?;
    for (i, entry) in entries.iter().enumerate() {
        writeln!(out, "{}. Start: {}", i + 1, entry.start_date)?;
        if let Some(end) = &entry.end_date {
            writeln!(out, "   End: {end}")?;
        }
        if !entry.symptoms.is_empty() {
            writeln!(out, "   Symptoms: {}", entry.symptoms.join(", "))?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Engine forecast next to the store's naive average-based guess.
pub fn write_prediction(
    out: &mut impl Write,
    store: &HistoryStore,
    forecaster: &Forecaster,
) -> Result<()> {
    let Some(naive) = store.naive_next() else {
        writeln!(out, "No period history available. Cannot make prediction.")?;
        return Ok(());
    };

    heading(out, "Next Period Prediction")?;
    writeln!(out, "Last period started: {}", naive.last_start)?;

    match forecaster.predict(&store.start_dates()) {
        Ok(forecast) => {
            let mode = match forecast.mode {
                HistoryMode::Sparse => "baseline",
                HistoryMode::Rich => "baseline + sequence model",
            };
            writeln!(
                out,
                "Predicted window: {} to {}",
                forecast.earliest(),
                forecast.latest()
            )?;
            writeln!(out, "Confidence: {:.0}%", forecast.confidence() * 100.0)?;
            writeln!(
                out,
                "Estimated cycle length: {:.1} days ({mode})",
                forecast.cycle_length
            )?;
            if let Some(ovulation) = estimate_ovulation(&forecast.window, forecast.last_date) {
                writeln!(out, "Estimated ovulation: {ovulation}")?;
            }
        }
        Err(ForecastError::InsufficientHistory { .. }) => {
            writeln!(
                out,
                "Not enough data for a forecast window: record at least two different start dates."
            )?;
        }
        Err(e) => {
            tracing::warn!("forecast failed: {e}");
            writeln!(out, "Forecast unavailable: {e}")?;
        }
    }

    writeln!(
        out,
        "Average cycle length: {} days",
        naive.average_cycle_length
    )?;
    writeln!(out, "Predicted next period: {}", naive.next_start)?;
    rule(out)?;
    writeln!(out)?;
    Ok(())
}

pub fn write_stats(out: &mut impl Write, store: &HistoryStore) -> Result<()> {
    let Some(stats) = store.stats() else {
        writeln!(out, "No period data available yet.")?;
        return Ok(());
    };

    heading(out, "Period Statistics")?;
    writeln!(out, "Total periods tracked: {}", stats.total_periods)?;
    writeln!(
        out,
        "Average cycle length: {} days",
        stats.average_cycle_length
    )?;
    if let Some(duration) = stats.average_duration {
        writeln!(out, "Average period duration: {duration} days")?;
    }
    rule(out)?;
    writeln!(out)?;
    Ok(())
}

/// Phase on `reference`, anchored on the last recorded period and, when
/// available, the forecast's ovulation estimate.
pub fn write_phase(
    out: &mut impl Write,
    store: &HistoryStore,
    forecaster: &Forecaster,
    reference: NaiveDate,
    today: DaySignals,
) -> Result<()> {
    let last_period = store
        .last_period()
        .and_then(|p| parse_date(&p.start_date).ok());
    let forecast = forecaster.predict(&store.start_dates()).ok();

    let input = PhaseInput {
        reference,
        last_period,
        predicted_ovulation: forecast
            .as_ref()
            .and_then(|f| estimate_ovulation(&f.window, f.last_date)),
        average_cycle_length: forecast
            .as_ref()
            .map(|f| f.cycle_length)
            .or_else(|| last_period.map(|_| f64::from(store.average_cycle_length()))),
        today,
    };

    match estimate_phase(&input) {
        Some(phase) => writeln!(out, "Phase on {reference}: {}", phase.as_str())?,
        None => writeln!(
            out,
            "Not enough data to estimate the phase on {reference}."
        )?,
    }
    Ok(())
}
