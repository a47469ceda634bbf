//! Line-based interactive menu over any reader/writer pair.

use std::io::{BufRead, Write};

use anyhow::Result;
use selene_core::Forecaster;
use selene_store::HistoryStore;

use crate::report;

const HISTORY_LIMIT: usize = 10;

/// Print `label` and read one trimmed line. `None` on end of input.
fn prompt(input: &mut impl BufRead, out: &mut impl Write, label: &str) -> Result<Option<String>> {
    write!(out, "{label}")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn add_period(
    input: &mut impl BufRead,
    out: &mut impl Write,
    store: &mut HistoryStore,
) -> Result<()> {
    writeln!(out, "\n--- Add New Period ---")?;
    let Some(start) = prompt(input, out, "Enter start date (YYYY-MM-DD): ")? else {
        return Ok(());
    };
    let end = prompt(
        input,
        out,
        "Enter end date (YYYY-MM-DD, or press Enter to skip): ",
    )?
    .filter(|s| !s.is_empty());
    let symptoms: Vec<String> = prompt(
        input,
        out,
        "Enter symptoms separated by commas (or press Enter to skip): ",
    )?
    .unwrap_or_default()
    .split(',')
    .map(|s| s.trim().to_string())
    .filter(|s| !s.is_empty())
    .collect();

    match store.add_period(&start, end.as_deref(), Some(symptoms)) {
        Ok(entry) => writeln!(out, "Period added successfully starting {}", entry.start_date)?,
        Err(e) => writeln!(out, "Error: {e}")?,
    }
    Ok(())
}

pub fn run(
    mut input: impl BufRead,
    mut out: impl Write,
    store: &mut HistoryStore,
    forecaster: &Forecaster,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "=".repeat(60))?;
    writeln!(out, "{:^60}", "SELENE - Period Tracker")?;
    writeln!(out, "{}", "=".repeat(60))?;

    loop {
        writeln!(out, "\nOptions:")?;
        writeln!(out, "1. Add new period")?;
        writeln!(out, "2. View period history")?;
        writeln!(out, "3. Predict next period")?;
        writeln!(out, "4. View statistics")?;
        writeln!(out, "5. Exit")?;

        let Some(choice) = prompt(&mut input, &mut out, "\nEnter your choice (1-5): ")? else {
            break;
        };
        match choice.as_str() {
            "1" => add_period(&mut input, &mut out, store)?,
            "2" => report::write_history(&mut out, store, HISTORY_LIMIT)?,
            "3" => report::write_prediction(&mut out, store, forecaster)?,
            "4" => report::write_stats(&mut out, store)?,
            "5" => {
                writeln!(out, "\nThank you for using Selene. Stay healthy!")?;
                break;
            }
            _ => writeln!(
                out,
                "\nInvalid choice. Please enter a number between 1 and 5."
            )?,
        }
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use selene_core::SequenceModel;

    fn session(script: &str, store: &mut HistoryStore) -> String {
        let forecaster = Forecaster::with_model(SequenceModel::untrained(1));
        let mut out = Vec::new();
        run(script.as_bytes(), &mut out, store, &forecaster).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_add_then_predict_then_exit() {
        let mut store = HistoryStore::open_in_memory();
        let text = session(
            "1\n2026-01-01\n2026-01-05\ncramps, fatigue\n1\n2026-01-29\n\n\n3\n5\n",
            &mut store,
        );
        assert_eq!(store.periods().len(), 2);
        assert_eq!(store.periods()[0].symptoms, vec!["cramps", "fatigue"]);
        assert!(text.contains("Period added successfully starting 2026-01-29"));
        assert!(text.contains("Predicted window: 2026-02-24 to 2026-02-28"));
        assert!(text.contains("Stay healthy!"));
    }

    #[test]
    fn test_bad_input_keeps_looping() {
        let mut store = HistoryStore::open_in_memory();
        let text = session("9\n1\nnot-a-date\n\n\n4\n5\n", &mut store);
        assert!(text.contains("Invalid choice"));
        assert!(text.contains("Error: invalid date"));
        assert!(text.contains("No period data available yet."));
        assert!(store.periods().is_empty());
    }

    #[test]
    fn test_eof_ends_session() {
        let mut store = HistoryStore::open_in_memory();
        let text = session("2\n", &mut store);
        assert!(text.contains("No period history recorded yet."));
        assert!(!text.contains("Stay healthy!"));
    }
}
