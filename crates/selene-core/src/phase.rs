//! Ovulation estimate and cycle phase for a reference day.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::baseline::PredictionWindow;
use crate::constants::{DEFAULT_CYCLE_LENGTH, LUTEAL_DAYS};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Menstrual,
    Follicular,
    Ovulation,
    Luteal,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Menstrual => "menstrual",
            Phase::Follicular => "follicular",
            Phase::Ovulation => "ovulation",
            Phase::Luteal => "luteal",
        }
    }
}

/// What was observed on the reference day, if anything.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySignals {
    pub flow: bool,
    pub egg_white_mucus: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhaseInput {
    pub reference: NaiveDate,
    pub last_period: Option<NaiveDate>,
    pub predicted_ovulation: Option<NaiveDate>,
    pub average_cycle_length: Option<f64>,
    pub today: DaySignals,
}

fn shift(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    if days >= 0 {
        date.checked_add_days(Days::new(days as u64))
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
    }
}

/// Ovulation estimate from a forecast window: the window midpoint minus the
/// luteal length, or the last period plus that length when the midpoint
/// would land on or before the last period.
pub fn estimate_ovulation(window: &PredictionWindow, last_period: NaiveDate) -> Option<NaiveDate> {
    let half = window.latest.signed_duration_since(window.earliest).num_days() / 2;
    let midpoint = shift(window.earliest, half)?;
    let candidate = shift(midpoint, -LUTEAL_DAYS)?;
    if candidate <= last_period {
        shift(last_period, LUTEAL_DAYS)
    } else {
        Some(candidate)
    }
}

/// Phase of the cycle on `input.reference`.
///
/// Observed flow or egg-white mucus decide outright. Otherwise the phase is
/// read off the distance to ovulation, either the given prediction or one
/// derived from the last period and average cycle length. Returns `None`
/// when neither a last period nor an ovulation date is known.
pub fn estimate_phase(input: &PhaseInput) -> Option<Phase> {
    if input.today.flow {
        return Some(Phase::Menstrual);
    }
    if input.today.egg_white_mucus {
        return Some(Phase::Ovulation);
    }

    let cycle_length = input
        .average_cycle_length
        .filter(|&l| l > 10.0)
        .unwrap_or(DEFAULT_CYCLE_LENGTH as f64);

    let estimated = input
        .last_period
        .and_then(|last| shift(last, (cycle_length - LUTEAL_DAYS as f64).round() as i64));
    let ovulation = input.predicted_ovulation.or(estimated)?;

    let day_index = input
        .last_period
        .map(|last| input.reference.signed_duration_since(last).num_days() + 1);
    let diff = input.reference.signed_duration_since(ovulation).num_days();

    let phase = if diff.abs() <= 1 {
        Phase::Ovulation
    } else if diff < 0 {
        match day_index {
            Some(day) if day <= 5 => Phase::Menstrual,
            _ => Phase::Follicular,
        }
    } else {
        Phase::Luteal
    };
    Some(phase)
}
