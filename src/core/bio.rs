//! Mock bio-load generator.
//!
//! Produces a synthetic hourly series for visualization only. Each sample is
//! the sum of a circadian sinusoid, a workday bonus, uniform noise, occasional
//! stress spikes and a decaying intervention effect, clamped to 0..=100.
//! Outputs are random; only their ranges and shape are stable.

use crate::store::types::InterventionKind;
use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc, Weekday};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::f64::consts::PI;

/// Longest window the generator accepts, in days.
pub const MAX_TREND_DAYS: u32 = 365;

/// A requested window outside `1..=MAX_TREND_DAYS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("trend window must be between 1 and {max} days, got {days}", max = MAX_TREND_DAYS)]
pub struct TrendWindowError {
    pub days: u32,
}

/// Check a requested window length.
pub fn trend_window(days: u32) -> Result<u32, TrendWindowError> {
    if (1..=MAX_TREND_DAYS).contains(&days) {
        Ok(days)
    } else {
        Err(TrendWindowError { days })
    }
}

/// Tunable constants of the generator.
///
/// These shape a plausible-looking chart; they are not a physiological model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BioTrendConfig {
    /// Synthetic interventions placed per 7 days of window
    pub interventions_per_week: f64,
    /// Effect applied on an intervention hour
    pub intervention_drop: f64,
    /// How much of the effect wears off each following hour
    pub recovery_per_hour: f64,
    pub circadian_base: f64,
    pub circadian_amplitude: f64,
    /// Hour of day (local) at which the circadian curve peaks
    pub circadian_peak_hour: f64,
    pub workday_bonus: f64,
    /// First work hour (inclusive)
    pub work_start_hour: u32,
    /// Last work hour (inclusive)
    pub work_end_hour: u32,
    /// Noise is uniform in `[-noise_amplitude, noise_amplitude]`
    pub noise_amplitude: f64,
    pub spike_chance_work_hours: f64,
    pub spike_chance_off_hours: f64,
    /// Spikes are uniform in `[0, spike_max]`
    pub spike_max: f64,
}

impl Default for BioTrendConfig {
    fn default() -> Self {
        Self {
            interventions_per_week: 3.0,
            intervention_drop: -25.0,
            recovery_per_hour: 8.0,
            circadian_base: 50.0,
            circadian_amplitude: 20.0,
            circadian_peak_hour: 15.0,
            workday_bonus: 15.0,
            work_start_hour: 9,
            work_end_hour: 18,
            noise_amplitude: 5.0,
            spike_chance_work_hours: 0.10,
            spike_chance_off_hours: 0.02,
            spike_max: 20.0,
        }
    }
}

impl BioTrendConfig {
    /// Number of intervention annotations for a window of `days`.
    pub fn intervention_count(&self, days: u32) -> usize {
        ((days as f64 / 7.0) * self.interventions_per_week)
            .round()
            .max(0.0) as usize
    }

    fn is_work_hour(&self, hour: u32) -> bool {
        hour >= self.work_start_hour && hour <= self.work_end_hour
    }
}

/// Synthetic intervention attached to a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendIntervention {
    #[serde(rename = "type")]
    pub kind: InterventionKind,
    pub duration_seconds: u32,
}

/// One hourly sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BioTrendPoint {
    pub timestamp: DateTime<Utc>,
    /// Load in 0..=100
    pub bio_load: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intervention: Option<TrendIntervention>,
}

/// Running effect of the most recent intervention.
#[derive(Debug, Clone, Copy, Default)]
struct InterventionEffect {
    value: f64,
}

impl InterventionEffect {
    fn step(&mut self, intervention_hour: bool, config: &BioTrendConfig) -> f64 {
        if intervention_hour {
            self.value = config.intervention_drop;
        } else if self.value < 0.0 {
            self.value = (self.value + config.recovery_per_hour).min(0.0);
        }
        self.value
    }
}

/// Circadian component for a local time of day.
fn circadian(hour: u32, minute: u32, config: &BioTrendConfig) -> f64 {
    let time_of_day = hour as f64 + minute as f64 / 60.0;
    ((time_of_day - config.circadian_peak_hour) / 12.0 * PI).sin() * config.circadian_amplitude
}

fn is_weekday(day: Weekday) -> bool {
    !matches!(day, Weekday::Sat | Weekday::Sun)
}

/// Generate `days * 24 + 1` hourly samples ending at `now`, oldest first.
///
/// Hour-of-day and weekday effects are evaluated in `now`'s time zone.
pub fn generate_bio_trends<Tz, R>(
    days: u32,
    now: DateTime<Tz>,
    config: &BioTrendConfig,
    rng: &mut R,
) -> Vec<BioTrendPoint>
where
    Tz: TimeZone,
    R: Rng + ?Sized,
{
    let hours = days as usize * 24;
    let len = hours + 1;

    // Pick intervention hours up front so the decay reacts to them causally.
    let count = config.intervention_count(days).min(len);
    let intervention_hours: HashSet<usize> =
        rand::seq::index::sample(rng, len, count).into_iter().collect();

    let spike_work = config.spike_chance_work_hours.clamp(0.0, 1.0);
    let spike_off = config.spike_chance_off_hours.clamp(0.0, 1.0);

    let mut effect = InterventionEffect::default();
    let mut points = Vec::with_capacity(len);

    for index in 0..len {
        let hours_back = (hours - index) as i64;
        let timestamp = now.clone() - Duration::hours(hours_back);
        let hour = timestamp.hour();
        let work_hours = config.is_work_hour(hour);

        let base = config.circadian_base + circadian(hour, timestamp.minute(), config);

        let workday = if work_hours && is_weekday(timestamp.weekday()) {
            config.workday_bonus
        } else {
            0.0
        };

        let noise = if config.noise_amplitude > 0.0 {
            rng.gen_range(-config.noise_amplitude..=config.noise_amplitude)
        } else {
            0.0
        };

        let spike_chance = if work_hours { spike_work } else { spike_off };
        let spike = if rng.gen_bool(spike_chance) && config.spike_max > 0.0 {
            rng.gen_range(0.0..=config.spike_max)
        } else {
            0.0
        };

        let is_intervention = intervention_hours.contains(&index);
        let decay = effect.step(is_intervention, config);

        let load = (base + workday + noise + spike + decay).clamp(0.0, 100.0).round() as u8;

        let intervention = is_intervention.then(|| TrendIntervention {
            kind: InterventionKind::ALL[rng.gen_range(0..InterventionKind::ALL.len())],
            duration_seconds: rng.gen_range(3..=8) * 60,
        });

        points.push(BioTrendPoint {
            timestamp: timestamp.with_timezone(&Utc),
            bio_load: load,
            intervention,
        });
    }

    points
}

/// Generate a series ending at the current time in `tz`.
pub fn generate(days: u32, tz: chrono_tz::Tz, config: &BioTrendConfig) -> Vec<BioTrendPoint> {
    let now = Utc::now().with_timezone(&tz);
    generate_bio_trends(days, now, config, &mut rand::thread_rng())
}
