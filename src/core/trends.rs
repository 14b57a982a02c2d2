//! Summaries of a bio-load series.

use crate::core::bio::BioTrendPoint;
use crate::store::types::{InterventionLog, OVERLOAD_LOAD_FROM};
use chrono::{TimeZone, Timelike};
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, OrderStatistics, Statistics};

/// Descriptive statistics over a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    pub samples: usize,
    pub mean: f64,
    /// Sample standard deviation (0 for fewer than two samples)
    pub std_dev: f64,
    pub min: u8,
    pub max: u8,
    pub p90: f64,
    /// Samples at or above the overload threshold
    pub overload_hours: usize,
    /// Local hour of day with the highest average load
    pub peak_hour: Option<u32>,
    pub interventions: usize,
}

impl TrendSummary {
    /// Summarize `points`, bucketing hours in `tz`. `None` for an empty series.
    pub fn from_points<Tz: TimeZone>(points: &[BioTrendPoint], tz: &Tz) -> Option<Self> {
        if points.is_empty() {
            return None;
        }

        let loads: Vec<f64> = points.iter().map(|p| p.bio_load as f64).collect();
        let mean = Statistics::mean(loads.iter());
        let std_dev = if loads.len() > 1 {
            Statistics::std_dev(loads.iter())
        } else {
            0.0
        };
        let p90 = Data::new(loads.clone()).percentile(90);

        let min = points.iter().map(|p| p.bio_load).fold(u8::MAX, u8::min);
        let max = points.iter().map(|p| p.bio_load).fold(u8::MIN, u8::max);

        let overload_hours = points
            .iter()
            .filter(|p| p.bio_load >= OVERLOAD_LOAD_FROM)
            .count();
        let interventions = points.iter().filter(|p| p.intervention.is_some()).count();

        Some(Self {
            samples: points.len(),
            mean,
            std_dev,
            min,
            max,
            p90,
            overload_hours,
            peak_hour: peak_hour(points, tz),
            interventions,
        })
    }
}

fn peak_hour<Tz: TimeZone>(points: &[BioTrendPoint], tz: &Tz) -> Option<u32> {
    let mut sums = [0.0_f64; 24];
    let mut counts = [0_u32; 24];
    for point in points {
        let hour = point.timestamp.with_timezone(tz).hour() as usize;
        sums[hour] += point.bio_load as f64;
        counts[hour] += 1;
    }

    (0..24)
        .filter(|&h| counts[h] > 0)
        .map(|h| (h as u32, sums[h] / counts[h] as f64))
        .fold(None, |best: Option<(u32, f64)>, (hour, avg)| match best {
            Some((_, best_avg)) if best_avg >= avg => best,
            _ => Some((hour, avg)),
        })
        .map(|(hour, _)| hour)
}

/// Turn the synthetic intervention annotations into completed logs, newest first.
pub fn extract_interventions(points: &[BioTrendPoint]) -> Vec<InterventionLog> {
    let mut logs: Vec<InterventionLog> = points
        .iter()
        .filter_map(|p| p.intervention.map(|i| (p.timestamp, i)))
        .enumerate()
        .map(|(index, (timestamp, intervention))| InterventionLog {
            id: format!("intervention-{index}"),
            kind: intervention.kind,
            sub_type: None,
            timestamp,
            duration_seconds: intervention.duration_seconds,
            completed: true,
        })
        .collect();
    logs.reverse();
    logs
}
