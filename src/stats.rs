// pidstat_report - pidstat Memory Log Analyzer
// Copyright (C) 2025 The pidstat_report contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

/*!
    # stats.rs

    Summary statistics over a parsed sample sequence:
    - RSS / VSZ / %MEM mean, min, max and sample standard deviation
    - Step-to-step RSS change pattern (jumps beyond +/- 5 MB)
    - System-wide totals from the optional system memory log
*/

use chrono::NaiveDateTime;

use crate::pidstat::Sample;
use crate::sysmem::SystemMemorySample;

/// RSS step (MB) that counts as a significant increase or decrease.
pub const CHANGE_THRESHOLD_MB: f64 = 5.0;

/// Mean, min, max and sample standard deviation of one series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Describe {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// n-1 estimator, NaN for fewer than two values
    pub std_dev: f64,
}

impl Describe {
    pub fn of(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let std_dev = if values.len() < 2 {
            f64::NAN
        } else {
            let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (n - 1.0)).sqrt()
        };
        Some(Self { mean, min, max, std_dev })
    }
}

/// Significant RSS jumps between consecutive samples.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChangePattern {
    pub increases: usize,
    pub decreases: usize,
    /// Largest step, set only when at least one increase qualified
    pub max_increase: Option<f64>,
    /// Most negative step, set only when at least one decrease qualified
    pub max_decrease: Option<f64>,
}

impl ChangePattern {
    pub fn of(values: &[f64], threshold: f64) -> Self {
        let diffs: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();
        let increases = diffs.iter().filter(|&&d| d > threshold).count();
        let decreases = diffs.iter().filter(|&&d| d < -threshold).count();
        let max_increase = (increases > 0)
            .then(|| diffs.iter().cloned().fold(f64::NEG_INFINITY, f64::max));
        let max_decrease = (decreases > 0)
            .then(|| diffs.iter().cloned().fold(f64::INFINITY, f64::min));
        Self {
            increases,
            decreases,
            max_increase,
            max_decrease,
        }
    }
}

/// Aggregate view of one monitoring run.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryStatistics {
    pub pid: u32,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub sample_count: usize,
    pub rss_mb: Describe,
    pub vsz_mb: Describe,
    pub mem_percent: Describe,
    pub changes: ChangePattern,
}

impl SummaryStatistics {
    /// `None` only for an empty slice.
    pub fn compute(samples: &[Sample]) -> Option<Self> {
        let first = samples.first()?;
        let rss: Vec<f64> = samples.iter().map(Sample::rss_mb).collect();
        let vsz: Vec<f64> = samples.iter().map(Sample::vsz_mb).collect();
        let mem: Vec<f64> = samples.iter().map(|s| s.mem_percent).collect();
        let start = samples.iter().map(|s| s.timestamp).min()?;
        let end = samples.iter().map(|s| s.timestamp).max()?;

        Some(Self {
            pid: first.pid,
            start,
            end,
            sample_count: samples.len(),
            rss_mb: Describe::of(&rss)?,
            vsz_mb: Describe::of(&vsz)?,
            mem_percent: Describe::of(&mem)?,
            changes: ChangePattern::of(&rss, CHANGE_THRESHOLD_MB),
        })
    }

    pub fn duration_secs(&self) -> f64 {
        (self.end - self.start).num_milliseconds() as f64 / 1000.0
    }

    pub fn duration_minutes(&self) -> f64 {
        self.duration_secs() / 60.0
    }

    /// Print the analysis block to stdout.
    pub fn print_report(&self) {
        println!("Process (PID {}) Memory Usage Analysis", self.pid);
        println!("{}", "=".repeat(60));
        println!("Analysis period: {} ~ {}", self.start, self.end);
        println!("Total data points: {}", self.sample_count);
        println!("Monitoring duration: {:.1} minutes", self.duration_minutes());
        println!();
        print_describe("RSS (Physical Memory) Usage:", &self.rss_mb);
        print_describe("VSZ (Virtual Memory) Usage:", &self.vsz_mb);

        let c = &self.changes;
        println!("Memory Change Patterns:");
        println!("   - Increases >{}MB: {} times", CHANGE_THRESHOLD_MB, c.increases);
        println!("   - Decreases >{}MB: {} times", CHANGE_THRESHOLD_MB, c.decreases);
        if let Some(v) = c.max_increase {
            println!("   - Maximum increase: {:.1} MB", v);
        }
        if let Some(v) = c.max_decrease {
            println!("   - Maximum decrease: {:.1} MB", v);
        }
        println!();
    }
}

fn print_describe(heading: &str, d: &Describe) {
    println!("{}", heading);
    println!("   - Average: {:.1} MB", d.mean);
    println!("   - Minimum: {:.1} MB", d.min);
    println!("   - Maximum: {:.1} MB", d.max);
    println!("   - Standard Deviation: {:.1} MB", d.std_dev);
    println!();
}

/// Host-wide figures from the system memory log.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemSummary {
    /// Capacity as reported by the first row
    pub total_gb: f64,
    pub used_gb: Describe,
    pub usage_percent: Describe,
}

impl SystemSummary {
    pub fn compute(samples: &[SystemMemorySample]) -> Option<Self> {
        let first = samples.first()?;
        let used: Vec<f64> = samples.iter().map(|s| s.used_memory_gb).collect();
        let pct: Vec<f64> = samples.iter().map(|s| s.memory_usage_percent).collect();
        Some(Self {
            total_gb: first.total_memory_gb,
            used_gb: Describe::of(&used)?,
            usage_percent: Describe::of(&pct)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_constant_series_has_zero_std_dev() {
        let d = Describe::of(&[100.0, 100.0, 100.0]).unwrap();
        assert_eq!(d.mean, 100.0);
        assert_eq!(d.min, 100.0);
        assert_eq!(d.max, 100.0);
        assert_eq!(d.std_dev, 0.0);
    }

    #[test]
    fn describe_single_value_std_dev_is_nan() {
        let d = Describe::of(&[42.0]).unwrap();
        assert_eq!(d.mean, 42.0);
        assert!(d.std_dev.is_nan());
    }

    #[test]
    fn describe_uses_sample_estimator() {
        // mean 5, squared deviations sum to 32, n-1 = 7
        let d = Describe::of(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(d.mean, 5.0);
        assert!((d.std_dev - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn describe_empty_is_none() {
        assert!(Describe::of(&[]).is_none());
    }

    #[test]
    fn change_pattern_counts_jumps_past_threshold() {
        let rss = [100.0, 110.0, 112.0, 100.0, 100.0, 105.0, 130.0];
        let c = ChangePattern::of(&rss, CHANGE_THRESHOLD_MB);
        // +10, +2, -12, 0, +5 (not > 5), +25
        assert_eq!(c.increases, 2);
        assert_eq!(c.decreases, 1);
        assert_eq!(c.max_increase, Some(25.0));
        assert_eq!(c.max_decrease, Some(-12.0));
    }

    #[test]
    fn change_pattern_flat_series_reports_nothing() {
        let c = ChangePattern::of(&[50.0, 51.0, 49.0], CHANGE_THRESHOLD_MB);
        assert_eq!(c, ChangePattern::default());
        assert_eq!(ChangePattern::of(&[50.0], CHANGE_THRESHOLD_MB), ChangePattern::default());
    }
}
