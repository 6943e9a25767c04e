//! Wall-clock benchmark harness for comparing kernel variants.
//!
//! The harness runs a few discarded warm-up calls, then times a fixed number
//! of measured calls and reports the mean per call. It is deliberately simple:
//! no outlier rejection or confidence intervals (use the criterion benches in
//! `benches/` for that). Speedups are computed against a baseline sample,
//! usually the scalar variant.
//!
//! ```rust
//! use lanebench::bench::{Comparison, Harness, HarnessConfig};
//! use lanebench::{dot_product, scalar_dot_product};
//!
//! let a = vec![1.0f32; 4096];
//! let b = vec![2.0f32; 4096];
//!
//! let harness = Harness::new(HarnessConfig::default().with_measured_iterations(3));
//! let report = Comparison::new("dot product")
//!     .with_sample(harness.measure("scalar", || scalar_dot_product(&a, &b)))
//!     .with_sample(harness.measure("simd", || dot_product(&a, &b)));
//!
//! assert_eq!(report.speedups().len(), 1);
//! println!("{report}");
//! ```

use std::fmt;
use std::hint::black_box;
use std::time::Instant;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::{invalid_argument, Result};

/// Iteration counts of one measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Calls made before timing starts. Their results are discarded.
    pub warmup_iterations: u32,
    /// Timed calls. The reported time is their mean.
    pub measured_iterations: u32,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            warmup_iterations: 3,
            measured_iterations: 5,
        }
    }
}

impl HarnessConfig {
    /// Sets the number of untimed warm-up calls.
    pub fn with_warmup_iterations(mut self, warmup_iterations: u32) -> Self {
        self.warmup_iterations = warmup_iterations;
        self
    }

    /// Sets the number of timed calls averaged into a sample.
    pub fn with_measured_iterations(mut self, measured_iterations: u32) -> Self {
        self.measured_iterations = measured_iterations;
        self
    }

    /// Checks that at least one call is timed.
    ///
    /// # Errors
    ///
    /// Returns an error if `measured_iterations` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.measured_iterations == 0 {
            return Err(invalid_argument("measured_iterations must be positive"));
        }
        Ok(())
    }

    /// Parses and validates a TOML document. Missing keys take their default.
    ///
    /// ```rust
    /// use lanebench::bench::HarnessConfig;
    ///
    /// let config = HarnessConfig::from_toml_str("measured_iterations = 20").unwrap();
    /// assert_eq!(config.warmup_iterations, 3);
    /// assert_eq!(config.measured_iterations, 20);
    /// ```
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)
            .map_err(|e| invalid_argument(format!("invalid harness config: {e}")))?;
        config.validate()?;
        Ok(config)
    }
}

/// Mean wall-clock time of one measured call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingSample {
    pub label: String,
    /// Mean nanoseconds per measured call.
    pub elapsed_nanos: u64,
}

/// Ratio `baseline / candidate`, with the candidate time clamped to at
/// least one nanosecond so a call too fast for the clock never divides by zero.
pub fn speedup(baseline: &TimingSample, candidate: &TimingSample) -> f64 {
    baseline.elapsed_nanos as f64 / candidate.elapsed_nanos.max(1) as f64
}

/// Times closures according to a [`HarnessConfig`].
#[derive(Debug, Clone, Default)]
pub struct Harness {
    config: HarnessConfig,
}

impl Harness {
    /// Creates a harness with the given iteration counts.
    pub fn new(config: HarnessConfig) -> Self {
        Self { config }
    }

    /// Iteration counts used by [`measure`](Self::measure).
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Runs `thunk` for the warm-up, then times the measured calls.
    ///
    /// Every result passes through [`black_box`] so the calls cannot be
    /// optimized away. A zero `measured_iterations` is treated as one.
    pub fn measure<R>(
        &self,
        label: impl Into<String>,
        mut thunk: impl FnMut() -> R,
    ) -> TimingSample {
        let label = label.into();
        let span = tracing::debug_span!("measure", label = %label);
        let _entered = span.enter();

        for _ in 0..self.config.warmup_iterations {
            black_box(thunk());
        }

        let iterations = self.config.measured_iterations.max(1);
        let start = Instant::now();
        for _ in 0..iterations {
            black_box(thunk());
        }
        let total = start.elapsed().as_nanos();
        let elapsed_nanos = u64::try_from(total / u128::from(iterations)).unwrap_or(u64::MAX);

        tracing::debug!(
            warmup = self.config.warmup_iterations,
            iterations,
            elapsed_nanos,
            "measurement done"
        );
        TimingSample {
            label,
            elapsed_nanos,
        }
    }
}

/// Measures `thunk` with the default configuration.
pub fn benchmark<R>(label: impl Into<String>, thunk: impl FnMut() -> R) -> TimingSample {
    Harness::default().measure(label, thunk)
}

/// A group of samples of the same workload, the first one being the baseline.
#[derive(Debug, Clone)]
pub struct Comparison {
    title: String,
    created_at: DateTime<Local>,
    samples: Vec<TimingSample>,
}

impl Comparison {
    /// Creates an empty comparison stamped with the current local time.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            created_at: Local::now(),
            samples: Vec::new(),
        }
    }

    /// Appends a sample. The first one pushed is the baseline.
    pub fn push(&mut self, sample: TimingSample) {
        self.samples.push(sample);
    }

    /// Builder form of [`push`](Self::push).
    pub fn with_sample(mut self, sample: TimingSample) -> Self {
        self.push(sample);
        self
    }

    /// Title printed above the table.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Samples in insertion order.
    pub fn samples(&self) -> &[TimingSample] {
        &self.samples
    }

    /// The sample every speedup is relative to, if any.
    pub fn baseline(&self) -> Option<&TimingSample> {
        self.samples.first()
    }

    /// Speedup of every sample after the first, relative to the first.
    pub fn speedups(&self) -> Vec<(&str, f64)> {
        match self.samples.split_first() {
            Some((baseline, rest)) => rest
                .iter()
                .map(|sample| (sample.label.as_str(), speedup(baseline, sample)))
                .collect(),
            None => Vec::new(),
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} ({})",
            self.title,
            self.created_at.format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(f, "{}", "-".repeat(48))?;
        writeln!(f, "{:<24} {:>12} {:>10}", "variant", "ns/call", "speedup")?;

        let Some(baseline) = self.baseline() else {
            return writeln!(f, "(no samples)");
        };
        for sample in &self.samples {
            writeln!(
                f,
                "{:<24} {:>12} {:>9.2}x",
                sample.label,
                sample.elapsed_nanos,
                speedup(baseline, sample)
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(label: &str, elapsed_nanos: u64) -> TimingSample {
        TimingSample {
            label: label.to_string(),
            elapsed_nanos,
        }
    }

    #[test]
    fn test_default_config() {
        let config = HarnessConfig::default();
        assert_eq!(config.warmup_iterations, 3);
        assert_eq!(config.measured_iterations, 5);
        assert!(config.validate().is_ok());
        assert!(config.with_measured_iterations(0).validate().is_err());
    }

    #[test]
    fn test_call_counts() {
        let harness = Harness::new(
            HarnessConfig::default()
                .with_warmup_iterations(2)
                .with_measured_iterations(4),
        );
        let mut calls = 0;
        let timing = harness.measure("count", || calls += 1);
        assert_eq!(calls, 6);
        assert_eq!(timing.label, "count");
    }

    #[test]
    fn test_zero_measured_runs_once() {
        let harness = Harness::new(
            HarnessConfig::default()
                .with_warmup_iterations(0)
                .with_measured_iterations(0),
        );
        let mut calls = 0;
        harness.measure("once", || calls += 1);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_speedup_clamps_zero_time() {
        assert_eq!(speedup(&sample("scalar", 800), &sample("simd", 200)), 4.0);
        assert_eq!(speedup(&sample("scalar", 800), &sample("simd", 0)), 800.0);
        assert_eq!(speedup(&sample("scalar", 0), &sample("simd", 0)), 0.0);
    }

    #[test]
    fn test_comparison_report() {
        let report = Comparison::new("dot")
            .with_sample(sample("scalar", 1000))
            .with_sample(sample("simd", 250))
            .with_sample(sample("simd+parallel", 100));

        assert_eq!(report.baseline().map(|s| s.label.as_str()), Some("scalar"));
        assert_eq!(report.speedups(), vec![("simd", 4.0), ("simd+parallel", 10.0)]);

        let text = report.to_string();
        assert!(text.starts_with("dot ("));
        assert!(text.contains("4.00x"));
        assert!(text.contains("10.00x"));

        assert!(Comparison::new("empty").to_string().contains("(no samples)"));
        assert!(Comparison::new("empty").speedups().is_empty());
    }

    #[test]
    fn test_config_from_toml() {
        let config =
            HarnessConfig::from_toml_str("warmup_iterations = 1\nmeasured_iterations = 9").unwrap();
        let expected = HarnessConfig::default()
            .with_warmup_iterations(1)
            .with_measured_iterations(9);
        assert_eq!(config, expected);

        assert_eq!(HarnessConfig::from_toml_str("").unwrap(), HarnessConfig::default());
        assert!(HarnessConfig::from_toml_str("measured_iterations = 0").is_err());
        assert!(HarnessConfig::from_toml_str("measured_iterations = \"many\"").is_err());
    }
}
