//! Quantile-aware windowed aggregation of a prediction series.
//!
//! Raw predictions arrive at a sub-daily cadence with no absolute calendar
//! time. The aggregator averages consecutive windows per quantile band and
//! stamps each window with a synthetic date counted forward from an anchor.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{Days, Months, NaiveDate};
use serde::Serialize;
use tracing::{debug, warn};

use crate::models::{BandValue, QuantilePredictionPoint};
use crate::{Error, Result};

/// Set of quantile labels a deployment's backend emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuantileScheme {
    /// 0.1 / 0.5 / 0.9
    Tenths,
    /// 0.25 / 0.5 / 0.75
    Quarters,
    Custom(Vec<String>),
}

impl QuantileScheme {
    pub fn keys(&self) -> Vec<String> {
        match self {
            QuantileScheme::Tenths => vec!["0.1".into(), "0.5".into(), "0.9".into()],
            QuantileScheme::Quarters => vec!["0.25".into(), "0.5".into(), "0.75".into()],
            QuantileScheme::Custom(keys) => keys.clone(),
        }
    }

    /// Key of the central band: "0.5" when present, otherwise the middle key.
    pub fn median_key(&self) -> Option<String> {
        let keys = self.keys();
        if keys.iter().any(|k| k == "0.5") {
            return Some("0.5".to_string());
        }
        keys.get(keys.len() / 2).cloned()
    }
}

impl FromStr for QuantileScheme {
    type Err = Error;

    /// `tenths`, `quarters`, or `custom:` followed by comma-separated labels,
    /// each a probability strictly between 0 and 1.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some((kind, list)) = s.split_once(':') {
            if !kind.trim().eq_ignore_ascii_case("custom") {
                return Err(Error::Config(format!("invalid quantile scheme '{}'", s)));
            }
            let keys: Vec<String> = list
                .split(',')
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect();
            if keys.is_empty() {
                return Err(Error::Config("custom quantile scheme has no labels".to_string()));
            }
            if let Some(bad) = keys
                .iter()
                .find(|k| !k.parse::<f64>().is_ok_and(|q| q > 0.0 && q < 1.0))
            {
                return Err(Error::Config(format!(
                    "quantile label '{}' is not a probability between 0 and 1",
                    bad
                )));
            }
            return Ok(QuantileScheme::Custom(keys));
        }

        match s.to_ascii_lowercase().as_str() {
            "tenths" => Ok(QuantileScheme::Tenths),
            "quarters" => Ok(QuantileScheme::Quarters),
            other => Err(Error::Config(format!(
                "invalid quantile scheme '{}' (expected tenths, quarters or custom:<labels>)",
                other
            ))),
        }
    }
}

/// How a null or non-numeric band value inside a window is averaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingValuePolicy {
    /// Count the value as 0; the window mean still divides by the window length
    #[default]
    ZeroFill,
    /// Leave the value out; the mean divides by the number of present values
    Skip,
}

impl FromStr for MissingValuePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zero" | "zero_fill" => Ok(MissingValuePolicy::ZeroFill),
            "skip" => Ok(MissingValuePolicy::Skip),
            other => Err(Error::Config(format!("invalid missing value policy '{}'", other))),
        }
    }
}

/// Calendar step between consecutive windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PeriodUnit {
    #[default]
    Day,
    Month,
}

impl PeriodUnit {
    fn advance(self, anchor: NaiveDate, steps: usize) -> Option<NaiveDate> {
        match self {
            PeriodUnit::Day => anchor.checked_add_days(Days::new(steps as u64)),
            PeriodUnit::Month => u32::try_from(steps)
                .ok()
                .and_then(|n| anchor.checked_add_months(Months::new(n))),
        }
    }

    /// English label, e.g. "Jan 5" for days or "Jan 2027" for months.
    pub fn label(self, date: NaiveDate) -> String {
        match self {
            PeriodUnit::Day => date.format("%b %-d").to_string(),
            PeriodUnit::Month => date.format("%b %Y").to_string(),
        }
    }
}

impl FromStr for PeriodUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" | "daily" => Ok(PeriodUnit::Day),
            "month" | "monthly" => Ok(PeriodUnit::Month),
            other => Err(Error::Config(format!("invalid period unit '{}'", other))),
        }
    }
}

/// Anything the aggregator can read quantile bands from.
pub trait QuantileSample {
    fn band(&self, key: &str) -> BandValue;
}

impl QuantileSample for QuantilePredictionPoint {
    fn band(&self, key: &str) -> BandValue {
        QuantilePredictionPoint::band(self, key)
    }
}

/// One chart-ready sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedDisplayPoint {
    pub display_label: String,
    pub period_start: NaiveDate,
    /// Mean value per quantile key
    #[serde(flatten)]
    pub bands: BTreeMap<String, f64>,
}

impl QuantileSample for AggregatedDisplayPoint {
    fn band(&self, key: &str) -> BandValue {
        self.bands
            .get(key)
            .map_or(BandValue::Absent, |v| BandValue::Present(*v))
    }
}

/// Windowed mean over a quantile series.
#[derive(Debug, Clone)]
pub struct Aggregator {
    window_size: usize,
    quantile_keys: Vec<String>,
    period_unit: PeriodUnit,
    missing_values: MissingValuePolicy,
}

impl Aggregator {
    pub fn new<I, K>(window_size: usize, quantile_keys: I) -> Result<Self>
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        if window_size == 0 {
            return Err(Error::Aggregation("window size must be at least 1".to_string()));
        }
        Ok(Self {
            window_size,
            quantile_keys: quantile_keys.into_iter().map(Into::into).collect(),
            period_unit: PeriodUnit::default(),
            missing_values: MissingValuePolicy::default(),
        })
    }

    pub fn period_unit(mut self, unit: PeriodUnit) -> Self {
        self.period_unit = unit;
        self
    }

    pub fn missing_values(mut self, policy: MissingValuePolicy) -> Self {
        self.missing_values = policy;
        self
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn quantile_keys(&self) -> &[String] {
        &self.quantile_keys
    }

    /// Average `points` in consecutive windows, dating window `i` at
    /// `anchor_date + i` periods.
    ///
    /// Yields `ceil(points.len() / window_size)` points; the last window may be
    /// short. Fails with [`Error::SchemaMismatch`] if any point lacks one of
    /// the configured keys.
    pub fn aggregate<P: QuantileSample>(
        &self,
        points: &[P],
        anchor_date: NaiveDate,
    ) -> Result<Vec<AggregatedDisplayPoint>> {
        let mut output = Vec::with_capacity(points.len().div_ceil(self.window_size));

        for (window_index, window) in points.chunks(self.window_size).enumerate() {
            let period_start = self
                .period_unit
                .advance(anchor_date, window_index)
                .ok_or_else(|| {
                    Error::Aggregation(format!(
                        "window {} falls outside the supported calendar range",
                        window_index
                    ))
                })?;

            let mut bands = BTreeMap::new();
            for key in &self.quantile_keys {
                let mut sum = 0.0;
                let mut present = 0usize;
                for (offset, point) in window.iter().enumerate() {
                    match point.band(key) {
                        BandValue::Present(v) => {
                            sum += v;
                            present += 1;
                        }
                        BandValue::Missing => {}
                        BandValue::Absent => {
                            let index = window_index * self.window_size + offset;
                            warn!(index, key = %key, "Prediction is missing a configured quantile");
                            return Err(Error::SchemaMismatch {
                                index,
                                key: key.clone(),
                            });
                        }
                    }
                }

                let divisor = match self.missing_values {
                    MissingValuePolicy::ZeroFill => window.len(),
                    MissingValuePolicy::Skip => present,
                };
                let mean = if divisor == 0 { 0.0 } else { sum / divisor as f64 };
                bands.insert(key.clone(), mean);
            }

            output.push(AggregatedDisplayPoint {
                display_label: self.period_unit.label(period_start),
                period_start,
                bands,
            });
        }

        debug!(
            raw = points.len(),
            windows = output.len(),
            window_size = self.window_size,
            "Aggregated prediction series"
        );
        Ok(output)
    }
}

/// Aggregate with daily periods and zero-filled missing values.
pub fn aggregate<P: QuantileSample>(
    points: &[P],
    window_size: usize,
    quantile_keys: &[&str],
    anchor_date: NaiveDate,
) -> Result<Vec<AggregatedDisplayPoint>> {
    Aggregator::new(window_size, quantile_keys.iter().copied())?.aggregate(points, anchor_date)
}

/// Headline numbers for an aggregated series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastSummary {
    pub periods: usize,
    pub mean: f64,
    pub peak_label: String,
    pub peak_value: f64,
}

/// Summarize one band of `series`; `None` if the series is empty or lacks it.
pub fn summarize(series: &[AggregatedDisplayPoint], band: &str) -> Option<ForecastSummary> {
    let values: Vec<(&str, f64)> = series
        .iter()
        .map(|p| p.bands.get(band).map(|v| (p.display_label.as_str(), *v)))
        .collect::<Option<_>>()?;
    let (peak_label, peak_value) = values
        .iter()
        .copied()
        .fold(None, |peak: Option<(&str, f64)>, (label, v)| match peak {
            Some((_, best)) if best >= v => peak,
            _ => Some((label, v)),
        })?;

    Some(ForecastSummary {
        periods: values.len(),
        mean: values.iter().map(|(_, v)| v).sum::<f64>() / values.len() as f64,
        peak_label: peak_label.to_string(),
        peak_value,
    })
}
