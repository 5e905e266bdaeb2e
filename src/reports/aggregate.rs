//! Aggregation functions for report summary rows

use std::fmt;
use std::str::FromStr;

use crate::formula::round2;
use crate::models::CellValue;

/// A summary-row aggregation over one output column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    Sum,
    Average,
    Count,
    Min,
    Max,
}

impl AggregateFunction {
    /// Parse a function name, case-insensitively (`AVG` and `AVERAGE` are aliases)
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_uppercase().as_str() {
            "SUM" => Some(Self::Sum),
            "AVG" | "AVERAGE" => Some(Self::Average),
            "COUNT" => Some(Self::Count),
            "MIN" => Some(Self::Min),
            "MAX" => Some(Self::Max),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sum => "SUM",
            Self::Average => "AVERAGE",
            Self::Count => "COUNT",
            Self::Min => "MIN",
            Self::Max => "MAX",
        }
    }

    /// Aggregate the numeric subset of `values`
    ///
    /// Values without a numeric reading (text, null, booleans) are skipped
    /// entirely, including by `COUNT`. Returns `None` when nothing numeric
    /// remains. SUM and AVERAGE are rounded to 2 decimal places; MIN and MAX
    /// return a stored value unchanged.
    pub fn apply<'v, I>(&self, values: I) -> Option<f64>
    where
        I: IntoIterator<Item = &'v CellValue>,
    {
        let numbers: Vec<f64> = values.into_iter().filter_map(CellValue::as_number).collect();
        if numbers.is_empty() {
            return None;
        }

        let sum: f64 = numbers.iter().sum();
        let result = match self {
            Self::Sum => round2(sum),
            Self::Average => round2(sum / numbers.len() as f64),
            Self::Count => numbers.len() as f64,
            Self::Min => numbers.iter().copied().fold(f64::INFINITY, f64::min),
            Self::Max => numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        };

        Some(result)
    }
}

impl FromStr for AggregateFunction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            format!(
                "Unknown aggregation function '{}' (expected SUM, AVG, AVERAGE, COUNT, MIN or MAX)",
                s.trim()
            )
        })
    }
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate by function name; unknown names yield `None`
pub fn aggregate<'v, I>(function: &str, values: I) -> Option<f64>
where
    I: IntoIterator<Item = &'v CellValue>,
{
    AggregateFunction::parse(function)?.apply(values)
}
