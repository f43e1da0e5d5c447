//! Bounded scores and the tallies they come from.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// A score in `[0, 1]`.
///
/// The only constructor is [`Proportion::new`], so an out-of-range value
/// cannot be stored in a report.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Proportion(f64);

impl Proportion {
    pub fn new(value: f64) -> Result<Self, DomainError> {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(DomainError::validation(format!(
                "Proportion must be between 0 and 1, got {}",
                value
            )));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Equal within `tolerance`.
    pub fn approx_eq(self, other: Proportion, tolerance: f64) -> bool {
        (self.0 - other.0).abs() <= tolerance
    }
}

impl TryFrom<f64> for Proportion {
    type Error = DomainError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Proportion::new(value)
    }
}

impl From<Proportion> for f64 {
    fn from(p: Proportion) -> f64 {
        p.0
    }
}

impl std::fmt::Display for Proportion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `matched` out of `total` checked items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub matched: u64,
    pub total: u64,
}

impl Tally {
    pub fn new(matched: u64, total: u64) -> Self {
        Self { matched, total }
    }

    /// Build from signed model-supplied counts.
    pub fn from_counts(matched: i64, total: i64) -> Result<Self, DomainError> {
        if matched < 0 || total < 0 {
            return Err(DomainError::validation("Counts must not be negative"));
        }
        Ok(Self::new(matched as u64, total as u64))
    }

    pub fn proportion(&self) -> Result<Proportion, DomainError> {
        if self.total == 0 {
            return Err(DomainError::validation(
                "Total must be greater than zero",
            ));
        }
        if self.matched > self.total {
            return Err(DomainError::validation(format!(
                "Matched count {} exceeds total {}",
                self.matched, self.total
            )));
        }
        Proportion::new(self.matched as f64 / self.total as f64)
    }
}

impl std::fmt::Display for Tally {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.matched, self.total)
    }
}

/// One scored dimension of a report: an optional value plus its justification.
///
/// Serialized with the capitalized keys of the report file format.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Metric {
    #[serde(rename = "Metric")]
    pub value: Option<Proportion>,
    #[serde(rename = "Report", default)]
    pub explanation: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proportion_bounds() {
        assert!(Proportion::new(0.0).is_ok());
        assert!(Proportion::new(1.0).is_ok());
        assert!(Proportion::new(0.42).is_ok());
        assert!(Proportion::new(-0.01).is_err());
        assert!(Proportion::new(1.01).is_err());
        assert!(Proportion::new(f64::NAN).is_err());
        assert!(Proportion::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_proportion_deserialize_rejects_out_of_range() {
        let ok: Proportion = serde_json::from_str("0.5").unwrap();
        assert_eq!(ok.value(), 0.5);
        assert!(serde_json::from_str::<Proportion>("1.5").is_err());
    }

    #[test]
    fn test_tally_proportion() {
        assert_eq!(Tally::new(4, 5).proportion().unwrap().value(), 0.8);
        assert_eq!(Tally::new(0, 3).proportion().unwrap().value(), 0.0);
        assert!(Tally::new(1, 0).proportion().is_err());
        assert!(Tally::new(6, 5).proportion().is_err());
        assert!(Tally::from_counts(-1, 5).is_err());
        assert_eq!(Tally::new(3, 4).to_string(), "3/4");
    }

    #[test]
    fn test_metric_wire_format() {
        let metric = Metric {
            value: Some(Proportion::new(0.8).unwrap()),
            explanation: "4 of 5 claims verified".to_string(),
        };
        let value = serde_json::to_value(&metric).unwrap();
        assert_eq!(value["Metric"], 0.8);
        assert_eq!(value["Report"], "4 of 5 claims verified");

        let unset = serde_json::to_value(Metric::default()).unwrap();
        assert!(unset["Metric"].is_null());
        assert_eq!(unset["Report"], "");
    }
}
