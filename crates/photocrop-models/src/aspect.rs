use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Target width:height proportion of a crop, e.g. `4:5` or `1:1.414`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AspectRatio {
    pub width: f64,
    pub height: f64,
}

/// Aspect ratio for A-series paper (1:√2).
pub const PRINT_ASPECT_RATIO: &str = "1:1.414";

/// Ratios suggested when the caller does not ask for specific ones.
pub const DEFAULT_ASPECT_RATIOS: [&str; 3] = ["1:1", "4:5", "3:4"];

impl AspectRatio {
    /// Square (1:1)
    pub const SQUARE: AspectRatio = AspectRatio {
        width: 1.0,
        height: 1.0,
    };

    /// Portrait print (4:5)
    pub const PORTRAIT: AspectRatio = AspectRatio {
        width: 4.0,
        height: 5.0,
    };

    /// Returns the aspect ratio as a decimal (width / height).
    pub fn as_f64(&self) -> f64 {
        self.width / self.height
    }

    /// Parse a `"W:H"` string.
    pub fn parse(ratio: &str) -> Result<Self, AspectRatioParseError> {
        ratio.parse()
    }

    /// Whether `ratio` parses as a valid aspect ratio.
    pub fn is_valid(ratio: &str) -> bool {
        ratio.parse::<AspectRatio>().is_ok()
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

impl FromStr for AspectRatio {
    type Err = AspectRatioParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 2 {
            return Err(AspectRatioParseError::InvalidFormat(s.to_string()));
        }

        let width = parse_component(parts[0], s)?;
        let height = parse_component(parts[1], s)?;

        if width <= 0.0 || height <= 0.0 {
            return Err(AspectRatioParseError::NonPositive(s.to_string()));
        }

        Ok(AspectRatio { width, height })
    }
}

fn parse_component(part: &str, whole: &str) -> Result<f64, AspectRatioParseError> {
    match part.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(AspectRatioParseError::InvalidNumber(whole.to_string())),
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        Self::SQUARE
    }
}

/// Error parsing an aspect ratio string.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AspectRatioParseError {
    #[error("Invalid aspect ratio format: \"{0}\". Expected format: \"width:height\"")]
    InvalidFormat(String),

    #[error("Invalid aspect ratio format: \"{0}\". Values must be numbers")]
    InvalidNumber(String),

    #[error("Aspect ratio values must be positive: \"{0}\"")]
    NonPositive(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_standard_ratios() {
        assert_eq!(
            "16:9".parse::<AspectRatio>().unwrap(),
            AspectRatio {
                width: 16.0,
                height: 9.0
            }
        );
        let a4: AspectRatio = PRINT_ASPECT_RATIO.parse().unwrap();
        assert!((a4.as_f64() - 1.0 / 1.414).abs() < 1e-9);
    }

    #[test]
    fn test_parse_rejects_missing_colon() {
        assert!(matches!(
            AspectRatio::parse("16"),
            Err(AspectRatioParseError::InvalidFormat(_))
        ));
        assert!(matches!(
            AspectRatio::parse(""),
            Err(AspectRatioParseError::InvalidFormat(_))
        ));
        assert!(matches!(
            AspectRatio::parse("1:2:3"),
            Err(AspectRatioParseError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert!(matches!(
            AspectRatio::parse("a:b"),
            Err(AspectRatioParseError::InvalidNumber(_))
        ));
        assert!(matches!(
            AspectRatio::parse("NaN:1"),
            Err(AspectRatioParseError::InvalidNumber(_))
        ));
    }

    #[test]
    fn test_parse_rejects_non_positive() {
        assert!(matches!(
            AspectRatio::parse("0:9"),
            Err(AspectRatioParseError::NonPositive(_))
        ));
        assert!(matches!(
            AspectRatio::parse("16:-1"),
            Err(AspectRatioParseError::NonPositive(_))
        ));
    }

    #[test]
    fn test_display_round_trips() {
        assert_eq!(AspectRatio::parse("4:5").unwrap().to_string(), "4:5");
        assert_eq!(AspectRatio::parse("1:1.414").unwrap().to_string(), "1:1.414");
    }

    #[test]
    fn test_default_ratios_are_valid() {
        for ratio in DEFAULT_ASPECT_RATIOS {
            assert!(AspectRatio::is_valid(ratio), "{ratio}");
        }
    }
}
