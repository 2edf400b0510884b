//! Body height entered on the height step.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::errors::TryOnError;

pub const MIN_FEET: u8 = 3;
pub const INCHES_PER_FOOT: u8 = 12;

/// Height in feet and inches. Only constructed through validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Height {
    feet: u8,
    inches: u8,
}

impl Height {
    /// Validate feet >= 3 and 0 <= inches < 12.
    pub fn new(feet: u8, inches: u8) -> Result<Self, TryOnError> {
        if feet < MIN_FEET {
            return Err(TryOnError::invalid_input(format!(
                "height must be at least {MIN_FEET} feet"
            )));
        }
        if inches >= INCHES_PER_FOOT {
            return Err(TryOnError::invalid_input(format!(
                "inches must be between 0 and {}",
                INCHES_PER_FOOT - 1
            )));
        }
        Ok(Self { feet, inches })
    }

    /// Parse the two form fields. Both must be non-blank integers.
    pub fn parse(feet: &str, inches: &str) -> Result<Self, TryOnError> {
        let field = |raw: &str, name: &str| -> Result<u8, TryOnError> {
            let raw = raw.trim();
            if raw.is_empty() {
                return Err(TryOnError::invalid_input(format!("{name} is required")));
            }
            raw.parse::<u8>()
                .map_err(|_| TryOnError::invalid_input(format!("{name} must be a whole number")))
        };
        Self::new(field(feet, "feet")?, field(inches, "inches")?)
    }

    pub fn feet(&self) -> u8 {
        self.feet
    }

    pub fn inches(&self) -> u8 {
        self.inches
    }

    pub fn total_inches(&self) -> u32 {
        u32::from(self.feet) * u32::from(INCHES_PER_FOOT) + u32::from(self.inches)
    }
}

impl fmt::Display for Height {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}'{}\"", self.feet, self.inches)
    }
}

/// Accepts the display form, e.g. `5'9"` (the trailing quote is optional).
impl FromStr for Height {
    type Err = TryOnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (feet, inches) = s
            .split_once('\'')
            .ok_or_else(|| TryOnError::invalid_input(format!("expected a height like 5'9\", got '{s}'")))?;
        let inches = inches.trim().trim_end_matches('"');
        Self::parse(feet, inches)
    }
}
