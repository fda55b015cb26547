//! TiltColor - logical channel name of a hydrometer

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ContractError;

/// Hydrometer colour (logical channel)
///
/// Each physical device broadcasts a fixed identifier per colour.
/// `Simulated` is reserved for the synthetic scan source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TiltColor {
    Red,
    Green,
    Black,
    Purple,
    Orange,
    Blue,
    Yellow,
    Pink,
    Simulated,
}

impl TiltColor {
    /// All colours, in identifier order
    pub const ALL: [TiltColor; 9] = [
        TiltColor::Red,
        TiltColor::Green,
        TiltColor::Black,
        TiltColor::Purple,
        TiltColor::Orange,
        TiltColor::Blue,
        TiltColor::Yellow,
        TiltColor::Pink,
        TiltColor::Simulated,
    ];

    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            TiltColor::Red => "red",
            TiltColor::Green => "green",
            TiltColor::Black => "black",
            TiltColor::Purple => "purple",
            TiltColor::Orange => "orange",
            TiltColor::Blue => "blue",
            TiltColor::Yellow => "yellow",
            TiltColor::Pink => "pink",
            TiltColor::Simulated => "simulated",
        }
    }
}

impl fmt::Display for TiltColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TiltColor {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_lowercase();
        TiltColor::ALL
            .into_iter()
            .find(|c| c.as_str() == lowered)
            .ok_or_else(|| ContractError::Other(format!("unknown tilt color '{s}'")))
    }
}
