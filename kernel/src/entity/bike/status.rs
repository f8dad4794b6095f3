use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Availability flag stored as lowercase text in the bikes table.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BikeStatus {
    Available,
    Rented,
}

impl BikeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BikeStatus::Available => "available",
            BikeStatus::Rented => "rented",
        }
    }
}

impl Display for BikeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BikeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(BikeStatus::Available),
            "rented" => Ok(BikeStatus::Rented),
            other => Err(format!("unknown bike status: {other}")),
        }
    }
}
