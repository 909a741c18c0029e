use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// What happened to the creature met at a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureStatus {
    Captured,
    Received,
    Traded,
    Missed,
    Stored,
    Deceased,
}

impl CaptureStatus {
    pub const ALL: [CaptureStatus; 6] = [
        CaptureStatus::Captured,
        CaptureStatus::Received,
        CaptureStatus::Traded,
        CaptureStatus::Missed,
        CaptureStatus::Stored,
        CaptureStatus::Deceased,
    ];

    /// Whether the creature is still usable in the run.
    pub fn is_alive(&self) -> bool {
        matches!(
            self,
            Self::Captured | Self::Received | Self::Traded | Self::Stored
        )
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Captured => "Captured",
            Self::Received => "Received",
            Self::Traded => "Traded",
            Self::Missed => "Missed",
            Self::Stored => "Stored",
            Self::Deceased => "Deceased",
        }
    }
}

impl fmt::Display for CaptureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Captured => write!(f, "captured"),
            Self::Received => write!(f, "received"),
            Self::Traded => write!(f, "traded"),
            Self::Missed => write!(f, "missed"),
            Self::Stored => write!(f, "stored"),
            Self::Deceased => write!(f, "deceased"),
        }
    }
}

impl FromStr for CaptureStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "captured" | "caught" => Ok(Self::Captured),
            "received" | "gift" => Ok(Self::Received),
            "traded" => Ok(Self::Traded),
            "missed" | "failed" => Ok(Self::Missed),
            "stored" | "boxed" => Ok(Self::Stored),
            "deceased" | "dead" | "fainted" => Ok(Self::Deceased),
            other => Err(DomainError::parse(format!("Unknown capture status: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_parse_agree() {
        for status in CaptureStatus::ALL {
            assert_eq!(status.to_string().parse::<CaptureStatus>().unwrap(), status);
        }
    }

    #[test]
    fn parse_accepts_aliases() {
        assert_eq!("Dead".parse::<CaptureStatus>().unwrap(), CaptureStatus::Deceased);
        assert_eq!("boxed".parse::<CaptureStatus>().unwrap(), CaptureStatus::Stored);
        assert!("sleeping".parse::<CaptureStatus>().is_err());
    }

    #[test]
    fn only_living_statuses_are_alive() {
        assert!(CaptureStatus::Captured.is_alive());
        assert!(!CaptureStatus::Missed.is_alive());
        assert!(!CaptureStatus::Deceased.is_alive());
    }
}
