use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Discrete trading decision derived from one statistics snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Buy => "buy",
            Signal::Sell => "sell",
            Signal::Hold => "hold",
        }
    }

    pub fn is_actionable(&self) -> bool {
        !matches!(self, Signal::Hold)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Signal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(Signal::Buy),
            "sell" => Ok(Signal::Sell),
            "hold" => Ok(Signal::Hold),
            other => Err(format!("unknown signal: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_record_format() {
        assert_eq!(Signal::Buy.to_string(), "buy");
        assert_eq!(Signal::Sell.to_string(), "sell");
        assert_eq!(Signal::Hold.to_string(), "hold");
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("BUY".parse::<Signal>(), Ok(Signal::Buy));
        assert_eq!(" Sell ".parse::<Signal>(), Ok(Signal::Sell));
        assert!("short".parse::<Signal>().is_err());
    }

    #[test]
    fn test_actionable() {
        assert!(Signal::Buy.is_actionable());
        assert!(Signal::Sell.is_actionable());
        assert!(!Signal::Hold.is_actionable());
    }
}
