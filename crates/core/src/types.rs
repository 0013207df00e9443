//! Core type definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::FeedError;

/// Tracked trading pairs
///
/// The set is fixed at compile time. `Instrument::ALL` is the declaration
/// order and is the order rows are rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Instrument {
    BtcUsdt,
    EthUsdt,
    BnbUsdt,
    XrpUsdt,
    SolUsdt,
    AdaUsdt,
}

impl Instrument {
    pub const ALL: [Instrument; 6] = [
        Instrument::BtcUsdt,
        Instrument::EthUsdt,
        Instrument::BnbUsdt,
        Instrument::XrpUsdt,
        Instrument::SolUsdt,
        Instrument::AdaUsdt,
    ];

    /// Normalized (lower-case) identifier, as used in stream URLs
    pub fn symbol(&self) -> &'static str {
        match self {
            Instrument::BtcUsdt => "btcusdt",
            Instrument::EthUsdt => "ethusdt",
            Instrument::BnbUsdt => "bnbusdt",
            Instrument::XrpUsdt => "xrpusdt",
            Instrument::SolUsdt => "solusdt",
            Instrument::AdaUsdt => "adausdt",
        }
    }

    /// Upper-case form shown in the `Pair` column
    pub fn display_symbol(&self) -> String {
        self.symbol().to_ascii_uppercase()
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for Instrument {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Instrument::ALL
            .iter()
            .copied()
            .find(|i| i.symbol() == normalized)
            .ok_or_else(|| FeedError::UnknownSymbol(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("BTCUSDT".parse::<Instrument>().unwrap(), Instrument::BtcUsdt);
        assert_eq!("adaUSDT".parse::<Instrument>().unwrap(), Instrument::AdaUsdt);
        assert_eq!("solusdt".parse::<Instrument>().unwrap(), Instrument::SolUsdt);
    }

    #[test]
    fn test_unknown_symbol_rejected() {
        let err = "dogeusdt".parse::<Instrument>().unwrap_err();
        assert!(matches!(err, FeedError::UnknownSymbol(s) if s == "dogeusdt"));
    }

    #[test]
    fn test_declaration_order() {
        let symbols: Vec<_> = Instrument::ALL.iter().map(|i| i.symbol()).collect();
        assert_eq!(
            symbols,
            ["btcusdt", "ethusdt", "bnbusdt", "xrpusdt", "solusdt", "adausdt"]
        );
        assert_eq!(Instrument::XrpUsdt.display_symbol(), "XRPUSDT");
    }
}
