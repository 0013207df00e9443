//! Inbound ticker events and the per-instrument snapshot built from them

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::{FeedError, Instrument};

/// 24h rolling ticker frame as delivered by the upstream stream
///
/// Decimal quantities stay as text so no precision is lost before render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerEvent {
    #[serde(rename = "e")]
    pub event_type: String,
    #[serde(rename = "E")]
    pub event_time: u64,
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "p")]
    pub price_change: String,
    #[serde(rename = "P")]
    pub price_change_percent: String,
    #[serde(rename = "w")]
    pub weighted_avg_price: String,
    #[serde(rename = "x")]
    pub prev_close_price: String,
    #[serde(rename = "c")]
    pub last_price: String,
    #[serde(rename = "Q")]
    pub last_quantity: String,
    #[serde(rename = "b")]
    pub bid_price: String,
    #[serde(rename = "B")]
    pub bid_quantity: String,
    #[serde(rename = "a")]
    pub ask_price: String,
    #[serde(rename = "A")]
    pub ask_quantity: String,
    #[serde(rename = "C")]
    pub last_trade_time: u64,
}

/// Latest known quote state for one instrument
///
/// Replaced as a whole on every update, never patched field by field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerSnapshot {
    pub instrument: Instrument,
    /// Lower-cased symbol as reported upstream
    pub symbol: String,
    pub event_time_ms: u64,
    pub last_price: String,
    pub last_quantity: String,
    pub bid_price: String,
    pub bid_quantity: String,
    pub ask_price: String,
    pub ask_quantity: String,
    pub price_change: String,
    pub price_change_percent: String,
    pub weighted_avg_price: String,
    pub prev_close_price: String,
}

impl TickerSnapshot {
    pub fn event_time(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.event_time_ms)
            .ok()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
    }
}

impl TryFrom<TickerEvent> for TickerSnapshot {
    type Error = FeedError;

    fn try_from(event: TickerEvent) -> Result<Self, Self::Error> {
        let symbol = event.symbol.to_ascii_lowercase();
        let instrument = symbol.parse::<Instrument>()?;

        Ok(Self {
            instrument,
            symbol,
            event_time_ms: event.event_time,
            last_price: event.last_price,
            last_quantity: event.last_quantity,
            bid_price: event.bid_price,
            bid_quantity: event.bid_quantity,
            ask_price: event.ask_price,
            ask_quantity: event.ask_quantity,
            price_change: event.price_change,
            price_change_percent: event.price_change_percent,
            weighted_avg_price: event.weighted_avg_price,
            prev_close_price: event.prev_close_price,
        })
    }
}
