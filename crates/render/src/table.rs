//! Table layout and trend colouring

use std::fmt::Write;
use std::num::ParseFloatError;
use tracing::debug;

use tickerboard_core::Instrument;
use tickerboard_feed::BoardState;

pub const RESET: &str = "\x1b[0m";

/// Movement of the last price relative to the previous update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Unchanged,
    Up,
    Down,
}

impl Trend {
    pub fn between(previous: Option<f64>, current: f64) -> Self {
        match previous {
            Some(prev) if current > prev => Trend::Up,
            Some(prev) if current < prev => Trend::Down,
            _ => Trend::Unchanged,
        }
    }

    pub fn ansi(&self) -> &'static str {
        match self {
            Trend::Unchanged => RESET,
            Trend::Up => "\x1b[32m",
            Trend::Down => "\x1b[31m",
        }
    }
}

/// Numeric columns of a quote row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuoteFigures {
    pub last: f64,
    pub bid: f64,
    pub ask: f64,
    pub change: f64,
    pub change_percent: f64,
}

/// What one instrument's row shows
#[derive(Debug, Clone, PartialEq)]
pub enum RowView {
    /// No snapshot yet
    Placeholder,
    /// No snapshot and the worker gave up connecting
    Unavailable,
    /// A snapshot exists but a numeric field did not parse
    ConversionError,
    Quote { figures: QuoteFigures, trend: Trend },
}

fn parse_decimal(text: &str) -> Result<f64, ParseFloatError> {
    text.trim().parse()
}

/// Resolve the row for `instrument`, recording its last price as the new
/// previous price whenever that price parses.
pub fn row_view(state: &mut BoardState, instrument: Instrument) -> RowView {
    let Some(snapshot) = state.snapshot(instrument) else {
        return match state.unavailable_reason(instrument) {
            Some(_) => RowView::Unavailable,
            None => RowView::Placeholder,
        };
    };

    let last = parse_decimal(&snapshot.last_price);
    let rest = parse_decimal(&snapshot.bid_price).and_then(|bid| {
        Ok((
            bid,
            parse_decimal(&snapshot.ask_price)?,
            parse_decimal(&snapshot.price_change)?,
            parse_decimal(&snapshot.price_change_percent)?,
        ))
    });

    let trend = match last.as_ref().ok().copied() {
        Some(price) => {
            let previous = state.swap_previous_price(instrument, price);
            Trend::between(previous, price)
        }
        None => Trend::Unchanged,
    };

    match (last, rest) {
        (Ok(last), Ok((bid, ask, change, change_percent))) => RowView::Quote {
            figures: QuoteFigures {
                last,
                bid,
                ask,
                change,
                change_percent,
            },
            trend,
        },
        (Err(e), _) | (_, Err(e)) => {
            debug!(instrument = %instrument, error = %e, "Numeric conversion failed");
            RowView::ConversionError
        }
    }
}

/// Build the full table. The caller holds the board lock throughout.
pub fn render_table(state: &mut BoardState, instruments: &[Instrument]) -> String {
    let mut out = String::new();

    let header = format!(
        "{:<10} | {:<12} | {:<10} | {:<10} | {:<10} | {}",
        "Pair", "Last Price", "Bid", "Ask", "Change", "Change %"
    );
    let separator = "-".repeat(header.len());
    // Writing into a String cannot fail
    let _ = writeln!(out, "{}", header);
    let _ = writeln!(out, "{}", separator);

    for &instrument in instruments {
        let row = row_view(state, instrument);
        write_row(&mut out, instrument, &row);
    }

    out
}

fn write_row(out: &mut String, instrument: Instrument, row: &RowView) {
    let pair = instrument.display_symbol();

    let _ = match row {
        RowView::Placeholder => writeln!(
            out,
            "{:<10} | {:<12} | {:<10} | {:<10} | {:<10} | {}",
            pair, "-", "-", "-", "-", "-"
        ),
        RowView::Unavailable => writeln!(out, "{:<10} | unavailable", pair),
        RowView::ConversionError => writeln!(out, "{:<10} | conversion error", pair),
        RowView::Quote { figures, trend } => writeln!(
            out,
            "{:<10} | {}{:<12.2}{} | {:<10.2} | {:<10.2} | {:<10.2} | {:.2}%",
            pair,
            trend.ansi(),
            figures.last,
            RESET,
            figures.bid,
            figures.ask,
            figures.change,
            figures.change_percent
        ),
    };
}
