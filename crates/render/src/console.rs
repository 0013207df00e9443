//! Full-screen console redraw

use std::io::{self, Write};

use tickerboard_core::{Instrument, RenderConfig};
use tickerboard_feed::{RenderSink, SharedState};

use crate::table::render_table;

/// Clear screen and move the cursor home
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Redraws the board on every call
pub struct ConsoleRenderer<W> {
    out: W,
    instruments: Vec<Instrument>,
    clear_screen: bool,
}

impl ConsoleRenderer<io::Stdout> {
    pub fn stdout(config: &RenderConfig) -> Self {
        Self::new(io::stdout(), config)
    }
}

impl<W: Write> ConsoleRenderer<W> {
    pub fn new(out: W, config: &RenderConfig) -> Self {
        Self {
            out,
            instruments: Instrument::ALL.to_vec(),
            clear_screen: config.clear_screen,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> RenderSink for ConsoleRenderer<W> {
    fn render(&mut self, state: &SharedState) -> io::Result<()> {
        let table = {
            let mut guard = state.lock();
            render_table(&mut guard, &self.instruments)
        };

        if self.clear_screen {
            self.out.write_all(CLEAR_SCREEN.as_bytes())?;
        }
        self.out.write_all(table.as_bytes())?;
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_render_clears_and_redraws() {
        let state = SharedState::new();
        let mut renderer = ConsoleRenderer::new(Vec::new(), &RenderConfig::default());

        renderer.render(&state).unwrap();
        renderer.render(&state).unwrap();

        let output = String::from_utf8(renderer.into_inner()).unwrap();
        assert_eq!(output.matches(CLEAR_SCREEN).count(), 2);
        assert_eq!(output.matches("Pair").count(), 2);
        assert_eq!(output.matches("BTCUSDT").count(), 2);
    }

    #[test]
    fn test_clear_screen_can_be_disabled() {
        let state = SharedState::new();
        let config = RenderConfig { clear_screen: false };
        let mut renderer = ConsoleRenderer::new(Vec::new(), &config);

        renderer.render(&state).unwrap();

        let output = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(!output.contains('\x1b'));
        assert!(output.starts_with("Pair"));
    }
}
