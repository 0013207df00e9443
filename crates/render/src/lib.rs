//! Console rendering for the ticker board
//!
//! - Fixed-order table, one row per tracked instrument
//! - Last price coloured by movement since the previous update
//! - Full-screen redraw on any `std::io::Write`

pub mod console;
pub mod table;

pub use console::ConsoleRenderer;
pub use table::{render_table, row_view, RowView, Trend};
