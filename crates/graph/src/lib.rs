//! Monthly time-series rendering of metric records.
//!
//! The graphing flow asks for a number of months, pulls the records for
//! each calendar month, and renders one chart per month. Month arithmetic
//! lives here so it can be tested without touching a drawing backend.

mod month;
mod render;

pub use month::{months_back, Month};
pub use render::{daily_averages, Renderer, SvgRenderer};

use std::path::PathBuf;

use thiserror::Error;

/// Rendering failures. These propagate to the top-level handler; a broken
/// chart never aborts the bot.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("cannot prepare output directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("chart rendering failed: {0}")]
    Render(String),
}
