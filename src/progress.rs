//! One-line progress bar for the graph-building exchange.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

/// Default number of cells in the bar.
pub const DEFAULT_BAR_WIDTH: usize = 60;

const LABEL: &str = "Progress: ";
const DONE_GLYPH: char = '█';
const FETCHING_GLYPH: char = ':';
const QUEUED_GLYPH: char = '.';

/// Record fetch counts reported by the service. The total may grow between
/// messages as new records are discovered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressCounts {
    pub queued: u64,
    pub fetching: u64,
    pub done: u64,
}

impl ProgressCounts {
    /// Sum of all three counts, saturating at `u64::MAX`.
    pub fn total(&self) -> u64 {
        self.queued
            .saturating_add(self.fetching)
            .saturating_add(self.done)
    }
}

/// Render `Progress: [███:::...] done/total` with `width` cells between the
/// brackets. A zero total renders an all-empty bar.
pub fn render(counts: &ProgressCounts, width: usize) -> String {
    let total = counts.total();
    let (done_cells, fetching_cells) = if total == 0 {
        (0, 0)
    } else {
        let scale = |n: u64| (width as u128 * n as u128 / total as u128) as usize;
        let done_cells = scale(counts.done).min(width);
        (done_cells, scale(counts.fetching).min(width - done_cells))
    };
    let queued_cells = width.saturating_sub(done_cells + fetching_cells);

    let mut line = String::with_capacity(LABEL.len() + width * 3 + 24);
    line.push_str(LABEL);
    line.push('[');
    line.extend(std::iter::repeat(DONE_GLYPH).take(done_cells));
    line.extend(std::iter::repeat(FETCHING_GLYPH).take(fetching_cells));
    line.extend(std::iter::repeat(QUEUED_GLYPH).take(queued_cells));
    line.push_str("] ");
    line.push_str(&format!("{}/{}", counts.done, total));
    line
}

/// Animates [`render`] output in place on a diagnostic stream.
pub struct ProgressBar<W: Write> {
    out: W,
    width: usize,
    drawn: bool,
}

impl ProgressBar<io::Stderr> {
    pub fn stderr(width: usize) -> Self {
        Self::new(io::stderr(), width)
    }
}

impl<W: Write> ProgressBar<W> {
    pub fn new(out: W, width: usize) -> Self {
        Self {
            out,
            width,
            drawn: false,
        }
    }

    /// Overwrite the current line with the bar for `counts`. No newline is written.
    pub fn report(&mut self, counts: &ProgressCounts) -> io::Result<()> {
        write!(self.out, "{}\r", render(counts, self.width))?;
        self.out.flush()?;
        self.drawn = true;
        Ok(())
    }

    /// Move past the bar so later output starts on a fresh line.
    pub fn finish(&mut self) -> io::Result<()> {
        if self.drawn {
            writeln!(self.out)?;
            self.out.flush()?;
            self.drawn = false;
        }
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
