use ratatui::layout::Rect;
use tracing::warn;

/// Rows kept free below the list for the help bar and prompts.
pub const LOWER_BUFFER: u16 = 6;
pub const RIGHT_BUFFER: u16 = 2;
/// Top and bottom border of the list box.
pub const LIST_CHROME: u16 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TermSize {
    pub width: u16,
    pub height: u16,
}

impl TermSize {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

impl From<Rect> for TermSize {
    fn from(area: Rect) -> Self {
        Self::new(area.width, area.height)
    }
}

pub fn available_height(entry_count: usize, term_height: u16) -> u16 {
    let wanted = u16::try_from(entry_count)
        .unwrap_or(u16::MAX)
        .saturating_add(LIST_CHROME);
    wanted.min(term_height.saturating_sub(LOWER_BUFFER))
}

pub fn has_space(height: u16) -> bool {
    if height < 2 {
        warn!(height, "terminal height is too small");
        return false;
    }
    true
}

/// Number of entries a box of `height` can actually show.
pub fn visible_rows(height: u16) -> usize {
    usize::from(height.saturating_sub(LIST_CHROME).max(1))
}

pub fn list_width(term_width: u16) -> u16 {
    term_width.saturating_sub(RIGHT_BUFFER)
}
