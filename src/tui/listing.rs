use tracing::warn;

use crate::error::BrowserError;
use crate::models::{BucketInfo, Entry, Node};
use crate::tui::format::display_string;
use crate::tui::viewport::{TermSize, available_height, has_space, list_width, visible_rows};

pub const BUCKETS_TITLE: &str = "S3 Buckets";

/// One rendered row of a list, tagged with its position in the full collection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListLine {
    pub index: usize,
    pub text: String,
    pub selected: bool,
}

impl ListLine {
    pub fn label(&self) -> String {
        format!("[{}] {}", self.index, self.text)
    }
}

/// Highlights `selection` and cuts the rows down to a window that keeps it
/// visible. Fails when the terminal cannot fit even an empty box.
pub fn directory_display_listing(
    objects: &[String],
    selection: usize,
    term_height: u16,
) -> Result<Vec<ListLine>, BrowserError> {
    let max_height = available_height(objects.len(), term_height);
    if !has_space(max_height) {
        let err = BrowserError::TerminalTooSmall;
        warn!(term_height, "{err}");
        return Err(err);
    }
    if objects.is_empty() {
        return Ok(Vec::new());
    }

    let selection = selection.min(objects.len() - 1);
    let mut listing: Vec<ListLine> = objects
        .iter()
        .enumerate()
        .map(|(index, text)| ListLine {
            index,
            text: text.clone(),
            selected: index == selection,
        })
        .collect();

    let rows = visible_rows(max_height);
    let mut start = 0;
    if usize::from(max_height) <= selection + 2 {
        start = selection.saturating_sub(2);
    }
    // the selection must land inside the rows the box can show
    start = start.max((selection + 1).saturating_sub(rows));
    listing.drain(..start);
    listing.truncate(rows);
    Ok(listing)
}

/// Everything needed to draw one list box.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListPanel {
    pub title: String,
    pub lines: Vec<ListLine>,
    pub height: u16,
    pub width: u16,
    pub error: Option<BrowserError>,
}

fn assemble<'a>(
    title: &str,
    entries: impl ExactSizeIterator<Item = Entry<'a>>,
    selection: usize,
    size: TermSize,
) -> ListPanel {
    let count = entries.len();
    let display: Vec<String> = entries.map(|e| display_string(e, size.width)).collect();
    let (lines, error) = match directory_display_listing(&display, selection, size.height) {
        Ok(lines) => (lines, None),
        Err(err) => (Vec::new(), Some(err)),
    };
    ListPanel {
        title: title.to_string(),
        lines,
        height: available_height(count, size.height),
        width: list_width(size.width),
        error,
    }
}

pub fn bucket_list(buckets: &[BucketInfo], selection: usize, size: TermSize) -> ListPanel {
    assemble(
        BUCKETS_TITLE,
        buckets.iter().map(Entry::Bucket),
        selection,
        size,
    )
}

pub fn directory_list(title: &str, nodes: &[Node], selection: usize, size: TermSize) -> ListPanel {
    assemble(title, nodes.iter().map(Entry::Node), selection, size)
}

pub fn string_list(title: &str, items: &[String], selection: usize, size: TermSize) -> ListPanel {
    assemble(
        title,
        items.iter().map(|s| Entry::Plain(s.as_str())),
        selection,
        size,
    )
}
