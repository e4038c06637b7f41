use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::models::Entry;

const UNITS: [&str; 7] = ["B", "KB", "MB", "GB", "TB", "PB", "EB"];
const ELLIPSIS: &str = "...";
const SIZE_PRECISION: usize = 1;

/// Scales `bytes` by 1024 until it drops below the next unit.
pub fn format_bytes(bytes: f64, precision: usize) -> String {
    let mut value = bytes.max(0.0);
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.precision$} {}", UNITS[unit])
}

/// Returns the name to show and the number of spaces that push the size
/// column to half the terminal width.
pub fn truncate_filename(name: &str, term_width: u16) -> (String, usize) {
    let limit = usize::from(term_width / 4);
    let truncated = if name.width() >= limit {
        let marker = &ELLIPSIS[..ELLIPSIS.len().min(limit)];
        let mut out = take_width(name, limit - marker.len());
        out.push_str(marker);
        out
    } else {
        name.to_string()
    };
    let space = usize::from(term_width / 2).saturating_sub(truncated.width());
    (truncated, space)
}

fn take_width(s: &str, max: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > max {
            break;
        }
        used += w;
        out.push(ch);
    }
    // wide glyphs can leave a gap
    out.extend(std::iter::repeat_n(' ', max - used));
    out
}

pub fn display_string(entry: Entry<'_>, term_width: u16) -> String {
    match entry {
        Entry::Bucket(bucket) => bucket.display_string.clone(),
        Entry::Plain(text) => text.to_string(),
        Entry::Node(node) if node.is_dir => node.display_string.clone(),
        Entry::Node(node) => {
            let (name, space) = truncate_filename(&node.display_string, term_width);
            let size = format_bytes(node.size.unwrap_or_default() as f64, SIZE_PRECISION);
            format!("{name}{}{size}", " ".repeat(space))
        }
    }
}
