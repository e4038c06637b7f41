use std::path::Path;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use unicode_width::UnicodeWidthStr;

use crate::tui::viewport::{TermSize, list_width};

pub const HELP_TEXT: &str =
    "\u{2195}\u{fe0f} navigate - \u{21b2} open - <b> back - <r> refresh - <l> log - <q> quit";

/// A fixed-size text panel placed relative to the terminal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prompt {
    pub title: Option<String>,
    pub text: String,
    pub area: Rect,
    pub bordered: bool,
}

pub fn help(size: TermSize) -> Prompt {
    let width = u16::try_from(HELP_TEXT.width() + 3).unwrap_or(u16::MAX);
    Prompt {
        title: Some("Help".into()),
        text: HELP_TEXT.into(),
        area: Rect::new(0, size.height.saturating_sub(5), width, 3),
        bordered: true,
    }
}

pub fn message(label: &str, text: &str, size: TermSize) -> Prompt {
    Prompt {
        title: Some(label.into()),
        text: text.into(),
        area: Rect::new(0, 0, list_width(size.width), 3),
        bordered: true,
    }
}

pub fn error(text: &str, size: TermSize) -> Prompt {
    message("Error", text, size)
}

pub fn download_started(dest: &Path, size: TermSize) -> Prompt {
    notice(format!("Downloading to {}", dest.display()), size)
}

pub fn download_finished(dest: &Path, size: TermSize) -> Prompt {
    notice(format!("File Downloaded: {}", dest.display()), size)
}

fn notice(text: String, size: TermSize) -> Prompt {
    Prompt {
        title: None,
        text,
        area: Rect::new(0, size.height.saturating_sub(10), list_width(size.width), 5),
        bordered: false,
    }
}

pub fn render(frame: &mut Frame, prompt: &Prompt) {
    let area = prompt.area.intersection(frame.size());
    if area.width == 0 || area.height == 0 {
        return;
    }
    let mut block = Block::default();
    if prompt.bordered {
        block = block
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
    }
    if let Some(title) = &prompt.title {
        block = block.title(title.as_str());
    }
    let para = Paragraph::new(prompt.text.as_str())
        .style(Style::default().fg(Color::White))
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(Clear, area);
    frame.render_widget(para, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    #[test]
    fn help_sits_above_bottom_edge() {
        let prompt = help(TermSize::new(100, 30));
        assert_eq!(prompt.area.y, 25);
        assert_eq!(prompt.area.height, 3);
        assert_eq!(usize::from(prompt.area.width), HELP_TEXT.width() + 3);
        assert_eq!(prompt.title.as_deref(), Some("Help"));
    }

    #[test]
    fn error_panel_spans_list_width() {
        let prompt = error("boom", TermSize::new(80, 24));
        assert_eq!(prompt.title.as_deref(), Some("Error"));
        assert_eq!(prompt.area, Rect::new(0, 0, 78, 3));
        assert!(prompt.bordered);
    }

    #[test]
    fn download_notices_are_borderless() {
        let size = TermSize::new(80, 24);
        let started = download_started(Path::new("out/a.bin"), size);
        let finished = download_finished(Path::new("out/a.bin"), size);
        assert_eq!(started.text, "Downloading to out/a.bin");
        assert_eq!(finished.text, "File Downloaded: out/a.bin");
        assert!(!started.bordered && !finished.bordered);
        assert_eq!(started.area, Rect::new(0, 14, 78, 5));
    }

    #[test]
    fn render_clips_to_small_terminals() {
        let backend = TestBackend::new(20, 2);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| {
                let size = TermSize::from(frame.size());
                render(frame, &help(size));
                render(frame, &download_started(Path::new("x"), size));
            })
            .unwrap();
    }
}
