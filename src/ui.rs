//! Terminal UI rendering for `watch`.
//!
//! All drawing logic lives here, separated from application state ([`App`])
//! and input handling ([`crate::input`]).
//!
//! ## For contributors
//!
//! * The layout is a two-row split: a scrollable entry list on top and a
//!   one-line status bar at the bottom.
//! * Entries are shown in feed order (newest first), never re-sorted: the
//!   list is exactly what the published document contains.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::app::App;
use scrapefeed::engine::DIAGNOSTIC_TITLE;

/// Draw the complete UI for one frame.
pub fn draw(app: &mut App, frame: &mut Frame) {
    let [main_area, status_area] = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    draw_entry_list(app, frame, main_area);
    draw_status_bar(app, frame, status_area);
}

/// Render the scrollable entry list.
fn draw_entry_list(app: &mut App, frame: &mut Frame, area: Rect) {
    let list_items: Vec<ListItem> = app
        .items
        .iter()
        .map(|entry| {
            let date_str = entry
                .published
                .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "no date".into());
            let title = entry.title.as_deref().unwrap_or("(untitled)");
            let title_style = if title == DIAGNOSTIC_TITLE {
                Style::default().fg(Color::Red)
            } else {
                Style::default().fg(Color::White)
            };

            let line = Line::from(vec![
                Span::styled(
                    format!("{:<18}", date_str),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(" "),
                Span::styled(title, title_style),
                Span::raw("  "),
                Span::styled(
                    entry.identifier().unwrap_or_default(),
                    Style::default().fg(Color::Cyan),
                ),
            ]);

            ListItem::new(line)
        })
        .collect();

    let list = List::new(list_items)
        .block(
            Block::default()
                .title(format!(" {} ", app.title))
                .borders(Borders::ALL),
        )
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .bg(Color::DarkGray),
        )
        .highlight_symbol("▸ ");

    frame.render_stateful_widget(list, area, &mut app.list_state);
}

/// Render the bottom status bar.
fn draw_status_bar(app: &App, frame: &mut Frame, area: Rect) {
    let status = Paragraph::new(Line::from(vec![
        Span::styled(" ", Style::default()),
        Span::styled(&app.status, Style::default().fg(Color::Yellow)),
        Span::raw("  "),
        Span::styled(
            format!("{} entries", app.items.len()),
            Style::default().fg(Color::Green),
        ),
        Span::raw("  q: quit  r: refresh  ↑/↓: scroll  Home/End: jump"),
    ]));
    frame.render_widget(status, area);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poll::PollMsg;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use scrapefeed::Entry;

    fn screen_text(app: &mut App) -> String {
        let backend = TestBackend::new(100, 12);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| draw(app, f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol().chars().next().unwrap_or(' '))
            .collect()
    }

    #[test]
    fn draw_does_not_panic_with_no_items() {
        let mut app = App::new("Empty");
        screen_text(&mut app);
    }

    #[test]
    fn draw_shows_titles_and_count() {
        let mut app = App::new("News");
        app.apply(PollMsg::Loaded(vec![
            Entry::with_link("https://example.com/1").title("First story"),
            Entry::with_link("https://example.com/2").title(DIAGNOSTIC_TITLE),
        ]));
        app.select_first();

        let text = screen_text(&mut app);
        assert!(text.contains("First story"));
        assert!(text.contains("News"));
        assert!(text.contains("2 entries"), "status bar should show entry count");
    }
}
