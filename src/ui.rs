//! Terminal UI rendering.
//!
//! All drawing logic lives here, separated from application state ([`App`])
//! and input handling ([`crate::input`]).
//!
//! ## For contributors
//!
//! * The layout is a two-row split: a scrollable listing table on top and a
//!   one-line status bar at the bottom.
//! * Colours and styles are defined inline.
//! * [`ratatui`] is the TUI framework; see its docs for widget details.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::app::App;
use crate::listing::ListingRecord;

/// Draw the complete UI for one frame.
pub fn draw(app: &mut App, frame: &mut Frame) {
    let [main_area, status_area] = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    draw_listings(app, frame, main_area);
    draw_status_bar(app, frame, status_area);
}

/// `$1,234` from cents; `—` when there is no bid.
fn format_cents(cents: Option<i64>) -> String {
    let Some(cents) = cents else {
        return "—".into();
    };
    let digits = (cents.unsigned_abs() / 100).to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if cents < 0 { "-" } else { "" };
    format!("{sign}${grouped}")
}

fn listing_line(item: &ListingRecord) -> Line<'_> {
    let lot = item.lot_label.as_deref().unwrap_or("-");
    Line::from(vec![
        Span::styled(format!("{lot:>5}"), Style::default().fg(Color::DarkGray)),
        Span::raw("  "),
        Span::styled(
            format!("{:<24}", item.artist_name),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw(" "),
        Span::styled(&item.title, Style::default().fg(Color::White)),
        Span::raw("  "),
        Span::styled(
            format!("{} bids", item.bids()),
            Style::default().fg(Color::Magenta),
        ),
        Span::raw("  "),
        Span::styled(
            format_cents(item.current_bid_cents),
            Style::default().fg(Color::Green),
        ),
    ])
}

/// Render the scrollable listing list.
fn draw_listings(app: &mut App, frame: &mut Frame, area: Rect) {
    let list_items: Vec<ListItem> = app
        .items
        .iter()
        .map(|item| ListItem::new(listing_line(item)))
        .collect();

    let list = List::new(list_items)
        .block(
            Block::default()
                .title(format!(" Listings · {} ", app.sort.name()))
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
            format!("{} lots", app.items.len()),
            Style::default().fg(Color::Green),
        ),
        Span::raw("  q: quit  ↑/↓: scroll  s: sort"),
    ]));
    frame.render_widget(status, area);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
