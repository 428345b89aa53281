use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};

use super::theme::Theme;

/// "7h 05m" for totals, where seconds would only be noise.
pub fn format_hours(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{}h {:02}m", seconds / 3600, (seconds % 3600) / 60)
}

pub fn clamp_name(value: &str, width: usize) -> String {
    let value_len = value.chars().count();
    if value_len <= width {
        return format!("{value:<width$}", width = width);
    }
    let trimmed = value
        .chars()
        .take(width.saturating_sub(2))
        .collect::<String>();
    format!("{trimmed}..")
}

/// Marker span and name style for a row of a selectable list.
pub fn selection_styles(selected: bool) -> (Span<'static>, Style) {
    if selected {
        (
            Span::styled("> ", Style::default().fg(Theme::selection_marker())),
            Style::default()
                .fg(Theme::highlight())
                .add_modifier(Modifier::BOLD),
        )
    } else {
        (
            Span::styled("  ", Style::default().fg(Theme::dim())),
            Style::default().fg(Theme::text()),
        )
    }
}

pub fn section_title(title: &str) -> Vec<Line<'static>> {
    vec![
        Line::from(Span::styled(
            format!("  {title}"),
            Style::default()
                .fg(Theme::secondary())
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!("  {}", "─".repeat(title.chars().count() + 1)),
            Style::default().fg(Theme::dim()),
        )),
    ]
}
