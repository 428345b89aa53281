use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span, Text},
};

use super::theme::Theme;
use crate::app::App;

pub fn build_help_text(_app: &App) -> Text<'_> {
    let mut lines = Vec::new();

    lines.push(Line::from(Span::styled(
        "Key bindings",
        Style::default()
            .fg(Theme::accent())
            .add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(""));

    lines.push(section_title("Global"));
    lines.extend(section_lines(&[
        "q: Quit (a running timer is stopped and saved)",
        "?: Toggle help",
        "Tab: Toggle focus (tab bar / content)",
        "Left/Right: Navigate tabs (tab bar focus)",
        "Enter: Activate tab (tab bar focus)",
        "h/o/p/w/t: Home, organizations, projects, sessions, reports",
        "r: Refresh current view",
        "esc: Back",
    ]));

    lines.push(Line::from(""));
    lines.push(section_title("Timer"));
    lines.extend(section_lines(&[
        "space: Start/Stop on the active project",
        "s: Stop",
        "a: Still working? reminder interval",
        "m: Toggle mini timer",
        "y/Enter on the reminder: keep going, n: stop",
    ]));

    lines.push(Line::from(""));
    lines.push(section_title("Organizations/Projects"));
    lines.extend(section_lines(&[
        "Up/Down: Move selection",
        "Enter: Make active (stops a running timer)",
        "n: New (an organization needs its first project)",
        "e: Rename",
        "f: Toggle favorite",
        "d: Delete (the last one is kept)",
    ]));

    lines.push(Line::from(""));
    lines.push(section_title("Sessions"));
    lines.extend(section_lines(&["x: Move to another project", "d: Delete"]));

    lines.push(Line::from(""));
    lines.push(section_title("Reports"));
    lines.extend(section_lines(&[
        "[/]: Previous/next month",
        "e: Export month as CSV",
        "E: Export year as CSV",
    ]));

    Text::from(lines)
}

fn section_title(title: &str) -> Line<'static> {
    Line::from(Span::styled(
        format!("  {title}"),
        Style::default()
            .fg(Theme::secondary())
            .add_modifier(Modifier::BOLD),
    ))
}

fn section_lines(items: &[&str]) -> Vec<Line<'static>> {
    items
        .iter()
        .map(|item| {
            Line::from(Span::styled(
                format!("  - {item}"),
                Style::default().fg(Theme::text()),
            ))
        })
        .collect()
}
