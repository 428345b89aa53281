use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span, Text},
};

use super::helpers::{format_hours, selection_styles};
use super::theme::Theme;
use crate::app::App;
use crate::time_utils::format_hms;

pub fn build_sessions_text(app: &App) -> Text<'_> {
    let mut lines = Vec::new();
    let Some(project) = app.state.active_project() else {
        lines.push(Line::from("Select a project first ('p')."));
        return Text::from(lines);
    };
    lines.push(Line::from(vec![
        Span::styled("  Project: ", Style::default().fg(Theme::dim())),
        Span::styled(project.name.as_str(), Style::default().fg(Theme::highlight())),
        Span::raw("  "),
        Span::styled("Logged: ", Style::default().fg(Theme::dim())),
        Span::styled(
            format_hours(app.sessions.iter().map(|session| session.seconds).sum()),
            Style::default()
                .fg(Theme::accent())
                .add_modifier(Modifier::BOLD),
        ),
    ]));
    lines.push(Line::from(""));

    if app.sessions.is_empty() {
        lines.push(Line::from(
            "No sessions recorded. Stopped timers show up here. Press 'r' to reload.",
        ));
        return Text::from(lines);
    }

    lines.push(Line::from(Span::styled(
        format!("  {:<12} {:>10} {:>18}", "Date", "Duration", "Recorded"),
        Style::default()
            .fg(Theme::secondary())
            .add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(Span::styled(
        format!(
            "  {:<12} {:>10} {:>18}",
            "------------", "----------", "------------------"
        ),
        Style::default().fg(Theme::dim()),
    )));
    lines.extend(app.sessions.iter().enumerate().map(|(index, session)| {
        let (marker, date_style) = selection_styles(index == app.selected_session_index);
        Line::from(vec![
            marker,
            Span::styled(format!("{:<12}", session.date.format("%Y-%m-%d")), date_style),
            Span::raw(" "),
            Span::styled(
                format!("{:>10}", format_hms(session.seconds)),
                Style::default().fg(Theme::accent()),
            ),
            Span::raw(" "),
            Span::styled(
                format!("{:>18}", session.created_at.format("%Y-%m-%d %H:%M")),
                Style::default().fg(Theme::dim()),
            ),
        ])
    }));
    Text::from(lines)
}
