use chrono::Local;
use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span, Text},
};

use super::helpers::{format_hours, section_title};
use super::theme::Theme;
use crate::app::App;
use crate::time_utils::format_hms;
use crate::types::WorkTotals;

pub fn build_dashboard_text(app: &App) -> Text<'_> {
    let mut lines = Vec::new();

    let today = app.state.today.unwrap_or_else(|| Local::now().date_naive());
    lines.push(Line::from(Span::styled(
        format!(
            "  {} - week {} of the month",
            today.format("%A, %B %e, %Y"),
            app.state.current_week.max(1)
        ),
        Style::default()
            .fg(Theme::accent())
            .add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(""));

    lines.extend(section_title("Timer"));
    let org_name = app
        .state
        .active_organization()
        .map(|org| org.name.as_str())
        .unwrap_or("none");
    let project_name = app
        .state
        .active_project()
        .map(|project| project.name.as_str())
        .unwrap_or("none");
    lines.push(Line::from(vec![
        Span::styled("  Organization: ", Style::default().fg(Theme::dim())),
        Span::styled(org_name, Style::default().fg(Theme::highlight())),
        Span::raw("  "),
        Span::styled("Project: ", Style::default().fg(Theme::dim())),
        Span::styled(project_name, Style::default().fg(Theme::highlight())),
    ]));
    if app.timer.running {
        lines.push(Line::from(vec![
            Span::styled(
                "  ● ",
                Style::default()
                    .fg(Theme::active())
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format_hms(app.timer.elapsed_time as i64),
                Style::default()
                    .fg(Theme::active())
                    .add_modifier(Modifier::BOLD),
            ),
        ]));
    } else {
        lines.push(Line::from(Span::styled(
            "  ○ 00:00:00  (space to start)",
            Style::default().fg(Theme::dim()),
        )));
    }
    let reminder = match app.state.selection.alert_time {
        0 => "off".to_string(),
        minutes => format!("every {minutes} min"),
    };
    lines.push(Line::from(vec![
        Span::styled("  Still working? reminder: ", Style::default().fg(Theme::dim())),
        Span::styled(reminder, Style::default().fg(Theme::warn())),
    ]));
    lines.push(Line::from(""));

    lines.extend(section_title("Organization"));
    lines.extend(totals_lines(&app.state.org_totals));
    lines.push(Line::from(vec![
        Span::styled("  This year: ", Style::default().fg(Theme::dim())),
        Span::styled(
            format_hours(app.state.org_year_total),
            Style::default()
                .fg(Theme::accent())
                .add_modifier(Modifier::BOLD),
        ),
    ]));
    lines.push(Line::from(""));

    lines.extend(section_title("Project"));
    lines.extend(totals_lines(&app.state.proj_totals));

    Text::from(lines)
}

fn totals_lines(totals: &WorkTotals) -> Vec<Line<'static>> {
    [
        ("  Today: ", totals.day),
        ("  This week: ", totals.week),
        ("  This month: ", totals.month),
    ]
    .into_iter()
    .map(|(label, seconds)| {
        Line::from(vec![
            Span::styled(label, Style::default().fg(Theme::dim())),
            Span::styled(
                format_hours(seconds),
                Style::default()
                    .fg(Theme::accent())
                    .add_modifier(Modifier::BOLD),
            ),
        ])
    })
    .collect()
}
