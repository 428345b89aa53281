use chrono::Datelike;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Bar, BarChart, BarGroup},
};

use super::helpers::{clamp_name, format_hours, section_title};
use super::rounded_block;
use super::theme::Theme;
use crate::app::{App, Report};
use crate::time_utils::month_range;
use crate::types::month_name;

/// Rows taken by the daily chart under the report text.
pub const CHART_HEIGHT: u16 = 12;

pub fn build_reports_text(app: &App) -> Text<'_> {
    let mut lines = Vec::new();
    let (year, month) = app.report_month;
    lines.push(Line::from(Span::styled(
        format!("  {} {year}", month_name(month)),
        Style::default()
            .fg(Theme::accent())
            .add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(""));

    let Some(report) = &app.report else {
        lines.push(Line::from("No report loaded. Press 'r' to load it."));
        return Text::from(lines);
    };

    lines.extend(section_title("Days"));
    if report.days.is_empty() {
        lines.push(Line::from(Span::styled(
            "  Nothing logged this month",
            Style::default().fg(Theme::dim()),
        )));
    }
    let mut month_total = 0;
    for (date, projects) in &report.days {
        let day_total: i64 = projects.values().sum();
        month_total += day_total;
        let breakdown = projects
            .iter()
            .map(|(name, seconds)| format!("{name} {}", format_hours(*seconds)))
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(Line::from(vec![
            Span::styled(
                format!("  {:<14}", date.format("%a %Y-%m-%d")),
                Style::default().fg(Theme::text()),
            ),
            Span::styled(
                format!("{:>8}", format_hours(day_total)),
                Style::default()
                    .fg(Theme::accent())
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(breakdown, Style::default().fg(Theme::dim())),
        ]));
    }
    lines.push(Line::from(vec![
        Span::styled("  Month total: ", Style::default().fg(Theme::dim())),
        Span::styled(
            format_hours(month_total),
            Style::default()
                .fg(Theme::success())
                .add_modifier(Modifier::BOLD),
        ),
    ]));
    lines.push(Line::from(""));

    lines.extend(section_title(&format!("{} by project", report.year)));
    if report.year_by_project.is_empty() {
        lines.push(Line::from(Span::styled(
            "  Nothing logged this year",
            Style::default().fg(Theme::dim()),
        )));
    }
    for (name, seconds) in &report.year_by_project {
        lines.push(Line::from(vec![
            Span::styled(
                format!("  {} ", clamp_name(name, 24)),
                Style::default().fg(Theme::text()),
            ),
            Span::styled(
                format!("{:>10}", format_hours(*seconds)),
                Style::default().fg(Theme::accent()),
            ),
        ]));
    }
    lines.push(Line::from(vec![
        Span::styled("  Year total: ", Style::default().fg(Theme::dim())),
        Span::styled(
            format_hours(report.year_by_project.values().sum()),
            Style::default()
                .fg(Theme::success())
                .add_modifier(Modifier::BOLD),
        ),
    ]));

    Text::from(lines)
}

/// Seconds logged on every day of the report's month, empty days included.
pub fn daily_totals(report: &Report) -> Vec<(u32, i64)> {
    let Some((first, last)) = month_range(report.year, report.month) else {
        return Vec::new();
    };
    first
        .iter_days()
        .take_while(|date| *date <= last)
        .map(|date| {
            let seconds = report
                .days
                .get(&date)
                .map(|projects| projects.values().sum())
                .unwrap_or(0);
            (date.day(), seconds)
        })
        .collect()
}

/// One bar per day, in minutes, labelled with whole hours.
pub fn render_daily_chart(frame: &mut Frame, area: Rect, report: &Report) {
    let bars: Vec<Bar> = daily_totals(report)
        .into_iter()
        .map(|(day, seconds)| {
            let hours = if seconds >= 3600 {
                (seconds / 3600).to_string()
            } else {
                String::new()
            };
            Bar::default()
                .value((seconds.max(0) / 60) as u64)
                .text_value(hours)
                .label(Line::from(day.to_string()))
                .style(Style::default().fg(Theme::accent()))
                .value_style(Style::default().fg(Color::Black).bg(Theme::accent()))
        })
        .collect();

    let chart = BarChart::default()
        .block(rounded_block().title(" Daily hours "))
        .data(BarGroup::default().bars(&bars))
        .bar_width(2)
        .bar_gap(1)
        .label_style(Style::default().fg(Theme::dim()));
    frame.render_widget(chart, area);
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn daily_totals_cover_the_whole_month() {
        let mut days = BTreeMap::new();
        days.insert(
            NaiveDate::from_ymd_opt(2024, 2, 3).unwrap(),
            BTreeMap::from([("web".to_string(), 3600), ("api".to_string(), 600)]),
        );
        let report = Report {
            year: 2024,
            month: 2,
            days,
            ..Report::default()
        };

        let totals = daily_totals(&report);
        assert_eq!(totals.len(), 29);
        assert_eq!(totals[0], (1, 0));
        assert_eq!(totals[2], (3, 4200));
        assert_eq!(totals.iter().map(|(_, seconds)| seconds).sum::<i64>(), 4200);
    }
}
