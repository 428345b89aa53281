use chrono::{DateTime, Local};
use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span, Text},
};

use super::helpers::{clamp_name, selection_styles};
use super::theme::Theme;
use crate::app::App;

pub fn build_organizations_text(app: &App) -> Text<'_> {
    let mut lines = Vec::new();
    if app.state.organizations.is_empty() {
        lines.push(Line::from(
            "No organizations yet. Press 'n' to create one with its first project.",
        ));
        return Text::from(lines);
    }

    lines.extend(header_lines("Organization"));
    let active = app.state.selection.active_org;
    lines.extend(app.state.organizations.iter().enumerate().map(|(index, org)| {
        list_row(
            &org.name,
            org.favorite,
            active == Some(org.id),
            org.created_at,
            index == app.selected_org_index,
        )
    }));
    Text::from(lines)
}

pub fn build_projects_text(app: &App) -> Text<'_> {
    let mut lines = Vec::new();
    let Some(org) = app.state.active_organization() else {
        lines.push(Line::from("Select an organization first ('o')."));
        return Text::from(lines);
    };
    lines.push(Line::from(vec![
        Span::styled("  Organization: ", Style::default().fg(Theme::dim())),
        Span::styled(org.name.as_str(), Style::default().fg(Theme::highlight())),
    ]));
    lines.push(Line::from(""));

    if app.state.projects.is_empty() {
        lines.push(Line::from("No projects found. Press 'n' to create one."));
        return Text::from(lines);
    }

    lines.extend(header_lines("Project"));
    let active = app.state.selection.active_proj;
    lines.extend(app.state.projects.iter().enumerate().map(|(index, project)| {
        list_row(
            &project.name,
            project.favorite,
            active == Some(project.id),
            project.created_at,
            index == app.selected_project_index,
        )
    }));
    Text::from(lines)
}

fn header_lines(title: &str) -> Vec<Line<'static>> {
    vec![
        Line::from(Span::styled(
            format!("  {:<28} {:>3} {:>6} {:>10}", title, "Fav", "Active", "Created"),
            Style::default()
                .fg(Theme::secondary())
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!(
                "  {:<28} {:>3} {:>6} {:>10}",
                "----------------------------", "---", "------", "----------"
            ),
            Style::default().fg(Theme::dim()),
        )),
    ]
}

fn list_row(
    name: &str,
    favorite: bool,
    active: bool,
    created_at: DateTime<Local>,
    selected: bool,
) -> Line<'static> {
    let (marker, name_style) = selection_styles(selected);
    let star = if favorite { "★" } else { "·" };
    let star_style = if favorite {
        Style::default().fg(Theme::favorite())
    } else {
        Style::default().fg(Theme::dim())
    };
    let active_span = if active {
        Span::styled(
            format!("{:>6}", "●"),
            Style::default()
                .fg(Theme::active())
                .add_modifier(Modifier::BOLD),
        )
    } else {
        Span::raw(format!("{:>6}", ""))
    };
    Line::from(vec![
        marker,
        Span::styled(clamp_name(name, 28), name_style),
        Span::raw(" "),
        Span::styled(format!("{star:>3}"), star_style),
        Span::raw(" "),
        active_span,
        Span::raw(" "),
        Span::styled(
            created_at.format("%Y-%m-%d").to_string(),
            Style::default().fg(Theme::dim()),
        ),
    ])
}
