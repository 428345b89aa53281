mod dashboard;
mod help;
mod helpers;
mod projects;
mod reports;
mod sessions;
mod theme;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    prelude::Alignment,
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};

use crate::app::{App, AppView, FocusMode, OrganizationField, Popup, RenameTarget, TABS};
use crate::config::ALERT_OPTIONS;
use crate::time_utils::format_hms;
use theme::Theme;

/// Renders the entire UI for a single frame.
pub fn draw(frame: &mut Frame, app: &App) {
    if app.state.mini_timer {
        draw_mini_timer(frame, app);
    } else {
        draw_full(frame, app);
    }

    if let Some(popup) = &app.popup {
        render_popup(frame, app, popup);
    }
    if app.timer.open_confirm {
        render_still_working(frame, app);
    }
}

fn draw_full(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let (title, body_text) = match app.view {
        AppView::Dashboard => (" Dashboard ", dashboard::build_dashboard_text(app)),
        AppView::Organizations => (" Organizations ", projects::build_organizations_text(app)),
        AppView::Projects => (" Projects ", projects::build_projects_text(app)),
        AppView::Sessions => (" Sessions ", sessions::build_sessions_text(app)),
        AppView::Reports => (" Reports ", reports::build_reports_text(app)),
        AppView::Help => (" Help ", help::build_help_text(app)),
    };

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(3),
        ])
        .split(area);

    let header_lines = vec![Line::from(vec![
        Span::styled(
            "  worktracker  ",
            Style::default().fg(Color::Black).bg(Theme::primary()),
        ),
        Span::raw(" "),
        Span::styled(
            "hours per organization",
            Style::default()
                .fg(Theme::secondary())
                .add_modifier(Modifier::BOLD),
        ),
    ])];
    let header = Paragraph::new(Text::from(header_lines))
        .alignment(Alignment::Left)
        .block(rounded_block());
    frame.render_widget(header, layout[0]);

    let mut body_lines = vec![
        tabs_line(app),
        Line::from(""),
        Line::from(Span::styled(
            format!("  {title}"),
            Style::default()
                .fg(Theme::accent())
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    body_lines.extend(body_text.lines);
    body_lines.push(Line::from(""));
    body_lines.push(Line::from(Span::styled(
        "----------------------------------------",
        Style::default().fg(Theme::dim()),
    )));
    body_lines.extend(keybinds_lines(app));
    let body = Paragraph::new(Text::from(body_lines))
        .style(Style::default().fg(Theme::text()))
        .alignment(Alignment::Left)
        .block(rounded_block());

    match app.report.as_ref().filter(|_| app.view == AppView::Reports) {
        Some(report) if !report.days.is_empty() => {
            let parts = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Min(5),
                    Constraint::Length(reports::CHART_HEIGHT),
                ])
                .split(layout[1]);
            frame.render_widget(body, parts[0]);
            reports::render_daily_chart(frame, parts[1], report);
        }
        _ => frame.render_widget(body, layout[1]),
    }

    let footer = Paragraph::new(Text::from(footer_line(app)))
        .alignment(Alignment::Left)
        .block(rounded_block());
    frame.render_widget(footer, layout[2]);
}

/// Compact rendering: the running time and the project, nothing else.
fn draw_mini_timer(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let height = area.height.min(5);
    let area = Rect { height, ..area };

    let project = app
        .state
        .active_project()
        .map(|project| project.name.as_str())
        .unwrap_or("No project");
    let time_style = if app.timer.running {
        Style::default()
            .fg(Theme::active())
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Theme::dim())
    };
    let lines = vec![
        Line::from(vec![
            Span::styled(format_hms(app.timer.elapsed_time as i64), time_style),
            Span::raw("  "),
            Span::styled(project.to_string(), Style::default().fg(Theme::text())),
        ]),
        Line::from(Span::styled(
            "space: Start/Stop  m: Full view  q: Quit",
            Style::default().fg(Theme::dim()),
        )),
    ];
    let widget = Paragraph::new(Text::from(lines))
        .alignment(Alignment::Center)
        .block(rounded_block());
    frame.render_widget(widget, area);
}

fn rounded_block() -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .style(Style::default().fg(Theme::secondary()))
}

fn render_popup(frame: &mut Frame, app: &App, popup: &Popup) {
    match popup {
        Popup::Settings { index } => render_settings_popup(frame, app, *index),
        Popup::NewOrganization {
            name,
            first_project,
            field,
        } => render_new_organization_popup(frame, name, first_project, *field),
        Popup::NewProject { name } => {
            render_text_popup(frame, " New Project ", "New project", "Name: ", name)
        }
        Popup::Rename { target, name } => {
            let heading = match target {
                RenameTarget::Organization(_) => "Rename organization",
                RenameTarget::Project(_) => "Rename project",
            };
            render_text_popup(frame, " Rename ", heading, "Name: ", name)
        }
        Popup::Transfer { index, .. } => render_transfer_popup(frame, app, *index),
        Popup::Confirm { message, .. } => render_confirm_popup(frame, message),
    }
}

fn render_settings_popup(frame: &mut Frame, app: &App, index: usize) {
    let area = centered_rect(50, 55, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(Span::styled(
            "Still working? reminder",
            Style::default()
                .fg(Theme::accent())
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    for (position, minutes) in ALERT_OPTIONS.iter().enumerate() {
        let (marker, style) = helpers::selection_styles(position == index);
        let label = match minutes {
            0 => "Off".to_string(),
            1 => "Every minute".to_string(),
            n => format!("Every {n} minutes"),
        };
        let current = if *minutes == app.state.selection.alert_time {
            Span::styled("  (current)", Style::default().fg(Theme::dim()))
        } else {
            Span::raw("")
        };
        lines.push(Line::from(vec![marker, Span::styled(label, style), current]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Up/Down: select. Enter: save. Esc: cancel.",
        Style::default().fg(Theme::dim()),
    )));

    let widget = Paragraph::new(Text::from(lines))
        .alignment(Alignment::Left)
        .block(rounded_block().title(" Settings "));
    frame.render_widget(widget, area);
}

fn render_new_organization_popup(
    frame: &mut Frame,
    name: &str,
    first_project: &str,
    field: OrganizationField,
) {
    let area = centered_rect(60, 40, frame.area());
    frame.render_widget(Clear, area);

    let field_style = |active: bool| {
        if active {
            Style::default()
                .fg(Theme::highlight())
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Theme::text())
        }
    };
    let arrow_style = Style::default()
        .fg(Theme::selection_marker())
        .add_modifier(Modifier::BOLD);
    let name_active = field == OrganizationField::Name;

    let lines = vec![
        Line::from(Span::styled(
            "New organization",
            Style::default()
                .fg(Theme::accent())
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled(if name_active { "> " } else { "  " }, arrow_style),
            Span::styled("Name: ", Style::default().fg(Theme::dim())),
            Span::styled(name.to_string(), field_style(name_active)),
        ]),
        Line::from(vec![
            Span::styled(if name_active { "  " } else { "> " }, arrow_style),
            Span::styled("First project: ", Style::default().fg(Theme::dim())),
            Span::styled(first_project.to_string(), field_style(!name_active)),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Type to edit. Tab: switch field. Enter: save. Esc: cancel.",
            Style::default().fg(Theme::dim()),
        )),
    ];

    let widget = Paragraph::new(Text::from(lines))
        .alignment(Alignment::Left)
        .block(rounded_block().title(" New Organization "));
    frame.render_widget(widget, area);
}

fn render_text_popup(frame: &mut Frame, title: &str, heading: &str, label: &str, value: &str) {
    let area = centered_rect(60, 30, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(Span::styled(
            heading.to_string(),
            Style::default()
                .fg(Theme::accent())
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled(label.to_string(), Style::default().fg(Theme::dim())),
            Span::styled(
                value.to_string(),
                Style::default()
                    .fg(Theme::text())
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Type to edit. Enter: save. Esc: cancel.",
            Style::default().fg(Theme::dim()),
        )),
    ];

    let widget = Paragraph::new(Text::from(lines))
        .alignment(Alignment::Left)
        .block(rounded_block().title(title.to_string()));
    frame.render_widget(widget, area);
}

fn render_transfer_popup(frame: &mut Frame, app: &App, index: usize) {
    let area = centered_rect(60, 60, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(Span::styled(
            "Move session to",
            Style::default()
                .fg(Theme::accent())
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    for (position, project) in app.state.projects.iter().enumerate() {
        let (marker, style) = helpers::selection_styles(position == index);
        lines.push(Line::from(vec![
            marker,
            Span::styled(project.name.clone(), style),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Up/Down: select. Enter: move. Esc: cancel.",
        Style::default().fg(Theme::dim()),
    )));

    let widget = Paragraph::new(Text::from(lines))
        .alignment(Alignment::Left)
        .block(rounded_block().title(" Move Session "));
    frame.render_widget(widget, area);
}

fn render_confirm_popup(frame: &mut Frame, message: &str) {
    let area = centered_rect(50, 25, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(Span::styled(
            message.to_string(),
            Style::default()
                .fg(Theme::danger())
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "y: confirm  n/Esc: cancel",
            Style::default().fg(Theme::dim()),
        )),
    ];

    let widget = Paragraph::new(Text::from(lines))
        .alignment(Alignment::Center)
        .block(rounded_block().title(" Confirm "));
    frame.render_widget(widget, area);
}

fn render_still_working(frame: &mut Frame, app: &App) {
    let area = centered_rect(50, 30, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(Span::styled(
            "Still working?",
            Style::default()
                .fg(Theme::warn())
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("Running for ", Style::default().fg(Theme::dim())),
            Span::styled(
                format_hms(app.timer.elapsed_time as i64),
                Style::default()
                    .fg(Theme::active())
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "y/Enter: keep going  n: stop the timer",
            Style::default().fg(Theme::dim()),
        )),
    ];

    let widget = Paragraph::new(Text::from(lines))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .style(Style::default().fg(Theme::warn())),
        );
    frame.render_widget(widget, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn tabs_line(app: &App) -> Line<'_> {
    let mut spans = Vec::new();
    for (index, view) in TABS.iter().enumerate() {
        if index > 0 {
            spans.push(Span::raw("  "));
        }
        let name = match view {
            AppView::Dashboard => "Home",
            AppView::Organizations => "Orgs",
            AppView::Projects => "Projects",
            AppView::Sessions => "Sessions",
            AppView::Reports => "Reports",
            AppView::Help => "Help",
        };
        let active = *view == app.view;
        let focused = app.focus_mode == FocusMode::TabBar && app.selected_tab_index == index;
        let style = if active {
            Style::default()
                .fg(Color::Black)
                .bg(Theme::highlight())
                .add_modifier(Modifier::BOLD)
        } else if focused {
            Style::default()
                .fg(Theme::highlight())
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Theme::dim())
        };
        spans.push(Span::styled(format!(" {name} "), style));
    }

    Line::from(spans)
}

fn footer_line(app: &App) -> Line<'_> {
    if let Some(status) = &app.status {
        return Line::from(Span::styled(
            status.as_str(),
            Style::default().fg(Theme::warn()),
        ));
    }

    let org = app
        .state
        .active_organization()
        .map(|org| org.name.as_str())
        .unwrap_or("No organization");
    let project = app
        .state
        .active_project()
        .map(|project| project.name.as_str())
        .unwrap_or("No project");

    if app.timer.running {
        let animation_chars = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
        let indicator = animation_chars[(app.timer.elapsed_time % animation_chars.len() as u64) as usize];
        Line::from(vec![
            Span::styled(
                format!("{indicator} "),
                Style::default()
                    .fg(Theme::active())
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("{org} > {project} > "),
                Style::default()
                    .fg(Theme::text())
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("Running {}", format_hms(app.timer.elapsed_time as i64)),
                Style::default()
                    .fg(Theme::active())
                    .add_modifier(Modifier::BOLD),
            ),
        ])
    } else {
        Line::from(Span::styled(
            format!("● Timer stopped  ({org} > {project})"),
            Style::default().fg(Theme::dim()),
        ))
    }
}

fn keybinds_lines(app: &App) -> Vec<Line<'static>> {
    let focus_hint = if app.focus_mode == FocusMode::TabBar {
        "Tab: Switch to content  ←/→: Navigate tabs  Enter: Select"
    } else {
        "Tab: Switch to tab bar  h/o/p/w/t: Quick nav"
    };

    let (primary, secondary) = match app.view {
        AppView::Dashboard => (
            "space: Start/Stop  s: Stop  a: Reminder  m: Mini timer",
            "r: Refresh  ?: Help  q: Quit",
        ),
        AppView::Organizations => (
            "Up/Down: Select  Enter: Activate  n: New  e: Rename  f: Favorite  d: Delete",
            "space: Start/Stop  r: Refresh  ?: Help  q: Quit",
        ),
        AppView::Projects => (
            "Up/Down: Select  Enter: Activate  n: New  e: Rename  f: Favorite  d: Delete",
            "space: Start/Stop  r: Refresh  ?: Help  q: Quit",
        ),
        AppView::Sessions => (
            "Up/Down: Select  x: Move to project  d: Delete",
            "esc: Back  r: Reload  ?: Help  q: Quit",
        ),
        AppView::Reports => (
            "[/]: Previous/next month  e: Export month  E: Export year",
            "esc: Back  r: Reload  ?: Help  q: Quit",
        ),
        AppView::Help => ("Press ? or ESC to close this help screen", ""),
    };
    vec![
        Line::from(Span::styled(
            focus_hint,
            Style::default().fg(Theme::highlight()),
        )),
        Line::from(Span::styled(primary, Style::default().fg(Theme::dim()))),
        Line::from(Span::styled(secondary, Style::default().fg(Theme::dim()))),
    ]
}
