use std::collections::BTreeMap;

use chrono::{Datelike, Local};
use crossterm::event::KeyCode;

use crate::config::ALERT_OPTIONS;
use crate::session::{SessionEvent, TimerController};
use crate::store::{AppState, TimerState};
use crate::time_utils::format_hms;
use crate::types::{DailyBreakdown, WorkSession};

use super::{Action, AppEvent, AppView, FocusMode, OrganizationField, Popup, RenameTarget, TABS};

/// Month report shown in the reports view.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Report {
    pub year: i32,
    pub month: u32,
    pub days: DailyBreakdown,
    /// Year so far, per project.
    pub year_by_project: BTreeMap<String, i64>,
}

/// The top-level application state.
pub struct App {
    pub running: bool,
    pub controller: TimerController,
    pub view: AppView,
    view_history: Vec<AppView>,
    pub focus_mode: FocusMode,
    pub selected_tab_index: usize,
    /// Snapshots of the stores, taken once per frame.
    pub timer: TimerState,
    pub state: AppState,
    pub selected_org_index: usize,
    pub selected_project_index: usize,
    pub selected_session_index: usize,
    pub sessions: Vec<WorkSession>,
    pub report_month: (i32, u32),
    pub report: Option<Report>,
    pub status: Option<String>,
    pub popup: Option<Popup>,
    pending: Vec<Action>,
}

impl App {
    pub fn new(controller: TimerController) -> Self {
        let today = Local::now().date_naive();
        let mut app = Self {
            running: true,
            controller,
            view: AppView::Dashboard,
            view_history: Vec::new(),
            focus_mode: FocusMode::Content,
            selected_tab_index: 0,
            timer: TimerState::default(),
            state: AppState::default(),
            selected_org_index: 0,
            selected_project_index: 0,
            selected_session_index: 0,
            sessions: Vec::new(),
            report_month: (today.year(), today.month()),
            report: None,
            status: None,
            popup: None,
            pending: Vec::new(),
        };
        app.sync();
        app
    }

    /// Copies the current store state into the frame snapshots.
    pub fn sync(&mut self) {
        self.timer = self.controller.timer().get();
        self.state = self.controller.app().get();
        self.selected_org_index = clamp_index(self.selected_org_index, self.state.organizations.len());
        self.selected_project_index =
            clamp_index(self.selected_project_index, self.state.projects.len());
        self.selected_session_index = clamp_index(self.selected_session_index, self.sessions.len());
    }

    pub fn take_actions(&mut self) -> Vec<Action> {
        std::mem::take(&mut self.pending)
    }

    pub(super) fn queue(&mut self, action: Action) {
        self.pending.push(action);
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    pub fn update(&mut self, event: AppEvent) {
        match event {
            AppEvent::KeyPress(key) => self.handle_key(key),
            AppEvent::Session(event) => self.on_session_event(event),
        }
    }

    fn on_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::AutoStopped { elapsed } => self.set_status(format!(
                "No answer, timer stopped after {}",
                format_hms(elapsed as i64)
            )),
            SessionEvent::NewDay(date) => {
                self.set_status(format!("New day started: {}", date.format("%A, %B %e")))
            }
            SessionEvent::Error(message) => self.set_status(message),
        }
    }

    pub fn handle_key(&mut self, key: KeyCode) {
        if self.timer.open_confirm {
            self.handle_still_working_key(key);
            return;
        }
        if self.popup.is_some() {
            self.handle_popup_key(key);
            return;
        }

        match key {
            KeyCode::Char('q') => self.running = false,
            KeyCode::Char('h') => self.navigate_to(AppView::Dashboard),
            KeyCode::Char('o') => self.navigate_to(AppView::Organizations),
            KeyCode::Char('p') => self.navigate_to(AppView::Projects),
            KeyCode::Char('w') => self.navigate_to(AppView::Sessions),
            KeyCode::Char('t') => self.navigate_to(AppView::Reports),
            KeyCode::Char('?') => {
                if self.view == AppView::Help {
                    self.go_back();
                } else {
                    self.navigate_to(AppView::Help);
                }
            }
            KeyCode::Tab => {
                self.focus_mode = match self.focus_mode {
                    FocusMode::TabBar => FocusMode::Content,
                    FocusMode::Content => FocusMode::TabBar,
                };
            }
            KeyCode::Left if self.focus_mode == FocusMode::TabBar => {
                self.selected_tab_index = (self.selected_tab_index + TABS.len() - 1) % TABS.len();
            }
            KeyCode::Right if self.focus_mode == FocusMode::TabBar => {
                self.selected_tab_index = (self.selected_tab_index + 1) % TABS.len();
            }
            KeyCode::Enter if self.focus_mode == FocusMode::TabBar => {
                self.navigate_to(TABS[self.selected_tab_index].clone());
                self.focus_mode = FocusMode::Content;
            }
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::Enter => self.open_selected(),
            KeyCode::Esc => self.go_back(),
            KeyCode::Char(' ') => self.queue(Action::ToggleTimer),
            KeyCode::Char('s') => {
                if self.timer.running {
                    self.queue(Action::StopTimer);
                }
            }
            KeyCode::Char('m') => self.controller.app().toggle_mini_timer(),
            KeyCode::Char('a') => self.open_settings(),
            KeyCode::Char('r') => self.queue(self.load_action()),
            KeyCode::Char('n') => self.open_new_popup(),
            KeyCode::Char('e') => match self.view {
                AppView::Reports => self.queue(Action::ExportMonth),
                _ => self.open_rename_popup(),
            },
            KeyCode::Char('E') if self.view == AppView::Reports => self.queue(Action::ExportYear),
            KeyCode::Char('f') => self.toggle_favorite(),
            KeyCode::Char('d') => self.confirm_delete(),
            KeyCode::Char('x') if self.view == AppView::Sessions => self.open_transfer_popup(),
            KeyCode::Char('[') if self.view == AppView::Reports => self.shift_report_month(-1),
            KeyCode::Char(']') if self.view == AppView::Reports => self.shift_report_month(1),
            _ => {}
        }
    }

    fn handle_still_working_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('y') | KeyCode::Enter => self.queue(Action::Acknowledge),
            KeyCode::Char('n') | KeyCode::Char('s') => self.queue(Action::StopTimer),
            _ => {}
        }
    }

    fn load_action(&self) -> Action {
        match self.view {
            AppView::Sessions => Action::LoadSessions,
            AppView::Reports => Action::LoadReport,
            _ => Action::Refresh,
        }
    }

    fn navigate_to(&mut self, view: AppView) {
        if self.view == view {
            return;
        }
        self.view_history.push(self.view.clone());
        self.view = view;
        if let Some(index) = TABS.iter().position(|tab| *tab == self.view) {
            self.selected_tab_index = index;
        }
        match self.view {
            AppView::Sessions => self.queue(Action::LoadSessions),
            AppView::Reports => self.queue(Action::LoadReport),
            _ => {}
        }
    }

    fn go_back(&mut self) {
        if let Some(view) = self.view_history.pop() {
            self.view = view;
        } else {
            self.view = AppView::Dashboard;
        }
        self.clear_status();
    }

    fn move_selection(&mut self, step: isize) {
        if self.focus_mode != FocusMode::Content {
            return;
        }
        let (index, len) = match self.view {
            AppView::Organizations => (&mut self.selected_org_index, self.state.organizations.len()),
            AppView::Projects => (&mut self.selected_project_index, self.state.projects.len()),
            AppView::Sessions => (&mut self.selected_session_index, self.sessions.len()),
            _ => return,
        };
        if len == 0 {
            return;
        }
        *index = (*index as isize + step).rem_euclid(len as isize) as usize;
    }

    fn open_selected(&mut self) {
        let action = match self.view {
            AppView::Organizations => self
                .state
                .organizations
                .get(self.selected_org_index)
                .map(|org| Action::SelectOrganization(org.id)),
            AppView::Projects => self
                .state
                .projects
                .get(self.selected_project_index)
                .map(|project| Action::SelectProject(project.id)),
            _ => None,
        };
        if let Some(action) = action {
            self.queue(action);
        }
    }

    fn open_settings(&mut self) {
        let current = self.state.selection.alert_time;
        let index = ALERT_OPTIONS
            .iter()
            .position(|minutes| *minutes == current)
            .unwrap_or(0);
        self.popup = Some(Popup::Settings { index });
    }

    fn open_new_popup(&mut self) {
        match self.view {
            AppView::Organizations => {
                self.popup = Some(Popup::NewOrganization {
                    name: String::new(),
                    first_project: String::new(),
                    field: OrganizationField::Name,
                })
            }
            AppView::Projects => {
                if self.state.selection.active_org.is_none() {
                    self.set_status("Create an organization first");
                    return;
                }
                self.popup = Some(Popup::NewProject {
                    name: String::new(),
                })
            }
            _ => {}
        }
    }

    fn open_rename_popup(&mut self) {
        let popup = match self.view {
            AppView::Organizations => self
                .state
                .organizations
                .get(self.selected_org_index)
                .map(|org| Popup::Rename {
                    target: RenameTarget::Organization(org.id),
                    name: org.name.clone(),
                }),
            AppView::Projects => self
                .state
                .projects
                .get(self.selected_project_index)
                .map(|project| Popup::Rename {
                    target: RenameTarget::Project(project.id),
                    name: project.name.clone(),
                }),
            _ => None,
        };
        if popup.is_some() {
            self.popup = popup;
        }
    }

    fn open_transfer_popup(&mut self) {
        if self.state.projects.len() < 2 {
            self.set_status("No other project to move this session to");
            return;
        }
        let Some(session) = self.sessions.get(self.selected_session_index) else {
            return;
        };
        let index = self
            .state
            .projects
            .iter()
            .position(|project| project.id != session.project_id)
            .unwrap_or(0);
        self.popup = Some(Popup::Transfer {
            session: session.id,
            index,
        });
    }

    fn toggle_favorite(&mut self) {
        let action = match self.view {
            AppView::Organizations => self
                .state
                .organizations
                .get(self.selected_org_index)
                .map(|org| Action::ToggleFavoriteOrganization(org.id)),
            AppView::Projects => self
                .state
                .projects
                .get(self.selected_project_index)
                .map(|project| Action::ToggleFavoriteProject(project.id)),
            _ => None,
        };
        if let Some(action) = action {
            self.queue(action);
        }
    }

    fn confirm_delete(&mut self) {
        let popup = match self.view {
            AppView::Organizations => {
                if self.state.organizations.len() == 1 {
                    self.set_status("The last organization cannot be deleted");
                    return;
                }
                let Some(org) = self.state.organizations.get(self.selected_org_index) else {
                    return;
                };
                Popup::Confirm {
                    message: format!("Delete organization '{}' and all of its projects?", org.name),
                    action: Action::DeleteOrganization(org.id),
                }
            }
            AppView::Projects => {
                if self.state.projects.len() == 1 {
                    self.set_status("The last project of an organization cannot be deleted");
                    return;
                }
                let Some(project) = self.state.projects.get(self.selected_project_index) else {
                    return;
                };
                Popup::Confirm {
                    message: format!("Delete project '{}'?", project.name),
                    action: Action::DeleteProject(project.id),
                }
            }
            AppView::Sessions => {
                let Some(session) = self.sessions.get(self.selected_session_index) else {
                    return;
                };
                Popup::Confirm {
                    message: format!(
                        "Delete the session of {} on {}?",
                        format_hms(session.seconds),
                        session.date
                    ),
                    action: Action::DeleteSession(session.id),
                }
            }
            _ => return,
        };
        self.popup = Some(popup);
    }

    fn shift_report_month(&mut self, step: i32) {
        let (year, month) = self.report_month;
        let index = year * 12 + month as i32 - 1 + step;
        self.report_month = (index.div_euclid(12), index.rem_euclid(12) as u32 + 1);
        self.queue(Action::LoadReport);
    }

    fn handle_popup_key(&mut self, key: KeyCode) {
        let Some(popup) = self.popup.take() else {
            return;
        };
        if key == KeyCode::Esc {
            self.clear_status();
            return;
        }
        let project_count = self.state.projects.len();
        self.popup = match popup {
            Popup::Settings { index } => match key {
                KeyCode::Up => Some(Popup::Settings {
                    index: (index + ALERT_OPTIONS.len() - 1) % ALERT_OPTIONS.len(),
                }),
                KeyCode::Down => Some(Popup::Settings {
                    index: (index + 1) % ALERT_OPTIONS.len(),
                }),
                KeyCode::Enter => {
                    self.queue(Action::SetAlertTime(ALERT_OPTIONS[index]));
                    None
                }
                _ => Some(Popup::Settings { index }),
            },
            Popup::NewOrganization {
                mut name,
                mut first_project,
                field,
            } => match key {
                KeyCode::Tab | KeyCode::Down | KeyCode::Up => Some(Popup::NewOrganization {
                    name,
                    first_project,
                    field: match field {
                        OrganizationField::Name => OrganizationField::FirstProject,
                        OrganizationField::FirstProject => OrganizationField::Name,
                    },
                }),
                KeyCode::Enter => {
                    if name.trim().is_empty() || first_project.trim().is_empty() {
                        self.set_status("Both the organization and its first project need a name");
                        Some(Popup::NewOrganization {
                            name,
                            first_project,
                            field,
                        })
                    } else {
                        self.queue(Action::NewOrganization {
                            name,
                            first_project,
                        });
                        None
                    }
                }
                _ => {
                    let target = match field {
                        OrganizationField::Name => &mut name,
                        OrganizationField::FirstProject => &mut first_project,
                    };
                    edit_text(target, key);
                    Some(Popup::NewOrganization {
                        name,
                        first_project,
                        field,
                    })
                }
            },
            Popup::NewProject { mut name } => match key {
                KeyCode::Enter if !name.trim().is_empty() => {
                    self.queue(Action::NewProject(name));
                    None
                }
                _ => {
                    edit_text(&mut name, key);
                    Some(Popup::NewProject { name })
                }
            },
            Popup::Rename { target, mut name } => match key {
                KeyCode::Enter if !name.trim().is_empty() => {
                    self.queue(match target {
                        RenameTarget::Organization(id) => Action::RenameOrganization(id, name),
                        RenameTarget::Project(id) => Action::RenameProject(id, name),
                    });
                    None
                }
                _ => {
                    edit_text(&mut name, key);
                    Some(Popup::Rename { target, name })
                }
            },
            Popup::Transfer { session, index } if project_count > 0 => match key {
                KeyCode::Up => Some(Popup::Transfer {
                    session,
                    index: (index + project_count - 1) % project_count,
                }),
                KeyCode::Down => Some(Popup::Transfer {
                    session,
                    index: (index + 1) % project_count,
                }),
                KeyCode::Enter => {
                    let target = self.state.projects.get(index).map(|project| project.id);
                    if let Some(project) = target {
                        self.queue(Action::TransferSession(session, project));
                    }
                    None
                }
                _ => Some(Popup::Transfer { session, index }),
            },
            Popup::Transfer { .. } => None,
            Popup::Confirm { message, action } => match key {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    self.queue(action);
                    None
                }
                KeyCode::Char('n') | KeyCode::Char('N') => None,
                _ => Some(Popup::Confirm { message, action }),
            },
        };
    }
}

fn clamp_index(index: usize, len: usize) -> usize {
    index.min(len.saturating_sub(1))
}

fn edit_text(value: &mut String, key: KeyCode) {
    match key {
        KeyCode::Backspace | KeyCode::Delete => {
            value.pop();
        }
        KeyCode::Char(ch) if !ch.is_control() => value.push(ch),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::clock::SystemClock;
    use crate::db;
    use crate::host::LocalHost;
    use crate::session::SessionSettings;
    use crate::store::{AppStore, Selection, TimerStore};
    use crate::types::{Organization, Project};

    fn app() -> App {
        let host = LocalHost::new(
            db::init_in_memory().unwrap(),
            std::env::temp_dir(),
            SystemClock,
            false,
        );
        let (controller, _events) = TimerController::new(
            Arc::new(host),
            TimerStore::new(),
            AppStore::in_memory(Selection {
                active_org: Some(1),
                active_proj: Some(10),
                alert_time: 30,
            }),
            SessionSettings::default(),
        );
        App::new(controller)
    }

    fn with_projects(app: &mut App, names: &[&str]) {
        let projects = names
            .iter()
            .enumerate()
            .map(|(i, name)| Project {
                id: 10 + i as u32,
                organization_id: 1,
                name: name.to_string(),
                favorite: false,
                created_at: Local::now(),
            })
            .collect();
        let organizations = vec![Organization {
            id: 1,
            name: "Acme".into(),
            favorite: false,
            created_at: Local::now(),
        }];
        app.controller.app().update(|state| {
            state.projects = projects;
            state.organizations = organizations;
        });
        app.sync();
    }

    fn press(app: &mut App, keys: &str) {
        for ch in keys.chars() {
            app.handle_key(KeyCode::Char(ch));
        }
    }

    #[test]
    fn still_working_prompt_takes_every_key() {
        let mut app = app();
        app.controller.timer().set_open_confirm(true);
        app.sync();

        press(&mut app, "q");
        assert!(app.running);
        press(&mut app, "y");
        assert_eq!(app.take_actions(), vec![Action::Acknowledge]);
        press(&mut app, "n");
        assert_eq!(app.take_actions(), vec![Action::StopTimer]);
    }

    #[test]
    fn settings_popup_picks_an_alert_interval() {
        let mut app = app();
        press(&mut app, "a");
        assert_eq!(app.popup, Some(Popup::Settings { index: 5 }));
        app.handle_key(KeyCode::Down);
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.take_actions(), vec![Action::SetAlertTime(60)]);
        assert!(app.popup.is_none());
    }

    #[test]
    fn new_organization_needs_a_first_project() {
        let mut app = app();
        press(&mut app, "o");
        app.take_actions();
        press(&mut app, "n");
        press(&mut app, "Globex");
        app.handle_key(KeyCode::Enter);
        assert!(app.take_actions().is_empty());
        assert!(app.status.is_some());

        app.handle_key(KeyCode::Tab);
        press(&mut app, "ops");
        app.handle_key(KeyCode::Enter);
        assert_eq!(
            app.take_actions(),
            vec![Action::NewOrganization {
                name: "Globex".into(),
                first_project: "ops".into(),
            }]
        );
    }

    #[test]
    fn last_project_cannot_be_deleted() {
        let mut app = app();
        with_projects(&mut app, &["web"]);
        press(&mut app, "p");
        press(&mut app, "d");
        assert!(app.popup.is_none());
        assert!(app.status.is_some());

        with_projects(&mut app, &["web", "api"]);
        app.handle_key(KeyCode::Down);
        press(&mut app, "d");
        press(&mut app, "y");
        assert_eq!(app.take_actions(), vec![Action::DeleteProject(11)]);
    }

    #[test]
    fn report_month_wraps_across_years() {
        let mut app = app();
        app.report_month = (2024, 1);
        press(&mut app, "t");
        press(&mut app, "[");
        assert_eq!(app.report_month, (2023, 12));
        press(&mut app, "]]");
        assert_eq!(app.report_month, (2024, 2));
    }
}
