mod actions;
mod state;

use crossterm::event::KeyCode;

use crate::session::SessionEvent;
use crate::types::{OrganizationId, ProjectId, WorkSessionId};

pub use state::{App, Report};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppView {
    Dashboard,
    Organizations,
    Projects,
    Sessions,
    Reports,
    Help,
}

pub const TABS: [AppView; 5] = [
    AppView::Dashboard,
    AppView::Organizations,
    AppView::Projects,
    AppView::Sessions,
    AppView::Reports,
];

/// Input for a single update of the app state.
#[derive(Clone, Debug, PartialEq)]
pub enum AppEvent {
    KeyPress(KeyCode),
    Session(SessionEvent),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FocusMode {
    TabBar,
    Content,
}

/// Work queued by a key press and carried out by the event loop, which may await the host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    ToggleTimer,
    StopTimer,
    Acknowledge,
    SetAlertTime(u32),
    SelectOrganization(OrganizationId),
    SelectProject(ProjectId),
    NewOrganization { name: String, first_project: String },
    NewProject(String),
    RenameOrganization(OrganizationId, String),
    RenameProject(ProjectId, String),
    ToggleFavoriteOrganization(OrganizationId),
    ToggleFavoriteProject(ProjectId),
    DeleteOrganization(OrganizationId),
    DeleteProject(ProjectId),
    LoadSessions,
    TransferSession(WorkSessionId, ProjectId),
    DeleteSession(WorkSessionId),
    LoadReport,
    ExportMonth,
    ExportYear,
    Refresh,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrganizationField {
    Name,
    FirstProject,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenameTarget {
    Organization(OrganizationId),
    Project(ProjectId),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Popup {
    Settings {
        index: usize,
    },
    NewOrganization {
        name: String,
        first_project: String,
        field: OrganizationField,
    },
    NewProject {
        name: String,
    },
    Rename {
        target: RenameTarget,
        name: String,
    },
    Transfer {
        session: WorkSessionId,
        index: usize,
    },
    /// Runs `action` on "y".
    Confirm {
        message: String,
        action: Action,
    },
}
