use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

use super::TimerStore;
use crate::host::{Host, HostResult};
use crate::time_utils::week_of_month;
use crate::types::{Organization, OrganizationId, Project, ProjectId, WorkTotals};

/// What the user picked. Kept across restarts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub active_org: Option<OrganizationId>,
    pub active_proj: Option<ProjectId>,
    /// Minutes between "still working?" prompts. 0 disables them.
    pub alert_time: u32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AppState {
    pub selection: Selection,
    pub organizations: Vec<Organization>,
    /// Projects of the active organization.
    pub projects: Vec<Project>,
    pub org_totals: WorkTotals,
    pub org_year_total: i64,
    pub proj_totals: WorkTotals,
    pub today: Option<NaiveDate>,
    pub current_week: u32,
    pub mini_timer: bool,
}

impl AppState {
    pub fn active_organization(&self) -> Option<&Organization> {
        let id = self.selection.active_org?;
        self.organizations.iter().find(|org| org.id == id)
    }

    pub fn active_project(&self) -> Option<&Project> {
        let id = self.selection.active_proj?;
        self.projects.iter().find(|project| project.id == id)
    }
}

/// Application-wide selections and cached totals.
#[derive(Clone)]
pub struct AppStore {
    tx: Arc<watch::Sender<AppState>>,
    selection_path: Option<Arc<PathBuf>>,
}

impl AppStore {
    /// A store that is never written to disk.
    pub fn in_memory(selection: Selection) -> Self {
        let (tx, _) = watch::channel(AppState {
            selection,
            ..AppState::default()
        });
        Self {
            tx: Arc::new(tx),
            selection_path: None,
        }
    }

    /// Reads the saved selection from `path`, falling back to `default_alert` minutes.
    pub fn load(path: &Path, default_alert: u32) -> Result<Self> {
        let selection = if path.exists() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            Selection {
                alert_time: default_alert,
                ..Selection::default()
            }
        };
        let mut store = Self::in_memory(selection);
        store.selection_path = Some(Arc::new(path.to_path_buf()));
        Ok(store)
    }

    pub fn get(&self) -> AppState {
        self.tx.borrow().clone()
    }

    pub fn selection(&self) -> Selection {
        self.tx.borrow().selection.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.tx.subscribe()
    }

    pub fn update(&self, f: impl FnOnce(&mut AppState)) {
        self.tx.send_modify(f);
    }

    fn update_selection(&self, f: impl FnOnce(&mut Selection)) {
        let changed = self.tx.send_if_modified(|state| {
            let before = state.selection.clone();
            f(&mut state.selection);
            state.selection != before
        });
        if changed {
            self.persist();
        }
    }

    fn persist(&self) {
        let Some(path) = &self.selection_path else {
            return;
        };
        let result = serde_json::to_string_pretty(&self.selection())
            .map_err(anyhow::Error::from)
            .and_then(|raw| {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(path.as_path(), raw)?;
                Ok(())
            });
        if let Err(e) = result {
            warn!(error = %e, path = %path.display(), "could not save selection");
        }
    }

    pub fn set_alert_time(&self, minutes: u32) {
        self.update_selection(|selection| selection.alert_time = minutes);
    }

    pub fn set_active_org(&self, id: Option<OrganizationId>) {
        self.update_selection(|selection| {
            if selection.active_org != id {
                selection.active_org = id;
                selection.active_proj = None;
            }
        });
    }

    pub fn set_active_proj(&self, id: Option<ProjectId>) {
        self.update_selection(|selection| selection.active_proj = id);
    }

    pub fn toggle_mini_timer(&self) {
        self.update(|state| state.mini_timer = !state.mini_timer);
    }

    /// Advances the cached day totals of the active organization and project.
    pub fn add_to_day(&self, seconds: i64) {
        self.update(|state| {
            state.org_totals.add_to_day(seconds);
            state.proj_totals.add_to_day(seconds);
        });
    }

    /// Folds a stopped segment into the cached week, month and year totals.
    pub fn flush(&self, seconds: i64) {
        self.update(|state| {
            state.org_totals.flush(seconds);
            state.proj_totals.flush(seconds);
            state.org_year_total += seconds;
        });
    }

    /// Refetches organizations and projects. A selection that no longer exists falls back to
    /// the first entry of the list.
    pub async fn refresh_lists(&self, host: &dyn Host) -> HostResult<()> {
        let organizations = host.organizations().await?;
        let active_org = self
            .selection()
            .active_org
            .filter(|id| organizations.iter().any(|org| org.id == *id))
            .or_else(|| organizations.first().map(|org| org.id));
        self.set_active_org(active_org);

        let projects = match active_org {
            Some(id) => host.projects(id).await?,
            None => Vec::new(),
        };
        let active_proj = self
            .selection()
            .active_proj
            .filter(|id| projects.iter().any(|project| project.id == *id))
            .or_else(|| projects.first().map(|project| project.id));
        self.set_active_proj(active_proj);

        self.update(|state| {
            state.organizations = organizations;
            state.projects = projects;
        });
        Ok(())
    }

    /// Refetches every cached total for the current selection. The host only holds the
    /// saved part of a running segment, so the rest of `timer`'s elapsed time is added back
    /// to the day totals.
    pub async fn refresh_totals(&self, host: &dyn Host, timer: &TimerStore) -> HostResult<()> {
        let active = host.active_timer().await?;
        let today = host.today().await?;
        let (year, month, week) = (today.year(), today.month(), week_of_month(today));
        let selection = self.selection();

        let mut org_totals = WorkTotals::default();
        let mut org_year_total = 0;
        if let Some(org) = selection.active_org {
            org_totals = WorkTotals {
                day: host.org_day_total(org, today).await?,
                week: host.org_week_total(org, year, month, week).await?,
                month: host.org_month_total(org, year, month).await?,
            };
            org_year_total = host.org_year_total(org, year).await?;
        }

        let mut proj_totals = WorkTotals::default();
        if let Some(project) = selection.active_proj {
            proj_totals = WorkTotals {
                day: host.project_day_total(project, today).await?,
                week: host.project_week_total(project, year, month, week).await?,
                month: host.project_month_total(project, year, month).await?,
            };
        }

        let running_here = active.running
            && active.project.as_ref().map(|project| project.id) == selection.active_proj;
        debug!(?org_totals, ?proj_totals, "totals refreshed");
        self.update(|state| {
            if running_here {
                let unsaved = timer.get().elapsed_time.saturating_sub(active.saved) as i64;
                org_totals.day += unsaved;
                proj_totals.day += unsaved;
            }
            state.org_totals = org_totals;
            state.org_year_total = org_year_total;
            state.proj_totals = proj_totals;
            state.today = Some(today);
            state.current_week = week;
        });
        Ok(())
    }
}
