//! The boundary between the client (stores, timer loops, views) and the process that owns
//! persistence. Every call resolves once; nothing here is retried.

mod local;

use std::{collections::BTreeMap, path::PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::types::{
    ActiveTimer, DailyBreakdown, ExportFormat, MonthlyBreakdown, Organization, OrganizationId,
    Project, ProjectId, WorkSession, WorkSessionId,
};

pub use local::LocalHost;

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("{0} already exists")]
    Conflict(String),
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("export failed: {0}")]
    Export(#[from] csv::Error),
}

pub type HostResult<T> = Result<T, HostError>;

#[async_trait]
pub trait Host: Send + Sync {
    async fn start_timer(&self, organization: OrganizationId, project: ProjectId)
    -> HostResult<()>;

    /// Stops the running segment and returns its length in seconds (0 when idle).
    async fn stop_timer(&self) -> HostResult<u64>;

    async fn time_elapsed(&self) -> HostResult<u64>;

    async fn active_timer(&self) -> HostResult<ActiveTimer>;

    /// Returns `true` when the running segment crossed midnight since the last check.
    async fn check_new_day(&self) -> HostResult<bool>;

    async fn today(&self) -> HostResult<NaiveDate>;

    /// Asks for the user's attention before a prompt is shown.
    async fn show_window(&self) -> HostResult<()>;

    async fn organizations(&self) -> HostResult<Vec<Organization>>;

    /// Organizations are always created together with their first project.
    async fn new_organization(
        &self,
        name: &str,
        first_project: &str,
    ) -> HostResult<(Organization, Project)>;

    async fn rename_organization(&self, id: OrganizationId, name: &str)
    -> HostResult<Organization>;

    async fn toggle_favorite_organization(&self, id: OrganizationId) -> HostResult<Organization>;

    async fn delete_organization(&self, id: OrganizationId) -> HostResult<()>;

    async fn projects(&self, organization: OrganizationId) -> HostResult<Vec<Project>>;

    async fn new_project(&self, organization: OrganizationId, name: &str) -> HostResult<Project>;

    async fn rename_project(&self, id: ProjectId, name: &str) -> HostResult<Project>;

    async fn toggle_favorite_project(&self, id: ProjectId) -> HostResult<Project>;

    async fn delete_project(&self, id: ProjectId) -> HostResult<()>;

    async fn org_day_total(&self, organization: OrganizationId, date: NaiveDate)
    -> HostResult<i64>;

    async fn org_week_total(
        &self,
        organization: OrganizationId,
        year: i32,
        month: u32,
        week: u32,
    ) -> HostResult<i64>;

    async fn org_month_total(
        &self,
        organization: OrganizationId,
        year: i32,
        month: u32,
    ) -> HostResult<i64>;

    async fn org_year_total(&self, organization: OrganizationId, year: i32) -> HostResult<i64>;

    async fn project_day_total(&self, project: ProjectId, date: NaiveDate) -> HostResult<i64>;

    async fn project_week_total(
        &self,
        project: ProjectId,
        year: i32,
        month: u32,
        week: u32,
    ) -> HostResult<i64>;

    async fn project_month_total(&self, project: ProjectId, year: i32, month: u32)
    -> HostResult<i64>;

    async fn monthly_breakdown(
        &self,
        organization: OrganizationId,
        year: i32,
    ) -> HostResult<MonthlyBreakdown>;

    async fn daily_breakdown(
        &self,
        organization: OrganizationId,
        year: i32,
        month: u32,
    ) -> HostResult<DailyBreakdown>;

    async fn yearly_by_project(
        &self,
        organization: OrganizationId,
        year: i32,
    ) -> HostResult<BTreeMap<String, i64>>;

    async fn work_sessions(&self, project: Option<ProjectId>) -> HostResult<Vec<WorkSession>>;

    async fn transfer_work_session(&self, id: WorkSessionId, project: ProjectId)
    -> HostResult<()>;

    async fn delete_work_session(&self, id: WorkSessionId) -> HostResult<()>;

    async fn export_by_month(
        &self,
        format: ExportFormat,
        organization: OrganizationId,
        year: i32,
        month: u32,
    ) -> HostResult<PathBuf>;

    async fn export_by_year(
        &self,
        format: ExportFormat,
        organization: OrganizationId,
        year: i32,
    ) -> HostResult<PathBuf>;
}
