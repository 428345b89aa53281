/// In-process host backed by SQLite. Owns the running segment and every write to storage.
use std::{
    collections::BTreeMap,
    io::Write,
    path::PathBuf,
    sync::{Mutex, MutexGuard},
    time::Duration,
};

use async_trait::async_trait;
use chrono::NaiveDate;
use rand::RngExt;
use rusqlite::Connection;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use super::{Host, HostError, HostResult};
use crate::clock::Clock;
use crate::db;
use crate::export::{MonthlyReport, YearlyReport, write_monthly_csv, write_yearly_csv};
use crate::time_utils::{month_range, week_range};
use crate::types::{
    ActiveTimer, DailyBreakdown, ExportFormat, MonthlyBreakdown, Organization, OrganizationId,
    Project, ProjectId, WorkSession, WorkSessionId, sort_listed,
};

/// Progress of a running segment is written at least this often.
const SAVE_INTERVAL: Duration = Duration::from_secs(60);

/// The running segment. Seconds are written to work hours in whole-second steps, so
/// `last_save` trails the true instant by less than a second.
struct Segment {
    organization: Organization,
    project: Project,
    started: Instant,
    last_save: Instant,
    date: NaiveDate,
    /// Seconds saved for `date` by this segment; becomes a work session on stop or rollover.
    day_seconds: i64,
}

impl Segment {
    fn flush(&mut self, now: Instant, conn: &Connection) -> rusqlite::Result<()> {
        let seconds = now.saturating_duration_since(self.last_save).as_secs();
        if seconds == 0 {
            return Ok(());
        }
        db::add_seconds(self.project.id, self.date, seconds as i64, conn)?;
        self.last_save += Duration::from_secs(seconds);
        self.day_seconds += seconds as i64;
        Ok(())
    }

    /// Records the seconds saved for the current date as a work session.
    fn close_day(&mut self, conn: &Connection) -> rusqlite::Result<()> {
        if self.day_seconds > 0 {
            db::create_work_session(self.project.id, self.date, self.day_seconds, conn)?;
        }
        self.day_seconds = 0;
        Ok(())
    }

    fn elapsed(&self, now: Instant) -> u64 {
        now.saturating_duration_since(self.started).as_secs()
    }

    fn saved(&self) -> u64 {
        self.last_save.saturating_duration_since(self.started).as_secs()
    }
}

struct TimerSlot {
    day: NaiveDate,
    segment: Option<Segment>,
}

pub struct LocalHost {
    timer: Mutex<TimerSlot>,
    conn: Mutex<Connection>,
    clock: Box<dyn Clock>,
    export_dir: PathBuf,
    bell: bool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn valid_name(name: &str, what: &str) -> HostResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(HostError::InvalidInput(format!("{what} name cannot be empty")));
    }
    Ok(name.to_string())
}

fn month_bounds(year: i32, month: u32) -> HostResult<(NaiveDate, NaiveDate)> {
    month_range(year, month)
        .ok_or_else(|| HostError::InvalidInput(format!("no such month: {year}-{month}")))
}

fn year_bounds(year: i32) -> HostResult<(NaiveDate, NaiveDate)> {
    let (first, _) = month_bounds(year, 1)?;
    let (_, last) = month_bounds(year, 12)?;
    Ok((first, last))
}

fn week_bounds(year: i32, month: u32, week: u32) -> HostResult<(NaiveDate, NaiveDate)> {
    week_range(year, month, week).ok_or_else(|| {
        HostError::InvalidInput(format!("no week {week} in {year}-{month:02}"))
    })
}

fn organization(id: OrganizationId, conn: &Connection) -> HostResult<Organization> {
    db::query_organization_by_id(id, conn)?
        .ok_or_else(|| HostError::NotFound(format!("organization {id}")))
}

fn project(id: ProjectId, conn: &Connection) -> HostResult<Project> {
    db::query_project_by_id(id, conn)?.ok_or_else(|| HostError::NotFound(format!("project {id}")))
}

impl LocalHost {
    pub fn new(conn: Connection, export_dir: PathBuf, clock: impl Clock, bell: bool) -> Self {
        let day = clock.now().date_naive();
        Self {
            timer: Mutex::new(TimerSlot { day, segment: None }),
            conn: Mutex::new(conn),
            clock: Box::new(clock),
            export_dir,
            bell,
        }
    }

    fn stop_segment(&self, slot: &mut TimerSlot, conn: &Connection) -> HostResult<u64> {
        let Some(mut segment) = slot.segment.take() else {
            return Ok(0);
        };
        let now = self.clock.instant();
        segment.flush(now, conn)?;
        segment.close_day(conn)?;
        let elapsed = segment.elapsed(now);
        info!(
            project = %segment.project.name,
            elapsed,
            "timer stopped"
        );
        Ok(elapsed)
    }

    /// Replaces the organization's work hours and sessions in a month with random work on
    /// every day of it.
    pub fn seed_month(
        &self,
        organization_id: OrganizationId,
        year: i32,
        month: u32,
    ) -> HostResult<usize> {
        let (first, last) = month_bounds(year, month)?;
        let mut conn = lock(&self.conn);
        let projects = db::query_projects(organization_id, &conn)?;
        if projects.is_empty() {
            return Err(HostError::NotFound(format!(
                "projects of organization {organization_id}"
            )));
        }
        let tx = conn.transaction()?;
        let cleared = db::clear_work_hours(organization_id, first, last, &tx)?;
        let dropped = db::soft_delete_work_sessions_between(organization_id, first, last, &tx)?;
        debug!(cleared, dropped, "cleared the month before seeding");
        let mut rng = rand::rng();
        let mut days = 0;
        for date in first.iter_days().take_while(|date| *date <= last) {
            let project = &projects[rng.random_range(0..projects.len())];
            let seconds = rng.random_range(3600..=28800);
            db::add_seconds(project.id, date, seconds, &tx)?;
            db::create_work_session(project.id, date, seconds, &tx)?;
            days += 1;
        }
        tx.commit()?;
        info!(organization_id, year, month, days, "seeded work hours");
        Ok(days)
    }
}

#[async_trait]
impl Host for LocalHost {
    #[instrument(skip(self))]
    async fn start_timer(
        &self,
        organization_id: OrganizationId,
        project_id: ProjectId,
    ) -> HostResult<()> {
        let mut slot = lock(&self.timer);
        let conn = lock(&self.conn);
        let organization = organization(organization_id, &conn)?;
        let project = project(project_id, &conn)?;
        if project.organization_id != organization.id {
            return Err(HostError::InvalidInput(format!(
                "project '{}' does not belong to '{}'",
                project.name, organization.name
            )));
        }

        match slot.segment.as_ref().map(|running| running.project.id) {
            Some(running) if running == project.id => {
                debug!("timer already running for this project");
                return Ok(());
            }
            Some(_) => {
                self.stop_segment(&mut slot, &conn)?;
            }
            None => {}
        }

        let now = self.clock.instant();
        let date = self.clock.now().date_naive();
        info!(organization = %organization.name, project = %project.name, "timer started");
        slot.day = date;
        slot.segment = Some(Segment {
            organization,
            project,
            started: now,
            last_save: now,
            date,
            day_seconds: 0,
        });
        Ok(())
    }

    async fn stop_timer(&self) -> HostResult<u64> {
        let mut slot = lock(&self.timer);
        let conn = lock(&self.conn);
        self.stop_segment(&mut slot, &conn)
    }

    async fn time_elapsed(&self) -> HostResult<u64> {
        let mut slot = lock(&self.timer);
        let Some(segment) = slot.segment.as_mut() else {
            return Ok(0);
        };
        let now = self.clock.instant();
        if now.saturating_duration_since(segment.last_save) >= SAVE_INTERVAL {
            let conn = lock(&self.conn);
            segment.flush(now, &conn)?;
            debug!(project = %segment.project.name, "saved timer progress");
        }
        Ok(segment.elapsed(now))
    }

    async fn active_timer(&self) -> HostResult<ActiveTimer> {
        let slot = lock(&self.timer);
        Ok(match &slot.segment {
            Some(segment) => ActiveTimer {
                running: true,
                organization: Some(segment.organization.clone()),
                project: Some(segment.project.clone()),
                elapsed: segment.elapsed(self.clock.instant()),
                saved: segment.saved(),
            },
            None => ActiveTimer::default(),
        })
    }

    async fn check_new_day(&self) -> HostResult<bool> {
        let mut slot = lock(&self.timer);
        let today = self.clock.now().date_naive();
        if today == slot.day {
            return Ok(false);
        }
        let previous = std::mem::replace(&mut slot.day, today);
        if let Some(segment) = slot.segment.as_mut() {
            let conn = lock(&self.conn);
            segment.flush(self.clock.instant(), &conn)?;
            segment.close_day(&conn)?;
            segment.date = today;
        }
        info!(%previous, %today, "day rolled over");
        Ok(true)
    }

    async fn today(&self) -> HostResult<NaiveDate> {
        Ok(self.clock.now().date_naive())
    }

    async fn show_window(&self) -> HostResult<()> {
        debug!("attention requested");
        if self.bell {
            let mut stderr = std::io::stderr();
            stderr.write_all(b"\x07")?;
            stderr.flush()?;
        }
        Ok(())
    }

    async fn organizations(&self) -> HostResult<Vec<Organization>> {
        let conn = lock(&self.conn);
        let mut organizations = db::query_organizations(&conn)?;
        sort_listed(&mut organizations);
        Ok(organizations)
    }

    #[instrument(skip(self))]
    async fn new_organization(
        &self,
        name: &str,
        first_project: &str,
    ) -> HostResult<(Organization, Project)> {
        let name = valid_name(name, "organization")?;
        let first_project = valid_name(first_project, "project")?;
        let mut conn = lock(&self.conn);
        if db::query_organization_by_name(&name, &conn)?.is_some() {
            return Err(HostError::Conflict(format!("organization '{name}'")));
        }
        let tx = conn.transaction()?;
        let organization_id = db::create_organization(&name, &tx)?;
        let project_id = db::create_project(organization_id, &first_project, &tx)?;
        tx.commit()?;
        info!(%name, "organization created");
        Ok((organization(organization_id, &conn)?, project(project_id, &conn)?))
    }

    #[instrument(skip(self))]
    async fn rename_organization(&self, id: OrganizationId, name: &str) -> HostResult<Organization> {
        let name = valid_name(name, "organization")?;
        let conn = lock(&self.conn);
        if let Some(existing) = db::query_organization_by_name(&name, &conn)? {
            if existing.id != id {
                return Err(HostError::Conflict(format!("organization '{name}'")));
            }
        }
        if db::rename_organization(id, &name, &conn)? == 0 {
            return Err(HostError::NotFound(format!("organization {id}")));
        }
        organization(id, &conn)
    }

    async fn toggle_favorite_organization(&self, id: OrganizationId) -> HostResult<Organization> {
        let conn = lock(&self.conn);
        let current = organization(id, &conn)?;
        db::set_organization_favorite(id, !current.favorite, &conn)?;
        organization(id, &conn)
    }

    #[instrument(skip(self))]
    async fn delete_organization(&self, id: OrganizationId) -> HostResult<()> {
        let mut slot = lock(&self.timer);
        let conn = lock(&self.conn);
        if slot
            .segment
            .as_ref()
            .is_some_and(|segment| segment.organization.id == id)
        {
            warn!("deleting the organization of the running timer");
            self.stop_segment(&mut slot, &conn)?;
        }
        if db::soft_delete_organization(id, &conn)? == 0 {
            return Err(HostError::NotFound(format!("organization {id}")));
        }
        info!(id, "organization deleted");
        Ok(())
    }

    async fn projects(&self, organization_id: OrganizationId) -> HostResult<Vec<Project>> {
        let conn = lock(&self.conn);
        let mut projects = db::query_projects(organization_id, &conn)?;
        sort_listed(&mut projects);
        Ok(projects)
    }

    #[instrument(skip(self))]
    async fn new_project(&self, organization_id: OrganizationId, name: &str) -> HostResult<Project> {
        let name = valid_name(name, "project")?;
        let conn = lock(&self.conn);
        organization(organization_id, &conn)?;
        if db::query_project_by_name(organization_id, &name, &conn)?.is_some() {
            return Err(HostError::Conflict(format!("project '{name}'")));
        }
        let id = db::create_project(organization_id, &name, &conn)?;
        info!(%name, "project created");
        project(id, &conn)
    }

    #[instrument(skip(self))]
    async fn rename_project(&self, id: ProjectId, name: &str) -> HostResult<Project> {
        let name = valid_name(name, "project")?;
        let conn = lock(&self.conn);
        let current = project(id, &conn)?;
        if let Some(existing) = db::query_project_by_name(current.organization_id, &name, &conn)? {
            if existing.id != id {
                return Err(HostError::Conflict(format!("project '{name}'")));
            }
        }
        db::rename_project(id, &name, &conn)?;
        project(id, &conn)
    }

    async fn toggle_favorite_project(&self, id: ProjectId) -> HostResult<Project> {
        let conn = lock(&self.conn);
        let current = project(id, &conn)?;
        db::set_project_favorite(id, !current.favorite, &conn)?;
        project(id, &conn)
    }

    #[instrument(skip(self))]
    async fn delete_project(&self, id: ProjectId) -> HostResult<()> {
        let mut slot = lock(&self.timer);
        let conn = lock(&self.conn);
        if slot
            .segment
            .as_ref()
            .is_some_and(|segment| segment.project.id == id)
        {
            warn!("deleting the project of the running timer");
            self.stop_segment(&mut slot, &conn)?;
        }
        if db::soft_delete_project(id, &conn)? == 0 {
            return Err(HostError::NotFound(format!("project {id}")));
        }
        info!(id, "project deleted");
        Ok(())
    }

    async fn org_day_total(&self, organization_id: OrganizationId, date: NaiveDate) -> HostResult<i64> {
        let conn = lock(&self.conn);
        Ok(db::query_org_total_between(organization_id, date, date, &conn)?)
    }

    async fn org_week_total(
        &self,
        organization_id: OrganizationId,
        year: i32,
        month: u32,
        week: u32,
    ) -> HostResult<i64> {
        let (from, to) = week_bounds(year, month, week)?;
        let conn = lock(&self.conn);
        Ok(db::query_org_total_between(organization_id, from, to, &conn)?)
    }

    async fn org_month_total(
        &self,
        organization_id: OrganizationId,
        year: i32,
        month: u32,
    ) -> HostResult<i64> {
        let (from, to) = month_bounds(year, month)?;
        let conn = lock(&self.conn);
        Ok(db::query_org_total_between(organization_id, from, to, &conn)?)
    }

    async fn org_year_total(&self, organization_id: OrganizationId, year: i32) -> HostResult<i64> {
        let (from, to) = year_bounds(year)?;
        let conn = lock(&self.conn);
        Ok(db::query_org_total_between(organization_id, from, to, &conn)?)
    }

    async fn project_day_total(&self, project_id: ProjectId, date: NaiveDate) -> HostResult<i64> {
        let conn = lock(&self.conn);
        Ok(db::query_project_total_between(project_id, date, date, &conn)?)
    }

    async fn project_week_total(
        &self,
        project_id: ProjectId,
        year: i32,
        month: u32,
        week: u32,
    ) -> HostResult<i64> {
        let (from, to) = week_bounds(year, month, week)?;
        let conn = lock(&self.conn);
        Ok(db::query_project_total_between(project_id, from, to, &conn)?)
    }

    async fn project_month_total(
        &self,
        project_id: ProjectId,
        year: i32,
        month: u32,
    ) -> HostResult<i64> {
        let (from, to) = month_bounds(year, month)?;
        let conn = lock(&self.conn);
        Ok(db::query_project_total_between(project_id, from, to, &conn)?)
    }

    async fn monthly_breakdown(
        &self,
        organization_id: OrganizationId,
        year: i32,
    ) -> HostResult<MonthlyBreakdown> {
        let conn = lock(&self.conn);
        Ok(db::query_monthly_breakdown(organization_id, year, &conn)?)
    }

    async fn daily_breakdown(
        &self,
        organization_id: OrganizationId,
        year: i32,
        month: u32,
    ) -> HostResult<DailyBreakdown> {
        let (from, to) = month_bounds(year, month)?;
        let conn = lock(&self.conn);
        Ok(db::query_daily_breakdown(organization_id, from, to, &conn)?)
    }

    async fn yearly_by_project(
        &self,
        organization_id: OrganizationId,
        year: i32,
    ) -> HostResult<BTreeMap<String, i64>> {
        let (from, to) = year_bounds(year)?;
        let conn = lock(&self.conn);
        Ok(db::query_org_by_project_between(organization_id, from, to, &conn)?)
    }

    async fn work_sessions(&self, project_id: Option<ProjectId>) -> HostResult<Vec<WorkSession>> {
        let conn = lock(&self.conn);
        Ok(db::query_work_sessions(project_id, &conn)?)
    }

    #[instrument(skip(self))]
    async fn transfer_work_session(&self, id: WorkSessionId, project_id: ProjectId) -> HostResult<()> {
        let mut conn = lock(&self.conn);
        let session = db::query_work_session_by_id(id, &conn)?
            .ok_or_else(|| HostError::NotFound(format!("work session {id}")))?;
        project(project_id, &conn)?;
        if session.project_id == project_id {
            return Ok(());
        }
        let tx = conn.transaction()?;
        db::add_seconds(session.project_id, session.date, -session.seconds, &tx)?;
        db::add_seconds(project_id, session.date, session.seconds, &tx)?;
        db::update_work_session_project(id, project_id, &tx)?;
        tx.commit()?;
        info!(id, from = session.project_id, to = project_id, "work session transferred");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_work_session(&self, id: WorkSessionId) -> HostResult<()> {
        let mut conn = lock(&self.conn);
        let session = db::query_work_session_by_id(id, &conn)?
            .ok_or_else(|| HostError::NotFound(format!("work session {id}")))?;
        let tx = conn.transaction()?;
        db::add_seconds(session.project_id, session.date, -session.seconds, &tx)?;
        db::soft_delete_work_session(id, &tx)?;
        tx.commit()?;
        info!(id, "work session deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn export_by_month(
        &self,
        format: ExportFormat,
        organization_id: OrganizationId,
        year: i32,
        month: u32,
    ) -> HostResult<PathBuf> {
        let (from, to) = month_bounds(year, month)?;
        let (organization, entries) = {
            let conn = lock(&self.conn);
            (
                organization(organization_id, &conn)?,
                db::query_entries_between(organization_id, from, to, &conn)?,
            )
        };
        let report = MonthlyReport::build(&organization.name, year, month, &entries);
        match format {
            ExportFormat::Csv => write_monthly_csv(&report, &self.export_dir),
        }
    }

    #[instrument(skip(self))]
    async fn export_by_year(
        &self,
        format: ExportFormat,
        organization_id: OrganizationId,
        year: i32,
    ) -> HostResult<PathBuf> {
        let (from, to) = year_bounds(year)?;
        let (organization, entries) = {
            let conn = lock(&self.conn);
            (
                organization(organization_id, &conn)?,
                db::query_entries_between(organization_id, from, to, &conn)?,
            )
        };
        let report = YearlyReport::build(&organization.name, year, &entries);
        match format {
            ExportFormat::Csv => write_yearly_csv(&report, &self.export_dir),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Local, TimeZone};

    use super::*;
    use crate::clock::test_clock::TestClock;

    fn host_at(y: i32, m: u32, d: u32, h: u32, min: u32) -> LocalHost {
        let start = Local.with_ymd_and_hms(y, m, d, h, min, 0).unwrap();
        let conn = db::init_in_memory().unwrap();
        LocalHost::new(conn, std::env::temp_dir(), TestClock::starting_at(start), false)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn stop_writes_work_hours_and_a_session() -> anyhow::Result<()> {
        let host = host_at(2024, 5, 2, 9, 0);
        let (org, web) = host.new_organization("Acme", "web").await?;

        host.start_timer(org.id, web.id).await?;
        tokio::time::advance(Duration::from_secs(95)).await;
        assert_eq!(host.time_elapsed().await?, 95);

        assert_eq!(host.stop_timer().await?, 95);
        assert_eq!(host.time_elapsed().await?, 0);
        assert_eq!(host.project_day_total(web.id, date(2024, 5, 2)).await?, 95);

        let sessions = host.work_sessions(Some(web.id)).await?;
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].seconds, 95);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn stop_when_idle_is_a_no_op() -> anyhow::Result<()> {
        let host = host_at(2024, 5, 2, 9, 0);
        assert_eq!(host.stop_timer().await?, 0);
        assert!(!host.active_timer().await?.running);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn start_rejects_project_of_another_organization() -> anyhow::Result<()> {
        let host = host_at(2024, 5, 2, 9, 0);
        let (acme, _) = host.new_organization("Acme", "web").await?;
        let (_, other) = host.new_organization("Globex", "ops").await?;
        let result = host.start_timer(acme.id, other.id).await;
        assert!(matches!(result, Err(HostError::InvalidInput(_))));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn switching_projects_closes_the_previous_segment() -> anyhow::Result<()> {
        let host = host_at(2024, 5, 2, 9, 0);
        let (org, web) = host.new_organization("Acme", "web").await?;
        let api = host.new_project(org.id, "api").await?;

        host.start_timer(org.id, web.id).await?;
        tokio::time::advance(Duration::from_secs(30)).await;
        host.start_timer(org.id, web.id).await?;
        tokio::time::advance(Duration::from_secs(30)).await;
        host.start_timer(org.id, api.id).await?;
        tokio::time::advance(Duration::from_secs(10)).await;
        host.stop_timer().await?;

        assert_eq!(host.project_day_total(web.id, date(2024, 5, 2)).await?, 60);
        assert_eq!(host.project_day_total(api.id, date(2024, 5, 2)).await?, 10);
        assert_eq!(host.org_day_total(org.id, date(2024, 5, 2)).await?, 70);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn day_rollover_splits_the_segment() -> anyhow::Result<()> {
        let host = host_at(2024, 5, 1, 23, 59);
        let (org, web) = host.new_organization("Acme", "web").await?;
        host.start_timer(org.id, web.id).await?;

        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(!host.check_new_day().await?);
        tokio::time::advance(Duration::from_secs(60)).await;
        assert!(host.check_new_day().await?);
        assert!(!host.check_new_day().await?);

        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(host.stop_timer().await?, 120);

        assert_eq!(host.project_day_total(web.id, date(2024, 5, 1)).await?, 90);
        assert_eq!(host.project_day_total(web.id, date(2024, 5, 2)).await?, 30);
        let sessions = host.work_sessions(None).await?;
        let split: Vec<_> = sessions.iter().map(|s| (s.date, s.seconds)).collect();
        assert_eq!(split, vec![(date(2024, 5, 2), 30), (date(2024, 5, 1), 90)]);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn progress_is_saved_while_running() -> anyhow::Result<()> {
        let host = host_at(2024, 5, 2, 9, 0);
        let (org, web) = host.new_organization("Acme", "web").await?;
        host.start_timer(org.id, web.id).await?;

        tokio::time::advance(Duration::from_secs(59)).await;
        host.time_elapsed().await?;
        assert_eq!(host.project_day_total(web.id, date(2024, 5, 2)).await?, 0);

        tokio::time::advance(Duration::from_secs(61)).await;
        host.time_elapsed().await?;
        assert_eq!(host.project_day_total(web.id, date(2024, 5, 2)).await?, 120);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn names_are_validated() -> anyhow::Result<()> {
        let host = host_at(2024, 5, 2, 9, 0);
        let (org, _) = host.new_organization("Acme", "web").await?;

        assert!(matches!(
            host.new_organization("  ", "web").await,
            Err(HostError::InvalidInput(_))
        ));
        assert!(matches!(
            host.new_organization("Acme", "web").await,
            Err(HostError::Conflict(_))
        ));
        assert!(matches!(
            host.new_project(org.id, "web").await,
            Err(HostError::Conflict(_))
        ));
        let renamed = host.rename_organization(org.id, " Acme Corp ").await?;
        assert_eq!(renamed.name, "Acme Corp");
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn favorites_sort_first() -> anyhow::Result<()> {
        let host = host_at(2024, 5, 2, 9, 0);
        let (org, _) = host.new_organization("Acme", "web").await?;
        host.new_project(org.id, "api").await?;
        let zulu = host.new_project(org.id, "zulu").await?;

        assert!(host.toggle_favorite_project(zulu.id).await?.favorite);
        let names: Vec<_> = host
            .projects(org.id)
            .await?
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["zulu", "api", "web"]);
        assert!(!host.toggle_favorite_project(zulu.id).await?.favorite);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn deleting_the_running_project_stops_the_timer() -> anyhow::Result<()> {
        let host = host_at(2024, 5, 2, 9, 0);
        let (org, web) = host.new_organization("Acme", "web").await?;
        host.start_timer(org.id, web.id).await?;
        tokio::time::advance(Duration::from_secs(5)).await;

        host.delete_project(web.id).await?;
        assert!(!host.active_timer().await?.running);
        assert_eq!(host.org_day_total(org.id, date(2024, 5, 2)).await?, 0);
        assert!(host.projects(org.id).await?.is_empty());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn transfer_and_delete_keep_work_hours_consistent() -> anyhow::Result<()> {
        let host = host_at(2024, 5, 2, 9, 0);
        let (org, web) = host.new_organization("Acme", "web").await?;
        let api = host.new_project(org.id, "api").await?;
        let today = date(2024, 5, 2);

        host.start_timer(org.id, web.id).await?;
        tokio::time::advance(Duration::from_secs(40)).await;
        host.stop_timer().await?;
        let session = host.work_sessions(Some(web.id)).await?[0].clone();

        host.transfer_work_session(session.id, api.id).await?;
        assert_eq!(host.project_day_total(web.id, today).await?, 0);
        assert_eq!(host.project_day_total(api.id, today).await?, 40);

        host.delete_work_session(session.id).await?;
        assert_eq!(host.org_day_total(org.id, today).await?, 0);
        assert!(host.work_sessions(None).await?.is_empty());
        assert!(matches!(
            host.delete_work_session(session.id).await,
            Err(HostError::NotFound(_))
        ));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn week_and_month_totals_use_calendar_ranges() -> anyhow::Result<()> {
        let host = host_at(2024, 5, 2, 9, 0);
        let (org, web) = host.new_organization("Acme", "web").await?;
        {
            let conn = lock(&host.conn);
            db::add_seconds(web.id, date(2024, 5, 5), 100, &conn)?;
            db::add_seconds(web.id, date(2024, 5, 6), 10, &conn)?;
            db::add_seconds(web.id, date(2024, 6, 1), 1, &conn)?;
        }
        assert_eq!(host.org_week_total(org.id, 2024, 5, 1).await?, 100);
        assert_eq!(host.project_week_total(web.id, 2024, 5, 2).await?, 10);
        assert_eq!(host.org_month_total(org.id, 2024, 5).await?, 110);
        assert_eq!(host.org_year_total(org.id, 2024).await?, 111);
        assert_eq!(host.yearly_by_project(org.id, 2024).await?["web"], 111);
        assert_eq!(host.monthly_breakdown(org.id, 2024).await?[&6]["web"], 1);
        assert!(matches!(
            host.org_week_total(org.id, 2024, 5, 7).await,
            Err(HostError::InvalidInput(_))
        ));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn seeding_fills_every_day() -> anyhow::Result<()> {
        let host = host_at(2024, 2, 2, 9, 0);
        let (org, _) = host.new_organization("Acme", "web").await?;
        assert_eq!(host.seed_month(org.id, 2024, 2)?, 29);
        let daily = host.daily_breakdown(org.id, 2024, 2).await?;
        assert_eq!(daily.len(), 29);
        let total = host.org_month_total(org.id, 2024, 2).await?;
        assert!((29 * 3600..=29 * 28800).contains(&total));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn seeding_replaces_only_the_month_and_its_sessions() -> anyhow::Result<()> {
        let host = host_at(2024, 2, 2, 9, 0);
        let (org, web) = host.new_organization("Acme", "web").await?;
        host.start_timer(org.id, web.id).await?;
        tokio::time::advance(Duration::from_secs(40)).await;
        host.stop_timer().await?;
        let earlier = host.work_sessions(None).await?.remove(0);
        db::add_seconds(web.id, date(2024, 1, 15), 500, &lock(&host.conn))?;

        host.seed_month(org.id, 2024, 2)?;
        assert!(matches!(
            host.delete_work_session(earlier.id).await,
            Err(HostError::NotFound(_))
        ));
        assert_eq!(host.org_month_total(org.id, 2024, 1).await?, 500);

        let sessions = host.work_sessions(None).await?;
        assert_eq!(sessions.len(), 29);
        for session in sessions {
            host.delete_work_session(session.id).await?;
        }
        assert_eq!(host.org_month_total(org.id, 2024, 2).await?, 0);
        Ok(())
    }
}
