//! Timer controller: starts and stops segments on the host and keeps the stores in step
//! while a segment runs.

mod loops;

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use chrono::NaiveDate;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

use crate::config::AppConfig;
use crate::host::{Host, HostError};
use crate::store::{AppStore, TimerStore};
use crate::types::{OrganizationId, ProjectId};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("select an organization and a project first")]
    NoSelection,
    #[error(transparent)]
    Host(#[from] HostError),
}

/// Things the loops report on their own, outside of any user action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// The prompt went unanswered and the timer was stopped after `elapsed` seconds.
    AutoStopped { elapsed: u64 },
    NewDay(NaiveDate),
    Error(String),
}

#[derive(Clone, Copy, Debug)]
pub struct SessionSettings {
    pub tick: Duration,
    pub day_check: Duration,
    pub confirm_timeout: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            day_check: Duration::from_secs(5),
            confirm_timeout: Duration::from_secs(120),
        }
    }
}

impl SessionSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            day_check: Duration::from_secs(config.day_check_secs.max(1)),
            confirm_timeout: Duration::from_secs(config.confirm_timeout_secs.max(1)),
            ..Self::default()
        }
    }
}

struct Inner {
    host: Arc<dyn Host>,
    timer: TimerStore,
    app: AppStore,
    settings: SessionSettings,
    /// Cancels every task of the running segment.
    segment: Mutex<Option<CancellationToken>>,
    events: mpsc::UnboundedSender<SessionEvent>,
}

#[derive(Clone)]
pub struct TimerController {
    inner: Arc<Inner>,
}

impl TimerController {
    pub fn new(
        host: Arc<dyn Host>,
        timer: TimerStore,
        app: AppStore,
        settings: SessionSettings,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let controller = Self {
            inner: Arc::new(Inner {
                host,
                timer,
                app,
                settings,
                segment: Mutex::new(None),
                events,
            }),
        };
        (controller, rx)
    }

    pub fn host(&self) -> &Arc<dyn Host> {
        &self.inner.host
    }

    pub fn timer(&self) -> &TimerStore {
        &self.inner.timer
    }

    pub fn app(&self) -> &AppStore {
        &self.inner.app
    }

    fn emit(&self, event: SessionEvent) {
        // The receiver is gone only while shutting down.
        let _ = self.inner.events.send(event);
    }

    fn report(&self, message: String) {
        error!("{message}");
        self.emit(SessionEvent::Error(message));
    }

    fn spawn_segment_tasks(&self) {
        let token = CancellationToken::new();
        let previous = self
            .inner
            .segment
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .replace(token.clone());
        if let Some(previous) = previous {
            previous.cancel();
        }
        tokio::spawn(self.clone().run_elapsed(token.clone()));
        tokio::spawn(self.clone().run_day_check(token.clone()));
        tokio::spawn(self.clone().run_prompt(token));
    }

    fn cancel_segment_tasks(&self) {
        let token = self
            .inner
            .segment
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(token) = token {
            token.cancel();
        }
    }

    /// Loads lists and totals for the saved selection and picks up a segment the host may
    /// still be running.
    pub async fn restore(&self) -> Result<(), SessionError> {
        let active = self.inner.host.active_timer().await?;
        if let (true, Some(org), Some(project)) =
            (active.running, &active.organization, &active.project)
        {
            self.inner.app.set_active_org(Some(org.id));
            self.inner.app.set_active_proj(Some(project.id));
        }
        if active.running {
            info!(elapsed = active.elapsed, "resuming running timer");
            self.inner.timer.resume(active.elapsed);
        }
        self.refresh().await?;
        if active.running {
            self.spawn_segment_tasks();
        }
        Ok(())
    }

    pub async fn refresh(&self) -> Result<(), SessionError> {
        self.inner.app.refresh_lists(self.inner.host.as_ref()).await?;
        self.refresh_totals().await?;
        Ok(())
    }

    async fn refresh_totals(&self) -> Result<(), HostError> {
        self.inner
            .app
            .refresh_totals(self.inner.host.as_ref(), &self.inner.timer)
            .await
    }

    #[instrument(skip(self))]
    pub async fn start(&self) -> Result<(), SessionError> {
        if self.inner.timer.get().running {
            return Ok(());
        }
        let selection = self.inner.app.selection();
        let (Some(org), Some(project)) = (selection.active_org, selection.active_proj) else {
            return Err(SessionError::NoSelection);
        };
        self.inner.host.start_timer(org, project).await?;
        self.inner.timer.start();
        self.spawn_segment_tasks();
        info!(org, project, "timer started");
        Ok(())
    }

    /// Stops the running segment and returns its length. Idle is a no-op returning 0.
    #[instrument(skip(self))]
    pub async fn stop(&self) -> Result<u64, SessionError> {
        if !self.inner.timer.get().running {
            return Ok(0);
        }
        self.cancel_segment_tasks();
        let stopped = self.inner.host.stop_timer().await;
        let elapsed = self.inner.timer.reset();
        self.inner.app.flush(elapsed as i64);
        let stopped = stopped?;
        info!(elapsed = stopped, "timer stopped");
        self.refresh_totals().await?;
        Ok(stopped)
    }

    /// Answers the prompt with "still working". The cadence restarts from now.
    pub fn acknowledge(&self) {
        self.inner.timer.set_open_confirm(false);
    }

    pub fn set_alert_time(&self, minutes: u32) {
        info!(minutes, "alert time changed");
        self.inner.app.set_alert_time(minutes);
    }

    /// Switches the active organization. A running timer is stopped first.
    pub async fn select_organization(&self, id: OrganizationId) -> Result<(), SessionError> {
        if self.inner.app.selection().active_org == Some(id) {
            return Ok(());
        }
        self.stop().await?;
        self.inner.app.set_active_org(Some(id));
        self.refresh().await
    }

    /// Switches the active project. A running timer is stopped first.
    pub async fn select_project(&self, id: ProjectId) -> Result<(), SessionError> {
        if self.inner.app.selection().active_proj == Some(id) {
            return Ok(());
        }
        self.stop().await?;
        self.inner.app.set_active_proj(Some(id));
        self.refresh_totals().await?;
        Ok(())
    }

    /// Stops a running timer before the process exits.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.stop().await?;
        self.cancel_segment_tasks();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

    use chrono::{Local, TimeZone};
    use tokio::time::sleep;

    use super::*;
    use crate::clock::test_clock::TestClock;
    use crate::db;
    use crate::host::LocalHost;
    use crate::logging::TEST_LOGGING;
    use crate::store::Selection;
    use crate::types::{Organization, Project};

    struct Fixture {
        controller: TimerController,
        events: mpsc::UnboundedReceiver<SessionEvent>,
        org: Organization,
        project: Project,
    }

    async fn fixture_at(hour: u32, minute: u32, second: u32, alert_time: u32) -> Fixture {
        LazyLock::force(&TEST_LOGGING);
        let start = Local
            .with_ymd_and_hms(2024, 5, 1, hour, minute, second)
            .unwrap();
        let host = LocalHost::new(
            db::init_in_memory().unwrap(),
            std::env::temp_dir(),
            TestClock::starting_at(start),
            false,
        );
        let (org, project) = host.new_organization("Acme", "web").await.unwrap();
        let app = AppStore::in_memory(Selection {
            active_org: Some(org.id),
            active_proj: Some(project.id),
            alert_time,
        });
        let (controller, events) = TimerController::new(
            Arc::new(host),
            TimerStore::new(),
            app,
            SessionSettings::default(),
        );
        controller.refresh().await.unwrap();
        Fixture {
            controller,
            events,
            org,
            project,
        }
    }

    async fn fixture(alert_time: u32) -> Fixture {
        fixture_at(9, 0, 0, alert_time).await
    }

    fn secs(seconds: u64) -> Duration {
        Duration::from_secs(seconds)
    }

    #[tokio::test(start_paused = true)]
    async fn start_then_stop_resets_the_timer() -> anyhow::Result<()> {
        let f = fixture(30).await;
        f.controller.start().await?;
        assert!(f.controller.timer().get().running);

        f.controller.stop().await?;
        let state = f.controller.timer().get();
        assert!(!state.running);
        assert_eq!(state.elapsed_time, 0);
        assert!(!state.open_confirm);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn start_requires_a_selection() {
        let f = fixture(30).await;
        f.controller.app().set_active_proj(None);
        assert!(matches!(
            f.controller.start().await,
            Err(SessionError::NoSelection)
        ));
        assert!(!f.controller.timer().get().running);
    }

    #[tokio::test(start_paused = true)]
    async fn elapsed_time_never_decreases_while_running() -> anyhow::Result<()> {
        let f = fixture(0).await;
        f.controller.start().await?;

        // Sample between ticks so no wake-up races the tick of the same instant.
        sleep(Duration::from_millis(250)).await;
        let mut previous = 0;
        for _ in 0..20 {
            sleep(Duration::from_millis(700)).await;
            let elapsed = f.controller.timer().get().elapsed_time;
            assert!(elapsed >= previous);
            previous = elapsed;
        }
        assert_eq!(previous, 14);
        let state = f.controller.app().get();
        assert_eq!(state.org_totals.day, 14);
        assert_eq!(state.proj_totals.day, 14);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_while_running_keeps_unsaved_seconds() -> anyhow::Result<()> {
        let f = fixture(0).await;
        f.controller.start().await?;
        sleep(Duration::from_millis(45_500)).await;

        f.controller
            .host()
            .toggle_favorite_project(f.project.id)
            .await?;
        f.controller.refresh().await?;
        assert_eq!(f.controller.app().get().proj_totals.day, 45);

        sleep(secs(10)).await;
        let state = f.controller.app().get();
        assert_eq!(f.controller.timer().get().elapsed_time, 55);
        assert_eq!(state.org_totals.day, 55);
        assert_eq!(state.proj_totals.day, 55);

        // Past the first save, the host holds 60 s and the rest is still unsaved.
        sleep(secs(15)).await;
        f.controller.refresh().await?;
        let state = f.controller.app().get();
        assert_eq!(state.org_totals.day, 70);
        assert_eq!(state.proj_totals.day, 70);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn restore_counts_seconds_after_the_last_save() -> anyhow::Result<()> {
        let f = fixture(0).await;
        let host = f.controller.host();
        host.start_timer(f.org.id, f.project.id).await?;
        sleep(secs(90)).await;
        assert_eq!(host.time_elapsed().await?, 90);
        assert_eq!(host.active_timer().await?.saved, 90);
        sleep(secs(40)).await;

        f.controller.restore().await?;
        assert_eq!(f.controller.timer().get().elapsed_time, 130);
        let state = f.controller.app().get();
        assert_eq!(state.org_totals.day, 130);
        assert_eq!(state.proj_totals.day, 130);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn stop_flushes_into_week_and_month() -> anyhow::Result<()> {
        let f = fixture(0).await;
        f.controller.start().await?;
        sleep(Duration::from_millis(30_500)).await;

        assert_eq!(f.controller.stop().await?, 30);
        let totals = f.controller.app().get().org_totals;
        assert_eq!(totals.day, 30);
        assert_eq!(totals.week, 30);
        assert_eq!(totals.month, 30);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn no_prompt_when_alert_time_is_zero() -> anyhow::Result<()> {
        let f = fixture(0).await;
        f.controller.start().await?;
        sleep(secs(2 * 3600)).await;

        let state = f.controller.timer().get();
        assert!(state.running);
        assert!(!state.open_confirm);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn prompt_opens_after_alert_time() -> anyhow::Result<()> {
        let f = fixture(1).await;
        f.controller.start().await?;

        sleep(secs(59)).await;
        assert!(!f.controller.timer().get().open_confirm);
        sleep(secs(2)).await;
        assert!(f.controller.timer().get().open_confirm);
        assert!(f.controller.timer().get().running);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn unanswered_prompt_stops_the_timer() -> anyhow::Result<()> {
        let mut f = fixture(1).await;
        f.controller.start().await?;

        sleep(secs(61)).await;
        assert!(f.controller.timer().get().open_confirm);
        sleep(secs(118)).await;
        assert!(f.controller.timer().get().running);
        sleep(secs(2)).await;

        let state = f.controller.timer().get();
        assert!(!state.running);
        assert!(!state.open_confirm);
        assert_eq!(state.elapsed_time, 0);
        assert_eq!(
            f.events.try_recv()?,
            SessionEvent::AutoStopped { elapsed: 180 }
        );
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn acknowledging_restarts_the_cadence() -> anyhow::Result<()> {
        let f = fixture(1).await;
        f.controller.start().await?;

        sleep(secs(61)).await;
        f.controller.acknowledge();
        sleep(secs(58)).await;
        assert!(!f.controller.timer().get().open_confirm);
        sleep(secs(4)).await;
        assert!(f.controller.timer().get().open_confirm);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn changing_alert_time_reschedules_from_the_change() -> anyhow::Result<()> {
        let f = fixture(5).await;
        f.controller.start().await?;

        sleep(secs(180)).await;
        f.controller.set_alert_time(1);
        sleep(secs(30)).await;
        assert!(
            !f.controller.timer().get().open_confirm,
            "prompt must not be scheduled from the start"
        );
        sleep(secs(31)).await;
        assert!(f.controller.timer().get().open_confirm);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn disabling_alerts_cancels_a_pending_prompt() -> anyhow::Result<()> {
        let f = fixture(1).await;
        f.controller.start().await?;

        sleep(secs(30)).await;
        f.controller.set_alert_time(0);
        sleep(secs(600)).await;
        assert!(!f.controller.timer().get().open_confirm);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn switching_project_stops_the_timer() -> anyhow::Result<()> {
        let f = fixture(0).await;
        let api = f.controller.host().new_project(f.org.id, "api").await?;
        f.controller.start().await?;
        sleep(secs(10)).await;

        f.controller.select_project(api.id).await?;
        assert!(!f.controller.timer().get().running);
        let state = f.controller.app().get();
        assert_eq!(state.selection.active_proj, Some(api.id));
        assert_eq!(state.proj_totals.day, 0);
        assert_eq!(state.org_totals.day, 10);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn restore_resumes_a_running_host_timer() -> anyhow::Result<()> {
        let f = fixture(0).await;
        f.controller
            .host()
            .start_timer(f.org.id, f.project.id)
            .await?;
        sleep(secs(5)).await;

        f.controller.restore().await?;
        let state = f.controller.timer().get();
        assert!(state.running);
        assert_eq!(state.elapsed_time, 5);
        sleep(Duration::from_millis(3_500)).await;
        assert_eq!(f.controller.timer().get().elapsed_time, 8);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn day_rollover_refreshes_totals() -> anyhow::Result<()> {
        let mut f = fixture_at(23, 59, 50, 0).await;
        f.controller.start().await?;
        sleep(secs(16)).await;

        let state = f.controller.app().get();
        assert_eq!(state.today, NaiveDate::from_ymd_opt(2024, 5, 2));
        assert!(state.org_totals.day < 10);
        let mut saw_new_day = false;
        while let Ok(event) = f.events.try_recv() {
            saw_new_day |= matches!(event, SessionEvent::NewDay(_));
        }
        assert!(saw_new_day);
        Ok(())
    }
}
