//! Background tasks of a running segment. Each one exits as soon as the segment token is
//! cancelled.
use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{SessionEvent, TimerController};

impl TimerController {
    /// Samples the host's elapsed time once per tick and moves the cached day totals by the
    /// difference to the previous sample.
    pub(super) async fn run_elapsed(self, token: CancellationToken) {
        let mut ticker = interval(self.inner.settings.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {}
            }
            match self.inner.host.time_elapsed().await {
                Ok(_) if token.is_cancelled() => break,
                Ok(elapsed) => {
                    let delta = self.inner.timer.advance(elapsed);
                    if delta > 0 {
                        self.inner.app.add_to_day(delta as i64);
                    }
                }
                Err(e) => self.report(format!("Could not read the timer: {e}")),
            }
        }
        debug!("elapsed loop finished");
    }

    pub(super) async fn run_day_check(self, token: CancellationToken) {
        let mut ticker = interval(self.inner.settings.day_check);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {}
            }
            match self.inner.host.check_new_day().await {
                Ok(true) => {
                    if let Err(e) = self.refresh_totals().await {
                        self.report(format!("Could not refresh totals: {e}"));
                    }
                    if let Some(today) = self.inner.app.get().today {
                        self.emit(SessionEvent::NewDay(today));
                    }
                }
                Ok(false) => {}
                Err(e) => self.report(format!("Could not check the date: {e}")),
            }
        }
        debug!("day check loop finished");
    }

    /// Opens the "still working?" prompt every `alert_time` minutes of running, and stops
    /// the timer when a prompt stays unanswered for the confirmation timeout. A change of
    /// `alert_time` restarts the wait from the moment of the change.
    pub(super) async fn run_prompt(self, token: CancellationToken) {
        let mut app_rx = self.inner.app.subscribe();
        loop {
            let minutes = app_rx.borrow_and_update().selection.alert_time;
            if minutes == 0 {
                tokio::select! {
                    _ = token.cancelled() => return,
                    changed = app_rx.changed() => {
                        if changed.is_err() {
                            return;
                        }
                        continue;
                    }
                }
            }

            let due = sleep(Duration::from_secs(u64::from(minutes) * 60));
            tokio::pin!(due);
            let fired = loop {
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = &mut due => break true,
                    changed = app_rx.changed() => {
                        if changed.is_err() {
                            return;
                        }
                        if app_rx.borrow_and_update().selection.alert_time != minutes {
                            break false;
                        }
                    }
                }
            };
            if !fired {
                debug!("alert time changed, rescheduling prompt");
                continue;
            }

            if let Err(e) = self.inner.host.show_window().await {
                warn!(error = %e, "could not request attention");
            }
            info!(minutes, "asking whether work continues");
            self.inner.timer.set_open_confirm(true);

            if !self.await_answer(&token).await {
                if token.is_cancelled() {
                    return;
                }
                warn!("prompt unanswered, stopping the timer");
                match self.stop().await {
                    Ok(elapsed) => self.emit(SessionEvent::AutoStopped { elapsed }),
                    Err(e) => self.report(format!("Could not stop the timer: {e}")),
                }
                return;
            }
        }
    }

    /// `true` once the prompt is closed, `false` on timeout or cancellation.
    async fn await_answer(&self, token: &CancellationToken) -> bool {
        let mut timer_rx = self.inner.timer.subscribe();
        let timeout = sleep(self.inner.settings.confirm_timeout);
        tokio::pin!(timeout);
        loop {
            if !timer_rx.borrow_and_update().open_confirm {
                return true;
            }
            tokio::select! {
                _ = token.cancelled() => return false,
                _ = &mut timeout => return false,
                changed = timer_rx.changed() => {
                    if changed.is_err() {
                        return false;
                    }
                }
            }
        }
    }
}
