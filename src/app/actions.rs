use anyhow::{Context, Result};
use tracing::warn;

use crate::time_utils::format_hms;
use crate::types::ExportFormat;

use super::state::Report;
use super::{Action, App};

impl App {
    /// Runs every queued action. Failures end up in the status line; nothing is retried.
    pub async fn run_pending(&mut self) {
        for action in self.take_actions() {
            if let Err(e) = self.run_action(action.clone()).await {
                warn!(?action, error = %e, "action failed");
                self.set_status(format!("{e:#}"));
            }
        }
        self.sync();
    }

    async fn run_action(&mut self, action: Action) -> Result<()> {
        let controller = self.controller.clone();
        let host = controller.host().clone();
        match action {
            Action::ToggleTimer => {
                if controller.timer().get().running {
                    let elapsed = controller.stop().await?;
                    self.set_status(format!("Stopped after {}", format_hms(elapsed as i64)));
                } else {
                    controller.start().await?;
                    self.set_status("Timer started");
                }
            }
            Action::StopTimer => {
                let elapsed = controller.stop().await?;
                self.set_status(format!("Stopped after {}", format_hms(elapsed as i64)));
            }
            Action::Acknowledge => {
                controller.acknowledge();
                self.set_status("Still working, timer keeps running");
            }
            Action::SetAlertTime(minutes) => {
                controller.set_alert_time(minutes);
                self.set_status(match minutes {
                    0 => "Reminders off".to_string(),
                    1 => "Reminder every minute".to_string(),
                    n => format!("Reminder every {n} minutes"),
                });
            }
            Action::SelectOrganization(id) => {
                controller.select_organization(id).await?;
                self.selected_project_index = 0;
            }
            Action::SelectProject(id) => controller.select_project(id).await?,
            Action::NewOrganization {
                name,
                first_project,
            } => {
                let (org, _) = host.new_organization(&name, &first_project).await?;
                controller.select_organization(org.id).await?;
                self.set_status(format!("Created organization '{}'", org.name));
            }
            Action::NewProject(name) => {
                let org = controller
                    .app()
                    .selection()
                    .active_org
                    .context("No organization selected")?;
                let project = host.new_project(org, &name).await?;
                controller.refresh().await?;
                self.set_status(format!("Created project '{}'", project.name));
            }
            Action::RenameOrganization(id, name) => {
                host.rename_organization(id, &name).await?;
                controller.refresh().await?;
            }
            Action::RenameProject(id, name) => {
                host.rename_project(id, &name).await?;
                controller.refresh().await?;
            }
            Action::ToggleFavoriteOrganization(id) => {
                host.toggle_favorite_organization(id).await?;
                controller.refresh().await?;
            }
            Action::ToggleFavoriteProject(id) => {
                host.toggle_favorite_project(id).await?;
                controller.refresh().await?;
            }
            Action::DeleteOrganization(id) => {
                if controller.app().selection().active_org == Some(id) {
                    controller.stop().await?;
                }
                host.delete_organization(id).await?;
                controller.refresh().await?;
                self.set_status("Organization deleted");
            }
            Action::DeleteProject(id) => {
                if controller.app().selection().active_proj == Some(id) {
                    controller.stop().await?;
                }
                host.delete_project(id).await?;
                controller.refresh().await?;
                self.set_status("Project deleted");
            }
            Action::LoadSessions => {
                let project = controller.app().selection().active_proj;
                self.sessions = host.work_sessions(project).await?;
            }
            Action::TransferSession(session, project) => {
                host.transfer_work_session(session, project).await?;
                self.sessions = host
                    .work_sessions(controller.app().selection().active_proj)
                    .await?;
                controller.refresh().await?;
                self.set_status("Session moved");
            }
            Action::DeleteSession(session) => {
                host.delete_work_session(session).await?;
                self.sessions = host
                    .work_sessions(controller.app().selection().active_proj)
                    .await?;
                controller.refresh().await?;
                self.set_status("Session deleted");
            }
            Action::LoadReport => {
                let Some(org) = controller.app().selection().active_org else {
                    self.report = None;
                    return Ok(());
                };
                let (year, month) = self.report_month;
                self.report = Some(Report {
                    year,
                    month,
                    days: host.daily_breakdown(org, year, month).await?,
                    year_by_project: host.yearly_by_project(org, year).await?,
                });
            }
            Action::ExportMonth => {
                let org = controller
                    .app()
                    .selection()
                    .active_org
                    .context("No organization selected")?;
                let (year, month) = self.report_month;
                let path = host
                    .export_by_month(ExportFormat::Csv, org, year, month)
                    .await?;
                self.set_status(format!("Exported to {}", path.display()));
            }
            Action::ExportYear => {
                let org = controller
                    .app()
                    .selection()
                    .active_org
                    .context("No organization selected")?;
                let path = host
                    .export_by_year(ExportFormat::Csv, org, self.report_month.0)
                    .await?;
                self.set_status(format!("Exported to {}", path.display()));
            }
            Action::Refresh => controller.refresh().await?,
        }
        Ok(())
    }
}
