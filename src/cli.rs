/// CLI argument parsing and command handling.
use anyhow::{Context, Result, bail};
use chrono::Datelike;
use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::host::{Host, LocalHost};
use crate::time_utils::{format_hms, week_of_month};
use crate::types::{ExportFormat, Organization, Project, WorkSessionId, month_name};
use crate::updater;

#[derive(Parser)]
#[command(
    name = "worktracker",
    version,
    about = "worktracker - track working hours per organization and project"
)]
pub struct Cli {
    /// Mirror log output to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage organizations.
    Org {
        #[command(subcommand)]
        command: OrgCommand,
    },
    /// Manage the projects of an organization.
    Project {
        #[command(subcommand)]
        command: ProjectCommand,
    },
    /// Show day, week, month and year totals of an organization.
    Totals {
        organization: String,
        /// Limit the totals to one project.
        #[arg(short, long)]
        project: Option<String>,
    },
    /// List, move or delete recorded sessions.
    Sessions {
        #[command(subcommand)]
        command: SessionCommand,
    },
    /// Write a report for an organization.
    Export {
        #[command(subcommand)]
        command: ExportCommand,
    },
    /// Fill the current month with random work for testing.
    Seed { organization: String },
    /// Write the current configuration to the config file.
    Config,
    /// Check GitHub releases for a newer version.
    Update {
        /// Download and install the newer version.
        #[arg(long)]
        install: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum OrgCommand {
    List,
    /// New organizations need a first project.
    Add { name: String, first_project: String },
    Rename { name: String, new_name: String },
    Delete { name: String },
    Favorite { name: String },
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    List { organization: String },
    Add { organization: String, name: String },
    Rename {
        organization: String,
        name: String,
        new_name: String,
    },
    Delete { organization: String, name: String },
    Favorite { organization: String, name: String },
}

#[derive(Subcommand, Debug)]
pub enum SessionCommand {
    List {
        organization: String,
        project: String,
    },
    /// Move a session to another project of the same organization.
    Transfer {
        organization: String,
        id: WorkSessionId,
        to_project: String,
    },
    Delete { id: WorkSessionId },
}

#[derive(Subcommand, Debug)]
pub enum ExportCommand {
    Month {
        organization: String,
        year: i32,
        month: u32,
        #[arg(short, long, value_enum, default_value = "csv")]
        format: ExportFormat,
    },
    Year {
        organization: String,
        year: i32,
        #[arg(short, long, value_enum, default_value = "csv")]
        format: ExportFormat,
    },
}

/// Execute a CLI command against the local host.
pub async fn run(command: Command, host: &LocalHost, config: &AppConfig) -> Result<()> {
    match command {
        Command::Org { command } => handle_org(command, host).await?,
        Command::Project { command } => handle_project(command, host).await?,
        Command::Totals {
            organization,
            project,
        } => handle_totals(&organization, project.as_deref(), host).await?,
        Command::Sessions { command } => handle_sessions(command, host).await?,
        Command::Export { command } => handle_export(command, host).await?,
        Command::Seed { organization } => {
            let org = find_organization(host, &organization).await?;
            let today = host.today().await?;
            let days = host.seed_month(org.id, today.year(), today.month())?;
            println!(
                "Seeded {days} days of {} {} for '{}'",
                month_name(today.month()),
                today.year(),
                org.name
            );
        }
        Command::Config => {
            let path = config.save()?;
            println!("Configuration written to {}", path.display());
        }
        Command::Update { install } => handle_update(install, config).await?,
    }
    Ok(())
}

async fn handle_org(command: OrgCommand, host: &dyn Host) -> Result<()> {
    match command {
        OrgCommand::List => {
            let organizations = host.organizations().await?;
            if organizations.is_empty() {
                println!("No organizations yet.");
            }
            for org in organizations {
                println!("{}{}", if org.favorite { "* " } else { "  " }, org.name);
            }
        }
        OrgCommand::Add {
            name,
            first_project,
        } => {
            let (org, project) = host.new_organization(&name, &first_project).await?;
            println!("Created organization '{}' with project '{}'", org.name, project.name);
        }
        OrgCommand::Rename { name, new_name } => {
            let org = find_organization(host, &name).await?;
            let org = host.rename_organization(org.id, &new_name).await?;
            println!("Renamed '{name}' to '{}'", org.name);
        }
        OrgCommand::Delete { name } => {
            let org = find_organization(host, &name).await?;
            if host.organizations().await?.len() == 1 {
                bail!("'{}' is the last organization and cannot be deleted", org.name);
            }
            host.delete_organization(org.id).await?;
            println!("Deleted organization '{}'", org.name);
        }
        OrgCommand::Favorite { name } => {
            let org = find_organization(host, &name).await?;
            let org = host.toggle_favorite_organization(org.id).await?;
            println!(
                "'{}' is {}a favorite",
                org.name,
                if org.favorite { "" } else { "no longer " }
            );
        }
    }
    Ok(())
}

async fn handle_project(command: ProjectCommand, host: &dyn Host) -> Result<()> {
    match command {
        ProjectCommand::List { organization } => {
            let org = find_organization(host, &organization).await?;
            for project in host.projects(org.id).await? {
                println!(
                    "{}{}",
                    if project.favorite { "* " } else { "  " },
                    project.name
                );
            }
        }
        ProjectCommand::Add { organization, name } => {
            let org = find_organization(host, &organization).await?;
            let project = host.new_project(org.id, &name).await?;
            println!("Created project '{}' in '{}'", project.name, org.name);
        }
        ProjectCommand::Rename {
            organization,
            name,
            new_name,
        } => {
            let (_, project) = find_project(host, &organization, &name).await?;
            let project = host.rename_project(project.id, &new_name).await?;
            println!("Renamed '{name}' to '{}'", project.name);
        }
        ProjectCommand::Delete { organization, name } => {
            let (org, project) = find_project(host, &organization, &name).await?;
            if host.projects(org.id).await?.len() == 1 {
                bail!(
                    "'{}' is the last project of '{}' and cannot be deleted",
                    project.name,
                    org.name
                );
            }
            host.delete_project(project.id).await?;
            println!("Deleted project '{}'", project.name);
        }
        ProjectCommand::Favorite { organization, name } => {
            let (_, project) = find_project(host, &organization, &name).await?;
            let project = host.toggle_favorite_project(project.id).await?;
            println!(
                "'{}' is {}a favorite",
                project.name,
                if project.favorite { "" } else { "no longer " }
            );
        }
    }
    Ok(())
}

async fn handle_totals(organization: &str, project: Option<&str>, host: &dyn Host) -> Result<()> {
    let today = host.today().await?;
    let (year, month, week) = (today.year(), today.month(), week_of_month(today));
    let org = find_organization(host, organization).await?;

    let (label, day, week_total, month_total) = match project {
        Some(name) => {
            let (_, project) = find_project(host, organization, name).await?;
            (
                format!("{} > {}", org.name, project.name),
                host.project_day_total(project.id, today).await?,
                host.project_week_total(project.id, year, month, week).await?,
                host.project_month_total(project.id, year, month).await?,
            )
        }
        None => (
            org.name.clone(),
            host.org_day_total(org.id, today).await?,
            host.org_week_total(org.id, year, month, week).await?,
            host.org_month_total(org.id, year, month).await?,
        ),
    };

    println!("{label}");
    println!("  Today ({today}):      {}", format_hms(day));
    println!("  Week {week} of {}:   {}", month_name(month), format_hms(week_total));
    println!("  {} {year}:    {}", month_name(month), format_hms(month_total));
    if project.is_none() {
        println!(
            "  Year {year}:         {}",
            format_hms(host.org_year_total(org.id, year).await?)
        );
    }
    Ok(())
}

async fn handle_sessions(command: SessionCommand, host: &dyn Host) -> Result<()> {
    match command {
        SessionCommand::List {
            organization,
            project,
        } => {
            let (_, project) = find_project(host, &organization, &project).await?;
            let sessions = host.work_sessions(Some(project.id)).await?;
            if sessions.is_empty() {
                println!("No sessions recorded for '{}'.", project.name);
            }
            for session in sessions {
                println!(
                    "{:>6}  {}  {}  recorded {}",
                    session.id,
                    session.date,
                    format_hms(session.seconds),
                    session.created_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        SessionCommand::Transfer {
            organization,
            id,
            to_project,
        } => {
            let (_, project) = find_project(host, &organization, &to_project).await?;
            host.transfer_work_session(id, project.id).await?;
            println!("Moved session {id} to '{}'", project.name);
        }
        SessionCommand::Delete { id } => {
            host.delete_work_session(id).await?;
            println!("Deleted session {id}");
        }
    }
    Ok(())
}

async fn handle_export(command: ExportCommand, host: &dyn Host) -> Result<()> {
    let path = match command {
        ExportCommand::Month {
            organization,
            year,
            month,
            format,
        } => {
            let org = find_organization(host, &organization).await?;
            host.export_by_month(format, org.id, year, month).await?
        }
        ExportCommand::Year {
            organization,
            year,
            format,
        } => {
            let org = find_organization(host, &organization).await?;
            host.export_by_year(format, org.id, year).await?
        }
    };
    println!("Exported to {}", path.display());
    Ok(())
}

async fn handle_update(install: bool, config: &AppConfig) -> Result<()> {
    let Some(update) = config.update.clone() else {
        bail!("No [update] section in the configuration, update checks are disabled");
    };
    // self_update blocks on its own HTTP client.
    tokio::task::spawn_blocking(move || -> Result<()> {
        match updater::check_for_updates(&update)? {
            Some(version) if install => {
                println!("Updating to {version}");
                updater::perform_update(&update)
            }
            Some(version) => {
                println!("Version {version} is available, run with --install to update");
                Ok(())
            }
            None => {
                println!("Already up to date");
                Ok(())
            }
        }
    })
    .await?
}

async fn find_organization(host: &dyn Host, name: &str) -> Result<Organization> {
    host.organizations()
        .await?
        .into_iter()
        .find(|org| org.name.eq_ignore_ascii_case(name.trim()))
        .with_context(|| format!("Organization '{name}' not found"))
}

async fn find_project(
    host: &dyn Host,
    organization: &str,
    name: &str,
) -> Result<(Organization, Project)> {
    let org = find_organization(host, organization).await?;
    let project = host
        .projects(org.id)
        .await?
        .into_iter()
        .find(|project| project.name.eq_ignore_ascii_case(name.trim()))
        .with_context(|| format!("Project '{name}' not found in '{}'", org.name))?;
    Ok((org, project))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::db;

    fn host() -> LocalHost {
        LocalHost::new(
            db::init_in_memory().unwrap(),
            std::env::temp_dir(),
            SystemClock,
            false,
        )
    }

    fn parse(args: &[&str]) -> Command {
        let mut argv = vec!["worktracker"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap().command.unwrap()
    }

    #[test]
    fn export_format_defaults_to_csv() {
        match parse(&["export", "month", "Acme", "2024", "5"]) {
            Command::Export {
                command: ExportCommand::Month { format, month, .. },
            } => {
                assert_eq!(format, ExportFormat::Csv);
                assert_eq!(month, 5);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn organizations_need_a_first_project() {
        assert!(Cli::try_parse_from(["worktracker", "org", "add", "Acme"]).is_err());
    }

    #[tokio::test]
    async fn names_are_matched_case_insensitively() {
        let host = host();
        let config = AppConfig::default();
        run(parse(&["org", "add", "Acme", "web"]), &host, &config)
            .await
            .unwrap();
        run(parse(&["project", "add", "acme", "api"]), &host, &config)
            .await
            .unwrap();

        let (org, project) = find_project(&host, " ACME ", "API").await.unwrap();
        assert_eq!(org.name, "Acme");
        assert_eq!(project.name, "api");
    }

    #[tokio::test]
    async fn last_project_is_kept() {
        let host = host();
        let config = AppConfig::default();
        run(parse(&["org", "add", "Acme", "web"]), &host, &config)
            .await
            .unwrap();
        let result = run(parse(&["project", "delete", "Acme", "web"]), &host, &config).await;
        assert!(result.is_err());
        assert!(find_project(&host, "Acme", "web").await.is_ok());
    }

    #[tokio::test]
    async fn unknown_organization_is_reported() {
        let host = host();
        let err = find_organization(&host, "Nope").await.unwrap_err();
        assert!(err.to_string().contains("Nope"));
    }
}
