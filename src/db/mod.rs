/// Database module with organization, project, work hour and work session queries.
mod migrations;
mod organization;
mod project;
mod work_hours;
mod work_session;

use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate, SecondsFormat, Utc};
use rusqlite::{Connection, types::Type};

use crate::types::DATE_FORMAT;

pub use organization::{
    create_organization, query_organization_by_id, query_organization_by_name,
    query_organizations, rename_organization, set_organization_favorite,
    soft_delete_organization,
};
pub use project::{
    create_project, query_project_by_id, query_project_by_name,
    query_projects, rename_project, set_project_favorite, soft_delete_project,
};
pub use work_hours::{
    add_seconds, clear_work_hours, query_daily_breakdown, query_entries_between,
    query_monthly_breakdown, query_org_by_project_between, query_org_total_between,
    query_project_total_between,
};
pub use work_session::{
    create_work_session, query_work_session_by_id, query_work_sessions,
    soft_delete_work_session, soft_delete_work_sessions_between, update_work_session_project,
};

/// Opens (or creates) the SQLite database and runs migrations.
pub fn init(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    migrations::run_migrations(&conn)?;
    Ok(conn)
}

/// In-memory database with the full schema, used by tests.
#[cfg(test)]
pub fn init_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    migrations::run_migrations(&conn)?;
    Ok(conn)
}

/// Hard-deletes rows that were soft-deleted before `cutoff`. Returns the number of rows removed.
pub fn purge_soft_deleted(cutoff: DateTime<Utc>, conn: &Connection) -> rusqlite::Result<usize> {
    let cutoff = format_deleted_at(cutoff);
    let mut removed = conn.execute(
        "DELETE FROM work_sessions WHERE deleted_at IS NOT NULL AND deleted_at <= ?1",
        [&cutoff],
    )?;
    removed += conn.execute(
        "DELETE FROM work_hours WHERE project_id IN
            (SELECT id FROM projects WHERE deleted_at IS NOT NULL AND deleted_at <= ?1)",
        [&cutoff],
    )?;
    removed += conn.execute(
        "DELETE FROM projects WHERE deleted_at IS NOT NULL AND deleted_at <= ?1",
        [&cutoff],
    )?;
    removed += conn.execute(
        "DELETE FROM organizations WHERE deleted_at IS NOT NULL AND deleted_at <= ?1",
        [&cutoff],
    )?;
    Ok(removed)
}

fn now_timestamp() -> String {
    Local::now().to_rfc3339()
}

/// Deletion marks are stored in UTC so they compare lexically.
fn format_deleted_at(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_timestamp(index: usize, raw: String) -> rusqlite::Result<DateTime<Local>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Local))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e)))
}

fn parse_date(index: usize, raw: String) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(&raw, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e)))
}
