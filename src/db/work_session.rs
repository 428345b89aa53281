/// Work session queries. A session is one stopped timer segment.
use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, Row};

use super::{format_date, format_deleted_at, now_timestamp, parse_date, parse_timestamp};
use crate::types::{OrganizationId, ProjectId, WorkSession, WorkSessionId};

const COLUMNS: &str = "id, project_id, date, seconds, created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<WorkSession> {
    Ok(WorkSession {
        id: row.get(0)?,
        project_id: row.get(1)?,
        date: parse_date(2, row.get(2)?)?,
        seconds: row.get(3)?,
        created_at: parse_timestamp(4, row.get(4)?)?,
    })
}

pub fn create_work_session(
    project_id: ProjectId,
    date: NaiveDate,
    seconds: i64,
    conn: &Connection,
) -> rusqlite::Result<WorkSessionId> {
    conn.execute(
        "INSERT INTO work_sessions (project_id, date, seconds, created_at) VALUES (?1, ?2, ?3, ?4)",
        (project_id, format_date(date), seconds, now_timestamp()),
    )?;
    Ok(conn.last_insert_rowid() as WorkSessionId)
}

/// Sessions of one project, or of every project when `project_id` is `None`. Newest first.
pub fn query_work_sessions(
    project_id: Option<ProjectId>,
    conn: &Connection,
) -> rusqlite::Result<Vec<WorkSession>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM work_sessions
         WHERE deleted_at IS NULL AND (?1 IS NULL OR project_id = ?1)
         ORDER BY date DESC, id DESC"
    ))?;
    let rows = stmt.query_map([project_id], from_row)?;
    rows.collect()
}

pub fn query_work_session_by_id(
    id: WorkSessionId,
    conn: &Connection,
) -> rusqlite::Result<Option<WorkSession>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM work_sessions WHERE id = ?1 AND deleted_at IS NULL"),
        [id],
        from_row,
    )
    .optional()
}

pub fn update_work_session_project(
    id: WorkSessionId,
    project_id: ProjectId,
    conn: &Connection,
) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE work_sessions SET project_id = ?1 WHERE id = ?2 AND deleted_at IS NULL",
        (project_id, id),
    )
}

pub fn soft_delete_work_session(id: WorkSessionId, conn: &Connection) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE work_sessions SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
        (format_deleted_at(Utc::now()), id),
    )
}

/// Soft-deletes an organization's sessions between `from` and `to`, inclusive.
pub fn soft_delete_work_sessions_between(
    organization_id: OrganizationId,
    from: NaiveDate,
    to: NaiveDate,
    conn: &Connection,
) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE work_sessions SET deleted_at = ?1
         WHERE deleted_at IS NULL
           AND date BETWEEN ?3 AND ?4
           AND project_id IN (SELECT id FROM projects WHERE organization_id = ?2)",
        (
            format_deleted_at(Utc::now()),
            organization_id,
            format_date(from),
            format_date(to),
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_organization, create_project, init_in_memory};

    #[test]
    fn sessions_filter_by_project_and_hide_deleted() -> anyhow::Result<()> {
        let conn = init_in_memory()?;
        let org = create_organization("Acme", &conn)?;
        let web = create_project(org, "web", &conn)?;
        let api = create_project(org, "api", &conn)?;
        let day = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();

        let first = create_work_session(web, day, 60, &conn)?;
        create_work_session(api, day, 30, &conn)?;

        assert_eq!(query_work_sessions(None, &conn)?.len(), 2);
        assert_eq!(query_work_sessions(Some(web), &conn)?.len(), 1);

        update_work_session_project(first, api, &conn)?;
        assert_eq!(query_work_sessions(Some(api), &conn)?.len(), 2);

        soft_delete_work_session(first, &conn)?;
        assert!(query_work_session_by_id(first, &conn)?.is_none());
        assert_eq!(query_work_sessions(None, &conn)?.len(), 1);
        Ok(())
    }
}
