/// Project-related database queries.
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row};

use super::{format_deleted_at, now_timestamp, parse_timestamp};
use crate::types::{OrganizationId, Project, ProjectId};

const COLUMNS: &str = "id, organization_id, name, favorite, created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        organization_id: row.get(1)?,
        name: row.get(2)?,
        favorite: row.get(3)?,
        created_at: parse_timestamp(4, row.get(4)?)?,
    })
}

pub fn create_project(
    organization_id: OrganizationId,
    name: &str,
    conn: &Connection,
) -> rusqlite::Result<ProjectId> {
    let now = now_timestamp();
    conn.execute(
        "INSERT INTO projects (organization_id, name, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
        (organization_id, name, &now),
    )?;
    Ok(conn.last_insert_rowid() as ProjectId)
}

pub fn query_projects(
    organization_id: OrganizationId,
    conn: &Connection,
) -> rusqlite::Result<Vec<Project>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM projects
         WHERE organization_id = ?1 AND deleted_at IS NULL ORDER BY id"
    ))?;
    let rows = stmt.query_map([organization_id], from_row)?;
    rows.collect()
}

pub fn query_project_by_id(id: ProjectId, conn: &Connection) -> rusqlite::Result<Option<Project>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM projects WHERE id = ?1 AND deleted_at IS NULL"),
        [id],
        from_row,
    )
    .optional()
}

pub fn query_project_by_name(
    organization_id: OrganizationId,
    name: &str,
    conn: &Connection,
) -> rusqlite::Result<Option<Project>> {
    conn.query_row(
        &format!(
            "SELECT {COLUMNS} FROM projects
             WHERE organization_id = ?1 AND name = ?2 AND deleted_at IS NULL"
        ),
        (organization_id, name),
        from_row,
    )
    .optional()
}

pub fn rename_project(id: ProjectId, name: &str, conn: &Connection) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE projects SET name = ?1, updated_at = ?2 WHERE id = ?3 AND deleted_at IS NULL",
        (name, now_timestamp(), id),
    )
}

pub fn set_project_favorite(
    id: ProjectId,
    favorite: bool,
    conn: &Connection,
) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE projects SET favorite = ?1, updated_at = ?2 WHERE id = ?3 AND deleted_at IS NULL",
        (favorite, now_timestamp(), id),
    )
}

pub fn soft_delete_project(id: ProjectId, conn: &Connection) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE projects SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
        (format_deleted_at(Utc::now()), id),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_organization, init_in_memory};

    #[test]
    fn projects_are_scoped_to_their_organization() -> anyhow::Result<()> {
        let conn = init_in_memory()?;
        let acme = create_organization("Acme", &conn)?;
        let other = create_organization("Other", &conn)?;
        create_project(acme, "web", &conn)?;
        create_project(other, "web", &conn)?;
        create_project(acme, "api", &conn)?;

        assert_eq!(query_projects(acme, &conn)?.len(), 2);
        assert_eq!(query_projects(other, &conn)?.len(), 1);

        let web = query_project_by_name(other, "web", &conn)?.expect("project");
        assert_eq!(web.organization_id, other);
        Ok(())
    }

    #[test]
    fn deleted_projects_disappear() -> anyhow::Result<()> {
        let conn = init_in_memory()?;
        let acme = create_organization("Acme", &conn)?;
        let web = create_project(acme, "web", &conn)?;
        assert_eq!(soft_delete_project(web, &conn)?, 1);
        assert_eq!(soft_delete_project(web, &conn)?, 0);
        assert!(query_project_by_id(web, &conn)?.is_none());
        assert_eq!(rename_project(web, "renamed", &conn)?, 0);
        Ok(())
    }
}
