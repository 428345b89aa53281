/// Organization-related database queries.
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row};

use super::{format_deleted_at, now_timestamp, parse_timestamp};
use crate::types::{Organization, OrganizationId};

const COLUMNS: &str = "id, name, favorite, created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Organization> {
    Ok(Organization {
        id: row.get(0)?,
        name: row.get(1)?,
        favorite: row.get(2)?,
        created_at: parse_timestamp(3, row.get(3)?)?,
    })
}

pub fn create_organization(name: &str, conn: &Connection) -> rusqlite::Result<OrganizationId> {
    let now = now_timestamp();
    conn.execute(
        "INSERT INTO organizations (name, created_at, updated_at) VALUES (?1, ?2, ?2)",
        (name, &now),
    )?;
    Ok(conn.last_insert_rowid() as OrganizationId)
}

pub fn query_organizations(conn: &Connection) -> rusqlite::Result<Vec<Organization>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM organizations WHERE deleted_at IS NULL ORDER BY id"
    ))?;
    let rows = stmt.query_map([], from_row)?;
    rows.collect()
}

pub fn query_organization_by_id(
    id: OrganizationId,
    conn: &Connection,
) -> rusqlite::Result<Option<Organization>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM organizations WHERE id = ?1 AND deleted_at IS NULL"),
        [id],
        from_row,
    )
    .optional()
}

pub fn query_organization_by_name(
    name: &str,
    conn: &Connection,
) -> rusqlite::Result<Option<Organization>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM organizations WHERE name = ?1 AND deleted_at IS NULL"),
        [name],
        from_row,
    )
    .optional()
}

pub fn rename_organization(
    id: OrganizationId,
    name: &str,
    conn: &Connection,
) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE organizations SET name = ?1, updated_at = ?2 WHERE id = ?3 AND deleted_at IS NULL",
        (name, now_timestamp(), id),
    )
}

pub fn set_organization_favorite(
    id: OrganizationId,
    favorite: bool,
    conn: &Connection,
) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE organizations SET favorite = ?1, updated_at = ?2 WHERE id = ?3 AND deleted_at IS NULL",
        (favorite, now_timestamp(), id),
    )
}

/// Marks the organization and all of its projects as deleted.
pub fn soft_delete_organization(id: OrganizationId, conn: &Connection) -> rusqlite::Result<usize> {
    let deleted_at = format_deleted_at(Utc::now());
    conn.execute(
        "UPDATE projects SET deleted_at = ?1 WHERE organization_id = ?2 AND deleted_at IS NULL",
        (&deleted_at, id),
    )?;
    conn.execute(
        "UPDATE organizations SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
        (&deleted_at, id),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_project, init_in_memory, query_projects};

    #[test]
    fn soft_delete_hides_organization_and_projects() -> anyhow::Result<()> {
        let conn = init_in_memory()?;
        let acme = create_organization("Acme", &conn)?;
        let other = create_organization("Other", &conn)?;
        create_project(acme, "web", &conn)?;

        assert_eq!(soft_delete_organization(acme, &conn)?, 1);
        assert!(query_organization_by_id(acme, &conn)?.is_none());
        assert!(query_projects(acme, &conn)?.is_empty());

        let names: Vec<_> = query_organizations(&conn)?
            .into_iter()
            .map(|o| o.name)
            .collect();
        assert_eq!(names, vec!["Other".to_string()]);
        assert_eq!(query_organization_by_id(other, &conn)?.map(|o| o.id), Some(other));
        Ok(())
    }

    #[test]
    fn rename_and_favorite() -> anyhow::Result<()> {
        let conn = init_in_memory()?;
        let id = create_organization("Acme", &conn)?;
        rename_organization(id, "Acme Corp", &conn)?;
        set_organization_favorite(id, true, &conn)?;

        let org = query_organization_by_name("Acme Corp", &conn)?.expect("renamed org");
        assert!(org.favorite);
        assert!(query_organization_by_name("Acme", &conn)?.is_none());
        Ok(())
    }
}
