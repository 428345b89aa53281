/// Database migrations and schema management.
use anyhow::Result;
use rusqlite::Connection;

/// Creates the schema if it doesn't exist yet.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS organizations (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            name        TEXT    NOT NULL,
            favorite    INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT    NOT NULL,
            updated_at  TEXT    NOT NULL,
            deleted_at  TEXT
        );

        CREATE TABLE IF NOT EXISTS projects (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            organization_id INTEGER NOT NULL,
            name            TEXT    NOT NULL,
            favorite        INTEGER NOT NULL DEFAULT 0,
            created_at      TEXT    NOT NULL,
            updated_at      TEXT    NOT NULL,
            deleted_at      TEXT,
            FOREIGN KEY (organization_id) REFERENCES organizations(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS work_hours (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            project_id  INTEGER NOT NULL,
            date        TEXT    NOT NULL,
            seconds     INTEGER NOT NULL DEFAULT 0,
            UNIQUE (project_id, date),
            FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS work_sessions (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            project_id  INTEGER NOT NULL,
            date        TEXT    NOT NULL,
            seconds     INTEGER NOT NULL,
            created_at  TEXT    NOT NULL,
            FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_work_hours_date ON work_hours(date);
        ",
    )?;
    migrate_work_sessions_add_deleted_at(conn)?;
    Ok(())
}

fn migrate_work_sessions_add_deleted_at(conn: &Connection) -> Result<()> {
    let mut stmt = conn.prepare("PRAGMA table_info(work_sessions)")?;
    let rows = stmt.query_map([], |row| {
        let name: String = row.get(1)?;
        Ok(name)
    })?;
    for row in rows {
        if row? == "deleted_at" {
            return Ok(());
        }
    }

    conn.execute("ALTER TABLE work_sessions ADD COLUMN deleted_at TEXT", [])?;
    Ok(())
}
