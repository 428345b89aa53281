/// Aggregated seconds per (project, date) and the range queries built on them.
use std::collections::BTreeMap;

use chrono::NaiveDate;
use rusqlite::Connection;

use super::{format_date, parse_date};
use crate::types::{DailyBreakdown, MonthlyBreakdown, OrganizationId, ProjectId};

/// Adds (or subtracts, for negative values) seconds to a project's day.
pub fn add_seconds(
    project_id: ProjectId,
    date: NaiveDate,
    seconds: i64,
    conn: &Connection,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO work_hours (project_id, date, seconds) VALUES (?1, ?2, MAX(?3, 0))
         ON CONFLICT(project_id, date) DO UPDATE SET seconds = MAX(seconds + ?3, 0)",
        (project_id, format_date(date), seconds),
    )?;
    Ok(())
}

pub fn query_org_total_between(
    organization_id: OrganizationId,
    from: NaiveDate,
    to: NaiveDate,
    conn: &Connection,
) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COALESCE(SUM(w.seconds), 0)
         FROM work_hours w
         JOIN projects p ON p.id = w.project_id
         WHERE p.organization_id = ?1 AND p.deleted_at IS NULL
         AND w.date >= ?2 AND w.date <= ?3",
        (organization_id, format_date(from), format_date(to)),
        |row| row.get(0),
    )
}

pub fn query_project_total_between(
    project_id: ProjectId,
    from: NaiveDate,
    to: NaiveDate,
    conn: &Connection,
) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COALESCE(SUM(w.seconds), 0)
         FROM work_hours w
         JOIN projects p ON p.id = w.project_id
         WHERE p.id = ?1 AND p.deleted_at IS NULL
         AND w.date >= ?2 AND w.date <= ?3",
        (project_id, format_date(from), format_date(to)),
        |row| row.get(0),
    )
}

/// project name -> seconds within the range.
pub fn query_org_by_project_between(
    organization_id: OrganizationId,
    from: NaiveDate,
    to: NaiveDate,
    conn: &Connection,
) -> rusqlite::Result<BTreeMap<String, i64>> {
    query_entries_between(organization_id, from, to, conn).map(|entries| {
        entries
            .into_iter()
            .fold(BTreeMap::new(), |mut acc, (_, project, seconds)| {
                *acc.entry(project).or_insert(0) += seconds;
                acc
            })
    })
}

pub fn query_daily_breakdown(
    organization_id: OrganizationId,
    from: NaiveDate,
    to: NaiveDate,
    conn: &Connection,
) -> rusqlite::Result<DailyBreakdown> {
    let mut breakdown = DailyBreakdown::new();
    for (date, project, seconds) in query_entries_between(organization_id, from, to, conn)? {
        *breakdown
            .entry(date)
            .or_default()
            .entry(project)
            .or_insert(0) += seconds;
    }
    Ok(breakdown)
}

pub fn query_monthly_breakdown(
    organization_id: OrganizationId,
    year: i32,
    conn: &Connection,
) -> rusqlite::Result<MonthlyBreakdown> {
    let mut stmt = conn.prepare(
        "SELECT CAST(strftime('%m', w.date) AS INTEGER), p.name, SUM(w.seconds)
         FROM work_hours w
         JOIN projects p ON p.id = w.project_id
         WHERE p.organization_id = ?1 AND p.deleted_at IS NULL
         AND strftime('%Y', w.date) = ?2
         GROUP BY 1, p.name",
    )?;
    let rows = stmt.query_map((organization_id, format!("{year:04}")), |row| {
        Ok((row.get::<_, u32>(0)?, row.get::<_, String>(1)?, row.get::<_, i64>(2)?))
    })?;
    let mut breakdown = MonthlyBreakdown::new();
    for row in rows {
        let (month, project, seconds) = row?;
        breakdown.entry(month).or_default().insert(project, seconds);
    }
    Ok(breakdown)
}

/// Raw (date, project name, seconds) rows for an organization, ordered by date.
pub fn query_entries_between(
    organization_id: OrganizationId,
    from: NaiveDate,
    to: NaiveDate,
    conn: &Connection,
) -> rusqlite::Result<Vec<(NaiveDate, String, i64)>> {
    let mut stmt = conn.prepare(
        "SELECT w.date, p.name, w.seconds
         FROM work_hours w
         JOIN projects p ON p.id = w.project_id
         WHERE p.organization_id = ?1 AND p.deleted_at IS NULL
         AND w.date >= ?2 AND w.date <= ?3
         ORDER BY w.date, p.name",
    )?;
    let rows = stmt.query_map(
        (organization_id, format_date(from), format_date(to)),
        |row| {
            Ok((
                parse_date(0, row.get(0)?)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
            ))
        },
    )?;
    rows.collect()
}

/// Removes the work hour rows of an organization's projects between `from` and `to`, inclusive.
pub fn clear_work_hours(
    organization_id: OrganizationId,
    from: NaiveDate,
    to: NaiveDate,
    conn: &Connection,
) -> rusqlite::Result<usize> {
    conn.execute(
        "DELETE FROM work_hours
         WHERE date BETWEEN ?2 AND ?3
           AND project_id IN (SELECT id FROM projects WHERE organization_id = ?1)",
        (organization_id, format_date(from), format_date(to)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_organization, create_project, init_in_memory, soft_delete_project};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn add_seconds_accumulates_and_never_goes_negative() -> anyhow::Result<()> {
        let conn = init_in_memory()?;
        let org = create_organization("Acme", &conn)?;
        let web = create_project(org, "web", &conn)?;
        let day = date(2024, 5, 2);

        add_seconds(web, day, 100, &conn)?;
        add_seconds(web, day, 50, &conn)?;
        assert_eq!(query_project_total_between(web, day, day, &conn)?, 150);

        add_seconds(web, day, -30, &conn)?;
        assert_eq!(query_project_total_between(web, day, day, &conn)?, 120);

        add_seconds(web, day, -500, &conn)?;
        assert_eq!(query_project_total_between(web, day, day, &conn)?, 0);
        Ok(())
    }

    #[test]
    fn organization_totals_skip_deleted_projects() -> anyhow::Result<()> {
        let conn = init_in_memory()?;
        let org = create_organization("Acme", &conn)?;
        let web = create_project(org, "web", &conn)?;
        let api = create_project(org, "api", &conn)?;
        add_seconds(web, date(2024, 5, 2), 100, &conn)?;
        add_seconds(api, date(2024, 5, 3), 40, &conn)?;
        add_seconds(api, date(2024, 6, 1), 7, &conn)?;

        let may = (date(2024, 5, 1), date(2024, 5, 31));
        assert_eq!(query_org_total_between(org, may.0, may.1, &conn)?, 140);

        let by_project = query_org_by_project_between(org, may.0, may.1, &conn)?;
        assert_eq!(by_project.get("web"), Some(&100));
        assert_eq!(by_project.get("api"), Some(&40));

        soft_delete_project(api, &conn)?;
        assert_eq!(query_org_total_between(org, may.0, may.1, &conn)?, 100);
        Ok(())
    }

    #[test]
    fn breakdowns_group_by_month_and_day() -> anyhow::Result<()> {
        let conn = init_in_memory()?;
        let org = create_organization("Acme", &conn)?;
        let web = create_project(org, "web", &conn)?;
        add_seconds(web, date(2024, 1, 10), 10, &conn)?;
        add_seconds(web, date(2024, 1, 11), 20, &conn)?;
        add_seconds(web, date(2024, 3, 1), 5, &conn)?;
        add_seconds(web, date(2023, 3, 1), 99, &conn)?;

        let monthly = query_monthly_breakdown(org, 2024, &conn)?;
        assert_eq!(monthly.get(&1).and_then(|m| m.get("web")), Some(&30));
        assert_eq!(monthly.get(&3).and_then(|m| m.get("web")), Some(&5));
        assert_eq!(monthly.len(), 2);

        let daily = query_daily_breakdown(org, date(2024, 1, 1), date(2024, 1, 31), &conn)?;
        assert_eq!(daily.len(), 2);
        assert_eq!(daily[&date(2024, 1, 11)]["web"], 20);
        Ok(())
    }
}
