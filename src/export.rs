/// Monthly and yearly work-hour reports, written as CSV.
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use chrono::{Datelike, NaiveDate};
use tracing::info;

use crate::host::HostResult;
use crate::time_utils::{format_hms, week_ranges};
use crate::types::{DailyBreakdown, MonthlyBreakdown, month_name};

#[derive(Clone, Debug, PartialEq)]
pub struct WeekTotals {
    pub week: u32,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub projects: BTreeMap<String, i64>,
}

impl WeekTotals {
    pub fn total(&self) -> i64 {
        self.projects.values().sum()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MonthlyReport {
    pub organization: String,
    pub year: i32,
    pub month: u32,
    pub total: i64,
    /// Sorted by seconds, largest first.
    pub by_project: Vec<(String, i64)>,
    pub weeks: Vec<WeekTotals>,
    pub days: DailyBreakdown,
}

#[derive(Clone, Debug, PartialEq)]
pub struct YearlyReport {
    pub organization: String,
    pub year: i32,
    pub total: i64,
    pub by_project: Vec<(String, i64)>,
    pub months: MonthlyBreakdown,
}

impl MonthlyReport {
    /// Builds the report from raw (date, project, seconds) rows of a single month.
    pub fn build(
        organization: &str,
        year: i32,
        month: u32,
        entries: &[(NaiveDate, String, i64)],
    ) -> Self {
        let mut days = DailyBreakdown::new();
        let mut projects = BTreeMap::new();
        for (date, project, seconds) in entries {
            *days
                .entry(*date)
                .or_default()
                .entry(project.clone())
                .or_insert(0) += seconds;
            *projects.entry(project.clone()).or_insert(0) += seconds;
        }

        let weeks = week_ranges(year, month)
            .into_iter()
            .map(|(week, start, end)| {
                let mut totals = BTreeMap::new();
                for (_, day) in days.range(start..=end) {
                    for (project, seconds) in day {
                        *totals.entry(project.clone()).or_insert(0) += seconds;
                    }
                }
                WeekTotals {
                    week,
                    start,
                    end,
                    projects: totals,
                }
            })
            .filter(|week| week.total() > 0)
            .collect();

        Self {
            organization: organization.to_string(),
            year,
            month,
            total: projects.values().sum(),
            by_project: sorted_by_seconds(projects),
            weeks,
            days,
        }
    }
}

impl YearlyReport {
    pub fn build(organization: &str, year: i32, entries: &[(NaiveDate, String, i64)]) -> Self {
        let mut months = MonthlyBreakdown::new();
        let mut projects = BTreeMap::new();
        for (date, project, seconds) in entries.iter().filter(|(d, _, _)| d.year() == year) {
            *months
                .entry(date.month())
                .or_default()
                .entry(project.clone())
                .or_insert(0) += seconds;
            *projects.entry(project.clone()).or_insert(0) += seconds;
        }
        Self {
            organization: organization.to_string(),
            year,
            total: projects.values().sum(),
            by_project: sorted_by_seconds(projects),
            months,
        }
    }
}

fn sorted_by_seconds(projects: BTreeMap<String, i64>) -> Vec<(String, i64)> {
    let mut sorted: Vec<_> = projects.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted
}

/// Keeps organization names usable as a single path component.
/// A directory name that stays inside its parent.
fn path_component(name: &str) -> String {
    let component: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect();
    match component.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => component,
    }
}

const TIME_HEADER: &str = "Time (HH:MM:SS)";

pub fn write_monthly_csv(report: &MonthlyReport, root: &Path) -> HostResult<PathBuf> {
    let dir = root
        .join("csv")
        .join(path_component(&report.organization))
        .join(report.year.to_string())
        .join(month_name(report.month));
    fs::create_dir_all(&dir)?;
    let path = dir.join("work_hours.csv");

    let mut writer = csv::WriterBuilder::new().flexible(true).from_path(&path)?;
    writer.write_record([format!("Month total for {}", report.organization)])?;
    writer.write_record(["Month", "Seconds", TIME_HEADER])?;
    writer.write_record([
        month_name(report.month).to_string(),
        report.total.to_string(),
        format_hms(report.total),
    ])?;

    writer.write_record([""])?;
    writer.write_record(["Monthly breakdown"])?;
    writer.write_record(["Project", "Seconds", TIME_HEADER])?;
    for (project, seconds) in &report.by_project {
        writer.write_record([project.clone(), seconds.to_string(), format_hms(*seconds)])?;
    }

    writer.write_record([""])?;
    writer.write_record(["Weekly breakdown"])?;
    writer.write_record(["Week", "Project", "Seconds", TIME_HEADER])?;
    for week in &report.weeks {
        let label = format!("{} ({} - {})", week.week, week.start, week.end);
        writer.write_record([
            label.clone(),
            "TOTAL".to_string(),
            week.total().to_string(),
            format_hms(week.total()),
        ])?;
        for (project, seconds) in &week.projects {
            writer.write_record([
                label.clone(),
                project.clone(),
                seconds.to_string(),
                format_hms(*seconds),
            ])?;
        }
    }

    writer.write_record([""])?;
    writer.write_record(["Daily breakdown"])?;
    writer.write_record(["Date", "Project", "Seconds", TIME_HEADER])?;
    for (date, projects) in &report.days {
        for (project, seconds) in projects {
            writer.write_record([
                date.to_string(),
                project.clone(),
                seconds.to_string(),
                format_hms(*seconds),
            ])?;
        }
    }
    writer.flush()?;

    info!(path = %path.display(), "monthly report written");
    Ok(path)
}

pub fn write_yearly_csv(report: &YearlyReport, root: &Path) -> HostResult<PathBuf> {
    let dir = root
        .join("csv")
        .join(path_component(&report.organization))
        .join(report.year.to_string());
    fs::create_dir_all(&dir)?;
    let path = dir.join("work_hours_yearly.csv");

    let mut writer = csv::WriterBuilder::new().flexible(true).from_path(&path)?;
    writer.write_record([format!("Yearly total for {}", report.organization)])?;
    writer.write_record(["Year", "Seconds", TIME_HEADER])?;
    writer.write_record([
        report.year.to_string(),
        report.total.to_string(),
        format_hms(report.total),
    ])?;

    writer.write_record([""])?;
    writer.write_record(["Yearly breakdown"])?;
    writer.write_record(["Project", "Seconds", TIME_HEADER])?;
    for (project, seconds) in &report.by_project {
        writer.write_record([project.clone(), seconds.to_string(), format_hms(*seconds)])?;
    }

    writer.write_record([""])?;
    writer.write_record(["Monthly breakdown"])?;
    writer.write_record(["Month", "Project", "Seconds", TIME_HEADER])?;
    for (month, projects) in &report.months {
        for (project, seconds) in projects {
            writer.write_record([
                month_name(*month).to_string(),
                project.clone(),
                seconds.to_string(),
                format_hms(*seconds),
            ])?;
        }
    }
    writer.flush()?;

    info!(path = %path.display(), "yearly report written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn may_entries() -> Vec<(NaiveDate, String, i64)> {
        vec![
            (date(2024, 5, 1), "web".into(), 3600),
            (date(2024, 5, 1), "api".into(), 600),
            (date(2024, 5, 7), "web".into(), 1800),
            (date(2024, 5, 31), "api".into(), 60),
        ]
    }

    #[test]
    fn monthly_report_groups_weeks_and_projects() {
        let report = MonthlyReport::build("Acme", 2024, 5, &may_entries());
        assert_eq!(report.total, 6060);
        assert_eq!(report.by_project[0], ("web".to_string(), 5400));
        assert_eq!(report.by_project[1], ("api".to_string(), 660));

        let weeks: Vec<_> = report.weeks.iter().map(|w| (w.week, w.total())).collect();
        assert_eq!(weeks, vec![(1, 4200), (2, 1800), (5, 60)]);
        assert_eq!(report.days.len(), 3);
    }

    #[test]
    fn yearly_report_ignores_other_years() {
        let mut entries = may_entries();
        entries.push((date(2023, 12, 31), "web".into(), 999));
        let report = YearlyReport::build("Acme", 2024, &entries);
        assert_eq!(report.total, 6060);
        assert_eq!(report.months.len(), 1);
        assert_eq!(report.months[&5]["api"], 660);
    }

    #[test]
    fn monthly_csv_lands_in_organization_folder() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let report = MonthlyReport::build("Acme/EU", 2024, 5, &may_entries());
        let path = write_monthly_csv(&report, dir.path())?;

        assert!(path.ends_with("csv/Acme_EU/2024/May/work_hours.csv"));
        let contents = fs::read_to_string(&path)?;
        assert!(contents.starts_with("Month total for Acme/EU"));
        assert!(contents.contains("May,6060,01:41:00"));
        assert!(contents.contains("Weekly breakdown"));
        assert!(contents.contains("2024-05-07,web,1800,00:30:00"));
        Ok(())
    }

    #[test]
    fn dot_names_stay_inside_the_csv_folder() -> anyhow::Result<()> {
        assert_eq!(path_component("."), "_");
        assert_eq!(path_component(".."), "_");
        assert_eq!(path_component("..."), "...");

        let dir = tempfile::tempdir()?;
        let report = MonthlyReport::build("..", 2024, 5, &may_entries());
        let path = write_monthly_csv(&report, dir.path())?;
        assert!(path.ends_with("csv/_/2024/May/work_hours.csv"));
        assert!(path.starts_with(dir.path().join("csv")));
        Ok(())
    }

    #[test]
    fn yearly_csv_lists_months_by_name() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let report = YearlyReport::build("Acme", 2024, &may_entries());
        let path = write_yearly_csv(&report, dir.path())?;
        let contents = fs::read_to_string(&path)?;
        assert!(contents.contains("2024,6060,01:41:00"));
        assert!(contents.contains("May,web,5400,01:30:00"));
        Ok(())
    }
}
