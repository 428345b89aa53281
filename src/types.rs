use std::collections::BTreeMap;

use chrono::{DateTime, Local, NaiveDate};

pub type OrganizationId = u32;
pub type ProjectId = u32;
pub type WorkSessionId = u32;

/// Date format used for the `date` columns.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
    pub favorite: bool,
    pub created_at: DateTime<Local>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Project {
    pub id: ProjectId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub favorite: bool,
    pub created_at: DateTime<Local>,
}

/// Seconds logged against a project on a given date.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkSession {
    pub id: WorkSessionId,
    pub project_id: ProjectId,
    pub date: NaiveDate,
    pub seconds: i64,
    pub created_at: DateTime<Local>,
}

/// Anything that shows up in a selectable list with a favorite star.
pub trait Listed {
    fn name(&self) -> &str;
    fn favorite(&self) -> bool;
}

impl Listed for Organization {
    fn name(&self) -> &str {
        &self.name
    }
    fn favorite(&self) -> bool {
        self.favorite
    }
}

impl Listed for Project {
    fn name(&self) -> &str {
        &self.name
    }
    fn favorite(&self) -> bool {
        self.favorite
    }
}

/// Favorites first, then case-insensitive by name.
pub fn sort_listed<T: Listed>(items: &mut [T]) {
    items.sort_by(|a, b| {
        b.favorite()
            .cmp(&a.favorite())
            .then_with(|| a.name().to_lowercase().cmp(&b.name().to_lowercase()))
    });
}

/// Snapshot of the host's timer, used to restore the client after a restart.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActiveTimer {
    pub running: bool,
    pub organization: Option<Organization>,
    pub project: Option<Project>,
    pub elapsed: u64,
    /// Part of `elapsed` already written to work hours.
    pub saved: u64,
}

/// Cached day/week/month totals, in seconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorkTotals {
    pub day: i64,
    pub week: i64,
    pub month: i64,
}

impl WorkTotals {
    pub fn add_to_day(&mut self, seconds: i64) {
        self.day += seconds;
    }

    /// Folds a finished segment into the longer ranges.
    pub fn flush(&mut self, seconds: i64) {
        self.week += seconds;
        self.month += seconds;
    }
}

/// month (1-12) -> project name -> seconds
pub type MonthlyBreakdown = BTreeMap<u32, BTreeMap<String, i64>>;
/// date -> project name -> seconds
pub type DailyBreakdown = BTreeMap<NaiveDate, BTreeMap<String, i64>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Csv,
}

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub fn month_name(month: u32) -> &'static str {
    MONTH_NAMES
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("Unknown")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(name: &str, favorite: bool) -> Project {
        Project {
            id: 1,
            organization_id: 1,
            name: name.to_string(),
            favorite,
            created_at: Local::now(),
        }
    }

    #[test]
    fn favorites_sort_first_then_by_name() {
        let mut projects = vec![
            project("beta", false),
            project("Zulu", true),
            project("alpha", false),
            project("Alpha2", true),
        ];
        sort_listed(&mut projects);
        let names: Vec<_> = projects.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha2", "Zulu", "alpha", "beta"]);
    }

    #[test]
    fn flush_only_touches_week_and_month() {
        let mut totals = WorkTotals {
            day: 10,
            week: 20,
            month: 30,
        };
        totals.flush(5);
        assert_eq!(
            totals,
            WorkTotals {
                day: 10,
                week: 25,
                month: 35
            }
        );
    }

    #[test]
    fn month_names_are_one_based() {
        assert_eq!(month_name(1), "January");
        assert_eq!(month_name(12), "December");
        assert_eq!(month_name(13), "Unknown");
    }
}
