pub mod export;
pub mod table;

use crate::calendar;
use crate::database::models::{Account, AttendanceEvent};
use crate::database::queries;
use crate::error::Result;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportScope {
    /// One account, by internal id.
    Account(i64),
    /// Organization-wide.
    All,
}

#[derive(Debug, Clone)]
pub struct ReportGroup {
    pub account: Account,
    pub events: Vec<AttendanceEvent>,
}

/// Ledger events grouped per account: accounts in employee-code order,
/// events ascending by occurrence. Accounts with no events in the period are
/// omitted.
#[derive(Debug, Clone)]
pub struct Report {
    pub scope: ReportScope,
    pub groups: Vec<ReportGroup>,
}

impl Report {
    /// Nothing recorded in the period. A valid outcome, distinct from a
    /// failed target lookup.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Report over the local day containing `at`.
pub async fn daily_report(
    pool: &SqlitePool,
    scope: ReportScope,
    at: DateTime<Utc>,
) -> Result<Report> {
    let (start, end) = calendar::day_bounds(at);
    build(pool, scope, Some(start), Some(end)).await
}

/// Report over one Jalali month.
pub async fn monthly_report(
    pool: &SqlitePool,
    scope: ReportScope,
    year: i32,
    month: u32,
) -> Result<Report> {
    let (start, end) = calendar::month_bounds(year, month)?;
    build(pool, scope, Some(start), Some(end)).await
}

async fn build(
    pool: &SqlitePool,
    scope: ReportScope,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<Report> {
    let account_filter = match scope {
        ReportScope::Account(id) => Some(id),
        ReportScope::All => None,
    };
    let events = queries::events_in_range(pool, account_filter, start, end).await?;
    let accounts = queries::list_accounts(pool).await?;

    let mut groups = Vec::new();
    for account in accounts {
        let own: Vec<AttendanceEvent> = events
            .iter()
            .filter(|event| event.account_id == account.id)
            .cloned()
            .collect();
        if !own.is_empty() {
            groups.push(ReportGroup {
                account,
                events: own,
            });
        }
    }

    Ok(Report { scope, groups })
}
