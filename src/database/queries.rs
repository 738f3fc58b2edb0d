use crate::calendar;
use crate::database::models::{Account, AttendanceEvent, EventKind};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

const ACCOUNT_COLUMNS: &str =
    "id, external_id, full_name, handle, display_name, employee_code, created_at";
const EVENT_COLUMNS: &str = "id, account_id, kind, occurred_at, local_day, created_at";

fn map_account(row: &SqliteRow) -> Account {
    Account {
        id: row.get("id"),
        external_id: row.get("external_id"),
        full_name: row.get("full_name"),
        handle: row.get("handle"),
        display_name: row.get("display_name"),
        employee_code: row.get("employee_code"),
        created_at: row.get("created_at"),
    }
}

fn map_event(row: &SqliteRow) -> AttendanceEvent {
    AttendanceEvent {
        id: row.get("id"),
        account_id: row.get("account_id"),
        kind: row.get("kind"),
        occurred_at: row.get("occurred_at"),
        local_day: row.get("local_day"),
        created_at: row.get("created_at"),
    }
}

// Account queries

/// Idempotent first-contact provisioning. The upsert and the employee code
/// assignment are one statement, so concurrent first contacts for the same
/// caller produce exactly one row and codes stay unique and monotone.
/// The display name is seeded from the hint only on first contact.
pub async fn register_or_get(
    pool: &SqlitePool,
    external_id: i64,
    full_name: &str,
    handle: Option<&str>,
) -> Result<Account> {
    sqlx::query(
        "INSERT INTO accounts (external_id, full_name, handle, display_name, employee_code) \
         VALUES (?, ?, ?, ?, (SELECT COALESCE(MAX(employee_code), 0) + 1 FROM accounts)) \
         ON CONFLICT(external_id) DO NOTHING",
    )
    .bind(external_id)
    .bind(full_name)
    .bind(handle)
    .bind(full_name)
    .execute(pool)
    .await?;

    account_by_external_id(pool, external_id).await
}

pub async fn account_by_external_id(pool: &SqlitePool, external_id: i64) -> Result<Account> {
    let row = sqlx::query(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE external_id = ?"
    ))
    .bind(external_id)
    .fetch_one(pool)
    .await?;

    Ok(map_account(&row))
}

pub async fn account_by_id(pool: &SqlitePool, id: i64) -> Result<Account> {
    let row = sqlx::query(&format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?"))
        .bind(id)
        .fetch_one(pool)
        .await?;

    Ok(map_account(&row))
}

/// Resolve an admin-supplied target token: the employee code is tried first,
/// then the platform id.
pub async fn resolve_account(pool: &SqlitePool, token: &str) -> Result<Account> {
    let id: i64 = token
        .trim()
        .parse()
        .map_err(|_| Error::Validation(format!("target must be numeric: {}", token.trim())))?;

    let row = sqlx::query(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE employee_code = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    if let Some(row) = row {
        return Ok(map_account(&row));
    }

    let row = sqlx::query(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE external_id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(|row| map_account(&row))
        .ok_or_else(|| Error::NotFound(token.trim().to_string()))
}

/// Unconditional overwrite; all subsequent reads see the new name.
pub async fn set_display_name(pool: &SqlitePool, account_id: i64, name: &str) -> Result<()> {
    sqlx::query("UPDATE accounts SET display_name = ? WHERE id = ?")
        .bind(name)
        .bind(account_id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn list_accounts(pool: &SqlitePool) -> Result<Vec<Account>> {
    let rows = sqlx::query(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY employee_code, id"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(map_account).collect())
}

// Admin grant queries

pub async fn grant_admin(pool: &SqlitePool, external_id: i64) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO admin_grants (external_id) VALUES (?)")
        .bind(external_id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn is_granted(pool: &SqlitePool, external_id: i64) -> Result<bool> {
    let row = sqlx::query("SELECT 1 FROM admin_grants WHERE external_id = ?")
        .bind(external_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.is_some())
}

pub async fn list_grants(pool: &SqlitePool) -> Result<Vec<i64>> {
    let rows = sqlx::query("SELECT external_id FROM admin_grants ORDER BY external_id")
        .fetch_all(pool)
        .await?;

    Ok(rows.iter().map(|row| row.get("external_id")).collect())
}

// Attendance ledger queries

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Recorded(DateTime<Utc>),
    AlreadyRecordedToday,
}

/// Append one attendance event. At most one event per (account, kind, local
/// day) may exist; the uniqueness constraint is the only enforcement point,
/// so the check cannot race with the insert.
pub async fn record(
    pool: &SqlitePool,
    account_id: i64,
    kind: EventKind,
    at: DateTime<Utc>,
) -> Result<RecordOutcome> {
    let local_day = calendar::local_day(at);

    let result = sqlx::query(
        "INSERT INTO attendance_events (account_id, kind, occurred_at, local_day) \
         VALUES (?, ?, ?, ?)",
    )
    .bind(account_id)
    .bind(kind.as_str())
    .bind(at)
    .bind(local_day)
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(RecordOutcome::Recorded(at)),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Ok(RecordOutcome::AlreadyRecordedToday)
        }
        Err(e) => Err(e.into()),
    }
}

/// Events within `[start, end)`, ascending by occurrence. Omitted bounds are
/// unbounded; omitted account means every account.
pub async fn events_in_range(
    pool: &SqlitePool,
    account_id: Option<i64>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<Vec<AttendanceEvent>> {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "SELECT {EVENT_COLUMNS} FROM attendance_events WHERE 1 = 1"
    ));
    if let Some(account_id) = account_id {
        builder.push(" AND account_id = ").push_bind(account_id);
    }
    if let Some(start) = start {
        builder.push(" AND occurred_at >= ").push_bind(start);
    }
    if let Some(end) = end {
        builder.push(" AND occurred_at < ").push_bind(end);
    }
    builder.push(" ORDER BY occurred_at, id");

    let rows = builder.build().fetch_all(pool).await?;

    Ok(rows.iter().map(map_event).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory_pool;
    use chrono::TimeZone;
    use std::collections::HashSet;

    fn tehran(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        calendar::tehran_offset()
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .unwrap()
            .to_utc()
    }

    #[tokio::test]
    async fn provisioning_is_idempotent() {
        let pool = memory_pool().await;

        let first = register_or_get(&pool, 100, "Alice", Some("alice")).await.unwrap();
        let second = register_or_get(&pool, 100, "Someone Else", None).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.full_name, "Alice");
        assert_eq!(second.display_name, "Alice");
        assert_eq!(second.employee_code, Some(1));
        assert_eq!(list_accounts(&pool).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_first_contacts_yield_one_account() {
        let pool = memory_pool().await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let pool = pool.clone();
            handles.push(tokio::spawn(async move {
                register_or_get(&pool, 42, "Alice", None).await.unwrap()
            }));
        }

        let mut ids = HashSet::new();
        for handle in handles {
            ids.insert(handle.await.unwrap().id);
        }
        assert_eq!(ids.len(), 1);
        assert_eq!(list_accounts(&pool).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_contacts_get_distinct_sequential_codes() {
        let pool = memory_pool().await;

        let mut handles = Vec::new();
        for caller in 1..=10i64 {
            let pool = pool.clone();
            handles.push(tokio::spawn(async move {
                register_or_get(&pool, caller, "User", None).await.unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let codes: Vec<i64> = list_accounts(&pool)
            .await
            .unwrap()
            .iter()
            .map(|a| a.employee_code.unwrap())
            .collect();
        assert_eq!(codes, (1..=10).collect::<Vec<i64>>());
    }

    #[tokio::test]
    async fn same_kind_same_day_is_refused() {
        let pool = memory_pool().await;
        let account = register_or_get(&pool, 1, "Alice", None).await.unwrap();

        let first = record(&pool, account.id, EventKind::Enter, tehran(2024, 8, 3, 8, 0))
            .await
            .unwrap();
        assert!(matches!(first, RecordOutcome::Recorded(_)));

        let second = record(&pool, account.id, EventKind::Enter, tehran(2024, 8, 3, 9, 0))
            .await
            .unwrap();
        assert_eq!(second, RecordOutcome::AlreadyRecordedToday);

        let events = events_in_range(&pool, Some(account.id), None, None).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].occurred_at, tehran(2024, 8, 3, 8, 0));
    }

    #[tokio::test]
    async fn other_kind_or_day_is_recorded() {
        let pool = memory_pool().await;
        let account = register_or_get(&pool, 1, "Alice", None).await.unwrap();

        record(&pool, account.id, EventKind::Enter, tehran(2024, 8, 3, 8, 0))
            .await
            .unwrap();
        let exit = record(&pool, account.id, EventKind::Exit, tehran(2024, 8, 3, 18, 0))
            .await
            .unwrap();
        assert!(matches!(exit, RecordOutcome::Recorded(_)));

        let next_day = record(&pool, account.id, EventKind::Enter, tehran(2024, 8, 4, 8, 0))
            .await
            .unwrap();
        assert!(matches!(next_day, RecordOutcome::Recorded(_)));

        let events = events_in_range(&pool, Some(account.id), None, None).await.unwrap();
        assert_eq!(events.len(), 3);
    }

    #[tokio::test]
    async fn dedup_follows_local_day_not_utc_day() {
        let pool = memory_pool().await;
        let account = register_or_get(&pool, 1, "Alice", None).await.unwrap();

        // 23:00 and next 01:00 Tehran time straddle a single UTC day but are
        // two local days, so both records must land.
        record(&pool, account.id, EventKind::Enter, tehran(2024, 8, 3, 23, 0))
            .await
            .unwrap();
        let outcome = record(&pool, account.id, EventKind::Enter, tehran(2024, 8, 4, 1, 0))
            .await
            .unwrap();
        assert!(matches!(outcome, RecordOutcome::Recorded(_)));
    }

    #[tokio::test]
    async fn range_query_is_half_open_and_ordered() {
        let pool = memory_pool().await;
        let account = register_or_get(&pool, 1, "Alice", None).await.unwrap();

        let start = tehran(2024, 8, 3, 0, 0);
        let end = tehran(2024, 8, 4, 0, 0);
        record(&pool, account.id, EventKind::Exit, tehran(2024, 8, 3, 18, 0))
            .await
            .unwrap();
        record(&pool, account.id, EventKind::Enter, tehran(2024, 8, 3, 8, 0))
            .await
            .unwrap();
        // exactly at the end bound: excluded
        record(&pool, account.id, EventKind::Enter, end).await.unwrap();

        let events = events_in_range(&pool, Some(account.id), Some(start), Some(end))
            .await
            .unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, "enter");
        assert_eq!(events[1].kind, "exit");
        assert!(events[0].occurred_at < events[1].occurred_at);
    }

    #[tokio::test]
    async fn display_name_overwrite_wins_all_reads() {
        let pool = memory_pool().await;
        let account = register_or_get(&pool, 1, "Alice Original", None).await.unwrap();

        set_display_name(&pool, account.id, "Alice").await.unwrap();

        let reloaded = account_by_id(&pool, account.id).await.unwrap();
        assert_eq!(reloaded.display(), "Alice");
    }

    #[tokio::test]
    async fn resolve_prefers_employee_code() {
        let pool = memory_pool().await;
        // external id 2 collides with the second account's employee code
        let first = register_or_get(&pool, 2000, "First", None).await.unwrap();
        let second = register_or_get(&pool, 2, "Second", None).await.unwrap();
        assert_eq!(first.employee_code, Some(1));
        assert_eq!(second.employee_code, Some(2));

        let by_code = resolve_account(&pool, "2").await.unwrap();
        assert_eq!(by_code.id, second.id);

        let by_external = resolve_account(&pool, "2000").await.unwrap();
        assert_eq!(by_external.id, first.id);
    }

    #[tokio::test]
    async fn resolve_failures_are_typed() {
        let pool = memory_pool().await;

        assert!(matches!(
            resolve_account(&pool, "abc").await,
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            resolve_account(&pool, "99").await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn grants_are_idempotent() {
        let pool = memory_pool().await;

        assert!(!is_granted(&pool, 5).await.unwrap());
        grant_admin(&pool, 5).await.unwrap();
        grant_admin(&pool, 5).await.unwrap();
        assert!(is_granted(&pool, 5).await.unwrap());
        assert_eq!(list_grants(&pool).await.unwrap(), vec![5]);
    }
}
