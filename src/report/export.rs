use crate::database::queries;
use crate::error::Result;
use crate::report::{self, ReportScope, table::Table};
use sqlx::SqlitePool;

/// The complete ledger and roster, projected for the admin backup request.
/// Serialization into concrete file formats stays outside the core.
#[derive(Debug, Clone)]
pub struct FullExport {
    pub attendance: Table,
    pub roster: String,
}

pub async fn full_export(pool: &SqlitePool) -> Result<FullExport> {
    let everything = report::build(pool, ReportScope::All, None, None).await?;
    let attendance = report::table::to_tabular(&everything);

    let accounts = queries::list_accounts(pool).await?;
    let grants = queries::list_grants(pool).await?;

    let mut roster = String::from("کاربران:\n");
    for account in &accounts {
        roster.push_str(&format!(
            "{}\t{}\t@{}\t{}\n",
            account.code_label().unwrap_or_default(),
            account.display(),
            account.handle.clone().unwrap_or_default(),
            account.external_id,
        ));
    }
    roster.push_str("\nادمین‌ها:\n");
    for grant in &grants {
        roster.push_str(&format!("{grant}\n"));
    }

    Ok(FullExport { attendance, roster })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar;
    use crate::database::memory_pool;
    use crate::database::models::EventKind;
    use chrono::TimeZone;

    #[tokio::test]
    async fn export_covers_all_accounts_and_grants() {
        let pool = memory_pool().await;
        let u1 = queries::register_or_get(&pool, 10, "Alice", Some("alice")).await.unwrap();
        let u2 = queries::register_or_get(&pool, 20, "Bob", None).await.unwrap();
        queries::grant_admin(&pool, 10).await.unwrap();

        let day1 = calendar::tehran_offset()
            .with_ymd_and_hms(2024, 8, 3, 8, 0, 0)
            .unwrap()
            .to_utc();
        let day2 = calendar::tehran_offset()
            .with_ymd_and_hms(2024, 8, 4, 9, 0, 0)
            .unwrap()
            .to_utc();
        queries::record(&pool, u1.id, EventKind::Enter, day1).await.unwrap();
        queries::record(&pool, u1.id, EventKind::Enter, day2).await.unwrap();
        queries::record(&pool, u2.id, EventKind::Exit, day1).await.unwrap();

        let export = full_export(&pool).await.unwrap();

        // whole ledger, no period bound
        assert_eq!(export.attendance.rows.len(), 3);
        assert!(export.roster.contains("Alice"));
        assert!(export.roster.contains("@alice"));
        assert!(export.roster.contains("Bob"));
        assert!(export.roster.contains("10"));
    }
}
