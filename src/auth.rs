use crate::database::queries;
use crate::error::Result;
use sqlx::SqlitePool;

/// True iff the caller is the bootstrap super-admin or holds a stored grant.
/// The bootstrap identity is privileged regardless of the grant table.
pub async fn is_privileged(pool: &SqlitePool, super_admin: i64, external_id: i64) -> Result<bool> {
    if external_id == super_admin {
        return Ok(true);
    }
    queries::is_granted(pool, external_id).await
}

/// Mirror the bootstrap identity into the grant table so roster exports list
/// it. Idempotent; privilege never depends on this row.
pub async fn seed_super_admin(pool: &SqlitePool, super_admin: i64) -> Result<()> {
    queries::grant_admin(pool, super_admin).await
}
