use sqlx::PgPool;

use crate::error::Result;

/// Create every table and index the game store needs. Safe to run twice.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::raw_sql(include_str!("../../sql/schema.sql"))
        .execute(pool)
        .await?;
    Ok(())
}
