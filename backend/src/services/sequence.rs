//! Per-organization document number sequences
//!
//! Order and invoice numbers come from a counter row keyed by
//! `(org_id, scope)`. The increment-and-fetch is a single statement so two
//! concurrent creations can never observe the same value.

use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::AppResult;
use shared::validation::format_document_number;

/// Atomically increment and fetch the counter for a scope
pub async fn next_value(conn: &mut PgConnection, org_id: Uuid, scope: &str) -> AppResult<i64> {
    let value = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO sequence_counters (org_id, scope, value)
        VALUES ($1, $2, 1)
        ON CONFLICT (org_id, scope)
        DO UPDATE SET value = sequence_counters.value + 1
        RETURNING value
        "#,
    )
    .bind(org_id)
    .bind(scope)
    .fetch_one(conn)
    .await?;

    Ok(value)
}

/// Next formatted document number for a prefix, e.g. `PO-000042`.
/// The prefix doubles as the counter scope.
pub async fn next_document_number(
    conn: &mut PgConnection,
    org_id: Uuid,
    prefix: &str,
) -> AppResult<String> {
    let value = next_value(conn, org_id, prefix).await?;
    Ok(format_document_number(prefix, value))
}
