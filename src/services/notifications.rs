//! Notification outbox
//!
//! Job events are written to the `notifications` table inside the same
//! transaction as the change that produced them. Delivery (push, SMS, email)
//! reads from this table and is not part of this service.

use chrono::Utc;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::domain::JobEvent;
use crate::store::notification_from;

/// Record an event as a notification row on an open connection or transaction
pub async fn record_event(conn: &mut PgConnection, event: &JobEvent) -> Result<Uuid, sqlx::Error> {
    let row = notification_from(event, Utc::now());

    sqlx::query(
        r#"
        INSERT INTO notifications (id, user_id, job_id, type, title, message, data, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(row.id)
    .bind(row.user_id)
    .bind(row.job_id)
    .bind(&row.notification_type)
    .bind(&row.title)
    .bind(&row.message)
    .bind(&row.data)
    .bind(row.created_at)
    .execute(conn)
    .await?;

    tracing::debug!(
        notification_id = %row.id,
        notification_type = %row.notification_type,
        recipient = ?row.user_id,
        "Notification recorded"
    );

    Ok(row.id)
}
