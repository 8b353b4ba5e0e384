//! PostgreSQL-backed `NotificationRepository` implementation using Diesel.

use std::str::FromStr;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::notification::{
    NewNotification, Notification, NotificationKind, RelatedEntity,
};
use crate::domain::ports::{NotificationRepository, NotificationRepositoryError};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{NewNotificationRow, NotificationRow};
use super::pool::{DbPool, PoolError};
use super::schema::notifications;

/// Diesel-backed implementation of the notification repository port.
#[derive(Clone)]
pub struct DieselNotificationRepository {
    pool: DbPool,
}

impl DieselNotificationRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool(error: PoolError) -> NotificationRepositoryError {
    map_pool_error(error, NotificationRepositoryError::connection)
}

fn map_diesel(error: diesel::result::Error) -> NotificationRepositoryError {
    map_diesel_error(
        error,
        NotificationRepositoryError::query,
        NotificationRepositoryError::connection,
    )
}

fn row_to_notification(
    row: NotificationRow,
) -> Result<Notification, NotificationRepositoryError> {
    let related_entity = row
        .related_entity
        .as_deref()
        .map(RelatedEntity::from_str)
        .transpose()
        .map_err(|err| {
            NotificationRepositoryError::query(format!("stored related entity invalid: {err}"))
        })?;

    Ok(Notification {
        id: row.id,
        user_id: row.user_id,
        title: row.title,
        message: row.message,
        kind: NotificationKind::from_str(&row.kind).map_err(|err| {
            NotificationRepositoryError::query(format!(
                "stored notification kind invalid: {err}"
            ))
        })?,
        related_entity,
        related_entity_id: row.related_entity_id,
        read: row.read,
        created_at: row.created_at,
    })
}

fn to_rows(notifications_batch: &[NewNotification]) -> Vec<NewNotificationRow<'_>> {
    notifications_batch
        .iter()
        .map(|notification| NewNotificationRow {
            id: Uuid::new_v4(),
            user_id: notification.user_id,
            title: &notification.title,
            message: &notification.message,
            kind: notification.kind.as_str(),
            related_entity: notification.related_entity.map(RelatedEntity::as_str),
            related_entity_id: notification.related_entity_id,
        })
        .collect()
}

#[async_trait]
impl NotificationRepository for DieselNotificationRepository {
    async fn insert(
        &self,
        notification: &NewNotification,
    ) -> Result<(), NotificationRepositoryError> {
        self.insert_many(std::slice::from_ref(notification)).await
    }

    async fn insert_many(
        &self,
        notifications_batch: &[NewNotification],
    ) -> Result<(), NotificationRepositoryError> {
        if notifications_batch.is_empty() {
            return Ok(());
        }
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let rows = to_rows(notifications_batch);
        diesel::insert_into(notifications::table)
            .values(&rows)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel)
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Notification>, NotificationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let rows: Vec<NotificationRow> = notifications::table
            .filter(notifications::user_id.eq(user_id))
            .order(notifications::created_at.desc())
            .select(NotificationRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        rows.into_iter().map(row_to_notification).collect()
    }

    async fn mark_read(
        &self,
        user_id: Uuid,
        notification_ids: &[Uuid],
    ) -> Result<u64, NotificationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let updated = diesel::update(
            notifications::table
                .filter(notifications::user_id.eq(user_id))
                .filter(notifications::id.eq_any(notification_ids)),
        )
        .set(notifications::read.eq(true))
        .execute(&mut conn)
        .await
        .map_err(map_diesel)?;

        Ok(updated as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rstest::rstest;

    #[rstest]
    fn notification_row_parses_kind_and_entity() {
        let row = NotificationRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Badge Earned!".to_owned(),
            message: "m".to_owned(),
            kind: "BADGE_EARNED".to_owned(),
            related_entity: Some("TEAM".to_owned()),
            related_entity_id: Some(Uuid::new_v4()),
            read: false,
            created_at: Utc::now(),
        };
        let notification = row_to_notification(row).expect("valid row converts");
        assert_eq!(notification.kind, NotificationKind::BadgeEarned);
        assert_eq!(notification.related_entity, Some(RelatedEntity::Team));
    }

    #[rstest]
    fn batch_conversion_generates_fresh_ids() {
        let note = NewNotification::plain(
            Uuid::new_v4(),
            NotificationKind::TeamMessage,
            "New Team Message",
            "hello",
        );
        let notes = [note.clone(), note];
        let rows = to_rows(&notes);
        assert_eq!(rows.len(), 2);
        assert_ne!(rows[0].id, rows[1].id);
    }
}
