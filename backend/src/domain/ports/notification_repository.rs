//! Port for notification persistence.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::notification::{NewNotification, Notification};

use super::macros::define_port_error;

define_port_error! {
    /// Errors raised by notification repository adapters.
    pub enum NotificationRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "notification repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "notification repository query failed: {message}",
    }
}

/// Port for notification reads and writes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Insert one notification.
    async fn insert(
        &self,
        notification: &NewNotification,
    ) -> Result<(), NotificationRepositoryError>;

    /// Insert a batch of notifications.
    async fn insert_many(
        &self,
        notifications: &[NewNotification],
    ) -> Result<(), NotificationRepositoryError>;

    /// The user's notifications, newest first.
    async fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Notification>, NotificationRepositoryError>;

    /// Mark the given notifications read for their owner.
    ///
    /// Returns the number of rows updated; ids not owned by `user_id` are
    /// ignored.
    async fn mark_read(
        &self,
        user_id: Uuid,
        notification_ids: &[Uuid],
    ) -> Result<u64, NotificationRepositoryError>;
}
