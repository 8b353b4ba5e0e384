//! Notification read-side use-cases.

use std::sync::Arc;

use uuid::Uuid;

use super::error::Error;
use super::notification::Notification;
use super::ports::{NotificationRepository, NotificationRepositoryError};

fn map_notification_error(error: NotificationRepositoryError) -> Error {
    match error {
        NotificationRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("notification repository unavailable: {message}"))
        }
        NotificationRepositoryError::Query { message } => {
            Error::internal(format!("notification repository error: {message}"))
        }
    }
}

/// Notification service over the notification port.
#[derive(Clone)]
pub struct NotificationService {
    notifications: Arc<dyn NotificationRepository>,
}

impl NotificationService {
    /// Create the service from its port.
    pub fn new(notifications: Arc<dyn NotificationRepository>) -> Self {
        Self { notifications }
    }

    /// The caller's notifications, newest first.
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<Notification>, Error> {
        self.notifications
            .list_for_user(user_id)
            .await
            .map_err(map_notification_error)
    }

    /// Mark a set of the caller's notifications read.
    ///
    /// Returns how many rows changed; ids belonging to other users are
    /// silently ignored.
    pub async fn mark_read(&self, user_id: Uuid, ids: Vec<Uuid>) -> Result<u64, Error> {
        if ids.is_empty() {
            return Err(Error::invalid_request("notification ids are required"));
        }
        self.notifications
            .mark_read(user_id, &ids)
            .await
            .map_err(map_notification_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::MockNotificationRepository;

    #[tokio::test]
    async fn mark_read_rejects_an_empty_id_list() {
        let svc = NotificationService::new(Arc::new(MockNotificationRepository::new()));
        let err = svc
            .mark_read(Uuid::new_v4(), vec![])
            .await
            .expect_err("empty list refused");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn mark_read_reports_updated_rows() {
        let user = Uuid::new_v4();
        let ids = vec![Uuid::new_v4(), Uuid::new_v4()];
        let expected = ids.clone();

        let mut repo = MockNotificationRepository::new();
        repo.expect_mark_read()
            .withf(move |uid, given| *uid == user && given == expected.as_slice())
            .returning(|_, ids| Ok(ids.len() as u64));

        let svc = NotificationService::new(Arc::new(repo));
        assert_eq!(svc.mark_read(user, ids).await.expect("update"), 2);
    }
}
