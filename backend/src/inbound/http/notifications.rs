//! Notification API handlers.
//!
//! ```text
//! GET  /api/v1/notifications
//! POST /api/v1/notifications/read
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::Error;
use crate::domain::notification::Notification;
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_uuid};

/// Request body for marking notifications read.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadRequestBody {
    /// Notification ids to mark read.
    pub notification_ids: Vec<String>,
}

/// A notification as returned by the API.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponseBody {
    /// Notification id.
    pub id: String,
    /// Short headline.
    pub title: String,
    /// Full message body.
    pub message: String,
    /// Stable kind code.
    pub kind: String,
    /// Referenced entity kind, when any.
    pub related_entity: Option<String>,
    /// Referenced entity id, when any.
    pub related_entity_id: Option<String>,
    /// Whether the user has read it.
    pub read: bool,
    /// Creation time.
    pub created_at: String,
}

fn notification_body(notification: Notification) -> NotificationResponseBody {
    NotificationResponseBody {
        id: notification.id.to_string(),
        title: notification.title,
        message: notification.message,
        kind: notification.kind.to_string(),
        related_entity: notification.related_entity.map(|entity| entity.to_string()),
        related_entity_id: notification.related_entity_id.map(|id| id.to_string()),
        read: notification.read,
        created_at: notification.created_at.to_rfc3339(),
    }
}

/// List the caller's notifications, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    responses(
        (status = 200, description = "Notifications", body = [NotificationResponseBody]),
        (status = 401, description = "Unauthorized", body = Error)
    ),
    tags = ["notifications"],
    operation_id = "listNotifications",
    security(("SessionCookie" = []))
)]
#[get("/notifications")]
pub async fn list_notifications(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<NotificationResponseBody>>> {
    let user_id = session.require_user_id()?;
    let notifications = state.notifications.list(user_id).await?;
    Ok(web::Json(
        notifications.into_iter().map(notification_body).collect(),
    ))
}

/// Mark a set of the caller's notifications read.
#[utoipa::path(
    post,
    path = "/api/v1/notifications/read",
    request_body = MarkReadRequestBody,
    responses(
        (status = 200, description = "Marked read"),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorized", body = Error)
    ),
    tags = ["notifications"],
    operation_id = "markNotificationsRead",
    security(("SessionCookie" = []))
)]
#[post("/notifications/read")]
pub async fn mark_notifications_read(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<MarkReadRequestBody>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let ids = payload
        .into_inner()
        .notification_ids
        .iter()
        .map(|raw| parse_uuid(raw, FieldName::new("notificationIds")))
        .collect::<Result<Vec<_>, _>>()?;

    let updated = state.notifications.mark_read(user_id, ids).await?;
    Ok(HttpResponse::Ok().json(json!({ "updated": updated })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::notification::{NotificationKind, RelatedEntity};
    use crate::inbound::http::test_utils::{TestPorts, test_session_middleware};
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use chrono::Utc;
    use serde_json::Value;
    use uuid::Uuid;

    fn test_app(
        state: HttpState,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new().app_data(web::Data::new(state)).service(
            web::scope("/api/v1")
                .wrap(test_session_middleware())
                .service(list_notifications)
                .service(mark_notifications_read)
                .route(
                    "/test-login/{userId}",
                    web::post().to(
                        |session: crate::inbound::http::session::SessionContext,
                         path: web::Path<String>| async move {
                            let id = Uuid::parse_str(&path.into_inner()).expect("valid uuid");
                            session.persist_user(id)?;
                            Ok::<_, Error>(actix_web::HttpResponse::Ok())
                        },
                    ),
                ),
        )
    }

    async fn login_cookie<S>(app: &S, user_id: Uuid) -> actix_web::cookie::Cookie<'static>
    where
        S: actix_web::dev::Service<
                actix_http::Request,
                Response = actix_web::dev::ServiceResponse,
                Error = actix_web::Error,
            >,
    {
        let res = actix_test::call_service(
            app,
            actix_test::TestRequest::post()
                .uri(&format!("/api/v1/test-login/{user_id}"))
                .to_request(),
        )
        .await;
        res.response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .expect("session cookie")
            .into_owned()
    }

    #[actix_web::test]
    async fn listing_serialises_kind_codes() {
        let caller = Uuid::new_v4();

        let mut ports = TestPorts::default();
        ports
            .notifications
            .expect_list_for_user()
            .return_once(move |user_id| {
                Ok(vec![Notification {
                    id: Uuid::new_v4(),
                    user_id,
                    title: "Badge Earned!".to_owned(),
                    message: "Quick Starter".to_owned(),
                    kind: NotificationKind::BadgeEarned,
                    related_entity: Some(RelatedEntity::Session),
                    related_entity_id: Some(Uuid::new_v4()),
                    read: false,
                    created_at: Utc::now(),
                }])
            });

        let app = actix_test::init_service(test_app(ports.into_state())).await;
        let cookie = login_cookie(&app, caller).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/notifications")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let value: Value = actix_test::read_body_json(res).await;
        let first = &value.as_array().expect("array")[0];
        assert_eq!(first["kind"], "BADGE_EARNED");
        assert_eq!(first["relatedEntity"], "SESSION");
        assert_eq!(first["read"], false);
    }

    #[actix_web::test]
    async fn mark_read_validates_every_id() {
        let caller = Uuid::new_v4();
        let app = actix_test::init_service(test_app(TestPorts::default().into_state())).await;
        let cookie = login_cookie(&app, caller).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/notifications/read")
                .cookie(cookie)
                .set_json(&MarkReadRequestBody {
                    notification_ids: vec!["not-a-uuid".to_owned()],
                })
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
