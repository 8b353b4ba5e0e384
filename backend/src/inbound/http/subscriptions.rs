//! Subscription API handlers.
//!
//! ```text
//! GET  /api/v1/subscription/plans
//! POST /api/v1/subscription/subscribe
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::phone::PhoneNumber;
use crate::domain::subscription::SubscriptionPlan;
use crate::domain::{Error, SubscribeOutcome};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_uuid};

/// Request body for subscribing to a plan.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequestBody {
    /// Target plan id.
    pub plan_id: String,
    /// Subscriber number; required for paid plans.
    pub phone_number: Option<String>,
}

/// A plan as returned by the API.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanResponseBody {
    /// Plan id.
    pub id: String,
    /// Plan name.
    pub name: String,
    /// Marketing description.
    pub description: String,
    /// Monthly price in whole KES.
    pub price_monthly_kes: i64,
    /// Yearly price in whole KES.
    pub price_yearly_kes: i64,
    /// Weekly session allowance.
    pub max_sessions_per_week: i32,
    /// Private team creation unlocked.
    pub can_create_private_teams: bool,
    /// Priority booking unlocked.
    pub has_priority_booking: bool,
    /// Advanced analytics unlocked.
    pub has_advanced_analytics: bool,
}

fn plan_body(plan: SubscriptionPlan) -> PlanResponseBody {
    PlanResponseBody {
        id: plan.id.to_string(),
        name: plan.name,
        description: plan.description,
        price_monthly_kes: plan.price_monthly_kes,
        price_yearly_kes: plan.price_yearly_kes,
        max_sessions_per_week: plan.max_sessions_per_week,
        can_create_private_teams: plan.can_create_private_teams,
        has_priority_booking: plan.has_priority_booking,
        has_advanced_analytics: plan.has_advanced_analytics,
    }
}

/// List all plans.
#[utoipa::path(
    get,
    path = "/api/v1/subscription/plans",
    responses(
        (status = 200, description = "Plans", body = [PlanResponseBody]),
        (status = 401, description = "Unauthorized", body = Error)
    ),
    tags = ["subscriptions"],
    operation_id = "listPlans",
    security(("SessionCookie" = []))
)]
#[get("/subscription/plans")]
pub async fn list_plans(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<PlanResponseBody>>> {
    session.require_user_id()?;
    let plans = state.subscriptions.plans().await?;
    Ok(web::Json(plans.into_iter().map(plan_body).collect()))
}

/// Subscribe the caller to a plan.
///
/// Free plans activate immediately; paid plans answer with
/// `requiresPayment = true` and the pending payment the STK push belongs to.
#[utoipa::path(
    post,
    path = "/api/v1/subscription/subscribe",
    request_body = SubscribeRequestBody,
    responses(
        (status = 200, description = "Activated or payment initiated"),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 503, description = "Payment provider unavailable", body = Error)
    ),
    tags = ["subscriptions"],
    operation_id = "subscribe",
    security(("SessionCookie" = []))
)]
#[post("/subscription/subscribe")]
pub async fn subscribe(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SubscribeRequestBody>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let body = payload.into_inner();
    let plan_id = parse_uuid(&body.plan_id, FieldName::new("planId"))?;
    let phone = body
        .phone_number
        .as_deref()
        .map(|raw| {
            PhoneNumber::new(raw).map_err(|err| {
                Error::invalid_request(err.to_string())
                    .with_details(json!({ "field": "phoneNumber", "value": raw }))
            })
        })
        .transpose()?;

    match state.subscriptions.subscribe(user_id, plan_id, phone).await? {
        SubscribeOutcome::Activated(subscription) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "requiresPayment": false,
            "subscription": {
                "id": subscription.id.to_string(),
                "planId": subscription.plan_id.to_string(),
                "startDate": subscription.start_date.to_rfc3339(),
                "endDate": subscription.end_date.map(|at| at.to_rfc3339()),
                "billingCycle": subscription.billing_cycle.to_string(),
                "paymentMethod": subscription.payment_method.to_string(),
            },
        }))),
        SubscribeOutcome::PaymentRequired(payment) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "requiresPayment": true,
            "payment": {
                "id": payment.id.to_string(),
                "amountKes": payment.amount_kes,
                "currency": payment.currency,
                "status": payment.status.to_string(),
                "checkoutRequestId": payment.checkout_request_id,
            },
            "message": "Please complete the payment to activate your subscription",
        }))),
    }
}
