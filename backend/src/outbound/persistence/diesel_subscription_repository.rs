//! PostgreSQL-backed `SubscriptionRepository` implementation using Diesel.
//!
//! Activation deactivates any predecessor inside the same transaction so the
//! one-active-subscription-per-user invariant holds under concurrent calls.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{SubscriptionRepository, SubscriptionRepositoryError};
use crate::domain::subscription::{
    BASIC_PLAN_NAME, BillingCycle, PaymentMethod, SubscriptionPlan, UserSubscription,
    monthly_term_end,
};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{NewPlanRow, NewSubscriptionRow, PlanRow, SubscriptionRow};
use super::pool::{DbPool, PoolError};
use super::schema::{subscription_plans, user_subscriptions};

/// Diesel-backed implementation of the subscription repository port.
#[derive(Clone)]
pub struct DieselSubscriptionRepository {
    pool: DbPool,
}

impl DieselSubscriptionRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool(error: PoolError) -> SubscriptionRepositoryError {
    map_pool_error(error, SubscriptionRepositoryError::connection)
}

fn map_diesel(error: diesel::result::Error) -> SubscriptionRepositoryError {
    map_diesel_error(
        error,
        SubscriptionRepositoryError::query,
        SubscriptionRepositoryError::connection,
    )
}

fn row_to_plan(row: PlanRow) -> SubscriptionPlan {
    SubscriptionPlan {
        id: row.id,
        name: row.name,
        description: row.description,
        price_monthly_kes: row.price_monthly_kes,
        price_yearly_kes: row.price_yearly_kes,
        max_sessions_per_week: row.max_sessions_per_week,
        can_create_private_teams: row.can_create_private_teams,
        has_priority_booking: row.has_priority_booking,
        has_advanced_analytics: row.has_advanced_analytics,
    }
}

fn row_to_subscription(
    row: SubscriptionRow,
) -> Result<UserSubscription, SubscriptionRepositoryError> {
    Ok(UserSubscription {
        id: row.id,
        user_id: row.user_id,
        plan_id: row.plan_id,
        start_date: row.start_date,
        end_date: row.end_date,
        is_active: row.is_active,
        billing_cycle: BillingCycle::from_str(&row.billing_cycle).map_err(|err| {
            SubscriptionRepositoryError::query(format!("stored billing cycle invalid: {err}"))
        })?,
        payment_method: PaymentMethod::from_str(&row.payment_method).map_err(|err| {
            SubscriptionRepositoryError::query(format!("stored payment method invalid: {err}"))
        })?,
    })
}

#[async_trait]
impl SubscriptionRepository for DieselSubscriptionRepository {
    async fn list_plans(&self) -> Result<Vec<SubscriptionPlan>, SubscriptionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let rows: Vec<PlanRow> = subscription_plans::table
            .order(subscription_plans::price_monthly_kes.asc())
            .select(PlanRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        Ok(rows.into_iter().map(row_to_plan).collect())
    }

    async fn find_plan(
        &self,
        id: Uuid,
    ) -> Result<Option<SubscriptionPlan>, SubscriptionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let row = subscription_plans::table
            .find(id)
            .select(PlanRow::as_select())
            .first::<PlanRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;

        Ok(row.map(row_to_plan))
    }

    async fn ensure_basic_plan(
        &self,
    ) -> Result<SubscriptionPlan, SubscriptionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let existing = subscription_plans::table
            .filter(subscription_plans::name.eq(BASIC_PLAN_NAME))
            .select(PlanRow::as_select())
            .first::<PlanRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;

        if let Some(row) = existing {
            return Ok(row_to_plan(row));
        }

        let seed = NewPlanRow {
            id: Uuid::new_v4(),
            name: BASIC_PLAN_NAME,
            description: "Perfect for getting started",
            price_monthly_kes: 0,
            price_yearly_kes: 0,
            max_sessions_per_week: 2,
            can_create_private_teams: false,
            has_priority_booking: false,
            has_advanced_analytics: false,
        };
        let row = diesel::insert_into(subscription_plans::table)
            .values(&seed)
            .returning(PlanRow::as_returning())
            .get_result::<PlanRow>(&mut conn)
            .await
            .map_err(map_diesel)?;

        Ok(row_to_plan(row))
    }

    async fn activate(
        &self,
        user_id: Uuid,
        plan_id: Uuid,
        billing_cycle: BillingCycle,
        payment_method: PaymentMethod,
    ) -> Result<UserSubscription, SubscriptionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let now = Utc::now();

        let new_subscription = NewSubscriptionRow {
            id: Uuid::new_v4(),
            user_id,
            plan_id,
            start_date: now,
            end_date: Some(monthly_term_end(now)),
            is_active: true,
            billing_cycle: billing_cycle.as_str(),
            payment_method: payment_method.as_str(),
        };

        let row = conn
            .transaction::<SubscriptionRow, diesel::result::Error, _>(|conn| {
                async move {
                    diesel::update(
                        user_subscriptions::table
                            .filter(user_subscriptions::user_id.eq(user_id))
                            .filter(user_subscriptions::is_active.eq(true)),
                    )
                    .set((
                        user_subscriptions::is_active.eq(false),
                        user_subscriptions::end_date.eq(Some(now)),
                    ))
                    .execute(conn)
                    .await?;

                    diesel::insert_into(user_subscriptions::table)
                        .values(&new_subscription)
                        .returning(SubscriptionRow::as_returning())
                        .get_result::<SubscriptionRow>(conn)
                        .await
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel)?;

        row_to_subscription(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn subscription_row_parses_enums() {
        let row = SubscriptionRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            plan_id: Uuid::new_v4(),
            start_date: Utc::now(),
            end_date: None,
            is_active: true,
            billing_cycle: "MONTHLY".to_owned(),
            payment_method: "MPESA".to_owned(),
        };
        let subscription = row_to_subscription(row).expect("valid row converts");
        assert_eq!(subscription.billing_cycle, BillingCycle::Monthly);
        assert_eq!(subscription.payment_method, PaymentMethod::Mpesa);
    }

    #[rstest]
    fn subscription_row_rejects_unknown_cycle() {
        let row = SubscriptionRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            plan_id: Uuid::new_v4(),
            start_date: Utc::now(),
            end_date: None,
            is_active: true,
            billing_cycle: "WEEKLY".to_owned(),
            payment_method: "MPESA".to_owned(),
        };
        assert!(row_to_subscription(row).is_err());
    }
}
