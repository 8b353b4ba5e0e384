//! PostgreSQL-backed `PaymentRepository` implementation using Diesel.
//!
//! Settlement updates are filtered on `status = PENDING`; the affected row
//! count tells the caller whether the transition applied, which is what makes
//! callback replays harmless.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::payment::{PaymentStatus, SubscriptionPayment, TeamPayment};
use crate::domain::phone::PhoneNumber;
use crate::domain::ports::{
    NewSubscriptionPayment, NewTeamPayment, PaymentRepository, PaymentRepositoryError,
};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{
    NewSubscriptionPaymentRow, NewTeamPaymentRow, SubscriptionPaymentRow, TeamPaymentRow,
};
use super::pool::{DbPool, PoolError};
use super::schema::{subscription_payments, team_payments};

/// Currency recorded on every payment row.
const CURRENCY: &str = "KES";

/// Diesel-backed implementation of the payment repository port.
#[derive(Clone)]
pub struct DieselPaymentRepository {
    pool: DbPool,
}

impl DieselPaymentRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool(error: PoolError) -> PaymentRepositoryError {
    map_pool_error(error, PaymentRepositoryError::connection)
}

fn map_diesel(error: diesel::result::Error) -> PaymentRepositoryError {
    map_diesel_error(
        error,
        PaymentRepositoryError::query,
        PaymentRepositoryError::connection,
    )
}

fn parse_status(value: &str) -> Result<PaymentStatus, PaymentRepositoryError> {
    PaymentStatus::from_str(value).map_err(|err| {
        PaymentRepositoryError::query(format!("stored payment status invalid: {err}"))
    })
}

fn parse_phone(value: &str) -> Result<PhoneNumber, PaymentRepositoryError> {
    PhoneNumber::new(value).map_err(|err| {
        PaymentRepositoryError::query(format!("stored phone number invalid: {err}"))
    })
}

fn row_to_subscription_payment(
    row: SubscriptionPaymentRow,
) -> Result<SubscriptionPayment, PaymentRepositoryError> {
    Ok(SubscriptionPayment {
        id: row.id,
        user_id: row.user_id,
        plan_id: row.plan_id,
        amount_kes: row.amount_kes,
        currency: row.currency,
        status: parse_status(&row.status)?,
        phone_number: parse_phone(&row.phone_number)?,
        checkout_request_id: row.checkout_request_id,
        receipt_number: row.receipt_number,
        completed_at: row.completed_at,
        created_at: row.created_at,
    })
}

fn row_to_team_payment(row: TeamPaymentRow) -> Result<TeamPayment, PaymentRepositoryError> {
    Ok(TeamPayment {
        id: row.id,
        team_id: row.team_id,
        user_id: row.user_id,
        amount_kes: row.amount_kes,
        status: parse_status(&row.status)?,
        phone_number: parse_phone(&row.phone_number)?,
        checkout_request_id: row.checkout_request_id,
        receipt_number: row.receipt_number,
        completed_at: row.completed_at,
        created_at: row.created_at,
    })
}

#[async_trait]
impl PaymentRepository for DieselPaymentRepository {
    async fn create_subscription_payment(
        &self,
        record: &NewSubscriptionPayment,
    ) -> Result<SubscriptionPayment, PaymentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let new_row = NewSubscriptionPaymentRow {
            id: record.id,
            user_id: record.user_id,
            plan_id: record.plan_id,
            amount_kes: record.amount_kes,
            currency: CURRENCY,
            status: PaymentStatus::Pending.as_str(),
            phone_number: record.phone_number.as_str(),
            checkout_request_id: &record.checkout_request_id,
        };
        let row = diesel::insert_into(subscription_payments::table)
            .values(&new_row)
            .returning(SubscriptionPaymentRow::as_returning())
            .get_result::<SubscriptionPaymentRow>(&mut conn)
            .await
            .map_err(map_diesel)?;

        row_to_subscription_payment(row)
    }

    async fn create_team_payment(
        &self,
        record: &NewTeamPayment,
    ) -> Result<TeamPayment, PaymentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let new_row = NewTeamPaymentRow {
            id: record.id,
            team_id: record.team_id,
            user_id: record.user_id,
            amount_kes: record.amount_kes,
            status: PaymentStatus::Pending.as_str(),
            phone_number: record.phone_number.as_str(),
            checkout_request_id: &record.checkout_request_id,
        };
        let row = diesel::insert_into(team_payments::table)
            .values(&new_row)
            .returning(TeamPaymentRow::as_returning())
            .get_result::<TeamPaymentRow>(&mut conn)
            .await
            .map_err(map_diesel)?;

        row_to_team_payment(row)
    }

    async fn find_subscription_payment_by_checkout(
        &self,
        checkout_request_id: &str,
    ) -> Result<Option<SubscriptionPayment>, PaymentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let row = subscription_payments::table
            .filter(subscription_payments::checkout_request_id.eq(checkout_request_id))
            .select(SubscriptionPaymentRow::as_select())
            .first::<SubscriptionPaymentRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;

        row.map(row_to_subscription_payment).transpose()
    }

    async fn find_team_payment_by_checkout(
        &self,
        checkout_request_id: &str,
    ) -> Result<Option<TeamPayment>, PaymentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let row = team_payments::table
            .filter(team_payments::checkout_request_id.eq(checkout_request_id))
            .select(TeamPaymentRow::as_select())
            .first::<TeamPaymentRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;

        row.map(row_to_team_payment).transpose()
    }

    async fn settle_subscription_payment(
        &self,
        payment_id: Uuid,
        status: PaymentStatus,
        receipt_number: Option<String>,
    ) -> Result<bool, PaymentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let updated = diesel::update(
            subscription_payments::table
                .find(payment_id)
                .filter(subscription_payments::status.eq(PaymentStatus::Pending.as_str())),
        )
        .set((
            subscription_payments::status.eq(status.as_str()),
            subscription_payments::receipt_number.eq(receipt_number),
            subscription_payments::completed_at.eq(Some(Utc::now())),
        ))
        .execute(&mut conn)
        .await
        .map_err(map_diesel)?;

        Ok(updated > 0)
    }

    async fn settle_team_payment(
        &self,
        payment_id: Uuid,
        status: PaymentStatus,
        receipt_number: Option<String>,
    ) -> Result<bool, PaymentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let updated = diesel::update(
            team_payments::table
                .find(payment_id)
                .filter(team_payments::status.eq(PaymentStatus::Pending.as_str())),
        )
        .set((
            team_payments::status.eq(status.as_str()),
            team_payments::receipt_number.eq(receipt_number),
            team_payments::completed_at.eq(Some(Utc::now())),
        ))
        .execute(&mut conn)
        .await
        .map_err(map_diesel)?;

        Ok(updated > 0)
    }
}
