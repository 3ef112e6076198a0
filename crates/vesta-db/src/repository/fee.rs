//! SurrealDB implementation of [`FeeRepository`].
//!
//! `record_payment` runs the already-paid check inside the same
//! transaction as the payment insert and the fee status flip.

use chrono::{DateTime, NaiveDate, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;
use vesta_core::error::VestaResult;
use vesta_core::models::fee::{CreateFee, CreatePayment, Fee, FeeStatus, Payment, PaymentMethod};
use vesta_core::repository::FeeRepository;

use crate::error::DbError;
use crate::repository::{date_to_string, parse_date, parse_decimal, parse_uuid, parse_uuid_opt};

#[derive(Debug, SurrealValue)]
struct FeeRow {
    record_id: String,
    unit_id: String,
    title: String,
    description: Option<String>,
    amount: String,
    due_date: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_fee_status(s: &str) -> Result<FeeStatus, DbError> {
    match s {
        "Pending" => Ok(FeeStatus::Pending),
        "Paid" => Ok(FeeStatus::Paid),
        "Overdue" => Ok(FeeStatus::Overdue),
        other => Err(DbError::Decode(format!("unknown fee status: {other}"))),
    }
}

impl FeeRow {
    fn try_into_fee(self) -> Result<Fee, DbError> {
        Ok(Fee {
            id: parse_uuid("fee.record_id", &self.record_id)?,
            unit_id: parse_uuid("fee.unit_id", &self.unit_id)?,
            title: self.title,
            description: self.description,
            amount: parse_decimal("fee.amount", &self.amount)?,
            due_date: parse_date("fee.due_date", &self.due_date)?,
            status: parse_fee_status(&self.status)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct PaymentRow {
    record_id: String,
    fee_id: String,
    amount: String,
    method: String,
    verified: bool,
    verified_by: Option<String>,
    notes: Option<String>,
    paid_at: DateTime<Utc>,
}

fn parse_method(s: &str) -> Result<PaymentMethod, DbError> {
    match s {
        "Cash" => Ok(PaymentMethod::Cash),
        "Transfer" => Ok(PaymentMethod::Transfer),
        "Card" => Ok(PaymentMethod::Card),
        "Check" => Ok(PaymentMethod::Check),
        other => Err(DbError::Decode(format!("unknown payment method: {other}"))),
    }
}

fn method_to_str(m: PaymentMethod) -> &'static str {
    match m {
        PaymentMethod::Cash => "Cash",
        PaymentMethod::Transfer => "Transfer",
        PaymentMethod::Card => "Card",
        PaymentMethod::Check => "Check",
    }
}

impl PaymentRow {
    fn try_into_payment(self) -> Result<Payment, DbError> {
        Ok(Payment {
            id: parse_uuid("payment.record_id", &self.record_id)?,
            fee_id: parse_uuid("payment.fee_id", &self.fee_id)?,
            amount: parse_decimal("payment.amount", &self.amount)?,
            method: parse_method(&self.method)?,
            verified: self.verified,
            verified_by: parse_uuid_opt("payment.verified_by", self.verified_by.as_deref())?,
            notes: self.notes,
            paid_at: self.paid_at,
        })
    }
}

const FEE_PROJECTION: &str = "meta::id(id) AS record_id, *";

/// SurrealDB implementation of the Fee repository.
#[derive(Clone)]
pub struct SurrealFeeRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealFeeRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn fetch_fee(&self, id: Uuid) -> Result<Fee, DbError> {
        let id_str = id.to_string();
        let mut result = self
            .db
            .query(format!(
                "SELECT {FEE_PROJECTION} FROM type::record('fee', $id)"
            ))
            .bind(("id", id_str.clone()))
            .await?;

        let rows: Vec<FeeRow> = result.take(0)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "fee".into(),
            id: id_str,
        })?;
        row.try_into_fee()
    }

    async fn fetch_payment(&self, id: Uuid) -> Result<Payment, DbError> {
        let id_str = id.to_string();
        let mut result = self
            .db
            .query(format!(
                "SELECT {FEE_PROJECTION} FROM type::record('payment', $id)"
            ))
            .bind(("id", id_str.clone()))
            .await?;

        let rows: Vec<PaymentRow> = result.take(0)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "payment".into(),
            id: id_str,
        })?;
        row.try_into_payment()
    }
}

impl<C: Connection> FeeRepository for SurrealFeeRepository<C> {
    async fn create(&self, input: CreateFee) -> VestaResult<Fee> {
        let id = Uuid::new_v4();

        let result = self
            .db
            .query(
                "CREATE type::record('fee', $id) SET \
                 unit_id = $unit_id, title = $title, \
                 description = $description, amount = $amount, \
                 due_date = $due_date, status = 'Pending'",
            )
            .bind(("id", id.to_string()))
            .bind(("unit_id", input.unit_id.to_string()))
            .bind(("title", input.title))
            .bind(("description", input.description))
            .bind(("amount", input.amount.to_string()))
            .bind(("due_date", date_to_string(input.due_date)))
            .await
            .map_err(DbError::from)?;

        result.check().map_err(DbError::from_query)?;
        Ok(self.fetch_fee(id).await?)
    }

    async fn get_by_id(&self, id: Uuid) -> VestaResult<Fee> {
        Ok(self.fetch_fee(id).await?)
    }

    async fn list_for_unit(&self, unit_id: Uuid) -> VestaResult<Vec<Fee>> {
        let mut result = self
            .db
            .query(format!(
                "SELECT {FEE_PROJECTION} FROM fee \
                 WHERE unit_id = $unit_id ORDER BY due_date DESC"
            ))
            .bind(("unit_id", unit_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<FeeRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(FeeRow::try_into_fee)
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn record_payment(&self, input: CreatePayment) -> VestaResult<(Fee, Payment)> {
        let payment_id = Uuid::new_v4();

        let result = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 LET $fee = (SELECT * FROM ONLY type::record('fee', $fee_id)); \
                 IF $fee = NONE { THROW 'not_found: fee' }; \
                 IF $fee.status = 'Paid' { \
                     THROW 'conflict: fee is already paid' \
                 }; \
                 CREATE type::record('payment', $payment_id) SET \
                     fee_id = $fee_id, amount = $amount, \
                     method = $method, verified = false, notes = $notes; \
                 UPDATE type::record('fee', $fee_id) SET \
                     status = 'Paid', updated_at = time::now(); \
                 COMMIT TRANSACTION;",
            )
            .bind(("fee_id", input.fee_id.to_string()))
            .bind(("payment_id", payment_id.to_string()))
            .bind(("amount", input.amount.to_string()))
            .bind(("method", method_to_str(input.method)))
            .bind(("notes", input.notes))
            .await
            .map_err(DbError::from)?;

        result.check().map_err(DbError::from_query)?;

        let fee = self.fetch_fee(input.fee_id).await?;
        let payment = self.fetch_payment(payment_id).await?;
        Ok((fee, payment))
    }

    async fn verify_payment(&self, payment_id: Uuid, verifier_id: Uuid) -> VestaResult<Payment> {
        let result = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 LET $p = (SELECT * FROM ONLY type::record('payment', $id)); \
                 IF $p = NONE { THROW 'not_found: payment' }; \
                 IF $p.verified = true { \
                     THROW 'conflict: payment is already verified' \
                 }; \
                 UPDATE type::record('payment', $id) SET \
                     verified = true, verified_by = $verifier_id; \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", payment_id.to_string()))
            .bind(("verifier_id", verifier_id.to_string()))
            .await
            .map_err(DbError::from)?;

        result.check().map_err(DbError::from_query)?;
        Ok(self.fetch_payment(payment_id).await?)
    }

    async fn list_payments(&self, fee_id: Uuid) -> VestaResult<Vec<Payment>> {
        let mut result = self
            .db
            .query(format!(
                "SELECT {FEE_PROJECTION} FROM payment \
                 WHERE fee_id = $fee_id ORDER BY paid_at DESC"
            ))
            .bind(("fee_id", fee_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PaymentRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(PaymentRow::try_into_payment)
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn refresh_overdue(&self, today: NaiveDate) -> VestaResult<u64> {
        #[derive(Debug, SurrealValue)]
        struct IdRow {
            #[allow(dead_code)]
            record_id: String,
        }

        // ISO dates compare correctly as strings.
        let mut result = self
            .db
            .query(
                "UPDATE fee SET status = 'Overdue', \
                 updated_at = time::now() \
                 WHERE status = 'Pending' AND due_date < $today \
                 RETURN meta::id(id) AS record_id",
            )
            .bind(("today", date_to_string(today)))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<IdRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.len() as u64)
    }
}
