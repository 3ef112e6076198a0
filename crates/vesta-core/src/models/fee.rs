//! Fee and payment domain models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeeStatus {
    Pending,
    Paid,
    Overdue,
}

/// A charge against a unit, e.g. a monthly maintenance fee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fee {
    pub id: Uuid,
    pub unit_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub status: FeeStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Fee {
    /// An unpaid fee past its due date.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        matches!(self.status, FeeStatus::Pending | FeeStatus::Overdue) && self.due_date < today
    }

    pub fn days_overdue(&self, today: NaiveDate) -> i64 {
        if self.is_overdue(today) {
            (today - self.due_date).num_days()
        } else {
            0
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFee {
    pub unit_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub amount: Decimal,
    pub due_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    Cash,
    Transfer,
    Card,
    Check,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub fee_id: Uuid,
    pub amount: Decimal,
    pub method: PaymentMethod,
    /// Set by an administrator after checking the receipt.
    pub verified: bool,
    pub verified_by: Option<Uuid>,
    pub notes: Option<String>,
    pub paid_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePayment {
    pub fee_id: Uuid,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub notes: Option<String>,
}
