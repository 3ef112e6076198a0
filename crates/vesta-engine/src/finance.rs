//! Fee and payment flows.
//!
//! Thin policy-gated wrappers over the fee repository. Report
//! aggregation lives outside this crate; only per-unit reads and the
//! payment transitions are modelled here.

use chrono::NaiveDate;
use uuid::Uuid;
use vesta_core::error::VestaResult;
use vesta_core::models::fee::{CreateFee, CreatePayment, Fee, Payment};
use vesta_core::models::principal::{Principal, Role};
use vesta_core::models::unit::Unit;
use vesta_core::policy::{self, Action, ResourceClass};
use vesta_core::repository::FeeRepository;

/// Finance service.
pub struct FinanceService<F: FeeRepository> {
    fees: F,
}

impl<F: FeeRepository> FinanceService<F> {
    pub fn new(fees: F) -> Self {
        Self { fees }
    }

    /// Raise a fee against a unit. Admin only.
    pub async fn create_fee(&self, principal: &Principal, input: CreateFee) -> VestaResult<Fee> {
        policy::require(principal, Action::Create, ResourceClass::Finance)?;
        self.fees.create(input).await
    }

    /// Record a payment; the fee flips to `Paid`. Fails with
    /// `Conflict` when the fee is already paid.
    pub async fn record_payment(
        &self,
        principal: &Principal,
        input: CreatePayment,
    ) -> VestaResult<(Fee, Payment)> {
        policy::require(principal, Action::Update, ResourceClass::Finance)?;
        self.fees.record_payment(input).await
    }

    /// Verify a recorded payment. Fails with `Conflict` when already
    /// verified; the verifier is stamped on the row.
    pub async fn verify_payment(
        &self,
        principal: &Principal,
        payment_id: Uuid,
    ) -> VestaResult<Payment> {
        policy::require(principal, Action::Update, ResourceClass::Finance)?;
        self.fees.verify_payment(payment_id, principal.id).await
    }

    /// Fees charged to a unit. Residents see their own unit only.
    pub async fn fees_for_unit(&self, principal: &Principal, unit: &Unit) -> VestaResult<Vec<Fee>> {
        policy::require(principal, Action::Read, ResourceClass::Finance)?;
        if principal.role != Role::Admin {
            policy::require_object(principal, Action::Read, unit)?;
        }
        self.fees.list_for_unit(unit.id).await
    }

    /// Payments recorded against a fee.
    pub async fn payments_for_fee(
        &self,
        principal: &Principal,
        fee_id: Uuid,
    ) -> VestaResult<Vec<Payment>> {
        policy::require(principal, Action::Read, ResourceClass::Finance)?;
        self.fees.list_payments(fee_id).await
    }

    /// Roll pending fees past their due date over to `Overdue`;
    /// returns the number updated.
    pub async fn refresh_overdue(
        &self,
        principal: &Principal,
        today: NaiveDate,
    ) -> VestaResult<u64> {
        policy::require(principal, Action::Update, ResourceClass::Finance)?;
        self.fees.refresh_overdue(today).await
    }
}
