//! The purchase flow: plan → pending purchase → gateway → membership.

use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration, Utc};
use pulse_core::{OrgId, OrgScope, PortalError};
use pulse_store::entities::{Membership, Plan, Purchase};
use pulse_store::repo::{memberships, plans, purchases};
use pulse_store::Db;

use crate::gateway::{ChargeRequest, ChargeStatus, PaymentGateway};

/// What a confirmed purchase produced.
#[derive(Debug, Clone)]
pub struct PurchaseOutcome {
    pub purchase: Purchase,
    /// Present only when the payment succeeded.
    pub membership: Option<Membership>,
}

pub struct BillingService {
    db: Db,
    gateway: Arc<dyn PaymentGateway>,
}

impl BillingService {
    pub fn new(db: Db, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { db, gateway }
    }

    /// Open a purchase for `plan_id` and create the gateway charge.
    ///
    /// The purchase row is written before the gateway is contacted, so a
    /// gateway outage leaves a `failed` row rather than nothing at all.
    pub async fn start_purchase(
        &self,
        scope: &OrgScope,
        user_id: i64,
        plan_id: i64,
    ) -> Result<Purchase> {
        let plan = self.sellable_plan(scope, plan_id).await?;

        let purchase = purchases::create_pending(
            &self.db,
            scope,
            user_id,
            plan.id,
            plan.price_cents,
            &plan.currency,
        )
        .await?;

        let charge = match self
            .gateway
            .create_charge(ChargeRequest {
                amount_cents: plan.price_cents,
                currency: plan.currency.clone(),
                description: plan.name.clone(),
            })
            .await
        {
            Ok(charge) => charge,
            Err(err) => {
                tracing::warn!(purchase_id = purchase.id, error = %err, "gateway rejected charge");
                purchases::mark_failed(&self.db, scope, purchase.id).await?;
                return Err(PortalError::bad_gateway("the payment provider is unavailable")
                    .into_anyhow());
            }
        };

        let purchase = purchases::set_gateway_ref(&self.db, scope, purchase.id, &charge.reference)
            .await?
            .ok_or_else(|| PortalError::not_found("purchase not found").into_anyhow())?;

        tracing::info!(
            purchase_id = purchase.id,
            plan_id = plan.id,
            "purchase opened"
        );
        Ok(purchase)
    }

    /// Settle a pending purchase against the gateway.
    ///
    /// A successful payment marks the purchase paid and creates the
    /// membership in one transaction; a failed one only marks it failed.
    /// Confirming a purchase that already settled is a conflict.
    pub async fn confirm_purchase(
        &self,
        scope: &OrgScope,
        purchase_id: i64,
    ) -> Result<PurchaseOutcome> {
        let purchase = purchases::get(&self.db, scope, purchase_id)
            .await?
            .ok_or_else(|| PortalError::not_found("purchase not found").into_anyhow())?;

        if purchase.status != pulse_store::entities::PurchaseStatus::Pending {
            pulse_core::bail_portal!(conflict, "this purchase has already been settled");
        }
        let reference = purchase.gateway_ref.clone().ok_or_else(|| {
            PortalError::unprocessable("this purchase never reached the payment provider")
                .into_anyhow()
        })?;

        let status = self
            .gateway
            .verify_reference(&reference)
            .await
            .map_err(|err| {
                tracing::warn!(purchase_id, error = %err, "gateway verification failed");
                PortalError::bad_gateway("the payment provider is unavailable").into_anyhow()
            })?;

        match status {
            ChargeStatus::Succeeded => self.settle_paid(scope, &purchase).await,
            ChargeStatus::Failed => {
                let purchase = purchases::mark_failed(&self.db, scope, purchase.id)
                    .await?
                    .ok_or_else(|| {
                        PortalError::conflict("this purchase has already been settled")
                            .into_anyhow()
                    })?;
                tracing::info!(purchase_id = purchase.id, "purchase failed at the gateway");
                Ok(PurchaseOutcome {
                    purchase,
                    membership: None,
                })
            }
            ChargeStatus::Pending => {
                pulse_core::bail_portal!(unprocessable, "payment is still pending at the gateway")
            }
        }
    }

    async fn settle_paid(&self, scope: &OrgScope, purchase: &Purchase) -> Result<PurchaseOutcome> {
        let plan = plans::get(&self.db, scope, purchase.plan_id)
            .await?
            .ok_or_else(|| PortalError::not_found("plan not found").into_anyhow())?;

        let mut tx = self.db.begin().await?;

        let paid = purchases::mark_paid(&mut *tx, scope, purchase.id)
            .await?
            .ok_or_else(|| {
                PortalError::conflict("this purchase has already been settled").into_anyhow()
            })?;

        let starts_on = Utc::now();
        let expires_on = starts_on + Duration::days(plan.duration_days);
        let membership = memberships::create(
            &mut *tx,
            OrgId(paid.org_id),
            paid.user_id,
            paid.plan_id,
            starts_on,
            expires_on,
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            purchase_id = paid.id,
            membership_id = membership.id,
            "purchase paid, membership created"
        );
        Ok(PurchaseOutcome {
            purchase: paid,
            membership: Some(membership),
        })
    }

    async fn sellable_plan(&self, scope: &OrgScope, plan_id: i64) -> Result<Plan> {
        let plan = plans::get(&self.db, scope, plan_id)
            .await?
            .ok_or_else(|| PortalError::not_found("plan not found").into_anyhow())?;
        if !plan.active {
            pulse_core::bail_portal!(unprocessable, "this plan is no longer for sale");
        }
        Ok(plan)
    }
}
