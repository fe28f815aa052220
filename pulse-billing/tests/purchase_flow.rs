use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use pulse_billing::{BillingService, ChargeRequest, ChargeStatus, GatewayCharge, PaymentGateway};
use pulse_core::{OrgId, OrgScope, PortalError};
use pulse_store::entities::{Plan, PurchaseStatus, User};
use pulse_store::repo::{memberships, orgs, plans, purchases, users};
use pulse_store::Db;

/// A gateway that always creates a charge and settles it with a scripted
/// status when verified.
struct ScriptedGateway {
    settles_as: ChargeStatus,
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn create_charge(&self, _request: ChargeRequest) -> Result<GatewayCharge> {
        Ok(GatewayCharge {
            reference: "ch_test_1".to_string(),
            status: ChargeStatus::Pending,
        })
    }

    async fn verify_reference(&self, _reference: &str) -> Result<ChargeStatus> {
        Ok(self.settles_as)
    }
}

/// A gateway whose provider is down.
struct BrokenGateway;

#[async_trait]
impl PaymentGateway for BrokenGateway {
    async fn create_charge(&self, _request: ChargeRequest) -> Result<GatewayCharge> {
        anyhow::bail!("connection refused")
    }

    async fn verify_reference(&self, _reference: &str) -> Result<ChargeStatus> {
        anyhow::bail!("connection refused")
    }
}

async fn setup(gateway: Arc<dyn PaymentGateway>) -> (Db, OrgScope, User, Plan, BillingService) {
    let db = pulse_store::memory().await.unwrap();
    let org = orgs::create(&db, "Iron Temple", "iron-temple").await.unwrap();
    let scope = OrgScope::tenant(OrgId(org.id));

    let user = users::find_or_create(&db, "ada@example.com").await.unwrap();
    let plan = plans::create(
        &db,
        &scope,
        plans::NewPlan {
            name: "Monthly".to_string(),
            description: None,
            price_cents: 4900,
            currency: "USD".to_string(),
            duration_days: 30,
        },
    )
    .await
    .unwrap();

    let billing = BillingService::new(db.clone(), gateway);
    (db, scope, user, plan, billing)
}

#[tokio::test]
async fn a_paid_purchase_creates_a_membership() {
    let gateway = Arc::new(ScriptedGateway {
        settles_as: ChargeStatus::Succeeded,
    });
    let (db, scope, user, plan, billing) = setup(gateway).await;

    let purchase = billing.start_purchase(&scope, user.id, plan.id).await.unwrap();
    assert_eq!(purchase.status, PurchaseStatus::Pending);
    assert_eq!(purchase.amount_cents, 4900);
    assert!(purchase.gateway_ref.is_some());

    let outcome = billing.confirm_purchase(&scope, purchase.id).await.unwrap();
    assert_eq!(outcome.purchase.status, PurchaseStatus::Paid);

    let membership = outcome.membership.expect("a membership was created");
    assert_eq!(membership.user_id, user.id);
    assert_eq!(membership.plan_id, plan.id);
    assert!(membership.expires_on > Utc::now() + chrono::Duration::days(29));

    let active = memberships::active_for_user(&db, &scope, user.id).await.unwrap();
    assert_eq!(active.map(|m| m.id), Some(membership.id));
}

#[tokio::test]
async fn a_failed_payment_leaves_no_membership() {
    let gateway = Arc::new(ScriptedGateway {
        settles_as: ChargeStatus::Failed,
    });
    let (db, scope, user, plan, billing) = setup(gateway).await;

    let purchase = billing.start_purchase(&scope, user.id, plan.id).await.unwrap();
    let outcome = billing.confirm_purchase(&scope, purchase.id).await.unwrap();

    assert_eq!(outcome.purchase.status, PurchaseStatus::Failed);
    assert!(outcome.membership.is_none());

    let active = memberships::active_for_user(&db, &scope, user.id).await.unwrap();
    assert!(active.is_none());
}

#[tokio::test]
async fn a_settled_purchase_cannot_be_confirmed_twice() {
    let gateway = Arc::new(ScriptedGateway {
        settles_as: ChargeStatus::Succeeded,
    });
    let (_db, scope, user, plan, billing) = setup(gateway).await;

    let purchase = billing.start_purchase(&scope, user.id, plan.id).await.unwrap();
    billing.confirm_purchase(&scope, purchase.id).await.unwrap();

    let err = billing.confirm_purchase(&scope, purchase.id).await.unwrap_err();
    assert_eq!(PortalError::from_anyhow(&err).unwrap().code(), 409);
}

#[tokio::test]
async fn a_charge_still_pending_at_the_gateway_does_not_settle() {
    let gateway = Arc::new(ScriptedGateway {
        settles_as: ChargeStatus::Pending,
    });
    let (db, scope, user, plan, billing) = setup(gateway).await;

    let purchase = billing.start_purchase(&scope, user.id, plan.id).await.unwrap();
    let err = billing.confirm_purchase(&scope, purchase.id).await.unwrap_err();
    assert_eq!(PortalError::from_anyhow(&err).unwrap().code(), 422);

    // Still pending; a later confirmation can settle it.
    let row = purchases::get(&db, &scope, purchase.id).await.unwrap().unwrap();
    assert_eq!(row.status, PurchaseStatus::Pending);
}

#[tokio::test]
async fn a_gateway_outage_marks_the_purchase_failed() {
    let (db, scope, user, plan, billing) = setup(Arc::new(BrokenGateway)).await;

    let err = billing.start_purchase(&scope, user.id, plan.id).await.unwrap_err();
    assert_eq!(PortalError::from_anyhow(&err).unwrap().code(), 502);

    let rows = purchases::list_for_user(&db, &scope, user.id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].status, PurchaseStatus::Failed);
}

#[tokio::test]
async fn retired_plans_are_not_for_sale() {
    let gateway = Arc::new(ScriptedGateway {
        settles_as: ChargeStatus::Succeeded,
    });
    let (db, scope, user, plan, billing) = setup(gateway).await;

    plans::deactivate(&db, &scope, plan.id).await.unwrap();

    let err = billing.start_purchase(&scope, user.id, plan.id).await.unwrap_err();
    assert_eq!(PortalError::from_anyhow(&err).unwrap().code(), 422);
}

#[tokio::test]
async fn a_foreign_tenant_cannot_confirm_the_purchase() {
    let gateway = Arc::new(ScriptedGateway {
        settles_as: ChargeStatus::Succeeded,
    });
    let (db, scope, user, plan, billing) = setup(gateway).await;
    let other_org = orgs::create(&db, "Flex Gym", "flex-gym").await.unwrap();
    let other_scope = OrgScope::tenant(OrgId(other_org.id));

    let purchase = billing.start_purchase(&scope, user.id, plan.id).await.unwrap();

    let err = billing
        .confirm_purchase(&other_scope, purchase.id)
        .await
        .unwrap_err();
    assert_eq!(PortalError::from_anyhow(&err).unwrap().code(), 404);
}
