//! Payment gateway seam.
//!
//! The portal never talks to a card network directly. It asks the gateway
//! to create a charge, stores the returned reference, and later asks the
//! gateway what became of it.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct ChargeRequest {
    pub amount_cents: i64,
    pub currency: String,
    /// Shown on the customer's statement / checkout page.
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChargeStatus {
    Pending,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone)]
pub struct GatewayCharge {
    /// Provider-side reference, stored on the purchase row.
    pub reference: String,
    pub status: ChargeStatus,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_charge(&self, request: ChargeRequest) -> Result<GatewayCharge>;

    /// Current status of a previously created charge.
    async fn verify_reference(&self, reference: &str) -> Result<ChargeStatus>;
}

/// Approves every charge — a stand-in for development environments
/// without a provider configured.
#[derive(Default)]
pub struct SandboxGateway {
    counter: std::sync::atomic::AtomicU64,
}

#[async_trait]
impl PaymentGateway for SandboxGateway {
    async fn create_charge(&self, request: ChargeRequest) -> Result<GatewayCharge> {
        let n = self
            .counter
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        tracing::info!(
            amount_cents = request.amount_cents,
            currency = %request.currency,
            "sandbox charge created"
        );
        Ok(GatewayCharge {
            reference: format!("sandbox-{n}"),
            status: ChargeStatus::Pending,
        })
    }

    async fn verify_reference(&self, _reference: &str) -> Result<ChargeStatus> {
        Ok(ChargeStatus::Succeeded)
    }
}
