//! pulse-billing: selling membership plans.
//!
//! A purchase starts `pending`, goes out to a payment gateway behind the
//! [`PaymentGateway`] seam, and on confirmation becomes `paid` together
//! with a freshly minted membership, in one transaction.

pub mod gateway;
pub mod purchase;

pub use gateway::{ChargeRequest, ChargeStatus, GatewayCharge, PaymentGateway, SandboxGateway};
pub use purchase::{BillingService, PurchaseOutcome};
