//! Delivery seam for one-time codes.
//!
//! Real mail/SMS providers are external collaborators; the portal only
//! depends on this trait.

use anyhow::Result;
use async_trait::async_trait;
use pulse_store::entities::OtpChannel;

#[async_trait]
pub trait OtpDelivery: Send + Sync {
    async fn deliver(&self, channel: OtpChannel, destination: &str, code: &str) -> Result<()>;
}

/// Logs the destination (never the code) — a stand-in for development
/// environments without a provider configured.
pub struct LogDelivery;

#[async_trait]
impl OtpDelivery for LogDelivery {
    async fn deliver(&self, channel: OtpChannel, destination: &str, _code: &str) -> Result<()> {
        tracing::info!(?channel, %destination, "otp code issued");
        Ok(())
    }
}
