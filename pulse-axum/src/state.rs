use std::sync::Arc;
use std::time::Duration;

use pulse_auth::{OtpService, TokenIssuer};
use pulse_billing::BillingService;
use pulse_core::config::PortalConfigSnapshot;
use pulse_store::{Db, NavCache};

const NAV_TTL_KEY: &str = "nav.cache_ttl_secs";
const NAV_TTL_DEFAULT_SECS: u64 = 60;

/// Everything a request handler can reach.
///
/// Configuration is captured once as a snapshot at startup; handlers and
/// extractors read it from here, never from the process environment.
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub config: PortalConfigSnapshot,
    pub nav_cache: Arc<NavCache>,
    pub otp: Arc<OtpService>,
    pub billing: Arc<BillingService>,
    pub tokens: TokenIssuer,
}

impl AppState {
    pub fn new(
        db: Db,
        config: PortalConfigSnapshot,
        otp: Arc<OtpService>,
        billing: Arc<BillingService>,
        tokens: TokenIssuer,
    ) -> Self {
        let ttl = config.get_u64(NAV_TTL_KEY).unwrap_or(NAV_TTL_DEFAULT_SECS);
        Self {
            db,
            config,
            nav_cache: Arc::new(NavCache::new(Duration::from_secs(ttl))),
            otp,
            billing,
            tokens,
        }
    }
}
