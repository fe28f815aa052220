//! pulse-auth: OTP login for portal customers.
//!
//! A customer asks for a one-time code, the code travels through a
//! delivery seam (mail/SMS providers live outside this crate), and a
//! successful verification yields a signed access token naming the user
//! and their organization.

pub mod delivery;
pub mod otp;
pub mod token;

pub use delivery::{LogDelivery, OtpDelivery};
pub use otp::{AuthSession, OtpOptions, OtpService};
pub use token::{Claims, TokenIssuer};
