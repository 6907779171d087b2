//! Core domain concepts shared across all subdomains.
//!
//! - [`method::MethodName`]: a validated upstream operation name
//! - [`params::Params`]: keyed call parameters with canonical serialization
//! - [`error::BridgeError`]: the caller-visible error taxonomy

pub mod error;
pub mod method;
pub mod params;
