//! Response cache concepts: keys and freshness policy.

pub mod key;
pub mod ttl_policy;
