//! Use cases (application services)

pub mod call_gateway;
pub mod fallback;
pub mod run_batch;

#[cfg(test)]
pub(crate) mod test_support;
