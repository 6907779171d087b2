//! Ordered fallback combinator
//!
//! Expresses "try A, else B, else C" as a list instead of nested error
//! handlers. Candidates are attempted strictly one after another; the first
//! success wins and later candidates are never attempted.

use bridge_domain::BridgeError;
use std::future::Future;
use tracing::debug;

/// Run `attempt` over `candidates` in order until one succeeds.
///
/// Returns the last failure when every candidate fails, and a validation
/// error when there are no candidates at all.
pub async fn first_success<'a, C, T, F, Fut>(
    candidates: &'a [C],
    mut attempt: F,
) -> Result<T, BridgeError>
where
    F: FnMut(&'a C) -> Fut,
    Fut: Future<Output = Result<T, BridgeError>>,
{
    let mut last_error = None;

    for (index, candidate) in candidates.iter().enumerate() {
        match attempt(candidate).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                debug!("Fallback candidate {} failed: {}", index, e);
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| BridgeError::validation("no fallback candidates given")))
}
