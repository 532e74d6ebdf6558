use std::{fmt::Display, future::Future};

/// Runs a side effect whose failure must not reach the caller.
///
/// Returns whether the effect succeeded; callers are free to ignore it.
pub async fn best_effort<F, T, E>(effect: &'static str, fut: F) -> bool
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    match fut.await {
        Ok(_) => true,
        Err(err) => {
            tracing::warn!(effect, error = %err, "side effect failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn swallows_errors() {
        let ok = best_effort("noop", async { Ok::<_, String>(()) }).await;
        let failed = best_effort("boom", async { Err::<(), _>("smtp down".to_string()) }).await;
        assert!(ok);
        assert!(!failed);
    }
}
