use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::{BlobError, BlobResult};

/// Run `fut` to completion unless `cancel` fires first.
///
/// An already cancelled token short-circuits without polling `fut`. Dropping
/// the losing future releases anything it owned.
pub async fn run_cancellable<F, T>(cancel: Option<&CancellationToken>, fut: F) -> BlobResult<T>
where
    F: Future<Output = BlobResult<T>>,
{
    let Some(token) = cancel else {
        return fut.await;
    };

    if token.is_cancelled() {
        return Err(BlobError::Cancelled);
    }

    tokio::select! {
        biased;
        _ = token.cancelled() => Err(BlobError::Cancelled),
        result = fut => result,
    }
}

/// Fail fast when the token has already fired
pub fn ensure_not_cancelled(cancel: Option<&CancellationToken>) -> BlobResult<()> {
    match cancel {
        Some(token) if token.is_cancelled() => Err(BlobError::Cancelled),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn passes_through_without_token() {
        let result = run_cancellable(None, async { Ok::<_, BlobError>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn pre_cancelled_token_never_polls() {
        let token = CancellationToken::new();
        token.cancel();

        let result: BlobResult<()> = run_cancellable(Some(&token), async {
            panic!("future must not be polled");
        })
        .await;
        assert!(matches!(result, Err(BlobError::Cancelled)));
    }

    #[tokio::test]
    async fn cancellation_interrupts_pending_work() {
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let result: BlobResult<()> = run_cancellable(Some(&token), std::future::pending()).await;
        assert!(result.unwrap_err().is_cancelled());
    }

    #[test]
    fn ensure_not_cancelled_checks_state() {
        let token = CancellationToken::new();
        assert!(ensure_not_cancelled(Some(&token)).is_ok());
        assert!(ensure_not_cancelled(None).is_ok());
        token.cancel();
        assert!(ensure_not_cancelled(Some(&token)).is_err());
    }
}
