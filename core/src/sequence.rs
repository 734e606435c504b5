use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::error::{ClientError, Result};

/// Hands out tickets for requests. Only the latest ticket may publish its
/// result; taking a new ticket cancels the previous one.
#[derive(Debug, Default)]
pub struct RequestSequence {
    id: AtomicU64,
    token: Mutex<Option<CancellationToken>>,
}

#[derive(Debug, Clone)]
pub struct Ticket {
    id: u64,
    token: CancellationToken,
}

impl RequestSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> Ticket {
        let token = CancellationToken::new();
        let prev = self
            .token
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .replace(token.clone());
        if let Some(prev) = prev {
            prev.cancel();
        }
        let id = self.id.fetch_add(1, Ordering::SeqCst) + 1;
        Ticket { id, token }
    }

    pub fn is_current(&self, ticket: &Ticket) -> bool {
        self.id.load(Ordering::SeqCst) == ticket.id
    }

    pub fn current_id(&self) -> u64 {
        self.id.load(Ordering::SeqCst)
    }
}

impl Ticket {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Drive `fut` until it finishes, the ticket is superseded, or `deadline`
    /// passes.
    pub async fn run<T, F>(&self, deadline: Duration, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::select! {
            _ = self.token.cancelled() => Err(ClientError::Cancelled),
            r = tokio::time::timeout(deadline, fut) => match r {
                Ok(r) => r,
                Err(_) => Err(ClientError::Timeout),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_ticket_wins() {
        let seq = RequestSequence::new();
        let a = seq.issue();
        assert!(seq.is_current(&a));
        let b = seq.issue();
        assert!(!seq.is_current(&a));
        assert!(a.is_cancelled());
        assert!(seq.is_current(&b));
        assert!(!b.is_cancelled());
        assert_eq!(b.id(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_cancelled() {
        let seq = RequestSequence::new();
        let a = seq.issue();
        let pending = a.run(Duration::from_secs(60), async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(1)
        });
        let _b = seq.issue();
        assert!(matches!(pending.await, Err(ClientError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_deadline() {
        let seq = RequestSequence::new();
        let a = seq.issue();
        let r = a
            .run(Duration::from_secs(1), async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok(1)
            })
            .await;
        assert!(matches!(r, Err(ClientError::Timeout)));

        let r = a.run(Duration::from_secs(1), async { Ok(7) }).await;
        assert_eq!(r.unwrap(), 7);
    }
}
