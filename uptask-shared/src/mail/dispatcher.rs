/// Background mail delivery
///
/// Request handlers call [`MailDispatcher::dispatch`], which only enqueues the
/// message. A single background loop owns the receiving end and delivers each
/// message on its own task, retrying failures with exponential backoff.
/// Delivery failures are logged and never reach the HTTP caller.
///
/// ```text
/// handler ──dispatch──> channel ──> dispatch loop ──spawn──> deliver (retry) ──> Mailer
/// ```
///
/// On shutdown the loop stops accepting new work, delivers whatever is still
/// queued and waits for in-flight deliveries.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;

use super::{Mailer, OutboundEmail};

/// Retry behaviour for failed deliveries
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts per message, the first one included
    pub max_attempts: u32,

    /// Delay before the first retry
    pub base_delay: Duration,

    /// Upper bound on any single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay after the given failed attempt (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Handle for queueing outgoing mail
#[derive(Clone)]
pub struct MailDispatcher {
    tx: mpsc::UnboundedSender<OutboundEmail>,
}

impl MailDispatcher {
    /// Starts the delivery loop
    ///
    /// The loop runs until `shutdown` is cancelled or every dispatcher handle
    /// is dropped. The returned handle resolves once the queue is drained.
    pub fn spawn(
        mailer: Arc<dyn Mailer>,
        policy: RetryPolicy,
        shutdown: CancellationToken,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_dispatch_loop(rx, mailer, policy, shutdown));
        (Self { tx }, handle)
    }

    /// Queues a message and returns immediately
    pub fn dispatch(&self, email: OutboundEmail) {
        let to = email.to.clone();
        if self.tx.send(email).is_err() {
            tracing::warn!(to = %to, "Mail dispatcher stopped, message dropped");
        }
    }
}

async fn run_dispatch_loop(
    mut rx: mpsc::UnboundedReceiver<OutboundEmail>,
    mailer: Arc<dyn Mailer>,
    policy: RetryPolicy,
    shutdown: CancellationToken,
) {
    tracing::info!("Mail dispatcher starting");
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            next = rx.recv() => match next {
                Some(email) => {
                    in_flight.spawn(deliver(mailer.clone(), policy.clone(), email));
                }
                None => break,
            },
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(e) = joined {
                    tracing::error!(error = %e, "Mail delivery task panicked");
                }
            }
        }
    }

    rx.close();
    while let Some(email) = rx.recv().await {
        in_flight.spawn(deliver(mailer.clone(), policy.clone(), email));
    }

    if !in_flight.is_empty() {
        tracing::info!(pending = in_flight.len(), "Waiting for queued mail");
    }
    while in_flight.join_next().await.is_some() {}

    tracing::info!("Mail dispatcher stopped");
}

/// Sends one message, retrying per `policy`; returns whether it was delivered
async fn deliver(mailer: Arc<dyn Mailer>, policy: RetryPolicy, email: OutboundEmail) -> bool {
    let mut attempt = 1;

    loop {
        match mailer.send(&email).await {
            Ok(()) => return true,
            Err(e) if attempt < policy.max_attempts => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    to = %email.to,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Email delivery failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                tracing::error!(
                    to = %email.to,
                    attempts = attempt,
                    error = %e,
                    "Email delivery failed, giving up"
                );
                return false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::recording::RecordingMailer;

    fn email(to: &str) -> OutboundEmail {
        OutboundEmail {
            to: to.to_string(),
            subject: "s".to_string(),
            text: "t".to_string(),
            html: "h".to_string(),
        }
    }

    #[test]
    fn test_retry_policy_backoff() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(1000),
        };

        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(400));
        assert_eq!(policy.delay_for(5), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(40), Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delivery_retries_until_success() {
        let mailer = Arc::new(RecordingMailer::failing(2));
        let shutdown = CancellationToken::new();
        let (dispatcher, handle) =
            MailDispatcher::spawn(mailer.clone(), RetryPolicy::default(), shutdown.clone());

        dispatcher.dispatch(email("ana@x.com"));
        shutdown.cancel();
        handle.await.unwrap();

        assert_eq!(mailer.attempts(), 3);
        assert_eq!(mailer.sent().await, vec![email("ana@x.com")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delivery_gives_up_after_max_attempts() {
        let mailer = Arc::new(RecordingMailer::failing(100));
        let policy = RetryPolicy {
            max_attempts: 3,
            ..RetryPolicy::default()
        };
        let shutdown = CancellationToken::new();
        let (dispatcher, handle) = MailDispatcher::spawn(mailer.clone(), policy, shutdown.clone());

        dispatcher.dispatch(email("ana@x.com"));
        shutdown.cancel();
        handle.await.unwrap();

        assert_eq!(mailer.attempts(), 3);
        assert!(mailer.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_loop_ends_when_handles_dropped() {
        let mailer = Arc::new(RecordingMailer::new());
        let (dispatcher, handle) =
            MailDispatcher::spawn(mailer.clone(), RetryPolicy::default(), CancellationToken::new());

        dispatcher.dispatch(email("a@x.com"));
        dispatcher.dispatch(email("b@x.com"));
        drop(dispatcher);
        handle.await.unwrap();

        assert_eq!(mailer.sent().await.len(), 2);
        assert_eq!(mailer.sent_to("b@x.com").await.len(), 1);
    }
}
