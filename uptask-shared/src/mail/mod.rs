/// Transactional email
///
/// Handlers never talk to a mail transport directly. They build an
/// [`OutboundEmail`] from a template and hand it to the
/// [`dispatcher::MailDispatcher`], which delivers it in the background
/// through whichever [`Mailer`] the server was started with.
///
/// # Transports
///
/// - [`smtp::SmtpMailer`]: SMTP relay via lettre
/// - [`smtp::LogMailer`]: writes the message to the log (no SMTP configured)
/// - [`recording::RecordingMailer`]: keeps messages in memory for tests
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
/// use uptask_shared::mail::{
///     dispatcher::{MailDispatcher, RetryPolicy},
///     recording::RecordingMailer,
///     templates,
/// };
///
/// # async fn example() {
/// let mailer = Arc::new(RecordingMailer::new());
/// let shutdown = CancellationToken::new();
/// let (dispatcher, handle) =
///     MailDispatcher::spawn(mailer.clone(), RetryPolicy::default(), shutdown.clone());
///
/// dispatcher.dispatch(templates::confirmation_email(
///     "http://localhost:5173",
///     "ana@example.com",
///     "Ana",
///     "012345",
/// ));
///
/// shutdown.cancel();
/// handle.await.unwrap();
/// assert_eq!(mailer.sent().await.len(), 1);
/// # }
/// ```

pub mod dispatcher;
pub mod recording;
pub mod smtp;
pub mod templates;

use async_trait::async_trait;

/// Sender shown on every outgoing message
pub const FROM_ADDRESS: &str = "UpTask <admin@uptask.com>";

/// A rendered message ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    /// Recipient address
    pub to: String,

    /// Subject line
    pub subject: String,

    /// Plain-text body
    pub text: String,

    /// HTML body
    pub html: String,
}

/// Mail delivery errors
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// A sender or recipient address could not be parsed
    #[error("Invalid address: {0}")]
    Address(String),

    /// The MIME message could not be assembled
    #[error("Failed to build message: {0}")]
    Build(String),

    /// The transport rejected or failed to deliver the message
    #[error("Transport error: {0}")]
    Transport(String),
}

/// A mail transport
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Delivers one message
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailError>;
}
