//! Outbound mail contract.
//!
//! Actual delivery is out of scope; the portal only needs a seam to hand the
//! verification code to. The default implementation logs the send, which is
//! also what tests assert against.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail delivery failed: {0}")]
    Delivery(String),
}

/// A verification-code e-mail ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationEmail {
    pub to: String,
    pub code: String,
}

/// Narrow outbound-mail seam.
pub trait MailSender: Send + Sync {
    fn send_verification(&self, email: &VerificationEmail) -> Result<(), MailError>;
}

/// Sender that only records the send in the log stream.
#[derive(Debug, Default)]
pub struct TracingMailSender;

impl MailSender for TracingMailSender {
    fn send_verification(&self, email: &VerificationEmail) -> Result<(), MailError> {
        tracing::info!(to = %email.to, "verification code issued");
        Ok(())
    }
}
