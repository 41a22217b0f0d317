//! Outgoing mail.
//!
//! The service only ever sends password links. [`LogMailer`] writes them
//! to the tracing output instead of delivering them.

use std::fmt;

use crate::error::LeagueError;

/// A plain-text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    /// Sender address.
    pub from: String,
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Body text.
    pub body: String,
}

impl MailMessage {
    /// Invitation to set the first password of a new account.
    #[must_use]
    pub fn password_setup(from: &str, to: &str, account_name: &str, link: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            subject: format!("Account created: {account_name}"),
            body: format!("Follow the link to set your password: {link}"),
        }
    }

    /// Link to reset a forgotten password.
    #[must_use]
    pub fn password_reset(from: &str, to: &str, username: &str, link: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            subject: format!("Password reset: {username}"),
            body: format!("Follow the link to reset your password: {link}"),
        }
    }
}

/// Delivers mail.
pub trait Mailer: fmt::Debug + Send + Sync {
    /// Sends one message.
    ///
    /// # Errors
    ///
    /// Returns a [`LeagueError::Internal`] if the message could not be
    /// handed off.
    fn send(&self, message: &MailMessage) -> Result<(), LeagueError>;
}

/// Mailer that logs each message at `info` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, message: &MailMessage) -> Result<(), LeagueError> {
        tracing::info!(
            from = %message.from,
            to = %message.to,
            subject = %message.subject,
            body = %message.body,
            "mail queued"
        );
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Keeps every message for inspection.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingMailer {
        pub(crate) sent: Mutex<Vec<MailMessage>>,
    }

    impl Mailer for RecordingMailer {
        fn send(&self, message: &MailMessage) -> Result<(), LeagueError> {
            self.sent
                .lock()
                .map_err(|e| LeagueError::Internal(e.to_string()))?
                .push(message.clone());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_message_carries_link() {
        let message = MailMessage::password_reset(
            "league@localhost",
            "arrows@example.com",
            "arrows",
            "http://ui/reset-password?token=abc",
        );
        assert_eq!(message.to, "arrows@example.com");
        assert!(message.subject.contains("arrows"));
        assert!(message.body.ends_with("token=abc"));
    }

    #[test]
    fn log_mailer_accepts_messages() {
        let message = MailMessage::password_setup("a@x", "b@x", "Arrows", "link");
        assert!(LogMailer.send(&message).is_ok());
    }
}
