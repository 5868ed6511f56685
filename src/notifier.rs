// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Outbound notification of accepted contact submissions.
//!
//! [`NotificationMessage`] is rendered from a validated submission and handed
//! to a [`Notifier`]. [`SmtpNotifier`] delivers it through an SMTP relay.

use crate::config::MailConfig;
use crate::validator::{escape_html, ContactSubmission};
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const FOOTER: &str = "Sent from your portfolio website";

/// Notification dispatch errors.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("Message rejected by relay: {0}")]
    Rejected(String),

    #[error("Dispatch timed out after {0:?}")]
    Timeout(Duration),

    #[error("Dispatch task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// A rendered contact notification, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationMessage {
    pub recipient: Mailbox,
    pub reply_to: Mailbox,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

impl NotificationMessage {
    /// Render the notification for `submission`, addressed to `recipient`.
    pub fn from_submission(submission: &ContactSubmission, recipient: Mailbox) -> Self {
        let name = submission.name();
        let email = submission.email();
        let one_line_name = name.split_whitespace().collect::<Vec<_>>().join(" ");

        let html_body = format!(
            "<h3>New Contact Form Submission</h3>\n\
             <p><strong>Name:</strong> {}</p>\n\
             <p><strong>Email:</strong> {}</p>\n\
             <p><strong>Message:</strong></p>\n\
             {}\n\
             <hr>\n\
             <p>{FOOTER}</p>\n",
            escape_html(name),
            escape_html(email.as_ref()),
            render_paragraphs(submission.message()),
        );

        let text_body = format!(
            "New Contact Form Submission\n\n\
             Name: {name}\n\
             Email: {email}\n\n\
             {}\n\n\
             --\n\
             {FOOTER}\n",
            submission.message(),
        );

        Self {
            recipient,
            reply_to: Mailbox::new(Some(one_line_name.clone()), email.clone()),
            subject: format!("New message from {one_line_name}"),
            text_body,
            html_body,
        }
    }
}

/// Blank-line separated blocks become paragraphs, single newlines become `<br>`.
fn render_paragraphs(text: &str) -> String {
    text.replace("\r\n", "\n")
        .split("\n\n")
        .map(str::trim)
        .filter(|block| !block.is_empty())
        .map(|block| {
            let lines: Vec<String> = block.lines().map(|l| escape_html(l.trim_end())).collect();
            format!("<p>{}</p>", lines.join("<br>"))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// A channel able to deliver contact notifications.
pub trait Notifier: Send + Sync + 'static {
    /// Make exactly one delivery attempt.
    fn send(
        &self,
        message: &NotificationMessage,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

/// Delivers notifications through an authenticated SMTP relay.
#[derive(Clone)]
pub struct SmtpNotifier {
    from: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpNotifier {
    /// Build a pooled SMTPS transport for the configured relay.
    pub fn new(config: &MailConfig) -> Result<Self, NotifyError> {
        let from = Mailbox::new(Some(config.from_name.clone()), config.username.parse()?);

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)?
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .timeout(Some(config.dispatch_timeout()));
        if let Some(port) = config.smtp_port {
            builder = builder.port(port);
        }

        Ok(Self {
            from,
            transport: builder.build(),
        })
    }

    /// Check that the relay accepts connections.
    pub async fn ping(&self) -> Result<(), NotifyError> {
        if self.transport.test_connection().await? {
            Ok(())
        } else {
            Err(NotifyError::Rejected("connection test failed".to_string()))
        }
    }
}

impl Notifier for SmtpNotifier {
    async fn send(&self, message: &NotificationMessage) -> Result<(), NotifyError> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(message.recipient.clone())
            .reply_to(message.reply_to.clone())
            .subject(message.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                message.text_body.clone(),
                message.html_body.clone(),
            ))?;

        let response = self.transport.send(email).await?;
        if response.is_positive() {
            debug!(code = %response.code(), "Relay accepted message");
            Ok(())
        } else {
            Err(NotifyError::Rejected(response.code().to_string()))
        }
    }
}
