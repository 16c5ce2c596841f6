// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Outbound OTP email delivery.
//!
//! Delivery is an external collaborator: when SES is not configured the
//! service still works, logging the code in development so the flow can
//! be exercised end to end. Delivery failure never fails the request
//! that triggered it; the stored challenge is already valid.

use crate::config::Config;
use crate::error::AppError;
use std::sync::{Arc, Mutex};

const OTP_SUBJECT: &str = "Your CloudNotes verification code";

/// A captured outbound message (test backend only).
#[derive(Debug, Clone)]
pub struct OutboundOtp {
    pub to: String,
    pub code: String,
}

/// Handle to the capture backend's sent-mail log.
pub type Outbox = Arc<Mutex<Vec<OutboundOtp>>>;

#[derive(Clone)]
enum Backend {
    /// AWS SESv2 delivery.
    Ses {
        client: aws_sdk_sesv2::Client,
        from: String,
    },
    /// No relay configured: log the code in development, warn in production.
    DevLog { production: bool },
    /// Record messages for assertions in tests.
    Capture(Outbox),
}

/// OTP mail sender.
#[derive(Clone)]
pub struct Mailer {
    backend: Backend,
}

impl Mailer {
    /// Build the mailer from configuration. SES is used when a sender
    /// address is configured; credentials come from the default AWS
    /// provider chain.
    pub async fn from_config(config: &Config) -> Self {
        match &config.mail_from {
            Some(from) => {
                let aws_config =
                    aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
                let client = aws_sdk_sesv2::Client::new(&aws_config);
                tracing::info!(from = %from, "SES mail delivery enabled");
                Self {
                    backend: Backend::Ses {
                        client,
                        from: from.clone(),
                    },
                }
            }
            None => {
                if config.production {
                    tracing::warn!("MAIL_FROM not set; OTP delivery is disabled");
                }
                Self {
                    backend: Backend::DevLog {
                        production: config.production,
                    },
                }
            }
        }
    }

    /// Capture backend for tests: returns the mailer and a handle to
    /// the messages it records.
    pub fn capture() -> (Self, Outbox) {
        let outbox: Outbox = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                backend: Backend::Capture(outbox.clone()),
            },
            outbox,
        )
    }

    /// Send a verification code. The code exists in plaintext only on
    /// this path.
    pub async fn send_otp(&self, to: &str, code: &str) -> Result<(), AppError> {
        match &self.backend {
            Backend::Ses { client, from } => send_via_ses(client, from, to, code).await,
            Backend::DevLog { production } => {
                if *production {
                    tracing::warn!(to = %to, "OTP not delivered: mail relay not configured");
                } else {
                    tracing::info!(to = %to, code = %code, "OTP (dev, mail disabled)");
                }
                Ok(())
            }
            Backend::Capture(outbox) => {
                outbox.lock().unwrap().push(OutboundOtp {
                    to: to.to_string(),
                    code: code.to_string(),
                });
                Ok(())
            }
        }
    }
}

async fn send_via_ses(
    client: &aws_sdk_sesv2::Client,
    from: &str,
    to: &str,
    code: &str,
) -> Result<(), AppError> {
    use aws_sdk_sesv2::types::{Body, Content, Destination, EmailContent, Message};

    let subject = Content::builder()
        .data(OTP_SUBJECT)
        .charset("UTF-8")
        .build()
        .map_err(|e| AppError::Upstream(format!("SES content build failed: {e}")))?;

    let text = Content::builder()
        .data(format!("Your verification code is: {code}"))
        .charset("UTF-8")
        .build()
        .map_err(|e| AppError::Upstream(format!("SES content build failed: {e}")))?;

    let html = Content::builder()
        .data(format!(
            "<p>Your verification code is: <b>{code}</b></p>"
        ))
        .charset("UTF-8")
        .build()
        .map_err(|e| AppError::Upstream(format!("SES content build failed: {e}")))?;

    let message = Message::builder()
        .subject(subject)
        .body(Body::builder().text(text).html(html).build())
        .build();

    client
        .send_email()
        .from_email_address(from)
        .destination(Destination::builder().to_addresses(to).build())
        .content(EmailContent::builder().simple(message).build())
        .send()
        .await
        .map_err(|e| AppError::Upstream(format!("SES send failed: {e}")))?;

    tracing::info!(to = %to, "OTP email sent via SES");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_capture_backend_records_messages() {
        let (mailer, outbox) = Mailer::capture();
        mailer.send_otp("ann@x.com", "482193").await.unwrap();

        let sent = outbox.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ann@x.com");
        assert_eq!(sent[0].code, "482193");
    }
}
