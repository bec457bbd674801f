use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use log::{error, info};
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::config::SmtpSettings;

pub type ArcEmailPort = std::sync::Arc<dyn EmailPort + Send + Sync + 'static>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub from: Mailbox,
    pub to: Mailbox,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Clone, Error)]
pub enum SendEmailError {
    #[error("invalid to address: {0}")]
    InvalidToAddress(String),
    #[error("failed to build email: {0}")]
    Build(String),
    #[error("smtp transport error: {0}")]
    Transport(String),
    #[error("smtp relay did not accept the connection")]
    Rejected,
}

#[async_trait::async_trait]
pub trait EmailPort {
    async fn send(&self, message: EmailMessage) -> Result<(), SendEmailError>;

    /// Opens a connection to the relay and checks it accepts us.
    async fn verify(&self) -> Result<(), SendEmailError>;
}

/// Long-lived SMTP connection shared by every request.
pub struct LettreEmailAdapter {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl LettreEmailAdapter {
    /// Implicit TLS (SMTPS) relay, authenticated with the operator credentials.
    pub fn new(settings: &SmtpSettings) -> Result<Self, SendEmailError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
            .map_err(|e| {
                SendEmailError::Transport(format!("Failed to create SMTP transport: {}", e))
            })?
            .port(settings.port)
            .credentials(Credentials::new(
                settings.user.clone(),
                settings.password.clone(),
            ))
            .build();
        Ok(Self { transport })
    }
}

#[async_trait::async_trait]
impl EmailPort for LettreEmailAdapter {
    async fn send(&self, message: EmailMessage) -> Result<(), SendEmailError> {
        let email = Message::builder()
            .from(message.from)
            .to(message.to)
            .subject(message.subject)
            .header(ContentType::TEXT_HTML)
            .body(message.html)
            .map_err(|e| SendEmailError::Build(e.to_string()))?;
        self.transport
            .send(email)
            .await
            .map_err(|e| SendEmailError::Transport(e.to_string()))?;
        Ok(())
    }

    async fn verify(&self) -> Result<(), SendEmailError> {
        match self.transport.test_connection().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(SendEmailError::Rejected),
            Err(e) => Err(SendEmailError::Transport(e.to_string())),
        }
    }
}

/// Checks the relay in the background. A failure is only logged; sends are still
/// attempted per request and report their own errors.
pub fn spawn_relay_check(port: ArcEmailPort) -> JoinHandle<()> {
    tokio::spawn(async move {
        match port.verify().await {
            Ok(()) => info!("SMTP relay is ready to send emails"),
            Err(e) => error!("SMTP relay verification failed: {}", e),
        }
    })
}

/// Records every attempted send. `fail_on` makes the n-th attempt (1-based) fail.
#[cfg(test)]
#[derive(Default, Clone)]
pub struct MockEmailPort {
    pub sent_messages: std::sync::Arc<std::sync::Mutex<Vec<EmailMessage>>>,
    pub fail_on: Option<usize>,
    pub verify_fails: bool,
}

#[cfg(test)]
impl MockEmailPort {
    pub fn failing_on(attempt: usize) -> Self {
        Self {
            fail_on: Some(attempt),
            ..Self::default()
        }
    }

    pub fn failing_verify() -> Self {
        Self {
            verify_fails: true,
            ..Self::default()
        }
    }

    pub fn get_messages(&self) -> Vec<EmailMessage> {
        self.sent_messages.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait::async_trait]
impl EmailPort for MockEmailPort {
    async fn send(&self, message: EmailMessage) -> Result<(), SendEmailError> {
        let attempt = {
            let mut sent = self.sent_messages.lock().unwrap();
            sent.push(message);
            sent.len()
        };
        if self.fail_on == Some(attempt) {
            return Err(SendEmailError::Transport("mock relay refused".to_string()));
        }
        Ok(())
    }

    async fn verify(&self) -> Result<(), SendEmailError> {
        if self.verify_fails {
            return Err(SendEmailError::Rejected);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> SmtpSettings {
        SmtpSettings {
            host: "smtp.gmail.com".to_string(),
            port: 465,
            user: "admin@abmgroups.in".to_string(),
            password: "secret".to_string(),
        }
    }

    #[tokio::test]
    async fn test_adapter_builds_without_connecting() {
        assert!(LettreEmailAdapter::new(&settings()).is_ok());
    }

    #[tokio::test]
    async fn test_mock_fails_only_requested_attempt() {
        let mock = MockEmailPort::failing_on(2);
        let message = EmailMessage {
            from: "ABM Groups <admin@abmgroups.in>".parse().unwrap(),
            to: "ravi@example.com".parse().unwrap(),
            subject: "Hi".to_string(),
            html: "<p>Hi</p>".to_string(),
        };

        assert!(mock.send(message.clone()).await.is_ok());
        assert!(matches!(
            mock.send(message.clone()).await,
            Err(SendEmailError::Transport(_))
        ));
        assert!(mock.send(message).await.is_ok());
        assert_eq!(mock.get_messages().len(), 3);
    }

    #[tokio::test]
    async fn test_relay_check_failure_is_not_fatal() {
        let mock = MockEmailPort::failing_verify();
        assert!(matches!(mock.verify().await, Err(SendEmailError::Rejected)));

        let handle = spawn_relay_check(std::sync::Arc::new(mock.clone()));
        assert!(handle.await.is_ok());
        assert!(mock.get_messages().is_empty());
    }
}
