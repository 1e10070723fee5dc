//! Contact form handling
use std::sync::Arc;

use async_trait::async_trait;

use crate::{ContactMessage, Error};

/// Delivers validated contact form messages to the firm.
#[async_trait]
pub trait ContactNotifier: Send + Sync + 'static {
    async fn notify(&self, message: &ContactMessage) -> Result<(), Error>;
}

/// Records contact messages in the log instead of sending them anywhere.
#[derive(Debug, Clone, Default)]
pub struct TracingContactNotifier;

#[async_trait]
impl ContactNotifier for TracingContactNotifier {
    async fn notify(&self, message: &ContactMessage) -> Result<(), Error> {
        tracing::info!(
            subject = %message.subject(),
            reply_to = %message.email.trim(),
            "Contact form message received"
        );
        tracing::debug!(body = %message.body_text(), "Contact form message body");
        Ok(())
    }
}

pub struct ContactService {
    notifier: Arc<dyn ContactNotifier>,
}

impl ContactService {
    pub fn new(notifier: Arc<dyn ContactNotifier>) -> Self {
        Self { notifier }
    }

    /// Validate a message and pass it to the notifier
    pub async fn submit(&self, message: ContactMessage) -> Result<(), Error> {
        message.validate()?;
        self.notifier.notify(&message).await
    }
}

impl Default for ContactService {
    fn default() -> Self {
        Self::new(Arc::new(TracingContactNotifier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        subjects: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ContactNotifier for RecordingNotifier {
        async fn notify(&self, message: &ContactMessage) -> Result<(), Error> {
            self.subjects.lock().await.push(message.subject());
            Ok(())
        }
    }

    fn message() -> ContactMessage {
        ContactMessage {
            first_name: "Sam".to_string(),
            last_name: "Lee".to_string(),
            email: "sam@example.com".to_string(),
            phone: Some("555-0199".to_string()),
            message: "Please call me about a contract.".to_string(),
        }
    }

    #[tokio::test]
    async fn test_valid_message_is_delivered() {
        let notifier = Arc::new(RecordingNotifier::default());
        let service = ContactService::new(notifier.clone());

        service.submit(message()).await.unwrap();

        assert_eq!(
            *notifier.subjects.lock().await,
            vec!["New contact form message from Sam Lee".to_string()]
        );
    }

    #[tokio::test]
    async fn test_invalid_message_is_not_delivered() {
        let notifier = Arc::new(RecordingNotifier::default());
        let service = ContactService::new(notifier.clone());

        let result = service
            .submit(ContactMessage {
                message: String::new(),
                ..message()
            })
            .await;

        assert!(result.unwrap_err().is_validation_error());
        assert!(notifier.subjects.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_default_service_uses_tracing_notifier() {
        assert!(ContactService::default().submit(message()).await.is_ok());
    }
}
