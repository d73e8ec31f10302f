//! Servicio de notificaciones
//!
//! El núcleo solo conoce la capacidad abstracta `notify`. El envío es de
//! mejor esfuerzo: se ejecuta después de confirmar la unidad de trabajo y
//! sus errores se registran y se descartan.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use uuid::Uuid;

use crate::utils::errors::{AppError, AppResult};

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, recipient_email: &str, subject: &str, body: &str) -> AppResult<()>;
}

/// Mensaje pendiente de envío
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub recipient_email: String,
    pub subject: String,
    pub body: String,
}

impl Notification {
    pub fn new(recipient_email: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            recipient_email: recipient_email.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }
}

/// Enviar una tanda de notificaciones sin propagar fallos
pub async fn dispatch_all(notifier: &dyn Notifier, notifications: Vec<Notification>) {
    for notification in notifications {
        match notifier
            .notify(&notification.recipient_email, &notification.subject, &notification.body)
            .await
        {
            Ok(()) => tracing::debug!(
                "📧 Notificación enviada a {}: {}",
                notification.recipient_email,
                notification.subject
            ),
            Err(e) => tracing::warn!(
                "⚠️ No se pudo notificar a {} ({}): {}",
                notification.recipient_email,
                notification.subject,
                e
            ),
        }
    }
}

/// Notificador que solo deja rastro en los logs
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, recipient_email: &str, subject: &str, body: &str) -> AppResult<()> {
        tracing::info!("📧 [{}] {} - {}", recipient_email, subject, body);
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct RelayMessage<'a> {
    message_id: String,
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    body: &'a str,
}

/// Notificador que publica en un relay de correo vía HTTP
#[derive(Debug, Clone)]
pub struct HttpNotifier {
    client: Client,
    endpoint: String,
    from: String,
}

impl HttpNotifier {
    pub fn new(client: Client, endpoint: String, from: String) -> Self {
        Self { client, endpoint, from }
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn notify(&self, recipient_email: &str, subject: &str, body: &str) -> AppResult<()> {
        let message = RelayMessage {
            message_id: Uuid::new_v4().to_string(),
            from: &self.from,
            to: recipient_email,
            subject,
            body,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&message)
            .send()
            .await
            .map_err(|e| AppError::Notification(format!("relay unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Notification(format!(
                "relay responded with status {}",
                response.status()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FlakyNotifier {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Notifier for FlakyNotifier {
        async fn notify(&self, recipient_email: &str, _subject: &str, _body: &str) -> AppResult<()> {
            if recipient_email.starts_with("down") {
                return Err(AppError::Notification("smtp down".to_string()));
            }
            self.sent.lock().unwrap().push(recipient_email.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_dispatch_continues_after_failure() {
        let notifier = FlakyNotifier { sent: Mutex::new(Vec::new()) };

        dispatch_all(
            &notifier,
            vec![
                Notification::new("down@example.com", "a", "b"),
                Notification::new("ok@example.com", "a", "b"),
            ],
        )
        .await;

        assert_eq!(*notifier.sent.lock().unwrap(), vec!["ok@example.com".to_string()]);
    }

    #[tokio::test]
    async fn test_log_notifier_never_fails() {
        assert!(LogNotifier.notify("x@example.com", "s", "b").await.is_ok());
    }
}
