use async_trait::async_trait;

use crate::utils::IsTransient;

// ============================================================================
// Notifier Boundary
// ============================================================================
//
// Delivers a text message to an opaque address (a messenger chat id, a phone
// number...). Implementations report failures; the dispatcher decides what to
// do with them, and it never lets them reach a caller.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    #[error("Notifier unavailable: {0}")]
    Unavailable(String),

    #[error("Message rejected for {address}: {reason}")]
    Rejected { address: String, reason: String },
}

impl IsTransient for NotifierError {
    fn is_transient(&self) -> bool {
        matches!(self, NotifierError::Unavailable(_))
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_message(&self, address: &str, text: &str) -> Result<(), NotifierError>;
}

/// Writes messages to the log instead of a messenger. Used by the demo binary.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_message(&self, address: &str, text: &str) -> Result<(), NotifierError> {
        tracing::info!(address = %address, text = %text, "📨 Notification");
        Ok(())
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct RecordingNotifier {
        sent: Mutex<Vec<(String, String)>>,
    }

    impl RecordingNotifier {
        pub fn sent(&self) -> Vec<(String, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send_message(&self, address: &str, text: &str) -> Result<(), NotifierError> {
            self.sent.lock().unwrap().push((address.to_string(), text.to_string()));
            Ok(())
        }
    }

    /// Always unavailable; counts how often it was tried.
    #[derive(Default)]
    pub struct FailingNotifier {
        pub attempts: AtomicU32,
    }

    impl FailingNotifier {
        pub fn attempts(&self) -> u32 {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn send_message(&self, _address: &str, _text: &str) -> Result<(), NotifierError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(NotifierError::Unavailable("connection refused".into()))
        }
    }

    /// Accepts the message and never answers.
    #[derive(Default)]
    pub struct HangingNotifier {
        pub attempts: AtomicU32,
    }

    impl HangingNotifier {
        pub fn attempts(&self) -> u32 {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Notifier for HangingNotifier {
        async fn send_message(&self, _address: &str, _text: &str) -> Result<(), NotifierError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            std::future::pending::<()>().await;
            Ok(())
        }
    }
}
