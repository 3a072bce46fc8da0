//! Completion notifications.
//!
//! One plain-text message is published per stored item. Publishing is
//! fire-and-forget from the pipeline's point of view: a failed publish is
//! logged by the caller and never fails the item.

use std::sync::Mutex;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotificationError {
    #[error("publish to {topic} failed: {reason}")]
    PublishFailed { topic: String, reason: String },
}

/// Fan-out channel for completion messages.
pub trait Notifier: Sync {
    fn publish(&self, topic: &str, message: &str) -> Result<(), NotificationError>;
}

impl<T: Notifier + ?Sized> Notifier for &T {
    fn publish(&self, topic: &str, message: &str) -> Result<(), NotificationError> {
        (**self).publish(topic, message)
    }
}

/// Message announcing that `processed_key` was written to `container`.
pub fn completion_message(container: &str, processed_key: &str) -> String {
    format!("Image processed and uploaded to {container}: {processed_key}")
}

/// Notifier that emits each message as a structured `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn publish(&self, topic: &str, message: &str) -> Result<(), NotificationError> {
        info!(topic, message, "notification published");
        Ok(())
    }
}

/// A published message captured by [`MemoryNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub topic: String,
    pub message: String,
}

/// Notifier that keeps every message in memory, in publish order.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    published: Mutex<Vec<Published>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> Vec<Published> {
        self.published
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Just the message bodies, sorted. Workers publish in no fixed order.
    pub fn sorted_messages(&self) -> Vec<String> {
        let mut messages: Vec<String> = self.published().into_iter().map(|p| p.message).collect();
        messages.sort();
        messages
    }
}

impl Notifier for MemoryNotifier {
    fn publish(&self, topic: &str, message: &str) -> Result<(), NotificationError> {
        self.published
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Published {
                topic: topic.to_string(),
                message: message.to_string(),
            });
        Ok(())
    }
}
