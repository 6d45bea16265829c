use chrono::{DateTime, Utc};
use std::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl ToastLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToastLevel::Info => "info",
            ToastLevel::Success => "success",
            ToastLevel::Warning => "warning",
            ToastLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub id: Uuid,
    pub message: String,
    pub level: ToastLevel,
    pub created_at: DateTime<Utc>,
}

/// Transient, non-blocking user feedback.
pub trait Notifier: Send + Sync {
    fn notify(&self, level: ToastLevel, message: String);

    fn success(&self, message: &str) {
        self.notify(ToastLevel::Success, message.to_string());
    }

    fn error(&self, message: &str) {
        self.notify(ToastLevel::Error, message.to_string());
    }
}

/// Keeps every toast until it is dismissed.
#[derive(Debug, Default)]
pub struct Toasts(Mutex<Vec<Toast>>);

impl Toasts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self) -> Vec<Toast> {
        self.0.lock().map(|t| t.clone()).unwrap_or_default()
    }

    pub fn remove(&self, id: Uuid) {
        if let Ok(mut toasts) = self.0.lock() {
            if let Some(index) = toasts.iter().position(|t| t.id == id) {
                toasts.remove(index);
            }
        }
    }

    /// Remove and return all pending toasts.
    pub fn drain(&self) -> Vec<Toast> {
        self.0
            .lock()
            .map(|mut t| std::mem::take(&mut *t))
            .unwrap_or_default()
    }
}

impl Notifier for Toasts {
    fn notify(&self, level: ToastLevel, message: String) {
        let toast = Toast {
            id: Uuid::new_v4(),
            message,
            level,
            created_at: Utc::now(),
        };
        if let Ok(mut toasts) = self.0.lock() {
            toasts.push(toast);
        }
    }
}

/// Emits notifications as log events; used by the terminal front end.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, level: ToastLevel, message: String) {
        match level {
            ToastLevel::Info | ToastLevel::Success => info!(level = level.as_str(), "{}", message),
            ToastLevel::Warning => warn!(level = level.as_str(), "{}", message),
            ToastLevel::Error => error!(level = level.as_str(), "{}", message),
        }
    }
}
