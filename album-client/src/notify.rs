//! Transient user notifications.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for ToastLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ToastLevel::Info => "info",
            ToastLevel::Success => "success",
            ToastLevel::Warning => "warning",
            ToastLevel::Error => "error",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

impl Toast {
    pub fn new(level: ToastLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(ToastLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(ToastLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(ToastLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ToastLevel::Error, message)
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, toast: Toast);
}

impl<T: Notifier + ?Sized> Notifier for Arc<T> {
    fn notify(&self, toast: Toast) {
        (**self).notify(toast)
    }
}

/// Emits toasts as log events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, toast: Toast) {
        match toast.level {
            ToastLevel::Info | ToastLevel::Success => info!(level = %toast.level, "{}", toast.message),
            ToastLevel::Warning => warn!("{}", toast.message),
            ToastLevel::Error => error!("{}", toast.message),
        }
    }
}

/// Records toasts in order.
#[derive(Debug, Default)]
pub struct ToastLog {
    toasts: Mutex<Vec<Toast>>,
}

impl ToastLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<Toast> {
        self.toasts.lock().clone()
    }

    pub fn take(&self) -> Vec<Toast> {
        std::mem::take(&mut *self.toasts.lock())
    }

    pub fn messages(&self) -> Vec<String> {
        self.toasts.lock().iter().map(|t| t.message.clone()).collect()
    }
}

impl Notifier for ToastLog {
    fn notify(&self, toast: Toast) {
        self.toasts.lock().push(toast);
    }
}
