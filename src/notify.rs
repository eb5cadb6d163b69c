//! Superfície de notificações (toasts e indicador de carregamento).

use std::sync::{Mutex, PoisonError};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

impl Toast {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Error,
            message: message.into(),
        }
    }
}

/// Fire-and-forget notification sink.
pub trait Notifier {
    fn toast(&self, toast: Toast);

    fn begin_loading(&self, _message: &str) {}

    fn end_loading(&self) {}
}

/// Records everything it receives. Used by tests and the demo summary.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    toasts: Mutex<Vec<Toast>>,
    loading: Mutex<Vec<String>>,
    active: Mutex<bool>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Messages passed to `begin_loading`, in order.
    pub fn loading_messages(&self) -> Vec<String> {
        self.loading
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_loading(&self) -> bool {
        *self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Notifier for MemoryNotifier {
    fn toast(&self, toast: Toast) {
        self.toasts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(toast);
    }

    fn begin_loading(&self, message: &str) {
        self.loading
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
        *self.active.lock().unwrap_or_else(PoisonError::into_inner) = true;
    }

    fn end_loading(&self) {
        *self.active.lock().unwrap_or_else(PoisonError::into_inner) = false;
    }
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn toast(&self, toast: Toast) {
        (**self).toast(toast);
    }

    fn begin_loading(&self, message: &str) {
        (**self).begin_loading(message);
    }

    fn end_loading(&self) {
        (**self).end_loading();
    }
}
