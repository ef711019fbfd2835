//! Success and error messages shown to the user.
//!
//! Alerts are rendered into the `#alert-container` element of the base page
//! with an out-of-band swap, so any HTMX response can carry one.

use maud::{Markup, html};

/// A message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alert {
    Success { message: String, details: String },
    Error { message: String, details: String },
}

impl Alert {
    /// Create a new success alert
    pub fn success(message: &str, details: &str) -> Self {
        Self::Success {
            message: message.to_owned(),
            details: details.to_owned(),
        }
    }

    /// Create a new error alert
    pub fn error(message: &str, details: &str) -> Self {
        Self::Error {
            message: message.to_owned(),
            details: details.to_owned(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Alert::Success { message, .. } | Alert::Error { message, .. } => message,
        }
    }

    pub fn into_html(self) -> Markup {
        let (container_style, message, details) = match self {
            Alert::Success { message, details } => (
                "flex items-start gap-3 p-4 rounded-lg shadow-lg text-green-800 \
                bg-green-50 border border-green-300 dark:bg-gray-800 \
                dark:text-green-400 dark:border-green-800",
                message,
                details,
            ),
            Alert::Error { message, details } => (
                "flex items-start gap-3 p-4 rounded-lg shadow-lg text-red-800 \
                bg-red-50 border border-red-300 dark:bg-gray-800 \
                dark:text-red-400 dark:border-red-800",
                message,
                details,
            ),
        };

        html! {
            div
                id="alert-container"
                hx-swap-oob="true"
                class="w-full max-w-md px-4"
                style="position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
            {
                div class=(container_style) role="alert"
                {
                    div class="flex-1"
                    {
                        p class="text-sm font-medium" { (message) }

                        @if !details.is_empty() {
                            p class="mt-1 text-sm opacity-80" { (details) }
                        }
                    }

                    button
                        type="button"
                        class="ms-auto -mx-1.5 -my-1.5 rounded-lg p-1.5 inline-flex h-8 w-8 opacity-70 hover:opacity-100"
                        aria-label="Close"
                        onclick="document.getElementById('alert-container').replaceChildren()"
                    {
                        "✕"
                    }
                }
            }
        }
    }
}

/// Somewhere alerts can be sent for display.
pub trait Notifier {
    fn notify(&mut self, alert: Alert);
}

/// Collects the alerts raised while handling one request.
#[derive(Debug, Default)]
pub struct AlertBuffer {
    alerts: Vec<Alert>,
}

impl AlertBuffer {
    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    /// The alert to show, the latest one wins since they share one container.
    pub fn into_html(self) -> Markup {
        match self.alerts.into_iter().last() {
            Some(alert) => alert.into_html(),
            None => html! {},
        }
    }
}

impl Notifier for AlertBuffer {
    fn notify(&mut self, alert: Alert) {
        self.alerts.push(alert);
    }
}
