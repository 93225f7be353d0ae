//! Wizard state machine: Upload → Style → Concept → Progress → Results → {Refinement | Gallery}.
//!
//! A [`WizardSession`] owns everything one user session touches: selections, uploaded images,
//! the latest concept and result, pending notifications and the gallery. All transitions take
//! `&mut self`, so a session never has two relay calls in flight and a late response cannot
//! overwrite a newer one.

mod client;
mod session;

pub use client::{GatewayClient, StudioApi};
pub use session::{GenerationResult, WizardConfig, WizardSession};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Upload,
    Style,
    Concept,
    Progress,
    Results,
    Refinement,
    Gallery,
}

/// Which text the Concept step resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConceptMode {
    #[default]
    Manual,
    Generated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// User-facing message queued by a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}
