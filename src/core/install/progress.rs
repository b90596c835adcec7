use serde::{Deserialize, Serialize};

/// Stage of an installation run, as shown by the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallPhase {
    Downloading,
    Installing,
    Configuring,
}

/// Payload of the `install-progress` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    #[serde(rename = "status")]
    pub phase: InstallPhase,
    pub message: String,
    #[serde(rename = "progress")]
    pub percent: u8,
}

impl ProgressEvent {
    pub fn new(phase: InstallPhase, message: impl Into<String>, percent: u8) -> Self {
        Self {
            phase,
            message: message.into(),
            percent: percent.min(100),
        }
    }
}

/// Receives progress events in emission order. Delivery is fire-and-forget.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn emit(&self, event: ProgressEvent) {
        self(event)
    }
}

/// `round(100 * completed / total)`, clamped to 100. An empty batch is done.
pub fn percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let value = (completed as f64 * 100.0 / total as f64).round();
    value.clamp(0.0, 100.0) as u8
}
