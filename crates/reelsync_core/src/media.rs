use std::fmt;

/// Subscription-manager identifier for a subscription.
pub type SubscriptionId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    Movie,
    Tv,
}

impl MediaType {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "movie" => Some(MediaType::Movie),
            "tv" | "series" => Some(MediaType::Tv),
            _ => None,
        }
    }

    /// Serial media is tracked per unit (episode); singular media is binary.
    pub fn is_serial(self) -> bool {
        matches!(self, MediaType::Tv)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Downstream execution state of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionStatus {
    #[default]
    Pending,
    Running,
    Success,
    Failed,
}

impl ExecutionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionStatus::Pending => "pending",
            ExecutionStatus::Running => "running",
            ExecutionStatus::Success => "success",
            ExecutionStatus::Failed => "failed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" | "queued" => Some(ExecutionStatus::Pending),
            "running" => Some(ExecutionStatus::Running),
            "success" | "completed" => Some(ExecutionStatus::Success),
            "failed" | "error" => Some(ExecutionStatus::Failed),
            _ => None,
        }
    }
}

/// Read-only projection of a subscription as reported by the subscription
/// manager. Never mutated locally; changes are written back through the
/// manager and observed on the next fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionSnapshot {
    pub id: SubscriptionId,
    pub external_id: String,
    pub title: String,
    pub media_type: MediaType,
    pub execution: ExecutionStatus,
    pub subscribed_units: u32,
    pub total_units: u32,
    pub links: Vec<String>,
}

impl SubscriptionSnapshot {
    pub fn is_complete(&self) -> bool {
        if self.media_type.is_serial() {
            self.total_units > 0 && self.subscribed_units >= self.total_units
        } else {
            self.subscribed_units > 0
        }
    }

    pub fn missing_units(&self) -> u32 {
        if self.media_type.is_serial() {
            self.total_units.saturating_sub(self.subscribed_units)
        } else {
            u32::from(self.subscribed_units == 0)
        }
    }
}
