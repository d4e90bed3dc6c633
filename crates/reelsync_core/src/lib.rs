//! Reelsync core: pure state machines and view-model helpers.
//!
//! Nothing in this crate performs I/O or awaits. The engine crate drives these
//! types from its async tasks and re-validates authority (task generation,
//! monitor membership) through them after every suspension point.
mod batch;
mod effect;
mod known;
mod links;
mod log_ring;
mod media;
mod msg;
mod page;
mod schedule;
mod state;
mod update;
mod view_model;

pub use batch::{BatchResults, BatchTask, ItemOutcome, StartReceipt, TaskId};
pub use effect::{MonitorStep, TerminalKind};
pub use known::{detect_new, KnownIdSet};
pub use links::{plan_merge, MergeOutcome, MergePlan};
pub use log_ring::{LogEntry, LogRing, LogStatus, DEFAULT_LOG_CAPACITY};
pub use media::{ExecutionStatus, MediaType, SubscriptionId, SubscriptionSnapshot};
pub use msg::MonitorMsg;
pub use page::{page_bounds, paginate, total_pages, Page, PageKey};
pub use schedule::{AutoSearchSettings, SchedulerState, DEFAULT_INTERVAL_HOURS};
pub use state::{
    MonitorBoard, MonitorEntry, MonitorPhase, DEFAULT_CHECK_INTERVAL, DEFAULT_MAX_CHECKS,
};
pub use update::update;
pub use view_model::{MonitorStatusView, MonitorTaskView};
