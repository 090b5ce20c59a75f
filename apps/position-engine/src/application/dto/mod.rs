//! Data Transfer Objects
//!
//! Commands into and outcomes out of the orchestrator.

mod outcome_dto;
mod signal_dto;

pub use outcome_dto::{
    AdjustOutcome, ChildOrderIds, CloseAllOutcome, ClosePositionOutcome, FailedClose,
    OpenPositionOutcome, OpenStatus, ReversalSummary,
};
pub use signal_dto::OpenPositionCommand;
