//! Domain model for Rentfold workflow automation.

#![forbid(unsafe_code)]

mod notification;
mod workflow;

pub use notification::NotificationSeverity;
pub use workflow::{
    WorkflowAction, WorkflowDefinition, WorkflowDefinitionInput, WorkflowTrigger,
};
