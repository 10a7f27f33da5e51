/// Workflow Instance Layer
///
/// This module owns the execution of workflow instances. It provides:
/// - Type definitions (WorkflowInstance, InstanceStatus, InstanceView)
/// - The state machine driving creation and task-completion transitions
/// - Read views combining instance, workflow, task, and submission data

// Instance type definitions
pub mod types;

// Lifecycle state machine: start and complete-current-task
pub mod machine;

// Read views for external callers
pub mod query;

// Re-export commonly used types
pub use machine::InstanceStateMachine;
pub use query::InstanceQueryService;
pub use types::{CompletionOutcome, InstanceStatus, InstanceView, TaskDetail, WorkflowInstance, WorkflowSummary};
