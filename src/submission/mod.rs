/// Submission Layer
///
/// Submissions are immutable, append-only records of data entered against
/// a form, optionally tied to a workflow instance and task. This module
/// provides:
/// - Type definitions (Submission)
/// - The recorder that validates and persists submitted data

// Submission type definitions
pub mod types;

// Validation and persistence of submitted form data
pub mod recorder;

// Re-export commonly used types
pub use recorder::SubmissionRecorder;
pub use types::Submission;
