/// Form Definition Layer
///
/// Forms are tenant-scoped, immutable-once-created field schemas that
/// workflow tasks and submissions reference. This module provides:
/// - Type definitions (FormDefinition)
/// - SQLite persistence with cascade deletion of submissions

// Form type definitions
pub mod types;

// SQLite persistence for form definitions
pub mod storage;

// Re-export commonly used types
pub use storage::{FormDeletion, FormStore};
pub use types::FormDefinition;
