//! Error types for the timing recorder
//!
//! Copyright (c) 2025 Apimapper Team
//! Licensed under the Apache-2.0 license

use thiserror::Error;

/// Misuse of the timing recorder
///
/// These signal defects in the calling code rather than user-facing
/// conditions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimingError {
    /// A span handle was closed a second time
    #[error("span '{operation}' (#{id}) is already closed")]
    DoubleClose { operation: String, id: u64 },

    /// The process-wide recorder was configured after first use
    #[error("global timing recorder is already initialized")]
    AlreadyInitialized,
}
