//! Logging utilities
//!
//! This module provides standardized logging functions for engine operations.

/// Log an operation start with consistent format
///
/// # Arguments
/// * `operation` - Description of the operation
/// * `study_id` - Study the operation runs against
pub fn log_operation_start(operation: &str, study_id: &str) {
    log::info!("{operation} for study {study_id}");
}

/// Log an operation completion with consistent format
///
/// # Arguments
/// * `operation` - Description of the operation
/// * `study_id` - Study the operation ran against
/// * `items` - Number of items processed
/// * `elapsed` - Optional elapsed time
pub fn log_operation_complete(
    operation: &str,
    study_id: &str,
    items: usize,
    elapsed: Option<std::time::Duration>,
) {
    if let Some(duration) = elapsed {
        log::info!("Successfully {operation} {items} items for study {study_id} in {duration:?}");
    } else {
        log::info!("Successfully {operation} {items} items for study {study_id}");
    }
}

/// Log a warning with consistent format
///
/// # Arguments
/// * `message` - Warning message
/// * `context` - Optional identifier the warning relates to
pub fn log_warning(message: &str, context: Option<&str>) {
    if let Some(context) = context {
        log::warn!("{message}: {context}");
    } else {
        log::warn!("{message}");
    }
}
