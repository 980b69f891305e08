//! Maps `Box<dyn Error>` from trait boundaries to typed `SagError`.
//!
//! The traits in `sag_traits` use `Box<dyn Error + Send + Sync>`; this module
//! converts those to our typed error enum, with an optional feature-gated path
//! for `sag_hardware::error::HwError` downcasting.

use crate::error::SagError;

/// Map a trait-boundary error to a typed `SagError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> SagError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<sag_hardware::error::HwError>() {
            return match hw {
                sag_hardware::error::HwError::Timeout => SagError::Timeout,
                sag_hardware::error::HwError::Io(io) => SagError::Io(io.to_string()),
                other => SagError::Sensor(other.to_string()),
            };
        }
    }

    // Fallback: string-based detection
    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        SagError::Timeout
    } else {
        SagError::Sensor(s)
    }
}
