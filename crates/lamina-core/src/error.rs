//! Error Types - Lamina Core Error Handling
//!
//! Provides the error type shared by every Lamina crate: payload lifecycle
//! failures, shape and bounds violations, aliasing rejections and codec
//! errors.
//!
//! # Key Features
//! - Unified error type for payload, view, kernel and codec operations
//! - Detailed error context for debugging
//! - Integration with `std::error::Error`
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

/// The main error type for Lamina operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Shape mismatch between operands.
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// The expected shape.
        expected: Vec<usize>,
        /// The actual shape.
        actual: Vec<usize>,
    },

    /// Index out of bounds.
    #[error("Index out of bounds: index {index} for dimension of size {size}")]
    IndexOutOfBounds {
        /// The invalid index.
        index: isize,
        /// The size of the dimension.
        size: usize,
    },

    /// A payload of zero elements was requested.
    #[error("Payload length must be greater than zero")]
    ZeroLength,

    /// The payload handle is NULL or has been released.
    #[error("Invalid payload: handle is null or released")]
    InvalidPayload,

    /// The view is the NULL view or otherwise unusable.
    #[error("Invalid view: {message}")]
    InvalidView {
        /// Description of why the view is unusable.
        message: String,
    },

    /// Memory allocation failed.
    #[error("Memory allocation failed: requested {size} bytes aligned to {align}")]
    AllocationFailed {
        /// The requested size in bytes.
        size: usize,
        /// The requested alignment in bytes.
        align: usize,
    },

    /// The requested memory layout cannot be represented.
    #[error("Invalid layout: {len} elements aligned to {align}")]
    InvalidLayout {
        /// Requested element count.
        len: usize,
        /// Requested alignment in bytes.
        align: usize,
    },

    /// The payload wraps external memory and cannot be resized.
    #[error("Payload is not resizable")]
    NotResizable,

    /// Shrinking was requested while other owners hold the payload.
    #[error("Cannot shrink payload from {len} to {requested} while shared by {owners} owners")]
    ShrinkWhileShared {
        /// Current length.
        len: usize,
        /// Requested length.
        requested: usize,
        /// Number of live owners.
        owners: usize,
    },

    /// A result operand overlaps an input operand on the same payload.
    #[error("Aliasing violation: {message}")]
    Aliasing {
        /// Description of the overlapping operands.
        message: String,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Description of the serialization error.
        message: String,
    },

    /// Configuration could not be loaded or is inconsistent.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Invalid operation for the given operands.
    #[error("Invalid operation: {message}")]
    InvalidOperation {
        /// Description of why the operation is invalid.
        message: String,
    },
}

// =============================================================================
// Result Type
// =============================================================================

/// A specialized Result type for Lamina operations.
pub type Result<T> = core::result::Result<T, Error>;

// =============================================================================
// Helper Functions
// =============================================================================

impl Error {
    /// Creates a new shape mismatch error.
    #[must_use]
    pub fn shape_mismatch(expected: &[usize], actual: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }

    /// Creates a new invalid view error.
    #[must_use]
    pub fn invalid_view(message: impl Into<String>) -> Self {
        Self::InvalidView {
            message: message.into(),
        }
    }

    /// Creates a new aliasing error.
    #[must_use]
    pub fn aliasing(message: impl Into<String>) -> Self {
        Self::Aliasing {
            message: message.into(),
        }
    }

    /// Creates a new serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Creates a new configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a new invalid operation error.
    #[must_use]
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
