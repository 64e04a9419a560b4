//! Lamina Core - Foundation Layer for the Lamina Array Substrate
//!
//! This crate provides the memory model underneath every Lamina view:
//! reference-counted payloads, the allocation policy that creates them, the
//! element type system, runtime configuration, and the numeric kernels that
//! views drive through strided operands.
//!
//! # Key Features
//! - Reference-counted payloads with sole-owner shrinking
//! - Configurable, aligned, zero-initialized allocation
//! - Type-safe element system (f32, f64, i32, i64, u8)
//! - Strided kernel interface with a parallel CPU implementation
//!
//! # Example
//! ```rust
//! use lamina_core::{Payload, PayloadFlags};
//!
//! let payload = Payload::<f64>::construct(1024).unwrap();
//! assert!(payload.flags().contains(PayloadFlags::SHRINKABLE));
//! ```
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Numeric/indexing-specific allowances
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::missing_safety_doc)]
#![allow(clippy::new_without_default)]

// =============================================================================
// Modules
// =============================================================================

pub mod allocator;
pub mod config;
pub mod dtype;
pub mod error;
pub mod kernel;
pub mod payload;

// =============================================================================
// Re-exports
// =============================================================================

pub use allocator::{Allocator, DefaultAllocator, TrackingAllocator};
pub use config::Config;
pub use dtype::{DType, Float, Numeric, Scalar};
pub use error::{Error, Result};
pub use kernel::{
    Base, BaseMut, Binary, CpuKernel, Kernel, Strided, Strided2, Strided2Mut, StridedMut, Unary,
};
pub use payload::{Payload, PayloadFlags, PayloadReadGuard, PayloadWriteGuard};

// =============================================================================
// Prelude
// =============================================================================

/// Convenient imports for common usage.
pub mod prelude {
    pub use crate::{
        Config, CpuKernel, DType, Error, Float, Kernel, Numeric, Payload, PayloadFlags, Result,
        Scalar,
    };
}
