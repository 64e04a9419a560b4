//! # Lamina - Shared Numeric Payloads with Zero-Copy Views
//!
//! Lamina is a small array substrate: reference-counted numeric payloads,
//! a composable slice algebra, and strided vector and matrix views that
//! share payloads instead of copying them.
//!
//! ## Core Features
//!
//! - **Payloads**: reference-counted, aligned buffers; owned, external or
//!   static storage; shrinking only while uniquely owned
//! - **Slices**: Python-style `(start, stop, step)` with regulation against a
//!   dimension, composition and ordinal mapping
//! - **Views**: strided vectors, contiguous row-major matrices, rows and
//!   columns as vector views over the same payload
//! - **Kernel**: elementwise maps, reductions, GEMM/GEMV and rank-1 updates
//!   over strided operands
//! - **Codec**: fixed native-endian binary layout for views
//!
//! # Quick Start
//!
//! ```rust
//! use lamina::prelude::*;
//!
//! let data = [-10.0_f64, -1.0, -10.0, 1.0, -10.0, 2.0, -10.0];
//! let payload = Payload::from_slice(&data).unwrap();
//! let v = Vector::construct_prealloc(&payload, 1, 3, 2);
//! assert_eq!(v.to_vec().unwrap(), vec![-1.0, 1.0, 2.0]);
//! assert_eq!(payload.ref_count(), 2);
//!
//! let mut bytes = Vec::new();
//! v.serialize(&mut bytes).unwrap();
//! let (copy, _) = Vector::<f64>::deserialize(&bytes).unwrap();
//! assert!(copy.is_close(&v, 1e-12).unwrap());
//! ```
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

#![warn(missing_docs)]
#![warn(clippy::all)]

// =============================================================================
// Re-exports
// =============================================================================

pub use lamina_core::{
    config, Allocator, Config, CpuKernel, DType, DefaultAllocator, Error, Float, Kernel, Numeric,
    Payload, PayloadFlags, Result, Scalar, TrackingAllocator,
};
pub use lamina_view::{
    mat_dot_vec, outer, update_outer, vec_dot_mat, Bound, Codec, Matrix, Slice, Vector,
};

// =============================================================================
// Prelude
// =============================================================================

/// Convenient imports for common usage.
pub mod prelude {
    pub use crate::{
        mat_dot_vec, outer, update_outer, vec_dot_mat, Bound, Codec, Config, Error, Float, Matrix,
        Payload, Result, Scalar, Slice, Vector,
    };
}
