//! Lamina View - Slice Algebra and Strided Views
//!
//! This crate turns Lamina payloads into usable arrays. A `Slice` describes
//! a Python-style `(start, stop, step)` selection that can be resolved
//! against a dimension and composed with other slices. `Vector` and `Matrix`
//! are zero-copy views over shared payloads; deriving a view, taking a row
//! or a column never copies elements, and writes through any view are seen
//! by every other view of the same payload.
//!
//! # Key Features
//! - Slice normalization, composition and index mapping
//! - Strided vectors with negative steps, contiguous row-major matrices
//! - Row/column extraction as vector views
//! - Elementwise, reduction and dense operations through the kernel
//! - Fixed binary layout for serializing views
//!
//! # Example
//! ```rust
//! use lamina_view::{Matrix, Slice};
//!
//! let m = Matrix::from_slice(&[1.0_f64, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3).unwrap();
//! let column = m.column_at(1);
//! assert_eq!(column.to_vec().unwrap(), vec![2.0, 5.0]);
//!
//! column.scale(10.0).unwrap();
//! assert_eq!(m.get(1, 1).unwrap(), 50.0);
//!
//! let s = Slice::range(-3, -9, -1).regulate(9);
//! assert_eq!(s.len(), Some(6));
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
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::should_implement_trait)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::float_cmp)]

// =============================================================================
// Modules
// =============================================================================

pub mod codec;
pub mod linalg;
pub mod matrix;
mod ops;
pub mod slice;
pub mod vector;

// =============================================================================
// Re-exports
// =============================================================================

pub use codec::Codec;
pub use lamina_core::{Error, Payload, Result};
pub use linalg::{mat_dot_vec, outer, update_outer, vec_dot_mat};
pub use matrix::Matrix;
pub use slice::{Bound, Slice};
pub use vector::Vector;

// =============================================================================
// Prelude
// =============================================================================

/// Convenient imports for common usage.
pub mod prelude {
    pub use crate::{
        mat_dot_vec, outer, update_outer, vec_dot_mat, Bound, Codec, Error, Matrix, Payload,
        Result, Slice, Vector,
    };
}
