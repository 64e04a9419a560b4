//! Binary Codec - Fixed Layout for Views
//!
//! Serializes a view's logical shape and elements into a flat byte buffer:
//!
//! ```text
//! [total_bytes: usize][dim_1: isize][dim_2: isize, matrices only][elements]
//! ```
//!
//! All integers and elements are native-endian and tightly packed, so the
//! format only round-trips between builds of the same architecture. Strided
//! views are written in logical order; a decoded view is always contiguous
//! and owns a fresh payload.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::mem::size_of;

use lamina_core::{Error, Result, Scalar};

use crate::matrix::Matrix;
use crate::vector::Vector;

const WORD: usize = size_of::<usize>();
const INDEX: usize = size_of::<isize>();

// =============================================================================
// Codec Trait
// =============================================================================

/// Views that can be written to and read from the binary layout.
///
/// Implementors supply their dimensions, their elements in logical order and
/// a way to rebuild themselves from both; the framing is shared.
pub trait Codec: Sized {
    /// Element type written after the header.
    type Elem: Scalar;

    /// Number of dimension words in the header.
    const RANK: usize;

    /// Logical dimensions, `RANK` of them.
    fn dims(&self) -> Vec<usize>;

    /// Elements in row-major/linear order.
    fn elements(&self) -> Result<Vec<Self::Elem>>;

    /// Builds a fresh contiguous view.
    fn assemble(dims: &[usize], data: &[Self::Elem]) -> Result<Self>;

    /// Bytes needed to serialize this view, header included.
    fn serial_size(&self) -> usize {
        let count: usize = self.dims().iter().product();
        header_size(Self::RANK) + count * size_of::<Self::Elem>()
    }

    /// Appends the serialized view to `out`, returning the bytes written.
    fn serialize(&self, out: &mut Vec<u8>) -> Result<usize> {
        let start = out.len();
        out.resize(start + self.serial_size(), 0);
        let written = self.serialize_into(&mut out[start..]);
        if written.is_err() {
            out.truncate(start);
        }
        written
    }

    /// Writes the serialized view to the front of `buf`, returning the
    /// bytes written.
    fn serialize_into(&self, buf: &mut [u8]) -> Result<usize> {
        let data = self.elements()?;
        let total = self.serial_size();
        if buf.len() < total {
            return Err(Error::serialization(format!(
                "buffer holds {} bytes, view needs {total}",
                buf.len()
            )));
        }

        buf[..WORD].copy_from_slice(&total.to_ne_bytes());
        let mut at = WORD;
        for dim in self.dims() {
            buf[at..at + INDEX].copy_from_slice(&(dim as isize).to_ne_bytes());
            at += INDEX;
        }
        buf[at..total].copy_from_slice(bytemuck::cast_slice(&data));
        tracing::trace!(bytes = total, rank = Self::RANK, "view serialized");
        Ok(total)
    }

    /// Reads one view from the front of `bytes`.
    ///
    /// Returns the view and the number of bytes consumed; trailing bytes
    /// are left for the caller.
    fn deserialize(bytes: &[u8]) -> Result<(Self, usize)> {
        let header = header_size(Self::RANK);
        if bytes.len() < header {
            return Err(Error::serialization("input shorter than the header"));
        }
        let total = usize::from_ne_bytes(word(bytes, 0));

        let mut dims = Vec::with_capacity(Self::RANK);
        let mut count = 1_usize;
        for k in 0..Self::RANK {
            let dim = isize::from_ne_bytes(word(bytes, WORD + k * INDEX));
            if dim <= 0 {
                return Err(Error::serialization(format!("dimension {k} is {dim}")));
            }
            count = count
                .checked_mul(dim as usize)
                .ok_or_else(|| Error::serialization("element count overflows"))?;
            dims.push(dim as usize);
        }

        let expected = count
            .checked_mul(size_of::<Self::Elem>())
            .and_then(|n| n.checked_add(header))
            .ok_or_else(|| Error::serialization("byte length overflows"))?;
        if total != expected {
            return Err(Error::serialization(format!(
                "header records {total} bytes, dimensions imply {expected}"
            )));
        }
        if bytes.len() < total {
            return Err(Error::serialization(format!(
                "input holds {} bytes, header records {total}",
                bytes.len()
            )));
        }

        let mut data = vec![Self::Elem::default(); count];
        bytemuck::cast_slice_mut::<Self::Elem, u8>(&mut data)
            .copy_from_slice(&bytes[header..total]);
        Ok((Self::assemble(&dims, &data)?, total))
    }
}

fn header_size(rank: usize) -> usize {
    WORD + rank * INDEX
}

fn word<const N: usize>(bytes: &[u8], at: usize) -> [u8; N] {
    let mut out = [0_u8; N];
    out.copy_from_slice(&bytes[at..at + N]);
    out
}

// =============================================================================
// Implementations
// =============================================================================

impl<T: Scalar> Codec for Vector<T> {
    type Elem = T;
    const RANK: usize = 1;

    fn dims(&self) -> Vec<usize> {
        vec![self.len()]
    }

    fn elements(&self) -> Result<Vec<T>> {
        self.to_vec()
    }

    fn assemble(dims: &[usize], data: &[T]) -> Result<Self> {
        debug_assert_eq!(dims, [data.len()]);
        Self::from_slice(data)
    }
}

impl<T: Scalar> Codec for Matrix<T> {
    type Elem = T;
    const RANK: usize = 2;

    fn dims(&self) -> Vec<usize> {
        self.shape().to_vec()
    }

    fn elements(&self) -> Result<Vec<T>> {
        self.to_vec()
    }

    fn assemble(dims: &[usize], data: &[T]) -> Result<Self> {
        Self::from_slice(data, dims[0], dims[1])
    }
}

// =============================================================================
// Tests
// =============================================================================
