//! CPU Kernel - Host Implementation of the Strided Primitives
//!
//! Provides the CPU implementation of `Kernel`. Unit-stride operands that do
//! not overlap their output are processed as slices (in parallel above the
//! configured threshold); everything else walks the strides directly.
//!
//! # Key Features
//! - Multi-threaded execution via rayon
//! - matrixmultiply crate for GEMM, GEMV and rank-1 updates
//! - Arbitrary and negative strides, stride-0 broadcasting
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::sync::OnceLock;

use rayon::prelude::*;

use super::{
    disjoint, Binary, Kernel, Strided, Strided2, Strided2Mut, StridedMut, Unary,
};
use crate::config;
use crate::dtype::Float;
use crate::error::{Error, Result};

// =============================================================================
// CPU Kernel Struct
// =============================================================================

/// CPU kernel for view arithmetic.
#[derive(Debug, Clone, Copy)]
pub struct CpuKernel {
    parallel_threshold: usize,
}

impl CpuKernel {
    /// Creates a kernel using the globally configured parallel threshold.
    #[must_use]
    pub fn new() -> Self {
        Self::with_threshold(config::global().kernel.parallel_threshold)
    }

    /// Creates a kernel with an explicit parallel threshold.
    #[must_use]
    pub const fn with_threshold(parallel_threshold: usize) -> Self {
        Self { parallel_threshold }
    }

    /// Returns the process-wide kernel instance.
    pub fn global() -> &'static Self {
        static KERNEL: OnceLock<CpuKernel> = OnceLock::new();
        KERNEL.get_or_init(Self::new)
    }

    /// Element count at which slice paths go parallel.
    #[must_use]
    pub const fn parallel_threshold(&self) -> usize {
        self.parallel_threshold
    }
}

impl Default for CpuKernel {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Slice Paths
// =============================================================================

impl CpuKernel {
    fn map_slice<T: Float>(&self, op: Unary, x: &[T], y: &mut [T]) {
        debug_assert_eq!(x.len(), y.len());

        if y.len() >= self.parallel_threshold {
            y.par_iter_mut()
                .zip(x.par_iter())
                .for_each(|(d, &v)| *d = op.apply(v));
        } else {
            for (d, &v) in y.iter_mut().zip(x) {
                *d = op.apply(v);
            }
        }
    }

    fn zip_slice<T: Float>(&self, op: Binary, a: &[T], b: &[T], y: &mut [T]) {
        debug_assert_eq!(a.len(), b.len());
        debug_assert_eq!(a.len(), y.len());

        if y.len() >= self.parallel_threshold {
            y.par_iter_mut()
                .zip(a.par_iter().zip(b.par_iter()))
                .for_each(|(d, (&l, &r))| *d = op.apply(l, r));
        } else {
            for (d, (&l, &r)) in y.iter_mut().zip(a.iter().zip(b)) {
                *d = op.apply(l, r);
            }
        }
    }

    fn sum_slice<T: Float>(&self, x: &[T], f: impl Fn(T) -> T + Sync) -> T {
        if x.len() >= self.parallel_threshold {
            x.par_iter().map(|&v| f(v)).reduce(T::zero, |l, r| l + r)
        } else {
            x.iter().fold(T::zero(), |acc, &v| acc + f(v))
        }
    }
}

// =============================================================================
// Kernel Trait Implementation
// =============================================================================

impl<T: Float> Kernel<T> for CpuKernel {
    fn unary(&self, op: Unary, x: Strided<'_, T>, mut y: StridedMut<'_, T>) {
        debug_assert_eq!(x.len(), y.len());

        if x.is_unit() && y.is_unit() && disjoint(&x.span(), &y.span()) {
            // SAFETY: unit strides and no overlap with the output.
            unsafe { self.map_slice(op, x.as_slice(), y.as_mut_slice()) };
            return;
        }
        for i in 0..y.len() {
            // SAFETY: operands are bounds-checked at construction.
            unsafe {
                let v = x.read(i);
                y.write(i, op.apply(v));
            }
        }
    }

    fn binary(&self, op: Binary, a: Strided<'_, T>, b: Strided<'_, T>, mut y: StridedMut<'_, T>) {
        debug_assert_eq!(a.len(), b.len());
        debug_assert_eq!(a.len(), y.len());

        let out = y.span();
        if a.is_unit()
            && b.is_unit()
            && y.is_unit()
            && disjoint(&a.span(), &out)
            && disjoint(&b.span(), &out)
        {
            // SAFETY: unit strides and no overlap with the output.
            unsafe { self.zip_slice(op, a.as_slice(), b.as_slice(), y.as_mut_slice()) };
            return;
        }
        for i in 0..y.len() {
            // SAFETY: operands are bounds-checked at construction and i < len.
            unsafe {
                let (l, r) = (a.read(i), b.read(i));
                y.write(i, op.apply(l, r));
            }
        }
    }

    fn dot(&self, x: Strided<'_, T>, y: Strided<'_, T>) -> T {
        debug_assert_eq!(x.len(), y.len());

        if x.is_unit() && y.is_unit() {
            // SAFETY: unit strides; both operands are only read.
            let (l, r) = unsafe { (x.as_slice(), y.as_slice()) };
            if l.len() >= self.parallel_threshold {
                return l
                    .par_iter()
                    .zip(r.par_iter())
                    .map(|(&a, &b)| a * b)
                    .reduce(T::zero, |a, b| a + b);
            }
            return l.iter().zip(r).fold(T::zero(), |acc, (&a, &b)| acc + a * b);
        }
        // SAFETY: operands are bounds-checked at construction and i < len.
        (0..x.len()).fold(T::zero(), |acc, i| unsafe { acc + x.read(i) * y.read(i) })
    }

    fn asum(&self, x: Strided<'_, T>) -> T {
        if x.is_unit() {
            // SAFETY: unit stride; the operand is only read.
            return self.sum_slice(unsafe { x.as_slice() }, |v| v.abs());
        }
        // SAFETY: the operand is bounds-checked at construction and i < len.
        (0..x.len()).fold(T::zero(), |acc, i| unsafe { acc + x.read(i).abs() })
    }

    fn nrm2(&self, x: Strided<'_, T>) -> T {
        // Scaled accumulation keeps large and tiny magnitudes representable.
        let mut scale = T::zero();
        let mut ssq = T::one();
        for i in 0..x.len() {
            // SAFETY: the operand is bounds-checked at construction.
            let v = unsafe { x.read(i) }.abs();
            if v != T::zero() {
                if scale < v {
                    let ratio = scale / v;
                    ssq = T::one() + ssq * ratio * ratio;
                    scale = v;
                } else {
                    let ratio = v / scale;
                    ssq = ssq + ratio * ratio;
                }
            }
        }
        scale * ssq.sqrt()
    }

    fn scal(&self, alpha: T, mut x: StridedMut<'_, T>) {
        if x.is_unit() {
            // SAFETY: unit stride; the operand is borrowed exclusively.
            let data = unsafe { x.as_mut_slice() };
            if data.len() >= self.parallel_threshold {
                data.par_iter_mut().for_each(|v| *v = *v * alpha);
            } else {
                data.iter_mut().for_each(|v| *v = *v * alpha);
            }
            return;
        }
        for i in 0..x.len() {
            // SAFETY: the operand is bounds-checked at construction and i < len.
            unsafe {
                let v = x.read(i);
                x.write(i, v * alpha);
            }
        }
    }

    fn axpy(&self, alpha: T, x: Strided<'_, T>, mut y: StridedMut<'_, T>) {
        debug_assert_eq!(x.len(), y.len());

        if x.is_unit() && y.is_unit() && disjoint(&x.span(), &y.span()) {
            // SAFETY: unit strides and no overlap with the output.
            let (src, dst) = unsafe { (x.as_slice(), y.as_mut_slice()) };
            if dst.len() >= self.parallel_threshold {
                dst.par_iter_mut()
                    .zip(src.par_iter())
                    .for_each(|(d, &s)| *d = alpha * s + *d);
            } else {
                for (d, &s) in dst.iter_mut().zip(src) {
                    *d = alpha * s + *d;
                }
            }
            return;
        }
        for i in 0..y.len() {
            // SAFETY: operands are bounds-checked at construction and i < len.
            unsafe {
                let v = alpha * x.read(i) + y.read(i);
                y.write(i, v);
            }
        }
    }

    fn gemm(
        &self,
        alpha: T,
        a: Strided2<'_, T>,
        b: Strided2<'_, T>,
        beta: T,
        c: Strided2Mut<'_, T>,
    ) -> Result<()> {
        if a.cols() != b.rows() || c.rows() != a.rows() || c.cols() != b.cols() {
            return Err(Error::shape_mismatch(
                &[a.rows(), b.cols()],
                &[c.rows(), c.cols()],
            ));
        }
        let out = c.span();
        if !disjoint(&a.span(), &out) || !disjoint(&b.span(), &out) {
            return Err(Error::aliasing("gemm output overlaps an input"));
        }
        if c.rows() == 0 || c.cols() == 0 {
            return Ok(());
        }
        let (pa, rsa, csa) = a.parts();
        let (pb, rsb, csb) = b.parts();
        let (pc, rsc, csc) = c.parts();
        // SAFETY: shapes agree, operands are bounds-checked, output is disjoint.
        unsafe {
            T::gemm(
                a.rows(),
                a.cols(),
                b.cols(),
                alpha,
                pa,
                rsa,
                csa,
                pb,
                rsb,
                csb,
                beta,
                pc,
                rsc,
                csc,
            );
        }
        Ok(())
    }

    fn gemv(
        &self,
        alpha: T,
        a: Strided2<'_, T>,
        x: Strided<'_, T>,
        beta: T,
        mut y: StridedMut<'_, T>,
    ) -> Result<()> {
        if a.cols() != x.len() || a.rows() != y.len() {
            return Err(Error::shape_mismatch(&[a.rows(), a.cols()], &[y.len(), x.len()]));
        }
        self.gemm(alpha, a, x.as_column(), beta, y.as_column_mut())
    }

    fn ger(
        &self,
        alpha: T,
        x: Strided<'_, T>,
        y: Strided<'_, T>,
        a: Strided2Mut<'_, T>,
    ) -> Result<()> {
        if a.rows() != x.len() || a.cols() != y.len() {
            return Err(Error::shape_mismatch(&[x.len(), y.len()], &[a.rows(), a.cols()]));
        }
        self.gemm(alpha, x.as_column(), y.as_column().t(), T::one(), a)
    }

    fn transpose(&self, a: Strided2<'_, T>, mut b: Strided2Mut<'_, T>) -> Result<()> {
        if a.rows() != b.cols() || a.cols() != b.rows() {
            return Err(Error::shape_mismatch(&[a.cols(), a.rows()], &[b.rows(), b.cols()]));
        }
        if !disjoint(&a.span(), &b.span()) {
            return Err(Error::aliasing("transpose output overlaps its input"));
        }
        for i in 0..a.rows() {
            for j in 0..a.cols() {
                // SAFETY: shapes agree and the operands are disjoint.
                unsafe { b.write(j, i, a.read(i, j)) };
            }
        }
        Ok(())
    }

    fn transpose_in_place(
        &self,
        mut data: StridedMut<'_, T>,
        rows: usize,
        cols: usize,
    ) -> Result<()> {
        if rows.checked_mul(cols) != Some(data.len()) {
            return Err(Error::shape_mismatch(&[rows, cols], &[data.len()]));
        }
        if !data.is_unit() {
            return Err(Error::invalid_operation(
                "in-place transpose requires a contiguous block",
            ));
        }
        // SAFETY: contiguous and borrowed exclusively.
        let buf = unsafe { data.as_mut_slice() };
        if rows <= 1 || cols <= 1 {
            return Ok(());
        }
        // Follow each permutation cycle once, starting from its smallest index.
        let last = buf.len() - 1;
        for start in 1..last {
            let mut next = (start * rows) % last;
            while next > start {
                next = (next * rows) % last;
            }
            if next < start {
                continue;
            }
            let carried = buf[start];
            let mut pos = start;
            loop {
                let src = (pos * cols) % last;
                if src == start {
                    buf[pos] = carried;
                    break;
                }
                buf[pos] = buf[src];
                pos = src;
            }
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::Base;

    #[test]
    fn test_binary_add() {
        let a = [1.0_f32, 2.0, 3.0];
        let b = [4.0_f32, 5.0, 6.0];
        let mut c = [0.0_f32; 3];

        CpuKernel::with_threshold(4096).binary(
            Binary::Add,
            Strided::from_slice(&a),
            Strided::from_slice(&b),
            StridedMut::from_slice(&mut c),
        );
        assert_eq!(c, [5.0, 7.0, 9.0]);
    }

    #[test]
    fn test_parallel_path_matches() {
        let kernel = CpuKernel::with_threshold(8);
        let a: Vec<f64> = (0..100).map(f64::from).collect();
        let mut c = vec![0.0_f64; 100];

        kernel.unary(Unary::Square, Strided::from_slice(&a), StridedMut::from_slice(&mut c));
        assert_eq!(c[9], 81.0);
        let dot = kernel.dot(Strided::from_slice(&a), Strided::from_slice(&a));
        assert_eq!(dot, c.iter().sum::<f64>());
    }

    #[test]
    fn test_broadcast_relu() {
        let x = [-1.0_f32, 0.0, 1.0, 2.0];
        let zero = 0.0_f32;
        let mut y = [9.0_f32; 4];

        CpuKernel::with_threshold(4096).binary(
            Binary::Max,
            Strided::from_slice(&x),
            Strided::broadcast(&zero, 4),
            StridedMut::from_slice(&mut y),
        );
        assert_eq!(y, [0.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_in_place_strided() {
        let mut data = [1.0_f64, 10.0, 2.0, 10.0, 3.0];
        let kernel = CpuKernel::with_threshold(4096);
        let base = unsafe { crate::kernel::BaseMut::new(data.as_mut_ptr(), data.len()) };
        let x = base.as_base().strided(0, 3, 2).unwrap();
        let y = base.strided_mut(0, 3, 2).unwrap();

        kernel.binary(Binary::Mul, x, x, y);
        assert_eq!(data, [1.0, 10.0, 4.0, 10.0, 9.0]);
    }

    #[test]
    fn test_reductions() {
        let kernel = CpuKernel::with_threshold(4096);
        let x = [3.0_f32, -4.0];
        assert_eq!(kernel.asum(Strided::from_slice(&x)), 7.0);
        assert!((kernel.nrm2(Strided::from_slice(&x)) - 5.0).abs() < 1e-6);

        let one = 1.0_f32;
        assert_eq!(kernel.dot(Strided::from_slice(&x), Strided::broadcast(&one, 2)), -1.0);
    }

    #[test]
    fn test_gemm_and_transposed() {
        let kernel = CpuKernel::with_threshold(4096);
        let a = [1.0_f32, 2.0, 3.0, 4.0];
        let b = [5.0_f32, 6.0, 7.0, 8.0];
        let mut c = [0.0_f32; 4];
        let base_a = unsafe { Base::new(a.as_ptr(), 4) };
        let base_b = unsafe { Base::new(b.as_ptr(), 4) };
        let base_c = unsafe { crate::kernel::BaseMut::new(c.as_mut_ptr(), 4) };

        let ma = base_a.matrix(0, 2, 2, 2, 1).unwrap();
        let mb = base_b.matrix(0, 2, 2, 2, 1).unwrap();
        kernel
            .gemm(1.0, ma, mb, 0.0, base_c.matrix_mut(0, 2, 2, 2, 1).unwrap())
            .unwrap();
        assert_eq!(c, [19.0, 22.0, 43.0, 50.0]);

        // A^T B = [[26, 30], [38, 44]]
        let base_c = unsafe { crate::kernel::BaseMut::new(c.as_mut_ptr(), 4) };
        kernel
            .gemm(1.0, ma.t(), mb, 0.0, base_c.matrix_mut(0, 2, 2, 2, 1).unwrap())
            .unwrap();
        assert_eq!(c, [26.0, 30.0, 38.0, 44.0]);
    }

    #[test]
    fn test_gemm_rejects_overlap() {
        let kernel = CpuKernel::with_threshold(4096);
        let mut data = [1.0_f64; 4];
        let base = unsafe { crate::kernel::BaseMut::new(data.as_mut_ptr(), 4) };
        let a = base.as_base().matrix(0, 2, 2, 2, 1).unwrap();
        let c = base.matrix_mut(0, 2, 2, 2, 1).unwrap();

        let err = kernel.gemm(1.0, a, a, 0.0, c).unwrap_err();
        assert!(matches!(err, Error::Aliasing { .. }));
    }

    #[test]
    fn test_gemv_and_ger() {
        let kernel = CpuKernel::with_threshold(4096);
        let m = [1.0_f64, 2.0, 3.0, 4.0, 5.0, 6.0];
        let base = unsafe { Base::new(m.as_ptr(), 6) };
        let a = base.matrix(0, 2, 3, 3, 1).unwrap();
        let x = [1.0_f64, 0.0, -1.0];
        let mut y = [0.0_f64; 2];

        kernel
            .gemv(1.0, a, Strided::from_slice(&x), 0.0, StridedMut::from_slice(&mut y))
            .unwrap();
        assert_eq!(y, [-2.0, -2.0]);

        let mut out = [0.0_f64; 6];
        let base_out = unsafe { crate::kernel::BaseMut::new(out.as_mut_ptr(), 6) };
        kernel
            .ger(
                2.0,
                Strided::from_slice(&[1.0, 2.0]),
                Strided::from_slice(&x),
                base_out.matrix_mut(0, 2, 3, 3, 1).unwrap(),
            )
            .unwrap();
        assert_eq!(out, [2.0, 0.0, -2.0, 4.0, 0.0, -4.0]);
    }

    #[test]
    fn test_transpose_in_place() {
        let kernel = CpuKernel::with_threshold(4096);
        let mut data: Vec<f32> = (0..6).map(|v| v as f32).collect();

        kernel
            .transpose_in_place(StridedMut::from_slice(&mut data), 2, 3)
            .unwrap();
        assert_eq!(data, vec![0.0, 3.0, 1.0, 4.0, 2.0, 5.0]);

        let mut square: Vec<f64> = (0..9).map(f64::from).collect();
        kernel
            .transpose_in_place(StridedMut::from_slice(&mut square), 3, 3)
            .unwrap();
        assert_eq!(square, vec![0.0, 3.0, 6.0, 1.0, 4.0, 7.0, 2.0, 5.0, 8.0]);
    }
}
