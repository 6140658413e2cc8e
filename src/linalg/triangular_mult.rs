//! In-place triangular matrix multiplication: `X := L·X`.
//!
//! `L` is lower triangular; its strictly upper triangular part is never accessed
//! and may hold arbitrary values. The general flavor reads the diagonal of `L`,
//! the unit flavor treats it as implicitly one and never dereferences it.
//!
//! The computation sweeps fixed height row blocks from the last block of the
//! operand to the first: when a block is combined with the rows above it, those
//! rows still hold their original values, so the update is performed as if into a
//! fresh buffer even though the operand is overwritten in place. Above a size
//! threshold the triangle is split in halves and recombined through a single rank
//! update, which turns most of the work into large cache friendly products.

use crate::linalg::matmul::{matmul_imp, matmul_panel};
use crate::mat::{BareMatRef, MatMut};
use crate::utils::simd::{lane_count, vload, vload_partial, vstore, vstore_partial};
use crate::Accum;
use pulp::Simd;
use reborrow::*;

// block height of the panel sweep
const BLOCK: usize = 4;
// delegate to the panel sweep below this dimension
const RECURSION_THRESHOLD: usize = 128;
// operand columns are processed in independent tiles of this width
const COL_CHUNK: usize = 256;

/// Multiplies the `H×w` operand block at `px` in place by the `H×H` lower
/// triangular block at `pl`, holding every needed entry of `L` in a broadcast
/// register before sweeping the width.
#[inline(always)]
unsafe fn mult_block_imp<const H: usize, const UNIT: bool, S: Simd>(
    simd: S,
    w: usize,
    pl: *const f64,
    dl: usize,
    px: *mut f64,
    dx: usize,
) {
    if H == 0 || (UNIT && H == 1) {
        return;
    }

    let zero = simd.f64s_splat(0.0);
    let mut l = [[zero; H]; H];
    for i in 0..H {
        for j in 0..i {
            l[i][j] = simd.f64s_splat(*pl.add(i * dl + j));
        }
        if !UNIT {
            l[i][i] = simd.f64s_splat(*pl.add(i * dl + i));
        }
    }

    let lanes = lane_count::<S>();
    let mut col = 0usize;
    while col + lanes <= w {
        let mut x = [zero; H];
        for i in 0..H {
            x[i] = vload::<S>(px.add(i * dx + col));
        }
        for i in 0..H {
            let mut y = if UNIT {
                x[i]
            } else {
                simd.f64s_mul(l[i][i], x[i])
            };
            for j in 0..i {
                y = simd.f64s_mul_add_e(l[i][j], x[j], y);
            }
            vstore::<S>(px.add(i * dx + col), y);
        }
        col += lanes;
    }
    if col < w {
        let rem = w - col;
        let mut x = [zero; H];
        for i in 0..H {
            x[i] = vload_partial::<S>(simd, px.add(i * dx + col), rem);
        }
        for i in 0..H {
            let mut y = if UNIT {
                x[i]
            } else {
                simd.f64s_mul(l[i][i], x[i])
            };
            for j in 0..i {
                y = simd.f64s_mul_add_e(l[i][j], x[j], y);
            }
            vstore_partial::<S>(simd, px.add(i * dx + col), rem, y);
        }
    }
}

/// One step of the sweep: the diagonal block at `(row, row)` updates its own
/// rows, then the rows above contribute through a rank `H` update. The rows
/// above still hold their original values at this point.
#[inline(always)]
unsafe fn mult_step<const H: usize, const UNIT: bool, S: Simd>(
    simd: S,
    row: usize,
    w: usize,
    pl: *const f64,
    dl: usize,
    px: *mut f64,
    dx: usize,
) {
    mult_block_imp::<H, UNIT, S>(simd, w, pl.add(row * dl + row), dl, px.add(row * dx), dx);
    if row > 0 {
        matmul_panel::<H, S>(
            simd,
            Accum::Add,
            row,
            w,
            pl.add(row * dl),
            dl,
            px,
            dx,
            px.add(row * dx),
            dx,
        );
    }
}

unsafe fn mult_sweep<const UNIT: bool, S: Simd>(
    simd: S,
    n: usize,
    w: usize,
    pl: *const f64,
    dl: usize,
    px: *mut f64,
    dx: usize,
) {
    let rem = n % BLOCK;
    let mut i = n;
    if rem > 0 {
        i -= rem;
        match rem {
            1 => mult_step::<1, UNIT, S>(simd, i, w, pl, dl, px, dx),
            2 => mult_step::<2, UNIT, S>(simd, i, w, pl, dl, px, dx),
            3 => mult_step::<3, UNIT, S>(simd, i, w, pl, dl, px, dx),
            _ => unreachable!(),
        }
    }
    while i >= BLOCK {
        i -= BLOCK;
        mult_step::<BLOCK, UNIT, S>(simd, i, w, pl, dl, px, dx);
    }
}

unsafe fn mult_recurse<const UNIT: bool, S: Simd>(
    simd: S,
    n: usize,
    w: usize,
    pl: *const f64,
    dl: usize,
    px: *mut f64,
    dx: usize,
) {
    if n < RECURSION_THRESHOLD {
        return mult_sweep::<UNIT, S>(simd, n, w, pl, dl, px, dx);
    }

    let n1 = n / 2;
    let n2 = n - n1;

    // the ordering is mandatory: X2 needs only L22 and the original X2, the rank
    // update then combines the not yet touched X1 into X2, and only afterwards
    // may X1 be overwritten
    mult_recurse::<UNIT, S>(simd, n2, w, pl.add(n1 * dl + n1), dl, px.add(n1 * dx), dx);
    matmul_imp::<S>(
        simd,
        Accum::Add,
        n2,
        w,
        n1,
        pl.add(n1 * dl),
        dl,
        px,
        dx,
        px.add(n1 * dx),
        dx,
    );
    mult_recurse::<UNIT, S>(simd, n1, w, pl, dl, px, dx);
}

struct TriMultImpl<'a, const UNIT: bool> {
    lhs: BareMatRef<'a>,
    rhs: MatMut<'a>,
}

impl<const UNIT: bool> pulp::WithSimd for TriMultImpl<'_, UNIT> {
    type Output = ();

    #[inline(always)]
    fn with_simd<S: Simd>(self, simd: S) -> Self::Output {
        let Self { lhs, mut rhs } = self;
        let n = rhs.nrows();
        let w = rhs.ncols();
        unsafe {
            mult_recurse::<UNIT, S>(
                simd,
                n,
                w,
                lhs.as_ptr(),
                lhs.row_stride(),
                rhs.as_mut_ptr(),
                rhs.row_stride(),
            )
        }
    }
}

fn mult_in_place_imp<const UNIT: bool>(lhs: BareMatRef<'_>, rhs: MatMut<'_>) {
    let mut rhs = rhs;
    let ncols = rhs.ncols();
    let arch = pulp::Arch::new();

    let mut j = 0usize;
    while j + COL_CHUNK <= ncols {
        arch.dispatch(TriMultImpl::<UNIT> {
            lhs,
            rhs: rhs.rb_mut().subcols_mut(j, COL_CHUNK),
        });
        j += COL_CHUNK;
    }
    if j < ncols {
        arch.dispatch(TriMultImpl::<UNIT> {
            lhs,
            rhs: rhs.rb_mut().subcols_mut(j, ncols - j),
        });
    }
}

/// Computes the product `L×X` and stores the result in `X`, where `L` is
/// interpreted as an `n×n` lower triangular matrix (diagonal included), with
/// `n = rhs.nrows()`. The strictly upper triangular part of `L` is not accessed.
///
/// `lhs` and `rhs` must not overlap in memory.
pub fn mult_lower_triangular_in_place(lhs: BareMatRef<'_>, rhs: MatMut<'_>) {
    mult_in_place_imp::<false>(lhs, rhs);
}

/// Computes the product `L×X` and stores the result in `X`, where `L` is
/// interpreted as an `n×n` lower triangular matrix with an implicit unit
/// diagonal, with `n = rhs.nrows()`. Neither the diagonal of `L` nor its
/// strictly upper triangular part is accessed.
///
/// `lhs` and `rhs` must not overlap in memory.
pub fn mult_unit_lower_triangular_in_place(lhs: BareMatRef<'_>, rhs: MatMut<'_>) {
    mult_in_place_imp::<true>(lhs, rhs);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mat::MatRef;
    use assert_approx_eq::assert_approx_eq;

    // strict upper part (and for the unit flavor, the diagonal) is poisoned to
    // prove it is never read
    fn random_lower(n: usize, unit: bool) -> Vec<f64> {
        let mut l = vec![f64::NAN; n * n];
        for i in 0..n {
            let bound = if unit { i } else { i + 1 };
            for j in 0..bound {
                l[i * n + j] = rand::random::<f64>() - 0.5;
            }
        }
        l
    }

    fn naive_mult(l: &[f64], x: &mut [f64], n: usize, m: usize, unit: bool) {
        let orig = x.to_vec();
        for i in 0..n {
            for c in 0..m {
                let mut acc = if unit {
                    orig[i * m + c]
                } else {
                    l[i * n + i] * orig[i * m + c]
                };
                for j in 0..i {
                    acc += l[i * n + j] * orig[j * m + c];
                }
                x[i * m + c] = acc;
            }
        }
    }

    fn run_mult(l: &[f64], x: &mut [f64], n: usize, m: usize, unit: bool) {
        let l = MatRef::from_row_major_slice(l, n, n);
        let x = MatMut::from_row_major_slice_mut(x, n, m);
        let l = unsafe { l.as_bare() };
        if unit {
            mult_unit_lower_triangular_in_place(l, x);
        } else {
            mult_lower_triangular_in_place(l, x);
        }
    }

    #[test]
    fn test_mult_against_naive() {
        for n in [1, 2, 3, 4, 5, 7, 8, 16, 33, 127, 128, 129, 300] {
            for m in [1, 3, 7, 8, 64, 257] {
                for unit in [false, true] {
                    let l = random_lower(n, unit);
                    let mut x: Vec<f64> = (0..n * m).map(|_| rand::random::<f64>() - 0.5).collect();
                    let mut expected = x.clone();

                    naive_mult(&l, &mut expected, n, m, unit);
                    run_mult(&l, &mut x, n, m, unit);

                    for (&got, &want) in x.iter().zip(expected.iter()) {
                        assert_approx_eq!(got, want, 1e-10);
                    }
                }
            }
        }
    }

    #[test]
    fn test_unit_equivalence() {
        // the unit flavor must match the general one on a matrix whose diagonal
        // is explicitly one
        for n in [1, 2, 5, 33, 129] {
            let m = 17;
            let mut l = random_lower(n, false);
            for i in 0..n {
                l[i * n + i] = 1.0;
            }
            let x0: Vec<f64> = (0..n * m).map(|_| rand::random::<f64>() - 0.5).collect();

            let mut general = x0.clone();
            run_mult(&l, &mut general, n, m, false);

            let mut unit = x0;
            run_mult(&l, &mut unit, n, m, true);

            for (&got, &want) in unit.iter().zip(general.iter()) {
                assert_approx_eq!(got, want, 1e-12);
            }
        }
    }

    #[test]
    fn test_identity_is_fixed_point() {
        for n in [1, 4, 31, 130] {
            let m = 7;
            let mut l = vec![0.0; n * n];
            for i in 0..n {
                l[i * n + i] = 1.0;
            }
            let x0: Vec<f64> = (0..n * m).map(|_| rand::random::<f64>()).collect();
            let mut x = x0.clone();
            run_mult(&l, &mut x, n, m, false);
            assert_eq!(x, x0);
        }
    }

    #[test]
    fn test_column_tile_independence() {
        // any column partition, processed tile by tile, must match a single call
        let n = 140;
        let m = 600;
        let l = random_lower(n, false);
        let x0: Vec<f64> = (0..n * m).map(|_| rand::random::<f64>() - 0.5).collect();

        let mut whole = x0.clone();
        run_mult(&l, &mut whole, n, m, false);

        for split in [vec![m], vec![1, m - 1], vec![100, 256, 244], vec![256, 256, 88]] {
            let mut parts = x0.clone();
            let l_view = MatRef::from_row_major_slice(&l, n, n);
            let mut x_view = MatMut::from_row_major_slice_mut(&mut parts, n, m);
            let mut start = 0;
            for width in split {
                mult_lower_triangular_in_place(
                    unsafe { l_view.as_bare() },
                    x_view.rb_mut().subcols_mut(start, width),
                );
                start += width;
            }
            assert_eq!(start, m);
            assert_eq!(parts, whole);
        }
    }

    #[test]
    fn test_remainder_sizes() {
        // every n mod 4 with no surrounding recursion or full blocks
        for n in [1, 2, 3, 4] {
            for m in [1, 5, 8] {
                for unit in [false, true] {
                    let l = random_lower(n, unit);
                    let mut x: Vec<f64> = (0..n * m).map(|_| rand::random::<f64>()).collect();
                    let mut expected = x.clone();

                    naive_mult(&l, &mut expected, n, m, unit);
                    run_mult(&l, &mut x, n, m, unit);

                    for (&got, &want) in x.iter().zip(expected.iter()) {
                        assert_approx_eq!(got, want, 1e-13);
                    }
                }
            }
        }
    }

    #[test]
    fn test_empty() {
        for (n, m) in [(0, 0), (0, 5), (5, 0)] {
            let l = vec![1.0; n * n];
            let mut x = vec![1.0; n * m];
            let x0 = x.clone();
            run_mult(&l, &mut x, n, m, false);
            run_mult(&l, &mut x, n, m, true);
            assert_eq!(x, x0);
        }
    }

    #[test]
    fn test_known_example() {
        let l = [
            1.0, 0.0, 0.0, //
            2.0, 1.0, 0.0, //
            3.0, 4.0, 1.0, //
        ];
        let mut x = [1.0, 1.0, 1.0];
        run_mult(&l, &mut x, 3, 1, true);
        assert_eq!(x, [1.0, 3.0, 8.0]);
    }
}
