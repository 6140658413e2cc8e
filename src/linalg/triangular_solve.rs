//! Triangular solve module: forward substitution `X := L⁻¹·B` in place.
//!
//! `L` is lower triangular; its strictly upper triangular part is never accessed
//! and may hold arbitrary values. The unit flavor treats the diagonal as
//! implicitly one and never dereferences it; the general flavor folds the
//! reciprocal of each diagonal entry into the substitution.
//!
//! The sweep runs from the first row block to the last, as forward substitution
//! requires: each block first subtracts the contribution of every already solved
//! row through a rank update, then finishes solving its own rows in registers.

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

/// Solves the `H×H` unit or general lower triangular system at `pl` against the
/// `H×w` operand block at `px`, in place. The negated (and for the general
/// flavor, diagonal-scaled) coefficients are broadcast once, then the rows
/// combine sequentially so that each row uses the already solved rows before it.
#[inline(always)]
unsafe fn solve_block_imp<const H: usize, const UNIT: bool, S: Simd>(
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
    let mut nl = [[zero; H]; H];
    let mut inv = [zero; H];
    for i in 0..H {
        let inv_i = if UNIT { 1.0 } else { (*pl.add(i * dl + i)).recip() };
        if !UNIT {
            inv[i] = simd.f64s_splat(inv_i);
        }
        for j in 0..i {
            nl[i][j] = simd.f64s_splat(-*pl.add(i * dl + j) * inv_i);
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
                simd.f64s_mul(inv[i], x[i])
            };
            for j in 0..i {
                y = simd.f64s_mul_add_e(nl[i][j], x[j], y);
            }
            x[i] = y;
        }
        for i in 0..H {
            if UNIT && i == 0 {
                continue;
            }
            vstore::<S>(px.add(i * dx + col), x[i]);
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
                simd.f64s_mul(inv[i], x[i])
            };
            for j in 0..i {
                y = simd.f64s_mul_add_e(nl[i][j], x[j], y);
            }
            x[i] = y;
        }
        for i in 0..H {
            if UNIT && i == 0 {
                continue;
            }
            vstore_partial::<S>(simd, px.add(i * dx + col), rem, x[i]);
        }
    }
}

/// One step of the sweep: the rows `0..row` are already solved, so their
/// contribution is subtracted from the block at `row` before the diagonal block
/// finishes the solve in place.
#[inline(always)]
unsafe fn solve_step<const H: usize, const UNIT: bool, S: Simd>(
    simd: S,
    row: usize,
    w: usize,
    pl: *const f64,
    dl: usize,
    px: *mut f64,
    dx: usize,
) {
    if row > 0 {
        matmul_panel::<H, S>(
            simd,
            Accum::Sub,
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
    solve_block_imp::<H, UNIT, S>(simd, w, pl.add(row * dl + row), dl, px.add(row * dx), dx);
}

unsafe fn solve_sweep<const UNIT: bool, S: Simd>(
    simd: S,
    n: usize,
    w: usize,
    pl: *const f64,
    dl: usize,
    px: *mut f64,
    dx: usize,
) {
    let mut i = 0usize;
    while i + BLOCK <= n {
        solve_step::<BLOCK, UNIT, S>(simd, i, w, pl, dl, px, dx);
        i += BLOCK;
    }
    match n - i {
        0 => (),
        1 => solve_step::<1, UNIT, S>(simd, i, w, pl, dl, px, dx),
        2 => solve_step::<2, UNIT, S>(simd, i, w, pl, dl, px, dx),
        3 => solve_step::<3, UNIT, S>(simd, i, w, pl, dl, px, dx),
        _ => unreachable!(),
    }
}

unsafe fn solve_recurse<const UNIT: bool, S: Simd>(
    simd: S,
    n: usize,
    w: usize,
    pl: *const f64,
    dl: usize,
    px: *mut f64,
    dx: usize,
) {
    if n < RECURSION_THRESHOLD {
        return solve_sweep::<UNIT, S>(simd, n, w, pl, dl, px, dx);
    }

    let n1 = n / 2;
    let n2 = n - n1;

    // forward substitution needs the top block solved first; the rank update
    // then propagates the solved X1 into X2 before the bottom block is solved
    solve_recurse::<UNIT, S>(simd, n1, w, pl, dl, px, dx);
    matmul_imp::<S>(
        simd,
        Accum::Sub,
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
    solve_recurse::<UNIT, S>(simd, n2, w, pl.add(n1 * dl + n1), dl, px.add(n1 * dx), dx);
}

struct TriSolveImpl<'a, const UNIT: bool> {
    lhs: BareMatRef<'a>,
    rhs: MatMut<'a>,
}

impl<const UNIT: bool> pulp::WithSimd for TriSolveImpl<'_, UNIT> {
    type Output = ();

    #[inline(always)]
    fn with_simd<S: Simd>(self, simd: S) -> Self::Output {
        let Self { lhs, mut rhs } = self;
        let n = rhs.nrows();
        let w = rhs.ncols();
        unsafe {
            solve_recurse::<UNIT, S>(
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

fn solve_in_place_imp<const UNIT: bool>(lhs: BareMatRef<'_>, rhs: MatMut<'_>) {
    let mut rhs = rhs;
    let ncols = rhs.ncols();
    let arch = pulp::Arch::new();

    let mut j = 0usize;
    while j + COL_CHUNK <= ncols {
        arch.dispatch(TriSolveImpl::<UNIT> {
            lhs,
            rhs: rhs.rb_mut().subcols_mut(j, COL_CHUNK),
        });
        j += COL_CHUNK;
    }
    if j < ncols {
        arch.dispatch(TriSolveImpl::<UNIT> {
            lhs,
            rhs: rhs.rb_mut().subcols_mut(j, ncols - j),
        });
    }
}

/// Computes the solution of `L×X = B`, and stores the result in `rhs`, where `L`
/// is interpreted as an `n×n` lower triangular matrix (diagonal included), with
/// `n = rhs.nrows()`. The strictly upper triangular part of `L` is not accessed.
///
/// `lhs` and `rhs` must not overlap in memory.
pub fn solve_lower_triangular_in_place(lhs: BareMatRef<'_>, rhs: MatMut<'_>) {
    solve_in_place_imp::<false>(lhs, rhs);
}

/// Computes the solution of `L×X = B`, and stores the result in `rhs`, where `L`
/// is interpreted as an `n×n` lower triangular matrix with an implicit unit
/// diagonal, with `n = rhs.nrows()`. Neither the diagonal of `L` nor its
/// strictly upper triangular part is accessed.
///
/// `lhs` and `rhs` must not overlap in memory.
pub fn solve_unit_lower_triangular_in_place(lhs: BareMatRef<'_>, rhs: MatMut<'_>) {
    solve_in_place_imp::<true>(lhs, rhs);
}
