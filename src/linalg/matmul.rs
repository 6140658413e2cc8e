//! Matrix multiplication.
//!
//! The innermost kernel updates a destination panel of compile time height `H`
//! with the product of an `H×k` panel and a `k×w` matrix, sweeping the width in
//! three tiers: chunks of three vector registers, then single registers, then one
//! masked chunk narrower than a register so that no out of bounds memory is
//! touched. [`matmul`] generalizes the panel kernel to arbitrary heights by
//! iterating blocks of 4 rows and dispatching the remainder onto the matching
//! compile time specialization.

use crate::mat::{MatMut, MatRef};
use crate::utils::simd::{lane_count, vload, vload_partial, vstore, vstore_partial};
use crate::Accum;
use equator::assert;
use pulp::Simd;

#[inline(always)]
pub(crate) unsafe fn matmul_panel_vec<const H: usize, const W: usize, S: Simd>(
    simd: S,
    accum: Accum,
    k: usize,
    pa: *const f64,
    da: usize,
    pb: *const f64,
    db: usize,
    pc: *mut f64,
    dc: usize,
) {
    let lanes = lane_count::<S>();
    let zero = simd.f64s_splat(0.0);
    let mut acc = [[zero; W]; H];

    let mut pb_row = pb;
    for depth in 0..k {
        let mut b = [zero; W];
        for j in 0..W {
            b[j] = vload::<S>(pb_row.add(j * lanes));
        }
        for i in 0..H {
            let a = simd.f64s_splat(*pa.add(i * da + depth));
            for j in 0..W {
                acc[i][j] = simd.f64s_mul_add_e(a, b[j], acc[i][j]);
            }
        }
        pb_row = pb_row.add(db);
    }

    for i in 0..H {
        for j in 0..W {
            let dst = pc.add(i * dc + j * lanes);
            let val = match accum {
                Accum::Replace => acc[i][j],
                Accum::Add => simd.f64s_add(vload::<S>(dst), acc[i][j]),
                Accum::Sub => simd.f64s_sub(vload::<S>(dst), acc[i][j]),
            };
            vstore::<S>(dst, val);
        }
    }
}

#[inline(always)]
pub(crate) unsafe fn matmul_panel_mask<const H: usize, S: Simd>(
    simd: S,
    accum: Accum,
    k: usize,
    w: usize,
    pa: *const f64,
    da: usize,
    pb: *const f64,
    db: usize,
    pc: *mut f64,
    dc: usize,
) {
    let zero = simd.f64s_splat(0.0);
    let mut acc = [zero; H];

    let mut pb_row = pb;
    for depth in 0..k {
        let b = vload_partial::<S>(simd, pb_row, w);
        for i in 0..H {
            let a = simd.f64s_splat(*pa.add(i * da + depth));
            acc[i] = simd.f64s_mul_add_e(a, b, acc[i]);
        }
        pb_row = pb_row.add(db);
    }

    for i in 0..H {
        let dst = pc.add(i * dc);
        let val = match accum {
            Accum::Replace => acc[i],
            Accum::Add => simd.f64s_add(vload_partial::<S>(simd, dst, w), acc[i]),
            Accum::Sub => simd.f64s_sub(vload_partial::<S>(simd, dst, w), acc[i]),
        };
        vstore_partial::<S>(simd, dst, w, val);
    }
}

/// Rank update of a destination panel of height `H`: `C OP= A·B`, with `A` of
/// dimensions `H×k`, `B` of dimensions `k×w` and `C` of dimensions `H×w`.
#[inline(always)]
pub(crate) unsafe fn matmul_panel<const H: usize, S: Simd>(
    simd: S,
    accum: Accum,
    k: usize,
    w: usize,
    pa: *const f64,
    da: usize,
    pb: *const f64,
    db: usize,
    pc: *mut f64,
    dc: usize,
) {
    let lanes = lane_count::<S>();
    let mut j = 0usize;
    while j + 3 * lanes <= w {
        matmul_panel_vec::<H, 3, S>(simd, accum, k, pa, da, pb.add(j), db, pc.add(j), dc);
        j += 3 * lanes;
    }
    while j + lanes <= w {
        matmul_panel_vec::<H, 1, S>(simd, accum, k, pa, da, pb.add(j), db, pc.add(j), dc);
        j += lanes;
    }
    if j < w {
        matmul_panel_mask::<H, S>(simd, accum, k, w - j, pa, da, pb.add(j), db, pc.add(j), dc);
    }
}

pub(crate) unsafe fn matmul_imp<S: Simd>(
    simd: S,
    accum: Accum,
    m: usize,
    w: usize,
    k: usize,
    pa: *const f64,
    da: usize,
    pb: *const f64,
    db: usize,
    pc: *mut f64,
    dc: usize,
) {
    let mut i = 0usize;
    while i + 4 <= m {
        matmul_panel::<4, S>(simd, accum, k, w, pa.add(i * da), da, pb, db, pc.add(i * dc), dc);
        i += 4;
    }
    match m - i {
        0 => (),
        1 => matmul_panel::<1, S>(simd, accum, k, w, pa.add(i * da), da, pb, db, pc.add(i * dc), dc),
        2 => matmul_panel::<2, S>(simd, accum, k, w, pa.add(i * da), da, pb, db, pc.add(i * dc), dc),
        3 => matmul_panel::<3, S>(simd, accum, k, w, pa.add(i * da), da, pb, db, pc.add(i * dc), dc),
        _ => unreachable!(),
    }
}

struct MatMulImpl<'a> {
    dst: MatMut<'a>,
    accum: Accum,
    lhs: MatRef<'a>,
    rhs: MatRef<'a>,
}

impl pulp::WithSimd for MatMulImpl<'_> {
    type Output = ();

    #[inline(always)]
    fn with_simd<S: Simd>(self, simd: S) -> Self::Output {
        let Self {
            mut dst,
            accum,
            lhs,
            rhs,
        } = self;
        let m = dst.nrows();
        let w = dst.ncols();
        let k = lhs.ncols();
        unsafe {
            matmul_imp(
                simd,
                accum,
                m,
                w,
                k,
                lhs.as_ptr(),
                lhs.row_stride(),
                rhs.as_ptr(),
                rhs.row_stride(),
                dst.as_mut_ptr(),
                dst.row_stride(),
            )
        }
    }
}

/// Computes `dst OP= lhs·rhs`, where `OP` is given by `accum`.
///
/// `dst` must not overlap `lhs` or `rhs` in memory.
///
/// # Panics
/// The function panics if any of the following conditions are violated:
/// * `dst.nrows() == lhs.nrows()`.
/// * `dst.ncols() == rhs.ncols()`.
/// * `lhs.ncols() == rhs.nrows()`.
#[track_caller]
pub fn matmul(dst: MatMut<'_>, accum: Accum, lhs: MatRef<'_>, rhs: MatRef<'_>) {
    assert!(all(
        dst.nrows() == lhs.nrows(),
        dst.ncols() == rhs.ncols(),
        lhs.ncols() == rhs.nrows(),
    ));
    pulp::Arch::new().dispatch(MatMulImpl {
        dst,
        accum,
        lhs,
        rhs,
    });
}
