//! SIMD helpers on top of [`pulp`], for `f64` data.

use pulp::Simd;

/// Returns the number of `f64` lanes in the native vector type of `S`.
#[inline(always)]
pub fn lane_count<S: Simd>() -> usize {
    core::mem::size_of::<S::f64s>() / core::mem::size_of::<f64>()
}

/// Loads one vector of `f64` lanes from `ptr`, without alignment requirements
/// beyond that of `f64` itself.
///
/// # Safety
/// `ptr` must be valid for reads of `lane_count::<S>()` consecutive `f64` values.
#[inline(always)]
pub unsafe fn vload<S: Simd>(ptr: *const f64) -> S::f64s {
    (ptr as *const S::f64s).read_unaligned()
}

/// Stores one vector of `f64` lanes to `ptr`.
///
/// # Safety
/// `ptr` must be valid for writes of `lane_count::<S>()` consecutive `f64` values.
#[inline(always)]
pub unsafe fn vstore<S: Simd>(ptr: *mut f64, value: S::f64s) {
    (ptr as *mut S::f64s).write_unaligned(value);
}

/// Loads `len` lanes from `ptr` into the low lanes of a vector, filling the rest
/// with zeros. Memory past `ptr + len` is not accessed.
///
/// # Safety
/// `ptr` must be valid for reads of `len` consecutive `f64` values, and
/// `len < lane_count::<S>()`.
#[inline(always)]
pub unsafe fn vload_partial<S: Simd>(simd: S, ptr: *const f64, len: usize) -> S::f64s {
    simd.f64s_partial_load(core::slice::from_raw_parts(ptr, len))
}

/// Stores the low `len` lanes of `value` to `ptr`. Memory past `ptr + len` is not
/// accessed.
///
/// # Safety
/// `ptr` must be valid for writes of `len` consecutive `f64` values, and
/// `len < lane_count::<S>()`.
#[inline(always)]
pub unsafe fn vstore_partial<S: Simd>(simd: S, ptr: *mut f64, len: usize, value: S::f64s) {
    simd.f64s_partial_store(core::slice::from_raw_parts_mut(ptr, len), value);
}
