//! Linear algebra module.
//!
//! The kernels are layered bottom up: [`matmul`] provides the fixed-height,
//! vectorized rank update microkernel and its arbitrary-height generalization;
//! [`triangular_mult`] and [`triangular_solve`] combine it with fully unrolled
//! diagonal block kernels into panel sweeps, a recursive blocking driver, and the
//! column-tiled public entry points.

pub mod matmul;
pub mod triangular_mult;
pub mod triangular_solve;
