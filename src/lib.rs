//! `fembla` provides dense linear algebra kernels for finite element computations.
//!
//! The crate implements the in-place triangular operations used by LU and Cholesky
//! based solvers: `X := L·X` and the solution of `L·X = B`, where `L` is a square
//! lower triangular matrix (with either a meaningful or an implicit unit diagonal)
//! and `X` is a dense matrix with many columns.
//!
//! Matrices are row major: a view is described by a base address and a row stride,
//! and the kernels vectorize along the contiguous (column index) direction. All
//! views are non-owning, the engine holds no state between calls, and the hot path
//! performs no allocation.
//!
//! # Example
//!
//! ```
//! use fembla::linalg::triangular_mult::mult_unit_lower_triangular_in_place;
//! use fembla::linalg::triangular_solve::solve_unit_lower_triangular_in_place;
//! use fembla::{MatMut, MatRef};
//!
//! let l = [
//!     1.0, 0.0, 0.0, //
//!     2.0, 1.0, 0.0, //
//!     3.0, 4.0, 1.0, //
//! ];
//! let mut x = [1.0, 1.0, 1.0];
//!
//! let l = MatRef::from_row_major_slice(&l, 3, 3);
//! let x = MatMut::from_row_major_slice_mut(&mut x, 3, 1);
//!
//! // SAFETY: `l` is 3×3, and it is only ever paired with a 3 row operand.
//! let l = unsafe { l.as_bare() };
//!
//! let mut x = x;
//! mult_unit_lower_triangular_in_place(l, x.rb_mut());
//! assert_eq!(x.read(0, 0), 1.0);
//! assert_eq!(x.read(1, 0), 3.0);
//! assert_eq!(x.read(2, 0), 8.0);
//!
//! solve_unit_lower_triangular_in_place(l, x.rb_mut());
//! assert_eq!(x.read(0, 0), 1.0);
//! assert_eq!(x.read(1, 0), 1.0);
//! assert_eq!(x.read(2, 0), 1.0);
//! # use fembla::reborrow::*;
//! ```
#![allow(clippy::too_many_arguments)]
#![cfg_attr(not(feature = "std"), no_std)]

pub mod linalg;
pub mod mat;
pub mod utils;

pub use mat::{BareMatRef, MatMut, MatRef};
pub use reborrow;

/// Specifies how the result of a matrix product is combined with its destination.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Accum {
    /// The destination is overwritten with the product.
    Replace,
    /// The product is added to the destination.
    Add,
    /// The product is subtracted from the destination.
    Sub,
}
