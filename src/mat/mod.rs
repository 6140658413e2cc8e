//! Non-owning matrix views over caller memory.
//!
//! All views are row major with a unit column stride: the element at indices
//! `(i, j)` lives at offset `i * row_stride + j` from the base address. Two
//! flavors exist:
//!
//! - [`MatRef`]/[`MatMut`] carry explicit dimensions and are used for operands
//!   whose shape must be sliced and checked,
//! - [`BareMatRef`] carries only a base address and a row stride, for the
//!   triangular factor whose square size is always supplied by the operand it is
//!   combined with.
//!
//! None of the views own their storage. The caller keeps the backing buffer
//! alive, and the unsafe constructors carry the aliasing and validity contracts.

mod matmut;
mod matref;

pub use matmut::MatMut;
pub use matref::{BareMatRef, MatRef};

#[cfg(test)]
mod tests {
    use super::*;
    use reborrow::*;

    #[test]
    fn test_views() {
        let data = [
            1.0, 2.0, 3.0, //
            4.0, 5.0, 6.0, //
            7.0, 8.0, 9.0, //
        ];
        let m = MatRef::from_row_major_slice(&data, 3, 3);
        assert_eq!(m.nrows(), 3);
        assert_eq!(m.ncols(), 3);
        assert_eq!(m.row_stride(), 3);
        assert_eq!(m.read(1, 2), 6.0);

        let sub = m.submatrix(1, 1, 2, 2);
        assert_eq!(sub.nrows(), 2);
        assert_eq!(sub.read(0, 0), 5.0);
        assert_eq!(sub.read(1, 1), 9.0);

        let (top, bot) = m.split_at_row(1);
        assert_eq!(top.nrows(), 1);
        assert_eq!(bot.nrows(), 2);
        assert_eq!(bot.read(0, 0), 4.0);

        let cols = m.subcols(1, 2);
        assert_eq!(cols.ncols(), 2);
        assert_eq!(cols.read(2, 0), 8.0);
    }

    #[test]
    fn test_views_mut() {
        let mut data = [0.0; 6];
        let mut m = MatMut::from_row_major_slice_mut(&mut data, 2, 3);
        m.write(0, 0, 1.0);
        m.write(1, 2, -1.0);
        assert_eq!(m.rb().read(0, 0), 1.0);

        let mut sub = m.rb_mut().subcols_mut(2, 1);
        assert_eq!(sub.read(1, 0), -1.0);
        sub.write(0, 0, 2.0);

        let m = m.into_const();
        assert_eq!(m.read(0, 2), 2.0);
        assert_eq!(data, [1.0, 0.0, 2.0, 0.0, 0.0, -1.0]);
    }
}
