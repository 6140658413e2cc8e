use super::MatRef;
use core::marker::PhantomData;
use equator::{assert, debug_assert};
use reborrow::*;

/// Mutable view over a row major matrix, similar to a mutable reference to a 2D
/// strided [prim@slice].
#[repr(C)]
pub struct MatMut<'a> {
    pub(super) ptr: *mut f64,
    pub(super) nrows: usize,
    pub(super) ncols: usize,
    pub(super) row_stride: usize,
    pub(super) __marker: PhantomData<&'a mut f64>,
}

unsafe impl Send for MatMut<'_> {}
unsafe impl Sync for MatMut<'_> {}

impl<'short> Reborrow<'short> for MatMut<'_> {
    type Target = MatRef<'short>;

    #[inline]
    fn rb(&'short self) -> Self::Target {
        unsafe { MatRef::from_raw_parts(self.ptr, self.nrows, self.ncols, self.row_stride) }
    }
}

impl<'short> ReborrowMut<'short> for MatMut<'_> {
    type Target = MatMut<'short>;

    #[inline]
    fn rb_mut(&'short mut self) -> Self::Target {
        MatMut {
            ptr: self.ptr,
            nrows: self.nrows,
            ncols: self.ncols,
            row_stride: self.row_stride,
            __marker: PhantomData,
        }
    }
}

impl<'a> IntoConst for MatMut<'a> {
    type Target = MatRef<'a>;

    #[inline]
    fn into_const(self) -> Self::Target {
        unsafe { MatRef::from_raw_parts(self.ptr, self.nrows, self.ncols, self.row_stride) }
    }
}

impl<'a> MatMut<'a> {
    /// Creates a `MatMut` from a pointer to the matrix data, dimensions, and a row
    /// stride, specified in number of elements, not in bytes.
    ///
    /// # Safety
    /// The behavior is undefined if any of the following conditions are violated:
    /// * The entire memory region addressed by the matrix must be contained within
    ///   a single allocation, accessible in its entirety by `ptr`.
    /// * The values accessible by the matrix must be initialized at some point
    ///   before they are read, or references to them are formed.
    /// * No aliasing is allowed. In other words, none of the elements accessible
    ///   by the matrix may be accessed for reads or writes by any other means for
    ///   the duration of the lifetime `'a`.
    #[inline(always)]
    pub unsafe fn from_raw_parts(
        ptr: *mut f64,
        nrows: usize,
        ncols: usize,
        row_stride: usize,
    ) -> Self {
        Self {
            ptr,
            nrows,
            ncols,
            row_stride,
            __marker: PhantomData,
        }
    }

    /// Creates a `MatMut` from a slice view over the matrix data, and the matrix
    /// dimensions. The data is interpreted in a row major format, so that the
    /// first chunk of `ncols` values from the slice goes in the first row of the
    /// matrix, the second chunk of `ncols` values goes in the second row, and so
    /// on.
    ///
    /// # Panics
    /// The function panics if any of the following conditions are violated:
    /// * `nrows * ncols == slice.len()`
    #[track_caller]
    #[inline(always)]
    pub fn from_row_major_slice_mut(slice: &'a mut [f64], nrows: usize, ncols: usize) -> Self {
        assert!(nrows * ncols == slice.len());
        unsafe { Self::from_raw_parts(slice.as_mut_ptr(), nrows, ncols, ncols) }
    }

    /// Returns a mutable pointer to the matrix data.
    #[inline(always)]
    pub fn as_mut_ptr(&mut self) -> *mut f64 {
        self.ptr
    }

    /// Returns the number of rows of the matrix.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Returns the number of columns of the matrix.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Returns the row stride of the matrix, specified in number of elements, not
    /// in bytes.
    #[inline]
    pub fn row_stride(&self) -> usize {
        self.row_stride
    }

    /// Returns a mutable pointer to the element at the given indices, assuming
    /// the provided indices are within the matrix dimensions.
    ///
    /// # Safety
    /// The behavior is undefined if any of the following conditions are violated:
    /// * `row < self.nrows()`.
    /// * `col < self.ncols()`.
    #[inline(always)]
    pub unsafe fn ptr_inbounds_at_mut(&mut self, row: usize, col: usize) -> *mut f64 {
        debug_assert!(all(row < self.nrows(), col < self.ncols()));
        self.ptr.add(row * self.row_stride + col)
    }

    /// Reads the value of the element at the given indices.
    ///
    /// # Panics
    /// The function panics if any of the following conditions are violated:
    /// * `row < self.nrows()`.
    /// * `col < self.ncols()`.
    #[track_caller]
    #[inline(always)]
    pub fn read(&self, row: usize, col: usize) -> f64 {
        self.rb().read(row, col)
    }

    /// Writes the value to the element at the given indices.
    ///
    /// # Panics
    /// The function panics if any of the following conditions are violated:
    /// * `row < self.nrows()`.
    /// * `col < self.ncols()`.
    #[track_caller]
    #[inline(always)]
    pub fn write(&mut self, row: usize, col: usize, value: f64) {
        assert!(all(row < self.nrows(), col < self.ncols()));
        unsafe { *self.ptr_inbounds_at_mut(row, col) = value };
    }

    /// Returns a mutable view over the submatrix starting at indices `(row_start,
    /// col_start)`, with dimensions `(nrows, ncols)`.
    ///
    /// # Panics
    /// The function panics if any of the following conditions are violated:
    /// * `row_start <= self.nrows()`.
    /// * `col_start <= self.ncols()`.
    /// * `nrows <= self.nrows() - row_start`.
    /// * `ncols <= self.ncols() - col_start`.
    #[track_caller]
    #[inline(always)]
    pub fn submatrix_mut(
        self,
        row_start: usize,
        col_start: usize,
        nrows: usize,
        ncols: usize,
    ) -> Self {
        assert!(all(row_start <= self.nrows(), col_start <= self.ncols()));
        assert!(all(
            nrows <= self.nrows() - row_start,
            ncols <= self.ncols() - col_start,
        ));
        unsafe {
            Self::from_raw_parts(
                self.ptr.wrapping_add(row_start * self.row_stride + col_start),
                nrows,
                ncols,
                self.row_stride,
            )
        }
    }

    /// Returns a mutable view over the rows `row_start..row_start + nrows` of the
    /// matrix.
    ///
    /// # Panics
    /// The function panics if any of the following conditions are violated:
    /// * `row_start <= self.nrows()`.
    /// * `nrows <= self.nrows() - row_start`.
    #[track_caller]
    #[inline(always)]
    pub fn subrows_mut(self, row_start: usize, nrows: usize) -> Self {
        let ncols = self.ncols();
        self.submatrix_mut(row_start, 0, nrows, ncols)
    }

    /// Returns a mutable view over the columns `col_start..col_start + ncols` of
    /// the matrix.
    ///
    /// # Panics
    /// The function panics if any of the following conditions are violated:
    /// * `col_start <= self.ncols()`.
    /// * `ncols <= self.ncols() - col_start`.
    #[track_caller]
    #[inline(always)]
    pub fn subcols_mut(self, col_start: usize, ncols: usize) -> Self {
        let nrows = self.nrows();
        self.submatrix_mut(0, col_start, nrows, ncols)
    }

    /// Splits the matrix horizontally at the given row into two parts and returns
    /// an array of each submatrix, in the following order:
    /// * top.
    /// * bottom.
    ///
    /// # Panics
    /// The function panics if the following condition is violated:
    /// * `row <= self.nrows()`.
    #[track_caller]
    #[inline(always)]
    pub fn split_at_row_mut(self, row: usize) -> (Self, Self) {
        assert!(row <= self.nrows());
        let nrows = self.nrows();
        let ncols = self.ncols();
        let row_stride = self.row_stride();
        let ptr = self.ptr;
        unsafe {
            (
                Self::from_raw_parts(ptr, row, ncols, row_stride),
                Self::from_raw_parts(
                    ptr.wrapping_add(row * row_stride),
                    nrows - row,
                    ncols,
                    row_stride,
                ),
            )
        }
    }
}
