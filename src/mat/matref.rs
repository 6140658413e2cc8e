use core::marker::PhantomData;
use equator::{assert, debug_assert};
use reborrow::*;

/// Immutable view over a row major matrix, similar to an immutable reference to a
/// 2D strided [prim@slice].
#[repr(C)]
pub struct MatRef<'a> {
    pub(super) ptr: *const f64,
    pub(super) nrows: usize,
    pub(super) ncols: usize,
    pub(super) row_stride: usize,
    pub(super) __marker: PhantomData<&'a f64>,
}

impl Clone for MatRef<'_> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}
impl Copy for MatRef<'_> {}

unsafe impl Send for MatRef<'_> {}
unsafe impl Sync for MatRef<'_> {}

impl<'short> Reborrow<'short> for MatRef<'_> {
    type Target = MatRef<'short>;

    #[inline]
    fn rb(&'short self) -> Self::Target {
        *self
    }
}

impl<'short> ReborrowMut<'short> for MatRef<'_> {
    type Target = MatRef<'short>;

    #[inline]
    fn rb_mut(&'short mut self) -> Self::Target {
        *self
    }
}

impl IntoConst for MatRef<'_> {
    type Target = Self;

    #[inline]
    fn into_const(self) -> Self::Target {
        self
    }
}

impl<'a> MatRef<'a> {
    /// Creates a `MatRef` from a pointer to the matrix data, dimensions, and a row
    /// stride, specified in number of elements, not in bytes.
    ///
    /// # Safety
    /// The behavior is undefined if any of the following conditions are violated:
    /// * The entire memory region addressed by the matrix must be contained within
    ///   a single allocation, accessible in its entirety by `ptr`.
    /// * The values accessible by the matrix must be initialized at some point
    ///   before they are read, or references to them are formed.
    /// * No mutable aliasing is allowed. In other words, none of the elements
    ///   accessible by the matrix may be accessed for writes by any other means
    ///   for the duration of the lifetime `'a`.
    #[inline(always)]
    pub unsafe fn from_raw_parts(
        ptr: *const f64,
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

    /// Creates a `MatRef` from a slice view over the matrix data, and the matrix
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
    pub fn from_row_major_slice(slice: &'a [f64], nrows: usize, ncols: usize) -> Self {
        assert!(nrows * ncols == slice.len());
        unsafe { Self::from_raw_parts(slice.as_ptr(), nrows, ncols, ncols) }
    }

    /// Returns a pointer to the matrix data.
    #[inline(always)]
    pub fn as_ptr(self) -> *const f64 {
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

    /// Returns a pointer to the element at the given indices, assuming the
    /// provided indices are within the matrix dimensions.
    ///
    /// # Safety
    /// The behavior is undefined if any of the following conditions are violated:
    /// * `row < self.nrows()`.
    /// * `col < self.ncols()`.
    #[inline(always)]
    pub unsafe fn ptr_inbounds_at(self, row: usize, col: usize) -> *const f64 {
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
        assert!(all(row < self.nrows(), col < self.ncols()));
        unsafe { *self.ptr_inbounds_at(row, col) }
    }

    /// Returns a view over the submatrix starting at indices `(row_start,
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
    pub fn submatrix(self, row_start: usize, col_start: usize, nrows: usize, ncols: usize) -> Self {
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

    /// Returns a view over the rows `row_start..row_start + nrows` of the matrix.
    ///
    /// # Panics
    /// The function panics if any of the following conditions are violated:
    /// * `row_start <= self.nrows()`.
    /// * `nrows <= self.nrows() - row_start`.
    #[track_caller]
    #[inline(always)]
    pub fn subrows(self, row_start: usize, nrows: usize) -> Self {
        let ncols = self.ncols();
        self.submatrix(row_start, 0, nrows, ncols)
    }

    /// Returns a view over the columns `col_start..col_start + ncols` of the
    /// matrix.
    ///
    /// # Panics
    /// The function panics if any of the following conditions are violated:
    /// * `col_start <= self.ncols()`.
    /// * `ncols <= self.ncols() - col_start`.
    #[track_caller]
    #[inline(always)]
    pub fn subcols(self, col_start: usize, ncols: usize) -> Self {
        let nrows = self.nrows();
        self.submatrix(0, col_start, nrows, ncols)
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
    pub fn split_at_row(self, row: usize) -> (Self, Self) {
        assert!(row <= self.nrows());
        (
            self.submatrix(0, 0, row, self.ncols()),
            self.submatrix(row, 0, self.nrows() - row, self.ncols()),
        )
    }

    /// Discards the dimensions of the view, keeping only the base address and the
    /// row stride.
    ///
    /// # Safety
    /// The resulting view must only be combined with operands whose row count does
    /// not exceed `self.nrows()` (equivalently, `self.ncols()`; the view must be
    /// square for this to be meaningful).
    #[inline(always)]
    pub unsafe fn as_bare(self) -> BareMatRef<'a> {
        BareMatRef::from_raw_parts(self.ptr, self.row_stride)
    }
}

/// Immutable view over a row major matrix carrying no dimensions, only a base
/// address and a row stride.
///
/// This is the flavor used for the triangular factor of the in-place triangular
/// operations: its square size is always supplied by the operand it is paired
/// with, and checking redundant bounds at every recursion level would cost cycles
/// in the hot path.
#[repr(C)]
pub struct BareMatRef<'a> {
    pub(super) ptr: *const f64,
    pub(super) row_stride: usize,
    pub(super) __marker: PhantomData<&'a f64>,
}

impl Clone for BareMatRef<'_> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}
impl Copy for BareMatRef<'_> {}

unsafe impl Send for BareMatRef<'_> {}
unsafe impl Sync for BareMatRef<'_> {}

impl<'a> BareMatRef<'a> {
    /// Creates a `BareMatRef` from a pointer to the matrix data and a row stride,
    /// specified in number of elements, not in bytes.
    ///
    /// # Safety
    /// The behavior is undefined if any of the following conditions are violated:
    /// * For every operation the view is passed to together with an operand of
    ///   `n` rows, the elements at or below the diagonal of the leading `n×n`
    ///   block (at offsets `i * row_stride + j` for `j <= i < n`) must be
    ///   contained within a single allocation accessible through `ptr`, and
    ///   initialized before they are read. The general diagonal operations read
    ///   the diagonal; the unit diagonal operations read only the strictly lower
    ///   part.
    /// * None of those elements may be accessed for writes by any other means for
    ///   the duration of the lifetime `'a`.
    #[inline(always)]
    pub unsafe fn from_raw_parts(ptr: *const f64, row_stride: usize) -> Self {
        Self {
            ptr,
            row_stride,
            __marker: PhantomData,
        }
    }

    /// Returns a pointer to the matrix data.
    #[inline(always)]
    pub fn as_ptr(self) -> *const f64 {
        self.ptr
    }

    /// Returns the row stride of the matrix, specified in number of elements, not
    /// in bytes.
    #[inline]
    pub fn row_stride(&self) -> usize {
        self.row_stride
    }
}
