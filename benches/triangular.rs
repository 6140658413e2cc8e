use criterion::{criterion_group, criterion_main, Criterion};

use fembla::linalg::triangular_mult::{
    mult_lower_triangular_in_place, mult_unit_lower_triangular_in_place,
};
use fembla::linalg::triangular_solve::{
    solve_lower_triangular_in_place, solve_unit_lower_triangular_in_place,
};
use fembla::{MatMut, MatRef};

pub fn triangular(c: &mut Criterion) {
    for n in [64, 128, 256, 512] {
        // the identity keeps the iterated in-place updates from drifting out of
        // range; the kernels do not special-case zeros, so the work is the same
        let mut l = vec![0.0; n * n];
        for i in 0..n {
            l[i * n + i] = 1.0;
        }
        let mut x: Vec<f64> = (0..n * n).map(|_| rand::random::<f64>()).collect();

        c.bench_function(&format!("tri-mult-ll-{n}"), |b| {
            b.iter(|| {
                let lhs = MatRef::from_row_major_slice(&l, n, n);
                let rhs = MatMut::from_row_major_slice_mut(&mut x, n, n);
                mult_lower_triangular_in_place(unsafe { lhs.as_bare() }, rhs);
            })
        });

        c.bench_function(&format!("tri-mult-lln-{n}"), |b| {
            b.iter(|| {
                let lhs = MatRef::from_row_major_slice(&l, n, n);
                let rhs = MatMut::from_row_major_slice_mut(&mut x, n, n);
                mult_unit_lower_triangular_in_place(unsafe { lhs.as_bare() }, rhs);
            })
        });

        c.bench_function(&format!("tri-solve-ll-{n}"), |b| {
            b.iter(|| {
                let lhs = MatRef::from_row_major_slice(&l, n, n);
                let rhs = MatMut::from_row_major_slice_mut(&mut x, n, n);
                solve_lower_triangular_in_place(unsafe { lhs.as_bare() }, rhs);
            })
        });

        c.bench_function(&format!("tri-solve-lln-{n}"), |b| {
            b.iter(|| {
                let lhs = MatRef::from_row_major_slice(&l, n, n);
                let rhs = MatMut::from_row_major_slice_mut(&mut x, n, n);
                solve_unit_lower_triangular_in_place(unsafe { lhs.as_bare() }, rhs);
            })
        });
    }
}

criterion_group!(benches, triangular);
criterion_main!(benches);
