use approx::assert_relative_eq;
use ndarray::{Array1, Array2, array};
use strata_ssf::{
    CompositeDynamics, DiffuseFilter, Dynamics, MatrixDynamics, Measurement, Ssf, SsfData,
};

/// Plain Kalman recursion on dense matrices. Returns `(ssq, ldet, residuals)`
/// accumulated from observation `skip` onwards.
fn dense_kalman(
    t: &Array2<f64>,
    v: &Array2<f64>,
    z: &Array1<f64>,
    h: f64,
    p0: Array2<f64>,
    y: &[f64],
    skip: usize,
) -> (f64, f64, Vec<f64>) {
    let n = z.len();
    let mut a = Array1::<f64>::zeros(n);
    let mut p = p0;
    let mut ssq = 0.0;
    let mut ldet = 0.0;
    let mut res = Vec::new();
    for (pos, &obs) in y.iter().enumerate() {
        let e = obs - z.dot(&a);
        let pz = p.dot(z);
        let f = z.dot(&pz) + h;
        if pos >= skip {
            ssq += e * e / f;
            ldet += f.ln();
            res.push(e / f.sqrt());
        }
        a = &a + &(&pz * (e / f));
        let k = pz.clone().insert_axis(ndarray::Axis(1));
        p = &p - &(k.dot(&k.t()) / f);
        a = t.dot(&a);
        p = t.dot(&p).dot(&t.t()) + v;
    }
    (ssq, ldet, res)
}

fn series(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| {
            let x = i as f64;
            (0.7 * x).sin() + 0.3 * (1.9 * x).cos() + 0.05 * x
        })
        .collect()
}

#[test]
fn stationary_composite_matches_dense_recursion() {
    let ar2 = MatrixDynamics::new(array![[0.5, 1.0], [-0.3, 0.0]], array![[1.0], [0.4]])
        .unwrap()
        .with_stationary_pf0()
        .unwrap();
    let ar1 = MatrixDynamics::new(array![[-0.4]], array![[0.7]])
        .unwrap()
        .with_stationary_pf0()
        .unwrap();

    let mut t = Array2::zeros((3, 3));
    let mut v = Array2::zeros((3, 3));
    let mut p0 = Array2::zeros((3, 3));
    let parts: Vec<Box<dyn Dynamics>> = vec![Box::new(ar2), Box::new(ar1)];
    let composite = CompositeDynamics::new(parts).unwrap();
    composite.t(0, t.view_mut());
    composite.v(0, v.view_mut());
    assert!(composite.pf0(p0.view_mut()));

    let z = array![1.0, 0.0, 1.0];
    let h = 0.2;
    let ssf = Ssf::new(Box::new(composite), Measurement::new(z.clone(), h)).unwrap();
    let y = series(80);

    let out = DiffuseFilter::new().filter(&ssf, &SsfData::new(y.clone())).unwrap();
    let (ssq, ldet, res) = dense_kalman(&t, &v, &z, h, p0, &y, 0);

    let ll = &out.likelihood;
    assert_eq!(ll.diffuse_count(), 0);
    assert_relative_eq!(ll.ssq_err(), ssq, max_relative = 1e-10);
    assert_relative_eq!(ll.ldet(), ldet, max_relative = 1e-10);
    for (a, b) in ll.residuals().iter().zip(&res) {
        assert_relative_eq!(*a, *b, epsilon = 1e-9);
    }
}

#[test]
fn diffuse_level_approximated_by_large_prior() {
    let level = MatrixDynamics::new(array![[1.0]], array![[0.5]])
        .unwrap()
        .with_diffuse(array![[1.0]]);
    let ssf = Ssf::new(Box::new(level), Measurement::new(array![1.0], 1.0)).unwrap();
    let y = series(50);

    let out = DiffuseFilter::new().filter(&ssf, &SsfData::new(y.clone())).unwrap();
    let (ssq, ldet, _) = dense_kalman(
        &array![[1.0]],
        &array![[0.25]],
        &array![1.0],
        1.0,
        array![[1e8]],
        &y,
        1,
    );
    assert_eq!(out.likelihood.diffuse_count(), 1);
    assert_relative_eq!(out.likelihood.ssq_err(), ssq, max_relative = 1e-6);
    assert_relative_eq!(out.likelihood.ldet(), ldet, max_relative = 1e-6);
}

#[test]
fn diffuse_phase_is_never_reentered() {
    // Local linear trend plus an AR(1): two diffuse directions.
    let trend = MatrixDynamics::new(array![[1.0, 1.0], [0.0, 1.0]], array![[0.3, 0.0], [0.0, 0.1]])
        .unwrap()
        .with_diffuse(Array2::eye(2));
    let ar = MatrixDynamics::new(array![[0.6]], array![[1.0]])
        .unwrap()
        .with_stationary_pf0()
        .unwrap();
    let parts: Vec<Box<dyn Dynamics>> = vec![Box::new(trend), Box::new(ar)];
    let composite = CompositeDynamics::new(parts).unwrap();
    assert_eq!(composite.non_stationary_dim(), 2);
    let ssf = Ssf::new(Box::new(composite), Measurement::new(array![1.0, 0.0, 1.0], 0.0)).unwrap();

    let y = series(40);
    let out = DiffuseFilter::new()
        .with_trace(true)
        .filter(&ssf, &SsfData::new(y))
        .unwrap();
    let trace = out.diffuse_trace.unwrap();

    assert_eq!(out.likelihood.diffuse_count(), 2);
    assert_eq!(out.diffuse_steps, 2);
    assert_eq!(trace.len(), 2);
    assert!(trace.iter().all(|info| info.is_diffuse()));

    let res = out.likelihood.residuals();
    assert!(res[..2].iter().all(|r| r.is_nan()));
    assert!(res[2..].iter().all(|r| r.is_finite()));
}

#[test]
fn missing_observations_are_skipped() {
    let ar = MatrixDynamics::new(array![[0.8]], array![[1.0]])
        .unwrap()
        .with_stationary_pf0()
        .unwrap();
    let ssf = Ssf::new(Box::new(ar), Measurement::first(1)).unwrap();
    let mut y = series(30);
    y[5] = f64::NAN;
    y[17] = f64::NAN;
    let out = DiffuseFilter::new().filter(&ssf, &SsfData::new(y)).unwrap();
    let ll = &out.likelihood;
    assert_eq!(ll.dim(), 28);
    assert_eq!(ll.residuals().len(), 30);
    assert!(ll.residuals()[5].is_nan());
    assert!(ll.residuals()[17].is_nan());
    assert_eq!(ll.residuals().iter().filter(|r| r.is_finite()).count(), 28);
}
