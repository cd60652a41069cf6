// ─────────────────────────────────────────────────────────────────────
// GeoField — Symmetric Eigensolver
// ─────────────────────────────────────────────────────────────────────
//! Cyclic Jacobi eigendecomposition for the small symmetric matrices
//! that appear as metric tensors (n ≤ ~10, converges in a few sweeps).

/// Eigenpairs of a symmetric matrix, eigenvalues ascending.
#[derive(Debug, Clone)]
pub struct SymmetricEigen {
    pub n: usize,
    pub values: Vec<f64>,
    /// n×n row-major, columns are eigenvectors.
    pub vectors: Vec<f64>,
}

impl SymmetricEigen {
    /// Decompose the symmetric row-major n×n matrix `a`. A slice shorter
    /// than n² yields the empty decomposition.
    pub fn decompose(a: &[f64], n: usize) -> Self {
        let Some(head) = n.checked_mul(n).and_then(|len| a.get(..len)) else {
            return Self::empty();
        };
        let mut work = head.to_vec();
        let mut values = vec![0.0; n];
        let mut vectors = vec![0.0; n * n];
        jacobi_sweeps(&mut work, n, &mut values, &mut vectors);
        sort_ascending(&mut values, &mut vectors, n);
        Self { n, values, vectors }
    }

    pub fn empty() -> Self {
        Self {
            n: 0,
            values: Vec::new(),
            vectors: Vec::new(),
        }
    }

    pub fn min(&self) -> f64 {
        self.values.first().copied().unwrap_or(0.0)
    }

    pub fn max(&self) -> f64 {
        self.values.last().copied().unwrap_or(0.0)
    }

    /// λ_max / λ_min, infinite when the smallest eigenvalue is not positive.
    pub fn condition_number(&self) -> f64 {
        let lo = self.min();
        if lo <= 0.0 {
            return f64::INFINITY;
        }
        self.max() / lo
    }
}

/// Eigenvalues only, ascending.
pub fn symmetric_eigenvalues(a: &[f64], n: usize) -> Vec<f64> {
    SymmetricEigen::decompose(a, n).values
}

fn sort_ascending(values: &mut [f64], vectors: &mut [f64], n: usize) {
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let sorted: Vec<f64> = order.iter().map(|&i| values[i]).collect();
    values[..n].copy_from_slice(&sorted);

    let old = vectors.to_vec();
    for (new_col, &old_col) in order.iter().enumerate() {
        for row in 0..n {
            vectors[row * n + new_col] = old[row * n + old_col];
        }
    }
}

/// `a` is destroyed (its diagonal converges to the eigenvalues).
fn jacobi_sweeps(a: &mut [f64], n: usize, values: &mut [f64], v: &mut [f64]) {
    const MAX_SWEEPS: usize = 50;
    const TOL: f64 = 1e-14;

    for i in 0..n {
        for j in 0..n {
            v[i * n + j] = if i == j { 1.0 } else { 0.0 };
        }
    }

    let scale = a
        .iter()
        .fold(0.0f64, |m, x| m.max(x.abs()))
        .max(f64::MIN_POSITIVE);

    for sweep in 0..MAX_SWEEPS {
        let mut max_off = 0.0f64;
        for p in 0..n {
            for q in (p + 1)..n {
                max_off = max_off.max(a[p * n + q].abs());
            }
        }
        if max_off < TOL * scale {
            break;
        }

        // Skip tiny rotations during the first sweeps
        let threshold = if sweep < 4 {
            0.2 * max_off / (n * n) as f64
        } else {
            0.0
        };

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[p * n + q];
                if apq.abs() < threshold || apq == 0.0 {
                    continue;
                }
                let diff = a[q * n + q] - a[p * n + p];
                let t = if diff.abs() < 1e-300 {
                    apq.signum()
                } else {
                    let theta = diff / (2.0 * apq);
                    theta.signum() / (theta.abs() + (1.0 + theta * theta).sqrt())
                };
                let c = 1.0 / (1.0 + t * t).sqrt();
                let s = t * c;
                let tau = s / (1.0 + c);

                a[p * n + p] -= t * apq;
                a[q * n + q] += t * apq;
                a[p * n + q] = 0.0;
                a[q * n + p] = 0.0;

                for r in 0..n {
                    if r == p || r == q {
                        continue;
                    }
                    let arp = a[r * n + p];
                    let arq = a[r * n + q];
                    a[r * n + p] = arp - s * (arq + tau * arp);
                    a[p * n + r] = a[r * n + p];
                    a[r * n + q] = arq + s * (arp - tau * arq);
                    a[q * n + r] = a[r * n + q];
                }
                for r in 0..n {
                    let vrp = v[r * n + p];
                    let vrq = v[r * n + q];
                    v[r * n + p] = vrp - s * (vrq + tau * vrp);
                    v[r * n + q] = vrq + s * (vrp - tau * vrq);
                }
            }
        }
    }

    for i in 0..n {
        values[i] = a[i * n + i];
    }
}
