//! Scoring math for the screen: the containment identity transform and the
//! binomial survival function behind the p-value column.
//!
//! The special functions are implemented directly (Lanczos ln-gamma, Lentz
//! continued fraction for the regularized incomplete beta); the upper tail
//! of the binomial is taken through the beta identity
//! `P(X >= x) = I_p(x, n - x + 1)` rather than `1 - cdf`, so tiny p-values
//! keep their precision.

/// ln(Γ(x)) by the Lanczos approximation (g = 5, six coefficients).
///
/// Returns `f64::INFINITY` for non-positive `x`.
pub fn ln_gamma(x: f64) -> f64 {
    const COEFFS: [f64; 6] = [
        76.18009172947146,
        -86.50532032941677,
        24.01409824083091,
        -1.231739572450155,
        0.1208650973866179e-2,
        -0.5395239384953e-5,
    ];

    if x <= 0.0 {
        return f64::INFINITY;
    }

    let tmp = x + 5.5;
    let tmp = tmp - (x + 0.5) * tmp.ln();
    let mut series = 1.000000000190015;
    let mut denom = x;
    for c in COEFFS {
        denom += 1.0;
        series += c / denom;
    }
    -tmp + (2.5066282746310005 * series / x).ln()
}

/// Continued fraction for the incomplete beta, evaluated with the modified
/// Lentz method. Only called with `x < (a + 1) / (a + b + 2)` where it
/// converges quickly.
fn beta_continued_fraction(a: f64, b: f64, x: f64) -> f64 {
    const MAX_ITER: u32 = 200;
    const EPS: f64 = 1e-15;
    const FPMIN: f64 = 1e-300;

    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;
    let mut c = 1.0;
    let mut d = 1.0 - qab * x / qap;
    if d.abs() < FPMIN {
        d = FPMIN;
    }
    d = 1.0 / d;
    let mut h = d;

    for m in 1..=MAX_ITER {
        let m = f64::from(m);
        let m2 = 2.0 * m;

        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 + aa * d;
        if d.abs() < FPMIN {
            d = FPMIN;
        }
        c = 1.0 + aa / c;
        if c.abs() < FPMIN {
            c = FPMIN;
        }
        d = 1.0 / d;
        h *= d * c;

        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 + aa * d;
        if d.abs() < FPMIN {
            d = FPMIN;
        }
        c = 1.0 + aa / c;
        if c.abs() < FPMIN {
            c = FPMIN;
        }
        d = 1.0 / d;
        let delta = d * c;
        h *= delta;
        if (delta - 1.0).abs() < EPS {
            break;
        }
    }
    h
}

/// Regularized incomplete beta function I_x(a, b).
pub fn incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    let ln_front =
        ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln();
    let front = ln_front.exp();

    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(a, b, x) / a
    } else {
        1.0 - front * beta_continued_fraction(b, a, 1.0 - x) / b
    }
}

/// Binomial survival: P(X >= observed) for X ~ Binom(trials, p).
pub fn binomial_survival(observed: u64, trials: u64, p: f64) -> f64 {
    if observed == 0 {
        return 1.0;
    }
    if observed > trials {
        return 0.0;
    }
    if p <= 0.0 {
        return 0.0;
    }
    if p >= 1.0 {
        return 1.0;
    }
    incomplete_beta(observed as f64, (trials - observed) as f64 + 1.0, p)
}

/// p-value of seeing `shared` of a reference's `sketch_size` hashes in a
/// mixture whose distinct k-mer set is a random subset of `kmer_space` with
/// estimated size `set_size`.
pub fn containment_pvalue(shared: u64, set_size: u64, kmer_space: f64, sketch_size: u64) -> f64 {
    if shared == 0 {
        return 1.0;
    }
    let r = set_size as f64 / kmer_space;
    binomial_survival(shared, sketch_size, r)
}

/// Containment identity from the shared-hash ratio: (shared / size)^(1/k).
/// The endpoints are forced so a full match is exactly 1.0 (`pow(1, 1/k)`
/// can produce a negative zero) and an empty one exactly 0.0.
pub fn estimate_identity(shared: u64, sketch_size: u64, kmer_length: u8) -> f64 {
    if shared == sketch_size {
        1.0
    } else if shared == 0 {
        0.0
    } else {
        let jaccard = shared as f64 / sketch_size as f64;
        jaccard.powf(1.0 / f64::from(kmer_length))
    }
}
