/// Logistic function 1 / (1 + exp(-t)), computed branch-wise on the sign
/// of `t` so neither branch ever exponentiates a large positive number.
pub fn sigmoid(t: f64) -> f64 {
    if t > 0.0 {
        1.0 / (1.0 + (-t).exp())
    } else {
        let exp_t = t.exp();
        exp_t / (1.0 + exp_t)
    }
}

/// Logistic loss log(1 + exp(-z)), i.e. softplus(-z), with the same
/// sign-branch split as [`sigmoid`].
///
/// For z <= 0 the naive formula would evaluate exp(-z) and overflow; the
/// rearranged form -z + log(1 + exp(z)) stays finite for any finite input.
pub fn log_loss(z: f64) -> f64 {
    if z > 0.0 {
        (-z).exp().ln_1p()
    } else {
        -z + z.exp().ln_1p()
    }
}

/// Softplus log(1 + exp(t)), the mirror of [`log_loss`].
pub fn softplus(t: f64) -> f64 {
    log_loss(-t)
}

/// Inverse of [`softplus`] on (0, inf): log(exp(v) - 1).
///
/// Inputs at or below zero are clamped to a tiny positive value so callers
/// mapping a point sitting exactly on a bound get a large negative raw
/// coordinate instead of -inf.
pub fn softplus_inv(v: f64) -> f64 {
    let v = v.max(1e-12);
    if v > 30.0 {
        // exp(v) - 1 == exp(v) to machine precision
        v
    } else {
        v.exp_m1().ln()
    }
}
