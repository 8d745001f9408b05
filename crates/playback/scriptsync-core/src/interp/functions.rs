//! Interpolation helpers:
//! - lerp / clamp01
//! - cubic Hermite evaluation over one segment
//! - PCHIP (Fritsch-Butland weighted harmonic mean) endpoint slopes
//! - modified Akima (makima) endpoint slopes

#[inline]
pub fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

/// Linear interpolation, exact at both ends (`t = 0` gives `a`, `t = 1` gives `b`).
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

/// Cubic Hermite through `(x0, y0)` and `(x1, y1)` with end slopes `s0`, `s1`
/// (in y per x), evaluated at `x`.
#[inline]
pub fn cubic_hermite(x0: f64, y0: f64, x1: f64, y1: f64, s0: f64, s1: f64, x: f64) -> f64 {
    let d = x1 - x0;
    let dx = x - x0;
    let t = dx / d;
    let r = 1.0 - t;
    r * r * (y0 * (1.0 + 2.0 * t) + s0 * dx) + t * t * (y1 * (3.0 - 2.0 * t) - d * s1 * r)
}

#[inline]
fn secant(x0: f64, y0: f64, x1: f64, y1: f64) -> f64 {
    (y1 - y0) / (x1 - x0)
}

/// PCHIP slope at the middle point of three, from its two adjacent secants.
///
/// Zero at local extrema (secants of opposite sign) and whenever the weighted
/// harmonic mean is not finite.
#[inline]
fn pchip_slope(xa: f64, ya: f64, xb: f64, yb: f64, xc: f64, yc: f64) -> f64 {
    let h_left = xb - xa;
    let d_left = secant(xa, ya, xb, yb);
    let h_right = xc - xb;
    let d_right = secant(xb, yb, xc, yc);
    let w1 = 2.0 * h_right + h_left;
    let w2 = h_right + 2.0 * h_left;
    let s = (w1 + w2) / (w1 / d_left + w2 / d_right);
    if !s.is_finite() || d_left * d_right < 0.0 {
        0.0
    } else {
        s
    }
}

/// PCHIP slopes at the two interior points of a 4-point stencil
/// `(x0,y0)..(x3,y3)`; the segment being evaluated is `[x1, x2]`.
#[allow(clippy::too_many_arguments)]
pub fn pchip_slopes(
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    x3: f64,
    y3: f64,
) -> (f64, f64) {
    (
        pchip_slope(x0, y0, x1, y1, x2, y2),
        pchip_slope(x1, y1, x2, y2, x3, y3),
    )
}

#[inline]
fn makima_weight(a: f64, b: f64) -> f64 {
    (a - b).abs() + (a + b).abs() / 2.0
}

/// Makima slope between secants `m_left` and `m_right`, with the
/// outer secants `m_before` and `m_after` driving the weights.
#[inline]
fn makima_slope(m_before: f64, m_left: f64, m_right: f64, m_after: f64) -> f64 {
    let w_left = makima_weight(m_after, m_right);
    let w_right = makima_weight(m_left, m_before);
    let s = (w_left * m_left + w_right * m_right) / (w_left + w_right);
    if s.is_finite() {
        s
    } else {
        0.0
    }
}

/// Makima slopes at the two interior points of a 6-point stencil; the segment
/// being evaluated is `[x2, x3]`.
pub fn makima_slopes(xs: [f64; 6], ys: [f64; 6]) -> (f64, f64) {
    let m: [f64; 5] = std::array::from_fn(|i| secant(xs[i], ys[i], xs[i + 1], ys[i + 1]));
    (
        makima_slope(m[0], m[1], m[2], m[3]),
        makima_slope(m[1], m[2], m[3], m[4]),
    )
}
