//! Segment interpolation.
//!
//! Three models share one entry point, [`evaluate`]: linear, monotone cubic
//! Hermite with PCHIP slopes and cubic Hermite with makima slopes. Model
//! choice is a pure function of the config; nothing model-specific persists
//! between ticks.

pub mod functions;
pub mod stencil;

pub use stencil::{Stencil, StencilPoint};

use crate::config::InterpolationModel;
use functions::{clamp01, cubic_hermite, lerp, makima_slopes, pchip_slopes};

/// Target position in [0,100] at shifted time `t_ms` on the stencil's `[p0, p1]` segment.
pub fn evaluate(model: InterpolationModel, stencil: &Stencil, t_ms: f64) -> f64 {
    let p0 = stencil.p0();
    let p1 = stencil.p1();
    if p0.t == p1.t {
        return p0.pos.clamp(0.0, 100.0);
    }

    let value = match model {
        InterpolationModel::Linear => lerp(p0.pos, p1.pos, clamp01((t_ms - p0.t) / (p1.t - p0.t))),
        InterpolationModel::Pchip => {
            let [_, pm1, _, _, pp1, _] = stencil.points;
            let (s0, s1) = pchip_slopes(pm1.t, pm1.pos, p0.t, p0.pos, p1.t, p1.pos, pp1.t, pp1.pos);
            cubic_hermite(p0.t, p0.pos, p1.t, p1.pos, s0, s1, clamp_time(t_ms, p0.t, p1.t))
        }
        InterpolationModel::Makima => {
            let (s0, s1) = makima_slopes(stencil.times(), stencil.positions());
            cubic_hermite(p0.t, p0.pos, p1.t, p1.pos, s0, s1, clamp_time(t_ms, p0.t, p1.t))
        }
    };

    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        p0.pos.clamp(0.0, 100.0)
    }
}

#[inline]
fn clamp_time(t: f64, t0: f64, t1: f64) -> f64 {
    t.clamp(t0.min(t1), t0.max(t1))
}
