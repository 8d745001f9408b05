use approx::assert_abs_diff_eq;
use scriptsync_core::{
    cursor::Cursor,
    data::{Keyframe, Timeline},
    interp::{evaluate, Stencil},
    InterpolationModel,
};

/// Small deterministic generator so property runs are reproducible.
struct Lcg(u64);

impl Lcg {
    fn next_f64(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }

    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }
}

fn monotone_stencil(rng: &mut Lcg, rising: bool) -> Stencil {
    let mut t = rng.range(-500.0, 500.0);
    let mut pos = if rising {
        rng.range(0.0, 20.0)
    } else {
        rng.range(80.0, 100.0)
    };
    let mut points = [(0.0, 0.0); 6];
    for p in points.iter_mut() {
        *p = (t, pos);
        t += rng.range(10.0, 800.0);
        let step = rng.range(0.5, 15.0);
        pos += if rising { step } else { -step };
    }
    Stencil::from_points(points)
}

#[test]
fn pchip_never_overshoots_monotone_segments() {
    let mut rng = Lcg(42);
    for case in 0..500 {
        let stencil = monotone_stencil(&mut rng, case % 2 == 0);
        let (p0, p1) = (stencil.p0(), stencil.p1());
        let lo = p0.pos.min(p1.pos);
        let hi = p0.pos.max(p1.pos);
        for i in 0..=40 {
            let t = p0.t + (p1.t - p0.t) * i as f64 / 40.0;
            let v = evaluate(InterpolationModel::Pchip, &stencil, t);
            assert!(
                v >= lo - 1e-9 && v <= hi + 1e-9,
                "case {case}: {v} outside [{lo}, {hi}] at t={t}"
            );
        }
    }
}

#[test]
fn cubic_models_hit_segment_endpoints() {
    let mut rng = Lcg(9);
    for _ in 0..200 {
        let stencil = monotone_stencil(&mut rng, true);
        let (p0, p1) = (stencil.p0(), stencil.p1());
        for model in [InterpolationModel::Pchip, InterpolationModel::Makima] {
            assert_abs_diff_eq!(evaluate(model, &stencil, p0.t), p0.pos, epsilon = 1e-9);
            assert_abs_diff_eq!(evaluate(model, &stencil, p1.t), p1.pos, epsilon = 1e-9);
        }
    }
}

#[test]
fn direction_reversal_flattens_pchip_slope() {
    // Peak at p0: incoming secant rises, outgoing falls.
    let stencil = Stencil::from_points([
        (-200.0, 0.0),
        (-100.0, 0.0),
        (0.0, 100.0),
        (100.0, 0.0),
        (200.0, 0.0),
        (300.0, 0.0),
    ]);
    for i in 1..10 {
        let v = evaluate(InterpolationModel::Pchip, &stencil, i as f64 * 10.0);
        assert!(v <= 100.0 && v >= 0.0);
    }
    // Zero slope at the peak: the curve leaves it flat.
    let near = evaluate(InterpolationModel::Pchip, &stencil, 1.0);
    assert!(near > 99.9, "{near}");
}

#[test]
fn makima_stays_flat_on_plateaus() {
    let stencil = Stencil::from_points([
        (0.0, 40.0),
        (100.0, 40.0),
        (200.0, 40.0),
        (300.0, 40.0),
        (400.0, 90.0),
        (500.0, 10.0),
    ]);
    for i in 0..=10 {
        let v = evaluate(InterpolationModel::Makima, &stencil, 200.0 + i as f64 * 10.0);
        assert_abs_diff_eq!(v, 40.0, epsilon = 1e-9);
    }
}

#[test]
fn every_model_stays_in_range_on_random_scripts() {
    let mut rng = Lcg(2024);
    let mut at = 0;
    let keyframes: Vec<Keyframe> = (0..200)
        .map(|_| {
            at += rng.range(0.0, 400.0) as i64;
            Keyframe::new(at, rng.range(0.0, 100.0))
        })
        .collect();
    let timeline = Timeline::from_keyframes(keyframes);
    for model in [
        InterpolationModel::Linear,
        InterpolationModel::Pchip,
        InterpolationModel::Makima,
    ] {
        let mut cursor = Cursor::new(&timeline, 0, 0, None);
        let mut t = 0;
        while cursor.advance(&timeline, t) == scriptsync_core::AdvanceResult::Continue {
            let stencil = Stencil::around(&timeline, &cursor).unwrap();
            let v = evaluate(model, &stencil, t as f64);
            assert!((0.0..=100.0).contains(&v), "{} gave {v}", model.name());
            t += 17;
        }
    }
}
