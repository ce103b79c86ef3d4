//! Local stand-in for PageSpeed scores when the API is unavailable.
//!
//! The numbers are derived from the measured response time plus random jitter. They are not
//! measurements and are always reported with `scoreSource = estimated`.

use crate::models::{CoreWebVitals, PageSpeedResult};
use rand::Rng;

/// Performance baseline for a given total response time
pub fn base_performance(total_ms: u64) -> i32 {
    match total_ms {
        0..1000 => 90,
        1000..2000 => 70,
        2000..3000 => 50,
        _ => 30,
    }
}

/// `base` shifted by up to `variance / 2` in either direction, clamped to 0..=100
fn jittered_score(base: i32, variance: f64, rng: &mut impl Rng) -> u8 {
    let value = base as f64 + (rng.r#gen::<f64>() - 0.5) * variance;
    value.round().clamp(0.0, 100.0) as u8
}

pub fn estimate(total_ms: u64, rng: &mut impl Rng) -> PageSpeedResult {
    let base = base_performance(total_ms);

    let performance = jittered_score(base, 10.0, rng);
    let mobile = jittered_score(base - 10, 15.0, rng);
    let desktop = jittered_score(base + 5, 10.0, rng);
    let accessibility = jittered_score(75, 20.0, rng);
    let best_practices = jittered_score(80, 15.0, rng);

    let lcp = (total_ms as f64 * 0.8 + rng.r#gen::<f64>() * 500.0).round() as u64;
    let fid = (50.0 + rng.r#gen::<f64>() * 100.0).round() as u64;
    let cls = (rng.r#gen::<f64>() * 0.25 * 1000.0).round() / 1000.0;

    PageSpeedResult {
        performance_score: Some(performance),
        accessibility_score: Some(accessibility),
        best_practices_score: Some(best_practices),
        seo_score: None,
        mobile_score: Some(mobile),
        desktop_score: Some(desktop),
        core_web_vitals: CoreWebVitals {
            lcp: Some(lcp),
            fid: Some(fid),
            cls: Some(cls),
        },
    }
}
