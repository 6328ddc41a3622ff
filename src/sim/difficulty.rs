//! Difficulty curve
//!
//! Cubic ease-in up to the threshold level, logarithmic growth after it.
//! Both pieces meet at factor 1.0 on the threshold.

use crate::tuning::DifficultySpec;

/// Monotone difficulty factor for a level (0 at level 0, 1 at the threshold)
pub fn difficulty_factor(level: u32, spec: &DifficultySpec) -> f32 {
    let threshold = spec.ease_threshold_level.max(1);
    if level <= threshold {
        let t = level as f32 / threshold as f32;
        t * t * t
    } else {
        1.0 + ((level - threshold) as f32).ln_1p() * spec.log_scale
    }
}

/// Time between root obstacle spawns
pub fn spawn_interval_ms(level: u32, spec: &DifficultySpec) -> f64 {
    let f = difficulty_factor(level, spec) as f64;
    let span = spec.base_spawn_interval_ms - spec.min_spawn_interval_ms;
    spec.min_spawn_interval_ms + span * (-f).exp()
}

/// Forward speed range for new root obstacles, pixels per base tick
pub fn speed_range(level: u32, spec: &DifficultySpec) -> (f32, f32) {
    let f = difficulty_factor(level, spec);
    let min = spec.base_speed_min * (1.0 + spec.speed_min_growth * f);
    let max = spec.base_speed_max * (1.0 + spec.speed_max_growth * f);
    (min, max.max(min))
}
