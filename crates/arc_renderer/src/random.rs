//! Thread-local uniform sampling.
//!
//! Every worker thread gets its own generator, seeded once from entropy on
//! first use. Nothing is shared across threads, so sampling never contends
//! and each thread's sequence stays reproducible for the life of the thread.

use arc_math::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;

thread_local! {
    static RNG: RefCell<SmallRng> = RefCell::new(SmallRng::from_entropy());
}

/// Uniform f32 in [0, 1).
pub fn random_f32() -> f32 {
    RNG.with(|rng| rng.borrow_mut().gen())
}

/// Uniform f32 in [min, max).
pub fn random_range(min: f32, max: f32) -> f32 {
    RNG.with(|rng| rng.borrow_mut().gen_range(min..max))
}

/// Uniform integer in [min, max], inclusive on both ends.
pub fn random_int(min: i32, max: i32) -> i32 {
    RNG.with(|rng| rng.borrow_mut().gen_range(min..=max))
}

/// Random point on the unit sphere surface.
pub fn random_unit_vector() -> Vec3 {
    loop {
        let p = Vec3::new(
            random_range(-1.0, 1.0),
            random_range(-1.0, 1.0),
            random_range(-1.0, 1.0),
        );
        let len_sq = p.length_squared();
        if len_sq > 1e-12 && len_sq < 1.0 {
            return p / len_sq.sqrt();
        }
    }
}

/// Random point in the unit disk on the XY plane.
pub fn random_in_unit_disk() -> Vec3 {
    loop {
        let p = Vec3::new(random_range(-1.0, 1.0), random_range(-1.0, 1.0), 0.0);
        if p.length_squared() < 1.0 {
            return p;
        }
    }
}
