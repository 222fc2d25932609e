//! Arclight render core.
//!
//! Offline CPU ray tracer: a thin-lens physical camera generates rays, scene
//! objects answer intersection queries through the [`Hittable`] contract, and a
//! fixed-size [`ThreadPool`] traces one pixel per job into a shared
//! [`Framebuffer`] of deep pixel records.

mod bvh;
mod camera;
mod hittable;
mod material;
mod pixel;
mod pool;
pub mod random;
mod renderer;
mod sphere;

pub use bvh::BvhNode;
pub use camera::{Camera, CameraError};
pub use hittable::{HitRecord, Hittable, HittableList};
pub use material::{Color, Dielectric, DiffuseLight, Lambertian, Material, Metal};
pub use pixel::{Framebuffer, Pixel};
pub use pool::{PoolError, ThreadPool};
pub use renderer::{ray_color, render, render_pixel, RenderConfig};
pub use sphere::Sphere;

/// Re-export common math types from arc_math
pub use arc_math::{Aabb, Interval, Ray, Vec3};
