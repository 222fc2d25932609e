//! Parallel render loop.
//!
//! One pool job per pixel: a deterministic primary ray fills the auxiliary
//! channels, then jittered defocused samples accumulate radiance through the
//! recursive path tracer. Workers write only the cell they own, and the
//! framebuffer is handed out only after the pool's quiescence barrier.

use crate::{Camera, Color, Framebuffer, HitRecord, Hittable, Pixel, PoolError, ThreadPool};
use arc_math::{Interval, Ray};
use std::sync::Arc;

/// Offset below which self-intersection ("shadow acne") dominates.
const T_MIN: f32 = 0.001;

#[derive(Debug, Clone, Copy)]
pub struct RenderConfig {
    /// Samples per pixel for anti-aliasing and depth of field
    pub samples_per_pixel: u32,
    /// Maximum ray bounce depth
    pub max_depth: u32,
    /// Background color when a ray escapes the scene
    pub background: Color,
    /// Use the sky gradient instead of the flat background
    pub use_sky_gradient: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            samples_per_pixel: 64,
            max_depth: 50,
            background: Color::ZERO,
            use_sky_gradient: false,
        }
    }
}

/// Radiance seen along a ray, traced recursively up to `depth` bounces.
pub fn ray_color(ray: &Ray, world: &dyn Hittable, depth: u32, config: &RenderConfig) -> Color {
    if depth == 0 {
        return Color::ZERO;
    }

    let mut rec = HitRecord::new();
    if !world.hit(ray, Interval::new(T_MIN, f32::INFINITY), &mut rec) {
        // Escaped: background is a valid, common outcome
        if config.use_sky_gradient {
            return sky_gradient(ray);
        }
        return config.background;
    }

    let Some(material) = rec.material.clone() else {
        // Hit geometry with no material bound absorbs everything
        return Color::ZERO;
    };

    let emission = material.emitted(rec.u, rec.v, rec.p);
    match material.scatter(ray, &rec) {
        Some((attenuation, scattered)) => {
            emission + attenuation * ray_color(&scattered, world, depth - 1, config)
        }
        None => emission,
    }
}

fn sky_gradient(ray: &Ray) -> Color {
    let unit_direction = ray.direction().normalize();
    let a = 0.5 * (unit_direction.y + 1.0);
    let white = Color::new(1.0, 1.0, 1.0);
    let blue = Color::new(0.5, 0.7, 1.0);
    white * (1.0 - a) + blue * a
}

/// Trace one pixel: aux channels from the primary ray, radiance from the
/// sampled rays.
pub fn render_pixel(
    camera: &Camera,
    world: &dyn Hittable,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    config: &RenderConfig,
) -> Pixel {
    let mut pixel = Pixel::default();

    let primary = camera.primary_ray(x, y, width, height);
    let mut rec = HitRecord::new();
    if world.hit(&primary, Interval::new(T_MIN, f32::INFINITY), &mut rec) {
        pixel.hit = true;
        pixel.p = rec.p;
        pixel.normal = rec.normal;
        pixel.depth = (rec.p - primary.origin()).length();
        pixel.facing_ratio = (-primary.direction().normalize())
            .dot(rec.normal)
            .clamp(0.0, 1.0);
        pixel.object_id = rec.object_id;
        pixel.mat_id = rec.mat_id;
    }

    let mut color = Color::ZERO;
    for _ in 0..config.samples_per_pixel {
        let ray = camera.get_ray(x, y, width, height);
        color += ray_color(&ray, world, config.max_depth, config);
    }
    pixel.rgb = color / config.samples_per_pixel as f32;

    pixel
}

/// Render `width` x `height` pixels of `world` through `camera` on `pool`.
///
/// The camera must already hold derived state for this resolution's aspect
/// ratio. Pixels are independent units of work with no ordering guarantee; a
/// job that fails leaves its background pixel in place rather than taking the
/// pool down.
pub fn render(
    camera: Arc<Camera>,
    world: Arc<dyn Hittable>,
    width: u32,
    height: u32,
    config: RenderConfig,
    pool: &ThreadPool,
) -> Result<Arc<Framebuffer>, PoolError> {
    let framebuffer = Arc::new(Framebuffer::new(width, height));

    log::info!(
        "rendering {}x{} at {} spp on pool",
        width,
        height,
        config.samples_per_pixel
    );

    for y in 0..height {
        for x in 0..width {
            let camera = Arc::clone(&camera);
            let world = Arc::clone(&world);
            let framebuffer = Arc::clone(&framebuffer);
            pool.queue(move || {
                let pixel = render_pixel(&camera, world.as_ref(), x, y, width, height, &config);
                // Safety: (x, y) is owned by this job alone, and readers wait
                // for the barrier below.
                unsafe { framebuffer.write(x, y, pixel) };
            })?;
        }
    }

    pool.wait();
    log::info!("render complete");

    Ok(framebuffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BvhNode, Lambertian, Sphere, Vec3};

    fn one_sphere_world() -> Arc<dyn Hittable> {
        let sphere = Sphere::new(
            Vec3::new(0.0, 0.0, -3.0),
            2.0,
            Arc::new(Lambertian::new(Color::splat(0.5)).with_id(2)),
        )
        .with_id(1);
        Arc::new(BvhNode::new(vec![Box::new(sphere)]))
    }

    fn test_camera(aspect: f32) -> Camera {
        let mut camera = Camera::new();
        camera.compute_derived(aspect).unwrap();
        camera
    }

    #[test]
    fn test_ray_color_background() {
        let world = one_sphere_world();
        let config = RenderConfig {
            background: Color::new(0.1, 0.2, 0.3),
            ..Default::default()
        };

        // Pointing away from the sphere
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0));
        let color = ray_color(&ray, world.as_ref(), 10, &config);
        assert_eq!(color, Color::new(0.1, 0.2, 0.3));
    }

    #[test]
    fn test_sky_gradient_varies_with_elevation() {
        let up = Ray::new(Vec3::ZERO, Vec3::Y);
        let down = Ray::new(Vec3::ZERO, Vec3::NEG_Y);
        assert!(sky_gradient(&up).x < sky_gradient(&down).x);
    }

    #[test]
    fn test_render_pixel_aux_channels() {
        let camera = test_camera(1.0);
        let world = one_sphere_world();
        let config = RenderConfig {
            samples_per_pixel: 4,
            max_depth: 4,
            ..Default::default()
        };

        let pixel = render_pixel(&camera, world.as_ref(), 1, 1, 3, 3, &config);
        assert!(pixel.hit);
        assert_eq!(pixel.object_id, 1);
        assert_eq!(pixel.mat_id, 2);
        // Sphere front surface at z=-1, one unit from the camera
        assert!((pixel.depth - 1.0).abs() < 0.05);
        assert!(pixel.facing_ratio > 0.9);
        assert!((pixel.normal - Vec3::Z).length() < 0.1);
    }

    #[test]
    fn test_render_pixel_miss_is_background() {
        let camera = test_camera(1.0);
        let world: Arc<dyn Hittable> = Arc::new(BvhNode::new(vec![]));
        let config = RenderConfig {
            samples_per_pixel: 1,
            max_depth: 2,
            ..Default::default()
        };

        let pixel = render_pixel(&camera, world.as_ref(), 0, 0, 2, 2, &config);
        assert!(!pixel.hit);
        assert_eq!(pixel.object_id, -1);
        assert_eq!(pixel.mat_id, -1);
    }

    #[test]
    fn test_parallel_render_fills_framebuffer() {
        let camera = Arc::new(test_camera(1.0));
        let world = one_sphere_world();
        let config = RenderConfig {
            samples_per_pixel: 2,
            max_depth: 4,
            ..Default::default()
        };

        let pool = ThreadPool::new(4);
        let framebuffer = render(camera, world, 8, 8, config, &pool).unwrap();

        assert_eq!(framebuffer.width(), 8);
        assert_eq!(framebuffer.height(), 8);
        // The sphere fills the frame from this camera
        let center = framebuffer.pixel(4, 4);
        assert!(center.hit);
        assert_eq!(center.object_id, 1);
    }
}
