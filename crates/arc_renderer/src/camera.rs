//! Physical thin-lens camera.
//!
//! Field of view and depth of field are not independent knobs: both fall out
//! of the sensor width, focal length, and f-stop, the way a real lens couples
//! them. Scene setup mutates the physical inputs, then [`Camera::compute_derived`]
//! turns them into ray-generation geometry for a given output aspect ratio.
//! After that the camera is read-only and shared by every worker thread.

use crate::random::{random_f32, random_in_unit_disk};
use arc_math::{Ray, Vec3};
use thiserror::Error;

/// Configuration errors caught before any derived value is trusted.
#[derive(Debug, Error, PartialEq)]
pub enum CameraError {
    #[error("camera center and lookat coincide; facing direction is undefined")]
    DegenerateOrientation,
    #[error("vup is parallel to the view direction; basis is undefined")]
    DegenerateUp,
    #[error("aspect ratio must be positive, got {0}")]
    InvalidAspectRatio(f32),
    #[error("f-stop must be positive, got {0}")]
    InvalidFStop(f32),
}

#[derive(Debug, Clone)]
pub struct Camera {
    // Physical inputs, free to mutate during scene setup
    pub center: Vec3,
    pub lookat: Vec3,
    pub vup: Vec3,
    /// Sensor width in mm (super 35 by default)
    pub sensor_width: f32,
    /// Focal length in mm
    pub focal_length: f32,
    pub f_stop: f32,

    // Derived state, valid only after compute_derived
    facing_dir: Vec3,
    focus_distance: f32,
    focal_length_m: f32,
    lens_radius: f32,
    defocus_angle: f32,
    vfov: f32,
    u: Vec3,
    v: Vec3,
    w: Vec3,
    viewport_u: Vec3,
    viewport_v: Vec3,
    viewport_upper_left: Vec3,
}

impl Camera {
    pub fn new() -> Self {
        Self {
            center: Vec3::ZERO,
            lookat: Vec3::new(0.0, 0.0, -1.0),
            vup: Vec3::Y,
            sensor_width: 25.34,
            focal_length: 35.0,
            f_stop: 2.8,
            facing_dir: Vec3::Z,
            focus_distance: 0.0,
            focal_length_m: 0.0,
            lens_radius: 0.0,
            defocus_angle: 0.0,
            vfov: 0.0,
            u: Vec3::X,
            v: Vec3::Y,
            w: Vec3::Z,
            viewport_u: Vec3::ZERO,
            viewport_v: Vec3::ZERO,
            viewport_upper_left: Vec3::ZERO,
        }
    }

    /// Recompute all derived values for the target image aspect ratio.
    ///
    /// Deterministic in the physical inputs and `aspect_ratio`; mutates only
    /// the camera's own derived fields. Must run again whenever an input or
    /// the aspect ratio changes, and before any ray generation.
    pub fn compute_derived(&mut self, aspect_ratio: f32) -> Result<(), CameraError> {
        if !(aspect_ratio > 0.0) {
            return Err(CameraError::InvalidAspectRatio(aspect_ratio));
        }
        if !(self.f_stop > 0.0) {
            return Err(CameraError::InvalidFStop(self.f_stop));
        }
        let offset = self.center - self.lookat;
        if offset.length_squared() < 1e-12 {
            return Err(CameraError::DegenerateOrientation);
        }

        // Focal length and sensor height in meters
        self.focal_length_m = self.focal_length / 1000.0;
        let sensor_height = (self.sensor_width / 1000.0) / aspect_ratio;
        // Vertical field of view from the sensor/lens geometry
        self.vfov = 2.0 * ((sensor_height / 2.0) / self.focal_length_m).atan().to_degrees();
        // Thin-lens aperture: cone half-angle doubled, and the disk radius
        self.defocus_angle = 2.0 * (1.0 / (2.0 * self.f_stop)).atan().to_degrees();
        self.lens_radius = self.focal_length_m / (2.0 * self.f_stop);
        self.facing_dir = offset.normalize();
        self.focus_distance = offset.length();

        // Orthonormal basis and the viewport on the focus plane
        self.w = self.facing_dir;
        let up_cross = self.vup.cross(self.w);
        if up_cross.length_squared() < 1e-12 {
            return Err(CameraError::DegenerateUp);
        }
        self.u = up_cross.normalize();
        self.v = self.w.cross(self.u);

        let h = (self.vfov.to_radians() / 2.0).tan();
        let viewport_height = 2.0 * h * self.focus_distance;
        let viewport_width = viewport_height * aspect_ratio;
        self.viewport_u = viewport_width * self.u;
        self.viewport_v = -viewport_height * self.v;
        self.viewport_upper_left = self.center
            - self.focus_distance * self.w
            - self.viewport_u / 2.0
            - self.viewport_v / 2.0;

        Ok(())
    }

    /// Jittered sample ray for pixel (x, y): random point within the pixel's
    /// footprint on the focus plane, originating from the lens disk when the
    /// aperture is open.
    pub fn get_ray(&self, x: u32, y: u32, image_width: u32, image_height: u32) -> Ray {
        let target = self.pixel_target(
            x as f32 + random_f32(),
            y as f32 + random_f32(),
            image_width,
            image_height,
        );

        let origin = if self.defocus_angle <= 0.0 {
            self.center
        } else {
            self.lens_sample()
        };

        Ray::new(origin, target - origin)
    }

    /// Deterministic center-of-pixel ray from the camera center, no jitter and
    /// no lens offset. Aux channels (ids, depth, normals) are traced with this
    /// so they don't swim with the sampling seed.
    pub fn primary_ray(&self, x: u32, y: u32, image_width: u32, image_height: u32) -> Ray {
        let target = self.pixel_target(x as f32 + 0.5, y as f32 + 0.5, image_width, image_height);
        Ray::new(self.center, target - self.center)
    }

    fn pixel_target(&self, px: f32, py: f32, image_width: u32, image_height: u32) -> Vec3 {
        let pixel_delta_u = self.viewport_u / image_width as f32;
        let pixel_delta_v = self.viewport_v / image_height as f32;
        self.viewport_upper_left + px * pixel_delta_u + py * pixel_delta_v
    }

    fn lens_sample(&self) -> Vec3 {
        let p = random_in_unit_disk();
        self.center + self.lens_radius * (p.x * self.u + p.y * self.v)
    }

    /// Unit vector from `lookat` toward `center`.
    pub fn facing_dir(&self) -> Vec3 {
        self.facing_dir
    }

    /// Distance between `center` and `lookat`.
    pub fn focus_distance(&self) -> f32 {
        self.focus_distance
    }

    /// Vertical field of view in degrees.
    pub fn vfov(&self) -> f32 {
        self.vfov
    }

    /// Aperture cone angle in degrees.
    pub fn defocus_angle(&self) -> f32 {
        self.defocus_angle
    }

    /// Aperture radius in meters.
    pub fn lens_radius(&self) -> f32 {
        self.lens_radius
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn derived_snapshot(camera: &Camera) -> (Vec3, f32, f32, f32, f32) {
        (
            camera.facing_dir(),
            camera.focus_distance(),
            camera.vfov(),
            camera.defocus_angle(),
            camera.lens_radius(),
        )
    }

    #[test]
    fn test_compute_derived_is_deterministic() {
        let mut a = Camera::new();
        a.center = Vec3::new(1.0, 2.0, 3.0);
        a.lookat = Vec3::new(0.0, 0.0, -1.0);
        let mut b = a.clone();

        a.compute_derived(16.0 / 9.0).unwrap();
        b.compute_derived(16.0 / 9.0).unwrap();
        assert_eq!(derived_snapshot(&a), derived_snapshot(&b));

        // Recomputing with the same inputs changes nothing
        let before = derived_snapshot(&a);
        a.compute_derived(16.0 / 9.0).unwrap();
        assert_eq!(before, derived_snapshot(&a));
    }

    #[test]
    fn test_facing_dir_and_focus_distance() {
        let mut camera = Camera::new();
        camera.center = Vec3::new(0.0, 0.0, 3.0);
        camera.lookat = Vec3::new(0.0, 0.0, -1.0);
        camera.compute_derived(1.0).unwrap();

        assert!((camera.facing_dir().length() - 1.0).abs() < 1e-6);
        assert!((camera.facing_dir() - Vec3::Z).length() < 1e-6);
        assert_eq!(camera.focus_distance(), 4.0);
    }

    #[test]
    fn test_physical_derivations() {
        let mut camera = Camera::new();
        camera.sensor_width = 36.0;
        camera.focal_length = 50.0;
        camera.f_stop = 2.0;
        camera.compute_derived(1.5).unwrap();

        // sensor height 24mm, vfov = 2*atan(12/50)
        let expected_vfov = 2.0 * (12.0f32 / 50.0).atan().to_degrees();
        assert!((camera.vfov() - expected_vfov).abs() < 1e-4);

        // lens radius = 0.05m / 4
        assert!((camera.lens_radius() - 0.0125).abs() < 1e-6);

        let expected_defocus = 2.0 * (0.25f32).atan().to_degrees();
        assert!((camera.defocus_angle() - expected_defocus).abs() < 1e-4);
    }

    #[test]
    fn test_degenerate_configs_rejected() {
        let mut camera = Camera::new();
        camera.lookat = camera.center;
        assert_eq!(
            camera.compute_derived(1.0),
            Err(CameraError::DegenerateOrientation)
        );

        let mut camera = Camera::new();
        assert_eq!(
            camera.compute_derived(0.0),
            Err(CameraError::InvalidAspectRatio(0.0))
        );
        assert_eq!(
            camera.compute_derived(-1.5),
            Err(CameraError::InvalidAspectRatio(-1.5))
        );

        let mut camera = Camera::new();
        camera.f_stop = 0.0;
        assert_eq!(camera.compute_derived(1.0), Err(CameraError::InvalidFStop(0.0)));

        let mut camera = Camera::new();
        camera.vup = Vec3::Z; // parallel to the view direction
        assert_eq!(camera.compute_derived(1.0), Err(CameraError::DegenerateUp));
    }

    #[test]
    fn test_primary_ray_points_at_scene() {
        let mut camera = Camera::new();
        camera.compute_derived(1.0).unwrap();

        // Center pixel of a 3x3 image looks straight down -Z
        let ray = camera.primary_ray(1, 1, 3, 3);
        assert_eq!(ray.origin(), camera.center);
        let dir = ray.direction().normalize();
        assert!((dir - Vec3::NEG_Z).length() < 1e-4);
    }

    #[test]
    fn test_get_ray_respects_aperture() {
        let mut camera = Camera::new();
        camera.compute_derived(1.0).unwrap();

        // f/2.8 opens the aperture, so origins scatter on the lens disk
        for _ in 0..20 {
            let ray = camera.get_ray(0, 0, 4, 4);
            let offset = ray.origin() - camera.center;
            assert!(offset.length() <= camera.lens_radius() + 1e-6);
        }
    }
}
