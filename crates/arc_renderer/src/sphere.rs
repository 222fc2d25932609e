//! Sphere primitive.

use crate::hittable::{HitRecord, Hittable, UNASSIGNED_ID};
use crate::Material;
use arc_math::{Aabb, Interval, Ray, Vec3};
use std::f32::consts::PI;
use std::sync::Arc;

/// A sphere with a stable object identity and a scene-owned material handle.
pub struct Sphere {
    center: Vec3,
    radius: f32,
    material: Arc<dyn Material>,
    id: i32,
    bbox: Aabb,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32, material: Arc<dyn Material>) -> Self {
        let radius = radius.max(0.0);
        let rvec = Vec3::splat(radius);
        let bbox = Aabb::from_points(center - rvec, center + rvec);

        Self {
            center,
            radius,
            material,
            id: UNASSIGNED_ID,
            bbox,
        }
    }

    pub fn with_id(mut self, id: i32) -> Self {
        self.id = id;
        self
    }

    /// UV coordinates for a point on the unit sphere.
    fn sphere_uv(p: Vec3) -> (f32, f32) {
        let theta = (-p.y).acos();
        let phi = (-p.z).atan2(p.x) + PI;
        (phi / (2.0 * PI), theta / PI)
    }
}

impl Hittable for Sphere {
    fn hit(&self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord) -> bool {
        let oc = self.center - ray.origin();
        let a = ray.direction().length_squared();
        let h = ray.direction().dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = h * h - a * c;
        if discriminant < 0.0 {
            return false;
        }

        let sqrtd = discriminant.sqrt();

        // Nearest root in the acceptable range
        let mut root = (h - sqrtd) / a;
        if !ray_t.surrounds(root) {
            root = (h + sqrtd) / a;
            if !ray_t.surrounds(root) {
                return false;
            }
        }

        rec.t = root;
        rec.p = ray.at(rec.t);
        let outward_normal = (rec.p - self.center) / self.radius;
        rec.set_face_normal(ray, outward_normal);
        (rec.u, rec.v) = Self::sphere_uv(outward_normal);
        rec.object_id = self.id;
        rec.material = Some(Arc::clone(&self.material));
        rec.update_mat();

        true
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    fn id(&self) -> i32 {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Color, Lambertian};

    fn test_sphere(id: i32, mat_id: i32) -> Sphere {
        Sphere::new(
            Vec3::new(0.0, 0.0, -1.0),
            0.5,
            Arc::new(Lambertian::new(Color::splat(0.5)).with_id(mat_id)),
        )
        .with_id(id)
    }

    #[test]
    fn test_sphere_hit_records_identity() {
        let sphere = test_sphere(4, 9);
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let mut rec = HitRecord::new();

        assert!(sphere.hit(&ray, Interval::new(0.001, f32::INFINITY), &mut rec));
        assert!((rec.t - 0.5).abs() < 0.001);
        assert!(rec.front_face);
        assert_eq!(rec.object_id, 4);
        assert_eq!(rec.mat_id, 9);
        assert!(rec.material.is_some());
    }

    #[test]
    fn test_sphere_miss_leaves_record_untouched() {
        let sphere = test_sphere(4, 9);
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0));
        let mut rec = HitRecord::new();

        assert!(!sphere.hit(&ray, Interval::new(0.001, f32::INFINITY), &mut rec));
        assert_eq!(rec.object_id, UNASSIGNED_ID);
        assert_eq!(rec.mat_id, UNASSIGNED_ID);
        assert!(rec.material.is_none());
    }

    #[test]
    fn test_sphere_bounding_box() {
        let sphere = test_sphere(1, 1);
        let bbox = sphere.bounding_box();
        assert!(bbox.x.contains(-0.5) && bbox.x.contains(0.5));
        assert!(bbox.z.contains(-1.5) && bbox.z.contains(-0.5));
    }

    #[test]
    fn test_hit_outside_interval_rejected() {
        let sphere = test_sphere(1, 1);
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let mut rec = HitRecord::new();

        // Both roots (0.5 and 1.5) lie beyond the interval
        assert!(!sphere.hit(&ray, Interval::new(0.001, 0.4), &mut rec));
    }
}
