//! Scene-object contract and the per-query hit record.

use crate::Material;
use arc_math::{Aabb, Interval, Ray, Vec3};
use std::sync::Arc;

/// Sentinel for "no object / no material assigned".
pub const UNASSIGNED_ID: i32 = -1;

/// Record of a ray-object intersection.
///
/// Stack-allocated scratch state, passed by reference down the intersection
/// chain. Aggregates may overwrite it several times during traversal; only the
/// closest hit within the queried interval survives, and enforcing that is the
/// traversal's job, not the record's. A record whose `t` was never written must
/// not be trusted downstream.
#[derive(Clone)]
pub struct HitRecord {
    /// Point of intersection
    pub p: Vec3,
    /// Surface normal at the intersection (always points against the ray)
    pub normal: Vec3,
    /// Shared handle to the material at the hit point; owned by the scene
    pub material: Option<Arc<dyn Material>>,
    /// UV texture coordinates
    pub u: f32,
    pub v: f32,
    /// Ray parameter where the intersection occurs
    pub t: f32,
    /// Whether the ray hit the front face (outside) of the surface
    pub front_face: bool,
    /// Identity of the object that was hit, -1 until a hit is recorded
    pub object_id: i32,
    /// Identity of the material at the hit, -1 until synced via `update_mat`
    pub mat_id: i32,
}

impl HitRecord {
    pub fn new() -> Self {
        Self {
            p: Vec3::ZERO,
            normal: Vec3::ZERO,
            material: None,
            u: 0.0,
            v: 0.0,
            t: 0.0,
            front_face: false,
            object_id: UNASSIGNED_ID,
            mat_id: UNASSIGNED_ID,
        }
    }

    /// Set the face normal based on ray direction and outward normal.
    ///
    /// The stored normal always opposes the incoming ray, so shading is
    /// consistent no matter which side of the surface was hit.
    pub fn set_face_normal(&mut self, ray: &Ray, outward_normal: Vec3) {
        self.front_face = ray.direction().dot(outward_normal) < 0.0;
        self.normal = if self.front_face {
            outward_normal
        } else {
            -outward_normal
        };
    }

    /// Sync `mat_id` from the bound material.
    ///
    /// Intersection routines call this immediately after binding a material.
    /// With no material bound this is a no-op and `mat_id` keeps its value.
    pub fn update_mat(&mut self) {
        if let Some(material) = &self.material {
            self.mat_id = material.id();
        }
    }
}

impl Default for HitRecord {
    fn default() -> Self {
        Self::new()
    }
}

/// Contract every renderable entity satisfies, leaf primitive or aggregate.
///
/// Both queries are pure with respect to the object. Aggregates compose child
/// hittables behind the same trait, so traversal never needs to know which
/// kind it is facing.
pub trait Hittable: Send + Sync {
    /// Test the ray against this object within `ray_t`.
    ///
    /// Returns true and overwrites `rec` on a hit; leaves `rec` untouched on a
    /// miss. Aggregates must narrow the interval to the closest hit found so
    /// far while walking children, so farther hits are pruned.
    fn hit(&self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord) -> bool;

    /// Axis-aligned box enclosing the object, stable for its lifetime.
    fn bounding_box(&self) -> Aabb;

    /// Stable numeric identity, -1 when unassigned (aggregates stay at -1).
    fn id(&self) -> i32 {
        UNASSIGNED_ID
    }
}

/// A flat list of hittable objects.
pub struct HittableList {
    objects: Vec<Box<dyn Hittable>>,
    bbox: Aabb,
}

impl HittableList {
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            bbox: Aabb::EMPTY,
        }
    }

    pub fn add(&mut self, object: Box<dyn Hittable>) {
        self.bbox = Aabb::surrounding(&self.bbox, &object.bounding_box());
        self.objects.push(object);
    }

    pub fn clear(&mut self) {
        self.objects.clear();
        self.bbox = Aabb::EMPTY;
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Hand the objects off, e.g. to a BVH build.
    pub fn into_objects(self) -> Vec<Box<dyn Hittable>> {
        self.objects
    }
}

impl Default for HittableList {
    fn default() -> Self {
        Self::new()
    }
}

impl Hittable for HittableList {
    fn hit(&self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord) -> bool {
        let mut hit_anything = false;
        let mut closest_so_far = ray_t.max;

        for object in &self.objects {
            let narrowed = Interval::new(ray_t.min, closest_so_far);
            if object.hit(ray, narrowed, rec) {
                hit_anything = true;
                closest_so_far = rec.t;
            }
        }

        hit_anything
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}
