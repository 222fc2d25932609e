//! Material trait for surface scattering.

use crate::hittable::{HitRecord, UNASSIGNED_ID};
use crate::random::{random_f32, random_unit_vector};
use arc_math::{Ray, Vec3};

/// Color type alias (RGB values typically 0-1)
pub type Color = Vec3;

/// How light interacts with a surface.
pub trait Material: Send + Sync {
    /// Scatter an incoming ray.
    ///
    /// Returns Some((attenuation, scattered_ray)) if the ray scatters,
    /// or None if the ray is absorbed.
    fn scatter(&self, ray_in: &Ray, rec: &HitRecord) -> Option<(Color, Ray)>;

    /// Emitted light at the given UV coordinates and point.
    /// Most materials emit nothing.
    fn emitted(&self, _u: f32, _v: f32, _p: Vec3) -> Color {
        Color::ZERO
    }

    /// The material's identity number, synced into hit records and used by
    /// the cryptomatte export. -1 when unassigned.
    fn id(&self) -> i32 {
        UNASSIGNED_ID
    }
}

/// Lambertian (diffuse) material.
pub struct Lambertian {
    albedo: Color,
    id: i32,
}

impl Lambertian {
    pub fn new(albedo: Color) -> Self {
        Self {
            albedo,
            id: UNASSIGNED_ID,
        }
    }

    pub fn with_id(mut self, id: i32) -> Self {
        self.id = id;
        self
    }
}

impl Material for Lambertian {
    fn scatter(&self, _ray_in: &Ray, rec: &HitRecord) -> Option<(Color, Ray)> {
        let mut scatter_direction = rec.normal + random_unit_vector();

        // Catch degenerate scatter direction
        if scatter_direction.length_squared() < 1e-8 {
            scatter_direction = rec.normal;
        }

        Some((self.albedo, Ray::new(rec.p, scatter_direction)))
    }

    fn id(&self) -> i32 {
        self.id
    }
}

/// Metal (specular) material.
pub struct Metal {
    albedo: Color,
    /// Roughness, 0.0 = perfect mirror, 1.0 = very rough
    fuzz: f32,
    id: i32,
}

impl Metal {
    pub fn new(albedo: Color, fuzz: f32) -> Self {
        Self {
            albedo,
            fuzz: fuzz.clamp(0.0, 1.0),
            id: UNASSIGNED_ID,
        }
    }

    pub fn with_id(mut self, id: i32) -> Self {
        self.id = id;
        self
    }
}

impl Material for Metal {
    fn scatter(&self, ray_in: &Ray, rec: &HitRecord) -> Option<(Color, Ray)> {
        let reflected = reflect(ray_in.direction().normalize(), rec.normal);
        let scattered_dir = reflected + self.fuzz * random_unit_vector();

        // Only scatter if the reflected ray leaves the surface
        if scattered_dir.dot(rec.normal) > 0.0 {
            Some((self.albedo, Ray::new(rec.p, scattered_dir)))
        } else {
            None
        }
    }

    fn id(&self) -> i32 {
        self.id
    }
}

/// Dielectric (glass) material.
pub struct Dielectric {
    /// Index of refraction (1.0 = air, 1.5 = glass, 2.4 = diamond)
    ior: f32,
    id: i32,
}

impl Dielectric {
    pub fn new(ior: f32) -> Self {
        Self {
            ior,
            id: UNASSIGNED_ID,
        }
    }

    pub fn with_id(mut self, id: i32) -> Self {
        self.id = id;
        self
    }

    /// Schlick's approximation for reflectance.
    fn reflectance(cosine: f32, refraction_index: f32) -> f32 {
        let r0 = (1.0 - refraction_index) / (1.0 + refraction_index);
        let r0 = r0 * r0;
        r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
    }
}

impl Material for Dielectric {
    fn scatter(&self, ray_in: &Ray, rec: &HitRecord) -> Option<(Color, Ray)> {
        let ri = if rec.front_face {
            1.0 / self.ior
        } else {
            self.ior
        };

        let unit_direction = ray_in.direction().normalize();
        let cos_theta = (-unit_direction).dot(rec.normal).min(1.0);
        let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();

        let cannot_refract = ri * sin_theta > 1.0;
        let direction = if cannot_refract || Self::reflectance(cos_theta, ri) > random_f32() {
            reflect(unit_direction, rec.normal)
        } else {
            refract(unit_direction, rec.normal, ri)
        };

        Some((Color::ONE, Ray::new(rec.p, direction)))
    }

    fn id(&self) -> i32 {
        self.id
    }
}

/// Emissive material for area lights.
pub struct DiffuseLight {
    emit: Color,
    id: i32,
}

impl DiffuseLight {
    pub fn new(emit: Color) -> Self {
        Self {
            emit,
            id: UNASSIGNED_ID,
        }
    }

    pub fn with_id(mut self, id: i32) -> Self {
        self.id = id;
        self
    }
}

impl Material for DiffuseLight {
    fn scatter(&self, _ray_in: &Ray, _rec: &HitRecord) -> Option<(Color, Ray)> {
        None
    }

    fn emitted(&self, _u: f32, _v: f32, _p: Vec3) -> Color {
        self.emit
    }

    fn id(&self) -> i32 {
        self.id
    }
}

/// Reflect v about normal n.
fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Refract uv through the surface with normal n and relative IOR etai_over_etat.
fn refract(uv: Vec3, n: Vec3, etai_over_etat: f32) -> Vec3 {
    let cos_theta = (-uv).dot(n).min(1.0);
    let r_out_perp = etai_over_etat * (uv + cos_theta * n);
    let r_out_parallel = -(1.0 - r_out_perp.length_squared()).abs().sqrt() * n;
    r_out_perp + r_out_parallel
}
