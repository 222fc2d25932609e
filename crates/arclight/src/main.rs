//! Batch render entry point.
//!
//! Builds a small demo scene, renders it on the worker pool, and writes the
//! cryptomatte EXR plus a plain PNG preview next to the working directory.

use anyhow::Result;
use arc_export::{write_exr, write_png};
use arc_math::Vec3;
use arc_renderer::{
    render, BvhNode, Camera, Color, DiffuseLight, Hittable, Lambertian, Metal, RenderConfig,
    Sphere, ThreadPool,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

const IMAGE_WIDTH: u32 = 800;
const IMAGE_HEIGHT: u32 = 450;

fn build_scene() -> Arc<dyn Hittable> {
    let ground = Arc::new(Lambertian::new(Color::new(0.5, 0.5, 0.5)).with_id(1));
    let red = Arc::new(Lambertian::new(Color::new(0.7, 0.2, 0.2)).with_id(2));
    let steel = Arc::new(Metal::new(Color::new(0.8, 0.8, 0.9), 0.05).with_id(3));
    let lamp = Arc::new(DiffuseLight::new(Color::new(6.0, 5.5, 5.0)).with_id(4));

    let objects: Vec<Box<dyn Hittable>> = vec![
        Box::new(Sphere::new(Vec3::new(0.0, -100.5, -3.0), 100.0, ground).with_id(1)),
        Box::new(Sphere::new(Vec3::new(-0.6, 0.0, -3.0), 0.5, red).with_id(2)),
        Box::new(Sphere::new(Vec3::new(0.6, 0.0, -3.2), 0.5, steel).with_id(3)),
        Box::new(Sphere::new(Vec3::new(0.0, 1.6, -2.5), 0.6, lamp).with_id(4)),
    ];

    Arc::new(BvhNode::new(objects))
}

fn main() -> Result<()> {
    env_logger::init();

    let aspect_ratio = IMAGE_WIDTH as f32 / IMAGE_HEIGHT as f32;

    let mut camera = Camera::new();
    camera.center = Vec3::new(0.0, 0.3, 0.0);
    camera.lookat = Vec3::new(0.0, 0.0, -3.0);
    camera.f_stop = 4.0;
    camera.compute_derived(aspect_ratio)?;
    log::info!(
        "camera: vfov {:.2} deg, focus {:.2} m, lens radius {:.4} m",
        camera.vfov(),
        camera.focus_distance(),
        camera.lens_radius()
    );

    let world = build_scene();

    let config = RenderConfig {
        samples_per_pixel: 128,
        max_depth: 32,
        background: Color::new(0.02, 0.02, 0.03),
        use_sky_gradient: false,
    };

    let threads = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4);
    let pool = ThreadPool::new(threads);

    let start = Instant::now();
    let framebuffer = render(
        Arc::new(camera),
        world,
        IMAGE_WIDTH,
        IMAGE_HEIGHT,
        config,
        &pool,
    )?;
    log::info!("traced in {:.2?}", start.elapsed());

    write_exr(Path::new("render.exr"), &framebuffer)?;
    write_png(Path::new("render.png"), &framebuffer)?;

    Ok(())
}
