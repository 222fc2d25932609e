//! Per-pixel records and the shared framebuffer.

use crate::hittable::UNASSIGNED_ID;
use crate::Color;
use arc_math::Vec3;
use std::cell::UnsafeCell;

/// Everything the renderer knows about one output pixel.
///
/// The default value is the background sentinel: no hit, ids of -1, black.
/// A pixel whose job failed or never hit anything stays in this state, which
/// is a valid outcome, not an error.
#[derive(Debug, Clone, Copy)]
pub struct Pixel {
    /// Accumulated radiance, linear
    pub rgb: Color,
    /// Whether any primary hit was recorded
    pub hit: bool,
    /// Surface normal at the primary hit
    pub normal: Vec3,
    /// World-space position of the primary hit
    pub p: Vec3,
    /// Metric distance from the camera to the primary hit
    pub depth: f32,
    /// How directly the surface faces the camera, 0..1
    pub facing_ratio: f32,
    pub object_id: i32,
    pub mat_id: i32,
}

impl Default for Pixel {
    fn default() -> Self {
        Self {
            rgb: Color::ZERO,
            hit: false,
            normal: Vec3::ZERO,
            p: Vec3::ZERO,
            depth: 0.0,
            facing_ratio: 0.0,
            object_id: UNASSIGNED_ID,
            mat_id: UNASSIGNED_ID,
        }
    }
}

/// Framebuffer of pixel records, partitioned by pixel across workers.
///
/// There is no per-cell locking. Instead the render loop guarantees that each
/// cell is written by exactly one job, exactly once, and that nothing reads
/// the buffer until the pool's quiescence barrier has passed. `write` is
/// `unsafe` because that partitioning is the caller's invariant, not the
/// type's.
pub struct Framebuffer {
    width: u32,
    height: u32,
    pixels: Vec<UnsafeCell<Pixel>>,
}

// Safe under the write partitioning invariant documented above.
unsafe impl Sync for Framebuffer {}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Self {
        let mut pixels = Vec::with_capacity((width * height) as usize);
        pixels.resize_with((width * height) as usize, || UnsafeCell::new(Pixel::default()));
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height);
        (y * self.width + x) as usize
    }

    /// Store the record for (x, y).
    ///
    /// # Safety
    ///
    /// No other thread may write this cell concurrently, and no thread may
    /// read the framebuffer while any write is in flight. The render loop
    /// upholds this by assigning each pixel to exactly one job and reading
    /// only after `ThreadPool::wait` returns.
    pub unsafe fn write(&self, x: u32, y: u32, pixel: Pixel) {
        *self.pixels[self.index(x, y)].get() = pixel;
    }

    /// Read the record for (x, y). Call only after all writers have finished.
    pub fn pixel(&self, x: u32, y: u32) -> &Pixel {
        unsafe { &*self.pixels[self.index(x, y)].get() }
    }

    /// Iterate rows top to bottom, pixels left to right.
    pub fn iter(&self) -> impl Iterator<Item = &Pixel> {
        self.pixels.iter().map(|cell| unsafe { &*cell.get() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pixel_is_background() {
        let pixel = Pixel::default();
        assert!(!pixel.hit);
        assert_eq!(pixel.object_id, UNASSIGNED_ID);
        assert_eq!(pixel.mat_id, UNASSIGNED_ID);
        assert_eq!(pixel.rgb, Color::ZERO);
    }

    #[test]
    fn test_framebuffer_write_read() {
        let fb = Framebuffer::new(4, 2);
        let mut pixel = Pixel::default();
        pixel.hit = true;
        pixel.object_id = 3;
        pixel.depth = 1.5;

        unsafe { fb.write(3, 1, pixel) };

        let read_back = fb.pixel(3, 1);
        assert!(read_back.hit);
        assert_eq!(read_back.object_id, 3);
        assert_eq!(read_back.depth, 1.5);
        assert!(!fb.pixel(0, 0).hit);
    }

    #[test]
    fn test_framebuffer_iter_covers_all_pixels() {
        let fb = Framebuffer::new(3, 3);
        assert_eq!(fb.iter().count(), 9);
        assert!(fb.iter().all(|p| !p.hit));
    }
}
