use std::ops::Range;

use crate::point3d::Point3D;
use crate::triangle::Triangle;

/// Axis-aligned box around a triangle. x/y are clamped to the viewport, z is not.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3D,
    pub max: Point3D,
}

impl Aabb {
    /// Half-open pixel ranges covering the box, limited to a `width` x `height` target.
    pub fn pixel_span(&self, width: u32, height: u32) -> (Range<u32>, Range<u32>) {
        let start_x = (self.min.x.floor() as u32).min(width);
        let start_y = (self.min.y.floor() as u32).min(height);
        let end_x = (self.max.x.ceil() as u32).clamp(start_x, width);
        let end_y = (self.max.y.ceil() as u32).clamp(start_y, height);
        (start_x..end_x, start_y..end_y)
    }
}

/// Bounding box of `tri` with x clamped to `[0, width]` and y to `[0, height]`.
pub fn compute_clipped_bounds(tri: &Triangle, width: u32, height: u32) -> Aabb {
    let (w, h) = (width as f32, height as f32);
    let mut min = tri.a.min(tri.b).min(tri.c);
    let mut max = tri.a.max(tri.b).max(tri.c);
    min.x = min.x.clamp(0.0, w);
    min.y = min.y.clamp(0.0, h);
    max.x = max.x.clamp(0.0, w);
    max.y = max.y.clamp(0.0, h);
    Aabb { min, max }
}
