//! Screen-space barycentric weights and the point-in-triangle test.
//!
//! Weights here are linear in pixel coordinates. Use the `perspective_*`
//! functions in [`crate::interpolate`] to turn them into surface-correct
//! attributes.
//!
//! Nothing in this module guards against zero-area triangles: the division by
//! the triangle's area yields `inf`/`NaN` and the caller is expected to cull
//! degenerate triangles first.

use crate::point2d::{Point2D, dot2, perp};
use crate::point3d::Point3D;
use crate::triangle::Triangle;

/// Weights of a point relative to a triangle's vertices `(a, b, c)`.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Barycentric {
    pub alpha: f32,
    pub beta: f32,
    pub gamma: f32,
}

impl Barycentric {
    pub const fn new(alpha: f32, beta: f32, gamma: f32) -> Self {
        Barycentric { alpha, beta, gamma }
    }

    pub fn sum(&self) -> f32 {
        self.alpha + self.beta + self.gamma
    }

    /// The weights packed as a vector, for use with `dot3`.
    #[inline(always)]
    pub fn weights(&self) -> Point3D {
        Point3D { x: self.alpha, y: self.beta, z: self.gamma }
    }

    pub fn is_inside(&self) -> bool {
        is_in_bounds(*self)
    }
}

#[inline(always)]
fn signed_triangle_area(t1: Point2D, t2: Point2D, p: Point2D) -> f32 {
    dot2(p - t1, perp(t2 - t1)) * 0.5
}

/// Signed area of `tri` in the x/y plane. Zero for collinear vertices.
#[inline(always)]
pub fn signed_area(tri: &Triangle) -> f32 {
    signed_triangle_area(tri.a.xy(), tri.b.xy(), tri.c.xy())
}

/// Signed area of `(a, b, c)` as a fraction of the signed area of `tri`.
#[inline(always)]
pub fn barycentric_weight_of(a: Point2D, b: Point2D, c: Point2D, tri: &Triangle) -> f32 {
    signed_triangle_area(a, b, c) / signed_area(tri)
}

/// Screen-space barycentric coordinate of `point`. The weights sum to one
/// whether or not the point is inside the triangle.
pub fn barycentric_coordinate(tri: &Triangle, point: Point2D) -> Barycentric {
    let (a, b, c) = (tri.a.xy(), tri.b.xy(), tri.c.xy());
    let beta = barycentric_weight_of(a, point, c, tri);
    let gamma = barycentric_weight_of(a, b, point, tri);
    let alpha = 1.0 - beta - gamma;
    Barycentric { alpha, beta, gamma }
}

/// Point-in-triangle test. Weights of exactly 0 or 1 count as inside.
#[inline(always)]
pub fn is_in_bounds(coord: Barycentric) -> bool {
    (0.0..=1.0).contains(&coord.alpha)
        && (0.0..=1.0).contains(&coord.beta)
        && (0.0..=1.0).contains(&coord.gamma)
}
