//! Attribute reconstruction from barycentric weights.
//!
//! The plain variants blend in screen space and are only exact when depth is
//! constant across the triangle. The `perspective_*` variants blend in 1/z:
//! divide each vertex attribute by its z, sum with the screen-space weights,
//! then multiply by the depth returned from [`perspective_depth_at`].

use std::ops::{Add, Mul};

use crate::barycentric::Barycentric;
use crate::point2d::Point2D;
use crate::point3d::{Point3D, dot3, normalize};
use crate::triangle::Triangle;

/// Negated screen-space blend of the vertex z values. Vertices carry the
/// negative-z view convention, so this is a positive distance for the depth test.
#[inline(always)]
pub fn depth_at(coord: Barycentric, tri: &Triangle) -> f32 {
    -dot3(coord.weights(), tri.depths())
}

#[inline(always)]
pub fn texcoord_at(coord: Barycentric, texcoords: &[Point2D; 3]) -> Point2D {
    texcoords[0] * coord.alpha + texcoords[1] * coord.beta + texcoords[2] * coord.gamma
}

/// Hyperbolic depth: reciprocal of the weighted sum of `1 / z`.
/// A vertex at `z == 0` gives a non-finite result.
#[inline(always)]
pub fn perspective_depth_at(coord: Barycentric, tri: &Triangle) -> f32 {
    let inv_z = coord.alpha / tri.a.z + coord.beta / tri.b.z + coord.gamma / tri.c.z;
    1.0 / inv_z
}

#[inline(always)]
fn perspective_sum<T>(coord: Barycentric, tri: &Triangle, attributes: &[T; 3]) -> T
where
    T: Copy + Add<Output = T> + Mul<f32, Output = T>,
{
    attributes[0] * (coord.alpha / tri.a.z)
        + attributes[1] * (coord.beta / tri.b.z)
        + attributes[2] * (coord.gamma / tri.c.z)
}

/// Perspective-correct normal, renormalised to unit length.
pub fn perspective_normal_at(
    coord: Barycentric,
    tri: &Triangle,
    normals: &[Point3D; 3],
    depth: f32,
) -> Point3D {
    normalize(perspective_sum(coord, tri, normals) * depth)
}

pub fn perspective_texcoord_at(
    coord: Barycentric,
    tri: &Triangle,
    texcoords: &[Point2D; 3],
    depth: f32,
) -> Point2D {
    perspective_sum(coord, tri, texcoords) * depth
}
