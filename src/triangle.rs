use std::ops::Index;

use crate::point2d::Point2D;
use crate::point3d::Point3D;

/// Three positions: x/y in pixel space, z as the caller's depth convention.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Triangle {
    pub a: Point3D,
    pub b: Point3D,
    pub c: Point3D,
}

impl Triangle {
    pub const fn new(a: Point3D, b: Point3D, c: Point3D) -> Self {
        Triangle { a, b, c }
    }

    pub fn vertices(&self) -> [Point3D; 3] {
        [self.a, self.b, self.c]
    }

    /// Per-vertex z values, in vertex order.
    pub fn depths(&self) -> Point3D {
        Point3D { x: self.a.z, y: self.b.z, z: self.c.z }
    }
}

impl From<[Point3D; 3]> for Triangle {
    fn from([a, b, c]: [Point3D; 3]) -> Self {
        Triangle { a, b, c }
    }
}

impl Index<usize> for Triangle {
    type Output = Point3D;
    fn index(&self, i: usize) -> &Point3D {
        match i {
            0 => &self.a,
            1 => &self.b,
            2 => &self.c,
            _ => panic!("triangle vertex index out of range: {i}"),
        }
    }
}

/// A triangle with its texcoords and normals, index-aligned with the positions.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ShadedTriangle {
    pub positions: Triangle,
    pub texcoords: [Point2D; 3],
    pub normals: [Point3D; 3],
}
