use std::ops::Mul;

use crate::point3d::Point3D;

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Point4D {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Point4D {
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Point4D { x, y, z, w }
    }

    pub fn from_point(p: Point3D, w: f32) -> Self {
        Point4D { x: p.x, y: p.y, z: p.z, w }
    }

    pub fn xyz(self) -> Point3D {
        Point3D { x: self.x, y: self.y, z: self.z }
    }
}

/// Column-major 4x4 matrix.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Mat4 {
    pub cols: [Point4D; 4],
}

impl Mat4 {
    /// Right-handed projection looking down -z, mapping `[-near, -far]` to NDC `[-1, 1]`.
    pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        let f = 1.0 / (fov_y * 0.5).tan();
        let range = near - far;
        Mat4 {
            cols: [
                Point4D::new(f / aspect, 0.0, 0.0, 0.0),
                Point4D::new(0.0, f, 0.0, 0.0),
                Point4D::new(0.0, 0.0, (far + near) / range, -1.0),
                Point4D::new(0.0, 0.0, 2.0 * far * near / range, 0.0),
            ],
        }
    }
}

impl Mul<Point4D> for Mat4 {
    type Output = Point4D;
    fn mul(self, v: Point4D) -> Point4D {
        let [c0, c1, c2, c3] = self.cols;
        Point4D {
            x: c0.x * v.x + c1.x * v.y + c2.x * v.z + c3.x * v.w,
            y: c0.y * v.x + c1.y * v.y + c2.y * v.z + c3.y * v.w,
            z: c0.z * v.x + c1.z * v.y + c2.z * v.z + c3.z * v.w,
            w: c0.w * v.x + c1.w * v.y + c2.w * v.z + c3.w * v.w,
        }
    }
}

/// `m * v` with `w` dropped, no perspective divide.
pub fn multiply_mv(m: &Mat4, v: Point4D) -> Point3D {
    (*m * v).xyz()
}

/// Object placement as yaw (about y), then pitch (about x), then translation.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Transform {
    pub yaw: f32,
    pub pitch: f32,
    pub position: Point3D,
}

fn transform_vector(ihat: Point3D, jhat: Point3D, khat: Point3D, v: Point3D) -> Point3D {
    ihat * v.x + jhat * v.y + khat * v.z
}

impl Transform {
    pub fn get_basis_vectors(&self) -> (Point3D, Point3D, Point3D) {
        let ihat_yaw = Point3D { x: self.yaw.cos(), y: 0.0, z: self.yaw.sin() };
        let jhat_yaw = Point3D { x: 0.0, y: 1.0, z: 0.0 };
        let khat_yaw = Point3D { x: -self.yaw.sin(), y: 0.0, z: self.yaw.cos() };
        let ihat_pitch = Point3D { x: 1.0, y: 0.0, z: 0.0 };
        let jhat_pitch = Point3D { x: 0.0, y: self.pitch.cos(), z: -self.pitch.sin() };
        let khat_pitch = Point3D { x: 0.0, y: self.pitch.sin(), z: self.pitch.cos() };
        let ihat = transform_vector(ihat_yaw, jhat_yaw, khat_yaw, ihat_pitch);
        let jhat = transform_vector(ihat_yaw, jhat_yaw, khat_yaw, jhat_pitch);
        let khat = transform_vector(ihat_yaw, jhat_yaw, khat_yaw, khat_pitch);
        (ihat, jhat, khat)
    }

    pub fn matrix(&self) -> Mat4 {
        let (ihat, jhat, khat) = self.get_basis_vectors();
        Mat4 {
            cols: [
                Point4D::from_point(ihat, 0.0),
                Point4D::from_point(jhat, 0.0),
                Point4D::from_point(khat, 0.0),
                Point4D::from_point(self.position, 1.0),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point3d::dot3;

    const EPS: f32 = 1e-5;

    #[test]
    fn multiply_mv_drops_w() {
        let t = Transform { yaw: 0.0, pitch: 0.0, position: Point3D::new(1.0, 2.0, 3.0) };
        let p = multiply_mv(&t.matrix(), Point4D::new(1.0, 1.0, 1.0, 1.0));
        assert_eq!(p, Point3D::new(2.0, 3.0, 4.0));
        // Directions ignore translation.
        let d = multiply_mv(&t.matrix(), Point4D::new(1.0, 1.0, 1.0, 0.0));
        assert_eq!(d, Point3D::new(1.0, 1.0, 1.0));

        let proj = Mat4::perspective(90f32.to_radians(), 1.0, 1.0, 10.0);
        let clip = proj * Point4D::new(0.5, 0.5, -2.0, 1.0);
        assert_eq!(multiply_mv(&proj, Point4D::new(0.5, 0.5, -2.0, 1.0)), clip.xyz());
        assert_eq!(clip.w, 2.0);
    }

    #[test]
    fn perspective_maps_clip_planes() {
        let proj = Mat4::perspective(60f32.to_radians(), 1.5, 0.5, 50.0);
        let near = proj * Point4D::new(0.0, 0.0, -0.5, 1.0);
        let far = proj * Point4D::new(0.0, 0.0, -50.0, 1.0);
        assert!((near.z / near.w + 1.0).abs() < EPS);
        assert!((far.z / far.w - 1.0).abs() < EPS);
        assert_eq!(near.w, 0.5);
    }

    #[test]
    fn transform_matrix_matches_basis() {
        let t = Transform { yaw: 0.7, pitch: -0.3, position: Point3D::new(0.0, 1.0, -5.0) };
        let (ihat, jhat, khat) = t.get_basis_vectors();
        let v = Point3D::new(0.25, -1.0, 2.0);
        let via_matrix = multiply_mv(&t.matrix(), Point4D::from_point(v, 1.0));
        let direct = ihat * v.x + jhat * v.y + khat * v.z + t.position;
        assert!((via_matrix - direct).length() < EPS);
        // Basis stays orthonormal.
        assert!((ihat.length() - 1.0).abs() < EPS && (khat.length() - 1.0).abs() < EPS);
        assert!(dot3(ihat, jhat).abs() < EPS);
    }
}
