//! Per-triangle numeric kernel for a parallel software rasterizer.
//!
//! A rasterization kernel calls [`compute_clipped_bounds`] once per triangle,
//! then for each candidate pixel computes a [`Barycentric`] coordinate, keeps
//! the pixel if [`is_in_bounds`] holds, reconstructs attributes with the
//! functions in [`interpolate`] and races for the pixel through
//! [`atomic_minimum`]. Everything except the depth cell is a pure function of
//! its inputs.

pub mod barycentric;
pub mod bounds;
pub mod depth;
pub mod interpolate;
pub mod point2d;
pub mod point3d;
pub mod transform;
pub mod transparency;
pub mod triangle;

pub use barycentric::{Barycentric, barycentric_coordinate, barycentric_weight_of, is_in_bounds, signed_area};
pub use bounds::{Aabb, compute_clipped_bounds};
pub use depth::{AtomicDepth, AtomicF32, AtomicF64, DepthBuffer, atomic_minimum};
pub use interpolate::{depth_at, perspective_depth_at, perspective_normal_at, perspective_texcoord_at, texcoord_at};
pub use point2d::Point2D;
pub use point3d::Point3D;
pub use transform::{Mat4, Point4D, multiply_mv};
pub use triangle::{ShadedTriangle, Triangle};
