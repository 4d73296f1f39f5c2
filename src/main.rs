// External crates
use anyhow::{Context, Result, bail};
use image::{Rgba, RgbaImage};
use rayon::prelude::*;

// STD library
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use rusterizer_core::interpolate::{depth_at, perspective_depth_at, perspective_normal_at, perspective_texcoord_at};
use rusterizer_core::depth::pixel_count;
use rusterizer_core::point3d::{dot3, normalize};
use rusterizer_core::transform::Transform;
use rusterizer_core::{
    Barycentric, DepthBuffer, Mat4, Point2D, Point3D, Point4D, ShadedTriangle, Triangle, barycentric_coordinate,
    compute_clipped_bounds, is_in_bounds, signed_area,
};

const NEAR: f32 = 0.1;
const FAR: f32 = 100.0;

struct DemoConfig {
    width: u32,
    height: u32,
    threads: usize,
    output: PathBuf,
    depth_output: PathBuf,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            threads: num_cpus::get(),
            output: PathBuf::from("frame.png"),
            depth_output: PathBuf::from("depth.png"),
        }
    }
}

impl DemoConfig {
    /// `rusterizer-demo [width height [output [depth_output]]]`
    fn from_args() -> Result<Self> {
        Self::parse(std::env::args().skip(1).collect())
    }

    fn parse(args: Vec<String>) -> Result<Self> {
        let mut config = DemoConfig::default();
        match args.len() {
            0 => {}
            2..=4 => {
                config.width = args[0].parse().with_context(|| format!("invalid width {:?}", args[0]))?;
                config.height = args[1].parse().with_context(|| format!("invalid height {:?}", args[1]))?;
                if let Some(path) = args.get(2) {
                    config.output = path.into();
                }
                if let Some(path) = args.get(3) {
                    config.depth_output = path.into();
                }
            }
            n => bail!("expected 0, 2, 3 or 4 arguments, got {n}"),
        }
        if config.width == 0 || config.height == 0 {
            bail!("resolution must be non-zero, got {}x{}", config.width, config.height);
        }
        if pixel_count(config.width, config.height).is_none() {
            bail!("resolution {}x{} has too many pixels", config.width, config.height);
        }
        Ok(config)
    }
}

fn shade_pixel(r: u8, g: u8, b: u8, a: u8, normal: Point3D, light: Point3D) -> (u8, u8, u8, u8) {
    let intensity = (dot3(normalize(normal), normalize(light)) + 1.0) * 0.5;
    (((r as f32) * intensity) as u8, ((g as f32) * intensity) as u8, ((b as f32) * intensity) as u8, a)
}

fn checker(uv: Point2D) -> (u8, u8, u8, u8) {
    let cell = ((uv.x * 8.0).floor() as i32 + (uv.y * 8.0).floor() as i32) & 1;
    if cell == 0 { (230, 200, 120, 255) } else { (90, 60, 160, 255) }
}

/// Unit cube, two triangles per face, with per-face normals and 0..1 texcoords.
fn cube() -> Vec<ShadedTriangle> {
    let faces = [
        (Point3D::new(1.0, 0.0, 0.0), Point3D::new(0.0, 0.0, -1.0), Point3D::new(0.0, 1.0, 0.0)),
        (Point3D::new(-1.0, 0.0, 0.0), Point3D::new(0.0, 0.0, 1.0), Point3D::new(0.0, 1.0, 0.0)),
        (Point3D::new(0.0, 1.0, 0.0), Point3D::new(1.0, 0.0, 0.0), Point3D::new(0.0, 0.0, -1.0)),
        (Point3D::new(0.0, -1.0, 0.0), Point3D::new(1.0, 0.0, 0.0), Point3D::new(0.0, 0.0, 1.0)),
        (Point3D::new(0.0, 0.0, 1.0), Point3D::new(1.0, 0.0, 0.0), Point3D::new(0.0, 1.0, 0.0)),
        (Point3D::new(0.0, 0.0, -1.0), Point3D::new(-1.0, 0.0, 0.0), Point3D::new(0.0, 1.0, 0.0)),
    ];
    let corner = |n: Point3D, u: Point3D, v: Point3D, s: f32, t: f32| {
        (n + u * (2.0 * s - 1.0) + v * (2.0 * t - 1.0), Point2D::new(s, t))
    };
    let mut triangles = Vec::with_capacity(12);
    for (n, u, v) in faces {
        let quad = [
            corner(n, u, v, 0.0, 0.0),
            corner(n, u, v, 1.0, 0.0),
            corner(n, u, v, 1.0, 1.0),
            corner(n, u, v, 0.0, 1.0),
        ];
        for [i, j, k] in [[0, 1, 2], [0, 2, 3]] {
            triangles.push(ShadedTriangle {
                positions: Triangle::new(quad[i].0, quad[j].0, quad[k].0),
                texcoords: [quad[i].1, quad[j].1, quad[k].1],
                normals: [n, n, n],
            });
        }
    }
    triangles
}

/// Screen-space x/y with view-space z, or `None` if the triangle crosses the near plane.
fn to_screen(tri: &ShadedTriangle, model_view: &Mat4, proj: &Mat4, config: &DemoConfig) -> Option<ShadedTriangle> {
    let (w, h) = (config.width as f32, config.height as f32);
    let project = |p: Point3D| -> Option<Point3D> {
        let view = *model_view * Point4D::from_point(p, 1.0);
        if view.z > -NEAR {
            return None;
        }
        let clip = *proj * view;
        let ndc = clip.xyz() / clip.w;
        Some(Point3D::new((ndc.x + 1.0) * 0.5 * w, (1.0 - ndc.y) * 0.5 * h, view.z))
    };
    let rotate = |n: Point3D| (*model_view * Point4D::from_point(n, 0.0)).xyz();
    let positions = Triangle::new(project(tri.positions.a)?, project(tri.positions.b)?, project(tri.positions.c)?);
    if signed_area(&positions) == 0.0 {
        return None;
    }
    Some(ShadedTriangle {
        positions,
        texcoords: tri.texcoords,
        normals: tri.normals.map(rotate),
    })
}

/// Calls `visit` with the barycentric coordinate of every covered pixel centre.
fn for_each_fragment(tri: &Triangle, config: &DemoConfig, mut visit: impl FnMut(u32, u32, Barycentric)) {
    let (xs, ys) = compute_clipped_bounds(tri, config.width, config.height).pixel_span(config.width, config.height);
    for y in ys {
        for x in xs.clone() {
            let p = Point2D { x: x as f32 + 0.5, y: y as f32 + 0.5 };
            let bc = barycentric_coordinate(tri, p);
            if is_in_bounds(bc) {
                visit(x, y, bc);
            }
        }
    }
}

fn main() -> Result<()> {
    let config = DemoConfig::from_args()?;
    println!("Rendering {}x{} on {} threads", config.width, config.height, config.threads);

    rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build_global()
        .context("building rayon thread pool")?;

    let frame_start = Instant::now();

    let object = Transform { yaw: 35f32.to_radians(), pitch: 25f32.to_radians(), position: Point3D::new(0.0, 0.0, -4.0) };
    let model_view = object.matrix();
    let proj = Mat4::perspective(60f32.to_radians(), config.width as f32 / config.height as f32, NEAR, FAR);
    let light = Point3D::new(-1.0, 1.0, 1.0);

    let screen_triangles: Vec<ShadedTriangle> = cube()
        .par_iter()
        .filter_map(|tri| to_screen(tri, &model_view, &proj, &config))
        .collect();
    let transform_time = frame_start.elapsed();

    // Pass 1: every fragment races for the nearest depth.
    let depth_start = Instant::now();
    let depth = DepthBuffer::new(config.width, config.height)?;
    screen_triangles.par_iter().for_each(|tri| {
        for_each_fragment(&tri.positions, &config, |x, y, bc| {
            depth.test_and_set(x, y, depth_at(bc, &tri.positions));
        });
    });
    let depth_time = depth_start.elapsed();

    // Pass 2: only fragments matching the settled depth write colour.
    let shade_start = Instant::now();
    let background = u32::from_le_bytes([0, 0, 0, 255]);
    let pixel_index = |x: u32, y: u32| y as usize * config.width as usize + x as usize;
    let color: Vec<AtomicU32> = (0..config.width as usize * config.height as usize).map(|_| AtomicU32::new(background)).collect();
    screen_triangles.par_iter().for_each(|tri| {
        let positions = &tri.positions;
        for_each_fragment(positions, &config, |x, y, bc| {
            if !depth.is_nearest(x, y, depth_at(bc, positions)) {
                return;
            }
            let z = perspective_depth_at(bc, positions);
            let normal = perspective_normal_at(bc, positions, &tri.normals, z);
            let uv = perspective_texcoord_at(bc, positions, &tri.texcoords, z);
            let (r, g, b, a) = checker(uv);
            let (r, g, b, a) = shade_pixel(r, g, b, a, normal, light);
            color[pixel_index(x, y)].store(u32::from_le_bytes([r, g, b, a]), Ordering::Relaxed);
        });
    });
    let shade_time = shade_start.elapsed();

    let image = RgbaImage::from_fn(config.width, config.height, |x, y| {
        Rgba(color[pixel_index(x, y)].load(Ordering::Relaxed).to_le_bytes())
    });
    image.save(&config.output).with_context(|| format!("writing {}", config.output.display()))?;
    depth.save_image(&config.depth_output)?;

    println!(
        "Transform time: {:.2?}\nDepth time: {:.2?}\nShade time: {:.2?}\nFrame time: {:.2?}",
        transform_time,
        depth_time,
        shade_time,
        frame_start.elapsed()
    );
    println!("Saved {} and {}", config.output.display(), config.depth_output.display());
    Ok(())
}
