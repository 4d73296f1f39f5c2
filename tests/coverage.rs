use rusterizer_core::{Point2D, Point3D, Triangle, barycentric_coordinate, compute_clipped_bounds, is_in_bounds};

const WIDTH: u32 = 24;
const HEIGHT: u32 = 16;

fn p(x: f32, y: f32) -> Point3D {
    Point3D::new(x, y, -1.0)
}

/// How many of `triangles` claim each pixel centre.
fn coverage(triangles: &[Triangle]) -> Vec<u32> {
    let mut counts = vec![0u32; (WIDTH * HEIGHT) as usize];
    for tri in triangles {
        let (xs, ys) = compute_clipped_bounds(tri, WIDTH, HEIGHT).pixel_span(WIDTH, HEIGHT);
        for y in ys {
            for x in xs.clone() {
                let centre = Point2D::new(x as f32 + 0.5, y as f32 + 0.5);
                if is_in_bounds(barycentric_coordinate(tri, centre)) {
                    counts[(y * WIDTH + x) as usize] += 1;
                }
            }
        }
    }
    counts
}

#[test]
fn split_quad_covers_every_pixel_once() {
    // The diagonal (2,1)-(18,10) never passes through a pixel centre.
    let (a, b, c, d) = (p(2.0, 1.0), p(18.0, 1.0), p(18.0, 10.0), p(2.0, 10.0));
    let counts = coverage(&[Triangle::new(a, b, c), Triangle::new(a, c, d)]);
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            let inside = (2..18).contains(&x) && (1..10).contains(&y);
            let want = if inside { 1 } else { 0 };
            assert_eq!(counts[(y * WIDTH + x) as usize], want, "pixel ({x}, {y})");
        }
    }
}

#[test]
fn centres_on_a_shared_edge_belong_to_both_triangles() {
    // Diagonal x == y passes through the centres (k + 0.5, k + 0.5).
    let (a, b, c, d) = (p(0.0, 0.0), p(8.0, 0.0), p(8.0, 8.0), p(0.0, 8.0));
    let counts = coverage(&[Triangle::new(a, b, c), Triangle::new(a, c, d)]);
    for y in 0..8 {
        for x in 0..8 {
            let want = if x == y { 2 } else { 1 };
            assert_eq!(counts[(y * WIDTH + x) as usize], want, "pixel ({x}, {y})");
        }
    }
}

#[test]
fn fan_around_shared_vertex_has_no_gaps() {
    let centre = p(12.0, 8.0);
    let rim = [p(4.0, 2.0), p(20.0, 3.0), p(22.0, 14.0), p(3.0, 15.0)];
    let fan: Vec<Triangle> = (0..rim.len())
        .map(|i| Triangle::new(centre, rim[i], rim[(i + 1) % rim.len()]))
        .collect();
    let counts = coverage(&fan);
    // A pixel box well inside the quad must be covered by at least one triangle.
    for y in 5..12 {
        for x in 7..18 {
            assert!(counts[(y * WIDTH + x) as usize] >= 1, "gap at ({x}, {y})");
        }
    }
}

#[test]
fn triangle_partly_off_screen_only_touches_viewport() {
    let tri = Triangle::new(p(-10.0, -4.0), p(30.0, 2.0), p(5.0, 40.0));
    let aabb = compute_clipped_bounds(&tri, WIDTH, HEIGHT);
    assert_eq!(aabb.min.x, 0.0);
    assert_eq!(aabb.min.y, 0.0);
    assert_eq!(aabb.max.x, WIDTH as f32);
    assert_eq!(aabb.max.y, HEIGHT as f32);
    assert!(coverage(&[tri]).iter().any(|&n| n == 1));
}
