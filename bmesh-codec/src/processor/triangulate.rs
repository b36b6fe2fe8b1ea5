use glam::{DVec2, DVec3};
use log::debug;

/// Triangulates one polygon given the positions of its vertices.
///
/// Returns triangles as local vertex indices into `positions`, wound like the
/// input. Ear clipping runs in the plane of the polygon's Newell normal; when
/// no ear can be found (self-intersecting or degenerate input) the remaining
/// loop is closed with a fan.
pub fn triangulate_polygon(positions: &[DVec3]) -> Vec<[usize; 3]> {
    let n = positions.len();
    if n < 3 {
        return Vec::new();
    }
    if n == 3 {
        return vec![[0, 1, 2]];
    }

    let projected = project_to_plane(positions, newell_normal(positions));
    let mut remaining: Vec<usize> = (0..n).collect();
    let mut triangles = Vec::with_capacity(n - 2);

    while remaining.len() > 3 {
        let len = remaining.len();
        let ear = (0..len).find(|&i| {
            let prev = remaining[(i + len - 1) % len];
            let next = remaining[(i + 1) % len];
            is_ear(&projected, &remaining, prev, remaining[i], next)
        });

        let Some(i) = ear else {
            debug!("Ear clipping stalled with {} vertices left, closing with a fan", len);
            break;
        };

        triangles.push([remaining[(i + len - 1) % len], remaining[i], remaining[(i + 1) % len]]);
        remaining.remove(i);
    }

    for i in 1..remaining.len() - 1 {
        triangles.push([remaining[0], remaining[i], remaining[i + 1]]);
    }

    triangles
}

/// Newell's method; robust for non-planar and concave loops.
fn newell_normal(positions: &[DVec3]) -> DVec3 {
    let mut normal = DVec3::ZERO;
    for (i, p) in positions.iter().enumerate() {
        let q = positions[(i + 1) % positions.len()];
        normal.x += (p.y - q.y) * (p.z + q.z);
        normal.y += (p.z - q.z) * (p.x + q.x);
        normal.z += (p.x - q.x) * (p.y + q.y);
    }
    normal
}

/// Drops the axis most aligned with `normal`, picking the remaining pair so
/// the loop stays counter-clockwise in 2D.
fn project_to_plane(positions: &[DVec3], normal: DVec3) -> Vec<DVec2> {
    let a = normal.abs();
    let (u, v) = if a.z >= a.x && a.z >= a.y {
        if normal.z >= 0.0 { (0, 1) } else { (1, 0) }
    } else if a.y >= a.x {
        if normal.y >= 0.0 { (2, 0) } else { (0, 2) }
    } else if normal.x >= 0.0 {
        (1, 2)
    } else {
        (2, 1)
    };
    positions.iter().map(|p| DVec2::new(p[u], p[v])).collect()
}

fn cross(o: DVec2, a: DVec2, b: DVec2) -> f64 {
    (a - o).perp_dot(b - o)
}

fn is_ear(points: &[DVec2], remaining: &[usize], prev: usize, curr: usize, next: usize) -> bool {
    let (a, b, c) = (points[prev], points[curr], points[next]);
    // Reflex or degenerate corner.
    if cross(a, b, c) <= 0.0 {
        return false;
    }
    remaining
        .iter()
        .filter(|&&i| i != prev && i != curr && i != next)
        .all(|&i| !point_in_triangle(points[i], a, b, c))
}

fn point_in_triangle(p: DVec2, a: DVec2, b: DVec2, c: DVec2) -> bool {
    let d1 = cross(a, b, p);
    let d2 = cross(b, c, p);
    let d3 = cross(c, a, p);
    d1 >= 0.0 && d2 >= 0.0 && d3 >= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area(positions: &[DVec3], tris: &[[usize; 3]]) -> f64 {
        tris.iter()
            .map(|t| {
                let (a, b, c) = (positions[t[0]], positions[t[1]], positions[t[2]]);
                (b - a).cross(c - a).length() * 0.5
            })
            .sum()
    }

    #[test]
    fn quad_becomes_two_triangles() {
        let quad = [
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
        ];
        let tris = triangulate_polygon(&quad);
        assert_eq!(tris.len(), 2);
        assert!((area(&quad, &tris) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn concave_polygon_keeps_its_area() {
        // An L shape in the XZ plane, area 3.
        let l = [
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(0.0, 0.0, 2.0),
            DVec3::new(1.0, 0.0, 2.0),
            DVec3::new(1.0, 0.0, 1.0),
            DVec3::new(2.0, 0.0, 1.0),
            DVec3::new(2.0, 0.0, 0.0),
        ];
        let tris = triangulate_polygon(&l);
        assert_eq!(tris.len(), 4);
        assert!((area(&l, &tris) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn triangles_keep_input_winding() {
        let quad = [
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
        ];
        let expected = newell_normal(&quad).normalize();
        for t in triangulate_polygon(&quad) {
            let (a, b, c) = (quad[t[0]], quad[t[1]], quad[t[2]]);
            assert!((b - a).cross(c - a).normalize().dot(expected) > 0.99);
        }
    }

    #[test]
    fn degenerate_input_falls_back_to_fan() {
        let line = [DVec3::ZERO, DVec3::X, DVec3::X * 2.0, DVec3::X * 3.0];
        assert_eq!(triangulate_polygon(&line).len(), 2);
        assert!(triangulate_polygon(&line[..2]).is_empty());
    }
}
