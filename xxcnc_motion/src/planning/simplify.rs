//! Path smoothing and Douglas–Peucker simplification.

use xxcnc_common::consts::GEOMETRY_EPSILON;
use xxcnc_common::motion::geometry::Point3D;

/// One pass of 3-point weighted smoothing (0.25 / 0.5 / 0.25).
///
/// Endpoints are copied unchanged. Paths shorter than three points are
/// returned as-is.
pub fn smooth(path: &[Point3D]) -> Vec<Point3D> {
    if path.len() < 3 {
        return path.to_vec();
    }

    let mut out = Vec::with_capacity(path.len());
    out.push(path[0]);
    out.extend(
        path.windows(3)
            .map(|w| w[0] * 0.25 + w[1] * 0.5 + w[2] * 0.25),
    );
    out.push(path[path.len() - 1]);
    out
}

/// Shortest distance from `p` to the segment `a`–`b`.
///
/// Degenerates to the distance to `a` when the segment has no length.
pub fn segment_distance(p: Point3D, a: Point3D, b: Point3D) -> f64 {
    let ab = b - a;
    let len_sq = ab.dot(ab);
    if len_sq < GEOMETRY_EPSILON * GEOMETRY_EPSILON {
        return p.distance_to(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance_to(a + ab * t)
}

/// Douglas–Peucker simplification with tolerance `epsilon` [mm].
///
/// Both endpoints are always kept. Uses an explicit work stack so input
/// size does not bound recursion depth.
pub fn douglas_peucker(path: &[Point3D], epsilon: f64) -> Vec<Point3D> {
    let n = path.len();
    if n < 3 {
        return path.to_vec();
    }

    let mut keep = vec![false; n];
    keep[0] = true;
    keep[n - 1] = true;

    let mut stack = vec![(0usize, n - 1)];
    while let Some((first, last)) = stack.pop() {
        if last <= first + 1 {
            continue;
        }

        let (a, b) = (path[first], path[last]);
        let mut max_dist = 0.0;
        let mut split = first;
        for (i, p) in path.iter().enumerate().take(last).skip(first + 1) {
            let dist = segment_distance(*p, a, b);
            if dist > max_dist {
                max_dist = dist;
                split = i;
            }
        }

        if max_dist > epsilon {
            keep[split] = true;
            stack.push((first, split));
            stack.push((split, last));
        }
    }

    path.iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}
