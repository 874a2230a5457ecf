//! Integration test: geometric planning.
//!
//! Linear and circular sampling against the trapezoid profile, and path
//! optimization keeping the endpoints.

use xxcnc_common::motion::geometry::Point3D;
use xxcnc_common::motion::params::InterpolationParams;
use xxcnc_motion::planning::PathGenerator;
use xxcnc_motion::planning::path::arc_length;

fn params(feed: f64) -> InterpolationParams {
    InterpolationParams::new(feed, 100.0, 500.0)
}

#[test]
fn linear_path_ends_exactly_at_target() {
    let generator = PathGenerator::default();
    let end = Point3D::new(10.0, 10.0, 0.0);
    let path = generator
        .linear_interpolation(Point3D::ORIGIN, end, &params(1000.0))
        .unwrap();

    assert!(!path.is_empty());
    assert_eq!(*path.last().unwrap(), end);
    // Every sample lies on the segment and advances monotonically.
    let mut travelled = 0.0;
    for p in &path {
        assert!((p.x - p.y).abs() < 1e-9);
        assert_eq!(p.z, 0.0);
        let d = p.distance_to(Point3D::ORIGIN);
        assert!(d + 1e-9 >= travelled);
        travelled = d;
    }
}

#[test]
fn linear_sample_spacing_respects_feed() {
    let generator = PathGenerator::default();
    let feed = 600.0; // 10 mm/s
    let path = generator
        .linear_interpolation(Point3D::ORIGIN, Point3D::new(50.0, 0.0, 0.0), &params(feed))
        .unwrap();

    let max_step = feed / 60.0 * generator.sample_period();
    for pair in path.windows(2) {
        assert!(pair[0].distance_to(pair[1]) <= max_step + 1e-9);
    }
}

#[test]
fn arc_samples_stay_on_radius() {
    let generator = PathGenerator::default();
    let start = Point3D::new(10.0, 0.0, 0.0);
    let end = Point3D::new(0.0, 10.0, 5.0);
    let center = Point3D::ORIGIN;
    let path = generator
        .circular_interpolation(start, end, center, false, &params(3000.0))
        .unwrap();

    assert_eq!(*path.last().unwrap(), end);
    for p in &path {
        assert!((p.planar_distance_to(center) - 10.0).abs() < 1e-6);
        assert!(p.x >= -1e-9 && p.y >= -1e-9, "counter-clockwise quarter turn");
        assert!((0.0..=5.0 + 1e-9).contains(&p.z));
    }
}

#[test]
fn clockwise_arc_takes_the_long_way() {
    let start = Point3D::new(10.0, 0.0, 0.0);
    let end = Point3D::new(0.0, 10.0, 0.0);
    let quarter = std::f64::consts::FRAC_PI_2 * 10.0;
    assert!((arc_length(start, end, Point3D::ORIGIN, false) - quarter).abs() < 1e-9);
    assert!((arc_length(start, end, Point3D::ORIGIN, true) - 3.0 * quarter).abs() < 1e-9);
}

#[test]
fn degenerate_arc_is_rejected() {
    let generator = PathGenerator::default();
    let p = Point3D::new(1.0, 1.0, 0.0);
    assert!(
        generator
            .circular_interpolation(p, Point3D::new(2.0, 1.0, 0.0), p, true, &params(1000.0))
            .is_err()
    );
}

#[test]
fn optimized_linear_path_collapses_to_endpoints() {
    let generator = PathGenerator::default();
    let end = Point3D::new(20.0, -5.0, 3.0);
    let p = params(1000.0);
    let mut path = generator
        .linear_interpolation(Point3D::ORIGIN, end, &p)
        .unwrap();
    let first = path[0];
    assert!(path.len() > 2);

    generator.optimize_path(&mut path, &p).unwrap();
    assert_eq!(path.len(), 2);
    assert_eq!(path[0], first);
    assert_eq!(path[1], end);
}

#[test]
fn velocity_profile_is_bounded_and_ends_at_rest() {
    let generator = PathGenerator::default();
    let p = params(3000.0); // 50 mm/s
    let samples = generator.plan_velocity_profile(100.0, &p).unwrap();

    assert_eq!(*samples.last().unwrap(), 0.0);
    assert!(samples.iter().all(|&v| (0.0..=3000.0 + 1e-9).contains(&v)));
    assert!(samples.iter().any(|&v| (v - 3000.0).abs() < 1e-6));
}
