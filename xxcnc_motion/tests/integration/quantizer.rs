//! Integration test: time quantization.
//!
//! Drains planned paths point by point and checks distance bookkeeping,
//! progress, and planning from a second thread while the queue drains.

use std::sync::Arc;
use std::thread;

use xxcnc_common::motion::geometry::Point3D;
use xxcnc_common::motion::params::InterpolationParams;
use xxcnc_motion::quantizer::TimeQuantizer;

fn params(feed: f64) -> InterpolationParams {
    InterpolationParams::new(feed, 100.0, 1000.0)
}

/// Drain the queue, returning the visited points.
fn drain(q: &TimeQuantizer) -> Vec<Point3D> {
    let mut points = Vec::new();
    while let Some(p) = q.next_point() {
        points.push(p);
    }
    points
}

#[test]
fn consumed_distance_matches_path_length() {
    let q = TimeQuantizer::new(1).unwrap();
    let start = Point3D::new(1.0, 2.0, 3.0);
    let end = Point3D::new(21.0, -8.0, 3.5);
    assert!(q.plan_linear_path(start, end, &params(1500.0)));

    let mut cursor = start;
    let mut travelled = 0.0;
    let mut last_progress = q.progress();
    assert_eq!(last_progress, 0.0);
    while !q.is_finished() {
        let p = q.next_point().unwrap();
        travelled += cursor.distance_to(p);
        cursor = p;

        let progress = q.progress();
        assert!(progress >= last_progress);
        last_progress = progress;
    }

    assert!((travelled - start.distance_to(end)).abs() < 1e-3);
    assert_eq!(cursor, end);
    assert_eq!(q.progress(), 1.0);
    assert_eq!(q.current_position(), end);
}

#[test]
fn step_length_follows_period_and_feed() {
    let q = TimeQuantizer::new(2).unwrap();
    let feed = 1200.0; // 20 mm/s → 0.04 mm per 2 ms
    assert!(q.plan_linear_path(Point3D::ORIGIN, Point3D::new(4.0, 0.0, 0.0), &params(feed)));

    let points = drain(&q);
    let step = feed / 60.0 * 0.002;
    let mut prev = Point3D::ORIGIN;
    for p in &points {
        assert!(prev.distance_to(*p) <= step + 1e-9);
        prev = *p;
    }
    // 4 mm at 0.04 mm per step.
    assert!(points.len() >= 100);
}

#[test]
fn circular_plan_drains_to_endpoint() {
    let q = TimeQuantizer::new(1).unwrap();
    let start = Point3D::new(5.0, 0.0, 0.0);
    let end = Point3D::new(-5.0, 0.0, 0.0);
    assert!(q.plan_circular_path(start, end, Point3D::ORIGIN, true, &params(3000.0)));

    let expected = std::f64::consts::PI * 5.0;
    assert!((q.total_distance() - expected).abs() < 1e-9);

    let points = drain(&q);
    assert_eq!(*points.last().unwrap(), end);
    // Clockwise from +X passes through negative Y.
    assert!(points.iter().any(|p| p.y < -4.9));
    assert!((q.completed_distance() - expected).abs() < 1e-2);
}

#[test]
fn replanning_replaces_the_queue() {
    let q = TimeQuantizer::new(1).unwrap();
    let p = params(1000.0);
    assert!(q.plan_linear_path(Point3D::ORIGIN, Point3D::new(10.0, 0.0, 0.0), &p));
    for _ in 0..10 {
        q.next_point();
    }

    let here = q.current_position();
    let end = Point3D::new(here.x, 5.0, 0.0);
    assert!(q.plan_linear_path(here, end, &p));
    assert_eq!(q.completed_distance(), 0.0);
    assert_eq!(*drain(&q).last().unwrap(), end);
}

#[test]
fn period_change_applies_to_next_plan() {
    let q = TimeQuantizer::new(1).unwrap();
    let p = params(600.0);
    let end = Point3D::new(1.0, 0.0, 0.0);

    assert!(q.plan_linear_path(Point3D::ORIGIN, end, &p));
    let fine = q.queue_size();

    q.set_period(10).unwrap();
    assert_eq!(q.period(), 10);
    assert!(q.plan_linear_path(Point3D::ORIGIN, end, &p));
    assert!(q.queue_size() < fine);
    assert!(q.set_period(0).is_err());
    assert_eq!(q.period(), 10);
}

#[test]
fn concurrent_plan_and_drain() {
    let q = Arc::new(TimeQuantizer::new(1).unwrap());
    let p = params(2000.0);

    let planner = {
        let q = Arc::clone(&q);
        thread::spawn(move || {
            for i in 0..50 {
                let end = Point3D::new(f64::from(i % 5) + 1.0, 2.0, 0.0);
                q.plan_linear_path(Point3D::ORIGIN, end, &p);
            }
        })
    };
    let consumer = {
        let q = Arc::clone(&q);
        thread::spawn(move || {
            let mut consumed = 0usize;
            for _ in 0..20_000 {
                if q.next_point().is_some() {
                    consumed += 1;
                }
                let progress = q.progress();
                assert!((0.0..=1.0).contains(&progress));
            }
            consumed
        })
    };

    planner.join().unwrap();
    consumer.join().unwrap();

    let end = Point3D::new(3.0, 3.0, 0.0);
    assert!(q.plan_linear_path(Point3D::ORIGIN, end, &p));
    assert_eq!(*drain(&q).last().unwrap(), end);
    assert!(q.is_finished());
    assert_eq!(q.progress(), 1.0);
}
