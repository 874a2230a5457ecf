//! Time quantization of planned paths.
//!
//! A planned path is re-sampled into one setpoint per interpolation period
//! and held in a FIFO that the control loop drains one point per tick.
//!
//! Planning and draining may happen on different threads. One mutex covers
//! the queue and the progress counters; geometry is computed outside it and
//! committed only if no `clear_queue()` or newer plan intervened.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};
use xxcnc_common::consts::{GEOMETRY_EPSILON, MAX_QUEUE_POINTS, SECONDS_PER_MINUTE};
use xxcnc_common::motion::error::PlanError;
use xxcnc_common::motion::geometry::Point3D;
use xxcnc_common::motion::params::InterpolationParams;

use crate::planning::PathGenerator;
use crate::planning::path::arc_length;

#[derive(Debug, Default)]
struct QueueState {
    queue: VecDeque<Point3D>,
    period_ms: u32,
    total_distance: f64,
    completed_distance: f64,
    /// Last point handed out, or the plan start.
    cursor: Point3D,
    /// Bumped by every plan and every clear.
    generation: u64,
    /// Plans computing outside the lock.
    in_flight: usize,
}

impl QueueState {
    fn reset(&mut self) {
        self.queue.clear();
        self.total_distance = 0.0;
        self.completed_distance = 0.0;
        self.generation = self.generation.wrapping_add(1);
    }
}

#[derive(Debug)]
pub struct TimeQuantizer {
    generator: PathGenerator,
    state: Mutex<QueueState>,
}

impl TimeQuantizer {
    pub fn new(period_ms: u32) -> Result<Self, PlanError> {
        Self::with_generator(period_ms, PathGenerator::default())
    }

    pub fn with_generator(period_ms: u32, generator: PathGenerator) -> Result<Self, PlanError> {
        check_period(period_ms)?;
        Ok(Self {
            generator,
            state: Mutex::new(QueueState {
                period_ms,
                ..QueueState::default()
            }),
        })
    }

    #[inline]
    pub fn generator(&self) -> &PathGenerator {
        &self.generator
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Change the interpolation period. Affects subsequent plans only.
    pub fn set_period(&self, period_ms: u32) -> Result<(), PlanError> {
        check_period(period_ms)?;
        self.lock().period_ms = period_ms;
        Ok(())
    }

    pub fn period(&self) -> u32 {
        self.lock().period_ms
    }

    pub fn plan_linear_path(
        &self,
        start: Point3D,
        end: Point3D,
        params: &InterpolationParams,
    ) -> bool {
        self.plan(start, params, start.distance_to(end), |g| {
            g.linear_interpolation(start, end, params)
        })
    }

    pub fn plan_circular_path(
        &self,
        start: Point3D,
        end: Point3D,
        center: Point3D,
        clockwise: bool,
        params: &InterpolationParams,
    ) -> bool {
        self.plan(
            start,
            params,
            arc_length(start, end, center, clockwise),
            |g| g.circular_interpolation(start, end, center, clockwise, params),
        )
    }

    fn plan<F>(&self, start: Point3D, params: &InterpolationParams, total: f64, build: F) -> bool
    where
        F: FnOnce(&PathGenerator) -> Result<Vec<Point3D>, PlanError>,
    {
        let (generation, period_ms) = {
            let mut st = self.lock();
            st.reset();
            st.cursor = start;
            st.in_flight += 1;
            (st.generation, st.period_ms)
        };
        let _in_flight = InFlight(&self.state);

        let feed = params.target_feed();
        let result = params
            .validate()
            .and_then(|()| check_queue_bound(total, feed, period_ms))
            .and_then(|()| build(&self.generator))
            .and_then(|path| resample(&path, feed, period_ms));

        let mut st = self.lock();

        let points = match result {
            Ok(points) => points,
            Err(e) => {
                warn!("path planning failed: {e}");
                return false;
            }
        };

        if st.generation != generation {
            debug!("plan superseded before commit, discarding");
            return false;
        }

        st.queue = points;
        st.total_distance = total;
        st.completed_distance = 0.0;
        debug!(
            "planned {:.3} mm into {} setpoints ({} ms period)",
            total,
            st.queue.len(),
            period_ms
        );
        true
    }

    /// Pop the next setpoint and advance the progress counters.
    ///
    /// Once the queue drains, completed distance snaps to the plan total so
    /// progress reads exactly 1.0.
    pub fn next_point(&self) -> Option<Point3D> {
        let mut st = self.lock();
        let point = st.queue.pop_front()?;

        let step = st.cursor.distance_to(point);
        st.completed_distance += step;
        st.cursor = point;
        if st.queue.is_empty() {
            st.completed_distance = st.completed_distance.max(st.total_distance);
        }
        Some(point)
    }

    /// Empty the queue and zero the counters. Cancels any plan in flight.
    pub fn clear_queue(&self) {
        self.lock().reset();
    }

    pub fn queue_size(&self) -> usize {
        self.lock().queue.len()
    }

    /// Queue empty and no plan being computed.
    pub fn is_finished(&self) -> bool {
        let st = self.lock();
        st.queue.is_empty() && st.in_flight == 0
    }

    /// Completed fraction of the current plan in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        let st = self.lock();
        if st.total_distance < GEOMETRY_EPSILON {
            return 1.0;
        }
        (st.completed_distance / st.total_distance).clamp(0.0, 1.0)
    }

    pub fn total_distance(&self) -> f64 {
        self.lock().total_distance
    }

    pub fn completed_distance(&self) -> f64 {
        self.lock().completed_distance
    }

    /// Drain cursor: the last setpoint handed out, or the plan start.
    pub fn current_position(&self) -> Point3D {
        self.lock().cursor
    }
}

/// Marks a plan as computing; released on every exit path, unwinding included.
struct InFlight<'a>(&'a Mutex<QueueState>);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut st = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        st.in_flight -= 1;
    }
}

/// Setpoint length [mm] for `feed` mm/min at `period_ms`.
fn step_length(feed: f64, period_ms: u32) -> f64 {
    feed / SECONDS_PER_MINUTE * f64::from(period_ms) / 1000.0
}

/// Reject a plan whose path alone would exceed `MAX_QUEUE_POINTS`.
fn check_queue_bound(total: f64, feed: f64, period_ms: u32) -> Result<(), PlanError> {
    let step = step_length(feed, period_ms);
    if !(step > 0.0) || total / step > MAX_QUEUE_POINTS as f64 {
        return Err(PlanError::invalid(format!(
            "{total:.3} mm at {feed:.3} mm/min and {period_ms} ms exceeds {MAX_QUEUE_POINTS} setpoints"
        )));
    }
    Ok(())
}

fn check_period(period_ms: u32) -> Result<(), PlanError> {
    if period_ms == 0 {
        return Err(PlanError::invalid("interpolation period must be > 0 ms"));
    }
    Ok(())
}

/// Split every path segment into steps no longer than one period of travel
/// at `feed` mm/min. Each segment's last sub-step is its exact end, and the
/// path endpoint is always last.
///
/// The setpoint count is checked against `MAX_QUEUE_POINTS` before anything
/// is allocated.
fn resample(path: &[Point3D], feed: f64, period_ms: u32) -> Result<VecDeque<Point3D>, PlanError> {
    let step = step_length(feed, period_ms);
    let sub_steps = |len: f64| (len / step).ceil().max(1.0);

    let count: f64 = path
        .windows(2)
        .map(|seg| seg[0].distance_to(seg[1]))
        .filter(|&len| len >= GEOMETRY_EPSILON)
        .map(sub_steps)
        .sum::<f64>()
        + 1.0;
    if count > MAX_QUEUE_POINTS as f64 {
        return Err(PlanError::invalid(format!(
            "path needs {count} setpoints, limit is {MAX_QUEUE_POINTS}"
        )));
    }

    let mut out = VecDeque::with_capacity(count as usize);
    for seg in path.windows(2) {
        let (a, b) = (seg[0], seg[1]);
        let len = a.distance_to(b);
        if len < GEOMETRY_EPSILON {
            continue;
        }
        let n = sub_steps(len) as usize;
        out.extend((1..n).map(|j| a.lerp(b, j as f64 * step / len)));
        out.push_back(b);
    }

    if let Some(&end) = path.last() {
        if out.back() != Some(&end) {
            out.push_back(end);
        }
    }
    Ok(out)
}
