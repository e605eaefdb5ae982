//! Physics engine: the single authority that advances mouse state over
//! wall-clock time and detects illegal configurations.
//!
//! [`World`] owns the maze and the mouse behind an interior-synchronized
//! handle; every other component holds a clone of the handle and goes
//! through its accessors. The tick loop is free-running and paced by the
//! *measured* elapsed time, not the nominal tick budget, so scheduling
//! jitter never desynchronizes simulated time from real time.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, info};

use crate::config::SimConfig;
use crate::error::{Error, Result};
use crate::maze::{Direction, Maze};
use crate::mouse::{footprint_at, Mouse, MouseSpec, SensorKind};

/// Distance below which a forward step snaps to the cell center.
const STEP_POSITION_EPS: f64 = 1e-4;
/// Angle below which a turn step snaps to the target heading.
const STEP_ANGLE_EPS: f64 = 1e-3;
/// Raycast step for range sensors, meters.
const RAY_STEP: f64 = 0.002;

/// Normalize an angle to [-π, π).
pub fn normalize_angle(angle: f64) -> f64 {
    use std::f64::consts::{PI, TAU};
    let mut a = angle % TAU;
    if a >= PI {
        a -= TAU;
    } else if a < -PI {
        a += TAU;
    }
    a
}

/// Differential-drive closed form for one interval of constant
/// (linear, angular) rates. Straight-line branch when angular is
/// negligible, arc branch otherwise.
pub fn integrate(
    x: f64,
    y: f64,
    heading: f64,
    linear: f64,
    angular: f64,
    dt: f64,
) -> (f64, f64, f64) {
    if angular.abs() < 1e-9 {
        (
            x + linear * heading.cos() * dt,
            y + linear * heading.sin() * dt,
            heading,
        )
    } else {
        let r = linear / angular;
        let new_heading = heading + angular * dt;
        (
            x + r * (new_heading.sin() - heading.sin()),
            y + r * (heading.cos() - new_heading.cos()),
            normalize_angle(new_heading),
        )
    }
}

/// A continuous actuation request: wheel speeds applied in submission
/// order, optionally expiring after a duration of simulated time.
#[derive(Clone, Debug)]
pub struct Actuation {
    /// (wheel name, angular speed rad/s) pairs.
    pub speeds: Vec<(String, f64)>,
    /// Simulated seconds until the wheels revert to zero; `None` holds
    /// the speeds until replaced.
    pub duration: Option<f64>,
}

/// Discrete step request kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Advance one cell in the current (cardinal) heading.
    Forward,
    /// Rotate in place to a cardinal heading.
    TurnTo(Direction),
}

/// Outcome of a discrete step, surfaced to the blocked submitter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepResult {
    Completed,
    Crashed,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum StepTarget {
    Position { x: f64, y: f64 },
    Heading(f64),
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum StepOutcome {
    Pending,
    Done,
    Crashed,
}

#[derive(Clone, Debug)]
struct StepCommand {
    target: StepTarget,
    outcome: StepOutcome,
}

/// All mutable simulation state, guarded by the world lock.
pub struct WorldState {
    pub maze: Maze,
    pub mouse: Mouse,
    actuations: VecDeque<Actuation>,
    /// Remaining simulated seconds on the active actuation, if bounded.
    actuation_deadline: Option<f64>,
    step: Option<StepCommand>,
    pub sim_speed: f64,
    pub paused: bool,
    discrete_speed: f64,
    discrete_turn_speed: f64,
    pub tick_count: u64,
    shutdown: bool,
}

impl WorldState {
    fn new(maze: Maze, mouse: Mouse, config: &SimConfig) -> Self {
        Self {
            maze,
            mouse,
            actuations: VecDeque::new(),
            actuation_deadline: None,
            step: None,
            sim_speed: config.simulation.sim_speed,
            paused: config.simulation.start_paused,
            discrete_speed: config.discrete.speed,
            discrete_turn_speed: config.discrete.turn_speed,
            tick_count: 0,
            shutdown: false,
        }
    }

    /// Advance the simulation by `dt` simulated seconds. Pure with
    /// respect to wall-clock time, so tests drive it directly.
    ///
    /// Returns true when a pending step reached a terminal outcome this
    /// tick (the caller signals the condvar).
    pub fn tick(&mut self, dt: f64) -> bool {
        // Apply queued actuation in submission order; later commands
        // override earlier ones within the same tick.
        while let Some(actuation) = self.actuations.pop_front() {
            for (name, speed) in &actuation.speeds {
                // Unknown names were rejected at submission
                let _ = self.mouse.set_wheel_speed(name, *speed);
            }
            self.actuation_deadline = actuation.duration;
        }
        if let Some(deadline) = self.actuation_deadline.as_mut() {
            *deadline -= dt;
            if *deadline <= 0.0 {
                self.mouse.stop_wheels();
                self.actuation_deadline = None;
            }
        }

        let step_finished = if self.step.is_some() {
            self.advance_step(dt)
        } else {
            self.advance_continuous(dt);
            false
        };

        self.refresh_tile_estimate();
        self.refresh_sensors();
        self.tick_count += 1;
        step_finished
    }

    /// Integrate wheel-driven motion and run collision detection.
    fn advance_continuous(&mut self, dt: f64) {
        let (linear, angular) = self.mouse.drive_rates();
        if linear == 0.0 && angular == 0.0 {
            return;
        }
        let (nx, ny, nh) = integrate(
            self.mouse.x,
            self.mouse.y,
            self.mouse.heading,
            linear,
            angular,
            dt,
        );
        self.apply_pose(nx, ny, nh);
    }

    /// Drive the mouse toward the active step target.
    fn advance_step(&mut self, dt: f64) -> bool {
        let target = match &self.step {
            Some(command) if command.outcome == StepOutcome::Pending => command.target,
            _ => return false,
        };
        match target {
            StepTarget::Position { x: tx, y: ty } => {
                let dx = tx - self.mouse.x;
                let dy = ty - self.mouse.y;
                let dist = dx.hypot(dy);
                if dist <= STEP_POSITION_EPS {
                    self.finish_step(StepOutcome::Done);
                    return true;
                }
                let travel = (self.discrete_speed * dt).min(dist);
                let nx = self.mouse.x + travel * dx / dist;
                let ny = self.mouse.y + travel * dy / dist;
                if !self.apply_pose(nx, ny, self.mouse.heading) {
                    // Park back at the cell center so the algorithm can
                    // still turn and drive away after the crash
                    let (cx, cy) = Maze::cell_center(
                        self.mouse.tile.0 as i64,
                        self.mouse.tile.1 as i64,
                    );
                    self.mouse.x = cx;
                    self.mouse.y = cy;
                    self.mouse.in_collision = false;
                    self.finish_step(StepOutcome::Crashed);
                    return true;
                }
                if dist - travel <= STEP_POSITION_EPS {
                    self.mouse.x = tx;
                    self.mouse.y = ty;
                    self.finish_step(StepOutcome::Done);
                    return true;
                }
                false
            }
            StepTarget::Heading(target) => {
                let diff = normalize_angle(target - self.mouse.heading);
                if diff.abs() <= STEP_ANGLE_EPS {
                    self.mouse.heading = target;
                    self.finish_step(StepOutcome::Done);
                    return true;
                }
                let turn = (self.discrete_turn_speed * dt).min(diff.abs());
                let nh = normalize_angle(self.mouse.heading + turn * diff.signum());
                if !self.apply_pose(self.mouse.x, self.mouse.y, nh) {
                    self.finish_step(StepOutcome::Crashed);
                    return true;
                }
                if normalize_angle(target - self.mouse.heading).abs() <= STEP_ANGLE_EPS {
                    self.mouse.heading = target;
                    self.finish_step(StepOutcome::Done);
                    return true;
                }
                false
            }
        }
    }

    fn finish_step(&mut self, outcome: StepOutcome) {
        if let Some(step) = self.step.as_mut() {
            step.outcome = outcome;
        }
    }

    /// Attempt to move the mouse to a candidate pose. On wall
    /// intersection: latch the collided flag (once per new
    /// intersection), keep the previous position (never inside the
    /// wall), allow the rotation, and return false.
    fn apply_pose(&mut self, nx: f64, ny: f64, nh: f64) -> bool {
        if footprint_collides(&self.maze, nx, ny, nh, self.mouse.body) {
            if !self.mouse.in_collision {
                self.mouse.collided = true;
                self.mouse.in_collision = true;
                debug!(
                    x = self.mouse.x,
                    y = self.mouse.y,
                    "collision: translation halted"
                );
            }
            self.mouse.heading = nh;
            false
        } else {
            self.mouse.in_collision = false;
            self.mouse.x = nx;
            self.mouse.y = ny;
            self.mouse.heading = nh;
            true
        }
    }

    fn refresh_tile_estimate(&mut self) {
        let tile = self.maze.cell_of(self.mouse.x, self.mouse.y);
        if tile != self.mouse.tile {
            self.mouse.prev_tile = self.mouse.tile;
            self.mouse.tile = tile;
        }
    }

    /// Refresh every sensor from the current pose; readings are never
    /// staler than one tick.
    fn refresh_sensors(&mut self) {
        let maze = &self.maze;
        let (x, y, heading) = (self.mouse.x, self.mouse.y, self.mouse.heading);
        let (sin, cos) = heading.sin_cos();
        for (_, sensor) in self.mouse.sensors_mut() {
            let (lat, lon) = sensor.offset;
            let sx = x + lon * cos - lat * sin;
            let sy = y + lon * sin + lat * cos;
            sensor.reading = match sensor.kind {
                SensorKind::Contact => {
                    if maze.point_in_wall(sx, sy) {
                        1.0
                    } else {
                        0.0
                    }
                }
                SensorKind::Range { max } => raycast(maze, sx, sy, heading + sensor.bearing, max),
            };
        }
    }

    /// Resolve a step request into a concrete target from the current
    /// mouse state.
    fn resolve_step(&self, step: Step) -> StepCommand {
        let target = match step {
            Step::Forward => {
                let dir = Direction::nearest(self.mouse.heading);
                let (dx, dy) = dir.offset();
                let (tx, ty) =
                    Maze::cell_center(self.mouse.tile.0 as i64 + dx, self.mouse.tile.1 as i64 + dy);
                StepTarget::Position { x: tx, y: ty }
            }
            Step::TurnTo(dir) => StepTarget::Heading(dir.angle()),
        };
        StepCommand {
            target,
            outcome: StepOutcome::Pending,
        }
    }
}

/// March a ray until it enters wall geometry, returning the distance
/// (capped at `max`).
fn raycast(maze: &Maze, x: f64, y: f64, angle: f64, max: f64) -> f64 {
    let (sin, cos) = angle.sin_cos();
    let mut d = 0.0;
    while d < max {
        if maze.point_in_wall(x + d * cos, y + d * sin) {
            return d;
        }
        d += RAY_STEP;
    }
    max
}

/// Footprint-vs-wall test: sample the rectangle's corners and edge
/// midpoints against the wall bands.
pub fn footprint_collides(maze: &Maze, x: f64, y: f64, heading: f64, body: (f64, f64)) -> bool {
    let corners = footprint_at(x, y, heading, body);
    for i in 0..4 {
        let (ax, ay) = corners[i];
        let (bx, by) = corners[(i + 1) % 4];
        if maze.point_in_wall(ax, ay) || maze.point_in_wall((ax + bx) / 2.0, (ay + by) / 2.0) {
            return true;
        }
    }
    false
}

struct WorldShared {
    state: Mutex<WorldState>,
    step_done: Condvar,
    tick_observer: Mutex<Option<Box<dyn Fn(u64) + Send>>>,
    tick_budget: Duration,
}

/// Cloneable handle to the simulation. All reads and writes go through
/// these accessors; nothing outside this module touches the state
/// directly.
#[derive(Clone)]
pub struct World {
    shared: Arc<WorldShared>,
}

impl World {
    /// Create the world around a maze and an (initially placeholder)
    /// mouse.
    pub fn new(maze: Maze, mouse: Mouse, config: &SimConfig) -> World {
        World {
            shared: Arc::new(WorldShared {
                state: Mutex::new(WorldState::new(maze, mouse, config)),
                step_done: Condvar::new(),
                tick_observer: Mutex::new(None),
                tick_budget: Duration::from_millis(config.simulation.tick_ms),
            }),
        }
    }

    /// Run the tick loop until shutdown. Intended for a dedicated
    /// thread; each iteration integrates the *measured* elapsed time and
    /// sleeps out the remainder of the tick budget.
    pub fn simulate(&self) {
        info!(
            tick_budget_ms = self.shared.tick_budget.as_millis() as u64,
            "physics loop started"
        );
        let mut last = Instant::now();
        loop {
            let loop_start = Instant::now();
            let wall_dt = loop_start.duration_since(last).as_secs_f64();
            last = loop_start;

            let tick_count;
            {
                let mut state = self.shared.state.lock();
                if state.shutdown {
                    break;
                }
                let dt = if state.paused {
                    0.0
                } else {
                    wall_dt * state.sim_speed
                };
                if state.tick(dt) {
                    self.shared.step_done.notify_all();
                }
                tick_count = state.tick_count;
            }

            if let Some(observer) = self.shared.tick_observer.lock().as_ref() {
                observer(tick_count);
            }

            let elapsed = loop_start.elapsed();
            if elapsed < self.shared.tick_budget {
                std::thread::sleep(self.shared.tick_budget - elapsed);
            }
        }
        info!("physics loop terminated");
    }

    /// Stop the tick loop and wake any blocked step waiter.
    pub fn shutdown(&self) {
        let mut state = self.shared.state.lock();
        state.shutdown = true;
        self.shared.step_done.notify_all();
    }

    /// Whether shutdown has been requested.
    pub fn is_shutdown(&self) -> bool {
        self.shared.state.lock().shutdown
    }

    /// Freeze or resume elapsed-time accumulation. Paused time is never
    /// caught up.
    pub fn set_paused(&self, paused: bool) {
        self.shared.state.lock().paused = paused;
    }

    /// Adjust the real-time speed multiplier.
    pub fn set_sim_speed(&self, speed: f64) {
        self.shared.state.lock().sim_speed = speed.max(0.0);
    }

    /// Register the renderer's per-tick redraw hook.
    pub fn set_tick_observer(&self, observer: Box<dyn Fn(u64) + Send>) {
        *self.shared.tick_observer.lock() = Some(observer);
    }

    /// Queue a continuous actuation command. Wheel names are validated
    /// against the mouse before queueing.
    pub fn queue_actuation(&self, actuation: Actuation) -> Result<()> {
        let mut state = self.shared.state.lock();
        for (name, _) in &actuation.speeds {
            if !state.mouse.has_wheel(name) {
                return Err(Error::Interface(format!("unknown wheel \"{}\"", name)));
            }
        }
        state.actuations.push_back(actuation);
        Ok(())
    }

    /// Submit a discrete step. Fails fast if another step is
    /// outstanding; at most one movement command is in flight.
    pub fn submit_step(&self, step: Step) -> Result<()> {
        let mut state = self.shared.state.lock();
        if state.step.is_some() {
            return Err(Error::StepPending);
        }
        let command = state.resolve_step(step);
        state.step = Some(command);
        Ok(())
    }

    /// Block until the outstanding step completes or crashes. Returns an
    /// error if the world shuts down while waiting.
    pub fn wait_step(&self) -> Result<StepResult> {
        let mut state = self.shared.state.lock();
        loop {
            if state.shutdown {
                return Err(Error::Interface("world shut down mid-step".to_string()));
            }
            match &state.step {
                Some(command) if command.outcome != StepOutcome::Pending => {
                    let outcome = command.outcome;
                    state.step = None;
                    return Ok(match outcome {
                        StepOutcome::Done => StepResult::Completed,
                        _ => StepResult::Crashed,
                    });
                }
                Some(_) => {
                    self.shared.step_done.wait(&mut state);
                }
                None => {
                    return Err(Error::Interface(
                        "no step outstanding to wait for".to_string(),
                    ));
                }
            }
        }
    }

    /// Replace the placeholder mouse once the algorithm's static options
    /// are known. Resets any queued commands.
    pub fn init_mouse(&self, spec: &MouseSpec, facing: Direction) {
        let mut state = self.shared.state.lock();
        state.mouse = Mouse::from_spec(spec, facing);
        state.actuations.clear();
        state.actuation_deadline = None;
        state.step = None;
    }

    /// Read a consistent snapshot of the world state. The closure runs
    /// under the lock; no read mixes pre- and post-tick values.
    pub fn with_state<R>(&self, f: impl FnOnce(&WorldState) -> R) -> R {
        f(&self.shared.state.lock())
    }

    /// Test/driver access: run one manual tick of `dt` simulated
    /// seconds, signalling step completion like the live loop.
    pub fn manual_tick(&self, dt: f64) {
        let mut state = self.shared.state.lock();
        if state.tick(dt) {
            self.shared.step_done.notify_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze::{CELL_SIZE, WALL_WIDTH};

    fn continuous_mouse() -> Mouse {
        let spec: MouseSpec = toml::from_str(
            r#"
            [body]
            width = 0.07
            length = 0.09

            [[wheels]]
            name = "left"
            offset = 0.04
            radius = 0.01
            max_speed = 40.0

            [[wheels]]
            name = "right"
            offset = -0.04
            radius = 0.01
            max_speed = 40.0

            [[sensors]]
            name = "front"
            offset = [0.0, 0.045]
            kind = "range"
            range = 0.5
        "#,
        )
        .unwrap();
        Mouse::from_spec(&spec, Direction::East)
    }

    fn test_world(mouse: Mouse) -> World {
        World::new(Maze::open(16, 16), mouse, &SimConfig::default())
    }

    #[test]
    fn straight_integration_matches_closed_form() {
        let (x, y, h) = integrate(0.0, 0.0, 0.0, 0.2, 0.0, 1.5);
        assert!((x - 0.3).abs() < 1e-12);
        assert!(y.abs() < 1e-12);
        assert!(h.abs() < 1e-12);
    }

    #[test]
    fn arc_integration_matches_closed_form() {
        // Quarter circle: v = r*w, after t = (π/2)/w the displacement is
        // (r, r) with heading π/2
        let w = 1.0;
        let r = 0.1;
        let t = std::f64::consts::FRAC_PI_2 / w;
        let (x, y, h) = integrate(0.0, 0.0, 0.0, r * w, w, t);
        assert!((x - r).abs() < 1e-9);
        assert!((y - r).abs() < 1e-9);
        assert!((h - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn multi_tick_composition_matches_single_interval() {
        // Constant rates: many small ticks must equal one closed form
        let (mut x, mut y, mut h) = (0.05, 0.05, 0.3);
        let (v, w) = (0.15, 0.8);
        for _ in 0..1000 {
            let (nx, ny, nh) = integrate(x, y, h, v, w, 0.001);
            x = nx;
            y = ny;
            h = nh;
        }
        let (ex, ey, eh) = integrate(0.05, 0.05, 0.3, v, w, 1.0);
        assert!((x - ex).abs() < 1e-6);
        assert!((y - ey).abs() < 1e-6);
        assert!((normalize_angle(h - eh)).abs() < 1e-6);
    }

    #[test]
    fn wheel_commands_drive_displacement() {
        let world = test_world(continuous_mouse());
        world
            .queue_actuation(Actuation {
                speeds: vec![("left".to_string(), 20.0), ("right".to_string(), 20.0)],
                duration: None,
            })
            .unwrap();
        // 0.5s at 20 rad/s * 0.01 m radius = 0.1 m east
        for _ in 0..100 {
            world.manual_tick(0.005);
        }
        let (x, start_x) = world.with_state(|s| (s.mouse.x, s.mouse.start.0));
        assert!((x - start_x - 0.1).abs() < 1e-6);
    }

    #[test]
    fn collision_sets_flag_once_and_stays_outside() {
        let world = test_world(continuous_mouse());
        world
            .queue_actuation(Actuation {
                speeds: vec![("left".to_string(), -20.0), ("right".to_string(), -20.0)],
                duration: None,
            })
            .unwrap();
        // Drive west into the boundary wall
        for _ in 0..400 {
            world.manual_tick(0.005);
        }
        world.with_state(|s| {
            assert!(s.mouse.collided);
            // Footprint must not be inside the wall band
            assert!(!footprint_collides(
                &s.maze,
                s.mouse.x,
                s.mouse.y,
                s.mouse.heading,
                s.mouse.body
            ));
            // Body's left edge stopped at the wall band
            let min_x = s
                .mouse
                .footprint()
                .iter()
                .map(|c| c.0)
                .fold(f64::MAX, f64::min);
            assert!(min_x >= WALL_WIDTH / 2.0 - 1e-6);
        });
    }

    #[test]
    fn discrete_step_moves_exactly_one_cell() {
        let world = test_world(Mouse::placeholder());
        for expected_y in [1usize, 2] {
            world.submit_step(Step::Forward).unwrap();
            for _ in 0..500 {
                world.manual_tick(0.005);
            }
            let result = world.wait_step().unwrap();
            assert_eq!(result, StepResult::Completed);
            world.with_state(|s| {
                assert_eq!(s.mouse.tile, (0, expected_y));
                let (_, cy) = Maze::cell_center(0, expected_y as i64);
                assert!((s.mouse.y - cy).abs() < 1e-9);
            });
        }
    }

    #[test]
    fn second_step_rejected_while_pending() {
        let world = test_world(Mouse::placeholder());
        world.submit_step(Step::Forward).unwrap();
        assert!(matches!(
            world.submit_step(Step::Forward),
            Err(Error::StepPending)
        ));
    }

    #[test]
    fn step_into_wall_crashes() {
        let world = test_world(Mouse::placeholder());
        world.submit_step(Step::TurnTo(Direction::South)).unwrap();
        for _ in 0..500 {
            world.manual_tick(0.005);
        }
        assert_eq!(world.wait_step().unwrap(), StepResult::Completed);

        // South of (0,0) is the boundary
        world.submit_step(Step::Forward).unwrap();
        for _ in 0..500 {
            world.manual_tick(0.005);
        }
        assert_eq!(world.wait_step().unwrap(), StepResult::Crashed);
        world.with_state(|s| {
            assert!(s.mouse.collided);
            // Parked back at the cell center, not wedged against the wall
            let (cx, cy) = Maze::cell_center(0, 0);
            assert!((s.mouse.x - cx).abs() < 1e-9);
            assert!((s.mouse.y - cy).abs() < 1e-9);
        });
    }

    #[test]
    fn crashed_step_still_allows_turn_and_escape() {
        let world = test_world(Mouse::placeholder());
        world.submit_step(Step::TurnTo(Direction::West)).unwrap();
        for _ in 0..500 {
            world.manual_tick(0.005);
        }
        assert_eq!(world.wait_step().unwrap(), StepResult::Completed);

        // West of (0,0) is the boundary: the forward step crashes
        world.submit_step(Step::Forward).unwrap();
        for _ in 0..500 {
            world.manual_tick(0.005);
        }
        assert_eq!(world.wait_step().unwrap(), StepResult::Crashed);

        // Recovery from the crash is the algorithm's job and must be
        // physically possible: turn in place, then drive away
        world.submit_step(Step::TurnTo(Direction::North)).unwrap();
        for _ in 0..500 {
            world.manual_tick(0.005);
        }
        assert_eq!(world.wait_step().unwrap(), StepResult::Completed);

        world.submit_step(Step::Forward).unwrap();
        for _ in 0..500 {
            world.manual_tick(0.005);
        }
        assert_eq!(world.wait_step().unwrap(), StepResult::Completed);
        world.with_state(|s| assert_eq!(s.mouse.tile, (0, 1)));
    }

    #[test]
    fn paused_tick_freezes_motion() {
        let world = test_world(continuous_mouse());
        world
            .queue_actuation(Actuation {
                speeds: vec![("left".to_string(), 20.0), ("right".to_string(), 20.0)],
                duration: None,
            })
            .unwrap();
        // dt of zero models a paused loop iteration
        for _ in 0..10 {
            world.manual_tick(0.0);
        }
        world.with_state(|s| assert!((s.mouse.x - s.mouse.start.0).abs() < 1e-12));
    }

    #[test]
    fn bounded_actuation_expires() {
        let world = test_world(continuous_mouse());
        world
            .queue_actuation(Actuation {
                speeds: vec![("left".to_string(), 20.0), ("right".to_string(), 20.0)],
                duration: Some(0.1),
            })
            .unwrap();
        for _ in 0..100 {
            world.manual_tick(0.005);
        }
        // Only ~0.1s of the 0.5s had live wheels: ~0.02 m
        let travelled = world.with_state(|s| s.mouse.x - s.mouse.start.0);
        assert!((travelled - 0.02).abs() < 2e-3);
    }

    #[test]
    fn range_sensor_reads_wall_distance() {
        // 1x1 maze: the front sensor faces the east boundary wall
        let maze = Maze::open(1, 1);
        let world = World::new(maze, continuous_mouse(), &SimConfig::default());
        world.manual_tick(0.0);
        let reading = world.with_state(|s| s.mouse.sensor_reading("front").unwrap());
        // Sensor sits at x = 0.09 + 0.045; inner face of the east wall
        // band is at 0.18 - 0.006
        let expected = (CELL_SIZE - WALL_WIDTH / 2.0) - (0.09 + 0.045);
        assert!((reading - expected).abs() < 2.0 * RAY_STEP);
    }
}
