//! Mouse model: pose, named wheels and sensors, and the TOML
//! mouse-definition file.
//!
//! The mouse is structurally immutable after initialization; the physics
//! engine mutates its pose, wheel speeds, sensor readings, and collision
//! state every tick.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::maze::{Direction, Maze};

/// Mouse-definition file contents.
#[derive(Clone, Debug, Deserialize)]
pub struct MouseSpec {
    pub body: BodySpec,
    #[serde(default)]
    pub wheels: Vec<WheelSpec>,
    #[serde(default)]
    pub sensors: Vec<SensorSpec>,
}

/// Body rectangle, in meters.
#[derive(Clone, Debug, Deserialize)]
pub struct BodySpec {
    /// Lateral extent (perpendicular to heading).
    pub width: f64,
    /// Longitudinal extent (along heading).
    pub length: f64,
}

/// One wheel of the differential drive.
#[derive(Clone, Debug, Deserialize)]
pub struct WheelSpec {
    pub name: String,
    /// Lateral offset from the body center, meters; positive is left.
    pub offset: f64,
    /// Wheel radius, meters.
    pub radius: f64,
    /// Maximum angular speed, rad/s.
    pub max_speed: f64,
}

/// One sensor.
#[derive(Clone, Debug, Deserialize)]
pub struct SensorSpec {
    pub name: String,
    /// Position relative to body center (lateral, longitudinal), meters.
    pub offset: [f64; 2],
    /// Bearing relative to the heading, radians.
    #[serde(default)]
    pub bearing: f64,
    /// "range" or "contact".
    pub kind: String,
    /// Maximum range for range sensors, meters.
    #[serde(default = "default_sensor_range")]
    pub range: f64,
}

fn default_sensor_range() -> f64 {
    0.5
}

impl MouseSpec {
    /// Load a mouse-definition TOML file.
    pub fn load(path: &Path) -> Result<MouseSpec> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Mouse(format!("failed to read {:?}: {}", path, e)))?;
        let spec: MouseSpec = toml::from_str(&content)
            .map_err(|e| Error::Mouse(format!("bad mouse definition {:?}: {}", path, e)))?;
        spec.validate()?;
        Ok(spec)
    }

    fn validate(&self) -> Result<()> {
        if self.body.width <= 0.0 || self.body.length <= 0.0 {
            return Err(Error::Mouse("body dimensions must be positive".to_string()));
        }
        for wheel in &self.wheels {
            if wheel.radius <= 0.0 || wheel.max_speed <= 0.0 {
                return Err(Error::Mouse(format!(
                    "wheel \"{}\" needs positive radius and max_speed",
                    wheel.name
                )));
            }
        }
        for sensor in &self.sensors {
            match sensor.kind.as_str() {
                "range" | "contact" => {}
                other => {
                    return Err(Error::Mouse(format!(
                        "sensor \"{}\" has unknown kind \"{}\"",
                        sensor.name, other
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Live wheel state.
#[derive(Clone, Debug)]
pub struct Wheel {
    /// Lateral offset from center, positive left.
    pub offset: f64,
    pub radius: f64,
    /// Maximum angular speed, rad/s.
    pub max_speed: f64,
    /// Current angular speed, rad/s; always within ±max_speed.
    pub speed: f64,
}

/// Sensor flavor.
#[derive(Clone, Debug)]
pub enum SensorKind {
    /// Distance to the nearest wall along the bearing, up to `max`.
    Range { max: f64 },
    /// Boolean contact with wall geometry (reads 0.0 or 1.0).
    Contact,
}

/// Live sensor state.
#[derive(Clone, Debug)]
pub struct Sensor {
    /// Position relative to body center (lateral, longitudinal).
    pub offset: (f64, f64),
    /// Bearing relative to heading, radians.
    pub bearing: f64,
    pub kind: SensorKind,
    /// Latest reading; refreshed every physics tick.
    pub reading: f64,
}

/// The simulated vehicle.
#[derive(Clone, Debug)]
pub struct Mouse {
    /// Continuous position, meters.
    pub x: f64,
    pub y: f64,
    /// Heading angle, radians (east 0, CCW positive).
    pub heading: f64,
    /// Pose at initialization (x, y, heading).
    pub start: (f64, f64, f64),
    /// Sticky collision flag; set once per new wall intersection.
    pub collided: bool,
    /// Whether the last candidate pose intersected a wall. Transient,
    /// used to detect *new* intersections.
    pub in_collision: bool,
    /// Current discrete tile estimate.
    pub tile: (usize, usize),
    /// Previous tile estimate, kept for collision locality.
    pub prev_tile: (usize, usize),
    /// Body (width, length), meters.
    pub body: (f64, f64),
    wheels: BTreeMap<String, Wheel>,
    sensors: BTreeMap<String, Sensor>,
}

impl Mouse {
    /// Minimal mouse used before the algorithm declares its mouse file:
    /// a small body at the start cell, no wheels or sensors.
    pub fn placeholder() -> Mouse {
        let (cx, cy) = Maze::cell_center(0, 0);
        let heading = Direction::North.angle();
        Mouse {
            x: cx,
            y: cy,
            heading,
            start: (cx, cy, heading),
            collided: false,
            in_collision: false,
            tile: (0, 0),
            prev_tile: (0, 0),
            body: (0.06, 0.08),
            wheels: BTreeMap::new(),
            sensors: BTreeMap::new(),
        }
    }

    /// Build the mouse from a definition, placed at the start cell facing
    /// the given direction.
    pub fn from_spec(spec: &MouseSpec, facing: Direction) -> Mouse {
        let (cx, cy) = Maze::cell_center(0, 0);
        let heading = facing.angle();
        let mut wheels = BTreeMap::new();
        for w in &spec.wheels {
            wheels.insert(
                w.name.clone(),
                Wheel {
                    offset: w.offset,
                    radius: w.radius,
                    max_speed: w.max_speed,
                    speed: 0.0,
                },
            );
        }
        let mut sensors = BTreeMap::new();
        for s in &spec.sensors {
            let kind = match s.kind.as_str() {
                "contact" => SensorKind::Contact,
                _ => SensorKind::Range { max: s.range },
            };
            sensors.insert(
                s.name.clone(),
                Sensor {
                    offset: (s.offset[0], s.offset[1]),
                    bearing: s.bearing,
                    kind,
                    reading: 0.0,
                },
            );
        }
        Mouse {
            x: cx,
            y: cy,
            heading,
            start: (cx, cy, heading),
            collided: false,
            in_collision: false,
            tile: (0, 0),
            prev_tile: (0, 0),
            body: (spec.body.width, spec.body.length),
            wheels,
            sensors,
        }
    }

    /// Any mouse can run the discrete interface.
    pub fn is_discrete_compatible(&self) -> bool {
        true
    }

    /// The continuous interface needs a drivable differential pair and at
    /// least one sensor to close the loop with.
    pub fn is_continuous_compatible(&self) -> bool {
        self.wheels.len() >= 2 && !self.sensors.is_empty()
    }

    /// Whether a wheel with this name exists.
    pub fn has_wheel(&self, name: &str) -> bool {
        self.wheels.contains_key(name)
    }

    /// Set a wheel's commanded angular speed, clamped to its maximum.
    pub fn set_wheel_speed(&mut self, name: &str, speed: f64) -> Result<()> {
        let wheel = self
            .wheels
            .get_mut(name)
            .ok_or_else(|| Error::Interface(format!("unknown wheel \"{}\"", name)))?;
        wheel.speed = speed.clamp(-wheel.max_speed, wheel.max_speed);
        Ok(())
    }

    /// Latest reading of a named sensor.
    pub fn sensor_reading(&self, name: &str) -> Result<f64> {
        self.sensors
            .get(name)
            .map(|s| s.reading)
            .ok_or_else(|| Error::Interface(format!("unknown sensor \"{}\"", name)))
    }

    /// Zero all wheel speeds.
    pub fn stop_wheels(&mut self) {
        for wheel in self.wheels.values_mut() {
            wheel.speed = 0.0;
        }
    }

    /// Effective (linear m/s, angular rad/s) from the outermost wheel
    /// pair using differential-drive kinematics. Zero if the mouse has
    /// fewer than two wheels or no lateral separation.
    pub fn drive_rates(&self) -> (f64, f64) {
        let mut leftmost: Option<&Wheel> = None;
        let mut rightmost: Option<&Wheel> = None;
        for wheel in self.wheels.values() {
            if leftmost.map_or(true, |w| wheel.offset > w.offset) {
                leftmost = Some(wheel);
            }
            if rightmost.map_or(true, |w| wheel.offset < w.offset) {
                rightmost = Some(wheel);
            }
        }
        match (leftmost, rightmost) {
            (Some(left), Some(right)) if left.offset > right.offset => {
                let v_left = left.speed * left.radius;
                let v_right = right.speed * right.radius;
                let base = left.offset - right.offset;
                let linear = (v_left + v_right) / 2.0;
                let angular = (v_right - v_left) / base;
                (linear, angular)
            }
            _ => (0.0, 0.0),
        }
    }

    /// Iterate sensors mutably (physics tick refresh).
    pub fn sensors_mut(&mut self) -> impl Iterator<Item = (&String, &mut Sensor)> {
        self.sensors.iter_mut()
    }

    /// Footprint rectangle corners at the current pose, CCW.
    pub fn footprint(&self) -> [(f64, f64); 4] {
        footprint_at(self.x, self.y, self.heading, self.body)
    }
}

/// Footprint rectangle corners for an arbitrary pose.
pub fn footprint_at(x: f64, y: f64, heading: f64, body: (f64, f64)) -> [(f64, f64); 4] {
    let (w, l) = (body.0 / 2.0, body.1 / 2.0);
    let (sin, cos) = heading.sin_cos();
    // Local frame: +x along heading (longitudinal), +y left (lateral)
    let corners = [(l, w), (l, -w), (-l, -w), (-l, w)];
    let mut out = [(0.0, 0.0); 4];
    for (i, (lx, ly)) in corners.into_iter().enumerate() {
        out[i] = (x + lx * cos - ly * sin, y + lx * sin + ly * cos);
    }
    out
}
