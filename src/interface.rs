//! Control interface: the only channel through which a solving
//! algorithm observes or affects the mouse and maze.
//!
//! An algorithm declares its static options exactly once before any
//! gameplay command; the declared interface mode then gates every call.
//! Discrete move/turn calls block until the physics engine reports the
//! step complete or crashed; continuous calls never block.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use tracing::info;

use crate::error::{Error, Result};
use crate::maze::Direction;
use crate::mouse::{Mouse, MouseSpec};
use crate::view::{with_view, with_view_mut, SharedView};
use crate::world::{Actuation, Step, StepResult, World};

/// The two mutually exclusive command surfaces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InterfaceKind {
    Discrete,
    Continuous,
}

impl FromStr for InterfaceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<InterfaceKind> {
        match s {
            "DISCRETE" => Ok(InterfaceKind::Discrete),
            "CONTINUOUS" => Ok(InterfaceKind::Continuous),
            other => Err(Error::Config(format!(
                "unrecognized interface type \"{}\"",
                other
            ))),
        }
    }
}

impl fmt::Display for InterfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterfaceKind::Discrete => write!(f, "DISCRETE"),
            InterfaceKind::Continuous => write!(f, "CONTINUOUS"),
        }
    }
}

/// Initial heading declaration: a fixed cardinal, or a policy resolved
/// against the start cell's actual wall layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeadingPolicy {
    Fixed(Direction),
    /// Face the side of the start cell without a wall.
    Opening,
    /// Face the side of the start cell with a wall.
    Wall,
}

impl FromStr for HeadingPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<HeadingPolicy> {
        match s {
            "OPENING" => Ok(HeadingPolicy::Opening),
            "WALL" => Ok(HeadingPolicy::Wall),
            other => match other.parse::<Direction>() {
                Ok(dir) => Ok(HeadingPolicy::Fixed(dir)),
                Err(_) => Err(Error::Config(format!(
                    "unrecognized initial direction \"{}\"",
                    other
                ))),
            },
        }
    }
}

impl HeadingPolicy {
    /// Resolve the policy against the start cell. When the north and
    /// east edges agree (both walled or both open) there is nothing to
    /// disambiguate and the answer is north either way.
    pub fn resolve(self, north_walled: bool, east_walled: bool) -> Direction {
        match self {
            HeadingPolicy::Fixed(dir) => dir,
            _ if north_walled == east_walled => Direction::North,
            HeadingPolicy::Opening => {
                if north_walled {
                    Direction::East
                } else {
                    Direction::North
                }
            }
            HeadingPolicy::Wall => {
                if north_walled {
                    Direction::North
                } else {
                    Direction::East
                }
            }
        }
    }
}

/// The one-time configuration an algorithm must declare before any
/// gameplay command is accepted.
#[derive(Clone, Debug)]
pub struct StaticOptions {
    pub mouse_file: String,
    pub mode: InterfaceKind,
    pub heading: HeadingPolicy,
    /// (columns, rows) of the per-tile text grid.
    pub text_dimensions: (u32, u32),
    /// Scale applied to commanded wheel speeds, in [0.0, 1.0].
    pub wheel_speed_fraction: f64,
}

/// Accumulates static-option declarations. Each option may be declared
/// exactly once; the set is complete when all five are present.
#[derive(Clone, Debug, Default)]
pub struct StaticOptionsBuilder {
    mouse_file: Option<String>,
    mode: Option<InterfaceKind>,
    heading: Option<HeadingPolicy>,
    text_dimensions: Option<(u32, u32)>,
    wheel_speed_fraction: Option<f64>,
}

impl StaticOptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_unset<T>(slot: &Option<T>, name: &str) -> Result<()> {
        if slot.is_some() {
            Err(Error::Config(format!(
                "static option \"{}\" declared twice",
                name
            )))
        } else {
            Ok(())
        }
    }

    pub fn mouse_file(&mut self, value: &str) -> Result<()> {
        Self::check_unset(&self.mouse_file, "mouseFile")?;
        if value.is_empty() {
            return Err(Error::Config("empty mouse file name".to_string()));
        }
        self.mouse_file = Some(value.to_string());
        Ok(())
    }

    pub fn interface_type(&mut self, value: &str) -> Result<()> {
        Self::check_unset(&self.mode, "interfaceType")?;
        self.mode = Some(value.parse()?);
        Ok(())
    }

    pub fn initial_direction(&mut self, value: &str) -> Result<()> {
        Self::check_unset(&self.heading, "initialDirection")?;
        self.heading = Some(value.parse()?);
        Ok(())
    }

    pub fn text_dimensions(&mut self, value: &str) -> Result<()> {
        Self::check_unset(&self.text_dimensions, "tileTextDimensions")?;
        let mut parts = value.split_whitespace();
        let dims = match (parts.next(), parts.next(), parts.next()) {
            (Some(cols), Some(rows), None) => match (cols.parse(), rows.parse()) {
                (Ok(c), Ok(r)) => Some((c, r)),
                _ => None,
            },
            _ => None,
        };
        match dims {
            Some(dims) => {
                self.text_dimensions = Some(dims);
                Ok(())
            }
            None => Err(Error::Config(format!(
                "invalid tile text dimensions \"{}\"",
                value
            ))),
        }
    }

    pub fn wheel_speed_fraction(&mut self, value: &str) -> Result<()> {
        Self::check_unset(&self.wheel_speed_fraction, "wheelSpeedFraction")?;
        let fraction: f64 = value
            .parse()
            .map_err(|_| Error::Config(format!("invalid wheel speed fraction \"{}\"", value)))?;
        if !(0.0..=1.0).contains(&fraction) {
            return Err(Error::Config(format!(
                "wheel speed fraction {} outside [0.0, 1.0]",
                fraction
            )));
        }
        self.wheel_speed_fraction = Some(fraction);
        Ok(())
    }

    /// Whether all five options have been declared.
    pub fn is_complete(&self) -> bool {
        self.mouse_file.is_some()
            && self.mode.is_some()
            && self.heading.is_some()
            && self.text_dimensions.is_some()
            && self.wheel_speed_fraction.is_some()
    }

    pub fn finish(self) -> Result<StaticOptions> {
        match (
            self.mouse_file,
            self.mode,
            self.heading,
            self.text_dimensions,
            self.wheel_speed_fraction,
        ) {
            (Some(mouse_file), Some(mode), Some(heading), Some(text_dimensions), Some(fraction)) => {
                Ok(StaticOptions {
                    mouse_file,
                    mode,
                    heading,
                    text_dimensions,
                    wheel_speed_fraction: fraction,
                })
            }
            _ => Err(Error::Config(
                "static options incomplete".to_string(),
            )),
        }
    }
}

/// The algorithm-facing handle. Clones share the same world and view.
#[derive(Clone)]
pub struct MouseInterface {
    world: World,
    view: SharedView,
    mode: InterfaceKind,
    initial_heading: Direction,
    text_dimensions: (u32, u32),
    wheel_speed_fraction: f64,
}

impl MouseInterface {
    fn require(&self, mode: InterfaceKind, op: &str) -> Result<()> {
        if self.mode == mode {
            Ok(())
        } else {
            Err(Error::Interface(format!(
                "\"{}\" is not available in {} mode",
                op, self.mode
            )))
        }
    }

    pub fn mode(&self) -> InterfaceKind {
        self.mode
    }

    pub fn initial_heading(&self) -> Direction {
        self.initial_heading
    }

    pub fn maze_width(&self) -> usize {
        self.world.with_state(|s| s.maze.width())
    }

    pub fn maze_height(&self) -> usize {
        self.world.with_state(|s| s.maze.height())
    }

    /// Goal cells for this maze's dimensions.
    pub fn goal_region(&self) -> Vec<(usize, usize)> {
        self.world.with_state(|s| s.maze.goal_region())
    }

    /// Current cell estimate.
    pub fn current_tile(&self) -> (usize, usize) {
        self.world.with_state(|s| s.mouse.tile)
    }

    /// Nearest cardinal to the current heading.
    pub fn current_direction(&self) -> Direction {
        self.world.with_state(|s| Direction::nearest(s.mouse.heading))
    }

    fn wall_relative(&self, op: &str, rotate: impl Fn(Direction) -> Direction) -> Result<bool> {
        self.require(InterfaceKind::Discrete, op)?;
        Ok(self.world.with_state(|s| {
            let dir = rotate(Direction::nearest(s.mouse.heading));
            let (x, y) = s.mouse.tile;
            s.maze.is_wall(x, y, dir)
        }))
    }

    pub fn wall_front(&self) -> Result<bool> {
        self.wall_relative("wallFront", |d| d)
    }

    pub fn wall_left(&self) -> Result<bool> {
        self.wall_relative("wallLeft", Direction::left)
    }

    pub fn wall_right(&self) -> Result<bool> {
        self.wall_relative("wallRight", Direction::right)
    }

    /// Advance one cell in the current heading. Blocks until the step
    /// completes or crashes.
    pub fn move_forward(&self) -> Result<StepResult> {
        self.require(InterfaceKind::Discrete, "moveForward")?;
        self.world.submit_step(Step::Forward)?;
        self.world.wait_step()
    }

    /// Rotate in place to a cardinal heading. Blocks like
    /// [`move_forward`](Self::move_forward).
    pub fn turn_to(&self, dir: Direction) -> Result<StepResult> {
        self.require(InterfaceKind::Discrete, "turnTo")?;
        self.world.submit_step(Step::TurnTo(dir))?;
        self.world.wait_step()
    }

    fn check_cell(&self, x: i64, y: i64) -> Result<(usize, usize)> {
        self.world.with_state(|s| s.maze.check_bounds(x, y))?;
        Ok((x as usize, y as usize))
    }

    pub fn set_color(&self, x: i64, y: i64, color: char) -> Result<()> {
        self.require(InterfaceKind::Discrete, "setTileColor")?;
        let (x, y) = self.check_cell(x, y)?;
        with_view_mut(&self.view, |v| v.set_color(x, y, color))
    }

    /// Set a tile's display text, clipped to the declared grid.
    pub fn set_text(&self, x: i64, y: i64, text: &str) -> Result<()> {
        self.require(InterfaceKind::Discrete, "setTileText")?;
        let (x, y) = self.check_cell(x, y)?;
        let capacity = (self.text_dimensions.0 * self.text_dimensions.1) as usize;
        let clipped: String = text.chars().take(capacity).collect();
        with_view_mut(&self.view, |v| v.set_text(x, y, clipped))
    }

    pub fn set_fog(&self, x: i64, y: i64, foggy: bool) -> Result<()> {
        self.require(InterfaceKind::Discrete, "setTileFog")?;
        let (x, y) = self.check_cell(x, y)?;
        with_view_mut(&self.view, |v| v.set_fog(x, y, foggy))
    }

    pub fn declare_wall(&self, x: i64, y: i64, dir: Direction, is_wall: bool) -> Result<()> {
        self.require(InterfaceKind::Discrete, "declareWall")?;
        let (x, y) = self.check_cell(x, y)?;
        with_view_mut(&self.view, |v| v.declare_wall(x, y, dir, is_wall))
    }

    pub fn undeclare_wall(&self, x: i64, y: i64, dir: Direction) -> Result<()> {
        self.require(InterfaceKind::Discrete, "undeclareWall")?;
        let (x, y) = self.check_cell(x, y)?;
        with_view_mut(&self.view, |v| v.undeclare_wall(x, y, dir))
    }

    pub fn wall_declared(&self, x: i64, y: i64, dir: Direction) -> Result<bool> {
        self.require(InterfaceKind::Discrete, "wallDeclared")?;
        let (x, y) = self.check_cell(x, y)?;
        with_view(&self.view, |v| v.wall_declared(x, y, dir))
    }

    /// Enqueue a wheel speed, scaled by the declared fraction. Returns
    /// immediately.
    pub fn set_wheel_speed(&self, wheel: &str, speed: f64) -> Result<()> {
        self.require(InterfaceKind::Continuous, "setWheelSpeed")?;
        self.world.queue_actuation(Actuation {
            speeds: vec![(wheel.to_string(), speed * self.wheel_speed_fraction)],
            duration: None,
        })
    }

    /// Latest sampled value of a named sensor.
    pub fn read_sensor(&self, sensor: &str) -> Result<f64> {
        self.require(InterfaceKind::Continuous, "readSensor")?;
        self.world.with_state(|s| s.mouse.sensor_reading(sensor))
    }

    /// Pose snapshot (x, y, heading). No read mixes pre- and post-tick
    /// values.
    pub fn pose(&self) -> Result<(f64, f64, f64)> {
        self.require(InterfaceKind::Continuous, "pose")?;
        Ok(self
            .world
            .with_state(|s| (s.mouse.x, s.mouse.y, s.mouse.heading)))
    }

    pub fn collided(&self) -> bool {
        self.world.with_state(|s| s.mouse.collided)
    }

    /// Renderer window-resize passthrough.
    pub fn set_window_size(&self, width: u32, height: u32) -> Result<()> {
        with_view_mut(&self.view, |v| v.set_window_size(width, height))
    }
}

/// Validate static options against the world, construct the mouse from
/// its definition file, and hand back the interface. Any failure here
/// is fatal to the run.
pub fn initialize_mouse(
    world: &World,
    view: &SharedView,
    options: &StaticOptions,
    mice_dir: &Path,
) -> Result<MouseInterface> {
    let (north_walled, east_walled) =
        world.with_state(|s| (s.maze.is_wall(0, 0, Direction::North), s.maze.is_wall(0, 0, Direction::East)));
    let facing = options.heading.resolve(north_walled, east_walled);

    let mut path = mice_dir.join(&options.mouse_file);
    if path.extension().is_none() {
        path.set_extension("toml");
    }
    let spec = MouseSpec::load(&path)?;
    let mouse = Mouse::from_spec(&spec, facing);
    let compatible = match options.mode {
        InterfaceKind::Discrete => mouse.is_discrete_compatible(),
        InterfaceKind::Continuous => mouse.is_continuous_compatible(),
    };
    if !compatible {
        return Err(Error::Config(format!(
            "mouse \"{}\" is not usable in {} mode",
            options.mouse_file, options.mode
        )));
    }
    world.init_mouse(&spec, facing);
    if options.mode == InterfaceKind::Discrete {
        with_view_mut(view, |v| v.set_fog(0, 0, false))?;
    }
    info!(
        mouse = %options.mouse_file,
        mode = %options.mode,
        facing = %facing,
        "mouse initialized"
    );
    Ok(MouseInterface {
        world: world.clone(),
        view: view.clone(),
        mode: options.mode,
        initial_heading: facing,
        text_dimensions: options.text_dimensions,
        wheel_speed_fraction: options.wheel_speed_fraction,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::maze::Maze;
    use crate::view::shared_view;

    fn discrete_interface() -> MouseInterface {
        let maze = Maze::open(16, 16);
        let view = shared_view(&maze);
        let world = World::new(maze, Mouse::placeholder(), &SimConfig::default());
        MouseInterface {
            world,
            view,
            mode: InterfaceKind::Discrete,
            initial_heading: Direction::North,
            text_dimensions: (4, 2),
            wheel_speed_fraction: 1.0,
        }
    }

    #[test]
    fn interface_kind_parses() {
        assert_eq!(
            "DISCRETE".parse::<InterfaceKind>().unwrap(),
            InterfaceKind::Discrete
        );
        assert!("SIDEWAYS".parse::<InterfaceKind>().is_err());
    }

    #[test]
    fn heading_policy_resolution() {
        // Agreeing edges resolve north under either policy
        assert_eq!(
            HeadingPolicy::Opening.resolve(true, true),
            Direction::North
        );
        assert_eq!(HeadingPolicy::Wall.resolve(false, false), Direction::North);
        // Opening faces the open side
        assert_eq!(HeadingPolicy::Opening.resolve(true, false), Direction::East);
        assert_eq!(
            HeadingPolicy::Opening.resolve(false, true),
            Direction::North
        );
        // Wall faces the walled side
        assert_eq!(HeadingPolicy::Wall.resolve(true, false), Direction::North);
        assert_eq!(HeadingPolicy::Wall.resolve(false, true), Direction::East);
        // Fixed ignores the walls
        assert_eq!(
            HeadingPolicy::Fixed(Direction::South).resolve(true, false),
            Direction::South
        );
    }

    #[test]
    fn static_options_declared_once() {
        let mut builder = StaticOptionsBuilder::new();
        builder.interface_type("DISCRETE").unwrap();
        assert!(builder.interface_type("DISCRETE").is_err());
    }

    #[test]
    fn static_options_complete_when_all_declared() {
        let mut builder = StaticOptionsBuilder::new();
        builder.mouse_file("default").unwrap();
        builder.interface_type("CONTINUOUS").unwrap();
        builder.initial_direction("OPENING").unwrap();
        builder.text_dimensions("4 2").unwrap();
        assert!(!builder.is_complete());
        builder.wheel_speed_fraction("0.75").unwrap();
        assert!(builder.is_complete());
        let options = builder.finish().unwrap();
        assert_eq!(options.mode, InterfaceKind::Continuous);
        assert!((options.wheel_speed_fraction - 0.75).abs() < 1e-12);
    }

    #[test]
    fn wheel_speed_fraction_bounds() {
        let mut builder = StaticOptionsBuilder::new();
        assert!(builder.wheel_speed_fraction("1.5").is_err());
        assert!(builder.wheel_speed_fraction("-0.1").is_err());
        assert!(builder.wheel_speed_fraction("0.0").is_ok());
    }

    #[test]
    fn wrong_mode_is_rejected() {
        let iface = discrete_interface();
        assert!(iface.pose().is_err());
        assert!(iface.read_sensor("front").is_err());
        assert!(iface.set_wheel_speed("left", 1.0).is_err());
        assert!(iface.wall_front().is_ok());
    }

    #[test]
    fn renderer_ops_validate_bounds() {
        let iface = discrete_interface();
        assert!(iface.set_color(3, 3, 'g').is_ok());
        assert!(iface.set_color(-1, 3, 'g').is_err());
        assert!(iface.set_color(16, 3, 'g').is_err());
    }

    #[test]
    fn tile_text_clipped_to_grid() {
        let iface = discrete_interface();
        iface.set_text(0, 0, "abcdefghijkl").unwrap();
        let text = with_view(&iface.view, |v| v.tile(0, 0).text.clone()).unwrap();
        // 4x2 grid holds eight characters
        assert_eq!(text, "abcdefgh");
    }

    #[test]
    fn boundary_walls_visible_from_start() {
        let iface = discrete_interface();
        // Placeholder faces north at (0,0): left and rear are boundary
        assert!(!iface.wall_front().unwrap());
        assert!(iface.wall_left().unwrap());
        assert!(!iface.wall_right().unwrap());
    }
}
