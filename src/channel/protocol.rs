//! Protocol semantics: one command line in, at most one response line
//! out.
//!
//! Commands are processed by a single worker in arrival order. Until
//! the static options are complete the processor only accepts option
//! declarations; an invalid declaration is fatal and parks the channel
//! in the failed state. After configuration, gameplay commands are
//! validated per-command: an unrecognized or malformed line is logged
//! and rejected without terminating the channel.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::interface::{
    initialize_mouse, MouseInterface, StaticOptions, StaticOptionsBuilder,
};
use crate::view::SharedView;
use crate::world::{StepResult, World};

/// Channel lifecycle, polled by the launching thread while the worker
/// collects static options.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChannelStatus {
    AwaitingOptions,
    Configured,
    Failed(String),
}

pub type SharedStatus = Arc<Mutex<ChannelStatus>>;

/// Interprets protocol lines against the control interface.
pub struct CommandProcessor {
    world: World,
    view: SharedView,
    mice_dir: PathBuf,
    status: SharedStatus,
    builder: Option<StaticOptionsBuilder>,
    iface: Option<MouseInterface>,
}

impl CommandProcessor {
    pub fn new(
        world: World,
        view: SharedView,
        mice_dir: PathBuf,
        status: SharedStatus,
    ) -> CommandProcessor {
        CommandProcessor {
            world,
            view,
            mice_dir,
            status,
            builder: Some(StaticOptionsBuilder::new()),
            iface: None,
        }
    }

    /// Handle one framed line. `Some` is written back to the algorithm;
    /// `None` writes nothing.
    pub fn process(&mut self, line: &str) -> Option<String> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        // A failed channel is dead: the run is terminating, later lines
        // must not resurrect it
        if matches!(&*self.status.lock(), ChannelStatus::Failed(_)) {
            return None;
        }
        debug!(target: "protocol", %line, "command");
        if self.iface.is_none() {
            match self.process_option(line) {
                Ok(()) => {}
                Err(e) => {
                    // Invalid static options are fatal to the run
                    self.builder = None;
                    *self.status.lock() = ChannelStatus::Failed(e.to_string());
                }
            }
            return None;
        }
        match self.process_gameplay(line) {
            Ok(response) => response,
            Err(e) => {
                warn!(target: "protocol", %line, error = %e, "command rejected");
                None
            }
        }
    }

    fn process_option(&mut self, line: &str) -> Result<()> {
        let (verb, rest) = split_verb(line);
        let builder = self
            .builder
            .as_mut()
            .ok_or_else(|| Error::Protocol("options already finalized".to_string()))?;
        match verb {
            "mouseFile" => builder.mouse_file(rest)?,
            "interfaceType" => builder.interface_type(rest)?,
            "initialDirection" => builder.initial_direction(rest)?,
            "tileTextDimensions" => builder.text_dimensions(rest)?,
            "wheelSpeedFraction" => builder.wheel_speed_fraction(rest)?,
            other => {
                return Err(Error::Protocol(format!(
                    "\"{}\" before static options are complete",
                    other
                )))
            }
        }
        if builder.is_complete() {
            let options = self
                .builder
                .take()
                .map(StaticOptionsBuilder::finish)
                .transpose()?
                .ok_or_else(|| Error::Protocol("options already finalized".to_string()))?;
            self.configure(options)?;
        }
        Ok(())
    }

    fn configure(&mut self, options: StaticOptions) -> Result<()> {
        let iface = initialize_mouse(&self.world, &self.view, &options, &self.mice_dir)?;
        self.iface = Some(iface);
        *self.status.lock() = ChannelStatus::Configured;
        Ok(())
    }

    fn process_gameplay(&mut self, line: &str) -> Result<Option<String>> {
        let iface = self
            .iface
            .as_ref()
            .ok_or_else(|| Error::Protocol("not configured".to_string()))?;
        let (verb, rest) = split_verb(line);
        let args: Vec<&str> = rest.split_whitespace().collect();
        let response = match (verb, args.as_slice()) {
            ("mazeWidth", []) => Some(iface.maze_width().to_string()),
            ("mazeHeight", []) => Some(iface.maze_height().to_string()),
            ("wallFront", []) => Some(bool_word(iface.wall_front()?)),
            ("wallLeft", []) => Some(bool_word(iface.wall_left()?)),
            ("wallRight", []) => Some(bool_word(iface.wall_right()?)),
            ("moveForward", []) => Some(step_word(iface.move_forward()?)),
            ("turnTo", [dir]) => Some(step_word(iface.turn_to(dir.parse()?)?)),
            ("setTileColor", [x, y, color]) => {
                let color = one_char(color)?;
                iface.set_color(parse_coord(x)?, parse_coord(y)?, color)?;
                None
            }
            ("setTileText", [x, y, ..]) => {
                let text = args[2..].join(" ");
                iface.set_text(parse_coord(x)?, parse_coord(y)?, &text)?;
                None
            }
            ("setTileFog", [x, y, foggy]) => {
                iface.set_fog(parse_coord(x)?, parse_coord(y)?, parse_bool(foggy)?)?;
                None
            }
            ("declareWall", [x, y, dir, present]) => {
                iface.declare_wall(
                    parse_coord(x)?,
                    parse_coord(y)?,
                    dir.parse()?,
                    parse_bool(present)?,
                )?;
                None
            }
            ("undeclareWall", [x, y, dir]) => {
                iface.undeclare_wall(parse_coord(x)?, parse_coord(y)?, dir.parse()?)?;
                None
            }
            ("wallDeclared", [x, y, dir]) => Some(bool_word(iface.wall_declared(
                parse_coord(x)?,
                parse_coord(y)?,
                dir.parse()?,
            )?)),
            ("setWheelSpeed", [wheel, speed]) => {
                let speed: f64 = speed
                    .parse()
                    .map_err(|_| Error::Protocol(format!("bad wheel speed \"{}\"", speed)))?;
                iface.set_wheel_speed(wheel, speed)?;
                None
            }
            ("readSensor", [sensor]) => Some(format!("{:.6}", iface.read_sensor(sensor)?)),
            ("pose", []) => {
                let (x, y, heading) = iface.pose()?;
                Some(format!("{:.6} {:.6} {:.6}", x, y, heading))
            }
            ("collided", []) => Some(bool_word(iface.collided())),
            ("windowSize", [w, h]) => {
                let (w, h) = (parse_u32(w)?, parse_u32(h)?);
                iface.set_window_size(w, h)?;
                None
            }
            _ => {
                return Err(Error::Protocol(format!("unrecognized command \"{}\"", line)));
            }
        };
        Ok(response)
    }
}

fn split_verb(line: &str) -> (&str, &str) {
    match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim_start()),
        None => (line, ""),
    }
}

fn bool_word(value: bool) -> String {
    if value { "true" } else { "false" }.to_string()
}

fn step_word(result: StepResult) -> String {
    match result {
        StepResult::Completed => "ack".to_string(),
        StepResult::Crashed => "crash".to_string(),
    }
}

fn parse_coord(token: &str) -> Result<i64> {
    token
        .parse()
        .map_err(|_| Error::Protocol(format!("bad coordinate \"{}\"", token)))
}

fn parse_u32(token: &str) -> Result<u32> {
    token
        .parse()
        .map_err(|_| Error::Protocol(format!("bad dimension \"{}\"", token)))
}

fn parse_bool(token: &str) -> Result<bool> {
    match token {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(Error::Protocol(format!("bad boolean \"{}\"", other))),
    }
}

fn one_char(token: &str) -> Result<char> {
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(Error::Protocol(format!("bad color \"{}\"", token))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::maze::Maze;
    use crate::mouse::Mouse;
    use crate::view::shared_view;

    fn processor_with_mouse_dir(dir: &std::path::Path) -> CommandProcessor {
        let maze = Maze::open(16, 16);
        let view = shared_view(&maze);
        let world = World::new(maze, Mouse::placeholder(), &SimConfig::default());
        let status = Arc::new(Mutex::new(ChannelStatus::AwaitingOptions));
        CommandProcessor::new(world, view, dir.to_path_buf(), status)
    }

    fn mouse_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("default.toml"),
            "[body]\nwidth = 0.06\nlength = 0.08\n",
        )
        .unwrap();
        dir
    }

    fn declare_discrete(processor: &mut CommandProcessor) {
        for line in [
            "mouseFile default",
            "interfaceType DISCRETE",
            "initialDirection OPENING",
            "tileTextDimensions 4 2",
            "wheelSpeedFraction 1.0",
        ] {
            assert_eq!(processor.process(line), None);
        }
    }

    #[test]
    fn options_then_queries() {
        let dir = mouse_dir();
        let mut processor = processor_with_mouse_dir(dir.path());
        declare_discrete(&mut processor);
        assert_eq!(*processor.status.lock(), ChannelStatus::Configured);
        assert_eq!(processor.process("mazeWidth"), Some("16".to_string()));
        assert_eq!(processor.process("mazeHeight"), Some("16".to_string()));
        // Opening policy at an all-open start cell resolves north; the
        // west edge is the boundary
        assert_eq!(processor.process("wallLeft"), Some("true".to_string()));
        assert_eq!(processor.process("wallFront"), Some("false".to_string()));
    }

    #[test]
    fn gameplay_before_options_is_fatal() {
        let dir = mouse_dir();
        let mut processor = processor_with_mouse_dir(dir.path());
        assert_eq!(processor.process("mazeWidth"), None);
        assert!(matches!(
            &*processor.status.lock(),
            ChannelStatus::Failed(_)
        ));
    }

    #[test]
    fn invalid_interface_type_is_fatal_before_mouse_load() {
        // Points at a missing directory: failure must come from the
        // option itself, not from mouse loading
        let mut processor =
            processor_with_mouse_dir(std::path::Path::new("/nonexistent"));
        assert_eq!(processor.process("interfaceType SIDEWAYS"), None);
        let status = processor.status.lock().clone();
        match status {
            ChannelStatus::Failed(msg) => assert!(msg.contains("SIDEWAYS")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn fatal_option_error_is_not_overwritten() {
        let dir = mouse_dir();
        let mut processor = processor_with_mouse_dir(dir.path());
        assert_eq!(processor.process("interfaceType SIDEWAYS"), None);
        // A complete set of valid declarations afterward must not
        // configure the channel
        for line in [
            "mouseFile default",
            "interfaceType DISCRETE",
            "initialDirection OPENING",
            "tileTextDimensions 4 2",
            "wheelSpeedFraction 1.0",
        ] {
            assert_eq!(processor.process(line), None);
        }
        assert!(matches!(
            &*processor.status.lock(),
            ChannelStatus::Failed(_)
        ));
        // And gameplay stays dead
        assert_eq!(processor.process("mazeWidth"), None);
        assert!(matches!(
            &*processor.status.lock(),
            ChannelStatus::Failed(_)
        ));
    }

    #[test]
    fn duplicate_option_is_fatal() {
        let dir = mouse_dir();
        let mut processor = processor_with_mouse_dir(dir.path());
        processor.process("interfaceType DISCRETE");
        processor.process("interfaceType DISCRETE");
        assert!(matches!(
            &*processor.status.lock(),
            ChannelStatus::Failed(_)
        ));
    }

    #[test]
    fn unknown_command_rejected_without_failing_channel() {
        let dir = mouse_dir();
        let mut processor = processor_with_mouse_dir(dir.path());
        declare_discrete(&mut processor);
        assert_eq!(processor.process("teleport 3 3"), None);
        assert_eq!(*processor.status.lock(), ChannelStatus::Configured);
        // Channel still serves valid commands
        assert_eq!(processor.process("collided"), Some("false".to_string()));
    }

    #[test]
    fn renderer_commands_yield_no_response() {
        let dir = mouse_dir();
        let mut processor = processor_with_mouse_dir(dir.path());
        declare_discrete(&mut processor);
        assert_eq!(processor.process("setTileColor 2 3 g"), None);
        assert_eq!(processor.process("setTileText 2 3 a* 12"), None);
        assert_eq!(processor.process("declareWall 2 3 NORTH true"), None);
        assert_eq!(
            processor.process("wallDeclared 2 3 NORTH"),
            Some("true".to_string())
        );
        // Shared-edge declaration is visible from the neighbor
        assert_eq!(
            processor.process("wallDeclared 2 4 SOUTH"),
            Some("true".to_string())
        );
    }

    #[test]
    fn continuous_commands_rejected_in_discrete_mode() {
        let dir = mouse_dir();
        let mut processor = processor_with_mouse_dir(dir.path());
        declare_discrete(&mut processor);
        assert_eq!(processor.process("pose"), None);
        assert_eq!(*processor.status.lock(), ChannelStatus::Configured);
    }
}
