//! End-to-end runs over a live physics thread.

use std::path::Path;

use mooshak::config::SimConfig;
use mooshak::interface::{initialize_mouse, HeadingPolicy, InterfaceKind, StaticOptions};
use mooshak::maze::{Direction, Maze};
use mooshak::mouse::Mouse;
use mooshak::view::shared_view;
use mooshak::world::{StepResult, World};

/// High speed multiplier and a short tick so tests finish quickly.
fn fast_config() -> SimConfig {
    let mut config = SimConfig::default();
    config.simulation.sim_speed = 40.0;
    config.simulation.tick_ms = 1;
    config
}

fn discrete_options() -> StaticOptions {
    StaticOptions {
        mouse_file: "default".to_string(),
        mode: InterfaceKind::Discrete,
        heading: HeadingPolicy::Opening,
        text_dimensions: (4, 2),
        wheel_speed_fraction: 1.0,
    }
}

#[test]
fn boundary_run_reaches_far_corner_without_collision() {
    let maze = Maze::open(16, 16);
    let view = shared_view(&maze);
    let config = fast_config();
    let world = World::new(maze, Mouse::placeholder(), &config);
    let iface = initialize_mouse(&world, &view, &discrete_options(), Path::new("mice")).unwrap();

    // Opening policy at an all-open start cell resolves north
    assert_eq!(iface.initial_heading(), Direction::North);

    let physics_world = world.clone();
    let physics = std::thread::spawn(move || physics_world.simulate());

    for _ in 0..15 {
        assert_eq!(iface.move_forward().unwrap(), StepResult::Completed);
    }
    assert_eq!(iface.turn_to(Direction::East).unwrap(), StepResult::Completed);
    for _ in 0..15 {
        assert_eq!(iface.move_forward().unwrap(), StepResult::Completed);
    }

    assert_eq!(iface.current_tile(), (15, 15));
    assert!(!iface.collided());

    world.shutdown();
    physics.join().unwrap();
}

#[test]
fn crash_is_reported_and_survivable() {
    let maze = Maze::open(4, 4);
    let view = shared_view(&maze);
    let config = fast_config();
    let world = World::new(maze, Mouse::placeholder(), &config);
    let iface = initialize_mouse(&world, &view, &discrete_options(), Path::new("mice")).unwrap();

    let physics_world = world.clone();
    let physics = std::thread::spawn(move || physics_world.simulate());

    // Drive north into the boundary
    for _ in 0..3 {
        assert_eq!(iface.move_forward().unwrap(), StepResult::Completed);
    }
    assert_eq!(iface.move_forward().unwrap(), StepResult::Crashed);
    assert!(iface.collided());

    // The run continues: turning and moving away still works
    assert_eq!(iface.turn_to(Direction::East).unwrap(), StepResult::Completed);
    assert_eq!(iface.move_forward().unwrap(), StepResult::Completed);
    assert_eq!(iface.current_tile(), (1, 3));

    world.shutdown();
    physics.join().unwrap();
}

#[test]
fn continuous_interface_drives_and_senses() {
    let maze = Maze::open(16, 16);
    let view = shared_view(&maze);
    let config = fast_config();
    let world = World::new(maze, Mouse::placeholder(), &config);
    let options = StaticOptions {
        mouse_file: "wheeled".to_string(),
        mode: InterfaceKind::Continuous,
        heading: HeadingPolicy::Fixed(Direction::East),
        text_dimensions: (0, 0),
        wheel_speed_fraction: 1.0,
    };
    let iface = initialize_mouse(&world, &view, &options, Path::new("mice")).unwrap();

    let physics_world = world.clone();
    let physics = std::thread::spawn(move || physics_world.simulate());

    let (start_x, _, _) = iface.pose().unwrap();
    iface.set_wheel_speed("left", 20.0).unwrap();
    iface.set_wheel_speed("right", 20.0).unwrap();
    std::thread::sleep(std::time::Duration::from_millis(200));
    iface.set_wheel_speed("left", 0.0).unwrap();
    iface.set_wheel_speed("right", 0.0).unwrap();

    let (x, _, _) = iface.pose().unwrap();
    assert!(x > start_x + 0.05, "mouse did not advance: {} -> {}", start_x, x);
    assert!(iface.read_sensor("front").unwrap() > 0.0);
    assert!(!iface.collided());

    world.shutdown();
    physics.join().unwrap();
}

#[test]
fn body_only_mouse_rejected_in_continuous_mode() {
    // A body-only mouse lacks wheels and sensors: continuous mode must
    // refuse it at initialization
    let maze = Maze::open(4, 4);
    let view = shared_view(&maze);
    let world = World::new(maze, Mouse::placeholder(), &fast_config());
    let options = StaticOptions {
        mouse_file: "default".to_string(),
        mode: InterfaceKind::Continuous,
        heading: HeadingPolicy::Opening,
        text_dimensions: (0, 0),
        wheel_speed_fraction: 1.0,
    };
    assert!(initialize_mouse(&world, &view, &options, Path::new("mice")).is_err());
}
