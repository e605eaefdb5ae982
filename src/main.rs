use std::path::Path;
use std::time::Duration;

use tracing::{error, info};

use mooshak::channel;
use mooshak::config::SimConfig;
use mooshak::error::Result;
use mooshak::interface::initialize_mouse;
use mooshak::maze::Maze;
use mooshak::mouse::Mouse;
use mooshak::solver::{Algorithm, CostParams, IncrementalSolver};
use mooshak::view::shared_view;
use mooshak::world::World;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mooshak=info".parse().unwrap()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let config = if args.len() > 1 {
        let config_path = Path::new(&args[1]);
        info!("Loading configuration from {:?}", config_path);
        SimConfig::load(config_path)?
    } else if Path::new("mooshak.toml").exists() {
        info!("Loading configuration from mooshak.toml");
        SimConfig::load(Path::new("mooshak.toml"))?
    } else {
        info!("Using default configuration");
        SimConfig::default()
    };

    info!("Mooshak v{}", env!("CARGO_PKG_VERSION"));

    let maze = match &config.simulation.maze_file {
        Some(path) => {
            info!("Loading maze from {:?}", path);
            Maze::load(path)?
        }
        None => {
            info!("No maze file configured, using an open 16x16 maze");
            Maze::open(16, 16)
        }
    };
    info!(
        "Maze {}x{}, goal region {:?}",
        maze.width(),
        maze.height(),
        maze.goal_region()
    );

    let view = shared_view(&maze);
    let world = World::new(maze, Mouse::placeholder(), &config);

    let physics_world = world.clone();
    let physics = std::thread::Builder::new()
        .name("physics".to_string())
        .spawn(move || physics_world.simulate())?;

    let result = if config.algorithm.name.is_some() {
        run_external(&config, &world, view)
    } else {
        run_builtin(&config, &world, view)
    };
    if let Err(e) = &result {
        error!("Run failed: {}", e);
    }

    world.shutdown();
    if physics.join().is_err() {
        error!("Physics thread panicked");
    }
    result
}

/// Drive the built-in incremental solver on its own thread, monitoring
/// from here like any other algorithm.
fn run_builtin(config: &SimConfig, world: &World, view: mooshak::view::SharedView) -> Result<()> {
    let mut solver = IncrementalSolver::new(
        world.with_state(|s| s.maze.width()),
        world.with_state(|s| s.maze.height()),
        CostParams::from(&config.solver),
    );
    let options = solver.options();
    let iface = initialize_mouse(world, &view, &options, &config.algorithm.mice_dir)?;

    let solver_world = world.clone();
    let handle = std::thread::Builder::new()
        .name("solver".to_string())
        .spawn(move || {
            let result = solver.solve(&iface);
            solver_world.shutdown();
            result
        })?;

    monitor(world);
    match handle.join() {
        Ok(result) => result,
        Err(_) => {
            error!("Solver thread panicked");
            Ok(())
        }
    }
}

/// Build and launch the configured external algorithm, then supervise
/// it until it exits or the world shuts down.
fn run_external(config: &SimConfig, world: &World, view: mooshak::view::SharedView) -> Result<()> {
    let algo = channel::run_external(config, world.clone(), view)?;
    monitor(world);
    algo.join();
    Ok(())
}

/// Main-thread wait loop: sleep until shutdown is requested.
fn monitor(world: &World) {
    let check_interval = Duration::from_millis(100);
    while !world.is_shutdown() {
        std::thread::sleep(check_interval);
    }
}
