//! TOML configuration with serde defaults for every field, so a partial
//! file (or none at all) yields a runnable simulator.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use crate::error::Result;

/// Top-level simulator configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub simulation: SimulationConfig,
    pub discrete: DiscreteConfig,
    pub algorithm: AlgorithmConfig,
    pub solver: SolverConfig,
}

/// Tick loop and maze selection.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Maze file to load; an open 16x16 maze when unset.
    pub maze_file: Option<PathBuf>,
    /// Real-time speed multiplier.
    pub sim_speed: f64,
    /// Nominal tick budget, milliseconds.
    pub tick_ms: u64,
    /// Start with elapsed-time accumulation frozen.
    pub start_paused: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            maze_file: None,
            sim_speed: default_sim_speed(),
            tick_ms: default_tick_ms(),
            start_paused: false,
        }
    }
}

/// Motion rates used to animate discrete steps.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DiscreteConfig {
    /// Forward speed, m/s.
    pub speed: f64,
    /// In-place turn rate, rad/s.
    pub turn_speed: f64,
}

impl Default for DiscreteConfig {
    fn default() -> Self {
        Self {
            speed: default_discrete_speed(),
            turn_speed: default_turn_speed(),
        }
    }
}

/// Which algorithm runs against the simulator.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AlgorithmConfig {
    /// Named external algorithm under `algorithms_dir`; the built-in
    /// incremental solver when unset.
    pub name: Option<String>,
    /// Directory of external algorithm sources.
    pub algorithms_dir: PathBuf,
    /// Directory of mouse definition files.
    pub mice_dir: PathBuf,
}

impl Default for AlgorithmConfig {
    fn default() -> Self {
        Self {
            name: None,
            algorithms_dir: PathBuf::from("algorithms"),
            mice_dir: PathBuf::from("mice"),
        }
    }
}

/// Edge weights for the built-in solver's cost model.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Base cost of traversing one cell.
    pub cell_cost: f64,
    /// Added cost when the move changes heading.
    pub turn_penalty: f64,
    /// Per-cell discount for sustained straight runs.
    pub straight_discount: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            cell_cost: default_cell_cost(),
            turn_penalty: default_turn_penalty(),
            straight_discount: default_straight_discount(),
        }
    }
}

fn default_sim_speed() -> f64 {
    1.0
}

fn default_tick_ms() -> u64 {
    5
}

fn default_discrete_speed() -> f64 {
    0.3
}

fn default_turn_speed() -> f64 {
    6.0
}

fn default_cell_cost() -> f64 {
    1.0
}

fn default_turn_penalty() -> f64 {
    0.4
}

fn default_straight_discount() -> f64 {
    0.02
}

impl SimConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<SimConfig> {
        let content = std::fs::read_to_string(path)?;
        let config: SimConfig = toml::from_str(&content)?;
        info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config: SimConfig = toml::from_str("").unwrap();
        assert_eq!(config.simulation.tick_ms, 5);
        assert!((config.simulation.sim_speed - 1.0).abs() < 1e-12);
        assert!(!config.simulation.start_paused);
        assert!(config.algorithm.name.is_none());
        assert!((config.discrete.speed - 0.3).abs() < 1e-12);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: SimConfig = toml::from_str(
            r#"
            [simulation]
            sim_speed = 8.0

            [algorithm]
            name = "flood"
        "#,
        )
        .unwrap();
        assert!((config.simulation.sim_speed - 8.0).abs() < 1e-12);
        assert_eq!(config.simulation.tick_ms, 5);
        assert_eq!(config.algorithm.name.as_deref(), Some("flood"));
        assert_eq!(config.algorithm.mice_dir, PathBuf::from("mice"));
    }

    #[test]
    fn solver_costs_override() {
        let config: SimConfig = toml::from_str(
            r#"
            [solver]
            turn_penalty = 1.5
        "#,
        )
        .unwrap();
        assert!((config.solver.turn_penalty - 1.5).abs() < 1e-12);
        assert!((config.solver.cell_cost - 1.0).abs() < 1e-12);
    }
}
