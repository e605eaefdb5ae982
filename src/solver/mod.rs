//! Incremental best-first path planner: the built-in solving algorithm.
//!
//! The solver keeps a private wall-knowledge grid fed by the discrete
//! interface's wall queries and replans from the goal region outward
//! whenever new knowledge arrives. Per-cell bookkeeping is a single
//! reusable `Info` arena: sequence stamps make epoch reset O(1), and the
//! back-indexed heap makes relaxation a direct decrease-key.

mod heap;

use tracing::{debug, info, trace};

use crate::config::SolverConfig;
use crate::error::{Error, Result};
use crate::interface::{
    HeadingPolicy, InterfaceKind, MouseInterface, StaticOptions,
};
use crate::maze::Direction;
use crate::world::StepResult;

use heap::{InfoHeap, NOT_IN_HEAP};

/// Sentinel parent for goal seeds.
pub const NO_PARENT: u16 = u16::MAX;

/// Longest straight run that still earns a discount.
const MAX_DISCOUNT_RUN: u8 = 4;

/// Per-cell planning record, reused across epochs. A record is
/// unvisited for epoch E unless `seq == E`; stale fields from earlier
/// epochs are simply overwritten on first touch.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Info {
    pub seq: u32,
    /// Best known path cost to the goal region this epoch.
    pub distance: f64,
    /// Cell index of the predecessor on the best path (toward the
    /// goal), or [`NO_PARENT`] for goal seeds.
    pub parent: u16,
    /// Direction taken from the parent to reach this cell.
    pub heading: Direction,
    /// Consecutive straight moves ending at this cell.
    pub run_len: u8,
    /// Current slot in the heap's backing array.
    pub heap_slot: u16,
}

impl Info {
    fn stale() -> Info {
        Info {
            seq: 0,
            distance: f64::INFINITY,
            parent: NO_PARENT,
            heading: Direction::North,
            run_len: 0,
            heap_slot: NOT_IN_HEAP,
        }
    }
}

/// Edge weights for the cost model.
#[derive(Clone, Copy, Debug)]
pub struct CostParams {
    pub cell_cost: f64,
    pub turn_penalty: f64,
    pub straight_discount: f64,
}

impl From<&SolverConfig> for CostParams {
    fn from(config: &SolverConfig) -> CostParams {
        CostParams {
            cell_cost: config.cell_cost,
            turn_penalty: config.turn_penalty,
            straight_discount: config.straight_discount,
        }
    }
}

impl Default for CostParams {
    fn default() -> CostParams {
        CostParams::from(&SolverConfig::default())
    }
}

/// A pluggable solving algorithm: declares its static options once,
/// then drives the mouse through the interface.
pub trait Algorithm {
    fn options(&self) -> StaticOptions;
    fn solve(&mut self, iface: &MouseInterface) -> Result<()>;
}

/// The canonical incremental solver.
pub struct IncrementalSolver {
    width: usize,
    height: usize,
    /// Known-walled edges per cell per direction; unknown edges are
    /// treated as open.
    walls: Vec<[bool; 4]>,
    info: Vec<Info>,
    heap: InfoHeap,
    /// Current planning epoch.
    seq: u32,
    costs: CostParams,
    /// Set when an observation added a wall since the last plan.
    dirty: bool,
}

impl IncrementalSolver {
    pub fn new(width: usize, height: usize, costs: CostParams) -> IncrementalSolver {
        IncrementalSolver {
            width,
            height,
            walls: vec![[false; 4]; width * height],
            info: vec![Info::stale(); width * height],
            heap: InfoHeap::new(),
            seq: 0,
            costs,
            dirty: true,
        }
    }

    fn index(&self, x: usize, y: usize) -> u16 {
        (y * self.width + x) as u16
    }

    fn coords(&self, cell: u16) -> (usize, usize) {
        let cell = cell as usize;
        (cell % self.width, cell / self.width)
    }

    /// Record a walled edge (both sides). Returns true when this is new
    /// knowledge.
    pub fn record_wall(&mut self, x: usize, y: usize, dir: Direction) -> bool {
        let cell = self.index(x, y) as usize;
        let mut added = false;
        if !self.walls[cell][dir.index()] {
            self.walls[cell][dir.index()] = true;
            added = true;
        }
        let (dx, dy) = dir.offset();
        let (nx, ny) = (x as i64 + dx, y as i64 + dy);
        if nx >= 0 && ny >= 0 && (nx as usize) < self.width && (ny as usize) < self.height {
            let neighbor = self.index(nx as usize, ny as usize) as usize;
            if !self.walls[neighbor][dir.opposite().index()] {
                self.walls[neighbor][dir.opposite().index()] = true;
                added = true;
            }
        }
        if added {
            self.dirty = true;
        }
        added
    }

    fn is_walled(&self, x: usize, y: usize, dir: Direction) -> bool {
        // Maze boundary is always walled
        let (dx, dy) = dir.offset();
        let (nx, ny) = (x as i64 + dx, y as i64 + dy);
        if nx < 0 || ny < 0 || nx as usize >= self.width || ny as usize >= self.height {
            return true;
        }
        self.walls[self.index(x, y) as usize][dir.index()]
    }

    /// An unvisited-this-epoch record reads as infinitely distant.
    fn touch(&mut self, cell: u16) -> &mut Info {
        let seq = self.seq;
        let record = &mut self.info[cell as usize];
        if record.seq != seq {
            *record = Info::stale();
            record.seq = seq;
        }
        record
    }

    fn edge_cost(&self, parent: &Info, dir: Direction) -> f64 {
        let mut cost = self.costs.cell_cost;
        if parent.parent == NO_PARENT || dir == parent.heading {
            let run = parent.run_len.min(MAX_DISCOUNT_RUN);
            cost -= self.costs.straight_discount * run as f64;
        } else {
            cost += self.costs.turn_penalty;
        }
        cost
    }

    /// Run one planning epoch from the goal region toward `start`.
    /// Returns the first move to make from `start`, or `None` when
    /// start and goal coincide, or an error when no path exists under
    /// current knowledge.
    pub fn plan(
        &mut self,
        start: (usize, usize),
        goals: &[(usize, usize)],
    ) -> Result<Option<Direction>> {
        if goals.iter().any(|g| *g == start) {
            return Ok(None);
        }
        self.seq = self.seq.wrapping_add(1);
        self.heap.clear();
        let start_cell = self.index(start.0, start.1);

        for &(gx, gy) in goals {
            let cell = self.index(gx, gy);
            let record = self.touch(cell);
            record.distance = 0.0;
            self.heap.push(&mut self.info, cell);
        }

        while let Some(cell) = self.heap.pop(&mut self.info) {
            if cell == start_cell {
                // The chain of parents leads back to the goal; the
                // heading stored on the start cell points from its
                // parent toward the start, so the move is its opposite.
                let dir = self.info[cell as usize].heading.opposite();
                self.dirty = false;
                trace!(
                    distance = self.info[cell as usize].distance,
                    ?dir,
                    "plan finalized at start cell"
                );
                return Ok(Some(dir));
            }
            let (x, y) = self.coords(cell);
            let parent = self.info[cell as usize];
            for dir in Direction::ALL {
                if self.is_walled(x, y, dir) {
                    continue;
                }
                let (dx, dy) = dir.offset();
                let neighbor = self.index((x as i64 + dx) as usize, (y as i64 + dy) as usize);
                let cost = parent.distance + self.edge_cost(&parent, dir);
                let run_len = if parent.parent == NO_PARENT || dir == parent.heading {
                    parent.run_len.saturating_add(1)
                } else {
                    1
                };
                let in_heap;
                {
                    let record = self.touch(neighbor);
                    if cost >= record.distance {
                        continue;
                    }
                    in_heap = record.heap_slot != NOT_IN_HEAP;
                    record.distance = cost;
                    record.parent = cell;
                    record.heading = dir;
                    record.run_len = run_len;
                }
                if in_heap {
                    self.heap.decrease(&mut self.info, neighbor);
                } else {
                    self.heap.push(&mut self.info, neighbor);
                }
            }
        }
        Err(Error::Interface(
            "no path to the goal region under current wall knowledge".to_string(),
        ))
    }

    /// Cost of the best known path from `start` this epoch, for tests
    /// and diagnostics.
    pub fn planned_distance(&self, start: (usize, usize)) -> Option<f64> {
        let record = &self.info[self.index(start.0, start.1) as usize];
        (record.seq == self.seq && record.distance.is_finite()).then_some(record.distance)
    }

    /// Next move along the current epoch's plan from `tile`, without
    /// replanning. `None` when the tile has no finalized record this
    /// epoch (off-plan, or the plan is stale).
    fn next_from(&self, tile: (usize, usize)) -> Option<Direction> {
        let record = &self.info[self.index(tile.0, tile.1) as usize];
        if record.seq == self.seq && record.distance.is_finite() && record.parent != NO_PARENT {
            Some(record.heading.opposite())
        } else {
            None
        }
    }

    /// Query walls around the current cell and fold them into the
    /// private knowledge grid, mirroring them to the declared-wall
    /// display state.
    fn observe(&mut self, iface: &MouseInterface) -> Result<()> {
        let (x, y) = iface.current_tile();
        let facing = iface.current_direction();
        let sides = [
            (facing, iface.wall_front()?),
            (facing.left(), iface.wall_left()?),
            (facing.right(), iface.wall_right()?),
        ];
        for (dir, present) in sides {
            if present {
                self.record_wall(x, y, dir);
            }
            iface.declare_wall(x as i64, y as i64, dir, present)?;
        }
        iface.set_fog(x as i64, y as i64, false)?;
        Ok(())
    }
}

impl Algorithm for IncrementalSolver {
    fn options(&self) -> StaticOptions {
        StaticOptions {
            mouse_file: "default".to_string(),
            mode: InterfaceKind::Discrete,
            heading: HeadingPolicy::Opening,
            text_dimensions: (4, 2),
            wheel_speed_fraction: 1.0,
        }
    }

    /// Plan, take one step, observe, replan. The plan is recomputed
    /// only when an observation actually added a wall.
    fn solve(&mut self, iface: &MouseInterface) -> Result<()> {
        let goals = iface.goal_region();
        info!(?goals, "solver started");
        loop {
            self.observe(iface)?;
            let tile = iface.current_tile();
            if goals.contains(&tile) {
                info!(?tile, "goal region reached");
                return Ok(());
            }
            // Replan only when an observation added a wall or the plan
            // no longer covers this cell; otherwise follow the parent
            // chain from the existing epoch.
            let dir = if self.dirty {
                self.plan(tile, &goals)?
            } else {
                match self.next_from(tile) {
                    Some(dir) => Some(dir),
                    None => self.plan(tile, &goals)?,
                }
            };
            let dir = match dir {
                Some(dir) => dir,
                None => continue,
            };
            if iface.current_direction() != dir {
                if iface.turn_to(dir)? == StepResult::Crashed {
                    return Err(Error::Interface("crashed while turning".to_string()));
                }
            }
            match iface.move_forward()? {
                StepResult::Completed => {
                    debug!(?tile, ?dir, "advanced one cell");
                }
                StepResult::Crashed => {
                    // The edge was not actually open; learn it and try
                    // again from wherever we stopped.
                    let (x, y) = tile;
                    self.record_wall(x, y, dir);
                }
            }
        }
    }
}
