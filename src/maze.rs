//! Maze model: directions, ground-truth tiles, and maze-definition loading.
//!
//! The maze is fixed for the lifetime of a run. Wall *ground truth* lives
//! here and never changes after loading; *declared* wall knowledge (what the
//! solving algorithm has revealed) lives in [`crate::view::MazeView`].
//!
//! Coordinates are 0-indexed with the origin at the south-west corner;
//! north is +y, east is +x.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Side length of one maze cell, in meters (center-to-center).
pub const CELL_SIZE: f64 = 0.18;

/// Thickness of a wall, in meters. Walls are bands centered on cell edges.
pub const WALL_WIDTH: f64 = 0.012;

/// The four cardinal directions, in fixed priority order (used for
/// deterministic tie-breaks in the solver).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// All directions in priority order.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Index into per-tile wall arrays.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Direction::North => 0,
            Direction::East => 1,
            Direction::South => 2,
            Direction::West => 3,
        }
    }

    /// The opposite direction.
    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }

    /// 90° counter-clockwise.
    pub fn left(self) -> Direction {
        match self {
            Direction::North => Direction::West,
            Direction::West => Direction::South,
            Direction::South => Direction::East,
            Direction::East => Direction::North,
        }
    }

    /// 90° clockwise.
    pub fn right(self) -> Direction {
        self.left().opposite()
    }

    /// Unit cell offset (dx, dy).
    pub fn offset(self) -> (i64, i64) {
        match self {
            Direction::North => (0, 1),
            Direction::East => (1, 0),
            Direction::South => (0, -1),
            Direction::West => (-1, 0),
        }
    }

    /// Heading angle in radians: east is 0, north is π/2, CCW positive.
    pub fn angle(self) -> f64 {
        match self {
            Direction::East => 0.0,
            Direction::North => std::f64::consts::FRAC_PI_2,
            Direction::West => std::f64::consts::PI,
            Direction::South => -std::f64::consts::FRAC_PI_2,
        }
    }

    /// The cardinal direction nearest to an arbitrary heading angle.
    pub fn nearest(heading: f64) -> Direction {
        let mut best = Direction::North;
        let mut best_diff = f64::MAX;
        for dir in Direction::ALL {
            let diff = crate::world::normalize_angle(heading - dir.angle()).abs();
            if diff < best_diff {
                best_diff = diff;
                best = dir;
            }
        }
        best
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Direction> {
        match s {
            "NORTH" => Ok(Direction::North),
            "EAST" => Ok(Direction::East),
            "SOUTH" => Ok(Direction::South),
            "WEST" => Ok(Direction::West),
            other => Err(Error::Protocol(format!(
                "\"{}\" is not a valid direction",
                other
            ))),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Direction::North => "NORTH",
            Direction::East => "EAST",
            Direction::South => "SOUTH",
            Direction::West => "WEST",
        };
        write!(f, "{}", s)
    }
}

/// One maze cell with its ground-truth walls.
#[derive(Clone, Debug)]
pub struct Tile {
    walls: [bool; 4],
}

impl Tile {
    fn new() -> Self {
        Self { walls: [false; 4] }
    }

    /// Ground-truth wall presence on one edge.
    #[inline]
    pub fn is_wall(&self, dir: Direction) -> bool {
        self.walls[dir.index()]
    }

    fn set_wall(&mut self, dir: Direction, is_wall: bool) {
        self.walls[dir.index()] = is_wall;
    }
}

/// Static maze: fixed dimensions, immutable wall ground truth.
#[derive(Clone, Debug)]
pub struct Maze {
    width: usize,
    height: usize,
    tiles: Vec<Tile>,
}

impl Maze {
    /// Build a maze with only the outer boundary walled.
    pub fn open(width: usize, height: usize) -> Maze {
        let mut tiles = vec![Tile::new(); width * height];
        for y in 0..height {
            for x in 0..width {
                let tile = &mut tiles[y * width + x];
                if y == height - 1 {
                    tile.set_wall(Direction::North, true);
                }
                if y == 0 {
                    tile.set_wall(Direction::South, true);
                }
                if x == width - 1 {
                    tile.set_wall(Direction::East, true);
                }
                if x == 0 {
                    tile.set_wall(Direction::West, true);
                }
            }
        }
        Maze {
            width,
            height,
            tiles,
        }
    }

    /// Load a maze-definition file: one line per tile, `x y n e s w` with
    /// 0/1 wall flags, whitespace-separated.
    pub fn load(path: &Path) -> Result<Maze> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Maze(format!("failed to read {:?}: {}", path, e)))?;
        Maze::from_lines(&content)
    }

    /// Parse the maze-definition format from a string.
    pub fn from_lines(content: &str) -> Result<Maze> {
        let mut entries: Vec<(usize, usize, [bool; 4])> = Vec::new();
        let mut width = 0usize;
        let mut height = 0usize;

        for (num, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() != 6 {
                return Err(Error::Maze(format!(
                    "line {}: expected 6 fields, got {}",
                    num + 1,
                    fields.len()
                )));
            }
            let x: usize = fields[0]
                .parse()
                .map_err(|_| Error::Maze(format!("line {}: bad x \"{}\"", num + 1, fields[0])))?;
            let y: usize = fields[1]
                .parse()
                .map_err(|_| Error::Maze(format!("line {}: bad y \"{}\"", num + 1, fields[1])))?;
            let mut walls = [false; 4];
            for (i, field) in fields[2..].iter().enumerate() {
                walls[i] = match *field {
                    "0" => false,
                    "1" => true,
                    other => {
                        return Err(Error::Maze(format!(
                            "line {}: bad wall flag \"{}\"",
                            num + 1,
                            other
                        )));
                    }
                };
            }
            width = width.max(x + 1);
            height = height.max(y + 1);
            entries.push((x, y, walls));
        }

        if entries.is_empty() {
            return Err(Error::Maze("empty maze definition".to_string()));
        }
        if entries.len() != width * height {
            return Err(Error::Maze(format!(
                "expected {} tiles for a {}x{} maze, got {}",
                width * height,
                width,
                height,
                entries.len()
            )));
        }

        let mut tiles = vec![Tile::new(); width * height];
        for (x, y, walls) in entries {
            for dir in Direction::ALL {
                tiles[y * width + x].set_wall(dir, walls[dir.index()]);
            }
        }

        let maze = Maze {
            width,
            height,
            tiles,
        };
        maze.validate()?;
        Ok(maze)
    }

    /// Check shared-edge consistency and the enclosing boundary.
    fn validate(&self) -> Result<()> {
        for y in 0..self.height {
            for x in 0..self.width {
                for dir in Direction::ALL {
                    let (dx, dy) = dir.offset();
                    let nx = x as i64 + dx;
                    let ny = y as i64 + dy;
                    if self.in_bounds(nx, ny) {
                        let neighbor = self.is_wall(nx as usize, ny as usize, dir.opposite());
                        if self.is_wall(x, y, dir) != neighbor {
                            return Err(Error::Maze(format!(
                                "inconsistent shared edge at ({}, {}) {}",
                                x, y, dir
                            )));
                        }
                    } else if !self.is_wall(x, y, dir) {
                        return Err(Error::Maze(format!(
                            "missing boundary wall at ({}, {}) {}",
                            x, y, dir
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Maze width in cells.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Maze height in cells.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Whether cell coordinates fall inside the maze.
    #[inline]
    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Ground-truth wall presence at a cell edge.
    #[inline]
    pub fn is_wall(&self, x: usize, y: usize, dir: Direction) -> bool {
        self.tiles[y * self.width + x].is_wall(dir)
    }

    /// World coordinates of a cell center.
    pub fn cell_center(x: i64, y: i64) -> (f64, f64) {
        (
            (x as f64 + 0.5) * CELL_SIZE,
            (y as f64 + 0.5) * CELL_SIZE,
        )
    }

    /// The cell containing a world point, clamped to the maze.
    pub fn cell_of(&self, px: f64, py: f64) -> (usize, usize) {
        let ix = ((px / CELL_SIZE).floor() as i64).clamp(0, self.width as i64 - 1);
        let iy = ((py / CELL_SIZE).floor() as i64).clamp(0, self.height as i64 - 1);
        (ix as usize, iy as usize)
    }

    /// Whether a world point lies inside wall geometry (or outside the maze).
    ///
    /// Walls are bands of [`WALL_WIDTH`] centered on walled cell edges.
    /// Shared-edge consistency guarantees the half-band on the neighbor's
    /// side is covered when the point falls in the neighbor tile.
    pub fn point_in_wall(&self, px: f64, py: f64) -> bool {
        if px < 0.0
            || py < 0.0
            || px > self.width as f64 * CELL_SIZE
            || py > self.height as f64 * CELL_SIZE
        {
            return true;
        }
        let (ix, iy) = self.cell_of(px, py);
        let lx = px - ix as f64 * CELL_SIZE;
        let ly = py - iy as f64 * CELL_SIZE;
        let half = WALL_WIDTH / 2.0;

        (self.is_wall(ix, iy, Direction::North) && CELL_SIZE - ly <= half)
            || (self.is_wall(ix, iy, Direction::South) && ly <= half)
            || (self.is_wall(ix, iy, Direction::East) && CELL_SIZE - lx <= half)
            || (self.is_wall(ix, iy, Direction::West) && lx <= half)
    }

    /// Require cell coordinates inside the maze.
    pub fn check_bounds(&self, x: i64, y: i64) -> Result<()> {
        if self.in_bounds(x, y) {
            Ok(())
        } else {
            Err(Error::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            })
        }
    }

    /// The goal region: the center cell(s) of the maze (one, two, or four
    /// cells depending on dimension parity).
    pub fn goal_region(&self) -> Vec<(usize, usize)> {
        let xs = if self.width % 2 == 0 {
            vec![self.width / 2 - 1, self.width / 2]
        } else {
            vec![self.width / 2]
        };
        let ys = if self.height % 2 == 0 {
            vec![self.height / 2 - 1, self.height / 2]
        } else {
            vec![self.height / 2]
        };
        let mut cells = Vec::new();
        for &y in &ys {
            for &x in &xs {
                cells.push((x, y));
            }
        }
        cells
    }
}
