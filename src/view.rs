//! Renderer-facing maze state: declared walls, fog, color, and text.
//!
//! This state is what a visualization layer reads to draw the maze. It is
//! owned separately from the physics engine because it never affects the
//! physical simulation; the control interface writes it directly without
//! taking the world lock.

use std::sync::{Arc, RwLock};

use crate::error::Result;
use crate::maze::{Direction, Maze};

/// Default tile color code (renderer palette key).
pub const DEFAULT_COLOR: char = 'k';

/// Per-tile display state.
#[derive(Clone, Debug)]
pub struct TileDecor {
    /// Declared wall knowledge per direction. `None` means undeclared
    /// (renders as unexplored), distinct from declared-absent.
    pub declared_walls: [Option<bool>; 4],
    /// Fog of war flag; tiles start foggy.
    pub foggy: bool,
    /// Display color code.
    pub color: char,
    /// Display text.
    pub text: String,
}

impl Default for TileDecor {
    fn default() -> Self {
        Self {
            declared_walls: [None; 4],
            foggy: true,
            color: DEFAULT_COLOR,
            text: String::new(),
        }
    }
}

/// Mutable display state for the whole maze, plus the renderer
/// notification surface.
pub struct MazeView {
    width: usize,
    height: usize,
    decor: Vec<TileDecor>,
    /// Last window size passed through from the windowing layer,
    /// stored without interpretation.
    window_size: Option<(u32, u32)>,
}

impl MazeView {
    /// Create the view for a maze of the given dimensions, fully fogged.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            decor: vec![TileDecor::default(); width * height],
            window_size: None,
        }
    }

    /// View width in cells.
    pub fn width(&self) -> usize {
        self.width
    }

    /// View height in cells.
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// Read-only decor for one tile.
    pub fn tile(&self, x: usize, y: usize) -> &TileDecor {
        &self.decor[self.index(x, y)]
    }

    /// Set a tile's display color.
    pub fn set_color(&mut self, x: usize, y: usize, color: char) {
        let i = self.index(x, y);
        self.decor[i].color = color;
    }

    /// Set a tile's display text.
    pub fn set_text(&mut self, x: usize, y: usize, text: String) {
        let i = self.index(x, y);
        self.decor[i].text = text;
    }

    /// Set or clear a tile's fog.
    pub fn set_fog(&mut self, x: usize, y: usize, foggy: bool) {
        let i = self.index(x, y);
        self.decor[i].foggy = foggy;
    }

    /// Declare wall presence on a tile edge. Declaring an edge is
    /// equivalent to declaring the corresponding edge of the neighbor, so
    /// the shared edge is mirrored when the neighbor exists.
    pub fn declare_wall(&mut self, x: usize, y: usize, dir: Direction, is_wall: bool) {
        let i = self.index(x, y);
        self.decor[i].declared_walls[dir.index()] = Some(is_wall);
        if let Some((nx, ny)) = self.neighbor(x, y, dir) {
            let j = self.index(nx, ny);
            self.decor[j].declared_walls[dir.opposite().index()] = Some(is_wall);
        }
    }

    /// Return an edge (and its mirror) to the undeclared state.
    pub fn undeclare_wall(&mut self, x: usize, y: usize, dir: Direction) {
        let i = self.index(x, y);
        self.decor[i].declared_walls[dir.index()] = None;
        if let Some((nx, ny)) = self.neighbor(x, y, dir) {
            let j = self.index(nx, ny);
            self.decor[j].declared_walls[dir.opposite().index()] = None;
        }
    }

    /// Whether an edge has been declared (either present or absent).
    pub fn wall_declared(&self, x: usize, y: usize, dir: Direction) -> bool {
        self.decor[self.index(x, y)].declared_walls[dir.index()].is_some()
    }

    fn neighbor(&self, x: usize, y: usize, dir: Direction) -> Option<(usize, usize)> {
        let (dx, dy) = dir.offset();
        let nx = x as i64 + dx;
        let ny = y as i64 + dy;
        if nx >= 0 && ny >= 0 && (nx as usize) < self.width && (ny as usize) < self.height {
            Some((nx as usize, ny as usize))
        } else {
            None
        }
    }

    /// Window-resize passthrough from the windowing layer.
    pub fn set_window_size(&mut self, width: u32, height: u32) {
        self.window_size = Some((width, height));
    }

    /// Last window size seen, if any.
    pub fn window_size(&self) -> Option<(u32, u32)> {
        self.window_size
    }
}

/// Thread-safe shared view handle.
pub type SharedView = Arc<RwLock<MazeView>>;

/// Create a shared view sized for a maze.
pub fn shared_view(maze: &Maze) -> SharedView {
    Arc::new(RwLock::new(MazeView::new(maze.width(), maze.height())))
}

/// Helper for callers holding a [`SharedView`]: run a closure under the
/// write lock, mapping poisoning into an interface error.
pub fn with_view_mut<R>(view: &SharedView, f: impl FnOnce(&mut MazeView) -> R) -> Result<R> {
    let mut guard = view
        .write()
        .map_err(|e| crate::error::Error::Interface(format!("view lock poisoned: {}", e)))?;
    Ok(f(&mut guard))
}

/// Run a closure under the read lock.
pub fn with_view<R>(view: &SharedView, f: impl FnOnce(&MazeView) -> R) -> Result<R> {
    let guard = view
        .read()
        .map_err(|e| crate::error::Error::Interface(format!("view lock poisoned: {}", e)))?;
    Ok(f(&guard))
}
