//! Error types for Mooshak

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Mooshak error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error (bad config file, invalid static option,
    /// unknown algorithm name, incompatible mouse definition)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Maze definition error (parse failure, inconsistent shared edge,
    /// missing boundary wall)
    #[error("Maze error: {0}")]
    Maze(String),

    /// Mouse definition error
    #[error("Mouse error: {0}")]
    Mouse(String),

    /// Control interface misuse (wrong mode, unknown wheel/sensor name)
    #[error("Interface error: {0}")]
    Interface(String),

    /// Malformed or unrecognized protocol command
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// External algorithm failed to build; captured compiler output follows
    #[error("Algorithm build failed:\n{0}")]
    Build(String),

    /// A discrete step was submitted while another was outstanding
    #[error("Step rejected: another step is already pending")]
    StepPending,

    /// Cell coordinates outside the maze
    #[error("Out of bounds: ({x}, {y}) not within {width}x{height} maze")]
    OutOfBounds {
        /// Requested x coordinate
        x: i64,
        /// Requested y coordinate
        y: i64,
        /// Maze width in cells
        width: usize,
        /// Maze height in cells
        height: usize,
    },
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}
