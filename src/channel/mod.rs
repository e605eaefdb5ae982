//! Process-boundary algorithm execution.
//!
//! An external algorithm is located by name under the algorithms
//! directory, built from its entry file, and launched as a child
//! process. Its stderr carries protocol commands, its stdin carries
//! responses, and its stdout is passed through to the log untouched.
//!
//! Three dedicated threads keep the roles separate: a reader that only
//! frames lines, a worker that only interprets protocol semantics, and
//! a writer that only serializes responses. Bounded channels connect
//! them so ordering and backpressure are explicit.

mod framing;
mod protocol;

pub use protocol::{ChannelStatus, SharedStatus};

use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use tracing::{error, info, warn};

use crate::config::SimConfig;
use crate::error::{Error, Result};
use crate::view::SharedView;
use crate::world::World;

use framing::LineFramer;
use protocol::CommandProcessor;

/// Commands in flight between reader and worker.
const COMMAND_QUEUE_DEPTH: usize = 64;

/// Find the entry file for a named algorithm.
pub fn locate_entry(algorithms_dir: &Path, name: &str) -> Result<PathBuf> {
    let dir = algorithms_dir.join(name);
    if !dir.is_dir() {
        return Err(Error::Config(format!(
            "unknown algorithm \"{}\" (no directory {})",
            name,
            dir.display()
        )));
    }
    let entry = dir.join("main.rs");
    if !entry.is_file() {
        return Err(Error::Config(format!(
            "algorithm \"{}\" has no entry file {}",
            name,
            entry.display()
        )));
    }
    Ok(entry)
}

/// Compile an algorithm's entry file into a binary under `out_dir`.
/// The compiler's diagnostic output is surfaced verbatim on failure.
pub fn build_algorithm(entry: &Path, name: &str, out_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(out_dir)?;
    let binary = out_dir.join(name);
    info!(entry = %entry.display(), "building algorithm");
    let output = Command::new("rustc")
        .arg("-O")
        .arg("-o")
        .arg(&binary)
        .arg(entry)
        .output()?;
    if !output.status.success() {
        return Err(Error::Build(String::from_utf8_lossy(&output.stderr).into_owned()));
    }
    Ok(binary)
}

/// A launched external algorithm plus the threads bridging it to the
/// control interface.
pub struct AlgorithmChannel {
    child: Child,
    threads: Vec<JoinHandle<()>>,
    status: SharedStatus,
}

impl AlgorithmChannel {
    /// Spawn the algorithm binary and wire its streams to the protocol
    /// threads.
    pub fn launch(
        binary: &Path,
        world: World,
        view: SharedView,
        mice_dir: PathBuf,
    ) -> Result<AlgorithmChannel> {
        let mut child = Command::new(binary)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        info!(binary = %binary.display(), pid = child.id(), "algorithm launched");

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Interface("child stdin not captured".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Interface("child stdout not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::Interface("child stderr not captured".to_string()))?;

        let status: SharedStatus = Arc::new(Mutex::new(ChannelStatus::AwaitingOptions));
        let (command_tx, command_rx) = bounded::<String>(COMMAND_QUEUE_DEPTH);
        let (response_tx, response_rx) = bounded::<String>(COMMAND_QUEUE_DEPTH);

        let mut threads = Vec::new();
        let reader_world = world.clone();
        threads.push(
            thread::Builder::new()
                .name("algo-reader".to_string())
                .spawn(move || reader_loop(stderr, command_tx, reader_world))?,
        );
        let processor = CommandProcessor::new(world, view, mice_dir, status.clone());
        threads.push(
            thread::Builder::new()
                .name("algo-worker".to_string())
                .spawn(move || worker_loop(command_rx, response_tx, processor))?,
        );
        threads.push(
            thread::Builder::new()
                .name("algo-writer".to_string())
                .spawn(move || writer_loop(response_rx, stdin))?,
        );
        threads.push(
            thread::Builder::new()
                .name("algo-stdout".to_string())
                .spawn(move || stdout_loop(stdout))?,
        );

        Ok(AlgorithmChannel {
            child,
            threads,
            status,
        })
    }

    /// Block until the algorithm's static options are validated.
    /// Cooperative polling: the main loop has not started yet, so this
    /// simply yields between checks.
    pub fn wait_configured(&mut self) -> Result<()> {
        loop {
            match &*self.status.lock() {
                ChannelStatus::Configured => return Ok(()),
                ChannelStatus::Failed(msg) => return Err(Error::Config(msg.clone())),
                ChannelStatus::AwaitingOptions => {}
            }
            if let Some(code) = self.child.try_wait()? {
                return Err(Error::Config(format!(
                    "algorithm exited ({}) before declaring static options",
                    code
                )));
            }
            thread::sleep(Duration::from_millis(1));
        }
    }

    /// Wait for the child to exit and the bridge threads to drain.
    pub fn join(mut self) {
        match self.child.wait() {
            Ok(code) => info!(%code, "algorithm exited"),
            Err(e) => error!(error = %e, "waiting for algorithm"),
        }
        for handle in std::mem::take(&mut self.threads) {
            let _ = handle.join();
        }
    }
}

impl Drop for AlgorithmChannel {
    /// Fatal configuration paths abandon the channel early; take the
    /// child process down with it instead of orphaning it.
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            warn!(pid = self.child.id(), "killing algorithm process");
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// Frame lines from the child's diagnostic stream and hand them to the
/// worker. EOF means the algorithm is gone: shut the world down.
fn reader_loop(mut stderr: impl Read, command_tx: Sender<String>, world: World) {
    let mut framer = LineFramer::new();
    let mut buf = [0u8; 4096];
    loop {
        match stderr.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                for line in framer.push(&buf[..n]) {
                    if command_tx.send(line).is_err() {
                        return;
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "reading algorithm stream");
                break;
            }
        }
    }
    info!("algorithm stream closed");
    world.shutdown();
}

/// Interpret commands strictly in arrival order.
fn worker_loop(
    command_rx: Receiver<String>,
    response_tx: Sender<String>,
    mut processor: CommandProcessor,
) {
    for line in command_rx {
        if let Some(response) = processor.process(&line) {
            if response_tx.send(response).is_err() {
                break;
            }
        }
    }
}

/// Serialize responses back to the child's stdin, one per line.
fn writer_loop(response_rx: Receiver<String>, mut stdin: impl Write) {
    for response in response_rx {
        if stdin
            .write_all(response.as_bytes())
            .and_then(|_| stdin.write_all(b"\n"))
            .and_then(|_| stdin.flush())
            .is_err()
        {
            break;
        }
    }
}

/// Pass the child's ordinary output through for display, unparsed.
fn stdout_loop(stdout: impl Read) {
    for line in BufReader::new(stdout).lines() {
        match line {
            Ok(line) => info!(target: "algo", "{}", line),
            Err(_) => break,
        }
    }
}

/// Locate, build, and launch the externally named algorithm from the
/// configuration. Any failure here is fatal to the run.
pub fn run_external(
    config: &SimConfig,
    world: World,
    view: SharedView,
) -> Result<AlgorithmChannel> {
    let name = config
        .algorithm
        .name
        .as_deref()
        .ok_or_else(|| Error::Config("no external algorithm configured".to_string()))?;
    let entry = locate_entry(&config.algorithm.algorithms_dir, name)?;
    let binary = build_algorithm(&entry, name, &config.algorithm.algorithms_dir.join("build"))?;
    let mut channel = AlgorithmChannel::launch(
        &binary,
        world,
        view,
        config.algorithm.mice_dir.clone(),
    )?;
    channel.wait_configured()?;
    Ok(channel)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_algorithm_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = locate_entry(dir.path(), "missing").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn missing_entry_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("empty")).unwrap();
        let err = locate_entry(dir.path(), "empty").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("entry file"));
    }
}
