//! Ownership and state of the panel for the life of the process.
//!
//! The panel moves through `Initialized → Cleared → Displaying → Asleep`.
//! A [`PanelHandle`] is shared between the refresh loop and the termination
//! listener; the mutex inside it serializes a shutdown against an in-flight
//! frame write, so a signal arriving mid-refresh waits for that write to
//! finish before the panel is put to sleep.

use crate::config::ConfigError;
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use std::error::Error as StdError;
use std::fs;
use std::io;
use std::os::raw::c_int;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use thiserror::Error;
use tracing::{error, info};
use trmnl_convert::{PackedFrame, PanelGeometry};
use trmnl_epd::Panel;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PanelState {
    Initialized,
    Cleared,
    Displaying,
    Asleep,
}

#[derive(Debug, Error)]
pub enum PanelError {
    #[error("panel is asleep")]
    Asleep,
    #[error(transparent)]
    Device(Box<dyn StdError + Send + Sync>),
}

/// Startup failures that end the process with status 1.
#[derive(Debug, Error)]
pub enum FatalError {
    #[error("Failed to initialize e-ink display: {0}")]
    PanelInit(#[source] Box<dyn StdError + Send + Sync>),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("error reading API Key: {0}")]
    ApiKey(#[source] io::Error),
    #[error("error creating working directory: {0}")]
    Workdir(#[source] io::Error),
    #[error("error installing signal handler: {0}")]
    Signals(#[source] io::Error),
}

struct PanelCell<P> {
    panel: P,
    state: PanelState,
}

/// Shared, synchronized access to an initialized panel.
pub struct PanelHandle<P> {
    inner: Arc<Mutex<PanelCell<P>>>,
}

impl<P> Clone for PanelHandle<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: Panel> PanelHandle<P> {
    /// Take ownership of a panel that has just been initialized.
    pub fn new(panel: P) -> Self {
        Self {
            inner: Arc::new(Mutex::new(PanelCell {
                panel,
                state: PanelState::Initialized,
            })),
        }
    }

    // A panic during a cycle can poison the lock; the panel is still usable.
    fn lock(&self) -> MutexGuard<'_, PanelCell<P>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> PanelState {
        self.lock().state
    }

    pub fn geometry(&self) -> PanelGeometry {
        self.lock().panel.geometry()
    }

    /// Best effort: a failed clear is logged and the panel is assumed usable.
    pub fn clear(&self, fill: u8) {
        let mut cell = self.lock();
        if cell.state == PanelState::Asleep {
            return;
        }
        info!("Clearing e-ink display...");
        if let Err(err) = cell.panel.clear(fill) {
            error!("Error clearing display: {err}");
        }
        cell.state = PanelState::Cleared;
    }

    pub fn write_frame(&self, frame: &PackedFrame) -> Result<(), PanelError> {
        let mut cell = self.lock();
        if cell.state == PanelState::Asleep {
            return Err(PanelError::Asleep);
        }
        cell.panel
            .write_frame(frame)
            .map_err(|err| PanelError::Device(Box::new(err)))?;
        cell.state = PanelState::Displaying;
        Ok(())
    }

    /// Put the panel into deep sleep. Only the first call talks to the panel.
    pub fn sleep(&self) {
        let mut cell = self.lock();
        if cell.state == PanelState::Asleep {
            return;
        }
        match cell.panel.sleep() {
            Ok(()) => info!("e-ink display put to sleep"),
            Err(err) => error!("Error putting display to sleep: {err}"),
        }
        cell.state = PanelState::Asleep;
    }
}

/// Sleeps the panel when dropped, covering early returns out of `main`.
pub struct SleepOnDrop<P: Panel>(pub PanelHandle<P>);

impl<P: Panel> Drop for SleepOnDrop<P> {
    fn drop(&mut self) {
        self.0.sleep();
    }
}

/// The termination path: panel to sleep, scratch files removed.
pub fn shutdown<P: Panel>(panel: &PanelHandle<P>, workdir: Option<&Path>) {
    panel.sleep();
    if let Some(dir) = workdir {
        if let Err(err) = fs::remove_dir_all(dir) {
            if err.kind() != io::ErrorKind::NotFound {
                error!("Error removing {}: {err}", dir.display());
            }
        }
    }
}

/// SIGINT, SIGTERM and SIGHUP, captured from the moment of [`install`].
///
/// Signals that arrive before [`spawn`] are queued rather than killing the
/// process, so installing this ahead of panel initialization leaves no window
/// in which a termination skips the panel sleep.
///
/// [`install`]: ShutdownListener::install
/// [`spawn`]: ShutdownListener::spawn
pub struct ShutdownListener {
    signals: Signals,
}

impl ShutdownListener {
    pub fn install() -> io::Result<Self> {
        let signals = Signals::new([SIGINT, SIGTERM, SIGHUP])?;
        Ok(Self { signals })
    }

    /// Run `on_signal` on a dedicated thread for the first signal received.
    pub fn spawn<F>(mut self, on_signal: F) -> io::Result<JoinHandle<()>>
    where
        F: FnOnce(c_int) + Send + 'static,
    {
        thread::Builder::new()
            .name("shutdown".to_string())
            .spawn(move || {
                if let Some(signal) = self.signals.forever().next() {
                    info!("Received termination signal {signal}. Cleaning up...");
                    on_signal(signal);
                }
            })
    }

    /// The daemon's handler: [`shutdown`], then exit with status 0.
    pub fn spawn_panel_shutdown<P>(self, panel: PanelHandle<P>, workdir: PathBuf) -> io::Result<JoinHandle<()>>
    where
        P: Panel + Send + 'static,
    {
        self.spawn(move |_| {
            shutdown(&panel, Some(workdir.as_path()));
            process::exit(0);
        })
    }
}
