//! Keeping the wrapper alive through terminal interrupts while jbang runs.
//!
//! Ctrl-C and Ctrl-\ go to the whole foreground process group, so jbang
//! receives them itself. The wrapper only has to survive them and report
//! whatever status jbang ends with.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(unix)]
use signal_hook::SigId;
#[cfg(unix)]
use signal_hook::consts::signal::{SIGINT, SIGQUIT};

/// Catches SIGINT and SIGQUIT until dropped.
///
/// Caught signals reset to their default action across `exec`, so a child
/// spawned while the guard is held still dies on Ctrl-C unless it traps it.
pub struct InterruptGuard {
    received: Arc<AtomicBool>,
    #[cfg(unix)]
    ids: Vec<SigId>,
}

impl InterruptGuard {
    /// Install the handlers.
    ///
    /// # Errors
    ///
    /// Returns the error from registering a handler. Handlers registered
    /// before the failure are removed again.
    pub fn install() -> io::Result<Self> {
        #[cfg(unix)]
        {
            let mut guard = Self {
                received: Arc::new(AtomicBool::new(false)),
                ids: Vec::new(),
            };
            for signal in [SIGINT, SIGQUIT] {
                let id = signal_hook::flag::register(signal, Arc::clone(&guard.received))?;
                guard.ids.push(id);
            }
            return Ok(guard);
        }

        #[cfg(not(unix))]
        {
            Ok(Self {
                received: Arc::new(AtomicBool::new(false)),
            })
        }
    }

    /// Whether an interrupt arrived while the guard was held.
    #[must_use]
    pub fn interrupted(&self) -> bool {
        self.received.load(Ordering::Relaxed)
    }
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        #[cfg(unix)]
        {
            for id in self.ids.drain(..) {
                signal_hook::low_level::unregister(id);
            }
        }
    }
}
