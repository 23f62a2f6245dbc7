//! Flash light effect

use tracing::debug;

/// The light switched on while a flash sequence runs
pub trait FlashLight: Send {
    fn set_active(&mut self, active: bool);

    fn is_active(&self) -> bool;
}

/// Flash with no physical output beyond a log line and a toggle counter
#[derive(Debug, Default)]
pub struct SimulatedFlash {
    active: bool,
    toggles: u64,
}

impl SimulatedFlash {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times the light actually changed state
    #[cfg(test)]
    pub fn toggles(&self) -> u64 {
        self.toggles
    }
}

impl FlashLight for SimulatedFlash {
    fn set_active(&mut self, active: bool) {
        if self.active != active {
            self.toggles += 1;
            debug!(active, toggles = self.toggles, "flash light toggled");
        }
        self.active = active;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}
