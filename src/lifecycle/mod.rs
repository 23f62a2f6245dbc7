//! Process lifecycle: shutdown signalling and the shared service registry

mod registry;
mod shutdown;

pub use registry::Registry;
pub use shutdown::{ShutdownHandle, ShutdownSignal};
