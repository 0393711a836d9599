pub mod address;
pub mod identity;
pub mod logging;

pub use tracing;

/// Cooperative stop signal broadcast to every background worker.
#[derive(Debug, Clone, Copy)]
pub enum Signal {
    Shutdown,
}
