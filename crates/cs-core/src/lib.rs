//! Cotizador Ship core: release pipeline and installer lifecycle.
//!
//! Two entry points share this crate:
//! - The release builder turns a freshly built application tree into a
//!   versioned differential update package plus a published manifest.
//! - The installer state machine detects prior installations, reconciles
//!   user configuration across upgrades, and safely replaces on-disk files.
//!
//! Both are single-threaded, sequential state machines; the only
//! concurrency-adjacent behavior is bounded retry with backoff around
//! filesystem operations that external processes may transiently lock.

pub mod exit_codes;
pub mod fsops;
pub mod installer;
pub mod logging;
pub mod release;
