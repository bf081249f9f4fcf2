//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! discovery / history / routing produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters via the `metrics` facade)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → whatever metrics recorder the host process installs
//! ```
//!
//! # Design Decisions
//! - No recorder is installed here; without one the counters are no-ops
//! - Log level comes from `RUST_LOG` first, then configuration

pub mod logging;
pub mod metrics;
