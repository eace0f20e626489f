//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request handling produces:
//!     → logging.rs (access log line, rejection warnings)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (always), access.log (production)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, record_access, LogSink};
