//! Detection filtering and selection engine for the speed-camera dashboard.
//!
//! The crate holds the client-side state of the detections gallery: the last
//! fetched detection list, the filter criteria applied to it, and the set of
//! rows picked for bulk deletion. Transport is abstracted behind the
//! [`DetectionSource`] and [`DeleteSink`] traits so the engine stays free of
//! any HTTP or UI dependency.

pub mod board;
pub mod bulk;
pub mod detection;
pub mod prelude;
pub mod session;
pub mod telemetry;

pub use board::DetectionBoard;
pub use prelude::{DashboardError, DashboardResult, DeleteSink, DetectionSource};
pub use session::DashboardSession;
