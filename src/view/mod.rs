//! Screen controllers and the state plumbing they share.

pub mod dashboard;
pub mod predictions;
pub mod refresh;
pub mod source;
pub mod visibility;

#[cfg(test)]
pub(crate) mod mock;

pub use dashboard::DashboardController;
pub use predictions::PredictionsController;
pub use source::{Panel, SourceState};
