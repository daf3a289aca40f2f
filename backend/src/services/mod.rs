//! Service layer: explorer state and the operations on it.
//!
//! Sits between the HTTP layer and the remote backend. [`session`] owns the
//! application state; the other modules are the pieces it orchestrates.

pub mod analysis;
pub mod aoi;
pub mod chart;
pub mod conditions;
pub mod error;
pub mod overlay_loader;
pub mod overlay_map;
pub mod pixel;
pub mod results;
pub mod session;
pub mod status;

pub use analysis::{AnalysisInput, AnalysisOutcome, AnalysisRecord, AnalysisReport};
pub use aoi::{ActiveAoi, AoiSource, ParcelMatch};
pub use chart::{ChartData, ChartDataset, ChartTab};
pub use conditions::{evaluate, Condition, ConditionClass};
pub use error::{ExplorerError, ExplorerResult, PreconditionError};
pub use overlay_loader::{BatchStatus, BatchSummary, ItemOutcome, OverlayBatchOutcome};
pub use overlay_map::{OverlayLayer, OverlayMap};
pub use pixel::{PixelReading, PixelReport};
pub use results::{MissingDataWarning, ResultsView, SummaryTile};
pub use session::{ExplorerSession, SessionSnapshot};
pub use status::{ProgressSink, StatusEntry, StatusKind, StatusSnapshot, StatusTracker};
