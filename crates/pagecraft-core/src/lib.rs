//! Pagecraft Core Library
//!
//! Platform-agnostic page model for the Pagecraft design engine: scene
//! objects and their bounds, grid snapping, smart guides, alignment,
//! shape masks and multi-page documents.

pub mod align;
pub mod assets;
pub mod batch;
pub mod bounds;
pub mod config;
pub mod error;
pub mod export;
pub mod guides;
pub mod interaction;
pub mod mask;
pub mod pages;
pub mod scene;
pub mod shapes;
pub mod snap;
pub mod storage;

pub use align::{AlignEdge, Axis, DistributeOptions, DistributeOutcome};
pub use assets::{Asset, AssetResolver, DataUriAssets, MemoryAssets};
pub use batch::{BatchJob, BatchRecord, PlaceholderPolicy, apply_record, substitute_placeholders};
pub use bounds::{Edges, bounds_of, bounds_of_group};
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use export::{ExportFormat, ExportSpec, mm_to_px, px_to_mm};
pub use guides::{Guide, GuideEngine};
pub use interaction::{DragSession, ResizeSession, RotateSession};
pub use mask::{ShapeMask, ShapeMaskKind};
pub use pages::{Document, PageId};
pub use scene::SceneGraph;
pub use shapes::{ObjectId, ObjectKind, SceneObject};
pub use snap::{GRID_SIZE, SnapMode, SnapResult, snap_angle, snap_to_grid};
pub use storage::{DocumentStore, FileStore, MemoryStore, StorageError};
