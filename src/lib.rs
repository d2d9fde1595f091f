#![forbid(unsafe_code)]

pub mod classify;
pub mod color;
pub mod compose;
pub mod error;
pub mod export;
pub mod model;
pub mod outline;
pub mod persist;
pub mod raster;
pub mod service;
pub mod store;
pub mod surface;

pub use color::{MASK_TOLERANCE, RECOLOR_TOLERANCE, Rgb, SOLO_DIM_FACTOR, matches};
pub use compose::{EditView, ProjectionView, render_edit_view, render_projection_view};
pub use error::{TuftError, TuftResult};
pub use model::{
    ColorLayer, PaletteColor, ProcessedResult, Project, ProjectSettings, SettingsPatch, Unit,
    YarnEstimate,
};
pub use persist::{FsStorage, MemStorage, SNAPSHOT_KEY, Snapshot, StorageBackend};
pub use service::{ProcessRequest, ProcessingService, run_processing};
pub use store::{ProcessingStatus, RecolorJob, Store, UiState, Viewport};
pub use surface::Surface;
