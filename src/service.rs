//! The processing-service collaborator: a fixed request/response contract
//! consumed as an opaque remote call.
//!
//! The engine never looks inside quantization, outline vectorization, or
//! yardage math; it forwards settings and merges whatever comes back. Image
//! payloads cross this boundary as encoded PNG bytes; the transport layer
//! owns any base64 framing on the actual wire.

use crate::{
    error::TuftResult,
    model::{ProcessedResult, Project, Unit},
    store::{ProcessingStatus, Store},
};

/// Request mirror of the service's `/api/process` schema.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    pub image: Vec<u8>,
    pub width: f64,
    pub height: f64,
    pub unit: Unit,
    pub palette_size: u32,
    pub min_thickness: f64,
    pub region_threshold: f64,
    pub use_yarn_palette: bool,
}

impl ProcessRequest {
    pub fn from_project(project: &Project) -> Self {
        let s = &project.settings;
        Self {
            image: project.original_image.clone(),
            width: s.width,
            height: s.height,
            unit: s.unit,
            palette_size: s.palette_size,
            min_thickness: s.min_thickness,
            region_threshold: s.region_threshold,
            use_yarn_palette: s.use_yarn_palette,
        }
    }
}

/// External quantization/vectorization service. Implementations wrap the
/// actual transport (HTTP client, test double, ...).
pub trait ProcessingService {
    fn process(&self, request: &ProcessRequest) -> TuftResult<ProcessedResult>;
}

/// Drive one processing round-trip and reflect its outcome in the store.
///
/// Status transitions: `Processing` while the call is out, then either an
/// atomic result install (`Done`) or `Error` with the failure message. On
/// failure the prior project state, including any previous processed result,
/// is retained unchanged so the user can retry.
#[tracing::instrument(skip_all)]
pub fn run_processing(store: &mut Store, service: &dyn ProcessingService) {
    let Some(project) = store.project() else {
        return;
    };
    let request = ProcessRequest::from_project(project);

    store.set_processing_status(ProcessingStatus::Processing, None);
    match service.process(&request) {
        Ok(result) => store.set_processed_result(result),
        Err(e) => {
            tracing::warn!(error = %e, "processing call failed");
            store.set_processing_status(ProcessingStatus::Error, Some(e.to_string()));
        }
    }
}
