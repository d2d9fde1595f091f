use crate::{
    color::Rgb,
    error::{TuftError, TuftResult},
};

/// Physical unit for the target pattern dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Unit {
    #[serde(rename = "in")]
    In,
    #[serde(rename = "cm")]
    Cm,
}

/// Pre-processing parameters forwarded opaquely to the processing service.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSettings {
    pub width: f64,
    pub height: f64,
    pub unit: Unit,
    pub palette_size: u32,
    /// Minimum feature thickness, physical units.
    pub min_thickness: f64,
    /// Region cleanup threshold, fraction of total area in 0..1.
    pub region_threshold: f64,
    pub use_yarn_palette: bool,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            width: 12.0,
            height: 12.0,
            unit: Unit::In,
            palette_size: 8,
            min_thickness: 5.0,
            region_threshold: 0.005,
            use_yarn_palette: true,
        }
    }
}

/// Partial settings update; `None` fields are left unchanged.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub unit: Option<Unit>,
    pub palette_size: Option<u32>,
    pub min_thickness: Option<f64>,
    pub region_threshold: Option<f64>,
    pub use_yarn_palette: Option<bool>,
}

impl ProjectSettings {
    pub fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(v) = patch.width {
            self.width = v;
        }
        if let Some(v) = patch.height {
            self.height = v;
        }
        if let Some(v) = patch.unit {
            self.unit = v;
        }
        if let Some(v) = patch.palette_size {
            self.palette_size = v;
        }
        if let Some(v) = patch.min_thickness {
            self.min_thickness = v;
        }
        if let Some(v) = patch.region_threshold {
            self.region_threshold = v;
        }
        if let Some(v) = patch.use_yarn_palette {
            self.use_yarn_palette = v;
        }
    }
}

/// One quantized palette entry.
///
/// The identifier is stable for the life of the project: recolor replaces
/// `rgb`/`hex`/`name` wholesale but never the id, which is what binds the
/// entry to its layer and yarn-estimate records.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaletteColor {
    pub id: String,
    pub rgb: Rgb,
    pub hex: String,
    pub pixel_count: u64,
    /// Yarn color name when the service matched against a yarn palette.
    #[serde(default)]
    pub name: String,
}

/// Per-color bitmap layer produced by the service, consumed as an opaque
/// artifact (encoded PNG bytes).
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorLayer {
    pub color_id: String,
    pub bitmap: Vec<u8>,
    #[serde(default)]
    pub outline_path: Option<String>,
}

/// Derived yardage metric, keyed by palette color id.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YarnEstimate {
    pub color_id: String,
    pub area: f64,
    pub estimated_yards: f64,
    pub percent_coverage: f64,
}

/// Everything a service response installs into a project, as one unit.
/// [`crate::store::Store::set_processed_result`] installs all fields
/// atomically; the project never holds a partial result.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedResult {
    pub processed_image: Vec<u8>,
    pub palette: Vec<PaletteColor>,
    pub layers: Vec<ColorLayer>,
    pub yarn_estimates: Vec<YarnEstimate>,
    pub outline_svg: Option<String>,
}

impl ProcessedResult {
    pub fn validate(&self) -> TuftResult<()> {
        if self.processed_image.is_empty() {
            return Err(TuftError::validation("processed image must be non-empty"));
        }
        if self.palette.is_empty() {
            return Err(TuftError::validation("palette must be non-empty"));
        }
        for layer in &self.layers {
            if !self.palette.iter().any(|c| c.id == layer.color_id) {
                return Err(TuftError::validation(format!(
                    "layer references unknown color id '{}'",
                    layer.color_id
                )));
            }
        }
        for est in &self.yarn_estimates {
            if !self.palette.iter().any(|c| c.id == est.color_id) {
                return Err(TuftError::validation(format!(
                    "yarn estimate references unknown color id '{}'",
                    est.color_id
                )));
            }
        }
        Ok(())
    }
}

/// The unit of work: one uploaded photo and everything derived from it.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    /// Encoded upload bytes; immutable once set.
    pub original_image: Vec<u8>,
    pub settings: ProjectSettings,
    /// Encoded processed raster; `None` until a service response arrives,
    /// rewritten in place by recolor.
    pub processed_image: Option<Vec<u8>>,
    pub palette: Vec<PaletteColor>,
    pub layers: Vec<ColorLayer>,
    pub yarn_estimates: Vec<YarnEstimate>,
    pub outline_svg: Option<String>,
}

impl Project {
    pub fn new(id: String, original_image: Vec<u8>) -> Self {
        Self {
            id,
            original_image,
            settings: ProjectSettings::default(),
            processed_image: None,
            palette: Vec::new(),
            layers: Vec::new(),
            yarn_estimates: Vec::new(),
            outline_svg: None,
        }
    }

    pub fn is_processed(&self) -> bool {
        self.processed_image.is_some()
    }

    pub fn palette_color(&self, color_id: &str) -> Option<&PaletteColor> {
        self.palette.iter().find(|c| c.id == color_id)
    }
}
