//! Read-only export surface: direct passthroughs of stored artifacts.

use std::path::Path;

use anyhow::Context;

use crate::{
    error::{TuftError, TuftResult},
    model::Project,
};

pub fn pattern_file_name(project: &Project) -> String {
    format!("{}_pattern.png", project.id)
}

pub fn outline_file_name(project: &Project) -> String {
    format!("{}_outline.svg", project.id)
}

/// Write the processed raster bytes as-is. No re-encoding.
pub fn export_pattern_png(project: &Project, path: &Path) -> TuftResult<()> {
    let bytes = project
        .processed_image
        .as_deref()
        .ok_or_else(|| TuftError::validation("project has no processed raster to export"))?;
    std::fs::write(path, bytes).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Write the outline markup as-is. No restroke is applied; the exported
/// document is exactly what the service produced.
pub fn export_outline_svg(project: &Project, path: &Path) -> TuftResult<()> {
    let markup = project
        .outline_svg
        .as_deref()
        .filter(|m| !m.is_empty())
        .ok_or_else(|| TuftError::validation("project has no outline markup to export"))?;
    std::fs::write(path, markup).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
