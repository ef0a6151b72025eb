//! Command implementations for the `blocks` binary
//!
//! Each command works on an already resolved catalogue store and settings so
//! it can be exercised without going through argument parsing.

use anyhow::{anyhow, Context, Result};
use blocks_archive::{MassUpload, UploadedFile};
use blocks_common::BlocksSettings;
use blocks_features::{
    export_catalogue, FeatureImport, FeatureStore, ImportOptions, ImportReport, Scope,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Catalogue file name inside the data folder
pub const CATALOGUE_FILE: &str = "features.json";

/// Catalogue file location for a data folder
pub fn catalogue_path(root_folder: &Path) -> PathBuf {
    root_folder.join(CATALOGUE_FILE)
}

/// Export the whole catalogue as a pretty JSON dump
pub fn export_command<S>(store: &S) -> Result<String>
where
    S: FeatureStore + ?Sized,
{
    let document = export_catalogue(store).context("Failed to read catalogue")?;
    info!("Exporting {} features", document.items.len());

    Ok(document.to_json_pretty()?)
}

/// Import a JSON dump into the catalogue
///
/// With `dry_run` the catalogue is left untouched and the report tells what
/// would have been created. A rejected dump gives an error listing every
/// problem, one per line.
pub fn import_command<S>(
    store: &mut S,
    data: &[u8],
    settings: &BlocksSettings,
    ignore_scopes: Vec<Scope>,
    dry_run: bool,
) -> Result<ImportReport>
where
    S: FeatureStore + ?Sized,
{
    let options = ImportOptions { ignore_scopes };

    let import = FeatureImport::parse(data, settings, options)
        .map_err(|e| anyhow!(e.messages().join("\n")))?;

    let report = import
        .save(store, !dry_run)
        .map_err(|e| anyhow!(e.messages().join("\n")))?;

    if dry_run {
        warn!("Dry run, catalogue left unchanged");
    }

    Ok(report)
}

/// One image a mass upload would create
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChildSummary {
    pub parent: String,
    pub file_name: String,
    pub size: usize,
    pub label: Option<String>,
}

/// Validate an archive and list the children it would create under `parent`
pub fn mass_upload_command(
    file: UploadedFile,
    settings: &BlocksSettings,
    parent: &str,
    with_label: bool,
) -> Result<Vec<ChildSummary>> {
    let mut upload = MassUpload::new();
    upload
        .clean(file, settings)
        .context("Archive upload rejected")?;

    let children = upload
        .save_children(parent.to_string(), settings, with_label)
        .into_iter()
        .map(|child| ChildSummary {
            size: child.data.len(),
            parent: child.parent,
            file_name: child.file_name,
            label: child.label,
        })
        .collect();

    Ok(children)
}
