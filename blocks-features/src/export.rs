//! Catalogue export as a JSON dump

use crate::error::FeatureResult;
use crate::import::FeatureItem;
use crate::store::FeatureStore;
use serde::{Deserialize, Serialize};

/// Exported catalogue, the document accepted by [`FeatureImport`](crate::FeatureImport)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportDocument {
    /// Version of the exporting library, informational
    pub version: String,
    /// Local export time, `YYYY-MM-DDTHH:MM:SS`
    pub date: String,
    pub items: Vec<FeatureItem>,
}

/// Export every feature ordered by scope then title
///
/// Stored values are exported as they are, they were validated when saved.
pub fn export_catalogue<S>(store: &S) -> FeatureResult<ExportDocument>
where
    S: FeatureStore + ?Sized,
{
    let mut features = store.all()?;
    features.sort_by(|a, b| (a.scope, &a.title).cmp(&(b.scope, &b.title)));

    Ok(ExportDocument {
        version: env!("CARGO_PKG_VERSION").to_string(),
        date: chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
        items: features.iter().map(FeatureItem::from).collect(),
    })
}

impl ExportDocument {
    /// Pretty JSON with a 4 spaces indentation
    pub fn to_json_pretty(&self) -> FeatureResult<String> {
        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        self.serialize(&mut serializer)?;

        // serde_json only ever writes valid UTF-8
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
