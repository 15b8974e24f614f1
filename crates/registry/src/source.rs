//! Catalog sources.
//!
//! A source produces the raw, ordered list of flow records. The catalog
//! derives lookup keys from it exactly once, so a source does no
//! normalization of its own.

use std::fs;
use std::path::{Path, PathBuf};

use datacube_types::FlowRecord;
use thiserror::Error;

/// Failure to produce the raw flow list.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("catalog parse error at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("catalog unavailable: {message}")]
    Unavailable { message: String },
}

impl CatalogError {
    /// Create an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable { message: message.into() }
    }
}

/// Produces the raw flow list for a catalog.
pub trait CatalogSource: Send + Sync {
    /// Reads every flow record, in directory order.
    fn load(&self) -> Result<Vec<FlowRecord>, CatalogError>;

    /// Short description used in logs.
    fn describe(&self) -> String;
}

/// Source backed by an in-memory list.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalogSource {
    records: Vec<FlowRecord>,
}

impl StaticCatalogSource {
    pub fn new(records: Vec<FlowRecord>) -> Self {
        Self { records }
    }

    /// The flows every account can see out of the box, plus sample personal
    /// and team flows used by the bundled help output.
    pub fn builtin() -> Self {
        Self::new(vec![
            FlowRecord::provided(
                "consulta-cnh-completa-1764938995458-45nr1u",
                "Consulta Cnh Completa",
                "DataCube",
            ),
            FlowRecord::provided(
                "consulta-cnh-paran-completa-1764938995458-45nr1u",
                "Consulta Cnh Paraná Completa",
                "Consultas de Veículos",
            ),
            FlowRecord::provided(
                "consulta-cnh-ceara-completa-1764938995458-45nr1u",
                "Consulta Cnh Ceará Completa",
                "Consultas de Veículos",
            ),
            FlowRecord::personal("teste-meu-1765010906589-46sxz2", "teste Meu"),
            FlowRecord::personal("aaa-meu-1765010906589-46sxz2", "teste AAA"),
            FlowRecord::team("teste-1765010906589-46sxz2", "teste", "teamfoiiii"),
        ])
    }
}

impl CatalogSource for StaticCatalogSource {
    fn load(&self) -> Result<Vec<FlowRecord>, CatalogError> {
        Ok(self.records.clone())
    }

    fn describe(&self) -> String {
        format!("static ({} records)", self.records.len())
    }
}

/// Source backed by a JSON array of flow records on disk.
#[derive(Debug, Clone)]
pub struct FileCatalogSource {
    path: PathBuf,
}

impl FileCatalogSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CatalogSource for FileCatalogSource {
    fn load(&self) -> Result<Vec<FlowRecord>, CatalogError> {
        let content = fs::read_to_string(&self.path).map_err(|source| CatalogError::Io {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| CatalogError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn file_source_reads_directory_field_names() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"id": "consulta-cnh-1", "name": "Consulta Cnh", "provider_name": "DataCube"}},
                {{"id": "teste-1", "display_name": "teste", "team_name": "teamfoiiii"}}
            ]"#
        )
        .unwrap();

        let records = FileCatalogSource::new(file.path()).load().expect("load records");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].display_name, "Consulta Cnh");
        assert_eq!(records[1].team_name.as_deref(), Some("teamfoiiii"));
    }

    #[test]
    fn missing_file_reports_io_error_with_path() {
        let source = FileCatalogSource::new("/definitely/not/here.json");
        let error = source.load().unwrap_err();
        assert!(matches!(error, CatalogError::Io { .. }));
        assert!(error.to_string().contains("/definitely/not/here.json"));
    }

    #[test]
    fn malformed_file_reports_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let error = FileCatalogSource::new(file.path()).load().unwrap_err();
        assert!(matches!(error, CatalogError::Parse { .. }));
    }
}
