use crate::inventory::{Lab, LabDump};
use crate::registry::LabRegistry;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised before a dump file is parsed
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DumpError {
    #[error("Unsupported dump format for '{}': expected .json, .yaml or .yml", path.display())]
    UnsupportedFormat { path: PathBuf },
}

/// Serialization of a Lab dump file, chosen by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpFormat {
    Json,
    Yaml,
}

impl DumpFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Some(DumpFormat::Json),
            Some("yaml") | Some("yml") => Some(DumpFormat::Yaml),
            _ => None,
        }
    }
}

/// Load and parse a Lab dump from a JSON or YAML file
pub fn load_dump(dump_path: &Path) -> Result<LabDump> {
    info!("Loading lab dump from: {:?}", dump_path);

    let Some(format) = DumpFormat::from_path(dump_path) else {
        return Err(DumpError::UnsupportedFormat {
            path: dump_path.to_path_buf(),
        }
        .into());
    };

    let file = File::open(dump_path)
        .wrap_err_with(|| format!("Failed to open dump file '{}'", dump_path.display()))?;

    let dump: LabDump = match format {
        DumpFormat::Json => serde_json::from_reader(file)
            .wrap_err_with(|| format!("Invalid JSON in '{}'", dump_path.display()))?,
        DumpFormat::Yaml => serde_yaml::from_reader(file)
            .wrap_err_with(|| format!("Invalid YAML in '{}'", dump_path.display()))?,
    };

    info!("Parsed lab {} with {} pods", dump.id, dump.pods.len());
    Ok(dump)
}

/// Load a dump file and import it into the registry
pub fn import_file(labs: &LabRegistry, dump_path: &Path) -> Result<Lab> {
    let dump = load_dump(dump_path)?;
    let lab = labs
        .import(dump)
        .wrap_err_with(|| format!("Failed to import '{}'", dump_path.display()))?;
    Ok(lab)
}
