//! Reading and writing aircraft as sectioned text files.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::application::sectioned::{SectionParser, SectionStyle};
use crate::application::{serialize_to_sectioned_text, ApplicationResult, IoResultExt, ParseResultExt};
use crate::config::Settings;
use crate::domain::{apply_entity, Aircraft, Entity, Reconstruction};
use crate::infrastructure::traits::FileSystem;

/// Extension of exported files.
pub const FILE_EXTENSION: &str = "ini";

/// Sectioned text persistence service.
pub struct PersistenceService {
    fs: Arc<dyn FileSystem>,
    settings: Arc<Settings>,
}

impl PersistenceService {
    pub fn new(fs: Arc<dyn FileSystem>, settings: Arc<Settings>) -> Self {
        Self { fs, settings }
    }

    /// Export style from settings.
    pub fn style(&self) -> SectionStyle {
        self.settings.export.style()
    }

    /// Default export location: `<output_dir>/<aircraft name>.ini`.
    pub fn default_path(&self, aircraft: &Aircraft) -> PathBuf {
        let stem: String = aircraft
            .name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        let stem = if stem.is_empty() { Aircraft::SECTION.to_string() } else { stem };
        self.settings
            .output_dir
            .join(format!("{}.{}", stem, FILE_EXTENSION))
    }

    /// Write `tree` to `path`, replacing any existing file.
    #[instrument(level = "debug", skip(self, tree), fields(root = %tree.name))]
    pub fn write_tree(&self, tree: &Entity, path: &Path, style: &SectionStyle) -> ApplicationResult<()> {
        let text = serialize_to_sectioned_text(tree, style)?;
        self.fs
            .write_atomic(path, &text)
            .with_path_context("write sectioned text", path)?;
        debug!(leaves = tree.leaf_count(), "wrote {}", path.display());
        Ok(())
    }

    /// Export an aircraft; returns the path written.
    #[instrument(level = "debug", skip(self, aircraft), fields(name = %aircraft.name))]
    pub fn export_aircraft(
        &self,
        aircraft: &Aircraft,
        path: Option<&Path>,
        style: &SectionStyle,
    ) -> ApplicationResult<PathBuf> {
        let target = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.default_path(aircraft));
        self.write_tree(&aircraft.to_tree(), &target, style)?;
        info!("exported {} to {}", aircraft.name, target.display());
        Ok(target)
    }

    /// Read a sectioned text file as an untyped tree.
    pub fn load_tree(&self, path: &Path) -> ApplicationResult<Entity> {
        let text = self
            .fs
            .read_to_string(path)
            .with_path_context("read sectioned text", path)?;
        SectionParser::new()?.parse(&text).in_file(path)
    }

    /// Read a sectioned text file into a fresh aircraft.
    ///
    /// Entries with no counterpart in the model are skipped and listed in
    /// the returned report.
    #[instrument(level = "debug", skip(self))]
    pub fn load_aircraft(&self, path: &Path) -> ApplicationResult<(Aircraft, Reconstruction)> {
        let tree = self.load_tree(path)?;
        if tree.name != Aircraft::SECTION {
            warn!("top-level section is [{}], expected [{}]", tree.name, Aircraft::SECTION);
        }
        let mut aircraft = Aircraft::new(self.settings.aircraft_name.clone());
        let report = apply_entity(&tree, &mut aircraft)?;
        debug!(applied = report.applied, missing = report.missing.len(), "loaded {}", path.display());
        Ok((aircraft, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::traits::RealFileSystem;
    use tempfile::TempDir;

    fn service(output_dir: &Path) -> PersistenceService {
        let settings = Settings {
            output_dir: output_dir.to_path_buf(),
            ..Settings::default()
        };
        PersistenceService::new(Arc::new(RealFileSystem), Arc::new(settings))
    }

    #[test]
    fn given_aircraft_name_when_building_default_path_then_sanitized() {
        let temp = TempDir::new().unwrap();
        let svc = service(temp.path());
        let path = svc.default_path(&Aircraft::new("A320 neo/v2"));
        assert_eq!(path, temp.path().join("A320_neo_v2.ini"));
    }

    #[test]
    fn given_missing_file_when_loading_then_operation_failed() {
        let temp = TempDir::new().unwrap();
        let err = service(temp.path())
            .load_tree(&temp.path().join("absent.ini"))
            .unwrap_err();
        assert!(err.to_string().contains("absent.ini"));
    }
}
