//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/acsize/acsize.toml`
//! 3. Local config: `<work_dir>/acsize.toml`
//! 4. Environment variables: `ACSIZE_*` prefix, `__` between nested keys
//!    (e.g. `ACSIZE_EXPORT__ORDER=alphabetical`)

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::sectioned::{Formatting, SectionStyle, DEFAULT_INDENT};
use crate::application::ApplicationError;
use crate::domain::numeric::{LineSearch, DEFAULT_MAX_BRACKET_STEPS};
use crate::domain::TraversalOrder;

/// Name of the config file, both globally and in the working directory.
pub const CONFIG_FILE_NAME: &str = "acsize.toml";

/// Sectioned text export settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExportConfig {
    /// Child order within each section
    pub order: TraversalOrder,
    /// `rendered` (fixed significant digits) or `raw` (exact)
    pub format: Formatting,
    /// Spaces per nesting level
    pub indent: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            order: TraversalOrder::Declaration,
            format: Formatting::Rendered,
            indent: DEFAULT_INDENT,
        }
    }
}

impl ExportConfig {
    pub fn style(&self) -> SectionStyle {
        SectionStyle {
            order: self.order,
            formatting: self.format,
            indent: self.indent,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NumericConfig {
    /// Ceiling on bracket extensions in the 1-D maximizer
    pub max_bracket_steps: usize,
}

impl Default for NumericConfig {
    fn default() -> Self {
        Self {
            max_bracket_steps: DEFAULT_MAX_BRACKET_STEPS,
        }
    }
}

impl NumericConfig {
    pub fn line_search(&self) -> LineSearch {
        LineSearch::new(self.max_bracket_steps)
    }
}

/// Optimization adapter settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MdoConfig {
    /// Relative forward-difference step
    pub jacobian_step: f64,
    /// Worker threads for Jacobian columns (0: one per core)
    pub jacobian_workers: usize,
}

impl Default for MdoConfig {
    fn default() -> Self {
        Self {
            jacobian_step: 1e-7,
            jacobian_workers: 0,
        }
    }
}

/// Unified configuration for acsize.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Directory for exported files (default: current directory)
    pub output_dir: PathBuf,
    /// Name given to newly created aircraft
    pub aircraft_name: String,
    pub export: ExportConfig,
    pub numeric: NumericConfig,
    pub mdo: MdoConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            aircraft_name: "Aircraft".to_string(),
            export: ExportConfig::default(),
            numeric: NumericConfig::default(),
            mdo: MdoConfig::default(),
        }
    }
}

/// Get the XDG config directory for acsize.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "acsize").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

/// Get the path to the local config file in a working directory.
pub fn local_config_path(work_dir: &Path) -> PathBuf {
    work_dir.join(CONFIG_FILE_NAME)
}

/// Expand `~`, `$VAR` and `${VAR}`; unknown variables are left as written.
pub fn expand_env_vars(s: &str) -> String {
    shellexpand::full(s)
        .map(|c| c.into_owned())
        .unwrap_or_else(|_| s.to_string())
}

impl Settings {
    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `work_dir` - Optional directory searched for a local `acsize.toml`
    pub fn load(work_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let global = global_config_path();
        let local = work_dir.map(local_config_path);
        Self::load_from(global.as_deref(), local.as_deref())
    }

    /// Load settings from explicit global and local files.
    ///
    /// Missing files are skipped; unreadable or malformed files are errors.
    pub fn load_from(global: Option<&Path>, local: Option<&Path>) -> Result<Self, ApplicationError> {
        let defaults = Self::default().to_toml()?;
        let mut builder = Config::builder().add_source(File::from_str(&defaults, FileFormat::Toml));

        for path in [global, local].into_iter().flatten() {
            if path.exists() {
                debug!("config layer: {}", path.display());
                builder = builder.add_source(File::from(path.to_path_buf()).format(FileFormat::Toml));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("ACSIZE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_err)?;
        let mut settings: Self = config.try_deserialize().map_err(config_err)?;
        settings.expand_paths();
        settings.validate()?;
        Ok(settings)
    }

    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        let expanded = expand_env_vars(self.output_dir.to_string_lossy().as_ref());
        self.output_dir = PathBuf::from(expanded);
    }

    fn validate(&self) -> Result<(), ApplicationError> {
        if !(self.mdo.jacobian_step.is_finite() && self.mdo.jacobian_step > 0.0) {
            return Err(ApplicationError::Config {
                message: format!("mdo.jacobian_step must be positive, got {}", self.mdo.jacobian_step),
            });
        }
        if self.numeric.max_bracket_steps == 0 {
            return Err(ApplicationError::Config {
                message: "numeric.max_bracket_steps must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# acsize configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/acsize/acsize.toml
#   Local:  ./acsize.toml
#   Env:    ACSIZE_* environment variables, e.g. ACSIZE_EXPORT__ORDER=alphabetical

# Directory for exported files
# output_dir = "."

# Name given to newly created aircraft
# aircraft_name = "Aircraft"

[export]
# "declaration" or "alphabetical"
# order = "declaration"

# "rendered" (fixed significant digits) or "raw" (exact values)
# format = "rendered"

# indent = 4

[numeric]
# max_bracket_steps = 10000

[mdo]
# jacobian_step = 1e-7

# Jacobian worker threads, 0 uses one per core
# jacobian_workers = 0
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
