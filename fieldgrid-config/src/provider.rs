//! Configuration provider using Figment for FieldGrid

use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use tracing::{debug, trace};

use crate::{
    discovery::{ConfigFile, ConfigFormat, FileDiscovery},
    error::ConfigResult,
    settings::GridSettings,
};

/// Prefix of environment variables that override settings.
pub const ENV_PREFIX: &str = "FIELDGRID_";

/// Configuration provider using figment
///
/// No caching is performed: each call reads every source again.
#[derive(Debug, Default)]
pub struct ConfigProvider {
    discovery: FileDiscovery,
}

impl ConfigProvider {
    /// Provider that discovers files in the home and current directories.
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider that uses a custom discovery (tests, embedding applications).
    pub fn with_discovery(discovery: FileDiscovery) -> Self {
        Self { discovery }
    }

    /// Merge all sources and extract validated [`GridSettings`].
    pub fn load_settings(&self) -> ConfigResult<GridSettings> {
        let settings: GridSettings = self.build_figment().extract()?;
        settings.validate()?;
        debug!(
            default_locale = %settings.default_locale,
            languages = settings.valid_languages.len(),
            "grid settings loaded"
        );
        Ok(settings)
    }

    /// Sources in precedence order: defaults, discovered files, environment.
    fn build_figment(&self) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(GridSettings::default()));
        for file in self.discovery.discover_all() {
            trace!("Loading config file: {}", file.path.display());
            figment = figment.merge(file_provider(&file));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}

fn file_provider(file: &ConfigFile) -> Figment {
    match file.format {
        ConfigFormat::Toml => Figment::from(Toml::file(&file.path)),
        ConfigFormat::Yaml => Figment::from(Yaml::file(&file.path)),
        ConfigFormat::Json => Figment::from(Json::file(&file.path)),
    }
}
