//! FieldGrid configuration management using Figment
//!
//! Settings that shape how grid rows are rendered: the fallback locale, the
//! language tokens recognized in field keys, CSV date formatting, the size
//! column precision and the asset preview placeholder.
//!
//! Sources are merged in precedence order (later wins):
//!
//! 1. Hardcoded defaults ([`GridSettings::default`])
//! 2. Global file: `~/.fieldgrid/config.{toml,yaml,yml,json}`
//! 3. Project file: `./.fieldgrid/config.{toml,yaml,yml,json}`
//! 4. Environment variables prefixed `FIELDGRID_` (e.g. `FIELDGRID_DEFAULT_LOCALE=de`)
//!
//! ```no_run
//! use fieldgrid_config::load_settings;
//!
//! let settings = load_settings()?;
//! println!("default locale: {}", settings.default_locale);
//! # Ok::<(), fieldgrid_config::ConfigError>(())
//! ```

pub mod discovery;
pub mod error;
pub mod provider;
pub mod settings;

pub use discovery::{ConfigFile, ConfigFormat, ConfigScope, FileDiscovery};
pub use error::{ConfigError, ConfigResult};
pub use provider::ConfigProvider;
pub use settings::GridSettings;

/// Load settings from every available source.
pub fn load_settings() -> ConfigResult<GridSettings> {
    ConfigProvider::new().load_settings()
}
