//! # Shared Constants
//!
//! Names and separators that appear in requested field keys and in the
//! schema. Keeping them here means the parser, the resolvers and the CLI
//! agree on one spelling.

/// Separator between segments of a compound field key (`brick~field`, `title~de`).
pub const KEY_SEPARATOR: char = '~';

/// Second segment of a classification-store key: `~classificationstore~<field>~<group>-<key>`.
pub const CLASSIFICATION_STORE_SEGMENT: &str = "classificationstore";

/// Separator between group id and key id in a classification-store coordinate.
pub const STORE_COORDINATE_SEPARATOR: char = '-';

/// Suffix marking a key as a system column (`id~system`).
pub const SYSTEM_QUALIFIER: &str = "system";

/// Prefix of a brick container descriptor (`?{"containerKey":...}~field`).
pub const BRICK_DESCRIPTOR_PREFIX: char = '?';

/// Prefix of a per-request helper (calculated) column.
pub const HELPER_COLUMN_PREFIX: char = '#';

/// Suffix appended to a select key when its option list is emitted alongside the value.
pub const OPTIONS_SUFFIX: &str = "%options";

/// Name of the localized-fields container on classes and bricks.
pub const LOCALIZED_CONTAINER: &str = "localizedfields";

/// Locale used by classification stores that are not localized.
pub const DEFAULT_STORE_LOCALE: &str = "default";
