//! Compound field keys and the references they parse into.
//!
//! Key grammar:
//!
//! | Key | Reference |
//! |-----|-----------|
//! | `title` | plain field |
//! | `id~system` | plain field, system column |
//! | `title~de` | plain field, one locale of a localized field |
//! | `dimensions~width` | field `width` of brick type `dimensions` |
//! | `?{"containerKey":"dimensions",...}~note` | brick field addressed through a descriptor |
//! | `~classificationstore~attrs~3-17` | key 17 of group 3 in store field `attrs` |
//!
//! Parsing is total: anything that does not fit a structured form is a plain
//! field named by the raw key.

use std::collections::HashSet;
use std::fmt;

use fieldgrid_common::constants::{
    BRICK_DESCRIPTOR_PREFIX, CLASSIFICATION_STORE_SEGMENT, KEY_SEPARATOR, LOCALIZED_CONTAINER,
    STORE_COORDINATE_SEPARATOR, SYSTEM_QUALIFIER,
};
use serde::Deserialize;
use tracing::debug;

/// Suffix carried by a plain key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyQualifier {
    /// `~system`: always a system column.
    System,
    /// `~<lang>`: one locale of a localized field.
    Language(String),
}

/// JSON descriptor prefixed to a brick key with `?`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrickDescriptor {
    /// Descriptor text as it appeared in the key, without the `?`.
    #[serde(skip)]
    pub raw: String,
    /// Brick type.
    pub container_key: String,
    /// Objectbricks container field on the class.
    #[serde(default)]
    pub fieldname: Option<String>,
    /// Field inside the brick's inner container.
    #[serde(default, rename = "brickfield")]
    pub brick_field: Option<String>,
    /// Localized container inside the brick; `localizedfields` when absent.
    #[serde(default)]
    pub inner_container: Option<String>,
}

impl BrickDescriptor {
    fn parse(raw: &str) -> Option<Self> {
        let mut descriptor: BrickDescriptor = serde_json::from_str(raw).ok()?;
        if descriptor.container_key.is_empty() {
            return None;
        }
        descriptor.raw = raw.to_string();
        Some(descriptor)
    }

    pub fn inner_container(&self) -> &str {
        self.inner_container.as_deref().unwrap_or(LOCALIZED_CONTAINER)
    }
}

/// A field nested inside a brick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrickRef {
    pub brick_type: String,
    /// Second key segment: the brick field, or with a descriptor the column name.
    pub brick_key: String,
    pub descriptor: Option<BrickDescriptor>,
}

impl BrickRef {
    /// Field looked up inside the brick.
    pub fn field_name(&self) -> &str {
        self.descriptor
            .as_ref()
            .and_then(|d| d.brick_field.as_deref())
            .unwrap_or(&self.brick_key)
    }

    /// Inner localized container, when the descriptor redirects through one.
    pub fn inner_container(&self) -> Option<&str> {
        self.descriptor
            .as_ref()
            .map(BrickDescriptor::inner_container)
    }
}

/// One key of a classification store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StoreCoordinate<'a> {
    pub field: &'a str,
    pub group_id: u64,
    pub key_id: u64,
}

/// A parsed field key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldReference {
    Plain {
        name: String,
        qualifier: Option<KeyQualifier>,
    },
    Brick(BrickRef),
    Store {
        field: String,
        group_id: u64,
        key_id: u64,
    },
}

impl FieldReference {
    pub fn plain(name: impl Into<String>) -> Self {
        FieldReference::Plain {
            name: name.into(),
            qualifier: None,
        }
    }

    /// Language hint of a `field~<lang>` key.
    pub fn language(&self) -> Option<&str> {
        match self {
            FieldReference::Plain {
                qualifier: Some(KeyQualifier::Language(lang)),
                ..
            } => Some(lang),
            _ => None,
        }
    }

    pub fn is_system(&self) -> bool {
        matches!(
            self,
            FieldReference::Plain {
                qualifier: Some(KeyQualifier::System),
                ..
            }
        )
    }

    pub fn store_coordinate(&self) -> Option<StoreCoordinate<'_>> {
        match self {
            FieldReference::Store {
                field,
                group_id,
                key_id,
            } => Some(StoreCoordinate {
                field,
                group_id: *group_id,
                key_id: *key_id,
            }),
            _ => None,
        }
    }

    /// The key this reference was parsed from.
    pub fn to_key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FieldReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldReference::Plain { name, qualifier } => {
                f.write_str(name)?;
                match qualifier {
                    Some(KeyQualifier::System) => write!(f, "{KEY_SEPARATOR}{SYSTEM_QUALIFIER}"),
                    Some(KeyQualifier::Language(lang)) => write!(f, "{KEY_SEPARATOR}{lang}"),
                    None => Ok(()),
                }
            }
            FieldReference::Brick(brick) => {
                match &brick.descriptor {
                    Some(d) => write!(f, "{BRICK_DESCRIPTOR_PREFIX}{}", d.raw)?,
                    None => f.write_str(&brick.brick_type)?,
                }
                write!(f, "{KEY_SEPARATOR}{}", brick.brick_key)
            }
            FieldReference::Store {
                field,
                group_id,
                key_id,
            } => write!(
                f,
                "{KEY_SEPARATOR}{CLASSIFICATION_STORE_SEGMENT}{KEY_SEPARATOR}{field}{KEY_SEPARATOR}{group_id}{STORE_COORDINATE_SEPARATOR}{key_id}"
            ),
        }
    }
}

/// Parses field keys.
///
/// Without a language list, a second segment is a language hint when it
/// looks like a locale (`de`, `en_US`, `zh-Hant`). With a list, only its
/// entries are.
#[derive(Debug, Clone, Default)]
pub struct KeyParser {
    languages: Option<HashSet<String>>,
}

impl KeyParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_languages<I, S>(languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            languages: Some(languages.into_iter().map(Into::into).collect()),
        }
    }

    fn is_language(&self, token: &str) -> bool {
        match &self.languages {
            Some(languages) => languages.contains(token),
            None => looks_like_locale(token),
        }
    }

    pub fn parse(&self, key: &str) -> FieldReference {
        if let Some(rest) = key.strip_prefix(KEY_SEPARATOR) {
            return parse_store(rest).unwrap_or_else(|| {
                debug!(%key, "malformed classification store key");
                FieldReference::plain(key)
            });
        }

        let mut segments = key.split(KEY_SEPARATOR);
        let (Some(first), Some(second), None) = (segments.next(), segments.next(), segments.next())
        else {
            return FieldReference::plain(key);
        };
        if first.is_empty() || second.is_empty() {
            return FieldReference::plain(key);
        }

        if second == SYSTEM_QUALIFIER {
            return FieldReference::Plain {
                name: first.to_string(),
                qualifier: Some(KeyQualifier::System),
            };
        }

        if let Some(raw) = first.strip_prefix(BRICK_DESCRIPTOR_PREFIX) {
            return match BrickDescriptor::parse(raw) {
                Some(descriptor) => FieldReference::Brick(BrickRef {
                    brick_type: descriptor.container_key.clone(),
                    brick_key: second.to_string(),
                    descriptor: Some(descriptor),
                }),
                None => {
                    debug!(%key, "malformed brick descriptor");
                    FieldReference::plain(key)
                }
            };
        }

        if self.is_language(second) {
            return FieldReference::Plain {
                name: first.to_string(),
                qualifier: Some(KeyQualifier::Language(second.to_string())),
            };
        }

        FieldReference::Brick(BrickRef {
            brick_type: first.to_string(),
            brick_key: second.to_string(),
            descriptor: None,
        })
    }
}

/// Parse with the syntactic language test.
pub fn parse(key: &str) -> FieldReference {
    KeyParser::new().parse(key)
}

/// `classificationstore~<field>~<group>-<key>`, after the leading separator.
fn parse_store(rest: &str) -> Option<FieldReference> {
    let mut segments = rest.split(KEY_SEPARATOR);
    let (Some(marker), Some(field), Some(coordinate), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return None;
    };
    if marker != CLASSIFICATION_STORE_SEGMENT || field.is_empty() {
        return None;
    }
    let (group, key) = coordinate.split_once(STORE_COORDINATE_SEPARATOR)?;
    Some(FieldReference::Store {
        field: field.to_string(),
        group_id: canonical_id(group)?,
        key_id: canonical_id(key)?,
    })
}

/// Decimal id without sign or leading zeros, so the key prints back unchanged.
fn canonical_id(text: &str) -> Option<u64> {
    let id: u64 = text.parse().ok()?;
    (id.to_string() == text).then_some(id)
}

/// `[a-z]{2,3}`, optionally followed by `_` or `-` and 2 to 4 letters or digits.
fn looks_like_locale(token: &str) -> bool {
    let (language, region) = match token.find(['_', '-']) {
        Some(i) => (&token[..i], Some(&token[i + 1..])),
        None => (token, None),
    };
    let language_ok =
        (2..=3).contains(&language.len()) && language.bytes().all(|b| b.is_ascii_lowercase());
    let region_ok = region.map_or(true, |r| {
        (2..=4).contains(&r.len()) && r.bytes().all(|b| b.is_ascii_alphanumeric())
    });
    language_ok && region_ok
}
