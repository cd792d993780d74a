//! GridRowBuilder: one flat row of formatted values per element.
//!
//! Each requested key is parsed once and dispatched: helper columns to the
//! request's registry, system columns to [`SystemColumns`], store
//! coordinates to the [`ClassificationStoreResolver`], everything else to the
//! [`InheritanceResolver`]. A localized-fields container resolves each child
//! separately and merges the children into the row in grid mode. Language
//! permissions are applied last.

use std::collections::HashSet;

use fieldgrid_common::constants::{HELPER_COLUMN_PREFIX, OPTIONS_SUFFIX};
use fieldgrid_common::Pretty;
use fieldgrid_config::GridSettings;
use fieldgrid_fields::{csv_text, FieldDef, FieldKindRegistry, FieldType, FormatContext, GridCell};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{debug, trace};

use crate::context::RequestContext;
use crate::element::{Element, ElementId};
use crate::error::{ResolveError, Result};
use crate::inheritance::{InheritanceResolver, ResolvedValue};
use crate::path::{FieldReference, KeyParser, StoreCoordinate};
use crate::repository::ElementRepository;
use crate::services::{LanguagePermission, PermissionService};
use crate::store::ClassificationStoreResolver;
use crate::system::{system_value, SystemColumns};

/// How a row is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowOptions {
    /// Format every value as CSV text; localized containers are not merged.
    pub csv_mode: bool,
}

impl RowOptions {
    pub fn csv() -> Self {
        Self { csv_mode: true }
    }
}

/// Where a value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InheritanceInfo {
    pub inherited: bool,
    pub owner_element_id: ElementId,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionFlags {
    pub no_view: bool,
    pub no_edit: bool,
}

/// One element's values keyed by requested column.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridRow {
    pub scalar_fields: IndexMap<String, Value>,
    pub inheritance_info: IndexMap<String, InheritanceInfo>,
    pub permission_flags: IndexMap<String, PermissionFlags>,
}

impl GridRow {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.scalar_fields.get(key)
    }

    /// The grid wire shape: values at top level, plus `inheritedFields`
    /// and `metadata.permission` when there is anything to report.
    pub fn to_grid_json(&self) -> Value {
        let mut out: Map<String, Value> = self
            .scalar_fields
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        if !self.inheritance_info.is_empty() {
            let inherited: Map<String, Value> = self
                .inheritance_info
                .iter()
                .map(|(k, info)| {
                    (
                        k.clone(),
                        json!({"inherited": info.inherited, "objectid": info.owner_element_id}),
                    )
                })
                .collect();
            out.insert("inheritedFields".to_string(), Value::Object(inherited));
        }

        if !self.permission_flags.is_empty() {
            let permission: Map<String, Value> = self
                .permission_flags
                .iter()
                .map(|(k, flags)| {
                    let mut entry = Map::new();
                    if flags.no_view {
                        entry.insert("noView".to_string(), json!(1));
                    }
                    if flags.no_edit {
                        entry.insert("noEdit".to_string(), json!(1));
                    }
                    (k.clone(), Value::Object(entry))
                })
                .collect();
            out.insert("metadata".to_string(), json!({ "permission": permission }));
        }

        Value::Object(out)
    }
}

/// Assembles [`GridRow`]s. Stateless: every call is independent.
pub struct GridRowBuilder<'a> {
    repository: &'a dyn ElementRepository,
    kinds: &'a FieldKindRegistry,
    permissions: &'a dyn PermissionService,
    settings: &'a GridSettings,
    parser: &'a KeyParser,
}

impl<'a> GridRowBuilder<'a> {
    pub fn new(
        repository: &'a dyn ElementRepository,
        kinds: &'a FieldKindRegistry,
        permissions: &'a dyn PermissionService,
        settings: &'a GridSettings,
        parser: &'a KeyParser,
    ) -> Self {
        Self {
            repository,
            kinds,
            permissions,
            settings,
            parser,
        }
    }

    /// Build the row for `fields` on `element` in `locale`.
    ///
    /// Keys that cannot be resolved produce empty values; only a field kind
    /// failing to format aborts the row.
    pub fn build<S: AsRef<str>>(
        &self,
        element: &Element,
        fields: &[S],
        locale: &str,
        options: RowOptions,
        request: &RequestContext,
    ) -> Result<GridRow> {
        let class = self.repository.get_class_definition(element);
        let ctx = FormatContext {
            registry: self.kinds,
            locale,
            element_id: element.id,
            date_format: &self.settings.date_format,
        };
        let system = SystemColumns::new(self.settings, options.csv_mode);

        let mut row = GridRow::default();
        let mut localized_keys: Vec<(String, String)> = Vec::new();

        for key in fields {
            let key = key.as_ref();

            if key.starts_with(HELPER_COLUMN_PREFIX) {
                match request.helper_columns.get(key) {
                    Some(column) => {
                        row.scalar_fields
                            .insert(key.to_string(), column.compute(element, locale));
                    }
                    None => debug!(element = element.id, %key, "undefined helper column"),
                }
                continue;
            }

            let reference = self.parser.parse(key);

            if let Some(value) = system_value(&system, element, class.as_deref(), &reference) {
                row.scalar_fields.insert(key.to_string(), value);
                continue;
            }

            match reference.store_coordinate() {
                Some(coordinate) => self.store_cell(&mut row, element, key, coordinate, options, &ctx)?,
                None => {
                    let field_locale = reference.language().unwrap_or(locale);
                    let ctx = FormatContext {
                        locale: field_locale,
                        ..ctx
                    };
                    let resolved = InheritanceResolver::new(self.repository, self.kinds)
                        .resolve(element, &reference, field_locale);
                    let localized = match container_definition(&reference, &resolved) {
                        Some(container) => {
                            self.container_cell(&mut row, element, key, container, options, &ctx)?
                        }
                        None => self.field_cell(&mut row, key, &resolved, options, &ctx)?,
                    };
                    for localized in localized {
                        localized_keys.push((localized, field_locale.to_string()));
                    }
                }
            }
        }

        if !request.principal.admin && !localized_keys.is_empty() {
            self.apply_language_permissions(&mut row, element, request, &localized_keys);
        }

        trace!(element = element.id, "row built: {}", Pretty(&row));
        Ok(row)
    }

    fn store_cell(
        &self,
        row: &mut GridRow,
        element: &Element,
        key: &str,
        coordinate: StoreCoordinate<'_>,
        options: RowOptions,
        ctx: &FormatContext<'_>,
    ) -> Result<()> {
        let stores = ClassificationStoreResolver::new(self.repository, self.kinds);
        let resolved = stores.resolve_inherited(element, coordinate, ctx.locale);
        let value = if options.csv_mode {
            Value::String(
                stores
                    .format_for_csv(&resolved, ctx)
                    .map_err(|e| ResolveError::field_kind(key, e))?,
            )
        } else {
            stores
                .format_for_grid(&resolved, ctx)
                .map_err(|e| ResolveError::field_kind(key, e))?
        };
        row.scalar_fields.insert(key.to_string(), value);
        if resolved.inherited() {
            row.inheritance_info.insert(key.to_string(), inheritance_info(&resolved));
        }
        Ok(())
    }

    /// A class's localized-fields container requested as one column. Each
    /// child is resolved like a direct request for it, so empty children
    /// inherit per locale. Grid mode merges the children into the row; CSV
    /// mode writes them as one JSON text cell. Every written key is subject
    /// to language permissions.
    fn container_cell(
        &self,
        row: &mut GridRow,
        element: &Element,
        key: &str,
        container: &FieldDef,
        options: RowOptions,
        ctx: &FormatContext<'_>,
    ) -> Result<Vec<String>> {
        let resolver = InheritanceResolver::new(self.repository, self.kinds);
        let mut children: IndexMap<String, (Value, InheritanceInfo)> = IndexMap::new();
        for child in container.children() {
            let resolved = resolver.resolve(element, &FieldReference::plain(child.name.clone()), ctx.locale);
            let value = match (&resolved.definition, &resolved.kind) {
                (Some(def), Some(kind)) => kind
                    .format_for_grid(def, &resolved.value, ctx)
                    .map_err(|e| ResolveError::field_kind(key, e))?
                    .into_value(),
                _ => resolved.value.clone(),
            };
            children.insert(child.name.clone(), (value, inheritance_info(&resolved)));
        }

        if options.csv_mode {
            let text: Map<String, Value> = children
                .into_iter()
                .map(|(name, (value, _))| (name, value))
                .collect();
            row.scalar_fields
                .insert(key.to_string(), Value::String(Value::Object(text).to_string()));
            return Ok(vec![key.to_string()]);
        }

        let mut merged = Vec::with_capacity(children.len());
        for (name, (value, info)) in children {
            row.scalar_fields.insert(name.clone(), value);
            row.inheritance_info.insert(name.clone(), info);
            merged.push(name);
        }
        Ok(merged)
    }

    /// Write a plain or brick field into the row. Returns the row keys that
    /// hold localized values.
    fn field_cell(
        &self,
        row: &mut GridRow,
        key: &str,
        resolved: &ResolvedValue,
        options: RowOptions,
        ctx: &FormatContext<'_>,
    ) -> Result<Vec<String>> {
        let (Some(def), Some(kind)) = (&resolved.definition, &resolved.kind) else {
            let value = if options.csv_mode {
                Value::String(csv_text(&resolved.value))
            } else {
                resolved.value.clone()
            };
            row.scalar_fields.insert(key.to_string(), value);
            if resolved.definition.is_some() {
                row.inheritance_info.insert(key.to_string(), inheritance_info(resolved));
            }
            return Ok(localized_key(key, resolved));
        };

        if options.csv_mode {
            let text = kind
                .format_for_csv(def, &resolved.value, ctx)
                .map_err(|e| ResolveError::field_kind(key, e))?;
            row.scalar_fields.insert(key.to_string(), Value::String(text));
            row.inheritance_info.insert(key.to_string(), inheritance_info(resolved));
            if def.is_localized_container() {
                return Ok(vec![key.to_string()]);
            }
            return Ok(localized_key(key, resolved));
        }

        let cell = kind
            .format_for_grid(def, &resolved.value, ctx)
            .map_err(|e| ResolveError::field_kind(key, e))?;
        match cell {
            GridCell::Merge(entries) => {
                let mut merged = Vec::with_capacity(entries.len());
                for (name, value) in entries {
                    row.scalar_fields.insert(name.clone(), value);
                    merged.push(name);
                }
                Ok(merged)
            }
            GridCell::Value(value) => {
                row.scalar_fields.insert(key.to_string(), value);
                row.inheritance_info.insert(key.to_string(), inheritance_info(resolved));
                if let FieldType::Select {
                    options,
                    options_provider: Some(_),
                } = &def.type_
                {
                    let listed: Vec<Value> = options
                        .iter()
                        .map(|o| json!({"key": o.label.as_deref().unwrap_or(&o.value), "value": o.value}))
                        .collect();
                    row.scalar_fields
                        .insert(format!("{key}{OPTIONS_SUFFIX}"), Value::Array(listed));
                }
                Ok(localized_key(key, resolved))
            }
        }
    }

    fn apply_language_permissions(
        &self,
        row: &mut GridRow,
        element: &Element,
        request: &RequestContext,
        localized_keys: &[(String, String)],
    ) {
        let principal = &request.principal;
        let viewable = self
            .permissions
            .get_language_permissions(element, principal, LanguagePermission::View);
        let editable = self
            .permissions
            .get_language_permissions(element, principal, LanguagePermission::Edit);

        let denied = |allowed: &Option<HashSet<String>>, locale: &str| {
            allowed.as_ref().is_some_and(|set| !set.contains(locale))
        };

        for (key, locale) in localized_keys {
            let no_view = denied(&viewable, locale);
            let no_edit = denied(&editable, locale);
            if !no_view && !no_edit {
                continue;
            }
            if no_view {
                row.scalar_fields.insert(key.clone(), Value::Null);
            }
            let flags = row.permission_flags.entry(key.clone()).or_default();
            flags.no_view |= no_view;
            flags.no_edit |= no_edit;
            debug!(element = element.id, %key, %locale, no_view, no_edit, "language permission applied");
        }
    }
}

/// The class's localized-fields container, when `reference` names one
/// directly. Brick inner containers keep their kind's formatting.
fn container_definition<'r>(reference: &FieldReference, resolved: &'r ResolvedValue) -> Option<&'r FieldDef> {
    if !matches!(reference, FieldReference::Plain { .. }) {
        return None;
    }
    resolved
        .definition
        .as_ref()
        .filter(|def| def.is_localized_container())
}

fn inheritance_info(resolved: &ResolvedValue) -> InheritanceInfo {
    InheritanceInfo {
        inherited: resolved.inherited(),
        owner_element_id: resolved.owner_element_id,
    }
}

fn localized_key(key: &str, resolved: &ResolvedValue) -> Vec<String> {
    if resolved.localized {
        vec![key.to_string()]
    } else {
        Vec::new()
    }
}
