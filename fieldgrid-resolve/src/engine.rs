//! GridEngine: the entry point used by grid endpoints and exporters.
//!
//! The engine owns its collaborators behind `Arc`s and is `Send + Sync`, so
//! callers may build rows for many elements in parallel against one engine.

use std::sync::Arc;

use fieldgrid_config::GridSettings;
use fieldgrid_fields::{is_blank, FieldKindRegistry};

use crate::context::RequestContext;
use crate::element::Element;
use crate::error::Result;
use crate::inheritance::{InheritanceResolver, ResolvedValue};
use crate::path::{FieldReference, KeyParser};
use crate::repository::ElementRepository;
use crate::row::{GridRow, GridRowBuilder, RowOptions};
use crate::services::{AllowAll, CurrentLocale, PermissionService, StaticLocale};
use crate::store::ClassificationStoreResolver;
use crate::system::{system_value, SystemColumns};

/// Builder for [`GridEngine`]. Created by [`GridEngine::builder`].
pub struct GridEngineBuilder {
    repository: Arc<dyn ElementRepository>,
    kinds: Option<FieldKindRegistry>,
    permissions: Option<Arc<dyn PermissionService>>,
    current_locale: Option<Arc<dyn CurrentLocale>>,
    settings: GridSettings,
}

impl GridEngineBuilder {
    /// Field kinds; the built-in kinds when not set.
    pub fn kinds(mut self, kinds: FieldKindRegistry) -> Self {
        self.kinds = Some(kinds);
        self
    }

    /// Language permissions; everything allowed when not set.
    pub fn permissions(mut self, permissions: impl PermissionService + 'static) -> Self {
        self.permissions = Some(Arc::new(permissions));
        self
    }

    pub fn current_locale(mut self, current_locale: impl CurrentLocale + 'static) -> Self {
        self.current_locale = Some(Arc::new(current_locale));
        self
    }

    pub fn settings(mut self, settings: GridSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn build(self) -> GridEngine {
        let parser = if self.settings.valid_languages.is_empty() {
            KeyParser::new()
        } else {
            KeyParser::with_languages(self.settings.valid_languages.iter().cloned())
        };
        GridEngine {
            repository: self.repository,
            kinds: Arc::new(self.kinds.unwrap_or_else(FieldKindRegistry::with_builtin)),
            permissions: self.permissions.unwrap_or_else(|| Arc::new(AllowAll)),
            current_locale: self
                .current_locale
                .unwrap_or_else(|| Arc::new(StaticLocale::none())),
            settings: self.settings,
            parser,
        }
    }
}

/// Resolves field values and builds grid rows.
pub struct GridEngine {
    repository: Arc<dyn ElementRepository>,
    kinds: Arc<FieldKindRegistry>,
    permissions: Arc<dyn PermissionService>,
    current_locale: Arc<dyn CurrentLocale>,
    settings: GridSettings,
    parser: KeyParser,
}

impl GridEngine {
    pub fn builder(repository: Arc<dyn ElementRepository>) -> GridEngineBuilder {
        GridEngineBuilder {
            repository,
            kinds: None,
            permissions: None,
            current_locale: None,
            settings: GridSettings::default(),
        }
    }

    /// The locale a request runs in: the requested one, else the current
    /// locale, else the configured default.
    pub fn locale(&self, requested: Option<&str>) -> String {
        requested
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .or_else(|| self.current_locale.get())
            .unwrap_or_else(|| self.settings.default_locale.clone())
    }

    pub fn parse_key(&self, key: &str) -> FieldReference {
        self.parser.parse(key)
    }

    pub fn repository(&self) -> &dyn ElementRepository {
        self.repository.as_ref()
    }

    pub fn settings(&self) -> &GridSettings {
        &self.settings
    }

    /// One row for `element`.
    pub fn build_row<S: AsRef<str>>(
        &self,
        element: &Element,
        fields: &[S],
        locale: Option<&str>,
        options: RowOptions,
        request: &RequestContext,
    ) -> Result<GridRow> {
        let locale = self.locale(locale);
        GridRowBuilder::new(
            self.repository.as_ref(),
            &self.kinds,
            self.permissions.as_ref(),
            &self.settings,
            &self.parser,
        )
        .build(element, fields, &locale, options, request)
    }

    /// Current effective raw value of one key, before any edit is applied.
    pub fn resolve(&self, element: &Element, key: &str, locale: Option<&str>) -> ResolvedValue {
        let locale = self.locale(locale);
        let reference = self.parser.parse(key);

        if let Some(coordinate) = reference.store_coordinate() {
            return ClassificationStoreResolver::new(self.repository.as_ref(), &self.kinds)
                .resolve_inherited(element, coordinate, &locale);
        }

        let class = self.repository.get_class_definition(element);
        let system = SystemColumns::new(&self.settings, false);
        if let Some(value) = system_value(&system, element, class.as_deref(), &reference) {
            return ResolvedValue {
                is_empty: is_blank(&value),
                value,
                ..ResolvedValue::empty(element.id)
            };
        }

        InheritanceResolver::new(self.repository.as_ref(), &self.kinds).resolve(element, &reference, &locale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryRepository;
    use fieldgrid_fields::{ClassDef, FieldDef, FieldType, SchemaContext, SchemaDefaults};
    use serde_json::json;

    fn engine(settings: GridSettings, current: StaticLocale) -> GridEngine {
        let schema = SchemaContext::from_defaults(SchemaDefaults::new().class(ClassDef::new(
            "product",
            "Product",
            true,
            vec![
                FieldDef::new("title", FieldType::Input),
                FieldDef::new("key", FieldType::Input),
            ],
        )));
        let repo = MemoryRepository::new(Arc::new(schema)).with_elements([Element::object(
            5,
            "product",
        )
        .with_key("/products/", "chair")
        .with_value("key", json!("custom"))]);
        GridEngine::builder(Arc::new(repo))
            .settings(settings)
            .current_locale(current)
            .build()
    }

    #[test]
    fn locale_precedence() {
        let with_current = engine(GridSettings::default(), StaticLocale::new("fr"));
        assert_eq!(with_current.locale(Some("de")), "de");
        assert_eq!(with_current.locale(None), "fr");
        assert_eq!(with_current.locale(Some("")), "fr");

        let settings = GridSettings {
            default_locale: "it".into(),
            ..GridSettings::default()
        };
        assert_eq!(engine(settings, StaticLocale::none()).locale(None), "it");
    }

    #[test]
    fn configured_languages_drive_the_parser() {
        let settings = GridSettings {
            valid_languages: vec!["de".into()],
            ..GridSettings::default()
        };
        let engine = engine(settings, StaticLocale::none());
        assert_eq!(engine.parse_key("title~de").language(), Some("de"));
        assert!(matches!(engine.parse_key("title~fr"), FieldReference::Brick(_)));
    }

    #[test]
    fn resolve_system_and_class_fields() {
        let engine = engine(GridSettings::default(), StaticLocale::none());
        let element = engine.repository().get(5).unwrap();
        assert_eq!(engine.resolve(&element, "id", None).value, json!(5));
        assert_eq!(engine.resolve(&element, "key", None).value, json!("custom"));
        assert_eq!(engine.resolve(&element, "key~system", None).value, json!("chair"));
        assert_eq!(
            engine.resolve(&element, "fullpath", None).value,
            json!("/products/chair")
        );
    }

    #[test]
    fn engine_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<GridEngine>();
    }
}
