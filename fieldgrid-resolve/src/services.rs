//! Permission and locale collaborators.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::element::Element;

/// The user a row is built for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub name: String,
    /// Full-trust principals skip language permission checks.
    #[serde(default)]
    pub admin: bool,
}

impl Principal {
    pub fn admin(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            admin: true,
        }
    }

    pub fn user(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            admin: false,
        }
    }
}

/// Language-scoped permission kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LanguagePermission {
    View,
    Edit,
}

impl LanguagePermission {
    pub fn as_str(&self) -> &'static str {
        match self {
            LanguagePermission::View => "lView",
            LanguagePermission::Edit => "lEdit",
        }
    }
}

/// Answers which locales a principal may view or edit on an element.
pub trait PermissionService: Send + Sync {
    /// Allowed locales; `None` means unrestricted.
    fn get_language_permissions(
        &self,
        element: &Element,
        principal: &Principal,
        permission: LanguagePermission,
    ) -> Option<HashSet<String>>;
}

/// Grants every locale to everyone.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl PermissionService for AllowAll {
    fn get_language_permissions(
        &self,
        _element: &Element,
        _principal: &Principal,
        _permission: LanguagePermission,
    ) -> Option<HashSet<String>> {
        None
    }
}

/// Locales one user may view and edit. A missing list is unrestricted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LanguageGrants {
    #[serde(default)]
    pub view: Option<HashSet<String>>,
    #[serde(default)]
    pub edit: Option<HashSet<String>>,
}

/// Per-user language grants held in memory. Users without an entry are unrestricted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryPermissions {
    users: HashMap<String, LanguageGrants>,
}

impl MemoryPermissions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(mut self, user: impl Into<String>, grants: LanguageGrants) -> Self {
        self.users.insert(user.into(), grants);
        self
    }
}

impl PermissionService for MemoryPermissions {
    fn get_language_permissions(
        &self,
        _element: &Element,
        principal: &Principal,
        permission: LanguagePermission,
    ) -> Option<HashSet<String>> {
        let grants = self.users.get(&principal.name)?;
        match permission {
            LanguagePermission::View => grants.view.clone(),
            LanguagePermission::Edit => grants.edit.clone(),
        }
    }
}

/// The locale of the surrounding request, if the caller tracks one.
pub trait CurrentLocale: Send + Sync {
    fn get(&self) -> Option<String>;
}

/// A fixed current locale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticLocale(Option<String>);

impl StaticLocale {
    pub fn new(locale: impl Into<String>) -> Self {
        Self(Some(locale.into()))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

impl CurrentLocale for StaticLocale {
    fn get(&self) -> Option<String> {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementType;

    fn locales(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn memory_permissions_per_user() {
        let element = Element::new(1, ElementType::Object);
        let permissions = MemoryPermissions::new().grant(
            "editor",
            LanguageGrants {
                view: Some(locales(&["de", "fr"])),
                edit: None,
            },
        );

        let editor = Principal::user("editor");
        assert_eq!(
            permissions.get_language_permissions(&element, &editor, LanguagePermission::View),
            Some(locales(&["de", "fr"]))
        );
        assert_eq!(
            permissions.get_language_permissions(&element, &editor, LanguagePermission::Edit),
            None
        );
        assert_eq!(
            permissions.get_language_permissions(
                &element,
                &Principal::user("guest"),
                LanguagePermission::View
            ),
            None
        );
    }

    #[test]
    fn grants_from_yaml() {
        let yaml = "editor:\n  view: [de]\n  edit: []\n";
        let permissions: MemoryPermissions = serde_yaml_ng::from_str(yaml).unwrap();
        let element = Element::new(1, ElementType::Object);
        let editor = Principal::user("editor");
        assert_eq!(
            permissions.get_language_permissions(&element, &editor, LanguagePermission::Edit),
            Some(HashSet::new())
        );
    }

    #[test]
    fn static_locale() {
        assert_eq!(StaticLocale::new("de").get().as_deref(), Some("de"));
        assert_eq!(StaticLocale::none().get(), None);
        assert_eq!(LanguagePermission::View.as_str(), "lView");
    }
}
