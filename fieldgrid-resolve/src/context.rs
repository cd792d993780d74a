//! Per-request state passed into row building.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::element::Element;
use crate::services::Principal;

/// A virtual `#`-prefixed column computed per element.
pub trait CalculatedColumn: Send + Sync + fmt::Debug {
    fn compute(&self, element: &Element, locale: &str) -> Value;
}

/// Helper columns registered for one request, keyed by their full `#name` key.
#[derive(Debug, Clone, Default)]
pub struct HelperColumns {
    columns: IndexMap<String, Arc<dyn CalculatedColumn>>,
}

impl HelperColumns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the column for `key`.
    pub fn register(&mut self, key: impl Into<String>, column: Arc<dyn CalculatedColumn>) {
        self.columns.insert(key.into(), column);
    }

    pub fn get(&self, key: &str) -> Option<&Arc<dyn CalculatedColumn>> {
        self.columns.get(key)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Who a row is built for, plus the request's helper columns.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub principal: Principal,
    pub helper_columns: HelperColumns,
}

impl RequestContext {
    pub fn new(principal: Principal) -> Self {
        Self {
            principal,
            helper_columns: HelperColumns::new(),
        }
    }

    /// A full-trust request with no helper columns.
    pub fn admin() -> Self {
        Self::new(Principal::admin("admin"))
    }

    pub fn with_helper(mut self, key: impl Into<String>, column: Arc<dyn CalculatedColumn>) -> Self {
        self.helper_columns.register(key, column);
        self
    }
}
