//! Multi-criteria entry selection and field listing

use std::collections::BTreeSet;

use super::model::{Catalog, Entry};

/// Selection criteria narrowing the catalog to a subset of entries.
///
/// Dimensions combine with AND; accepted values within one dimension
/// combine with OR. An empty dimension does not constrain the selection,
/// so the default query selects the whole catalog. Matching is exact and
/// case-sensitive.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub names: Vec<String>,
    pub vendors: Vec<String>,
    pub categories: Vec<String>,
    pub licenses: Vec<String>,
    pub files: Vec<String>,
}

impl Query {
    /// True when no dimension constrains the selection
    pub fn is_unconstrained(&self) -> bool {
        self.names.is_empty()
            && self.vendors.is_empty()
            && self.categories.is_empty()
            && self.licenses.is_empty()
            && self.files.is_empty()
    }

    /// Whether `entry` satisfies every non-empty dimension
    pub fn matches(&self, entry: &Entry) -> bool {
        if !self.names.is_empty() && !self.names.contains(&entry.name) {
            return false;
        }

        if !self.vendors.is_empty() {
            // Entries without a vendor never match a vendor filter
            match &entry.vendor {
                Some(vendor) if self.vendors.contains(vendor) => {}
                _ => return false,
            }
        }

        if !self.categories.is_empty()
            && !entry.categories.iter().any(|c| self.categories.contains(c))
        {
            return false;
        }

        if !self.licenses.is_empty() && !self.licenses.contains(&entry.license.name) {
            return false;
        }

        if !self.files.is_empty() && !entry.files.iter().any(|f| self.files.contains(&f.name)) {
            return false;
        }

        true
    }
}

/// Field projected by [`Catalog::list`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListField {
    Names,
    Vendors,
    Categories,
    Licenses,
    Files,
}

impl Catalog {
    /// Select entries matching `query`, preserving catalog order.
    ///
    /// An empty result is valid output, not a failure.
    pub fn select(&self, query: &Query) -> Vec<&Entry> {
        self.entries.iter().filter(|e| query.matches(e)).collect()
    }

    /// Project one field over the matching entries.
    ///
    /// Multi-valued fields expand to one row per value. The result is
    /// deduplicated and sorted ascending for human scanning, unlike
    /// [`Catalog::select`] which keeps catalog order.
    pub fn list(&self, query: &Query, field: ListField) -> Vec<String> {
        let mut values = BTreeSet::new();
        for entry in self.select(query) {
            match field {
                ListField::Names => {
                    values.insert(entry.name.clone());
                }
                ListField::Vendors => {
                    if let Some(vendor) = &entry.vendor {
                        values.insert(vendor.clone());
                    }
                }
                ListField::Categories => {
                    values.extend(entry.categories.iter().cloned());
                }
                ListField::Licenses => {
                    values.insert(entry.license.name.clone());
                }
                ListField::Files => {
                    values.extend(entry.files.iter().map(|f| f.name.clone()));
                }
            }
        }
        values.into_iter().collect()
    }
}
