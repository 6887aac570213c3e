//! Selection orchestration: the explorer owns the data store and the
//! active (language, level, dataset, variant) state, and rebuilds derived
//! projections wholesale on every change.
//!
//! Every fetch sequence is tagged with the generation it was issued for;
//! results carrying a superseded generation are discarded, so a slow stale
//! fetch can never overwrite a newer selection.

use color_eyre::Result;

use crate::areas::{fetch_area_values, AreaValue};
use crate::cli::{AdminLevel, Language};
use crate::export::{export_all_variants, WideTable};
use crate::schema::{self, MetaRecord};
use crate::store::DataStore;
use crate::tree::{self, CategoryNode};
use crate::variant::{resolve_variants, Variant};

/// Tag for one in-flight fetch sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchToken {
    generation: u64,
}

/// The fully resolved state of one dataset selection
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub dataset_id: String,
    /// Localized category path, as shown in the tree
    pub path: String,
    /// Canonical English path used to join fact data
    pub canonical: String,
    /// True when no metadata row matched and the localized path was kept
    pub canonical_is_fallback: bool,
    /// Date-ascending; empty when the dataset has no variants
    pub variants: Vec<Variant>,
    pub active_variant: usize,
    pub values: Vec<AreaValue>,
}

impl Selection {
    pub fn active_variant(&self) -> Option<&Variant> {
        self.variants.get(self.active_variant)
    }
}

pub struct Explorer {
    store: DataStore,
    language: Language,
    level: AdminLevel,
    generation: u64,
    selection: Option<Selection>,
}

impl Explorer {
    pub fn new(store: DataStore, language: Language, level: AdminLevel) -> Self {
        Self {
            store,
            language,
            level,
            generation: 0,
            selection: None,
        }
    }

    pub fn store(&self) -> &DataStore {
        &self.store
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn level(&self) -> AdminLevel {
        self.level
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Switching language invalidates the current selection and tree
    pub fn set_language(&mut self, language: Language) {
        if self.language != language {
            self.language = language;
            self.generation += 1;
            self.selection = None;
        }
    }

    /// Switching level invalidates the current selection and tree
    pub fn set_level(&mut self, level: AdminLevel) {
        if self.level != level {
            self.level = level;
            self.generation += 1;
            self.selection = None;
        }
    }

    /// Build the category tree for the active (language, level) pair.
    /// Rebuilt wholesale on each call; never mutated in place.
    pub fn category_tree(&self) -> Result<Vec<CategoryNode>> {
        let paths = schema::distinct_category_paths(&self.store, self.language, self.level)?;
        Ok(tree::build_tree(&paths))
    }

    /// Start a new fetch sequence, superseding all earlier ones
    pub fn begin_selection(&mut self) -> FetchToken {
        self.generation += 1;
        FetchToken {
            generation: self.generation,
        }
    }

    /// Resolve a dataset id into a full selection without touching state.
    /// Resolution misses degrade (empty variants, empty values), they do
    /// not error.
    pub fn prepare_selection(&self, dataset_id: &str) -> Result<Selection> {
        let path = tree::dataset_path(dataset_id)
            .unwrap_or(dataset_id)
            .to_string();
        let canonical = schema::canonical_path_for_localized_leaf(&self.store, &path, self.language)?;
        let variants = resolve_variants(&self.store, &canonical.value, self.language)?;
        let values = match variants.first() {
            Some(variant) => {
                fetch_area_values(&self.store, &variant.value_column, &variant.table_id, self.level)?
            }
            None => Vec::new(),
        };
        Ok(Selection {
            dataset_id: dataset_id.to_string(),
            path,
            canonical: canonical.value,
            canonical_is_fallback: canonical.fallback,
            variants,
            active_variant: 0,
            values,
        })
    }

    /// Apply a prepared selection; discarded when `token` was superseded
    /// by a newer selection (last-selection-wins).
    pub fn apply_selection(&mut self, token: FetchToken, selection: Selection) -> bool {
        if token.generation != self.generation {
            return false;
        }
        self.selection = Some(selection);
        true
    }

    /// Select a dataset and fetch its default (first) variant's values
    pub fn select_dataset(&mut self, dataset_id: &str) -> Result<Option<&Selection>> {
        let token = self.begin_selection();
        let selection = self.prepare_selection(dataset_id)?;
        self.apply_selection(token, selection);
        Ok(self.selection.as_ref())
    }

    /// Switch the active variant of the current dataset and refetch
    pub fn select_variant(&mut self, index: usize) -> Result<Option<&Selection>> {
        let token = self.begin_selection();
        let updated = match &self.selection {
            Some(current) => match current.variants.get(index) {
                Some(variant) => {
                    let values = fetch_area_values(
                        &self.store,
                        &variant.value_column,
                        &variant.table_id,
                        self.level,
                    )?;
                    let mut next = current.clone();
                    next.active_variant = index;
                    next.values = values;
                    Some(next)
                }
                None => None,
            },
            None => None,
        };
        if let Some(selection) = updated {
            self.apply_selection(token, selection);
        }
        Ok(self.selection.as_ref())
    }

    /// Table metadata for the active variant; empty when nothing is active
    pub fn active_table_metadata(&self) -> Result<MetaRecord> {
        match self.selection.as_ref().and_then(Selection::active_variant) {
            Some(variant) => schema::table_metadata(&self.store, &variant.table_id),
            None => Ok(MetaRecord::new()),
        }
    }

    /// Column metadata for the active variant; empty when nothing is active
    pub fn active_column_metadata(&self) -> Result<MetaRecord> {
        match self.selection.as_ref().and_then(Selection::active_variant) {
            Some(variant) => {
                schema::column_metadata(&self.store, &variant.value_column, &variant.table_id)
            }
            None => Ok(MetaRecord::new()),
        }
    }

    /// Wide export of every variant of the current dataset
    pub fn export_all(&self) -> Result<Option<WideTable>> {
        match &self.selection {
            Some(selection) => Ok(Some(export_all_variants(
                &self.store,
                &selection.canonical,
                self.level,
                self.language,
            )?)),
            None => Ok(None),
        }
    }
}
