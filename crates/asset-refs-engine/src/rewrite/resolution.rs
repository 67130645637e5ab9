//! The three ways a marker element can be resolved.
//!
//! Export, Import and Validate are variants of one closed [`Resolution`]
//! enum. Each resolves a single marker value into an [`Outcome`]; the
//! rewriter applies that outcome to the element.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::asset::{Asset, AssetId, AssetStore, StoreError};
use crate::error::RewriteError;
use crate::marker::MarkerAttributes;

/// Host-supplied map of portable paths to live ids, scoping an import.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceSet {
    references: BTreeMap<String, AssetId>,
}

impl ReferenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live id the import run materialized for `path`.
    pub fn import_reference(&self, path: &str) -> Option<AssetId> {
        self.references.get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }
}

impl<P: Into<String>> FromIterator<(P, AssetId)> for ReferenceSet {
    fn from_iter<I: IntoIterator<Item = (P, AssetId)>>(iter: I) -> Self {
        Self {
            references: iter.into_iter().map(|(p, id)| (p.into(), id)).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedReference {
    pub path: String,
    #[serde(flatten)]
    pub asset: Asset,
}

/// Assets referenced by an export, in first-seen order.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedReferenceLedger {
    #[serde(default)]
    references: Vec<ExportedReference>,
}

impl ExportedReferenceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `asset` unless this ledger already holds it.
    pub fn record(&mut self, path: String, asset: Asset) {
        if self.references.iter().any(|r| r.asset.id == asset.id) {
            return;
        }
        self.references.push(ExportedReference { path, asset });
    }

    /// Records every entry of `other`, keeping this ledger's order first.
    pub fn merge(&mut self, other: ExportedReferenceLedger) {
        for reference in other.references {
            self.record(reference.path, reference.asset);
        }
    }

    pub fn references(&self) -> &[ExportedReference] {
        &self.references
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    /// Reference set that imports this ledger's paths back to the same ids.
    pub fn to_reference_set(&self) -> ReferenceSet {
        self.references
            .iter()
            .map(|r| (r.path.clone(), r.asset.id))
            .collect()
    }
}

/// Attribute change for one resolved marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    /// Marker attribute being replaced.
    pub from: String,
    pub attribute: String,
    pub value: String,
    pub asset: Asset,
    /// Regenerate composite (`<picture>`) content from the asset.
    pub rerender: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotInReferenceSet,
    AssetUnavailable,
    ReadOnly,
}

#[derive(Debug)]
pub enum Outcome {
    Replaced(Replacement),
    Skipped(SkipReason),
    Failed(RewriteError),
}

pub enum Resolution<'c> {
    Export(&'c mut ExportedReferenceLedger),
    Import(&'c ReferenceSet),
    Validate,
}

impl Resolution<'_> {
    /// Attribute that marks the elements this resolution visits.
    pub fn marker<'m>(&self, markers: &'m MarkerAttributes) -> &'m str {
        match self {
            Resolution::Import(_) => &markers.external,
            Resolution::Export(_) | Resolution::Validate => &markers.internal,
        }
    }

    pub fn is_read_only(&self) -> bool {
        matches!(self, Resolution::Validate)
    }

    pub fn resolve(
        &mut self,
        store: &dyn AssetStore,
        markers: &MarkerAttributes,
        value: &str,
    ) -> Outcome {
        let result = match self {
            Resolution::Export(ledger) => export(ledger, store, markers, value),
            Resolution::Import(references) => import(references, store, markers, value),
            Resolution::Validate => validate(store, value),
        };
        result.unwrap_or_else(Outcome::Failed)
    }
}

fn parse_id(value: &str) -> Result<AssetId, RewriteError> {
    value
        .parse()
        .map_err(|_| RewriteError::violation(format!("marker value {value:?} is not an asset id")))
}

fn export(
    ledger: &mut ExportedReferenceLedger,
    store: &dyn AssetStore,
    markers: &MarkerAttributes,
    value: &str,
) -> Result<Outcome, RewriteError> {
    let asset = store.lookup(parse_id(value)?)?;
    let path = store.path_for(&asset);
    ledger.record(path.clone(), asset.clone());

    Ok(Outcome::Replaced(Replacement {
        from: markers.internal.clone(),
        attribute: markers.external.clone(),
        value: path,
        asset,
        rerender: false,
    }))
}

fn import(
    references: &ReferenceSet,
    store: &dyn AssetStore,
    markers: &MarkerAttributes,
    path: &str,
) -> Result<Outcome, RewriteError> {
    let Some(id) = references.import_reference(path) else {
        return Ok(Outcome::Skipped(SkipReason::NotInReferenceSet));
    };

    let asset = match store.lookup(id) {
        Ok(asset) => asset,
        Err(StoreError::NotFound(id)) => {
            log::warn!("Unable to load asset {id} imported for {path}, leaving reference as is");
            return Ok(Outcome::Skipped(SkipReason::AssetUnavailable));
        }
        Err(err) => return Err(err.into()),
    };

    Ok(Outcome::Replaced(Replacement {
        from: markers.external.clone(),
        attribute: markers.internal.clone(),
        value: id.to_string(),
        asset,
        rerender: true,
    }))
}

fn validate(store: &dyn AssetStore, value: &str) -> Result<Outcome, RewriteError> {
    store.lookup(parse_id(value)?)?;
    Ok(Outcome::Skipped(SkipReason::ReadOnly))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{FailingStore, sample_store};

    #[test]
    fn export_records_and_replaces() {
        let store = sample_store();
        let markers = MarkerAttributes::default();
        let mut ledger = ExportedReferenceLedger::new();

        let outcome = Resolution::Export(&mut ledger).resolve(&store, &markers, "42");

        let replacement = match outcome {
            Outcome::Replaced(replacement) => replacement,
            other => panic!("expected replacement, got {other:?}"),
        };
        assert_eq!(replacement.from, "data-fileEntryId");
        assert_eq!(replacement.attribute, "export-import-path");
        assert_eq!(replacement.value, "/documents/42/image.png");
        assert!(!replacement.rerender);
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.references()[0].asset.id, AssetId(42));
    }

    #[test]
    fn export_fails_on_missing_asset() {
        let store = sample_store();
        let mut ledger = ExportedReferenceLedger::new();
        let outcome =
            Resolution::Export(&mut ledger).resolve(&store, &MarkerAttributes::default(), "404");
        assert!(matches!(
            outcome,
            Outcome::Failed(RewriteError::AssetNotFound(AssetId(404)))
        ));
        assert!(ledger.is_empty());
    }

    #[test]
    fn export_rejects_non_numeric_marker() {
        let store = sample_store();
        let mut ledger = ExportedReferenceLedger::new();
        let outcome =
            Resolution::Export(&mut ledger).resolve(&store, &MarkerAttributes::default(), "abc");
        assert!(matches!(
            outcome,
            Outcome::Failed(RewriteError::ProtocolViolation(_))
        ));
    }

    #[test]
    fn import_skips_paths_outside_reference_set() {
        let store = sample_store();
        let references = ReferenceSet::new();
        let outcome = Resolution::Import(&references).resolve(
            &store,
            &MarkerAttributes::default(),
            "/documents/42/image.png",
        );
        assert!(matches!(
            outcome,
            Outcome::Skipped(SkipReason::NotInReferenceSet)
        ));
    }

    #[test]
    fn import_skips_unloadable_assets() {
        let store = sample_store();
        let references: ReferenceSet = [("/documents/404/gone.png", AssetId(404))]
            .into_iter()
            .collect();
        let outcome = Resolution::Import(&references).resolve(
            &store,
            &MarkerAttributes::default(),
            "/documents/404/gone.png",
        );
        assert!(matches!(
            outcome,
            Outcome::Skipped(SkipReason::AssetUnavailable)
        ));
    }

    #[test]
    fn import_propagates_store_failures() {
        let references: ReferenceSet = [("/documents/42/image.png", AssetId(42))]
            .into_iter()
            .collect();
        let outcome = Resolution::Import(&references).resolve(
            &FailingStore,
            &MarkerAttributes::default(),
            "/documents/42/image.png",
        );
        assert!(matches!(outcome, Outcome::Failed(RewriteError::Store(_))));
    }

    #[test]
    fn export_propagates_store_failures() {
        let mut ledger = ExportedReferenceLedger::new();
        let outcome = Resolution::Export(&mut ledger).resolve(
            &FailingStore,
            &MarkerAttributes::default(),
            "42",
        );
        assert!(matches!(outcome, Outcome::Failed(RewriteError::Store(_))));
        assert!(ledger.is_empty());
    }

    #[test]
    fn validate_propagates_store_failures() {
        let outcome =
            Resolution::Validate.resolve(&FailingStore, &MarkerAttributes::default(), "42");
        assert!(matches!(outcome, Outcome::Failed(RewriteError::Store(_))));
    }

    #[test]
    fn validate_only_checks_existence() {
        let store = sample_store();
        let markers = MarkerAttributes::default();
        assert!(matches!(
            Resolution::Validate.resolve(&store, &markers, "42"),
            Outcome::Skipped(SkipReason::ReadOnly)
        ));
        assert!(matches!(
            Resolution::Validate.resolve(&store, &markers, "404"),
            Outcome::Failed(RewriteError::AssetNotFound(_))
        ));
    }

    #[test]
    fn ledger_records_each_asset_once() {
        let mut ledger = ExportedReferenceLedger::new();
        let asset = crate::asset::Asset::new(42, "image.png", "image/png");
        ledger.record("/documents/42/image.png".to_string(), asset.clone());
        ledger.record("/documents/42/image.png".to_string(), asset);
        assert_eq!(ledger.len(), 1);

        let references = ledger.to_reference_set();
        assert_eq!(
            references.import_reference("/documents/42/image.png"),
            Some(AssetId(42))
        );
    }

    #[test]
    fn merge_keeps_first_seen_order() {
        let mut ledger = ExportedReferenceLedger::new();
        ledger.record(
            "/documents/7/diagram.svg".to_string(),
            Asset::new(7, "diagram.svg", "image/svg+xml"),
        );
        let mut other = ExportedReferenceLedger::new();
        other.record(
            "/documents/42/image.png".to_string(),
            Asset::new(42, "image.png", "image/png"),
        );
        other.record(
            "/documents/7/diagram.svg".to_string(),
            Asset::new(7, "diagram.svg", "image/svg+xml"),
        );

        ledger.merge(other);

        let ids: Vec<_> = ledger.references().iter().map(|r| r.asset.id).collect();
        assert_eq!(ids, vec![AssetId(7), AssetId(42)]);
    }

    #[test]
    fn marker_depends_on_direction() {
        let markers = MarkerAttributes::default();
        let references = ReferenceSet::new();
        assert_eq!(Resolution::Validate.marker(&markers), "data-fileEntryId");
        assert_eq!(
            Resolution::Import(&references).marker(&markers),
            "export-import-path"
        );
    }
}
