// Copyright 2026 Cookiecrawler Contributors
// SPDX-License-Identifier: Apache-2.0

//! Aggregation of page observations into deduplicated findings.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::error::{CrawlError, CrawlResult};
use crate::expiry::ExpiryCalculator;
use crate::key::{key_for, ResultKey};
use crate::traits::MetadataStore;
use crate::types::{Finding, FindingKind, Lifetime, PageObservation};

/// What a merge did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// First sighting of this key.
    Created,
    /// Folded into an existing finding.
    Merged { lifetime_changed: bool },
}

/// All findings of one crawl, keyed by [`ResultKey`].
#[derive(Debug, Clone)]
pub struct ResultStore {
    findings: BTreeMap<ResultKey, Finding>,
    expiry: ExpiryCalculator,
}

impl ResultStore {
    pub fn new(expiry: ExpiryCalculator) -> Self {
        Self {
            findings: BTreeMap::new(),
            expiry,
        }
    }

    /// Upsert one observation.
    ///
    /// Metadata is looked up only when the finding is created.
    pub fn merge(
        &mut self,
        observation: PageObservation,
        metadata: &dyn MetadataStore,
    ) -> CrawlResult<MergeOutcome> {
        let key = key_for(&observation);
        let candidate = self.lifetime_of(&observation);

        match self.findings.entry(key) {
            Entry::Vacant(slot) => {
                let readable = candidate
                    .map(|lifetime| self.expiry.render(lifetime))
                    .unwrap_or_default();
                let finding = Finding {
                    key: slot.key().clone(),
                    kind: observation.kind,
                    metadata: metadata.lookup(&observation.name),
                    name: observation.name,
                    scope: observation.scope,
                    path: observation.path,
                    same_site: observation.same_site,
                    occurrence_count: 1,
                    observed_urls: vec![observation.visited_url],
                    remaining_lifetime: candidate,
                    readable_lifetime: readable,
                };
                slot.insert(finding);
                Ok(MergeOutcome::Created)
            }
            Entry::Occupied(mut slot) => {
                let finding = slot.get_mut();
                if finding.kind != observation.kind {
                    return Err(CrawlError::Invariant(format!(
                        "key {} holds a {} but received a {}",
                        finding.key, finding.kind, observation.kind
                    )));
                }

                finding.occurrence_count += 1;
                finding.observed_urls.push(observation.visited_url);

                let merged = match (finding.remaining_lifetime, candidate) {
                    (Some(existing), Some(new)) => Some(existing.max(new)),
                    (existing, new) => existing.or(new),
                };
                let lifetime_changed = merged != finding.remaining_lifetime;
                if lifetime_changed {
                    finding.remaining_lifetime = merged;
                    finding.readable_lifetime = merged
                        .map(|lifetime| self.expiry.render(lifetime))
                        .unwrap_or_default();
                }

                debug_assert_eq!(
                    finding.observed_urls.len() as u64,
                    finding.occurrence_count
                );
                Ok(MergeOutcome::Merged { lifetime_changed })
            }
        }
    }

    fn lifetime_of(&self, observation: &PageObservation) -> Option<Lifetime> {
        match observation.kind {
            FindingKind::Cookie => observation
                .raw_expiry
                .map(|raw| self.expiry.lifetime(raw, observation.observed_at_ms)),
            FindingKind::LocalStorageItem => None,
        }
    }

    /// Read-only view of every finding.
    pub fn snapshot(&self) -> &BTreeMap<ResultKey, Finding> {
        &self.findings
    }

    pub fn get(&self, key: &ResultKey) -> Option<&Finding> {
        self.findings.get(key)
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn into_findings(self) -> BTreeMap<ResultKey, Finding> {
        self.findings
    }
}

impl Default for ResultStore {
    fn default() -> Self {
        Self::new(ExpiryCalculator::default())
    }
}
