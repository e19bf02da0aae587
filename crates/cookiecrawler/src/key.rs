// Copyright 2026 Cookiecrawler Contributors
// SPDX-License-Identifier: Apache-2.0

//! Deduplication keys for findings.
//!
//! Every page is visited in a fresh browser context, so the same cookie is
//! reported again and again. The key decides whether two sightings are the
//! same finding.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::types::{FindingKind, PageObservation};

/// Hex-encoded SHA-256 over a finding's identity fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultKey(String);

impl ResultKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResultKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the key for a finding identity.
///
/// Fields are hashed in a fixed order, each prefixed with its byte length,
/// so `("ab", "c")` and `("a", "bc")` never produce the same input.
pub fn compute_key(
    kind: FindingKind,
    scope: &str,
    name: &str,
    path: Option<&str>,
    same_site: Option<&str>,
) -> ResultKey {
    let mut hasher = Sha256::new();
    let mut field = |value: Option<&str>| match value {
        Some(v) => {
            hasher.update((v.len() as u64).to_le_bytes());
            hasher.update(v.as_bytes());
        }
        None => hasher.update(u64::MAX.to_le_bytes()),
    };
    field(Some(kind.as_str()));
    field(Some(scope));
    field(Some(name));
    field(path);
    field(same_site);
    ResultKey(hex::encode(hasher.finalize()))
}

/// Key of the finding an observation belongs to.
pub fn key_for(observation: &PageObservation) -> ResultKey {
    compute_key(
        observation.kind,
        &observation.scope,
        &observation.name,
        observation.path.as_deref(),
        observation.same_site.as_deref(),
    )
}
