//! Provisioning status of the built-in collections.

use crate::core::catalog;
use crate::core::error;
use crate::core::schema::CollectionSchema;
use crate::core::store::CollectionStore;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CollectionState {
    Provisioned,
    Missing,
    /// Present, but stored with a different schema than the built-in one.
    Drifted,
}

impl fmt::Display for CollectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionState::Provisioned => write!(f, "provisioned"),
            CollectionState::Missing => write!(f, "missing"),
            CollectionState::Drifted => write!(f, "drifted"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CollectionStatus {
    pub name: String,
    pub state: CollectionState,
    pub id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub total_collections: usize,
    pub builtins: Vec<CollectionStatus>,
}

impl StatusReport {
    pub fn fully_provisioned(&self) -> bool {
        self.builtins
            .iter()
            .all(|s| s.state == CollectionState::Provisioned)
    }
}

pub fn collection_status(
    store: &dyn CollectionStore,
    expected: &CollectionSchema,
) -> Result<CollectionStatus, error::SeedError> {
    let (state, id) = match store.find_collection(&expected.name)? {
        None => (CollectionState::Missing, None),
        Some(stored) if stored.fingerprint == expected.fingerprint()? => {
            (CollectionState::Provisioned, Some(stored.id))
        }
        Some(stored) => (CollectionState::Drifted, Some(stored.id)),
    };
    Ok(CollectionStatus {
        name: expected.name.clone(),
        state,
        id,
    })
}

pub fn status_report(store: &dyn CollectionStore) -> Result<StatusReport, error::SeedError> {
    let total_collections = store.list_collections()?.len();
    let builtins = catalog::default_collections()
        .iter()
        .map(|schema| collection_status(store, schema))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(StatusReport {
        total_collections,
        builtins,
    })
}
