//! Ledger seam.
//!
//! The unspent-output set is owned by the ledger outside this crate. Builders,
//! signers and the verifier only ever see it through [`UnspentSet`], as a
//! read-only snapshot for the duration of one call.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::types::{Hash256, Transaction, UnspentOutput};

/// Read-only view of the unspent-output set.
pub trait UnspentSet: Send + Sync {
    /// Look up an unspent output by hash. Returns `None` if spent or unknown.
    fn get(&self, hash: &Hash256) -> Option<&UnspentOutput>;

    /// All unspent outputs owned by any of `addresses`, in hash order.
    fn owned_by(&self, addresses: &BTreeSet<Address>) -> Vec<&UnspentOutput>;

    /// Check whether an output exists and is unspent.
    fn contains(&self, hash: &Hash256) -> bool {
        self.get(hash).is_some()
    }
}

/// In-memory unspent-output set.
///
/// Ordered by hash so iteration, and everything derived from it, is
/// deterministic.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(from = "Vec<UnspentOutput>", into = "Vec<UnspentOutput>")]
pub struct UnspentPool {
    outputs: BTreeMap<Hash256, UnspentOutput>,
}

impl UnspentPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an output, replacing any output with the same hash.
    pub fn insert(&mut self, output: UnspentOutput) {
        self.outputs.insert(output.hash, output);
    }

    /// Remove and return an output.
    pub fn remove(&mut self, hash: &Hash256) -> Option<UnspentOutput> {
        self.outputs.remove(hash)
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Iterate in hash order.
    pub fn iter(&self) -> impl Iterator<Item = &UnspentOutput> {
        self.outputs.values()
    }

    /// Spend the inputs of `tx` and add the outputs it creates at `created_at`.
    ///
    /// No validation happens here; verify the transaction first.
    pub fn apply(&mut self, tx: &Transaction, created_at: u64) {
        for input in &tx.inputs {
            self.outputs.remove(input);
        }
        for output in tx.unspent_outputs(created_at) {
            self.insert(output);
        }
    }
}

impl UnspentSet for UnspentPool {
    fn get(&self, hash: &Hash256) -> Option<&UnspentOutput> {
        self.outputs.get(hash)
    }

    fn owned_by(&self, addresses: &BTreeSet<Address>) -> Vec<&UnspentOutput> {
        self.outputs
            .values()
            .filter(|o| addresses.contains(&o.address))
            .collect()
    }
}

impl FromIterator<UnspentOutput> for UnspentPool {
    fn from_iter<I: IntoIterator<Item = UnspentOutput>>(iter: I) -> Self {
        let mut pool = Self::new();
        for output in iter {
            pool.insert(output);
        }
        pool
    }
}

impl From<Vec<UnspentOutput>> for UnspentPool {
    fn from(outputs: Vec<UnspentOutput>) -> Self {
        outputs.into_iter().collect()
    }
}

impl From<UnspentPool> for Vec<UnspentOutput> {
    fn from(pool: UnspentPool) -> Self {
        pool.outputs.into_values().collect()
    }
}
