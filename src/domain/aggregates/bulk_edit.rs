//! Bulk edit staging for the back-office stock and price screens.
//!
//! Edits are staged against a baseline taken from the catalog and only the
//! entries that differ from it are kept, so a commit writes exactly the
//! products that actually changed.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use rust_decimal::Decimal;
use uuid::Uuid;
use crate::domain::value_objects::Price;

#[derive(Clone, Debug)]
pub struct BulkEdit<V> {
    baseline: HashMap<Uuid, V>,
    staged: BTreeMap<Uuid, V>,
}

pub type StockEdit = BulkEdit<u32>;
pub type PriceEdit = BulkEdit<Price>;

impl<V: Copy + PartialEq> BulkEdit<V> {
    pub fn new(baseline: impl IntoIterator<Item = (Uuid, V)>) -> Self {
        Self { baseline: baseline.into_iter().collect(), staged: BTreeMap::new() }
    }

    pub fn knows(&self, id: Uuid) -> bool { self.baseline.contains_key(&id) }

    /// Stages `value` for `id`. Returns false for products outside the baseline.
    pub fn stage(&mut self, id: Uuid, value: V) -> bool {
        let Some(original) = self.baseline.get(&id) else { return false };
        if *original == value {
            self.staged.remove(&id);
        } else {
            self.staged.insert(id, value);
        }
        true
    }

    /// Staged value if any, otherwise the baseline.
    pub fn current(&self, id: Uuid) -> Option<V> { self.staged.get(&id).or_else(|| self.baseline.get(&id)).copied() }

    pub fn is_changed(&self, id: Uuid) -> bool { self.staged.contains_key(&id) }
    pub fn len(&self) -> usize { self.staged.len() }
    pub fn is_empty(&self) -> bool { self.staged.is_empty() }
    pub fn changes(&self) -> impl Iterator<Item = (Uuid, V)> + '_ { self.staged.iter().map(|(id, v)| (*id, *v)) }
    pub fn discard(&mut self) { self.staged.clear(); }

    /// Writes the staged changes one by one, stopping at the first failure.
    /// On success the baseline absorbs the changes and the stage is emptied.
    pub async fn commit<F, Fut, E>(&mut self, mut write: F) -> Result<usize, BulkCommitError<E>>
    where
        F: FnMut(Uuid, V) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: std::error::Error + 'static,
    {
        let mut applied = 0;
        let changes: Vec<(Uuid, V)> = self.changes().collect();
        for (id, value) in changes {
            if let Err(source) = write(id, value).await {
                return Err(BulkCommitError { applied, product_id: id, source });
            }
            self.baseline.insert(id, value);
            self.staged.remove(&id);
            applied += 1;
        }
        Ok(applied)
    }
}

impl BulkEdit<u32> {
    /// Moves the stock by `delta` from its current value, never below zero.
    pub fn adjust(&mut self, id: Uuid, delta: i64) -> bool {
        let Some(current) = self.current(id) else { return false };
        let next = i64::from(current).saturating_add(delta);
        self.set_stock(id, next)
    }

    pub fn set_stock(&mut self, id: Uuid, value: i64) -> bool {
        let clamped = u32::try_from(value.max(0)).unwrap_or(u32::MAX);
        self.stage(id, clamped)
    }
}

impl BulkEdit<Price> {
    pub fn set_price(&mut self, id: Uuid, value: Decimal) -> bool { self.stage(id, Price::new(value).non_negative()) }
}

#[derive(Debug, thiserror::Error)]
#[error("bulk update stopped at product {product_id} after {applied} change(s): {source}")]
pub struct BulkCommitError<E: std::error::Error + 'static> {
    pub applied: usize,
    pub product_id: Uuid,
    #[source]
    pub source: E,
}
