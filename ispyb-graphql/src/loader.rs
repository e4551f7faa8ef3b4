//! Request-scoped batching of lookups by key.
//!
//! Resolvers call [`BatchLoader::load`] independently. Keys requested while the executor is busy
//! with sibling resolvers are queued, and the first caller to be polled again after yielding
//! sends the whole queue to [`BatchFn::load`] in one call. Every key is fetched at most once per
//! loader: later requests for it share the first batch's outcome, including its error.

use std::{
    collections::HashMap,
    fmt::Debug,
    hash::Hash,
    sync::{Arc, Mutex, PoisonError},
};

use futures::{
    FutureExt,
    future::{BoxFuture, Shared, try_join_all},
};

use crate::db::error::{Error, Result};

/// A grouped lookup.
pub trait BatchFn: Send + Sync + 'static {
    type Key: Clone + Eq + Hash + Debug + Send + Sync + 'static;
    type Value: Clone + Send + Sync + 'static;

    /// Used in logs.
    const NAME: &'static str;

    /// Must return exactly one value per key, in the order of `keys`.
    fn load(
        &self,
        keys: &[Self::Key],
    ) -> impl Future<Output = Result<Vec<Self::Value>>> + Send;
}

type Batch<K, V> = Shared<BoxFuture<'static, Result<Arc<HashMap<K, V>>>>>;

enum Slot<K, V> {
    Queued,
    Dispatched(Batch<K, V>),
}

struct State<K, V> {
    queue: Vec<K>,
    slots: HashMap<K, Slot<K, V>>,
}
impl<K, V> Default for State<K, V> {
    fn default() -> Self {
        Self {
            queue: Vec::new(),
            slots: HashMap::new(),
        }
    }
}

pub struct BatchLoader<F: BatchFn> {
    batch_fn: Arc<F>,
    state: Mutex<State<F::Key, F::Value>>,
}

impl<F: BatchFn> BatchLoader<F> {
    pub fn new(batch_fn: F) -> Self {
        Self {
            batch_fn: Arc::new(batch_fn),
            state: Mutex::new(State::default()),
        }
    }

    /// # Errors
    /// The error of the batch this key was fetched in.
    pub async fn load(&self, key: F::Key) -> Result<F::Value> {
        if self.enqueue(&key) {
            // Let sibling resolvers queue their keys before anyone dispatches.
            tokio::task::yield_now().await;
        }

        let values = self.batch_for(&key).await?;

        values.get(&key).cloned().ok_or_else(|| Error::Other {
            message: format!("{} batch returned no value for {key:?}", F::NAME),
        })
    }

    /// Loads every key, keeping the order of `keys`. Duplicate keys are fetched once.
    ///
    /// # Errors
    /// The first error among the batches involved.
    pub async fn load_many(&self, keys: impl IntoIterator<Item = F::Key>) -> Result<Vec<F::Value>> {
        try_join_all(keys.into_iter().map(|key| self.load(key))).await
    }

    /// Returns whether the caller has to wait for a dispatch.
    fn enqueue(&self, key: &F::Key) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        match state.slots.get(key) {
            Some(Slot::Dispatched(_)) => false,
            Some(Slot::Queued) => true,
            None => {
                state.slots.insert(key.clone(), Slot::Queued);
                state.queue.push(key.clone());
                true
            }
        }
    }

    fn batch_for(&self, key: &F::Key) -> Batch<F::Key, F::Value> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(Slot::Dispatched(batch)) = state.slots.get(key) {
            return batch.clone();
        }

        let keys = std::mem::take(&mut state.queue);
        let batch = self.dispatch(keys.clone());

        for key in keys {
            state.slots.insert(key, Slot::Dispatched(batch.clone()));
        }

        batch
    }

    fn dispatch(&self, keys: Vec<F::Key>) -> Batch<F::Key, F::Value> {
        fetch(Arc::clone(&self.batch_fn), keys).boxed().shared()
    }
}

async fn fetch<F: BatchFn>(
    batch_fn: Arc<F>,
    keys: Vec<F::Key>,
) -> Result<Arc<HashMap<F::Key, F::Value>>> {
    tracing::debug!(loader = F::NAME, n_keys = keys.len(), "dispatching batch");

    let values = batch_fn.load(&keys).await.inspect_err(|error| {
        tracing::warn!(loader = F::NAME, %error, "batch failed");
    })?;

    if values.len() != keys.len() {
        return Err(Error::Other {
            message: format!(
                "{} batch returned {} values for {} keys",
                F::NAME,
                values.len(),
                keys.len()
            ),
        });
    }

    Ok(Arc::new(keys.into_iter().zip(values).collect()))
}
