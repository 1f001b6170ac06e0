use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    hash::Hash,
    sync::Arc,
};

use indexmap::IndexMap;

use super::{DictionaryFactory, FactoryResult};
use crate::{
    error::FactoryError,
    value::{FromValue, Value},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DictionaryStrategy {
    HashMap,
    BTreeMap,
    IndexMap,
    FrozenHashMap,
    FrozenBTreeMap,
    FrozenIndexMap,
    /// Any `FromIterator<(K, V)>` type.
    FromIterator,
    /// Any `Default + Extend<(K, V)>` type.
    DefaultExtend,
}

/// Collects key/value pairs in insertion order; `finish` builds the target
/// map at the end of each cycle.
pub struct PairFactory<K, V, C> {
    entries: Option<Vec<(K, V)>>,
    finish: fn(Vec<(K, V)>) -> C,
}

impl<K, V, C> PairFactory<K, V, C> {
    pub fn new(finish: fn(Vec<(K, V)>) -> C) -> Self {
        Self {
            entries: None,
            finish,
        }
    }
}

impl<K, V, C> fmt::Debug for PairFactory<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PairFactory")
            .field("target", &std::any::type_name::<C>())
            .finish()
    }
}

fn key_label(key: &Value) -> String {
    key.as_display().unwrap_or_else(|| format!("{key:?}"))
}

impl<K, V, C> PairFactory<K, V, C>
where
    K: FromValue + PartialEq,
    V: FromValue,
{
    fn convert(
        &mut self,
        operation: &'static str,
        key: Value,
        value: Value,
    ) -> FactoryResult<(String, K, V, &mut Vec<(K, V)>)> {
        let label = key_label(&key);
        let entries = self
            .entries
            .as_mut()
            .ok_or(FactoryError::NotStarted { operation })?;
        Ok((label, K::from_value(key)?, V::from_value(value)?, entries))
    }
}

impl<K, V, C> DictionaryFactory for PairFactory<K, V, C>
where
    K: FromValue + PartialEq + Send + 'static,
    V: FromValue + Send + 'static,
    C: Send + 'static,
{
    fn begin(&mut self, size_hint: usize) -> FactoryResult<()> {
        if self.entries.is_some() {
            return Err(FactoryError::AlreadyStarted);
        }
        self.entries = Some(Vec::with_capacity(size_hint));
        Ok(())
    }

    fn add(&mut self, key: Value, value: Value) -> FactoryResult<()> {
        let (label, key, value, entries) = self.convert("add", key, value)?;
        if entries.iter().any(|(existing, _)| *existing == key) {
            return Err(FactoryError::DuplicateKey { key: label });
        }
        entries.push((key, value));
        Ok(())
    }

    fn set(&mut self, key: Value, value: Value) -> FactoryResult<()> {
        let (_, key, value, entries) = self.convert("set", key, value)?;
        match entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => entries.push((key, value)),
        }
        Ok(())
    }

    fn end(&mut self) -> FactoryResult<Value> {
        let entries = self
            .entries
            .take()
            .ok_or(FactoryError::NotStarted { operation: "end" })?;
        Ok(Value::object((self.finish)(entries)))
    }

    fn reset(&mut self) {
        self.entries = None;
    }
}

fn boxed<K, V, C>(finish: fn(Vec<(K, V)>) -> C) -> Box<dyn DictionaryFactory>
where
    K: FromValue + PartialEq + Send + 'static,
    V: FromValue + Send + 'static,
    C: Send + 'static,
{
    Box::new(PairFactory::new(finish))
}

pub fn hash_map_factory<K, V>() -> Box<dyn DictionaryFactory>
where
    K: FromValue + Eq + Hash + Send + 'static,
    V: FromValue + Send + 'static,
{
    boxed::<K, V, HashMap<K, V>>(|entries| entries.into_iter().collect())
}

pub fn btree_map_factory<K, V>() -> Box<dyn DictionaryFactory>
where
    K: FromValue + Ord + Send + 'static,
    V: FromValue + Send + 'static,
{
    boxed::<K, V, BTreeMap<K, V>>(|entries| entries.into_iter().collect())
}

pub fn index_map_factory<K, V>() -> Box<dyn DictionaryFactory>
where
    K: FromValue + Eq + Hash + Send + 'static,
    V: FromValue + Send + 'static,
{
    boxed::<K, V, IndexMap<K, V>>(|entries| entries.into_iter().collect())
}

pub fn frozen_hash_map_factory<K, V>() -> Box<dyn DictionaryFactory>
where
    K: FromValue + Eq + Hash + Send + Sync + 'static,
    V: FromValue + Send + Sync + 'static,
{
    boxed::<K, V, Arc<HashMap<K, V>>>(|entries| Arc::new(entries.into_iter().collect()))
}

pub fn frozen_btree_map_factory<K, V>() -> Box<dyn DictionaryFactory>
where
    K: FromValue + Ord + Send + Sync + 'static,
    V: FromValue + Send + Sync + 'static,
{
    boxed::<K, V, Arc<BTreeMap<K, V>>>(|entries| Arc::new(entries.into_iter().collect()))
}

pub fn frozen_index_map_factory<K, V>() -> Box<dyn DictionaryFactory>
where
    K: FromValue + Eq + Hash + Send + Sync + 'static,
    V: FromValue + Send + Sync + 'static,
{
    boxed::<K, V, Arc<IndexMap<K, V>>>(|entries| Arc::new(entries.into_iter().collect()))
}

pub fn from_iter_pairs_factory<K, V, C>() -> Box<dyn DictionaryFactory>
where
    K: FromValue + PartialEq + Send + 'static,
    V: FromValue + Send + 'static,
    C: FromIterator<(K, V)> + Send + 'static,
{
    boxed::<K, V, C>(|entries| entries.into_iter().collect())
}

pub fn extend_pairs_factory<K, V, C>() -> Box<dyn DictionaryFactory>
where
    K: FromValue + PartialEq + Send + 'static,
    V: FromValue + Send + 'static,
    C: Default + Extend<(K, V)> + Send + 'static,
{
    boxed::<K, V, C>(|entries| {
        let mut container = C::default();
        container.extend(entries);
        container
    })
}
