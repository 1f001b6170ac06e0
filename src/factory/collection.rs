use std::{
    collections::{BTreeSet, BinaryHeap, HashSet, LinkedList, VecDeque},
    fmt,
    hash::Hash,
    sync::Arc,
};

use indexmap::IndexSet;

use super::{CollectionFactory, FactoryResult, Staging};
use crate::{
    error::FactoryError,
    value::{FromValue, Value},
};

/// The container family a collection member is built as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionStrategy {
    Array { len: usize },
    BoxedSlice,
    Vec,
    VecDeque,
    LinkedList,
    BinaryHeap,
    HashSet,
    BTreeSet,
    IndexSet,
    FrozenSlice,
    FrozenHashSet,
    FrozenBTreeSet,
    /// Any `FromIterator<T>` type.
    FromIterator,
    /// Any `Default + Extend<T>` type.
    DefaultExtend,
}

/// Collects elements in order and hands them to `finish` at the end of each
/// cycle.
pub struct SequenceFactory<T, C> {
    staging: Staging<T>,
    finish: fn(Vec<T>) -> FactoryResult<C>,
}

impl<T, C> SequenceFactory<T, C> {
    pub fn new(finish: fn(Vec<T>) -> FactoryResult<C>) -> Self {
        Self {
            staging: Staging::default(),
            finish,
        }
    }
}

impl<T, C> fmt::Debug for SequenceFactory<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceFactory")
            .field("target", &std::any::type_name::<C>())
            .finish()
    }
}

impl<T, C> CollectionFactory for SequenceFactory<T, C>
where
    T: FromValue + Send + 'static,
    C: Send + 'static,
{
    fn begin(&mut self, size_hint: usize) -> FactoryResult<()> {
        self.staging.begin(size_hint)
    }

    fn add(&mut self, item: Value) -> FactoryResult<()> {
        self.staging.ensure_started("add")?;
        self.staging.push(T::from_value(item)?)
    }

    fn set(&mut self, index: usize, item: Value) -> FactoryResult<()> {
        self.staging.ensure_started("set")?;
        self.staging.set(index, T::from_value(item)?)
    }

    fn end(&mut self) -> FactoryResult<Value> {
        let items = self.staging.take()?;
        Ok(Value::object((self.finish)(items)?))
    }

    fn reset(&mut self) {
        self.staging.reset();
    }
}

fn boxed<T, C>(finish: fn(Vec<T>) -> FactoryResult<C>) -> Box<dyn CollectionFactory>
where
    T: FromValue + Send + 'static,
    C: Send + 'static,
{
    Box::new(SequenceFactory::new(finish))
}

pub fn vec_factory<T>() -> Box<dyn CollectionFactory>
where
    T: FromValue + Send + 'static,
{
    boxed::<T, Vec<T>>(Ok)
}

pub fn array_factory<T, const N: usize>() -> Box<dyn CollectionFactory>
where
    T: FromValue + Send + 'static,
{
    boxed::<T, [T; N]>(|items| {
        let found = items.len();
        <[T; N]>::try_from(items).map_err(|_| FactoryError::Length { expected: N, found })
    })
}

pub fn boxed_slice_factory<T>() -> Box<dyn CollectionFactory>
where
    T: FromValue + Send + 'static,
{
    boxed::<T, Box<[T]>>(|items| Ok(items.into_boxed_slice()))
}

pub fn vec_deque_factory<T>() -> Box<dyn CollectionFactory>
where
    T: FromValue + Send + 'static,
{
    boxed::<T, VecDeque<T>>(|items| Ok(VecDeque::from(items)))
}

pub fn linked_list_factory<T>() -> Box<dyn CollectionFactory>
where
    T: FromValue + Send + 'static,
{
    boxed::<T, LinkedList<T>>(|items| Ok(items.into_iter().collect()))
}

pub fn binary_heap_factory<T>() -> Box<dyn CollectionFactory>
where
    T: FromValue + Ord + Send + 'static,
{
    boxed::<T, BinaryHeap<T>>(|items| Ok(BinaryHeap::from(items)))
}

pub fn hash_set_factory<T>() -> Box<dyn CollectionFactory>
where
    T: FromValue + Eq + Hash + Send + 'static,
{
    boxed::<T, HashSet<T>>(|items| Ok(items.into_iter().collect()))
}

pub fn btree_set_factory<T>() -> Box<dyn CollectionFactory>
where
    T: FromValue + Ord + Send + 'static,
{
    boxed::<T, BTreeSet<T>>(|items| Ok(items.into_iter().collect()))
}

pub fn index_set_factory<T>() -> Box<dyn CollectionFactory>
where
    T: FromValue + Eq + Hash + Send + 'static,
{
    boxed::<T, IndexSet<T>>(|items| Ok(items.into_iter().collect()))
}

pub fn frozen_slice_factory<T>() -> Box<dyn CollectionFactory>
where
    T: FromValue + Send + Sync + 'static,
{
    boxed::<T, Arc<[T]>>(|items| Ok(Arc::from(items)))
}

pub fn frozen_hash_set_factory<T>() -> Box<dyn CollectionFactory>
where
    T: FromValue + Eq + Hash + Send + Sync + 'static,
{
    boxed::<T, Arc<HashSet<T>>>(|items| Ok(Arc::new(items.into_iter().collect())))
}

pub fn frozen_btree_set_factory<T>() -> Box<dyn CollectionFactory>
where
    T: FromValue + Ord + Send + Sync + 'static,
{
    boxed::<T, Arc<BTreeSet<T>>>(|items| Ok(Arc::new(items.into_iter().collect())))
}

pub fn from_iter_factory<T, C>() -> Box<dyn CollectionFactory>
where
    T: FromValue + Send + 'static,
    C: FromIterator<T> + Send + 'static,
{
    boxed::<T, C>(|items| Ok(items.into_iter().collect()))
}

pub fn extend_factory<T, C>() -> Box<dyn CollectionFactory>
where
    T: FromValue + Send + 'static,
    C: Default + Extend<T> + Send + 'static,
{
    boxed::<T, C>(|items| {
        let mut container = C::default();
        container.extend(items);
        Ok(container)
    })
}
