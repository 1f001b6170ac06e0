//! Builders that accumulate converted elements into the member's concrete
//! container type.
//!
//! Every factory follows the same lifecycle: `begin` → any number of
//! `add`/`set` → `end`, which returns the finished container and leaves the
//! factory ready for the next `begin`. `reset` abandons a half-built
//! container. Calling `add`, `set` or `end` before `begin`, or `begin`
//! twice, is a [`FactoryError::NotStarted`] / [`FactoryError::AlreadyStarted`]
//! usage error.

mod collection;
mod dictionary;
mod grid;

pub use collection::{
    CollectionStrategy, SequenceFactory, array_factory, binary_heap_factory, boxed_slice_factory,
    btree_set_factory, extend_factory, from_iter_factory, frozen_btree_set_factory,
    frozen_hash_set_factory, frozen_slice_factory, hash_set_factory, index_set_factory,
    linked_list_factory, vec_deque_factory, vec_factory,
};
pub use dictionary::{
    DictionaryStrategy, PairFactory, btree_map_factory, extend_pairs_factory,
    from_iter_pairs_factory, frozen_btree_map_factory, frozen_hash_map_factory,
    frozen_index_map_factory, hash_map_factory, index_map_factory,
};
pub use grid::{Grid, GridFactory, grid_factory};

use crate::{error::FactoryError, value::Value};

pub type FactoryResult<T> = std::result::Result<T, FactoryError>;

pub trait CollectionFactory: Send {
    fn begin(&mut self, size_hint: usize) -> FactoryResult<()>;
    fn add(&mut self, item: Value) -> FactoryResult<()>;
    /// Places `item` at `index`; valid indices are below the `begin` size
    /// hint or the number of elements added so far, whichever is larger.
    fn set(&mut self, index: usize, item: Value) -> FactoryResult<()>;
    fn end(&mut self) -> FactoryResult<Value>;
    fn reset(&mut self);
}

pub trait DictionaryFactory: Send {
    fn begin(&mut self, size_hint: usize) -> FactoryResult<()>;
    /// Inserts a new entry; an existing key is a [`FactoryError::DuplicateKey`].
    fn add(&mut self, key: Value, value: Value) -> FactoryResult<()>;
    /// Inserts or overwrites.
    fn set(&mut self, key: Value, value: Value) -> FactoryResult<()>;
    fn end(&mut self) -> FactoryResult<Value>;
    fn reset(&mut self);
}

pub trait MultiArrayFactory: Send {
    fn begin(&mut self, lengths: &[usize]) -> FactoryResult<()>;
    fn set(&mut self, indices: &[usize], item: Value) -> FactoryResult<()>;
    fn end(&mut self) -> FactoryResult<Value>;
    fn reset(&mut self);
}

/// Slot storage shared by the sequence factories.
#[derive(Debug)]
pub(crate) struct Staging<T> {
    slots: Option<Vec<Option<T>>>,
    declared: usize,
}

impl<T> Default for Staging<T> {
    fn default() -> Self {
        Self {
            slots: None,
            declared: 0,
        }
    }
}

impl<T> Staging<T> {
    pub(crate) fn begin(&mut self, size_hint: usize) -> FactoryResult<()> {
        if self.slots.is_some() {
            return Err(FactoryError::AlreadyStarted);
        }
        self.slots = Some(Vec::with_capacity(size_hint));
        self.declared = size_hint;
        Ok(())
    }

    fn slots_mut(&mut self, operation: &'static str) -> FactoryResult<&mut Vec<Option<T>>> {
        self.slots
            .as_mut()
            .ok_or(FactoryError::NotStarted { operation })
    }

    pub(crate) fn ensure_started(&self, operation: &'static str) -> FactoryResult<()> {
        match self.slots {
            Some(_) => Ok(()),
            None => Err(FactoryError::NotStarted { operation }),
        }
    }

    pub(crate) fn push(&mut self, item: T) -> FactoryResult<()> {
        self.slots_mut("add")?.push(Some(item));
        Ok(())
    }

    pub(crate) fn set(&mut self, index: usize, item: T) -> FactoryResult<()> {
        let declared = self.declared;
        let slots = self.slots_mut("set")?;
        let len = declared.max(slots.len());
        if index >= len {
            return Err(FactoryError::IndexOutOfRange { index, len });
        }
        if slots.len() <= index {
            slots.resize_with(index + 1, || None);
        }
        slots[index] = Some(item);
        Ok(())
    }

    /// Ends the cycle. Unset positions below the highest one written are an
    /// error.
    pub(crate) fn take(&mut self) -> FactoryResult<Vec<T>> {
        let slots = self
            .slots
            .take()
            .ok_or(FactoryError::NotStarted { operation: "end" })?;
        self.declared = 0;
        slots
            .into_iter()
            .enumerate()
            .map(|(position, slot)| slot.ok_or(FactoryError::MissingElement { position }))
            .collect()
    }

    pub(crate) fn reset(&mut self) {
        self.slots = None;
        self.declared = 0;
    }
}
