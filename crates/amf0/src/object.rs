use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use bytes::Bytes;

use super::Amf0Value;

/// A shared, mutable script data container.
///
/// Cloning a `Shared` handle does not copy the container, it creates another
/// alias to the same allocation. The encoder uses the allocation address as the
/// container identity, so a handle that appears twice in one value graph is
/// written once and referenced afterwards. This is also what makes cyclic
/// graphs expressible.
///
/// Equality compares contents (after a cheap identity check). Comparing two
/// *distinct* cyclic graphs does not terminate.
pub struct Shared<T>(Rc<RefCell<T>>);

/// An ordered key-value container, used by both the `Object` and the
/// `EcmaArray` script data types.
pub type Amf0Object = Shared<Amf0Properties>;

/// A strict (dense, exactly sized) script data array.
pub type Amf0Array = Shared<Vec<Amf0Value>>;

impl<T> Shared<T> {
    /// Wraps a container in a new shared handle.
    pub fn from_inner(inner: T) -> Self {
        Self(Rc::new(RefCell::new(inner)))
    }

    /// Immutably borrows the container.
    pub fn borrow(&self) -> Ref<'_, T> {
        self.0.borrow()
    }

    /// Mutably borrows the container.
    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.0.borrow_mut()
    }

    /// Returns true if both handles point at the same container.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// The identity of the container, stable while any handle is alive.
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T: Default> Default for Shared<T> {
    fn default() -> Self {
        Self::from_inner(T::default())
    }
}

impl<T: PartialEq> PartialEq for Shared<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.borrow() == *other.borrow()
    }
}

thread_local! {
    static FORMATTING: RefCell<HashSet<usize>> = RefCell::new(HashSet::new());
}

impl<T: fmt::Debug> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.id();
        let entered = FORMATTING.with(|set| set.borrow_mut().insert(id));
        if !entered {
            return write!(f, "<cycle>");
        }

        let result = fmt::Debug::fmt(&*self.borrow(), f);
        FORMATTING.with(|set| set.borrow_mut().remove(&id));
        result
    }
}

/// Insertion-ordered properties of an object or ECMA array.
///
/// Keys are unique. Inserting an existing key replaces the value but keeps
/// the key at its original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Amf0Properties {
    entries: Vec<(Bytes, Amf0Value)>,
}

impl Amf0Properties {
    /// Creates an empty property list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a property, returning the previous value of the key if any.
    pub fn insert(
        &mut self,
        key: impl Into<Bytes>,
        value: impl Into<Amf0Value>,
    ) -> Option<Amf0Value> {
        let key = key.into();
        let value = value.into();

        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Looks up a property by key.
    pub fn get(&self, key: impl AsRef<[u8]>) -> Option<&Amf0Value> {
        let key = key.as_ref();
        self.entries
            .iter()
            .find(|(k, _)| k.as_ref() == key)
            .map(|(_, v)| v)
    }

    /// Looks up a property by key for modification.
    pub fn get_mut(&mut self, key: impl AsRef<[u8]>) -> Option<&mut Amf0Value> {
        let key = key.as_ref();
        self.entries
            .iter_mut()
            .find(|(k, _)| k.as_ref() == key)
            .map(|(_, v)| v)
    }

    /// Removes a property, keeping the order of the remaining ones.
    pub fn remove(&mut self, key: impl AsRef<[u8]>) -> Option<Amf0Value> {
        let key = key.as_ref();
        let index = self.entries.iter().position(|(k, _)| k.as_ref() == key)?;
        Some(self.entries.remove(index).1)
    }

    /// Returns true if the key is present.
    pub fn contains_key(&self, key: impl AsRef<[u8]>) -> bool {
        self.get(key).is_some()
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no properties.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the properties in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Bytes, &Amf0Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Iterates over the keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &Bytes> {
        self.entries.iter().map(|(k, _)| k)
    }
}

impl<K: Into<Bytes>, V: Into<Amf0Value>> FromIterator<(K, V)> for Amf0Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut properties = Self::new();
        for (key, value) in iter {
            properties.insert(key, value);
        }
        properties
    }
}

impl Shared<Amf0Properties> {
    /// Creates an empty object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a property through the shared handle.
    pub fn insert(&self, key: impl Into<Bytes>, value: impl Into<Amf0Value>) -> Option<Amf0Value> {
        self.borrow_mut().insert(key, value)
    }

    /// Builder-style insert.
    pub fn with(self, key: impl Into<Bytes>, value: impl Into<Amf0Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Returns a copy of the property value. Container values are returned as
    /// new handles to the same container.
    pub fn get(&self, key: impl AsRef<[u8]>) -> Option<Amf0Value> {
        self.borrow().get(key).cloned()
    }

    /// Removes a property.
    pub fn remove(&self, key: impl AsRef<[u8]>) -> Option<Amf0Value> {
        self.borrow_mut().remove(key)
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.borrow().len()
    }

    /// Returns true if there are no properties.
    pub fn is_empty(&self) -> bool {
        self.borrow().is_empty()
    }
}

impl<K: Into<Bytes>, V: Into<Amf0Value>> FromIterator<(K, V)> for Shared<Amf0Properties> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_inner(iter.into_iter().collect())
    }
}

impl From<Amf0Properties> for Shared<Amf0Properties> {
    fn from(properties: Amf0Properties) -> Self {
        Self::from_inner(properties)
    }
}

impl Shared<Vec<Amf0Value>> {
    /// Appends an element.
    pub fn push(&self, value: impl Into<Amf0Value>) {
        self.borrow_mut().push(value.into());
    }

    /// Returns a copy of the element at `index`.
    pub fn get(&self, index: usize) -> Option<Amf0Value> {
        self.borrow().get(index).cloned()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.borrow().len()
    }

    /// Returns true if the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.borrow().is_empty()
    }
}

impl<V: Into<Amf0Value>> FromIterator<V> for Shared<Vec<Amf0Value>> {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self::from_inner(iter.into_iter().map(Into::into).collect())
    }
}

impl From<Vec<Amf0Value>> for Shared<Vec<Amf0Value>> {
    fn from(values: Vec<Amf0Value>) -> Self {
        Self::from_inner(values)
    }
}
