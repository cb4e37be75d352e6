use crate::error::{Result, SchematicError};
use std::collections::HashMap;
use std::hash::Hash;

/// A `HashMap`-like container that runs every value through a
/// discriminator before it is allowed in, and fires `on_add`/`on_remove`
/// hooks as entries come and go. Bulk mutation is all-or-nothing: if
/// any value in a batch would be rejected, none of the batch is
/// applied. Replacing an existing key fires `on_remove(old)` then
/// `on_add(new)`. Iteration order follows insertion order.
pub struct DiscriminatingMap<K, V> {
    entries: HashMap<K, V>,
    order: Vec<K>,
    discriminator: Box<dyn Fn(&K, &V) -> (bool, String) + Send + Sync>,
    on_add: Option<Box<dyn Fn(&K, &V) + Send + Sync>>,
    on_remove: Option<Box<dyn Fn(&K, &V) + Send + Sync>>,
}

impl<K: Eq + Hash + Clone, V> DiscriminatingMap<K, V> {
    /// `discriminator` returns `(accept, reason)`; `reason` becomes the
    /// message of [`SchematicError::DiscriminationError`] on rejection.
    pub fn new(discriminator: impl Fn(&K, &V) -> (bool, String) + Send + Sync + 'static) -> Self {
        DiscriminatingMap {
            entries: HashMap::new(),
            order: Vec::new(),
            discriminator: Box::new(discriminator),
            on_add: None,
            on_remove: None,
        }
    }

    pub fn on_add(mut self, hook: impl Fn(&K, &V) + Send + Sync + 'static) -> Self {
        self.on_add = Some(Box::new(hook));
        self
    }

    pub fn on_remove(mut self, hook: impl Fn(&K, &V) + Send + Sync + 'static) -> Self {
        self.on_remove = Some(Box::new(hook));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.entries.get_mut(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.order.iter()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.order.iter().map(move |k| (k, self.entries.get(k).expect("order tracks entries")))
    }

    /// Inserts `value` under `key` if the discriminator admits it,
    /// rejecting (and leaving the map unchanged) otherwise. If `key`
    /// already holds a value, fires `on_remove(old)` before `on_add(new)`.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        let (accept, reason) = (self.discriminator)(&key, &value);
        if !accept {
            return Err(SchematicError::DiscriminationError(reason));
        }

        let old = self.entries.remove(&key);
        match &old {
            Some(old_value) => {
                if let Some(hook) = &self.on_remove {
                    hook(&key, old_value);
                }
            }
            None => self.order.push(key.clone()),
        }
        if let Some(hook) = &self.on_add {
            hook(&key, &value);
        }
        self.entries.insert(key, value);
        Ok(old)
    }

    /// Replaces the value at `key` with whatever `update` returns,
    /// re-checking the discriminator before committing. On rejection
    /// the map is left exactly as it was. Fires `on_remove(old)` then
    /// `on_add(new)` on success.
    pub fn update(&mut self, key: &K, update: impl FnOnce(V) -> V) -> Result<()>
    where
        V: Clone,
    {
        let Some(current) = self.entries.get(key).cloned() else {
            return Err(SchematicError::DiscriminationError(
                "no entry to update".to_string(),
            ));
        };
        let updated = update(current.clone());
        let (accept, reason) = (self.discriminator)(key, &updated);
        if !accept {
            return Err(SchematicError::DiscriminationError(reason));
        }

        if let Some(hook) = &self.on_remove {
            hook(key, &current);
        }
        if let Some(hook) = &self.on_add {
            hook(key, &updated);
        }
        self.entries.insert(key.clone(), updated);
        Ok(())
    }

    pub fn set_default(&mut self, key: K, default: impl FnOnce() -> V) -> Result<&mut V> {
        if !self.entries.contains_key(&key) {
            let value = default();
            self.insert(key.clone(), value)?;
        }
        Ok(self.entries.get_mut(&key).expect("just inserted or present"))
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let removed = self.entries.remove(key);
        if removed.is_some() {
            self.order.retain(|k| k != key);
        }
        if let (Some(hook), Some(value)) = (&self.on_remove, &removed) {
            hook(key, value);
        }
        removed
    }

    pub fn pop(&mut self) -> Option<V> {
        self.pop_item().map(|(_, v)| v)
    }

    pub fn pop_item(&mut self) -> Option<(K, V)> {
        let key = self.order.first()?.clone();
        let value = self.entries.remove(&key)?;
        self.order.remove(0);
        if let Some(hook) = &self.on_remove {
            hook(&key, &value);
        }
        Some((key, value))
    }

    /// Drops every entry, firing `on_remove` for each in insertion order.
    pub fn clear(&mut self) {
        let order = std::mem::take(&mut self.order);
        for key in order {
            if let Some(value) = self.entries.remove(&key) {
                if let Some(hook) = &self.on_remove {
                    hook(&key, &value);
                }
            }
        }
    }

    /// Applies `changes` as a single all-or-nothing batch: every
    /// resulting value must satisfy the discriminator, or none of the
    /// changes are applied. Each replaced key fires `on_remove(old)`
    /// then `on_add(new)`, same as [`DiscriminatingMap::insert`].
    pub fn bulk_update(&mut self, changes: Vec<(K, V)>) -> Result<()> {
        for (key, value) in &changes {
            let (accept, reason) = (self.discriminator)(key, value);
            if !accept {
                return Err(SchematicError::DiscriminationError(reason));
            }
        }
        for (key, value) in changes {
            let old = self.entries.remove(&key);
            match &old {
                Some(old_value) => {
                    if let Some(hook) = &self.on_remove {
                        hook(&key, old_value);
                    }
                }
                None => self.order.push(key.clone()),
            }
            if let Some(hook) = &self.on_add {
                hook(&key, &value);
            }
            self.entries.insert(key, value);
        }
        Ok(())
    }
}
