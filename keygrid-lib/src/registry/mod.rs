//! Bounded widget instance registry
//!
//! Each widget kind owns one [`InstanceRegistry`]. Constructing a widget
//! reserves a random [`Token`] and a slot; callback payloads carry the token
//! plus the slot's generation so the router can find the instance again, or
//! notice that it is gone.
//!
//! The table is a FIFO bound: once full, inserting evicts the entry that was
//! inserted longest ago. Lookups do not refresh recency. Eviction is only a
//! memory bound, so an instance may be evicted early under load.

mod config;
mod token;

pub use config::*;
pub use token::*;

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use crate::error::ConfigError;

/// A token together with the generation it was assigned at.
///
/// Generations increase monotonically per registry, so a payload rendered
/// for an evicted instance does not match a later instance that happens to
/// draw the same token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Handle {
    token: Token,
    generation: u64,
}

impl Handle {
    /// Creates a new handle.
    pub fn new(token: Token, generation: u64) -> Self {
        Self { token, generation }
    }

    /// Returns the token.
    pub fn token(&self) -> &Token {
        &self.token
    }

    /// Returns the generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The longest handle a registry with `token_length` can hand out.
    ///
    /// Used to check payload budgets before an instance is registered.
    pub(crate) fn widest(token_length: usize) -> Self {
        Self::new(Token::filled(token_length), u64::MAX)
    }
}

/// Result of resolving a [`Handle`] against a registry.
#[derive(Debug)]
pub enum Resolution<W> {
    /// The instance that owns the handle.
    Live(Arc<W>),
    /// The token is occupied by a newer instance.
    Stale,
    /// Nothing is registered under the token.
    Missing,
}

struct Entry<W> {
    generation: u64,
    value: Arc<W>,
}

struct RegistryState<W> {
    entries: HashMap<Token, Entry<W>>,
    /// Tokens in insertion order, oldest first.
    order: VecDeque<Token>,
    next_generation: u64,
}

/// Bounded, thread-safe token → instance table.
///
/// Generation, insertion and eviction happen under one lock, so no reader
/// ever sees the table over capacity and a freshly registered instance is
/// visible as soon as registration returns.
///
/// # Example
///
/// ```
/// use keygrid_lib::registry::{InstanceRegistry, RegistryConfig, Resolution};
///
/// let registry = InstanceRegistry::new(RegistryConfig::default().with_capacity(2)).unwrap();
/// let first = registry.register(|handle| (handle, "first"));
/// registry.register(|handle| (handle, "second"));
/// registry.register(|handle| (handle, "third"));
///
/// assert_eq!(registry.len(), 2);
/// assert!(matches!(registry.resolve(&first.0), Resolution::Missing));
/// ```
pub struct InstanceRegistry<W> {
    state: Mutex<RegistryState<W>>,
    config: RegistryConfig,
    generator: TokenGenerator,
}

impl<W> InstanceRegistry<W> {
    /// Creates an empty registry.
    pub fn new(config: RegistryConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            state: Mutex::new(RegistryState {
                entries: HashMap::with_capacity(config.capacity.min(1024)),
                order: VecDeque::with_capacity(config.capacity.min(1024)),
                next_generation: 1,
            }),
            config,
            generator: TokenGenerator::new(config.token_length),
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Returns the maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Returns the number of live entries.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Returns `true` if `token` is occupied.
    pub fn contains(&self, token: &Token) -> bool {
        self.lock().entries.contains_key(token)
    }

    /// Reserves a fresh token and stores the instance built for it.
    ///
    /// `build` runs under the registry lock and receives the handle the
    /// instance should render into its callbacks.
    pub fn register<F>(&self, build: F) -> Arc<W>
    where
        F: FnOnce(Handle) -> W,
    {
        let mut state = self.lock();
        let token = self
            .generator
            .generate(|candidate| state.entries.contains_key(candidate));
        let generation = state.next_generation;
        let value = Arc::new(build(Handle::new(token.clone(), generation)));
        self.insert_locked(&mut state, token, Arc::clone(&value));
        value
    }

    /// Stores `value` under an explicit token.
    ///
    /// An existing entry under the same token is replaced and the token moves
    /// to the back of the eviction order.
    pub fn insert(&self, token: Token, value: W) -> Handle {
        let mut state = self.lock();
        self.insert_locked(&mut state, token, Arc::new(value))
    }

    /// Returns the instance stored under `token`, whatever its generation.
    pub fn get(&self, token: &Token) -> Option<Arc<W>> {
        self.lock()
            .entries
            .get(token)
            .map(|entry| Arc::clone(&entry.value))
    }

    /// Resolves a handle taken from a callback payload.
    pub fn resolve(&self, handle: &Handle) -> Resolution<W> {
        match self.lock().entries.get(handle.token()) {
            Some(entry) if entry.generation == handle.generation() => {
                Resolution::Live(Arc::clone(&entry.value))
            }
            Some(_) => Resolution::Stale,
            None => Resolution::Missing,
        }
    }

    /// Removes the entry under `token`.
    pub fn remove(&self, token: &Token) -> Option<Arc<W>> {
        let mut state = self.lock();
        let entry = state.entries.remove(token)?;
        state.order.retain(|t| t != token);
        Some(entry.value)
    }

    fn insert_locked(&self, state: &mut RegistryState<W>, token: Token, value: Arc<W>) -> Handle {
        let generation = state.next_generation;
        state.next_generation += 1;

        if state.entries.remove(&token).is_some() {
            state.order.retain(|t| t != &token);
        }

        while state.entries.len() >= self.config.capacity {
            let Some(oldest) = state.order.pop_front() else {
                break;
            };
            if let Some(evicted) = state.entries.remove(&oldest) {
                log::trace!(
                    "[registry] evicting {} (generation {})",
                    oldest,
                    evicted.generation
                );
            }
        }

        state.order.push_back(token.clone());
        state.entries.insert(token.clone(), Entry { generation, value });
        Handle::new(token, generation)
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState<W>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W> Default for InstanceRegistry<W> {
    fn default() -> Self {
        let config = RegistryConfig::default();
        Self {
            state: Mutex::new(RegistryState {
                entries: HashMap::new(),
                order: VecDeque::new(),
                next_generation: 1,
            }),
            config,
            generator: TokenGenerator::new(config.token_length),
        }
    }
}

impl<W> std::fmt::Debug for InstanceRegistry<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceRegistry")
            .field("len", &self.len())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(raw: &str) -> Token {
        Token::parse(raw).unwrap()
    }

    fn registry(capacity: usize) -> InstanceRegistry<u32> {
        InstanceRegistry::new(RegistryConfig::default().with_capacity(capacity)).unwrap()
    }

    #[test]
    fn test_get_after_insert() {
        let registry = registry(4);
        registry.insert(token("ab"), 7);
        assert_eq!(registry.get(&token("ab")).as_deref(), Some(&7));
        assert!(registry.get(&token("cd")).is_none());
    }

    #[test]
    fn test_fifo_eviction_keeps_newest() {
        let registry = registry(5);
        for i in 0..8u32 {
            registry.insert(token(&format!("k{i}")), i);
        }
        assert_eq!(registry.len(), 5);
        for i in 0..3u32 {
            assert!(!registry.contains(&token(&format!("k{i}"))));
        }
        for i in 3..8u32 {
            assert_eq!(registry.get(&token(&format!("k{i}"))).as_deref(), Some(&i));
        }
    }

    #[test]
    fn test_get_does_not_refresh_recency() {
        let registry = registry(2);
        registry.insert(token("a"), 1);
        registry.insert(token("b"), 2);
        assert!(registry.get(&token("a")).is_some());
        registry.insert(token("c"), 3);
        assert!(!registry.contains(&token("a")));
        assert!(registry.contains(&token("b")));
    }

    #[test]
    fn test_reinsert_moves_to_back() {
        let registry = registry(2);
        registry.insert(token("a"), 1);
        registry.insert(token("b"), 2);
        registry.insert(token("a"), 10);
        registry.insert(token("c"), 3);
        assert_eq!(registry.get(&token("a")).as_deref(), Some(&10));
        assert!(!registry.contains(&token("b")));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_reused_token_routes_to_new_instance() {
        let registry = registry(1);
        let old = registry.insert(token("zz"), 1);
        registry.insert(token("yy"), 2);
        assert!(matches!(registry.resolve(&old), Resolution::Missing));

        let new = registry.insert(token("zz"), 3);
        assert_eq!(new.token(), old.token());
        assert_ne!(new.generation(), old.generation());
        match registry.resolve(&new) {
            Resolution::Live(value) => assert_eq!(*value, 3),
            other => panic!("expected live entry, got {other:?}"),
        }
        assert!(matches!(registry.resolve(&old), Resolution::Stale));
    }

    #[test]
    fn test_register_hands_out_distinct_tokens() {
        let registry: InstanceRegistry<Handle> =
            InstanceRegistry::new(RegistryConfig::default().with_capacity(300)).unwrap();
        let handles: Vec<Handle> = (0..300)
            .map(|_| (*registry.register(|handle| handle)).clone())
            .collect();
        assert_eq!(registry.len(), 300);
        for handle in &handles {
            assert_eq!(handle.token().len(), 4);
            assert!(matches!(registry.resolve(handle), Resolution::Live(_)));
        }
    }

    #[test]
    fn test_remove() {
        let registry = registry(3);
        let handle = registry.insert(token("a"), 1);
        assert_eq!(registry.remove(handle.token()).as_deref(), Some(&1));
        assert!(registry.is_empty());
        assert!(registry.remove(handle.token()).is_none());
    }

    #[test]
    fn test_concurrent_registration_stays_bounded() {
        let registry = Arc::new(registry(64));
        let threads: Vec<_> = (0..8)
            .map(|t| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    for i in 0..100u32 {
                        let value = registry.register(|_| t * 1000 + i);
                        assert!(registry.len() <= 64);
                        assert_eq!(*value, t * 1000 + i);
                    }
                })
            })
            .collect();
        for thread in threads {
            thread.join().unwrap();
        }
        assert_eq!(registry.len(), 64);
    }
}
