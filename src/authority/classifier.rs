//! The classification ladder.

use std::sync::{Mutex, PoisonError};

use tracing::{debug, trace};
use url::Url;

use super::cache::{AuthorityCache, CacheEntry};
use super::EntityCategory;
use crate::model::namespaces::category_for_namespace;

/// Redirect hops followed before giving up.
const MAX_REDIRECTS: usize = 5;

/// Path fragments that reveal the kind of entity a URI names.
const PATH_HINTS: [(&str, EntityCategory); 18] = [
    ("/person/", EntityCategory::Person),
    ("/persons/", EntityCategory::Person),
    ("/people/", EntityCategory::Person),
    ("/agent/", EntityCategory::Person),
    ("/organization/", EntityCategory::Organization),
    ("/organisation/", EntityCategory::Organization),
    ("/institution/", EntityCategory::Organization),
    ("/corporation/", EntityCategory::Organization),
    ("/place/", EntityCategory::Location),
    ("/places/", EntityCategory::Location),
    ("/location/", EntityCategory::Location),
    ("/event/", EntityCategory::Event),
    ("/events/", EntityCategory::Event),
    ("/subject/", EntityCategory::SubjectConcept),
    ("/concept/", EntityCategory::SubjectConcept),
    ("/topic/", EntityCategory::SubjectConcept),
    ("/term/", EntityCategory::SubjectConcept),
    ("/type/", EntityCategory::ElementType),
];

/// Answer of one pluggable strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyOutcome {
    /// The URI names an entity of this category.
    Category(EntityCategory),
    /// The URI is an alias; classify the target instead.
    Redirect(String),
    /// The URI could not be reached. Remembered as invalid.
    Unreachable,
    /// No opinion; try the next strategy.
    Unknown,
}

/// A classification step added after the built-in ones.
///
/// Implementations that talk to the network are expected to apply their own
/// timeouts; the classifier calls them synchronously from mappers.
pub trait ClassificationStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn classify(&self, uri: &str) -> StrategyOutcome;
}

/// Classifies authority URIs, remembering answers in an [`AuthorityCache`].
pub struct AuthorityClassifier {
    cache: Mutex<AuthorityCache>,
    strategies: Vec<Box<dyn ClassificationStrategy>>,
}

impl AuthorityClassifier {
    #[must_use]
    pub fn new(cache: AuthorityCache) -> Self {
        Self {
            cache: Mutex::new(cache),
            strategies: Vec::new(),
        }
    }

    /// Appends a strategy to the end of the ladder.
    #[must_use]
    pub fn with_strategy(mut self, strategy: Box<dyn ClassificationStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    /// Returns the category of `uri`, or `None` when no rung knows it.
    pub fn classify(&self, uri: &str) -> Option<EntityCategory> {
        let mut current = uri.to_string();
        for _ in 0..=MAX_REDIRECTS {
            match self.classify_once(&current) {
                Step::Done(category) => {
                    if let Some(category) = category.filter(|_| current != uri) {
                        self.remember(uri, CacheEntry::Category { category });
                    }
                    return category;
                }
                Step::Follow(target) => {
                    trace!(from = %current, to = %target, "following authority redirect");
                    current = target;
                }
            }
        }
        debug!(uri, "too many authority redirects");
        None
    }

    /// Gives the cache back so the caller can save it.
    #[must_use]
    pub fn into_cache(self) -> AuthorityCache {
        self.cache.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn classify_once(&self, uri: &str) -> Step {
        // 1. cache
        if let Some(entry) = self.cached(uri) {
            return match entry {
                CacheEntry::Category { category } => Step::Done(Some(category)),
                CacheEntry::Redirect { target } => Step::Follow(target),
                CacheEntry::Invalid => Step::Done(None),
            };
        }

        // 2. namespace membership, 3. path hints
        if let Some(category) = category_for_namespace(uri).or_else(|| category_from_path(uri)) {
            self.remember(uri, CacheEntry::Category { category });
            return Step::Done(Some(category));
        }

        // 4. pluggable strategies
        for strategy in &self.strategies {
            match strategy.classify(uri) {
                StrategyOutcome::Category(category) => {
                    debug!(uri, strategy = strategy.name(), %category, "classified authority");
                    self.remember(uri, CacheEntry::Category { category });
                    return Step::Done(Some(category));
                }
                StrategyOutcome::Redirect(target) => {
                    self.remember(uri, CacheEntry::Redirect { target: target.clone() });
                    return Step::Follow(target);
                }
                StrategyOutcome::Unreachable => {
                    debug!(uri, strategy = strategy.name(), "authority unreachable");
                    self.remember(uri, CacheEntry::Invalid);
                    return Step::Done(None);
                }
                StrategyOutcome::Unknown => {}
            }
        }
        Step::Done(None)
    }

    fn cached(&self, uri: &str) -> Option<CacheEntry> {
        let cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache.get(uri).cloned()
    }

    fn remember(&self, uri: &str, entry: CacheEntry) {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache.insert(uri, entry);
    }
}

impl std::fmt::Debug for AuthorityClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.strategies.iter().map(|s| s.name()).collect();
        f.debug_struct("AuthorityClassifier")
            .field("strategies", &names)
            .finish_non_exhaustive()
    }
}

enum Step {
    Done(Option<EntityCategory>),
    Follow(String),
}

fn category_from_path(uri: &str) -> Option<EntityCategory> {
    let url = Url::parse(uri).ok()?;
    let path = format!("{}/", url.path().to_ascii_lowercase());
    PATH_HINTS
        .iter()
        .find(|(hint, _)| path.contains(hint))
        .map(|(_, category)| *category)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Fixed {
        outcome: StrategyOutcome,
        calls: Arc<AtomicUsize>,
    }

    impl ClassificationStrategy for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn classify(&self, _uri: &str) -> StrategyOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()
        }
    }

    fn fixed(outcome: StrategyOutcome) -> (Box<dyn ClassificationStrategy>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Box::new(Fixed {
                outcome,
                calls: Arc::clone(&calls),
            }),
            calls,
        )
    }

    // ==================== Built-in Rung Tests ====================

    #[test]
    fn test_namespace_rung() {
        let classifier = AuthorityClassifier::new(AuthorityCache::in_memory());
        assert_eq!(
            classifier.classify("https://sws.geonames.org/2950159"),
            Some(EntityCategory::Location)
        );
    }

    #[test]
    fn test_path_rung() {
        let classifier = AuthorityClassifier::new(AuthorityCache::in_memory());
        assert_eq!(
            classifier.classify("https://example.org/Person/42"),
            Some(EntityCategory::Person)
        );
        assert_eq!(
            classifier.classify("https://example.org/data/place"),
            Some(EntityCategory::Location)
        );
        assert_eq!(classifier.classify("https://example.org/things/42"), None);
    }

    #[test]
    fn test_cache_rung_wins() {
        let mut cache = AuthorityCache::in_memory();
        cache.insert(
            "https://sws.geonames.org/1",
            CacheEntry::Category {
                category: EntityCategory::Event,
            },
        );
        let classifier = AuthorityClassifier::new(cache);
        assert_eq!(
            classifier.classify("https://sws.geonames.org/1"),
            Some(EntityCategory::Event)
        );
    }

    #[test]
    fn test_cached_invalid_is_final() {
        let mut cache = AuthorityCache::in_memory();
        cache.insert("https://example.org/person/gone", CacheEntry::Invalid);
        let classifier = AuthorityClassifier::new(cache);
        assert_eq!(classifier.classify("https://example.org/person/gone"), None);
    }

    #[test]
    fn test_successes_are_cached() {
        let classifier = AuthorityClassifier::new(AuthorityCache::in_memory());
        classifier.classify("https://orcid.org/0000-0002-1825-0097");
        let cache = classifier.into_cache();
        assert_eq!(
            cache.get("https://orcid.org/0000-0002-1825-0097"),
            Some(&CacheEntry::Category {
                category: EntityCategory::Person
            })
        );
    }

    // ==================== Strategy Tests ====================

    #[test]
    fn test_strategy_consulted_after_builtins() {
        let (strategy, calls) = fixed(StrategyOutcome::Category(EntityCategory::Organization));
        let classifier =
            AuthorityClassifier::new(AuthorityCache::in_memory()).with_strategy(strategy);

        assert_eq!(
            classifier.classify("https://d-nb.info/gnd/2007744-0"),
            Some(EntityCategory::Organization)
        );
        // Second lookup comes from the cache
        classifier.classify("https://d-nb.info/gnd/2007744-0");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unreachable_caches_invalid() {
        let (strategy, _) = fixed(StrategyOutcome::Unreachable);
        let classifier =
            AuthorityClassifier::new(AuthorityCache::in_memory()).with_strategy(strategy);
        assert_eq!(classifier.classify("https://example.org/x/1"), None);
        let cache = classifier.into_cache();
        assert_eq!(cache.get("https://example.org/x/1"), Some(&CacheEntry::Invalid));
    }

    #[test]
    fn test_redirect_is_followed_and_cached() {
        let (strategy, _) = fixed(StrategyOutcome::Redirect(
            "https://sws.geonames.org/2950159".to_string(),
        ));
        let classifier =
            AuthorityClassifier::new(AuthorityCache::in_memory()).with_strategy(strategy);

        assert_eq!(
            classifier.classify("https://example.org/alias/berlin"),
            Some(EntityCategory::Location)
        );
        let cache = classifier.into_cache();
        assert_eq!(
            cache.get("https://example.org/alias/berlin"),
            Some(&CacheEntry::Category {
                category: EntityCategory::Location
            })
        );
    }

    #[test]
    fn test_redirect_loop_terminates() {
        let mut cache = AuthorityCache::in_memory();
        cache.insert(
            "https://example.org/a",
            CacheEntry::Redirect {
                target: "https://example.org/b".to_string(),
            },
        );
        cache.insert(
            "https://example.org/b",
            CacheEntry::Redirect {
                target: "https://example.org/a".to_string(),
            },
        );
        let classifier = AuthorityClassifier::new(cache);
        assert_eq!(classifier.classify("https://example.org/a"), None);
    }
}
