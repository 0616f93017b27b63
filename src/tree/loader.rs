//! The tool tree: lazy loading and longest-prefix resolution.

use crate::error::{EngineError, EngineResult};
use crate::tool::ToolDefinition;
use crate::tree::{SourceEnv, ToolDsl, ToolFileConfig};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// A deferred declarative source, evaluated at most once when resolution
/// first touches its registered path prefix.
pub struct Source(SourceKind);

enum SourceKind {
    Fn(Box<dyn FnOnce(&mut ToolDsl<'_>) -> EngineResult<()> + Send>),
    File(PathBuf),
    Config(ToolFileConfig),
}

impl Source {
    /// A programmatic source: a closure issuing directives.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: FnOnce(&mut ToolDsl<'_>) -> EngineResult<()> + Send + 'static,
    {
        Self(SourceKind::Fn(Box::new(f)))
    }

    /// A declarative tool file, loaded when the source is forced.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self(SourceKind::File(path.into()))
    }

    /// An already-loaded declarative configuration.
    pub fn from_config(config: ToolFileConfig) -> Self {
        Self(SourceKind::Config(config))
    }

    fn eval(self, dsl: &mut ToolDsl<'_>) -> EngineResult<()> {
        match self.0 {
            SourceKind::Fn(f) => f(dsl),
            SourceKind::File(path) => ToolFileConfig::from_file(&path)?.apply(dsl),
            SourceKind::Config(config) => config.apply(dsl),
        }
    }
}

impl std::fmt::Debug for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            SourceKind::Fn(_) => write!(f, "Source::Fn"),
            SourceKind::File(path) => write!(f, "Source::File({})", path.display()),
            SourceKind::Config(_) => write!(f, "Source::Config"),
        }
    }
}

/// The outcome of resolving a command line against the tree.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// The resolved definition, a read-only snapshot taken after the
    /// relevant subtree finished loading.
    pub tool: Arc<ToolDefinition>,
    /// Command-line words past the matched prefix; handed to the argument
    /// parser as the tool's residual argv.
    pub residual: Vec<String>,
    /// Whether the matched definition has a run handler. A false value is
    /// the namespace outcome that triggers help display.
    pub runnable: bool,
}

struct PendingSource {
    prefix: Vec<String>,
    source: Source,
}

/// The recursive namespace mapping name-segment paths to tool definitions.
///
/// The tree is built incrementally: sources register at path prefixes
/// without being evaluated, and resolution forces exactly the sources
/// whose prefixes lie along the walked path. Resolved paths are cached;
/// registering a source invalidates every cache entry it could affect.
///
/// # Example
///
/// ```
/// use grove::mixin::DefaultMixinRegistry;
/// use grove::tree::{Source, SourceEnv, ToolTree};
/// use std::collections::HashMap;
///
/// let registry = DefaultMixinRegistry::new();
/// let handlers = HashMap::new();
/// let env = SourceEnv { mixins: &registry, handlers: &handlers };
///
/// let mut tree = ToolTree::new();
/// tree.add_source(
///     vec![],
///     Source::from_fn(|dsl| {
///         dsl.tool("greet", |t| {
///             t.run(|_ctx| Ok(()));
///             Ok(())
///         })
///     }),
/// );
///
/// let argv: Vec<String> = vec!["greet".into(), "extra".into()];
/// let resolution = tree.resolve(&argv, &env).unwrap();
/// assert!(resolution.runnable);
/// assert_eq!(resolution.residual, vec!["extra".to_string()]);
/// ```
#[derive(Debug)]
pub struct ToolTree {
    root: ToolDefinition,
    pending: Vec<PendingSource>,
    cache: HashMap<Vec<String>, Arc<ToolDefinition>>,
    strict: bool,
}

impl std::fmt::Debug for PendingSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingSource")
            .field("prefix", &self.prefix)
            .field("source", &self.source)
            .finish()
    }
}

impl Default for ToolTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolTree {
    /// Create an empty tree with namespace fallback (non-strict) policy.
    pub fn new() -> Self {
        Self {
            root: ToolDefinition::root(),
            pending: Vec::new(),
            cache: HashMap::new(),
            strict: false,
        }
    }

    /// Set the strict-resolution policy: when true, resolving to a
    /// non-runnable definition is a `NoSuchTool` error instead of a
    /// namespace/help outcome.
    pub fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
    }

    /// The root namespace node.
    pub fn root(&self) -> &ToolDefinition {
        &self.root
    }

    /// Register a deferred source at a path prefix without evaluating it.
    ///
    /// Cache entries at, under, or above the prefix are invalidated: the
    /// new source may add children anywhere in that subtree, and a cached
    /// ancestor resolution may stop being the longest match once the
    /// prefix materializes.
    pub fn add_source(&mut self, prefix: Vec<String>, source: Source) {
        self.cache
            .retain(|key, _| !starts_with(key, &prefix) && !starts_with(&prefix, key));
        tracing::debug!(prefix = ?prefix, "registered deferred tool source");
        self.pending.push(PendingSource { prefix, source });
    }

    /// Number of sources not yet forced.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Resolve a command line to a definition plus residual arguments.
    ///
    /// Walks name segments left to right, forcing pending sources whose
    /// prefix matches the path walked so far, and stops at the first
    /// segment with no matching child. The definition reached is the
    /// match; trailing segments become residual arguments. A non-runnable
    /// match is a namespace outcome unless strict policy is set.
    pub fn resolve(&mut self, argv: &[String], env: &SourceEnv<'_>) -> EngineResult<Resolution> {
        if let Some(hit) = self.cache_lookup(argv) {
            return Ok(hit);
        }

        self.force_pending(&[], env)?;

        let mut matched: Vec<String> = Vec::new();
        for segment in argv {
            let mut candidate = matched.clone();
            candidate.push(segment.clone());
            self.force_pending(&candidate, env)?;

            let node = self
                .node(&matched)
                .expect("matched path must exist in tree");
            match node.resolve_child_segment(segment) {
                Some(canonical) => {
                    let canonical = canonical.to_string();
                    // Sources registered under the canonical name also
                    // materialize when the walk arrives via an alias.
                    if canonical != *segment {
                        let mut canonical_path = matched.clone();
                        canonical_path.push(canonical.clone());
                        self.force_pending(&canonical_path, env)?;
                    }
                    matched.push(canonical);
                }
                None => break,
            }
        }

        let node = self
            .node(&matched)
            .expect("matched path must exist in tree");
        let runnable = node.is_runnable();
        if self.strict && !runnable {
            return Err(EngineError::no_such_tool(argv.join(" ")));
        }

        let snapshot = Arc::new(node.clone());
        self.cache.insert(matched.clone(), snapshot.clone());
        tracing::debug!(path = ?matched, runnable, "resolved tool");

        Ok(Resolution {
            tool: snapshot,
            residual: argv[matched.len()..].to_vec(),
            runnable,
        })
    }

    /// Try to answer from the cache.
    ///
    /// A cached entry at a prefix of argv is only valid when the walk
    /// provably could not have gone deeper: the next argv segment must
    /// match neither a child of the cached definition nor a pending source
    /// that would materialize one.
    fn cache_lookup(&self, argv: &[String]) -> Option<Resolution> {
        for len in (0..=argv.len()).rev() {
            let key = &argv[..len];
            let Some(tool) = self.cache.get(key) else {
                continue;
            };
            if len < argv.len() {
                let next = &argv[len];
                if tool.resolve_child_segment(next).is_some() {
                    continue;
                }
                let blocked = self.pending.iter().any(|p| {
                    p.prefix.len() > len && starts_with(&p.prefix, key) && p.prefix[len] == *next
                });
                if blocked {
                    continue;
                }
            }
            let runnable = tool.is_runnable();
            if self.strict && !runnable {
                continue;
            }
            return Some(Resolution {
                tool: tool.clone(),
                residual: argv[len..].to_vec(),
                runnable,
            });
        }
        None
    }

    /// Force every pending source registered at exactly this path, in
    /// registration order.
    fn force_pending(&mut self, path: &[String], env: &SourceEnv<'_>) -> EngineResult<()> {
        if !self.pending.iter().any(|p| p.prefix == path) {
            return Ok(());
        }

        let mut due = Vec::new();
        let mut index = 0;
        while index < self.pending.len() {
            if self.pending[index].prefix == path {
                due.push(self.pending.remove(index));
            } else {
                index += 1;
            }
        }

        for pending in due {
            tracing::debug!(prefix = ?pending.prefix, "forcing tool source");
            let node = self.node_mut_or_create(&pending.prefix);
            let mut dsl = ToolDsl::new(node, env);
            pending.source.eval(&mut dsl)?;
        }
        Ok(())
    }

    fn node(&self, path: &[String]) -> Option<&ToolDefinition> {
        let mut node = &self.root;
        for segment in path {
            node = node.child(segment)?;
        }
        Some(node)
    }

    fn node_mut_or_create(&mut self, path: &[String]) -> &mut ToolDefinition {
        let mut node = &mut self.root;
        for segment in path {
            node = node.get_or_create_child(segment.clone());
        }
        node
    }
}

fn starts_with(path: &[String], prefix: &[String]) -> bool {
    path.len() >= prefix.len() && path[..prefix.len()] == *prefix
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mixin::DefaultMixinRegistry;
    use crate::tool::RunHandler;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn argv(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    struct Fixture {
        registry: DefaultMixinRegistry,
        handlers: HashMap<String, RunHandler>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                registry: DefaultMixinRegistry::new(),
                handlers: HashMap::new(),
            }
        }

        fn env(&self) -> SourceEnv<'_> {
            SourceEnv {
                mixins: &self.registry,
                handlers: &self.handlers,
            }
        }
    }

    fn runnable_source(paths: &'static [&'static [&'static str]]) -> Source {
        Source::from_fn(move |dsl| {
            for path in paths {
                define_path(dsl, path)?;
            }
            Ok(())
        })
    }

    fn define_path(dsl: &mut ToolDsl<'_>, path: &[&str]) -> EngineResult<()> {
        match path {
            [] => {
                dsl.run(|_ctx| Ok(()));
                Ok(())
            }
            [head, rest @ ..] => {
                let rest: Vec<&str> = rest.to_vec();
                dsl.tool(head, move |child| define_path(child, &rest))
            }
        }
    }

    #[test]
    fn test_longest_prefix_wins() {
        let fixture = Fixture::new();
        let mut tree = ToolTree::new();
        tree.add_source(
            vec![],
            runnable_source(&[&["a"], &["a", "b"], &["a", "b", "c"]]),
        );

        let resolution = tree
            .resolve(&argv(&["a", "b", "x", "y"]), &fixture.env())
            .unwrap();
        assert_eq!(resolution.tool.full_name(), &["a", "b"]);
        assert_eq!(resolution.residual, argv(&["x", "y"]));
        assert!(resolution.runnable);
    }

    #[test]
    fn test_residual_is_exact_suffix() {
        let fixture = Fixture::new();
        let mut tree = ToolTree::new();
        tree.add_source(vec![], runnable_source(&[&["deploy"]]));

        let resolution = tree
            .resolve(&argv(&["deploy", "--force", "prod"]), &fixture.env())
            .unwrap();
        assert_eq!(resolution.residual, argv(&["--force", "prod"]));
    }

    #[test]
    fn test_namespace_outcome_when_not_runnable() {
        let fixture = Fixture::new();
        let mut tree = ToolTree::new();
        tree.add_source(vec![], runnable_source(&[&["gem", "build"]]));

        let resolution = tree.resolve(&argv(&["gem"]), &fixture.env()).unwrap();
        assert!(!resolution.runnable);
        assert_eq!(resolution.tool.full_name(), &["gem"]);
        assert!(resolution.residual.is_empty());
    }

    #[test]
    fn test_empty_tree_resolves_to_root_namespace() {
        let fixture = Fixture::new();
        let mut tree = ToolTree::new();
        let resolution = tree.resolve(&argv(&["anything"]), &fixture.env()).unwrap();
        assert!(!resolution.runnable);
        assert!(resolution.tool.full_name().is_empty());
        assert_eq!(resolution.residual, argv(&["anything"]));
    }

    #[test]
    fn test_strict_mode_rejects_namespace_outcome() {
        let fixture = Fixture::new();
        let mut tree = ToolTree::new();
        tree.set_strict(true);
        tree.add_source(vec![], runnable_source(&[&["gem", "build"]]));

        let err = tree.resolve(&argv(&["gem"]), &fixture.env()).unwrap_err();
        match err {
            EngineError::NoSuchTool { path } => assert_eq!(path, "gem"),
            other => panic!("expected NoSuchTool, got {:?}", other),
        }
    }

    #[test]
    fn test_lazy_sources_force_only_along_walked_path() {
        let fixture = Fixture::new();
        let forced = Arc::new(AtomicUsize::new(0));

        let mut tree = ToolTree::new();
        tree.add_source(vec![], runnable_source(&[&["a", "run"], &["b", "run"]]));

        let forced_a = forced.clone();
        tree.add_source(
            argv(&["a"]),
            Source::from_fn(move |dsl| {
                forced_a.fetch_add(1, Ordering::SeqCst);
                dsl.tool("lazy", |t| {
                    t.run(|_ctx| Ok(()));
                    Ok(())
                })
            }),
        );
        let forced_b = forced.clone();
        tree.add_source(
            argv(&["b"]),
            Source::from_fn(move |dsl| {
                forced_b.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        );

        let resolution = tree.resolve(&argv(&["a", "lazy"]), &fixture.env()).unwrap();
        assert!(resolution.runnable);
        // Only the source under "a" was forced; "b" stayed deferred.
        assert_eq!(forced.load(Ordering::SeqCst), 1);
        assert_eq!(tree.pending_len(), 1);
    }

    #[test]
    fn test_source_materializes_unseen_prefix() {
        // A source registered at a prefix whose nodes don't exist yet must
        // still materialize when the walk reaches it.
        let fixture = Fixture::new();
        let mut tree = ToolTree::new();
        tree.add_source(argv(&["ops"]), runnable_source(&[&["deploy"]]));

        let resolution = tree
            .resolve(&argv(&["ops", "deploy"]), &fixture.env())
            .unwrap();
        assert!(resolution.runnable);
        assert_eq!(resolution.tool.full_name(), &["ops", "deploy"]);
    }

    #[test]
    fn test_namespace_creation_is_idempotent_across_sources() {
        let fixture = Fixture::new();
        let mut tree = ToolTree::new();
        tree.add_source(vec![], runnable_source(&[&["a", "b"]]));
        tree.add_source(
            vec![],
            Source::from_fn(|dsl| {
                dsl.tool("a", |a| {
                    a.desc("namespace a");
                    Ok(())
                })
            }),
        );

        let resolution = tree.resolve(&argv(&["a", "b"]), &fixture.env()).unwrap();
        assert!(resolution.runnable);

        let namespace = tree.resolve(&argv(&["a"]), &fixture.env()).unwrap();
        assert_eq!(namespace.tool.description(), Some("namespace a"));
        assert!(namespace.tool.child("b").is_some());
    }

    #[test]
    fn test_resolution_cache_hit_and_invalidation() {
        let fixture = Fixture::new();
        let mut tree = ToolTree::new();
        tree.add_source(vec![], runnable_source(&[&["a"]]));

        let first = tree.resolve(&argv(&["a", "x"]), &fixture.env()).unwrap();
        let second = tree.resolve(&argv(&["a", "x"]), &fixture.env()).unwrap();
        // Same snapshot returned from the cache.
        assert!(Arc::ptr_eq(&first.tool, &second.tool));

        // Registering a more specific source invalidates the entry and
        // changes the resolution.
        tree.add_source(argv(&["a"]), runnable_source(&[&["x"]]));
        let third = tree.resolve(&argv(&["a", "x"]), &fixture.env()).unwrap();
        assert_eq!(third.tool.full_name(), &["a", "x"]);
        assert!(third.residual.is_empty());
    }

    #[test]
    fn test_cache_prefix_hit_not_misused_for_deeper_pending() {
        let fixture = Fixture::new();
        let mut tree = ToolTree::new();
        tree.add_source(vec![], runnable_source(&[&["a"]]));
        // Registered up front but never forced by the first resolve.
        tree.add_source(argv(&["a", "b"]), runnable_source(&[&[]]));

        // Cache ["a"] with argv that stops there; the deferred source under
        // ["a", "b"] stays pending.
        tree.resolve(&argv(&["a"]), &fixture.env()).unwrap();
        assert_eq!(tree.pending_len(), 1);

        // The cached prefix must not answer for argv that walks into the
        // still-pending subtree.
        let resolution = tree.resolve(&argv(&["a", "b"]), &fixture.env()).unwrap();
        assert_eq!(resolution.tool.full_name(), &["a", "b"]);
        assert!(resolution.runnable);
    }

    #[test]
    fn test_alias_resolution() {
        let fixture = Fixture::new();
        let mut tree = ToolTree::new();
        tree.add_source(
            vec![],
            Source::from_fn(|dsl| {
                dsl.tool("release", |t| {
                    t.alias("rel");
                    t.run(|_ctx| Ok(()));
                    Ok(())
                })
            }),
        );

        let resolution = tree.resolve(&argv(&["rel"]), &fixture.env()).unwrap();
        assert!(resolution.runnable);
        assert_eq!(resolution.tool.full_name(), &["release"]);
    }

    #[test]
    fn test_source_error_propagates_as_definition_error() {
        let fixture = Fixture::new();
        let mut tree = ToolTree::new();
        tree.add_source(
            vec![],
            Source::from_fn(|dsl| dsl.include("never-declared", vec![])),
        );

        let err = tree.resolve(&argv(&["x"]), &fixture.env()).unwrap_err();
        assert!(matches!(err, EngineError::UnknownMixin { .. }));
    }
}
