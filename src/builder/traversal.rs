//! Depth-first construction of an object graph.
//!
//! [`Builder::build`] hands the root a [`Fields`] visitor. Every slot the
//! root offers is classified, in priority order:
//!
//! 1. already holds a non-default value: left alone
//! 2. marked to skip: left alone
//! 3. the type has a constructor: made from its config files
//! 4. a factory is registered for the type: made from its config files
//! 5. otherwise its own slots are resolved first, then it is configured in
//!    place when it supports that
//!
//! The first error aborts the build. The slot that failed is never
//! assigned; slots completed before it keep their values.

use crate::builder::component::{Component, Instance, Member};
use crate::builder::registry::FactoryRegistry;
use crate::builder::report::{short_type_name, BuildReport, Outcome, ReportNode};
use crate::config::{ConfigFiles, EmbeddedFiles, FileLocator, FileSource, LocalFiles, Loader};
use crate::environment::{Environment, EnvironmentResolver};
use crate::error::{Error, Result};
use include_dir::Dir;
use std::any::{type_name, Any, TypeId};
use std::path::PathBuf;
use std::sync::Arc;

/// Builds and configures object graphs from layered config files.
///
/// A builder owns no global state. Share one across threads to run
/// builds concurrently; registrations and the resolver are synchronized.
#[derive(Debug)]
pub struct Builder {
    locator: FileLocator,
    loader: Arc<Loader>,
    resolver: Arc<EnvironmentResolver>,
    registry: FactoryRegistry,
    case_sensitive: bool,
}

impl Builder {
    pub fn new(source: Arc<dyn FileSource>) -> Self {
        Self {
            locator: FileLocator::new(source.clone()),
            loader: Arc::new(Loader::new(source)),
            resolver: Arc::new(EnvironmentResolver::default()),
            registry: FactoryRegistry::new(),
            case_sensitive: false,
        }
    }

    /// A builder reading config files from `dir`.
    pub fn local(dir: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(LocalFiles::new(dir)))
    }

    /// A builder reading config files embedded in the binary.
    pub fn embedded(dir: &'static Dir<'static>) -> Self {
        Self::new(Arc::new(EmbeddedFiles::new(dir)))
    }

    pub fn with_resolver(mut self, resolver: Arc<EnvironmentResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Locate and load through `loader` (its source, formats and env lookup).
    pub fn with_loader(mut self, loader: Loader) -> Self {
        self.locator = FileLocator::new(loader.source().clone())
            .with_formats(loader.formats().clone())
            .case_sensitive(self.case_sensitive);
        self.loader = Arc::new(loader);
        self
    }

    /// Match config file names case-sensitively.
    pub fn case_sensitive(mut self, enabled: bool) -> Self {
        self.case_sensitive = enabled;
        self.locator = self.locator.case_sensitive(enabled);
        self
    }

    pub fn resolver(&self) -> &Arc<EnvironmentResolver> {
        &self.resolver
    }

    pub fn loader(&self) -> &Arc<Loader> {
        &self.loader
    }

    pub fn locator(&self) -> &FileLocator {
        &self.locator
    }

    pub fn registry(&self) -> &FactoryRegistry {
        &self.registry
    }

    /// Make slots of type `T` with `factory`.
    pub fn register<T, F>(&self, factory: F) -> &Self
    where
        T: Any,
        F: Fn(&ConfigFiles) -> anyhow::Result<Instance> + Send + Sync + 'static,
    {
        self.registry.register::<T, F>(factory);
        self
    }

    /// Make slots of type `T` with a factory returning `T`.
    pub fn register_typed<T, F>(&self, factory: F) -> &Self
    where
        T: Any + Send,
        F: Fn(&ConfigFiles) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        self.registry.register_typed::<T, F>(factory);
        self
    }

    /// Build every slot reachable from `root`.
    ///
    /// The environment is resolved once per build. The root itself is
    /// never constructed or configured; only its slots are.
    ///
    /// # Errors
    ///
    /// - `FileNotFound` when a slot to make or configure has no config file
    /// - `Construction` when a constructor or factory fails or returns
    ///   another type
    /// - `Configuration` when a configure hook fails
    pub fn build<T: Component>(&self, root: &mut T) -> Result<BuildReport> {
        let environment = self.resolver.current();
        tracing::info!(
            "Building {} for environment {}",
            short_type_name(type_name::<T>()),
            environment
        );

        let mut state = TraversalState {
            environment,
            sequence: 0,
        };
        let children = {
            let mut fields = Fields::new(self, &mut state, String::new(), 1);
            root.fields(&mut fields)?;
            fields.nodes
        };

        state.sequence += 1;
        let root = ReportNode {
            name: "root".to_string(),
            path: String::new(),
            type_name: type_name::<T>().to_string(),
            outcome: Outcome::Root,
            files: Vec::new(),
            order: state.sequence,
            children,
        };

        Ok(BuildReport {
            environment: state.environment,
            vcs: self.resolver.vcs_info(),
            root,
        })
    }

    /// Like [`Builder::build`], failing with `InvalidRoot` when there is no
    /// root.
    pub fn try_build<T: Component>(&self, root: Option<&mut T>) -> Result<BuildReport> {
        match root {
            Some(root) => self.build(root),
            None => Err(Error::InvalidRoot {
                message: format!("expected a {} to build, got nothing", type_name::<T>()),
            }),
        }
    }

    fn config_files(&self, member: &Member, environment: &Environment) -> Result<ConfigFiles> {
        let paths = self.locator.locate(&member.files(), Some(environment))?;
        Ok(ConfigFiles::new(
            paths,
            self.loader.clone(),
            environment.clone(),
        ))
    }
}

struct TraversalState {
    environment: Environment,
    sequence: usize,
}

/// The slots of one component, offered to the builder.
///
/// Call one method per slot from [`Component::fields`]. The method picks
/// the zero test for the slot kind: `T::default()` for values, `None` for
/// options.
pub struct Fields<'a> {
    builder: &'a Builder,
    state: &'a mut TraversalState,
    path: String,
    depth: usize,
    nodes: Vec<ReportNode>,
}

impl<'a> Fields<'a> {
    fn new(builder: &'a Builder, state: &'a mut TraversalState, path: String, depth: usize) -> Self {
        Self {
            builder,
            state,
            path,
            depth,
            nodes: Vec::new(),
        }
    }

    /// Dotted path of the component owning these slots.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Nesting level of these slots; the root's slots are at 1.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The environment of the running build.
    pub fn environment(&self) -> &Environment {
        &self.state.environment
    }

    /// A component held by value.
    pub fn component<T>(&mut self, member: impl Into<Member>, slot: &mut T) -> Result<()>
    where
        T: Component + Default + PartialEq,
    {
        let member = member.into();
        if *slot != T::default() {
            return self.leaf::<T>(&member, Outcome::AlreadyConfigured);
        }
        if member.options().skip {
            return self.leaf::<T>(&member, Outcome::Skipped);
        }

        let (value, node) = self.resolve::<T>(&member)?;
        *slot = value;
        self.nodes.push(node);
        Ok(())
    }

    /// An optional component, allocated when empty.
    ///
    /// The slot is only filled once the new value resolved successfully.
    pub fn optional<T>(&mut self, member: impl Into<Member>, slot: &mut Option<T>) -> Result<()>
    where
        T: Component + Default,
    {
        let member = member.into();
        if member.options().skip {
            return self.leaf::<Option<T>>(&member, Outcome::Skipped);
        }
        if slot.is_some() {
            return self.leaf::<Option<T>>(&member, Outcome::AlreadyConfigured);
        }

        let (value, node) = self.resolve::<T>(&member)?;
        *slot = Some(value);
        self.nodes.push(node);
        Ok(())
    }

    /// A value of a type that is not a [`Component`]; only a registered
    /// factory can make it.
    pub fn external<T>(&mut self, member: impl Into<Member>, slot: &mut T) -> Result<()>
    where
        T: Any + Send + Default + PartialEq,
    {
        let member = member.into();
        if *slot != T::default() {
            return self.leaf::<T>(&member, Outcome::AlreadyConfigured);
        }
        if member.options().skip {
            return self.leaf::<T>(&member, Outcome::Skipped);
        }

        match self.make_registered::<T>(&member)? {
            Some((value, files)) => {
                *slot = value;
                let node = self.node::<T>(&member, Outcome::MadeFromRegisteredFactory, files, Vec::new());
                self.nodes.push(node);
                Ok(())
            }
            None => self.leaf::<T>(&member, Outcome::Unhandled),
        }
    }

    /// An optional value of a type that is not a [`Component`].
    pub fn external_optional<T>(&mut self, member: impl Into<Member>, slot: &mut Option<T>) -> Result<()>
    where
        T: Any + Send,
    {
        let member = member.into();
        if member.options().skip {
            return self.leaf::<Option<T>>(&member, Outcome::Skipped);
        }
        if slot.is_some() {
            return self.leaf::<Option<T>>(&member, Outcome::AlreadyConfigured);
        }

        match self.make_registered::<T>(&member)? {
            Some((value, files)) => {
                *slot = Some(value);
                let node = self.node::<T>(&member, Outcome::MadeFromRegisteredFactory, files, Vec::new());
                self.nodes.push(node);
                Ok(())
            }
            None => self.leaf::<Option<T>>(&member, Outcome::Unhandled),
        }
    }

    /// Make a new value for an empty slot. Nothing is handed back unless
    /// the value and everything below it resolved.
    fn resolve<T: Component + Default>(&mut self, member: &Member) -> Result<(T, ReportNode)> {
        let path = self.child_path(member.name());

        if let Some(constructor) = T::constructor() {
            let files = self.builder.config_files(member, &self.state.environment)?;
            let value = construct::<T>(&path, &files, constructor)?;
            let paths = files.paths().to_vec();
            let node = self.node::<T>(member, Outcome::MadeFromFactory, paths, Vec::new());
            return Ok((value, node));
        }

        if let Some((value, paths)) = self.make_registered::<T>(member)? {
            let node = self.node::<T>(member, Outcome::MadeFromRegisteredFactory, paths, Vec::new());
            return Ok((value, node));
        }

        let mut value = T::default();
        let children = {
            let mut fields = Fields::new(self.builder, &mut *self.state, path.clone(), self.depth + 1);
            value.fields(&mut fields)?;
            fields.nodes
        };

        let configured = match value.configurable() {
            Some(target) => {
                let files = self.builder.config_files(member, &self.state.environment)?;
                target
                    .configure(&files)
                    .map_err(|source| Error::Configuration {
                        field: path.clone(),
                        type_name: type_name::<T>().to_string(),
                        files: files.paths().to_vec(),
                        source,
                    })?;
                Some(files.paths().to_vec())
            }
            None => None,
        };

        let node = match configured {
            Some(paths) => self.node::<T>(member, Outcome::Configured, paths, children),
            None if children.iter().any(|child| child.outcome.is_handled()) => {
                self.node::<T>(member, Outcome::Traversed, Vec::new(), children)
            }
            None => self.node::<T>(member, Outcome::Unhandled, Vec::new(), children),
        };
        Ok((value, node))
    }

    fn make_registered<T: Any>(&self, member: &Member) -> Result<Option<(T, Vec<PathBuf>)>> {
        let Some(factory) = self.builder.registry.get(TypeId::of::<T>()) else {
            return Ok(None);
        };
        let path = self.child_path(member.name());
        let files = self.builder.config_files(member, &self.state.environment)?;
        let value = construct::<T>(&path, &files, |files| factory(files))?;
        Ok(Some((value, files.paths().to_vec())))
    }

    fn leaf<T>(&mut self, member: &Member, outcome: Outcome) -> Result<()> {
        let node = self.node::<T>(member, outcome, Vec::new(), Vec::new());
        self.nodes.push(node);
        Ok(())
    }

    fn node<T>(
        &mut self,
        member: &Member,
        outcome: Outcome,
        files: Vec<PathBuf>,
        children: Vec<ReportNode>,
    ) -> ReportNode {
        self.state.sequence += 1;
        let path = self.child_path(member.name());
        tracing::debug!(
            "{} ({}) -> {}",
            path,
            short_type_name(type_name::<T>()),
            outcome
        );

        ReportNode {
            name: member.name().to_string(),
            path,
            type_name: type_name::<T>().to_string(),
            outcome,
            files,
            order: self.state.sequence,
            children,
        }
    }

    fn child_path(&self, name: &str) -> String {
        if self.path.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.path, name)
        }
    }
}

/// Run a constructor or factory and check the type of what it made.
fn construct<T: Any>(
    path: &str,
    files: &ConfigFiles,
    make: impl FnOnce(&ConfigFiles) -> anyhow::Result<Instance>,
) -> Result<T> {
    let expected = type_name::<T>();
    let instance = make(files).map_err(|e| Error::Construction {
        field: path.to_string(),
        expected: expected.to_string(),
        message: format!("{:#}", e),
    })?;

    instance.downcast::<T>().map_err(|other| Error::Construction {
        field: path.to_string(),
        expected: expected.to_string(),
        message: format!("wrong type returned: {}", other.type_name()),
    })
}
