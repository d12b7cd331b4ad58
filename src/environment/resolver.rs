//! Environment resolution.
//!
//! Resolves the active environment using an ordered fallback chain. The
//! first source that yields a non-empty tag wins:
//!
//! 1. A manually set tag
//! 2. A system environment variable (`BUILD_ENV` by default)
//! 3. The VCS branch name, when a VCS source is configured and healthy
//! 4. `testing`, when the running binary looks like a test binary
//! 5. Nothing: the active environment is `local`
//!
//! The tag is then matched against the registered environments in
//! registration order. Resolution never fails; anything unmatched resolves
//! to `local`.

use super::definition::{Environment, Inference};
use super::vcs::{VcsInfo, VersionControl};
use regex::Regex;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// Default system variable consulted for the environment tag.
pub const DEFAULT_SYSTEM_VARIABLE: &str = "BUILD_ENV";

/// Names of test binaries: `_test`/`.test` suffixes and cargo's
/// `deps/<crate>-<hash>` harness executables.
const TEST_BINARY_PATTERN: &str =
    r"(_test)|(\.test$)|(_Test)|([/\\]deps[/\\][^/\\]+-[0-9a-f]{16}(\.exe)?$)";

struct ResolverState {
    manual_tag: Option<String>,
    system_variable: String,
    vcs: Option<Arc<dyn VersionControl>>,
    program_name: Option<String>,
    test_binary: Regex,
    environments: Vec<Environment>,
}

/// Determines the single active [`Environment`].
///
/// The resolver is shared between concurrent builds; every method takes
/// `&self` and serializes access internally. Resolution is recomputed on
/// each call to [`EnvironmentResolver::current`].
///
/// # Example
///
/// ```
/// use toolshed::environment::{EnvironmentResolver, Inference};
///
/// let resolver = EnvironmentResolver::default();
/// resolver.set_manual_tag("release/1.4");
///
/// let env = resolver.current();
/// assert_eq!(env.tag(), "staging");
/// assert_eq!(env.inferred_by(), Some(&Inference::Manual("release/1.4".into())));
/// ```
pub struct EnvironmentResolver {
    state: Mutex<ResolverState>,
}

impl EnvironmentResolver {
    /// Create a resolver over the given environments, in matching order.
    pub fn new(environments: Vec<Environment>) -> Self {
        Self {
            state: Mutex::new(ResolverState {
                manual_tag: None,
                system_variable: DEFAULT_SYSTEM_VARIABLE.to_string(),
                vcs: None,
                program_name: std::env::args().next(),
                test_binary: Regex::new(TEST_BINARY_PATTERN).expect("valid test binary pattern"),
                environments,
            }),
        }
    }

    /// The default environments plus `custom` appended after them.
    pub fn with_custom(custom: impl IntoIterator<Item = Environment>) -> Self {
        let mut environments = Environment::defaults();
        environments.extend(custom);
        Self::new(environments)
    }

    /// Consult `name` instead of `BUILD_ENV`.
    pub fn with_system_variable(self, name: impl Into<String>) -> Self {
        self.lock().system_variable = name.into();
        self
    }

    /// Use a VCS source for branch-based detection.
    pub fn with_vcs(self, vcs: Arc<dyn VersionControl>) -> Self {
        self.lock().vcs = Some(vcs);
        self
    }

    /// Override the program name checked against the test binary pattern.
    pub fn with_program_name(self, name: Option<String>) -> Self {
        self.lock().program_name = name;
        self
    }

    /// Override the test binary pattern.
    pub fn with_test_binary_pattern(self, pattern: Regex) -> Self {
        self.lock().test_binary = pattern;
        self
    }

    /// Set the tag manually. An empty tag clears it.
    pub fn set_manual_tag(&self, tag: impl Into<String>) {
        let tag = tag.into();
        self.lock().manual_tag = if tag.is_empty() { None } else { Some(tag) };
    }

    /// Remove a manually set tag.
    pub fn clear_manual_tag(&self) {
        self.lock().manual_tag = None;
    }

    /// Register another environment after the existing ones.
    pub fn add_environment(&self, environment: Environment) {
        self.lock().environments.push(environment);
    }

    /// The registered environments in matching order.
    pub fn environments(&self) -> Vec<Environment> {
        self.lock().environments.clone()
    }

    /// VCS details for diagnostics, when a VCS source is configured.
    pub fn vcs_info(&self) -> Option<VcsInfo> {
        let vcs = self.lock().vcs.clone();
        vcs.map(|v| v.info())
    }

    /// Resolve the active environment from the process environment.
    pub fn current(&self) -> Environment {
        self.current_with_env(|key| std::env::var(key))
    }

    /// Resolve with a custom env var lookup (for testing).
    pub fn current_with_env<F>(&self, env_fn: F) -> Environment
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let state = self.lock();
        let (tag, inference) = Self::candidate(&state, &env_fn);

        let matched = state
            .environments
            .iter()
            .find(|env| env.matches(&tag))
            .cloned()
            .unwrap_or_else(Environment::local);

        matched.with_inference(inference)
    }

    fn candidate<F>(state: &ResolverState, env_fn: &F) -> (String, Inference)
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        // 1. Manual tag
        if let Some(tag) = &state.manual_tag {
            return (tag.clone(), Inference::Manual(tag.clone()));
        }

        // 2. System variable
        if let Ok(tag) = env_fn(&state.system_variable) {
            if !tag.is_empty() {
                let inference = Inference::SystemVariable(state.system_variable.clone(), tag.clone());
                return (tag, inference);
            }
        }

        // 3. VCS branch
        if let Some(vcs) = &state.vcs {
            match vcs.branch_name() {
                Ok(branch) if !branch.is_empty() => {
                    return (branch.clone(), Inference::VcsBranch(branch));
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("Ignoring VCS source for environment detection: {}", e),
            }
        }

        // 4. Test binary
        if let Some(program) = &state.program_name {
            if state.test_binary.is_match(program) {
                let tag = Environment::testing().tag().to_string();
                return (tag, Inference::TestBinary(program.clone()));
            }
        }

        // 5. Nothing
        (String::new(), Inference::Fallback)
    }

    fn lock(&self) -> MutexGuard<'_, ResolverState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl fmt::Debug for EnvironmentResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("EnvironmentResolver")
            .field("manual_tag", &state.manual_tag)
            .field("system_variable", &state.system_variable)
            .field("vcs", &state.vcs.is_some())
            .field(
                "environments",
                &state.environments.iter().map(Environment::tag).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Default for EnvironmentResolver {
    fn default() -> Self {
        Self::new(Environment::defaults())
    }
}
