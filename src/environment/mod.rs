//! Environment definition and resolution.
//!
//! Determines which deployment environment (production, staging, ...) is
//! active. The active environment selects environment-specific config
//! files such as `db.staging.yaml`. The priority chain is:
//!
//! 1. Manually set tag
//! 2. System environment variable (`BUILD_ENV`)
//! 3. VCS branch name
//! 4. Test binary detection
//! 5. Fallback to "local"

pub mod definition;
pub mod resolver;
pub mod vcs;

pub use definition::{Environment, Inference};
pub use resolver::{EnvironmentResolver, DEFAULT_SYSTEM_VARIABLE};
pub use vcs::{GitRepository, StaticBranch, VcsInfo, VersionControl};
