//! Integration tests for environment resolution.

use std::env::VarError;
use std::sync::Arc;
use toolshed::environment::{
    Environment, EnvironmentResolver, Inference, StaticBranch, VersionControl,
};
use toolshed::Error;

fn no_env(_: &str) -> Result<String, VarError> {
    Err(VarError::NotPresent)
}

fn not_a_test_binary() -> EnvironmentResolver {
    EnvironmentResolver::default().with_program_name(Some("/usr/local/bin/app".into()))
}

struct BrokenVcs;

impl VersionControl for BrokenVcs {
    fn branch_name(&self) -> anyhow::Result<String> {
        anyhow::bail!("not a git repository")
    }
}

#[test]
fn manual_tag_beats_everything() {
    let resolver = not_a_test_binary().with_vcs(Arc::new(StaticBranch("develop".into())));
    resolver.set_manual_tag("v2.1.0");

    let env = resolver.current_with_env(|_| Ok("staging".to_string()));
    assert_eq!(env.tag(), "production");
    assert_eq!(env.inferred_by(), Some(&Inference::Manual("v2.1.0".into())));
}

#[test]
fn system_variable_beats_vcs() {
    let resolver = not_a_test_binary()
        .with_system_variable("APP_ENV")
        .with_vcs(Arc::new(StaticBranch("master".into())));

    let env = resolver.current_with_env(|name| match name {
        "APP_ENV" => Ok("bugfix/crash".to_string()),
        _ => Err(VarError::NotPresent),
    });
    assert_eq!(env.tag(), "staging");
    assert_eq!(
        env.inferred_by(),
        Some(&Inference::SystemVariable("APP_ENV".into(), "bugfix/crash".into()))
    );
}

#[test]
fn empty_system_variable_falls_through() {
    let resolver = not_a_test_binary().with_vcs(Arc::new(StaticBranch("feature/login".into())));
    let env = resolver.current_with_env(|_| Ok(String::new()));
    assert_eq!(env.tag(), "development");
    assert_eq!(
        env.inferred_by(),
        Some(&Inference::VcsBranch("feature/login".into()))
    );
}

#[test]
fn broken_vcs_falls_through_to_local() {
    let resolver = not_a_test_binary().with_vcs(Arc::new(BrokenVcs));
    let env = resolver.current_with_env(no_env);
    assert_eq!(env.tag(), "local");
    assert_eq!(env.inferred_by(), Some(&Inference::Fallback));
}

#[test]
fn test_binaries_resolve_to_testing() {
    let resolver = EnvironmentResolver::default()
        .with_program_name(Some("/work/target/debug/deps/app-0123456789abcdef".into()));
    let env = resolver.current_with_env(no_env);
    assert_eq!(env.tag(), "testing");
    assert!(matches!(env.inferred_by(), Some(Inference::TestBinary(_))));
}

#[test]
fn unmatched_tag_resolves_to_local() {
    let resolver = not_a_test_binary();
    resolver.set_manual_tag("something-else");
    assert_eq!(resolver.current_with_env(no_env).tag(), "local");
}

#[test]
fn default_environments_match_in_order() {
    let resolver = not_a_test_binary();
    let cases = [
        ("master", "production"),
        ("v1", "production"),
        ("v1.4.2", "production"),
        ("release/3.0", "staging"),
        ("hotfix/x", "staging"),
        ("test", "testing"),
        ("dev", "development"),
        ("local", "local"),
    ];
    for (tag, expected) in cases {
        resolver.set_manual_tag(tag);
        assert_eq!(resolver.current_with_env(no_env).tag(), expected, "tag {}", tag);
    }
}

#[test]
fn custom_environments_are_matched_after_defaults() {
    let resolver = EnvironmentResolver::with_custom([Environment::new("qa", r"^(qa|uat)").unwrap()])
        .with_program_name(None);

    resolver.set_manual_tag("uat-2");
    assert_eq!(resolver.current_with_env(no_env).tag(), "qa");

    resolver.add_environment(Environment::new("sandbox", "sandbox").unwrap());
    resolver.set_manual_tag("sandbox");
    assert_eq!(resolver.current_with_env(no_env).tag(), "sandbox");
    assert_eq!(resolver.environments().len(), 7);
}

#[test]
fn environment_tag_must_match_its_pattern() {
    let err = Environment::new("qa", "^uat$").unwrap_err();
    assert!(matches!(err, Error::EnvironmentInvalid { ref tag, .. } if tag == "qa"));

    let err = Environment::new("qa", "(unclosed").unwrap_err();
    assert!(matches!(err, Error::EnvironmentInvalid { .. }));
}

#[test]
fn clearing_manual_tag_restores_detection() {
    let resolver = not_a_test_binary();
    resolver.set_manual_tag("production");
    resolver.clear_manual_tag();
    assert_eq!(resolver.current_with_env(no_env).tag(), "local");
}

#[test]
fn vcs_info_is_exposed() {
    let resolver = not_a_test_binary().with_vcs(Arc::new(StaticBranch("main".into())));
    let info = resolver.vcs_info().unwrap();
    assert_eq!(info.branch.as_deref(), Some("main"));
}
