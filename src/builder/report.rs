//! Per-field outcome of a build.
//!
//! Every slot visited by the builder gets a [`ReportNode`]. The tree is
//! informational: it never changes what the build does.

use crate::environment::{Environment, VcsInfo};
use console::Style;
use regex::Regex;
use std::fmt;
use std::path::PathBuf;
use std::sync::LazyLock;

static MODULE_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:[a-z_][a-z0-9_]*::)+").expect("valid module path regex"));

/// How the builder dealt with a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The value handed to `build`.
    Root,
    Skipped,
    /// The slot already held a non-default value and was left alone.
    AlreadyConfigured,
    /// No capability and nothing handled below it.
    Unhandled,
    /// No capability, but children were handled.
    Traversed,
    Configured,
    /// Made by the type's own constructor.
    MadeFromFactory,
    MadeFromRegisteredFactory,
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Root => "loading",
            Outcome::Skipped => "skip",
            Outcome::AlreadyConfigured => "already configured...",
            Outcome::Unhandled => "unhandled...",
            Outcome::Traversed => "traversing",
            Outcome::Configured => "configured",
            Outcome::MadeFromFactory => "made by constructor",
            Outcome::MadeFromRegisteredFactory => "made by registered factory",
        }
    }

    /// Whether the slot, or something below it, was built.
    pub fn is_handled(&self) -> bool {
        matches!(
            self,
            Outcome::Configured
                | Outcome::MadeFromFactory
                | Outcome::MadeFromRegisteredFactory
                | Outcome::Traversed
        )
    }

    fn incoming(&self) -> bool {
        !matches!(
            self,
            Outcome::Skipped | Outcome::AlreadyConfigured | Outcome::Unhandled
        )
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One visited slot.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportNode {
    pub name: String,
    /// Dotted path from the root (`services.mailer`).
    pub path: String,
    pub type_name: String,
    pub outcome: Outcome,
    /// Files handed to the constructor or configure hook.
    pub files: Vec<PathBuf>,
    /// Completion order across the whole build, starting at 1.
    pub order: usize,
    pub children: Vec<ReportNode>,
}

impl ReportNode {
    fn walk<'a>(&'a self, out: &mut Vec<&'a ReportNode>) {
        out.push(self);
        for child in &self.children {
            child.walk(out);
        }
    }
}

/// Filters for [`BuildReport::render`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    pub hide_skipped: bool,
    pub hide_unhandled: bool,
    pub colored: bool,
}

/// Result of a successful build.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub environment: Environment,
    pub vcs: Option<VcsInfo>,
    pub root: ReportNode,
}

impl BuildReport {
    /// The node at a dotted path; the empty path is the root.
    pub fn find(&self, path: &str) -> Option<&ReportNode> {
        self.nodes().into_iter().find(|node| node.path == path)
    }

    pub fn outcome(&self, path: &str) -> Option<Outcome> {
        self.find(path).map(|node| node.outcome)
    }

    /// Every node, root first, parents before their children.
    pub fn nodes(&self) -> Vec<&ReportNode> {
        let mut out = Vec::new();
        self.root.walk(&mut out);
        out
    }

    /// Render the tree like a struct declaration.
    ///
    /// ```text
    /// type Toolbox struct {
    ///   mailer Mailer                    <- configured (mailer.yaml, mailer.local.yaml)
    ///   media Media                      <- traversing
    ///      └─ pictures Service           <- made by registered factory (pictures.yaml)
    /// }
    /// ```
    pub fn render(&self, options: &ReportOptions) -> String {
        let theme = ReportTheme::new(options.colored);
        let mut out = String::new();

        out.push_str(&format!("Environment: {}\n", self.environment));
        if let Some(vcs) = &self.vcs {
            out.push_str(&format!("{}\n", vcs));
        }

        out.push_str(&format!(
            "{} {} {} {{\n",
            theme.keyword.apply_to("type"),
            theme.name.apply_to(short_type_name(&self.root.type_name)),
            theme.keyword.apply_to("struct"),
        ));
        for child in &self.root.children {
            render_node(&mut out, child, 1, options, &theme);
        }
        out.push_str("}\n");
        out
    }
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(&ReportOptions::default()))
    }
}

fn render_node(
    out: &mut String,
    node: &ReportNode,
    level: usize,
    options: &ReportOptions,
    theme: &ReportTheme,
) {
    let hidden = match node.outcome {
        Outcome::Skipped => options.hide_skipped,
        Outcome::Unhandled => options.hide_unhandled,
        _ => false,
    };
    if hidden {
        return;
    }

    let name = if level > 1 {
        format!("{}└─ {}", "   ".repeat(level - 1), node.name)
    } else {
        format!("  {}", node.name)
    };
    let left = format!("{} {}", name, short_type_name(&node.type_name));
    let arrow = if node.outcome.incoming() { "<-" } else { "->" };

    out.push_str(&format!(
        "{:<60} {} {}",
        left,
        arrow,
        theme.outcome(node.outcome).apply_to(node.outcome.label())
    ));
    if !node.files.is_empty() {
        let files: Vec<String> = node
            .files
            .iter()
            .map(|f| {
                f.file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| f.display().to_string())
            })
            .collect();
        out.push_str(&format!(" ({})", theme.files.apply_to(files.join(", "))));
    }
    out.push('\n');

    for child in &node.children {
        render_node(out, child, level + 1, options, theme);
    }
}

/// `alloc::vec::Vec<app::Tool>` becomes `Vec<Tool>`.
pub fn short_type_name(name: &str) -> String {
    MODULE_PATH.replace_all(name, "").to_string()
}

struct ReportTheme {
    keyword: Style,
    name: Style,
    files: Style,
    skipped: Style,
    already: Style,
    unhandled: Style,
    configured: Style,
    made: Style,
    plain: Style,
}

impl ReportTheme {
    fn new(colored: bool) -> Self {
        if !colored {
            return Self {
                keyword: Style::new(),
                name: Style::new(),
                files: Style::new(),
                skipped: Style::new(),
                already: Style::new(),
                unhandled: Style::new(),
                configured: Style::new(),
                made: Style::new(),
                plain: Style::new(),
            };
        }
        Self {
            keyword: Style::new().magenta(),
            name: Style::new().yellow(),
            files: Style::new().dim(),
            skipped: Style::new().yellow(),
            already: Style::new().white(),
            unhandled: Style::new().dim(),
            configured: Style::new().green(),
            made: Style::new().blue(),
            plain: Style::new(),
        }
    }

    fn outcome(&self, outcome: Outcome) -> &Style {
        match outcome {
            Outcome::Skipped => &self.skipped,
            Outcome::AlreadyConfigured => &self.already,
            Outcome::Unhandled => &self.unhandled,
            Outcome::Configured => &self.configured,
            Outcome::MadeFromFactory | Outcome::MadeFromRegisteredFactory => &self.made,
            Outcome::Root | Outcome::Traversed => &self.plain,
        }
    }
}
