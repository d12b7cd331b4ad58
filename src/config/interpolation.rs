//! Placeholder rendering for config files.
//!
//! A config file may reference values already loaded into the destination
//! with `${key.path}`. The file text is rendered against the value tree and
//! decoded a second time, so one key can be composed from another:
//!
//! ```yaml
//! host: api.example.com
//! base_url: "https://${host}/v1"
//! ```
//!
//! # Syntax
//!
//! - `${name}` - top-level key
//! - `${server.port}` - nested key
//! - `${hosts.0}` - sequence element
//! - `$${escaped}` - literal `${escaped}` in output

use serde_yaml::Value;

/// A piece of a template.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Literal text
    Literal(String),
    /// Placeholder: ${path}
    Placeholder(String),
}

/// Split a template into literal text and placeholders.
pub fn parse_template(input: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        literal.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if let Some(escaped) = tail.strip_prefix("$${") {
            // $${...} stays literal
            let end = escaped.find('}').map_or(escaped.len(), |i| i + 1);
            literal.push_str("${");
            literal.push_str(&escaped[..end]);
            rest = &escaped[end..];
        } else if let Some(open) = tail.strip_prefix("${") {
            match open.find('}') {
                Some(end) => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(open[..end].trim().to_string()));
                    rest = &open[end + 1..];
                }
                None => {
                    literal.push_str(tail);
                    rest = "";
                }
            }
        } else {
            literal.push('$');
            rest = &tail[1..];
        }
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    segments
}

/// Whether the text contains at least one placeholder.
pub fn has_placeholders(input: &str) -> bool {
    parse_template(input)
        .iter()
        .any(|seg| matches!(seg, Segment::Placeholder(_)))
}

/// Whether rendering changes the text: it has a placeholder or a `$${`
/// escape.
pub fn is_template(input: &str) -> bool {
    input.contains("$${") || has_placeholders(input)
}

/// Look up a dotted path in a value tree.
pub fn lookup<'v>(context: &'v Value, path: &str) -> Option<&'v Value> {
    path.split('.').try_fold(context, |node, key| match node {
        Value::Sequence(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        Value::Mapping(map) => map.get(key),
        _ => None,
    })
}

/// Render every placeholder in `input` from `context`.
///
/// # Errors
///
/// Returns a message naming the placeholder when a path does not exist or
/// points at a mapping or sequence. Null renders as empty text.
pub fn render(input: &str, context: &Value) -> Result<String, String> {
    let mut output = String::with_capacity(input.len());

    for segment in parse_template(input) {
        match segment {
            Segment::Literal(text) => output.push_str(&text),
            Segment::Placeholder(path) => {
                let value = lookup(context, &path)
                    .ok_or_else(|| format!("unresolved placeholder ${{{}}}", path))?;
                match value {
                    Value::Null => {}
                    Value::Bool(b) => output.push_str(&b.to_string()),
                    Value::Number(n) => output.push_str(&n.to_string()),
                    Value::String(s) => output.push_str(s),
                    _ => {
                        return Err(format!(
                            "placeholder ${{{}}} does not point at a scalar value",
                            path
                        ))
                    }
                }
            }
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn parse_literal_only() {
        assert_eq!(
            parse_template("plain text"),
            vec![Segment::Literal("plain text".into())]
        );
    }

    #[test]
    fn parse_placeholder_with_surrounding_text() {
        assert_eq!(
            parse_template("https://${host}/v1"),
            vec![
                Segment::Literal("https://".into()),
                Segment::Placeholder("host".into()),
                Segment::Literal("/v1".into()),
            ]
        );
    }

    #[test]
    fn parse_adjacent_placeholders() {
        assert_eq!(
            parse_template("${a}${b}"),
            vec![
                Segment::Placeholder("a".into()),
                Segment::Placeholder("b".into()),
            ]
        );
    }

    #[test]
    fn parse_escaped_placeholder() {
        assert_eq!(
            parse_template("echo $${HOME} ${name}"),
            vec![
                Segment::Literal("echo ${HOME} ".into()),
                Segment::Placeholder("name".into()),
            ]
        );
    }

    #[test]
    fn parse_dollar_without_brace() {
        assert_eq!(
            parse_template("costs $5"),
            vec![Segment::Literal("costs $5".into())]
        );
    }

    #[test]
    fn parse_unclosed_placeholder_is_literal() {
        assert_eq!(
            parse_template("value: ${oops"),
            vec![Segment::Literal("value: ${oops".into())]
        );
        assert!(!has_placeholders("value: ${oops"));
    }

    #[test]
    fn escapes_alone_make_a_template() {
        assert!(is_template("cmd: echo $${HOME}"));
        assert!(is_template("url: ${host}"));
        assert!(!is_template("costs $5 and ${oops"));
        assert!(!has_placeholders("cmd: echo $${HOME}"));
    }

    #[test]
    fn lookup_walks_mappings_and_sequences() {
        let context = ctx("server:\n  hosts: [a.example, b.example]\n  port: 443");
        assert_eq!(lookup(&context, "server.port").and_then(Value::as_u64), Some(443));
        assert_eq!(
            lookup(&context, "server.hosts.1").and_then(Value::as_str),
            Some("b.example")
        );
        assert!(lookup(&context, "server.missing").is_none());
    }

    #[test]
    fn render_composes_values() {
        let context = ctx("name: api\nversion: 2\nsecure: true");
        let out = render("path: ${name}/v${version} tls=${secure}", &context).unwrap();
        assert_eq!(out, "path: api/v2 tls=true");
    }

    #[test]
    fn render_null_as_empty() {
        let context = ctx("suffix: null");
        assert_eq!(render("app${suffix}", &context).unwrap(), "app");
    }

    #[test]
    fn render_unknown_placeholder_fails() {
        let err = render("${nope}", &ctx("a: 1")).unwrap_err();
        assert!(err.contains("${nope}"));
    }

    #[test]
    fn render_mapping_placeholder_fails() {
        let err = render("${server}", &ctx("server:\n  port: 1")).unwrap_err();
        assert!(err.contains("scalar"));
    }
}
