use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::parser::context::TemplateContext;

/// Substituted for placeholders whose variable is absent or empty.
pub const NOT_AVAILABLE: &str = "n/a";

/// Upper bound on substitutions for a single fill. Values that keep
/// reintroducing placeholders are cut off here.
pub const MAX_SUBSTITUTIONS: usize = 1024;

// `{name}`: name excludes space, tab, newline, quotes, comma, slashes and braces.
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{([^ \t\n"',/\\{}]+?)\}"#).expect("placeholder pattern is a valid regex")
});

/// Fill `{name}` placeholders from `ctx`.
///
/// The leftmost placeholder is replaced first and the result is scanned
/// again, so a value that itself contains `{other}` gets filled as well.
/// Absent and empty variables both become [`NOT_AVAILABLE`].
pub fn fill<C: TemplateContext + ?Sized>(template: &str, ctx: &C) -> String {
    let mut out = template.to_owned();
    let mut substitutions = 0usize;

    loop {
        let (range, name) = match PLACEHOLDER.captures(&out) {
            Some(caps) => match (caps.get(0), caps.get(1)) {
                (Some(whole), Some(name)) => (whole.range(), name.as_str().to_owned()),
                _ => break,
            },
            None => break,
        };

        if substitutions >= MAX_SUBSTITUTIONS {
            warn!(
                "template fill stopped after {} substitutions, remaining placeholders set to '{}'",
                substitutions, NOT_AVAILABLE
            );
            return PLACEHOLDER.replace_all(&out, NOT_AVAILABLE).into_owned();
        }

        let value = ctx
            .lookup(&name)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| NOT_AVAILABLE.to_owned());
        out.replace_range(range, &value);
        substitutions += 1;
    }

    out
}

/// A template kept around for repeated fills (one per configured policy).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    template: String,
}

impl MessageTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self { template: template.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    pub fn fill<C: TemplateContext + ?Sized>(&self, ctx: &C) -> String {
        fill(&self.template, ctx)
    }

    /// Distinct placeholder names in order of first appearance.
    pub fn placeholders(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for caps in PLACEHOLDER.captures_iter(&self.template) {
            if let Some(name) = caps.get(1) {
                if !names.iter().any(|n| n == name.as_str()) {
                    names.push(name.as_str().to_owned());
                }
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::context::LookupFn;
    use std::collections::HashMap;

    fn ctx(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_fill_bearer_header() {
        let rendered = fill("Bearer {tok}", &ctx(&[("tok", "abc123")]));
        assert_eq!(rendered, "Bearer abc123");
    }

    #[test]
    fn test_fill_missing_variable() {
        let rendered = fill("Bearer {tok}", &ctx(&[]));
        assert_eq!(rendered, "Bearer n/a");
    }

    #[test]
    fn test_fill_empty_value_is_not_available() {
        let rendered = fill("x={tok}", &ctx(&[("tok", "")]));
        assert_eq!(rendered, "x=n/a");
    }

    #[test]
    fn test_fill_without_placeholders_is_unchanged() {
        let tpl = r#"{ "resource" : { "type": "api", "labels": {} } }"#;
        assert_eq!(fill(tpl, &ctx(&[("type", "nope")])), tpl);
    }

    #[test]
    fn test_fill_log_request_body() {
        let tpl = r#"{
  "logName": "projects/{stackdriver.projectid}/logs/{stackdriver.logid}",
  "resource" : { "type": "api", "labels": {} },
  "entries": [{ "textPayload" : "{stackdriver.logpayload}" } ]
}"#;
        let vars = ctx(&[
            ("stackdriver.projectid", "id-i3892dnqwhjdk"),
            ("stackdriver.logid", "1981919"),
            ("stackdriver.logpayload", "xyz123"),
        ]);
        let expected = r#"{
  "logName": "projects/id-i3892dnqwhjdk/logs/1981919",
  "resource" : { "type": "api", "labels": {} },
  "entries": [{ "textPayload" : "xyz123" } ]
}"#;
        assert_eq!(fill(tpl, &vars), expected);
    }

    #[test]
    fn test_fill_names_with_forbidden_characters_are_left_alone() {
        let tpl = "{a b} {a,b} {a/b} {\"a\"} {'a'} {a\\b}";
        assert_eq!(fill(tpl, &ctx(&[])), tpl);
    }

    #[test]
    fn test_fill_names_exclude_only_space_tab_newline() {
        let vars = ctx(&[("a\rb", "carriage"), ("a\u{b}b", "vertical")]);
        assert_eq!(fill("{a\rb} {a\u{b}b}", &vars), "carriage vertical");
        assert_eq!(fill("{a\tb} {a\nb}", &vars), "{a\tb} {a\nb}");
    }

    #[test]
    fn test_fill_innermost_braces() {
        // `{` is excluded from names, so only `{inner}` is a placeholder
        let rendered = fill("{{inner}}", &ctx(&[("inner", "two words")]));
        assert_eq!(rendered, "{two words}");

        // the rescan picks up the braces left around a plain value
        let rendered = fill("{{inner}}", &ctx(&[("inner", "v"), ("v", "again")]));
        assert_eq!(rendered, "again");
    }

    #[test]
    fn test_fill_rescans_substituted_values() {
        let vars = ctx(&[("outer", "<{inner}>"), ("inner", "deep")]);
        assert_eq!(fill("{outer}", &vars), "<deep>");
    }

    #[test]
    fn test_fill_terminates_on_self_reference() {
        let vars = ctx(&[("loop", "{loop}")]);
        assert_eq!(fill("start {loop} end", &vars), "start n/a end");
    }

    #[test]
    fn test_fill_repeated_placeholder() {
        let rendered = fill("{a}-{a}-{b}", &ctx(&[("a", "1")]));
        assert_eq!(rendered, "1-1-n/a");
    }

    #[test]
    fn test_fill_is_idempotent_on_output() {
        let vars = ctx(&[("a", "alpha"), ("b", "beta")]);
        let once = fill("{a}/{b}/{c}", &vars);
        assert_eq!(fill(&once, &vars), once);
    }

    #[test]
    fn test_fill_with_closure_lookup() {
        let lookup = LookupFn(|name: &str| (name == "request.verb").then(|| "POST".to_string()));
        assert_eq!(fill("{request.verb} {request.path}", &lookup), "POST n/a");
    }

    #[test]
    fn test_message_template_placeholders() {
        let tpl = MessageTemplate::new("{a} {b.c} {a} {not valid}");
        assert_eq!(tpl.placeholders(), vec!["a".to_string(), "b.c".to_string()]);
    }
}
