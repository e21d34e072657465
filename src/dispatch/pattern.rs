use std::collections::HashMap;

use regex::Regex;

use super::{
    alias::{anchored, AliasTable},
    BuildError,
};

pub type Params = HashMap<String, String>;

const SIGIL: char = ':';

/// Splits a path into the tokens a [PathPattern] is matched against.
///
/// `/`, `.` and `-` all separate tokens; the root path yields one empty token.
pub fn split(path: &str) -> Vec<&str> {
    path.strip_prefix('/')
        .unwrap_or(path)
        .split(['/', '.', '-'])
        .collect()
}

/// Validation rule attached to a named segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// Name of a pattern registered in the [AliasTable].
    Alias(String),
    /// Inline regular expression, anchored to the whole segment.
    Pattern(String),
}

impl Rule {
    pub fn alias(name: impl Into<String>) -> Self {
        Self::Alias(name.into())
    }

    pub fn pattern(pattern: impl Into<String>) -> Self {
        Self::Pattern(pattern.into())
    }
}

#[derive(Debug, Clone)]
pub enum Segment {
    Literal(String),
    Capture { name: String, regex: Regex },
}

impl Segment {
    fn matches(&self, value: &str, params: &mut Params) -> bool {
        match self {
            Self::Literal(literal) => literal == value,
            Self::Capture { name, regex } => {
                if !regex.is_match(value) {
                    return false;
                }
                params.insert(name.clone(), value.to_string());
                true
            }
        }
    }
}

/// Positional matcher compiled from a route template.
#[derive(Debug, Clone)]
pub struct PathPattern {
    segments: Box<[Segment]>,
}

impl PathPattern {
    /// Compiles `template` against the validation `rules`.
    ///
    /// A `:name` token only becomes a capture when `rules` has an entry for
    /// `name`; without one it is compared literally.
    pub fn compile(
        template: &str,
        rules: &HashMap<String, Rule>,
        aliases: &AliasTable,
    ) -> Result<Self, BuildError> {
        let segments = split(template)
            .into_iter()
            .map(|token| {
                let rule = token
                    .strip_prefix(SIGIL)
                    .and_then(|name| rules.get(name).map(|rule| (name, rule)));
                match rule {
                    None => Ok(Segment::Literal(token.to_string())),
                    Some((name, Rule::Alias(alias))) => aliases
                        .get(alias)
                        .map(|regex| Segment::Capture {
                            name: name.to_string(),
                            regex: regex.clone(),
                        })
                        .ok_or_else(|| BuildError::UnknownAlias {
                            route: template.to_string(),
                            alias: alias.clone(),
                        }),
                    Some((name, Rule::Pattern(pattern))) => anchored(pattern)
                        .map(|regex| Segment::Capture {
                            name: name.to_string(),
                            regex,
                        })
                        .map_err(|source| BuildError::InvalidPattern {
                            route: template.to_string(),
                            param: name.to_string(),
                            source,
                        }),
                }
            })
            .collect::<Result<Box<[_]>, _>>()?;
        Ok(Self { segments })
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn has_captures(&self) -> bool {
        self.segments
            .iter()
            .any(|segment| matches!(segment, Segment::Capture { .. }))
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns the captured parameters when every segment of `path` matches.
    pub fn matches(&self, path: &str) -> Option<Params> {
        let values = split(path);
        if values.len() != self.segments.len() {
            return None;
        }
        let mut params = Params::new();
        self.segments
            .iter()
            .zip(values)
            .all(|(segment, value)| segment.matches(value, &mut params))
            .then_some(params)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn compile(template: &str, rules: &[(&str, Rule)]) -> PathPattern {
        let rules = rules
            .iter()
            .map(|(name, rule)| (name.to_string(), rule.clone()))
            .collect();
        PathPattern::compile(template, &rules, &AliasTable::builtin().unwrap()).unwrap()
    }

    #[test]
    fn splits_on_every_separator() {
        assert_eq!(split("/"), vec![""]);
        assert_eq!(split("/users/42"), vec!["users", "42"]);
        assert_eq!(split("/blog/blog-post.html"), vec!["blog", "blog", "post", "html"]);
        assert_eq!(split("/a//b"), vec!["a", "", "b"]);
    }

    #[test]
    fn segment_count_mismatch_never_matches() {
        let pattern = compile("/users/:id", &[("id", Rule::pattern(".*"))]);
        assert_eq!(pattern.matches("/users"), None);
        assert_eq!(pattern.matches("/users/1/2"), None);
        assert_eq!(pattern.matches("/users/1-2"), None);
        assert_eq!(pattern.matches("/users/1.json"), None);
    }

    #[test]
    fn integer_alias_captures_parameter() {
        let pattern = compile("/users/:id", &[("id", Rule::alias("integer"))]);
        assert_eq!(
            pattern.matches("/users/42"),
            Some(Params::from([("id".to_string(), "42".to_string())]))
        );
        assert_eq!(pattern.matches("/users/abc"), None);
    }

    #[test]
    fn every_segment_must_match() {
        let pattern = compile(
            "/archive/:year/:month",
            &[
                ("year", Rule::pattern(r"\d{4}")),
                ("month", Rule::pattern(r"\d{2}")),
            ],
        );
        assert_eq!(pattern.matches("/archive/2024/1"), None);
        assert_eq!(pattern.matches("/archive/24/01"), None);
        assert_eq!(pattern.matches("/posts/2024/01"), None);
        let params = pattern.matches("/archive/2024/01").unwrap();
        assert_eq!(params["year"], "2024");
        assert_eq!(params["month"], "01");
    }

    #[test]
    fn dot_and_dash_separate_parameters() {
        let pattern = compile(
            "/files/:name.:ext",
            &[("name", Rule::alias("word")), ("ext", Rule::alias("alpha"))],
        );
        let params = pattern.matches("/files/report.pdf").unwrap();
        assert_eq!(params["name"], "report");
        assert_eq!(params["ext"], "pdf");
    }

    #[test]
    fn sigil_without_rule_is_literal() {
        let pattern = compile("/users/:id", &[]);
        assert_eq!(pattern.has_captures(), false);
        assert_eq!(pattern.matches("/users/:id"), Some(Params::new()));
        assert_eq!(pattern.matches("/users/42"), None);
    }

    #[test]
    fn unknown_alias_fails_compilation() {
        let rules = HashMap::from([("id".to_string(), Rule::alias("uuid"))]);
        let error = PathPattern::compile("/users/:id", &rules, &AliasTable::builtin().unwrap());
        assert!(matches!(
            error,
            Err(BuildError::UnknownAlias { alias, .. }) if alias == "uuid"
        ));
    }

    #[test]
    fn invalid_inline_pattern_fails_compilation() {
        let rules = HashMap::from([("id".to_string(), Rule::pattern("(["))]);
        let error = PathPattern::compile("/users/:id", &rules, &AliasTable::builtin().unwrap());
        assert!(matches!(error, Err(BuildError::InvalidPattern { .. })));
    }

    #[test]
    fn rules_are_reusable_across_templates() {
        let rules = HashMap::from([("id".to_string(), Rule::alias("integer"))]);
        let aliases = AliasTable::builtin().unwrap();
        let users = PathPattern::compile("/users/:id", &rules, &aliases).unwrap();
        let posts = PathPattern::compile("/posts/:id", &rules, &aliases).unwrap();
        assert!(users.matches("/users/1").is_some());
        assert!(posts.matches("/posts/2").is_some());
        assert_eq!(rules.len(), 1);
    }
}
