//! Constrained path expressions for XML queries.
//!
//! The dialect is a small subset of XPath 1.0:
//!
//! | Syntax | Meaning |
//! |---|---|
//! | `/a` | child `a` of the document |
//! | `//a` | any descendant `a` |
//! | `./a`, `a` | child `a` of the context element |
//! | `.//a` | any descendant `a` of the context element |
//! | `.`, `..` | context element, its parent |
//! | `*` | any element |
//! | `p:a` | element `a` in the namespace bound to `p` |
//! | `[@x]`, `[@x='v']`, `[n]` | attribute presence, value, position (1-based) |
//! | `.../@x` | attribute `x` as the final step |
//! | `.../text()` | direct text as the final step |
//!
//! `{name}` placeholders are substituted before compiling. Paths compile once
//! through [`PathContext::compile`]; bad syntax and unknown prefixes are
//! reported there, never during evaluation.

use std::collections::HashMap;

use super::QueryError;
use super::broadcast::IntoCandidates;

/// Namespace of the built-in `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Prefix bindings and placeholder values shared by a set of paths.
#[derive(Debug, Clone)]
pub struct PathContext {
    namespaces: HashMap<String, String>,
    placeholders: HashMap<String, String>,
}

impl Default for PathContext {
    fn default() -> Self {
        Self::new()
    }
}

impl PathContext {
    #[must_use]
    pub fn new() -> Self {
        let mut namespaces = HashMap::new();
        namespaces.insert("xml".to_string(), XML_NAMESPACE.to_string());
        Self {
            namespaces,
            placeholders: HashMap::new(),
        }
    }

    /// Binds a namespace prefix.
    #[must_use]
    pub fn with_namespace(mut self, prefix: &str, namespace: &str) -> Self {
        self.namespaces
            .insert(prefix.to_string(), namespace.to_string());
        self
    }

    /// Defines a `{name}` placeholder.
    #[must_use]
    pub fn with_placeholder(mut self, name: &str, value: &str) -> Self {
        self.placeholders.insert(name.to_string(), value.to_string());
        self
    }

    /// Compiles a path expression.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] for malformed syntax, undeclared prefixes and
    /// undefined placeholders.
    pub fn compile(&self, raw: &str) -> Result<XmlPath, QueryError> {
        let path = self.substitute(raw)?;
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return Err(QueryError::invalid_path(&path, "empty path"));
        }

        let segments =
            split_segments(trimmed).map_err(|reason| QueryError::invalid_path(&path, reason))?;
        let absolute = trimmed.starts_with('/');

        let mut steps = Vec::new();
        let mut target = Target::Elements;
        let last = segments.len().saturating_sub(1);
        for (index, (axis, text)) in segments.into_iter().enumerate() {
            if let Some(attribute) = text.strip_prefix('@') {
                if index != last {
                    return Err(QueryError::invalid_path(&path, "attribute must be the final step"));
                }
                if axis == Axis::Descendant {
                    steps.push(Step::descendant_or_self());
                }
                target = Target::Attribute(self.name(&path, attribute)?);
                continue;
            }
            if text == "text()" {
                if index != last {
                    return Err(QueryError::invalid_path(&path, "text() must be the final step"));
                }
                if axis == Axis::Descendant {
                    steps.push(Step::descendant_or_self());
                }
                target = Target::Text;
                continue;
            }
            steps.push(self.step(&path, axis, &text)?);
        }

        Ok(XmlPath {
            source: path,
            absolute,
            steps,
            target,
        })
    }

    fn substitute(&self, raw: &str) -> Result<String, QueryError> {
        let mut out = String::with_capacity(raw.len());
        let mut rest = raw;
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let close = after
                .find('}')
                .ok_or_else(|| QueryError::invalid_path(raw, "unterminated placeholder"))?;
            let name = &after[..close];
            let value = self
                .placeholders
                .get(name)
                .ok_or_else(|| QueryError::UnknownPlaceholder {
                    path: raw.to_string(),
                    name: name.to_string(),
                })?;
            out.push_str(value);
            rest = &after[close + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }

    fn step(&self, path: &str, axis: Axis, text: &str) -> Result<Step, QueryError> {
        let (name, predicates) = match text.find('[') {
            Some(open) => (&text[..open], &text[open..]),
            None => (text, ""),
        };
        let test = match name.trim() {
            "" => return Err(QueryError::invalid_path(path, "empty step")),
            "." => NodeTest::SelfNode,
            ".." => NodeTest::Parent,
            "*" => NodeTest::AnyElement,
            name => NodeTest::Name(self.name(path, name)?),
        };
        Ok(Step {
            axis,
            test,
            predicates: self.predicates(path, predicates)?,
        })
    }

    fn predicates(&self, path: &str, mut text: &str) -> Result<Vec<Predicate>, QueryError> {
        let mut predicates = Vec::new();
        while !text.is_empty() {
            let inner_end = text
                .find(']')
                .filter(|_| text.starts_with('['))
                .ok_or_else(|| QueryError::invalid_path(path, "malformed predicate"))?;
            let inner = text[1..inner_end].trim();
            text = &text[inner_end + 1..];

            if let Some(attribute) = inner.strip_prefix('@') {
                match attribute.split_once('=') {
                    Some((name, value)) => {
                        let value = unquote(value.trim())
                            .ok_or_else(|| QueryError::invalid_path(path, "unquoted predicate value"))?;
                        predicates.push(Predicate::AttributeEquals(
                            self.name(path, name.trim())?,
                            value.to_string(),
                        ));
                    }
                    None => predicates.push(Predicate::HasAttribute(self.name(path, attribute)?)),
                }
            } else {
                let position: usize = inner
                    .parse()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| QueryError::invalid_path(path, format!("unsupported predicate [{inner}]")))?;
                predicates.push(Predicate::Position(position));
            }
        }
        Ok(predicates)
    }

    fn name(&self, path: &str, qualified: &str) -> Result<QName, QueryError> {
        let qualified = qualified.trim();
        if qualified.is_empty() || qualified.contains(char::is_whitespace) {
            return Err(QueryError::invalid_path(path, format!("bad name '{qualified}'")));
        }
        match qualified.split_once(':') {
            Some((prefix, local)) => {
                let namespace =
                    self.namespaces
                        .get(prefix)
                        .ok_or_else(|| QueryError::UnknownPrefix {
                            path: path.to_string(),
                            prefix: prefix.to_string(),
                        })?;
                Ok(QName {
                    namespace: Some(namespace.clone()),
                    local: local.to_string(),
                })
            }
            None => Ok(QName {
                namespace: None,
                local: qualified.to_string(),
            }),
        }
    }
}

/// Splits a path into `(axis, step)` pairs, keeping `/` inside predicates.
fn split_segments(path: &str) -> Result<Vec<(Axis, String)>, String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut axis = Axis::Child;
    let mut slashes = 0usize;
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for c in path.chars() {
        match (c, quote) {
            (q, Some(open)) if q == open => {
                quote = None;
                current.push(c);
            }
            (_, Some(_)) => current.push(c),
            ('\'' | '"', None) => {
                quote = Some(c);
                current.push(c);
            }
            ('[', None) => {
                depth += 1;
                current.push(c);
            }
            (']', None) => {
                depth = depth.checked_sub(1).ok_or("unbalanced ']'")?;
                current.push(c);
            }
            ('/', None) if depth == 0 => {
                if !current.is_empty() {
                    segments.push((axis, std::mem::take(&mut current)));
                    slashes = 0;
                }
                slashes += 1;
                axis = match slashes {
                    1 => Axis::Child,
                    2 => Axis::Descendant,
                    _ => return Err("too many '/'".to_string()),
                };
            }
            _ => current.push(c),
        }
    }
    if quote.is_some() || depth != 0 {
        return Err("unterminated predicate".to_string());
    }
    if current.is_empty() {
        return Err("path ends with '/'".to_string());
    }
    segments.push((axis, current));
    Ok(segments)
}

fn unquote(value: &str) -> Option<&str> {
    value
        .strip_prefix('\'')
        .and_then(|v| v.strip_suffix('\''))
        .or_else(|| value.strip_prefix('"').and_then(|v| v.strip_suffix('"')))
}

/// A compiled path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlPath {
    source: String,
    pub(crate) absolute: bool,
    pub(crate) steps: Vec<Step>,
    pub(crate) target: Target,
}

impl XmlPath {
    /// The path as compiled, placeholders substituted.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl<'a> IntoCandidates<&'a XmlPath> for &'a XmlPath {
    fn into_candidates(self) -> Vec<&'a XmlPath> {
        vec![self]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct QName {
    pub(crate) namespace: Option<String>,
    pub(crate) local: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NodeTest {
    Name(QName),
    AnyElement,
    SelfNode,
    Parent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Predicate {
    HasAttribute(QName),
    AttributeEquals(QName, String),
    Position(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Step {
    pub(crate) axis: Axis,
    pub(crate) test: NodeTest,
    pub(crate) predicates: Vec<Predicate>,
}

impl Step {
    /// `//@x` and `//text()` look at the context element and all its
    /// descendants.
    fn descendant_or_self() -> Self {
        Self {
            axis: Axis::Descendant,
            test: NodeTest::SelfNode,
            predicates: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Target {
    Elements,
    Attribute(QName),
    Text,
}
