//! Parser for the field-reference mini-language.
//!
//! Tool authors write identity templates, property sources, and relationship
//! endpoints in this syntax; it is parsed once when a schema is compiled.
//!
//! ```text
//! template  := (literal | "{" reference "}")*
//! reference := "." path?                       current value
//!            | ("_parent" | "_root" | "_context") ("." path)?
//! path      := segment ("." segment)*
//! segment   := key index* | index+
//! index     := "[" digits "]" | "[*]"
//! ```
//!
//! Field references may also be written without braces, as `$`-rooted
//! JSONPath (`$.certificate.subject`, `$._parent.target`) or as a bare path
//! (`url`, `.`, `_parent.target`).

use recon_core::Version;
use std::fmt;

/// Version of the reference syntax accepted by this parser.
pub const DSL_VERSION: Version = Version::new(1, 0, 0);

const PARENT: &str = "_parent";
const ROOT: &str = "_root";
const CONTEXT: &str = "_context";

/// Scope a reference is rooted at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// The value being mapped
    Current,
    /// The nearest enclosing object
    Parent,
    /// The top-level output document
    Root,
    /// The caller-supplied execution context
    Context,
}

impl Scope {
    fn prefix(self) -> &'static str {
        match self {
            Self::Current => "",
            Self::Parent => PARENT,
            Self::Root => ROOT,
            Self::Context => CONTEXT,
        }
    }
}

/// One step of a path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Object member
    Key(String),
    /// Array element
    Index(usize),
    /// Every array element
    Wildcard,
}

/// Parse error with the byte offset it was found at
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// Empty expression
    #[error("empty expression")]
    Empty,
    /// `{` without a matching `}`
    #[error("unclosed '{{' at offset {offset}")]
    UnclosedBrace { offset: usize },
    /// `}` without a preceding `{`
    #[error("unmatched '}}' at offset {offset}")]
    UnmatchedCloseBrace { offset: usize },
    /// `{}` with nothing inside
    #[error("empty reference at offset {offset}")]
    EmptyReference { offset: usize },
    /// Unknown `_scope`
    #[error("unknown scope '{scope}' at offset {offset}")]
    UnknownScope { offset: usize, scope: String },
    /// Malformed path
    #[error("invalid path at offset {offset}: {reason}")]
    InvalidPath { offset: usize, reason: String },
    /// More than one reference where exactly one is expected
    #[error("expected a single field reference, found a template")]
    NotSingleReference,
}

/// A parsed field reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldRef {
    scope: Scope,
    path: Vec<Segment>,
}

impl FieldRef {
    /// Reference to the whole current value (`{.}`)
    #[must_use]
    pub fn current() -> Self {
        Self {
            scope: Scope::Current,
            path: Vec::new(),
        }
    }

    /// Build a reference from parts
    #[must_use]
    pub fn new(scope: Scope, path: Vec<Segment>) -> Self {
        Self { scope, path }
    }

    /// Parse a single field reference in braced, `$`, or bare form
    ///
    /// # Errors
    ///
    /// Returns error if the expression is not exactly one valid reference
    pub fn parse(expr: &str) -> Result<Self, TemplateError> {
        let trimmed = expr.trim();
        if trimmed.is_empty() {
            return Err(TemplateError::Empty);
        }
        let offset = expr.len() - expr.trim_start().len();

        if trimmed.starts_with('{') {
            let template = Template::parse(trimmed)?;
            return template
                .single_ref()
                .cloned()
                .ok_or(TemplateError::NotSingleReference);
        }

        if let Some(rest) = trimmed.strip_prefix('$') {
            if rest.is_empty() {
                return Ok(Self::current());
            }
            if !rest.starts_with('.') && !rest.starts_with('[') {
                return Err(TemplateError::InvalidPath {
                    offset: offset + 1,
                    reason: "expected '.' or '[' after '$'".to_string(),
                });
            }
            if let Some(scoped) = rest.strip_prefix('.').filter(|r| r.starts_with('_')) {
                return parse_reference(scoped, offset + 2);
            }
            if rest.starts_with('[') {
                return Ok(Self {
                    scope: Scope::Current,
                    path: parse_path(rest, offset + 1)?,
                });
            }
            return parse_reference(rest, offset + 1);
        }

        if trimmed.starts_with('.') || trimmed.starts_with('_') {
            return parse_reference(trimmed, offset);
        }

        Ok(Self {
            scope: Scope::Current,
            path: parse_path(trimmed, offset)?,
        })
    }

    /// Scope this reference is rooted at
    #[must_use]
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Path segments below the scope root
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.path
    }

    /// Whether any segment is `[*]`
    #[must_use]
    pub fn has_wildcard(&self) -> bool {
        self.path.iter().any(|s| matches!(s, Segment::Wildcard))
    }

    /// First object key of the path, if the path starts with one
    #[must_use]
    pub fn first_key(&self) -> Option<&str> {
        match self.path.first() {
            Some(Segment::Key(k)) => Some(k),
            _ => None,
        }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}", self.scope.prefix())?;
        if self.scope == Scope::Current && !matches!(self.path.first(), Some(Segment::Key(_))) {
            write!(f, ".")?;
        }
        for segment in &self.path {
            match segment {
                Segment::Key(k) => write!(f, ".{}", k)?,
                Segment::Index(i) => write!(f, "[{}]", i)?,
                Segment::Wildcard => write!(f, "[*]")?,
            }
        }
        write!(f, "}}")
    }
}

/// A piece of a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    /// Static text
    Literal(String),
    /// Field reference token
    Ref(FieldRef),
}

/// A parsed template such as `endpoint:{.target}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    parts: Vec<Part>,
}

impl Template {
    /// Parse a template
    ///
    /// # Errors
    ///
    /// Returns error on unbalanced braces or malformed references
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        if source.is_empty() {
            return Err(TemplateError::Empty);
        }

        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut pos = 0;

        while pos < source.len() {
            let rest = &source[pos..];
            let Some(rel) = rest.find(['{', '}']) else {
                literal.push_str(rest);
                break;
            };
            literal.push_str(&rest[..rel]);
            let at = pos + rel;
            if source.as_bytes()[at] == b'}' {
                return Err(TemplateError::UnmatchedCloseBrace { offset: at });
            }

            let after = &source[at + 1..];
            let close = after
                .find('}')
                .ok_or(TemplateError::UnclosedBrace { offset: at })?;
            let inner = &after[..close];
            if inner.contains('{') {
                return Err(TemplateError::UnclosedBrace { offset: at });
            }
            if inner.trim().is_empty() {
                return Err(TemplateError::EmptyReference { offset: at });
            }

            if !literal.is_empty() {
                parts.push(Part::Literal(std::mem::take(&mut literal)));
            }
            parts.push(Part::Ref(parse_reference(inner.trim(), at + 1)?));
            pos = at + 1 + close + 1;
        }

        if !literal.is_empty() {
            parts.push(Part::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            parts,
        })
    }

    /// Original source text
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Parsed parts in order
    #[must_use]
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// All references in order
    pub fn refs(&self) -> impl Iterator<Item = &FieldRef> {
        self.parts.iter().filter_map(|p| match p {
            Part::Ref(r) => Some(r),
            Part::Literal(_) => None,
        })
    }

    /// Whether any reference fans out
    #[must_use]
    pub fn has_wildcard(&self) -> bool {
        self.refs().any(FieldRef::has_wildcard)
    }

    /// The reference if the template is exactly one token
    #[must_use]
    pub fn single_ref(&self) -> Option<&FieldRef> {
        match self.parts.as_slice() {
            [Part::Ref(r)] => Some(r),
            _ => None,
        }
    }

    /// Node type named by the literal prefix, e.g. `endpoint` in
    /// `endpoint:{.target}`
    #[must_use]
    pub fn type_prefix(&self) -> Option<&str> {
        match self.parts.first() {
            Some(Part::Literal(text)) => text
                .split_once(':')
                .map(|(prefix, _)| prefix)
                .filter(|p| !p.is_empty()),
            _ => None,
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Parse the inside of a reference token: `.a.b`, `.`, `_parent.x`, `_root`
fn parse_reference(text: &str, offset: usize) -> Result<FieldRef, TemplateError> {
    if let Some(rest) = text.strip_prefix('.') {
        return Ok(FieldRef {
            scope: Scope::Current,
            path: parse_path(rest, offset + 1)?,
        });
    }

    if text.starts_with('_') {
        let end = text.find(['.', '[']).unwrap_or(text.len());
        let name = &text[..end];
        let scope = match name {
            PARENT => Scope::Parent,
            ROOT => Scope::Root,
            CONTEXT => Scope::Context,
            _ => {
                return Err(TemplateError::UnknownScope {
                    offset,
                    scope: name.to_string(),
                })
            }
        };
        let rest = &text[end..];
        let (rest, rest_offset) = match rest.strip_prefix('.') {
            Some(r) => {
                if r.is_empty() {
                    return Err(TemplateError::InvalidPath {
                        offset: offset + end,
                        reason: "trailing '.'".to_string(),
                    });
                }
                (r, offset + end + 1)
            }
            None => (rest, offset + end),
        };
        return Ok(FieldRef {
            scope,
            path: parse_path(rest, rest_offset)?,
        });
    }

    Err(TemplateError::InvalidPath {
        offset,
        reason: format!("reference '{}' must start with '.' or a scope", text),
    })
}

/// Parse `a.b[0].c[*]` into segments
fn parse_path(path: &str, offset: usize) -> Result<Vec<Segment>, TemplateError> {
    let mut segments = Vec::new();
    let bytes = path.as_bytes();
    let mut pos = 0;
    let invalid = |at: usize, reason: &str| TemplateError::InvalidPath {
        offset: offset + at,
        reason: reason.to_string(),
    };

    while pos < bytes.len() {
        if bytes[pos] == b'[' {
            let close = path[pos..]
                .find(']')
                .map(|c| pos + c)
                .ok_or_else(|| invalid(pos, "unclosed '['"))?;
            let index = &path[pos + 1..close];
            if index == "*" {
                segments.push(Segment::Wildcard);
            } else {
                let n = index
                    .parse::<usize>()
                    .map_err(|_| invalid(pos, "index must be a number or '*'"))?;
                segments.push(Segment::Index(n));
            }
            pos = close + 1;
        } else {
            let end = path[pos..]
                .find(['.', '['])
                .map_or(path.len(), |e| pos + e);
            let key = &path[pos..end];
            if key.is_empty() {
                return Err(invalid(pos, "empty segment"));
            }
            if key.contains([']', '{', '}', '$']) || key.chars().any(char::is_whitespace) {
                return Err(invalid(pos, "unexpected character in key"));
            }
            segments.push(Segment::Key(key.to_string()));
            pos = end;
        }

        if pos < bytes.len() && bytes[pos] == b'.' {
            pos += 1;
            if pos == bytes.len() {
                return Err(invalid(pos - 1, "trailing '.'"));
            }
        } else if pos < bytes.len() && bytes[pos] != b'[' {
            return Err(invalid(pos, "expected '.' or '['"));
        }
    }

    Ok(segments)
}
