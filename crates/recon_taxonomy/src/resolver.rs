//! Field-reference resolution against the four traversal scopes.
//!
//! A reference that hits a missing key, a null, an out-of-range index, or a
//! value of the wrong shape resolves to nothing. Nothing here returns an
//! error for data problems.

use recon_schema::{FieldRef, Part, Scope, Segment, Template};
use serde_json::Value;

/// Scopes a reference can be rooted at
#[derive(Debug, Clone, Copy)]
pub struct Env<'a> {
    /// Value being mapped
    pub current: &'a Value,
    /// Nearest enclosing object, if any
    pub parent: Option<&'a Value>,
    /// Top-level document
    pub root: &'a Value,
    /// Execution context object
    pub context: &'a Value,
}

impl<'a> Env<'a> {
    /// Environment positioned at the document root
    #[must_use]
    pub fn at_root(root: &'a Value, context: &'a Value) -> Self {
        Self {
            current: root,
            parent: None,
            root,
            context,
        }
    }

    /// Move to a child value, keeping root and context
    #[must_use]
    pub fn descend(&self, current: &'a Value, parent: Option<&'a Value>) -> Self {
        Self {
            current,
            parent,
            root: self.root,
            context: self.context,
        }
    }

    fn scope(&self, scope: Scope) -> Option<&'a Value> {
        match scope {
            Scope::Current => Some(self.current),
            Scope::Parent => self.parent,
            Scope::Root => Some(self.root),
            Scope::Context => Some(self.context),
        }
    }
}

/// Expansion result, possibly cut short by a fan-out cap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fanout<T> {
    /// Produced instances, in order
    pub items: Vec<T>,
    /// Whether instances were dropped to honor the cap
    pub truncated: bool,
}

impl<T> Fanout<T> {
    fn empty() -> Self {
        Self {
            items: Vec::new(),
            truncated: false,
        }
    }
}

/// Every non-null value a reference selects, in document order.
///
/// Without a wildcard this is zero or one value.
#[must_use]
pub fn resolve_all<'a>(reference: &FieldRef, env: &Env<'a>) -> Vec<&'a Value> {
    let mut out = Vec::new();
    if let Some(start) = env.scope(reference.scope()) {
        walk(start, reference.segments(), &mut out);
    }
    out
}

/// Single-valued lookup. Wildcard references resolve to `None`; use
/// [`resolve_all`] for those.
#[must_use]
pub fn resolve<'a>(reference: &FieldRef, env: &Env<'a>) -> Option<&'a Value> {
    if reference.has_wildcard() {
        return None;
    }
    resolve_all(reference, env).into_iter().next()
}

fn walk<'a>(value: &'a Value, path: &[Segment], out: &mut Vec<&'a Value>) {
    let Some((segment, rest)) = path.split_first() else {
        if !value.is_null() {
            out.push(value);
        }
        return;
    };
    match (segment, value) {
        (Segment::Key(key), Value::Object(members)) => {
            if let Some(next) = members.get(key) {
                walk(next, rest, out);
            }
        }
        (Segment::Index(i), Value::Array(items)) => {
            if let Some(next) = items.get(*i) {
                walk(next, rest, out);
            }
        }
        (Segment::Wildcard, Value::Array(items)) => {
            for item in items {
                walk(item, rest, out);
            }
        }
        _ => {}
    }
}

/// Text form of a scalar for use inside a template.
///
/// Empty strings and composite values have no text form.
#[must_use]
pub fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Text forms of every value a reference selects
#[must_use]
pub fn resolve_strings(reference: &FieldRef, env: &Env<'_>) -> Vec<String> {
    resolve_all(reference, env)
        .into_iter()
        .filter_map(stringify)
        .collect()
}

/// Cartesian product of columns, first column varying slowest, capped at
/// `cap` rows. Any empty column yields no rows.
#[must_use]
pub fn cartesian<T: Clone>(columns: &[Vec<T>], cap: usize) -> Fanout<Vec<T>> {
    let mut rows: Vec<Vec<T>> = vec![Vec::new()];
    let mut truncated = false;
    for column in columns {
        let mut next = Vec::with_capacity(rows.len().saturating_mul(column.len()).min(cap));
        'rows: for row in &rows {
            for item in column {
                if next.len() == cap {
                    truncated = true;
                    break 'rows;
                }
                let mut extended = row.clone();
                extended.push(item.clone());
                next.push(extended);
            }
        }
        rows = next;
        if rows.is_empty() {
            return Fanout {
                items: rows,
                truncated,
            };
        }
    }
    Fanout {
        items: rows,
        truncated,
    }
}

/// Render a template into one string per fan-out instance.
///
/// An empty result means the template is unresolved.
#[must_use]
pub fn render(template: &Template, env: &Env<'_>, max_fanout: usize) -> Fanout<String> {
    let columns: Vec<Vec<String>> = template
        .parts()
        .iter()
        .map(|part| match part {
            Part::Literal(text) => vec![text.clone()],
            Part::Ref(reference) => resolve_strings(reference, env),
        })
        .collect();
    if columns.iter().any(Vec::is_empty) {
        return Fanout::empty();
    }
    let rows = cartesian(&columns, max_fanout);
    Fanout {
        items: rows.items.into_iter().map(|row| row.concat()).collect(),
        truncated: rows.truncated,
    }
}

/// Resolve a template expression to a single string.
///
/// Returns the first instance when the template fans out.
///
/// # Errors
///
/// Returns error if the expression does not parse
pub fn resolve_expr(expr: &str, env: &Env<'_>) -> Result<Option<String>, recon_schema::TemplateError> {
    let template = Template::parse(expr)?;
    Ok(render(&template, env, 1).items.into_iter().next())
}

/// Value for a property copy, keeping its native JSON type.
///
/// A wildcard reference yields an array of the selected values.
#[must_use]
pub fn property_value(reference: &FieldRef, env: &Env<'_>) -> Option<Value> {
    if reference.has_wildcard() {
        let values: Vec<Value> = resolve_all(reference, env).into_iter().cloned().collect();
        if values.is_empty() {
            None
        } else {
            Some(Value::Array(values))
        }
    } else {
        resolve(reference, env).cloned()
    }
}
