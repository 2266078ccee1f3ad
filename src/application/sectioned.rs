//! Sectioned key/value text format
//!
//! One bracketed section per entity, bracket depth equal to nesting depth,
//! four spaces of indentation per level:
//!
//! ```text
//! [Aircraft]
//!     name = A320-like
//!     [[wing]]
//!         area = 122.00
//!         span = 34.100
//! ```
//!
//! Leaves are written before sub-sections. Tuples are comma separated.
//! Values are single-line: strings with line breaks are rejected on write.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::render::render;
use crate::domain::{DomainError, Entity, Node, TraversalOrder, TreePath, Value};

/// Default indentation width per nesting level.
pub const DEFAULT_INDENT: usize = 4;

/// How leaf values are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Formatting {
    /// Fixed significant digits; lossy.
    #[default]
    Rendered,
    /// Exact, round-trippable values.
    Raw,
}

/// Writer options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionStyle {
    pub order: TraversalOrder,
    pub formatting: Formatting,
    pub indent: usize,
}

impl Default for SectionStyle {
    fn default() -> Self {
        Self {
            order: TraversalOrder::Declaration,
            formatting: Formatting::Rendered,
            indent: DEFAULT_INDENT,
        }
    }
}

/// Write `tree` as sectioned text; `tree.name` becomes the top-level section.
///
/// # Errors
/// `InvalidInput` for a string leaf the format cannot hold: one containing a
/// line break, or one that needs quoting but contains both quote characters.
#[instrument(level = "debug", skip(tree), fields(root = %tree.name))]
pub fn serialize_to_sectioned_text(tree: &Entity, style: &SectionStyle) -> ApplicationResult<String> {
    let mut out = String::new();
    write_section(tree, &TreePath::root(), 1, style, &mut out)?;
    debug!(bytes = out.len(), "serialized tree");
    Ok(out)
}

fn write_section(
    entity: &Entity,
    prefix: &TreePath,
    depth: usize,
    style: &SectionStyle,
    out: &mut String,
) -> ApplicationResult<()> {
    let pad = " ".repeat(style.indent * (depth - 1));
    out.push_str(&format!(
        "{}{}{}{}\n",
        pad,
        "[".repeat(depth),
        entity.name,
        "]".repeat(depth)
    ));

    let children = entity.ordered_children(style.order);
    let key_pad = " ".repeat(style.indent * depth);
    for (name, node) in &children {
        if let Node::Leaf(value) = node {
            let text = format_leaf(&prefix.child(name), value, style.formatting)?;
            out.push_str(&format!("{}{} = {}\n", key_pad, name, text));
        }
    }
    for (name, node) in &children {
        if let Node::Entity(child) = node {
            let path = prefix.child(name);
            // the child mapping key wins over a stale entity name
            if child.name == *name {
                write_section(child, &path, depth + 1, style, out)?;
            } else {
                let mut renamed = child.clone();
                renamed.name = name.to_string();
                write_section(&renamed, &path, depth + 1, style, out)?;
            }
        }
    }
    Ok(())
}

fn format_leaf(path: &TreePath, value: &Value, formatting: Formatting) -> ApplicationResult<String> {
    match value {
        Value::Str(s) => quote_if_ambiguous(path, s),
        v => Ok(match formatting {
            Formatting::Rendered => render(v),
            Formatting::Raw => v.to_string(),
        }),
    }
}

/// Quote strings that would otherwise read back as something else.
///
/// Values are single-line and have no escape syntax, so a line break, or a
/// string needing quotes that holds both `"` and `'`, cannot be written.
fn quote_if_ambiguous(path: &TreePath, s: &str) -> ApplicationResult<String> {
    let unwritable = |reason: &str| {
        ApplicationError::Domain(DomainError::InvalidInput(format!(
            "{}: string {:?} cannot be written: {}",
            path, s, reason
        )))
    };
    if s.contains(['\n', '\r']) {
        return Err(unwritable("contains a line break"));
    }
    if Value::parse(s) == Value::Str(s.to_string()) {
        Ok(s.to_string())
    } else if !s.contains('"') {
        Ok(format!("\"{}\"", s))
    } else if !s.contains('\'') {
        Ok(format!("'{}'", s))
    } else {
        Err(unwritable("needs quoting but contains both quote characters"))
    }
}

/// Reads the sectioned format back into an untyped [`Entity`].
pub struct SectionParser {
    header: Regex,
    assignment: Regex,
}

impl SectionParser {
    pub fn new() -> ApplicationResult<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| ApplicationError::OperationFailed {
                context: format!("compile pattern {}", pattern),
                source: Box::new(e),
            })
        };
        Ok(Self {
            header: compile(r"^(\[+)\s*([^\[\]]+?)\s*(\]+)$")?,
            assignment: compile(r"^([^=\[\]]+?)\s*=\s*(.*)$")?,
        })
    }

    /// Parse a document with exactly one top-level section.
    ///
    /// Blank lines and lines starting with `#` are ignored. Indentation is
    /// not significant; bracket depth alone defines nesting.
    #[instrument(level = "debug", skip(self, text))]
    pub fn parse(&self, text: &str) -> ApplicationResult<Entity> {
        // stack[0] collects top-level sections
        let mut stack: Vec<Entity> = vec![Entity::new("")];

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(caps) = self.header.captures(line) {
                let depth = caps[1].len();
                if caps[3].len() != depth {
                    return Err(parse_err(line_no, format!("unbalanced brackets in {:?}", line)));
                }
                if depth > stack.len() {
                    return Err(parse_err(
                        line_no,
                        format!("section {:?} nested too deep (depth {})", &caps[2], depth),
                    ));
                }
                while stack.len() > depth {
                    close_section(&mut stack, line_no)?;
                }
                let name = caps[2].to_string();
                if stack.last().and_then(|p| p.get(&name)).is_some() {
                    return Err(parse_err(line_no, format!("duplicate entry {:?}", name)));
                }
                stack.push(Entity::new(name));
            } else if let Some(caps) = self.assignment.captures(line) {
                let key = caps[1].to_string();
                let current = stack
                    .last_mut()
                    .ok_or_else(|| parse_err(line_no, "no open section".to_string()))?;
                if current.get(&key).is_some() {
                    return Err(parse_err(line_no, format!("duplicate entry {:?}", key)));
                }
                current.insert(key, Value::parse(&caps[2]));
            } else {
                return Err(parse_err(line_no, format!("cannot parse {:?}", line)));
            }
        }

        let last_line = text.lines().count();
        while stack.len() > 1 {
            close_section(&mut stack, last_line)?;
        }
        let top = stack
            .pop()
            .ok_or_else(|| parse_err(last_line, "empty document".to_string()))?;

        let mut sections = top.children();
        match (sections.next(), sections.next()) {
            (Some((_, Node::Entity(root))), None) => {
                debug!(root = %root.name, leaves = root.leaf_count(), "parsed sectioned text");
                Ok(root.clone())
            }
            _ => Err(parse_err(
                last_line,
                "expected exactly one top-level section".to_string(),
            )),
        }
    }
}

fn close_section(stack: &mut Vec<Entity>, line_no: usize) -> ApplicationResult<()> {
    let done = stack
        .pop()
        .ok_or_else(|| parse_err(line_no, "section stack underflow".to_string()))?;
    let parent = stack
        .last_mut()
        .ok_or_else(|| parse_err(line_no, "section stack underflow".to_string()))?;
    parent.insert(done.name.clone(), Node::Entity(done));
    Ok(())
}

fn parse_err(line: usize, message: String) -> ApplicationError {
    ApplicationError::Domain(DomainError::Parse { line, message })
}

/// Convenience wrapper around [`SectionParser::parse`].
pub fn parse_sectioned_text(text: &str) -> ApplicationResult<Entity> {
    SectionParser::new()?.parse(text)
}
