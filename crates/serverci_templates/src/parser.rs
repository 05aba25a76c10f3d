//! Template parsing.
//!
//! A template is plain text interleaved with `<< ... >>` actions:
//!
//! - `<< ci.configuration.fqdn >>` prints a value
//! - `<< upper ci.description.customer >>` or `<< ci.description.customer | upper >>`
//!   prints it through a case helper
//! - `<< range ci.interfaces >> ... << end >>` repeats its body per element;
//!   inside, `.name` is relative to the element and `<< . >>` is the element

use std::fmt;

use crate::error::{TemplateError, TemplateResult};

pub const OPEN: &str = "<<";
pub const CLOSE: &str = ">>";

/// Case helper applied to a rendered value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    Upper,
    Lower,
}

impl Func {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "upper" => Some(Self::Upper),
            "lower" => Some(Self::Lower),
            _ => None,
        }
    }

    pub fn apply(self, text: &str) -> String {
        match self {
            Self::Upper => text.to_uppercase(),
            Self::Lower => text.to_lowercase(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// A dotted lookup path such as `ci.interfaces[0].name` or `.Name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    /// Starts from the current range element rather than the root.
    pub relative: bool,
    pub segments: Vec<Segment>,
    raw: String,
}

impl Path {
    fn parse(raw: &str, line: usize) -> TemplateResult<Self> {
        let syntax = |message: String| TemplateError::Syntax { line, message };

        if raw == "." {
            return Ok(Self {
                relative: true,
                segments: Vec::new(),
                raw: raw.to_string(),
            });
        }

        let (relative, body) = match raw.strip_prefix('.') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };

        let mut segments = Vec::new();
        for part in body.split('.') {
            let (key, mut indexes) = match part.find('[') {
                Some(pos) => (&part[..pos], &part[pos..]),
                None => (part, ""),
            };
            if key.is_empty() || !key.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_') {
                return Err(syntax(format!("invalid path {raw:?}")));
            }
            segments.push(Segment::Key(key.to_string()));

            while !indexes.is_empty() {
                let close = indexes
                    .find(']')
                    .ok_or_else(|| syntax(format!("unclosed index in {raw:?}")))?;
                let index = indexes[1..close]
                    .parse()
                    .map_err(|_| syntax(format!("invalid index in {raw:?}")))?;
                segments.push(Segment::Index(index));
                indexes = &indexes[close + 1..];
                if !indexes.is_empty() && !indexes.starts_with('[') {
                    return Err(syntax(format!("invalid path {raw:?}")));
                }
            }
        }

        Ok(Self {
            relative,
            segments,
            raw: raw.to_string(),
        })
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// A value lookup with its case helpers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr {
    pub path: Path,
    pub funcs: Vec<Func>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(String),
    Output {
        expr: Expr,
        line: usize,
    },
    Range {
        path: Path,
        line: usize,
        body: Vec<Node>,
    },
}

enum Action {
    Output(Expr),
    Range(Path),
    End,
}

fn parse_action(content: &str, line: usize) -> TemplateResult<Action> {
    let syntax = |message: String| TemplateError::Syntax { line, message };
    let content = content.trim();

    if content.is_empty() {
        return Err(syntax("empty action".to_string()));
    }
    if content == "end" {
        return Ok(Action::End);
    }
    if let Some(rest) = content.strip_prefix("range ") {
        return Ok(Action::Range(Path::parse(rest.trim(), line)?));
    }

    let mut stages = content.split('|').map(str::trim);
    let head: Vec<&str> = stages.next().unwrap_or_default().split_whitespace().collect();

    let (mut funcs, path) = match head.as_slice() {
        [path] => (Vec::new(), *path),
        [name, path] => {
            let func =
                Func::parse(name).ok_or_else(|| syntax(format!("unknown function {name:?}")))?;
            (vec![func], *path)
        }
        _ => return Err(syntax(format!("cannot parse action {content:?}"))),
    };

    for stage in stages {
        let func =
            Func::parse(stage).ok_or_else(|| syntax(format!("unknown function {stage:?}")))?;
        funcs.push(func);
    }

    Ok(Action::Output(Expr {
        path: Path::parse(path, line)?,
        funcs,
    }))
}

/// A parsed template, reusable across renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub(crate) nodes: Vec<Node>,
}

impl Template {
    pub fn parse(source: &str) -> TemplateResult<Self> {
        // Open `range` blocks: the range itself plus the nodes outside it.
        let mut stack: Vec<(Path, usize, Vec<Node>)> = Vec::new();
        let mut nodes = Vec::new();
        let mut rest = source;
        let mut line = 1;

        while let Some(start) = rest.find(OPEN) {
            let text = &rest[..start];
            if !text.is_empty() {
                nodes.push(Node::Text(text.to_string()));
            }
            line += text.matches('\n').count();

            let after_open = &rest[start + OPEN.len()..];
            let end = after_open.find(CLOSE).ok_or(TemplateError::Syntax {
                line,
                message: "unterminated action".to_string(),
            })?;
            let content = &after_open[..end];

            match parse_action(content, line)? {
                Action::Output(expr) => nodes.push(Node::Output { expr, line }),
                Action::Range(path) => {
                    stack.push((path, line, std::mem::take(&mut nodes)));
                }
                Action::End => {
                    let (path, range_line, outer) = stack.pop().ok_or(TemplateError::Syntax {
                        line,
                        message: "\"end\" without \"range\"".to_string(),
                    })?;
                    let body = std::mem::replace(&mut nodes, outer);
                    nodes.push(Node::Range {
                        path,
                        line: range_line,
                        body,
                    });
                }
            }

            line += content.matches('\n').count();
            rest = &after_open[end + CLOSE.len()..];
        }

        if let Some((path, range_line, _)) = stack.pop() {
            return Err(TemplateError::Syntax {
                line: range_line,
                message: format!("\"range {path}\" is never closed"),
            });
        }
        if !rest.is_empty() {
            nodes.push(Node::Text(rest.to_string()));
        }

        Ok(Self { nodes })
    }

    /// Whether the template contains any actions.
    pub fn is_static(&self) -> bool {
        self.nodes.iter().all(|node| matches!(node, Node::Text(_)))
    }
}
