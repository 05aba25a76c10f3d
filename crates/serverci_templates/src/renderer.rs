//! Template rendering against serializable data.

use std::io::Read;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{TemplateError, TemplateResult};
use crate::parser::{Expr, Node, Path, Segment, Template};

/// What to do when a placeholder names a path that does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingKey {
    /// Fail the render.
    #[default]
    Error,
    /// Substitute the empty string.
    Zero,
}

/// Template renderer for `<< ... >>` placeholders.
///
/// Data is serialized to a JSON value and looked up by dotted path. Keys
/// match case-insensitively with `-` and `_` ignored, so `ci.author_company`,
/// `ci.author-company` and `.CI.AuthorCompany` all name the same field.
/// Fields that exist but hold no value (`null`) render as empty text.
///
/// A path that continues below a `null` parent only resolves when a schema
/// is attached and the schema has every remaining segment; it then renders
/// empty. Without a schema such paths count as missing.
#[derive(Debug, Clone, Default)]
pub struct TemplateRenderer {
    missing: MissingKey,
    schema: Option<Value>,
}

impl TemplateRenderer {
    pub fn new(missing: MissingKey) -> Self {
        Self {
            missing,
            schema: None,
        }
    }

    /// Unresolved placeholders are errors.
    pub fn strict() -> Self {
        Self::new(MissingKey::Error)
    }

    /// Unresolved placeholders render empty.
    pub fn lenient() -> Self {
        Self::new(MissingKey::Zero)
    }

    pub fn missing_key(&self) -> MissingKey {
        self.missing
    }

    /// Attach the shape of the data: a fully populated value whose
    /// sequences hold one sample element each.
    pub fn with_schema<T: Serialize>(mut self, schema: &T) -> TemplateResult<Self> {
        self.schema = Some(serde_json::to_value(schema)?);
        Ok(self)
    }

    /// Parse and render a template in one step.
    pub fn render<T: Serialize>(&self, source: &str, data: &T) -> TemplateResult<String> {
        let template = Template::parse(source)?;
        self.render_template(&template, data)
    }

    /// Render template bytes read from `reader`.
    pub fn render_reader<T: Serialize>(
        &self,
        mut reader: impl Read,
        data: &T,
    ) -> TemplateResult<Vec<u8>> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let source = String::from_utf8(bytes)?;
        Ok(self.render(&source, data)?.into_bytes())
    }

    pub fn render_template<T: Serialize>(
        &self,
        template: &Template,
        data: &T,
    ) -> TemplateResult<String> {
        let root = serde_json::to_value(data)?;
        let mut out = String::new();
        let scope = Scope {
            root: &root,
            dot: &root,
            schema: self.schema.as_ref(),
            dot_schema: self.schema.as_ref(),
        };
        self.render_nodes(&template.nodes, scope, &mut out)?;
        debug!("Rendered template ({} bytes)", out.len());
        Ok(out)
    }

    fn render_nodes(&self, nodes: &[Node], scope: Scope<'_>, out: &mut String) -> TemplateResult<()> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Output { expr, line } => self.render_output(expr, *line, scope, out)?,
                Node::Range { path, line, body } => match scope.lookup(path) {
                    Some((Value::Array(items), shape)) => {
                        let item_shape =
                            shape.and_then(|shape| shape_step(shape, &Segment::Index(0)));
                        for item in items {
                            let inner = Scope {
                                dot: item,
                                dot_schema: item_shape,
                                ..scope
                            };
                            self.render_nodes(body, inner, out)?;
                        }
                    }
                    Some((Value::Null, _)) => {}
                    Some(_) => {
                        return Err(TemplateError::RenderingFailed {
                            path: path.to_string(),
                            line: *line,
                            message: "range needs a sequence".to_string(),
                        })
                    }
                    None => self.on_missing(path, *line)?,
                },
            }
        }
        Ok(())
    }

    fn render_output(
        &self,
        expr: &Expr,
        line: usize,
        scope: Scope<'_>,
        out: &mut String,
    ) -> TemplateResult<()> {
        let Some((value, _)) = scope.lookup(&expr.path) else {
            return self.on_missing(&expr.path, line);
        };

        let mut text = to_text(value).map_err(|message| TemplateError::RenderingFailed {
            path: expr.path.to_string(),
            line,
            message,
        })?;
        for func in &expr.funcs {
            text = func.apply(&text);
        }
        out.push_str(&text);
        Ok(())
    }

    fn on_missing(&self, path: &Path, line: usize) -> TemplateResult<()> {
        match self.missing {
            MissingKey::Error => Err(TemplateError::MissingKey {
                path: path.to_string(),
                line,
            }),
            MissingKey::Zero => Ok(()),
        }
    }
}

#[derive(Clone, Copy)]
struct Scope<'a> {
    root: &'a Value,
    dot: &'a Value,
    schema: Option<&'a Value>,
    dot_schema: Option<&'a Value>,
}

impl<'a> Scope<'a> {
    /// Resolve a path to its value and, when known, its schema node.
    /// `None` means the path does not exist.
    fn lookup(&self, path: &Path) -> Option<(&'a Value, Option<&'a Value>)> {
        let (mut current, mut shape) = if path.relative {
            (self.dot, self.dot_schema)
        } else {
            (self.root, self.schema)
        };
        for (i, segment) in path.segments.iter().enumerate() {
            if current.is_null() {
                let rest = &path.segments[i..];
                let shape = rest
                    .iter()
                    .try_fold(shape?, |node, segment| shape_step(node, segment))?;
                return Some((current, Some(shape)));
            }
            current = match (current, segment) {
                (Value::Object(map), Segment::Key(key)) => find_key(map, key)?,
                (Value::Array(items), Segment::Index(index)) => items.get(*index)?,
                (Value::Array(items), Segment::Key(key)) => {
                    items.get(key.parse::<usize>().ok()?)?
                }
                _ => return None,
            };
            shape = shape.and_then(|node| shape_step(node, segment));
        }
        Some((current, shape))
    }
}

/// One step through a schema. Any index into a sequence lands on its sample
/// element.
fn shape_step<'a>(node: &'a Value, segment: &Segment) -> Option<&'a Value> {
    match (node, segment) {
        (Value::Object(map), Segment::Key(key)) => find_key(map, key),
        (Value::Array(items), Segment::Index(_)) => items.first(),
        (Value::Array(items), Segment::Key(key)) => {
            key.parse::<usize>().ok()?;
            items.first()
        }
        _ => None,
    }
}

fn find_key<'a>(map: &'a serde_json::Map<String, Value>, key: &str) -> Option<&'a Value> {
    let wanted = normalize(key);
    map.iter()
        .find(|(name, _)| normalize(name) == wanted)
        .map(|(_, value)| value)
}

fn normalize(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn to_text(value: &Value) -> Result<String, String> {
    if let Some(text) = scalar_text(value) {
        return Ok(text);
    }
    match value {
        Value::Array(items) => items
            .iter()
            .filter(|item| !item.is_null())
            .map(|item| scalar_text(item).ok_or_else(|| "nested values cannot be printed".to_string()))
            .collect::<Result<Vec<_>, _>>()
            .map(|parts| parts.join(", ")),
        _ => Err("a mapping cannot be printed; select one of its fields".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data() -> Value {
        json!({
            "ci": {
                "author-company": "ACME Corp",
                "classification": null,
                "configuration": {
                    "fqdn": "srv01.corp.example",
                    "ram": 16,
                    "ntp": ["10.0.0.1", null, "10.0.0.2"]
                },
                "description": null,
                "interfaces": [
                    {"name": "eth0", "dhcp": false, "dns": ["1.1.1.1", "8.8.8.8"]},
                    {"name": "eth1", "dhcp": true, "dns": []}
                ]
            }
        })
    }

    fn schema() -> Value {
        json!({
            "ci": {
                "author-company": null,
                "classification": null,
                "configuration": {"fqdn": null, "ram": null, "ntp": [null]},
                "description": {"customer": null, "service-code": null},
                "interfaces": [{"name": null, "dhcp": null, "dns": [null]}]
            }
        })
    }

    fn schema_renderer() -> TemplateRenderer {
        TemplateRenderer::strict().with_schema(&schema()).unwrap()
    }

    #[test]
    fn test_render_values() {
        let renderer = TemplateRenderer::strict();
        let out = renderer
            .render("Host: <<ci.configuration.fqdn>> (<< ci.configuration.ram >> GB)", &data())
            .unwrap();
        assert_eq!(out, "Host: srv01.corp.example (16 GB)");
    }

    #[test]
    fn test_key_matching_ignores_case_and_separators() {
        let renderer = TemplateRenderer::strict();
        for template in ["<<ci.author_company>>", "<<ci.author-company>>", "<<.CI.AuthorCompany>>"] {
            assert_eq!(renderer.render(template, &data()).unwrap(), "ACME Corp");
        }
    }

    #[test]
    fn test_case_helpers() {
        let renderer = TemplateRenderer::strict();
        let out = renderer
            .render("<<upper ci.author_company>>/<<ci.author_company | lower>>", &data())
            .unwrap();
        assert_eq!(out, "ACME CORP/acme corp");
    }

    #[test]
    fn test_null_fields_render_empty_in_strict_mode() {
        let renderer = schema_renderer();
        assert_eq!(renderer.render("[<<ci.classification>>]", &data()).unwrap(), "[]");
        assert_eq!(renderer.render("[<<ci.description.customer>>]", &data()).unwrap(), "[]");
        assert_eq!(
            renderer.render("[<<ci.description.service_code>>]", &data()).unwrap(),
            "[]"
        );
    }

    #[test]
    fn test_unknown_field_below_null_parent_is_missing() {
        let err = schema_renderer()
            .render("<<ci.description.custmer>>", &data())
            .unwrap_err();
        match err {
            TemplateError::MissingKey { path, line } => {
                assert_eq!(path, "ci.description.custmer");
                assert_eq!(line, 1);
            }
            other => panic!("unexpected error {other:?}"),
        }

        let out = TemplateRenderer::lenient()
            .with_schema(&schema())
            .unwrap()
            .render("[<<ci.description.custmer>>]", &data())
            .unwrap();
        assert_eq!(out, "[]");
    }

    #[test]
    fn test_null_root_checks_whole_path_against_schema() {
        let data = json!({"ci": null});
        let renderer = schema_renderer();
        assert_eq!(renderer.render("[<<ci.configuration.fqdn>>]", &data).unwrap(), "[]");
        assert_eq!(renderer.render("[<<ci.interfaces[3].dns.0>>]", &data).unwrap(), "[]");
        assert_eq!(
            renderer.render("<<range ci.interfaces>><<.name>><<end>>.", &data).unwrap(),
            "."
        );
        assert!(renderer.render("<<ci.totally.bogus.path>>", &data).is_err());
        assert!(renderer.render("<<ci.classification.level>>", &data).is_err());
    }

    #[test]
    fn test_null_parent_without_schema_is_missing() {
        let err = TemplateRenderer::strict()
            .render("<<ci.description.customer>>", &data())
            .unwrap_err();
        assert!(matches!(err, TemplateError::MissingKey { .. }));
    }

    #[test]
    fn test_range_items_follow_schema() {
        let data = json!({"ci": {"interfaces": [{"name": "eth0", "dns": null}]}});
        let renderer = schema_renderer();
        let out = renderer
            .render("<<range ci.interfaces>><<.name>>[<<.dns.0>>]<<end>>", &data)
            .unwrap();
        assert_eq!(out, "eth0[]");
        assert!(renderer
            .render("<<range ci.interfaces>><<.dns.0.host>><<end>>", &data)
            .is_err());
    }

    #[test]
    fn test_missing_key_strict_vs_lenient() {
        let template = "line one\n<<ci.configuration.hostname>>";
        let err = TemplateRenderer::strict().render(template, &data()).unwrap_err();
        match err {
            TemplateError::MissingKey { path, line } => {
                assert_eq!(path, "ci.configuration.hostname");
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error {other:?}"),
        }

        let out = TemplateRenderer::lenient().render(template, &data()).unwrap();
        assert_eq!(out, "line one\n");
    }

    #[test]
    fn test_indexing() {
        let renderer = TemplateRenderer::strict();
        assert_eq!(renderer.render("<<ci.interfaces[1].name>>", &data()).unwrap(), "eth1");
        assert_eq!(renderer.render("<<ci.interfaces.0.dns.1>>", &data()).unwrap(), "8.8.8.8");
        assert!(renderer.render("<<ci.interfaces[5].name>>", &data()).is_err());
    }

    #[test]
    fn test_range() {
        let renderer = TemplateRenderer::strict();
        let out = renderer
            .render(
                "<<range ci.interfaces>><<.name>>:<<range .dns>> <<.>><<end>>;<<end>>",
                &data(),
            )
            .unwrap();
        assert_eq!(out, "eth0: 1.1.1.1 8.8.8.8;eth1:;");
    }

    #[test]
    fn test_range_can_reach_root() {
        let renderer = TemplateRenderer::strict();
        let out = renderer
            .render("<<range ci.interfaces>><<.name>>@<<ci.configuration.fqdn>> <<end>>", &data())
            .unwrap();
        assert_eq!(out, "eth0@srv01.corp.example eth1@srv01.corp.example ");
    }

    #[test]
    fn test_lists_render_joined() {
        let renderer = TemplateRenderer::strict();
        let out = renderer.render("<<ci.configuration.ntp>>", &data()).unwrap();
        assert_eq!(out, "10.0.0.1, 10.0.0.2");
    }

    #[test]
    fn test_mapping_cannot_be_printed() {
        let err = TemplateRenderer::strict()
            .render("<<ci.configuration>>", &data())
            .unwrap_err();
        assert!(matches!(err, TemplateError::RenderingFailed { line: 1, .. }));
    }

    #[test]
    fn test_range_over_scalar_fails() {
        let err = TemplateRenderer::lenient()
            .render("<<range ci.author_company>>x<<end>>", &data())
            .unwrap_err();
        assert!(matches!(err, TemplateError::RenderingFailed { .. }));
    }

    #[test]
    fn test_render_reader() {
        let bytes = TemplateRenderer::strict()
            .render_reader("\\title{<<ci.author_company>>}".as_bytes(), &data())
            .unwrap();
        assert_eq!(bytes, b"\\title{ACME Corp}");
    }
}
