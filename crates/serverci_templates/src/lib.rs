//! # serverci_templates
//!
//! Placeholder substitution for serverci document templates.
//!
//! Templates are arbitrary text (typically LaTeX) with `<< ... >>` actions
//! that look up values in the document by dotted path. Two case helpers,
//! `upper` and `lower`, and `range`/`end` blocks over sequences are
//! supported. In strict mode a path that does not exist is an error; in
//! lenient mode it renders empty. Attach a schema with
//! [`TemplateRenderer::with_schema`] so that paths below absent blocks are
//! checked against the data's shape instead of the data itself.
//!
//! ## Example
//!
//! ```rust
//! use serverci_templates::TemplateRenderer;
//! use serde_json::json;
//!
//! let data = json!({"ci": {"configuration": {"fqdn": "srv01.corp.example"}}});
//! let renderer = TemplateRenderer::strict();
//!
//! let out = renderer
//!     .render("\\section{<< upper ci.configuration.fqdn >>}", &data)
//!     .unwrap();
//! assert_eq!(out, "\\section{SRV01.CORP.EXAMPLE}");
//!
//! assert!(renderer.render("<< ci.configuration.hostname >>", &data).is_err());
//! ```

pub mod error;
pub mod parser;
pub mod renderer;

pub use error::{TemplateError, TemplateResult};
pub use parser::{Func, Template};
pub use renderer::{MissingKey, TemplateRenderer};
