//! # serverci_model
//!
//! Configuration-item documents for serverci: the typed model, YAML/JSON
//! decoding and field validation.
//!
//! Validation is a read-only pass over the document that collects every
//! finding before returning, so callers can report all problems at once.
//!
//! ## Example
//!
//! ```rust
//! use serverci_model::DocumentReader;
//!
//! let yaml = r#"
//! ci:
//!   interfaces:
//!     - name: eth0
//!       vlan: 5000
//!       ip: 10.0.0.300
//! "#;
//!
//! let document = DocumentReader::from_yaml_str(yaml).unwrap();
//! let errors = document.validate().unwrap_err();
//! assert_eq!(errors.findings().len(), 2);
//! assert!(errors.to_string().starts_with("ci.interfaces[0].vlan:"));
//! ```

pub mod error;
pub mod models;
pub mod reader;
pub mod rules;
pub mod validator;

pub use error::{ModelError, ModelResult};
pub use models::*;
pub use reader::{DocumentReader, InputFormat};
pub use validator::{
    DocumentValidator, Validate, ValidationErrors, ValidationFinding, ValidationReport,
};
