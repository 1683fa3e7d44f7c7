//! Schema validation utility.
//!
//! Validators are backed by libxml2 (feature `libxml2`). Without the feature no
//! validator can be loaded and the [`SchemaSet`] is empty.

#[cfg(feature = "libxml2")]
pub mod libxml;

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::config::SchemaConfig;
use crate::error::EtsResult;

/// OpenSearch description schema (RELAX NG, XML syntax).
pub const OSD_SCHEMA: &[u8] = include_bytes!("../../resources/osd-1.1-draft5.rng");

/// Atom feed/entry schema (RFC 4287), XML Schema rendition.
pub const ATOM_SCHEMA: &[u8] = include_bytes!("../../resources/atom.xsd");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SchemaLanguage {
    XmlSchema,
    RelaxNg,
}

impl fmt::Display for SchemaLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaLanguage::XmlSchema => f.write_str("XML Schema"),
            SchemaLanguage::RelaxNg => f.write_str("RELAX NG"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub message: String,
    pub line: Option<u32>,
    pub column: Option<u32>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(col)) => write!(f, "[{}:{}] {}", line, col, self.message),
            (Some(line), None) => write!(f, "[{}] {}", line, self.message),
            _ => f.write_str(&self.message),
        }
    }
}

/// Errors collected while validating one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
}

impl ValidationReport {
    pub fn valid() -> Self {
        Self::default()
    }

    pub fn with_errors(errors: Vec<ValidationError>) -> Self {
        Self { errors }
    }

    /// Report for an instance document that is not well-formed XML.
    pub fn not_well_formed(error: &roxmltree::Error) -> Self {
        let pos = error.pos();
        Self::with_errors(vec![ValidationError {
            message: error.to_string(),
            line: Some(pos.row),
            column: Some(pos.col),
        }])
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for error in &self.errors {
            writeln!(f, "{}", error)?;
        }
        Ok(())
    }
}

/// Validates XML instance documents against a compiled schema.
pub trait SchemaValidator: Send + Sync {
    fn language(&self) -> SchemaLanguage;

    fn validate(&self, xml: &[u8]) -> ValidationReport;
}

/// Check well-formedness before handing a document to a schema validator.
pub fn check_well_formed(xml: &[u8]) -> Result<(), ValidationReport> {
    let text = String::from_utf8_lossy(xml);
    match roxmltree::Document::parse(&text) {
        Ok(_) => Ok(()),
        Err(roxmltree::Error::DtdDetected) => Ok(()),
        Err(e) => Err(ValidationReport::not_well_formed(&e)),
    }
}

/// The schemas available to a test run.
#[derive(Clone, Default)]
pub struct SchemaSet {
    /// All CSW 3.0 messages (cswAll.xsd)
    pub csw: Option<Arc<dyn SchemaValidator>>,
    /// Atom feeds/entries
    pub atom: Option<Arc<dyn SchemaValidator>>,
    /// OpenSearch description documents
    pub osd: Option<Arc<dyn SchemaValidator>>,
}

impl fmt::Debug for SchemaSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaSet")
            .field("csw", &self.csw.as_ref().map(|s| s.language()))
            .field("atom", &self.atom.as_ref().map(|s| s.language()))
            .field("osd", &self.osd.as_ref().map(|s| s.language()))
            .finish()
    }
}

impl SchemaSet {
    #[cfg(feature = "libxml2")]
    pub fn load(config: &SchemaConfig) -> EtsResult<Self> {
        use libxml::{RelaxNgSchema, XsdSchema};

        let csw: Option<Arc<dyn SchemaValidator>> = match &config.csw {
            Some(path) => Some(Arc::new(XsdSchema::from_file(path)?)),
            None => {
                tracing::warn!("No CSW schema configured; CSW message validation is disabled");
                None
            }
        };

        let atom: Option<Arc<dyn SchemaValidator>> = match &config.atom {
            Some(path) => Some(Arc::new(XsdSchema::from_file(path)?)),
            None => bundled("Atom", XsdSchema::from_memory(ATOM_SCHEMA)),
        };

        let osd: Option<Arc<dyn SchemaValidator>> = match &config.osd {
            Some(path) => Some(Arc::new(RelaxNgSchema::from_file(path)?)),
            None => bundled("OpenSearch description", RelaxNgSchema::from_memory(OSD_SCHEMA)),
        };

        Ok(Self { csw, atom, osd })
    }

    #[cfg(not(feature = "libxml2"))]
    pub fn load(config: &SchemaConfig) -> EtsResult<Self> {
        if config.csw.is_some() || config.atom.is_some() || config.osd.is_some() {
            tracing::warn!("Schema paths configured but libxml2 support is not compiled in");
        }
        tracing::warn!("Built without the `libxml2` feature; schema validation is disabled");
        Ok(Self::default())
    }
}

/// A bundled schema that fails to compile disables its validation instead of the run.
#[cfg(feature = "libxml2")]
fn bundled<S>(name: &str, loaded: EtsResult<S>) -> Option<Arc<dyn SchemaValidator>>
where
    S: SchemaValidator + 'static,
{
    match loaded {
        Ok(schema) => Some(Arc::new(schema)),
        Err(e) => {
            tracing::warn!("Bundled {} schema not usable, validation disabled: {}", name, e);
            None
        }
    }
}
