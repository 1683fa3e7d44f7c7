//! libxml2 FFI bindings for XML Schema and RELAX NG validation.
//!
//! Schema parsing is serialized behind a mutex (libxml2's schema parsers are not
//! thread-safe). Validation creates a fresh context per document, so compiled schemas
//! can be shared across threads.

use libc::{c_char, c_int, c_void};
use std::ffi::{CStr, CString};
use std::path::Path;
use std::sync::{Mutex, Once};

use super::{SchemaLanguage, SchemaValidator, ValidationError, ValidationReport, check_well_formed};
use crate::error::{EtsError, EtsResult};

#[repr(C)]
pub struct XmlDoc {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlSchema {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlSchemaParserCtxt {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlSchemaValidCtxt {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlRelaxNg {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlRelaxNgParserCtxt {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlRelaxNgValidCtxt {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlError {
    pub domain: c_int,
    pub code: c_int,
    pub message: *const c_char,
    pub level: c_int,
    pub file: *const c_char,
    pub line: c_int,
    pub str1: *const c_char,
    pub str2: *const c_char,
    pub str3: *const c_char,
    pub int1: c_int,
    /// Column number
    pub int2: c_int,
    pub ctxt: *mut c_void,
    pub node: *mut c_void,
}

pub type XmlStructuredErrorFunc =
    Option<unsafe extern "C" fn(user_data: *mut c_void, error: *const XmlError)>;

const XML_PARSE_NOERROR: c_int = 1 << 5;
const XML_PARSE_NOWARNING: c_int = 1 << 6;
const XML_PARSE_NONET: c_int = 1 << 11;

#[cfg_attr(target_os = "windows", link(name = "libxml2"))]
#[cfg_attr(not(target_os = "windows"), link(name = "xml2"))]
unsafe extern "C" {
    fn xmlInitParser();

    fn xmlReadMemory(
        buffer: *const c_char,
        size: c_int,
        url: *const c_char,
        encoding: *const c_char,
        options: c_int,
    ) -> *mut XmlDoc;
    fn xmlFreeDoc(doc: *mut XmlDoc);

    fn xmlSchemaNewParserCtxt(url: *const c_char) -> *mut XmlSchemaParserCtxt;
    fn xmlSchemaNewMemParserCtxt(buffer: *const c_char, size: c_int) -> *mut XmlSchemaParserCtxt;
    fn xmlSchemaParse(ctxt: *mut XmlSchemaParserCtxt) -> *mut XmlSchema;
    fn xmlSchemaFreeParserCtxt(ctxt: *mut XmlSchemaParserCtxt);
    fn xmlSchemaFree(schema: *mut XmlSchema);
    fn xmlSchemaNewValidCtxt(schema: *mut XmlSchema) -> *mut XmlSchemaValidCtxt;
    fn xmlSchemaFreeValidCtxt(ctxt: *mut XmlSchemaValidCtxt);
    fn xmlSchemaSetValidStructuredErrors(
        ctxt: *mut XmlSchemaValidCtxt,
        handler: XmlStructuredErrorFunc,
        ctx: *mut c_void,
    );
    fn xmlSchemaValidateDoc(ctxt: *mut XmlSchemaValidCtxt, doc: *mut XmlDoc) -> c_int;

    fn xmlRelaxNGNewParserCtxt(url: *const c_char) -> *mut XmlRelaxNgParserCtxt;
    fn xmlRelaxNGNewMemParserCtxt(buffer: *const c_char, size: c_int)
    -> *mut XmlRelaxNgParserCtxt;
    fn xmlRelaxNGParse(ctxt: *mut XmlRelaxNgParserCtxt) -> *mut XmlRelaxNg;
    fn xmlRelaxNGFreeParserCtxt(ctxt: *mut XmlRelaxNgParserCtxt);
    fn xmlRelaxNGFree(schema: *mut XmlRelaxNg);
    fn xmlRelaxNGNewValidCtxt(schema: *mut XmlRelaxNg) -> *mut XmlRelaxNgValidCtxt;
    fn xmlRelaxNGFreeValidCtxt(ctxt: *mut XmlRelaxNgValidCtxt);
    fn xmlRelaxNGSetValidStructuredErrors(
        ctxt: *mut XmlRelaxNgValidCtxt,
        handler: XmlStructuredErrorFunc,
        ctx: *mut c_void,
    );
    fn xmlRelaxNGValidateDoc(ctxt: *mut XmlRelaxNgValidCtxt, doc: *mut XmlDoc) -> c_int;
}

static INIT: Once = Once::new();
static PARSE_LOCK: Mutex<()> = Mutex::new(());

fn init() {
    INIT.call_once(|| unsafe { xmlInitParser() });
}

unsafe extern "C" fn collect_error(user_data: *mut c_void, error: *const XmlError) {
    if user_data.is_null() || error.is_null() {
        return;
    }
    let errors = unsafe { &mut *(user_data as *mut Vec<ValidationError>) };
    let error = unsafe { &*error };
    let message = if error.message.is_null() {
        format!("libxml2 error {}", error.code)
    } else {
        unsafe { CStr::from_ptr(error.message) }
            .to_string_lossy()
            .trim()
            .to_string()
    };
    errors.push(ValidationError {
        message,
        line: (error.line > 0).then_some(error.line as u32),
        column: (error.int2 > 0).then_some(error.int2 as u32),
    });
}

fn path_to_cstring(path: &Path) -> EtsResult<CString> {
    CString::new(path.to_string_lossy().as_bytes())
        .map_err(|_| EtsError::Schema(format!("Invalid schema path: {}", path.display())))
}

fn buffer_len(data: &[u8]) -> EtsResult<c_int> {
    c_int::try_from(data.len()).map_err(|_| EtsError::Schema("Buffer too large".to_string()))
}

/// Parsed instance document, freed on drop.
struct ParsedDoc(*mut XmlDoc);

impl ParsedDoc {
    fn read(xml: &[u8]) -> Result<Self, ValidationReport> {
        check_well_formed(xml)?;
        let size = buffer_len(xml).map_err(|e| {
            ValidationReport::with_errors(vec![ValidationError {
                message: e.to_string(),
                line: None,
                column: None,
            }])
        })?;
        let doc = unsafe {
            xmlReadMemory(
                xml.as_ptr() as *const c_char,
                size,
                std::ptr::null(),
                std::ptr::null(),
                XML_PARSE_NONET | XML_PARSE_NOERROR | XML_PARSE_NOWARNING,
            )
        };
        if doc.is_null() {
            return Err(ValidationReport::with_errors(vec![ValidationError {
                message: "libxml2 could not parse the document".to_string(),
                line: None,
                column: None,
            }]));
        }
        Ok(Self(doc))
    }
}

impl Drop for ParsedDoc {
    fn drop(&mut self) {
        unsafe { xmlFreeDoc(self.0) };
    }
}

/// Compiled W3C XML Schema.
pub struct XsdSchema {
    ptr: *mut XmlSchema,
}

// Safety: compiled schemas are read-only during validation; every validation uses
// its own context.
unsafe impl Send for XsdSchema {}
unsafe impl Sync for XsdSchema {}

impl XsdSchema {
    /// Compile a schema from a file, resolving relative imports against its location.
    pub fn from_file(path: &Path) -> EtsResult<Self> {
        init();
        let location = path_to_cstring(path)?;
        let _guard = PARSE_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let ptr = unsafe {
            let ctxt = xmlSchemaNewParserCtxt(location.as_ptr());
            if ctxt.is_null() {
                return Err(EtsError::Schema("Failed to create schema parser".to_string()));
            }
            let schema = xmlSchemaParse(ctxt);
            xmlSchemaFreeParserCtxt(ctxt);
            schema
        };
        if ptr.is_null() {
            return Err(EtsError::Schema(format!(
                "Failed to compile XML Schema {}",
                path.display()
            )));
        }
        tracing::debug!("Compiled XML Schema {}", path.display());
        Ok(Self { ptr })
    }

    pub fn from_memory(data: &[u8]) -> EtsResult<Self> {
        init();
        let size = buffer_len(data)?;
        let _guard = PARSE_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let ptr = unsafe {
            let ctxt = xmlSchemaNewMemParserCtxt(data.as_ptr() as *const c_char, size);
            if ctxt.is_null() {
                return Err(EtsError::Schema("Failed to create schema parser".to_string()));
            }
            let schema = xmlSchemaParse(ctxt);
            xmlSchemaFreeParserCtxt(ctxt);
            schema
        };
        if ptr.is_null() {
            return Err(EtsError::Schema("Failed to compile XML Schema".to_string()));
        }
        Ok(Self { ptr })
    }
}

impl SchemaValidator for XsdSchema {
    fn language(&self) -> SchemaLanguage {
        SchemaLanguage::XmlSchema
    }

    fn validate(&self, xml: &[u8]) -> ValidationReport {
        let doc = match ParsedDoc::read(xml) {
            Ok(doc) => doc,
            Err(report) => return report,
        };
        let mut errors: Vec<ValidationError> = Vec::new();
        let code = unsafe {
            let ctxt = xmlSchemaNewValidCtxt(self.ptr);
            if ctxt.is_null() {
                return ValidationReport::with_errors(vec![ValidationError {
                    message: "Failed to create validation context".to_string(),
                    line: None,
                    column: None,
                }]);
            }
            xmlSchemaSetValidStructuredErrors(
                ctxt,
                Some(collect_error),
                &mut errors as *mut Vec<ValidationError> as *mut c_void,
            );
            let code = xmlSchemaValidateDoc(ctxt, doc.0);
            xmlSchemaFreeValidCtxt(ctxt);
            code
        };
        finish(code, errors)
    }
}

impl Drop for XsdSchema {
    fn drop(&mut self) {
        unsafe { xmlSchemaFree(self.ptr) };
    }
}

/// Compiled RELAX NG grammar (XML syntax).
pub struct RelaxNgSchema {
    ptr: *mut XmlRelaxNg,
}

unsafe impl Send for RelaxNgSchema {}
unsafe impl Sync for RelaxNgSchema {}

impl RelaxNgSchema {
    pub fn from_file(path: &Path) -> EtsResult<Self> {
        init();
        let location = path_to_cstring(path)?;
        let _guard = PARSE_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let ptr = unsafe {
            let ctxt = xmlRelaxNGNewParserCtxt(location.as_ptr());
            if ctxt.is_null() {
                return Err(EtsError::Schema("Failed to create RELAX NG parser".to_string()));
            }
            let schema = xmlRelaxNGParse(ctxt);
            xmlRelaxNGFreeParserCtxt(ctxt);
            schema
        };
        if ptr.is_null() {
            return Err(EtsError::Schema(format!(
                "Failed to compile RELAX NG grammar {}",
                path.display()
            )));
        }
        Ok(Self { ptr })
    }

    pub fn from_memory(data: &[u8]) -> EtsResult<Self> {
        init();
        let size = buffer_len(data)?;
        let _guard = PARSE_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let ptr = unsafe {
            let ctxt = xmlRelaxNGNewMemParserCtxt(data.as_ptr() as *const c_char, size);
            if ctxt.is_null() {
                return Err(EtsError::Schema("Failed to create RELAX NG parser".to_string()));
            }
            let schema = xmlRelaxNGParse(ctxt);
            xmlRelaxNGFreeParserCtxt(ctxt);
            schema
        };
        if ptr.is_null() {
            return Err(EtsError::Schema("Failed to compile RELAX NG grammar".to_string()));
        }
        Ok(Self { ptr })
    }
}

impl SchemaValidator for RelaxNgSchema {
    fn language(&self) -> SchemaLanguage {
        SchemaLanguage::RelaxNg
    }

    fn validate(&self, xml: &[u8]) -> ValidationReport {
        let doc = match ParsedDoc::read(xml) {
            Ok(doc) => doc,
            Err(report) => return report,
        };
        let mut errors: Vec<ValidationError> = Vec::new();
        let code = unsafe {
            let ctxt = xmlRelaxNGNewValidCtxt(self.ptr);
            if ctxt.is_null() {
                return ValidationReport::with_errors(vec![ValidationError {
                    message: "Failed to create validation context".to_string(),
                    line: None,
                    column: None,
                }]);
            }
            xmlRelaxNGSetValidStructuredErrors(
                ctxt,
                Some(collect_error),
                &mut errors as *mut Vec<ValidationError> as *mut c_void,
            );
            let code = xmlRelaxNGValidateDoc(ctxt, doc.0);
            xmlRelaxNGFreeValidCtxt(ctxt);
            code
        };
        finish(code, errors)
    }
}

impl Drop for RelaxNgSchema {
    fn drop(&mut self) {
        unsafe { xmlRelaxNGFree(self.ptr) };
    }
}

/// Combine the libxml2 return code with the collected errors.
fn finish(code: c_int, mut errors: Vec<ValidationError>) -> ValidationReport {
    match code {
        0 => ValidationReport::with_errors(errors),
        n if n > 0 => {
            if errors.is_empty() {
                errors.push(ValidationError {
                    message: format!("Document is invalid ({} errors)", n),
                    line: None,
                    column: None,
                });
            }
            ValidationReport::with_errors(errors)
        }
        n => {
            errors.push(ValidationError {
                message: format!("Internal libxml2 error (code {})", n),
                line: None,
                column: None,
            });
            ValidationReport::with_errors(errors)
        }
    }
}
