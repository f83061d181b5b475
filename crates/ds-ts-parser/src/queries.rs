//! Pre-compiled tree-sitter queries for locating class declarations.
//!
//! Decorators and members are read by walking each matched declaration
//! directly; the query only finds the declarations.

use std::sync::OnceLock;

use tree_sitter::{Language, Query};

use crate::error::ParseError;

/// Tree-sitter query matching class declarations.
///
/// # Capture Names
///
/// - `class.declaration` - The `class_declaration`,
///   `abstract_class_declaration`, or named `class` expression node
/// - `class.name` - The class name
pub const CLASS_QUERY: &str = r"
; class Foo { }  /  export class Foo { }
(class_declaration
  name: (type_identifier) @class.name) @class.declaration

; abstract class Foo { }
(abstract_class_declaration
  name: (type_identifier) @class.name) @class.declaration

; export default class Foo { }  /  const X = class Foo { }
(class
  name: (type_identifier) @class.name) @class.declaration
";

/// Capture name of the declaration node.
pub const CAPTURE_CLASS_DECLARATION: &str = "class.declaration";

/// Capture name of the class name node.
pub const CAPTURE_CLASS_NAME: &str = "class.name";

/// A compiled class query with its resolved capture indices.
#[derive(Debug)]
pub struct ClassQuery {
    /// The compiled query.
    pub query: Query,
    /// Index of [`CAPTURE_CLASS_DECLARATION`].
    pub declaration: u32,
    /// Index of [`CAPTURE_CLASS_NAME`].
    pub name: u32,
}

static COMPILED_QUERY_TS: OnceLock<ClassQuery> = OnceLock::new();

static COMPILED_QUERY_TSX: OnceLock<ClassQuery> = OnceLock::new();

/// Returns the compiled class query for TypeScript.
///
/// Compiled once and shared by every parser; thread-safe.
pub fn get_typescript_class_query() -> Result<&'static ClassQuery, ParseError> {
    if let Some(query) = COMPILED_QUERY_TS.get() {
        return Ok(query);
    }

    let language: Language = tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into();
    let query = compile_query(&language)?;

    Ok(COMPILED_QUERY_TS.get_or_init(|| query))
}

/// Returns the compiled class query for TSX.
pub fn get_tsx_class_query() -> Result<&'static ClassQuery, ParseError> {
    if let Some(query) = COMPILED_QUERY_TSX.get() {
        return Ok(query);
    }

    let language: Language = tree_sitter_typescript::LANGUAGE_TSX.into();
    let query = compile_query(&language)?;

    Ok(COMPILED_QUERY_TSX.get_or_init(|| query))
}

/// Compiles the class query for the given language.
fn compile_query(language: &Language) -> Result<ClassQuery, ParseError> {
    let query = Query::new(language, CLASS_QUERY).map_err(|e| ParseError::QueryCompile {
        offset: e.offset,
        source: e,
    })?;

    // Both names appear in the query text, so the lookups cannot miss.
    let declaration = query
        .capture_index_for_name(CAPTURE_CLASS_DECLARATION)
        .unwrap_or(u32::MAX);
    let name = query
        .capture_index_for_name(CAPTURE_CLASS_NAME)
        .unwrap_or(u32::MAX);

    Ok(ClassQuery {
        query,
        declaration,
        name,
    })
}
