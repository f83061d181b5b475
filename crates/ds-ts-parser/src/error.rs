//! Error types for the ds-ts-parser crate.

/// Errors that can occur while parsing TypeScript sources.
///
/// # Examples
///
/// ```
/// use ds_ts_parser::ParseError;
///
/// fn describe(err: &ParseError) -> &'static str {
///     match err {
///         ParseError::LanguageInit => "grammar rejected",
///         ParseError::QueryCompile { .. } => "bad query",
///         ParseError::Parse => "parse aborted",
///     }
/// }
///
/// assert_eq!(describe(&ParseError::Parse), "parse aborted");
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Failed to set the TypeScript language on the parser.
    #[error("failed to set TypeScript language")]
    LanguageInit,

    /// Failed to compile a tree-sitter query.
    #[error("failed to compile query at offset {offset}: {source}")]
    QueryCompile {
        /// The byte offset in the query string where the error occurred.
        offset: usize,
        /// The underlying query error.
        #[source]
        source: tree_sitter::QueryError,
    },

    /// The parser produced no tree (cancelled or out of memory).
    #[error("failed to parse source code")]
    Parse,
}
