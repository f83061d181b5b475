//! TypeScript parser management using tree-sitter.
//!
//! This module provides [`TsParser`] for parsing TypeScript files and
//! extracting their class structures.

use camino::Utf8Path;
use ds_core::ClassStructure;
use tree_sitter::{Language, Parser};

use crate::classes::extract_classes;
use crate::error::ParseError;
use crate::queries::{ClassQuery, get_tsx_class_query, get_typescript_class_query};

/// Indicates whether the parser is configured for TypeScript or TSX.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserKind {
    /// Plain TypeScript (`.ts`, `.mts`, `.cts`).
    TypeScript,
    /// TypeScript with JSX (`.tsx`).
    Tsx,
}

impl ParserKind {
    /// Picks the grammar for a file by extension.
    ///
    /// # Examples
    ///
    /// ```
    /// use ds_ts_parser::ParserKind;
    /// use camino::Utf8Path;
    ///
    /// assert_eq!(ParserKind::for_path(Utf8Path::new("a/view.tsx")), ParserKind::Tsx);
    /// assert_eq!(ParserKind::for_path(Utf8Path::new("a/service.ts")), ParserKind::TypeScript);
    /// ```
    #[must_use]
    pub fn for_path(path: &Utf8Path) -> Self {
        match path.extension() {
            Some("tsx") => Self::Tsx,
            _ => Self::TypeScript,
        }
    }
}

/// Result of parsing a TypeScript file.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseResult {
    /// Every named class declared in the file, in source order.
    pub classes: Vec<ClassStructure>,

    /// Whether tree-sitter had to recover from syntax errors.
    ///
    /// Classes are still extracted from the recovered tree.
    pub has_errors: bool,
}

/// TypeScript parser for extracting class structures.
///
/// Wraps a tree-sitter parser; reuse one per thread to avoid repeated
/// initialization. `Send` but not `Sync`.
///
/// # Examples
///
/// ```
/// use ds_ts_parser::TsParser;
///
/// let mut parser = TsParser::new()?;
/// let source = "@Injectable() export class Mailer { @Inject() transport: Transport; }";
/// let result = parser.parse(source)?;
///
/// let mailer = &result.classes[0];
/// assert_eq!(mailer.name, "Mailer");
/// assert_eq!(mailer.annotations[0].name, "Injectable");
/// assert_eq!(mailer.properties[0].name, "transport");
/// # Ok::<(), ds_ts_parser::ParseError>(())
/// ```
pub struct TsParser {
    /// The underlying tree-sitter parser.
    parser: Parser,
    /// Whether this is a TypeScript or TSX parser.
    kind: ParserKind,
}

impl TsParser {
    /// Creates a new TypeScript parser.
    pub fn new() -> Result<Self, ParseError> {
        Self::with_kind(ParserKind::TypeScript)
    }

    /// Creates a new TSX parser.
    pub fn new_tsx() -> Result<Self, ParseError> {
        Self::with_kind(ParserKind::Tsx)
    }

    /// Creates a parser for the given grammar.
    pub fn with_kind(kind: ParserKind) -> Result<Self, ParseError> {
        let language: Language = match kind {
            ParserKind::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            ParserKind::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        };

        let mut parser = Parser::new();
        parser
            .set_language(&language)
            .map_err(|_| ParseError::LanguageInit)?;

        Ok(Self { parser, kind })
    }

    /// The grammar this parser uses.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> ParserKind {
        self.kind
    }

    fn get_query(&self) -> Result<&'static ClassQuery, ParseError> {
        match self.kind {
            ParserKind::TypeScript => get_typescript_class_query(),
            ParserKind::Tsx => get_tsx_class_query(),
        }
    }

    /// Parses source code and extracts its class structures.
    pub fn parse(&mut self, source: &str) -> Result<ParseResult, ParseError> {
        let tree = self.parser.parse(source, None).ok_or(ParseError::Parse)?;

        let query = self.get_query()?;
        let classes = extract_classes(&tree, source, query);

        Ok(ParseResult {
            classes,
            has_errors: tree.root_node().has_error(),
        })
    }
}

impl std::fmt::Debug for TsParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TsParser")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(source: &str) -> ParseResult {
        TsParser::new()
            .expect("Parser creation failed")
            .parse(source)
            .expect("Parse failed")
    }

    #[test]
    fn test_parse_plain_classes() {
        let result = parse(
            r"
class A {}
export class B {}
export default class C {}
abstract class D {}
",
        );
        let names: Vec<_> = result.classes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["A", "B", "C", "D"]);
        assert!(result.classes.iter().all(|c| !c.has_annotations()));
        assert!(!result.has_errors);
    }

    #[test]
    fn test_class_decorators_before_and_after_export() {
        let result = parse(
            r"
@Controller('/users')
export class UserController {}

export @Injectable() class Mailer {}

@Scope('request') @Injectable
class Session {}
",
        );
        let controller = &result.classes[0];
        assert_eq!(controller.annotations.len(), 1);
        assert_eq!(controller.annotations[0].name, "Controller");
        assert_eq!(controller.annotations[0].arguments, vec![json!("/users")]);

        let mailer = &result.classes[1];
        assert_eq!(mailer.annotations[0].name, "Injectable");

        let session = &result.classes[2];
        let names: Vec<_> = session.annotations.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["Scope", "Injectable"]);
        assert!(session.annotations[1].arguments.is_empty());
    }

    #[test]
    fn test_member_decorators() {
        let result = parse(
            r"
export class OrderController {
  @Inject() private readonly orders: OrderService;
  @Value('app.page_size') pageSize = 20;
  plain: string;

  constructor() {}

  @Get('/orders', { auth: true })
  @Middleware(AuthMiddleware)
  index() {}

  @Post('/orders')
  async create(): Promise<void> {}

  get total(): number { return 0; }
}
",
        );
        let class = &result.classes[0];

        let props: Vec<_> = class.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(props, ["orders", "pageSize", "plain"]);
        assert_eq!(class.properties[0].annotations[0].name, "Inject");
        assert_eq!(
            class.properties[1].annotations[0].arguments,
            vec![json!("app.page_size")]
        );
        assert!(class.properties[2].annotations.is_empty());

        let methods: Vec<_> = class.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(methods, ["constructor", "index", "create", "total"]);

        let index = &class.methods[1];
        let names: Vec<_> = index.annotations.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["Get", "Middleware"]);
        assert_eq!(
            index.annotations[0].arguments,
            vec![json!("/orders"), json!({"auth": true})]
        );
        assert_eq!(index.annotations[1].arguments, vec![json!("AuthMiddleware")]);
        assert_eq!(class.methods[2].annotations[0].name, "Post");
        assert!(class.methods[3].annotations.is_empty());
    }

    #[test]
    fn test_namespaced_decorator_name() {
        let result = parse("@Http.Route('/a') class A { @Http.Get() list() {} }");
        let class = &result.classes[0];
        assert_eq!(class.annotations[0].name, "Http.Route");
        assert_eq!(class.methods[0].annotations[0].name, "Http.Get");
    }

    #[test]
    fn test_member_decorators_do_not_leak_to_class() {
        let result = parse("class A { @Listen('boot') onBoot() {} }");
        let class = &result.classes[0];
        assert!(class.annotations.is_empty());
        assert_eq!(class.annotation_count(), 1);
    }

    #[test]
    fn test_parse_tsx() {
        let mut parser = TsParser::new_tsx().expect("Parser creation failed");
        let result = parser
            .parse("@Component('card') export class Card { render() { return <div />; } }")
            .expect("Parse failed");
        assert_eq!(result.classes[0].name, "Card");
        assert_eq!(result.classes[0].methods[0].name, "render");
    }

    #[test]
    fn test_parse_empty_source() {
        let result = parse("");
        assert!(result.classes.is_empty());
    }

    #[test]
    fn test_parser_debug() {
        let parser = TsParser::new().expect("Parser creation failed");
        let debug = format!("{parser:?}");
        assert!(debug.contains("TsParser"));
        assert!(debug.contains("TypeScript"));
    }
}
