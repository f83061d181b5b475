//! TypeScript class and decorator extraction using tree-sitter.
//!
//! Rust has no runtime reflection over TypeScript sources, so this crate
//! builds the structural index statically: every named class, its
//! decorators, and the decorators on its fields and methods.
//!
//! # Overview
//!
//! ```
//! use ds_ts_parser::TsParser;
//! use serde_json::json;
//!
//! let mut parser = TsParser::new()?;
//! let source = r#"
//!     @Controller('/users')
//!     export class UserController {
//!         @Inject() private users: UserService;
//!
//!         @Get('/:id', { cache: 60 })
//!         show() {}
//!     }
//! "#;
//!
//! let result = parser.parse(source)?;
//! let class = &result.classes[0];
//!
//! assert_eq!(class.name, "UserController");
//! assert_eq!(class.annotations[0].arguments, vec![json!("/users")]);
//! assert_eq!(class.properties[0].annotations[0].name, "Inject");
//! assert_eq!(class.methods[0].annotations[0].arguments[1], json!({"cache": 60}));
//! # Ok::<(), ds_ts_parser::ParseError>(())
//! ```
//!
//! # Decorator Arguments
//!
//! | Source | Lifted value |
//! |--------|--------------|
//! | `'a'`, `` `a` `` | `"a"` |
//! | `1`, `-2.5` | numbers |
//! | `true`, `null`, `undefined` | booleans / `null` |
//! | `[..]`, `{..}` | arrays / objects (recursively) |
//! | anything else | its source text |
//!
//! # Thread Safety
//!
//! [`TsParser`] is `Send` but not `Sync`; create one per thread. The
//! compiled queries are shared globally.

#![deny(clippy::all)]
#![warn(missing_docs)]

mod arguments;
mod classes;
pub mod error;
mod parser;
pub mod queries;

pub use classes::extract_classes;
pub use error::ParseError;
pub use parser::{ParseResult, ParserKind, TsParser};
