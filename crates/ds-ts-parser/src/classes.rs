//! Class, member, and decorator extraction from parsed TypeScript trees.
//!
//! # Declarations Detected
//!
//! - `class Foo { }`, `export class Foo { }`, `export default class Foo { }`
//! - `abstract class Foo { }` and named class expressions
//! - Decorators written before `export` (`@Injectable() export class Foo`)
//!   as well as after it
//! - Field decorators (`@Inject() private repo: Repo;`)
//! - Method and accessor decorators (`@Get('/') index() {}`)
//!
//! Anonymous class expressions have no identity and are not reported.

use ds_core::{Annotation, Annotations, ClassStructure, MemberRecord, SourceLocation};
use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, QueryCursor, Tree};

use crate::arguments::{lift_value, named_children, node_text, property_key};
use crate::queries::ClassQuery;

/// Extracts every named class declaration from a syntax tree.
///
/// Classes are returned in source order.
pub fn extract_classes(tree: &Tree, source: &str, query: &ClassQuery) -> Vec<ClassStructure> {
    let source_bytes = source.as_bytes();
    let root = tree.root_node();

    let mut cursor = QueryCursor::new();
    cursor.set_max_start_depth(None);
    let mut matches = cursor.matches(&query.query, root, source_bytes);

    let mut classes = Vec::new();
    while let Some(match_) = matches.next() {
        let declaration = match_
            .captures
            .iter()
            .find(|c| c.index == query.declaration)
            .map(|c| c.node);
        let name = match_
            .captures
            .iter()
            .find(|c| c.index == query.name)
            .map(|c| node_text(c.node, source_bytes));

        if let (Some(node), Some(name)) = (declaration, name) {
            if !name.is_empty() {
                classes.push(build_class(node, name, source_bytes));
            }
        }
    }

    classes.sort_by_key(|c| c.location);
    classes
}

fn build_class(node: Node<'_>, name: &str, source: &[u8]) -> ClassStructure {
    let mut class = ClassStructure::new(name, location(node));

    // `@Dec export class Foo` hangs the decorator on the export statement.
    if let Some(parent) = node.parent().filter(|p| p.kind() == "export_statement") {
        class.annotations.extend(own_decorators(parent, source));
    }
    class.annotations.extend(own_decorators(node, source));

    if let Some(body) = node.child_by_field_name("body") {
        collect_members(body, source, &mut class);
    }

    class
}

/// Walks a class body, pairing decorators with the member that follows.
fn collect_members(body: Node<'_>, source: &[u8], class: &mut ClassStructure) {
    let mut pending = Annotations::new();

    for child in named_children(body) {
        match child.kind() {
            "decorator" => pending.push(decorator(child, source)),
            "public_field_definition" | "property_signature" => {
                let mut annotations = std::mem::take(&mut pending);
                annotations.extend(own_decorators(child, source));
                if let Some(name) = member_name(child, source) {
                    push_member(&mut class.properties, name, annotations);
                }
            }
            "method_definition" | "method_signature" | "abstract_method_signature" => {
                let mut annotations = std::mem::take(&mut pending);
                annotations.extend(own_decorators(child, source));
                if let Some(name) = member_name(child, source) {
                    // Overload signatures share a name with their body.
                    push_member(&mut class.methods, name, annotations);
                }
            }
            _ => pending.clear(),
        }
    }
}

fn push_member(members: &mut Vec<MemberRecord>, name: String, annotations: Annotations) {
    if let Some(existing) = members.iter_mut().find(|m| m.name == name) {
        existing.annotations.extend(annotations);
        return;
    }
    members.push(MemberRecord { name, annotations });
}

fn member_name(node: Node<'_>, source: &[u8]) -> Option<String> {
    let name = node.child_by_field_name("name")?;
    let key = property_key(name, source);
    (!key.is_empty()).then_some(key)
}

/// Decorators that are direct children of `node`.
fn own_decorators(node: Node<'_>, source: &[u8]) -> Annotations {
    named_children(node)
        .filter(|child| child.kind() == "decorator")
        .map(|child| decorator(child, source))
        .collect()
}

/// Reads `@Name`, `@Ns.Name`, `@Name(args)`, or `@Ns.Name<T>(args)`.
fn decorator(node: Node<'_>, source: &[u8]) -> Annotation {
    let loc = location(node);
    let Some(expr) = named_children(node).next() else {
        return Annotation::new(String::new(), Vec::new(), loc);
    };

    if expr.kind() == "call_expression" {
        let name = expr
            .child_by_field_name("function")
            .map(|f| node_text(f, source))
            .unwrap_or_default();
        let arguments = expr
            .child_by_field_name("arguments")
            .map(|args| {
                named_children(args)
                    .map(|arg| lift_value(arg, source))
                    .collect()
            })
            .unwrap_or_default();
        return Annotation::new(name, arguments, loc);
    }

    Annotation::new(node_text(expr, source), Vec::new(), loc)
}

#[allow(clippy::cast_possible_truncation)]
fn location(node: Node<'_>) -> SourceLocation {
    let start = node.start_position();
    SourceLocation::new(start.row as u32 + 1, start.column as u32)
}
