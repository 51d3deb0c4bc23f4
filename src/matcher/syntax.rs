use std::ops::Range;
use std::sync::OnceLock;

use anyhow::{Context, Result, anyhow};
use tree_sitter::{Language, Node, Parser, Query, QueryCursor, StreamingIterator};

use super::{Occurrence, is_relative};

/// `source` is only present on statements that name a module:
/// `import x from "m"`, `import "m"`, `export * from "m"`, `export { x } from "m"`.
const MODULE_SOURCE_QUERY: &str = r#"
    (import_statement source: (string) @source) @statement
    (export_statement source: (string) @source) @statement
"#;

static MODULE_SOURCE_QUERY_CACHE: OnceLock<Query> = OnceLock::new();

fn module_source_query(language: &Language) -> &'static Query {
    MODULE_SOURCE_QUERY_CACHE.get_or_init(|| {
        Query::new(language, MODULE_SOURCE_QUERY).expect("invalid module source query")
    })
}

/// Parse `source` as JavaScript and collect the relative module specifiers of
/// its import/export statements.
pub fn scan(source: &str) -> Result<Vec<Occurrence<'_>>> {
    let language: Language = tree_sitter_javascript::LANGUAGE.into();
    let mut parser = Parser::new();
    parser
        .set_language(&language)
        .context("failed to set tree-sitter language for JavaScript")?;
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| anyhow!("tree-sitter returned None"))?;

    let query = module_source_query(&language);
    let statement_idx = query
        .capture_index_for_name("statement")
        .expect("module source query must have @statement");
    let source_idx = query
        .capture_index_for_name("source")
        .expect("module source query must have @source");

    let mut occurrences = Vec::new();
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, tree.root_node(), source.as_bytes());

    while let Some(m) = matches.next() {
        let mut statement: Option<Node> = None;
        let mut string: Option<Node> = None;

        for capture in m.captures {
            if capture.index == statement_idx {
                statement = Some(capture.node);
            } else if capture.index == source_idx {
                string = Some(capture.node);
            }
        }

        let (Some(statement), Some(string)) = (statement, string) else {
            continue;
        };
        let Some(span) = string_contents(string) else {
            continue;
        };

        let specifier = &source[span.clone()];
        if !is_relative(specifier) {
            continue;
        }

        occurrences.push(Occurrence {
            statement: &source[statement.byte_range()],
            specifier,
            span,
        });
    }

    Ok(occurrences)
}

/// Byte range between the quotes of a string literal node. Literals the
/// parser had to repair (unterminated, missing quote) are skipped.
fn string_contents(string: Node) -> Option<Range<usize>> {
    if string.has_error() || string.is_missing() {
        return None;
    }
    let range = string.byte_range();
    (range.len() >= 2).then(|| range.start + 1..range.end - 1)
}
