use super::{FileInput, ParseResult, ParsedSymbol, Parser, RawReference};
use crate::error::ParseOutcome;
use crate::model::{EdgeKind, SymbolKind};
use regex::Regex;
use std::sync::OnceLock;

fn class_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)\bclass\s+(\w+)").unwrap())
}

fn string_literal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""([^"]*)""#).unwrap())
}

fn inline_select_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)^\s*SELECT\s+(.*?)\s+FROM\s+(\w+)").unwrap())
}

/// Minimal C#/Java-family parser: class declarations, plus a scan of
/// embedded string literals for inline SQL — the source of the
/// app-code-to-SQL cross-language bridge.
/// Every reference it emits is left cross-file / cross-language
/// unqualified (`to_qualified = None`); Pass 4 of the resolver does the
/// actual bridging.
pub struct CSharpParser;

impl Parser for CSharpParser {
    fn parse(&self, input: &FileInput) -> ParseOutcome<ParseResult> {
        let mut result = ParseResult::default();

        let Some(class_caps) = class_re().captures(input.content) else {
            return Ok(result);
        };
        let class_name = class_caps[1].to_string();
        result.symbols.push(ParsedSymbol::new(class_name.clone(), class_name.clone(), SymbolKind::Class, "csharp"));

        for literal in string_literal_re().captures_iter(input.content) {
            let text = &literal[1];
            let Some(select_caps) = inline_select_re().captures(text) else { continue };
            let table_name = select_caps[2].to_string();

            result.references.push(RawReference {
                from_symbol_qname: Some(class_name.clone()),
                to_name: table_name.clone(),
                to_qualified: None,
                reference_type: EdgeKind::UsesTable,
                line: 1,
                confidence: None,
            });

            let select_list = select_caps[1].trim();
            if select_list != "*" {
                for column in select_list.split(',') {
                    let name = column.trim();
                    if name.is_empty() {
                        continue;
                    }
                    result.references.push(RawReference {
                        from_symbol_qname: Some(class_name.clone()),
                        to_name: name.to_string(),
                        to_qualified: None,
                        reference_type: EdgeKind::UsesColumn,
                        line: 1,
                        confidence: None,
                    });
                }
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_class_and_inline_sql_table_reference() {
        let input = FileInput {
            path: "Repo.cs",
            content: r#"class Repo { var data = conn.Query<User>("SELECT Id, Email FROM Users"); }"#,
            language: "csharp",
            skip_column_lineage: false,
        };
        let result = CSharpParser.parse(&input).unwrap();
        assert_eq!(result.symbols[0].name, "Repo");

        let table_refs: Vec<_> = result.references.iter().filter(|r| r.reference_type == EdgeKind::UsesTable).collect();
        assert_eq!(table_refs.len(), 1);
        assert_eq!(table_refs[0].to_name, "Users");

        let column_refs = result.references.iter().filter(|r| r.reference_type == EdgeKind::UsesColumn).count();
        assert_eq!(column_refs, 2);
    }

    #[test]
    fn files_without_a_class_produce_no_symbols() {
        let input = FileInput { path: "util.cs", content: "namespace Foo {}", language: "csharp", skip_column_lineage: false };
        let result = CSharpParser.parse(&input).unwrap();
        assert!(result.symbols.is_empty());
    }
}
