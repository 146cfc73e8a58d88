use super::{FileInput, ParseResult, ParsedColumnReference, ParsedSymbol, Parser, RawReference};
use crate::error::ParseOutcome;
use crate::model::{ColumnDerivation, EdgeKind, SymbolKind};
use regex::Regex;
use std::sync::OnceLock;

fn create_table_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Greedy to the last ')' in the statement so column defs with their own
    // parens (e.g. `nvarchar(255)`) don't truncate the capture early.
    RE.get_or_init(|| Regex::new(r"(?is)CREATE\s+TABLE\s+([\w\.\[\]]+)\s*\((.*)\)\s*;?\s*$").unwrap())
}

fn create_proc_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)CREATE\s+PROC(?:EDURE)?\s+([\w\.\[\]]+)\s*(.*?)\s+AS\b(.*)$").unwrap()
    })
}

fn select_from_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)SELECT\s+(.*?)\s+FROM\s+([\w\.\[\]]+)").unwrap())
}

fn where_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)WHERE\s+(.*?)\s*;?\s*$").unwrap())
}

fn insert_select_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)INSERT\s+INTO\s+([\w\.\[\]]+)\s*\(([^)]*)\)\s*SELECT\s+(.*?)\s+FROM\s+([\w\.\[\]]+)").unwrap()
    })
}

fn predicate_column_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\s*\[?@?(\w+)\]?\s*(=|<>|!=|>=|<=|>|<|like)").unwrap())
}

fn conjunction_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\band\b|\bor\b").unwrap())
}

/// T-SQL-flavored parser: `CREATE TABLE`, `CREATE PROCEDURE ... AS SELECT`,
/// and `INSERT INTO ... SELECT ... FROM` column lineage. Dialect sniffing
/// beyond this single grammar is left as a registry-level concern
///.
pub struct SqlParser;

fn strip_brackets(raw: &str) -> String {
    raw.trim().trim_matches(['[', ']']).to_string()
}

fn split_top_level_commas(s: &str) -> Vec<String> {
    let mut depth = 0i32;
    let mut current = String::new();
    let mut parts = Vec::new();
    for c in s.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth -= 1;
                current.push(c);
            }
            ',' if depth == 0 => {
                parts.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

fn column_name(column_def: &str) -> Option<String> {
    column_def.split_whitespace().next().map(strip_brackets).filter(|s| !s.is_empty())
}

fn predicate_columns(where_clause: &str) -> Vec<String> {
    conjunction_re()
        .split(where_clause)
        .filter_map(|predicate| predicate_column_re().captures(predicate.trim()))
        .map(|caps| caps[1].to_string())
        .collect()
}

impl Parser for SqlParser {
    fn parse(&self, input: &FileInput) -> ParseOutcome<ParseResult> {
        let mut result = ParseResult::default();

        if let Some(caps) = create_table_re().captures(input.content) {
            let table_name = strip_brackets(&caps[1]);
            let mut table_symbol = ParsedSymbol::new(table_name.clone(), table_name.clone(), SymbolKind::Table, "sql");
            for column_def in split_top_level_commas(&caps[2]) {
                let Some(name) = column_name(&column_def) else { continue };
                let qname = format!("{table_name}.{name}");
                table_symbol.children.push(ParsedSymbol::new(name, qname, SymbolKind::Column, "sql"));
            }
            result.symbols.push(table_symbol);
        }

        if let Some(caps) = create_proc_re().captures(input.content) {
            let proc_name = strip_brackets(&caps[1]);
            let body = caps[3].to_string();
            let proc_symbol = ParsedSymbol::new(proc_name.clone(), proc_name.clone(), SymbolKind::Procedure, "sql");
            result.symbols.push(proc_symbol);

            if let Some(select_caps) = select_from_re().captures(&body) {
                let select_list = select_caps[1].to_string();
                let table_name = strip_brackets(&select_caps[2]);

                result.references.push(RawReference {
                    from_symbol_qname: Some(proc_name.clone()),
                    to_name: table_name.clone(),
                    to_qualified: Some(table_name.clone()),
                    reference_type: EdgeKind::UsesTable,
                    line: 1,
                    confidence: None,
                });
                result.references.push(RawReference {
                    from_symbol_qname: Some(proc_name.clone()),
                    to_name: table_name.clone(),
                    to_qualified: Some(table_name.clone()),
                    reference_type: EdgeKind::ReadsFrom,
                    line: 1,
                    confidence: None,
                });

                if select_list.trim() != "*" {
                    for column in split_top_level_commas(&select_list) {
                        let Some(name) = column_name(&column) else { continue };
                        result.references.push(RawReference {
                            from_symbol_qname: Some(proc_name.clone()),
                            to_name: name.clone(),
                            to_qualified: Some(format!("{table_name}.{name}")),
                            reference_type: EdgeKind::UsesColumn,
                            line: 1,
                            confidence: None,
                        });
                    }
                }

                if let Some(where_caps) = where_re().captures(&body) {
                    for name in predicate_columns(&where_caps[1]) {
                        result.references.push(RawReference {
                            from_symbol_qname: Some(proc_name.clone()),
                            to_name: name.clone(),
                            to_qualified: Some(format!("{table_name}.{name}")),
                            reference_type: EdgeKind::UsesColumn,
                            line: 1,
                            confidence: None,
                        });
                    }
                }
            }
        }

        if !input.skip_column_lineage {
            if let Some(caps) = insert_select_re().captures(input.content) {
                let target_table = strip_brackets(&caps[1]);
                let target_columns = split_top_level_commas(&caps[2]);
                let source_table = strip_brackets(&caps[4]);
                let source_columns = split_top_level_commas(&caps[3]);

                for (target, source) in target_columns.iter().zip(source_columns.iter()) {
                    let Some(target_name) = column_name(target) else { continue };
                    let Some(source_name) = column_name(source) else { continue };
                    result.column_references.push(ParsedColumnReference {
                        source_column_fqn: format!("{source_table}.{source_name}"),
                        target_column_fqn: format!("{target_table}.{target_name}"),
                        derivation: ColumnDerivation::DirectCopy,
                        expression: None,
                        context_fqn: None,
                        line: None,
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
    fn create_table_extracts_columns() {
        let input = FileInput {
            path: "create_users.sql",
            content: "CREATE TABLE Users(Id int, Email nvarchar(255))",
            language: "sql",
            skip_column_lineage: false,
        };
        let result = SqlParser.parse(&input).unwrap();
        assert_eq!(result.symbols.len(), 1);
        assert_eq!(result.symbols[0].name, "Users");
        assert_eq!(result.symbols[0].children.len(), 2);
        assert_eq!(result.symbols[0].children[0].name, "Id");
        assert_eq!(result.symbols[0].children[1].name, "Email");
    }

    #[test]
    fn create_procedure_produces_table_and_column_edges() {
        let input = FileInput {
            path: "get_user.sql",
            content: "CREATE PROCEDURE GetUser @id int AS SELECT Id, Email FROM Users WHERE Id=@id",
            language: "sql",
            skip_column_lineage: false,
        };
        let result = SqlParser.parse(&input).unwrap();
        assert_eq!(result.symbols.len(), 1);
        assert_eq!(result.symbols[0].kind, SymbolKind::Procedure);

        let uses_table = result.references.iter().filter(|r| r.reference_type == EdgeKind::UsesTable).count();
        let reads_from = result.references.iter().filter(|r| r.reference_type == EdgeKind::ReadsFrom).count();
        let uses_column = result.references.iter().filter(|r| r.reference_type == EdgeKind::UsesColumn).count();
        assert_eq!(uses_table, 1);
        assert_eq!(reads_from, 1);
        assert_eq!(uses_column, 2);
    }

    #[test]
    fn where_clause_adds_filter_column_reference() {
        let input = FileInput {
            path: "get_user.sql",
            content: "CREATE PROCEDURE GetUser @id int AS SELECT Id, Email FROM Users WHERE Id=@id AND Active=1",
            language: "sql",
            skip_column_lineage: false,
        };
        let result = SqlParser.parse(&input).unwrap();
        let active_refs: Vec<_> =
            result.references.iter().filter(|r| r.to_name == "Active" && r.reference_type == EdgeKind::UsesColumn).collect();
        assert_eq!(active_refs.len(), 1);
    }

    #[test]
    fn skip_column_lineage_suppresses_column_references() {
        let input = FileInput {
            path: "migrate.sql",
            content: "INSERT INTO Reports(Total) SELECT Total FROM Orders",
            language: "sql",
            skip_column_lineage: true,
        };
        let result = SqlParser.parse(&input).unwrap();
        assert!(result.column_references.is_empty());
    }

    #[test]
    fn insert_select_produces_direct_copy_column_reference() {
        let input = FileInput {
            path: "report.sql",
            content: "INSERT INTO Reports(Total) SELECT Total FROM Orders",
            language: "sql",
            skip_column_lineage: false,
        };
        let result = SqlParser.parse(&input).unwrap();
        assert_eq!(result.column_references.len(), 1);
        assert_eq!(result.column_references[0].source_column_fqn, "Orders.Total");
        assert_eq!(result.column_references[0].target_column_fqn, "Reports.Total");
        assert_eq!(result.column_references[0].derivation, ColumnDerivation::DirectCopy);
    }
}
