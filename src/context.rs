//! Context Builder
//!
//! Renders the retrieved schema subset as simplified DDL for the drafting
//! prompt. Tables stay in retrieval order so the most relevant come first.

use crate::catalog::Table;

/// Simplified DDL for one table: columns with types and tags, then key
/// declarations.
pub fn format_table_ddl(table: &Table) -> String {
    let mut lines = Vec::new();
    if !table.description.is_empty() {
        lines.push(format!("-- {}", table.description));
    }
    lines.push(format!("TABLE {} (", table.name));
    let mut body = Vec::new();
    for column in &table.columns {
        let mut line = format!("    {} {}", column.name, column.data_type.as_sql());
        if table
            .primary_key
            .iter()
            .any(|pk| pk.eq_ignore_ascii_case(&column.name))
        {
            line.push_str(" PRIMARY KEY");
        }
        if column.tests.iter().any(|t| t == "not_null") {
            line.push_str(" NOT NULL");
        }
        if !column.description.is_empty() {
            line.push_str(&format!(" -- {}", column.description));
        }
        body.push(line);
    }
    for fk in &table.foreign_keys {
        body.push(format!(
            "    FOREIGN KEY ({}) REFERENCES {}({})",
            fk.columns.join(", "),
            fk.ref_table,
            fk.ref_columns.join(", ")
        ));
    }
    lines.push(body.join(",\n"));
    lines.push(");".to_string());
    lines.join("\n")
}

/// Assemble the drafting context from the subset tables.
pub fn build_context(tables: &[Table]) -> String {
    let ddls: Vec<String> = tables.iter().map(format_table_ddl).collect();
    format!("Relevant Database Schema:\n\n{}", ddls.join("\n\n"))
}
