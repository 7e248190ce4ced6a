//! SQL Validator
//!
//! Static checks of a candidate SQL string against the schema catalog:
//! syntax, table/column existence, declared-key join endorsement and
//! GROUP BY consistency. Checks resolve against the full catalog, not just
//! the retrieved subset, since a draft may legitimately join a table one hop
//! outside what the retriever returned.

use crate::catalog::SchemaCatalog;
use serde::Serialize;
use sqlparser::ast::{
    Expr, FunctionArg, FunctionArgExpr, GroupByExpr, Join, JoinConstraint, JoinOperator,
    OrderByExpr, Query, Select, SelectItem, SetExpr, Statement, TableFactor, TableWithJoins,
};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FindingCategory {
    UnknownTable,
    UnknownColumn,
    InvalidJoin,
    AggregationMismatch,
    Syntax,
}

impl FindingCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingCategory::UnknownTable => "unknown-table",
            FindingCategory::UnknownColumn => "unknown-column",
            FindingCategory::InvalidJoin => "invalid-join",
            FindingCategory::AggregationMismatch => "aggregation-mismatch",
            FindingCategory::Syntax => "syntax",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationFinding {
    pub severity: Severity,
    pub category: FindingCategory,
    pub message: String,
    /// Rough clause-level hint, e.g. "FROM clause" or "join condition".
    pub location: Option<String>,
}

impl ValidationFinding {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// A result is invalid iff it contains any error-severity finding.
pub fn has_errors(findings: &[ValidationFinding]) -> bool {
    findings.iter().any(|f| f.is_error())
}

/// A table reference in scope. `None` marks a virtual relation (CTE or
/// derived subquery) whose columns cannot be checked statically.
type Scope = HashMap<String, Option<String>>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ColRef {
    qualifier: Option<String>,
    column: String,
}

pub struct SqlValidator {
    catalog: Arc<SchemaCatalog>,
}

impl SqlValidator {
    pub fn new(catalog: Arc<SchemaCatalog>) -> Self {
        Self { catalog }
    }

    /// Empty result ⇔ valid. Unparseable input short-circuits with a single
    /// syntax finding; all other checks run to completion and accumulate.
    pub fn validate(&self, sql: &str) -> Vec<ValidationFinding> {
        let statements = match Parser::parse_sql(&GenericDialect {}, sql) {
            Ok(statements) => statements,
            Err(e) => {
                return vec![ValidationFinding {
                    severity: Severity::Error,
                    category: FindingCategory::Syntax,
                    message: format!("SQL does not parse: {}", e),
                    location: None,
                }];
            }
        };

        let mut findings = Vec::new();
        let mut ctes: HashSet<String> = HashSet::new();
        for statement in &statements {
            if let Statement::Query(query) = statement {
                self.check_query(query, &mut ctes, &mut findings);
            }
        }
        findings
    }

    fn check_query(
        &self,
        query: &Query,
        ctes: &mut HashSet<String>,
        findings: &mut Vec<ValidationFinding>,
    ) {
        if let Some(with) = &query.with {
            for cte in &with.cte_tables {
                self.check_query(&cte.query, ctes, findings);
                ctes.insert(cte.alias.name.value.to_lowercase());
            }
        }
        self.check_set_expr(&query.body, &query.order_by, ctes, findings);
    }

    fn check_set_expr(
        &self,
        body: &SetExpr,
        order_by: &[OrderByExpr],
        ctes: &mut HashSet<String>,
        findings: &mut Vec<ValidationFinding>,
    ) {
        match body {
            SetExpr::Select(select) => self.check_select(select, order_by, ctes, findings),
            SetExpr::Query(query) => self.check_query(query, ctes, findings),
            SetExpr::SetOperation { left, right, .. } => {
                self.check_set_expr(left, &[], ctes, findings);
                self.check_set_expr(right, &[], ctes, findings);
            }
            _ => {}
        }
    }

    fn check_select(
        &self,
        select: &Select,
        order_by: &[OrderByExpr],
        ctes: &mut HashSet<String>,
        findings: &mut Vec<ValidationFinding>,
    ) {
        let mut scope: Scope = HashMap::new();
        let mut unknown_tables: HashSet<String> = HashSet::new();

        for table_with_joins in &select.from {
            self.register_relation(&table_with_joins.relation, ctes, &mut scope, &mut unknown_tables, findings);
            for join in &table_with_joins.joins {
                self.register_relation(&join.relation, ctes, &mut scope, &mut unknown_tables, findings);
            }
        }

        for table_with_joins in &select.from {
            self.check_joins(table_with_joins, &scope, findings);
        }

        // Aliases defined by the projection are legal in ORDER BY and
        // GROUP BY references.
        let projection_aliases: HashSet<String> = select
            .projection
            .iter()
            .filter_map(|item| match item {
                SelectItem::ExprWithAlias { alias, .. } => Some(alias.value.to_lowercase()),
                _ => None,
            })
            .collect();

        let mut refs: Vec<ColRef> = Vec::new();
        for item in &select.projection {
            match item {
                SelectItem::UnnamedExpr(expr) | SelectItem::ExprWithAlias { expr, .. } => {
                    collect_col_refs(expr, &mut refs)
                }
                _ => {}
            }
        }
        if let Some(selection) = &select.selection {
            collect_col_refs(selection, &mut refs);
        }
        if let GroupByExpr::Expressions(exprs) = &select.group_by {
            for expr in exprs {
                collect_col_refs(expr, &mut refs);
            }
        }
        if let Some(having) = &select.having {
            collect_col_refs(having, &mut refs);
        }
        for table_with_joins in &select.from {
            for join in &table_with_joins.joins {
                if let Some(on) = join_on_expr(join) {
                    collect_col_refs(on, &mut refs);
                }
            }
        }
        for order in order_by {
            collect_col_refs(&order.expr, &mut refs);
        }

        let mut reported: HashSet<ColRef> = HashSet::new();
        for col_ref in &refs {
            if reported.contains(col_ref) {
                continue;
            }
            if let Some(finding) =
                self.resolve_column(col_ref, &scope, &unknown_tables, &projection_aliases)
            {
                findings.push(finding);
                reported.insert(col_ref.clone());
            }
        }

        self.check_group_by(select, findings);

        // Derived subqueries were validated at registration; nested scalar
        // subqueries in expressions get their own pass.
        let mut subqueries: Vec<&Query> = Vec::new();
        for item in &select.projection {
            if let SelectItem::UnnamedExpr(expr) | SelectItem::ExprWithAlias { expr, .. } = item {
                collect_subqueries(expr, &mut subqueries);
            }
        }
        if let Some(selection) = &select.selection {
            collect_subqueries(selection, &mut subqueries);
        }
        if let Some(having) = &select.having {
            collect_subqueries(having, &mut subqueries);
        }
        for subquery in subqueries {
            self.check_query(subquery, ctes, findings);
        }
    }

    fn register_relation(
        &self,
        relation: &TableFactor,
        ctes: &mut HashSet<String>,
        scope: &mut Scope,
        unknown_tables: &mut HashSet<String>,
        findings: &mut Vec<ValidationFinding>,
    ) {
        match relation {
            TableFactor::Table { name, alias, .. } => {
                let full_name = name
                    .0
                    .iter()
                    .map(|ident| ident.value.as_str())
                    .collect::<Vec<_>>()
                    .join(".");
                let bare_name = name.0.last().map(|i| i.value.clone()).unwrap_or_default();
                let key = alias
                    .as_ref()
                    .map(|a| a.name.value.to_lowercase())
                    .unwrap_or_else(|| bare_name.to_lowercase());

                if ctes.contains(&bare_name.to_lowercase()) {
                    scope.insert(key, None);
                    return;
                }
                let resolved = self
                    .catalog
                    .table(&full_name)
                    .or_else(|_| self.catalog.table(&bare_name));
                match resolved {
                    Ok(table) => {
                        scope.insert(key, Some(table.name.clone()));
                    }
                    Err(_) => {
                        // One finding per distinct unknown table, no cascade
                        // into its column references.
                        if unknown_tables.insert(full_name.to_lowercase()) {
                            findings.push(ValidationFinding {
                                severity: Severity::Error,
                                category: FindingCategory::UnknownTable,
                                message: format!("Table '{}' not found in catalog", full_name),
                                location: Some("FROM clause".to_string()),
                            });
                        }
                        scope.insert(key, None);
                    }
                }
            }
            TableFactor::Derived { subquery, alias, .. } => {
                self.check_query(subquery, ctes, findings);
                if let Some(alias) = alias {
                    scope.insert(alias.name.value.to_lowercase(), None);
                }
            }
            _ => {}
        }
    }

    fn check_joins(
        &self,
        table_with_joins: &TableWithJoins,
        scope: &Scope,
        findings: &mut Vec<ValidationFinding>,
    ) {
        for join in &table_with_joins.joins {
            if let Some(on) = join_on_expr(join) {
                self.check_join_condition(on, scope, findings);
            }
        }
    }

    /// Every equality of two column refs in a join condition must match a
    /// declared foreign-key pair. A miss is a warning: ad hoc joins are legal
    /// SQL, merely unendorsed by the schema.
    fn check_join_condition(&self, expr: &Expr, scope: &Scope, findings: &mut Vec<ValidationFinding>) {
        match expr {
            Expr::BinaryOp { left, op, right } => {
                use sqlparser::ast::BinaryOperator;
                match op {
                    BinaryOperator::And | BinaryOperator::Or => {
                        self.check_join_condition(left, scope, findings);
                        self.check_join_condition(right, scope, findings);
                    }
                    BinaryOperator::Eq => {
                        let (Some(lhs), Some(rhs)) = (as_col_ref(left), as_col_ref(right)) else {
                            return;
                        };
                        let (Some(lt), Some(rt)) = (
                            self.real_table(&lhs, scope),
                            self.real_table(&rhs, scope),
                        ) else {
                            return;
                        };
                        // Only judge pairs whose columns both resolve; the
                        // existence pass reports the rest.
                        if self.catalog.column(&lt, &lhs.column).is_none()
                            || self.catalog.column(&rt, &rhs.column).is_none()
                        {
                            return;
                        }
                        if !self.catalog.is_declared_join(&lt, &lhs.column, &rt, &rhs.column) {
                            findings.push(ValidationFinding {
                                severity: Severity::Warning,
                                category: FindingCategory::InvalidJoin,
                                message: format!(
                                    "Join {}.{} = {}.{} does not match any declared foreign key",
                                    lt, lhs.column, rt, rhs.column
                                ),
                                location: Some("join condition".to_string()),
                            });
                        }
                    }
                    _ => {}
                }
            }
            Expr::Nested(inner) => self.check_join_condition(inner, scope, findings),
            _ => {}
        }
    }

    /// Resolve a column ref against the scope; `None` means no finding.
    fn resolve_column(
        &self,
        col_ref: &ColRef,
        scope: &Scope,
        unknown_tables: &HashSet<String>,
        projection_aliases: &HashSet<String>,
    ) -> Option<ValidationFinding> {
        match &col_ref.qualifier {
            Some(qualifier) => {
                let key = qualifier.to_lowercase();
                match scope.get(&key) {
                    Some(Some(table)) => {
                        if self.catalog.column(table, &col_ref.column).is_some() {
                            None
                        } else {
                            Some(unknown_column(format!(
                                "Column '{}' not found in table '{}'",
                                col_ref.column, table
                            )))
                        }
                    }
                    // Virtual relation: columns not statically checkable.
                    Some(None) => None,
                    None => {
                        if unknown_tables.contains(&key) {
                            return None;
                        }
                        Some(unknown_column(format!(
                            "Qualifier '{}' does not match any table in the query",
                            qualifier
                        )))
                    }
                }
            }
            None => {
                if projection_aliases.contains(&col_ref.column.to_lowercase()) {
                    return None;
                }
                let mut has_virtual = false;
                for entry in scope.values() {
                    match entry {
                        Some(table) => {
                            if self.catalog.column(table, &col_ref.column).is_some() {
                                return None;
                            }
                        }
                        None => has_virtual = true,
                    }
                }
                if has_virtual {
                    // Could come from a CTE or subquery; give the draft the
                    // benefit of the doubt.
                    return None;
                }
                Some(unknown_column(format!(
                    "Column '{}' not found in any referenced table",
                    col_ref.column
                )))
            }
        }
    }

    fn real_table(&self, col_ref: &ColRef, scope: &Scope) -> Option<String> {
        match &col_ref.qualifier {
            Some(qualifier) => scope.get(&qualifier.to_lowercase())?.clone(),
            None => {
                let mut matches = scope
                    .values()
                    .flatten()
                    .filter(|t| self.catalog.column(t, &col_ref.column).is_some());
                let first = matches.next()?.clone();
                // Ambiguous bare columns are not judged.
                if matches.next().is_some() {
                    None
                } else {
                    Some(first)
                }
            }
        }
    }

    /// Columns outside aggregates in a grouped statement must appear in the
    /// GROUP BY list.
    fn check_group_by(&self, select: &Select, findings: &mut Vec<ValidationFinding>) {
        let GroupByExpr::Expressions(group_exprs) = &select.group_by else {
            return;
        };
        if group_exprs.is_empty() {
            return;
        }
        let mut grouped: HashSet<String> = HashSet::new();
        for expr in group_exprs {
            grouped.insert(expr.to_string().to_lowercase());
            let mut refs = Vec::new();
            collect_col_refs(expr, &mut refs);
            for r in refs {
                grouped.insert(r.column.to_lowercase());
            }
        }

        let mut reported: HashSet<String> = HashSet::new();
        for item in &select.projection {
            let expr = match item {
                SelectItem::UnnamedExpr(expr) | SelectItem::ExprWithAlias { expr, .. } => expr,
                _ => continue,
            };
            if grouped.contains(&expr.to_string().to_lowercase()) {
                continue;
            }
            let mut bare = Vec::new();
            collect_unaggregated_refs(expr, &mut bare);
            for col_ref in bare {
                let name = col_ref.column.to_lowercase();
                let qualified = match &col_ref.qualifier {
                    Some(q) => format!("{}.{}", q.to_lowercase(), name),
                    None => name.clone(),
                };
                if grouped.contains(&name) || grouped.contains(&qualified) {
                    continue;
                }
                if reported.insert(qualified) {
                    findings.push(ValidationFinding {
                        severity: Severity::Error,
                        category: FindingCategory::AggregationMismatch,
                        message: format!(
                            "Column '{}' appears outside an aggregate but not in GROUP BY",
                            col_ref.column
                        ),
                        location: Some("SELECT list".to_string()),
                    });
                }
            }
        }
    }
}

fn unknown_column(message: String) -> ValidationFinding {
    ValidationFinding {
        severity: Severity::Error,
        category: FindingCategory::UnknownColumn,
        message,
        location: None,
    }
}

fn join_on_expr(join: &Join) -> Option<&Expr> {
    let constraint = match &join.join_operator {
        JoinOperator::Inner(c)
        | JoinOperator::LeftOuter(c)
        | JoinOperator::RightOuter(c)
        | JoinOperator::FullOuter(c) => c,
        _ => return None,
    };
    match constraint {
        JoinConstraint::On(expr) => Some(expr),
        _ => None,
    }
}

fn as_col_ref(expr: &Expr) -> Option<ColRef> {
    match expr {
        Expr::Identifier(ident) => Some(ColRef {
            qualifier: None,
            column: ident.value.clone(),
        }),
        Expr::CompoundIdentifier(parts) if parts.len() >= 2 => Some(ColRef {
            qualifier: Some(parts[parts.len() - 2].value.clone()),
            column: parts[parts.len() - 1].value.clone(),
        }),
        Expr::Nested(inner) => as_col_ref(inner),
        _ => None,
    }
}

const AGGREGATE_FUNCTIONS: &[&str] = &[
    "count",
    "sum",
    "avg",
    "min",
    "max",
    "stddev",
    "stddev_pop",
    "stddev_samp",
    "variance",
    "var_pop",
    "var_samp",
    "array_agg",
    "string_agg",
    "listagg",
    "approx_count_distinct",
    "median",
    "percentile_cont",
];

fn is_aggregate_name(name: &str) -> bool {
    AGGREGATE_FUNCTIONS.contains(&name.to_lowercase().as_str())
}

/// All column references in an expression, aggregates included.
fn collect_col_refs(expr: &Expr, out: &mut Vec<ColRef>) {
    if let Some(col_ref) = as_col_ref(expr) {
        out.push(col_ref);
        return;
    }
    walk_children(expr, &mut |child| collect_col_refs(child, out));
}

/// Column references not shielded by an aggregate function call.
fn collect_unaggregated_refs(expr: &Expr, out: &mut Vec<ColRef>) {
    if let Expr::Function(function) = expr {
        let name = function
            .name
            .0
            .last()
            .map(|i| i.value.as_str())
            .unwrap_or_default();
        if is_aggregate_name(name) {
            return;
        }
    }
    if let Some(col_ref) = as_col_ref(expr) {
        out.push(col_ref);
        return;
    }
    walk_children(expr, &mut |child| collect_unaggregated_refs(child, out));
}

fn collect_subqueries<'a>(expr: &'a Expr, out: &mut Vec<&'a Query>) {
    match expr {
        Expr::Subquery(query) | Expr::Exists { subquery: query, .. } => out.push(query),
        Expr::InSubquery { expr, subquery, .. } => {
            collect_subqueries(expr, out);
            out.push(subquery);
        }
        _ => walk_children(expr, &mut |child| collect_subqueries(child, out)),
    }
}

/// Visit direct sub-expressions of the variants that show up in analytical
/// SELECT statements. Unlisted variants carry no column references we check.
fn walk_children<'a>(expr: &'a Expr, visit: &mut dyn FnMut(&'a Expr)) {
    match expr {
        Expr::BinaryOp { left, right, .. } => {
            visit(left);
            visit(right);
        }
        Expr::UnaryOp { expr, .. }
        | Expr::Nested(expr)
        | Expr::IsNull(expr)
        | Expr::IsNotNull(expr)
        | Expr::IsTrue(expr)
        | Expr::IsFalse(expr)
        | Expr::IsNotTrue(expr)
        | Expr::IsNotFalse(expr) => visit(expr),
        Expr::Cast { expr, .. } => visit(expr),
        Expr::Extract { expr, .. } => visit(expr),
        Expr::Floor { expr, .. } | Expr::Ceil { expr, .. } => visit(expr),
        Expr::Between {
            expr, low, high, ..
        } => {
            visit(expr);
            visit(low);
            visit(high);
        }
        Expr::Like { expr, pattern, .. } | Expr::ILike { expr, pattern, .. } => {
            visit(expr);
            visit(pattern);
        }
        Expr::InList { expr, list, .. } => {
            visit(expr);
            for item in list {
                visit(item);
            }
        }
        Expr::InSubquery { expr, .. } => visit(expr),
        Expr::Case {
            operand,
            conditions,
            results,
            else_result,
        } => {
            if let Some(operand) = operand {
                visit(operand);
            }
            for condition in conditions {
                visit(condition);
            }
            for result in results {
                visit(result);
            }
            if let Some(else_result) = else_result {
                visit(else_result);
            }
        }
        Expr::Function(function) => {
            for arg in &function.args {
                let arg_expr = match arg {
                    FunctionArg::Named { arg, .. } => arg,
                    FunctionArg::Unnamed(arg) => arg,
                };
                if let FunctionArgExpr::Expr(inner) = arg_expr {
                    visit(inner);
                }
            }
        }
        Expr::Tuple(items) => {
            for item in items {
                visit(item);
            }
        }
        Expr::Interval(interval) => visit(&interval.value),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SchemaCatalog;

    fn catalog() -> Arc<SchemaCatalog> {
        Arc::new(
            SchemaCatalog::from_json_str(
                r#"{
                    "tables": [
                        {
                            "name": "fact_orders",
                            "primary_key": ["crn_number"],
                            "columns": [
                                {"name": "crn_number", "data_type": "string"},
                                {"name": "order_status", "data_type": "string"},
                                {"name": "city", "data_type": "string"}
                            ]
                        },
                        {
                            "name": "fact_tracking_sessions",
                            "primary_key": ["session_id"],
                            "columns": [
                                {"name": "session_id", "data_type": "string"},
                                {"name": "order_id", "data_type": "string"},
                                {"name": "screen_open_time", "data_type": "timestamp_tz"},
                                {"name": "unique_location_count", "data_type": "number"}
                            ],
                            "foreign_keys": [
                                {"columns": ["order_id"], "ref_table": "fact_orders", "ref_columns": ["crn_number"]}
                            ]
                        }
                    ]
                }"#,
            )
            .unwrap(),
        )
    }

    fn validator() -> SqlValidator {
        SqlValidator::new(catalog())
    }

    #[test]
    fn test_valid_select_has_no_findings() {
        let findings = validator().validate(
            "SELECT order_status, crn_number FROM fact_orders WHERE city = 'Mumbai'",
        );
        assert!(findings.is_empty(), "unexpected findings: {:?}", findings);
    }

    #[test]
    fn test_syntax_error_short_circuits() {
        let findings = validator().validate("SELEC broken FROM FROM");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].category, FindingCategory::Syntax);
        assert!(findings[0].is_error());
    }

    #[test]
    fn test_unknown_table_exactly_one_finding() {
        let findings = validator()
            .validate("SELECT a.x FROM ghost_table a JOIN fact_orders o ON a.x = o.crn_number");
        let unknown: Vec<_> = findings
            .iter()
            .filter(|f| f.category == FindingCategory::UnknownTable)
            .collect();
        assert_eq!(unknown.len(), 1);
        assert!(unknown[0].message.contains("ghost_table"));
        // No false positive for the valid table, and no cascade into a.x.
        assert!(!findings
            .iter()
            .any(|f| f.category == FindingCategory::UnknownColumn));
    }

    #[test]
    fn test_unknown_column_qualified() {
        let findings =
            validator().validate("SELECT o.no_such_col FROM fact_orders o");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].category, FindingCategory::UnknownColumn);
        assert!(findings[0].message.contains("no_such_col"));
    }

    #[test]
    fn test_unknown_column_bare() {
        let findings = validator().validate("SELECT imaginary FROM fact_orders");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].category, FindingCategory::UnknownColumn);
    }

    #[test]
    fn test_declared_fk_join_passes() {
        let findings = validator().validate(
            "SELECT o.order_status FROM fact_tracking_sessions s \
             JOIN fact_orders o ON s.order_id = o.crn_number",
        );
        assert!(findings.is_empty(), "unexpected findings: {:?}", findings);
    }

    #[test]
    fn test_undeclared_join_is_warning_not_error() {
        let findings = validator().validate(
            "SELECT o.order_status FROM fact_tracking_sessions s \
             JOIN fact_orders o ON s.session_id = o.city",
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].category, FindingCategory::InvalidJoin);
        assert_eq!(findings[0].severity, Severity::Warning);
        assert!(!has_errors(&findings));
    }

    #[test]
    fn test_group_by_mismatch() {
        let findings = validator().validate(
            "SELECT city, order_status, COUNT(*) FROM fact_orders GROUP BY city",
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].category, FindingCategory::AggregationMismatch);
        assert!(findings[0].message.contains("order_status"));
    }

    #[test]
    fn test_group_by_consistent() {
        let findings = validator().validate(
            "SELECT city, COUNT(*) AS orders FROM fact_orders GROUP BY city",
        );
        assert!(findings.is_empty(), "unexpected findings: {:?}", findings);
    }

    #[test]
    fn test_aggregate_argument_not_flagged() {
        let findings = validator().validate(
            "SELECT city, AVG(unique_location_count) FROM fact_tracking_sessions s \
             JOIN fact_orders o ON s.order_id = o.crn_number GROUP BY city",
        );
        assert!(findings.is_empty(), "unexpected findings: {:?}", findings);
    }

    #[test]
    fn test_cte_name_is_not_unknown_table() {
        let findings = validator().validate(
            "WITH recent AS (SELECT crn_number, order_status FROM fact_orders) \
             SELECT order_status FROM recent",
        );
        assert!(findings.is_empty(), "unexpected findings: {:?}", findings);
    }

    #[test]
    fn test_order_by_projection_alias_allowed() {
        let findings = validator().validate(
            "SELECT city, COUNT(*) AS order_count FROM fact_orders GROUP BY city ORDER BY order_count DESC",
        );
        assert!(findings.is_empty(), "unexpected findings: {:?}", findings);
    }

    #[test]
    fn test_warning_only_result_is_valid() {
        let findings = validator().validate(
            "SELECT o.order_status FROM fact_tracking_sessions s \
             JOIN fact_orders o ON s.session_id = o.city",
        );
        assert!(!has_errors(&findings));
        assert_eq!(findings.len(), 1);
    }
}
