//! Schema Catalog
//!
//! In-memory model of the warehouse schema: tables, columns and declared key
//! relationships. Built once from declarative metadata, validated at load
//! time, and read-only afterwards. Components share it behind an `Arc` so the
//! hot retrieval path needs no locking; a reload builds a fresh catalog and
//! swaps the reference.

use crate::error::{Result, ScoutError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Semantic column type, normalized across warehouse spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    #[serde(alias = "text", alias = "varchar", alias = "string")]
    String,
    #[serde(alias = "integer", alias = "int", alias = "float", alias = "numeric")]
    Number,
    #[serde(alias = "bool")]
    Boolean,
    #[serde(alias = "datetime", alias = "date")]
    Timestamp,
    #[serde(rename = "timestamp_tz", alias = "timestamptz", alias = "timestamp_with_timezone")]
    TimestampTz,
    Array,
    #[serde(alias = "json", alias = "object", alias = "semi_structured")]
    Variant,
}

impl ColumnType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ColumnType::String => "VARCHAR",
            ColumnType::Number => "NUMBER",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Timestamp => "TIMESTAMP",
            ColumnType::TimestampTz => "TIMESTAMP_TZ",
            ColumnType::Array => "ARRAY",
            ColumnType::Variant => "VARIANT",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: ColumnType,
    #[serde(default)]
    pub description: String,
    /// Declared constraint/test tags, e.g. "not_null", "unique".
    #[serde(default)]
    pub tests: Vec<String>,
}

/// Directed foreign-key edge from the owning table to `ref_table`.
/// Column lists are parallel; composite keys are allowed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKey {
    pub columns: Vec<String>,
    pub ref_table: String,
    pub ref_columns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub columns: Vec<Column>,
    #[serde(default)]
    pub primary_key: Vec<String>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }
}

/// A table reached by following a foreign key, together with the edge and the
/// direction it was followed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeDirection {
    /// The edge is declared on the starting table.
    Outgoing,
    /// The edge is declared on the neighbor and points at the starting table.
    Incoming,
}

#[derive(Debug, Clone)]
pub struct FkNeighbor<'a> {
    pub table: &'a str,
    pub edge: &'a ForeignKey,
    pub direction: EdgeDirection,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    tables: Vec<Table>,
}

/// The full table map. Immutable once constructed.
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    tables: BTreeMap<String, Table>,
}

impl SchemaCatalog {
    /// Build a catalog from parsed tables, enforcing referential integrity.
    /// A dangling foreign key or a primary-key column missing from its own
    /// table is a fatal load error; no partial catalog is exposed.
    pub fn from_tables(tables: Vec<Table>) -> Result<Self> {
        let mut map: BTreeMap<String, Table> = BTreeMap::new();
        for table in tables {
            let mut seen: HashSet<&str> = HashSet::new();
            for col in &table.columns {
                if !seen.insert(col.name.as_str()) {
                    return Err(ScoutError::SchemaLoad(format!(
                        "Duplicate column '{}' in table '{}'",
                        col.name, table.name
                    )));
                }
            }
            if map.contains_key(&table.name) {
                return Err(ScoutError::SchemaLoad(format!(
                    "Duplicate table '{}'",
                    table.name
                )));
            }
            map.insert(table.name.clone(), table);
        }

        for table in map.values() {
            for pk in &table.primary_key {
                if !table.has_column(pk) {
                    return Err(ScoutError::SchemaLoad(format!(
                        "Primary key column '{}' not found in table '{}'",
                        pk, table.name
                    )));
                }
            }
            for fk in &table.foreign_keys {
                if fk.columns.len() != fk.ref_columns.len() {
                    return Err(ScoutError::SchemaLoad(format!(
                        "Foreign key on '{}' has {} source columns but {} target columns",
                        table.name,
                        fk.columns.len(),
                        fk.ref_columns.len()
                    )));
                }
                for col in &fk.columns {
                    if !table.has_column(col) {
                        return Err(ScoutError::SchemaLoad(format!(
                            "Foreign key column '{}' not found in table '{}'",
                            col, table.name
                        )));
                    }
                }
                let target = map.get(&fk.ref_table).ok_or_else(|| {
                    ScoutError::SchemaLoad(format!(
                        "Referenced table '{}' not found for foreign key on '{}'",
                        fk.ref_table, table.name
                    ))
                })?;
                for col in &fk.ref_columns {
                    if !target.has_column(col) {
                        return Err(ScoutError::SchemaLoad(format!(
                            "Referenced column '{}' not found in table '{}' for foreign key on '{}'",
                            col, fk.ref_table, table.name
                        )));
                    }
                }
            }
        }

        Ok(Self { tables: map })
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(content)
            .map_err(|e| ScoutError::SchemaLoad(format!("Malformed catalog document: {}", e)))?;
        Self::from_tables(file.tables)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn table(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(name)
            .or_else(|| {
                self.tables
                    .values()
                    .find(|t| t.name.eq_ignore_ascii_case(name))
            })
            .ok_or_else(|| ScoutError::TableNotFound(name.to_string()))
    }

    pub fn contains_table(&self, name: &str) -> bool {
        self.table(name).is_ok()
    }

    pub fn column(&self, table: &str, column: &str) -> Option<&Column> {
        self.table(table).ok().and_then(|t| t.column(column))
    }

    /// Deterministic iteration (BTreeMap order).
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// All foreign-key edges touching `name`, in both directions.
    pub fn fk_neighbors(&self, name: &str) -> Vec<FkNeighbor<'_>> {
        let mut neighbors = Vec::new();
        if let Ok(table) = self.table(name) {
            for fk in &table.foreign_keys {
                neighbors.push(FkNeighbor {
                    table: fk.ref_table.as_str(),
                    edge: fk,
                    direction: EdgeDirection::Outgoing,
                });
            }
            for other in self.tables.values() {
                if other.name == table.name {
                    continue;
                }
                for fk in &other.foreign_keys {
                    if fk.ref_table == table.name {
                        neighbors.push(FkNeighbor {
                            table: other.name.as_str(),
                            edge: fk,
                            direction: EdgeDirection::Incoming,
                        });
                    }
                }
            }
        }
        neighbors
    }

    /// Whether `t1.c1 = t2.c2` matches a declared foreign key, in either
    /// direction, at any position of a composite key.
    pub fn is_declared_join(&self, t1: &str, c1: &str, t2: &str, c2: &str) -> bool {
        self.edge_matches(t1, c1, t2, c2) || self.edge_matches(t2, c2, t1, c1)
    }

    fn edge_matches(&self, src_table: &str, src_col: &str, dst_table: &str, dst_col: &str) -> bool {
        let Ok(src) = self.table(src_table) else {
            return false;
        };
        src.foreign_keys.iter().any(|fk| {
            fk.ref_table.eq_ignore_ascii_case(dst_table)
                && fk
                    .columns
                    .iter()
                    .zip(fk.ref_columns.iter())
                    .any(|(c, r)| c.eq_ignore_ascii_case(src_col) && r.eq_ignore_ascii_case(dst_col))
        })
    }

    /// Whether the edge joins onto the target table's primary key (the case
    /// the retriever must keep join partners for).
    pub fn is_pk_join(&self, edge: &ForeignKey) -> bool {
        match self.table(&edge.ref_table) {
            Ok(target) => {
                !target.primary_key.is_empty()
                    && edge
                        .ref_columns
                        .iter()
                        .all(|c| target.primary_key.iter().any(|pk| pk.eq_ignore_ascii_case(c)))
            }
            Err(_) => false,
        }
    }
}
