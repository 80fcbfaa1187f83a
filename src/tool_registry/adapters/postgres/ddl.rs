//! SQL text for per-tool relations.
//!
//! `PostgreSQL` cannot bind identifiers as parameters, so relation and column
//! names are interpolated. Every identifier passes through
//! [`quote_identifier`]; record values are always bound.

use crate::tool_registry::domain::{ColumnDefinition, ColumnRole, RelationDefinition};

/// Quotes an identifier, doubling embedded quotes.
#[must_use]
pub fn quote_identifier(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

fn column_clause(column: &ColumnDefinition) -> String {
    let name = quote_identifier(column.name());
    let sql_type = column.column_type().sql_name();
    match column.role() {
        ColumnRole::PrimaryKey => format!("{name} {sql_type} PRIMARY KEY"),
        ColumnRole::InsertedAt => format!("{name} {sql_type} NOT NULL DEFAULT now()"),
        ColumnRole::Field => format!("{name} {sql_type}"),
    }
}

fn field_list(relation: &RelationDefinition) -> String {
    relation
        .field_columns()
        .map(|column| quote_identifier(column.name()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `CREATE TABLE IF NOT EXISTS` for the relation.
#[must_use]
pub fn create_table(relation: &RelationDefinition) -> String {
    let columns = relation
        .columns()
        .iter()
        .map(column_clause)
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({columns})",
        quote_identifier(relation.name())
    )
}

/// `DROP TABLE IF EXISTS` for the relation.
#[must_use]
pub fn drop_table(relation: &RelationDefinition) -> String {
    format!("DROP TABLE IF EXISTS {}", quote_identifier(relation.name()))
}

/// Probe reporting whether the relation exists; binds the quoted name as
/// `$1`.
#[must_use]
pub const fn relation_exists() -> &'static str {
    "SELECT to_regclass($1) IS NOT NULL AS present"
}

/// Insert of one record bound as a JSONB object in `$1`, returning `id`.
///
/// Values are cast to the column types by `jsonb_populate_record`; keys
/// absent from the object become `NULL`.
#[must_use]
pub fn insert_record(relation: &RelationDefinition) -> String {
    let table = quote_identifier(relation.name());
    let fields = field_list(relation);
    if fields.is_empty() {
        return format!("INSERT INTO {table} DEFAULT VALUES RETURNING \"id\"");
    }
    format!(
        "INSERT INTO {table} ({fields}) SELECT {fields} \
         FROM jsonb_populate_record(NULL::{table}, $1) RETURNING \"id\""
    )
}

/// Page of records ordered by `id`; binds `LIMIT $1 OFFSET $2`.
#[must_use]
pub fn select_page(relation: &RelationDefinition) -> String {
    format!(
        "SELECT to_jsonb(t) AS record FROM {} t ORDER BY t.\"id\" LIMIT $1 OFFSET $2",
        quote_identifier(relation.name())
    )
}
