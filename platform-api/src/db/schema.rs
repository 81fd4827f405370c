//! Table definitions
//!
//! Tables are described explicitly and created with `CREATE TABLE IF NOT
//! EXISTS`. Existing tables are never dropped or altered; there is no
//! migration tooling.

use sqlx::PgPool;

/// One column of a table
#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub name: &'static str,
    pub sql_type: &'static str,
    pub nullable: bool,
    pub primary_key: bool,
    /// SQL default expression, evaluated by the store
    pub default: Option<&'static str>,
}

impl ColumnDef {
    const fn new(name: &'static str, sql_type: &'static str) -> Self {
        Self {
            name,
            sql_type,
            nullable: true,
            primary_key: false,
            default: None,
        }
    }

    const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    const fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    const fn default_to(mut self, expr: &'static str) -> Self {
        self.default = Some(expr);
        self
    }

    fn to_sql(&self) -> String {
        let mut sql = format!("{} {}", self.name, self.sql_type);
        if self.primary_key {
            sql.push_str(" PRIMARY KEY");
        } else if !self.nullable {
            sql.push_str(" NOT NULL");
        }
        if let Some(expr) = self.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(expr);
        }
        sql
    }
}

/// A table and its columns, in declaration order
#[derive(Debug, Clone, Copy)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [ColumnDef],
}

impl TableDef {
    /// Idempotent DDL for this table
    pub fn create_if_absent_sql(&self) -> String {
        let columns: Vec<String> = self.columns.iter().map(ColumnDef::to_sql).collect();
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.name,
            columns.join(", ")
        )
    }

    /// Comma-separated column names, for SELECT and RETURNING lists
    pub fn column_list(&self) -> String {
        self.columns
            .iter()
            .map(|c| c.name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// `items`: the only persisted entity
pub const ITEMS: TableDef = TableDef {
    name: "items",
    columns: &[
        ColumnDef::new("id", "SERIAL").primary_key(),
        ColumnDef::new("name", "VARCHAR(255)").not_null(),
        ColumnDef::new("description", "TEXT"),
        ColumnDef::new("created_at", "TIMESTAMP").default_to("CURRENT_TIMESTAMP"),
    ],
};

/// Every table the service owns
pub const TABLES: &[TableDef] = &[ITEMS];

/// Create any missing tables.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    for table in TABLES {
        sqlx::query(&table.create_if_absent_sql())
            .execute(pool)
            .await?;
        tracing::debug!(table = table.name, "Table verified");
    }
    Ok(())
}
