//! Statement builder: table, joins, predicate and positional parameters.
//!
//! Every statement the editors issue goes through here so values are never
//! interpolated into SQL text and column qualification under joins can be
//! checked without a database.

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

// ═══════════════════════════════════════════
// Building blocks
// ═══════════════════════════════════════════

/// A column, optionally qualified by a table alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRef<'a> {
    pub qualifier: Option<&'a str>,
    pub column: &'a str,
}

impl<'a> ColumnRef<'a> {
    pub const fn bare(column: &'a str) -> Self {
        Self { qualifier: None, column }
    }

    pub const fn qualified(qualifier: &'a str, column: &'a str) -> Self {
        Self {
            qualifier: Some(qualifier),
            column,
        }
    }

    fn render(&self) -> String {
        match self.qualifier {
            Some(q) => format!("{q}.{}", self.column),
            None => self.column.to_string(),
        }
    }
}

/// A table with an optional alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRef<'a> {
    pub table: &'a str,
    pub alias: Option<&'a str>,
}

impl<'a> TableRef<'a> {
    pub const fn new(table: &'a str) -> Self {
        Self { table, alias: None }
    }

    pub const fn aliased(table: &'a str, alias: &'a str) -> Self {
        Self {
            table,
            alias: Some(alias),
        }
    }

    fn render(&self) -> String {
        match self.alias {
            Some(a) => format!("{} {a}", self.table),
            None => self.table.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Left,
}

impl JoinKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "LEFT JOIN",
        }
    }
}

/// `<kind> <table> ON <left> = <right>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinClause<'a> {
    pub kind: JoinKind,
    pub table: TableRef<'a>,
    pub left: ColumnRef<'a>,
    pub right: ColumnRef<'a>,
}

/// WHERE clause shapes the editors need.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate<'a> {
    /// `column LIKE '%needle%'`
    Contains(ColumnRef<'a>, String),
    /// `a = ? AND b = ? ...`
    Equals(Vec<(ColumnRef<'a>, Value)>),
}

impl Predicate<'_> {
    fn render(&self, params: &mut Vec<Value>) -> String {
        match self {
            Self::Contains(column, needle) => {
                params.push(Value::Text(format!("%{needle}%")));
                format!("{} LIKE ?{}", column.render(), params.len())
            }
            Self::Equals(pairs) => {
                let mut terms = Vec::with_capacity(pairs.len());
                for (column, value) in pairs {
                    params.push(value.clone());
                    terms.push(format!("{} = ?{}", column.render(), params.len()));
                }
                terms.join(" AND ")
            }
        }
    }
}

// ═══════════════════════════════════════════
// Statement: rendered SQL + parameters
// ═══════════════════════════════════════════

/// Rendered SQL text with its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    /// Execute a mutating statement; returns affected rows.
    pub fn execute(&self, conn: &Connection) -> Result<usize, rusqlite::Error> {
        tracing::debug!(sql = %self.sql, params = self.params.len(), "execute");
        conn.execute(&self.sql, params_from_iter(self.params.iter()))
    }

    /// Run a `SELECT COUNT(*)` statement.
    pub fn count(&self, conn: &Connection) -> Result<i64, rusqlite::Error> {
        tracing::debug!(sql = %self.sql, "count");
        conn.query_row(&self.sql, params_from_iter(self.params.iter()), |row| {
            row.get::<_, i64>(0)
        })
    }
}

// ═══════════════════════════════════════════
// SELECT
// ═══════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery<'a> {
    from: TableRef<'a>,
    joins: Vec<JoinClause<'a>>,
    columns: Vec<ColumnRef<'a>>,
    predicate: Option<Predicate<'a>>,
}

impl<'a> SelectQuery<'a> {
    pub fn from(table: TableRef<'a>) -> Self {
        Self {
            from: table,
            joins: Vec::new(),
            columns: Vec::new(),
            predicate: None,
        }
    }

    pub fn join(mut self, clause: JoinClause<'a>) -> Self {
        self.joins.push(clause);
        self
    }

    pub fn column(mut self, column: ColumnRef<'a>) -> Self {
        self.columns.push(column);
        self
    }

    pub fn filter(mut self, predicate: Predicate<'a>) -> Self {
        self.predicate = Some(predicate);
        self
    }

    pub fn build(&self) -> Statement {
        let mut params = Vec::new();
        let columns = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns
                .iter()
                .map(ColumnRef::render)
                .collect::<Vec<_>>()
                .join(", ")
        };

        let mut sql = format!("SELECT {columns} FROM {}", self.from.render());
        for join in &self.joins {
            sql.push_str(&format!(
                " {} {} ON {} = {}",
                join.kind.as_str(),
                join.table.render(),
                join.left.render(),
                join.right.render()
            ));
        }
        if let Some(predicate) = &self.predicate {
            let clause = predicate.render(&mut params);
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
        }

        Statement { sql, params }
    }
}

// ═══════════════════════════════════════════
// COUNT / INSERT / UPDATE / DELETE
// ═══════════════════════════════════════════

/// `SELECT COUNT(*) FROM table WHERE a = ? AND ...`
pub fn count_where(table: &str, key: &[(&str, Value)]) -> Statement {
    let mut params = Vec::new();
    let predicate = equals(key).render(&mut params);
    Statement {
        sql: format!("SELECT COUNT(*) FROM {table} WHERE {predicate}"),
        params,
    }
}

/// `INSERT INTO table (a, b) VALUES (?1, ?2)`
pub fn insert(table: &str, row: Vec<(&str, Value)>) -> Statement {
    let columns: Vec<&str> = row.iter().map(|(c, _)| *c).collect();
    let placeholders: Vec<String> = (1..=row.len()).map(|i| format!("?{i}")).collect();
    Statement {
        sql: format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            columns.join(", "),
            placeholders.join(", ")
        ),
        params: row.into_iter().map(|(_, v)| v).collect(),
    }
}

/// `UPDATE table SET a = ?1 WHERE key = ?2`
pub fn update(table: &str, set: Vec<(&str, Value)>, key: &[(&str, Value)]) -> Statement {
    let mut params = Vec::with_capacity(set.len() + key.len());
    let mut assignments = Vec::with_capacity(set.len());
    for (column, value) in set {
        params.push(value);
        assignments.push(format!("{column} = ?{}", params.len()));
    }
    let predicate = equals(key).render(&mut params);
    Statement {
        sql: format!(
            "UPDATE {table} SET {} WHERE {predicate}",
            assignments.join(", ")
        ),
        params,
    }
}

/// `DELETE FROM table WHERE key = ?1`
pub fn delete(table: &str, key: &[(&str, Value)]) -> Statement {
    let mut params = Vec::new();
    let predicate = equals(key).render(&mut params);
    Statement {
        sql: format!("DELETE FROM {table} WHERE {predicate}"),
        params,
    }
}

fn equals<'a>(key: &[(&'a str, Value)]) -> Predicate<'a> {
    Predicate::Equals(
        key.iter()
            .map(|(column, value)| (ColumnRef::bare(*column), value.clone()))
            .collect(),
    )
}
