//! A small SELECT builder.
//!
//! Queries are assembled as data (table, predicates, ordering, limit) and
//! rendered to SQL exactly once, so adding a filter never depends on what the
//! SQL text already contains.

use chrono::NaiveDate;
use core_types::{Table, Value};

/// Column every telemetry table is ordered and date-filtered by.
pub const TIMESTAMP_COLUMN: &str = "timestamp";

/// Rendered SQL with its positional `?` arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub args: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(sql: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            args,
        }
    }
}

/// One boolean condition of a WHERE clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    sql: String,
    args: Vec<Value>,
}

impl Predicate {
    /// `column = ?`
    pub fn eq(column: &str, value: impl Into<Value>) -> Self {
        Self {
            sql: format!("{} = ?", column),
            args: vec![value.into()],
        }
    }

    /// A hand-written fragment. `sql` must use `?` for every entry of `args`.
    pub fn raw(sql: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            args,
        }
    }
}

/// Inclusive calendar-date bounds; either side may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// The predicate on `DATE(column)` for whichever bounds are set.
    pub fn predicate(&self, column: &str) -> Option<Predicate> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some(Predicate::raw(
                format!("DATE({}) BETWEEN ? AND ?", column),
                vec![start.into(), end.into()],
            )),
            (Some(start), None) => Some(Predicate::raw(
                format!("DATE({}) >= ?", column),
                vec![start.into()],
            )),
            (None, Some(end)) => Some(Predicate::raw(
                format!("DATE({}) <= ?", column),
                vec![end.into()],
            )),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Join {
    table: Table,
    alias: &'static str,
    on: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    table: Table,
    alias: Option<&'static str>,
    columns: Vec<String>,
    joins: Vec<Join>,
    predicates: Vec<Predicate>,
    group_by: Option<String>,
    /// Column sorted descending.
    newest_by: Option<String>,
    limit: Option<i64>,
}

impl SelectQuery {
    /// `SELECT * FROM table`
    pub fn from(table: Table) -> Self {
        Self {
            table,
            alias: None,
            columns: vec!["*".to_string()],
            joins: Vec::new(),
            predicates: Vec::new(),
            group_by: None,
            newest_by: None,
            limit: None,
        }
    }

    pub fn alias(mut self, alias: &'static str) -> Self {
        self.alias = Some(alias);
        self
    }

    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn left_join(mut self, table: Table, alias: &'static str, on: &'static str) -> Self {
        self.joins.push(Join { table, alias, on });
        self
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn group_by(mut self, column: &str) -> Self {
        self.group_by = Some(column.to_string());
        self
    }

    /// Orders by the (alias-qualified) timestamp column, newest first.
    pub fn newest_first(mut self) -> Self {
        self.newest_by = Some(self.qualified(TIMESTAMP_COLUMN));
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Adds the date-range predicate on the timestamp column, if any bound is set.
    pub fn date_filter(self, range: &DateRange) -> Self {
        let column = self.qualified(TIMESTAMP_COLUMN);
        match range.predicate(&column) {
            Some(predicate) => self.filter(predicate),
            None => self,
        }
    }

    fn qualified(&self, column: &str) -> String {
        match self.alias {
            Some(alias) => format!("{}.{}", alias, column),
            None => column.to_string(),
        }
    }

    pub fn render(&self) -> Statement {
        let mut sql = format!("SELECT {} FROM {}", self.columns.join(", "), self.table);
        let mut args = Vec::new();

        if let Some(alias) = self.alias {
            sql.push(' ');
            sql.push_str(alias);
        }

        for join in &self.joins {
            sql.push_str(&format!(" LEFT JOIN {} {} ON {}", join.table, join.alias, join.on));
        }

        if !self.predicates.is_empty() {
            let clauses: Vec<&str> = self.predicates.iter().map(|p| p.sql.as_str()).collect();
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
            for predicate in &self.predicates {
                args.extend(predicate.args.iter().cloned());
            }
        }

        if let Some(column) = &self.group_by {
            sql.push_str(" GROUP BY ");
            sql.push_str(column);
        }

        if let Some(column) = &self.newest_by {
            sql.push_str(&format!(" ORDER BY {} DESC", column));
        }

        if let Some(limit) = self.limit {
            sql.push_str(" LIMIT ?");
            args.push(Value::Integer(limit));
        }

        Statement { sql, args }
    }
}

/// Returns `query` narrowed to `range`. The predicate is combined with any
/// existing ones (`AND`) or opens the WHERE clause when there are none.
pub fn apply_date_filter(query: SelectQuery, range: &DateRange) -> SelectQuery {
    query.date_filter(range)
}
