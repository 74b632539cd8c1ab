use serde_json::{Map, Value};

/// A single row as exchanged with the store: column name to JSON value.
pub type Row = Map<String, Value>;

/// Equality predicate on one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    /// PostgREST query pair, e.g. `("id", "eq.42")`.
    pub fn to_query_pair(&self) -> (String, String) {
        (self.column.clone(), format!("eq.{}", self.value))
    }

    #[cfg(test)]
    pub fn matches(&self, row: &Row) -> bool {
        row.get(&self.column)
            .map(|v| value_to_plain(v) == self.value)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub direction: Direction,
}

/// `select * from table [where ...] [order by ...] [limit n]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectQuery {
    pub table: String,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl SelectQuery {
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push(Filter::eq(column, value));
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order = Some(Order {
            column: column.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), "*".to_string())];
        pairs.extend(self.filters.iter().map(Filter::to_query_pair));
        if let Some(order) = &self.order {
            let dir = match order.direction {
                Direction::Ascending => "asc",
                Direction::Descending => "desc",
            };
            pairs.push(("order".to_string(), format!("{}.{}", order.column, dir)));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        pairs
    }
}

/// Renders a JSON scalar the way it appears in a query string.
pub fn value_to_plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
