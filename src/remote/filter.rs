//! Row filters, rendered as PostgREST query pairs

use std::fmt;

/// One condition on a column
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, String),
    Gte(String, String),
    Lte(String, String),
    In(String, Vec<String>),
}

impl Filter {
    pub fn eq(column: &str, value: impl fmt::Display) -> Self {
        Filter::Eq(column.to_string(), value.to_string())
    }

    pub fn gte(column: &str, value: impl fmt::Display) -> Self {
        Filter::Gte(column.to_string(), value.to_string())
    }

    pub fn lte(column: &str, value: impl fmt::Display) -> Self {
        Filter::Lte(column.to_string(), value.to_string())
    }

    pub fn is_in<I, V>(column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: fmt::Display,
    {
        Filter::In(column.to_string(), values.into_iter().map(|v| v.to_string()).collect())
    }

    pub fn column(&self) -> &str {
        match self {
            Filter::Eq(c, _) | Filter::Gte(c, _) | Filter::Lte(c, _) | Filter::In(c, _) => c,
        }
    }

    /// `(column, "op.value")`
    pub fn to_query(&self) -> (String, String) {
        let value = match self {
            Filter::Eq(_, v) => format!("eq.{}", v),
            Filter::Gte(_, v) => format!("gte.{}", v),
            Filter::Lte(_, v) => format!("lte.{}", v),
            Filter::In(_, values) => {
                let list: Vec<String> = values.iter().map(|v| quote_list_item(v)).collect();
                format!("in.({})", list.join(","))
            }
        };
        (self.column().to_string(), value)
    }
}

/// List items containing separators or quotes must be double-quoted
fn quote_list_item(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| matches!(c, ',' | '(' | ')' | '"' | '\\') || c.is_whitespace());
    if needs_quotes {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        value.to_string()
    }
}

/// Render a filter list as query pairs
pub fn to_query(filters: &[Filter]) -> Vec<(String, String)> {
    filters.iter().map(Filter::to_query).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparison_filters() {
        assert_eq!(Filter::eq("id", 7).to_query(), ("id".to_string(), "eq.7".to_string()));
        assert_eq!(
            Filter::gte("date", "2025-01-01").to_query(),
            ("date".to_string(), "gte.2025-01-01".to_string())
        );
        assert_eq!(
            Filter::lte("date", "2025-01-31").to_query(),
            ("date".to_string(), "lte.2025-01-31".to_string())
        );
    }

    #[test]
    fn test_in_filter() {
        assert_eq!(
            Filter::is_in("food_id", [1, 2, 3]).to_query(),
            ("food_id".to_string(), "in.(1,2,3)".to_string())
        );
        assert_eq!(
            Filter::is_in("name", ["Rice", "Mac, cheese"]).to_query().1,
            "in.(Rice,\"Mac, cheese\")"
        );
    }

    #[test]
    fn test_filter_list() {
        let pairs = to_query(&[Filter::gte("date", "2025-01-01"), Filter::eq("meal", "lunch")]);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[1], ("meal".to_string(), "eq.lunch".to_string()));
    }
}
