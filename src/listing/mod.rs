//! Collection listing machinery
//!
//! Every listable entity declares a [`ListPolicy`]: the allow-list of
//! filterable query parameters, the columns covered by free-text search,
//! the legal ordering keys and the pagination bounds. A policy resolves
//! raw query parameters into a [`Selection`] that repositories execute as
//! SQL. Query parameters outside the allow-lists are ignored.
//!
//! Filters combine with AND; `search` is an OR of case-insensitive
//! substring matches; `ordering` accepts comma-separated keys with a `-`
//! prefix for descending and falls back to the policy default when no key
//! is valid; `page`/`page_size` drive page-number pagination with the
//! page size clamped to the policy maximum.

use std::collections::BTreeMap;

use serde::Serialize;

/// How a filter parameter matches its column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMatch {
    /// Case-insensitive substring match
    Contains,
    /// Case-insensitive whole-value match
    ExactCaseInsensitive,
    /// Exact integer match against a foreign key column
    ForeignKey,
}

/// One allow-listed filter parameter
#[derive(Debug, Clone, Copy)]
pub struct FilterRule {
    pub param: &'static str,
    pub column: &'static str,
    pub matcher: FilterMatch,
}

/// One allow-listed ordering key
#[derive(Debug, Clone, Copy)]
pub struct OrderingKey {
    pub param: &'static str,
    pub column: &'static str,
}

/// Listing behavior for one entity
#[derive(Debug, Clone, Copy)]
pub struct ListPolicy {
    pub filters: &'static [FilterRule],
    pub search_columns: &'static [&'static str],
    pub ordering: &'static [OrderingKey],
    /// Ordering applied when the request names no valid key; a `-` prefix
    /// means descending
    pub default_ordering: &'static str,
    pub default_page_size: u64,
    pub max_page_size: u64,
}

/// A value bound into the generated SQL
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Text(String),
    Int(i64),
}

/// A resolved listing query, ready for a repository to execute
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Either empty or a full ` WHERE ...` fragment
    pub where_sql: String,
    pub binds: Vec<BindValue>,
    /// A full `ORDER BY ...` fragment
    pub order_sql: String,
    pub page: u64,
    pub page_size: u64,
}

impl Selection {
    pub fn limit(&self) -> i64 {
        self.page_size as i64
    }

    /// Row offset for the page. Saturates at `i64::MAX` so an absurdly
    /// large page number yields an empty result set instead of wrapping;
    /// [`paginate`] then rejects the page against the real count.
    pub fn offset(&self) -> i64 {
        let offset = (self.page as u128 - 1) * self.page_size as u128;
        i64::try_from(offset).unwrap_or(i64::MAX)
    }
}

/// Listing failure surfaced to the API layer
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ListError {
    #[error("Invalid page.")]
    InvalidPage,
}

/// Paginated response envelope
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl ListPolicy {
    /// Resolve raw query parameters into a [`Selection`].
    ///
    /// A `page` that is not a positive integer is an invalid page; an
    /// unusable `page_size` falls back to the default.
    pub fn resolve(&self, params: &BTreeMap<String, String>) -> Result<Selection, ListError> {
        let mut clauses: Vec<String> = Vec::new();
        let mut binds: Vec<BindValue> = Vec::new();

        for rule in self.filters {
            let Some(value) = params.get(rule.param) else {
                continue;
            };
            if value.is_empty() {
                continue;
            }
            match rule.matcher {
                FilterMatch::Contains => {
                    clauses.push(format!(
                        "LOWER({}) LIKE '%' || ? || '%' ESCAPE '\\'",
                        rule.column
                    ));
                    binds.push(BindValue::Text(like_pattern(value)));
                }
                FilterMatch::ExactCaseInsensitive => {
                    clauses.push(format!("LOWER({}) = LOWER(?)", rule.column));
                    binds.push(BindValue::Text(value.clone()));
                }
                FilterMatch::ForeignKey => {
                    // Non-numeric values cannot match any row and are ignored
                    if let Ok(id) = value.parse::<i64>() {
                        clauses.push(format!("{} = ?", rule.column));
                        binds.push(BindValue::Int(id));
                    }
                }
            }
        }

        if let Some(term) = params.get("search") {
            if !term.is_empty() && !self.search_columns.is_empty() {
                let ors: Vec<String> = self
                    .search_columns
                    .iter()
                    .map(|column| {
                        format!("LOWER({}) LIKE '%' || ? || '%' ESCAPE '\\'", column)
                    })
                    .collect();
                clauses.push(format!("({})", ors.join(" OR ")));
                for _ in self.search_columns {
                    binds.push(BindValue::Text(like_pattern(term)));
                }
            }
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };

        let order_sql = self.order_sql(params.get("ordering").map(String::as_str));

        let page = match params.get("page") {
            None => 1,
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|p| *p >= 1)
                .ok_or(ListError::InvalidPage)?,
        };

        let page_size = params
            .get("page_size")
            .and_then(|raw| raw.parse::<u64>().ok())
            .filter(|size| *size > 0)
            .map(|size| size.min(self.max_page_size))
            .unwrap_or(self.default_page_size);

        Ok(Selection {
            where_sql,
            binds,
            order_sql,
            page,
            page_size,
        })
    }

    fn order_sql(&self, requested: Option<&str>) -> String {
        if let Some(raw) = requested {
            let mut parts: Vec<String> = Vec::new();
            for key in raw.split(',') {
                let key = key.trim();
                let (name, direction) = match key.strip_prefix('-') {
                    Some(name) => (name, "DESC"),
                    None => (key, "ASC"),
                };
                if let Some(ordering) = self.ordering.iter().find(|o| o.param == name) {
                    parts.push(format!("{} {}", ordering.column, direction));
                }
            }
            if !parts.is_empty() {
                return format!("ORDER BY {}", parts.join(", "));
            }
        }

        let (name, direction) = match self.default_ordering.strip_prefix('-') {
            Some(name) => (name, "DESC"),
            None => (self.default_ordering, "ASC"),
        };
        let column = self
            .ordering
            .iter()
            .find(|o| o.param == name)
            .map(|o| o.column)
            .unwrap_or("id");
        format!("ORDER BY {} {}", column, direction)
    }
}

/// Lowercase a search value and escape LIKE wildcards
fn like_pattern(value: &str) -> String {
    value
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Assemble the response envelope, validating the page upper bound.
///
/// An empty collection still has one valid (empty) page; any page past
/// the last is an invalid page.
pub fn paginate<T>(
    results: Vec<T>,
    count: i64,
    selection: &Selection,
    path: &str,
    params: &BTreeMap<String, String>,
) -> Result<Page<T>, ListError> {
    let total_pages = if count <= 0 {
        1
    } else {
        (count as u64).div_ceil(selection.page_size)
    };

    if selection.page > total_pages {
        return Err(ListError::InvalidPage);
    }

    let next = (selection.page < total_pages)
        .then(|| page_link(path, params, selection.page + 1));
    let previous = (selection.page > 1).then(|| page_link(path, params, selection.page - 1));

    Ok(Page {
        count,
        next,
        previous,
        results,
    })
}

/// Build a relative page link, preserving all other query parameters
fn page_link(path: &str, params: &BTreeMap<String, String>, page: u64) -> String {
    let mut query: Vec<String> = Vec::new();
    let mut wrote_page = false;

    for (key, value) in params {
        if key == "page" {
            query.push(format!("page={}", page));
            wrote_page = true;
        } else {
            query.push(format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            ));
        }
    }
    if !wrote_page {
        query.push(format!("page={}", page));
    }

    format!("{}?{}", path, query.join("&"))
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn selection(page: u64, page_size: u64) -> Selection {
        Selection {
            where_sql: String::new(),
            binds: Vec::new(),
            order_sql: "ORDER BY id ASC".to_string(),
            page,
            page_size,
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        /// Every item index falls on exactly one page, and pages past the
        /// end are rejected.
        #[test]
        fn pages_partition_the_collection(count in 0i64..5000, page_size in 1u64..100) {
            let total_pages = if count == 0 { 1 } else { (count as u64).div_ceil(page_size) };

            let empty = BTreeMap::new();
            for page in 1..=total_pages {
                let sel = selection(page, page_size);
                prop_assert!(paginate(Vec::<i64>::new(), count, &sel, "/x", &empty).is_ok());
                prop_assert_eq!(sel.offset() as u64, (page - 1) * page_size);
            }

            let past = selection(total_pages + 1, page_size);
            prop_assert!(paginate(Vec::<i64>::new(), count, &past, "/x", &empty).is_err());
        }

        /// next/previous exist exactly when a neighbor page exists.
        #[test]
        fn links_match_neighbors(count in 1i64..1000, page_size in 1u64..50) {
            let total_pages = (count as u64).div_ceil(page_size);
            let empty = BTreeMap::new();

            for page in 1..=total_pages {
                let sel = selection(page, page_size);
                let result = paginate(Vec::<i64>::new(), count, &sel, "/x", &empty).unwrap();
                prop_assert_eq!(result.previous.is_some(), page > 1);
                prop_assert_eq!(result.next.is_some(), page < total_pages);
            }
        }

        /// LIKE patterns never leave an unescaped wildcard in the bind.
        #[test]
        fn like_pattern_escapes_wildcards(value in ".{0,40}") {
            let pattern = like_pattern(&value);
            let mut chars = pattern.chars().peekable();
            while let Some(c) = chars.next() {
                if c == '\\' {
                    chars.next();
                } else {
                    prop_assert!(c != '%' && c != '_');
                }
            }
        }
    }
}
