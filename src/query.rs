//! Query-string representation of view modifiers.
//!
//! Recognised keys:
//! - `filter_authorCategories`, `filter_statuses` (repeated for several values)
//! - `sort_column`
//! - `sort_reverse` (`true` / `false`)
//!
//! Every other parameter is carried through untouched, in its original order.

use std::fmt;

use indexmap::IndexMap;
use url::form_urlencoded;

use crate::types::{
    AuthorCategory, FilterColumn, FilterModifiers, FilterOption, PartialViewModifiers, SortColumn,
    SortModifiers, Status, ViewModifiers,
};

const FILTER_PREFIX: &str = "filter_";
pub const SORT_COLUMN_KEY: &str = "sort_column";
pub const SORT_REVERSE_KEY: &str = "sort_reverse";

fn filter_key(column: FilterColumn) -> String {
    format!("{FILTER_PREFIX}{}", column.as_str())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    One(String),
    Many(Vec<String>),
}

impl QueryValue {
    pub fn values(&self) -> Vec<&str> {
        match self {
            Self::One(v) => vec![v.as_str()],
            Self::Many(vs) => vs.iter().map(String::as_str).collect(),
        }
    }

    fn push(&mut self, value: String) {
        match self {
            Self::One(first) => *self = Self::Many(vec![std::mem::take(first), value]),
            Self::Many(vs) => vs.push(value),
        }
    }
}

/// Ordered query parameters. Repeated keys collapse into one multi-valued
/// entry at the position of their first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    params: IndexMap<String, QueryValue>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `a=1&b=2`, with or without a leading `?`.
    pub fn parse(input: &str) -> Self {
        let input = input.strip_prefix('?').unwrap_or(input);
        let mut query = Self::new();
        for (key, value) in form_urlencoded::parse(input.as_bytes()) {
            match query.params.get_mut(&*key) {
                Some(existing) => existing.push(value.into_owned()),
                None => {
                    query
                        .params
                        .insert(key.into_owned(), QueryValue::One(value.into_owned()));
                }
            }
        }
        query
    }

    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.params.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: QueryValue) {
        self.params.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<QueryValue> {
        self.params.shift_remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.params {
            for v in value.values() {
                serializer.append_pair(key, v);
            }
        }
        f.write_str(&serializer.finish())
    }
}

/// View modifiers read from a query, plus everything that was not one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedQuery {
    pub view_modifiers: ViewModifiers,
    pub rest: Query,
}

fn parse_options<V: FilterOption>(value: &QueryValue) -> Vec<V> {
    let mut out = Vec::new();
    for raw in value.values() {
        match V::parse(raw) {
            Some(v) if !out.contains(&v) => out.push(v),
            Some(_) => {}
            None if raw.is_empty() => {}
            None => tracing::debug!("ignoring unknown filter value {raw:?}"),
        }
    }
    out
}

fn serialize_options<V: FilterOption>(values: &[V]) -> QueryValue {
    match values {
        // An explicit empty value keeps "nothing selected" distinct from
        // "parameter absent".
        [] => QueryValue::One(String::new()),
        [one] => QueryValue::One(one.as_str().to_owned()),
        many => QueryValue::Many(many.iter().map(|v| v.as_str().to_owned()).collect()),
    }
}

/// Split `query` into view modifiers and the remaining parameters.
///
/// Filter columns missing from the query select every option; a missing or
/// unknown sort falls back to the default sort.
pub fn extract_view_modifiers(query: &Query) -> ExtractedQuery {
    let mut rest = query.clone();
    let mut view_modifiers = ViewModifiers::default();

    if let Some(value) = rest.remove(&filter_key(FilterColumn::AuthorCategories)) {
        view_modifiers.filters.author_categories = Some(parse_options::<AuthorCategory>(&value));
    }
    if let Some(value) = rest.remove(&filter_key(FilterColumn::Statuses)) {
        view_modifiers.filters.statuses = Some(parse_options::<Status>(&value));
    }

    if let Some(value) = rest.remove(SORT_COLUMN_KEY) {
        match value.values().first().and_then(|v| SortColumn::parse(v)) {
            Some(column) => view_modifiers.sorts.column = column,
            None => tracing::debug!("ignoring unknown sort column {value:?}"),
        }
    }
    if let Some(value) = rest.remove(SORT_REVERSE_KEY) {
        match value.values().first().copied() {
            Some("true") => view_modifiers.sorts.reverse = true,
            Some("false") => view_modifiers.sorts.reverse = false,
            _ => tracing::debug!("ignoring sort_reverse {value:?}"),
        }
    }

    ExtractedQuery {
        view_modifiers,
        rest,
    }
}

fn append_view_modifiers(query: &mut Query, filters: &FilterModifiers, sorts: &SortModifiers) {
    if let Some(values) = &filters.author_categories {
        query.insert(
            filter_key(FilterColumn::AuthorCategories),
            serialize_options(values),
        );
    }
    if let Some(values) = &filters.statuses {
        query.insert(filter_key(FilterColumn::Statuses), serialize_options(values));
    }
    query.insert(
        SORT_COLUMN_KEY,
        QueryValue::One(sorts.column.as_str().to_owned()),
    );
    query.insert(SORT_REVERSE_KEY, QueryValue::One(sorts.reverse.to_string()));
}

/// Rebuild a query from `existing` with `update` applied: the untouched rest
/// first, then filter parameters, then sort parameters.
pub fn build_query(update: &PartialViewModifiers, existing: &ExtractedQuery) -> Query {
    let merged = existing.view_modifiers.merged_with(update);
    let mut query = existing.rest.clone();
    append_view_modifiers(&mut query, &merged.filters, &merged.sorts);
    query
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_groups_repeated_keys() {
        let q = Query::parse("?filter_statuses=isBlocked&tab=1&filter_statuses=needsReview");
        assert_eq!(
            q.get("filter_statuses"),
            Some(&QueryValue::Many(vec!["isBlocked".into(), "needsReview".into()]))
        );
        assert_eq!(q.get("tab"), Some(&QueryValue::One("1".into())));
        let keys: Vec<&str> = q.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["filter_statuses", "tab"]);
    }

    #[test]
    fn empty_query_yields_defaults() {
        let extracted = extract_view_modifiers(&Query::new());
        assert_eq!(extracted.view_modifiers, ViewModifiers::default());
        assert!(extracted.rest.is_empty());
    }

    #[test]
    fn extraction_drops_unknown_values_and_keeps_rest_in_order() {
        let q = Query::parse(
            "z=last&filter_authorCategories=me&filter_authorCategories=robots\
             &sort_column=priorityLevel&filter_other=x&sort_reverse=true&a=first",
        );
        let extracted = extract_view_modifiers(&q);
        assert_eq!(
            extracted.view_modifiers.filters.author_categories,
            Some(vec![AuthorCategory::Me])
        );
        assert_eq!(
            extracted.view_modifiers.filters.statuses,
            Some(Status::ALL.to_vec())
        );
        assert_eq!(
            extracted.view_modifiers.sorts,
            SortModifiers {
                column: SortColumn::PriorityLevel,
                reverse: true
            }
        );
        assert_eq!(extracted.rest.to_string(), "z=last&filter_other=x&a=first");
    }

    #[test]
    fn empty_selection_survives_a_round_trip() {
        let update = PartialViewModifiers::filters(FilterModifiers {
            statuses: Some(vec![]),
            ..FilterModifiers::default()
        });
        let q = build_query(&update, &extract_view_modifiers(&Query::new()));
        assert!(q.to_string().contains("filter_statuses=&"));
        let back = extract_view_modifiers(&Query::parse(&q.to_string()));
        assert_eq!(back.view_modifiers.filters.statuses, Some(vec![]));
    }

    #[test]
    fn build_then_extract_recovers_view_modifiers() {
        let existing = extract_view_modifiers(&Query::parse("utm=abc"));
        let target = ViewModifiers {
            filters: FilterModifiers {
                author_categories: Some(vec![AuthorCategory::MyTeam, AuthorCategory::Me]),
                statuses: Some(vec![Status::IsReadyToMerge]),
            },
            sorts: SortModifiers {
                column: SortColumn::Statuses,
                reverse: true,
            },
        };
        let update = PartialViewModifiers {
            filters: Some(target.filters.clone()),
            sorts: Some(target.sorts),
        };
        let built = build_query(&update, &existing);
        let text = built.to_string();
        assert!(
            text.starts_with("utm=abc&filter_authorCategories=myTeam&filter_authorCategories=me")
        );

        let back = extract_view_modifiers(&Query::parse(&text));
        assert_eq!(back.view_modifiers, target);
        assert_eq!(back.rest.to_string(), "utm=abc");
    }

    #[test]
    fn partial_update_keeps_existing_modifiers() {
        let existing =
            extract_view_modifiers(&Query::parse("sort_column=statuses&sort_reverse=true"));
        let built = build_query(
            &PartialViewModifiers::filters(FilterModifiers {
                author_categories: Some(vec![AuthorCategory::Contributors]),
                statuses: None,
            }),
            &existing,
        );
        let back = extract_view_modifiers(&built);
        assert_eq!(back.view_modifiers.sorts.column, SortColumn::Statuses);
        assert!(back.view_modifiers.sorts.reverse);
        assert_eq!(
            back.view_modifiers.filters.author_categories,
            Some(vec![AuthorCategory::Contributors])
        );
    }
}
