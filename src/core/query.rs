//! Query parameters: filtering, ordering and pagination
//!
//! Parameters arrive as a flat query-string map:
//!
//! ```text
//! GET /binset/?page=2&page_size=10
//! GET /binset/?ordering=-create_time,id
//! GET /binset/?bin_name__icontains=a&id__gte=10&bin_size=S1
//! ```

use crate::config::ListConfig;
use crate::core::error::{ApiError, ValidationError};
use crate::core::field::{FieldKind, FieldValue, Filterable};
use serde::Serialize;
use std::cmp::Ordering as CmpOrdering;
use std::collections::HashMap;

const PAGE_PARAM: &str = "page";
const PAGE_SIZE_PARAM: &str = "page_size";
const ORDERING_PARAM: &str = "ordering";

/// Filter lookup applied to a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Exact,
    IExact,
    Contains,
    IContains,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
}

impl Lookup {
    fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "exact" => Lookup::Exact,
            "iexact" => Lookup::IExact,
            "contains" => Lookup::Contains,
            "icontains" => Lookup::IContains,
            "gt" => Lookup::Gt,
            "gte" => Lookup::Gte,
            "lt" => Lookup::Lt,
            "lte" => Lookup::Lte,
            "in" => Lookup::In,
            _ => return None,
        })
    }

    fn is_textual(self) -> bool {
        matches!(self, Lookup::IExact | Lookup::Contains | Lookup::IContains)
    }
}

/// A single parsed filter, e.g. `id__gte=10`
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub lookup: Lookup,
    pub operands: Vec<FieldValue>,
}

impl FieldFilter {
    fn parse(field: &str, lookup: Lookup, kind: FieldKind, raw: &str) -> Result<Self, String> {
        if lookup.is_textual() && kind != FieldKind::String {
            return Err("Lookup is only supported on text fields.".to_string());
        }

        let operands = if lookup == Lookup::In {
            raw.split(',')
                .filter(|s| !s.is_empty())
                .map(|s| kind.parse(s))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            vec![kind.parse(raw)?]
        };

        Ok(Self {
            field: field.to_string(),
            lookup,
            operands,
        })
    }

    /// Check whether a record passes this filter
    pub fn matches<T: Filterable>(&self, item: &T) -> bool {
        let Some(value) = item.field_value(&self.field) else {
            return false;
        };
        let Some(operand) = self.operands.first() else {
            // `in` with an empty list matches nothing
            return false;
        };

        match self.lookup {
            Lookup::Exact => &value == operand,
            Lookup::In => self.operands.contains(&value),
            Lookup::IExact => text_pair(&value, operand)
                .is_some_and(|(v, o)| v.to_lowercase() == o.to_lowercase()),
            Lookup::Contains => text_pair(&value, operand).is_some_and(|(v, o)| v.contains(o)),
            Lookup::IContains => text_pair(&value, operand)
                .is_some_and(|(v, o)| v.to_lowercase().contains(&o.to_lowercase())),
            Lookup::Gt => value.compare(operand) == Some(CmpOrdering::Greater),
            Lookup::Gte => matches!(
                value.compare(operand),
                Some(CmpOrdering::Greater | CmpOrdering::Equal)
            ),
            Lookup::Lt => value.compare(operand) == Some(CmpOrdering::Less),
            Lookup::Lte => matches!(
                value.compare(operand),
                Some(CmpOrdering::Less | CmpOrdering::Equal)
            ),
        }
    }
}

fn text_pair<'a>(value: &'a FieldValue, operand: &'a FieldValue) -> Option<(&'a str, &'a str)> {
    Some((value.as_string()?, operand.as_string()?))
}

/// Ordering keys, applied left to right
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ordering {
    keys: Vec<(String, bool)>,
}

impl Ordering {
    /// Parse `a,-b`, dropping fields that are not orderable.
    ///
    /// Falls back to `default_ordering` when nothing usable remains.
    pub fn parse(raw: Option<&str>, config: &ListConfig) -> Self {
        let parse_keys = |raw: &str| -> Vec<(String, bool)> {
            raw.split(',')
                .map(str::trim)
                .filter_map(|term| {
                    let (field, descending) = match term.strip_prefix('-') {
                        Some(field) => (field, true),
                        None => (term, false),
                    };
                    config
                        .is_orderable(field)
                        .then(|| (field.to_string(), descending))
                })
                .collect()
        };

        let keys = raw.map(parse_keys).unwrap_or_default();
        if keys.is_empty() {
            // The default is trusted configuration, not client input.
            let keys = config
                .default_ordering
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(|t| match t.strip_prefix('-') {
                    Some(field) => (field.to_string(), true),
                    None => (t.to_string(), false),
                })
                .collect();
            return Self { keys };
        }
        Self { keys }
    }

    pub fn keys(&self) -> &[(String, bool)] {
        &self.keys
    }

    /// Stable sort by the ordering keys
    pub fn sort<T: Filterable>(&self, items: &mut [T]) {
        items.sort_by(|a, b| {
            for (field, descending) in &self.keys {
                let ord = match (a.field_value(field), b.field_value(field)) {
                    (Some(x), Some(y)) => x.compare(&y).unwrap_or(CmpOrdering::Equal),
                    _ => CmpOrdering::Equal,
                };
                let ord = if *descending { ord.reverse() } else { ord };
                if ord != CmpOrdering::Equal {
                    return ord;
                }
            }
            CmpOrdering::Equal
        });
    }
}

/// One page of results
#[derive(Debug, Serialize)]
pub struct Page<T> {
    /// Total number of matching rows
    pub count: usize,

    /// Next page number, if any
    pub next: Option<usize>,

    /// Previous page number, if any
    pub previous: Option<usize>,

    pub results: Vec<T>,
}

/// Requested page and page size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub page_size: usize,
}

impl PageRequest {
    /// Parse `page` / `page_size`.
    ///
    /// A malformed `page` is an invalid page; a malformed `page_size` falls
    /// back to the configured default.
    pub fn parse(
        page: Option<&str>,
        page_size: Option<&str>,
        config: &ListConfig,
    ) -> Result<Self, ApiError> {
        let page = match page {
            None => 1,
            Some(raw) => match raw.trim() {
                "last" => usize::MAX,
                raw => raw.parse::<usize>().map_err(|_| ApiError::InvalidPage)?,
            },
        };
        let page_size = page_size
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .filter(|size| *size > 0)
            .map(|size| size.min(config.max_page_size))
            .unwrap_or(config.page_size)
            .max(1);

        Ok(Self { page, page_size })
    }

    /// Slice `items` into the requested page
    pub fn paginate<T>(self, items: Vec<T>) -> Result<Page<T>, ApiError> {
        let count = items.len();
        let total_pages = count.div_ceil(self.page_size).max(1);
        let page = if self.page == usize::MAX {
            total_pages
        } else {
            self.page
        };

        if page == 0 || page > total_pages {
            return Err(ApiError::InvalidPage);
        }

        let results = items
            .into_iter()
            .skip((page - 1) * self.page_size)
            .take(self.page_size)
            .collect();

        Ok(Page {
            count,
            next: (page < total_pages).then_some(page + 1),
            previous: (page > 1).then(|| page - 1),
            results,
        })
    }
}

/// A fully parsed list request
#[derive(Debug, Clone)]
pub struct ListQuery {
    pub filters: Vec<FieldFilter>,
    pub ordering: Ordering,
    pub page: PageRequest,
}

impl ListQuery {
    /// Parse query-string parameters for records of type `T`.
    ///
    /// Parameters naming fields outside `filter_fields` are ignored.
    pub fn parse<T: Filterable>(
        params: &HashMap<String, String>,
        config: &ListConfig,
    ) -> Result<Self, ApiError> {
        let page = PageRequest::parse(
            params.get(PAGE_PARAM).map(String::as_str),
            params.get(PAGE_SIZE_PARAM).map(String::as_str),
            config,
        )?;
        let ordering = Ordering::parse(params.get(ORDERING_PARAM).map(String::as_str), config);

        let mut filters = Vec::new();
        let mut errors = std::collections::BTreeMap::new();

        for (key, raw) in params {
            let (field, lookup) = match key.split_once("__") {
                Some((field, lookup)) => match Lookup::parse(lookup) {
                    Some(lookup) => (field, lookup),
                    None => continue,
                },
                None => (key.as_str(), Lookup::Exact),
            };
            if !config.is_filterable(field) {
                continue;
            }
            let Some(kind) = T::field_kind(field) else {
                continue;
            };

            match FieldFilter::parse(field, lookup, kind, raw) {
                Ok(filter) => filters.push(filter),
                Err(message) => {
                    errors.entry(key.clone()).or_insert_with(Vec::new).push(message);
                }
            }
        }

        if !errors.is_empty() {
            return Err(ValidationError::FieldErrors(errors).into());
        }

        Ok(Self {
            filters,
            ordering,
            page,
        })
    }

    /// Filter, order and paginate
    pub fn apply<T: Filterable>(&self, mut items: Vec<T>) -> Result<Page<T>, ApiError> {
        items.retain(|item| self.filters.iter().all(|f| f.matches(item)));
        self.ordering.sort(&mut items);
        self.page.paginate(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: i64,
        name: String,
        flag: bool,
    }

    impl Filterable for Row {
        fn field_kind(field: &str) -> Option<FieldKind> {
            match field {
                "id" => Some(FieldKind::Integer),
                "bin_name" => Some(FieldKind::String),
                "is_delete" => Some(FieldKind::Boolean),
                _ => None,
            }
        }

        fn field_value(&self, field: &str) -> Option<FieldValue> {
            match field {
                "id" => Some(FieldValue::Integer(self.id)),
                "bin_name" => Some(FieldValue::String(self.name.clone())),
                "is_delete" => Some(FieldValue::Boolean(self.flag)),
                _ => None,
            }
        }
    }

    fn rows() -> Vec<Row> {
        ["alpha", "Beta", "gamma", "delta"]
            .iter()
            .enumerate()
            .map(|(i, name)| Row {
                id: i as i64 + 1,
                name: name.to_string(),
                flag: i % 2 == 0,
            })
            .collect()
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_default_ordering_is_descending_id() {
        let query = ListQuery::parse::<Row>(&HashMap::new(), &ListConfig::default()).unwrap();
        let page = query.apply(rows()).unwrap();

        let ids: Vec<i64> = page.results.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![4, 3, 2, 1]);
        assert_eq!(page.count, 4);
        assert_eq!(page.next, None);
        assert_eq!(page.previous, None);
    }

    #[test]
    fn test_unknown_ordering_field_falls_back() {
        let config = ListConfig::default();
        let ordering = Ordering::parse(Some("bin_name"), &config);
        assert_eq!(ordering.keys(), &[("id".to_string(), true)]);

        let ordering = Ordering::parse(Some("bin_name,id"), &config);
        assert_eq!(ordering.keys(), &[("id".to_string(), false)]);
    }

    #[test]
    fn test_icontains_and_range_filters() {
        let query = ListQuery::parse::<Row>(
            &params(&[("bin_name__icontains", "A"), ("id__gte", "2"), ("ordering", "id")]),
            &ListConfig::default(),
        )
        .unwrap();
        let page = query.apply(rows()).unwrap();

        let names: Vec<&str> = page.results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Beta", "gamma", "delta"]);
    }

    #[test]
    fn test_in_lookup() {
        let query = ListQuery::parse::<Row>(
            &params(&[("id__in", "1,3"), ("ordering", "id")]),
            &ListConfig::default(),
        )
        .unwrap();
        let ids: Vec<i64> = query.apply(rows()).unwrap().results.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_bad_filter_value_is_field_error() {
        let err = ListQuery::parse::<Row>(&params(&[("id", "abc")]), &ListConfig::default())
            .unwrap_err();
        match err {
            ApiError::Validation(ValidationError::FieldErrors(fields)) => {
                assert!(fields.contains_key("id"));
            }
            other => panic!("expected field errors, got {:?}", other),
        }
    }

    #[test]
    fn test_textual_lookup_on_integer_rejected() {
        let err = ListQuery::parse::<Row>(&params(&[("id__contains", "1")]), &ListConfig::default())
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn test_undeclared_fields_ignored() {
        let query = ListQuery::parse::<Row>(
            &params(&[("openid", "someone"), ("lang", "zh-hans")]),
            &ListConfig::default(),
        )
        .unwrap();
        assert!(query.filters.is_empty());
    }

    #[test]
    fn test_pagination_pages() {
        let config = ListConfig {
            page_size: 3,
            ..ListConfig::default()
        };
        let first = PageRequest::parse(None, None, &config).unwrap();
        let page = first.paginate(rows()).unwrap();
        assert_eq!(page.results.len(), 3);
        assert_eq!(page.next, Some(2));

        let second = PageRequest::parse(Some("2"), None, &config).unwrap();
        let page = second.paginate(rows()).unwrap();
        assert_eq!(page.results.len(), 1);
        assert_eq!(page.previous, Some(1));
        assert_eq!(page.next, None);

        let last = PageRequest::parse(Some("last"), None, &config).unwrap();
        assert_eq!(last.paginate(rows()).unwrap().previous, Some(1));
    }

    #[test]
    fn test_out_of_range_page_is_invalid() {
        let config = ListConfig::default();
        let req = PageRequest::parse(Some("5"), None, &config).unwrap();
        assert!(matches!(req.paginate(rows()), Err(ApiError::InvalidPage)));

        assert!(matches!(
            PageRequest::parse(Some("x"), None, &config),
            Err(ApiError::InvalidPage)
        ));
    }

    #[test]
    fn test_empty_first_page_is_valid() {
        let req = PageRequest::parse(None, None, &ListConfig::default()).unwrap();
        let page = req.paginate(Vec::<Row>::new()).unwrap();
        assert_eq!(page.count, 0);
        assert!(page.results.is_empty());
    }

    #[test]
    fn test_page_size_clamped() {
        let config = ListConfig {
            max_page_size: 2,
            ..ListConfig::default()
        };
        let req = PageRequest::parse(None, Some("50"), &config).unwrap();
        assert_eq!(req.page_size, 2);

        let req = PageRequest::parse(None, Some("zero"), &config).unwrap();
        assert_eq!(req.page_size, config.page_size);
    }

    #[test]
    fn test_unvalidated_zero_sizes_still_paginate() {
        let config = ListConfig {
            page_size: 0,
            max_page_size: 0,
            ..ListConfig::default()
        };
        let req = PageRequest::parse(None, Some("5"), &config).unwrap();
        assert_eq!(req.page_size, 1);

        let req = PageRequest::parse(None, None, &config).unwrap();
        assert_eq!(req.page_size, 1);

        let page = req.paginate(vec![1, 2, 3]).unwrap();
        assert_eq!(page.count, 3);
        assert_eq!(page.results, vec![1]);
        assert_eq!(page.next, Some(2));
    }
}
