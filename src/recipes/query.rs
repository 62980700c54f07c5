use serde::Deserialize;

use crate::error::{ApiError, FieldError};

/// Raw query string, before any interpretation. Everything arrives as
/// optional text so malformed values can be reported per field instead of
/// bouncing off the deserializer.
#[derive(Debug, Default, Deserialize)]
pub struct RawListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    pub page: i64,
    pub limit: i64,
    pub search: Option<String>,
    pub category: Option<String>,
}

impl ListParams {
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

/// Upper bound for `page` and `limit`. Keeps `offset()` far away from i64
/// overflow: (MAX_PAGE_PARAM - 1) * MAX_PAGE_PARAM still fits comfortably.
const MAX_PAGE_PARAM: i64 = 1_000_000;

/// Absent or empty `page`/`limit` fall back to 1/10; anything present but
/// not a positive integer within bounds is a validation failure, never a
/// silent default. Empty `search`/`category` strings count as absent.
pub fn parse_params(raw: RawListParams) -> Result<ListParams, ApiError> {
    let mut details = Vec::new();
    let page = parse_positive("page", raw.page.as_deref(), 1, &mut details);
    let limit = parse_positive("limit", raw.limit.as_deref(), 10, &mut details);
    if !details.is_empty() {
        return Err(ApiError::validation("Invalid query parameters", details));
    }
    Ok(ListParams {
        page,
        limit,
        search: raw.search.filter(|s| !s.is_empty()),
        category: raw.category.filter(|s| !s.is_empty()),
    })
}

fn parse_positive(
    field: &str,
    raw: Option<&str>,
    default: i64,
    details: &mut Vec<FieldError>,
) -> i64 {
    match raw.map(str::trim) {
        None | Some("") => default,
        Some(s) => match s.parse::<i64>() {
            Ok(n) if (1..=MAX_PAGE_PARAM).contains(&n) => n,
            Ok(n) if n > MAX_PAGE_PARAM => {
                details.push(FieldError::new(
                    field,
                    format!("{field} must be at most {MAX_PAGE_PARAM}"),
                ));
                default
            }
            _ => {
                details.push(FieldError::new(
                    field,
                    format!("{field} must be a positive integer"),
                ));
                default
            }
        },
    }
}

/// `pages = ceil(total / limit)`; an empty result set has zero pages.
pub fn page_count(total: i64, limit: i64) -> i64 {
    if total == 0 {
        0
    } else {
        (total + limit - 1) / limit
    }
}

/// Escape `%`, `_` and `\` so a search term matches as a literal substring
/// under ILIKE (backslash is the default LIKE escape character).
pub fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(page: Option<&str>, limit: Option<&str>) -> RawListParams {
        RawListParams {
            page: page.map(String::from),
            limit: limit.map(String::from),
            search: None,
            category: None,
        }
    }

    #[test]
    fn absent_params_default_to_first_page_of_ten() {
        let p = parse_params(RawListParams::default()).expect("defaults are valid");
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, 10);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn empty_strings_count_as_absent() {
        let p = parse_params(raw(Some(""), Some("  "))).expect("empty is absent");
        assert_eq!((p.page, p.limit), (1, 10));
    }

    #[test]
    fn valid_params_are_taken_as_given() {
        let p = parse_params(raw(Some("3"), Some("25"))).expect("valid");
        assert_eq!((p.page, p.limit), (3, 25));
        assert_eq!(p.offset(), 50);
    }

    #[test]
    fn malformed_params_fail_per_field() {
        for bad in ["abc", "2.5", "0", "-1", "1e3"] {
            let err = parse_params(raw(Some(bad), None)).expect_err(bad);
            match err {
                ApiError::Validation { details, .. } => {
                    assert_eq!(details.len(), 1, "{bad}");
                    assert_eq!(details[0].field, "page", "{bad}");
                }
                other => panic!("expected validation error for {bad}, got {other:?}"),
            }
        }
    }

    #[test]
    fn huge_params_are_rejected_instead_of_overflowing_the_offset() {
        let max = i64::MAX.to_string();
        let err = parse_params(raw(Some(&max), Some(&max))).expect_err("out of bounds");
        let ApiError::Validation { details, .. } = err else {
            panic!("expected validation error");
        };
        let fields: Vec<_> = details.iter().map(|d| d.field.as_str()).collect();
        assert_eq!(fields, vec!["page", "limit"]);

        // The largest accepted combination still computes a valid offset.
        let bound = MAX_PAGE_PARAM.to_string();
        let p = parse_params(raw(Some(&bound), Some(&bound))).expect("bound is accepted");
        assert_eq!(p.offset(), (MAX_PAGE_PARAM - 1) * MAX_PAGE_PARAM);
    }

    #[test]
    fn both_bad_params_are_reported_together() {
        let err = parse_params(raw(Some("x"), Some("y"))).expect_err("both bad");
        let ApiError::Validation { details, .. } = err else {
            panic!("expected validation error");
        };
        let fields: Vec<_> = details.iter().map(|d| d.field.as_str()).collect();
        assert_eq!(fields, vec!["page", "limit"]);
    }

    #[test]
    fn empty_search_and_category_are_dropped() {
        let p = parse_params(RawListParams {
            search: Some(String::new()),
            category: Some("Dinner".into()),
            ..RawListParams::default()
        })
        .expect("valid");
        assert_eq!(p.search, None);
        assert_eq!(p.category.as_deref(), Some("Dinner"));
    }

    #[test]
    fn page_count_is_ceiling_division() {
        assert_eq!(page_count(0, 10), 0);
        assert_eq!(page_count(1, 10), 1);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(11, 10), 2);
        assert_eq!(page_count(9, 9), 1);
        assert_eq!(page_count(100, 7), 15);
    }

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("50%"), r"50\%");
        assert_eq!(escape_like("a_b"), r"a\_b");
        assert_eq!(escape_like(r"back\slash"), r"back\\slash");
    }
}
