//! Reporting query composer.
//!
//! Builds one filtered, sorted, paginated SELECT over a whitelisted category
//! table. Filter dimensions only apply where they are semantically defined;
//! anything else is silently ignored. Sort columns are validated against a
//! fixed per-category whitelist and LIMIT/OFFSET are bound parameters —
//! nothing user-controlled is ever interpolated into SQL text.

pub mod handlers;

use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// A composed query plus its bound parameters.
#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<Value>,
}

/// Raw query-string input. Numeric fields arrive as strings so malformed
/// values produce our validation error rather than a framework rejection.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ReportParams {
    pub category: Option<String>,
    pub keyword: Option<String>,
    pub trl_min: Option<String>,
    pub trl_max: Option<String>,
    pub budget_min: Option<String>,
    pub budget_max: Option<String>,
    pub tech_stack: Option<String>,
    pub status: Option<String>,
    pub year: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug)]
struct CategorySpec {
    name: &'static str,
    table: &'static str,
    sortable: &'static [&'static str],
    keyword_columns: &'static [&'static str],
    has_trl: bool,
    has_budget: bool,
    has_status: bool,
    has_tech_stack: bool,
    /// SQL expression a `year` filter compares against, where defined
    year_expr: Option<&'static str>,
}

static CATEGORIES: &[CategorySpec] = &[
    CategorySpec {
        name: "technologies",
        table: "technologies",
        sortable: &["id", "name", "budget", "trl_achieved", "production_start_date", "status"],
        keyword_columns: &["name", "description", "salient_features", "achievements"],
        has_trl: true,
        has_budget: true,
        has_status: true,
        has_tech_stack: true,
        year_expr: None,
    },
    CategorySpec {
        name: "projects",
        table: "projects",
        sortable: &["id", "name", "budget", "start_date", "end_date"],
        keyword_columns: &["name", "description"],
        has_trl: false,
        has_budget: true,
        has_status: false,
        has_tech_stack: false,
        year_expr: None,
    },
    CategorySpec {
        name: "patents",
        table: "patents",
        sortable: &["id", "title", "date_filed", "date_granted"],
        keyword_columns: &["title", "patent_number"],
        has_trl: false,
        has_budget: false,
        has_status: false,
        has_tech_stack: false,
        year_expr: Some("EXTRACT(YEAR FROM \"date_filed\")"),
    },
    CategorySpec {
        name: "publications",
        table: "publications",
        sortable: &["id", "title", "year", "journal"],
        keyword_columns: &["title", "authors", "journal"],
        has_trl: false,
        has_budget: false,
        has_status: false,
        has_tech_stack: false,
        year_expr: Some("\"year\""),
    },
    CategorySpec {
        name: "versions",
        table: "versions",
        sortable: &["id", "tech_id", "version_name", "release_date"],
        keyword_columns: &["version_name", "changes"],
        has_trl: false,
        has_budget: false,
        has_status: true,
        has_tech_stack: false,
        year_expr: Some("EXTRACT(YEAR FROM \"release_date\")"),
    },
];

/// A composed report: the SQL to run plus the echoed paging values.
#[derive(Debug)]
pub struct Report {
    pub sql: SqlResult,
    pub category: &'static str,
    pub page: i64,
    pub limit: i64,
}

pub fn compose(params: &ReportParams) -> Result<Report, ApiError> {
    // Unrecognized categories intentionally fall back to technologies.
    let category = params
        .category
        .as_deref()
        .and_then(|name| CATEGORIES.iter().find(|c| c.name == name))
        .unwrap_or(&CATEGORIES[0]);

    let mut conditions: Vec<String> = Vec::new();
    let mut bound: Vec<Value> = Vec::new();

    fn push_param(bound: &mut Vec<Value>, value: Value) -> String {
        bound.push(value);
        format!("${}", bound.len())
    }

    if category.has_trl {
        if let Some(min) = parse_int(&params.trl_min, "trl_min")? {
            let p = push_param(&mut bound, Value::from(min));
            conditions.push(format!("\"trl_achieved\" >= {}", p));
        }
        if let Some(max) = parse_int(&params.trl_max, "trl_max")? {
            let p = push_param(&mut bound, Value::from(max));
            conditions.push(format!("\"trl_achieved\" <= {}", p));
        }
    }

    if category.has_budget {
        if let Some(min) = parse_number(&params.budget_min, "budget_min")? {
            let p = push_param(&mut bound, Value::from(min));
            conditions.push(format!("\"budget\" >= {}", p));
        }
        if let Some(max) = parse_number(&params.budget_max, "budget_max")? {
            let p = push_param(&mut bound, Value::from(max));
            conditions.push(format!("\"budget\" <= {}", p));
        }
    }

    if category.has_status {
        if let Some(status) = non_empty(&params.status) {
            let p = push_param(&mut bound, Value::from(status));
            conditions.push(format!("\"status\" = {}", p));
        }
    }

    if category.has_tech_stack {
        if let Some(stack) = non_empty(&params.tech_stack) {
            let p = push_param(&mut bound, Value::from(format!("%{}%", stack)));
            conditions.push(format!("\"tech_stack\" ILIKE {}", p));
        }
    }

    if let Some(year_expr) = category.year_expr {
        if let Some(year) = parse_int(&params.year, "year")? {
            let p = push_param(&mut bound, Value::from(year));
            conditions.push(format!("{} = {}", year_expr, p));
        }
    }

    if let Some(keyword) = non_empty(&params.keyword) {
        // One bound pattern reused across every keyword column.
        let p = push_param(&mut bound, Value::from(format!("%{}%", keyword)));
        let ors: Vec<String> = category
            .keyword_columns
            .iter()
            .map(|column| format!("\"{}\" ILIKE {}", column, p))
            .collect();
        conditions.push(format!("({})", ors.join(" OR ")));
    }

    // Sort column must come from the whitelist; anything else falls back to
    // the primary key rather than reaching the SQL text.
    let sort_column = params
        .sort_by
        .as_deref()
        .filter(|requested| category.sortable.contains(requested))
        .unwrap_or("id");
    let direction = match params.order.as_deref() {
        Some("desc") | Some("DESC") => "DESC",
        _ => "ASC",
    };

    let page = parse_int(&params.page, "page")?.unwrap_or(1).max(1);
    let limit = parse_int(&params.limit, "limit")?
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    // Saturate: a huge page value means an offset past the table's end, not
    // a wrapped-negative OFFSET.
    let offset = (page - 1).saturating_mul(limit);

    let limit_param = push_param(&mut bound, Value::from(limit));
    let offset_param = push_param(&mut bound, Value::from(offset));

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    let query = format!(
        "SELECT row_to_json(t) AS row FROM (\
         SELECT * FROM \"{}\"{} ORDER BY \"{}\" {} LIMIT {} OFFSET {}) t",
        category.table, where_clause, sort_column, direction, limit_param, offset_param
    );

    Ok(Report {
        sql: SqlResult {
            query,
            params: bound,
        },
        category: category.name,
        page,
        limit,
    })
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_int(value: &Option<String>, name: &str) -> Result<Option<i64>, ApiError> {
    match non_empty(value) {
        Some(raw) => raw
            .parse::<i64>()
            .map(Some)
            .map_err(|_| ApiError::validation(format!("query parameter '{}' must be an integer", name))),
        None => Ok(None),
    }
}

fn parse_number(value: &Option<String>, name: &str) -> Result<Option<f64>, ApiError> {
    match non_empty(value) {
        Some(raw) => raw
            .parse::<f64>()
            .map(Some)
            .map_err(|_| ApiError::validation(format!("query parameter '{}' must be a number", name))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> ReportParams {
        let mut p = ReportParams::default();
        for (key, value) in pairs {
            let v = Some(value.to_string());
            match *key {
                "category" => p.category = v,
                "keyword" => p.keyword = v,
                "trl_min" => p.trl_min = v,
                "trl_max" => p.trl_max = v,
                "budget_min" => p.budget_min = v,
                "budget_max" => p.budget_max = v,
                "tech_stack" => p.tech_stack = v,
                "status" => p.status = v,
                "year" => p.year = v,
                "sort_by" => p.sort_by = v,
                "order" => p.order = v,
                "page" => p.page = v,
                "limit" => p.limit = v,
                other => panic!("unknown param {}", other),
            }
        }
        p
    }

    #[test]
    fn unknown_category_defaults_to_technologies() {
        let report = compose(&params(&[("category", "satellites")])).unwrap();
        assert_eq!(report.category, "technologies");
        assert!(report.sql.query.contains("FROM \"technologies\""));
    }

    #[test]
    fn pagination_is_bound_not_interpolated() {
        let report = compose(&params(&[("category", "technologies"), ("page", "2"), ("limit", "10")])).unwrap();
        assert_eq!(report.page, 2);
        assert_eq!(report.limit, 10);
        // Last two params are limit then offset = (page-1)*limit.
        assert!(report.sql.query.contains("LIMIT $1 OFFSET $2"));
        assert_eq!(report.sql.params, vec![json!(10), json!(10)]);
    }

    #[test]
    fn trl_filter_applies_only_to_technologies() {
        let report = compose(&params(&[("category", "technologies"), ("trl_min", "5")])).unwrap();
        assert!(report.sql.query.contains("\"trl_achieved\" >= $1"));

        // Silently ignored on patents, never rejected.
        let report = compose(&params(&[("category", "patents"), ("trl_min", "5")])).unwrap();
        assert!(!report.sql.query.contains("trl_achieved"));
        assert_eq!(report.sql.params.len(), 2); // limit + offset only
    }

    #[test]
    fn keyword_ors_across_text_columns_with_one_bound_pattern() {
        let report = compose(&params(&[("category", "publications"), ("keyword", "plasma")])).unwrap();
        assert!(report
            .sql
            .query
            .contains("(\"title\" ILIKE $1 OR \"authors\" ILIKE $1 OR \"journal\" ILIKE $1)"));
        assert_eq!(report.sql.params[0], json!("%plasma%"));
    }

    #[test]
    fn sort_by_outside_whitelist_falls_back_to_primary_key() {
        let report = compose(&params(&[
            ("category", "projects"),
            ("sort_by", "name; DROP TABLE projects"),
            ("order", "desc"),
        ]))
        .unwrap();
        assert!(report.sql.query.contains("ORDER BY \"id\" DESC"));

        let report = compose(&params(&[("category", "projects"), ("sort_by", "budget")])).unwrap();
        assert!(report.sql.query.contains("ORDER BY \"budget\" ASC"));
    }

    #[test]
    fn year_filter_uses_the_category_expression() {
        let report = compose(&params(&[("category", "patents"), ("year", "2023")])).unwrap();
        assert!(report
            .sql
            .query
            .contains("EXTRACT(YEAR FROM \"date_filed\") = $1"));

        let report = compose(&params(&[("category", "publications"), ("year", "2023")])).unwrap();
        assert!(report.sql.query.contains("\"year\" = $1"));

        // No year semantics on projects: ignored.
        let report = compose(&params(&[("category", "projects"), ("year", "2023")])).unwrap();
        assert_eq!(report.sql.params.len(), 2);
    }

    #[test]
    fn malformed_numeric_filter_is_a_validation_error() {
        let err = compose(&params(&[("category", "technologies"), ("trl_min", "high")])).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn limit_is_clamped_and_page_floors_at_one() {
        let report = compose(&params(&[("page", "0"), ("limit", "5000")])).unwrap();
        assert_eq!(report.page, 1);
        assert_eq!(report.limit, MAX_PAGE_SIZE);
        assert_eq!(report.sql.params, vec![json!(MAX_PAGE_SIZE), json!(0)]);
    }

    #[test]
    fn huge_page_saturates_the_offset_instead_of_overflowing() {
        let report = compose(&params(&[
            ("page", &i64::MAX.to_string()),
            ("limit", "100"),
        ]))
        .unwrap();
        // Offset past the end of any table, but still a valid non-negative bind.
        assert_eq!(report.sql.params, vec![json!(100), json!(i64::MAX)]);
    }

    #[test]
    fn filters_compose_with_and() {
        let report = compose(&params(&[
            ("category", "technologies"),
            ("status", "In Use"),
            ("budget_min", "1000"),
            ("keyword", "radar"),
        ]))
        .unwrap();
        assert!(report.sql.query.contains("\"budget\" >= $1"));
        assert!(report.sql.query.contains("\"status\" = $2"));
        assert!(report.sql.query.contains("\"name\" ILIKE $3"));
        assert!(report.sql.query.contains(" AND "));
    }
}
