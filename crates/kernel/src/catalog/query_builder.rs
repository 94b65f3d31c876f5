//! Catalog query builder using SeaQuery.
//!
//! A search is a fixed base (tables, joins, base predicate) plus one named
//! predicate per present filter. The count and page statements are built from
//! the same predicate list, so they always agree on which rows match.
//! Placeholders are numbered by SeaQuery when the statement is rendered.

use sea_query::{
    Alias, Asterisk, Expr, JoinType, Order, PostgresQueryBuilder, Query, SelectStatement,
    SimpleExpr, Values,
};

use super::types::{MaterialFilters, PageRequest, TeacherFilters};
use crate::models::{MaterialStatus, Role};

const MATERIALS: &str = "m";
const USERS: &str = "u";
const RATINGS: &str = "r";
const TEACHER_STATS: &str = "s";

/// Parameterized SQL text and its values in placeholder order.
#[derive(Debug, Clone)]
pub struct Statement {
    pub sql: String,
    pub values: Values,
}

impl Statement {
    pub fn render(query: &SelectStatement) -> Self {
        let (sql, values) = query.build(PostgresQueryBuilder);
        Self { sql, values }
    }
}

/// A WHERE fragment contributed by one filter.
#[derive(Debug, Clone)]
pub struct Predicate {
    pub name: &'static str,
    pub expr: SimpleExpr,
}

/// Conjunction of named predicates.
#[derive(Debug, Clone, Default)]
pub struct PredicateSet {
    predicates: Vec<Predicate>,
}

impl PredicateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a predicate.
    pub fn push(&mut self, name: &'static str, expr: impl Into<SimpleExpr>) {
        self.predicates.push(Predicate {
            name,
            expr: expr.into(),
        });
    }

    /// Append a predicate built from `value` when it is present.
    pub fn push_some<T>(
        &mut self,
        name: &'static str,
        value: Option<T>,
        build: impl FnOnce(T) -> SimpleExpr,
    ) {
        if let Some(value) = value {
            self.push(name, build(value));
        }
    }

    /// Names of the predicates, in the order they were added.
    pub fn names(&self) -> Vec<&'static str> {
        self.predicates.iter().map(|p| p.name).collect()
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// AND every predicate into the query's WHERE clause.
    pub fn apply(&self, query: &mut SelectStatement) {
        for predicate in &self.predicates {
            query.and_where(predicate.expr.clone());
        }
    }
}

/// Add LIMIT/OFFSET for the requested window. Nothing is added for limit 0.
pub fn apply_window(query: &mut SelectStatement, page: &PageRequest) {
    if let Some(limit) = page.sql_limit() {
        query.limit(limit);
    }
    if let Some(offset) = page.sql_offset() {
        query.offset(offset);
    }
}

/// `table.column` expression.
pub fn col(table: &str, column: &str) -> Expr {
    Expr::col((Alias::new(table), Alias::new(column)))
}

/// `%text%` pattern with LIKE wildcards in `text` escaped.
pub fn contains_pattern(text: &str) -> String {
    format!("%{}%", escape_like_wildcards(text))
}

/// Escape SQL LIKE wildcard characters (`%`, `_`, `\`) in a value.
fn escape_like_wildcards(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Count/page statements for published material search.
pub struct MaterialSearchQuery {
    predicates: PredicateSet,
    page: PageRequest,
}

impl MaterialSearchQuery {
    pub fn new(filters: &MaterialFilters, page: PageRequest) -> Self {
        let mut predicates = PredicateSet::new();

        predicates.push(
            "published",
            col(MATERIALS, "status").eq(MaterialStatus::Published.as_str()),
        );
        predicates.push_some("search", filters.search(), |text| {
            Expr::cust_with_values(
                "(m.title ILIKE $1 OR u.full_name ILIKE $1)",
                [contains_pattern(text)],
            )
        });
        predicates.push_some("subject", filters.subject(), |subject| {
            col(MATERIALS, "subject_id").eq(subject)
        });
        predicates.push_some("level", filters.level(), |level| {
            col(MATERIALS, "level").eq(level)
        });

        Self { predicates, page }
    }

    pub fn predicate_names(&self) -> Vec<&'static str> {
        self.predicates.names()
    }

    /// Tables, joins and predicates shared by both statements.
    fn base(&self) -> SelectStatement {
        let mut query = Query::select();
        query.from_as(Alias::new("materials"), Alias::new(MATERIALS));
        query.join_as(
            JoinType::InnerJoin,
            Alias::new("users"),
            Alias::new(USERS),
            col(USERS, "id").equals((Alias::new(MATERIALS), Alias::new("author_id"))),
        );
        self.predicates.apply(&mut query);
        query
    }

    /// COUNT(*) over the filtered set, no ordering or window.
    pub fn build_count(&self) -> Statement {
        let mut query = self.base();
        query.expr(Expr::col(Asterisk).count());
        Statement::render(&query)
    }

    /// Sorted, windowed page of the filtered set.
    pub fn build(&self) -> Statement {
        let mut query = self.base();

        query
            .column((Alias::new(MATERIALS), Alias::new("id")))
            .column((Alias::new(MATERIALS), Alias::new("title")))
            .expr_as(col(MATERIALS, "subject_id"), Alias::new("subject"))
            .column((Alias::new(MATERIALS), Alias::new("level")))
            .expr_as(col(USERS, "id"), Alias::new("author_id"))
            .expr_as(col(USERS, "full_name"), Alias::new("author_name"))
            .expr_as(
                Expr::cust("COALESCE(r.avg_rating, 0)::float8"),
                Alias::new("rating"),
            )
            .expr_as(
                Expr::cust("COALESCE(r.rating_count, 0)"),
                Alias::new("students_count"),
            );

        query.join_subquery(
            JoinType::LeftJoin,
            rating_aggregates(),
            Alias::new(RATINGS),
            col(RATINGS, "material_id").equals((Alias::new(MATERIALS), Alias::new("id"))),
        );

        query
            .order_by(Alias::new("rating"), Order::Desc)
            .order_by((Alias::new(MATERIALS), Alias::new("updated_at")), Order::Desc)
            .order_by((Alias::new(MATERIALS), Alias::new("id")), Order::Asc);

        apply_window(&mut query, &self.page);
        Statement::render(&query)
    }
}

/// Per-material rating mean and distinct rater count.
fn rating_aggregates() -> SelectStatement {
    Query::select()
        .column(Alias::new("material_id"))
        .expr_as(Expr::cust("AVG(rating)"), Alias::new("avg_rating"))
        .expr_as(Expr::cust("COUNT(DISTINCT user_id)"), Alias::new("rating_count"))
        .from(Alias::new("material_ratings"))
        .group_by_col(Alias::new("material_id"))
        .to_owned()
}

/// Per-author published material count and mean rating.
fn teacher_aggregates() -> SelectStatement {
    Query::select()
        .column((Alias::new(MATERIALS), Alias::new("author_id")))
        .expr_as(Expr::cust("COUNT(DISTINCT m.id)"), Alias::new("materials_count"))
        .expr_as(Expr::cust("AVG(mr.rating)"), Alias::new("avg_rating"))
        .from_as(Alias::new("materials"), Alias::new(MATERIALS))
        .join_as(
            JoinType::LeftJoin,
            Alias::new("material_ratings"),
            Alias::new("mr"),
            col("mr", "material_id").equals((Alias::new(MATERIALS), Alias::new("id"))),
        )
        .and_where(col(MATERIALS, "status").eq(MaterialStatus::Published.as_str()))
        .group_by_col((Alias::new(MATERIALS), Alias::new("author_id")))
        .to_owned()
}

/// Count/page statements for teacher search.
pub struct TeacherSearchQuery {
    predicates: PredicateSet,
    page: PageRequest,
}

impl TeacherSearchQuery {
    pub fn new(filters: &TeacherFilters, page: PageRequest) -> Self {
        let mut predicates = PredicateSet::new();

        predicates.push("teacher", col(USERS, "role").eq(Role::Teacher.as_str()));
        predicates.push_some("search", filters.search(), |text| {
            Expr::cust_with_values("u.full_name ILIKE $1", [contains_pattern(text)])
        });
        predicates.push_some("subject", filters.subject(), |subject| {
            Expr::cust_with_values(
                "EXISTS (SELECT 1 FROM teacher_specializations ts WHERE ts.user_id = u.id AND ts.subject = $1)",
                [subject.to_string()],
            )
        });

        Self { predicates, page }
    }

    pub fn predicate_names(&self) -> Vec<&'static str> {
        self.predicates.names()
    }

    fn base(&self) -> SelectStatement {
        let mut query = Query::select();
        query.from_as(Alias::new("users"), Alias::new(USERS));
        self.predicates.apply(&mut query);
        query
    }

    pub fn build_count(&self) -> Statement {
        let mut query = self.base();
        query.expr(Expr::col(Asterisk).count());
        Statement::render(&query)
    }

    pub fn build(&self) -> Statement {
        let mut query = self.base();

        query
            .column((Alias::new(USERS), Alias::new("id")))
            .column((Alias::new(USERS), Alias::new("full_name")))
            .column((Alias::new(USERS), Alias::new("avatar_url")))
            .expr_as(
                Expr::cust("COALESCE(s.materials_count, 0)"),
                Alias::new("materials_count"),
            )
            .expr_as(
                Expr::cust("COALESCE(s.avg_rating, 0)::float8"),
                Alias::new("rating"),
            );

        query.join_subquery(
            JoinType::LeftJoin,
            teacher_aggregates(),
            Alias::new(TEACHER_STATS),
            col(TEACHER_STATS, "author_id").equals((Alias::new(USERS), Alias::new("id"))),
        );

        query
            .order_by(Alias::new("rating"), Order::Desc)
            .order_by(Alias::new("materials_count"), Order::Desc)
            .order_by((Alias::new(USERS), Alias::new("id")), Order::Asc);

        apply_window(&mut query, &self.page);
        Statement::render(&query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_query::Value;

    fn material_filters(search: Option<&str>, subject: Option<&str>) -> MaterialFilters {
        MaterialFilters {
            search: search.map(str::to_string),
            subject: subject.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn absent_filters_emit_only_base_predicate() {
        let query = MaterialSearchQuery::new(&MaterialFilters::default(), PageRequest::default());
        assert_eq!(query.predicate_names(), vec!["published"]);

        let count = query.build_count();
        assert!(count.sql.contains("COUNT(*)"), "{}", count.sql);
        assert!(!count.sql.contains("ILIKE"), "{}", count.sql);
        assert!(!count.sql.contains("subject_id"), "{}", count.sql);
        assert!(!count.sql.contains("TRUE"), "no tautology: {}", count.sql);
        assert_eq!(count.values.0, vec![Value::from("published")]);
    }

    #[test]
    fn predicates_follow_present_filters() {
        let filters = MaterialFilters {
            search: Some("algebra".to_string()),
            subject: Some("math".to_string()),
            level: Some("beginner".to_string()),
            ..Default::default()
        };
        let query = MaterialSearchQuery::new(&filters, PageRequest::default());
        assert_eq!(
            query.predicate_names(),
            vec!["published", "search", "subject", "level"]
        );
    }

    #[test]
    fn search_binds_same_pattern_for_title_and_author() {
        let query = MaterialSearchQuery::new(
            &material_filters(Some("alg"), None),
            PageRequest::default(),
        );
        let count = query.build_count();

        assert!(count.sql.contains("m.title ILIKE"), "{}", count.sql);
        assert!(count.sql.contains("u.full_name ILIKE"), "{}", count.sql);
        assert_eq!(
            count.values.0,
            vec![
                Value::from("published"),
                Value::from("%alg%"),
                Value::from("%alg%"),
            ]
        );
    }

    #[test]
    fn count_and_page_share_filter_values() {
        let query = MaterialSearchQuery::new(
            &material_filters(Some("alg"), Some("math")),
            PageRequest::new(Some(3), Some(10)),
        );
        let count = query.build_count();
        let page = query.build();

        let shared = count.values.0.len();
        assert_eq!(&page.values.0[..shared], &count.values.0[..]);
        assert_eq!(
            &page.values.0[shared..],
            &[Value::from(10u64), Value::from(20u64)]
        );
    }

    #[test]
    fn page_statement_sorts_and_windows() {
        let query = MaterialSearchQuery::new(
            &MaterialFilters::default(),
            PageRequest::new(Some(2), Some(10)),
        );
        let page = query.build();

        assert!(page.sql.contains("ORDER BY"), "{}", page.sql);
        assert!(page.sql.contains("\"rating\" DESC"), "{}", page.sql);
        assert!(page.sql.contains("\"updated_at\" DESC"), "{}", page.sql);
        assert!(page.sql.contains("LIMIT"), "{}", page.sql);
        assert!(page.sql.contains("OFFSET"), "{}", page.sql);
        assert!(page.sql.contains("LEFT JOIN"), "{}", page.sql);
        assert!(page.sql.contains("material_ratings"), "{}", page.sql);
    }

    #[test]
    fn count_has_no_order_or_window() {
        let query = MaterialSearchQuery::new(
            &MaterialFilters::default(),
            PageRequest::new(Some(2), Some(10)),
        );
        let count = query.build_count();

        assert!(!count.sql.contains("ORDER BY"), "{}", count.sql);
        assert!(!count.sql.contains("LIMIT"), "{}", count.sql);
        assert!(!count.sql.contains("OFFSET"), "{}", count.sql);
    }

    #[test]
    fn zero_limit_emits_no_window() {
        let query = MaterialSearchQuery::new(
            &MaterialFilters::default(),
            PageRequest::new(Some(4), Some(0)),
        );
        let page = query.build();

        assert!(!page.sql.contains("LIMIT"), "{}", page.sql);
        assert!(!page.sql.contains("OFFSET"), "{}", page.sql);
        assert_eq!(page.values.0, vec![Value::from("published")]);
    }

    #[test]
    fn zero_page_emits_limit_without_offset() {
        let query = MaterialSearchQuery::new(
            &MaterialFilters::default(),
            PageRequest::new(Some(0), Some(5)),
        );
        let page = query.build();

        assert!(page.sql.contains("LIMIT"), "{}", page.sql);
        assert!(!page.sql.contains("OFFSET"), "{}", page.sql);
    }

    #[test]
    fn user_text_wildcards_are_escaped() {
        assert_eq!(contains_pattern("100%_done"), "%100\\%\\_done%");
        assert_eq!(escape_like_wildcards("a\\b"), "a\\\\b");
        assert_eq!(escape_like_wildcards("plain"), "plain");
    }

    #[test]
    fn teacher_query_filters() {
        let filters = TeacherFilters {
            search: Some("Maria".to_string()),
            subject: Some("physics".to_string()),
            ..Default::default()
        };
        let query = TeacherSearchQuery::new(&filters, PageRequest::default());
        assert_eq!(query.predicate_names(), vec!["teacher", "search", "subject"]);

        let count = query.build_count();
        assert!(count.sql.contains("EXISTS"), "{}", count.sql);
        assert!(count.sql.contains("teacher_specializations"), "{}", count.sql);
        assert_eq!(
            count.values.0,
            vec![
                Value::from("teacher"),
                Value::from("%Maria%"),
                Value::from("physics"),
            ]
        );
    }

    #[test]
    fn teacher_page_counts_only_published_materials() {
        let query = TeacherSearchQuery::new(&TeacherFilters::default(), PageRequest::default());
        let page = query.build();

        assert!(page.sql.contains("materials_count"), "{}", page.sql);
        assert!(page.values.0.contains(&Value::from("published")));
        assert!(page.values.0.contains(&Value::from("teacher")));
        assert!(page.sql.contains("LIMIT"), "{}", page.sql);
    }

    #[test]
    fn predicate_set_skips_absent_values() {
        let mut set = PredicateSet::new();
        set.push_some("subject", None::<&str>, |s| col("m", "subject_id").eq(s));
        assert!(set.is_empty());

        set.push_some("subject", Some("math"), |s| col("m", "subject_id").eq(s));
        assert_eq!(set.len(), 1);
        assert_eq!(set.names(), vec!["subject"]);
    }
}
