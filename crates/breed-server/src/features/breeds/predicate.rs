//! Predicate construction for breed queries
//!
//! Translates a [`BreedQuery`] into a `WHERE` clause template with positional
//! `$n` placeholders plus the ordered values to bind to them. Filter values
//! are carried separately from the template and never interpolated into it.
//!
//! Conditions are added in a fixed order (ids, short names, keyword) and
//! joined with `AND`. A query with no filters renders as `TRUE`.
//!
//! The keyword is always matched as a literal substring: `%`, `_` and `\`
//! are escaped before the pattern is built and the `LIKE` uses `ESCAPE '\'`.
//!
//! # Example
//!
//! ```
//! use breed_common::BreedQuery;
//! use breed_server::features::breeds::predicate::Predicate;
//!
//! let query = BreedQuery {
//!     ids: vec!["1".into(), "2".into()],
//!     keyword: "Poo".into(),
//!     ..Default::default()
//! };
//!
//! let fragment = Predicate::from_query(&query).render(1).unwrap();
//! assert_eq!(
//!     fragment.sql,
//!     r"id IN ($1, $2) AND (name_th LIKE $3 ESCAPE '\' OR name_en LIKE $4 ESCAPE '\')"
//! );
//! assert_eq!(fragment.params, vec!["1", "2", "%Poo%", "%Poo%"]);
//! ```

use breed_common::{Breed, BreedQuery};
use std::collections::HashSet;
use std::fmt::Write as _;
use thiserror::Error;

/// Upper bound on bind parameters in a single PostgreSQL statement
pub const MAX_BIND_PARAMETERS: usize = u16::MAX as usize;

/// Columns of the `breed` table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Id,
    NameTh,
    NameEn,
    ShortName,
    Remark,
}

impl Column {
    /// Projection returned for every matched row, in table order
    pub const PROJECTION: [Column; 5] = [
        Column::Id,
        Column::NameTh,
        Column::NameEn,
        Column::ShortName,
        Column::Remark,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::NameTh => "name_th",
            Column::NameEn => "name_en",
            Column::ShortName => "short_name",
            Column::Remark => "remark",
        }
    }

    fn value(self, breed: &Breed) -> Option<&str> {
        match self {
            Column::Id => Some(breed.id.as_str()),
            Column::NameTh => Some(breed.name_th.as_str()),
            Column::NameEn => Some(breed.name_en.as_str()),
            Column::ShortName => Some(breed.short_name.as_str()),
            Column::Remark => breed.remark.as_deref(),
        }
    }
}

/// One filter over the `breed` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// `column IN (values...)`
    In { column: Column, values: Vec<String> },

    /// Any of `columns` contains `needle` as a substring
    Contains { columns: Vec<Column>, needle: String },
}

impl Condition {
    fn parameter_count(&self) -> usize {
        match self {
            Condition::In { values, .. } => values.len(),
            Condition::Contains { columns, .. } => columns.len(),
        }
    }

    fn matches(&self, breed: &Breed) -> bool {
        match self {
            Condition::In { column, values } => {
                let value = column.value(breed);
                values.iter().any(|v| Some(v.as_str()) == value)
            },
            Condition::Contains { columns, needle } => columns
                .iter()
                .any(|c| c.value(breed).is_some_and(|v| v.contains(needle.as_str()))),
        }
    }

    fn render(&self, placeholders: &mut Placeholders, fragment: &mut SqlFragment) {
        match self {
            Condition::In { column, values } => {
                let _ = write!(fragment.sql, "{} IN (", column.as_str());
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        fragment.sql.push_str(", ");
                    }
                    placeholders.push(&mut fragment.sql);
                    fragment.params.push(value.clone());
                }
                fragment.sql.push(')');
            },
            Condition::Contains { columns, needle } => {
                let pattern = format!("%{}%", escape_like(needle));
                fragment.sql.push('(');
                for (i, column) in columns.iter().enumerate() {
                    if i > 0 {
                        fragment.sql.push_str(" OR ");
                    }
                    let _ = write!(fragment.sql, "{} LIKE ", column.as_str());
                    placeholders.push(&mut fragment.sql);
                    fragment.sql.push_str(r" ESCAPE '\'");
                    fragment.params.push(pattern.clone());
                }
                fragment.sql.push(')');
            },
        }
    }
}

/// Conjunction of conditions built from a [`BreedQuery`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicate {
    conditions: Vec<Condition>,
}

impl Predicate {
    pub fn from_query(query: &BreedQuery) -> Self {
        let mut conditions = Vec::with_capacity(3);

        if !query.ids.is_empty() {
            conditions.push(Condition::In {
                column: Column::Id,
                values: distinct(&query.ids),
            });
        }

        if !query.short_names.is_empty() {
            conditions.push(Condition::In {
                column: Column::ShortName,
                values: distinct(&query.short_names),
            });
        }

        if !query.keyword.is_empty() {
            conditions.push(Condition::Contains {
                columns: vec![Column::NameTh, Column::NameEn],
                needle: query.keyword.clone(),
            });
        }

        Self { conditions }
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// True when the predicate matches every row
    pub fn is_universal(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Number of values [`render`](Self::render) will bind
    pub fn parameter_count(&self) -> usize {
        self.conditions.iter().map(Condition::parameter_count).sum()
    }

    /// Render the template, numbering placeholders from `first_placeholder`
    ///
    /// `first_placeholder` lets the predicate follow other bound values in
    /// the same statement; pass `1` when it is the only one.
    pub fn render(&self, first_placeholder: usize) -> Result<SqlFragment, BuildError> {
        if first_placeholder == 0 {
            return Err(BuildError::InvalidPlaceholderStart);
        }

        let count = self.parameter_count();
        let highest = (first_placeholder - 1).saturating_add(count);
        if highest > MAX_BIND_PARAMETERS {
            return Err(BuildError::TooManyParameters {
                count: highest,
                limit: MAX_BIND_PARAMETERS,
            });
        }

        if self.is_universal() {
            return Ok(SqlFragment {
                sql: "TRUE".to_string(),
                params: Vec::new(),
            });
        }

        let mut placeholders = Placeholders {
            next: first_placeholder,
        };
        let mut fragment = SqlFragment {
            sql: String::new(),
            params: Vec::with_capacity(count),
        };

        for (i, condition) in self.conditions.iter().enumerate() {
            if i > 0 {
                fragment.sql.push_str(" AND ");
            }
            condition.render(&mut placeholders, &mut fragment);
        }

        Ok(fragment)
    }

    /// Evaluate the predicate against a breed held in memory
    pub fn matches(&self, breed: &Breed) -> bool {
        self.conditions.iter().all(|c| c.matches(breed))
    }
}

/// SQL template text and the values bound to its placeholders, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlFragment {
    pub sql: String,
    pub params: Vec<String>,
}

/// Failure to render a predicate
///
/// These are internal failures, never caused by filter content alone being
/// malformed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("Predicate needs {count} bind parameters, the limit is {limit}")]
    TooManyParameters { count: usize, limit: usize },

    #[error("Placeholder numbering must start at 1")]
    InvalidPlaceholderStart,
}

struct Placeholders {
    next: usize,
}

impl Placeholders {
    fn push(&mut self, sql: &mut String) {
        let _ = write!(sql, "${}", self.next);
        self.next += 1;
    }
}

/// Keep the first occurrence of each value
fn distinct(values: &[String]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(values.len());
    values
        .iter()
        .filter(|v| seen.insert(v.as_str()))
        .cloned()
        .collect()
}

fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn breed(id: &str, name_th: &str, name_en: &str, short_name: &str) -> Breed {
        Breed {
            id: id.to_string(),
            name_th: name_th.to_string(),
            name_en: name_en.to_string(),
            short_name: short_name.to_string(),
            remark: None,
        }
    }

    #[test]
    fn test_empty_query_renders_true() {
        let predicate = Predicate::from_query(&BreedQuery::default());

        assert!(predicate.is_universal());
        let fragment = predicate.render(1).unwrap();
        assert_eq!(fragment.sql, "TRUE");
        assert!(fragment.params.is_empty());
    }

    #[test]
    fn test_ids_only() {
        let query = BreedQuery {
            ids: strings(&["1", "2"]),
            ..Default::default()
        };

        let fragment = Predicate::from_query(&query).render(1).unwrap();
        assert_eq!(fragment.sql, "id IN ($1, $2)");
        assert_eq!(fragment.params, strings(&["1", "2"]));
    }

    #[test]
    fn test_short_names_only() {
        let query = BreedQuery {
            short_names: strings(&["PDL"]),
            ..Default::default()
        };

        let fragment = Predicate::from_query(&query).render(1).unwrap();
        assert_eq!(fragment.sql, "short_name IN ($1)");
        assert_eq!(fragment.params, strings(&["PDL"]));
    }

    #[test]
    fn test_all_filters_combine_with_and() {
        let query = BreedQuery {
            ids: strings(&["1", "2"]),
            short_names: strings(&["PDL"]),
            keyword: "Poo".to_string(),
        };

        let fragment = Predicate::from_query(&query).render(1).unwrap();
        assert_eq!(
            fragment.sql,
            r"id IN ($1, $2) AND short_name IN ($3) AND (name_th LIKE $4 ESCAPE '\' OR name_en LIKE $5 ESCAPE '\')"
        );
        assert_eq!(fragment.params, strings(&["1", "2", "PDL", "%Poo%", "%Poo%"]));
    }

    #[test]
    fn test_placeholders_start_at_offset() {
        let query = BreedQuery {
            ids: strings(&["7"]),
            ..Default::default()
        };

        let fragment = Predicate::from_query(&query).render(4).unwrap();
        assert_eq!(fragment.sql, "id IN ($4)");
    }

    #[test]
    fn test_duplicate_values_are_bound_once() {
        let query = BreedQuery {
            ids: strings(&["2", "1", "2", "1"]),
            ..Default::default()
        };

        let predicate = Predicate::from_query(&query);
        assert_eq!(
            predicate.conditions(),
            &[Condition::In {
                column: Column::Id,
                values: strings(&["2", "1"]),
            }]
        );
        assert_eq!(predicate.parameter_count(), 2);
    }

    #[test]
    fn test_keyword_never_reaches_template() {
        let keyword = "'; DROP TABLE breed; --";
        let query = BreedQuery {
            keyword: keyword.to_string(),
            ..Default::default()
        };

        let fragment = Predicate::from_query(&query).render(1).unwrap();
        assert!(!fragment.sql.contains("DROP"));
        assert_eq!(fragment.params, vec![format!("%{}%", keyword); 2]);
    }

    #[test]
    fn test_keyword_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off"), r"50\%\_off");
        assert_eq!(escape_like(r"a\b"), r"a\\b");
        assert_eq!(escape_like("Poodle"), "Poodle");

        let query = BreedQuery {
            keyword: "100%".to_string(),
            ..Default::default()
        };
        let fragment = Predicate::from_query(&query).render(1).unwrap();
        assert_eq!(fragment.params[0], r"%100\%%");
    }

    #[test]
    fn test_zero_placeholder_start_is_rejected() {
        let result = Predicate::from_query(&BreedQuery::default()).render(0);
        assert_eq!(result, Err(BuildError::InvalidPlaceholderStart));
    }

    #[test]
    fn test_too_many_parameters() {
        let query = BreedQuery {
            ids: (0..=MAX_BIND_PARAMETERS).map(|i| i.to_string()).collect(),
            ..Default::default()
        };

        let result = Predicate::from_query(&query).render(1);
        assert_eq!(
            result,
            Err(BuildError::TooManyParameters {
                count: MAX_BIND_PARAMETERS + 1,
                limit: MAX_BIND_PARAMETERS,
            })
        );
    }

    #[test]
    fn test_parameter_limit_counts_offset() {
        let query = BreedQuery {
            ids: (0..MAX_BIND_PARAMETERS).map(|i| i.to_string()).collect(),
            ..Default::default()
        };

        let predicate = Predicate::from_query(&query);
        assert!(predicate.render(1).is_ok());
        assert!(matches!(
            predicate.render(2),
            Err(BuildError::TooManyParameters { .. })
        ));
    }

    #[test]
    fn test_matches_membership() {
        let query = BreedQuery {
            ids: strings(&["1"]),
            short_names: strings(&["MIX", "PDL"]),
            ..Default::default()
        };
        let predicate = Predicate::from_query(&query);

        assert!(predicate.matches(&breed("1", "ผสม", "Mixed", "MIX")));
        assert!(!predicate.matches(&breed("2", "พุดเดิ้ล", "Poodle", "PDL")));
        assert!(!predicate.matches(&breed("1", "ผสม", "Mixed", "OTHER")));
    }

    #[test]
    fn test_matches_keyword_on_either_name() {
        let thai = Predicate::from_query(&BreedQuery {
            keyword: "พุด".to_string(),
            ..Default::default()
        });
        let english = Predicate::from_query(&BreedQuery {
            keyword: "ood".to_string(),
            ..Default::default()
        });
        let poodle = breed("2", "พุดเดิ้ล", "Poodle", "PDL");

        assert!(thai.matches(&poodle));
        assert!(english.matches(&poodle));
        assert!(!english.matches(&breed("1", "ผสม", "Mixed", "MIX")));
    }

    #[test]
    fn test_matches_keyword_literally_and_case_sensitively() {
        let poodle = breed("2", "พุดเดิ้ล", "Poodle", "PDL");

        let wildcard = Predicate::from_query(&BreedQuery {
            keyword: "P%e".to_string(),
            ..Default::default()
        });
        let lowercase = Predicate::from_query(&BreedQuery {
            keyword: "poodle".to_string(),
            ..Default::default()
        });

        assert!(!wildcard.matches(&poodle));
        assert!(!lowercase.matches(&poodle));
    }

    #[test]
    fn test_projection_order() {
        let names: Vec<_> = Column::PROJECTION.iter().map(|c| c.as_str()).collect();
        assert_eq!(names, ["id", "name_th", "name_en", "short_name", "remark"]);
    }
}
