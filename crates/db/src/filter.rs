//! Django-style query-string filtering.
//!
//! A query such as `?price__lt=3000&title__icontains=rust` becomes a
//! [`FilterSet`] of ANDed criteria. The left hand side is a field name
//! optionally followed by `__` and a lookup; a bare field name means
//! `exact`. Field names, lookups and values are checked against the
//! [`FieldSpec`]s a [`Filterable`] type publishes, and every problem is
//! reported at once, keyed by the offending parameter.

use shop_kernel::FieldErrors;
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;

const LOOKUP_SEPARATOR: &str = "__";

/// Errors produced while building a [`FilterSet`].
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("invalid filter criteria: {0}")]
    Invalid(FieldErrors),
}

impl FilterError {
    pub fn into_field_errors(self) -> FieldErrors {
        match self {
            FilterError::Invalid(errors) => errors,
        }
    }
}

/// Value type of a filterable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Uuid,
    Text,
    Integer,
    Timestamp,
}

/// Describes one field a query may filter on.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    /// Other names accepted in query strings for the same field.
    pub aliases: &'static [&'static str],
    pub kind: FieldKind,
    pub nullable: bool,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            aliases: &[],
            kind,
            nullable: false,
        }
    }

    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub const fn aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|alias| *alias == name)
    }

    fn supports(&self, lookup: Lookup) -> bool {
        match lookup {
            Lookup::IsNull => self.nullable,
            Lookup::Exact => true,
            Lookup::IExact | Lookup::Contains | Lookup::IContains | Lookup::StartsWith => {
                self.kind == FieldKind::Text
            }
            Lookup::Lt | Lookup::Lte | Lookup::Gt | Lookup::Gte => {
                matches!(self.kind, FieldKind::Integer | FieldKind::Timestamp)
            }
        }
    }
}

/// A single field value as seen by filters.
#[derive(Debug, Clone, PartialEq, PartialOrd)]
pub enum Scalar {
    Uuid(Uuid),
    Text(String),
    Integer(i64),
    Timestamp(OffsetDateTime),
}

/// A type whose rows can be narrowed by a [`FilterSet`].
pub trait Filterable {
    /// Fields visible to queries.
    const FIELDS: &'static [FieldSpec];

    /// Current value of `field` (its canonical name), `None` when null.
    fn scalar(&self, field: &str) -> Option<Scalar>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookup {
    Exact,
    IExact,
    Contains,
    IContains,
    StartsWith,
    Lt,
    Lte,
    Gt,
    Gte,
    IsNull,
}

impl Lookup {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "exact" => Lookup::Exact,
            "iexact" => Lookup::IExact,
            "contains" => Lookup::Contains,
            "icontains" => Lookup::IContains,
            "startswith" => Lookup::StartsWith,
            "lt" => Lookup::Lt,
            "lte" => Lookup::Lte,
            "gt" => Lookup::Gt,
            "gte" => Lookup::Gte,
            "isnull" => Lookup::IsNull,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone)]
enum Operand {
    Value(Scalar),
    Flag(bool),
}

#[derive(Debug, Clone)]
struct Criterion {
    field: &'static str,
    lookup: Lookup,
    operand: Operand,
}

impl Criterion {
    fn matches(&self, value: Option<Scalar>) -> bool {
        match (&self.operand, value) {
            (Operand::Flag(want_null), value) => value.is_none() == *want_null,
            (Operand::Value(_), None) => false,
            (Operand::Value(rhs), Some(lhs)) => match self.lookup {
                Lookup::Exact => lhs == *rhs,
                Lookup::Lt => lhs < *rhs,
                Lookup::Lte => lhs <= *rhs,
                Lookup::Gt => lhs > *rhs,
                Lookup::Gte => lhs >= *rhs,
                Lookup::IExact | Lookup::Contains | Lookup::IContains | Lookup::StartsWith => {
                    match (lhs, rhs) {
                        (Scalar::Text(lhs), Scalar::Text(rhs)) => text_matches(self.lookup, &lhs, rhs),
                        _ => false,
                    }
                }
                Lookup::IsNull => false,
            },
        }
    }
}

fn text_matches(lookup: Lookup, lhs: &str, rhs: &str) -> bool {
    match lookup {
        Lookup::IExact => lhs.to_lowercase() == rhs.to_lowercase(),
        Lookup::Contains => lhs.contains(rhs),
        Lookup::IContains => lhs.to_lowercase().contains(&rhs.to_lowercase()),
        Lookup::StartsWith => lhs.starts_with(rhs),
        _ => false,
    }
}

/// Conjunction of criteria parsed from query parameters.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    criteria: Vec<Criterion>,
}

impl FilterSet {
    /// A filter set that matches everything.
    pub fn all() -> Self {
        Self::default()
    }

    /// Build a filter set for `R` from `(key, value)` query parameters.
    ///
    /// Empty values are skipped once their key has been checked.
    pub fn parse<R, I, K, V>(params: I) -> Result<Self, FilterError>
    where
        R: Filterable,
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut criteria = Vec::new();
        let mut errors = FieldErrors::new();

        for (key, value) in params {
            let (key, value) = (key.as_ref(), value.as_ref());
            match parse_criterion::<R>(key, value) {
                Ok(Some(criterion)) => criteria.push(criterion),
                Ok(None) => {}
                Err(message) => errors.add(key, message),
            }
        }

        errors
            .into_result(Self { criteria })
            .map_err(FilterError::Invalid)
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn matches<R: Filterable>(&self, row: &R) -> bool {
        self.criteria
            .iter()
            .all(|criterion| criterion.matches(row.scalar(criterion.field)))
    }
}

fn parse_criterion<R: Filterable>(key: &str, value: &str) -> Result<Option<Criterion>, String> {
    let (spec, lookup) = resolve_key::<R>(key)?;

    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }

    let operand = if lookup == Lookup::IsNull {
        Operand::Flag(parse_flag(value)?)
    } else {
        Operand::Value(parse_scalar(spec.kind, value)?)
    };

    Ok(Some(Criterion {
        field: spec.name,
        lookup,
        operand,
    }))
}

fn resolve_key<R: Filterable>(key: &str) -> Result<(&'static FieldSpec, Lookup), String> {
    let find = |name: &str| R::FIELDS.iter().find(|spec| spec.answers_to(name));

    if let Some(spec) = find(key) {
        return Ok((spec, Lookup::Exact));
    }

    let (name, lookup_name) = key
        .rsplit_once(LOOKUP_SEPARATOR)
        .ok_or_else(|| format!("Unknown filter field '{key}'."))?;
    let spec = find(name).ok_or_else(|| format!("Unknown filter field '{name}'."))?;

    match Lookup::parse(lookup_name) {
        Some(lookup) if spec.supports(lookup) => Ok((spec, lookup)),
        _ => Err(format!(
            "Unsupported lookup '{lookup_name}' for field '{}'.",
            spec.name
        )),
    }
}

fn parse_scalar(kind: FieldKind, value: &str) -> Result<Scalar, String> {
    match kind {
        FieldKind::Text => Ok(Scalar::Text(value.to_string())),
        FieldKind::Integer => value
            .parse()
            .map(Scalar::Integer)
            .map_err(|_| "Enter a whole number.".to_string()),
        FieldKind::Uuid => Uuid::parse_str(value)
            .map(Scalar::Uuid)
            .map_err(|_| "Enter a valid UUID.".to_string()),
        FieldKind::Timestamp => OffsetDateTime::parse(value, &Rfc3339)
            .map(Scalar::Timestamp)
            .map_err(|_| "Enter a valid date/time.".to_string()),
    }
}

fn parse_flag(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err("Enter a valid boolean.".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    struct Item {
        id: Uuid,
        name: String,
        count: Option<i64>,
        owner: Option<Uuid>,
        seen_at: OffsetDateTime,
    }

    impl Filterable for Item {
        const FIELDS: &'static [FieldSpec] = &[
            FieldSpec::new("id", FieldKind::Uuid),
            FieldSpec::new("name", FieldKind::Text),
            FieldSpec::new("count", FieldKind::Integer).nullable(),
            FieldSpec::new("owner_id", FieldKind::Uuid)
                .nullable()
                .aliases(&["owner"]),
            FieldSpec::new("seen_at", FieldKind::Timestamp),
        ];

        fn scalar(&self, field: &str) -> Option<Scalar> {
            match field {
                "id" => Some(Scalar::Uuid(self.id)),
                "name" => Some(Scalar::Text(self.name.clone())),
                "count" => self.count.map(Scalar::Integer),
                "owner_id" => self.owner.map(Scalar::Uuid),
                "seen_at" => Some(Scalar::Timestamp(self.seen_at)),
                _ => None,
            }
        }
    }

    fn item(name: &str, count: Option<i64>) -> Item {
        Item {
            id: Uuid::new_v4(),
            name: name.to_string(),
            count,
            owner: None,
            seen_at: datetime!(2024-05-01 12:00 UTC),
        }
    }

    fn parse(query: &[(&str, &str)]) -> Result<FilterSet, FilterError> {
        FilterSet::parse::<Item, _, _, _>(query.iter().copied())
    }

    #[test]
    fn bare_field_means_exact() {
        let filter = parse(&[("name", "Rust")]).unwrap();
        assert!(filter.matches(&item("Rust", None)));
        assert!(!filter.matches(&item("rust", None)));
    }

    #[test]
    fn lookups_compare_by_kind() {
        let filter = parse(&[("count__gte", "10"), ("name__icontains", "RUS")]).unwrap();
        assert_eq!(filter.len(), 2);
        assert!(filter.matches(&item("Trusty", Some(10))));
        assert!(!filter.matches(&item("Trusty", Some(9))));
        assert!(!filter.matches(&item("Trusty", None)));
    }

    #[test]
    fn isnull_and_aliases() {
        let owner = Uuid::new_v4();
        let mut owned = item("a", None);
        owned.owner = Some(owner);

        let filter = parse(&[("owner", &owner.to_string())]).unwrap();
        assert!(filter.matches(&owned));

        let filter = parse(&[("owner_id__isnull", "true")]).unwrap();
        assert!(!filter.matches(&owned));
        assert!(filter.matches(&item("b", None)));
    }

    #[test]
    fn timestamps_parse_rfc3339() {
        let filter = parse(&[("seen_at__lt", "2024-05-02T00:00:00Z")]).unwrap();
        assert!(filter.matches(&item("a", None)));
    }

    #[test]
    fn empty_values_are_ignored() {
        let filter = parse(&[("name", "")]).unwrap();
        assert!(filter.is_empty());
        assert!(filter.matches(&item("anything", None)));
    }

    #[test]
    fn every_problem_is_reported() {
        let errors = parse(&[
            ("colour", "red"),
            ("count", "ten"),
            ("name__gt", "a"),
            ("id__isnull", "true"),
            ("count__isnull", "maybe"),
        ])
        .unwrap_err()
        .into_field_errors();

        assert_eq!(errors.get("colour"), ["Unknown filter field 'colour'."]);
        assert_eq!(errors.get("count"), ["Enter a whole number."]);
        assert_eq!(
            errors.get("name__gt"),
            ["Unsupported lookup 'gt' for field 'name'."]
        );
        assert_eq!(
            errors.get("id__isnull"),
            ["Unsupported lookup 'isnull' for field 'id'."]
        );
        assert_eq!(errors.get("count__isnull"), ["Enter a valid boolean."]);
    }
}
