//! URL-style search parameters
//!
//! A search request is an ordered multi-map: the same field may appear many
//! times (`status=released&status=in+review`) and order is kept so that
//! compiled queries are deterministic.

use serde::{Deserialize, Serialize};

use crate::error::{FacetqlError, Result};

/// One request parameter, exactly as received
///
/// `field` may carry a trailing `!` (negation) or a `.from` / `.to` suffix
/// (range boundary); both are interpreted later by the classifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawParameter {
    pub field: String,
    pub value: String,
}

impl RawParameter {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Split and percent-decode a query string (`a=b&c=d`, leading `?` allowed)
    pub fn parse_query_string(query: &str) -> Result<Vec<RawParameter>> {
        let query = query.strip_prefix('?').unwrap_or(query);
        query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (field, value) = pair.split_once('=').unwrap_or((pair, ""));
                Ok(RawParameter::new(decode(field)?, decode(value)?))
            })
            .collect()
    }

    fn encode(&self) -> String {
        // `!` stays readable in the key; it is only a negation marker
        format!(
            "{}={}",
            urlencoding::encode(&self.field).replace("%21", "!"),
            urlencoding::encode(&self.value)
        )
    }
}

fn decode(component: &str) -> Result<String> {
    let spaced = component.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|s| s.into_owned())
        .map_err(|e| {
            FacetqlError::InvalidRequest(format!("Bad query string component {:?}: {}", component, e))
        })
}

/// Ordered multi-map of request parameters
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchParams {
    params: Vec<RawParameter>,
}

impl SearchParams {
    pub fn new(params: Vec<RawParameter>) -> Self {
        Self { params }
    }

    /// Parse a query string
    pub fn parse(query: &str) -> Result<Self> {
        Ok(Self::new(RawParameter::parse_query_string(query)?))
    }

    /// Build from `(field, value)` pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(k, v)| RawParameter::new(k, v))
                .collect(),
        )
    }

    /// Append a parameter
    pub fn push(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.params.push(RawParameter::new(field, value));
    }

    pub fn iter(&self) -> impl Iterator<Item = &RawParameter> {
        self.params.iter()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Every value given for `field`, in request order
    pub fn get_all(&self, field: &str) -> Vec<&str> {
        self.params
            .iter()
            .filter(|p| p.field == field)
            .map(|p| p.value.as_str())
            .collect()
    }

    /// First value given for `field`
    pub fn get(&self, field: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.field == field)
            .map(|p| p.value.as_str())
    }

    /// Re-encode as a query string (no leading `?`)
    pub fn to_query_string(&self) -> String {
        self.params
            .iter()
            .map(RawParameter::encode)
            .collect::<Vec<_>>()
            .join("&")
    }

    /// The query string with the parameter at `index` left out
    pub fn without(&self, index: usize) -> String {
        self.params
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, p)| p.encode())
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl<'a> IntoIterator for &'a SearchParams {
    type Item = &'a RawParameter;
    type IntoIter = std::slice::Iter<'a, RawParameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.params.iter()
    }
}

/// Entry of the filters-applied list shown next to search results
///
/// `remove` is the relative URL of the same search without this filter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedFilter {
    pub field: String,
    pub term: String,
    pub remove: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_preserves_order_and_repeats() {
        let params = SearchParams::parse("?type=Cohort&status=released&status=in+review").unwrap();
        assert_eq!(params.len(), 3);
        assert_eq!(params.get("type"), Some("Cohort"));
        assert_eq!(params.get_all("status"), vec!["released", "in review"]);
    }

    #[test]
    fn test_percent_decoding() {
        let params = SearchParams::parse("families.proband.display_title=GAP%20ID&sex%21=M").unwrap();
        let all: Vec<&RawParameter> = params.iter().collect();
        assert_eq!(all[0].value, "GAP ID");
        assert_eq!(all[1].field, "sex!");
        assert_eq!(all[1].value, "M");
    }

    #[test]
    fn test_missing_value_is_empty() {
        let params = SearchParams::parse("q&&type=Item").unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("q"), Some(""));
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        let err = SearchParams::parse("a=%FF").unwrap_err();
        assert!(matches!(err, FacetqlError::InvalidRequest(_)));
    }

    #[test]
    fn test_to_query_string_and_without() {
        let params = SearchParams::from_pairs(vec![
            ("type", "Cohort"),
            ("status!", "deleted"),
            ("title", "a b&c"),
        ]);
        assert_eq!(
            params.to_query_string(),
            "type=Cohort&status!=deleted&title=a%20b%26c"
        );
        assert_eq!(params.without(1), "type=Cohort&title=a%20b%26c");
        assert_eq!(params.without(0), "status!=deleted&title=a%20b%26c");

        let reparsed = SearchParams::parse(&params.to_query_string()).unwrap();
        assert_eq!(reparsed, params);
    }
}
