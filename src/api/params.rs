use actix_web::{dev::Payload, web, Error, FromRequest, HttpRequest};
use std::future::{ready, Ready};
use std::str::FromStr;

use crate::utils::ApiError;

/// Raw request parameters with ASP.NET-style binding rules.
///
/// Keys match case-insensitively, the first non-empty value wins for scalars, and
/// list parameters may be repeated (`status=A&status=B`) or comma separated.
#[derive(Debug, Clone, Default)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push((key.into(), value.into()));
    }

    fn values<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn text(&self, key: &str) -> Option<String> {
        self.values(key).next().map(str::to_string)
    }

    pub fn parse<T: FromStr>(&self, key: &str) -> Result<Option<T>, ApiError> {
        match self.values(key).next() {
            Some(raw) => raw.parse::<T>().map(Some).map_err(|_| invalid(key, raw)),
            None => Ok(None),
        }
    }

    pub fn list<T: FromStr>(&self, key: &str) -> Result<Vec<T>, ApiError> {
        self.values(key)
            .flat_map(|v| v.split(','))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|raw| raw.parse::<T>().map_err(|_| invalid(key, raw)))
            .collect()
    }

    /// Accepts `true`/`false` in any case, like the .NET boolean binder.
    pub fn flag(&self, key: &str) -> Result<Option<bool>, ApiError> {
        match self.values(key).next() {
            Some(raw) if raw.eq_ignore_ascii_case("true") => Ok(Some(true)),
            Some(raw) if raw.eq_ignore_ascii_case("false") => Ok(Some(false)),
            Some(raw) => Err(invalid(key, raw)),
            None => Ok(None),
        }
    }
}

fn invalid(key: &str, raw: &str) -> ApiError {
    ApiError::validation(format!("The value '{}' is not valid for {}.", raw, key))
}

/// `Some(id)` only for identifiers the platform can know about.
pub fn positive(id: Option<i32>) -> Option<i32> {
    id.filter(|id| *id > 0)
}

impl From<Vec<(String, String)>> for Params {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self(pairs)
    }
}

impl FromRequest for Params {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result: Result<Self, Error> = web::Query::<Vec<(String, String)>>::from_query(req.query_string())
            .map(|query| Params(query.into_inner()))
            .map_err(|e| ApiError::validation(format!("Malformed query string: {}", e)).into());
        ready(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aiforged::DocumentStatus;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<Vec<_>>()
            .into()
    }

    #[test]
    fn test_keys_are_case_insensitive() {
        let p = params(&[("ProjectId", "5"), ("projectid", "9")]);
        assert_eq!(p.parse::<i32>("projectId").unwrap(), Some(5));
        assert_eq!(p.parse::<i32>("serviceId").unwrap(), None);
    }

    #[test]
    fn test_lists_accept_repeats_and_commas() {
        let p = params(&[("docIds", "1,2"), ("docIds", "3"), ("docIds", " ")]);
        assert_eq!(p.list::<i32>("docIds").unwrap(), vec![1, 2, 3]);

        let p = params(&[("status", "processed, Error")]);
        assert_eq!(
            p.list::<DocumentStatus>("status").unwrap(),
            vec![DocumentStatus::Processed, DocumentStatus::Error]
        );
    }

    #[test]
    fn test_unparsable_values_are_validation_errors() {
        let p = params(&[("docId", "abc"), ("deleteRecursive", "maybe")]);
        let err = p.parse::<i32>("docId").unwrap_err();
        assert_eq!(err.to_string(), "The value 'abc' is not valid for docId.");
        assert!(p.flag("deleteRecursive").is_err());
    }

    #[test]
    fn test_positive_ids() {
        assert_eq!(positive(Some(3)), Some(3));
        assert_eq!(positive(Some(0)), None);
        assert_eq!(positive(Some(-4)), None);
        assert_eq!(positive(None), None);
    }
}
