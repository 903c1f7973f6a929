//! transform/options.rs
//! String-to-string configuration passed opaquely to every transform call.

use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::option_keys;
use crate::types::ProcessingError;

/// Options map. Key order is irrelevant; interpretation belongs to each transform.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransformOptions(HashMap<String, String>);

impl TransformOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object of string values, e.g. `{"level": "9"}`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse `key` as `T`. Absent keys yield `Ok(None)`.
    pub fn get_parsed<T>(&self, transform: &'static str, key: &str) -> Result<Option<T>, ProcessingError>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|e| ProcessingError::InvalidOption {
                    transform,
                    key: key.to_string(),
                    msg: e.to_string(),
                }),
        }
    }

    /// `level` option or `default` when absent.
    pub fn level_or<T>(&self, transform: &'static str, default: T) -> Result<T, ProcessingError>
    where
        T: FromStr,
        T::Err: Display,
    {
        Ok(self.get_parsed(transform, option_keys::LEVEL)?.unwrap_or(default))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TransformOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
