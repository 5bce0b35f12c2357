// Copyright 2024 Wladimir Palant
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Translation between request header names and principal attribute names.

use http::HeaderName;
use serde::Deserialize;
use std::borrow::Cow;
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

/// Header name prefix of the implicit mapping: `CAS_employeeId` carries attribute `employeeId`.
pub const CAS_PREFIX: &str = "CAS_";

const SEPARATOR: char = '=';

/// Error in the textual attribute mapping
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// A mapping entry without `=` separator
    #[error("bad mapping entry {0:?}, expected attribute=header")]
    MissingSeparator(String),
    /// A mapping entry with empty attribute or header name
    #[error("bad mapping entry {0:?}, attribute and header name cannot be empty")]
    EmptyName(String),
    /// A mapping entry with a header name that isn’t a valid HTTP header name
    #[error("invalid header name {0:?} in attribute mapping")]
    InvalidHeaderName(String),
    /// The same header name (compared case-insensitively) mapped more than once
    #[error("duplicate header name {0:?} in attribute mapping")]
    DuplicateHeader(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ExplicitMapping {
    /// Attribute name by lowercase header name
    header_to_attribute: HashMap<String, String>,
    /// Header names as configured by attribute name
    attribute_to_headers: HashMap<String, BTreeSet<String>>,
}

impl ExplicitMapping {
    fn parse(text: &str) -> Result<Self, MappingError> {
        let mut mapping = Self::default();
        for token in text.split_whitespace() {
            let (attribute, header) = token
                .split_once(SEPARATOR)
                .ok_or_else(|| MappingError::MissingSeparator(token.to_owned()))?;
            if attribute.is_empty() || header.is_empty() {
                return Err(MappingError::EmptyName(token.to_owned()));
            }
            if HeaderName::from_bytes(header.as_bytes()).is_err() {
                return Err(MappingError::InvalidHeaderName(header.to_owned()));
            }

            let key = header.to_ascii_lowercase();
            if mapping.header_to_attribute.contains_key(&key) {
                return Err(MappingError::DuplicateHeader(header.to_owned()));
            }
            mapping
                .header_to_attribute
                .insert(key, attribute.to_owned());
            mapping
                .attribute_to_headers
                .entry(attribute.to_owned())
                .or_default()
                .insert(header.to_owned());
        }
        Ok(mapping)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Strategy {
    Explicit(ExplicitMapping),
    Prefixed,
}

/// Bidirectional mapping between header names and attribute names
///
/// Header names are always compared case-insensitively, attribute names are case-sensitive. The
/// mapping is immutable once built and can be shared between concurrent requests.
///
/// There are two strategies:
///
/// * Explicit mapping built from a list of `attribute=header` entries separated by whitespace.
///   Each header name maps to exactly one attribute, an attribute can be copied into multiple
///   headers.
/// * Implicit mapping (default) where any header starting with [`CAS_PREFIX`] (any case) maps to
///   the attribute named by the rest of the header name. The attribute lookup is case-sensitive,
///   so `CAS_EMPLOYEEID` won’t find the attribute `employeeId`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct AttributeMapping {
    strategy: Strategy,
}

impl AttributeMapping {
    /// Builds an explicit mapping from `attribute=header` entries separated by whitespace.
    pub fn parse(text: &str) -> Result<Self, MappingError> {
        Ok(Self {
            strategy: Strategy::Explicit(ExplicitMapping::parse(text)?),
        })
    }

    /// Returns the implicit mapping based on the [`CAS_PREFIX`] header prefix.
    pub fn prefixed() -> Self {
        Self {
            strategy: Strategy::Prefixed,
        }
    }

    /// Selects the mapping strategy for a configuration value: a missing or empty value results
    /// in the implicit mapping, anything else is parsed as explicit mapping.
    pub fn from_config(text: Option<&str>) -> Result<Self, MappingError> {
        match text {
            Some(text) if !text.is_empty() => Self::parse(text),
            _ => Ok(Self::prefixed()),
        }
    }

    /// Returns `true` if this mapping has been built from explicit configuration.
    pub fn is_explicit(&self) -> bool {
        matches!(self.strategy, Strategy::Explicit(_))
    }

    /// Checks whether a header carries an attribute (case-insensitive).
    pub fn header_is_mapped(&self, header: &str) -> bool {
        self.attribute_for_header(header).is_some()
    }

    /// Returns the name of the attribute copied into the given header, `None` if the header isn’t
    /// mapped.
    pub fn attribute_for_header<'a>(&'a self, header: &'a str) -> Option<&'a str> {
        match &self.strategy {
            Strategy::Explicit(mapping) => mapping
                .header_to_attribute
                .get(&header.to_ascii_lowercase())
                .map(String::as_str),
            Strategy::Prefixed => strip_prefix_ignore_case(header, CAS_PREFIX),
        }
    }

    /// Returns the names of all headers the given attribute is copied into. The list is empty if
    /// the attribute isn’t mapped.
    pub fn headers_for_attribute(&self, attribute: &str) -> Vec<Cow<'_, str>> {
        match &self.strategy {
            Strategy::Explicit(mapping) => mapping
                .attribute_to_headers
                .get(attribute)
                .map(|headers| headers.iter().map(|h| Cow::Borrowed(h.as_str())).collect())
                .unwrap_or_default(),
            Strategy::Prefixed => vec![Cow::Owned(format!("{CAS_PREFIX}{attribute}"))],
        }
    }
}

impl Default for AttributeMapping {
    fn default() -> Self {
        Self::prefixed()
    }
}

impl TryFrom<&str> for AttributeMapping {
    type Error = MappingError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_config(Some(value))
    }
}

impl TryFrom<String> for AttributeMapping {
    type Error = MappingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.as_str().try_into()
    }
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    let head = value.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&value[prefix.len()..])
    } else {
        None
    }
}
