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

//! Identity data attached to a request by a single-sign-on integration.
//!
//! An authentication module validating the SSO ticket stores a [`Principal`] in the session via
//! [`SessionWrapper::set_principal`](crate::pingora::SessionWrapper::set_principal). Modules
//! processing the request further can then inspect the principal’s name and attributes.

use serde::Deserialize;
use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};

/// Value of a principal attribute
///
/// Identity providers don’t guarantee attribute values to be strings. An attribute can be a
/// scalar of any kind or a list of values, individual list entries can be null.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Explicit null value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer number
    Integer(i64),
    /// Floating point number
    Float(f64),
    /// String value
    String(String),
    /// Multi-valued attribute
    List(Vec<AttributeValue>),
}

impl AttributeValue {
    /// Returns `true` if this is an explicit null value
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl Display for AttributeValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(value) => value.fmt(f),
            Self::Integer(value) => value.fmt(f),
            Self::Float(value) => value.fmt(f),
            Self::String(value) => f.write_str(value),
            Self::List(values) => {
                let mut first = true;
                for value in values.iter().filter(|value| !value.is_null()) {
                    if !first {
                        f.write_str(", ")?;
                    }
                    first = false;
                    value.fmt(f)?;
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl<T: Into<AttributeValue>> From<Option<T>> for AttributeValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<AttributeValue>> From<Vec<T>> for AttributeValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

/// An authenticated user along with the attributes released by the identity provider
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Principal {
    name: String,
    #[serde(default)]
    attributes: HashMap<String, AttributeValue>,
}

impl Principal {
    /// Creates a principal without any attributes
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: HashMap::new(),
        }
    }

    /// Adds an attribute to the principal, replacing any previous value
    pub fn with_attribute(
        mut self,
        name: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Login name of the principal
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All attributes of the principal by attribute name
    pub fn attributes(&self) -> &HashMap<String, AttributeValue> {
        &self.attributes
    }

    /// Looks up an attribute. Attribute names are case-sensitive.
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::FromYaml;

    #[test]
    fn display() {
        assert_eq!(AttributeValue::from("foo").to_string(), "foo");
        assert_eq!(AttributeValue::from(42i64).to_string(), "42");
        assert_eq!(AttributeValue::from(true).to_string(), "true");
        assert_eq!(AttributeValue::from(1.5f64).to_string(), "1.5");
        assert_eq!(AttributeValue::Null.to_string(), "");
        assert_eq!(
            AttributeValue::from(vec![Some("a"), None, Some("b")]).to_string(),
            "a, b"
        );
    }

    #[test]
    fn attributes() {
        let principal = Principal::new("alice")
            .with_attribute("employeeId", "42")
            .with_attribute("groups", vec!["staff", "admins"]);
        assert_eq!(principal.name(), "alice");
        assert_eq!(principal.attributes().len(), 2);
        assert_eq!(
            principal.attribute("employeeId"),
            Some(&AttributeValue::from("42"))
        );
        assert_eq!(principal.attribute("EmployeeId"), None);
    }

    #[test]
    fn deserialize() {
        let principal = Principal::from_yaml(
            r#"
            name: alice
            attributes:
                employeeId: 42
                mail: alice@example.com
                groups: [staff, ~, admins]
                nickname: ~
            "#,
        )
        .unwrap();
        assert_eq!(principal.name(), "alice");
        assert_eq!(principal.attribute("employeeId"), Some(&42i64.into()));
        assert_eq!(
            principal.attribute("mail"),
            Some(&"alice@example.com".into())
        );
        assert_eq!(
            principal.attribute("groups"),
            Some(&AttributeValue::List(vec![
                "staff".into(),
                AttributeValue::Null,
                "admins".into()
            ]))
        );
        assert_eq!(principal.attribute("nickname"), Some(&AttributeValue::Null));
    }
}
