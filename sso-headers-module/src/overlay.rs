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

//! Header view merging request headers with headers computed from principal attributes.

use sso_module_utils::identity::Principal;
use std::collections::BTreeMap;

use crate::coercion::header_values;
use crate::mapping::AttributeMapping;
use crate::source::HeaderSource;

/// Header view of a request where mapped headers carry the principal’s attributes
///
/// Any header known to the mapping is taken from the principal’s attributes exclusively. If there
/// is no principal or the attribute has no value, the header is absent, even if the client sent
/// it. All other headers are passed through from the underlying request unchanged.
#[derive(Debug)]
pub struct AttributeHeadersView<'a, R: ?Sized> {
    request: &'a R,
    mapping: &'a AttributeMapping,
    principal: Option<&'a Principal>,
}

impl<'a, R: HeaderSource + ?Sized> AttributeHeadersView<'a, R> {
    /// Wraps a request, `principal` is `None` for requests that aren’t authenticated.
    pub fn new(
        request: &'a R,
        mapping: &'a AttributeMapping,
        principal: Option<&'a Principal>,
    ) -> Self {
        Self {
            request,
            mapping,
            principal,
        }
    }

    /// Returns the names of the underlying request’s headers that are replaced by attributes.
    ///
    /// Returns `None` if the underlying request doesn’t allow enumerating headers.
    pub fn shadowed_header_names(&self) -> Option<Vec<String>> {
        let mut names = self.request.header_names()?;
        names.retain(|name| self.mapping.header_is_mapped(name));
        Some(names)
    }

    /// Returns the names of the headers that have values computed from attributes, sorted
    /// case-insensitively.
    pub fn attribute_header_names(&self) -> Vec<String> {
        let Some(principal) = self.principal else {
            return Vec::new();
        };

        let mut names = BTreeMap::new();
        for (attribute, value) in principal.attributes() {
            if header_values(Some(value)).is_empty() {
                continue;
            }

            for name in self.mapping.headers_for_attribute(attribute) {
                names
                    .entry(name.to_ascii_lowercase())
                    .or_insert_with(|| name.into_owned());
            }
        }
        names.into_values().collect()
    }

    fn attribute_values(&self, attribute: &str) -> Vec<String> {
        header_values(
            self.principal
                .and_then(|principal| principal.attribute(attribute)),
        )
    }
}

impl<R: HeaderSource + ?Sized> HeaderSource for AttributeHeadersView<'_, R> {
    fn header_names(&self) -> Option<Vec<String>> {
        let mut names = BTreeMap::new();
        for name in self.request.header_names()? {
            if !self.mapping.header_is_mapped(&name) {
                names.entry(name.to_ascii_lowercase()).or_insert(name);
            }
        }
        for name in self.attribute_header_names() {
            names.entry(name.to_ascii_lowercase()).or_insert(name);
        }
        Some(names.into_values().collect())
    }

    fn header_values(&self, name: &str) -> Vec<String> {
        if let Some(attribute) = self.mapping.attribute_for_header(name) {
            self.attribute_values(attribute)
        } else {
            self.request.header_values(name)
        }
    }

    fn first_header_value(&self, name: &str) -> Option<String> {
        if let Some(attribute) = self.mapping.attribute_for_header(name) {
            self.attribute_values(attribute).into_iter().next()
        } else {
            self.request.first_header_value(name)
        }
    }
}
