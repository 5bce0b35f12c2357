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

//! Conversion of attribute values into header values.

use sso_module_utils::identity::AttributeValue;

/// Converts an attribute value into the list of values of the corresponding header.
///
/// A missing or null attribute produces no values. Each non-null entry of a multi-valued
/// attribute becomes a separate value, any other attribute becomes a single value.
pub fn header_values(value: Option<&AttributeValue>) -> Vec<String> {
    match value {
        None | Some(AttributeValue::Null) => Vec::new(),
        Some(AttributeValue::List(values)) => values
            .iter()
            .filter(|value| !value.is_null())
            .map(ToString::to_string)
            .collect(),
        Some(value) => vec![value.to_string()],
    }
}
