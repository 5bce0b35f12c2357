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

//! Structures required to deserialize SSO Headers Module configuration from YAML configuration
//! files.

use clap::Parser;
use serde::Deserialize;

use crate::mapping::{AttributeMapping, MappingError};
use crate::user::DEFAULT_HEADER_NAME;

fn parse_attribute_mapping(value: &str) -> Result<AttributeMapping, MappingError> {
    AttributeMapping::from_config(Some(value))
}

/// Command line options of the SSO headers module
#[derive(Debug, Parser)]
pub struct SsoHeadersOpt {
    /// Mapping of principal attributes to request headers, a list of attribute=header entries
    /// separated by whitespace. By default, each attribute is copied into a header with the CAS_
    /// prefix, e.g. CAS_employeeId.
    #[clap(long, value_parser = parse_attribute_mapping)]
    pub attribute_mapping: Option<AttributeMapping>,
    /// Name of the request header receiving the name of the authenticated user
    #[clap(long)]
    pub header_name: Option<String>,
}

/// Configuration of the attribute headers
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AttributeHeadersConf {
    /// Mapping of principal attributes to request headers
    ///
    /// In the configuration file this is a string of `attribute=header` entries separated by
    /// whitespace. If missing or empty, the implicit mapping to headers with the `CAS_` prefix
    /// is used.
    pub attribute_mapping: AttributeMapping,
}

/// Configuration of the user header
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UserHeaderConf {
    /// Name of the request header receiving the name of the authenticated user
    ///
    /// An empty value means that the default `X-Remote-User` header is used.
    pub header_name: String,
}

impl Default for UserHeaderConf {
    fn default() -> Self {
        Self {
            header_name: DEFAULT_HEADER_NAME.to_owned(),
        }
    }
}

/// SSO headers configuration
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SsoHeadersConf {
    /// User header settings
    #[serde(flatten)]
    pub user: UserHeaderConf,

    /// Attribute headers settings
    #[serde(flatten)]
    pub attributes: AttributeHeadersConf,
}

impl SsoHeadersConf {
    /// Merges the command line options into the current configuration. Command line options
    /// present overwrite existing settings.
    pub fn merge_with_opt(&mut self, opt: SsoHeadersOpt) {
        if let Some(attribute_mapping) = opt.attribute_mapping {
            self.attributes.attribute_mapping = attribute_mapping;
        }

        if let Some(header_name) = opt.header_name {
            self.user.header_name = header_name;
        }
    }
}
