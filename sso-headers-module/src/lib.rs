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

//! # SSO Headers Module for Pingora
//!
//! This crate makes the identity of a user authenticated via single sign-on available to
//! applications behind the proxy as ordinary request headers. It should be called as request
//! filter after the authentication handler stored the authenticated principal in the session and
//! before the request is passed on to the upstream server or other handlers.
//!
//! Two kinds of headers are produced:
//!
//! * The user header, by default `X-Remote-User`, contains the login name of the authenticated
//!   user. It is only set if the request has been authenticated, otherwise the request is passed
//!   on unchanged.
//! * Attribute headers contain the values of the principal’s attributes. Headers known to the
//!   attribute mapping are always taken from the principal. Values sent by the client for such
//!   headers are removed, even if the request isn’t authenticated.
//!
//! A configuration could look like this:
//!
//! ```yaml
//! header_name: X-Remote-User
//! attribute_mapping: |
//!     employeeId=X-Employee-Id
//!     mail=X-Mail
//!     memberOf=X-Groups
//! ```
//!
//! The attribute mapping is a list of `attribute=header` entries separated by whitespace.
//! Attribute names are case-sensitive, header names are not. Mapping the same attribute to
//! multiple headers is allowed, mapping multiple attributes to the same header is not.
//!
//! If `attribute_mapping` is missing or empty, each attribute is mapped to a header with the
//! `CAS_` prefix, e.g. the `employeeId` attribute becomes the `CAS_employeeId` header. All client
//! headers starting with this prefix are removed then.
//!
//! Attributes with multiple values produce multiple header values. Attributes without a value
//! produce no header.
//!
//! ## Code example
//!
//! You would normally run this handler in the `request_filter` phase, before the request is
//! proxied upstream. The combined configuration is deserialized from YAML and the command line
//! options are merged in:
//!
//! ```rust
//! use clap::Parser;
//! use sso_headers_module::{SsoHeadersConf, SsoHeadersHandler, SsoHeadersOpt};
//! use sso_module_utils::{FromYaml, RequestFilter};
//!
//! let mut conf = SsoHeadersConf::from_yaml(r#"
//!     attribute_mapping: employeeId=X-Employee-Id
//! "#).unwrap();
//! conf.merge_with_opt(SsoHeadersOpt::parse_from(["test", "--header-name", "X-Login"]));
//!
//! let handler = SsoHeadersHandler::new(conf).unwrap();
//! ```
//!
//! The views in [`overlay`] and [`user`] can also be used without Pingora, over any request type
//! implementing [`HeaderSource`].

pub mod coercion;
pub mod configuration;
mod handler;
pub mod mapping;
pub mod overlay;
pub mod source;
pub mod user;

pub use configuration::{AttributeHeadersConf, SsoHeadersConf, SsoHeadersOpt, UserHeaderConf};
pub use handler::{AttributeHeadersHandler, SsoHeadersHandler, UserHeaderHandler};
pub use mapping::{AttributeMapping, MappingError};
pub use overlay::AttributeHeadersView;
pub use source::{HeaderSource, RequestView};
pub use user::UserHeaderView;
