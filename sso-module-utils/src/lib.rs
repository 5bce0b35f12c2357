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

//! # Module helpers
//!
//! This crate contains the plumbing shared by Pandora Web Server modules sitting behind a
//! single-sign-on integration: the request filter contract, YAML configuration loading, a wrapper
//! around Pingora’s session carrying per-request state and the identity types an authentication
//! module attaches to a request.

pub mod identity;
pub mod pingora;

use async_trait::async_trait;
use log::trace;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::pingora::{Error, ErrorType, SessionWrapper};

/// Request filter result indicating how the current request should be processed further
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum RequestFilterResult {
    /// Response has been sent, no further processing should happen. Other Pingora phases should
    /// not be triggered.
    ResponseSent,

    /// Request has been handled and further request filters should not run. Response hasn’t been
    /// sent however, next Pingora phase should deal with that.
    Handled,

    /// Request filter could not handle this request, next request filter should run if it exists.
    #[default]
    Unhandled,
}

/// Trait to be implemented by request filters.
#[async_trait]
pub trait RequestFilter {
    /// Configuration type of this handler.
    type Conf;

    /// Per-request state of this handler, see [`ProxyHttp::CTX`](crate::pingora::ProxyHttp::CTX)
    type CTX;

    /// Creates a new instance of the handler from its configuration.
    fn new(conf: Self::Conf) -> Result<Self, Box<Error>>
    where
        Self: Sized,
        Self::Conf: TryInto<Self, Error = Box<Error>>,
    {
        conf.try_into()
    }

    /// Creates a new state object, see [`ProxyHttp::new_ctx`](crate::pingora::ProxyHttp::new_ctx)
    fn new_ctx() -> Self::CTX;

    /// Handles the current request.
    ///
    /// This is essentially identical to the `request_filter` method but is supposed to be called
    /// when there is only a single handler. Consequently, its result can be returned directly.
    async fn handle(
        &self,
        session: &mut impl SessionWrapper,
        ctx: &mut Self::CTX,
    ) -> Result<bool, Box<Error>>
    where
        Self::CTX: Send,
    {
        let result = self.request_filter(session, ctx).await?;
        Ok(result == RequestFilterResult::ResponseSent)
    }

    /// Handler to run during Pingora’s `request_filter` state, see
    /// [`ProxyHttp::request_filter`](crate::pingora::ProxyHttp::request_filter). This uses a
    /// different return type to account for the existence of multiple request filters.
    async fn request_filter(
        &self,
        session: &mut impl SessionWrapper,
        ctx: &mut Self::CTX,
    ) -> Result<RequestFilterResult, Box<Error>>;
}

/// Trait for configuration structures that can be loaded from YAML. This trait has a blanket
/// implementation for any structure implementing [`serde::Deserialize`].
pub trait FromYaml {
    /// Loads configuration from a YAML string.
    fn from_yaml(yaml: impl AsRef<str>) -> Result<Self, Box<Error>>
    where
        Self: Sized;

    /// Loads configuration from a YAML file.
    fn load_from_yaml(path: impl AsRef<Path>) -> Result<Self, Box<Error>>
    where
        Self: Sized;
}

impl<D> FromYaml for D
where
    D: DeserializeOwned + Debug,
{
    fn from_yaml(yaml: impl AsRef<str>) -> Result<Self, Box<Error>> {
        let conf = serde_yaml::from_str(yaml.as_ref()).map_err(|err| {
            Error::because(
                ErrorType::ReadError,
                "failed reading configuration data",
                err,
            )
        })?;
        trace!("Loaded configuration: {conf:#?}");

        Ok(conf)
    }

    fn load_from_yaml(path: impl AsRef<Path>) -> Result<Self, Box<Error>> {
        let file = File::open(path.as_ref()).map_err(|err| {
            Error::because(
                ErrorType::FileOpenError,
                "failed opening configuration file",
                err,
            )
        })?;
        let reader = BufReader::new(file);

        let conf = serde_yaml::from_reader(reader).map_err(|err| {
            Error::because(
                ErrorType::FileReadError,
                "failed reading configuration file",
                err,
            )
        })?;
        trace!("Loaded configuration file: {conf:#?}");

        Ok(conf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde::Deserialize;
    use test_log::test;

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Conf {
        name: String,
        enabled: bool,
    }

    #[test]
    fn from_yaml() {
        let conf = Conf::from_yaml("name: test\nenabled: true").unwrap();
        assert_eq!(conf.name, "test");
        assert!(conf.enabled);

        let conf = Conf::from_yaml("enabled: true").unwrap();
        assert_eq!(conf.name, "");

        assert!(Conf::from_yaml("enabled: [1, 2]").is_err());
    }

    #[test]
    fn load_missing_file() {
        assert!(Conf::load_from_yaml("/nonexistent/configuration.yaml").is_err());
    }
}
