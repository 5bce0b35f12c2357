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

use async_trait::async_trait;
use http::HeaderName;
use log::{debug, trace, warn};
use sso_module_utils::pingora::{Error, ErrorType, RequestHeader, SessionWrapper};
use sso_module_utils::{RequestFilter, RequestFilterResult};

use crate::configuration::{AttributeHeadersConf, SsoHeadersConf, UserHeaderConf};
use crate::mapping::AttributeMapping;
use crate::overlay::AttributeHeadersView;
use crate::source::HeaderSource;
use crate::user::{UserHeaderView, DEFAULT_HEADER_NAME};

/// Changes to be applied to the request header so that it matches a view
#[derive(Debug, Default)]
struct HeaderChanges {
    removed: Vec<String>,
    added: Vec<(String, Vec<String>)>,
}

impl HeaderChanges {
    fn add(&mut self, name: String, view: &impl HeaderSource) {
        let values = view.header_values(&name);
        self.added.push((name, values));
    }

    fn apply(self, header: &mut RequestHeader) {
        for name in self.removed {
            trace!("Removing request header {name}");
            header.remove_header(&name);
        }

        for (name, values) in self.added {
            for value in values {
                trace!("Adding request header {name}: {value}");
                if let Err(err) = header.append_header(name.clone(), value) {
                    warn!("Cannot add value of request header {name}, skipping: {err}");
                }
            }
        }
    }
}

/// Handler for Pingora’s `request_filter` phase, copying principal attributes into request
/// headers
#[derive(Debug)]
pub struct AttributeHeadersHandler {
    mapping: AttributeMapping,
}

impl TryFrom<AttributeHeadersConf> for AttributeHeadersHandler {
    type Error = Box<Error>;

    fn try_from(value: AttributeHeadersConf) -> Result<Self, Self::Error> {
        debug!("Attribute headers configuration received: {value:#?}");

        Ok(Self {
            mapping: value.attribute_mapping,
        })
    }
}

#[async_trait]
impl RequestFilter for AttributeHeadersHandler {
    type Conf = AttributeHeadersConf;

    type CTX = ();

    fn new_ctx() -> Self::CTX {}

    async fn request_filter(
        &self,
        session: &mut impl SessionWrapper,
        _ctx: &mut Self::CTX,
    ) -> Result<RequestFilterResult, Box<Error>> {
        let changes = {
            let view =
                AttributeHeadersView::new(session.req_header(), &self.mapping, session.principal());

            let mut changes = HeaderChanges {
                removed: view.shadowed_header_names().unwrap_or_default(),
                ..Default::default()
            };
            for name in view.attribute_header_names() {
                changes.add(name, &view);
            }
            changes
        };

        trace!("Attribute headers for the request: {changes:?}");
        changes.apply(session.req_header_mut());

        Ok(RequestFilterResult::Unhandled)
    }
}

/// Handler for Pingora’s `request_filter` phase, putting the name of the authenticated user into
/// a request header
#[derive(Debug)]
pub struct UserHeaderHandler {
    header_name: String,
}

impl TryFrom<UserHeaderConf> for UserHeaderHandler {
    type Error = Box<Error>;

    fn try_from(value: UserHeaderConf) -> Result<Self, Self::Error> {
        debug!("User header configuration received: {value:#?}");

        let header_name = if value.header_name.is_empty() {
            DEFAULT_HEADER_NAME.to_owned()
        } else {
            value.header_name
        };

        HeaderName::from_bytes(header_name.as_bytes()).map_err(|err| {
            Error::because(
                ErrorType::InternalError,
                format!("invalid user header name {header_name}"),
                err,
            )
        })?;

        Ok(Self { header_name })
    }
}

#[async_trait]
impl RequestFilter for UserHeaderHandler {
    type Conf = UserHeaderConf;

    type CTX = ();

    fn new_ctx() -> Self::CTX {}

    async fn request_filter(
        &self,
        session: &mut impl SessionWrapper,
        _ctx: &mut Self::CTX,
    ) -> Result<RequestFilterResult, Box<Error>> {
        let changes = {
            let view = UserHeaderView::decorate(
                session.req_header(),
                &self.header_name,
                session.remote_user(),
            );
            if !view.is_overlay() {
                trace!("No authenticated user, leaving request headers unchanged");
                return Ok(RequestFilterResult::Unhandled);
            }

            let mut changes = HeaderChanges {
                removed: vec![self.header_name.clone()],
                ..Default::default()
            };
            changes.add(self.header_name.clone(), &view);
            changes
        };

        trace!("User header for the request: {changes:?}");
        changes.apply(session.req_header_mut());

        Ok(RequestFilterResult::Unhandled)
    }
}

/// Handler for Pingora’s `request_filter` phase, combining user header and attribute headers
#[derive(Debug)]
pub struct SsoHeadersHandler {
    user: UserHeaderHandler,
    attributes: AttributeHeadersHandler,
}

impl TryFrom<SsoHeadersConf> for SsoHeadersHandler {
    type Error = Box<Error>;

    fn try_from(value: SsoHeadersConf) -> Result<Self, Self::Error> {
        Ok(Self {
            user: value.user.try_into()?,
            attributes: value.attributes.try_into()?,
        })
    }
}

#[async_trait]
impl RequestFilter for SsoHeadersHandler {
    type Conf = SsoHeadersConf;

    type CTX = ();

    fn new_ctx() -> Self::CTX {}

    async fn request_filter(
        &self,
        session: &mut impl SessionWrapper,
        _ctx: &mut Self::CTX,
    ) -> Result<RequestFilterResult, Box<Error>> {
        let result = self.user.request_filter(session, &mut ()).await?;
        if result != RequestFilterResult::Unhandled {
            return Ok(result);
        }

        self.attributes.request_filter(session, &mut ()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use sso_module_utils::identity::{AttributeValue, Principal};
    use sso_module_utils::pingora::TestSession;
    use sso_module_utils::FromYaml;
    use test_log::test;

    fn make_handler(conf: &str) -> SsoHeadersHandler {
        SsoHeadersHandler::new(SsoHeadersConf::from_yaml(conf).unwrap()).unwrap()
    }

    async fn make_session(headers: &[(&str, &str)]) -> TestSession {
        let mut header = RequestHeader::build("GET", b"/", None).unwrap();
        for (name, value) in headers {
            header
                .append_header((*name).to_owned(), (*value).to_owned())
                .unwrap();
        }
        TestSession::from(header).await
    }

    fn values(session: &TestSession, name: &str) -> Vec<String> {
        session.req_header().header_values(name)
    }

    fn alice(attribute: &str, value: impl Into<AttributeValue>) -> Principal {
        Principal::new("alice").with_attribute(attribute, value)
    }

    #[test(tokio::test)]
    async fn explicit_mapping() {
        let handler = make_handler("attribute_mapping: employeeId=X-Employee-Id");
        let mut session =
            make_session(&[("X-Employee-Id", "007"), ("Accept", "text/html")]).await;
        session.set_principal(alice("employeeId", 42i64));

        let result = handler.request_filter(&mut session, &mut ()).await.unwrap();
        assert_eq!(result, RequestFilterResult::Unhandled);

        assert_eq!(values(&session, "X-Employee-Id"), vec!["42"]);
        assert_eq!(values(&session, "X-Remote-User"), vec!["alice"]);
        assert_eq!(values(&session, "Accept"), vec!["text/html"]);
    }

    #[test(tokio::test)]
    async fn implicit_mapping() {
        let handler = make_handler("{}");
        let mut session = make_session(&[
            ("CAS_mail", "forged@example.com"),
            ("cas_other", "forged"),
            ("Accept", "text/html"),
        ])
        .await;
        session.set_principal(alice("mail", "alice@example.com"));

        handler.request_filter(&mut session, &mut ()).await.unwrap();

        assert_eq!(values(&session, "CAS_mail"), vec!["alice@example.com"]);
        assert!(values(&session, "CAS_other").is_empty());
        assert_eq!(values(&session, "X-Remote-User"), vec!["alice"]);
        assert_eq!(values(&session, "Accept"), vec!["text/html"]);
    }

    #[test(tokio::test)]
    async fn not_authenticated() {
        let handler = make_handler("attribute_mapping: employeeId=X-Employee-Id");
        let mut session = make_session(&[
            ("X-Employee-Id", "007"),
            ("X-Remote-User", "mallory"),
            ("Accept", "text/html"),
        ])
        .await;

        let result = handler.request_filter(&mut session, &mut ()).await.unwrap();
        assert_eq!(result, RequestFilterResult::Unhandled);

        // Mapped headers are never taken from the client
        assert!(values(&session, "X-Employee-Id").is_empty());

        // User header is only set for authenticated requests
        assert_eq!(values(&session, "X-Remote-User"), vec!["mallory"]);
        assert_eq!(values(&session, "Accept"), vec!["text/html"]);
    }

    #[test(tokio::test)]
    async fn custom_header_name() {
        let handler = make_handler("header_name: X-Login");
        let mut session = make_session(&[("x-login", "mallory")]).await;
        session.set_remote_user("bob".to_owned());

        handler.request_filter(&mut session, &mut ()).await.unwrap();

        assert_eq!(values(&session, "X-Login"), vec!["bob"]);
        assert!(values(&session, "X-Remote-User").is_empty());
    }

    #[test(tokio::test)]
    async fn empty_header_name() {
        let handler = make_handler("header_name: ''");
        let mut session = make_session(&[]).await;
        session.set_remote_user("bob".to_owned());

        handler.request_filter(&mut session, &mut ()).await.unwrap();

        assert_eq!(values(&session, "X-Remote-User"), vec!["bob"]);
    }

    #[test(tokio::test)]
    async fn multi_valued() {
        let handler = make_handler("attribute_mapping: memberOf=X-Groups");
        let mut session = make_session(&[("X-Groups", "admins")]).await;
        session.set_principal(alice("memberOf", vec!["staff", "developers"]));

        handler.request_filter(&mut session, &mut ()).await.unwrap();

        assert_eq!(values(&session, "X-Groups"), vec!["staff", "developers"]);
    }

    #[test(tokio::test)]
    async fn invalid_value() {
        let handler = make_handler("attribute_mapping: displayName=X-Display-Name");
        let mut session = make_session(&[("X-Display-Name", "Mallory")]).await;
        session.set_principal(alice("displayName", "Alice\nX-Admin: true"));

        handler.request_filter(&mut session, &mut ()).await.unwrap();

        assert!(values(&session, "X-Display-Name").is_empty());
        assert!(values(&session, "X-Admin").is_empty());
        assert_eq!(values(&session, "X-Remote-User"), vec!["alice"]);
    }

    #[test(tokio::test)]
    async fn standalone_handlers() {
        let user_handler = UserHeaderHandler::new(UserHeaderConf::default()).unwrap();
        let attribute_handler = AttributeHeadersHandler::new(
            AttributeHeadersConf::from_yaml("attribute_mapping: mail=X-Mail").unwrap(),
        )
        .unwrap();

        let mut session = make_session(&[("X-Mail", "forged@example.com")]).await;
        session.set_principal(alice("mail", "alice@example.com"));

        user_handler.request_filter(&mut session, &mut ()).await.unwrap();
        assert_eq!(values(&session, "X-Remote-User"), vec!["alice"]);
        assert_eq!(values(&session, "X-Mail"), vec!["forged@example.com"]);

        attribute_handler
            .request_filter(&mut session, &mut ())
            .await
            .unwrap();
        assert_eq!(values(&session, "X-Mail"), vec!["alice@example.com"]);
    }

    #[test]
    fn invalid_configuration() {
        let conf = SsoHeadersConf::from_yaml("header_name: X Login").unwrap();
        assert!(SsoHeadersHandler::new(conf).is_err());

        assert!(SsoHeadersConf::from_yaml("attribute_mapping: a=X-Test b=x-test").is_err());
        assert!(SsoHeadersConf::from_yaml("attribute_mapping: '=X-Test'").is_err());
    }
}
