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

//! Exposes some types from the `pingora` crate, so that typical modules no longer need it as a
//! direct dependency.

use http::Extensions;
pub use pingora::http::RequestHeader;
pub use pingora::proxy::{ProxyHttp, Session};
pub use pingora::{Error, ErrorType};
use std::fmt::{self, Debug, Formatter};
use std::io::{Cursor, Seek, SeekFrom, Write};
use std::ops::{Deref, DerefMut};

use crate::identity::Principal;

/// A trait implemented by wrappers around Pingora’s session
///
/// All the usual methods and fields of [`Session`] are available as well.
pub trait SessionWrapper: Send + Deref<Target = Session> + DerefMut {
    /// Returns a reference to the associated extensions.
    fn extensions(&self) -> &Extensions;

    /// Returns a mutable reference to the associated extensions.
    fn extensions_mut(&mut self) -> &mut Extensions;

    /// Returns the name of the authorized user if any
    ///
    /// This is the name set explicitly via [`SessionWrapper::set_remote_user`] or, failing that,
    /// the name of the principal.
    fn remote_user(&self) -> Option<&str> {
        if let Some(RemoteUser(remote_user)) = self.extensions().get() {
            Some(remote_user)
        } else {
            self.principal().map(Principal::name)
        }
    }

    /// Sets the name of the authorized user
    fn set_remote_user(&mut self, remote_user: String) {
        self.extensions_mut().insert(RemoteUser(remote_user));
    }

    /// Returns the principal established by single-sign-on authentication if any
    fn principal(&self) -> Option<&Principal> {
        self.extensions().get()
    }

    /// Sets the principal established by single-sign-on authentication
    fn set_principal(&mut self, principal: Principal) {
        self.extensions_mut().insert(principal);
    }
}

/// Type used to store remote user’s name in `SessionWrapper::extensions`
#[derive(Debug, Clone)]
struct RemoteUser(String);

/// A session wrapper for tests, owning the Pingora session and its extensions
pub struct TestSession {
    session: Session,
    extensions: Extensions,
}

impl Debug for TestSession {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestSession")
            .field("req_header", self.session.req_header())
            .field("extensions", &self.extensions)
            .finish_non_exhaustive()
    }
}

impl TestSession {
    /// Creates a new test session with the given request header
    pub async fn from(header: RequestHeader) -> Self {
        Self {
            session: create_test_session(header).await,
            extensions: Extensions::new(),
        }
    }
}

impl SessionWrapper for TestSession {
    fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }
}

impl Deref for TestSession {
    type Target = Session;

    fn deref(&self) -> &Self::Target {
        &self.session
    }
}

impl DerefMut for TestSession {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.session
    }
}

/// Creates a new Pingora session for tests with given request header
pub async fn create_test_session(header: RequestHeader) -> Session {
    let mut cursor = Cursor::new(Vec::<u8>::new());
    let _ = cursor.write(b"GET / HTTP/1.1\r\n");
    let _ = cursor.write(b"Connection: close\r\n");
    let _ = cursor.write(b"\r\n");
    let _ = cursor.seek(SeekFrom::Start(0));

    let mut session = Session::new_h1(Box::new(cursor));
    assert!(session.read_request().await.unwrap());
    *session.req_header_mut() = header;

    session
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    async fn make_session() -> TestSession {
        let header = RequestHeader::build("GET", b"/", None).unwrap();
        TestSession::from(header).await
    }

    #[test(tokio::test)]
    async fn remote_user() {
        let mut session = make_session().await;
        assert_eq!(session.remote_user(), None);
        assert_eq!(session.principal(), None);

        session.set_principal(Principal::new("alice").with_attribute("mail", "a@example.com"));
        assert_eq!(session.remote_user(), Some("alice"));
        assert_eq!(session.principal().map(Principal::name), Some("alice"));

        session.set_remote_user("bob".to_owned());
        assert_eq!(session.remote_user(), Some("bob"));
        assert_eq!(session.principal().map(Principal::name), Some("alice"));
    }
}
