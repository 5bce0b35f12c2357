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

//! Header view adding the name of the authenticated user.

use crate::source::{HeaderSource, RequestView};

/// Header receiving the user name if no other header name is configured
pub const DEFAULT_HEADER_NAME: &str = "X-Remote-User";

/// Header view of a request where one header carries the name of the authenticated user
#[derive(Debug)]
pub struct UserHeaderView<'a, R: ?Sized> {
    request: &'a R,
    header_name: &'a str,
    remote_user: &'a str,
}

impl<'a, R: HeaderSource + ?Sized> UserHeaderView<'a, R> {
    /// Wraps a request, the header `header_name` will resolve to `remote_user`.
    pub fn new(request: &'a R, header_name: &'a str, remote_user: &'a str) -> Self {
        Self {
            request,
            header_name,
            remote_user,
        }
    }

    /// Wraps the request if there is an authenticated user, otherwise returns the request
    /// unchanged.
    pub fn decorate(
        request: &'a R,
        header_name: &'a str,
        remote_user: Option<&'a str>,
    ) -> RequestView<'a, R, Self> {
        match remote_user {
            Some(remote_user) => RequestView::Overlay(Self::new(request, header_name, remote_user)),
            None => RequestView::Original(request),
        }
    }

    fn is_user_header(&self, name: &str) -> bool {
        name.eq_ignore_ascii_case(self.header_name)
    }
}

impl<R: HeaderSource + ?Sized> HeaderSource for UserHeaderView<'_, R> {
    fn header_names(&self) -> Option<Vec<String>> {
        let mut names = Vec::new();
        for name in self.request.header_names()? {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        if !names.iter().any(|name| name == self.header_name) {
            names.push(self.header_name.to_owned());
        }
        Some(names)
    }

    fn header_values(&self, name: &str) -> Vec<String> {
        if self.is_user_header(name) {
            vec![self.remote_user.to_owned()]
        } else {
            self.request.header_values(name)
        }
    }

    fn first_header_value(&self, name: &str) -> Option<String> {
        if self.is_user_header(name) {
            Some(self.remote_user.to_owned())
        } else {
            self.request.first_header_value(name)
        }
    }
}
