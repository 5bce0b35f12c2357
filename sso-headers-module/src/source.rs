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

//! Read access to request headers.

use http::{HeaderMap, HeaderValue};
use sso_module_utils::pingora::RequestHeader;

/// Read access to the headers of a request
///
/// Header names are compared case-insensitively. Header values that aren’t valid UTF-8 are
/// converted lossily.
pub trait HeaderSource {
    /// Returns the names of all headers present, or `None` if the headers cannot be enumerated.
    fn header_names(&self) -> Option<Vec<String>>;

    /// Returns all values of a header in order, an empty list if the header isn’t present.
    fn header_values(&self, name: &str) -> Vec<String>;

    /// Returns the first value of a header, `None` if the header isn’t present.
    fn first_header_value(&self, name: &str) -> Option<String> {
        self.header_values(name).into_iter().next()
    }
}

fn to_string(value: &HeaderValue) -> String {
    String::from_utf8_lossy(value.as_bytes()).into_owned()
}

impl HeaderSource for HeaderMap {
    fn header_names(&self) -> Option<Vec<String>> {
        Some(self.keys().map(|name| name.as_str().to_owned()).collect())
    }

    fn header_values(&self, name: &str) -> Vec<String> {
        self.get_all(name).iter().map(to_string).collect()
    }

    fn first_header_value(&self, name: &str) -> Option<String> {
        self.get(name).map(to_string)
    }
}

impl HeaderSource for RequestHeader {
    fn header_names(&self) -> Option<Vec<String>> {
        self.headers.header_names()
    }

    fn header_values(&self, name: &str) -> Vec<String> {
        self.headers.header_values(name)
    }

    fn first_header_value(&self, name: &str) -> Option<String> {
        self.headers.first_header_value(name)
    }
}

impl<T: HeaderSource + ?Sized> HeaderSource for &T {
    fn header_names(&self) -> Option<Vec<String>> {
        (**self).header_names()
    }

    fn header_values(&self, name: &str) -> Vec<String> {
        (**self).header_values(name)
    }

    fn first_header_value(&self, name: &str) -> Option<String> {
        (**self).first_header_value(name)
    }
}

/// A request that is either passed on unchanged or wrapped in an overlay view
#[derive(Debug)]
pub enum RequestView<'a, R: ?Sized, V> {
    /// The original request, no decoration applied
    Original(&'a R),
    /// The request wrapped in an overlay view
    Overlay(V),
}

impl<R: ?Sized, V> RequestView<'_, R, V> {
    /// Returns `true` if the request has been wrapped in an overlay view.
    pub fn is_overlay(&self) -> bool {
        matches!(self, Self::Overlay(_))
    }
}

impl<R, V> HeaderSource for RequestView<'_, R, V>
where
    R: HeaderSource + ?Sized,
    V: HeaderSource,
{
    fn header_names(&self) -> Option<Vec<String>> {
        match self {
            Self::Original(request) => request.header_names(),
            Self::Overlay(view) => view.header_names(),
        }
    }

    fn header_values(&self, name: &str) -> Vec<String> {
        match self {
            Self::Original(request) => request.header_values(name),
            Self::Overlay(view) => view.header_values(name),
        }
    }

    fn first_header_value(&self, name: &str) -> Option<String> {
        match self {
            Self::Original(request) => request.first_header_value(name),
            Self::Overlay(view) => view.first_header_value(name),
        }
    }
}
