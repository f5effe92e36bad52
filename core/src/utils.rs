// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Utility functions and types.

use std::fmt::{Debug, Display, Formatter, Write};

use http::HeaderMap;

/// Redacts a string by replacing all but the first and last three characters with asterisks.
///
/// - If the input string has fewer than 12 characters, it should be entirely redacted.
/// - If the input string has 12 or more characters, only the first three and the last three.
///
/// This design is to allow users to distinguish between different redacted strings but avoid
/// leaking sensitive information.
pub struct Redact<'a>(&'a str);

impl<'a> From<&'a str> for Redact<'a> {
    fn from(value: &'a str) -> Self {
        Redact(value)
    }
}

impl<'a> From<&'a String> for Redact<'a> {
    fn from(value: &'a String) -> Self {
        Redact(value.as_str())
    }
}

impl<'a> From<&'a Option<String>> for Redact<'a> {
    fn from(value: &'a Option<String>) -> Self {
        Redact(value.as_deref().unwrap_or_default())
    }
}

impl Debug for Redact<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let length = self.0.len();
        if length == 0 {
            f.write_str("EMPTY")
        } else if length < 12 || !self.0.is_char_boundary(3) || !self.0.is_char_boundary(length - 3)
        {
            f.write_str("***")
        } else {
            f.write_str(&self.0[..3])?;
            f.write_str("***")?;
            f.write_str(&self.0[length - 3..])
        }
    }
}

impl Display for Redact<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(self, f)
    }
}

/// Renders a header map as `name: value` lines, redacting values marked sensitive.
///
/// Used when a request has to be described in an error or a log line.
pub fn format_headers(headers: &HeaderMap) -> String {
    let mut s = String::new();
    for (idx, (name, value)) in headers.iter().enumerate() {
        if idx > 0 {
            s.push_str(", ");
        }
        let sensitive = value.is_sensitive();
        let value = value.to_str().unwrap_or("<binary>");
        if sensitive {
            let _ = write!(s, "{}: {}", name, Redact::from(value));
        } else {
            let _ = write!(s, "{}: {}", name, value);
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_redact() {
        let cases = vec![
            ("Short", "***"),
            ("LTAI5tKMSaccesskey", "LTA***key"),
            ("", "EMPTY"),
            ("HelloWorld", "***"),
        ];

        for (input, expected) in cases {
            assert_eq!(
                format!("{:?}", Redact(input)),
                expected,
                "Failed on input: {}",
                input
            );
        }
    }

    #[test]
    fn test_redact_option() {
        assert_eq!(format!("{}", Redact::from(&None)), "EMPTY");
        assert_eq!(
            format!("{}", Redact::from(&Some("security-token-value".to_string()))),
            "sec***lue"
        );
    }

    #[test]
    fn test_format_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("host", HeaderValue::from_static("kms.cn-hangzhou.aliyuncs.com"));
        let mut token = HeaderValue::from_static("CAIShwJ1q6Ft5B2yfSjIr5bSEsj4g7Bih");
        token.set_sensitive(true);
        headers.insert("x-acs-security-token", token);

        assert_eq!(
            format_headers(&headers),
            "host: kms.cn-hangzhou.aliyuncs.com, x-acs-security-token: CAI***Bih"
        );
    }
}
