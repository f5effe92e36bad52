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

use crate::constants::*;
use crate::credential::Credential;
use crate::query::QueryParameters;
use alikms_core::hash::base64_hmac_sha1;
use alikms_core::time::{format_iso8601_millis, now, DateTime};
use alikms_core::Result;
use log::debug;
use percent_encoding::utf8_percent_encode;
use std::fmt::Write;

/// RequestSigner signs KMS RPC calls with HMAC-SHA1.
///
/// Signing mutates the parameter set in place: the common parameters are
/// added, falsy values are dropped and `Signature` is set last. The same
/// parameter set is then sent as the query string.
#[derive(Debug, Clone)]
pub struct RequestSigner {
    api_version: String,
    time: Option<DateTime>,
}

impl Default for RequestSigner {
    fn default() -> Self {
        Self::new(DEFAULT_API_VERSION)
    }
}

impl RequestSigner {
    /// Create a new signer for the given API version.
    pub fn new(api_version: &str) -> Self {
        Self {
            api_version: api_version.to_string(),
            time: None,
        }
    }

    /// Specify the signing time.
    ///
    /// # Note
    ///
    /// We should always take current time to sign requests.
    /// Only use this function for testing.
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.time = Some(time);
        self
    }

    /// The time the next signature is taken at, now unless pinned.
    pub(crate) fn signing_time(&self) -> DateTime {
        self.time.unwrap_or_else(now)
    }

    /// Sign `query` for `method` with `cred`, returning the signature.
    ///
    /// On return `query` holds exactly the parameters to send, `Signature`
    /// included.
    pub fn sign(
        &self,
        query: &mut QueryParameters,
        method: &http::Method,
        cred: &Credential,
    ) -> Result<String> {
        self.sign_at(query, method, cred, self.signing_time())
    }

    /// Same as [`RequestSigner::sign`], with `Timestamp` taken from `time`.
    pub fn sign_at(
        &self,
        query: &mut QueryParameters,
        method: &http::Method,
        cred: &Credential,
        time: DateTime,
    ) -> Result<String> {
        query.insert("Format", RESPONSE_FORMAT);
        query.insert("Version", self.api_version.as_str());
        query.insert("AccessKeyId", cred.access_key_id.as_str());
        query.insert("SignatureMethod", SIGNATURE_METHOD);
        query.insert("SignatureVersion", SIGNATURE_VERSION);
        query.insert("Timestamp", format_iso8601_millis(time));
        if let Some(token) = &cred.security_token {
            query.insert("SecurityToken", token.as_str());
        }
        if let Some(token) = &cred.bearer_token {
            query.insert("BearerToken", token.as_str());
        }

        query.remove("Signature");
        query.remove_falsy();

        if cred.access_key_secret.is_empty() {
            debug!("signing request without access key secret, signing key is '&'");
        }

        let string_to_sign = string_to_sign(method, &canonical_query_string(query))?;
        debug!("calculated string to sign: {string_to_sign}");

        let signature = base64_hmac_sha1(
            format!("{}&", cred.access_key_secret).as_bytes(),
            string_to_sign.as_bytes(),
        );
        query.insert("Signature", signature.as_str());

        Ok(signature)
    }
}

/// Percent-encode `s` with the RPC unreserved set.
pub fn percent_encode(s: &str) -> String {
    utf8_percent_encode(s, &RPC_QUERY_ENCODE_SET).to_string()
}

/// Build `k=v&k=v` over `query` in key order, falsy values skipped.
///
/// The same string is used as the wire query once `Signature` is present.
pub fn canonical_query_string(query: &QueryParameters) -> String {
    query
        .iter()
        .filter(|(_, v)| !v.is_falsy())
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(&v.to_string())))
        .collect::<Vec<_>>()
        .join("&")
}

/// Build `{METHOD}&%2F&{pe(canonical)}`.
pub fn string_to_sign(method: &http::Method, canonical: &str) -> Result<String> {
    let mut s = String::new();
    write!(
        &mut s,
        "{}&{}&{}",
        method.as_str(),
        percent_encode("/"),
        percent_encode(canonical)
    )?;
    Ok(s)
}
