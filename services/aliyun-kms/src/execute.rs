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

use crate::classify::Classification;
use crate::constants::*;
use crate::query::QueryParameters;
use crate::sign_request::{canonical_query_string, RequestSigner};
use crate::Credential;
use alikms_core::time::DateTime;
use alikms_core::utils::format_headers;
use alikms_core::{Context, EffectiveOptions, Error, ProvideCredential, Result};
use bytes::Bytes;
use chrono::TimeDelta;
use http::header::HOST;
use http::{HeaderMap, HeaderValue, Method};
use log::debug;
use serde_json::Value;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// What was sent in one attempt, kept to describe the failure.
#[derive(Debug, Clone)]
struct RequestSnapshot {
    method: Method,
    path: String,
    headers: HeaderMap,
}

impl RequestSnapshot {
    fn new(req: &http::Request<Bytes>) -> Self {
        Self {
            method: req.method().clone(),
            path: req
                .uri()
                .path_and_query()
                .map(|v| v.to_string())
                .unwrap_or_else(|| "/".to_string()),
            headers: req.headers().clone(),
        }
    }
}

/// The last retryable failure seen by the engine.
#[derive(Debug)]
struct Attempt {
    request: RequestSnapshot,
    elapsed: Duration,
    failure: Error,
}

/// Executor drives one KMS call through sign, send and classify until it
/// succeeds, fails terminally or runs out of attempts.
#[derive(Clone)]
pub(crate) struct Executor {
    ctx: Context,
    endpoint: String,
    signer: RequestSigner,
    provider: Arc<dyn ProvideCredential<Credential = Credential>>,
}

impl Debug for Executor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("endpoint", &self.endpoint)
            .field("signer", &self.signer)
            .field("provider", &self.provider)
            .finish()
    }
}

impl Executor {
    pub(crate) fn new(
        ctx: Context,
        endpoint: String,
        signer: RequestSigner,
        provider: Arc<dyn ProvideCredential<Credential = Credential>>,
    ) -> Self {
        Self {
            ctx,
            endpoint,
            signer,
            provider,
        }
    }

    pub(crate) fn with_provider(
        mut self,
        provider: Arc<dyn ProvideCredential<Credential = Credential>>,
    ) -> Self {
        self.provider = provider;
        self
    }

    /// Execute the call described by `params` with validated options.
    pub(crate) async fn execute(
        &self,
        params: &QueryParameters,
        opts: EffectiveOptions,
    ) -> Result<Value> {
        let started = Instant::now();
        let deadline = opts.deadline.map(|d| started + d);
        let mut last: Option<Attempt> = None;
        let mut last_signed_at: Option<DateTime> = None;
        let mut attempts = 0;

        while attempts < opts.max_attempts {
            if attempts > 0 {
                let delay = opts.backoff_delay(attempts);
                if deadline.is_some_and(|d| Instant::now() + delay >= d) {
                    debug!("deadline leaves no room for backoff of {delay:?}, stop retrying");
                    break;
                }
                if !delay.is_zero() {
                    debug!("backoff {delay:?} before attempt {}", attempts + 1);
                    tokio::time::sleep(delay).await;
                }
            }

            let remaining = match deadline {
                Some(d) => {
                    let remaining = d.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        break;
                    }
                    Some(remaining)
                }
                None => None,
            };

            let cred = self
                .provider
                .provide_credential(&self.ctx)
                .await?
                .ok_or_else(|| {
                    Error::credential_invalid("no valid credential found")
                        .with_context("endpoint", &self.endpoint)
                })?;

            let signed_at = next_signing_time(self.signer.signing_time(), last_signed_at);
            last_signed_at = Some(signed_at);

            let mut query = params.clone();
            self.signer.sign_at(&mut query, &Method::GET, &cred, signed_at)?;

            let mut req = build_request(&self.endpoint, &query, &cred)?;
            let snapshot = RequestSnapshot::new(&req);
            let transport = opts.transport_options(remaining);
            req.extensions_mut().insert(transport);

            attempts += 1;
            debug!(
                "sending attempt {attempts}/{}: {} {}",
                opts.max_attempts, snapshot.method, snapshot.path
            );

            let attempt_started = Instant::now();
            let result = match tokio::time::timeout(transport.timeout, self.ctx.http_send(req)).await
            {
                Ok(result) => result,
                Err(_) => Err(Error::timeout(format!(
                    "attempt timed out after {:?}",
                    transport.timeout
                ))),
            };

            match Classification::from_send_result(result) {
                Classification::Success(v) => return Ok(v),
                Classification::TerminalFailure(err) => return Err(err),
                Classification::RetryableFailure(err) => {
                    debug!("attempt {attempts} failed with retryable error: {err}");
                    last = Some(Attempt {
                        request: snapshot,
                        elapsed: attempt_started.elapsed(),
                        failure: err,
                    });
                }
            }
        }

        Err(exhausted(attempts, started.elapsed(), last))
    }
}

/// Timestamps have millisecond precision, so every attempt of one call is
/// signed at least one millisecond after the previous one.
fn next_signing_time(now: DateTime, prev: Option<DateTime>) -> DateTime {
    match prev {
        Some(prev) => now.max(prev + TimeDelta::milliseconds(1)),
        None => now,
    }
}

fn exhausted(attempts: usize, elapsed: Duration, last: Option<Attempt>) -> Error {
    let Some(last) = last else {
        return Error::retry_exhausted("deadline exceeded before any attempt was sent")
            .with_context("attempts", attempts)
            .with_context("elapsed", format!("{elapsed:?}"));
    };

    Error::retry_exhausted(format!(
        "retry failed after {attempts} attempts: {}",
        last.failure
    ))
    .with_context("method", &last.request.method)
    .with_context("path", &last.request.path)
    .with_context("headers", format_headers(&last.request.headers))
    .with_context("attempts", attempts)
    .with_context("elapsed", format!("{elapsed:?}"))
    .with_context("last_attempt_elapsed", format!("{:?}", last.elapsed))
    .with_source(last.failure)
}

/// Split an endpoint into scheme and host, `https` unless given explicitly.
fn split_endpoint(endpoint: &str) -> (&str, &str) {
    let (scheme, host) = if let Some(host) = endpoint.strip_prefix("https://") {
        ("https", host)
    } else if let Some(host) = endpoint.strip_prefix("http://") {
        ("http", host)
    } else {
        ("https", endpoint)
    };
    (scheme, host.trim_end_matches('/'))
}

/// Build the GET request carrying a signed `query`.
fn build_request(
    endpoint: &str,
    query: &QueryParameters,
    cred: &Credential,
) -> Result<http::Request<Bytes>> {
    let (scheme, host) = split_endpoint(endpoint);
    let uri = format!("{scheme}://{host}/?{}", canonical_query_string(query));

    let mut req = http::Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(HOST, host)
        .body(Bytes::new())?;

    if let Some(token) = &cred.security_token {
        let mut value = HeaderValue::from_str(token)?;
        value.set_sensitive(true);
        req.headers_mut().insert(X_ACS_SECURITY_TOKEN, value);
    }
    if let Some(token) = &cred.bearer_token {
        let mut value = HeaderValue::from_str(token)?;
        value.set_sensitive(true);
        req.headers_mut().insert(X_ACS_BEARER_TOKEN, value);
    }

    Ok(req)
}
