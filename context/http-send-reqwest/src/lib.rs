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

//! Reqwest-based transport for alikms.
//!
//! `ReqwestHttpSend` implements [`HttpSend`] on top of [`reqwest::Client`] and
//! honours the [`TransportOptions`] the retry engine attaches to every attempt:
//!
//! - `timeout` is applied to the reqwest request; an expired timeout is
//!   reported as [`ErrorKind::Timeout`](alikms_core::ErrorKind::Timeout) so the
//!   attempt is retried.
//! - `ignore_ssl` routes the request through a second client that accepts
//!   invalid certificates. That client is built on first use.
//!
//! ## Example
//!
//! ```no_run
//! use alikms_core::Context;
//! use alikms_http_send_reqwest::ReqwestHttpSend;
//!
//! let ctx = Context::new().with_http_send(ReqwestHttpSend::default());
//! ```

use alikms_core::{Error, HttpSend, Result, TransportOptions};
use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::BodyExt;
use once_cell::sync::OnceCell;
use reqwest::{Client, Request};

/// HttpSend implementation backed by reqwest.
#[derive(Debug, Default)]
pub struct ReqwestHttpSend {
    client: Client,
    insecure_client: OnceCell<Client>,
}

impl ReqwestHttpSend {
    /// Create a new ReqwestHttpSend with a reqwest::Client.
    ///
    /// The client is used for every request that does not ask to ignore TLS
    /// verification.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            insecure_client: OnceCell::new(),
        }
    }

    fn client_for(&self, opts: Option<&TransportOptions>) -> Result<&Client> {
        if !opts.is_some_and(|o| o.ignore_ssl) {
            return Ok(&self.client);
        }

        self.insecure_client.get_or_try_init(|| {
            log::debug!("building reqwest client that skips certificate verification");
            Client::builder()
                .danger_accept_invalid_certs(true)
                .build()
                .map_err(|e| Error::unexpected("failed to build reqwest client").with_source(e))
        })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::timeout("request timed out").with_source(err)
    } else {
        Error::unexpected("failed to send request").with_source(err)
    }
}

#[async_trait]
impl HttpSend for ReqwestHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        let opts = req.extensions().get::<TransportOptions>().copied();
        let client = self.client_for(opts.as_ref())?;

        let mut req = Request::try_from(req)
            .map_err(|e| Error::request_invalid("failed to convert request").with_source(e))?;
        if let Some(opts) = opts {
            *req.timeout_mut() = Some(opts.timeout);
        }

        let resp: http::Response<_> = client
            .execute(req)
            .await
            .map_err(map_reqwest_error)?
            .into();

        let (parts, body) = resp.into_parts();
        let bs = BodyExt::collect(body)
            .await
            .map(|buf| buf.to_bytes())
            .map_err(map_reqwest_error)?;
        Ok(http::Response::from_parts(parts, bs))
    }
}
