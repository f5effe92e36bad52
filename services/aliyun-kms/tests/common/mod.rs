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

#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use alikms::{Client, Config, Credential};
use alikms_core::{Context, HttpSend, ProvideCredential, Result, TransportOptions};
use async_trait::async_trait;
use bytes::Bytes;
use http::HeaderMap;
use percent_encoding::percent_decode_str;

pub const ENDPOINT: &str = "kms.cn-hangzhou.aliyuncs.com";
pub const ACCESS_KEY_ID: &str = "LTAI5tKMSaccesskey";
pub const ACCESS_KEY_SECRET: &str = "kms-secret-value-123";

/// One scripted answer of [`MockKms`].
#[derive(Debug, Clone)]
pub enum Reply {
    Status(u16, &'static str),
    Delayed(Duration, u16, &'static str),
}

/// A request as received by [`MockKms`].
#[derive(Debug, Clone)]
pub struct Received {
    pub at: Instant,
    pub uri: http::Uri,
    pub headers: HeaderMap,
    pub transport: Option<TransportOptions>,
}

impl Received {
    /// Decoded query parameters.
    pub fn query(&self) -> BTreeMap<String, String> {
        self.uri
            .query()
            .unwrap_or_default()
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
                (
                    percent_decode_str(k).decode_utf8_lossy().to_string(),
                    percent_decode_str(v).decode_utf8_lossy().to_string(),
                )
            })
            .collect()
    }
}

#[derive(Debug, Default)]
struct MockState {
    replies: VecDeque<Reply>,
    last: Option<Reply>,
    received: Vec<Received>,
}

/// MockKms answers requests from a script, repeating the last reply once the
/// script is used up.
#[derive(Debug, Clone, Default)]
pub struct MockKms {
    state: Arc<Mutex<MockState>>,
}

impl MockKms {
    pub fn new(replies: Vec<Reply>) -> Self {
        let mock = MockKms::default();
        mock.state.lock().unwrap().replies = replies.into();
        mock
    }

    pub fn received(&self) -> Vec<Received> {
        self.state.lock().unwrap().received.clone()
    }

    pub fn count(&self) -> usize {
        self.state.lock().unwrap().received.len()
    }
}

#[async_trait]
impl HttpSend for MockKms {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        let reply = {
            let mut state = self.state.lock().unwrap();
            state.received.push(Received {
                at: Instant::now(),
                uri: req.uri().clone(),
                headers: req.headers().clone(),
                transport: req.extensions().get::<TransportOptions>().copied(),
            });
            let reply = match state.replies.pop_front() {
                Some(reply) => reply,
                None => state.last.clone().unwrap_or(Reply::Status(200, "{}")),
            };
            state.last = Some(reply.clone());
            reply
        };

        let (status, body) = match reply {
            Reply::Status(status, body) => (status, body),
            Reply::Delayed(delay, status, body) => {
                tokio::time::sleep(delay).await;
                (status, body)
            }
        };

        Ok(http::Response::builder()
            .status(status)
            .body(Bytes::from_static(body.as_bytes()))?)
    }
}

/// RotatingProvider hands out a new access key id on every call.
#[derive(Debug, Clone, Default)]
pub struct RotatingProvider {
    calls: Arc<Mutex<usize>>,
}

impl RotatingProvider {
    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl ProvideCredential for RotatingProvider {
    type Credential = Credential;

    async fn provide_credential(&self, _: &Context) -> Result<Option<Self::Credential>> {
        let mut calls = self.calls.lock().unwrap();
        *calls += 1;
        Ok(Some(Credential {
            access_key_id: format!("rotating_key_{calls}"),
            access_key_secret: format!("rotating_secret_{calls}"),
            ..Default::default()
        }))
    }
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn config() -> Config {
    Config::default()
        .with_endpoint(ENDPOINT)
        .with_access_key(ACCESS_KEY_ID, ACCESS_KEY_SECRET)
}

pub fn client(mock: &MockKms) -> Client {
    init_logger();
    Client::new(Context::new().with_http_send(mock.clone()), config())
        .expect("client must be created")
}
