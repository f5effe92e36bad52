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

//! Aliyun KMS client for alikms.
//!
//! This crate signs and executes calls to the Alibaba Cloud Key Management
//! Service RPC API.
//!
//! ## Overview
//!
//! Every call is a `GET` whose query string carries the action parameters, a
//! set of common parameters and an HMAC-SHA1 `Signature`. The [`Client`]
//! resolves a credential, signs a fresh copy of the parameters, sends the
//! request and classifies the response, retrying server errors and timeouts
//! according to [`RuntimeOptions`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use alikms::{Client, Config};
//! use alikms_core::{Context, OsEnv, RuntimeOptions};
//! use alikms_http_send_reqwest::ReqwestHttpSend;
//!
//! #[tokio::main]
//! async fn main() -> alikms_core::Result<()> {
//!     let ctx = Context::new()
//!         .with_http_send(ReqwestHttpSend::default())
//!         .with_env(OsEnv);
//!
//!     let config = Config::default()
//!         .with_endpoint("kms.cn-hangzhou.aliyuncs.com")
//!         .from_env(&ctx);
//!     let client = Client::new(ctx, config)?;
//!
//!     let regions = client.describe_regions(&RuntimeOptions::default()).await?;
//!     println!("{regions}");
//!     Ok(())
//! }
//! ```
//!
//! ## Credential Sources
//!
//! [`Client::new`] signs with the static credential of [`Config`]. Use
//! [`Client::with_credential_provider`] to resolve credentials dynamically,
//! for example through [`DefaultCredentialProvider`]:
//!
//! ```bash
//! export ALIBABA_CLOUD_ACCESS_KEY_ID=your-access-key-id
//! export ALIBABA_CLOUD_ACCESS_KEY_SECRET=your-access-key-secret
//! export ALIBABA_CLOUD_SECURITY_TOKEN=your-sts-token  # Optional, for STS
//! ```
//!
//! or an OIDC token exchanged with STS:
//!
//! ```bash
//! export ALIBABA_CLOUD_ROLE_ARN=acs:ram::123456789012:role/MyRole
//! export ALIBABA_CLOUD_OIDC_PROVIDER_ARN=acs:ram::123456789012:oidc-provider/MyProvider
//! export ALIBABA_CLOUD_OIDC_TOKEN_FILE=/var/run/secrets/token
//! ```
//!
//! The provider is asked again before every attempt. Wrap it in
//! [`alikms_core::CachedCredentialProvider`] to reuse a credential until it
//! expires.
//!
//! ## Retries
//!
//! ```no_run
//! # use alikms::Client;
//! # async fn example(client: Client) -> alikms_core::Result<()> {
//! use alikms_core::{BackoffPolicy, RuntimeOptions};
//! use std::time::Duration;
//!
//! let opts = RuntimeOptions::new()
//!     .with_max_attempts(5)
//!     .with_backoff_policy(BackoffPolicy::Exponential)
//!     .with_backoff_period(Duration::from_millis(100))
//!     .with_deadline(Duration::from_secs(30));
//! let keys = client.list_keys(Some(1), Some(20), &opts).await?;
//! # Ok(())
//! # }
//! ```

pub use alikms_core::RuntimeOptions;

mod constants;

mod config;
pub use config::Config;

mod credential;
pub use credential::Credential;

mod query;
pub use query::{ParamValue, QueryParameters};

mod sign_request;
pub use sign_request::{canonical_query_string, percent_encode, string_to_sign, RequestSigner};

mod classify;
pub use classify::{classify, Classification};

mod execute;

mod client;
pub use client::Client;

mod operations;
pub use operations::{DEFAULT_KEY_SPEC, DEFAULT_KEY_USAGE, DEFAULT_WRAPPING_KEY_SPEC};

mod provide_credential;
pub use provide_credential::*;
