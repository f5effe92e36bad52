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

use crate::execute::Executor;
use crate::provide_credential::ConfigCredentialProvider;
use crate::query::QueryParameters;
use crate::sign_request::RequestSigner;
use crate::{Config, Credential};
use alikms_core::{Context, Error, ProvideCredential, Result, RuntimeOptions};
use log::debug;
use serde_json::Value;
use std::sync::Arc;

/// Client for the Aliyun KMS RPC API.
///
/// Every call is signed and retried according to the merged
/// [`RuntimeOptions`]. The credential is resolved again before every attempt,
/// so a rotating provider is always honoured.
///
/// `Client` is cheap to clone and can be shared between tasks.
#[derive(Clone, Debug)]
pub struct Client {
    executor: Executor,
    defaults: RuntimeOptions,
}

impl Client {
    /// Create a client signing with the static credential found in `config`.
    ///
    /// Fails with [`alikms_core::ErrorKind::ConfigInvalid`] when the endpoint
    /// is missing, or when neither an access key pair nor a bearer token is set.
    pub fn new(ctx: Context, config: Config) -> Result<Self> {
        if config.bearer_token.is_none() {
            if config.access_key_id.as_deref().unwrap_or_default().is_empty() {
                return Err(Error::config_invalid(
                    "config.access_key_id must be passed in",
                ));
            }
            if config
                .access_key_secret
                .as_deref()
                .unwrap_or_default()
                .is_empty()
            {
                return Err(Error::config_invalid(
                    "config.access_key_secret must be passed in",
                ));
            }
        }

        let config = Arc::new(config);
        Self::with_credential_provider(
            ctx,
            config.as_ref().clone(),
            ConfigCredentialProvider::new(config),
        )
    }

    /// Create a client resolving credentials from `provider` on every attempt.
    ///
    /// Credential fields of `config` are ignored.
    pub fn with_credential_provider(
        ctx: Context,
        config: Config,
        provider: impl ProvideCredential<Credential = Credential>,
    ) -> Result<Self> {
        let endpoint = match config.endpoint.as_deref() {
            Some(v) if !v.is_empty() => v.to_string(),
            _ => {
                return Err(Error::config_invalid(
                    "config.endpoint must be passed in",
                )
                .with_context("see", "https://help.aliyun.com/document_detail/69006.html"))
            }
        };
        if config.api_version.is_empty() {
            return Err(Error::config_invalid("config.api_version must not be empty"));
        }

        debug!("creating KMS client for endpoint {endpoint}");
        Ok(Self {
            executor: Executor::new(
                ctx,
                endpoint,
                RequestSigner::new(&config.api_version),
                Arc::new(provider),
            ),
            defaults: RuntimeOptions::default(),
        })
    }

    /// Replace the credential provider.
    pub fn with_provider(
        mut self,
        provider: impl ProvideCredential<Credential = Credential>,
    ) -> Self {
        self.executor = self.executor.with_provider(Arc::new(provider));
        self
    }

    /// Set the runtime options every call starts from.
    ///
    /// Per-call options are merged over them, unset fields fall back to the
    /// documented defaults.
    pub fn with_runtime_options(mut self, defaults: RuntimeOptions) -> Self {
        self.defaults = defaults;
        self
    }

    /// Runtime options every call starts from.
    pub fn runtime_options(&self) -> &RuntimeOptions {
        &self.defaults
    }

    /// Invoke `action` with `params`.
    ///
    /// `opts` is merged over the client defaults and validated before
    /// anything is sent.
    pub async fn request(
        &self,
        action: &str,
        mut params: QueryParameters,
        opts: &RuntimeOptions,
    ) -> Result<Value> {
        let opts = self.defaults.merge(opts).resolve()?;
        params.insert("Action", action);

        debug!("invoking KMS action {action} with options {opts:?}");
        self.executor.execute(&params, opts).await
    }
}
