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

use crate::{Config, Credential};
use alikms_core::{Context, ProvideCredential, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// ConfigCredentialProvider loads credential from [`Config`].
///
/// Yields a credential when both halves of the access key are set, or when a
/// bearer token is set.
#[derive(Debug)]
pub struct ConfigCredentialProvider {
    config: Arc<Config>,
}

impl ConfigCredentialProvider {
    /// Create a new `ConfigCredentialProvider` instance.
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ProvideCredential for ConfigCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, _: &Context) -> Result<Option<Self::Credential>> {
        match (
            &self.config.access_key_id,
            &self.config.access_key_secret,
            &self.config.bearer_token,
        ) {
            (Some(ak), Some(sk), _) => Ok(Some(Credential {
                access_key_id: ak.clone(),
                access_key_secret: sk.clone(),
                security_token: self.config.security_token.clone(),
                bearer_token: self.config.bearer_token.clone(),
                expires_in: None,
            })),
            (_, _, Some(token)) => Ok(Some(Credential {
                access_key_id: self.config.access_key_id.clone().unwrap_or_default(),
                access_key_secret: self.config.access_key_secret.clone().unwrap_or_default(),
                security_token: self.config.security_token.clone(),
                bearer_token: Some(token.clone()),
                expires_in: None,
            })),
            _ => Ok(None),
        }
    }
}
