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

use crate::Credential;
use alikms_core::{Context, ProvideCredential, Result};
use async_trait::async_trait;

/// StaticCredentialProvider hands out one fixed credential on every call.
///
/// Use it for long-lived access keys, a pre-issued STS token, or a bearer
/// token alone.
#[derive(Debug, Clone)]
pub struct StaticCredentialProvider {
    credential: Credential,
}

impl StaticCredentialProvider {
    /// Provide an access key pair.
    pub fn new(access_key_id: &str, access_key_secret: &str) -> Self {
        Self {
            credential: Credential {
                access_key_id: access_key_id.to_string(),
                access_key_secret: access_key_secret.to_string(),
                ..Default::default()
            },
        }
    }

    /// Provide only a bearer token. Requests are signed with an empty secret.
    pub fn bearer(token: &str) -> Self {
        Self {
            credential: Credential {
                bearer_token: Some(token.to_string()),
                ..Default::default()
            },
        }
    }

    /// Attach an STS security token, sent as `SecurityToken`.
    pub fn with_security_token(mut self, token: &str) -> Self {
        self.credential.security_token = Some(token.to_string());
        self
    }

    /// Attach a bearer token, sent as `BearerToken`.
    pub fn with_bearer_token(mut self, token: &str) -> Self {
        self.credential.bearer_token = Some(token.to_string());
        self
    }
}

impl From<Credential> for StaticCredentialProvider {
    fn from(credential: Credential) -> Self {
        Self { credential }
    }
}

#[async_trait]
impl ProvideCredential for StaticCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, _: &Context) -> Result<Option<Self::Credential>> {
        Ok(Some(self.credential.clone()))
    }
}
