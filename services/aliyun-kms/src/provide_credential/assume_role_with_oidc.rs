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

use crate::sign_request::percent_encode;
use crate::{constants::*, Credential};
use alikms_core::time::{format_rfc3339, now, parse_rfc3339};
use alikms_core::{Context, Error, ProvideCredential, Result};
use async_trait::async_trait;
use bytes::Bytes;
use log::debug;
use serde::Deserialize;
use std::collections::HashMap;

const DEFAULT_STS_ENDPOINT: &str = "https://sts.aliyuncs.com";
const DEFAULT_ROLE_SESSION_NAME: &str = "alikms";

/// AssumeRoleWithOidcCredentialProvider loads credential via assume role with OIDC.
///
/// This provider reads configuration from environment variables at runtime:
/// - `ALIBABA_CLOUD_ROLE_ARN`: The ARN of the role to assume
/// - `ALIBABA_CLOUD_OIDC_PROVIDER_ARN`: The ARN of the OIDC provider
/// - `ALIBABA_CLOUD_OIDC_TOKEN_FILE`: Path to the OIDC token file
/// - `ALIBABA_CLOUD_STS_ENDPOINT`: Optional custom STS endpoint
///
/// The token file is read through the [`Context`] file reader, so the context
/// needs one configured, for example `alikms_file_read_tokio::TokioFileRead`.
#[derive(Debug, Default, Clone)]
pub struct AssumeRoleWithOidcCredentialProvider {
    sts_endpoint: Option<String>,
    role_session_name: Option<String>,
}

impl AssumeRoleWithOidcCredentialProvider {
    /// Create a new `AssumeRoleWithOidcCredentialProvider` instance.
    /// This will read configuration from environment variables at runtime.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the STS endpoint, including the scheme.
    pub fn with_sts_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.sts_endpoint = Some(endpoint.into());
        self
    }

    /// Set the role session name, default to `alikms`.
    pub fn with_role_session_name(mut self, name: impl Into<String>) -> Self {
        self.role_session_name = Some(name.into());
        self
    }

    fn get_sts_endpoint(&self, envs: &HashMap<String, String>) -> String {
        if let Some(endpoint) = &self.sts_endpoint {
            return endpoint.clone();
        }

        match envs.get(ALIBABA_CLOUD_STS_ENDPOINT) {
            Some(endpoint) => format!("https://{endpoint}"),
            None => DEFAULT_STS_ENDPOINT.to_string(),
        }
    }
}

#[async_trait]
impl ProvideCredential for AssumeRoleWithOidcCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let envs = ctx.env_vars();

        let (Some(token_file), Some(role_arn), Some(provider_arn)) = (
            envs.get(ALIBABA_CLOUD_OIDC_TOKEN_FILE),
            envs.get(ALIBABA_CLOUD_ROLE_ARN),
            envs.get(ALIBABA_CLOUD_OIDC_PROVIDER_ARN),
        ) else {
            return Ok(None);
        };

        let token = ctx.file_read_as_string(token_file).await?;
        let role_session_name = self
            .role_session_name
            .as_deref()
            .unwrap_or(DEFAULT_ROLE_SESSION_NAME);

        // Construct request to Aliyun STS Service.
        let url = format!(
            "{}/?Action=AssumeRoleWithOIDC&OIDCProviderArn={}&RoleArn={}&RoleSessionName={}&Format=JSON&Version=2015-04-01&Timestamp={}&OIDCToken={}",
            self.get_sts_endpoint(&envs),
            percent_encode(provider_arn),
            percent_encode(role_arn),
            percent_encode(role_session_name),
            percent_encode(&format_rfc3339(now())),
            percent_encode(token.trim()),
        );
        debug!("assuming role {role_arn} with oidc token from {token_file}");

        let req = http::Request::builder()
            .method(http::Method::GET)
            .uri(&url)
            .header(
                http::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(Bytes::new())?;

        let resp = ctx.http_send(req).await?;

        if resp.status() != http::StatusCode::OK {
            let content = String::from_utf8_lossy(resp.body());
            return Err(Error::credential_invalid(format!(
                "request to Aliyun STS Services failed: {content}"
            ))
            .with_context("status", resp.status().as_u16()));
        }

        let resp: AssumeRoleWithOidcResponse = serde_json::from_slice(resp.body())
            .map_err(|e| Error::unexpected("failed to parse STS response").with_source(e))?;
        let resp_cred = resp.credentials;

        Ok(Some(Credential {
            access_key_id: resp_cred.access_key_id,
            access_key_secret: resp_cred.access_key_secret,
            security_token: Some(resp_cred.security_token),
            bearer_token: None,
            expires_in: Some(parse_rfc3339(&resp_cred.expiration)?),
        }))
    }
}

#[derive(Default, Debug, Deserialize)]
#[serde(default)]
struct AssumeRoleWithOidcResponse {
    #[serde(rename = "Credentials")]
    credentials: AssumeRoleWithOidcCredentials,
}

#[derive(Default, Debug, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct AssumeRoleWithOidcCredentials {
    access_key_id: String,
    access_key_secret: String,
    security_token: String,
    expiration: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alikms_core::{FileRead, HttpSend, StaticEnv};
    use std::sync::{Arc, Mutex};

    const STS_RESPONSE: &str = r#"{
    "RequestId": "3D57EAD2-8723-1F26-B69C-F8707D8B565D",
    "AssumedRoleUser": {
        "AssumedRoleId": "33157794895460****",
        "Arn": "acs:ram::113511544585****:role/testoidc/TestOidcAssumedRoleSession"
    },
    "Credentials": {
        "SecurityToken": "CAIShwJ1q6Ft5B2yfSjIr5bSEsj4g7BihPWGWHz****",
        "Expiration": "2021-10-20T04:27:09Z",
        "AccessKeySecret": "CVwjCkNzTMupZ8NbTCxCBRq3K16jtcWFTJAyBEv2****",
        "AccessKeyId": "STS.NUgYrLnoC37mZZCNnAbez****"
    }
}"#;

    #[derive(Debug)]
    struct TokenFile;

    #[async_trait]
    impl FileRead for TokenFile {
        async fn file_read(&self, path: &str) -> Result<Vec<u8>> {
            assert_eq!(path, "/var/run/secrets/oidc/token");
            Ok(b"eyJhbGciOiJSUzI1NiJ9.payload\n".to_vec())
        }
    }

    #[derive(Debug, Default, Clone)]
    struct Sts {
        uris: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl HttpSend for Sts {
        async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
            self.uris.lock().unwrap().push(req.uri().to_string());
            Ok(http::Response::builder()
                .status(200)
                .body(Bytes::from_static(STS_RESPONSE.as_bytes()))?)
        }
    }

    #[test]
    fn test_parse_assume_role_with_oidc_response() {
        let resp: AssumeRoleWithOidcResponse =
            serde_json::from_str(STS_RESPONSE).expect("json deserialize must success");

        assert_eq!(
            &resp.credentials.access_key_id,
            "STS.NUgYrLnoC37mZZCNnAbez****"
        );
        assert_eq!(
            &resp.credentials.access_key_secret,
            "CVwjCkNzTMupZ8NbTCxCBRq3K16jtcWFTJAyBEv2****"
        );
        assert_eq!(
            &resp.credentials.security_token,
            "CAIShwJ1q6Ft5B2yfSjIr5bSEsj4g7BihPWGWHz****"
        );
        assert_eq!(&resp.credentials.expiration, "2021-10-20T04:27:09Z");
    }

    #[tokio::test]
    async fn test_assume_role_with_oidc_loader_without_config() {
        let ctx = Context::new().with_env(StaticEnv::default());

        let loader = AssumeRoleWithOidcCredentialProvider::new();
        let credential = loader.provide_credential(&ctx).await.unwrap();

        assert!(credential.is_none());
    }

    #[tokio::test]
    async fn test_assume_role_with_oidc_loader() -> Result<()> {
        let sts = Sts::default();
        let ctx = Context::new()
            .with_file_read(TokenFile)
            .with_http_send(sts.clone())
            .with_env(StaticEnv {
                envs: HashMap::from([
                    (
                        ALIBABA_CLOUD_OIDC_TOKEN_FILE.to_string(),
                        "/var/run/secrets/oidc/token".to_string(),
                    ),
                    (
                        ALIBABA_CLOUD_ROLE_ARN.to_string(),
                        "acs:ram::123456:role/kms-reader".to_string(),
                    ),
                    (
                        ALIBABA_CLOUD_OIDC_PROVIDER_ARN.to_string(),
                        "acs:ram::123456:oidc-provider/ack".to_string(),
                    ),
                    (
                        ALIBABA_CLOUD_STS_ENDPOINT.to_string(),
                        "sts.cn-hangzhou.aliyuncs.com".to_string(),
                    ),
                ]),
            });

        let cred = AssumeRoleWithOidcCredentialProvider::new()
            .provide_credential(&ctx)
            .await?
            .expect("credential must be loaded");

        assert_eq!(cred.access_key_id, "STS.NUgYrLnoC37mZZCNnAbez****");
        assert!(cred.security_token.is_some());
        assert_eq!(
            cred.expires_in,
            Some(parse_rfc3339("2021-10-20T04:27:09Z")?)
        );

        let uris = sts.uris.lock().unwrap();
        assert_eq!(uris.len(), 1);
        assert!(uris[0].starts_with("https://sts.cn-hangzhou.aliyuncs.com/?Action=AssumeRoleWithOIDC"));
        assert!(uris[0].contains("RoleArn=acs%3Aram%3A%3A123456%3Arole%2Fkms-reader"));
        assert!(uris[0].contains("OIDCToken=eyJhbGciOiJSUzI1NiJ9.payload"));
        assert!(uris[0].contains("RoleSessionName=alikms"));
        Ok(())
    }
}
