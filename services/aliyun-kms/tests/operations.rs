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

mod common;

use alikms::{Client, Config, StaticCredentialProvider};
use alikms_core::{Context, ErrorKind, Result, RuntimeOptions};
use common::*;
use pretty_assertions::assert_eq;

fn ok() -> MockKms {
    MockKms::new(vec![Reply::Status(200, r#"{"RequestId":"ok"}"#)])
}

#[tokio::test]
async fn test_required_arguments_fail_before_send() {
    let mock = ok();
    let client = client(&mock);
    let opts = RuntimeOptions::default();

    let cases = vec![
        (
            client.cancel_key_deletion("", &opts).await,
            "keyId must be passed in",
        ),
        (
            client.create_alias("key-id", "", &opts).await,
            "keyId & aliasName must be passed in",
        ),
        (
            client.decrypt("", None, &opts).await,
            "ciphertextBlob must be passed in",
        ),
        (
            client.delete_alias("", &opts).await,
            "aliasName must be passed in",
        ),
        (
            client.delete_key_material("", &opts).await,
            "keyId must be passed in",
        ),
        (
            client.describe_key("", &opts).await,
            "keyId must be passed in",
        ),
        (
            client.disable_key("", &opts).await,
            "keyId must be passed in",
        ),
        (
            client.enable_key("", &opts).await,
            "keyId must be passed in",
        ),
        (
            client.encrypt("key-id", "", None, &opts).await,
            "keyId & plaintext must be passed in",
        ),
        (
            client.generate_data_key("", None, None, None, &opts).await,
            "keyId must be passed in",
        ),
        (
            client
                .get_parameters_for_import("key-id", "", None, &opts)
                .await,
            "keyId & wrappingAlgorithm & wrappingKeySpec must be passed in",
        ),
        (
            client
                .import_key_material(Some("key-id"), "material", "", None, &opts)
                .await,
            "encryptedKeyMaterial & importToken must be passed in",
        ),
        (
            client.list_aliases_by_key_id("", None, None, &opts).await,
            "keyId must be passed in",
        ),
        (
            client.schedule_key_deletion("key-id", 0, &opts).await,
            "keyId & pendingWindowInDays must be passed in",
        ),
        (
            client.update_alias("", "alias/test", &opts).await,
            "keyId & aliasName must be passed in",
        ),
    ];

    for (result, message) in cases {
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RequestInvalid);
        assert_eq!(err.message(), message);
        assert!(err.context_value("see").is_some());
    }
    assert_eq!(mock.count(), 0);
}

#[tokio::test]
async fn test_operations_send_their_action() -> Result<()> {
    let mock = ok();
    let client = client(&mock);
    let opts = RuntimeOptions::default();

    client.cancel_key_deletion("key-id", &opts).await?;
    client.create_alias("key-id", "alias/a", &opts).await?;
    client.create_key(None, None, None, &opts).await?;
    client.decrypt("blob", None, &opts).await?;
    client.delete_alias("alias/a", &opts).await?;
    client.delete_key_material("key-id", &opts).await?;
    client.describe_key("key-id", &opts).await?;
    client.describe_regions(&opts).await?;
    client.disable_key("key-id", &opts).await?;
    client.enable_key("key-id", &opts).await?;
    client.encrypt("key-id", "plain", None, &opts).await?;
    client
        .generate_data_key("key-id", None, None, None, &opts)
        .await?;
    client
        .get_parameters_for_import("key-id", "RSAES_OAEP_SHA_1", None, &opts)
        .await?;
    client
        .import_key_material(None, "material", "token", None, &opts)
        .await?;
    client.list_aliases(None, None, &opts).await?;
    client
        .list_aliases_by_key_id("key-id", None, None, &opts)
        .await?;
    client.list_keys(None, None, &opts).await?;
    client.schedule_key_deletion("key-id", 7, &opts).await?;
    client.update_alias("key-id", "alias/b", &opts).await?;

    let actions: Vec<_> = mock
        .received()
        .iter()
        .map(|r| r.query()["Action"].clone())
        .collect();
    assert_eq!(
        actions,
        vec![
            "CancelKeyDeletion",
            "CreateAlias",
            "CreateKey",
            "Decrypt",
            "DeleteAlias",
            "DeleteKeyMaterial",
            "DescribeKey",
            "DescribeRegions",
            "DisableKey",
            "EnableKey",
            "Encrypt",
            "GenerateDataKey",
            "GetParametersForImport",
            "ImportKeyMaterial",
            "ListAliases",
            "ListAliasesByKeyId",
            "ListKeys",
            "ScheduleKeyDeletion",
            "UpdateAlias",
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_defaults_are_applied() -> Result<()> {
    let mock = ok();
    let client = client(&mock);
    let opts = RuntimeOptions::default();

    client.create_key(None, None, None, &opts).await?;
    client
        .generate_data_key("key-id", None, None, None, &opts)
        .await?;
    client
        .get_parameters_for_import("key-id", "RSAES_OAEP_SHA_1", None, &opts)
        .await?;

    let received = mock.received();
    assert_eq!(received[0].query()["KeyUsage"], "ENCRYPT/DECRYPT");
    assert_eq!(received[1].query()["KeySpec"], "AES_256");
    assert_eq!(received[2].query()["WrappingKeySpec"], "RSA_2048");
    Ok(())
}

#[tokio::test]
async fn test_falsy_parameters_are_not_sent() -> Result<()> {
    let mock = ok();
    let client = client(&mock);
    let opts = RuntimeOptions::default();

    client.list_keys(Some(2), None, &opts).await?;
    client.list_aliases(Some(0), Some(50), &opts).await?;
    client
        .create_key(Some("Aliyun_KMS"), Some(""), None, &opts)
        .await?;

    let received = mock.received();

    let query = received[0].query();
    assert_eq!(query["PageNumber"], "2");
    assert!(!query.contains_key("PageSize"));
    assert!(!received[0].uri.query().unwrap_or_default().contains("PageSize"));

    let query = received[1].query();
    assert!(!query.contains_key("PageNumber"));
    assert_eq!(query["PageSize"], "50");

    let query = received[2].query();
    assert_eq!(query["Origin"], "Aliyun_KMS");
    assert!(!query.contains_key("Description"));
    Ok(())
}

#[tokio::test]
async fn test_tokens_are_sent_in_headers_and_query() -> Result<()> {
    init_logger();
    let mock = ok();
    let client = Client::with_credential_provider(
        Context::new().with_http_send(mock.clone()),
        config(),
        StaticCredentialProvider::new(ACCESS_KEY_ID, ACCESS_KEY_SECRET)
            .with_security_token("CAIShwJ1q6Ft5B2yfSjIr5bSEsj4g7Bih")
            .with_bearer_token("bearer-token-value"),
    )?;

    client
        .describe_regions(&RuntimeOptions::default())
        .await?;

    let received = mock.received()[0].clone();
    assert_eq!(
        received.headers["x-acs-security-token"],
        "CAIShwJ1q6Ft5B2yfSjIr5bSEsj4g7Bih"
    );
    assert_eq!(received.headers["x-acs-bearer-token"], "bearer-token-value");

    let query = received.query();
    assert_eq!(query["SecurityToken"], "CAIShwJ1q6Ft5B2yfSjIr5bSEsj4g7Bih");
    assert_eq!(query["BearerToken"], "bearer-token-value");
    Ok(())
}

#[tokio::test]
async fn test_bearer_token_only_config() -> Result<()> {
    init_logger();
    let mock = ok();
    let config = Config {
        endpoint: Some("http://127.0.0.1:18080".to_string()),
        bearer_token: Some("bearer-token-value".to_string()),
        ..Default::default()
    };
    let client = Client::new(Context::new().with_http_send(mock.clone()), config)?;

    client
        .describe_regions(&RuntimeOptions::default())
        .await?;

    let received = mock.received();
    assert_eq!(received[0].uri.scheme_str(), Some("http"));
    assert_eq!(received[0].headers["host"], "127.0.0.1:18080");
    let query = received[0].query();
    assert_eq!(query["BearerToken"], "bearer-token-value");
    assert!(!query.contains_key("AccessKeyId"));
    assert!(query.contains_key("Signature"));
    Ok(())
}

#[tokio::test]
async fn test_client_is_shared_between_tasks() -> Result<()> {
    let mock = ok();
    let client = client(&mock);

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let client = client.clone();
            tokio::spawn(async move {
                client
                    .describe_key(&format!("key-{i}"), &RuntimeOptions::default())
                    .await
            })
        })
        .collect();
    for handle in handles {
        handle.await.expect("task must not panic")?;
    }

    assert_eq!(mock.count(), 4);
    Ok(())
}
