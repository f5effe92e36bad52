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

//! Typed wrappers of the KMS actions.
//!
//! Each wrapper checks its required arguments before anything is sent, then
//! delegates to [`Client::request`]. Optional arguments left as `None` are
//! dropped from the request.

use crate::query::QueryParameters;
use crate::Client;
use alikms_core::{Error, Result, RuntimeOptions};
use serde_json::Value;

/// Default `KeyUsage` of [`Client::create_key`].
pub const DEFAULT_KEY_USAGE: &str = "ENCRYPT/DECRYPT";
/// Default `KeySpec` of [`Client::generate_data_key`].
pub const DEFAULT_KEY_SPEC: &str = "AES_256";
/// Default `WrappingKeySpec` of [`Client::get_parameters_for_import`].
pub const DEFAULT_WRAPPING_KEY_SPEC: &str = "RSA_2048";

fn ensure(present: bool, names: &str, doc: &str) -> Result<()> {
    if present {
        return Ok(());
    }
    Err(Error::request_invalid(format!("{names} must be passed in"))
        .with_context("see", format!("https://help.aliyun.com/document_detail/{doc}.html")))
}

fn is_set(v: &str) -> bool {
    !v.is_empty()
}

impl Client {
    /// Cancel the scheduled deletion of a key, which re-enables it.
    pub async fn cancel_key_deletion(&self, key_id: &str, opts: &RuntimeOptions) -> Result<Value> {
        ensure(is_set(key_id), "keyId", "44197")?;
        let params = QueryParameters::new().with("KeyId", key_id);
        self.request("CancelKeyDeletion", params, opts).await
    }

    /// Create an alias for a key.
    pub async fn create_alias(
        &self,
        key_id: &str,
        alias_name: &str,
        opts: &RuntimeOptions,
    ) -> Result<Value> {
        ensure(
            is_set(key_id) && is_set(alias_name),
            "keyId & aliasName",
            "68624",
        )?;
        let params = QueryParameters::new()
            .with("KeyId", key_id)
            .with("AliasName", alias_name);
        self.request("CreateAlias", params, opts).await
    }

    /// Create a master key.
    ///
    /// `key_usage` defaults to [`DEFAULT_KEY_USAGE`].
    pub async fn create_key(
        &self,
        origin: Option<&str>,
        description: Option<&str>,
        key_usage: Option<&str>,
        opts: &RuntimeOptions,
    ) -> Result<Value> {
        let params = QueryParameters::new()
            .with("Origin", origin)
            .with("Description", description)
            .with("KeyUsage", key_usage.unwrap_or(DEFAULT_KEY_USAGE));
        self.request("CreateKey", params, opts).await
    }

    /// Decrypt a ciphertext blob.
    pub async fn decrypt(
        &self,
        ciphertext_blob: &str,
        encryption_context: Option<&str>,
        opts: &RuntimeOptions,
    ) -> Result<Value> {
        ensure(is_set(ciphertext_blob), "ciphertextBlob", "28950")?;
        let params = QueryParameters::new()
            .with("CiphertextBlob", ciphertext_blob)
            .with("EncryptionContext", encryption_context);
        self.request("Decrypt", params, opts).await
    }

    /// Delete an alias.
    pub async fn delete_alias(&self, alias_name: &str, opts: &RuntimeOptions) -> Result<Value> {
        ensure(is_set(alias_name), "aliasName", "68626")?;
        let params = QueryParameters::new().with("AliasName", alias_name);
        self.request("DeleteAlias", params, opts).await
    }

    /// Delete imported key material.
    pub async fn delete_key_material(&self, key_id: &str, opts: &RuntimeOptions) -> Result<Value> {
        ensure(is_set(key_id), "keyId", "68623")?;
        let params = QueryParameters::new().with("KeyId", key_id);
        self.request("DeleteKeyMaterial", params, opts).await
    }

    /// Describe a key.
    pub async fn describe_key(&self, key_id: &str, opts: &RuntimeOptions) -> Result<Value> {
        ensure(is_set(key_id), "keyId", "28952")?;
        let params = QueryParameters::new().with("KeyId", key_id);
        self.request("DescribeKey", params, opts).await
    }

    /// List the regions KMS is available in.
    pub async fn describe_regions(&self, opts: &RuntimeOptions) -> Result<Value> {
        self.request("DescribeRegions", QueryParameters::new(), opts)
            .await
    }

    /// Disable a key.
    pub async fn disable_key(&self, key_id: &str, opts: &RuntimeOptions) -> Result<Value> {
        ensure(is_set(key_id), "keyId", "35151")?;
        let params = QueryParameters::new().with("KeyId", key_id);
        self.request("DisableKey", params, opts).await
    }

    /// Enable a key.
    pub async fn enable_key(&self, key_id: &str, opts: &RuntimeOptions) -> Result<Value> {
        ensure(is_set(key_id), "keyId", "35150")?;
        let params = QueryParameters::new().with("KeyId", key_id);
        self.request("EnableKey", params, opts).await
    }

    /// Encrypt `plaintext` with a master key.
    pub async fn encrypt(
        &self,
        key_id: &str,
        plaintext: &str,
        encryption_context: Option<&str>,
        opts: &RuntimeOptions,
    ) -> Result<Value> {
        ensure(
            is_set(key_id) && is_set(plaintext),
            "keyId & plaintext",
            "28949",
        )?;
        let params = QueryParameters::new()
            .with("KeyId", key_id)
            .with("Plaintext", plaintext)
            .with("EncryptionContext", encryption_context);
        self.request("Encrypt", params, opts).await
    }

    /// Generate a data key protected by a master key.
    ///
    /// `key_spec` defaults to [`DEFAULT_KEY_SPEC`].
    pub async fn generate_data_key(
        &self,
        key_id: &str,
        key_spec: Option<&str>,
        number_of_bytes: Option<u32>,
        encryption_context: Option<&str>,
        opts: &RuntimeOptions,
    ) -> Result<Value> {
        ensure(is_set(key_id), "keyId", "28948")?;
        let params = QueryParameters::new()
            .with("KeyId", key_id)
            .with("KeySpec", key_spec.unwrap_or(DEFAULT_KEY_SPEC))
            .with("NumberOfBytes", number_of_bytes)
            .with("EncryptionContext", encryption_context);
        self.request("GenerateDataKey", params, opts).await
    }

    /// Fetch the parameters needed to import key material.
    ///
    /// `wrapping_key_spec` defaults to [`DEFAULT_WRAPPING_KEY_SPEC`].
    pub async fn get_parameters_for_import(
        &self,
        key_id: &str,
        wrapping_algorithm: &str,
        wrapping_key_spec: Option<&str>,
        opts: &RuntimeOptions,
    ) -> Result<Value> {
        let wrapping_key_spec = wrapping_key_spec.unwrap_or(DEFAULT_WRAPPING_KEY_SPEC);
        ensure(
            is_set(key_id) && is_set(wrapping_algorithm) && is_set(wrapping_key_spec),
            "keyId & wrappingAlgorithm & wrappingKeySpec",
            "68621",
        )?;
        let params = QueryParameters::new()
            .with("KeyId", key_id)
            .with("WrappingAlgorithm", wrapping_algorithm)
            .with("WrappingKeySpec", wrapping_key_spec);
        self.request("GetParametersForImport", params, opts).await
    }

    /// Import key material.
    pub async fn import_key_material(
        &self,
        key_id: Option<&str>,
        encrypted_key_material: &str,
        import_token: &str,
        key_material_expire_unix: Option<i64>,
        opts: &RuntimeOptions,
    ) -> Result<Value> {
        ensure(
            is_set(encrypted_key_material) && is_set(import_token),
            "encryptedKeyMaterial & importToken",
            "68622",
        )?;
        let params = QueryParameters::new()
            .with("KeyId", key_id)
            .with("EncryptedKeyMaterial", encrypted_key_material)
            .with("ImportToken", import_token)
            .with("KeyMaterialExpireUnix", key_material_expire_unix);
        self.request("ImportKeyMaterial", params, opts).await
    }

    /// List aliases.
    pub async fn list_aliases(
        &self,
        page_number: Option<u32>,
        page_size: Option<u32>,
        opts: &RuntimeOptions,
    ) -> Result<Value> {
        let params = QueryParameters::new()
            .with("PageNumber", page_number)
            .with("PageSize", page_size);
        self.request("ListAliases", params, opts).await
    }

    /// List the aliases of a key.
    pub async fn list_aliases_by_key_id(
        &self,
        key_id: &str,
        page_number: Option<u32>,
        page_size: Option<u32>,
        opts: &RuntimeOptions,
    ) -> Result<Value> {
        ensure(is_set(key_id), "keyId", "68628")?;
        let params = QueryParameters::new()
            .with("KeyId", key_id)
            .with("PageNumber", page_number)
            .with("PageSize", page_size);
        self.request("ListAliasesByKeyId", params, opts).await
    }

    /// List keys.
    pub async fn list_keys(
        &self,
        page_number: Option<u32>,
        page_size: Option<u32>,
        opts: &RuntimeOptions,
    ) -> Result<Value> {
        let params = QueryParameters::new()
            .with("PageNumber", page_number)
            .with("PageSize", page_size);
        self.request("ListKeys", params, opts).await
    }

    /// Schedule the deletion of a key after `pending_window_in_days`.
    pub async fn schedule_key_deletion(
        &self,
        key_id: &str,
        pending_window_in_days: u32,
        opts: &RuntimeOptions,
    ) -> Result<Value> {
        ensure(
            is_set(key_id) && pending_window_in_days > 0,
            "keyId & pendingWindowInDays",
            "44196",
        )?;
        let params = QueryParameters::new()
            .with("KeyId", key_id)
            .with("PendingWindowInDays", pending_window_in_days);
        self.request("ScheduleKeyDeletion", params, opts).await
    }

    /// Point an existing alias to another key.
    pub async fn update_alias(
        &self,
        key_id: &str,
        alias_name: &str,
        opts: &RuntimeOptions,
    ) -> Result<Value> {
        ensure(
            is_set(key_id) && is_set(alias_name),
            "keyId & aliasName",
            "68625",
        )?;
        let params = QueryParameters::new()
            .with("KeyId", key_id)
            .with("AliasName", alias_name);
        self.request("UpdateAlias", params, opts).await
    }
}
