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

//! Tokio-based file reading for alikms.
//!
//! `TokioFileRead` implements [`FileRead`] with `tokio::fs`. Credential
//! providers that exchange a token file for STS credentials, such as the OIDC
//! provider of the `alikms` crate, read the token through it.
//!
//! ## Example
//!
//! ```no_run
//! use alikms_core::{Context, OsEnv};
//! use alikms_file_read_tokio::TokioFileRead;
//!
//! # async fn example() -> alikms_core::Result<()> {
//! let ctx = Context::new()
//!     .with_file_read(TokioFileRead)
//!     .with_env(OsEnv);
//!
//! let token = ctx.file_read_as_string("/var/run/secrets/tokens/oidc-token").await?;
//! # Ok(())
//! # }
//! ```

use alikms_core::{Error, FileRead, Result};
use async_trait::async_trait;

/// Tokio-based implementation of the `FileRead` trait.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFileRead;

#[async_trait]
impl FileRead for TokioFileRead {
    async fn file_read(&self, path: &str) -> Result<Vec<u8>> {
        tokio::fs::read(path).await.map_err(|e| {
            Error::unexpected("failed to read file")
                .with_context("path", path)
                .with_source(e)
        })
    }
}
