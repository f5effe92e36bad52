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

use crate::{Context, ProvideCredential, Result, SigningCredential};
use async_trait::async_trait;
use std::fmt::{self, Debug};
use std::sync::{Arc, Mutex};

/// CachedCredentialProvider reuses the last resolved credential while it is valid.
///
/// Every call checks [`SigningCredential::is_valid`] on the cached snapshot and
/// only asks the inner provider again once the snapshot is missing or about to
/// expire. Clones share the same cache.
pub struct CachedCredentialProvider<P: ProvideCredential> {
    inner: Arc<P>,
    cached: Arc<Mutex<Option<P::Credential>>>,
}

impl<P: ProvideCredential> Clone for CachedCredentialProvider<P> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            cached: self.cached.clone(),
        }
    }
}

impl<P: ProvideCredential> Debug for CachedCredentialProvider<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedCredentialProvider")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl<P> CachedCredentialProvider<P>
where
    P: ProvideCredential,
    P::Credential: SigningCredential,
{
    /// Wrap a provider.
    pub fn new(inner: P) -> Self {
        Self {
            inner: Arc::new(inner),
            cached: Arc::new(Mutex::new(None)),
        }
    }

    /// Drop the cached credential so the next call resolves again.
    pub fn invalidate(&self) {
        *self.cached.lock().expect("lock poisoned") = None;
    }
}

#[async_trait]
impl<P> ProvideCredential for CachedCredentialProvider<P>
where
    P: ProvideCredential,
    P::Credential: SigningCredential,
{
    type Credential = P::Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let cached = self.cached.lock().expect("lock poisoned").clone();
        if cached.is_valid() {
            return Ok(cached);
        }

        // Concurrent misses may resolve more than once, the last write wins.
        let fresh = self.inner.provide_credential(ctx).await?;
        *self.cached.lock().expect("lock poisoned") = fresh.clone();
        Ok(fresh)
    }
}
