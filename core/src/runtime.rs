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

//! Per-call runtime options and backoff policies.

use crate::{Error, Result, TransportOptions};
use rand::Rng;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default per-attempt timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Default number of attempts, the first try included.
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;
/// Default base period used by backoff policies.
pub const DEFAULT_BACKOFF_PERIOD: Duration = Duration::from_millis(1);
/// Upper bound of a single exponential backoff sleep, jitter excluded.
pub const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// BackoffPolicy maps an attempt number to the sleep before that attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackoffPolicy {
    /// Retry immediately.
    #[default]
    None,
    /// Sleep `backoff_period` before every retry.
    Fixed,
    /// Sleep a uniformly random duration in `[0, backoff_period]`.
    Random,
    /// Sleep `backoff_period * 2^(n-1)`, capped at [`MAX_BACKOFF`], plus up to 10% jitter.
    Exponential,
}

impl BackoffPolicy {
    /// Compute the sleep before retry number `attempt` (1 for the first retry).
    ///
    /// Attempt `0` is the first try and never sleeps.
    pub fn delay(&self, attempt: usize, period: Duration) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        match self {
            BackoffPolicy::None => Duration::ZERO,
            BackoffPolicy::Fixed => period,
            BackoffPolicy::Random => {
                let max = period.as_millis() as u64;
                Duration::from_millis(rand::thread_rng().gen_range(0..=max))
            }
            BackoffPolicy::Exponential => {
                let exp = u32::try_from(attempt - 1).unwrap_or(u32::MAX).min(31);
                let delay = period.saturating_mul(1u32 << exp).min(MAX_BACKOFF);

                let jitter_range = delay.as_millis() as u64 / 10;
                let jitter = if jitter_range > 0 {
                    rand::thread_rng().gen_range(0..jitter_range)
                } else {
                    0
                };
                delay + Duration::from_millis(jitter)
            }
        }
    }
}

impl FromStr for BackoffPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "" | "no" | "none" => Ok(BackoffPolicy::None),
            "fixed" => Ok(BackoffPolicy::Fixed),
            "random" => Ok(BackoffPolicy::Random),
            "exponential" => Ok(BackoffPolicy::Exponential),
            _ => Err(Error::config_invalid(format!("unsupported backoff policy: {s}"))),
        }
    }
}

impl fmt::Display for BackoffPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackoffPolicy::None => write!(f, "none"),
            BackoffPolicy::Fixed => write!(f, "fixed"),
            BackoffPolicy::Random => write!(f, "random"),
            BackoffPolicy::Exponential => write!(f, "exponential"),
        }
    }
}

/// RuntimeOptions carries the per-call overrides of retry and transport behaviour.
///
/// Every field is optional; unset fields fall back to the value of the options
/// they are merged over, and finally to the documented defaults:
///
/// | field | default |
/// |---|---|
/// | `timeout` | [`DEFAULT_TIMEOUT`] |
/// | `max_attempts` | [`DEFAULT_MAX_ATTEMPTS`] |
/// | `backoff_policy` | [`BackoffPolicy::None`] |
/// | `backoff_period` | [`DEFAULT_BACKOFF_PERIOD`] |
/// | `ignore_ssl` | `false` |
/// | `deadline` | none |
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeOptions {
    /// Timeout of a single attempt.
    pub timeout: Option<Duration>,
    /// Maximum number of attempts, the first try included.
    pub max_attempts: Option<usize>,
    /// Backoff policy applied between attempts.
    pub backoff_policy: Option<BackoffPolicy>,
    /// Base period of the backoff policy.
    pub backoff_period: Option<Duration>,
    /// Skip TLS certificate verification.
    pub ignore_ssl: Option<bool>,
    /// Wall-clock budget for the whole call, every attempt and sleep included.
    pub deadline: Option<Duration>,
}

impl RuntimeOptions {
    /// Create empty options, every field falls back to its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the maximum number of attempts.
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Set the backoff policy.
    pub fn with_backoff_policy(mut self, policy: BackoffPolicy) -> Self {
        self.backoff_policy = Some(policy);
        self
    }

    /// Set the backoff period.
    pub fn with_backoff_period(mut self, period: Duration) -> Self {
        self.backoff_period = Some(period);
        self
    }

    /// Skip TLS certificate verification.
    pub fn with_ignore_ssl(mut self, ignore_ssl: bool) -> Self {
        self.ignore_ssl = Some(ignore_ssl);
        self
    }

    /// Bound the whole call, all attempts included.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Merge `overrides` over `self`, fields set in `overrides` win.
    pub fn merge(&self, overrides: &RuntimeOptions) -> RuntimeOptions {
        RuntimeOptions {
            timeout: overrides.timeout.or(self.timeout),
            max_attempts: overrides.max_attempts.or(self.max_attempts),
            backoff_policy: overrides.backoff_policy.or(self.backoff_policy),
            backoff_period: overrides.backoff_period.or(self.backoff_period),
            ignore_ssl: overrides.ignore_ssl.or(self.ignore_ssl),
            deadline: overrides.deadline.or(self.deadline),
        }
    }

    /// Fill defaults and validate.
    pub fn resolve(&self) -> Result<EffectiveOptions> {
        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        if timeout.is_zero() {
            return Err(Error::config_invalid("timeout must be greater than 0"));
        }

        let max_attempts = self.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS);
        if max_attempts == 0 {
            return Err(Error::config_invalid("max_attempts must be at least 1"));
        }

        if self.deadline.is_some_and(|d| d.is_zero()) {
            return Err(Error::config_invalid("deadline must be greater than 0"));
        }

        Ok(EffectiveOptions {
            timeout,
            max_attempts,
            backoff_policy: self.backoff_policy.unwrap_or_default(),
            backoff_period: self.backoff_period.unwrap_or(DEFAULT_BACKOFF_PERIOD),
            ignore_ssl: self.ignore_ssl.unwrap_or(false),
            deadline: self.deadline,
        })
    }
}

/// Runtime options with every default filled in and validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveOptions {
    /// Timeout of a single attempt, always greater than zero.
    pub timeout: Duration,
    /// Maximum number of attempts, always at least one.
    pub max_attempts: usize,
    /// Backoff policy applied between attempts.
    pub backoff_policy: BackoffPolicy,
    /// Base period of the backoff policy.
    pub backoff_period: Duration,
    /// Skip TLS certificate verification.
    pub ignore_ssl: bool,
    /// Wall-clock budget for the whole call.
    pub deadline: Option<Duration>,
}

impl EffectiveOptions {
    /// Sleep before attempt number `attempt` (zero based).
    pub fn backoff_delay(&self, attempt: usize) -> Duration {
        self.backoff_policy.delay(attempt, self.backoff_period)
    }

    /// Transport settings for one attempt, the timeout clamped to `remaining`.
    pub fn transport_options(&self, remaining: Option<Duration>) -> TransportOptions {
        let timeout = match remaining {
            Some(remaining) => self.timeout.min(remaining),
            None => self.timeout,
        };
        TransportOptions {
            timeout,
            ignore_ssl: self.ignore_ssl,
        }
    }
}

impl Default for EffectiveOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_policy: BackoffPolicy::None,
            backoff_period: DEFAULT_BACKOFF_PERIOD,
            ignore_ssl: false,
            deadline: None,
        }
    }
}
