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

use alikms_core::Error;
use bytes::Bytes;
use serde_json::Value;

/// Classification is the verdict on one attempt.
#[derive(Debug)]
pub enum Classification {
    /// The call succeeded with a JSON body.
    Success(Value),
    /// The attempt failed but another attempt may succeed.
    RetryableFailure(Error),
    /// The call failed and retrying will not help.
    TerminalFailure(Error),
}

impl Classification {
    /// Classify the result of sending one attempt through the transport.
    pub fn from_send_result(result: alikms_core::Result<http::Response<Bytes>>) -> Self {
        match result {
            Ok(resp) => classify(&resp),
            Err(err) if err.is_retryable() => Classification::RetryableFailure(err),
            Err(err) => Classification::TerminalFailure(err),
        }
    }
}

/// Classify a received response.
///
/// - `>= 500` is retryable.
/// - `2xx` with a JSON body is a success, with any other body it is terminal.
/// - everything else is terminal.
pub fn classify(resp: &http::Response<Bytes>) -> Classification {
    let status = resp.status();
    let body = String::from_utf8_lossy(resp.body());

    if status.as_u16() >= 500 {
        return Classification::RetryableFailure(
            Error::server_error(format!("server responded with status {status}"))
                .with_context("status", status.as_u16())
                .with_context("body", body),
        );
    }

    if status.is_success() {
        return match serde_json::from_slice::<Value>(resp.body()) {
            Ok(v) => Classification::Success(v),
            Err(e) => Classification::TerminalFailure(
                Error::response_invalid(format!("return value must be json: {body}"))
                    .with_context("status", status.as_u16())
                    .with_context("body", &body)
                    .with_source(e),
            ),
        };
    }

    Classification::TerminalFailure(
        Error::response_invalid(format!("request failed with status {status}"))
            .with_context("status", status.as_u16())
            .with_context("body", body),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use alikms_core::ErrorKind;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn response(status: u16, body: &'static str) -> http::Response<Bytes> {
        http::Response::builder()
            .status(status)
            .body(Bytes::from_static(body.as_bytes()))
            .unwrap()
    }

    #[test_case(500; "internal error")]
    #[test_case(502; "bad gateway")]
    #[test_case(503; "unavailable")]
    fn test_server_error_is_retryable(status: u16) {
        let Classification::RetryableFailure(err) = classify(&response(status, "busy")) else {
            panic!("{status} must be retryable");
        };
        assert_eq!(err.kind(), ErrorKind::ServerError);
        assert_eq!(err.context_value("status"), Some(status.to_string().as_str()));
        assert_eq!(err.context_value("body"), Some("busy"));
    }

    #[test]
    fn test_success_parses_json() {
        let Classification::Success(v) = classify(&response(
            200,
            r#"{"RequestId":"abc","Regions":{"Region":[]}}"#,
        )) else {
            panic!("200 with json must succeed");
        };
        assert_eq!(v["RequestId"], "abc");
    }

    #[test]
    fn test_success_with_bad_json_is_terminal() {
        let Classification::TerminalFailure(err) = classify(&response(200, "<html>")) else {
            panic!("200 with html must be terminal");
        };
        assert_eq!(err.kind(), ErrorKind::ResponseInvalid);
        assert_eq!(err.message(), "return value must be json: <html>");
    }

    #[test_case(400; "bad request")]
    #[test_case(403; "forbidden")]
    #[test_case(404; "not found")]
    #[test_case(302; "redirect")]
    fn test_other_status_is_terminal(status: u16) {
        let Classification::TerminalFailure(err) =
            classify(&response(status, r#"{"Code":"Forbidden.KeyNotFound"}"#))
        else {
            panic!("{status} must be terminal");
        };
        assert_eq!(err.kind(), ErrorKind::ResponseInvalid);
        assert_eq!(
            err.context_value("body"),
            Some(r#"{"Code":"Forbidden.KeyNotFound"}"#)
        );
    }

    #[test]
    fn test_transport_errors() {
        assert!(matches!(
            Classification::from_send_result(Err(Error::timeout("timed out"))),
            Classification::RetryableFailure(_)
        ));
        assert!(matches!(
            Classification::from_send_result(Err(Error::unexpected("connection refused"))),
            Classification::TerminalFailure(_)
        ));
    }
}
