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

use std::time::Duration;

use alikms_core::{Context, ErrorKind, TransportOptions};
use alikms_http_send_reqwest::ReqwestHttpSend;
use anyhow::Result;
use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serve exactly one connection, answering with `response` after `delay`.
async fn serve_once(response: &'static str, delay: Duration) -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        let Ok((mut stream, _)) = listener.accept().await else {
            return;
        };
        let mut buf = [0u8; 4096];
        let _ = stream.read(&mut buf).await;
        tokio::time::sleep(delay).await;
        let _ = stream.write_all(response.as_bytes()).await;
        let _ = stream.shutdown().await;
    });

    Ok(format!("http://{addr}/?Action=DescribeRegions"))
}

fn request(url: &str, timeout: Duration) -> Result<http::Request<Bytes>> {
    let mut req = http::Request::get(url).body(Bytes::new())?;
    req.extensions_mut().insert(TransportOptions {
        timeout,
        ignore_ssl: false,
    });
    Ok(req)
}

#[tokio::test]
async fn test_send_returns_status_and_body() -> Result<()> {
    let url = serve_once(
        "HTTP/1.1 503 Service Unavailable\r\ncontent-length: 6\r\nconnection: close\r\n\r\nfailed",
        Duration::ZERO,
    )
    .await?;

    let ctx = Context::new().with_http_send(ReqwestHttpSend::default());
    let resp = ctx.http_send(request(&url, Duration::from_secs(5))?).await?;

    assert_eq!(resp.status(), http::StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(resp.body().as_ref(), b"failed");
    Ok(())
}

#[tokio::test]
async fn test_send_reports_timeout() -> Result<()> {
    let url = serve_once(
        "HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\n{}",
        Duration::from_secs(5),
    )
    .await?;

    let ctx = Context::new().with_http_send(ReqwestHttpSend::default());
    let err = ctx
        .http_send(request(&url, Duration::from_millis(100))?)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(err.is_retryable());
    Ok(())
}
