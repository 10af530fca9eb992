//! TLS reachability probe.
//!
//! The one network-bound step of trust report generation. The probe is a
//! total function with bounded latency: the request races a hard deadline,
//! and any validation failure, connection error, or timeout is reported as
//! `false`, never as an error. The losing request future is dropped on
//! timeout, which aborts the underlying connection rather than leaking it.

use futures_util::future::{BoxFuture, FutureExt};
use std::time::Duration;

/// Port for reachability checks, injectable for tests.
pub trait ReachabilityProbe: Send + Sync {
    fn check<'a>(&'a self, domain: &'a str) -> BoxFuture<'a, bool>;
}

/// HTTPS HEAD probe with certificate validation enabled.
pub struct TlsProbe {
    client: reqwest::Client,
    timeout: Duration,
}

impl TlsProbe {
    pub fn new(timeout: Duration) -> Self {
        Self {
            // Certificate validation is on by default; an invalid chain
            // surfaces as a request error, which the probe maps to false.
            client: reqwest::Client::new(),
            timeout,
        }
    }
}

impl ReachabilityProbe for TlsProbe {
    fn check<'a>(&'a self, domain: &'a str) -> BoxFuture<'a, bool> {
        async move {
            let url = format!("https://{domain}/");
            let request = self.client.head(url).send();

            match tokio::time::timeout(self.timeout, request).await {
                Ok(Ok(response)) => {
                    // Anything below 500 counts as reachable: the host
                    // terminates TLS and answers, even if it dislikes HEAD.
                    let reachable = response.status().as_u16() < 500;
                    if !reachable {
                        tracing::debug!(
                            domain,
                            status = %response.status(),
                            "Trust probe: server error status"
                        );
                    }
                    reachable
                }
                Ok(Err(error)) => {
                    tracing::debug!(domain, error = %error, "Trust probe failed: connection or TLS error");
                    false
                }
                Err(_) => {
                    tracing::debug!(
                        domain,
                        timeout_ms = self.timeout.as_millis() as u64,
                        "Trust probe failed: timeout"
                    );
                    false
                }
            }
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_host_is_false_not_an_error() {
        // Port 1 on loopback refuses the connection immediately.
        let probe = TlsProbe::new(Duration::from_millis(2_000));
        assert!(!probe.check("127.0.0.1:1").await);
    }

    #[tokio::test]
    async fn deadline_bounds_the_probe() {
        use std::time::Instant;

        // 203.0.113.0/24 is TEST-NET-3: packets go nowhere, so the connect
        // hangs until the deadline fires.
        let probe = TlsProbe::new(Duration::from_millis(200));
        let started = Instant::now();
        assert!(!probe.check("203.0.113.1").await);
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
