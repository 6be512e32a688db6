#[cfg(feature = "http-gateway")]
mod imp {
    use reqwest::blocking::Client;
    use reqwest::header::CONTENT_TYPE;
    use smsforward_core::{OutgoingMessage, SmsTransport, TransportError};
    use std::time::Duration;
    use url::Url;

    /// Posts `{"to": .., "body": ..}` to an SMS gateway endpoint.
    #[derive(Debug, Clone)]
    pub struct HttpTransport {
        client: Client,
        endpoint: Url,
        timeout: Duration,
    }

    impl HttpTransport {
        pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, TransportError> {
            let endpoint = Url::parse(endpoint)
                .map_err(|err| TransportError::Unavailable(format!("invalid url: {err}")))?;
            if !matches!(endpoint.scheme(), "http" | "https") {
                return Err(TransportError::Unavailable(format!(
                    "unsupported url scheme: {}",
                    endpoint.scheme()
                )));
            }
            let client = Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|err| TransportError::Unavailable(err.to_string()))?;
            Ok(Self {
                client,
                endpoint,
                timeout,
            })
        }

        pub fn endpoint(&self) -> &Url {
            &self.endpoint
        }
    }

    impl SmsTransport for HttpTransport {
        fn send(&self, message: &OutgoingMessage) -> Result<(), TransportError> {
            let payload = serde_json::to_vec(message)
                .map_err(|err| TransportError::Encode(err.to_string()))?;
            let response = self
                .client
                .post(self.endpoint.clone())
                .header(CONTENT_TYPE, "application/json")
                .body(payload)
                .send()
                .map_err(|err| {
                    if err.is_timeout() {
                        TransportError::Timeout(self.timeout)
                    } else {
                        TransportError::Unavailable(err.to_string())
                    }
                })?;

            let status = response.status();
            if !status.is_success() {
                return Err(TransportError::Rejected(format!("gateway returned {status}")));
            }
            Ok(())
        }
    }

}

#[cfg(feature = "http-gateway")]
pub use imp::HttpTransport;
