// src/fetch/mod.rs

use reqwest::{blocking::Client, StatusCode};
use std::time::Duration;
use tracing::{debug, info, instrument};
use url::Url;

use crate::date_code::DateCode;
use crate::error::{PipelineError, Result};

pub mod zips;

/// Where archive bytes come from. The pipeline only needs the body of a
/// successful download.
pub trait ArchiveSource {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>>;
}

/// `{base}/{code}.zip`. A missing trailing slash on `base` is tolerated.
pub fn archive_url(base: &str, code: &DateCode) -> Result<Url> {
    let invalid = |e: url::ParseError| PipelineError::InvalidFormat {
        input: base.to_string(),
        reason: format!("bad archive base URL: {e}"),
    };
    let mut base = Url::parse(base).map_err(invalid)?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(&code.archive_file_name()).map_err(invalid)
}

/// One blocking GET per archive, no retries.
pub struct HttpArchiveSource {
    client: Client,
}

impl HttpArchiveSource {
    pub fn new(user_agent: &str, timeout: Option<Duration>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::DownloadError {
                url: String::new(),
                source: e,
            })?;
        Ok(Self { client })
    }
}

impl ArchiveSource for HttpArchiveSource {
    #[instrument(level = "info", skip(self), fields(url = %url))]
    fn fetch(&self, url: &Url) -> Result<Vec<u8>> {
        let download_err = |e| PipelineError::DownloadError {
            url: url.to_string(),
            source: e,
        };

        let resp = self
            .client
            .get(url.as_str())
            .send()
            .map_err(download_err)?;
        let status = resp.status();
        debug!(%status, "response");
        if status != StatusCode::OK {
            return Err(PipelineError::ArchiveUnavailable {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = resp.bytes().map_err(download_err)?;
        info!(bytes = bytes.len(), "downloaded");
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        io::{Read, Write},
        net::TcpListener,
        thread::{self, JoinHandle},
    };

    /// Answer one request with `response` and hand back the raw request head.
    fn serve_once(response: &'static [u8]) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}/pr/", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            stream.write_all(response).unwrap();
            String::from_utf8_lossy(&head).into_owned()
        });
        (base, handle)
    }

    fn client() -> HttpArchiveSource {
        HttpArchiveSource::new("Mozilla/5.0", Some(Duration::from_secs(5))).unwrap()
    }

    #[test]
    fn builds_archive_url_from_base() {
        let code = DateCode::parse("PR250425").unwrap();
        let url = archive_url(
            "https://nsearchives.nseindia.com/archives/equities/bhavcopy/pr/",
            &code,
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://nsearchives.nseindia.com/archives/equities/bhavcopy/pr/PR250425.zip"
        );
    }

    #[test]
    fn tolerates_base_without_trailing_slash() {
        let code = DateCode::parse("PR020125").unwrap();
        let url = archive_url("http://localhost:8080/pr", &code).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/pr/PR020125.zip");
    }

    #[test]
    fn rejects_unparseable_base() {
        let code = DateCode::parse("PR020125").unwrap();
        assert!(archive_url("not a url", &code).is_err());
    }

    #[test]
    fn non_200_status_is_unavailable() {
        let (base, server) =
            serve_once(b"HTTP/1.1 204 No Content\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        let code = DateCode::parse("PR250425").unwrap();
        let url = archive_url(&base, &code).unwrap();

        let err = client().fetch(&url).unwrap_err();
        assert!(
            matches!(err, PipelineError::ArchiveUnavailable { status: 204, .. }),
            "{err:?}"
        );

        let request = server.join().unwrap().to_ascii_lowercase();
        assert!(request.starts_with("get /pr/pr250425.zip "), "{request}");
        assert!(request.contains("user-agent: mozilla/5.0\r\n"), "{request}");
    }

    #[test]
    fn ok_status_returns_body() {
        let (base, server) =
            serve_once(b"HTTP/1.1 200 OK\r\nContent-Length: 4\r\nConnection: close\r\n\r\nPK\x03\x04");
        let code = DateCode::parse("PR250425").unwrap();
        let url = archive_url(&base, &code).unwrap();

        assert_eq!(client().fetch(&url).unwrap(), b"PK\x03\x04".to_vec());
        server.join().unwrap();
    }

    #[test]
    fn refused_connection_is_download_error() {
        let code = DateCode::parse("PR250425").unwrap();
        let url = archive_url("http://127.0.0.1:1/pr/", &code).unwrap();
        let err = client().fetch(&url).unwrap_err();
        assert!(matches!(err, PipelineError::DownloadError { .. }), "{err:?}");
    }
}
