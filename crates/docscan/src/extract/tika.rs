//! Apache Tika server backend.
//!
//! One `PUT /rmeta/text` per file. Tika answers with a JSON array of
//! metadata objects, container first; the container's `X-TIKA:content` is
//! the document text and its remaining keys are the document metadata. The
//! file is streamed as the request body so large documents are never held in
//! memory.

use std::fs::File;
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::{Body, Client};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::{Map, Value};

use super::{non_empty_len, require_text, DocumentMetadata, ExtractError, Extraction, Extractor};
use crate::sanitize::redact_path;

const RMETA_ENDPOINT: &str = "rmeta/text";
const CONTENT_KEY: &str = "X-TIKA:content";

pub struct TikaExtractor {
    client: Client,
    endpoint: String,
    timeout: Duration,
    fetch_metadata: bool,
}

impl TikaExtractor {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        fetch_metadata: bool,
    ) -> Result<Self, ExtractError> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            ExtractError::ServiceUnavailable(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self {
            client,
            endpoint: format!("{}/{}", base_url.trim_end_matches('/'), RMETA_ENDPOINT),
            timeout,
            fetch_metadata,
        })
    }

    /// Sends the file and returns the container object of the response.
    fn parse_remote(&self, path: &Path, len: u64) -> Result<Map<String, Value>, ExtractError> {
        let file = File::open(path).map_err(|e| ExtractError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mime = mime_guess::from_path(path).first_or_octet_stream();

        let response = self
            .client
            .put(&self.endpoint)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, mime.essence_str())
            .body(Body::sized(file, len))
            .send()
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::ServiceUnavailable(format!(
                "/{} returned HTTP {}",
                RMETA_ENDPOINT, status
            )));
        }

        let body: Value = response.json().map_err(|e| {
            if e.is_timeout() {
                self.transport_error(e)
            } else {
                ExtractError::ServiceUnavailable(format!("Malformed Tika response: {}", e))
            }
        })?;
        match body {
            Value::Array(parts) => match parts.into_iter().next() {
                Some(Value::Object(container)) => Ok(container),
                _ => Err(ExtractError::ServiceUnavailable(
                    "Tika response has no container object".to_string(),
                )),
            },
            _ => Err(ExtractError::ServiceUnavailable(
                "Tika response is not an array".to_string(),
            )),
        }
    }

    fn transport_error(&self, e: reqwest::Error) -> ExtractError {
        if e.is_timeout() {
            ExtractError::Timeout(self.timeout.as_secs())
        } else {
            ExtractError::ServiceUnavailable(e.to_string())
        }
    }
}

impl Extractor for TikaExtractor {
    fn extract(&self, path: &Path) -> Result<Extraction, ExtractError> {
        let _span = tracing::info_span!("extract.tika", file = %redact_path(path)).entered();

        let len = non_empty_len(path)?;
        let mut container = self.parse_remote(path, len)?;

        // Tika leaves the content key out when it found no text.
        let text = match container.remove(CONTENT_KEY) {
            Some(Value::String(text)) => text,
            _ => String::new(),
        };
        let text = require_text(text)?;

        let metadata = if self.fetch_metadata {
            DocumentMetadata::from_json(&container)
        } else {
            DocumentMetadata::default()
        };

        Ok(Extraction { text, metadata })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread;
    use serde_json::json;
    use tempfile::NamedTempFile;

    struct Captured {
        request_line: String,
        headers: Vec<String>,
        body: Vec<u8>,
    }

    /// Serves `connections` requests, answering each with `handler(request_line)`.
    fn spawn_fake_tika<F>(
        connections: usize,
        handler: F,
    ) -> (String, thread::JoinHandle<Vec<Captured>>)
    where
        F: Fn(&str) -> (u16, String) + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let mut seen = Vec::new();
            for _ in 0..connections {
                let (mut stream, _) = listener.accept().unwrap();
                let mut reader = BufReader::new(stream.try_clone().unwrap());

                let mut request_line = String::new();
                reader.read_line(&mut request_line).unwrap();
                let request_line = request_line.trim_end().to_string();

                let mut headers = Vec::new();
                let mut content_length = 0usize;
                loop {
                    let mut line = String::new();
                    reader.read_line(&mut line).unwrap();
                    let line = line.trim_end().to_ascii_lowercase();
                    if line.is_empty() {
                        break;
                    }
                    if let Some(value) = line.strip_prefix("content-length:") {
                        content_length = value.trim().parse().unwrap();
                    }
                    headers.push(line);
                }

                let mut body = vec![0u8; content_length];
                reader.read_exact(&mut body).unwrap();

                let (status, response_body) = handler(&request_line);
                write!(
                    stream,
                    "HTTP/1.1 {} Fake\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    response_body.len(),
                    response_body
                )
                .unwrap();
                stream.flush().unwrap();

                seen.push(Captured {
                    request_line,
                    headers,
                    body,
                });
            }
            seen
        });

        (url, handle)
    }

    fn rmeta(container: Value) -> String {
        json!([container, { "X-TIKA:content": "embedded attachment text" }]).to_string()
    }

    fn document(suffix: &str, contents: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::with_suffix(suffix).unwrap();
        file.write_all(contents).unwrap();
        file
    }

    #[test]
    fn test_extracts_text_and_metadata_in_one_request() {
        let (url, server) = spawn_fake_tika(1, |_| {
            (
                200,
                rmeta(json!({
                    "X-TIKA:content": "\nThis agreement is for the lease of the property.\n",
                    "Author": "J. Halim",
                    "Creation-Date": "2021-03-04T05:06:07Z",
                    "Content-Type": "application/pdf"
                })),
            )
        });
        let file = document(".pdf", b"%PDF-1.5 fake body");

        let extractor = TikaExtractor::new(&url, Duration::from_secs(5), true).unwrap();
        let extraction = extractor.extract(file.path()).unwrap();

        assert!(extraction.text.contains("lease of the property"));
        assert!(!extraction.text.contains("embedded attachment"));
        assert_eq!(extraction.metadata.author.as_deref(), Some("J. Halim"));
        assert!(extraction.metadata.created_at.is_some());

        let seen = server.join().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].request_line.starts_with("PUT /rmeta/text "));
        assert!(seen[0].headers.iter().any(|h| h == "accept: application/json"));
        assert!(seen[0]
            .headers
            .iter()
            .any(|h| h == "content-type: application/pdf"));
        assert_eq!(seen[0].body, b"%PDF-1.5 fake body");
    }

    #[test]
    fn test_metadata_disabled_ignores_metadata_keys() {
        let (url, server) = spawn_fake_tika(1, |_| {
            (
                200,
                rmeta(json!({ "X-TIKA:content": "Statement of claim", "Author": "A. Lawyer" })),
            )
        });
        let file = document(".docx", b"PK fake docx");

        let extractor = TikaExtractor::new(&url, Duration::from_secs(5), false).unwrap();
        let extraction = extractor.extract(file.path()).unwrap();

        assert_eq!(extraction.text, "Statement of claim");
        assert_eq!(extraction.metadata, DocumentMetadata::default());
        assert_eq!(server.join().unwrap().len(), 1);
    }

    #[test]
    fn test_missing_metadata_keys_leave_fields_empty() {
        let (url, server) =
            spawn_fake_tika(1, |_| (200, rmeta(json!({ "X-TIKA:content": "Deed of trust" }))));
        let file = document(".pdf", b"%PDF");

        let extractor = TikaExtractor::new(&url, Duration::from_secs(5), true).unwrap();
        let extraction = extractor.extract(file.path()).unwrap();

        assert_eq!(extraction.text, "Deed of trust");
        assert_eq!(extraction.metadata, DocumentMetadata::default());
        server.join().unwrap();
    }

    #[test]
    fn test_non_success_status_is_service_unavailable() {
        let (url, server) = spawn_fake_tika(1, |_| (503, "down".to_string()));
        let file = document(".pdf", b"%PDF");

        let extractor = TikaExtractor::new(&url, Duration::from_secs(5), false).unwrap();
        match extractor.extract(file.path()) {
            Err(ExtractError::ServiceUnavailable(msg)) => assert!(msg.contains("503")),
            other => panic!("Expected ServiceUnavailable, got {:?}", other),
        }
        server.join().unwrap();
    }

    #[test]
    fn test_malformed_response_is_service_unavailable() {
        let cases = ["not json", "{}", "[]", "[42]"];
        for body in cases {
            let (url, server) = spawn_fake_tika(1, move |_| (200, body.to_string()));
            let file = document(".pdf", b"%PDF");

            let extractor = TikaExtractor::new(&url, Duration::from_secs(5), true).unwrap();
            assert!(
                matches!(
                    extractor.extract(file.path()),
                    Err(ExtractError::ServiceUnavailable(_))
                ),
                "body: {}",
                body
            );
            server.join().unwrap();
        }
    }

    #[test]
    fn test_blank_or_missing_content_is_empty_content() {
        let bodies = [
            rmeta(json!({ "X-TIKA:content": "  \n\n " })),
            rmeta(json!({ "Content-Type": "application/pdf" })),
        ];
        for body in bodies {
            let (url, server) = spawn_fake_tika(1, move |_| (200, body.clone()));
            let file = document(".pdf", b"%PDF");

            let extractor = TikaExtractor::new(&url, Duration::from_secs(5), false).unwrap();
            assert!(matches!(
                extractor.extract(file.path()),
                Err(ExtractError::EmptyContent)
            ));
            server.join().unwrap();
        }
    }

    #[test]
    fn test_unreachable_backend_is_service_unavailable() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let file = document(".pdf", b"%PDF");

        let extractor = TikaExtractor::new(
            &format!("http://127.0.0.1:{}", port),
            Duration::from_secs(5),
            false,
        )
        .unwrap();
        assert!(matches!(
            extractor.extract(file.path()),
            Err(ExtractError::ServiceUnavailable(_))
        ));
    }

    #[test]
    fn test_stalled_backend_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            thread::sleep(Duration::from_secs(3));
            drop(stream);
        });
        let file = document(".pdf", b"%PDF");

        let extractor = TikaExtractor::new(&url, Duration::from_secs(1), false).unwrap();
        assert!(matches!(
            extractor.extract(file.path()),
            Err(ExtractError::Timeout(1))
        ));
        server.join().unwrap();
    }

    #[test]
    fn test_zero_byte_file_never_reaches_backend() {
        let file = NamedTempFile::with_suffix(".pdf").unwrap();
        // Nothing listens here; an attempted request would be ServiceUnavailable.
        let extractor =
            TikaExtractor::new("http://127.0.0.1:9", Duration::from_secs(1), false).unwrap();
        assert!(matches!(
            extractor.extract(file.path()),
            Err(ExtractError::EmptyContent)
        ));
    }

    #[test]
    fn test_trailing_slash_in_base_url() {
        let (url, server) =
            spawn_fake_tika(1, |_| (200, rmeta(json!({ "X-TIKA:content": "Affidavit" }))));
        let file = document(".pdf", b"%PDF");

        let extractor =
            TikaExtractor::new(&format!("{}/", url), Duration::from_secs(5), false).unwrap();
        extractor.extract(file.path()).unwrap();
        let seen = server.join().unwrap();
        assert!(seen[0].request_line.starts_with("PUT /rmeta/text "));
    }
}
