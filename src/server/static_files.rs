//! Static file serving for the client UI
//!
//! Non-API `GET` requests are answered from a directory on disk. Paths are
//! sanitized before they touch the filesystem, so `..` can never leave the
//! root.

use std::path::PathBuf;

use http::header::{self, HeaderValue};
use http::StatusCode;
use tokio::fs;

use super::response::{self, Response};

/// MIME type detection based on file extension
fn mime_type_for_extension(extension: &str) -> &'static str {
    match extension.to_lowercase().as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" => "application/json",
        "txt" => "text/plain; charset=utf-8",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "webmanifest" => "application/manifest+json",
        "wasm" => "application/wasm",
        _ => "application/octet-stream",
    }
}

/// Serves files below a root directory
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
    index_file: String,
}

impl StaticFiles {
    /// Serve files from `root`, with `index.html` for directories
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            index_file: "index.html".to_string(),
        }
    }

    /// Answer a request for `request_path`
    ///
    /// With `head_only` the headers are the same but the body is empty.
    pub async fn serve(&self, request_path: &str, head_only: bool) -> Response {
        let mut path = self.root.join(sanitize_path(&percent_decode(request_path)));

        if fs::metadata(&path).await.map(|m| m.is_dir()).unwrap_or(false) {
            path = path.join(&self.index_file);
        }

        let content = match fs::read(&path).await {
            Ok(content) => content,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Static file not found");
                return response::full(
                    StatusCode::NOT_FOUND,
                    "text/plain; charset=utf-8",
                    "File not found",
                );
            }
        };

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let content_type = mime_type_for_extension(extension);
        let length = content.len();

        let mut response = if head_only {
            response::empty(StatusCode::OK)
        } else {
            response::full(StatusCode::OK, content_type, content)
        };

        let headers = response.headers_mut();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        response
    }
}

/// Sanitize a request path to prevent directory traversal
fn sanitize_path(path: &str) -> String {
    path.split(['/', '\\'])
        .filter(|part| !part.is_empty() && *part != "." && *part != "..")
        .collect::<Vec<_>>()
        .join("/")
}

/// Decode `%XX` escapes; malformed escapes are kept literally
fn percent_decode(path: &str) -> String {
    let bytes = path.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%'
            && i + 2 < bytes.len()
            && bytes[i + 1].is_ascii_hexdigit()
            && bytes[i + 2].is_ascii_hexdigit()
        {
            decoded.push(hex_value(bytes[i + 1]) << 4 | hex_value(bytes[i + 2]));
            i += 3;
            continue;
        }
        decoded.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&decoded).into_owned()
}

fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        _ => digit - b'A' + 10,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[test]
    fn test_mime_type_detection() {
        assert_eq!(mime_type_for_extension("html"), "text/html; charset=utf-8");
        assert_eq!(mime_type_for_extension("JS"), "text/javascript; charset=utf-8");
        assert_eq!(mime_type_for_extension("png"), "image/png");
        assert_eq!(mime_type_for_extension("unknown"), "application/octet-stream");
    }

    #[test]
    fn test_sanitize_path() {
        assert_eq!(sanitize_path("/index.html"), "index.html");
        assert_eq!(sanitize_path("../../../etc/passwd"), "etc/passwd");
        assert_eq!(sanitize_path("foo/../bar"), "foo/bar");
        assert_eq!(sanitize_path("./script.js"), "script.js");
        assert_eq!(sanitize_path("..\\..\\secret"), "secret");
    }

    #[test]
    fn test_percent_decode() {
        assert_eq!(percent_decode("/my%20file.txt"), "/my file.txt");
        assert_eq!(percent_decode("/%2e%2e/x"), "/../x");
        assert_eq!(percent_decode("/100%"), "/100%");
        assert_eq!(percent_decode("/%zz"), "/%zz");
    }

    #[tokio::test]
    async fn test_serve_index_for_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>tasks</h1>").unwrap();
        let files = StaticFiles::new(dir.path());

        let response = files.serve("/", false).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"<h1>tasks</h1>");
    }

    #[tokio::test]
    async fn test_head_has_no_body() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("script.js"), "let x = 1;").unwrap();
        let files = StaticFiles::new(dir.path());

        let response = files.serve("/script.js", true).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "10");

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let files = StaticFiles::new(dir.path());

        let response = files.serve("/nope.css", false).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_traversal_stays_inside_root() {
        let outer = tempfile::tempdir().unwrap();
        let root = outer.path().join("public");
        std::fs::create_dir(&root).unwrap();
        std::fs::write(outer.path().join("secret.txt"), "secret").unwrap();
        let files = StaticFiles::new(&root);

        let response = files.serve("/../secret.txt", false).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = files.serve("/%2e%2e/secret.txt", false).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
