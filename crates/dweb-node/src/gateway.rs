//! HTTP gateway resolver.
//!
//! Resolves `ipfs://<cid>` as `GET {gateway}/ipfs/<cid>` and
//! `ipns://<name>` as `GET {gateway}/ipns/<name>` with a minimal
//! HTTP/1.1 client over `std::net::TcpStream`. Only plain-HTTP gateways
//! are supported; the usual setup is a local daemon on `127.0.0.1:8080`.
//!
//! The socket work is blocking, so [`Resolver::resolve`] hands it to a
//! worker thread and awaits the result over a oneshot channel.

use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use futures::channel::oneshot;
use dweb_types::backend::{Resolved, Resolver};
use dweb_types::error::{DwebError, Result};
use dweb_types::reference::ContentReference;

/// Maximum response body size (8 MB).
const MAX_BODY_SIZE: usize = 8 * 1024 * 1024;

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: u8 = 5;

/// TCP connect timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// TCP read timeout.
const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Where a request goes.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Target {
    host: String,
    port: u16,
    path: String,
}

impl Target {
    /// Parse an absolute `http://host[:port][/path]` URL.
    fn parse(url: &str) -> Result<Self> {
        if url.starts_with("https://") {
            return Err(DwebError::Config(format!(
                "HTTPS gateways are not supported: {url}"
            )));
        }
        let rest = url
            .strip_prefix("http://")
            .ok_or_else(|| DwebError::Config(format!("gateway must be an http:// URL: {url}")))?;

        let (authority, path) = match rest.find('/') {
            Some(pos) => (&rest[..pos], &rest[pos..]),
            None => (rest, ""),
        };
        if authority.is_empty() {
            return Err(DwebError::Config(format!("gateway URL has no host: {url}")));
        }

        let bad_port = || DwebError::Config(format!("bad gateway port in {url}"));
        let (host, port) = if let Some(v6) = authority.strip_prefix('[') {
            let (host, after) = v6.split_once(']').ok_or_else(bad_port)?;
            match after.strip_prefix(':') {
                Some(p) => (host, p.parse::<u16>().map_err(|_| bad_port())?),
                None if after.is_empty() => (host, 80),
                None => return Err(bad_port()),
            }
        } else {
            match authority.rsplit_once(':') {
                Some((host, p)) => (host, p.parse::<u16>().map_err(|_| bad_port())?),
                None => (authority, 80),
            }
        };

        Ok(Self {
            host: host.to_string(),
            port,
            path: path.trim_end_matches('/').to_string(),
        })
    }

    fn with_path(&self, path: &str) -> Self {
        Self {
            host: self.host.clone(),
            port: self.port,
            path: path.to_string(),
        }
    }

    /// Resolve a `Location` header against this target.
    fn follow(&self, location: &str) -> Result<Self> {
        if location.starts_with("http://") || location.starts_with("https://") {
            Self::parse(location)
                .map_err(|e| DwebError::Resolution(format!("bad redirect Location: {e}")))
        } else if location.starts_with('/') {
            Ok(self.with_path(location))
        } else {
            Err(DwebError::Resolution(format!(
                "bad redirect Location: {location}"
            )))
        }
    }

    fn host_header(&self) -> String {
        let host = if self.host.contains(':') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        if self.port == 80 {
            host
        } else {
            format!("{host}:{}", self.port)
        }
    }
}

/// Resolution collaborator backed by an HTTP gateway.
#[derive(Debug, Clone)]
pub struct GatewayResolver {
    base: Target,
}

impl GatewayResolver {
    /// Create a resolver for a gateway such as `http://127.0.0.1:8080`.
    pub fn new(gateway_url: &str) -> Result<Self> {
        Ok(Self {
            base: Target::parse(gateway_url.trim())?,
        })
    }

    /// Fetch a reference, blocking the current thread.
    pub fn fetch(&self, reference: &ContentReference) -> Result<Resolved> {
        let path = format!("{}{}", self.base.path, reference.to_path());
        let mut current = self.base.with_path(&path);

        for _ in 0..MAX_REDIRECTS {
            let resp = do_request(&current)?;

            if is_redirect(resp.status_code)
                && let Some(location) = resp.headers.get("location")
            {
                log::debug!("{reference}: redirected to {location}");
                current = current.follow(location)?;
                continue;
            }

            let content_type = resp.headers.get("content-type").map(str::to_string);
            return Ok(Resolved {
                status: resp.status_code,
                content_type,
                body: resp.body,
            });
        }

        Err(DwebError::Resolution("too many redirects".to_string()))
    }
}

#[async_trait(?Send)]
impl Resolver for GatewayResolver {
    /// Runs [`fetch`](Self::fetch) on a worker thread; the calling task is
    /// suspended until the gateway answers.
    async fn resolve(&self, reference: &ContentReference) -> Result<Resolved> {
        let (tx, rx) = oneshot::channel();
        let resolver = self.clone();
        let target = reference.clone();
        thread::Builder::new()
            .name("dweb-fetch".to_string())
            .spawn(move || {
                // The receiver is gone if the navigation was dropped.
                let _ = tx.send(resolver.fetch(&target));
            })
            .map_err(|e| DwebError::Resolution(format!("spawn fetch worker: {e}")))?;

        rx.await.map_err(|_| {
            DwebError::Resolution(format!("fetch worker for {reference} exited early"))
        })?
    }
}

// -------------------------------------------------------------------
// Internal types
// -------------------------------------------------------------------

/// A parsed HTTP response.
#[derive(Debug)]
struct HttpResponse {
    status_code: u16,
    headers: Headers,
    body: Vec<u8>,
}

/// Response headers, names lowercased.
#[derive(Debug, Default)]
struct Headers(Vec<(String, String)>);

impl Headers {
    fn parse<'a>(lines: impl Iterator<Item = &'a str>) -> Self {
        Self(
            lines
                .filter_map(|line| line.split_once(':'))
                .map(|(name, value)| (name.trim().to_ascii_lowercase(), value.trim().to_string()))
                .collect(),
        )
    }

    /// Case-insensitive lookup.
    fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn is_chunked(&self) -> bool {
        self.get("transfer-encoding")
            .is_some_and(|v| v.to_ascii_lowercase().contains("chunked"))
    }
}

// -------------------------------------------------------------------
// Internals
// -------------------------------------------------------------------

fn do_request(target: &Target) -> Result<HttpResponse> {
    let mut stream = tcp_connect(target)?;
    send_request(&mut stream, target)?;
    let raw = read_response(&mut stream)?;
    parse_response(&raw)
}

/// Open a TCP connection with connect and read timeouts.
fn tcp_connect(target: &Target) -> Result<TcpStream> {
    let authority = if target.host.contains(':') {
        format!("[{}]:{}", target.host, target.port)
    } else {
        format!("{}:{}", target.host, target.port)
    };

    let addr = authority
        .to_socket_addrs()
        .map_err(|e| DwebError::Resolution(format!("DNS resolution failed: {e}")))?
        .next()
        .ok_or_else(|| DwebError::Resolution(format!("no addresses for {authority}")))?;

    let stream = TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT)
        .map_err(|e| DwebError::Resolution(format!("TCP connect failed: {e}")))?;
    stream.set_read_timeout(Some(READ_TIMEOUT))?;
    Ok(stream)
}

/// Send an HTTP/1.1 GET request.
fn send_request(stream: &mut impl Write, target: &Target) -> Result<()> {
    let request = format!(
        "GET {path} HTTP/1.1\r\n\
         Host: {host}\r\n\
         User-Agent: dweb-nav/0.1\r\n\
         Accept: */*\r\n\
         Connection: close\r\n\
         \r\n",
        path = target.path,
        host = target.host_header(),
    );
    stream
        .write_all(request.as_bytes())
        .map_err(|e| DwebError::Resolution(format!("send request: {e}")))
}

/// Room for the status line and headers on top of the body cap.
const HEAD_ALLOWANCE: usize = 16 * 1024;

/// Read the response until EOF or the read timeout fires.
fn read_response(stream: &mut impl Read) -> Result<Vec<u8>> {
    let limit = MAX_BODY_SIZE + HEAD_ALLOWANCE;
    let mut buf = Vec::with_capacity(8192);
    match stream.by_ref().take(limit as u64 + 1).read_to_end(&mut buf) {
        Ok(_) => {},
        // Timed out after a partial response: keep what arrived.
        Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {},
        Err(e) => return Err(DwebError::Resolution(format!("read response: {e}"))),
    }
    if buf.len() > limit {
        return Err(DwebError::Resolution("response too large".to_string()));
    }
    Ok(buf)
}

fn parse_response(data: &[u8]) -> Result<HttpResponse> {
    let malformed = |what: &str| DwebError::Resolution(format!("malformed HTTP response: {what}"));

    let head_len =
        find_subsequence(data, b"\r\n\r\n").ok_or_else(|| malformed("no header terminator"))?;
    let head = std::str::from_utf8(&data[..head_len]).map_err(|_| malformed("non-UTF-8 headers"))?;
    let mut lines = head.split("\r\n");
    let status_code = parse_status_line(lines.next().unwrap_or_default())?;
    let headers = Headers::parse(lines);

    let raw = &data[head_len + 4..];
    let body = if headers.is_chunked() {
        decode_chunked(raw)?
    } else if let Some(declared) = headers.get("content-length") {
        let len: usize = declared
            .parse()
            .map_err(|_| malformed("bad Content-Length"))?;
        check_body_size(len)?;
        raw[..raw.len().min(len)].to_vec()
    } else {
        check_body_size(raw.len())?;
        raw.to_vec()
    };

    Ok(HttpResponse {
        status_code,
        headers,
        body,
    })
}

fn check_body_size(len: usize) -> Result<()> {
    if len > MAX_BODY_SIZE {
        return Err(DwebError::Resolution(
            "response body exceeds 8 MB limit".to_string(),
        ));
    }
    Ok(())
}

/// Status code from `HTTP/1.x NNN reason`.
fn parse_status_line(line: &str) -> Result<u16> {
    line.split(' ')
        .nth(1)
        .and_then(|code| code.parse().ok())
        .ok_or_else(|| DwebError::Resolution(format!("bad status line: {line:?}")))
}

/// Decode a chunked body. A truncated last chunk keeps what arrived.
///
/// Sizes come from the peer, so each one is checked against the body cap
/// before it is used in any offset arithmetic.
fn decode_chunked(mut data: &[u8]) -> Result<Vec<u8>> {
    let bad_size = || DwebError::Resolution("bad chunk size".to_string());
    let mut body = Vec::new();

    while let Some(line_len) = find_subsequence(data, b"\r\n") {
        let size_line = std::str::from_utf8(&data[..line_len]).map_err(|_| bad_size())?;
        // Chunk extensions follow `;`.
        let digits = size_line.split(';').next().unwrap_or_default().trim();
        let size = usize::from_str_radix(digits, 16).map_err(|_| bad_size())?;
        if size == 0 {
            break;
        }
        // `body.len()` never exceeds the cap, so this cannot underflow.
        if size > MAX_BODY_SIZE - body.len() {
            return Err(DwebError::Resolution(
                "chunked body exceeds 8 MB limit".to_string(),
            ));
        }

        data = &data[line_len + 2..];
        let available = size.min(data.len());
        body.extend_from_slice(&data[..available]);
        if available < size {
            break;
        }
        data = data.get(size + 2..).unwrap_or_default();
    }

    Ok(body)
}

fn is_redirect(status: u16) -> bool {
    matches!(status, 301 | 302 | 303 | 307 | 308)
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
