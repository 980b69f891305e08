//! Browser link: one static page over plain HTTP and a WebSocket endpoint.
//!
//! Runs entirely on its own threads. The accept loop hands each connection to
//! a short-lived thread; WebSocket clients get a long-lived one that forwards
//! inbound messages as `LinkEvent::Data` and writes whatever the instrument
//! puts in the client's outbox. Nothing here touches measurement state.

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel as xch;
use eyre::WrapErr;
use sag_core::link::{ClientId, LinkEvent, LinkSender};
use tungstenite::handshake::HandshakeError;
use tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tungstenite::http::StatusCode;
use tungstenite::{Message, WebSocket};

const INDEX_HTML: &str = include_str!("../assets/index.html");
const WS_PATH_MARKER: &str = "{{WS_PATH}}";

const ACCEPT_POLL: Duration = Duration::from_millis(20);
const CLIENT_POLL: Duration = Duration::from_millis(10);
const HEAD_TIMEOUT: Duration = Duration::from_secs(2);
const WRITE_TIMEOUT: Duration = Duration::from_secs(1);
const MAX_HEAD: usize = 8192;
const MAX_HEADERS: usize = 64;

#[derive(Debug, Clone)]
pub struct WebCfg {
    /// Listen address, `host:port`.
    pub bind: String,
    /// Path that accepts the WebSocket upgrade.
    pub ws_path: String,
    /// Payloads buffered per client before new ones are dropped.
    pub outbox_depth: usize,
}

impl Default for WebCfg {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
            ws_path: "/ws".to_string(),
            outbox_depth: 4,
        }
    }
}

/// Handle to the running server. Dropping it stops accepting connections
/// and asks open clients to close.
#[derive(Debug)]
pub struct WebServer {
    local_addr: SocketAddr,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl WebServer {
    pub fn spawn(cfg: WebCfg, events: LinkSender) -> eyre::Result<Self> {
        let listener =
            TcpListener::bind(&cfg.bind).wrap_err_with(|| format!("bind {}", cfg.bind))?;
        listener
            .set_nonblocking(true)
            .wrap_err("set listener non-blocking")?;
        let local_addr = listener.local_addr().wrap_err("listener address")?;

        let stop = Arc::new(AtomicBool::new(false));
        let site = Arc::new(Site::new(cfg));
        let stop_bg = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("sag-web".into())
            .spawn(move || accept_loop(&listener, &site, &events, &stop_bg))
            .wrap_err("spawn web server thread")?;

        tracing::info!(addr = %local_addr, "web server listening");
        Ok(Self {
            local_addr,
            stop,
            handle: Some(handle),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl Drop for WebServer {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            tracing::warn!("web server thread panicked");
        }
    }
}

/// Per-server state shared by connection threads.
#[derive(Debug)]
struct Site {
    page: String,
    ws_path: String,
    outbox_depth: usize,
}

impl Site {
    fn new(cfg: WebCfg) -> Self {
        Self {
            page: INDEX_HTML.replace(WS_PATH_MARKER, &cfg.ws_path),
            ws_path: cfg.ws_path,
            outbox_depth: cfg.outbox_depth.max(1),
        }
    }
}

fn accept_loop(listener: &TcpListener, site: &Arc<Site>, events: &LinkSender, stop: &Arc<AtomicBool>) {
    let mut next_id: ClientId = 1;
    while !stop.load(Ordering::Relaxed) {
        match listener.accept() {
            Ok((stream, peer)) => {
                let id = next_id;
                next_id += 1;
                let site = Arc::clone(site);
                let events = events.clone();
                let stop = Arc::clone(stop);
                let spawned = thread::Builder::new()
                    .name(format!("sag-conn-{id}"))
                    .spawn(move || {
                        if let Err(e) = serve_connection(stream, id, &site, &events, &stop) {
                            tracing::debug!(id, %peer, error = %e, "connection ended with error");
                        }
                    });
                if let Err(e) = spawned {
                    tracing::warn!(error = %e, "could not spawn connection thread");
                }
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL),
            Err(e) => {
                tracing::warn!(error = %e, "accept failed");
                thread::sleep(ACCEPT_POLL);
            }
        }
    }
    tracing::debug!("web server stopped");
}

/// Request line and the one header that decides routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RequestHead {
    pub(crate) method: String,
    pub(crate) path: String,
    pub(crate) upgrade: bool,
}

/// Parse a request head with `httparse`. `Ok(None)` means the head is not
/// complete yet; on success the second field is the head length in bytes.
pub(crate) fn parse_head(buf: &[u8]) -> Result<Option<(RequestHead, usize)>, httparse::Error> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut req = httparse::Request::new(&mut headers);
    let httparse::Status::Complete(len) = req.parse(buf)? else {
        return Ok(None);
    };
    let (Some(method), Some(target)) = (req.method, req.path) else {
        return Ok(None);
    };
    let path = target.split('?').next().unwrap_or(target).to_string();
    let upgrade = req.headers.iter().any(|h| {
        h.name.eq_ignore_ascii_case("upgrade") && h.value.eq_ignore_ascii_case(b"websocket")
    });
    Ok(Some((
        RequestHead {
            method: method.to_string(),
            path,
            upgrade,
        },
        len,
    )))
}

/// Look at the request head without consuming it, so the WebSocket
/// handshake can still read it. Returns the head and its length in bytes.
fn peek_head(stream: &TcpStream) -> io::Result<Option<(RequestHead, usize)>> {
    stream.set_read_timeout(Some(HEAD_TIMEOUT))?;
    let deadline = Instant::now() + HEAD_TIMEOUT;
    let mut buf = vec![0u8; MAX_HEAD];
    loop {
        let n = stream.peek(&mut buf)?;
        if n == 0 {
            return Ok(None);
        }
        match parse_head(&buf[..n]) {
            Ok(Some(found)) => return Ok(Some(found)),
            Ok(None) => {}
            Err(e) => {
                tracing::debug!(error = %e, "malformed request head");
                return Ok(None);
            }
        }
        if n == buf.len() || Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(Duration::from_millis(2));
    }
}

fn serve_connection(
    stream: TcpStream,
    id: ClientId,
    site: &Site,
    events: &LinkSender,
    stop: &AtomicBool,
) -> io::Result<()> {
    stream.set_nonblocking(false)?;
    let Some((head, len)) = peek_head(&stream)? else {
        return respond(stream, 0, "400 Bad Request", "text/plain", "bad request\n");
    };
    tracing::trace!(method = %head.method, path = %head.path, upgrade = head.upgrade, "request");
    match (head.method.as_str(), head.upgrade) {
        ("GET", true) => run_client(stream, id, site, events, stop),
        ("GET", false) if head.path == "/" || head.path == "/index.html" => respond(
            stream,
            len,
            "200 OK",
            "text/html; charset=utf-8",
            &site.page,
        ),
        ("GET", _) => respond(stream, len, "404 Not Found", "text/plain", "not found\n"),
        _ => respond(
            stream,
            len,
            "405 Method Not Allowed",
            "text/plain",
            "method not allowed\n",
        ),
    }
}

fn respond(
    mut stream: TcpStream,
    head_len: usize,
    status: &str,
    content_type: &str,
    body: &str,
) -> io::Result<()> {
    // consume the request so closing does not reset the connection
    let mut head = vec![0u8; head_len];
    stream.read_exact(&mut head)?;
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(response.as_bytes())?;
    stream.flush()
}

/// Upgrades only on the configured path; anything else is answered 404
/// by the handshake itself.
fn check_path<'a>(
    ws_path: &'a str,
) -> impl FnOnce(&Request, Response) -> Result<Response, ErrorResponse> + 'a {
    move |req: &Request, resp: Response| {
        if req.uri().path() == ws_path {
            return Ok(resp);
        }
        let mut err = ErrorResponse::new(Some("not found\n".to_string()));
        *err.status_mut() = StatusCode::NOT_FOUND;
        Err(err)
    }
}

fn run_client(
    stream: TcpStream,
    id: ClientId,
    site: &Site,
    events: &LinkSender,
    stop: &AtomicBool,
) -> io::Result<()> {
    let mut ws = match tungstenite::accept_hdr(stream, check_path(&site.ws_path)) {
        Ok(ws) => ws,
        Err(HandshakeError::Failure(e)) => return Err(io::Error::other(e.to_string())),
        Err(HandshakeError::Interrupted(_)) => {
            return Err(io::Error::other("websocket handshake interrupted"));
        }
    };
    ws.get_ref().set_read_timeout(Some(CLIENT_POLL))?;
    ws.get_ref().set_write_timeout(Some(WRITE_TIMEOUT))?;

    let (outbox, pending) = xch::bounded::<String>(site.outbox_depth);
    if events.send(LinkEvent::Connected { id, outbox }).is_err() {
        return Ok(());
    }
    tracing::info!(id, "client connected");
    let result = pump(&mut ws, id, &pending, events, stop);
    // the instrument may already be gone at shutdown
    let _ = events.send(LinkEvent::Disconnected { id });
    tracing::info!(id, "client disconnected");
    result
}

fn pump(
    ws: &mut WebSocket<TcpStream>,
    id: ClientId,
    pending: &xch::Receiver<String>,
    events: &LinkSender,
    stop: &AtomicBool,
) -> io::Result<()> {
    let mut tracked = true;
    while !stop.load(Ordering::Relaxed) {
        while tracked {
            match pending.try_recv() {
                Ok(text) => ws.send(Message::Text(text)).map_err(ws_error)?,
                Err(xch::TryRecvError::Empty) => break,
                Err(xch::TryRecvError::Disconnected) => {
                    tracked = false;
                    tracing::debug!(id, "client superseded; no further updates");
                }
            }
        }

        match ws.read() {
            Ok(Message::Text(text)) => forward(events, id, text.into_bytes())?,
            Ok(Message::Binary(bytes)) => forward(events, id, bytes)?,
            // close, ping and pong are answered inside tungstenite
            Ok(_) => {}
            Err(tungstenite::Error::Io(e))
                if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {}
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                return Ok(());
            }
            Err(e) => return Err(ws_error(e)),
        }
    }
    let _ = ws.close(None);
    let _ = ws.flush();
    Ok(())
}

fn forward(events: &LinkSender, id: ClientId, bytes: Vec<u8>) -> io::Result<()> {
    events
        .send(LinkEvent::Data { id, bytes })
        .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "instrument stopped"))
}

fn ws_error(e: tungstenite::Error) -> io::Error {
    match e {
        tungstenite::Error::Io(io) => io,
        other => io::Error::other(other.to_string()),
    }
}
