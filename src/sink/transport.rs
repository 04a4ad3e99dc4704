//! Transport primitives for the sink.
//!
//! The connection state machine is written against [`Connector`]; the
//! production implementation is [`TcpConnector`].

use std::{
    fmt,
    io::{self, Write},
    net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs},
    str::FromStr,
    time::Duration,
};

use crate::error::SinkError;

use super::config::DEFAULT_WRITE_TIMEOUT;

/// Collector address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Destination {
    /// Hostname or IP address to connect to.
    pub host: String,
    /// TCP port number.
    pub port: u16,
}

impl Destination {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    fn socket_addrs(&self) -> io::Result<Vec<SocketAddr>> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map(|iter| iter.collect())
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Parses `host:port`, accepting bracketed IPv6 hosts.
impl FromStr for Destination {
    type Err = SinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SinkError::InvalidConfig(format!("server address {s:?} is not host:port"));
        let (host, port) = s.trim().rsplit_once(':').ok_or_else(invalid)?;
        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);
        if host.is_empty() {
            return Err(invalid());
        }
        let port = port.parse::<u16>().map_err(|_| invalid())?;
        Ok(Self::new(host, port))
    }
}

/// Forcibly terminates a live connection from outside the worker thread.
pub struct AbortHandle(Box<dyn FnOnce() + Send>);

impl AbortHandle {
    pub fn new(abort: impl FnOnce() + Send + 'static) -> Self {
        Self(Box::new(abort))
    }

    pub fn abort(self) {
        (self.0)()
    }
}

impl fmt::Debug for AbortHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AbortHandle")
    }
}

/// Opens connections to the collector.
pub trait Connector: Send + 'static {
    type Stream: Write + Send + 'static;

    /// Make one connection attempt bounded by `timeout`.
    fn connect(&self, timeout: Duration) -> io::Result<Self::Stream>;

    /// Handle that can close `stream` while another thread is using it.
    fn abort_handle(&self, _stream: &Self::Stream) -> Option<AbortHandle> {
        None
    }

    /// Human readable destination used in diagnostics.
    fn describe(&self) -> String;
}

/// Plain TCP connector.
#[derive(Clone, Debug)]
pub struct TcpConnector {
    destination: Destination,
    write_timeout: Duration,
}

impl TcpConnector {
    pub fn new(destination: Destination) -> Self {
        Self {
            destination,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }

    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }
}

impl Connector for TcpConnector {
    type Stream = TcpStream;

    fn connect(&self, timeout: Duration) -> io::Result<TcpStream> {
        let stream = connect_tcp(&self.destination, timeout)?;
        stream.set_write_timeout(Some(self.write_timeout))?;
        stream.set_nodelay(true)?;
        Ok(stream)
    }

    fn abort_handle(&self, stream: &TcpStream) -> Option<AbortHandle> {
        let clone = stream.try_clone().ok()?;
        Some(AbortHandle::new(move || {
            let _ = clone.shutdown(Shutdown::Both);
        }))
    }

    fn describe(&self) -> String {
        self.destination.to_string()
    }
}

fn connect_tcp(destination: &Destination, timeout: Duration) -> io::Result<TcpStream> {
    let addrs = destination.socket_addrs()?;
    let mut last_err = None;
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => {
                stream.set_nonblocking(false)?;
                return Ok(stream);
            }
            Err(err) => last_err = Some(err),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("{destination} did not resolve to any address"),
        )
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::{io::Read, net::TcpListener};

    #[rstest]
    #[case("127.0.0.1:5000", "127.0.0.1", 5000)]
    #[case("logs.internal:9020", "logs.internal", 9020)]
    #[case("[::1]:7000", "::1", 7000)]
    fn parses_host_port(#[case] raw: &str, #[case] host: &str, #[case] port: u16) {
        let dest: Destination = raw.parse().expect("valid address");
        assert_eq!(dest, Destination::new(host, port));
    }

    #[rstest]
    #[case("localhost")]
    #[case(":5000")]
    #[case("localhost:http")]
    #[case("localhost:70000")]
    fn rejects_malformed_addresses(#[case] raw: &str) {
        assert!(matches!(raw.parse::<Destination>(), Err(SinkError::InvalidConfig(_))));
    }

    #[rstest]
    fn display_brackets_ipv6_hosts() {
        assert_eq!(Destination::new("::1", 80).to_string(), "[::1]:80");
        assert_eq!(Destination::new("localhost", 80).to_string(), "localhost:80");
    }

    #[rstest]
    fn connects_and_writes() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind listener");
        let addr = listener.local_addr().expect("listener address");
        let connector = TcpConnector::new(Destination::new("127.0.0.1", addr.port()));
        let mut stream = connector
            .connect(Duration::from_secs(1))
            .expect("connect to listener");
        let (mut accepted, _) = listener.accept().expect("accept");
        stream.write_all(b"ping\n").expect("write");
        let mut buf = [0u8; 5];
        accepted.read_exact(&mut buf).expect("read");
        assert_eq!(&buf, b"ping\n");
    }

    #[rstest]
    fn refused_connection_is_an_error() {
        let port = {
            let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind listener");
            listener.local_addr().expect("listener address").port()
        };
        let connector = TcpConnector::new(Destination::new("127.0.0.1", port));
        assert!(connector.connect(Duration::from_millis(500)).is_err());
    }

    #[rstest]
    fn abort_handle_closes_peer_stream() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind listener");
        let addr = listener.local_addr().expect("listener address");
        let connector = TcpConnector::new(Destination::new("127.0.0.1", addr.port()));
        let stream = connector.connect(Duration::from_secs(1)).expect("connect");
        let (mut accepted, _) = listener.accept().expect("accept");
        connector.abort_handle(&stream).expect("tcp streams can be aborted").abort();
        let mut buf = Vec::new();
        let read = accepted.read_to_end(&mut buf).expect("peer sees eof");
        assert_eq!(read, 0);
    }
}
