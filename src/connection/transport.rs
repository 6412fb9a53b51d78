//! TCP and TLS transport primitives.

use std::{
    io::{self, Write},
    net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs},
    time::Duration,
};

use native_tls::{TlsConnector, TlsStream};

/// Endpoint targeted by the connection worker.
#[derive(Clone, Debug)]
pub(crate) struct TcpTransport {
    /// Hostname or IP address to connect to.
    pub host: String,
    /// TCP port number.
    pub port: u16,
    /// Optional TLS configuration.
    pub tls: Option<TlsOptions>,
}

impl TcpTransport {
    fn socket_addrs(&self) -> io::Result<Vec<SocketAddr>> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map(|iter| iter.collect())
    }
}

/// TLS connection options.
#[derive(Clone, Debug)]
pub(crate) struct TlsOptions {
    /// Domain name presented during the TLS handshake.
    pub domain: String,
    /// Skip certificate validation when true (intended for tests).
    pub insecure_skip_verify: bool,
}

impl TlsOptions {
    fn connector(&self) -> io::Result<TlsConnector> {
        let mut builder = TlsConnector::builder();
        if self.insecure_skip_verify {
            builder.danger_accept_invalid_certs(true);
            builder.danger_accept_invalid_hostnames(true);
        }
        builder.build().map_err(io::Error::other)
    }
}

/// Active socket connection state.
pub(crate) enum ActiveConnection {
    PlainTcp(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

impl ActiveConnection {
    /// Write a full frame to the socket.
    pub(crate) fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match self {
            ActiveConnection::PlainTcp(stream) => stream.write_all(buf),
            ActiveConnection::Tls(stream) => stream.write_all(buf),
        }
    }

    /// Flush the underlying writer.
    pub(crate) fn flush(&mut self) -> io::Result<()> {
        match self {
            ActiveConnection::PlainTcp(stream) => stream.flush(),
            ActiveConnection::Tls(stream) => stream.flush(),
        }
    }

    /// Close the connection gracefully.
    pub(crate) fn close(&mut self) -> io::Result<()> {
        match self {
            ActiveConnection::PlainTcp(stream) => stream.shutdown(Shutdown::Both),
            ActiveConnection::Tls(stream) => stream.shutdown(),
        }
    }
}

fn connect_tcp(config: &TcpTransport, timeout: Duration) -> io::Result<TcpStream> {
    let addrs = config.socket_addrs()?;
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
            io::ErrorKind::TimedOut,
            format!("unable to connect to {}:{}", config.host, config.port),
        )
    }))
}

/// Establish a connection; a TLS handshake that fails to authorize is a
/// connection error, not a usable socket.
pub(crate) fn connect_transport(
    transport: &TcpTransport,
    connect_timeout: Duration,
) -> io::Result<ActiveConnection> {
    let stream = connect_tcp(transport, connect_timeout)?;
    if let Some(tls) = &transport.tls {
        let connector = tls.connector()?;
        stream.set_read_timeout(Some(connect_timeout))?;
        stream.set_write_timeout(Some(connect_timeout))?;
        let stream = connector
            .connect(&tls.domain, stream)
            .map_err(io::Error::other)?;
        let tcp_ref = stream.get_ref();
        tcp_ref.set_read_timeout(None)?;
        tcp_ref.set_write_timeout(None)?;
        Ok(ActiveConnection::Tls(Box::new(stream)))
    } else {
        Ok(ActiveConnection::PlainTcp(stream))
    }
}
