use std::{
    fmt, io,
    net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs},
    str::FromStr,
    time::Duration,
};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};
use socket2::{Domain, Protocol, Socket, Type};

use crate::internal_events::{
    UdpSendError, UdpSendIncompleteError, UdpSocketConnectionEstablished,
    UdpSocketOutgoingConnectionError,
};

/// Hostname and port tuple.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct HostAndPort {
    /// Hostname.
    pub host: String,

    /// Port.
    pub port: u16,
}

impl TryFrom<String> for HostAndPort {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let uri = value.parse::<http::Uri>().map_err(|e| e.to_string())?;
        let host = uri
            .host()
            .ok_or_else(|| "missing host".to_string())?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();
        let port = uri.port_u16().ok_or_else(|| "missing port".to_string())?;

        Ok(Self { host, port })
    }
}

impl FromStr for HostAndPort {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::try_from(value.to_owned())
    }
}

impl From<HostAndPort> for String {
    fn from(value: HostAndPort) -> Self {
        value.to_string()
    }
}

impl fmt::Display for HostAndPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

#[derive(Debug, Snafu)]
#[snafu(module, context(suffix(false)), visibility(pub))]
pub enum NetError {
    #[snafu(display("Failed to resolve address: {}", source))]
    FailedToResolve { source: io::Error },

    #[snafu(display("No addresses returned."))]
    NoAddresses,

    #[snafu(display("Failed to configure socket: {}.", source))]
    FailedToConfigure { source: io::Error },

    #[snafu(display("Failed to bind socket: {}.", source))]
    FailedToBind { source: io::Error },

    #[snafu(display("Failed to connect to endpoint: {}", source))]
    FailedToConnect { source: io::Error },

    #[snafu(display("Failed to send datagram {} of {}: {}", sequence + 1, total, source))]
    FailedToSend {
        source: io::Error,
        sequence: usize,
        total: usize,
    },

    #[snafu(display(
        "Sent only {} of {} bytes of datagram {}.",
        sent,
        data_size,
        sequence + 1
    ))]
    SendIncomplete {
        sequence: usize,
        data_size: usize,
        sent: usize,
    },
}

/// A connectionless socket that writes whole datagrams.
pub trait DatagramSocket {
    fn send_datagram(&mut self, datagram: &[u8]) -> io::Result<usize>;
}

impl DatagramSocket for Socket {
    fn send_datagram(&mut self, datagram: &[u8]) -> io::Result<usize> {
        self.send(datagram)
    }
}

/// Opens one socket per logical send.
pub trait Connector {
    type Socket: DatagramSocket;

    fn connect(&self) -> Result<Self::Socket, NetError>;
}

/// UDP connection settings.
#[derive(Clone, Debug)]
pub struct UdpConnector {
    address: HostAndPort,
    send_buffer_size: Option<usize>,
    write_timeout: Option<Duration>,
}

impl UdpConnector {
    pub const fn new(address: HostAndPort) -> Self {
        Self {
            address,
            send_buffer_size: None,
            write_timeout: None,
        }
    }

    /// The size of the socket's send buffer, passed via the `SO_SNDBUF` option.
    pub const fn with_send_buffer_size(mut self, send_buffer_size: Option<usize>) -> Self {
        self.send_buffer_size = send_buffer_size;
        self
    }

    /// Upper bound for a single blocking write.
    pub const fn with_write_timeout(mut self, write_timeout: Option<Duration>) -> Self {
        self.write_timeout = write_timeout;
        self
    }

    pub const fn address(&self) -> &HostAndPort {
        &self.address
    }

    pub const fn write_timeout(&self) -> Option<Duration> {
        self.write_timeout
    }

    fn bind(&self, addr: &SocketAddr) -> Result<Socket, NetError> {
        let socket = Socket::new(Domain::for_address(*addr), Type::DGRAM, Some(Protocol::UDP))
            .context(net_error::FailedToConfigure)?;

        if let Some(send_buffer_size) = self.send_buffer_size {
            if let Err(error) = socket.set_send_buffer_size(send_buffer_size) {
                warn!(%error, "Failed configuring send buffer size on UDP socket.");
            }
        }

        let bind_address = find_bind_address(addr);
        socket
            .bind(&bind_address.into())
            .context(net_error::FailedToBind)?;
        Ok(socket)
    }

    /// Resolves and connects a socket for use on a tokio runtime.
    pub async fn connect_async(&self) -> Result<tokio::net::UdpSocket, NetError> {
        let addr = tokio::net::lookup_host((self.address.host.as_str(), self.address.port))
            .await
            .context(net_error::FailedToResolve)?
            .next()
            .ok_or(NetError::NoAddresses)?;

        let socket = self.bind(&addr)?;
        socket
            .set_nonblocking(true)
            .context(net_error::FailedToConfigure)?;
        socket
            .connect(&addr.into())
            .context(net_error::FailedToConnect)?;
        let socket = tokio::net::UdpSocket::from_std(socket.into())
            .context(net_error::FailedToConfigure)?;

        emit!(UdpSocketConnectionEstablished { peer_addr: &addr });
        Ok(socket)
    }
}

impl Connector for UdpConnector {
    type Socket = Socket;

    fn connect(&self) -> Result<Socket, NetError> {
        debug!(message = "Resolving DNS.", host = %self.address.host);
        let addr = (self.address.host.as_str(), self.address.port)
            .to_socket_addrs()
            .context(net_error::FailedToResolve)?
            .next()
            .ok_or(NetError::NoAddresses)?;

        let socket = self.bind(&addr)?;
        socket
            .set_write_timeout(self.write_timeout)
            .context(net_error::FailedToConfigure)?;
        socket
            .connect(&addr.into())
            .context(net_error::FailedToConnect)?;

        emit!(UdpSocketConnectionEstablished { peer_addr: &addr });
        Ok(socket)
    }
}

pub(crate) fn find_bind_address(remote_addr: &SocketAddr) -> SocketAddr {
    match remote_addr {
        SocketAddr::V4(_) => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
        SocketAddr::V6(_) => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
    }
}

/// Writes `datagrams` in order on a fresh socket. The first failed or short write aborts the
/// send; datagrams after it are not attempted. The socket is closed when this returns.
pub fn send_datagrams<C: Connector>(connector: &C, datagrams: &[Bytes]) -> Result<(), NetError> {
    let mut socket = connector
        .connect()
        .inspect_err(|error| emit!(UdpSocketOutgoingConnectionError { error }))?;

    let total = datagrams.len();
    for (sequence, datagram) in datagrams.iter().enumerate() {
        trace!(message = "Sending datagram.", sequence, bytes = datagram.len());
        let sent = socket
            .send_datagram(datagram)
            .map_err(|source| send_failed(source, sequence, total))?;
        check_sent(sequence, datagram.len(), sent)?;
    }
    Ok(())
}

/// Async counterpart of [`send_datagrams`].
pub async fn send_datagrams_async(
    connector: &UdpConnector,
    datagrams: &[Bytes],
) -> Result<(), NetError> {
    let socket = connector
        .connect_async()
        .await
        .inspect_err(|error| emit!(UdpSocketOutgoingConnectionError { error }))?;

    let total = datagrams.len();
    for (sequence, datagram) in datagrams.iter().enumerate() {
        trace!(message = "Sending datagram.", sequence, bytes = datagram.len());
        let result = match connector.write_timeout() {
            Some(timeout) => tokio::time::timeout(timeout, socket.send(datagram))
                .await
                .unwrap_or_else(|_| Err(io::ErrorKind::TimedOut.into())),
            None => socket.send(datagram).await,
        };
        let sent = result.map_err(|source| send_failed(source, sequence, total))?;
        check_sent(sequence, datagram.len(), sent)?;
    }
    Ok(())
}

fn send_failed(source: io::Error, sequence: usize, total: usize) -> NetError {
    emit!(UdpSendError {
        error: &source,
        sequence,
        total,
    });
    NetError::FailedToSend {
        source,
        sequence,
        total,
    }
}

fn check_sent(sequence: usize, data_size: usize, sent: usize) -> Result<(), NetError> {
    if sent < data_size {
        emit!(UdpSendIncompleteError { data_size, sent });
        return Err(NetError::SendIncomplete {
            sequence,
            data_size,
            sent,
        });
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use std::net::UdpSocket;

    use bytes::Bytes;
    use rstest::rstest;

    use super::test::{RecordingConnector, WriteBehavior};
    use super::*;

    fn datagrams() -> Vec<Bytes> {
        vec![
            Bytes::from_static(b"first"),
            Bytes::from_static(b"second"),
            Bytes::from_static(b"third"),
        ]
    }

    #[rstest]
    #[case("127.0.0.1:12201", "127.0.0.1", 12201)]
    #[case("graylog.internal:12201", "graylog.internal", 12201)]
    #[case("[::1]:12201", "::1", 12201)]
    fn parse_host_and_port(#[case] input: &str, #[case] host: &str, #[case] port: u16) {
        let parsed: HostAndPort = input.parse().unwrap();
        assert_eq!(parsed.host, host);
        assert_eq!(parsed.port, port);
        assert_eq!(parsed.to_string(), input);
    }

    #[rstest]
    #[case("graylog.internal")]
    #[case("")]
    fn parse_host_and_port_errors(#[case] input: &str) {
        assert!(input.parse::<HostAndPort>().is_err());
    }

    #[test]
    fn writes_in_order_on_one_socket() {
        let connector = RecordingConnector::default();
        send_datagrams(&connector, &datagrams()).unwrap();

        assert_eq!(connector.connects(), 1);
        assert_eq!(
            connector.written(),
            vec![b"first".to_vec(), b"second".to_vec(), b"third".to_vec()]
        );
    }

    #[test]
    fn failed_write_aborts_remaining() {
        let connector = RecordingConnector::failing_from(1, WriteBehavior::Fail);
        let error = send_datagrams(&connector, &datagrams()).unwrap_err();

        assert!(matches!(
            error,
            NetError::FailedToSend {
                sequence: 1,
                total: 3,
                ..
            }
        ));
        assert_eq!(connector.written(), vec![b"first".to_vec()]);
    }

    #[test]
    fn zero_byte_write_is_a_failure() {
        let connector = RecordingConnector::failing_from(0, WriteBehavior::Short);
        let error = send_datagrams(&connector, &datagrams()).unwrap_err();

        assert!(matches!(
            error,
            NetError::SendIncomplete {
                sequence: 0,
                data_size: 5,
                sent: 0
            }
        ));
        assert!(connector.written().is_empty());
    }

    #[test]
    fn connect_failure_sends_nothing() {
        let connector = RecordingConnector {
            refuse_connect: true,
            ..RecordingConnector::default()
        };
        let error = send_datagrams(&connector, &datagrams()).unwrap_err();

        assert!(matches!(error, NetError::FailedToConnect { .. }));
        assert!(connector.written().is_empty());
    }

    #[test]
    fn udp_connector_delivers_datagrams() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        let port = receiver.local_addr().unwrap().port();
        let connector = UdpConnector::new(HostAndPort {
            host: "127.0.0.1".to_owned(),
            port,
        })
        .with_send_buffer_size(Some(65536))
        .with_write_timeout(Some(Duration::from_secs(1)));

        send_datagrams(&connector, &datagrams()).unwrap();

        let mut buf = [0; 64];
        for expected in datagrams() {
            let len = receiver.recv(&mut buf).unwrap();
            assert_eq!(&buf[..len], &expected[..]);
        }
    }

    #[tokio::test]
    async fn async_udp_connector_delivers_datagrams() {
        let receiver = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = receiver.local_addr().unwrap().port();
        let connector = UdpConnector::new(HostAndPort {
            host: "127.0.0.1".to_owned(),
            port,
        })
        .with_write_timeout(Some(Duration::from_secs(1)));

        send_datagrams_async(&connector, &datagrams()).await.unwrap();

        let mut buf = [0; 64];
        for expected in datagrams() {
            let len = receiver.recv(&mut buf).await.unwrap();
            assert_eq!(&buf[..len], &expected[..]);
        }
    }

    #[test]
    fn unresolvable_host() {
        let connector = UdpConnector::new(HostAndPort {
            host: "host.invalid".to_owned(),
            port: 12201,
        });
        let error = send_datagrams(&connector, &datagrams()).unwrap_err();
        assert!(matches!(
            error,
            NetError::FailedToResolve { .. } | NetError::NoAddresses
        ));
    }
}
