pub mod udp;

pub use udp::{
    Connector, DatagramSocket, HostAndPort, NetError, UdpConnector, send_datagrams,
    send_datagrams_async,
};
