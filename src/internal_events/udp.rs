use metrics::counter;

use super::InternalEvent;
use super::prelude::{error_stage, error_type};
use crate::sinks::util::udp::NetError;

#[derive(Debug)]
pub struct UdpSocketConnectionEstablished<'a> {
    pub peer_addr: &'a std::net::SocketAddr,
}

impl InternalEvent for UdpSocketConnectionEstablished<'_> {
    fn emit(self) {
        debug!(message = "Connected.", peer_addr = %self.peer_addr);
        counter!("connection_established_total", "mode" => "udp").increment(1);
    }
}

#[derive(Debug)]
pub struct UdpSocketOutgoingConnectionError<'a> {
    pub error: &'a NetError,
}

impl InternalEvent for UdpSocketOutgoingConnectionError<'_> {
    fn emit(self) {
        error!(
            message = "Unable to connect.",
            error = %self.error,
            error_code = "failed_connecting",
            error_type = error_type::CONNECTION_FAILED,
            stage = error_stage::SENDING,
        );
        counter!(
            "component_errors_total",
            "error_code" => "failed_connecting",
            "error_type" => error_type::CONNECTION_FAILED,
            "stage" => error_stage::SENDING,
        )
        .increment(1);
    }
}

#[derive(Debug)]
pub struct UdpSendError<'a> {
    pub error: &'a std::io::Error,
    pub sequence: usize,
    pub total: usize,
}

impl InternalEvent for UdpSendError<'_> {
    fn emit(self) {
        error!(
            message = "UDP send failed; remaining datagrams of this message are dropped.",
            error = %self.error,
            sequence = self.sequence,
            total = self.total,
            error_type = error_type::WRITER_FAILED,
            stage = error_stage::SENDING,
        );
        counter!(
            "component_errors_total",
            "error_type" => error_type::WRITER_FAILED,
            "stage" => error_stage::SENDING,
        )
        .increment(1);
        counter!("connection_send_errors_total", "mode" => "udp").increment(1);
    }
}

#[derive(Debug)]
pub struct UdpSendIncompleteError {
    pub data_size: usize,
    pub sent: usize,
}

impl InternalEvent for UdpSendIncompleteError {
    fn emit(self) {
        error!(
            message = "Could not send all data in one UDP packet; dropping message.",
            data_size = self.data_size,
            sent = self.sent,
            dropped = self.data_size - self.sent,
            error_type = error_type::WRITER_FAILED,
            stage = error_stage::SENDING,
        );
        counter!(
            "component_errors_total",
            "error_type" => error_type::WRITER_FAILED,
            "stage" => error_stage::SENDING,
        )
        .increment(1);
        // deprecated
        counter!("connection_send_errors_total", "mode" => "udp").increment(1);
    }
}
