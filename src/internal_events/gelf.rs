use gelf_codecs::{EncodingError, ValidationError};
use metrics::counter;

use super::InternalEvent;
use super::prelude::{error_stage, error_type};

#[derive(Debug)]
pub struct GelfMessageSent {
    pub byte_size: usize,
    pub chunk_count: usize,
}

impl InternalEvent for GelfMessageSent {
    fn emit(self) {
        trace!(
            message = "GELF message sent.",
            byte_size = self.byte_size,
            chunk_count = self.chunk_count,
        );
        counter!("component_sent_events_total", "protocol" => "udp").increment(1);
        counter!("component_sent_bytes_total", "protocol" => "udp")
            .increment(self.byte_size as u64);
    }

    fn name(&self) -> Option<&'static str> {
        Some("GelfMessageSent")
    }
}

#[derive(Debug)]
pub struct GelfValidationError<'a> {
    pub error: &'a ValidationError,
}

impl InternalEvent for GelfValidationError<'_> {
    fn emit(self) {
        error!(
            message = "Rejected GELF message field.",
            error = %self.error,
            error_code = "invalid_field",
            error_type = error_type::CONDITION_FAILED,
            stage = error_stage::PROCESSING,
        );
        counter!(
            "component_errors_total",
            "error_code" => "invalid_field",
            "error_type" => error_type::CONDITION_FAILED,
            "stage" => error_stage::PROCESSING,
        )
        .increment(1);
        counter!("component_discarded_events_total", "intentional" => "false").increment(1);
    }

    fn name(&self) -> Option<&'static str> {
        Some("GelfValidationError")
    }
}

#[derive(Debug)]
pub struct GelfEncoderError<'a> {
    pub error: &'a EncodingError,
}

impl InternalEvent for GelfEncoderError<'_> {
    fn emit(self) {
        error!(
            message = "Failed encoding GELF message.",
            error = %self.error,
            error_code = "encoder_serialize",
            error_type = error_type::ENCODER_FAILED,
            stage = error_stage::SENDING,
        );
        counter!(
            "component_errors_total",
            "error_code" => "encoder_serialize",
            "error_type" => error_type::ENCODER_FAILED,
            "stage" => error_stage::SENDING,
        )
        .increment(1);
        counter!("component_discarded_events_total", "intentional" => "false").increment(1);
    }

    fn name(&self) -> Option<&'static str> {
        Some("GelfEncoderError")
    }
}

#[derive(Debug)]
pub struct GelfMessageTooLarge {
    pub byte_size: usize,
    pub chunk_count: usize,
    pub max_chunks: usize,
}

impl InternalEvent for GelfMessageTooLarge {
    fn emit(self) {
        error!(
            message = "GELF message needs too many chunks; dropping it.",
            byte_size = self.byte_size,
            chunk_count = self.chunk_count,
            max_chunks = self.max_chunks,
            error_code = "encoder_chunk",
            error_type = error_type::ENCODER_FAILED,
            stage = error_stage::SENDING,
        );
        counter!(
            "component_errors_total",
            "error_code" => "encoder_chunk",
            "error_type" => error_type::ENCODER_FAILED,
            "stage" => error_stage::SENDING,
        )
        .increment(1);
        counter!("component_discarded_events_total", "intentional" => "false").increment(1);
    }

    fn name(&self) -> Option<&'static str> {
        Some("GelfMessageTooLarge")
    }
}
