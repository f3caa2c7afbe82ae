pub mod error_stage {
    pub const PROCESSING: &str = "processing";
    pub const SENDING: &str = "sending";
}

pub mod error_type {
    pub const CONDITION_FAILED: &str = "condition_failed";
    pub const CONNECTION_FAILED: &str = "connection_failed";
    pub const ENCODER_FAILED: &str = "encoder_failed";
    pub const WRITER_FAILED: &str = "writer_failed";
}
