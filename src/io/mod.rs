//! Output handling for the CLI.
//!
//! Human-readable output is printed by each command; `--json` output goes
//! through the shared [`Envelope`].

pub mod envelope;

pub use envelope::{
    Envelope, ErrorDetails, MessageType, Meta, PayloadKind, ResultCode, SCHEMA_VERSION, Status,
};
