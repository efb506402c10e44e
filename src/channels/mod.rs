//! Channel adapters — transport payloads in, reply envelopes out.

pub mod whatsapp;

pub use whatsapp::{CanonicalMessage, TwilioInbound};
