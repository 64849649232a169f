//! Fuzz target for wire decoding
//!
//! The server feeds every inbound frame body through
//! `decode_message::<Request>`, and clients decode arbitrary
//! `ServerMessage` frames. Neither may ever panic or over-allocate on
//! hostile bytes.

#![no_main]

use libfuzzer_sys::fuzz_target;
use warden_proto::{Request, ServerMessage, codec};

fuzz_target!(|data: &[u8]| {
    let _ = codec::decode_message::<Request>(data);
    let _ = codec::decode_message::<ServerMessage>(data);
});
