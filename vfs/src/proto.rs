//! Container types for the network front-end's wire protocol, specified
//! here only as an interface — per spec.md §1/§6, the TCP server itself
//! (accept loop, per-client thread, socket I/O) is out of scope; the
//! original's `interpret_input` is an unfinished stub. A future server binds
//! these types to an actual socket and forwards decoded commands to a
//! `Registry`.

/// The fixed header preceding every request: a command code, a flags
/// string (mirroring the CLI's space-separated tokens), and whether any
/// `Payload` fragments follow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestInfo {
    pub command: String,
    pub flags: String,
    pub has_payload: bool,
}

/// One fragment of request body. The server is specified to keep reading
/// payloads until `more_fragments` is false, then dispatch the reassembled
/// command — see spec.md §6 "Network protocol".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub bytes: Vec<u8>,
    pub more_fragments: bool,
}

/// Reassembles a header and its payload fragments into the bytes a command
/// dispatcher would act on. Left unimplemented deliberately: spec.md scopes
/// the wire *encoding* itself to whoever builds the socket front-end; this
/// signature documents the contract such an implementation would satisfy.
pub fn decode_request(_header: &RequestInfo, _payloads: &[Payload]) -> Vec<u8> {
    unimplemented!(
        "network front-end is out of scope per spec.md \u{a7}1/\u{a7}6; \
         only the container types are specified here"
    )
}
