/// Read-only per-connection metadata supplied by the transport layer.
///
/// The translation core never mutates this; both forward directions of a
/// proxied pairing share one copy without locking.
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// Unique ID of the local player entity, established during StartGame.
    pub entity_unique_id: i64,
    /// Runtime ID of the local player entity.
    pub entity_runtime_id: u64,
    /// Network runtime ID negotiated for the shield item. Stacks holding
    /// this item carry a trailing blocking-tick field on the wire.
    pub shield_network_id: i32,
    /// Protocol version spoken by the client side of the pairing.
    pub client_protocol: i32,
    /// Protocol version spoken by the server side of the pairing.
    pub server_protocol: i32,
}

impl SessionContext {
    pub fn new(client_protocol: i32, server_protocol: i32) -> Self {
        Self {
            entity_unique_id: 0,
            entity_runtime_id: 0,
            shield_network_id: 0,
            client_protocol,
            server_protocol,
        }
    }
}
