use bytes::BytesMut;

use crate::cipher::Cipher;
use crate::codec::CodecResult;
use crate::packets::Packet;
use crate::session::SessionContext;

/// A protocol version implementation: wire codec for its own layouts plus
/// the conversion to and from the version-independent packet set.
///
/// Conversions return zero or more packets. A legacy packet with no latest
/// equivalent converts to nothing; a latest packet may fan out into several
/// legacy packets.
pub trait ProtocolAdapter: Send + Sync {
    /// Numeric network protocol version.
    fn protocol_version(&self) -> i32;

    /// Human-readable game version string.
    fn version(&self) -> &'static str;

    /// Decode a packet body of this version into the shared representation.
    /// Unrecognised IDs decode to [`Packet::Unknown`], never to an error.
    fn decode_packet(
        &self,
        id: u32,
        payload: &mut BytesMut,
        ctx: &SessionContext,
    ) -> CodecResult<Packet>;

    /// Encode a shared-representation packet into this version's wire
    /// layout, returning the packet ID and body.
    fn encode_packet(&self, packet: &Packet, ctx: &SessionContext)
        -> CodecResult<(u32, BytesMut)>;

    /// Convert a packet decoded from this version into its latest-version
    /// meaning: structural upgrade first, then identifier translation.
    fn convert_to_latest(&self, packet: Packet, ctx: &SessionContext)
        -> CodecResult<Vec<Packet>>;

    /// Convert a latest-version packet into this version's meaning:
    /// identifier translation first, then structural downgrade.
    fn convert_from_latest(
        &self,
        packet: Packet,
        ctx: &SessionContext,
    ) -> CodecResult<Vec<Packet>>;

    /// Network runtime ID of the shield item in this version, or 0 when the
    /// version has none. Stacks of this item carry a blocking-tick field.
    fn shield_network_id(&self) -> i32;

    /// Build the stream cipher this version encrypts frames with.
    fn cipher(&self, key: &[u8; 32]) -> Cipher;
}

/// Record session state carried inside packets as they pass through. Called
/// by the transport layer on every converted packet before forwarding.
pub fn observe_packet(packet: &Packet, ctx: &mut SessionContext) {
    if let Packet::StartGame(data) = packet {
        ctx.entity_unique_id = data.entity_unique_id;
        ctx.entity_runtime_id = data.entity_runtime_id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packets::StartGameData;

    #[test]
    fn test_observe_start_game_records_entity_ids() {
        let mut ctx = SessionContext::new(419, 589);
        let packet = Packet::StartGame(Box::new(StartGameData {
            entity_unique_id: -7,
            entity_runtime_id: 7,
            ..StartGameData::default()
        }));
        observe_packet(&packet, &mut ctx);
        assert_eq!(ctx.entity_unique_id, -7);
        assert_eq!(ctx.entity_runtime_id, 7);

        // Unrelated packets leave the session untouched.
        observe_packet(
            &Packet::TickSync {
                client_request_timestamp: 1,
                server_reception_timestamp: 2,
            },
            &mut ctx,
        );
        assert_eq!(ctx.entity_runtime_id, 7);
    }
}
