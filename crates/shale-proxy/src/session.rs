use crate::config::ProxyConfig;
use crate::connection::{Connection, ConnectionReader, ConnectionWriter};
use anyhow::Result;
use shale_protocol_core::{observe_packet, ProtocolAdapter, SessionContext};
use shale_protocol_latest::LatestAdapter;
use shale_protocol_v419::Protocol419;
use std::sync::{Arc, RwLock};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

/// Select the adapter for a client protocol version.
pub fn adapter_for(protocol: i32) -> Option<Arc<dyn ProtocolAdapter>> {
    match protocol {
        shale_protocol_v419::PROTOCOL_VERSION => Some(Arc::new(Protocol419::new())),
        shale_protocol_latest::PROTOCOL_VERSION => Some(Arc::new(LatestAdapter::new())),
        _ => None,
    }
}

/// Proxy one client connection: dial the upstream server and pump packets
/// both ways through the client version's conversion until either side
/// closes.
pub async fn run(client_stream: TcpStream, config: Arc<ProxyConfig>) -> Result<()> {
    let peer = client_stream.peer_addr()?;
    let client_adapter = adapter_for(config.client_protocol).ok_or_else(|| {
        anyhow::anyhow!("unsupported client protocol {}", config.client_protocol)
    })?;
    let server_adapter: Arc<dyn ProtocolAdapter> = Arc::new(LatestAdapter::new());

    let server_stream = TcpStream::connect(&config.upstream).await?;
    let mut client_conn = Connection::new(client_stream);
    let mut server_conn = Connection::new(server_stream);

    if config.compression_enabled {
        client_conn.enable_compression(config.compression_threshold);
        server_conn.enable_compression(config.compression_threshold);
    }
    if let Some(key) = config.key_bytes()? {
        client_conn.enable_encryption(client_adapter.cipher(&key), client_adapter.cipher(&key));
        server_conn.enable_encryption(server_adapter.cipher(&key), server_adapter.cipher(&key));
    }

    let mut ctx = SessionContext::new(
        client_adapter.protocol_version(),
        server_adapter.protocol_version(),
    );
    ctx.shield_network_id = server_adapter.shield_network_id();
    let ctx = Arc::new(RwLock::new(ctx));

    info!(
        "Session for {}: {} ({}) -> {} ({})",
        peer,
        client_adapter.version(),
        client_adapter.protocol_version(),
        server_adapter.version(),
        server_adapter.protocol_version()
    );

    let (client_reader, client_writer) = client_conn.into_split();
    let (server_reader, server_writer) = server_conn.into_split();

    // The conversion lives on the client's adapter in both directions;
    // whichever loop ends first tears the whole session down.
    let serverbound = forward(
        client_reader,
        server_writer,
        client_adapter.clone(),
        server_adapter.clone(),
        client_adapter.clone(),
        ctx.clone(),
        Direction::Serverbound,
    );
    let clientbound = forward(
        server_reader,
        client_writer,
        server_adapter,
        client_adapter.clone(),
        client_adapter,
        ctx,
        Direction::Clientbound,
    );

    tokio::select! {
        result = serverbound => {
            debug!("Serverbound loop for {} ended: {:?}", peer, result);
        }
        result = clientbound => {
            debug!("Clientbound loop for {} ended: {:?}", peer, result);
        }
    }
    Ok(())
}

#[derive(Clone, Copy, Debug)]
enum Direction {
    Serverbound,
    Clientbound,
}

/// Clone the shared context. The context is plain data, so a lock poisoned
/// by a panicking sibling task is recovered rather than cascading the
/// panic into this forward loop.
fn context_snapshot(ctx: &RwLock<SessionContext>) -> SessionContext {
    ctx.read().unwrap_or_else(|e| e.into_inner()).clone()
}

async fn forward(
    mut reader: ConnectionReader,
    mut writer: ConnectionWriter,
    decoder: Arc<dyn ProtocolAdapter>,
    encoder: Arc<dyn ProtocolAdapter>,
    converter: Arc<dyn ProtocolAdapter>,
    ctx: Arc<RwLock<SessionContext>>,
    direction: Direction,
) -> Result<()> {
    loop {
        let (id, mut payload) = reader.read_packet().await?;
        let snapshot = context_snapshot(&ctx);

        let packet = match decoder.decode_packet(id, &mut payload, &snapshot) {
            Ok(packet) => packet,
            Err(e) => {
                // A single malformed body is dropped rather than killing
                // the session.
                warn!("{:?} decode failed for id=0x{:02X}: {}", direction, id, e);
                continue;
            }
        };

        let converted = match direction {
            Direction::Serverbound => converter.convert_to_latest(packet, &snapshot),
            Direction::Clientbound => converter.convert_from_latest(packet, &snapshot),
        };
        let converted = match converted {
            Ok(packets) => packets,
            Err(e) => {
                warn!("{:?} conversion failed: {}", direction, e);
                continue;
            }
        };

        for packet in converted {
            observe_packet(&packet, &mut ctx.write().unwrap_or_else(|e| e.into_inner()));
            let (out_id, out_payload) = match encoder.encode_packet(&packet, &snapshot) {
                Ok(encoded) => encoded,
                Err(e) => {
                    warn!("{:?} encode of {} failed: {}", direction, packet.name(), e);
                    continue;
                }
            };
            writer.write_packet(out_id, &out_payload).await?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapter_selection() {
        assert_eq!(adapter_for(419).unwrap().protocol_version(), 419);
        assert_eq!(adapter_for(589).unwrap().protocol_version(), 589);
        assert!(adapter_for(407).is_none());
    }

    #[test]
    fn test_snapshot_recovers_from_poisoned_lock() {
        let ctx = Arc::new(RwLock::new(SessionContext::new(419, 589)));
        let poisoner = Arc::clone(&ctx);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.write().unwrap();
            panic!("poison the lock");
        })
        .join();
        assert!(ctx.read().is_err());
        assert_eq!(context_snapshot(&ctx).client_protocol, 419);
    }
}
