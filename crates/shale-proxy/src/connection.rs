use bytes::{Buf, BytesMut};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use shale_protocol_core::{read_varu32, write_varu32, Cipher, CodecError};
use std::io::{Read as _, Write as _};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::trace;

/// A framed game connection with optional compression and encryption.
///
/// Each frame is a varuint length prefix followed by the body; the body is
/// the packet ID varuint plus the payload, zlib-deflated above the
/// compression threshold. Encryption covers whole frames, prefix included.
pub struct Connection {
    stream: TcpStream,
    read_buf: BytesMut,
    compression_threshold: Option<u16>,
    encryptor: Option<Cipher>,
    decryptor: Option<Cipher>,
}

impl Connection {
    pub fn new(stream: TcpStream) -> Self {
        Self {
            stream,
            read_buf: BytesMut::with_capacity(4096),
            compression_threshold: None,
            encryptor: None,
            decryptor: None,
        }
    }

    pub fn enable_compression(&mut self, threshold: u16) {
        self.compression_threshold = Some(threshold);
    }

    /// Enable frame encryption. The two cipher instances must be freshly
    /// keyed; each keeps independent stream state per direction.
    pub fn enable_encryption(&mut self, encryptor: Cipher, decryptor: Cipher) {
        self.encryptor = Some(encryptor);
        self.decryptor = Some(decryptor);
    }

    pub fn peer_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.stream.peer_addr()
    }

    /// Split the connection into read and write halves for concurrent I/O.
    /// Compression and encryption state moves into the halves.
    pub fn into_split(self) -> (ConnectionReader, ConnectionWriter) {
        let (read_half, write_half) = self.stream.into_split();
        (
            ConnectionReader {
                stream: read_half,
                read_buf: self.read_buf,
                compression_threshold: self.compression_threshold,
                decryptor: self.decryptor,
            },
            ConnectionWriter {
                stream: write_half,
                compression_threshold: self.compression_threshold,
                encryptor: self.encryptor,
            },
        )
    }
}

/// Read half of a split connection.
pub struct ConnectionReader {
    stream: OwnedReadHalf,
    read_buf: BytesMut,
    compression_threshold: Option<u16>,
    decryptor: Option<Cipher>,
}

impl ConnectionReader {
    pub async fn read_packet(&mut self) -> anyhow::Result<(u32, BytesMut)> {
        loop {
            if let Some(result) =
                try_parse_frame(&mut self.read_buf, self.compression_threshold)?
            {
                return Ok(result);
            }
            let mut tmp = [0u8; 4096];
            let n = self.stream.read(&mut tmp).await?;
            if n == 0 {
                return Err(anyhow::anyhow!("connection closed"));
            }
            let data = &mut tmp[..n];
            if let Some(ref mut decryptor) = self.decryptor {
                decryptor.decrypt(data);
            }
            self.read_buf.extend_from_slice(data);
        }
    }
}

/// Write half of a split connection.
pub struct ConnectionWriter {
    stream: OwnedWriteHalf,
    compression_threshold: Option<u16>,
    encryptor: Option<Cipher>,
}

impl ConnectionWriter {
    pub async fn write_packet(&mut self, packet_id: u32, payload: &[u8]) -> anyhow::Result<()> {
        let frame = build_frame(
            packet_id,
            payload,
            self.compression_threshold,
            &mut self.encryptor,
        );
        self.stream.write_all(&frame).await?;
        Ok(())
    }
}

// === Shared helpers ===

fn try_parse_frame(
    read_buf: &mut BytesMut,
    compression_threshold: Option<u16>,
) -> anyhow::Result<Option<(u32, BytesMut)>> {
    if read_buf.is_empty() {
        return Ok(None);
    }

    let mut peek = read_buf.clone();
    let length = match read_varu32(&mut peek) {
        Ok(len) => len as usize,
        Err(CodecError::NotEnoughData) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let prefix_bytes = read_buf.len() - peek.len();
    if peek.remaining() < length {
        return Ok(None);
    }

    read_buf.advance(prefix_bytes);
    let mut body = read_buf.split_to(length);

    if compression_threshold.is_some() {
        let raw_length = read_varu32(&mut body)? as usize;
        if raw_length > 0 {
            let mut decompressed = vec![0u8; raw_length];
            let mut decoder = ZlibDecoder::new(&body[..]);
            decoder.read_exact(&mut decompressed)?;
            body = BytesMut::from(&decompressed[..]);
        }
    }

    let packet_id = read_varu32(&mut body)?;
    trace!("read frame id=0x{:02X} len={}", packet_id, body.len());
    Ok(Some((packet_id, body)))
}

fn build_frame(
    packet_id: u32,
    payload: &[u8],
    compression_threshold: Option<u16>,
    encryptor: &mut Option<Cipher>,
) -> Vec<u8> {
    let mut body = BytesMut::new();
    write_varu32(&mut body, packet_id);
    body.extend_from_slice(payload);

    let mut frame = BytesMut::new();
    if let Some(threshold) = compression_threshold {
        if body.len() >= threshold as usize {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            let _ = encoder.write_all(&body);
            let compressed = encoder.finish().unwrap_or_default();

            let mut raw_length = BytesMut::new();
            write_varu32(&mut raw_length, body.len() as u32);
            write_varu32(&mut frame, (raw_length.len() + compressed.len()) as u32);
            frame.extend_from_slice(&raw_length);
            frame.extend_from_slice(&compressed);
        } else {
            write_varu32(&mut frame, 1 + body.len() as u32);
            write_varu32(&mut frame, 0);
            frame.extend_from_slice(&body);
        }
    } else {
        write_varu32(&mut frame, body.len() as u32);
        frame.extend_from_slice(&body);
    }

    let mut frame = frame.to_vec();
    if let Some(ref mut enc) = encryptor {
        enc.encrypt(&mut frame);
    }
    frame
}
