use aes::cipher::{BlockEncrypt, KeyInit};
use aes::Aes256;

/// Manual AES-256-CFB8 cipher that supports streaming (byte-at-a-time).
/// The legacy protocol requires maintaining cipher state across multiple
/// encrypt/decrypt calls.
pub struct Cfb8Cipher {
    cipher: Aes256,
    iv: [u8; 16],
}

impl Cfb8Cipher {
    pub fn new(key: &[u8; 32]) -> Self {
        let cipher = Aes256::new(key.into());
        let mut iv = [0u8; 16];
        iv.copy_from_slice(&key[..16]);
        Self { cipher, iv }
    }

    pub fn encrypt(&mut self, data: &mut [u8]) {
        for byte in data.iter_mut() {
            let mut block = aes::Block::from(self.iv);
            self.cipher.encrypt_block(&mut block);
            *byte ^= block[0];
            // Shift IV left by 1, append ciphertext byte
            self.iv.copy_within(1.., 0);
            self.iv[15] = *byte;
        }
    }

    pub fn decrypt(&mut self, data: &mut [u8]) {
        for byte in data.iter_mut() {
            let mut block = aes::Block::from(self.iv);
            self.cipher.encrypt_block(&mut block);
            let ciphertext = *byte;
            *byte ^= block[0];
            // Shift IV left by 1, append original ciphertext byte
            self.iv.copy_within(1.., 0);
            self.iv[15] = ciphertext;
        }
    }
}

/// Manual AES-256-CTR keystream cipher used by the latest protocol. The
/// counter block starts as the first 12 key bytes followed by 00 00 00 02.
pub struct CtrCipher {
    cipher: Aes256,
    counter: [u8; 16],
    keystream: [u8; 16],
    used: usize,
}

impl CtrCipher {
    pub fn new(key: &[u8; 32]) -> Self {
        let cipher = Aes256::new(key.into());
        let mut counter = [0u8; 16];
        counter[..12].copy_from_slice(&key[..12]);
        counter[15] = 2;
        Self {
            cipher,
            counter,
            keystream: [0u8; 16],
            used: 16,
        }
    }

    fn refill(&mut self) {
        let mut block = aes::Block::from(self.counter);
        self.cipher.encrypt_block(&mut block);
        self.keystream.copy_from_slice(&block);
        self.used = 0;
        // Increment the big-endian counter tail.
        for byte in self.counter.iter_mut().rev() {
            *byte = byte.wrapping_add(1);
            if *byte != 0 {
                break;
            }
        }
    }

    /// XOR the keystream over `data`. Encryption and decryption are the
    /// same operation.
    pub fn apply(&mut self, data: &mut [u8]) {
        for byte in data.iter_mut() {
            if self.used == 16 {
                self.refill();
            }
            *byte ^= self.keystream[self.used];
            self.used += 1;
        }
    }
}

/// The stream cipher negotiated for a connection. Which variant applies is
/// decided by the protocol version of the peer.
pub enum Cipher {
    Cfb8(Cfb8Cipher),
    Ctr(CtrCipher),
}

impl Cipher {
    pub fn encrypt(&mut self, data: &mut [u8]) {
        match self {
            Cipher::Cfb8(c) => c.encrypt(data),
            Cipher::Ctr(c) => c.apply(data),
        }
    }

    pub fn decrypt(&mut self, data: &mut [u8]) {
        match self {
            Cipher::Cfb8(c) => c.decrypt(data),
            Cipher::Ctr(c) => c.apply(data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; 32] = [
        0x3f, 0x9a, 0x01, 0x77, 0x12, 0xcd, 0x5b, 0x08, 0xee, 0x42, 0x9c, 0x60, 0x21, 0xb3, 0x54,
        0xde, 0x7a, 0x18, 0x0f, 0xc2, 0x91, 0x36, 0xaa, 0x4d, 0x5e, 0xe0, 0x73, 0x88, 0x2b, 0xc7,
        0x19, 0x64,
    ];

    #[test]
    fn test_cfb8_roundtrip_across_calls() {
        let mut enc = Cfb8Cipher::new(&KEY);
        let mut dec = Cfb8Cipher::new(&KEY);

        let plain = b"first frame".to_vec();
        let mut data = plain.clone();
        enc.encrypt(&mut data);
        assert_ne!(data, plain);
        dec.decrypt(&mut data);
        assert_eq!(data, plain);

        // State carries over to the next frame.
        let plain2 = b"second frame".to_vec();
        let mut data2 = plain2.clone();
        enc.encrypt(&mut data2);
        dec.decrypt(&mut data2);
        assert_eq!(data2, plain2);
    }

    #[test]
    fn test_ctr_is_symmetric() {
        let mut enc = CtrCipher::new(&KEY);
        let mut dec = CtrCipher::new(&KEY);

        let plain: Vec<u8> = (0u8..=255).collect();
        let mut data = plain.clone();
        enc.apply(&mut data);
        assert_ne!(data, plain);
        dec.apply(&mut data);
        assert_eq!(data, plain);
    }

    #[test]
    fn test_ctr_split_calls_match_single_call() {
        let mut whole = CtrCipher::new(&KEY);
        let mut split = CtrCipher::new(&KEY);

        let mut a = vec![0x5Au8; 40];
        whole.apply(&mut a);

        let mut b = vec![0x5Au8; 40];
        split.apply(&mut b[..7]);
        split.apply(&mut b[7..]);
        assert_eq!(a, b);
    }
}
