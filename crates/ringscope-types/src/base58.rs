//! CryptoNote Base58.
//!
//! Not Bitcoin's Base58Check: input is cut into 8-byte blocks, each written
//! as exactly 11 characters, and a trailing partial block uses the size map
//! in `ENCODED_BLOCK_SIZES`. Addresses add a varint tag in front and a
//! 4-byte Keccak-256 checksum at the end.

use crate::constants::CHECKSUM_SIZE;
use crate::varint::{read_varint, write_varint};
use thiserror::Error;
use tiny_keccak::{Hasher, Keccak};

const ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

const FULL_BLOCK_SIZE: usize = 8;
const FULL_ENCODED_BLOCK_SIZE: usize = 11;

/// Characters needed for a block of `n` bytes (index = n).
const ENCODED_BLOCK_SIZES: [usize; FULL_BLOCK_SIZE + 1] = [0, 2, 3, 5, 6, 7, 9, 10, 11];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Base58Error {
    #[error("invalid character '{0}' at position {1}")]
    InvalidCharacter(char, usize),

    #[error("invalid encoded length {0}")]
    InvalidLength(usize),

    #[error("block {0} decodes to a value wider than its byte size")]
    Overflow(usize),

    #[error("decoded address too short ({0} bytes)")]
    AddressTooShort(usize),

    #[error("checksum mismatch")]
    ChecksumMismatch,

    #[error("malformed address tag")]
    BadTag,
}

/// Bytes produced by a block of `chars` characters, if that length is legal.
fn decoded_block_size(chars: usize) -> Option<usize> {
    ENCODED_BLOCK_SIZES.iter().position(|&n| n == chars)
}

fn digit_value(ch: u8) -> Option<u64> {
    ALPHABET.iter().position(|&a| a == ch).map(|d| d as u64)
}

fn encode_block(block: &[u8], out: &mut Vec<u8>) {
    let width = ENCODED_BLOCK_SIZES[block.len()];
    let mut num = block.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64);

    let start = out.len();
    out.resize(start + width, ALPHABET[0]);
    for slot in out[start..].iter_mut().rev() {
        if num == 0 {
            break;
        }
        *slot = ALPHABET[(num % 58) as usize];
        num /= 58;
    }
}

fn decode_block(
    chars: &[u8],
    char_offset: usize,
    block_index: usize,
    out: &mut Vec<u8>,
) -> Result<(), Base58Error> {
    let size = decoded_block_size(chars.len())
        .ok_or(Base58Error::InvalidLength(chars.len()))?;

    let mut num: u128 = 0;
    for (i, &ch) in chars.iter().enumerate() {
        let digit = digit_value(ch)
            .ok_or(Base58Error::InvalidCharacter(ch as char, char_offset + i))?;
        num = num * 58 + digit as u128;
    }
    if num >> (8 * size) != 0 {
        return Err(Base58Error::Overflow(block_index));
    }

    let bytes = (num as u64).to_be_bytes();
    out.extend_from_slice(&bytes[FULL_BLOCK_SIZE - size..]);
    Ok(())
}

/// Encode binary data to CryptoNote Base58.
pub fn encode(data: &[u8]) -> String {
    let mut out = Vec::with_capacity(
        data.len() / FULL_BLOCK_SIZE * FULL_ENCODED_BLOCK_SIZE + FULL_ENCODED_BLOCK_SIZE,
    );
    for block in data.chunks(FULL_BLOCK_SIZE) {
        encode_block(block, &mut out);
    }
    // Only ALPHABET bytes were written.
    out.into_iter().map(char::from).collect()
}

/// Decode a CryptoNote Base58 string.
pub fn decode(encoded: &str) -> Result<Vec<u8>, Base58Error> {
    let bytes = encoded.as_bytes();
    if decoded_block_size(bytes.len() % FULL_ENCODED_BLOCK_SIZE).is_none() {
        return Err(Base58Error::InvalidLength(bytes.len()));
    }

    let mut out = Vec::with_capacity(bytes.len() / FULL_ENCODED_BLOCK_SIZE * FULL_BLOCK_SIZE + FULL_BLOCK_SIZE);
    for (index, chunk) in bytes.chunks(FULL_ENCODED_BLOCK_SIZE).enumerate() {
        decode_block(chunk, index * FULL_ENCODED_BLOCK_SIZE, index, &mut out)?;
    }
    Ok(out)
}

fn checksum(payload: &[u8]) -> [u8; CHECKSUM_SIZE] {
    let mut keccak = Keccak::v256();
    let mut hash = [0u8; 32];
    keccak.update(payload);
    keccak.finalize(&mut hash);
    let mut out = [0u8; CHECKSUM_SIZE];
    out.copy_from_slice(&hash[..CHECKSUM_SIZE]);
    out
}

/// Encode `tag || data || checksum` as an address string.
pub fn encode_address(tag: u64, data: &[u8]) -> String {
    let mut payload = Vec::with_capacity(data.len() + 10 + CHECKSUM_SIZE);
    write_varint(&mut payload, tag);
    payload.extend_from_slice(data);
    let sum = checksum(&payload);
    payload.extend_from_slice(&sum);
    encode(&payload)
}

/// Decode an address string into `(tag, data)`, verifying the checksum.
pub fn decode_address(address: &str) -> Result<(u64, Vec<u8>), Base58Error> {
    let decoded = decode(address)?;
    if decoded.len() <= CHECKSUM_SIZE {
        return Err(Base58Error::AddressTooShort(decoded.len()));
    }

    let (payload, sum) = decoded.split_at(decoded.len() - CHECKSUM_SIZE);
    if checksum(payload) != sum {
        return Err(Base58Error::ChecksumMismatch);
    }

    let (tag, used) = read_varint(payload).ok_or(Base58Error::BadTag)?;
    Ok((tag, payload[used..].to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_widths() {
        assert_eq!(encode(&[0u8; 8]), "11111111111");
        assert_eq!(encode(&[0u8; 1]).len(), 2);
        assert_eq!(encode(&[0xffu8; 8]), "jpXCZedGfVQ");
        assert_eq!(encode(&[0u8; 69]).len(), 8 * 11 + 7);
    }

    #[test]
    fn test_decode_inverts_encode() {
        let data: Vec<u8> = (0..=68u8).map(|b| b.wrapping_mul(37)).collect();
        assert_eq!(decode(&encode(&data)).unwrap(), data);
        assert_eq!(decode("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_rejects_bad_length_and_chars() {
        // 1, 4 and 8 leftover characters are never produced by encode
        assert_eq!(decode("1"), Err(Base58Error::InvalidLength(1)));
        assert_eq!(decode("1111"), Err(Base58Error::InvalidLength(4)));
        assert_eq!(decode("11111111O11"), Err(Base58Error::InvalidCharacter('O', 8)));
    }

    #[test]
    fn test_partial_block_overflow() {
        // "zz" is 57*58+57 = 3363, too wide for one byte
        assert_eq!(decode("zz"), Err(Base58Error::Overflow(0)));
    }

    #[test]
    fn test_address_checksum() {
        let data = [0x5au8; 64];
        let address = encode_address(18, &data);
        assert_eq!(address.len(), 95);
        assert!(address.starts_with('4'));

        let (tag, back) = decode_address(&address).unwrap();
        assert_eq!(tag, 18);
        assert_eq!(back, data);

        let mut corrupted = address.into_bytes();
        let last = corrupted.len() - 1;
        corrupted[last] = if corrupted[last] == b'1' { b'2' } else { b'1' };
        let corrupted = String::from_utf8(corrupted).unwrap();
        assert!(decode_address(&corrupted).is_err());
    }
}
