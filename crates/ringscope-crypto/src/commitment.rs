//! Pedersen commitments: C = mask·G + amount·H

use curve25519_dalek::constants::ED25519_BASEPOINT_POINT;
use curve25519_dalek::edwards::EdwardsPoint;
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::VartimeMultiscalarMul;

use crate::decompress;

/// H generator for Pedersen commitments: H = H_p(G), from rctTypes.h
const H_POINT_BYTES: [u8; 32] = [
    0x8b, 0x65, 0x59, 0x70, 0x15, 0x37, 0x99, 0xaf,
    0x2a, 0xea, 0xdc, 0x9f, 0xf1, 0xad, 0xd0, 0xea,
    0x6c, 0x72, 0x51, 0xd5, 0x41, 0x54, 0xcf, 0xa9,
    0x2c, 0x17, 0x3a, 0x0d, 0xd3, 0x9c, 0x1f, 0x94,
];

pub fn pedersen_commit(amount: u64, mask: &[u8; 32]) -> Option<[u8; 32]> {
    let h = decompress(&H_POINT_BYTES)?;
    let mask_scalar = Scalar::from_bytes_mod_order(*mask);
    Some(
        EdwardsPoint::vartime_multiscalar_mul(
            &[mask_scalar, Scalar::from(amount)],
            &[ED25519_BASEPOINT_POINT, h],
        )
        .compress()
        .to_bytes(),
    )
}

/// Commitment with mask 1, used for coinbase outputs of RingCT transactions.
pub fn zero_commit(amount: u64) -> Option<[u8; 32]> {
    let mut one = [0u8; 32];
    one[0] = 1;
    pedersen_commit(amount, &one)
}
