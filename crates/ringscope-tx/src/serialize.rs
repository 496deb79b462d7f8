//! Binary transaction serializer and transaction ids.
//!
//! Inverse of `parse`. The v2 transaction id is
//! `H(H(prefix) || H(rct base) || H(rct prunable))`, with the last hash
//! zeroed for `rct_type::NULL`; v1 ids hash the whole blob.

use ringscope_crypto::keccak256;
use ringscope_types::varint::write_varint;
use ringscope_types::Hash;

use crate::types::*;

pub fn serialize_prefix(prefix: &TxPrefix) -> Vec<u8> {
    let mut buf = Vec::with_capacity(256);
    write_varint(&mut buf, prefix.version);
    write_varint(&mut buf, prefix.unlock_time);

    write_varint(&mut buf, prefix.inputs.len() as u64);
    for input in &prefix.inputs {
        match input {
            TxInput::Gen { height } => {
                buf.push(input_type::GEN);
                write_varint(&mut buf, *height);
            }
            TxInput::Key {
                amount,
                key_offsets,
                key_image,
            } => {
                buf.push(input_type::KEY);
                write_varint(&mut buf, *amount);
                write_varint(&mut buf, key_offsets.len() as u64);
                for offset in key_offsets {
                    write_varint(&mut buf, *offset);
                }
                buf.extend_from_slice(key_image);
            }
        }
    }

    write_varint(&mut buf, prefix.outputs.len() as u64);
    for output in &prefix.outputs {
        write_varint(&mut buf, output.amount());
        buf.push(output.output_type_tag());
        buf.extend_from_slice(output.key());
        if let Some(tag) = output.view_tag() {
            buf.push(tag);
        }
    }

    write_varint(&mut buf, prefix.extra.len() as u64);
    buf.extend_from_slice(&prefix.extra);
    buf
}

pub fn serialize_rct_base(rct: &RctSignatures) -> Vec<u8> {
    let mut buf = vec![rct.rct_type];
    if rct.rct_type == rct_type::NULL {
        return buf;
    }
    write_varint(&mut buf, rct.txn_fee);
    if rct.rct_type == rct_type::SIMPLE {
        for p in &rct.base_pseudo_outs {
            buf.extend_from_slice(p);
        }
    }
    for info in &rct.ecdh_info {
        match info {
            EcdhInfo::Compact { amount } => buf.extend_from_slice(amount),
            EcdhInfo::Full { mask, amount } => {
                buf.extend_from_slice(mask);
                buf.extend_from_slice(amount);
            }
        }
    }
    for pk in &rct.out_pk {
        buf.extend_from_slice(pk);
    }
    buf
}

fn write_key_vector(buf: &mut Vec<u8>, keys: &[[u8; 32]]) {
    write_varint(buf, keys.len() as u64);
    for k in keys {
        buf.extend_from_slice(k);
    }
}

pub fn serialize_rct_prunable(prunable: &RctPrunable) -> Vec<u8> {
    let mut buf = Vec::new();
    match prunable {
        RctPrunable::None => {}
        RctPrunable::Raw(bytes) => buf.extend_from_slice(bytes),
        RctPrunable::Clsag {
            range_proofs,
            clsags,
            pseudo_outs,
        } => {
            write_varint(&mut buf, range_proofs.len() as u64);
            match range_proofs {
                RangeProofs::Bulletproofs(proofs) => {
                    for bp in proofs {
                        for k in [&bp.a, &bp.s, &bp.t1, &bp.t2, &bp.taux, &bp.mu] {
                            buf.extend_from_slice(k);
                        }
                        write_key_vector(&mut buf, &bp.l_vec);
                        write_key_vector(&mut buf, &bp.r_vec);
                        for k in [&bp.a_final, &bp.b_final, &bp.t] {
                            buf.extend_from_slice(k);
                        }
                    }
                }
                RangeProofs::BulletproofsPlus(proofs) => {
                    for bp in proofs {
                        for k in [&bp.a, &bp.a1, &bp.b, &bp.r1, &bp.s1, &bp.d1] {
                            buf.extend_from_slice(k);
                        }
                        write_key_vector(&mut buf, &bp.l_vec);
                        write_key_vector(&mut buf, &bp.r_vec);
                    }
                }
            }
            for clsag in clsags {
                for s in &clsag.s {
                    buf.extend_from_slice(s);
                }
                buf.extend_from_slice(&clsag.c1);
                buf.extend_from_slice(&clsag.d);
            }
            for p in pseudo_outs {
                buf.extend_from_slice(p);
            }
        }
    }
    buf
}

fn serialize_ring_signatures(buf: &mut Vec<u8>, rings: &[Vec<RingSignatureElement>]) {
    for ring in rings {
        for element in ring {
            buf.extend_from_slice(&element.c);
            buf.extend_from_slice(&element.r);
        }
    }
}

pub fn serialize_transaction(tx: &Transaction) -> Vec<u8> {
    let mut buf = serialize_prefix(&tx.prefix);
    match &tx.signatures {
        Signatures::Ring(rings) => serialize_ring_signatures(&mut buf, rings),
        Signatures::RingCt(rct) => {
            buf.extend_from_slice(&serialize_rct_base(rct));
            buf.extend_from_slice(&serialize_rct_prunable(&rct.prunable));
        }
    }
    buf
}

pub fn prefix_hash(prefix: &TxPrefix) -> Hash {
    keccak256(&serialize_prefix(prefix))
}

pub fn transaction_hash(tx: &Transaction) -> Hash {
    match &tx.signatures {
        Signatures::Ring(_) => keccak256(&serialize_transaction(tx)),
        Signatures::RingCt(rct) => {
            let mut hashes = [0u8; 96];
            hashes[..32].copy_from_slice(&prefix_hash(&tx.prefix));
            hashes[32..64].copy_from_slice(&keccak256(&serialize_rct_base(rct)));
            if rct.rct_type != rct_type::NULL {
                hashes[64..].copy_from_slice(&keccak256(&serialize_rct_prunable(&rct.prunable)));
            }
            keccak256(&hashes)
        }
    }
}
