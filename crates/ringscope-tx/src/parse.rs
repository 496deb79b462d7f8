//! Binary transaction parser.
//!
//! Layout (all integers are varints unless noted):
//!
//! ```text
//! prefix:  version, unlock_time, vin[], vout[], extra (len + bytes)
//! v1:      per input, ring_size x (c, r)
//! v2 base: type (u8), fee, [pseudoOuts if Simple], ecdhInfo[], outPk[]
//! v2 prunable (CLSAG types): range proofs, CLSAG per input, pseudoOuts
//! ```

use ringscope_types::varint::read_varint;

use crate::types::*;
use crate::TxError;

// ─── Cursor ──────────────────────────────────────────────────────────────────

pub(crate) struct Cursor<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    pub(crate) fn offset(&self) -> usize {
        self.offset
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    fn read_bytes(&mut self, count: usize) -> Result<&'a [u8], TxError> {
        if count > self.remaining() {
            return Err(TxError::UnexpectedEof {
                offset: self.offset,
                need: count,
                have: self.remaining(),
            });
        }
        let slice = &self.data[self.offset..self.offset + count];
        self.offset += count;
        Ok(slice)
    }

    fn read_byte(&mut self) -> Result<u8, TxError> {
        Ok(self.read_bytes(1)?[0])
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], TxError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    fn read_key(&mut self) -> Result<[u8; 32], TxError> {
        self.read_array::<32>()
    }

    pub(crate) fn read_varint(&mut self) -> Result<u64, TxError> {
        let (value, used) =
            read_varint(&self.data[self.offset..]).ok_or(TxError::BadVarint(self.offset))?;
        self.offset += used;
        Ok(value)
    }

    /// Read an element count, rejecting counts the remaining data cannot hold.
    fn read_count(&mut self, what: &'static str, min_elem_size: usize) -> Result<usize, TxError> {
        let offset = self.offset;
        let count = self.read_varint()?;
        self.check_count(what, count, min_elem_size, offset)
    }

    fn check_count(
        &self,
        what: &'static str,
        count: u64,
        min_elem_size: usize,
        offset: usize,
    ) -> Result<usize, TxError> {
        let fits = usize::try_from(count)
            .ok()
            .and_then(|c| c.checked_mul(min_elem_size.max(1)))
            .is_some_and(|need| need <= self.remaining());
        if !fits {
            return Err(TxError::CountTooLarge { what, count, offset });
        }
        Ok(count as usize)
    }

    fn read_keys(&mut self, count: usize) -> Result<Vec<[u8; 32]>, TxError> {
        (0..count).map(|_| self.read_key()).collect()
    }

    fn read_key_vector(&mut self, what: &'static str) -> Result<Vec<[u8; 32]>, TxError> {
        let count = self.read_count(what, 32)?;
        self.read_keys(count)
    }

    fn rest(&mut self) -> &'a [u8] {
        let slice = &self.data[self.offset..];
        self.offset = self.data.len();
        slice
    }
}

// ─── Transaction Parsing ─────────────────────────────────────────────────────

/// Parse a complete transaction blob.
pub fn parse_transaction(data: &[u8]) -> Result<Transaction, TxError> {
    let mut c = Cursor::new(data);
    let prefix = parse_prefix_inner(&mut c)?;

    let signatures = match prefix.version {
        1 => Signatures::Ring(parse_ring_signatures(&mut c, &prefix.inputs)?),
        _ => Signatures::RingCt(parse_rct_signatures(&mut c, &prefix)?),
    };

    if c.remaining() > 0 {
        return Err(TxError::TrailingBytes(c.remaining()));
    }
    Ok(Transaction { prefix, signatures })
}

/// Parse a transaction from hex-encoded bytes.
pub fn parse_transaction_hex(hex_str: &str) -> Result<Transaction, TxError> {
    let bytes = hex::decode(hex_str.trim())?;
    parse_transaction(&bytes)
}

/// Parse only the prefix, returning it with the number of bytes consumed.
pub fn parse_prefix(data: &[u8]) -> Result<(TxPrefix, usize), TxError> {
    let mut c = Cursor::new(data);
    let prefix = parse_prefix_inner(&mut c)?;
    Ok((prefix, c.offset()))
}

fn parse_prefix_inner(c: &mut Cursor) -> Result<TxPrefix, TxError> {
    let version = c.read_varint()?;
    if !(1..=2).contains(&version) {
        return Err(TxError::UnsupportedVersion(version));
    }
    let unlock_time = c.read_varint()?;

    // Inputs
    let vin_count = c.read_count("input", 2)?;
    let mut inputs = Vec::with_capacity(vin_count);
    for _ in 0..vin_count {
        let offset = c.offset();
        let tag = c.read_byte()?;
        let input = match tag {
            input_type::GEN => TxInput::Gen {
                height: c.read_varint()?,
            },
            input_type::KEY => {
                let amount = c.read_varint()?;
                let offset_count = c.read_count("key offset", 1)?;
                let key_offsets = (0..offset_count)
                    .map(|_| c.read_varint())
                    .collect::<Result<Vec<_>, _>>()?;
                let key_image = c.read_key()?;
                TxInput::Key {
                    amount,
                    key_offsets,
                    key_image,
                }
            }
            _ => return Err(TxError::UnsupportedInput { tag, offset }),
        };
        inputs.push(input);
    }

    // Outputs
    let vout_count = c.read_count("output", 34)?;
    let mut outputs = Vec::with_capacity(vout_count);
    for _ in 0..vout_count {
        let amount = c.read_varint()?;
        let offset = c.offset();
        let tag = c.read_byte()?;
        let output = match tag {
            output_type::KEY => TxOutput::Key {
                amount,
                key: c.read_key()?,
            },
            output_type::TAGGED_KEY => TxOutput::TaggedKey {
                amount,
                key: c.read_key()?,
                view_tag: c.read_byte()?,
            },
            _ => return Err(TxError::UnsupportedOutput { tag, offset }),
        };
        outputs.push(output);
    }

    // Extra
    let extra_len = c.read_count("extra byte", 1)?;
    let extra = c.read_bytes(extra_len)?.to_vec();

    Ok(TxPrefix {
        version,
        unlock_time,
        inputs,
        outputs,
        extra,
    })
}

fn parse_ring_signatures(
    c: &mut Cursor,
    inputs: &[TxInput],
) -> Result<Vec<Vec<RingSignatureElement>>, TxError> {
    let mut signatures = Vec::with_capacity(inputs.len());
    for input in inputs {
        let ring_size = input.ring_size();
        let offset = c.offset();
        c.check_count("ring signature", ring_size as u64, 64, offset)?;
        let mut ring = Vec::with_capacity(ring_size);
        for _ in 0..ring_size {
            ring.push(RingSignatureElement {
                c: c.read_key()?,
                r: c.read_key()?,
            });
        }
        signatures.push(ring);
    }
    Ok(signatures)
}

// ─── RingCT ──────────────────────────────────────────────────────────────────

fn parse_rct_signatures(c: &mut Cursor, prefix: &TxPrefix) -> Result<RctSignatures, TxError> {
    let input_count = prefix.inputs.len();
    let output_count = prefix.outputs.len();

    let rct = c.read_byte()?;
    if rct == rct_type::NULL {
        return Ok(RctSignatures {
            rct_type: rct,
            txn_fee: 0,
            base_pseudo_outs: Vec::new(),
            ecdh_info: Vec::new(),
            out_pk: Vec::new(),
            prunable: RctPrunable::None,
        });
    }
    if rct > rct_type::BULLETPROOF_PLUS {
        return Err(TxError::InvalidRctType(rct));
    }

    let txn_fee = c.read_varint()?;

    let base_pseudo_outs = if rct == rct_type::SIMPLE {
        c.read_keys(input_count)?
    } else {
        Vec::new()
    };

    let compact = rct >= rct_type::BULLETPROOF2;
    let mut ecdh_info = Vec::with_capacity(output_count);
    for _ in 0..output_count {
        ecdh_info.push(if compact {
            EcdhInfo::Compact {
                amount: c.read_array::<8>()?,
            }
        } else {
            EcdhInfo::Full {
                mask: c.read_key()?,
                amount: c.read_key()?,
            }
        });
    }

    let out_pk = c.read_keys(output_count)?;

    let prunable = match rct {
        rct_type::CLSAG | rct_type::BULLETPROOF_PLUS => parse_clsag_prunable(c, rct, &prefix.inputs)?,
        _ => RctPrunable::Raw(c.rest().to_vec()),
    };

    Ok(RctSignatures {
        rct_type: rct,
        txn_fee,
        base_pseudo_outs,
        ecdh_info,
        out_pk,
        prunable,
    })
}

fn parse_clsag_prunable(
    c: &mut Cursor,
    rct: u8,
    inputs: &[TxInput],
) -> Result<RctPrunable, TxError> {
    let range_proofs = if rct == rct_type::BULLETPROOF_PLUS {
        let nbp = c.read_count("bulletproof+", 6 * 32 + 2)?;
        let mut proofs = Vec::with_capacity(nbp);
        for _ in 0..nbp {
            proofs.push(BulletproofPlus {
                a: c.read_key()?,
                a1: c.read_key()?,
                b: c.read_key()?,
                r1: c.read_key()?,
                s1: c.read_key()?,
                d1: c.read_key()?,
                l_vec: c.read_key_vector("bulletproof+ L")?,
                r_vec: c.read_key_vector("bulletproof+ R")?,
            });
        }
        RangeProofs::BulletproofsPlus(proofs)
    } else {
        let nbp = c.read_count("bulletproof", 9 * 32 + 2)?;
        let mut proofs = Vec::with_capacity(nbp);
        for _ in 0..nbp {
            proofs.push(parse_bulletproof(c)?);
        }
        RangeProofs::Bulletproofs(proofs)
    };

    let mut clsags = Vec::with_capacity(inputs.len());
    for input in inputs {
        clsags.push(Clsag {
            s: c.read_keys(input.ring_size())?,
            c1: c.read_key()?,
            d: c.read_key()?,
        });
    }

    let pseudo_outs = c.read_keys(inputs.len())?;

    Ok(RctPrunable::Clsag {
        range_proofs,
        clsags,
        pseudo_outs,
    })
}

fn parse_bulletproof(c: &mut Cursor) -> Result<Bulletproof, TxError> {
    Ok(Bulletproof {
        a: c.read_key()?,
        s: c.read_key()?,
        t1: c.read_key()?,
        t2: c.read_key()?,
        taux: c.read_key()?,
        mu: c.read_key()?,
        l_vec: c.read_key_vector("bulletproof L")?,
        r_vec: c.read_key_vector("bulletproof R")?,
        a_final: c.read_key()?,
        b_final: c.read_key()?,
        t: c.read_key()?,
    })
}
