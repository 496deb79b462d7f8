//! Per-transaction pipeline: offsets, locate, verify ownership, age profile.

use crate::locator::{block_at, locate_output_index, locate_owning_tx, lookup_output, LocateError};
use crate::ownership::{owned_amount, Account};
use crate::report::{
    AccountReport, InputReport, MemberReport, Ownership, PaymentIdReport, Report, SignatureReport,
};
use crate::temporal::{time_delta, time_scale, DEFAULT_SCALE_WIDTH};
use ringscope_ledger::{LedgerError, LedgerStore};
use ringscope_tx::payment_id::{self, decrypt_payment_id, PaymentId};
use ringscope_tx::{
    rct_type_name, relative_to_absolute, OffsetError, RctPrunable, Signatures, Transaction,
    TxInput,
};
use ringscope_types::{network_config, Hash, Network};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InspectError {
    #[error("transaction {} not found in the ledger", hex::encode(.0))]
    TxNotFound(Hash),

    #[error("ledger has no blocks")]
    EmptyLedger,

    #[error("input {input}: {source}")]
    Offsets {
        input: usize,
        #[source]
        source: OffsetError,
    },

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Locate(#[from] LocateError),
}

/// Per-run settings.
#[derive(Debug, Clone)]
pub struct InspectOptions {
    pub network: Network,
    /// Shown in the report header.
    pub ledger_path: String,
    /// Enables ownership checks when present.
    pub account: Option<Account>,
    pub scale_width: usize,
    /// Right end of the time scale; the current time when `None`.
    pub scale_reference: Option<u64>,
}

impl InspectOptions {
    pub fn new(network: Network, ledger_path: impl Into<String>) -> Self {
        Self {
            network,
            ledger_path: ledger_path.into(),
            account: None,
            scale_width: DEFAULT_SCALE_WIDTH,
            scale_reference: None,
        }
    }

    pub fn with_account(mut self, account: Account) -> Self {
        self.account = Some(account);
        self
    }

    pub fn with_scale_width(mut self, width: usize) -> Self {
        self.scale_width = width;
        self
    }

    pub fn with_scale_reference(mut self, ts: u64) -> Self {
        self.scale_reference = Some(ts);
        self
    }
}

/// Everything the member loop reads but never changes.
struct Context<'a> {
    account: Option<&'a Account>,
    /// Timestamp of the top block; ages are measured from it.
    top_timestamp: u64,
}

/// Build the report for the transaction `tx_hash`.
pub fn inspect<S: LedgerStore + ?Sized>(
    store: &S,
    tx_hash: &Hash,
    opts: &InspectOptions,
) -> Result<Report, InspectError> {
    let chain_height = store.chain_height()?;
    if chain_height == 0 {
        return Err(InspectError::EmptyLedger);
    }
    let top_height = chain_height - 1;
    let top_timestamp = store.block_by_height(top_height)?.map(|b| b.timestamp);
    log::debug!("top block {top_height}, timestamp {top_timestamp:?}");

    let tx = store
        .tx_by_hash(tx_hash)?
        .ok_or(InspectError::TxNotFound(*tx_hash))?;
    let block_height = store.tx_block_height(tx_hash)?;

    let genesis_timestamp = match store.genesis_timestamp()? {
        Some(ts) => ts,
        None => network_config(opts.network).genesis_timestamp.unwrap_or(0),
    };
    let reference_timestamp = opts
        .scale_reference
        .unwrap_or_else(|| chrono::Utc::now().timestamp().max(0) as u64);

    let account = opts.account.as_ref().map(|a| AccountReport {
        view_key: hex::encode(a.view_secret_key),
        address: a.address.as_ref().map(|addr| addr.to_address_string()),
        address_type: a.address.as_ref().map(|addr| addr.address_type),
        view_key_matches_address: a.view_key_matches_address(),
    });
    if let Some(AccountReport { view_key_matches_address: Some(false), .. }) = &account {
        log::warn!("private view key does not match the address view key");
    }

    let ctx = Context {
        account: opts.account.as_ref(),
        top_timestamp: top_timestamp.unwrap_or(reference_timestamp),
    };

    let mut inputs = Vec::with_capacity(tx.prefix.inputs.len());
    for (index, input) in tx.prefix.inputs.iter().enumerate() {
        match input {
            TxInput::Gen { height } => inputs.push(InputReport::Coinbase { height: *height }),
            TxInput::Key { amount, key_offsets, key_image } => {
                let absolute = relative_to_absolute(key_offsets)
                    .map_err(|source| InspectError::Offsets { input: index, source })?;

                let mut members = Vec::with_capacity(absolute.len());
                for (i, offset) in absolute.into_iter().enumerate() {
                    members.push(resolve_member(store, &ctx, *amount, i + 1, offset)?);
                }

                let timestamps: Vec<u64> = members.iter().filter_map(|m| m.timestamp).collect();
                inputs.push(InputReport::Key {
                    index,
                    key_image: hex::encode(key_image),
                    amount: *amount,
                    time_scale: time_scale(
                        &timestamps,
                        genesis_timestamp,
                        reference_timestamp,
                        opts.scale_width,
                    ),
                    members,
                    signatures: input_signatures(&tx, index),
                });
            }
        }
    }

    Ok(Report {
        ledger_path: opts.ledger_path.clone(),
        network: opts.network,
        top_block_height: top_height,
        top_block_timestamp: top_timestamp,
        tx_hash: hex::encode(tx_hash),
        block_height,
        payment_id: payment_id_report(&tx, opts.account.as_ref()),
        account,
        genesis_timestamp,
        reference_timestamp,
        inputs,
    })
}

/// Resolve one ring member. Soft failures end up in `diagnostic`; only
/// errors that leave the store unusable propagate.
fn resolve_member<S: LedgerStore + ?Sized>(
    store: &S,
    ctx: &Context<'_>,
    amount: u64,
    mixin_no: usize,
    offset: u64,
) -> Result<MemberReport, LocateError> {
    let mut member = MemberReport {
        mixin_no,
        absolute_offset: offset,
        ..Default::default()
    };
    match fill_member(store, ctx, amount, &mut member) {
        Ok(()) => Ok(member),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            log::warn!("ring member {mixin_no} (offset {offset}): {e}");
            member.diagnostic = Some(e.to_string());
            Ok(member)
        }
    }
}

fn fill_member<S: LedgerStore + ?Sized>(
    store: &S,
    ctx: &Context<'_>,
    amount: u64,
    member: &mut MemberReport,
) -> Result<(), LocateError> {
    let output = lookup_output(store, amount, member.absolute_offset)?;
    member.block_height = Some(output.height);
    member.output_key = Some(hex::encode(output.public_key));

    let (tx_hash, tx) = locate_owning_tx(store, &output.public_key, output.height)?;
    member.tx_hash = Some(hex::encode(tx_hash));

    let position = locate_output_index(&tx_hash, &tx, &output.public_key)?;
    member.out_index = Some(position);
    member.amount = tx.prefix.outputs.get(position).map(|o| o.amount());
    member.tx_public_key = tx.tx_public_key().map(hex::encode);

    let block = block_at(store, output.height)?;
    member.timestamp = Some(block.timestamp);
    member.time_delta = Some(time_delta(ctx.top_timestamp, block.timestamp));

    match store.tx_output_indices(&tx_hash)? {
        Some(indices) => member.global_index = indices.get(position).copied(),
        None => {
            log::warn!("cannot find global indices for tx {}", hex::encode(tx_hash));
            member.diagnostic = Some(format!(
                "cannot find global indices for tx {}",
                hex::encode(tx_hash)
            ));
        }
    }

    if let Some(account) = ctx.account {
        member.ours = Some(match account.is_owned(position, &tx) {
            Ok(owned) => Ownership::Evaluated { owned },
            Err(e) => {
                log::debug!("ownership of member {} not evaluated: {e}", member.mixin_no);
                Ownership::NotEvaluated { reason: e.to_string() }
            }
        });
        if member.ours.as_ref().is_some_and(Ownership::is_owned) {
            member.owned_amount = owned_amount(position, &tx, account);
        }
    }
    Ok(())
}

fn payment_id_report(tx: &Transaction, account: Option<&Account>) -> PaymentIdReport {
    match payment_id::decode(tx) {
        PaymentId::None => PaymentIdReport::NotPresent,
        PaymentId::Plain(id) => PaymentIdReport::Plain { id: hex::encode(id) },
        PaymentId::Encrypted(id) => {
            let decrypted = account
                .zip(tx.tx_public_key())
                .and_then(|(a, r)| decrypt_payment_id(&id, &r, &a.view_secret_key))
                .map(hex::encode);
            PaymentIdReport::Encrypted { id: hex::encode(id), decrypted }
        }
        PaymentId::Ambiguous { plain, encrypted } => {
            log::warn!("transaction carries both a plain and an encrypted payment id");
            PaymentIdReport::Ambiguous {
                plain: hex::encode(plain),
                encrypted: hex::encode(encrypted),
            }
        }
    }
}

fn input_signatures(tx: &Transaction, index: usize) -> Vec<SignatureReport> {
    match &tx.signatures {
        Signatures::Ring(rings) => rings
            .get(index)
            .map(|ring| {
                ring.iter()
                    .map(|e| SignatureReport::Ring {
                        c: hex::encode(e.c),
                        r: hex::encode(e.r),
                    })
                    .collect()
            })
            .unwrap_or_default(),
        Signatures::RingCt(rct) => match &rct.prunable {
            RctPrunable::Clsag { clsags, .. } => clsags
                .get(index)
                .map(|c| {
                    vec![SignatureReport::Clsag {
                        s: c.s.iter().map(hex::encode).collect(),
                        c1: hex::encode(c.c1),
                        d: hex::encode(c.d),
                    }]
                })
                .unwrap_or_default(),
            RctPrunable::None | RctPrunable::Raw(_) => vec![SignatureReport::NotDecoded {
                rct_type: rct.rct_type,
                type_name: rct_type_name(rct.rct_type).to_string(),
            }],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringscope_ledger::{NewBlock, SqliteLedger};
    use ringscope_tx::extra::{write_extra, ExtraField};
    use ringscope_tx::payment_id::encrypted_nonce;
    use ringscope_tx::{RctSignatures, RingSignatureElement, TxOutput, TxPrefix};

    fn coinbase(height: u64, keys: &[[u8; 32]], extra: Vec<u8>) -> Transaction {
        Transaction {
            prefix: TxPrefix {
                version: 2,
                unlock_time: height + 60,
                inputs: vec![TxInput::Gen { height }],
                outputs: keys.iter().map(|k| TxOutput::Key { amount: 5, key: *k }).collect(),
                extra,
            },
            signatures: Signatures::RingCt(RctSignatures {
                rct_type: 0,
                txn_fee: 0,
                base_pseudo_outs: vec![],
                ecdh_info: vec![],
                out_pk: vec![],
                prunable: RctPrunable::None,
            }),
        }
    }

    /// v1 spend of `amount`-0 outputs `offsets` (relative).
    fn spend(offsets: Vec<u64>, extra: Vec<u8>) -> Transaction {
        let ring = offsets
            .iter()
            .map(|_| RingSignatureElement { c: [0xc0; 32], r: [0x70; 32] })
            .collect();
        Transaction {
            prefix: TxPrefix {
                version: 1,
                unlock_time: 0,
                inputs: vec![TxInput::Key { amount: 0, key_offsets: offsets, key_image: [0x11; 32] }],
                outputs: vec![TxOutput::Key { amount: 0, key: [0x99; 32] }],
                extra,
            },
            signatures: Signatures::Ring(vec![ring]),
        }
    }

    fn ledger(spend_tx: Transaction) -> SqliteLedger {
        let mut db = SqliteLedger::open_in_memory().unwrap();
        for h in 0..4u8 {
            db.put_block(&NewBlock {
                hash: [h + 0xa0; 32],
                timestamp: 1_000 + h as u64 * 100,
                miner_tx: coinbase(h as u64, &[[h + 1; 32]], vec![]),
                txs: if h == 3 { vec![spend_tx.clone()] } else { vec![] },
            })
            .unwrap();
        }
        db
    }

    fn opts() -> InspectOptions {
        InspectOptions::new(Network::Mainnet, ":memory:")
            .with_scale_width(10)
            .with_scale_reference(1_300)
    }

    #[test]
    fn test_resolves_ring() {
        let tx = spend(vec![0, 2], vec![]);
        let db = ledger(tx.clone());
        let report = inspect(&db, &tx.hash(), &opts()).unwrap();

        assert_eq!(report.top_block_height, 3);
        assert_eq!(report.block_height, Some(3));
        assert_eq!(report.genesis_timestamp, 1_000);
        assert_eq!(report.payment_id, PaymentIdReport::NotPresent);

        let InputReport::Key { members, time_scale, signatures, .. } = &report.inputs[0] else {
            panic!("expected key input");
        };
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].block_height, Some(0));
        assert_eq!(members[1].absolute_offset, 2);
        assert_eq!(members[1].block_height, Some(2));
        assert_eq!(members[1].global_index, Some(2));
        assert_eq!(members[1].time_delta.unwrap().minutes, 1);
        assert!(members.iter().all(|m| m.ours.is_none() && m.diagnostic.is_none()));
        assert_eq!(time_scale, "*_____*___");
        assert_eq!(signatures.len(), 2);
    }

    #[test]
    fn test_missing_output_is_soft() {
        let tx = spend(vec![1, 40], vec![]);
        let db = ledger(tx.clone());
        let report = inspect(&db, &tx.hash(), &opts()).unwrap();

        let InputReport::Key { members, .. } = &report.inputs[0] else {
            panic!("expected key input");
        };
        assert!(members[0].is_resolved());
        assert!(!members[1].is_resolved());
        assert_eq!(members[1].absolute_offset, 41);
        assert!(members[1].diagnostic.as_deref().unwrap().contains("cannot find output 41"));
    }

    #[test]
    fn test_unknown_tx() {
        let tx = spend(vec![0], vec![]);
        let db = ledger(tx);
        let err = inspect(&db, &[0x42; 32], &opts()).unwrap_err();
        assert!(matches!(err, InspectError::TxNotFound(h) if h == [0x42; 32]));
    }

    #[test]
    fn test_empty_ledger() {
        let db = SqliteLedger::open_in_memory().unwrap();
        assert!(matches!(
            inspect(&db, &[0; 32], &opts()),
            Err(InspectError::EmptyLedger)
        ));
    }

    #[test]
    fn test_offset_overflow_is_fatal() {
        let tx = spend(vec![u64::MAX, 1], vec![]);
        let db = ledger(tx.clone());
        assert!(matches!(
            inspect(&db, &tx.hash(), &opts()),
            Err(InspectError::Offsets { input: 0, .. })
        ));
    }

    #[test]
    fn test_encrypted_payment_id() {
        let extra = write_extra(&[ExtraField::Nonce(encrypted_nonce(&[7; 8]))]);
        let tx = spend(vec![0], extra);
        let db = ledger(tx.clone());
        let report = inspect(&db, &tx.hash(), &opts()).unwrap();
        assert_eq!(
            report.payment_id,
            PaymentIdReport::Encrypted { id: "07".repeat(8), decrypted: None }
        );
    }
}
