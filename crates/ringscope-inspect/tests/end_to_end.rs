//! Full runs against a synthetic ledger file: RingCT transfers paying a
//! known account, spent in a ring with decoys.

use ringscope_crypto::{
    derive_public_key, derive_view_tag, ecdh_decode_amount, generate_key_derivation, keccak256,
    sc_reduce32, secret_to_public,
};
use ringscope_inspect::{inspect, Account, InputReport, InspectOptions, Ownership, PaymentIdReport};
use ringscope_ledger::{LedgerConfig, NewBlock, SqliteLedger};
use ringscope_tx::extra::{write_extra, ExtraField};
use ringscope_tx::{
    Clsag, EcdhInfo, RangeProofs, RctPrunable, RctSignatures, Signatures, Transaction, TxInput,
    TxOutput, TxPrefix,
};
use ringscope_types::{AddressType, Network, ParsedAddress, PublicKey, SecretKey};

const GENESIS: u64 = 1_397_818_193;
const PAID: u64 = 2_500_000_000_000;

fn keypair(seed: &str) -> (SecretKey, PublicKey) {
    let sec = sc_reduce32(&keccak256(seed.as_bytes()));
    (sec, secret_to_public(&sec))
}

struct Wallet {
    view_sec: SecretKey,
    view_pub: PublicKey,
    spend_pub: PublicKey,
}

fn wallet() -> Wallet {
    let (view_sec, view_pub) = keypair("wallet view");
    let (_, spend_pub) = keypair("wallet spend");
    Wallet { view_sec, view_pub, spend_pub }
}

fn coinbase(height: u64) -> Transaction {
    let (_, tx_pub) = keypair(&format!("coinbase {height}"));
    Transaction {
        prefix: TxPrefix {
            version: 2,
            unlock_time: height + 60,
            inputs: vec![TxInput::Gen { height }],
            outputs: vec![TxOutput::TaggedKey {
                amount: 1_000,
                key: keypair(&format!("miner out {height}")).1,
                view_tag: 0,
            }],
            extra: write_extra(&[ExtraField::TxPublicKey(tx_pub)]),
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

/// Two-output transfer; output 0 pays `to` when given, the other is a decoy.
fn transfer(seed: &str, to: Option<&Wallet>, offsets: Vec<u64>) -> Transaction {
    let (r, tx_pub) = keypair(seed);
    let mut ecdh_info = vec![EcdhInfo::Compact { amount: [0; 8] }; 2];
    let outputs = (0..2u64)
        .map(|i| match to {
            Some(w) if i == 0 => {
                let d = generate_key_derivation(&w.view_pub, &r).unwrap();
                // amount masking is an XOR, so decoding the clear value encrypts it
                let masked = ecdh_decode_amount(&PAID.to_le_bytes(), &d, i);
                ecdh_info[0] = EcdhInfo::Compact { amount: masked.to_le_bytes() };
                TxOutput::TaggedKey {
                    amount: 0,
                    key: derive_public_key(&d, i, &w.spend_pub).unwrap(),
                    view_tag: derive_view_tag(&d, i),
                }
            }
            _ => TxOutput::TaggedKey {
                amount: 0,
                key: keypair(&format!("{seed} out {i}")).1,
                view_tag: i as u8,
            },
        })
        .collect();
    let ring = offsets.len();
    Transaction {
        prefix: TxPrefix {
            version: 2,
            unlock_time: 0,
            inputs: vec![TxInput::Key {
                amount: 0,
                key_offsets: offsets,
                key_image: keccak256(seed.as_bytes()),
            }],
            outputs,
            extra: write_extra(&[ExtraField::TxPublicKey(tx_pub)]),
        },
        signatures: Signatures::RingCt(RctSignatures {
            rct_type: 6,
            txn_fee: 30_000,
            base_pseudo_outs: vec![],
            ecdh_info,
            out_pk: vec![[0x58; 32]; 2],
            prunable: RctPrunable::Clsag {
                range_proofs: RangeProofs::BulletproofsPlus(vec![]),
                clsags: vec![Clsag { s: vec![[0x5a; 32]; ring], c1: [0xc1; 32], d: [0xdd; 32] }],
                pseudo_outs: vec![[0x50; 32]],
            },
        }),
    }
}

/// Blocks 0..=5, one coinbase each. Block 2 carries a transfer paying the
/// wallet at global index 3; block 5 carries the spend ringing
/// indices 0, 3 and 4.
fn build_ledger(path: &std::path::Path, w: &Wallet) -> Transaction {
    let paying = transfer("paying", Some(w), vec![0]);
    let spend = transfer("spend", None, vec![0, 3, 1]);

    let mut db = SqliteLedger::open(&LedgerConfig::writable(path)).unwrap();
    for h in 0..6u64 {
        let txs = match h {
            2 => vec![paying.clone()],
            5 => vec![spend.clone()],
            _ => vec![],
        };
        db.put_block(&NewBlock {
            hash: keccak256(&h.to_le_bytes()),
            timestamp: GENESIS + h * 3_600,
            miner_tx: coinbase(h),
            txs,
        })
        .unwrap();
    }
    spend
}

fn options() -> InspectOptions {
    InspectOptions::new(Network::Mainnet, "ledger.db").with_scale_reference(GENESIS + 5 * 3_600)
}

#[test]
fn report_without_keys() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.db");
    let spend = build_ledger(&path, &wallet());

    let db = SqliteLedger::open(&LedgerConfig::read_only(&path)).unwrap();
    let report = inspect(&db, &spend.hash(), &options()).unwrap();

    assert_eq!(report.block_height, Some(5));
    assert_eq!(report.payment_id, PaymentIdReport::NotPresent);
    assert_eq!(report.genesis_timestamp, GENESIS);

    let InputReport::Key { members, signatures, .. } = &report.inputs[0] else {
        panic!("expected key input");
    };
    let heights: Vec<_> = members.iter().map(|m| m.block_height).collect();
    assert_eq!(heights, vec![Some(0), Some(2), Some(2)]);
    assert!(members.iter().all(|m| m.is_resolved() && m.ours.is_none()));
    assert_eq!(members[1].out_index, Some(0));
    assert_eq!(members[2].out_index, Some(1));
    assert_eq!(members[1].global_index, Some(3));
    assert_eq!(signatures.len(), 1);

    let text = report.render_text();
    assert!(text.contains("Payment id: not present"));
    assert!(!text.contains("ours"));

    let json = report.to_json().unwrap();
    assert!(!json.contains("\"ours\""));
}

#[test]
fn report_with_matching_keys() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.db");
    let w = wallet();
    let spend = build_ledger(&path, &w);

    let address = ParsedAddress {
        network: Network::Mainnet,
        address_type: AddressType::Standard,
        spend_public_key: w.spend_pub,
        view_public_key: w.view_pub,
        payment_id: None,
    };
    let opts = options().with_account(Account::from_address(w.view_sec, address));

    let db = SqliteLedger::open(&LedgerConfig::read_only(&path)).unwrap();
    let report = inspect(&db, &spend.hash(), &opts).unwrap();

    let InputReport::Key { members, .. } = &report.inputs[0] else {
        panic!("expected key input");
    };
    let verdicts: Vec<_> = members.iter().map(|m| m.ours.clone()).collect();
    assert_eq!(
        verdicts,
        vec![
            Some(Ownership::Evaluated { owned: false }),
            Some(Ownership::Evaluated { owned: true }),
            Some(Ownership::Evaluated { owned: false }),
        ]
    );
    assert_eq!(report.owned_members().count(), 1);
    assert_eq!(members[1].owned_amount, Some(PAID));
    assert_eq!(
        report.account.as_ref().and_then(|a| a.view_key_matches_address),
        Some(true)
    );

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["network"], "mainnet");
    assert_eq!(json["account"]["address_type"], "standard");
    assert_eq!(
        json["inputs"][0]["members"][1]["ours"],
        serde_json::json!({"status": "evaluated", "owned": true})
    );

    let text = report.render_text();
    assert_eq!(text.matches(", ours: true").count(), 1);
    assert_eq!(text.matches(", ours: false").count(), 2);
}
