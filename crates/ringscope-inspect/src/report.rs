//! Report model and its text rendering.
//!
//! The same structure backs the plain text output and `--json`; keys and
//! hashes are carried as hex strings.

use crate::temporal::{format_date, format_timestamp, TimeDelta};
use ringscope_types::{format_amount, AddressType, Network};
use serde::Serialize;
use std::fmt::{self, Write as _};

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub ledger_path: String,
    pub network: Network,
    pub top_block_height: u64,
    pub top_block_timestamp: Option<u64>,
    pub tx_hash: String,
    pub block_height: Option<u64>,
    pub payment_id: PaymentIdReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<AccountReport>,
    pub genesis_timestamp: u64,
    pub reference_timestamp: u64,
    pub inputs: Vec<InputReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaymentIdReport {
    NotPresent,
    Plain {
        id: String,
    },
    Encrypted {
        id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        decrypted: Option<String>,
    },
    Ambiguous {
        plain: String,
        encrypted: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountReport {
    pub view_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_type: Option<AddressType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_key_matches_address: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputReport {
    Coinbase {
        height: u64,
    },
    Key {
        index: usize,
        key_image: String,
        amount: u64,
        members: Vec<MemberReport>,
        time_scale: String,
        signatures: Vec<SignatureReport>,
    },
}

/// One ring member. Fields fill in as resolution gets further; a
/// `diagnostic` records where it stopped.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MemberReport {
    pub mixin_no: usize,
    pub absolute_offset: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_height: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_delta: Option<TimeDelta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ours: Option<Ownership>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owned_amount: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_public_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_index: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

impl MemberReport {
    pub fn is_resolved(&self) -> bool {
        self.timestamp.is_some()
    }
}

/// Ownership verdict: a boolean, or the reason it could not be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Ownership {
    Evaluated { owned: bool },
    NotEvaluated { reason: String },
}

impl Ownership {
    pub fn is_owned(&self) -> bool {
        matches!(self, Self::Evaluated { owned: true })
    }
}

impl fmt::Display for Ownership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Evaluated { owned } => write!(f, "{owned}"),
            Self::NotEvaluated { reason } => write!(f, "not evaluated ({reason})"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SignatureReport {
    Ring { c: String, r: String },
    Clsag { s: Vec<String>, c1: String, d: String },
    NotDecoded { rct_type: u8, type_name: String },
}

impl Report {
    /// Ring members across all inputs marked as owned.
    pub fn owned_members(&self) -> impl Iterator<Item = &MemberReport> {
        self.inputs
            .iter()
            .filter_map(|input| match input {
                InputReport::Key { members, .. } => Some(members),
                InputReport::Coinbase { .. } => None,
            })
            .flatten()
            .filter(|m| m.ours.as_ref().is_some_and(Ownership::is_owned))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn render_text(&self) -> String {
        self.render(false)
    }

    /// Text report with evaluated ownership verdicts in ANSI green or red.
    pub fn render_text_colored(&self) -> String {
        self.render(true)
    }

    fn render(&self, color: bool) -> String {
        let mut out = String::new();
        // writing into a String cannot fail
        let _ = self.write_text(&mut out, color);
        out
    }

    fn write_text(&self, out: &mut String, color: bool) -> fmt::Result {
        writeln!(out, "Ledger path           : {}", self.ledger_path)?;
        writeln!(out, "Network               : {}", self.network)?;
        writeln!(out)?;
        writeln!(out, "Top block height      : {}", self.top_block_height)?;
        match self.top_block_timestamp {
            Some(ts) => writeln!(out, "Top block block time  : {}", format_timestamp(ts))?,
            None => writeln!(out, "Top block block time  : unknown")?,
        }
        writeln!(out)?;

        match &self.payment_id {
            PaymentIdReport::NotPresent => writeln!(out, "Payment id: not present")?,
            PaymentIdReport::Plain { id } => writeln!(out, "Payment id: {id}")?,
            PaymentIdReport::Encrypted { id, decrypted } => {
                writeln!(out, "Payment id (encrypted): {id}")?;
                if let Some(d) = decrypted {
                    writeln!(out, "Payment id (decrypted): {d}")?;
                }
            }
            PaymentIdReport::Ambiguous { plain, encrypted } => {
                writeln!(out, "Payment id (encrypted): {encrypted}")?;
                writeln!(out, "Payment id: {plain}")?;
                writeln!(out, "Warning: both plain and encrypted payment ids present")?;
            }
        }
        writeln!(out)?;

        match self.block_height {
            Some(h) => writeln!(out, "tx hash          : {}, block height {}", self.tx_hash, h)?,
            None => writeln!(out, "tx hash          : {}, block height unknown", self.tx_hash)?,
        }
        writeln!(out)?;

        if let Some(account) = &self.account {
            writeln!(out, "private view key : {}", account.view_key)?;
            if let Some(address) = &account.address {
                writeln!(out, "address          : {address}")?;
            }
            if account.view_key_matches_address == Some(false) {
                writeln!(out, "Warning: private view key does not match the address")?;
            }
            writeln!(out)?;
        }

        for input in &self.inputs {
            match input {
                InputReport::Coinbase { .. } => writeln!(out, " - coinbase tx: no inputs here.")?,
                InputReport::Key {
                    key_image,
                    amount,
                    members,
                    time_scale,
                    signatures,
                    ..
                } => {
                    writeln!(
                        out,
                        "Input's key image: {}, amount: {}",
                        key_image,
                        format_amount(*amount)
                    )?;
                    for member in members {
                        write_member(out, member, color)?;
                    }
                    writeln!(out)?;
                    writeln!(
                        out,
                        "Mixins timescale and ring signature for the above input, i.e.,: key image {}, amount: {}:",
                        key_image,
                        format_amount(*amount)
                    )?;
                    writeln!(
                        out,
                        "Genesis <{}>{}",
                        time_scale,
                        format_date(self.reference_timestamp)
                    )?;
                    for sig in signatures {
                        write_signature(out, sig)?;
                    }
                    writeln!(out)?;
                }
            }
        }

        writeln!(out)?;
        writeln!(out, "End of program.")
    }
}

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

fn write_member(out: &mut String, m: &MemberReport, color: bool) -> fmt::Result {
    if !m.is_resolved() {
        let reason = m.diagnostic.as_deref().unwrap_or("unresolved");
        return writeln!(out, "- {}, mixin no: {}", reason, m.mixin_no);
    }

    write!(
        out,
        "\n - mixin no: {}, block height: {}, timestamp: {}, time_diff: {}",
        m.mixin_no,
        m.block_height.unwrap_or_default(),
        m.timestamp.map(format_timestamp).unwrap_or_default(),
        m.time_delta.unwrap_or_default()
    )?;
    match &m.ours {
        Some(Ownership::Evaluated { owned }) if color => {
            let c = if *owned { GREEN } else { RED };
            write!(out, ", ours: {c}{owned}{RESET}")?;
        }
        Some(ours) => write!(out, ", ours: {ours}")?,
        None => {}
    }
    writeln!(out)?;

    if let Some(key) = &m.output_key {
        writeln!(out, "  - output's pubkey: {key}")?;
    }
    if let Some(hash) = &m.tx_hash {
        writeln!(out, "  - in tx with hash: {hash}")?;
    }
    match &m.tx_public_key {
        Some(key) => writeln!(out, "  - this tx pub key: {key}")?,
        None => writeln!(out, "  - this tx pub key: not present")?,
    }
    let g_idx = m
        .global_index
        .map(|g| g.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    writeln!(
        out,
        "  - out_i: {:03}, g_idx: {}, amount: {}",
        m.out_index.unwrap_or_default(),
        g_idx,
        format_amount(m.amount.unwrap_or_default())
    )?;
    if let Some(owned) = m.owned_amount {
        writeln!(out, "  - received amount: {}", format_amount(owned))?;
    }
    if let Some(diag) = &m.diagnostic {
        writeln!(out, "  - {diag}")?;
    }
    Ok(())
}

fn write_signature(out: &mut String, sig: &SignatureReport) -> fmt::Result {
    match sig {
        SignatureReport::Ring { c, r } => writeln!(out, " - c: {c}, r: {r}"),
        SignatureReport::Clsag { s, c1, d } => {
            for (i, s) in s.iter().enumerate() {
                writeln!(out, " - s[{i}]: {s}")?;
            }
            writeln!(out, " - c1: {c1}")?;
            writeln!(out, " - D: {d}")
        }
        SignatureReport::NotDecoded { rct_type, type_name } => writeln!(
            out,
            " - signature data not decoded (rct type {rct_type}, {type_name})"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(members: Vec<MemberReport>) -> Report {
        Report {
            ledger_path: "/tmp/ledger.db".into(),
            network: Network::Mainnet,
            top_block_height: 9,
            top_block_timestamp: Some(1_397_818_793),
            tx_hash: "ab".repeat(32),
            block_height: Some(7),
            payment_id: PaymentIdReport::NotPresent,
            account: None,
            genesis_timestamp: 1_397_818_193,
            reference_timestamp: 1_397_818_793,
            inputs: vec![InputReport::Key {
                index: 0,
                key_image: "cd".repeat(32),
                amount: 0,
                members,
                time_scale: "*___".into(),
                signatures: vec![SignatureReport::Ring {
                    c: "01".repeat(32),
                    r: "02".repeat(32),
                }],
            }],
        }
    }

    fn resolved(mixin_no: usize, ours: Option<Ownership>) -> MemberReport {
        MemberReport {
            mixin_no,
            absolute_offset: mixin_no as u64,
            block_height: Some(3),
            output_key: Some("ee".repeat(32)),
            tx_hash: Some("ff".repeat(32)),
            out_index: Some(1),
            timestamp: Some(1_397_818_373),
            time_delta: Some(TimeDelta::from_seconds(420, false)),
            ours,
            global_index: Some(12),
            amount: Some(0),
            ..Default::default()
        }
    }

    #[test]
    fn test_text_without_account() {
        let text = report(vec![resolved(1, None)]).render_text();
        assert!(text.contains("Top block height      : 9"));
        assert!(text.contains("Payment id: not present"));
        assert!(text.contains(" - mixin no: 1, block height: 3, timestamp: 2014-04-18 10:52:53, time_diff: 0 y, 0 d, 0 h, 7 m, 0 s\n"));
        assert!(!text.contains("ours"));
        assert!(text.contains("  - out_i: 001, g_idx: 12, amount: 0.000000000000"));
        assert!(text.contains("Genesis <*___>2014-04-18"));
        assert!(text.contains(&format!(" - c: {}, r: {}", "01".repeat(32), "02".repeat(32))));
        assert!(text.ends_with("End of program.\n"));
    }

    #[test]
    fn test_ownership_states() {
        let r = report(vec![
            resolved(1, Some(Ownership::Evaluated { owned: false })),
            resolved(2, Some(Ownership::Evaluated { owned: true })),
            resolved(
                3,
                Some(Ownership::NotEvaluated {
                    reason: "transaction has no tx public key".into(),
                }),
            ),
            MemberReport {
                mixin_no: 4,
                absolute_offset: 99,
                diagnostic: Some("cannot find output 99 of amount 0".into()),
                ..Default::default()
            },
        ]);
        assert_eq!(r.owned_members().map(|m| m.mixin_no).collect::<Vec<_>>(), vec![2]);

        let text = r.render_text();
        assert!(text.contains(", ours: false"));
        assert!(text.contains(", ours: true"));
        assert!(text.contains(", ours: not evaluated (transaction has no tx public key)"));
        assert!(text.contains("- cannot find output 99 of amount 0, mixin no: 4"));
        assert!(!text.contains('\x1b'));

        let colored = r.render_text_colored();
        assert!(colored.contains(", ours: \x1b[31mfalse\x1b[0m"));
        assert!(colored.contains(", ours: \x1b[32mtrue\x1b[0m"));
        assert!(colored.contains(", ours: not evaluated (transaction has no tx public key)"));

        let json: serde_json::Value = serde_json::from_str(&r.to_json().unwrap()).unwrap();
        let members = &json["inputs"][0]["members"];
        assert_eq!(members[0]["ours"], serde_json::json!({"status": "evaluated", "owned": false}));
        assert_eq!(members[1]["ours"]["owned"], true);
        assert_eq!(
            members[2]["ours"],
            serde_json::json!({
                "status": "not_evaluated",
                "reason": "transaction has no tx public key",
            })
        );
        assert!(members[3].get("ours").is_none());
        assert_eq!(json["network"], "mainnet");
        assert_eq!(json["payment_id"]["kind"], "not_present");
    }
}
