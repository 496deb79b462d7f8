//! Ring member resolution and ownership verification.
//!
//! For every key input of a transaction the inspector turns relative ring
//! offsets into absolute output positions, finds each member's source
//! transaction and block, optionally checks whether the member belongs to an
//! account, and profiles the members' ages.

pub mod inspector;
pub mod locator;
pub mod ownership;
pub mod report;
pub mod temporal;

pub use inspector::{inspect, InspectError, InspectOptions};
pub use locator::{locate_output_index, locate_owning_tx, lookup_output, LocateError};
pub use ownership::{is_owned, owned_amount, Account, OwnershipError};
pub use report::{InputReport, MemberReport, Ownership, PaymentIdReport, Report, SignatureReport};
pub use temporal::{time_delta, time_scale, TimeDelta, DEFAULT_SCALE_WIDTH, SECONDS_PER_YEAR};
