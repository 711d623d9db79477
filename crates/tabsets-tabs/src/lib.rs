//! Tabsets Tab Model
//!
//! A `Tab` is a frozen reference to one open document; a `TabSet` is a named,
//! ordered group of them. Both travel through the JSON codec in `codec`.

mod codec;
mod error;
mod tab;
mod tabset;

pub use codec::{decode_tabsets, encode_tabsets, repair_active_flags, ActiveRepair};
pub use error::TabError;
pub use tab::{DocumentState, Position, Tab};
pub use tabset::{TabSet, SEED_TABSET_NAME};

pub type Result<T> = std::result::Result<T, TabError>;
