//! Core billing-document types, CPF/CNPJ validation, and amount parsing.
//!
//! Everything here is pure: no I/O, no clock reads beyond the local date used
//! as the default "today" for due-date checks.

mod builder;
mod error;
mod money;
mod payload;
mod record;
mod tax_id;
mod types;

pub use builder::*;
pub use error::*;
pub use money::*;
pub use payload::*;
pub use record::*;
pub use tax_id::*;
pub use types::*;
