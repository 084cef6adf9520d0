//! # boleto
//!
//! Client library for issuing Brazilian billing documents (boleto bancário
//! with an embedded PIX code) against an mTLS-protected invoicing API, and
//! for looking them up afterwards.
//!
//! Amounts are held as [`rust_decimal::Decimal`] reais and only converted to
//! integer centavos when the wire payload is built.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use boleto::core::*;
//! use rust_decimal_macros::dec;
//!
//! let request = DocumentRequestBuilder::new("BOL-2030-001")
//!     .customer("João da Silva", "joao@email.com", "356.490.490-50")
//!     .add_service("Consultoria", "Consultoria mensal", dec!(100.50))
//!     .due_date(NaiveDate::from_ymd_opt(2030, 1, 11).unwrap())
//!     .email_notifications()
//!     .today(NaiveDate::from_ymd_opt(2030, 1, 10).unwrap())
//!     .build()
//!     .unwrap();
//!
//! let json = request.to_json().unwrap();
//! assert_eq!(json["services"][0]["amount"], 10050);
//! assert_eq!(json["customer"]["document"]["type"], "CPF");
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Document model, CPF/CNPJ validation, amount parsing, row mapping |
//! | `client` (default) | mTLS transport, token cache, generation, lookup |
//! | `cli` | The `boleto` command-line tool |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "client")]
pub mod client;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
