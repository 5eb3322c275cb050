//! Synthetic banking dataset generator.
//!
//! Produces a customers table and an accounts table whose `Customer_ID`
//! foreign keys always reference a customer of the same batch, then ships
//! both tables as date-stamped CSV objects.
//!
//! # Quick Start
//!
//! ```no_run
//! use bank_datagen::{generate_dataset, AccountsPerCustomer, GeneratorContext, RecordCount};
//! use chrono::NaiveDate;
//!
//! let run_date = NaiveDate::from_ymd_opt(2026, 2, 14).unwrap();
//! let ctx = GeneratorContext::new(42, run_date);
//! let count: RecordCount = "50".parse().unwrap();
//! let dataset = generate_dataset(&ctx, count, AccountsPerCustomer::One).unwrap();
//! assert_eq!(dataset.accounts.len(), 50);
//! ```
//!
//! - [`context`]: seed and run date carried explicitly instead of global state
//! - [`text_provider`]: name/address/phone/email capability and its seeded implementation
//! - [`generator`]: record generation and foreign-key linkage
//! - [`publish`]: CSV serialization and upload to an object store

pub mod context;
pub mod dates;
pub mod error;
pub mod generator;
pub mod publish;
pub mod text_provider;

pub use context::GeneratorContext;
pub use error::GeneratorError;
pub use generator::{
    generate_accounts, generate_accounts_with_policy, generate_customers, generate_dataset,
    AccountsPerCustomer, Dataset, RecordCount,
};
pub use publish::{publish_dataset, PublishedObjects};
pub use text_provider::{SeededTextProvider, TextProvider};
