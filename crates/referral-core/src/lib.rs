//! Core types and trait definitions for the referral ledger.
//!
//! This crate is deliberately free of HTTP and database dependencies. Storage
//! backends implement the traits in [`store`] and [`uow`]; front ends drive
//! the operations through [`service::ReferralService`].

pub mod context;
pub mod engine;
pub mod error;
pub mod identity;
pub mod referral;
pub mod service;
pub mod store;
pub mod uow;
pub mod user;

pub use context::RequestId;
pub use error::{Error, Result};
pub use service::ReferralService;
