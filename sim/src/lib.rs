//! Flywheel simulator for the Puddel exchange core.
//!
//! A [`Scenario`] names accounts, quote tokens, pools, locks and the per-epoch
//! activity (votes, incentives, swaps). [`Simulation`] replays it epoch by
//! epoch against a [`puddel_protocol::Protocol`] and produces a [`Report`].
//! Accounts are plain labels; addresses are derived with
//! [`puddel_types::Address::from_label`].

pub mod error;
pub mod report;
pub mod runner;
pub mod scenario;

pub use error::SimError;
pub use report::Report;
pub use runner::Simulation;
pub use scenario::Scenario;
