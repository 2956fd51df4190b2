//! Fee distributor.
//!
//! The distributor is the pair registry's `fee_to`: pairs mint it LP shares
//! for the protocol's cut of trading fees. [`FeeDistributor::harvest`] redeems
//! those shares and splits each underlying token four ways.

pub mod distributor;
pub mod error;

pub use distributor::{Destinations, FeeDistributor, Harvest, TokenSplit};
pub use error::FeeError;
