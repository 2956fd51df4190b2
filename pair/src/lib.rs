//! Trading pairs: a constant-product invariant engine with a 25 bps fee.
//!
//! - [`pair`]: reserves, LP share mint/burn, fee-adjusted swaps, skim/sync
//! - [`registry`]: deterministic pair addresses, one pair per unordered token pair
//! - [`library`]: pure quoting helpers (`quote`, `get_amount_out`, multi-hop paths)
//! - [`router`]: slippage-checked liquidity and swap flows on top of the registry
//!
//! A pair's address doubles as the id of its LP share token; the pair is that
//! token's only minter.

pub mod error;
pub mod library;
pub mod pair;
pub mod registry;
pub mod router;

pub use error::PairError;
pub use pair::{Pair, SwapOutcome, FEE_BPS, MAX_RESERVE, MINIMUM_LIQUIDITY};
pub use registry::{pair_address, sort_tokens, PairRegistry};
pub use router::{AddLiquidity, LiquidityAdded, RemoveLiquidity};
