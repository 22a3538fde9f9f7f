// handlers/mod.rs - two tiers
//
// Public (no scope needed) → Protected (derived security scope required)
pub mod protected;
pub mod public;
