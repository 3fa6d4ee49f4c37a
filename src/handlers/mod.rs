// handlers/mod.rs - Two handler tiers
//
// Public (no token) → Protected (session + bearer token)
pub mod protected;
pub mod public;
