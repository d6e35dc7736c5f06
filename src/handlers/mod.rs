// Handlers by access tier:
// public (no token) and protected (behind require_bearer)
pub mod protected;
pub mod public;
