// handlers/mod.rs - Handler tiers
//
// Public (no auth) → Protected (session basic auth, scoped per route) → Web (HTML)
//
pub mod public;    // /api/signup, /api/login, /api/contact, /api/logout, /health
pub mod protected; // /api/users, /api/accounts, /api/admins, ...
pub mod web;       // GET /
