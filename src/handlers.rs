pub mod auth;
pub mod broadcasting;
pub mod confirmations;
pub mod directory;
pub mod notifications;
pub mod produits;
pub mod session;
