pub mod auth;
pub mod confirmation;
pub mod directory;
pub mod notification;
pub mod produit;
pub mod session;
