pub mod auth;
pub mod confirmation_service;
pub mod notification_service;
pub mod notifier;
pub mod produit_service;
pub mod session_gate;
pub mod stock_watcher;
