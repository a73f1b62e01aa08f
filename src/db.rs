use std::sync::Arc;

use sqlx::PgPool;

pub mod directory_repo;
pub use directory_repo::{DirectoryStore, PgDirectoryRepository};
pub mod confirmation_repo;
pub use confirmation_repo::{ConfirmationStore, PgConfirmationRepository};
pub mod notification_repo;
pub use notification_repo::{NotificationStore, PgNotificationRepository};
pub mod produit_repo;
pub use produit_repo::{PgProduitRepository, ProduitStore};
pub mod session_repo;
pub use session_repo::{PgSessionRepository, SessionStore};
pub mod memory;
pub use memory::InMemoryStore;

// Conjunto de stores injetado nos serviços
#[derive(Clone)]
pub struct Stores {
    pub directory: Arc<dyn DirectoryStore>,
    pub confirmations: Arc<dyn ConfirmationStore>,
    pub notifications: Arc<dyn NotificationStore>,
    pub produits: Arc<dyn ProduitStore>,
    pub sessions: Arc<dyn SessionStore>,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            directory: Arc::new(PgDirectoryRepository::new(pool.clone())),
            confirmations: Arc::new(PgConfirmationRepository::new(pool.clone())),
            notifications: Arc::new(PgNotificationRepository::new(pool.clone())),
            produits: Arc::new(PgProduitRepository::new(pool.clone())),
            sessions: Arc::new(PgSessionRepository::new(pool)),
        }
    }

    pub fn in_memory(store: InMemoryStore) -> Self {
        Self {
            directory: Arc::new(store.clone()),
            confirmations: Arc::new(store.clone()),
            notifications: Arc::new(store.clone()),
            produits: Arc::new(store.clone()),
            sessions: Arc::new(store),
        }
    }
}
