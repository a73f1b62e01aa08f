// src/db/memory.rs

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ConfirmationStore, DirectoryStore, NotificationStore, ProduitStore, SessionStore},
    models::{
        auth::{Identity, Role, User},
        confirmation::{Confirmation, ConfirmationStatus, NewConfirmation},
        directory::{Employee, Vendeur},
        notification::{Notification, NotificationKind},
        produit::{NewProduit, Produit, ProduitChanges, ProduitMutation},
        session::WorkSession,
    },
};

#[derive(Default)]
struct DirectoryState {
    users: HashMap<Uuid, User>,
    roles: HashMap<Uuid, Vec<Role>>,
    vendeurs: HashMap<Uuid, Vendeur>,
    employees: HashMap<Uuid, Employee>,
}

/// Implementação em memória de todos os stores.
///
/// Mesma semântica das versões Postgres: cada operação que precisa ser atômica
/// (pendente único por vendeur, decisão condicional, aprovação + sessão, lote de
/// notificações) roda sob os locks de escrita correspondentes.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    directory: Arc<RwLock<DirectoryState>>,
    confirmations: Arc<RwLock<Vec<Confirmation>>>,
    notifications: Arc<RwLock<Vec<Notification>>>,
    produits: Arc<RwLock<HashMap<Uuid, Produit>>>,
    sessions: Arc<RwLock<HashMap<Uuid, WorkSession>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ---
    // Helpers de carga (testes e execução local)
    // ---

    pub async fn add_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        roles: &[Role],
    ) -> User {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now,
            updated_at: now,
        };
        let mut state = self.directory.write().await;
        state.users.insert(user.id, user.clone());
        state.roles.insert(user.id, roles.to_vec());
        user
    }

    pub async fn add_vendeur(&self, user_id: Option<Uuid>, nom: &str, prenom: &str) -> Vendeur {
        let vendeur = Vendeur {
            id: Uuid::new_v4(),
            user_id,
            nom: nom.to_string(),
            prenom: prenom.to_string(),
            telephone: None,
            created_at: Utc::now(),
        };
        self.directory.write().await.vendeurs.insert(vendeur.id, vendeur.clone());
        vendeur
    }

    pub async fn add_employee(&self, user_id: Option<Uuid>, nom: &str, prenom: &str) -> Employee {
        let employee = Employee {
            id: Uuid::new_v4(),
            user_id,
            nom: nom.to_string(),
            prenom: prenom.to_string(),
            telephone: None,
            created_at: Utc::now(),
        };
        self.directory.write().await.employees.insert(employee.id, employee.clone());
        employee
    }

    pub async fn all_notifications(&self) -> Vec<Notification> {
        self.notifications.read().await.clone()
    }

    pub async fn all_confirmations(&self) -> Vec<Confirmation> {
        self.confirmations.read().await.clone()
    }
}

#[async_trait]
impl DirectoryStore for InMemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let state = self.directory.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.directory.read().await.users.get(&id).cloned())
    }

    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, AppError> {
        let mut state = self.directory.write().await;
        if state.users.values().any(|u| u.email == email) {
            return Err(AppError::EmailAlreadyExists);
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn resolve_identity(&self, user_id: Uuid) -> Result<Option<Identity>, AppError> {
        let state = self.directory.read().await;
        let Some(user) = state.users.get(&user_id).cloned() else {
            return Ok(None);
        };
        let mut roles = state.roles.get(&user_id).cloned().unwrap_or_default();
        roles.sort();
        let vendeur_id = state
            .vendeurs
            .values()
            .find(|v| v.user_id == Some(user_id))
            .map(|v| v.id);
        let employee_id = state
            .employees
            .values()
            .find(|e| e.user_id == Some(user_id))
            .map(|e| e.id);
        Ok(Some(Identity { user, roles, vendeur_id, employee_id }))
    }

    async fn user_ids_with_role(&self, role: Role) -> Result<Vec<Uuid>, AppError> {
        let state = self.directory.read().await;
        let mut ids: Vec<Uuid> = state
            .roles
            .iter()
            .filter(|(_, roles)| roles.contains(&role))
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        Ok(ids)
    }

    async fn find_vendeur(&self, id: Uuid) -> Result<Option<Vendeur>, AppError> {
        Ok(self.directory.read().await.vendeurs.get(&id).cloned())
    }

    async fn find_employee(&self, id: Uuid) -> Result<Option<Employee>, AppError> {
        Ok(self.directory.read().await.employees.get(&id).cloned())
    }

    async fn list_vendeurs(&self) -> Result<Vec<Vendeur>, AppError> {
        let mut vendeurs: Vec<Vendeur> =
            self.directory.read().await.vendeurs.values().cloned().collect();
        vendeurs.sort_by(|a, b| (&a.nom, &a.prenom).cmp(&(&b.nom, &b.prenom)));
        Ok(vendeurs)
    }

    async fn list_employees(&self) -> Result<Vec<Employee>, AppError> {
        let mut employees: Vec<Employee> =
            self.directory.read().await.employees.values().cloned().collect();
        employees.sort_by(|a, b| (&a.nom, &a.prenom).cmp(&(&b.nom, &b.prenom)));
        Ok(employees)
    }
}

#[async_trait]
impl ConfirmationStore for InMemoryStore {
    async fn insert_pending(&self, new: NewConfirmation) -> Result<Confirmation, AppError> {
        let mut store = self.confirmations.write().await;

        // Simula o índice único parcial
        if store
            .iter()
            .any(|c| c.vendeur_id == new.vendeur_id && c.status == ConfirmationStatus::Pending)
        {
            return Err(AppError::DuplicatePending { vendeur_id: new.vendeur_id });
        }

        let confirmation = Confirmation {
            id: Uuid::new_v4(),
            vendeur_id: new.vendeur_id,
            employee_id: new.employee_id,
            status: ConfirmationStatus::Pending,
            requester_type: new.requester_type,
            requested_by: new.requested_by,
            approved_by: None,
            approved_at: None,
            created_at: Utc::now(),
        };
        store.push(confirmation.clone());
        Ok(confirmation)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Confirmation>, AppError> {
        let store = self.confirmations.read().await;
        Ok(store.iter().find(|c| c.id == id).cloned())
    }

    async fn find_pending_for_vendeur(
        &self,
        vendeur_id: Uuid,
    ) -> Result<Option<Confirmation>, AppError> {
        let store = self.confirmations.read().await;
        Ok(store
            .iter()
            .find(|c| c.vendeur_id == vendeur_id && c.status == ConfirmationStatus::Pending)
            .cloned())
    }

    async fn decide_if_pending(
        &self,
        id: Uuid,
        status: ConfirmationStatus,
        decided_by: Uuid,
        decided_at: DateTime<Utc>,
    ) -> Result<Option<Confirmation>, AppError> {
        let mut store = self.confirmations.write().await;
        let Some(confirmation) = store
            .iter_mut()
            .find(|c| c.id == id && c.status == ConfirmationStatus::Pending)
        else {
            return Ok(None);
        };
        confirmation.status = status;
        confirmation.approved_by = Some(decided_by);
        confirmation.approved_at = Some(decided_at);
        Ok(Some(confirmation.clone()))
    }

    async fn approve_and_activate(
        &self,
        id: Uuid,
        decided_by: Uuid,
        decided_at: DateTime<Utc>,
    ) -> Result<Option<Confirmation>, AppError> {
        // Ordem dos locks: confirmations, depois sessions
        let mut store = self.confirmations.write().await;
        let mut sessions = self.sessions.write().await;
        let Some(confirmation) = store
            .iter_mut()
            .find(|c| c.id == id && c.status == ConfirmationStatus::Pending)
        else {
            return Ok(None);
        };
        confirmation.status = ConfirmationStatus::Approved;
        confirmation.approved_by = Some(decided_by);
        confirmation.approved_at = Some(decided_at);
        sessions.insert(
            confirmation.vendeur_id,
            WorkSession {
                vendeur_id: confirmation.vendeur_id,
                employee_id: confirmation.employee_id,
                confirmation_id: confirmation.id,
                started_at: decided_at,
            },
        );
        Ok(Some(confirmation.clone()))
    }

    async fn list(
        &self,
        status: Option<ConfirmationStatus>,
    ) -> Result<Vec<Confirmation>, AppError> {
        let store = self.confirmations.read().await;
        let mut confirmations: Vec<Confirmation> = store
            .iter()
            .filter(|c| status.is_none_or(|s| c.status == s))
            .cloned()
            .collect();
        confirmations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(confirmations)
    }
}

#[async_trait]
impl NotificationStore for InMemoryStore {
    async fn insert(&self, notification: Notification) -> Result<Notification, AppError> {
        self.notifications.write().await.push(notification.clone());
        Ok(notification)
    }

    async fn insert_many(
        &self,
        notifications: Vec<Notification>,
    ) -> Result<Vec<Notification>, AppError> {
        self.notifications.write().await.extend(notifications.iter().cloned());
        Ok(notifications)
    }

    async fn exists_unread_since(
        &self,
        kind: NotificationKind,
        field: &str,
        value: &str,
        since: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let store = self.notifications.read().await;
        Ok(store.iter().any(|n| {
            n.kind == kind
                && n.read_at.is_none()
                && n.created_at >= since
                && n.data.get(field).and_then(|v| v.as_str()) == Some(value)
        }))
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
    ) -> Result<Vec<Notification>, AppError> {
        let store = self.notifications.read().await;
        let mut notifications: Vec<Notification> = store
            .iter()
            .filter(|n| n.user_id == user_id && (!unread_only || n.read_at.is_none()))
            .cloned()
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notifications)
    }

    async fn mark_read(
        &self,
        user_id: Uuid,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let mut store = self.notifications.write().await;
        match store.iter_mut().find(|n| n.id == id && n.user_id == user_id) {
            Some(notification) => {
                notification.read_at.get_or_insert(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_all_read(&self, user_id: Uuid, at: DateTime<Utc>) -> Result<u64, AppError> {
        let mut store = self.notifications.write().await;
        let mut updated = 0;
        for notification in store
            .iter_mut()
            .filter(|n| n.user_id == user_id && n.read_at.is_none())
        {
            notification.read_at = Some(at);
            updated += 1;
        }
        Ok(updated)
    }

    async fn count_unread(&self, user_id: Uuid) -> Result<i64, AppError> {
        let store = self.notifications.read().await;
        Ok(store
            .iter()
            .filter(|n| n.user_id == user_id && n.read_at.is_none())
            .count() as i64)
    }
}

#[async_trait]
impl ProduitStore for InMemoryStore {
    async fn create(&self, new: NewProduit) -> Result<Produit, AppError> {
        let mut store = self.produits.write().await;
        if store.values().any(|p| p.reference == new.reference) {
            return Err(AppError::ProduitReferenceAlreadyExists(new.reference));
        }
        let now = Utc::now();
        let produit = Produit {
            id: Uuid::new_v4(),
            reference: new.reference,
            description: new.description,
            qte_stock: new.qte_stock,
            unite: new.unite,
            prix_unitaire: new.prix_unitaire,
            created_at: now,
            updated_at: now,
        };
        store.insert(produit.id, produit.clone());
        Ok(produit)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Produit>, AppError> {
        Ok(self.produits.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Produit>, AppError> {
        let mut produits: Vec<Produit> = self.produits.read().await.values().cloned().collect();
        produits.sort_by(|a, b| a.reference.cmp(&b.reference));
        Ok(produits)
    }

    async fn update(
        &self,
        id: Uuid,
        changes: ProduitChanges,
    ) -> Result<Option<ProduitMutation>, AppError> {
        let mut store = self.produits.write().await;
        let Some(produit) = store.get_mut(&id) else {
            return Ok(None);
        };
        let previous_qte = produit.qte_stock;
        if let Some(description) = changes.description {
            produit.description = description;
        }
        if let Some(qte_stock) = changes.qte_stock {
            produit.qte_stock = qte_stock;
        }
        if let Some(unite) = changes.unite {
            produit.unite = unite;
        }
        if let Some(prix_unitaire) = changes.prix_unitaire {
            produit.prix_unitaire = prix_unitaire;
        }
        produit.updated_at = Utc::now();
        Ok(Some(ProduitMutation { previous_qte, produit: produit.clone() }))
    }
}

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn active_session(&self, vendeur_id: Uuid) -> Result<Option<WorkSession>, AppError> {
        Ok(self.sessions.read().await.get(&vendeur_id).cloned())
    }

    async fn activate(&self, session: WorkSession) -> Result<(), AppError> {
        self.sessions.write().await.insert(session.vendeur_id, session);
        Ok(())
    }

    async fn end(&self, vendeur_id: Uuid) -> Result<bool, AppError> {
        Ok(self.sessions.write().await.remove(&vendeur_id).is_some())
    }
}
