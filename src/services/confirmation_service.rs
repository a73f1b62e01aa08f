// src/services/confirmation_service.rs

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::{error::AppError, i18n::{I18nStore, DEFAULT_LANG}},
    db::{ConfirmationStore, DirectoryStore, NotificationStore, Stores},
    models::{
        auth::{Identity, Role},
        confirmation::{
            Confirmation, ConfirmationDetail, ConfirmationStatus, NewConfirmation, RequesterType,
        },
        directory::{Employee, Vendeur},
        notification::{
            ApproverSnapshot, ConfirmationDecisionPayload, ConfirmationRecord,
            ConfirmationRequestedPayload, Notification, NotificationKind, PartySnapshot,
        },
    },
    services::notifier::{events, Channel, Notifier, OutboundEvent},
};

// As duas saídas possíveis de 'pending'
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Approve,
    Reject,
}

impl Decision {
    fn status(self) -> ConfirmationStatus {
        match self {
            Decision::Approve => ConfirmationStatus::Approved,
            Decision::Reject => ConfirmationStatus::Rejected,
        }
    }

    fn event_name(self) -> &'static str {
        match self {
            Decision::Approve => events::CONFIRMATION_APPROVED,
            Decision::Reject => events::CONFIRMATION_REJECTED,
        }
    }
}

/// A máquina de estados dos pedidos de confirmação Vendeur/Employee.
#[derive(Clone)]
pub struct ConfirmationService {
    confirmations: Arc<dyn ConfirmationStore>,
    directory: Arc<dyn DirectoryStore>,
    notifications: Arc<dyn NotificationStore>,
    notifier: Arc<dyn Notifier>,
    i18n: Arc<I18nStore>,
}

impl ConfirmationService {
    pub fn new(stores: &Stores, notifier: Arc<dyn Notifier>, i18n: Arc<I18nStore>) -> Self {
        Self {
            confirmations: stores.confirmations.clone(),
            directory: stores.directory.clone(),
            notifications: stores.notifications.clone(),
            notifier,
            i18n,
        }
    }

    // --- CRIAÇÃO ---

    /// Cria um pedido `pending`. Se o vendeur já tiver um pendente, falha com
    /// `DuplicatePending` (o pedido existente não é devolvido).
    pub async fn request_confirmation(
        &self,
        vendeur_id: Uuid,
        employee_id: Uuid,
        requester: &Identity,
    ) -> Result<Confirmation, AppError> {
        // 1. Quem pede precisa estar vinculado a um dos lados do par
        let requester_type = requester_side(requester, vendeur_id, employee_id)?;

        // 2. Resolve as duas partes
        let vendeur = self
            .directory
            .find_vendeur(vendeur_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("vendeur {}", vendeur_id)))?;
        let employee = self
            .directory
            .find_employee(employee_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("employee {}", employee_id)))?;

        // 3. Insere (o store garante o pendente único)
        let confirmation = self
            .confirmations
            .insert_pending(NewConfirmation {
                vendeur_id,
                employee_id,
                requester_type,
                requested_by: requester.user.id,
            })
            .await?;

        tracing::info!(
            confirmation_id = %confirmation.id,
            %vendeur_id,
            %employee_id,
            "📝 Pedido de confirmação criado"
        );

        // 4. Avisa os Responsables
        let (vendeur_name, employee_name) = (vendeur.full_name(), employee.full_name());
        let message = self.i18n.translate_with(
            DEFAULT_LANG,
            "confirmation.requested.message",
            &[
                ("requester", requester.display_name()),
                ("vendeur", vendeur_name.as_str()),
                ("employee", employee_name.as_str()),
            ],
        );
        let payload = ConfirmationRequestedPayload {
            confirmation_id: confirmation.id,
            vendeur_id,
            employee_id,
            vendeur_name,
            employee_name,
            requester_type,
            message,
        };
        self.announce_request(&payload).await;

        Ok(confirmation)
    }

    // --- DECISÕES ---

    pub async fn approve(
        &self,
        confirmation_id: Uuid,
        approver: &Identity,
    ) -> Result<Confirmation, AppError> {
        self.decide(confirmation_id, approver, Decision::Approve).await
    }

    pub async fn reject(
        &self,
        confirmation_id: Uuid,
        approver: &Identity,
    ) -> Result<Confirmation, AppError> {
        self.decide(confirmation_id, approver, Decision::Reject).await
    }

    async fn decide(
        &self,
        confirmation_id: Uuid,
        approver: &Identity,
        decision: Decision,
    ) -> Result<Confirmation, AppError> {
        if !approver.has_role(Role::Responsable) {
            return Err(AppError::Unauthorized(
                "somente um responsable pode decidir uma confirmação".into(),
            ));
        }

        // 1. Compare-and-set: só sai de 'pending' uma vez. Na aprovação, o par
        //    vira a sessão de trabalho do vendeur na mesma transação.
        let decided_at = Utc::now();
        let decided = match decision {
            Decision::Approve => {
                self.confirmations
                    .approve_and_activate(confirmation_id, approver.user.id, decided_at)
                    .await?
            }
            Decision::Reject => {
                self.confirmations
                    .decide_if_pending(
                        confirmation_id,
                        decision.status(),
                        approver.user.id,
                        decided_at,
                    )
                    .await?
            }
        };

        let confirmation = match decided {
            Some(confirmation) => confirmation,
            None => {
                // Perdeu a corrida ou o id não existe
                return Err(match self.confirmations.find_by_id(confirmation_id).await? {
                    Some(existing) => {
                        AppError::NotPending { id: confirmation_id, status: existing.status }
                    }
                    None => AppError::ConfirmationNotFound(confirmation_id),
                });
            }
        };
        debug_assert!(confirmation.status.is_terminal());

        tracing::info!(
            confirmation_id = %confirmation.id,
            status = %confirmation.status,
            approver = %approver.user.id,
            "✅ Confirmação decidida"
        );

        // 2. Avisa o vendeur no seu canal privado
        self.announce_decision(&confirmation, approver, decision).await;

        Ok(confirmation)
    }

    // --- CONSULTAS ---

    pub async fn current_pending(&self, vendeur_id: Uuid) -> Result<Option<Confirmation>, AppError> {
        self.confirmations.find_pending_for_vendeur(vendeur_id).await
    }

    pub async fn list_confirmations(
        &self,
        status: Option<ConfirmationStatus>,
    ) -> Result<Vec<Confirmation>, AppError> {
        self.confirmations.list(status).await
    }

    /// Detalhe com as partes resolvidas. Visível para Responsables e para as
    /// duas pontas do par.
    pub async fn get_detail(
        &self,
        confirmation_id: Uuid,
        viewer: &Identity,
    ) -> Result<ConfirmationDetail, AppError> {
        let confirmation = self
            .confirmations
            .find_by_id(confirmation_id)
            .await?
            .ok_or(AppError::ConfirmationNotFound(confirmation_id))?;

        let is_party = viewer.vendeur_id == Some(confirmation.vendeur_id)
            || viewer.employee_id == Some(confirmation.employee_id);
        if !viewer.has_role(Role::Responsable) && !is_party {
            return Err(AppError::Unauthorized("confirmação de outro vendeur".into()));
        }

        let vendeur = self.directory.find_vendeur(confirmation.vendeur_id).await?;
        let employee = self.directory.find_employee(confirmation.employee_id).await?;
        let approver = match confirmation.approved_by {
            Some(user_id) => self.directory.find_user_by_id(user_id).await?,
            None => None,
        };

        Ok(ConfirmationDetail { confirmation, vendeur, employee, approver })
    }

    // ---
    // Efeitos colaterais (depois do commit). Falhas aqui são registradas,
    // nunca desfazem a transição.
    // ---

    async fn announce_request(&self, payload: &ConfirmationRequestedPayload) {
        let data = match serde_json::to_value(payload) {
            Ok(data) => data,
            Err(e) => {
                tracing::error!("🔥 Falha ao serializar ConfirmationRequested: {}", e);
                return;
            }
        };

        match self.directory.user_ids_with_role(Role::Responsable).await {
            Ok(responsables) => {
                for user_id in responsables {
                    let notification = Notification::new(
                        user_id,
                        NotificationKind::ConfirmationRequested,
                        data.clone(),
                    );
                    self.store_and_signal(notification).await;
                }
            }
            Err(e) => tracing::warn!("⚠️ Não foi possível listar os responsables: {}", e),
        }

        self.publish(OutboundEvent::new(
            events::CONFIRMATION_REQUESTED,
            Channel::Responsables,
            data,
        ))
        .await;
    }

    async fn announce_decision(
        &self,
        confirmation: &Confirmation,
        approver: &Identity,
        decision: Decision,
    ) {
        let vendeur = self
            .directory
            .find_vendeur(confirmation.vendeur_id)
            .await
            .ok()
            .flatten();
        let employee = self
            .directory
            .find_employee(confirmation.employee_id)
            .await
            .ok()
            .flatten();

        let payload = ConfirmationDecisionPayload {
            confirmation: ConfirmationRecord {
                id: confirmation.id,
                vendeur_id: confirmation.vendeur_id,
                employee_id: confirmation.employee_id,
                status: confirmation.status,
                requester_type: confirmation.requester_type,
                approved_by: confirmation.approved_by,
                approved_at: confirmation.approved_at,
                created_at: confirmation.created_at,
                vendeur: vendeur.as_ref().map(vendeur_snapshot),
                employee: employee.as_ref().map(employee_snapshot),
                approver: Some(ApproverSnapshot {
                    id: approver.user.id,
                    name: approver.user.name.clone(),
                    email: approver.user.email.clone(),
                }),
            },
        };

        let data = match serde_json::to_value(&payload) {
            Ok(data) => data,
            Err(e) => {
                tracing::error!("🔥 Falha ao serializar {}: {}", decision.event_name(), e);
                return;
            }
        };

        // Notificação persistida para a conta do vendeur, se existir
        if let Some(user_id) = vendeur.and_then(|v| v.user_id) {
            let notification =
                Notification::new(user_id, NotificationKind::ConfirmationDecided, data.clone());
            self.store_and_signal(notification).await;
        }

        self.publish(OutboundEvent::new(
            decision.event_name(),
            Channel::Vendeur(confirmation.vendeur_id),
            data,
        ))
        .await;
    }

    async fn store_and_signal(&self, notification: Notification) {
        match self.notifications.insert(notification).await {
            Ok(saved) => {
                let channel = Channel::User(saved.user_id);
                match serde_json::to_value(&saved) {
                    Ok(data) => {
                        self.publish(OutboundEvent::new(events::NOTIFICATION_CREATED, channel, data))
                            .await
                    }
                    Err(e) => tracing::error!("🔥 Falha ao serializar notificação: {}", e),
                }
            }
            Err(e) => tracing::warn!("⚠️ Falha ao gravar notificação: {}", e),
        }
    }

    async fn publish(&self, event: OutboundEvent) {
        let (name, channel) = (event.name.clone(), event.channel);
        if let Err(e) = self.notifier.publish(event).await {
            tracing::warn!(event = %name, %channel, "⚠️ Falha ao publicar evento: {}", e);
        }
    }
}

// Qual lado do par a identidade representa
fn requester_side(
    requester: &Identity,
    vendeur_id: Uuid,
    employee_id: Uuid,
) -> Result<RequesterType, AppError> {
    for role in &requester.roles {
        match role {
            Role::Vendeur if requester.vendeur_id == Some(vendeur_id) => {
                return Ok(RequesterType::Vendeur);
            }
            Role::Employee if requester.employee_id == Some(employee_id) => {
                return Ok(RequesterType::Employee);
            }
            Role::Vendeur | Role::Employee | Role::Responsable => {}
        }
    }
    Err(AppError::Unauthorized(
        "a identidade não está vinculada ao vendeur nem ao employee do pedido".into(),
    ))
}

fn vendeur_snapshot(vendeur: &Vendeur) -> PartySnapshot {
    PartySnapshot {
        id: vendeur.id,
        nom: vendeur.nom.clone(),
        prenom: vendeur.prenom.clone(),
        full_name: vendeur.full_name(),
    }
}

fn employee_snapshot(employee: &Employee) -> PartySnapshot {
    PartySnapshot {
        id: employee.id,
        nom: employee.nom.clone(),
        prenom: employee.prenom.clone(),
        full_name: employee.full_name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{
            memory::faults::{FlakyApprovals, FlakyNotifications},
            InMemoryStore, SessionStore,
        },
        models::{auth::User, directory::Employee},
        services::notifier::RecordingNotifier,
    };
    use async_trait::async_trait;
    use tokio::task::JoinSet;

    // Transporte fora do ar: toda publicação falha
    struct DownNotifier;

    #[async_trait]
    impl Notifier for DownNotifier {
        async fn publish(&self, _event: OutboundEvent) -> Result<(), AppError> {
            Err(anyhow::anyhow!("transporte indisponível").into())
        }
    }

    struct Fixture {
        store: InMemoryStore,
        notifier: RecordingNotifier,
        service: ConfirmationService,
        responsable: Identity,
        vendeur: Vendeur,
        vendeur_identity: Identity,
        e1: Employee,
        e2: Employee,
    }

    async fn identity_of(store: &InMemoryStore, user: &User) -> Identity {
        store.resolve_identity(user.id).await.unwrap().unwrap()
    }

    async fn setup() -> Fixture {
        let store = InMemoryStore::new();
        let notifier = RecordingNotifier::new();
        let i18n = Arc::new(I18nStore::load().unwrap());
        let service = ConfirmationService::new(
            &Stores::in_memory(store.clone()),
            Arc::new(notifier.clone()),
            i18n,
        );

        let r1 = store
            .add_user("Responsable Un", "r1@gestion.local", "", &[Role::Responsable])
            .await;
        let v1_user = store
            .add_user("Moussa Ndiaye", "v1@gestion.local", "", &[Role::Vendeur])
            .await;
        let vendeur = store.add_vendeur(Some(v1_user.id), "Ndiaye", "Moussa").await;
        let e1 = store.add_employee(None, "Sarr", "Fatou").await;
        let e2 = store.add_employee(None, "Ba", "Ousmane").await;

        let responsable = identity_of(&store, &r1).await;
        let vendeur_identity = identity_of(&store, &v1_user).await;

        Fixture { store, notifier, service, responsable, vendeur, vendeur_identity, e1, e2 }
    }

    #[tokio::test]
    async fn request_creates_pending_and_notifies_responsables() {
        let f = setup().await;

        let confirmation = f
            .service
            .request_confirmation(f.vendeur.id, f.e1.id, &f.vendeur_identity)
            .await
            .unwrap();

        assert_eq!(confirmation.status, ConfirmationStatus::Pending);
        assert_eq!(confirmation.requester_type, RequesterType::Vendeur);
        assert!(confirmation.approved_by.is_none());
        assert!(confirmation.approved_at.is_none());

        let requested = f.notifier.events_named(events::CONFIRMATION_REQUESTED);
        assert_eq!(requested.len(), 1);
        assert_eq!(requested[0].channel, Channel::Responsables);

        let payload = &requested[0].payload;
        assert_eq!(payload["confirmation_id"], confirmation.id.to_string());
        assert_eq!(payload["vendeur_id"], f.vendeur.id.to_string());
        assert_eq!(payload["employee_id"], f.e1.id.to_string());
        assert_eq!(payload["vendeur_name"], "Moussa Ndiaye");
        assert_eq!(payload["employee_name"], "Fatou Sarr");
        assert_eq!(payload["requester_type"], "vendeur");
        assert!(payload["message"].as_str().unwrap().contains("Fatou Sarr"));

        // Uma notificação persistida por Responsable
        let stored = f.store.all_notifications().await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].user_id, f.responsable.user.id);
        assert_eq!(stored[0].kind, NotificationKind::ConfirmationRequested);
    }

    #[tokio::test]
    async fn second_request_while_pending_is_rejected() {
        let f = setup().await;
        let first = f
            .service
            .request_confirmation(f.vendeur.id, f.e1.id, &f.vendeur_identity)
            .await
            .unwrap();

        let second = f
            .service
            .request_confirmation(f.vendeur.id, f.e2.id, &f.vendeur_identity)
            .await;

        assert!(matches!(
            second,
            Err(AppError::DuplicatePending { vendeur_id }) if vendeur_id == f.vendeur.id
        ));

        // O pendente original fica intacto
        let pending = f.service.current_pending(f.vendeur.id).await.unwrap().unwrap();
        assert_eq!(pending.id, first.id);
        assert_eq!(pending.employee_id, f.e1.id);
        assert_eq!(f.notifier.events_named(events::CONFIRMATION_REQUESTED).len(), 1);
    }

    #[tokio::test]
    async fn concurrent_requests_leave_exactly_one_pending() {
        let f = setup().await;
        let mut tasks = JoinSet::new();
        for _ in 0..8 {
            let service = f.service.clone();
            let identity = f.vendeur_identity.clone();
            let (vendeur_id, employee_id) = (f.vendeur.id, f.e1.id);
            tasks.spawn(async move {
                service.request_confirmation(vendeur_id, employee_id, &identity).await
            });
        }

        let mut created = 0;
        let mut duplicates = 0;
        while let Some(result) = tasks.join_next().await {
            match result.unwrap() {
                Ok(_) => created += 1,
                Err(AppError::DuplicatePending { .. }) => duplicates += 1,
                Err(other) => panic!("erro inesperado: {:?}", other),
            }
        }

        assert_eq!(created, 1);
        assert_eq!(duplicates, 7);
        let pending: Vec<_> = f
            .store
            .all_confirmations()
            .await
            .into_iter()
            .filter(|c| c.status == ConfirmationStatus::Pending)
            .collect();
        assert_eq!(pending.len(), 1);
    }

    #[tokio::test]
    async fn approve_sets_decision_fields_and_notifies_vendeur_channel() {
        let f = setup().await;
        let pending = f
            .service
            .request_confirmation(f.vendeur.id, f.e1.id, &f.vendeur_identity)
            .await
            .unwrap();
        f.notifier.clear();

        let approved = f.service.approve(pending.id, &f.responsable).await.unwrap();

        assert_eq!(approved.status, ConfirmationStatus::Approved);
        assert_eq!(approved.approved_by, Some(f.responsable.user.id));
        assert!(approved.approved_at.is_some());

        let events = f.notifier.events_named(events::CONFIRMATION_APPROVED);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].channel, Channel::Vendeur(f.vendeur.id));
        assert_eq!(events[0].channel.to_string(), format!("vendeur.{}", f.vendeur.id));

        let record = &events[0].payload["confirmation"];
        assert_eq!(record["status"], "approved");
        assert_eq!(record["vendeur"]["full_name"], "Moussa Ndiaye");
        assert_eq!(record["employee"]["full_name"], "Fatou Sarr");
        assert_eq!(record["approver"]["id"], f.responsable.user.id.to_string());

        // O par aprovado já é a sessão de trabalho
        let session = f.store.active_session(f.vendeur.id).await.unwrap().unwrap();
        assert_eq!(session.employee_id, f.e1.id);
        assert_eq!(session.confirmation_id, pending.id);

        // O vendeur tem uma conta: recebe a notificação persistida
        let vendeur_notifications = f
            .store
            .list_for_user(f.vendeur_identity.user.id, false)
            .await
            .unwrap();
        assert_eq!(vendeur_notifications.len(), 1);
        assert_eq!(vendeur_notifications[0].kind, NotificationKind::ConfirmationDecided);
    }

    #[tokio::test]
    async fn reject_records_rejecting_identity_without_opening_a_session() {
        let f = setup().await;
        let pending = f
            .service
            .request_confirmation(f.vendeur.id, f.e1.id, &f.vendeur_identity)
            .await
            .unwrap();

        let rejected = f.service.reject(pending.id, &f.responsable).await.unwrap();

        assert_eq!(rejected.status, ConfirmationStatus::Rejected);
        assert_eq!(rejected.approved_by, Some(f.responsable.user.id));
        assert!(rejected.approved_at.is_some());
        assert!(f.store.active_session(f.vendeur.id).await.unwrap().is_none());

        let events = f.notifier.events_named(events::CONFIRMATION_REJECTED);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].channel, Channel::Vendeur(f.vendeur.id));
    }

    #[tokio::test]
    async fn decided_confirmations_are_terminal() {
        let f = setup().await;
        let pending = f
            .service
            .request_confirmation(f.vendeur.id, f.e1.id, &f.vendeur_identity)
            .await
            .unwrap();
        f.service.approve(pending.id, &f.responsable).await.unwrap();

        for result in [
            f.service.approve(pending.id, &f.responsable).await,
            f.service.reject(pending.id, &f.responsable).await,
        ] {
            assert!(matches!(
                result,
                Err(AppError::NotPending { status: ConfirmationStatus::Approved, .. })
            ));
        }

        let stored = ConfirmationStore::find_by_id(&f.store, pending.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ConfirmationStatus::Approved);
    }

    #[tokio::test]
    async fn rejected_confirmation_cannot_be_approved_later() {
        let f = setup().await;
        let pending = f
            .service
            .request_confirmation(f.vendeur.id, f.e1.id, &f.vendeur_identity)
            .await
            .unwrap();
        f.service.reject(pending.id, &f.responsable).await.unwrap();

        let result = f.service.approve(pending.id, &f.responsable).await;
        assert!(matches!(
            result,
            Err(AppError::NotPending { status: ConfirmationStatus::Rejected, .. })
        ));

        // Depois de decidido, o vendeur pode pedir de novo
        let again = f
            .service
            .request_confirmation(f.vendeur.id, f.e2.id, &f.vendeur_identity)
            .await
            .unwrap();
        assert_eq!(again.status, ConfirmationStatus::Pending);
    }

    #[tokio::test]
    async fn concurrent_decisions_have_a_single_winner() {
        let f = setup().await;
        let pending = f
            .service
            .request_confirmation(f.vendeur.id, f.e1.id, &f.vendeur_identity)
            .await
            .unwrap();

        let (a, b) = tokio::join!(
            f.service.approve(pending.id, &f.responsable),
            f.service.reject(pending.id, &f.responsable),
        );

        let winners = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
        assert_eq!(winners, 1);
        let loser = if a.is_ok() { b } else { a };
        assert!(matches!(loser, Err(AppError::NotPending { .. })));
    }

    #[tokio::test]
    async fn unknown_confirmation_is_not_found() {
        let f = setup().await;
        let missing = Uuid::new_v4();
        let result = f.service.approve(missing, &f.responsable).await;
        assert!(matches!(result, Err(AppError::ConfirmationNotFound(id)) if id == missing));
    }

    #[tokio::test]
    async fn only_responsables_can_decide() {
        let f = setup().await;
        let pending = f
            .service
            .request_confirmation(f.vendeur.id, f.e1.id, &f.vendeur_identity)
            .await
            .unwrap();

        let result = f.service.approve(pending.id, &f.vendeur_identity).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));

        let still = f.service.current_pending(f.vendeur.id).await.unwrap();
        assert!(still.is_some());
    }

    #[tokio::test]
    async fn requester_must_be_linked_to_the_pairing() {
        let f = setup().await;
        let other_user = f
            .store
            .add_user("Autre Vendeur", "v2@gestion.local", "", &[Role::Vendeur])
            .await;
        let other = identity_of(&f.store, &other_user).await;

        // Vendeur sem registro vinculado
        let result = f.service.request_confirmation(f.vendeur.id, f.e1.id, &other).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
        assert!(f.notifier.events().is_empty());
    }

    #[tokio::test]
    async fn employee_can_initiate_the_pairing() {
        let f = setup().await;
        let e_user = f
            .store
            .add_user("Awa Fall", "e3@gestion.local", "", &[Role::Employee])
            .await;
        let employee = f.store.add_employee(Some(e_user.id), "Fall", "Awa").await;
        let employee_identity = identity_of(&f.store, &e_user).await;

        let confirmation = f
            .service
            .request_confirmation(f.vendeur.id, employee.id, &employee_identity)
            .await
            .unwrap();

        assert_eq!(confirmation.requester_type, RequesterType::Employee);
        assert_eq!(confirmation.requested_by, e_user.id);
    }

    #[tokio::test]
    async fn unknown_employee_is_reported() {
        let f = setup().await;
        let result = f
            .service
            .request_confirmation(f.vendeur.id, Uuid::new_v4(), &f.vendeur_identity)
            .await;
        assert!(matches!(result, Err(AppError::ResourceNotFound(_))));
    }

    #[tokio::test]
    async fn detail_embeds_parties_and_is_hidden_from_strangers() {
        let f = setup().await;
        let pending = f
            .service
            .request_confirmation(f.vendeur.id, f.e1.id, &f.vendeur_identity)
            .await
            .unwrap();
        f.service.approve(pending.id, &f.responsable).await.unwrap();

        let detail = f.service.get_detail(pending.id, &f.vendeur_identity).await.unwrap();
        assert_eq!(detail.vendeur.unwrap().id, f.vendeur.id);
        assert_eq!(detail.employee.unwrap().id, f.e1.id);
        assert_eq!(detail.approver.unwrap().id, f.responsable.user.id);

        let stranger_user = f.store.add_user("Intrus", "x@gestion.local", "", &[]).await;
        let stranger = identity_of(&f.store, &stranger_user).await;
        let result = f.service.get_detail(pending.id, &stranger).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn list_filters_by_status() {
        let f = setup().await;
        let first = f
            .service
            .request_confirmation(f.vendeur.id, f.e1.id, &f.vendeur_identity)
            .await
            .unwrap();
        f.service.reject(first.id, &f.responsable).await.unwrap();
        f.service
            .request_confirmation(f.vendeur.id, f.e2.id, &f.vendeur_identity)
            .await
            .unwrap();

        let all = f.service.list_confirmations(None).await.unwrap();
        let pending = f
            .service
            .list_confirmations(Some(ConfirmationStatus::Pending))
            .await
            .unwrap();
        let rejected = f
            .service
            .list_confirmations(Some(ConfirmationStatus::Rejected))
            .await
            .unwrap();

        assert_eq!(all.len(), 2);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].employee_id, f.e2.id);
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].id, first.id);
    }

    #[tokio::test]
    async fn failed_approval_rolls_back_and_can_be_retried() {
        let f = setup().await;
        let pending = f
            .service
            .request_confirmation(f.vendeur.id, f.e1.id, &f.vendeur_identity)
            .await
            .unwrap();
        f.notifier.clear();

        let approvals = FlakyApprovals::new(f.store.clone());
        let service = ConfirmationService::new(
            &Stores {
                confirmations: Arc::new(approvals.clone()),
                ..Stores::in_memory(f.store.clone())
            },
            Arc::new(f.notifier.clone()),
            Arc::new(I18nStore::load().unwrap()),
        );

        let result = service.approve(pending.id, &f.responsable).await;
        assert!(matches!(result, Err(AppError::InternalServerError(_))));

        // Nada ficou pela metade: continua pendente, sem sessão e sem evento
        let stored = ConfirmationStore::find_by_id(&f.store, pending.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ConfirmationStatus::Pending);
        assert!(f.store.active_session(f.vendeur.id).await.unwrap().is_none());
        assert!(f.notifier.events_named(events::CONFIRMATION_APPROVED).is_empty());

        approvals.recover();
        let approved = service.approve(pending.id, &f.responsable).await.unwrap();
        assert_eq!(approved.status, ConfirmationStatus::Approved);
        assert!(f.store.active_session(f.vendeur.id).await.unwrap().is_some());
        assert_eq!(f.notifier.events_named(events::CONFIRMATION_APPROVED).len(), 1);
    }

    #[tokio::test]
    async fn publish_failures_do_not_undo_transitions() {
        let f = setup().await;
        let service = ConfirmationService::new(
            &Stores::in_memory(f.store.clone()),
            Arc::new(DownNotifier),
            Arc::new(I18nStore::load().unwrap()),
        );

        let pending = service
            .request_confirmation(f.vendeur.id, f.e1.id, &f.vendeur_identity)
            .await
            .unwrap();
        assert_eq!(pending.status, ConfirmationStatus::Pending);

        let approved = service.approve(pending.id, &f.responsable).await.unwrap();
        assert_eq!(approved.status, ConfirmationStatus::Approved);

        let stored = ConfirmationStore::find_by_id(&f.store, pending.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ConfirmationStatus::Approved);
        let session = f.store.active_session(f.vendeur.id).await.unwrap().unwrap();
        assert_eq!(session.confirmation_id, pending.id);

        // As notificações persistidas não dependem do transporte
        let decided = f
            .store
            .list_for_user(f.vendeur_identity.user.id, false)
            .await
            .unwrap();
        assert_eq!(decided.len(), 1);
        assert_eq!(decided[0].kind, NotificationKind::ConfirmationDecided);
    }

    #[tokio::test]
    async fn notification_store_failures_do_not_undo_transitions() {
        let f = setup().await;
        let service = ConfirmationService::new(
            &Stores {
                notifications: Arc::new(FlakyNotifications::new(f.store.clone())),
                ..Stores::in_memory(f.store.clone())
            },
            Arc::new(f.notifier.clone()),
            Arc::new(I18nStore::load().unwrap()),
        );

        let pending = service
            .request_confirmation(f.vendeur.id, f.e1.id, &f.vendeur_identity)
            .await
            .unwrap();
        let rejected = service.reject(pending.id, &f.responsable).await.unwrap();

        assert_eq!(rejected.status, ConfirmationStatus::Rejected);
        assert!(f.store.all_notifications().await.is_empty());

        // Os eventos ao vivo saem mesmo sem a caixa de entrada
        assert_eq!(f.notifier.events_named(events::CONFIRMATION_REQUESTED).len(), 1);
        assert_eq!(f.notifier.events_named(events::CONFIRMATION_REJECTED).len(), 1);
        assert!(f.notifier.events_named(events::NOTIFICATION_CREATED).is_empty());
    }
}
