mod common;

use std::sync::Arc;

use rust_decimal::Decimal;

use common::*;
use delivery_guides::models::{CancellationInitiator, GuideState};
use delivery_guides::services::{
    AssignmentService, CancellationService, CourierGateway, GuideService, IncidentService,
    Resolution,
};
use delivery_guides::AppError;

fn dec(value: i64, scale: u32) -> Decimal {
    Decimal::new(value, scale)
}

#[tokio::test]
async fn test_assign_with_active_contract() {
    let h = harness().await;
    let guide = h.created_guide(STRICT_BUSINESS).await;

    let assigned = AssignmentService::new(h.ctx.clone())
        .assign(guide.id, COURIER_A, COORDINATOR, Some("entregar en la mañana"))
        .await
        .unwrap();

    assert_eq!(assigned.current_state, GuideState::Asignada);
    assert_eq!(assigned.courier_id, Some(COURIER_A));
    assert_eq!(assigned.coordinator_id, Some(COORDINATOR));
    assert_eq!(assigned.courier_commission, Some(dec(3000, 2)));
    assert!(!assigned.assignment_accepted);
    assert!(assigned.assignment_date.is_some());

    let stored = h.store.guide(guide.id).await.unwrap();
    assert_eq!(stored, assigned);
}

#[tokio::test]
async fn test_assign_without_contract_leaves_guide_untouched() {
    let h = harness().await;
    let guide = h.created_guide(STRICT_BUSINESS).await;

    let err = AssignmentService::new(h.ctx.clone())
        .assign(guide.id, COURIER_WITHOUT_CONTRACT, COORDINATOR, None)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NoActiveContract { courier_id: COURIER_WITHOUT_CONTRACT }));
    let stored = h.store.guide(guide.id).await.unwrap();
    assert_eq!(stored.current_state, GuideState::Creada);
    assert_eq!(stored.courier_id, None);
    assert_eq!(h.store.history(guide.id).await.len(), 1);
}

#[tokio::test]
async fn test_assign_rejects_ineligible_users() {
    let h = harness().await;
    let guide = h.created_guide(STRICT_BUSINESS).await;
    let service = AssignmentService::new(h.ctx.clone());

    let inactive = service
        .assign(guide.id, INACTIVE_COURIER, COORDINATOR, None)
        .await
        .unwrap_err();
    assert!(matches!(inactive, AppError::CourierIneligible(_)));

    let not_a_courier = service
        .assign(guide.id, BUSINESS_USER, COORDINATOR, None)
        .await
        .unwrap_err();
    assert!(matches!(not_a_courier, AppError::CourierIneligible(_)));

    let not_a_coordinator = service
        .assign(guide.id, COURIER_A, COURIER_B, None)
        .await
        .unwrap_err();
    assert!(matches!(not_a_coordinator, AppError::Forbidden(_)));

    let missing = service.assign(999, COURIER_A, COORDINATOR, None).await.unwrap_err();
    assert!(matches!(missing, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_reject_returns_guide_to_created() {
    let h = harness().await;
    let guide = h.created_guide(STRICT_BUSINESS).await;
    AssignmentService::new(h.ctx.clone())
        .assign(guide.id, COURIER_A, COORDINATOR, None)
        .await
        .unwrap();

    let rejected = CourierGateway::new(h.ctx.clone())
        .reject(guide.id, COURIER_A, "wrong zone")
        .await
        .unwrap();

    assert_eq!(rejected.current_state, GuideState::Creada);
    assert_eq!(rejected.courier_id, None);
    assert_eq!(rejected.courier_commission, None);
    assert!(!rejected.assignment_accepted);
    assert_eq!(rejected.coordinator_id, Some(COORDINATOR));

    let history = h.store.history(guide.id).await;
    assert!(history.last().unwrap().observation.contains("wrong zone"));
}

#[tokio::test]
async fn test_accept_twice_and_reject_after_accept() {
    let h = harness().await;
    let guide = h.created_guide(STRICT_BUSINESS).await;
    AssignmentService::new(h.ctx.clone())
        .assign(guide.id, COURIER_A, COORDINATOR, None)
        .await
        .unwrap();
    let gateway = CourierGateway::new(h.ctx.clone());

    let accepted = gateway.accept(guide.id, COURIER_A, None).await.unwrap();
    assert!(accepted.assignment_accepted);
    assert!(accepted.accepted_at.is_some());
    assert_eq!(accepted.current_state, GuideState::Asignada);

    let again = gateway.accept(guide.id, COURIER_A, None).await.unwrap_err();
    assert!(matches!(again, AppError::AlreadyAccepted { .. }));

    let reject = gateway.reject(guide.id, COURIER_A, "too far").await.unwrap_err();
    assert!(matches!(reject, AppError::AlreadyAccepted { .. }));
}

#[tokio::test]
async fn test_only_assigned_courier_can_act() {
    let h = harness().await;
    let guide = h.created_guide(STRICT_BUSINESS).await;
    AssignmentService::new(h.ctx.clone())
        .assign(guide.id, COURIER_A, COORDINATOR, None)
        .await
        .unwrap();

    let err = CourierGateway::new(h.ctx.clone())
        .accept(guide.id, COURIER_B, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn test_pickup_requires_acceptance() {
    let h = harness().await;
    let guide = h.created_guide(STRICT_BUSINESS).await;
    AssignmentService::new(h.ctx.clone())
        .assign(guide.id, COURIER_A, COORDINATOR, None)
        .await
        .unwrap();

    let err = CourierGateway::new(h.ctx.clone())
        .mark_picked_up(guide.id, COURIER_A, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidGuideState { current: GuideState::Asignada, .. }));
}

#[tokio::test]
async fn test_full_delivery_history_is_ordered() {
    let h = harness().await;
    let guide = h.created_guide(STRICT_BUSINESS).await;
    let gateway = CourierGateway::new(h.ctx.clone());

    AssignmentService::new(h.ctx.clone())
        .assign(guide.id, COURIER_A, COORDINATOR, None)
        .await
        .unwrap();
    gateway.accept(guide.id, COURIER_A, None).await.unwrap();
    gateway.mark_picked_up(guide.id, COURIER_A, Some("caja sellada")).await.unwrap();
    gateway.mark_in_transit(guide.id, COURIER_A, None).await.unwrap();
    let delivered = gateway.mark_delivered(guide.id, COURIER_A, None).await.unwrap();

    assert_eq!(delivered.current_state, GuideState::Entregada);
    assert!(delivered.pickup_date.is_some());
    assert!(delivered.delivery_date.is_some());

    let history = GuideService::new(h.ctx.clone()).history(guide.id).await.unwrap();
    let states: Vec<GuideState> = history.iter().map(|h| h.state).collect();
    assert_eq!(
        states,
        vec![
            GuideState::Creada,
            GuideState::Asignada,
            GuideState::Asignada,
            GuideState::Recogida,
            GuideState::EnRuta,
            GuideState::Entregada,
        ]
    );
    assert!(history.windows(2).all(|w| w[0].created_at <= w[1].created_at));

    let late = gateway.mark_in_transit(guide.id, COURIER_A, None).await.unwrap_err();
    assert!(matches!(
        late,
        AppError::InvalidStateTransition { from: GuideState::Entregada, to: GuideState::EnRuta }
    ));
}

#[tokio::test]
async fn test_business_cancellation_with_exhausted_allowance() {
    let h = harness().await;
    let guide = h.created_guide(STRICT_BUSINESS).await;
    AssignmentService::new(h.ctx.clone())
        .assign(guide.id, COURIER_A, COORDINATOR, None)
        .await
        .unwrap();

    let (cancellation, cancelled) = CancellationService::new(h.ctx.clone())
        .cancel(guide.id, BUSINESS_CANCELLATION, "pedido duplicado", BUSINESS_USER, Some("llamar"))
        .await
        .unwrap();

    assert_eq!(cancellation.initiator, CancellationInitiator::Negocio);
    assert_eq!(cancellation.penalty_amount, dec(450, 2));
    assert_eq!(cancellation.courier_payment, dec(450, 2));
    assert_eq!(cancelled.current_state, GuideState::Cancelada);
    assert!(cancelled.cancellation_date.is_some());
    let observations = cancelled.observations.unwrap();
    assert!(observations.contains("pedido duplicado"));
    assert!(observations.contains("llamar"));

    let stored = GuideService::new(h.ctx.clone()).cancellation(guide.id).await.unwrap();
    assert_eq!(stored, cancellation);
}

#[tokio::test]
async fn test_free_cancellations_are_consumed_before_penalty() {
    let h = harness().await;
    let service = CancellationService::new(h.ctx.clone());
    let assignments = AssignmentService::new(h.ctx.clone());

    let mut penalties = Vec::new();
    for _ in 0..3 {
        let guide = h.created_guide(LOYAL_BUSINESS).await;
        assignments.assign(guide.id, COURIER_A, COORDINATOR, None).await.unwrap();
        let (cancellation, _) = service
            .cancel(guide.id, BUSINESS_CANCELLATION, "sin stock", BUSINESS_USER, None)
            .await
            .unwrap();
        penalties.push(cancellation.penalty_amount);
    }

    // 100.00 con 10% de descuento -> 90.00; comisión 27.00; penalización 20%
    assert_eq!(penalties, vec![Decimal::ZERO, Decimal::ZERO, dec(540, 2)]);
}

#[tokio::test]
async fn test_customer_cancellation_pays_full_commission() {
    let h = harness().await;
    let guide = h.created_guide(STRICT_BUSINESS).await;
    AssignmentService::new(h.ctx.clone())
        .assign(guide.id, COURIER_B, COORDINATOR, None)
        .await
        .unwrap();

    let (cancellation, _) = CancellationService::new(h.ctx.clone())
        .cancel(guide.id, CUSTOMER_CANCELLATION, "cliente ausente", BUSINESS_USER, None)
        .await
        .unwrap();

    assert_eq!(cancellation.penalty_amount, Decimal::ZERO);
    assert_eq!(cancellation.courier_payment, dec(2500, 2));
}

#[tokio::test]
async fn test_cancel_after_pickup_and_twice() {
    let h = harness().await;
    let service = CancellationService::new(h.ctx.clone());
    let gateway = CourierGateway::new(h.ctx.clone());

    let picked = h.created_guide(PLAIN_BUSINESS).await;
    AssignmentService::new(h.ctx.clone())
        .assign(picked.id, COURIER_A, COORDINATOR, None)
        .await
        .unwrap();
    gateway.accept(picked.id, COURIER_A, None).await.unwrap();
    gateway.mark_picked_up(picked.id, COURIER_A, None).await.unwrap();

    let err = service
        .cancel(picked.id, BUSINESS_CANCELLATION, "ya no", BUSINESS_USER, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::CannotCancelAfterPickup { .. }));

    let created = h.created_guide(PLAIN_BUSINESS).await;
    let (cancellation, _) = service
        .cancel(created.id, BUSINESS_CANCELLATION, "ya no", BUSINESS_USER, None)
        .await
        .unwrap();
    assert_eq!(cancellation.penalty_amount, Decimal::ZERO);

    let again = service
        .cancel(created.id, BUSINESS_CANCELLATION, "ya no", BUSINESS_USER, None)
        .await
        .unwrap_err();
    assert!(matches!(again, AppError::AlreadyCancelled { .. }));
}

#[tokio::test]
async fn test_incident_reported_and_resolved_with_reschedule() {
    let h = harness().await;
    let guide = h.created_guide(STRICT_BUSINESS).await;
    let gateway = CourierGateway::new(h.ctx.clone());
    let incidents = IncidentService::new(h.ctx.clone());

    AssignmentService::new(h.ctx.clone())
        .assign(guide.id, COURIER_A, COORDINATOR, None)
        .await
        .unwrap();
    gateway.accept(guide.id, COURIER_A, None).await.unwrap();
    gateway.mark_picked_up(guide.id, COURIER_A, None).await.unwrap();
    gateway.mark_in_transit(guide.id, COURIER_A, None).await.unwrap();

    let (incident, in_incident) = incidents
        .report(guide.id, ADDRESS_INCIDENT, "dirección no existe", COURIER_A)
        .await
        .unwrap();
    assert_eq!(in_incident.current_state, GuideState::Incidencia);
    assert!(!incident.resolved);

    let (resolved, guide_after) = incidents
        .resolve(
            incident.id,
            Resolution {
                resolution: "nueva dirección confirmada".to_string(),
                new_courier_id: None,
                reschedule: true,
            },
            COORDINATOR,
        )
        .await
        .unwrap();

    assert!(resolved.resolved);
    assert_eq!(resolved.resolved_by, Some(COORDINATOR));
    assert_eq!(guide_after.current_state, GuideState::Asignada);

    let again = incidents
        .resolve(
            incident.id,
            Resolution { resolution: "otra vez".to_string(), ..Default::default() },
            COORDINATOR,
        )
        .await
        .unwrap_err();
    assert!(matches!(again, AppError::AlreadyResolved { .. }));
}

#[tokio::test]
async fn test_guide_stays_in_incident_while_others_are_open() {
    let h = harness().await;
    let guide = h.created_guide(STRICT_BUSINESS).await;
    let incidents = IncidentService::new(h.ctx.clone());
    AssignmentService::new(h.ctx.clone())
        .assign(guide.id, COURIER_A, COORDINATOR, None)
        .await
        .unwrap();

    let (first, _) = incidents
        .report(guide.id, ADDRESS_INCIDENT, "portería cerrada", COURIER_A)
        .await
        .unwrap();
    let (second, still) = incidents
        .report(guide.id, ADDRESS_INCIDENT, "teléfono apagado", COURIER_A)
        .await
        .unwrap();
    assert_eq!(still.current_state, GuideState::Incidencia);

    let (_, after_first) = incidents
        .resolve(
            first.id,
            Resolution { resolution: "portero avisado".to_string(), ..Default::default() },
            COORDINATOR,
        )
        .await
        .unwrap();
    assert_eq!(after_first.current_state, GuideState::Incidencia);

    let (_, after_second) = incidents
        .resolve(
            second.id,
            Resolution {
                resolution: "otro mensajero".to_string(),
                new_courier_id: Some(COURIER_B),
                reschedule: false,
            },
            COORDINATOR,
        )
        .await
        .unwrap();
    assert_eq!(after_second.current_state, GuideState::Asignada);
    assert_eq!(after_second.courier_id, Some(COURIER_B));
    assert_eq!(after_second.courier_commission, Some(dec(2500, 2)));
    assert!(!after_second.assignment_accepted);

    let listed = incidents.list_for_guide(guide.id).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|i| i.resolved));
}

#[tokio::test]
async fn test_reschedule_returns_guide_to_assigned_with_other_incidents_open() {
    let h = harness().await;
    let guide = h.created_guide(STRICT_BUSINESS).await;
    let incidents = IncidentService::new(h.ctx.clone());
    AssignmentService::new(h.ctx.clone())
        .assign(guide.id, COURIER_A, COORDINATOR, None)
        .await
        .unwrap();

    let (first, _) = incidents
        .report(guide.id, ADDRESS_INCIDENT, "portería cerrada", COURIER_A)
        .await
        .unwrap();
    let (second, _) = incidents
        .report(guide.id, ADDRESS_INCIDENT, "teléfono apagado", COURIER_A)
        .await
        .unwrap();

    let (_, rescheduled) = incidents
        .resolve(
            first.id,
            Resolution {
                resolution: "entrega mañana".to_string(),
                new_courier_id: None,
                reschedule: true,
            },
            COORDINATOR,
        )
        .await
        .unwrap();
    assert_eq!(rescheduled.current_state, GuideState::Asignada);
    assert_eq!(rescheduled.courier_id, Some(COURIER_A));

    let listed = incidents.list_for_guide(guide.id).await.unwrap();
    let still_open: Vec<i64> = listed.iter().filter(|i| !i.resolved).map(|i| i.id).collect();
    assert_eq!(still_open, vec![second.id]);

    let history = h.store.history(guide.id).await;
    let last = history.last().unwrap();
    assert_eq!(last.state, GuideState::Asignada);
    assert!(last.observation.contains("reprogramada"));
}

#[tokio::test]
async fn test_courier_cannot_progress_while_in_incident() {
    let h = harness().await;
    let guide = h.created_guide(STRICT_BUSINESS).await;
    let gateway = CourierGateway::new(h.ctx.clone());
    let incidents = IncidentService::new(h.ctx.clone());

    AssignmentService::new(h.ctx.clone())
        .assign(guide.id, COURIER_A, COORDINATOR, None)
        .await
        .unwrap();
    gateway.accept(guide.id, COURIER_A, None).await.unwrap();
    gateway.mark_picked_up(guide.id, COURIER_A, None).await.unwrap();
    gateway.mark_in_transit(guide.id, COURIER_A, None).await.unwrap();
    let (incident, _) = incidents
        .report(guide.id, ADDRESS_INCIDENT, "cliente no responde", COURIER_A)
        .await
        .unwrap();

    let delivered = gateway.mark_delivered(guide.id, COURIER_A, None).await.unwrap_err();
    assert!(matches!(
        delivered,
        AppError::InvalidGuideState { current: GuideState::Incidencia, .. }
    ));
    let in_transit = gateway.mark_in_transit(guide.id, COURIER_A, None).await.unwrap_err();
    assert!(matches!(
        in_transit,
        AppError::InvalidGuideState { current: GuideState::Incidencia, .. }
    ));
    assert_eq!(h.store.guide(guide.id).await.unwrap().current_state, GuideState::Incidencia);

    let (_, resolved) = incidents
        .resolve(
            incident.id,
            Resolution { resolution: "cliente contactado".to_string(), ..Default::default() },
            COORDINATOR,
        )
        .await
        .unwrap();
    assert_eq!(resolved.current_state, GuideState::Asignada);

    gateway.mark_picked_up(guide.id, COURIER_A, None).await.unwrap();
    gateway.mark_in_transit(guide.id, COURIER_A, None).await.unwrap();
    let delivered = gateway.mark_delivered(guide.id, COURIER_A, None).await.unwrap();
    assert_eq!(delivered.current_state, GuideState::Entregada);
}

#[tokio::test]
async fn test_reassign_from_incident_and_same_courier() {
    let h = harness().await;
    let guide = h.created_guide(STRICT_BUSINESS).await;
    let assignments = AssignmentService::new(h.ctx.clone());
    assignments.assign(guide.id, COURIER_A, COORDINATOR, None).await.unwrap();

    let same = assignments
        .reassign(guide.id, COURIER_A, "rotación", COORDINATOR)
        .await
        .unwrap_err();
    assert!(matches!(same, AppError::Validation(_)));

    IncidentService::new(h.ctx.clone())
        .report(guide.id, ADDRESS_INCIDENT, "moto averiada", COURIER_A)
        .await
        .unwrap();

    let reassigned = assignments
        .reassign(guide.id, COURIER_B, "moto averiada", COORDINATOR)
        .await
        .unwrap();
    assert_eq!(reassigned.current_state, GuideState::Asignada);
    assert_eq!(reassigned.courier_id, Some(COURIER_B));
    assert_eq!(reassigned.courier_commission, Some(dec(2500, 2)));

    let history = h.store.history(guide.id).await;
    let last = history.last().unwrap();
    assert!(last.observation.contains(&format!("#{}", COURIER_A)));
    assert!(last.observation.contains(&format!("#{}", COURIER_B)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_assign_has_single_winner() {
    let h = harness().await;
    let guide = h.created_guide(STRICT_BUSINESS).await;
    let first = AssignmentService::new(h.ctx.clone());
    let second = AssignmentService::new(h.ctx.clone());

    let (a, b) = futures::join!(
        first.assign(guide.id, COURIER_A, COORDINATOR, None),
        second.assign(guide.id, COURIER_B, COORDINATOR, None),
    );

    let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(successes, 1);
    let loser = if a.is_ok() { b.unwrap_err() } else { a.unwrap_err() };
    assert!(matches!(loser, AppError::InvalidGuideState { current: GuideState::Asignada, .. }));

    let assigned_history = h
        .store
        .history(guide.id)
        .await
        .into_iter()
        .filter(|e| e.state == GuideState::Asignada)
        .count();
    assert_eq!(assigned_history, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 3)]
async fn test_concurrent_business_cancellations_share_the_allowance() {
    let h = harness().await;
    let assignments = AssignmentService::new(h.ctx.clone());

    let mut guides = Vec::new();
    for _ in 0..3 {
        let guide = h.created_guide(LOYAL_BUSINESS).await;
        assignments.assign(guide.id, COURIER_A, COORDINATOR, None).await.unwrap();
        guides.push(guide.id);
    }

    let first = CancellationService::new(h.ctx.clone());
    let second = CancellationService::new(h.ctx.clone());
    let third = CancellationService::new(h.ctx.clone());
    let (a, b, c) = futures::join!(
        first.cancel(guides[0], BUSINESS_CANCELLATION, "sin stock", BUSINESS_USER, None),
        second.cancel(guides[1], BUSINESS_CANCELLATION, "sin stock", BUSINESS_USER, None),
        third.cancel(guides[2], BUSINESS_CANCELLATION, "sin stock", BUSINESS_USER, None),
    );

    let mut penalties: Vec<Decimal> = [a, b, c]
        .into_iter()
        .map(|result| result.unwrap().0.penalty_amount)
        .collect();
    penalties.sort();

    // Dos cancelaciones gratuitas al mes; la tercera paga 20% de 27.00
    assert_eq!(penalties, vec![Decimal::ZERO, Decimal::ZERO, dec(540, 2)]);
}

#[tokio::test]
async fn test_notifier_failure_does_not_fail_operations() {
    let h = harness_with(Arc::new(BrokenNotifier)).await;
    let guide = h.created_guide(STRICT_BUSINESS).await;

    let assigned = AssignmentService::new(h.ctx.clone())
        .assign(guide.id, COURIER_A, COORDINATOR, None)
        .await
        .unwrap();
    assert_eq!(assigned.current_state, GuideState::Asignada);

    let rejected = CourierGateway::new(h.ctx.clone())
        .reject(guide.id, COURIER_A, "fuera de zona")
        .await
        .unwrap();
    assert_eq!(rejected.current_state, GuideState::Creada);
}

#[tokio::test]
async fn test_create_applies_loyalty_discount() {
    let h = harness().await;
    let service = GuideService::new(h.ctx.clone());

    let guide = service
        .create(new_guide(LOYAL_BUSINESS, dec(10000, 2)), BUSINESS_USER)
        .await
        .unwrap();
    assert_eq!(guide.base_price, dec(9000, 2));
    assert_eq!(guide.current_state, GuideState::Creada);
    assert!(guide.guide_number.starts_with("GU-"));

    let mut bad_phone = new_guide(PLAIN_BUSINESS, dec(100, 0));
    bad_phone.recipient_phone = "llámame".to_string();
    assert!(matches!(
        service.create(bad_phone, BUSINESS_USER).await.unwrap_err(),
        AppError::Validation(_)
    ));

    let missing = service.create(new_guide(999, dec(100, 0)), BUSINESS_USER).await.unwrap_err();
    assert!(matches!(missing, AppError::NotFound(_)));
}
