use chrono::Duration;
use recall_core::model::{CardId, UserId};
use recall_core::time::fixed_now;
use services::{AppServices, Clock, ServicePolicies};
use storage::repository::Storage;

fn services_at(storage: &Storage, days: i64) -> AppServices {
    let clock = Clock::fixed(fixed_now() + Duration::days(days));
    AppServices::from_storage(storage.clone(), clock, ServicePolicies::default()).unwrap()
}

#[tokio::test]
async fn study_loop_moves_weak_cards_to_the_front() {
    let storage = Storage::in_memory();
    let alice = UserId::new("alice").unwrap();

    let day0 = services_at(&storage, 0);
    for (front, back) in [("hola", "hello"), ("gato", "cat"), ("perro", "dog")] {
        day0.card_service().add_card(front, back).await.unwrap();
    }

    // Day 0: everything is new, so the plan is the insertion order.
    let plan = day0.plans().plan_for_user(&alice).await.unwrap();
    assert_eq!(
        plan.card_ids(),
        vec![CardId::new(1), CardId::new(2), CardId::new(3)]
    );
    assert_eq!(plan.suggested_duration, 3);

    let recorder = day0.recorder();
    let mut session = recorder.start(alice.clone());
    for (id, correct, ms, performance) in [
        (1, true, 2_000, 0.9),
        (2, true, 3_000, 0.9),
        (3, false, 14_000, 0.2),
    ] {
        recorder.record(&mut session, CardId::new(id), correct, ms);
        day0.reviews()
            .review_card_persisted_by_id(CardId::new(id), storage.cards.as_ref(), performance)
            .await
            .unwrap();
    }
    recorder.finish(session).await.unwrap();

    // Day 1: only the failed card is due again, and it is the focus.
    let day1 = services_at(&storage, 1);
    let plan = day1.plans().plan_for_user(&alice).await.unwrap();
    assert_eq!(plan.card_ids(), vec![CardId::new(3)]);
    assert_eq!(plan.suggested_duration, 3);
    assert_eq!(
        plan.focus_areas,
        vec![
            "Consider reviewing basic concepts more thoroughly",
            "Practice quick recall with timed review sessions",
        ]
    );

    let report = day1.plans().analyze_user(&alice).await.unwrap();
    assert_eq!(report.strengths, vec![CardId::new(1), CardId::new(2)]);
    assert_eq!(report.weaknesses, vec![CardId::new(3)]);

    // Day 3: the strong cards come back, still behind the weak one.
    let day3 = services_at(&storage, 3);
    let plan = day3.plans().plan_for_user(&alice).await.unwrap();
    assert_eq!(
        plan.card_ids(),
        vec![CardId::new(3), CardId::new(1), CardId::new(2)]
    );

    let stats = day3.card_service().stats().await.unwrap();
    assert_eq!((stats.total, stats.due, stats.new), (3, 3, 0));
}

#[tokio::test]
async fn study_loop_persists_through_sqlite() {
    let storage = Storage::sqlite("sqlite:file:services_smoke?mode=memory&cache=shared")
        .await
        .unwrap();
    let services = services_at(&storage, 0);

    let card = services.card_service().add_card("Q", "A").await.unwrap();
    let reviewed = services
        .reviews()
        .review_card_persisted_by_id(card.id(), storage.cards.as_ref(), 1.0)
        .await
        .unwrap();

    let stored = services.card_service().get_card(card.id()).await.unwrap();
    assert_eq!(stored, reviewed.card);
    assert_eq!(stored.spaced_repetition().unwrap().interval(), 3);
}
