use chrono::{Duration, Utc};
use common::{AggregateId, BuyerId, DisputeNumber, SellerId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::DomainEvent;
use domain::dispute::{DisputeEvent, DisputeKind, DisputePriority};
use event_store::{StoredEvent, Version};
use projections::{DisputeQueueView, Projection};

fn opened_event(index: usize) -> StoredEvent {
    let dispute_id = AggregateId::new();
    let opened_at = Utc::now();
    let event = DisputeEvent::DisputeOpened {
        dispute_id,
        dispute_number: DisputeNumber::from_generated(format!("DSP-20260823-{index:06X}")),
        order_id: AggregateId::new(),
        buyer_id: BuyerId::new(),
        seller_id: SellerId::new(),
        kind: DisputeKind::Refund,
        reason: "never arrived".to_string(),
        description: "no scans".to_string(),
        priority: DisputePriority::Medium,
        response_deadline: opened_at + Duration::days(7),
        opened_at,
    };
    StoredEvent::new(dispute_id, "Dispute", event.event_type(), Version::first(), &event).unwrap()
}

fn bench_dispute_queue_ingest(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let events: Vec<_> = (0..500).map(opened_event).collect();

    c.bench_function("dispute_queue_ingest_500", |b| {
        b.to_async(&runtime).iter(|| async {
            let view = DisputeQueueView::new();
            for event in &events {
                view.handle(event).await.unwrap();
            }
            view.action_items().await.len()
        });
    });
}

fn bench_dispute_queue_overdue_scan(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let view = DisputeQueueView::new();
    runtime.block_on(async {
        for event in (0..500).map(opened_event) {
            view.handle(&event).await.unwrap();
        }
    });

    c.bench_function("dispute_queue_overdue_scan", |b| {
        b.to_async(&runtime)
            .iter(|| async { view.overdue(Utc::now() + Duration::days(30)).await.len() });
    });
}

criterion_group!(benches, bench_dispute_queue_ingest, bench_dispute_queue_overdue_scan);
criterion_main!(benches);
