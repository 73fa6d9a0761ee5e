use chrono::{Duration, Utc};
use common::{AggregateId, SellerId, TrackingNumber};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::Aggregate;
use domain::shipment::{Shipment, ShipmentEvent, ShipmentService, ShipmentStatus, TrackingEvent};
use event_store::InMemoryEventStore;

fn bench_record_tracking(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let service = ShipmentService::new(InMemoryEventStore::new());
    let shipment_id = AggregateId::new();
    rt.block_on(async {
        service
            .open_shipment(
                shipment_id,
                TrackingNumber::parse("SHP-BENCH-1").unwrap(),
                AggregateId::new(),
                SellerId::new(),
                None,
                None,
                None,
            )
            .await
            .unwrap();
    });

    c.bench_function("domain/record_tracking", |b| {
        b.iter(|| {
            rt.block_on(async {
                service
                    .record_tracking(
                        shipment_id,
                        ShipmentStatus::InTransit,
                        "Hub".to_string(),
                        "scan".to_string(),
                        None,
                        None,
                        Utc::now(),
                    )
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_shipment_replay(c: &mut Criterion) {
    let start = Utc::now();
    let mut events = vec![ShipmentEvent::ShipmentOpened {
        shipment_id: AggregateId::new(),
        tracking_number: TrackingNumber::parse("SHP-BENCH-2").unwrap(),
        order_id: AggregateId::new(),
        seller_id: SellerId::new(),
        courier: None,
        package: None,
        estimated_delivery: None,
        opened_at: start,
    }];
    for i in 0..1_000 {
        events.push(ShipmentEvent::TrackingRecorded {
            entry: TrackingEvent::new(
                ShipmentStatus::InTransit,
                format!("Hub {i}"),
                "scan",
                None,
                None,
                start + Duration::minutes(i),
            ),
        });
    }

    c.bench_function("domain/replay_1000_scans", |b| {
        b.iter(|| {
            let mut shipment = Shipment::default();
            shipment.apply_events(events.iter().cloned());
            assert_eq!(shipment.history().len(), 1_000);
        });
    });
}

criterion_group!(benches, bench_record_tracking, bench_shipment_replay);
criterion_main!(benches);
