use std::sync::Arc;
use std::time::Duration;

use tokio_test::{assert_err, assert_ok};
use tokio_util::sync::CancellationToken;

use airquality_sensorflow::poller::{BatchSummary, Poller, PollerSettings, StatusSnapshot};
use airquality_sensorflow::report::REPORT_MARKER;
use airquality_sensorflow::store::{MemoryStore, Store};
use airquality_sensorflow::transport::InboundMessage;
use airquality_sensorflow::QualityState;

mod common;
use common::*;

fn settings() -> PollerSettings {
    PollerSettings {
        source_chat_id: SOURCE_CHAT,
        marker: REPORT_MARKER.to_string(),
        interval: Duration::from_millis(10),
    }
}

fn poller(transport: &Arc<FakeTransport>, store: &Arc<MemoryStore>) -> Poller {
    Poller::new(transport.clone(), store.clone(), settings())
}

#[tokio::test]
async fn report_from_source_chat_is_stored() {
    // ---
    let transport = Arc::new(FakeTransport::scripted(vec![Ok(vec![report(
        7,
        &measurements(40.0, 800.0),
    )])]));
    let store = Arc::new(MemoryStore::new());
    let mut poller = poller(&transport, &store);

    let summary = assert_ok!(poller.poll_once().await);
    assert_eq!(summary, BatchSummary { fetched: 1, stored: 1 });
    assert_eq!(poller.cursor(), Some(8));
    assert_eq!(
        poller.status().snapshot(),
        StatusSnapshot {
            connected: true,
            processed_count: 1
        }
    );

    let reading = store.latest_reading().await.unwrap().unwrap();
    assert_eq!(reading.measurements, measurements(40.0, 800.0));
    assert_eq!(reading.state, QualityState::Bad);

    let alerts = store.query_alerts(epoch()).await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].variable, "PM2.5");
    assert_eq!(alerts[0].reading_id, reading.id);

    // The next fetch asks for messages after the one just consumed.
    assert_ok!(poller.poll_once().await);
    assert_eq!(transport.offsets(), vec![None, Some(8)]);
}

#[tokio::test]
async fn unparseable_message_is_skipped_but_consumed() {
    // ---
    let missing_tvoc = format!(
        "{REPORT_MARKER}\nTemp: 25.3 Humidity: 48.0 CO2: 650 PM2.5: 12.1 PM10: 20.0"
    );
    let transport = Arc::new(FakeTransport::scripted(vec![Ok(vec![message(
        11,
        SOURCE_CHAT,
        &missing_tvoc,
    )])]));
    let store = Arc::new(MemoryStore::new());
    let mut poller = poller(&transport, &store);

    let summary = assert_ok!(poller.poll_once().await);
    assert_eq!(summary, BatchSummary { fetched: 1, stored: 0 });
    assert_eq!(poller.cursor(), Some(12));
    assert_eq!(poller.status().snapshot().processed_count, 0);
    assert!(store.latest_reading().await.unwrap().is_none());
}

#[tokio::test]
async fn foreign_and_unmarked_messages_are_ignored() {
    // ---
    let m = measurements(10.0, 700.0);
    let from_elsewhere = InboundMessage {
        chat_id: Some(OTHER_CHAT),
        ..report(20, &m)
    };
    let unmarked = message(21, SOURCE_CHAT, "Temp: 25.3 Humidity: 48.0 CO2: 650 PM2.5: 12.1 PM10: 20.0 TVOC: 85");
    let no_text = InboundMessage {
        id: 22,
        chat_id: None,
        text: None,
    };

    let transport = Arc::new(FakeTransport::scripted(vec![Ok(vec![from_elsewhere, unmarked, no_text])]));
    let store = Arc::new(MemoryStore::new());
    let mut poller = poller(&transport, &store);

    let summary = assert_ok!(poller.poll_once().await);
    assert_eq!(summary, BatchSummary { fetched: 3, stored: 0 });
    assert_eq!(poller.cursor(), Some(23));
    assert!(store.latest_reading().await.unwrap().is_none());
}

#[tokio::test]
async fn transport_error_flips_connectivity_and_keeps_cursor() {
    // ---
    let transport = Arc::new(FakeTransport::scripted(vec![
        Ok(vec![report(3, &measurements(10.0, 700.0))]),
        Err(transport_down()),
        Ok(vec![report(4, &measurements(20.0, 950.0))]),
    ]));
    let store = Arc::new(MemoryStore::new());
    let mut poller = poller(&transport, &store);

    assert_ok!(poller.poll_once().await);
    assert!(poller.status().snapshot().connected);

    assert_err!(poller.poll_once().await);
    assert!(!poller.status().snapshot().connected);
    assert_eq!(poller.cursor(), Some(4));

    assert_ok!(poller.poll_once().await);
    assert_eq!(
        poller.status().snapshot(),
        StatusSnapshot {
            connected: true,
            processed_count: 2
        }
    );
    assert_eq!(transport.offsets(), vec![None, Some(4), Some(4)]);

    let latest = store.latest_reading().await.unwrap().unwrap();
    assert_eq!(latest.state, QualityState::Regular);
}

#[tokio::test]
async fn cursor_never_decreases() {
    // ---
    let m = measurements(10.0, 700.0);
    let transport = Arc::new(FakeTransport::scripted(vec![
        Ok(vec![report(12, &m), report(10, &m), report(11, &m)]),
        Ok(vec![]),
        Err(transport_down()),
        // Replayed ids below the cursor must not move it back or be stored twice.
        Ok(vec![report(5, &m), report(12, &m), report(13, &m)]),
        Ok(vec![]),
    ]));
    let store = Arc::new(MemoryStore::new());
    let mut poller = poller(&transport, &store);

    let mut last = poller.cursor();
    for _ in 0..5 {
        let _ = poller.poll_once().await;
        assert!(poller.cursor() >= last, "{:?} < {:?}", poller.cursor(), last);
        last = poller.cursor();
    }

    assert_eq!(poller.cursor(), Some(14));
    assert_eq!(poller.status().snapshot().processed_count, 4);
    assert_eq!(store.query_readings(epoch()).await.unwrap().len(), 4);
}

#[tokio::test]
async fn store_failure_skips_only_that_message() {
    // ---
    let transport = Arc::new(FakeTransport::scripted(vec![Ok(vec![
        report(1, &measurements(10.0, 700.0)),
        report(2, &measurements(20.0, 700.0)),
    ])]));
    let store = Arc::new(FlakyStore::failing_first(1));
    let mut poller = Poller::new(transport.clone(), store.clone(), settings());

    let summary = assert_ok!(poller.poll_once().await);
    assert_eq!(summary, BatchSummary { fetched: 2, stored: 1 });
    assert_eq!(poller.cursor(), Some(3));

    let readings = store.query_readings(epoch()).await.unwrap();
    assert_eq!(readings.len(), 1);
    assert_eq!(readings[0].measurements.pm25, 20.0);
}

#[tokio::test]
async fn run_stops_on_cancel() {
    // ---
    let transport = Arc::new(FakeTransport::scripted(vec![Ok(vec![report(
        1,
        &measurements(10.0, 700.0),
    )])]));
    let store = Arc::new(MemoryStore::new());
    let mut slow = settings();
    slow.interval = Duration::from_secs(3600);
    let poller = Poller::new(transport.clone(), store.clone(), slow);
    let status = poller.status();

    let cancel = CancellationToken::new();
    let handle = tokio::spawn(poller.run(cancel.clone()));

    // Wait for the first batch to be drained, then cancel during the sleep.
    for _ in 0..200 {
        if status.snapshot().processed_count == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(status.snapshot().processed_count, 1);

    cancel.cancel();
    let joined = tokio::time::timeout(Duration::from_secs(5), handle).await;
    assert!(matches!(joined, Ok(Ok(()))));
    assert_eq!(transport.offsets().len(), 1);
}

#[tokio::test]
async fn run_does_nothing_when_already_cancelled() {
    // ---
    let transport = Arc::new(FakeTransport::default());
    let store = Arc::new(MemoryStore::new());
    let poller = poller(&transport, &store);

    let cancel = CancellationToken::new();
    cancel.cancel();
    poller.run(cancel).await;

    assert!(transport.offsets().is_empty());
}

#[tokio::test]
async fn run_keeps_polling_after_transport_error() {
    // ---
    let transport = Arc::new(FakeTransport::scripted(vec![
        Err(transport_down()),
        Ok(vec![report(9, &measurements(10.0, 700.0))]),
    ]));
    let store = Arc::new(MemoryStore::new());
    let poller = poller(&transport, &store);
    let status = poller.status();

    let cancel = CancellationToken::new();
    let handle = tokio::spawn(poller.run(cancel.clone()));

    for _ in 0..200 {
        if status.snapshot().processed_count == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cancel.cancel();
    let joined = tokio::time::timeout(Duration::from_secs(5), handle).await;
    assert!(matches!(joined, Ok(Ok(()))));

    assert_eq!(
        status.snapshot(),
        StatusSnapshot {
            connected: true,
            processed_count: 1
        }
    );
    assert_eq!(transport.offsets()[..2], [None, None]);
    assert_eq!(assert_ok!(store.query_readings(epoch()).await).len(), 1);
}
