//! Sensor → Field Unit → Central Server over loopback.

use std::time::Duration;

use field_unit::{receive_on, ReceiveState};
use relay_e2e_tests::{field_unit, init_logging, run_sensor, CentralHarness};

const REPORT_DEADLINE: Duration = Duration::from_secs(5);

#[tokio::test]
async fn test_full_batch_reaches_central_complete() {
    init_logging();
    let central = CentralHarness::start().await.unwrap();
    let (unit, socket, addr) = field_unit(&central, "fu-full", 2, 2000).await.unwrap();

    let receiving = tokio::spawn(async move {
        let timeout = unit.config().timeout;
        let cycle = receive_on(&socket, timeout).await.unwrap();
        (unit, cycle)
    });
    let sent = run_sensor(addr, 5, vec![]).await.unwrap();
    assert_eq!(sent.sent, 5);

    let (unit, cycle) = receiving.await.unwrap();
    assert_eq!(cycle.state, ReceiveState::Complete);

    let summary = unit.process(cycle).await;
    assert_eq!(summary.series.len(), 5);
    assert_eq!(summary.relay.sent, 5);
    assert!(summary.relay.failed.is_empty());

    let reports = central.wait_for_reports(1, REPORT_DEADLINE).await;
    assert_eq!(reports.len(), 1);
    let report = &reports[0].report;
    assert_eq!(reports[0].sender, "fu-full");
    assert_eq!(report.gaps.received, 5);
    assert_eq!(report.gaps.missing_count, 0);
}

#[tokio::test]
async fn test_lost_datagram_reported_by_field_unit() {
    init_logging();
    let central = CentralHarness::start().await.unwrap();
    let (unit, socket, addr) = field_unit(&central, "fu-partial", 2, 300).await.unwrap();

    let receiving = tokio::spawn(async move {
        let timeout = unit.config().timeout;
        let cycle = receive_on(&socket, timeout).await.unwrap();
        (unit, cycle)
    });
    let sent = run_sensor(addr, 5, vec![3]).await.unwrap();
    assert_eq!(sent.skipped, vec![3]);

    let (unit, cycle) = receiving.await.unwrap();
    assert_eq!(cycle.state, ReceiveState::TimedOut);

    let summary = unit.process(cycle).await;
    let field_report = summary.report.unwrap();
    assert_eq!(field_report.gaps.missing, vec![3]);
    assert_eq!(field_report.gaps.missing_count, 1);

    // the relayed series covers what arrived, so the central batch is whole
    let reports = central.wait_for_reports(1, REPORT_DEADLINE).await;
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].report.gaps.expected, 4);
    assert_eq!(reports[0].report.gaps.missing_count, 0);
}

#[tokio::test]
async fn test_two_field_units_report_separately() {
    init_logging();
    let central = CentralHarness::start().await.unwrap();
    let (north, north_socket, north_addr) = field_unit(&central, "north", 3, 2000).await.unwrap();
    let (south, south_socket, south_addr) = field_unit(&central, "south", 3, 2000).await.unwrap();

    let north_task = tokio::spawn(async move {
        let cycle = receive_on(&north_socket, north.config().timeout).await.unwrap();
        north.process(cycle).await
    });
    let south_task = tokio::spawn(async move {
        let cycle = receive_on(&south_socket, south.config().timeout).await.unwrap();
        south.process(cycle).await
    });

    let (a, b) = tokio::join!(run_sensor(north_addr, 6, vec![]), run_sensor(south_addr, 4, vec![]));
    assert_eq!(a.unwrap().sent, 6);
    assert_eq!(b.unwrap().sent, 4);

    let north_summary = north_task.await.unwrap();
    let south_summary = south_task.await.unwrap();
    assert_eq!(north_summary.relay.sent, 6);
    assert_eq!(south_summary.relay.sent, 4);

    let mut reports = central.wait_for_reports(2, REPORT_DEADLINE).await;
    reports.sort_by(|x, y| x.sender.cmp(&y.sender));
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].sender, "north");
    assert_eq!(reports[0].report.gaps.received, 6);
    assert_eq!(reports[1].sender, "south");
    assert_eq!(reports[1].report.gaps.received, 4);
    assert!(reports.iter().all(|r| r.report.is_complete()));
}

#[tokio::test]
async fn test_run_cycle_binds_and_releases_port() {
    init_logging();
    let central = CentralHarness::start().await.unwrap();
    let (unit, socket, _addr) = field_unit(&central, "fu-idle", 7, 100).await.unwrap();
    drop(socket);

    // nothing sent: the cycle times out empty and relays nothing
    let summary = unit.run_cycle().await.unwrap();
    assert_eq!(summary.state, ReceiveState::TimedOut);
    assert!(summary.report.is_none());

    // the port is free again for the next cycle
    let summary = unit.run_cycle().await.unwrap();
    assert!(summary.series.is_empty());
}
