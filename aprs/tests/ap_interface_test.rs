//! End-to-end lifecycle tests over in-memory interface and process backends.

mod common;

use std::time::Duration;

use aprs::{ApError, EncryptionType, HostapdParams, HostapdState, Reply, ValidationError};
use common::{Behavior, Harness, IFACE, fast_timeouts};

fn wpa2_params() -> HostapdParams {
    HostapdParams::new("foobar", false, 6, EncryptionType::Wpa2, "super secret")
}

async fn create(h: &Harness) -> aprs::InterfaceHandle {
    match h.service.create_ap_interface().await {
        Reply::Success(Some(handle)) => handle,
        other => panic!("expected a new interface, got {other:?}"),
    }
}

#[tokio::test]
async fn can_create_ap_interfaces() {
    let h = Harness::new();
    h.gateway.force(IFACE, true);

    let handle = create(&h).await;
    assert_eq!(handle.name(), IFACE);
    assert!(!h.gateway.up(IFACE), "new interface must start down");

    let name = h.service.get_interface_name(&handle).await;
    assert_eq!(name.value().as_deref(), Some(IFACE));

    // Only one interface at a time
    assert!(matches!(
        h.service.create_ap_interface().await,
        Reply::Success(None)
    ));

    assert!(h.service.tear_down_interfaces().await.succeeded());
    assert!(!h.gateway.up(IFACE));
    assert!(h.manager().status().await.is_none());
}

#[tokio::test]
async fn can_start_stop_hostapd() {
    let h = Harness::new();
    let handle = create(&h).await;
    assert!(h.service.write_hostapd_config(&handle, &wpa2_params()).await.succeeded());

    for _ in 0..4 {
        assert!(h.service.start_hostapd(&handle).await.succeeded());
        assert!(h.gateway.up(IFACE));
        assert_eq!(h.launcher.alive(), 1);
        assert_eq!(
            h.manager().hostapd_state(&handle).await.unwrap(),
            HostapdState::Running
        );

        assert!(h.service.stop_hostapd(&handle).await.succeeded());
        assert!(!h.gateway.up(IFACE));
        assert_eq!(h.launcher.alive(), 0);
        assert_eq!(
            h.manager().hostapd_state(&handle).await.unwrap(),
            HostapdState::Stopped
        );
    }
    assert_eq!(h.launcher.launches(), 4);
}

#[tokio::test]
async fn can_write_hostapd_config() {
    let h = Harness::new();
    let handle = create(&h).await;

    let valid = HostapdParams::new("foobar", false, 2, EncryptionType::Wpa2, "super secret");
    assert!(h.service.write_hostapd_config(&handle, &valid).await.succeeded());
    let written = std::fs::read_to_string(h.config_path()).unwrap();
    assert!(written.contains("interface=wlan0\n"));
    assert!(written.contains("channel=2\n"));
    assert!(written.contains("wpa_passphrase=super secret\n"));

    let too_long = HostapdParams::new(vec![b'x'; 33], false, 2, EncryptionType::Wpa2, "super secret");
    let reply = h.service.write_hostapd_config(&handle, &too_long).await;
    assert!(reply.is_ok());
    assert!(!reply.succeeded());
    assert!(matches!(
        reply.error(),
        Some(ApError::Validation(ValidationError::SsidTooLong(33)))
    ));

    // The rejected write left the previous config alone
    assert_eq!(std::fs::read_to_string(h.config_path()).unwrap(), written);
}

#[tokio::test]
async fn invalid_first_write_creates_no_file() {
    let h = Harness::new();
    let handle = create(&h).await;

    let bad_channel = HostapdParams::new("foobar", false, 15, EncryptionType::Open, "");
    let reply = h.service.write_hostapd_config(&handle, &bad_channel).await;
    assert!(matches!(reply, Reply::Rejected(_)));
    assert!(!h.config_path().exists());

    // And hostapd refuses to start without one
    assert!(matches!(
        h.service.start_hostapd(&handle).await,
        Reply::Failed(ApError::NoConfig)
    ));
}

#[tokio::test]
async fn every_ssid_length_up_to_32_is_accepted() {
    let h = Harness::new();
    let handle = create(&h).await;

    for len in 1..=32 {
        let params = HostapdParams::new(vec![b'a'; len], false, 6, EncryptionType::Open, "");
        assert!(
            h.service.write_hostapd_config(&handle, &params).await.succeeded(),
            "ssid of {len} bytes rejected"
        );
    }
}

#[tokio::test]
async fn start_without_config_fails_without_launching() {
    let h = Harness::new();
    let handle = create(&h).await;

    let reply = h.service.start_hostapd(&handle).await;
    assert!(!reply.is_ok());
    assert!(matches!(reply.error(), Some(ApError::NoConfig)));
    assert_eq!(h.launcher.launches(), 0);
    assert!(!h.gateway.up(IFACE));
}

#[tokio::test]
async fn hostapd_crash_at_startup_is_rejected() {
    let h = Harness::new();
    let handle = create(&h).await;
    h.service.write_hostapd_config(&handle, &wpa2_params()).await;
    h.launcher.set_behavior(Behavior::ExitImmediately(1));

    let reply = h.service.start_hostapd(&handle).await;
    assert!(reply.is_ok());
    assert!(matches!(
        reply.error(),
        Some(ApError::ProcessExited(Some(1)))
    ));
    assert!(!h.gateway.up(IFACE));
    assert_eq!(
        h.manager().hostapd_state(&handle).await.unwrap(),
        HostapdState::Stopped
    );

    // A healthy retry still works
    h.launcher.set_behavior(Behavior::Healthy);
    assert!(h.service.start_hostapd(&handle).await.succeeded());
}

#[tokio::test]
async fn settle_delay_beyond_startup_timeout_times_out() {
    let h = Harness::with_timeouts(
        fast_timeouts()
            .with_startup_timeout(Duration::from_millis(50))
            .with_settle_delay(Duration::from_millis(500)),
    );
    let handle = create(&h).await;
    h.service.write_hostapd_config(&handle, &wpa2_params()).await;

    let reply = h.service.start_hostapd(&handle).await;
    assert!(matches!(reply, Reply::Rejected(ApError::StartupTimeout(_))));
    assert_eq!(h.launcher.alive(), 0);
    assert!(!h.gateway.up(IFACE));
}

#[tokio::test]
async fn interface_that_never_comes_up_kills_hostapd() {
    let h = Harness::new();
    let handle = create(&h).await;
    h.service.write_hostapd_config(&handle, &wpa2_params()).await;
    h.gateway.ignore_up(true);

    let reply = h.service.start_hostapd(&handle).await;
    assert!(matches!(reply, Reply::Rejected(ApError::InterfaceNotUp(_))));
    assert_eq!(h.launcher.launches(), 1);
    assert_eq!(h.launcher.alive(), 0);
}

#[tokio::test]
async fn stop_is_idempotent() {
    let h = Harness::new();
    let handle = create(&h).await;
    h.service.write_hostapd_config(&handle, &wpa2_params()).await;
    h.service.start_hostapd(&handle).await;

    assert!(h.service.stop_hostapd(&handle).await.succeeded());
    assert!(h.service.stop_hostapd(&handle).await.succeeded());
    assert!(!h.gateway.up(IFACE));
}

#[tokio::test]
async fn start_while_running_is_a_no_op() {
    let h = Harness::new();
    let handle = create(&h).await;
    h.service.write_hostapd_config(&handle, &wpa2_params()).await;

    assert!(h.service.start_hostapd(&handle).await.succeeded());
    assert!(h.service.start_hostapd(&handle).await.succeeded());
    assert_eq!(h.launcher.launches(), 1);
}

#[tokio::test]
async fn tear_down_stops_hostapd_and_invalidates_handles() {
    let h = Harness::new();
    let handle = create(&h).await;
    h.service.write_hostapd_config(&handle, &wpa2_params()).await;
    h.service.start_hostapd(&handle).await;

    assert!(h.service.tear_down_interfaces().await.succeeded());
    assert_eq!(h.launcher.alive(), 0);
    assert!(!h.gateway.up(IFACE));

    // Idempotent
    assert!(h.service.tear_down_interfaces().await.succeeded());

    assert!(matches!(
        h.service.start_hostapd(&handle).await,
        Reply::Failed(ApError::NoInterface)
    ));

    let fresh = create(&h).await;
    assert_ne!(fresh.id(), handle.id());
    assert!(matches!(
        h.service.get_interface_name(&handle).await,
        Reply::Failed(ApError::StaleHandle)
    ));

    // The new interface has no config yet
    assert!(matches!(
        h.service.start_hostapd(&fresh).await,
        Reply::Failed(ApError::NoConfig)
    ));
}

#[tokio::test]
async fn tear_down_frees_the_slot_even_if_interface_stays_up() {
    let h = Harness::new();
    let handle = create(&h).await;
    h.service.write_hostapd_config(&handle, &wpa2_params()).await;
    assert!(h.service.start_hostapd(&handle).await.succeeded());

    h.gateway.fail_set(true);
    let reply = h.service.tear_down_interfaces().await;
    assert!(!reply.is_ok());
    assert!(matches!(
        reply.error(),
        Some(ApError::InterfaceState { .. })
    ));
    assert_eq!(h.launcher.alive(), 0);
    assert!(h.manager().status().await.is_none());

    h.gateway.fail_set(false);
    assert!(matches!(
        h.service.create_ap_interface().await,
        Reply::Success(Some(_))
    ));
}

#[tokio::test]
async fn interface_control_failure_during_start_kills_hostapd() {
    let h = Harness::new();
    let handle = create(&h).await;
    h.service.write_hostapd_config(&handle, &wpa2_params()).await;

    h.gateway.fail_set(true);
    let reply = h.service.start_hostapd(&handle).await;
    assert!(!reply.is_ok());
    assert!(matches!(
        reply.error(),
        Some(ApError::InterfaceState { .. })
    ));
    assert_eq!(h.launcher.launches(), 1);
    assert_eq!(h.launcher.alive(), 0);
    assert_eq!(
        h.manager().hostapd_state(&handle).await.unwrap(),
        HostapdState::Stopped
    );

    h.gateway.fail_set(false);
    assert!(h.service.start_hostapd(&handle).await.succeeded());
    assert!(h.gateway.up(IFACE));
}

#[tokio::test]
async fn interface_control_failure_on_create_is_failed() {
    let h = Harness::new();
    h.gateway.fail_set(true);

    let reply = h.service.create_ap_interface().await;
    assert!(!reply.is_ok());
    assert!(matches!(
        reply.error(),
        Some(ApError::InterfaceState { .. })
    ));
    assert!(h.manager().status().await.is_none());
}

#[tokio::test]
async fn hostapd_dying_after_settle_is_noticed_on_refresh() {
    let h = Harness::new();
    let handle = create(&h).await;
    h.service.write_hostapd_config(&handle, &wpa2_params()).await;
    h.launcher.set_behavior(Behavior::DieAfter(Duration::from_millis(80)));

    assert!(h.service.start_hostapd(&handle).await.succeeded());
    assert!(h.gateway.up(IFACE));

    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(
        h.manager().refresh(&handle).await.unwrap(),
        HostapdState::Stopped
    );
    assert!(!h.gateway.up(IFACE));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_yield_one_handle() {
    let h = Harness::new();

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let service = h.service.clone();
            tokio::spawn(async move { service.create_ap_interface().await })
        })
        .collect();

    let mut created = 0;
    for task in tasks {
        match task.await.unwrap() {
            Reply::Success(Some(_)) => created += 1,
            Reply::Success(None) => {}
            other => panic!("unexpected reply {other:?}"),
        }
    }
    assert_eq!(created, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_starts_launch_once() {
    let h = Harness::new();
    let handle = create(&h).await;
    h.service.write_hostapd_config(&handle, &wpa2_params()).await;

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let service = h.service.clone();
            let handle = handle.clone();
            tokio::spawn(async move { service.start_hostapd(&handle).await.succeeded() })
        })
        .collect();
    for task in tasks {
        assert!(task.await.unwrap());
    }
    assert_eq!(h.launcher.launches(), 1);
    assert_eq!(h.launcher.alive(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn status_is_readable_during_slow_start() {
    let h = Harness::with_timeouts(
        fast_timeouts()
            .with_startup_timeout(Duration::from_secs(2))
            .with_settle_delay(Duration::from_millis(400)),
    );
    let handle = create(&h).await;
    h.service.write_hostapd_config(&handle, &wpa2_params()).await;

    let start = {
        let service = h.service.clone();
        let handle = handle.clone();
        tokio::spawn(async move { service.start_hostapd(&handle).await.succeeded() })
    };

    tokio::time::sleep(Duration::from_millis(100)).await;
    let queried = std::time::Instant::now();
    let state = h.manager().hostapd_state(&handle).await.unwrap();
    assert_eq!(state, HostapdState::Starting);
    assert!(queried.elapsed() < Duration::from_millis(200));

    let status = h.manager().status().await.unwrap();
    assert_eq!(status.hostapd, HostapdState::Starting);
    assert!(status.config_written);

    assert!(start.await.unwrap());
    assert_eq!(
        h.manager().hostapd_state(&handle).await.unwrap(),
        HostapdState::Running
    );
}

#[tokio::test]
async fn subscribers_see_the_running_state() {
    let h = Harness::new();
    let handle = create(&h).await;
    h.service.write_hostapd_config(&handle, &wpa2_params()).await;

    let mut rx = h.manager().subscribe(&handle).await.unwrap();
    h.service.start_hostapd(&handle).await;

    rx.changed().await.unwrap();
    assert_eq!(*rx.borrow_and_update(), HostapdState::Running);
}

#[tokio::test]
async fn hostapd_is_given_the_config_path_last() {
    let h = Harness::new();
    let handle = create(&h).await;
    h.service.write_hostapd_config(&handle, &wpa2_params()).await;
    h.service.start_hostapd(&handle).await;

    let args = h.launcher.last_args().unwrap();
    assert_eq!(args.last().unwrap(), h.config_path().as_os_str());
}
