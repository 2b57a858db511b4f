//! Focus and XY stage facades against the mock core.

mod common;

use common::{as_core, focus_core, focus_core_with, focus_stage, BACKLASH, STAGE};
use scope_core::{
    AccessError, CancelToken, ControlCore, DeviceRole, SerializedCore, XyPosition, XyStage, ZStage,
};
use scope_driver_mock::{
    ErrorConfig, ErrorScenario, MockCore, MockDevice, MockMode, MockProperty, TimingConfig,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_test::traced_test;

async fn bound_stage(core: &Arc<MockCore>) -> ZStage {
    let stage = ZStage::new(as_core(core));
    stage.find_device().await.unwrap();
    stage
}

#[tokio::test]
async fn test_backlash_read_and_write() {
    let core = focus_core();
    let stage = bound_stage(&core).await;

    assert_eq!(stage.get_backlash().await.unwrap(), 1.5f32);
    stage.set_backlash(2.25).await.unwrap();
    assert_eq!(stage.get_backlash().await.unwrap(), 2.25f32);
    assert_eq!(core.property_value(STAGE, stage.backlash_property()).as_deref(), Some("2.25"));
}

#[tokio::test]
async fn test_backlash_out_of_limits_is_invalid_value() {
    let core = focus_core();
    let stage = bound_stage(&core).await;

    let err = stage.set_backlash(25.0).await.unwrap_err();
    assert!(matches!(err, AccessError::InvalidValue { .. }), "{err:?}");
    assert_eq!(stage.get_backlash().await.unwrap(), 1.5f32);
}

#[tokio::test]
async fn test_non_finite_backlash_is_refused_before_core() {
    // No limits on the property, so only the accessor stands in the way.
    let core = Arc::new(
        MockCore::builder()
            .device(
                MockDevice::stage(STAGE)
                    .with_role(DeviceRole::Focus)
                    .with_property(MockProperty::float(BACKLASH, 1.5)),
            )
            .build(),
    );
    let stage = bound_stage(&core).await;

    for backlash in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
        let err = stage.set_backlash(backlash).await.unwrap_err();
        assert!(matches!(err, AccessError::InvalidValue { .. }), "{err:?}");
    }
    assert_eq!(core.call_count("set_property"), 0);
    assert_eq!(core.property_value(STAGE, BACKLASH).as_deref(), Some("1.5"));
    assert_eq!(stage.get_backlash().await.unwrap(), 1.5f32);
}

#[tokio::test]
async fn test_absolute_and_relative_moves() {
    let core = focus_core();
    let stage = bound_stage(&core).await;

    stage.set_position(100.0).await.unwrap();
    stage.wait_for_device(Duration::from_secs(1)).await.unwrap();
    assert_eq!(stage.get_position().await.unwrap(), 100.0);

    stage.set_relative_position(-12.5).await.unwrap();
    assert_eq!(stage.get_position().await.unwrap(), 87.5);
    assert_eq!(core.position_of(STAGE), Some(87.5));

    stage.home().await.unwrap();
    assert_eq!(stage.get_position().await.unwrap(), 0.0);
}

#[tokio::test]
async fn test_non_finite_move_never_reaches_core() {
    let core = focus_core();
    let stage = bound_stage(&core).await;

    for target in [f64::NAN, f64::INFINITY] {
        let err = stage.set_position(target).await.unwrap_err();
        assert!(matches!(err, AccessError::InvalidValue { .. }), "{err:?}");
    }
    assert!(stage.set_relative_position(f64::NEG_INFINITY).await.is_err());
    assert_eq!(core.call_count("set_position"), 0);
    assert_eq!(core.call_count("set_relative_position"), 0);
}

#[tokio::test]
async fn test_move_outside_travel_is_invalid_value() {
    let core = focus_core();
    let stage = bound_stage(&core).await;

    let err = stage.set_position(5000.0).await.unwrap_err();
    assert!(matches!(err, AccessError::InvalidValue { .. }), "{err:?}");
    assert!(!err.is_transient());
    assert_eq!(core.position_of(STAGE), Some(0.0));
}

#[tokio::test]
async fn test_motion_link_failures_name_the_motion_call() {
    let core = focus_core_with(ErrorConfig::scenarios(vec![
        ErrorScenario::FailAfterN {
            operation: "set_position",
            count: 0,
        },
        ErrorScenario::FailAfterN {
            operation: "set_relative_position",
            count: 0,
        },
    ]));
    let stage = bound_stage(&core).await;

    let err = stage.set_position(10.0).await.unwrap_err();
    assert!(
        matches!(
            err,
            AccessError::Comm {
                operation: "set_position",
                ..
            }
        ),
        "{err:?}"
    );
    let err = stage.set_relative_position(1.0).await.unwrap_err();
    assert!(
        matches!(
            err,
            AccessError::Comm {
                operation: "set_relative_position",
                ..
            }
        ),
        "{err:?}"
    );
}

#[tokio::test]
async fn test_failed_position_read_is_error_not_zero() {
    let core = focus_core_with(ErrorConfig::scenario(ErrorScenario::FailAfterN {
        operation: "get_position",
        count: 0,
    }));
    let stage = bound_stage(&core).await;
    stage.set_position(250.0).await.unwrap();

    let err = stage.get_position().await.unwrap_err();
    assert!(matches!(err, AccessError::Comm { .. }), "{err:?}");
}

#[tokio::test]
async fn test_core_wait_failure_is_comm() {
    let core = focus_core_with(ErrorConfig::scenario(ErrorScenario::Timeout {
        operation: "wait_for_device",
    }));
    let stage = bound_stage(&core).await;

    let err = stage.wait_for_device(Duration::from_secs(1)).await.unwrap_err();
    assert!(
        matches!(
            err,
            AccessError::Comm {
                operation: "wait_for_device",
                ..
            }
        ),
        "{err:?}"
    );
}

#[tokio::test]
async fn test_serialized_core_surfaces_core_wait_failure() {
    let core = Arc::new(SerializedCore::new(
        MockCore::builder()
            .device(focus_stage())
            .errors(ErrorConfig::scenario(ErrorScenario::Timeout {
                operation: "wait_for_device",
            }))
            .build(),
    ));
    let shared: Arc<dyn ControlCore> = core.clone();
    let stage = ZStage::new(shared);
    stage.find_device().await.unwrap();

    let err = stage.wait_for_device(Duration::from_secs(1)).await.unwrap_err();
    assert!(
        matches!(
            err,
            AccessError::Comm {
                operation: "wait_for_device",
                ..
            }
        ),
        "{err:?}"
    );
    assert_eq!(core.inner().call_count("wait_for_device"), 1);
}

#[tokio::test]
async fn test_wait_times_out_on_stuck_device() {
    let core = focus_core();
    let stage = bound_stage(&core).await;
    assert!(core.set_busy(STAGE, true));
    assert!(stage.is_busy().await.unwrap());

    let err = stage
        .wait_for_device(Duration::from_millis(50))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        AccessError::WaitTimedOut {
            device: STAGE.into(),
            waited: Duration::from_millis(50),
        }
    );

    core.set_busy(STAGE, false);
    stage.wait_for_device(Duration::from_millis(50)).await.unwrap();
}

#[tokio::test]
async fn test_wait_is_cancellable() {
    let core = focus_core();
    let stage = bound_stage(&core).await;
    core.set_busy(STAGE, true);

    let token = CancelToken::new();
    let canceller = {
        let token = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        })
    };

    let err = stage
        .wait_for_device_until(Duration::from_secs(10), &token)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        AccessError::Cancelled {
            device: STAGE.into()
        }
    );
    canceller.await.unwrap();

    // Already cancelled tokens fail without touching the core.
    core.reset_calls();
    assert!(stage
        .wait_for_device_until(Duration::from_secs(1), &token)
        .await
        .is_err());
    assert_eq!(core.call_count("wait_for_device"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_realistic_motion_is_waitable() {
    let core = Arc::new(
        MockCore::builder()
            .device(focus_stage())
            .mode(MockMode::Realistic)
            .timing(TimingConfig::stage())
            .build(),
    );
    let stage = bound_stage(&core).await;

    let started = tokio::time::Instant::now();
    stage.set_position(500.0).await.unwrap();
    assert!(stage.is_busy().await.unwrap());

    stage.wait_for_device(Duration::from_secs(5)).await.unwrap();
    assert!(!stage.is_busy().await.unwrap());
    // 500 µm at 1000 µm/s plus settling.
    assert!(started.elapsed() >= Duration::from_millis(550));
    assert_eq!(stage.get_position().await.unwrap(), 500.0);
}

#[tokio::test(start_paused = true)]
async fn test_stop_gets_through_a_serialized_wait() {
    let core = Arc::new(SerializedCore::new(
        MockCore::builder()
            .device(focus_stage())
            .mode(MockMode::Realistic)
            .timing(TimingConfig {
                speed_um_per_sec: 10.0,
                settling_time_ms: 0,
                communication_delay_ms: 0,
            })
            .wait_timeout(Duration::from_secs(600))
            .build(),
    ));
    let shared: Arc<dyn ControlCore> = core.clone();
    let stage = Arc::new(ZStage::new(shared));
    stage.find_device().await.unwrap();
    stage.set_position(500.0).await.unwrap();

    let started = tokio::time::Instant::now();
    let waiter = {
        let stage = stage.clone();
        tokio::spawn(async move { stage.wait_for_device(Duration::from_secs(120)).await })
    };

    tokio::time::sleep(Duration::from_millis(100)).await;
    stage.stop().await.unwrap();

    waiter.await.unwrap().unwrap();
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
#[traced_test]
async fn test_failures_are_logged_once() {
    let core = focus_core_with(ErrorConfig::scenario(ErrorScenario::FailAfterN {
        operation: "get_property",
        count: 0,
    }));
    let stage = bound_stage(&core).await;

    assert!(stage.get_backlash().await.is_err());
    assert!(logs_contain("device operation failed"));
    assert!(logs_contain("get_backlash"));
}

#[tokio::test]
async fn test_xy_stage_operations() {
    let core = Arc::new(
        MockCore::builder()
            .device(
                MockDevice::xy_stage("XYStage")
                    .with_role(DeviceRole::XYStage)
                    .with_travel(-1000.0, 1000.0),
            )
            .build(),
    );
    let stage = XyStage::new(as_core(&core));
    stage.find_device().await.unwrap();

    stage.set_xy_position(XyPosition::new(10.0, -20.0)).await.unwrap();
    stage.wait_for_device(Duration::from_secs(1)).await.unwrap();
    assert_eq!(stage.get_xy_position().await.unwrap(), XyPosition::new(10.0, -20.0));

    stage.set_relative_xy_position(5.0, 5.0).await.unwrap();
    assert_eq!(stage.get_xy_position().await.unwrap(), XyPosition::new(15.0, -15.0));

    let err = stage
        .set_xy_position(XyPosition::new(0.0, 2000.0))
        .await
        .unwrap_err();
    assert!(matches!(err, AccessError::InvalidValue { .. }), "{err:?}");

    assert!(matches!(
        stage.set_xy_position(XyPosition::new(f64::NAN, 0.0)).await,
        Err(AccessError::InvalidValue { .. })
    ));

    stage.home().await.unwrap();
    assert_eq!(stage.get_xy_position().await.unwrap(), XyPosition::default());
}

#[tokio::test]
async fn test_property_names_on_bound_stage() {
    let core = focus_core();
    let stage = bound_stage(&core).await;
    let names = stage.property_names().await.unwrap();
    assert!(names.iter().any(|n| n == stage.backlash_property()));
}
