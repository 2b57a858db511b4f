//! Integration tests for the mock core
//!
//! These drive the mock through the scope-core facades the way an application
//! would.

use scope_core::{AccessError, ControlCore, DeviceRole, SerializedCore, ZStage};
use scope_driver_mock::*;
use std::sync::Arc;
use std::time::Duration;

fn focus_core(errors: ErrorConfig) -> MockCore {
    MockCore::builder()
        .device(
            MockDevice::stage("ZStage")
                .with_property(MockProperty::float("Backlash-B(um)", 1.5).with_limits(0.0, 10.0)),
        )
        .role(DeviceRole::Focus, "ZStage")
        .errors(errors)
        .build()
}

#[tokio::test]
async fn test_demo_config_serves_every_facade_role() {
    let core = MockCore::from_config(&MockCoreConfig::demo()).unwrap();
    for role in [
        DeviceRole::Focus,
        DeviceRole::XYStage,
        DeviceRole::Camera,
        DeviceRole::Shutter,
    ] {
        assert!(!core.role_device(role).await.unwrap().is_empty(), "{role}");
    }
    assert_eq!(core.role_device(DeviceRole::Galvo).await.unwrap(), "");
}

#[tokio::test]
async fn test_communication_loss_surfaces_as_comm() {
    let failing = Arc::new(focus_core(ErrorConfig::scenario(
        ErrorScenario::CommunicationLoss,
    )));
    let stage = ZStage::new(failing);
    assert!(matches!(
        stage.find_device().await,
        Err(AccessError::Comm { .. })
    ));
    assert!(matches!(
        stage.get_position().await,
        Err(AccessError::DeviceNotResolved { .. })
    ));
}

#[tokio::test]
async fn test_fail_after_n_on_reads() {
    let core = Arc::new(focus_core(ErrorConfig::scenario(ErrorScenario::FailAfterN {
        operation: "get_property",
        count: 1,
    })));
    let stage = ZStage::new(core.clone());
    stage.find_device().await.unwrap();

    assert_eq!(stage.get_backlash().await.unwrap(), 1.5);
    let err = stage.get_backlash().await.unwrap_err();
    assert!(err.is_transient(), "{err:?}");
}

#[tokio::test]
async fn test_serialized_mock_interleaves_stop_with_wait() {
    let core = Arc::new(SerializedCore::new(focus_core(ErrorConfig::none())));
    core.inner().set_busy("ZStage", true);

    let stage = Arc::new(ZStage::new(core.clone()));
    stage.find_device().await.unwrap();

    let waiter = {
        let stage = stage.clone();
        tokio::spawn(async move { stage.wait_for_device(Duration::from_secs(2)).await })
    };

    tokio::time::sleep(Duration::from_millis(30)).await;
    stage.stop().await.unwrap();
    core.inner().set_busy("ZStage", false);

    waiter.await.unwrap().unwrap();
    assert!(core.inner().call_count("device_busy") >= 2);
}
