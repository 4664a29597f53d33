//! Dispatcher fan-out guarantees (spec.md §4.5, §8 invariant 6): exactly
//! one report per submitted action, device groups run sequentially.

use av_room_control::domain::model::{
    ActionStructure, Configuration, DestinationDevice, Device, DeviceCommand, DeviceRole, Port,
    Room, StatusCommand,
};
use av_room_control::domain::value_objects::{
    BuildingId, CommandName, DeviceName, EvaluatorKey, PortId, RoomId,
};
use av_room_control::dispatch::Dispatcher;
use av_room_control::ports::mock::{MockTransport, RecordingEventPublisher};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn device_with_power(name: &str) -> Device {
    Device {
        name: DeviceName::new(name),
        address: format!("10.0.0.{name}"),
        roles: vec![DeviceRole::VideoOut],
        commands: vec![
            DeviceCommand {
                name: CommandName::new("PowerOn"),
                microservice_address: "http://ms".to_string(),
                endpoint_path: "/:address/power/on".to_string(),
                method: "GET".to_string(),
            },
            DeviceCommand {
                name: CommandName::new("Standby"),
                microservice_address: "http://ms".to_string(),
                endpoint_path: "/:address/power/standby".to_string(),
                method: "GET".to_string(),
            },
        ],
        ports: vec![],
    }
}

fn action(device: &Device, command: &str) -> ActionStructure {
    ActionStructure {
        action: CommandName::new(command),
        device: device.clone(),
        generating_evaluator: EvaluatorKey::new("PowerOnDefault"),
        device_specific: false,
        parameters: HashMap::new(),
        event_log: vec![],
        overridden: false,
    }
}

fn room_with(devices: Vec<Device>) -> Room {
    Room {
        building: BuildingId::new("ITB"),
        room: RoomId::new("1010"),
        devices,
        configuration: Configuration::default(),
    }
}

#[tokio::test]
async fn dispatch_actions_returns_one_report_per_action_across_devices() {
    let tv1 = device_with_power("TV1");
    let tv2 = device_with_power("TV2");
    let transport = Arc::new(MockTransport::new());
    transport.respond("http://ms/10.0.0.TV1/power/on", json!({}));
    transport.respond("http://ms/10.0.0.TV2/power/on", json!({}));

    let dispatcher = Dispatcher::new(
        transport.clone(),
        Arc::new(RecordingEventPublisher::default()),
        Duration::from_secs(2),
        None,
    );

    let actions = vec![action(&tv1, "PowerOn"), action(&tv2, "PowerOn")];
    let room = Arc::new(room_with(vec![tv1, tv2]));

    let reports = dispatcher
        .dispatch_actions(
            actions,
            room,
            CancellationToken::new(),
            Default::default(),
        )
        .await;

    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.success));
}

#[tokio::test]
async fn dispatch_actions_reports_failure_without_panicking_on_unknown_response() {
    let tv1 = device_with_power("TV1");
    let transport = Arc::new(MockTransport::new());
    // No canned response registered: the transport returns an error.

    let dispatcher = Dispatcher::new(
        transport,
        Arc::new(RecordingEventPublisher::default()),
        Duration::from_secs(2),
        None,
    );

    let actions = vec![action(&tv1, "PowerOn")];
    let room = Arc::new(room_with(vec![tv1]));

    let reports = dispatcher
        .dispatch_actions(
            actions,
            room,
            CancellationToken::new(),
            Default::default(),
        )
        .await;

    assert_eq!(reports.len(), 1);
    assert!(!reports[0].success);
    assert!(reports[0].error.is_some());
}

#[tokio::test]
async fn dispatch_status_rewrites_gated_device_through_gateway() {
    let gateway = Device {
        name: DeviceName::new("GW1"),
        address: "gw1".to_string(),
        roles: vec![DeviceRole::Gateway],
        commands: vec![DeviceCommand {
            name: CommandName::new("port1"),
            microservice_address: "http://gw1/".to_string(),
            endpoint_path: "via/:gateway/to/:address/path/:path".to_string(),
            method: "GET".to_string(),
        }],
        ports: vec![Port {
            id: PortId::new("port1"),
            source_device: DeviceName::new("GW1"),
            destination_device: DeviceName::new("CAM1"),
        }],
    };
    let gated = Device {
        name: DeviceName::new("CAM1"),
        address: "10.0.0.5".to_string(),
        roles: vec![DeviceRole::GatedDevice],
        commands: vec![DeviceCommand {
            name: CommandName::new("STATUSPower"),
            microservice_address: "http://ms/".to_string(),
            endpoint_path: "/:address/power".to_string(),
            method: "GET".to_string(),
        }],
        ports: vec![],
    };

    let transport = Arc::new(MockTransport::new());
    transport.respond(
        "http://gw1/via/gw1/to/10.0.0.5/path/power",
        json!({"power": "on"}),
    );

    let dispatcher = Dispatcher::new(
        transport.clone(),
        Arc::new(RecordingEventPublisher::default()),
        Duration::from_secs(2),
        None,
    );

    let command = StatusCommand {
        action: gated.commands[0].clone(),
        device: gated.clone(),
        parameters: HashMap::new(),
        generator: EvaluatorKey::new("PowerDefault"),
        destination_device: DestinationDevice {
            device: gated.clone(),
            audio_device: false,
            display: true,
        },
    };
    let room = Arc::new(room_with(vec![gateway, gated]));

    let statuses = dispatcher
        .dispatch_status(vec![command], room, CancellationToken::new(), Default::default())
        .await;

    assert_eq!(statuses.len(), 1);
    assert!(statuses[0].error_message.is_none());
    assert_eq!(statuses[0].responses.len(), 1);
    assert_eq!(
        transport.calls.lock().unwrap()[0].url,
        "http://gw1/via/gw1/to/10.0.0.5/path/power"
    );
}

#[tokio::test]
async fn dispatch_actions_with_no_work_returns_empty() {
    let transport = Arc::new(MockTransport::new());
    let dispatcher = Dispatcher::new(
        transport,
        Arc::new(RecordingEventPublisher::default()),
        Duration::from_secs(2),
        None,
    );

    let room = Arc::new(room_with(vec![]));
    let reports = dispatcher
        .dispatch_actions(vec![], room, CancellationToken::new(), Default::default())
        .await;

    assert!(reports.is_empty());
}
