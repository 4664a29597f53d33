//! End-to-end coverage of [`RoomControlService`] over mocked ports:
//! control path (plan → dispatch → report) and status path (query →
//! dispatch → aggregate), per spec.md §2 "Data flow".

use async_trait::async_trait;
use av_room_control::domain::errors::ControlError;
use av_room_control::domain::model::{
    Configuration, Device, DeviceCommand, DeviceRole, Port, PublicAudioDevice, PublicDisplay,
    PublicRoom, Room,
};
use av_room_control::domain::value_objects::{
    BuildingId, CommandName, DeviceName, PortId, RoomId,
};
use av_room_control::ports::mock::{MockTransport, RecordingEventPublisher};
use av_room_control::ports::ConfigDatabasePort;
use av_room_control::service::RoomControlService;
use serde_json::json;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct PersistedCalls {
    volumes: Mutex<Vec<(DeviceName, i64)>>,
    mutes: Mutex<Vec<(DeviceName, bool)>>,
}

struct StaticConfigDb(Room, PersistedCalls);

#[async_trait]
impl ConfigDatabasePort for StaticConfigDb {
    async fn get_room(&self, _building: &BuildingId, room: &RoomId) -> Result<Room, ControlError> {
        if room != &self.0.room {
            return Err(ControlError::DbFailure(format!("no such room: {room}")));
        }
        Ok(self.0.clone())
    }

    async fn get_devices(
        &self,
        _building: &BuildingId,
        _room: &RoomId,
    ) -> Result<Vec<Device>, ControlError> {
        Ok(self.0.devices.clone())
    }

    async fn get_devices_by_role(
        &self,
        _building: &BuildingId,
        _room: &RoomId,
        _role: &str,
    ) -> Result<Vec<Device>, ControlError> {
        // Not exercised by these tests; the real adapter filters on the
        // config DB's role field directly.
        Ok(self.0.devices.clone())
    }

    async fn get_device(
        &self,
        _building: &BuildingId,
        _room: &RoomId,
        device: &DeviceName,
    ) -> Result<Device, ControlError> {
        self.0
            .device(device)
            .cloned()
            .ok_or_else(|| ControlError::UnknownDevice(device.clone()))
    }

    async fn set_volume(
        &self,
        _building: &BuildingId,
        _room: &RoomId,
        device: &DeviceName,
        level: i64,
    ) -> Result<(), ControlError> {
        self.1.volumes.lock().unwrap().push((device.clone(), level));
        Ok(())
    }

    async fn set_muted(
        &self,
        _building: &BuildingId,
        _room: &RoomId,
        device: &DeviceName,
        muted: bool,
    ) -> Result<(), ControlError> {
        self.1.mutes.lock().unwrap().push((device.clone(), muted));
        Ok(())
    }
}

fn tv1() -> Device {
    Device {
        name: DeviceName::new("TV1"),
        address: "10.0.0.1".to_string(),
        roles: vec![DeviceRole::VideoOut],
        commands: vec![
            DeviceCommand {
                name: CommandName::new("PowerOn"),
                microservice_address: "http://display-ms".to_string(),
                endpoint_path: "/:address/power/on".to_string(),
                method: "GET".to_string(),
            },
            DeviceCommand {
                name: CommandName::new("Standby"),
                microservice_address: "http://display-ms".to_string(),
                endpoint_path: "/:address/power/standby".to_string(),
                method: "GET".to_string(),
            },
            DeviceCommand {
                name: CommandName::new("STATUSPower"),
                microservice_address: "http://display-ms".to_string(),
                endpoint_path: "/:address/power".to_string(),
                method: "GET".to_string(),
            },
        ],
        ports: vec![Port {
            id: PortId::new("hdmi1"),
            source_device: DeviceName::new("BLU1"),
            destination_device: DeviceName::new("TV1"),
        }],
    }
}

fn room_with_tv1() -> Room {
    Room {
        building: BuildingId::new("ITB"),
        room: RoomId::new("1010"),
        devices: vec![tv1()],
        configuration: Configuration {
            evaluators: vec!["PowerOnDefault".into(), "StandbyDefault".into(), "PowerDefault".into()],
        },
    }
}

fn config_db(room: Room) -> Arc<StaticConfigDb> {
    Arc::new(StaticConfigDb(room, PersistedCalls::default()))
}

fn build_service(
    config_db: Arc<StaticConfigDb>,
    transport: Arc<MockTransport>,
    events: Arc<RecordingEventPublisher>,
) -> RoomControlService {
    RoomControlService::builder()
        .config_db(config_db)
        .transport(transport)
        .events(events)
        .build()
        .expect("service builds with all required ports")
}

fn dsp1() -> Device {
    Device {
        name: DeviceName::new("DSP1"),
        address: "10.0.0.2".to_string(),
        roles: vec![DeviceRole::AudioOut],
        commands: vec![DeviceCommand {
            name: CommandName::new("SetVolume"),
            microservice_address: "http://audio-ms".to_string(),
            endpoint_path: "/:address/volume/:level".to_string(),
            method: "GET".to_string(),
        }],
        ports: vec![],
    }
}

fn room_with_tv1_and_dsp1() -> Room {
    let mut room = room_with_tv1();
    room.devices.push(dsp1());
    room.configuration.evaluators.push("SetVolumeDefault".into());
    room
}

#[tokio::test]
async fn execute_room_command_dispatches_planned_action_and_reports_success() {
    let transport = Arc::new(MockTransport::new());
    transport.respond("http://display-ms/10.0.0.1/power/on", json!({"ok": true}));
    let events = Arc::new(RecordingEventPublisher::default());
    let service = build_service(config_db(room_with_tv1()), transport.clone(), events);

    let intent = PublicRoom {
        power: Some("on".to_string()),
        ..Default::default()
    };

    let reports = service
        .execute_room_command(
            &BuildingId::new("ITB"),
            &RoomId::new("1010"),
            intent,
            CancellationToken::new(),
        )
        .await
        .expect("planning and dispatch succeed");

    assert_eq!(reports.len(), 1);
    assert!(reports[0].success);
    assert_eq!(reports[0].device, DeviceName::new("TV1"));
    assert_eq!(transport.calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn device_specific_standby_is_reported_alongside_room_wide_power_on() {
    let transport = Arc::new(MockTransport::new());
    transport.respond("http://display-ms/10.0.0.1/power/standby", json!({"ok": true}));
    let events = Arc::new(RecordingEventPublisher::default());
    let service = build_service(config_db(room_with_tv1()), transport.clone(), events);

    let intent = PublicRoom {
        power: Some("on".to_string()),
        displays: vec![PublicDisplay {
            name: DeviceName::new("TV1"),
            power: Some("standby".to_string()),
            ..Default::default()
        }],
        ..Default::default()
    };

    let reports = service
        .execute_room_command(
            &BuildingId::new("ITB"),
            &RoomId::new("1010"),
            intent,
            CancellationToken::new(),
        )
        .await
        .expect("planning and dispatch succeed");

    // Conflict resolution drops the room-wide PowerOn in favor of the
    // device-specific Standby (spec.md §4.1), so only one action reaches
    // the transport for TV1.
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].action.as_str(), "Standby");
}

#[tokio::test]
async fn get_room_status_aggregates_dispatched_power_response() {
    let transport = Arc::new(MockTransport::new());
    transport.respond(
        "http://display-ms/10.0.0.1/power",
        json!({"power": "on"}),
    );
    let events = Arc::new(RecordingEventPublisher::default());
    let service = build_service(config_db(room_with_tv1()), transport, events);

    let view = service
        .get_room_status(
            &BuildingId::new("ITB"),
            &RoomId::new("1010"),
            CancellationToken::new(),
        )
        .await
        .expect("status dispatch succeeds");

    assert_eq!(view.displays.len(), 1);
    assert_eq!(view.displays[0].power.as_deref(), Some("on"));
}

#[tokio::test]
async fn unknown_room_surfaces_config_db_error() {
    let transport = Arc::new(MockTransport::new());
    let events = Arc::new(RecordingEventPublisher::default());
    let service = build_service(config_db(room_with_tv1()), transport, events);

    let result = service
        .get_room_status(
            &BuildingId::new("ITB"),
            &RoomId::new("9999"),
            CancellationToken::new(),
        )
        .await;

    assert!(matches!(result, Err(ControlError::DbFailure(_))));
}

#[tokio::test]
async fn successful_set_volume_is_persisted_to_config_db() {
    let transport = Arc::new(MockTransport::new());
    transport.respond("http://audio-ms/10.0.0.2/volume/75", json!({"ok": true}));
    let events = Arc::new(RecordingEventPublisher::default());
    let db = config_db(room_with_tv1_and_dsp1());
    let service = build_service(db.clone(), transport, events);

    let intent = PublicRoom {
        audio_devices: vec![PublicAudioDevice {
            name: DeviceName::new("DSP1"),
            volume: Some(75),
            ..Default::default()
        }],
        ..Default::default()
    };

    let reports = service
        .execute_room_command(
            &BuildingId::new("ITB"),
            &RoomId::new("1010"),
            intent,
            CancellationToken::new(),
        )
        .await
        .expect("planning and dispatch succeed");

    assert_eq!(reports.len(), 1);
    assert!(reports[0].success);

    let persisted = db.1.volumes.lock().unwrap();
    assert_eq!(*persisted, vec![(DeviceName::new("DSP1"), 75)]);
}
