//! # Gateway URL Rewriter
//!
//! Recursive rewrite of naive device URLs into gateway-addressed URLs for
//! devices reachable only through a controller (spec.md §4.4), grounded
//! directly in `original_source/gateway/gateway.go`'s `SetGateway`/
//! `getDeviceGateway`/`processPort`.

use crate::domain::errors::ControlError;
use crate::domain::model::{Device, DeviceRole, Room};

struct ParsedUrl {
    host: String,
    path: String,
}

/// Parse `http://HOST/PATH` into its host and path components.
fn parse_url(url: &str) -> Result<ParsedUrl, ControlError> {
    let rest = url
        .strip_prefix("http://")
        .ok_or_else(|| ControlError::MalformedDeviceUrl(url.to_string()))?;
    let slash = rest
        .find('/')
        .ok_or_else(|| ControlError::MalformedDeviceUrl(url.to_string()))?;
    let (host, path) = rest.split_at(slash);
    if host.is_empty() {
        return Err(ControlError::MalformedDeviceUrl(url.to_string()));
    }
    Ok(ParsedUrl {
        host: host.to_string(),
        path: path.trim_start_matches('/').to_string(),
    })
}

/// Find the gateway device in `room` whose port list contains an entry
/// whose `destination_device` is `target`. Returns the gateway device
/// and the matching port's id (the port key).
fn find_gateway<'a>(room: &'a Room, target: &Device) -> Option<(&'a Device, String)> {
    room.devices.iter().find_map(|candidate| {
        candidate
            .ports
            .iter()
            .find(|port| port.destination_device == target.name)
            .map(|port| (candidate, port.id.as_str().to_string()))
    })
}

/// Substitute `:name` placeholders in `template` with values from
/// `replacements`, applied in order so positional params (`:0`, `:1`,
/// ...) are replaced before the longer named placeholders that could
/// otherwise shadow them.
fn substitute(template: &str, replacements: &[(String, String)]) -> String {
    let mut out = template.to_string();
    for (name, value) in replacements {
        out = out.replace(name.as_str(), value.as_str());
    }
    out
}

/// Returns true if `url` still carries an unresolved `:placeholder`
/// path segment.
fn has_residual_placeholder(url: &str) -> bool {
    url.split('/').any(|segment| segment.starts_with(':') && segment.len() > 1)
}

/// Rewrite `url` (the naive `http://<device-address>/<path>` URL for
/// `device`) into a URL addressed to its gateway, recursing through a
/// chain of gateways if necessary.
///
/// Idempotent on non-gated devices: returns `url` unchanged when
/// `device` lacks the `GatedDevice` role (spec.md §8 invariant 4).
pub fn rewrite(url: &str, device: &Device, room: &Room) -> Result<String, ControlError> {
    if !device.has_role(DeviceRole::GatedDevice) {
        return Ok(url.to_string());
    }

    let (gateway, port_key) =
        find_gateway(room, device).ok_or_else(|| ControlError::GatewayNotFound(device.name.clone()))?;

    let parsed = parse_url(url)?;
    let port_id = crate::domain::value_objects::PortId::new(port_key.clone());
    let (command_name, positional_params) = port_id.split_positional();

    let command = gateway.command(&command_name).ok_or_else(|| {
        ControlError::GatewayCommandMissing {
            gateway: gateway.name.clone(),
            port_key: port_key.clone(),
        }
    })?;

    let mut replacements: Vec<(String, String)> = positional_params
        .into_iter()
        .enumerate()
        .map(|(i, value)| (format!(":{i}"), value))
        .collect();
    replacements.push((":address".to_string(), parsed.host.clone()));
    replacements.push((":path".to_string(), parsed.path.clone()));
    replacements.push((":gateway".to_string(), gateway.address.clone()));

    let rewritten_path = substitute(&command.endpoint_path, &replacements);
    let new_url = format!("{}{}", command.microservice_address, rewritten_path);

    if has_residual_placeholder(&new_url) {
        return Err(ControlError::TemplateUnresolved {
            placeholder: new_url
                .split('/')
                .find(|segment| segment.starts_with(':') && segment.len() > 1)
                .unwrap_or_default()
                .to_string(),
            url: new_url,
        });
    }

    rewrite(&new_url, gateway, room)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Configuration, DeviceCommand, Port};
    use crate::domain::value_objects::{BuildingId, CommandName, DeviceName, PortId, RoomId};

    fn gateway_device() -> Device {
        Device {
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
        }
    }

    fn gated_device() -> Device {
        Device {
            name: DeviceName::new("CAM1"),
            address: "10.0.0.5".to_string(),
            roles: vec![DeviceRole::GatedDevice],
            commands: vec![],
            ports: vec![],
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

    #[test]
    fn non_gated_device_is_unchanged() {
        let device = Device {
            name: DeviceName::new("TV1"),
            address: "10.0.0.1".to_string(),
            roles: vec![DeviceRole::VideoOut],
            commands: vec![],
            ports: vec![],
        };
        let room = room_with(vec![device.clone()]);
        let url = "http://10.0.0.1/state/on";
        assert_eq!(rewrite(url, &device, &room).unwrap(), url);
    }

    #[test]
    fn gated_device_rewrites_through_gateway() {
        let room = room_with(vec![gateway_device(), gated_device()]);
        let url = "http://10.0.0.5/state/on";
        let rewritten = rewrite(url, &gated_device(), &room).unwrap();
        assert_eq!(rewritten, "http://gw1/via/gw1/to/10.0.0.5/path/state/on");
    }

    #[test]
    fn missing_gateway_is_reported() {
        let orphan = Device {
            name: DeviceName::new("CAM2"),
            address: "10.0.0.6".to_string(),
            roles: vec![DeviceRole::GatedDevice],
            commands: vec![],
            ports: vec![],
        };
        let room = room_with(vec![orphan.clone()]);
        let err = rewrite("http://10.0.0.6/state/on", &orphan, &room).unwrap_err();
        assert!(matches!(err, ControlError::GatewayNotFound(_)));
    }
}
