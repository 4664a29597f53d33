//! # Input Routing Graph
//!
//! Reachability over the port-connected device graph (spec.md §4.3),
//! grounded in `original_source/inputgraph/graph.go`'s `BuildGraph`/
//! `CheckReachability`, but with the channel-based BFS frontier replaced
//! by a plain queue per spec.md §9 "Graph BFS with predecessors" — this
//! crate's BFS is single-threaded within one planning operation, so the
//! goroutine/channel machinery in the original buys nothing here.

use crate::domain::errors::ControlError;
use crate::domain::model::Room;
use crate::domain::value_objects::DeviceName;
use std::collections::{HashMap, VecDeque};

/// Directed signal-flow graph over a room's devices, oriented
/// destination→source so that "can I reach source S from sink D" is a
/// forward BFS from D.
///
/// Rebuilt fresh for every planning operation (spec.md §3 "Lifecycle");
/// never shared or mutated across requests.
#[derive(Debug, Clone)]
pub struct InputGraph {
    nodes: Vec<DeviceName>,
    adjacency: HashMap<DeviceName, Vec<DeviceName>>,
}

impl InputGraph {
    /// Build the graph from a room's devices and ports. For every port
    /// `(source, destination, id)` on any device, adds an edge
    /// `destination -> source`. Adjacency lists preserve port iteration
    /// order so BFS is deterministic given a deterministic device/port
    /// ordering (spec.md §4.3 "Ordering determinism").
    pub fn build(room: &Room) -> Self {
        let mut nodes: Vec<DeviceName> = Vec::with_capacity(room.devices.len());
        let mut adjacency: HashMap<DeviceName, Vec<DeviceName>> = HashMap::new();

        for device in &room.devices {
            nodes.push(device.name.clone());
            adjacency.entry(device.name.clone()).or_default();
        }

        for device in &room.devices {
            for port in &device.ports {
                adjacency
                    .entry(port.destination_device.clone())
                    .or_default()
                    .push(port.source_device.clone());
            }
        }

        Self { nodes, adjacency }
    }

    /// Whether `device` is a known node in this graph.
    pub fn contains(&self, device: &DeviceName) -> bool {
        self.adjacency.contains_key(device)
    }

    /// Breadth-first search from `sink` looking for `source`.
    ///
    /// Returns `Ok(Some(path))` with the path from `sink` back through
    /// intermediate devices to `source` (inclusive of both endpoints) if
    /// reachable, `Ok(None)` if the frontier is exhausted with no path
    /// found (spec.md §4.3: "not an error"), or `Err` if either endpoint
    /// is unknown or path reconstruction detects a cycle.
    pub fn check_reachability(
        &self,
        sink: &DeviceName,
        source: &DeviceName,
    ) -> Result<Option<Vec<DeviceName>>, ControlError> {
        if !self.contains(sink) {
            return Err(ControlError::UnknownDevice(sink.clone()));
        }
        if !self.contains(source) {
            return Err(ControlError::UnknownDevice(source.clone()));
        }

        if sink == source {
            return Ok(Some(vec![sink.clone()]));
        }

        let mut visited: HashMap<DeviceName, DeviceName> = HashMap::new();
        let mut queue: VecDeque<DeviceName> = VecDeque::new();
        queue.push_back(sink.clone());

        let mut found = false;
        while let Some(current) = queue.pop_front() {
            if let Some(neighbors) = self.adjacency.get(&current) {
                for next in neighbors {
                    if visited.contains_key(next) || next == sink {
                        continue;
                    }
                    visited.insert(next.clone(), current.clone());
                    if next == source {
                        found = true;
                        break;
                    }
                    queue.push_back(next.clone());
                }
            }
            if found {
                break;
            }
        }

        if !found {
            return Ok(None);
        }

        let mut path = vec![source.clone()];
        let mut current = source.clone();
        let max_hops = self.nodes.len() + 1;
        for _ in 0..=max_hops {
            if &current == sink {
                path.reverse();
                return Ok(Some(path));
            }
            match visited.get(&current) {
                Some(predecessor) => {
                    path.push(predecessor.clone());
                    current = predecessor.clone();
                }
                None => return Err(ControlError::CyclicPath(source.clone())),
            }
        }

        Err(ControlError::CyclicPath(source.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Configuration, Device, DeviceRole, Port};
    use crate::domain::value_objects::{BuildingId, PortId, RoomId};

    fn device(name: &str, ports: Vec<Port>) -> Device {
        Device {
            name: DeviceName::new(name),
            address: "10.0.0.1".to_string(),
            roles: vec![DeviceRole::VideoOut],
            commands: vec![],
            ports,
        }
    }

    fn port(id: &str, source: &str, destination: &str) -> Port {
        Port {
            id: PortId::new(id),
            source_device: DeviceName::new(source),
            destination_device: DeviceName::new(destination),
        }
    }

    fn sample_room() -> Room {
        Room {
            building: BuildingId::new("ITB"),
            room: RoomId::new("1010"),
            devices: vec![
                device("PC", vec![]),
                device("SW1", vec![port("in1", "PC", "SW1")]),
                device("TV1", vec![port("hdmi1", "SW1", "TV1")]),
            ],
            configuration: Configuration::default(),
        }
    }

    #[test]
    fn bfs_finds_path_through_switcher() {
        let graph = InputGraph::build(&sample_room());
        let path = graph
            .check_reachability(&DeviceName::new("TV1"), &DeviceName::new("PC"))
            .unwrap()
            .expect("path should exist");
        assert_eq!(
            path,
            vec![
                DeviceName::new("TV1"),
                DeviceName::new("SW1"),
                DeviceName::new("PC"),
            ]
        );
    }

    #[test]
    fn bfs_reports_no_route_without_error() {
        let room = sample_room();
        let graph = InputGraph::build(&room);
        let result = graph
            .check_reachability(&DeviceName::new("PC"), &DeviceName::new("TV1"))
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn bfs_rejects_unknown_device() {
        let graph = InputGraph::build(&sample_room());
        let err = graph
            .check_reachability(&DeviceName::new("GHOST"), &DeviceName::new("PC"))
            .unwrap_err();
        assert!(matches!(err, ControlError::UnknownDevice(_)));
    }
}
