//! Immutable view of the whole system
//!
//! A [`Snapshot`] is assembled from the host's state documents plus the
//! per-zone renderer queries, published as a whole and never mutated
//! afterwards. All room and zone resolution happens against one snapshot, so
//! a lookup never mixes two generations of the zone configuration.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use raumfeld_webservice::{DeviceList, SystemState, ZoneConfig, TYPE_MEDIA_SERVER};

use crate::error::{Result, StateError};
use crate::model::{
    Device, DeviceId, HostInfo, PlaybackState, PowerState, Room, RoomId, ZoneId, ZoneMedia,
    ZoneState,
};

/// Latest known state of the host, its zones, rooms and devices
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub zones: BTreeMap<ZoneId, ZoneState>,
    /// Zoned rooms first in host order, then unassigned rooms
    pub rooms: Vec<Room>,
    pub devices: BTreeMap<DeviceId, Device>,
    pub host: HostInfo,
    pub media_server: Option<DeviceId>,
    pub update_available: bool,
}

/// Renderer-side details gathered per zone during a refresh
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneDetails {
    pub media: Option<ZoneMedia>,
    pub playback: PlaybackState,
}

impl Snapshot {
    /// Assemble a snapshot from the parsed host documents
    pub fn from_documents(
        host: HostInfo,
        zone_config: &ZoneConfig,
        device_list: &DeviceList,
        system_state: Option<&SystemState>,
        details: &HashMap<ZoneId, ZoneDetails>,
    ) -> Self {
        let devices: BTreeMap<DeviceId, Device> = device_list
            .devices
            .iter()
            .map(|d| {
                let id = DeviceId::new(d.udn.clone());
                let device = Device {
                    id: id.clone(),
                    device_type: d.device_type.clone(),
                    location: d.location.clone(),
                    name: d.name.trim().to_string(),
                };
                (id, device)
            })
            .collect();

        let mut zones = BTreeMap::new();
        let mut rooms = Vec::new();

        for zone in &zone_config.zones.zones {
            let zone_id = ZoneId::new(zone.udn.clone());
            let location = devices
                .get(&DeviceId::new(zone.udn.clone()))
                .map(|d| d.location.clone());
            let detail = details.get(&zone_id).cloned().unwrap_or_default();

            let mut member_ids = Vec::with_capacity(zone.rooms.len());
            for room in &zone.rooms {
                member_ids.push(RoomId::new(room.udn.clone()));
                rooms.push(Room {
                    id: RoomId::new(room.udn.clone()),
                    name: room.name.clone(),
                    zone: Some(zone_id.clone()),
                    power_state: room.power_state.as_deref().map(PowerState::parse),
                    renderers: room
                        .renderers
                        .iter()
                        .map(|r| DeviceId::new(r.udn.clone()))
                        .collect(),
                });
            }

            zones.insert(
                zone_id.clone(),
                ZoneState {
                    id: zone_id,
                    rooms: member_ids,
                    location,
                    media: detail.media,
                    playback: detail.playback,
                },
            );
        }

        for room in &zone_config.unassigned_rooms.rooms {
            rooms.push(Room {
                id: RoomId::new(room.udn.clone()),
                name: room.name.clone(),
                zone: None,
                power_state: room.power_state.as_deref().map(PowerState::parse),
                renderers: room
                    .renderers
                    .iter()
                    .map(|r| DeviceId::new(r.udn.clone()))
                    .collect(),
            });
        }

        let media_server = devices
            .values()
            .find(|d| d.device_type == TYPE_MEDIA_SERVER)
            .map(|d| d.id.clone());

        Snapshot {
            zones,
            rooms,
            devices,
            host,
            media_server,
            update_available: system_state.map(|s| s.update_available()).unwrap_or(false),
        }
    }

    /// Room names per zone, each list sorted
    pub fn zones(&self) -> Vec<Vec<String>> {
        self.zones
            .values()
            .map(|zone| {
                let mut names: Vec<String> = zone
                    .rooms
                    .iter()
                    .filter_map(|id| self.room_by_id(id).map(|r| r.name.clone()))
                    .collect();
                names.sort();
                names
            })
            .collect()
    }

    /// Names of all rooms, zoned and unassigned
    pub fn room_names(&self) -> Vec<String> {
        self.rooms.iter().map(|r| r.name.clone()).collect()
    }

    pub fn room(&self, name: &str) -> Option<&Room> {
        self.rooms.iter().find(|r| r.name == name)
    }

    pub fn room_by_id(&self, id: &RoomId) -> Option<&Room> {
        self.rooms.iter().find(|r| &r.id == id)
    }

    pub fn room_udn(&self, name: &str) -> Option<&RoomId> {
        self.room(name).map(|r| &r.id)
    }

    /// Resolve room names to UDNs, failing on the first unknown name
    pub fn room_udns<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<RoomId>> {
        names
            .iter()
            .map(|name| {
                self.room_udn(name.as_ref())
                    .cloned()
                    .ok_or_else(|| StateError::UnknownRoom(name.as_ref().to_string()))
            })
            .collect()
    }

    pub fn zone(&self, id: &ZoneId) -> Option<&ZoneState> {
        self.zones.get(id)
    }

    /// The zone made up of exactly these rooms, in any order
    pub fn zone_for_room_ids(&self, rooms: &[RoomId]) -> Option<&ZoneState> {
        self.zones.values().find(|zone| zone.has_rooms(rooms))
    }

    pub fn zone_for_rooms<S: AsRef<str>>(&self, names: &[S]) -> Result<&ZoneState> {
        let ids = self.room_udns(names)?;
        self.zone_for_room_ids(&ids)
            .ok_or_else(|| StateError::ZoneNotFound(owned_names(names)))
    }

    /// Whether the rooms currently form a zone of their own
    pub fn zone_is_valid<S: AsRef<str>>(&self, names: &[S]) -> bool {
        let mut wanted = owned_names(names);
        wanted.sort();
        self.zones().contains(&wanted)
    }

    /// Renderer description location of the zone formed by `names`
    pub fn zone_location<S: AsRef<str>>(&self, names: &[S]) -> Result<&str> {
        let zone = self.zone_for_rooms(names)?;
        zone.location
            .as_deref()
            .ok_or_else(|| StateError::NoZoneLocation(zone.id.to_string()))
    }

    pub fn media_server_location(&self) -> Result<&str> {
        self.media_server
            .as_ref()
            .and_then(|id| self.devices.get(id))
            .map(|d| d.location.as_str())
            .ok_or(StateError::NoMediaServer)
    }

    pub fn device_location(&self, id: &DeviceId) -> Option<&str> {
        self.devices.get(id).map(|d| d.location.as_str())
    }

    pub fn power_state(&self, room: &str) -> Result<Option<&PowerState>> {
        self.room(room)
            .map(|r| r.power_state.as_ref())
            .ok_or_else(|| StateError::UnknownRoom(room.to_string()))
    }

    /// Power state of every room of the zone formed by `names`
    pub fn zone_power_state<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<Vec<(String, Option<PowerState>)>> {
        let zone = self.zone_for_rooms(names)?;
        Ok(zone
            .rooms
            .iter()
            .filter_map(|id| self.room_by_id(id))
            .map(|r| (r.name.clone(), r.power_state.clone()))
            .collect())
    }

    pub fn host_name(&self) -> Option<&str> {
        self.host.host_name.as_deref()
    }

    pub fn host_room(&self) -> Option<&str> {
        self.host.room_name.as_deref()
    }
}

fn owned_names<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    names.iter().map(|n| n.as_ref().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZONES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
        <zoneConfig>
            <zones>
                <zone udn="uuid:zone-1">
                    <room udn="uuid:room-kitchen" name="Kitchen" powerState="ACTIVE">
                        <renderer udn="uuid:spk-1" name="Speaker K"/>
                    </room>
                    <room udn="uuid:room-bath" name="Bath" powerState="MANUAL_STANDBY"/>
                </zone>
                <zone udn="uuid:zone-2">
                    <room udn="uuid:room-living" name="Living" powerState="ACTIVE"/>
                </zone>
            </zones>
            <unassignedRooms>
                <room udn="uuid:room-attic" name="Attic" powerState="AUTOMATIC_STANDBY"/>
            </unassignedRooms>
        </zoneConfig>"#;

    const DEVICES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
        <devices>
            <device udn="uuid:zone-1" type="urn:schemas-upnp-org:device:MediaRenderer:1" location="http://10.0.0.2:53000/zone1.xml">Kitchen, Bath</device>
            <device udn="uuid:ms" type="urn:schemas-upnp-org:device:MediaServer:1" location="http://10.0.0.2:53001/ms.xml">Media Server</device>
        </devices>"#;

    fn snapshot() -> Snapshot {
        let zones = ZoneConfig::from_xml(ZONES).unwrap();
        let devices = DeviceList::from_xml(DEVICES).unwrap();
        let mut details = HashMap::new();
        details.insert(
            ZoneId::new("uuid:zone-1"),
            ZoneDetails {
                media: None,
                playback: PlaybackState::Playing,
            },
        );
        Snapshot::from_documents(
            HostInfo {
                host_name: Some("teufel-host".to_string()),
                room_name: Some("Kitchen".to_string()),
            },
            &zones,
            &devices,
            None,
            &details,
        )
    }

    #[test]
    fn test_zones_are_sorted_room_names() {
        let snapshot = snapshot();
        assert_eq!(
            snapshot.zones(),
            vec![
                vec!["Bath".to_string(), "Kitchen".to_string()],
                vec!["Living".to_string()]
            ]
        );
        assert_eq!(snapshot.room_names(), vec!["Kitchen", "Bath", "Living", "Attic"]);
    }

    #[test]
    fn test_zone_resolution_ignores_order() {
        let snapshot = snapshot();
        let zone = snapshot.zone_for_rooms(&["Kitchen", "Bath"]).unwrap();
        assert_eq!(zone.id.as_str(), "uuid:zone-1");
        assert_eq!(zone.playback, PlaybackState::Playing);

        let same = snapshot.zone_for_rooms(&["Bath", "Kitchen"]).unwrap();
        assert_eq!(same.id, zone.id);

        assert!(snapshot.zone_is_valid(&["Bath", "Kitchen"]));
        assert!(!snapshot.zone_is_valid(&["Kitchen"]));
    }

    #[test]
    fn test_zone_lookup_errors() {
        let snapshot = snapshot();
        assert!(matches!(
            snapshot.zone_for_rooms(&["Cellar"]),
            Err(StateError::UnknownRoom(name)) if name == "Cellar"
        ));
        assert!(matches!(
            snapshot.zone_for_rooms(&["Kitchen"]),
            Err(StateError::ZoneNotFound(_))
        ));
        assert!(matches!(
            snapshot.zone_location(&["Living"]),
            Err(StateError::NoZoneLocation(_))
        ));
    }

    #[test]
    fn test_locations() {
        let snapshot = snapshot();
        assert_eq!(
            snapshot.zone_location(&["Kitchen", "Bath"]).unwrap(),
            "http://10.0.0.2:53000/zone1.xml"
        );
        assert_eq!(
            snapshot.media_server_location().unwrap(),
            "http://10.0.0.2:53001/ms.xml"
        );
        assert!(matches!(
            Snapshot::default().media_server_location(),
            Err(StateError::NoMediaServer)
        ));
    }

    #[test]
    fn test_power_states_and_host() {
        let snapshot = snapshot();
        assert_eq!(
            snapshot.power_state("Attic").unwrap(),
            Some(&PowerState::AutomaticStandby)
        );
        let zone = snapshot.zone_power_state(&["Kitchen", "Bath"]).unwrap();
        assert_eq!(zone.len(), 2);
        assert_eq!(zone[1], ("Bath".to_string(), Some(PowerState::ManualStandby)));
        assert_eq!(snapshot.host_name(), Some("teufel-host"));
        assert_eq!(snapshot.host_room(), Some("Kitchen"));
        assert!(!snapshot.update_available);
    }

    #[test]
    fn test_unassigned_rooms_have_no_zone() {
        let snapshot = snapshot();
        let attic = snapshot.room("Attic").unwrap();
        assert_eq!(attic.zone, None);
        let kitchen = snapshot.room("Kitchen").unwrap();
        assert_eq!(kitchen.renderers, vec![DeviceId::new("uuid:spk-1")]);
    }
}
