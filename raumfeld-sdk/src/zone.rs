//! Zone and room commands
//!
//! Every command resolves its rooms against the current snapshot, then talks
//! to the host web service (zone layout, standby) or to the zone renderer
//! over UPnP (transport, volume).

use std::thread;
use std::time::Instant;

use raumfeld_api::operations::av_transport::{
    NextRequest, PauseRequest, PlayRequest, PreviousRequest, SeekRequest, SetPlayModeRequest,
    StopRequest, SEEK_ABS_TIME,
};
use raumfeld_api::operations::rendering_control::{
    ChangeVolumeRequest, PlaySystemSoundRequest, SetMuteRequest, SetRoomVolumeRequest,
    SetVolumeRequest, MASTER_CHANNEL,
};
use raumfeld_api::operations::{
    ChangeVolumeOperation, ChannelRequest, GetMediaInfoOperation, GetMuteOperation,
    GetPositionInfoOperation, GetTransportInfoOperation, GetTransportSettingsOperation,
    GetVolumeOperation, InstanceRequest, MediaInfo, NextOperation, PauseOperation, PlayMode,
    PlayOperation, PlaySystemSoundOperation, PositionInfo, PreviousOperation, SeekOperation,
    SetMuteOperation, SetPlayModeOperation, SetRoomVolumeOperation, SetVolumeOperation,
    StopOperation, SystemSound, TransportInfo, TransportSettings,
};
use raumfeld_state::{DeviceId, RoomId, StateError, ZoneId};

use crate::error::{Result, SdkError};
use crate::host::RaumfeldHost;

impl RaumfeldHost {
    // ========================================================================
    // Zone layout
    // ========================================================================

    /// Put `rooms` into a zone of their own and wait until it shows up
    ///
    /// Returns once the snapshot lists a zone of exactly these rooms whose
    /// renderer is known, or after the zone creation timeout. A timeout is
    /// only an error when the rooms still do not form any zone.
    pub fn create_zone<S: AsRef<str>>(&self, rooms: &[S]) -> Result<ZoneId> {
        let snapshot = self.snapshot()?;
        let udns = snapshot.room_udns(rooms)?;
        let old_zone = snapshot.zone_for_room_ids(&udns).map(|z| z.id.clone());
        drop(snapshot);

        let udn_strs: Vec<&str> = udns.iter().map(RoomId::as_str).collect();
        self.web.connect_rooms_to_zone(None, &udn_strs)?;
        tracing::info!(rooms = ?udn_strs, "Requested zone creation");

        self.wait_for_zone(&udns, old_zone.as_ref())
    }

    fn wait_for_zone(&self, udns: &[RoomId], old_zone: Option<&ZoneId>) -> Result<ZoneId> {
        let deadline = Instant::now() + self.zone_wait.timeout;
        loop {
            if let Some(outcome) = self.check_new_zone(udns, old_zone, deadline) {
                return outcome;
            }
            thread::sleep(self.zone_wait.poll);
        }
    }

    /// One look at the snapshot for a zone of `udns`; `None` means keep waiting
    pub(crate) fn check_new_zone(
        &self,
        udns: &[RoomId],
        old_zone: Option<&ZoneId>,
        deadline: Instant,
    ) -> Option<Result<ZoneId>> {
        let current = self.store.read();
        if let Some(zone) = current.zone_for_room_ids(udns) {
            let is_new = Some(&zone.id) != old_zone;
            let listed = current.devices.contains_key(&DeviceId::new(zone.id.as_str()));
            if is_new && listed {
                return Some(Ok(zone.id.clone()));
            }
        }

        if Instant::now() < deadline {
            return None;
        }
        Some(match current.zone_for_room_ids(udns) {
            Some(zone) => {
                tracing::warn!(zone = %zone.id, "No new zone appeared, using the existing one");
                Ok(zone.id.clone())
            }
            None => Err(StateError::Timeout(self.zone_wait.timeout).into()),
        })
    }

    /// Take a room out of its zone
    pub fn drop_room(&self, room: &str) -> Result<()> {
        let udn = self.room_udn(room)?;
        self.web.drop_room_job(udn.as_str())?;
        Ok(())
    }

    /// Add a room to the zone made up of `zone_rooms`
    pub fn add_room_to_zone<S: AsRef<str>>(&self, zone_rooms: &[S], room: &str) -> Result<()> {
        let zone = self.zone_udn(zone_rooms)?;
        let udn = self.room_udn(room)?;
        self.web
            .connect_room_to_zone(Some(zone.as_str()), Some(udn.as_str()))?;
        Ok(())
    }

    pub fn enter_automatic_standby(&self, room: &str) -> Result<()> {
        let udn = self.room_udn(room)?;
        self.web.enter_automatic_standby(udn.as_str())?;
        Ok(())
    }

    pub fn enter_manual_standby(&self, room: &str) -> Result<()> {
        let udn = self.room_udn(room)?;
        self.web.enter_manual_standby(udn.as_str())?;
        Ok(())
    }

    pub fn leave_standby(&self, room: &str) -> Result<()> {
        let udn = self.room_udn(room)?;
        self.web.leave_standby(udn.as_str())?;
        Ok(())
    }

    pub(crate) fn room_udn(&self, room: &str) -> Result<RoomId> {
        self.snapshot()?
            .room_udn(room)
            .cloned()
            .ok_or_else(|| StateError::UnknownRoom(room.to_string()).into())
    }

    // ========================================================================
    // Transport
    // ========================================================================

    pub fn play<S: AsRef<str>>(&self, rooms: &[S]) -> Result<()> {
        let location = self.zone_location(rooms)?;
        self.upnp.execute::<PlayOperation>(
            &location,
            &PlayRequest {
                instance_id: 0,
                speed: "1".to_string(),
            },
        )?;
        Ok(())
    }

    pub fn pause<S: AsRef<str>>(&self, rooms: &[S]) -> Result<()> {
        let location = self.zone_location(rooms)?;
        self.upnp
            .execute::<PauseOperation>(&location, &PauseRequest { instance_id: 0 })?;
        Ok(())
    }

    pub fn stop_playback<S: AsRef<str>>(&self, rooms: &[S]) -> Result<()> {
        let location = self.zone_location(rooms)?;
        self.upnp
            .execute::<StopOperation>(&location, &StopRequest { instance_id: 0 })?;
        Ok(())
    }

    pub fn next_track<S: AsRef<str>>(&self, rooms: &[S]) -> Result<()> {
        let location = self.zone_location(rooms)?;
        self.upnp
            .execute::<NextOperation>(&location, &NextRequest { instance_id: 0 })?;
        Ok(())
    }

    pub fn previous_track<S: AsRef<str>>(&self, rooms: &[S]) -> Result<()> {
        let location = self.zone_location(rooms)?;
        self.upnp
            .execute::<PreviousOperation>(&location, &PreviousRequest { instance_id: 0 })?;
        Ok(())
    }

    /// Seek to an absolute position such as `0:01:30`
    pub fn seek<S: AsRef<str>>(&self, rooms: &[S], target: &str) -> Result<()> {
        let location = self.zone_location(rooms)?;
        self.upnp.execute::<SeekOperation>(
            &location,
            &SeekRequest {
                instance_id: 0,
                unit: SEEK_ABS_TIME.to_string(),
                target: target.to_string(),
            },
        )?;
        Ok(())
    }

    // ========================================================================
    // Volume
    // ========================================================================

    pub fn volume<S: AsRef<str>>(&self, rooms: &[S]) -> Result<u8> {
        let location = self.zone_location(rooms)?;
        Ok(self
            .upnp
            .execute::<GetVolumeOperation>(&location, &ChannelRequest::default())?)
    }

    pub fn set_volume<S: AsRef<str>>(&self, rooms: &[S], volume: u8) -> Result<()> {
        let location = self.zone_location(rooms)?;
        self.upnp.execute::<SetVolumeOperation>(
            &location,
            &SetVolumeRequest {
                instance_id: 0,
                channel: MASTER_CHANNEL.to_string(),
                desired_volume: volume,
            },
        )?;
        Ok(())
    }

    /// Move the zone volume by `amount`, negative to lower it
    pub fn change_volume<S: AsRef<str>>(&self, rooms: &[S], amount: i32) -> Result<()> {
        let location = self.zone_location(rooms)?;
        self.upnp.execute::<ChangeVolumeOperation>(
            &location,
            &ChangeVolumeRequest {
                instance_id: 0,
                amount,
            },
        )?;
        Ok(())
    }

    /// Set the same volume on rooms of a zone
    ///
    /// `rooms` narrows the change to some members; `None` means all of them.
    pub fn set_room_volume<S: AsRef<str>>(
        &self,
        zone_rooms: &[S],
        volume: u8,
        rooms: Option<&[S]>,
    ) -> Result<()> {
        let snapshot = self.snapshot()?;
        let location = snapshot.zone_location(zone_rooms)?.to_string();
        let targets = snapshot.room_udns(rooms.unwrap_or(zone_rooms))?;
        drop(snapshot);

        for room in targets {
            self.upnp.execute::<SetRoomVolumeOperation>(
                &location,
                &SetRoomVolumeRequest {
                    instance_id: 0,
                    room: room.as_str().to_string(),
                    desired_volume: volume,
                },
            )?;
        }
        Ok(())
    }

    pub fn mute<S: AsRef<str>>(&self, rooms: &[S]) -> Result<bool> {
        let location = self.zone_location(rooms)?;
        Ok(self
            .upnp
            .execute::<GetMuteOperation>(&location, &ChannelRequest::default())?)
    }

    pub fn set_mute<S: AsRef<str>>(&self, rooms: &[S], mute: bool) -> Result<()> {
        let location = self.zone_location(rooms)?;
        self.upnp.execute::<SetMuteOperation>(
            &location,
            &SetMuteRequest {
                instance_id: 0,
                channel: MASTER_CHANNEL.to_string(),
                desired_mute: mute,
            },
        )?;
        Ok(())
    }

    /// Play a confirmation sound on the first speaker of `room`
    pub fn play_system_sound(&self, room: &str, sound: SystemSound) -> Result<()> {
        let location = self.room_renderer_location(room)?;
        self.upnp.execute::<PlaySystemSoundOperation>(
            &location,
            &PlaySystemSoundRequest {
                instance_id: 0,
                sound,
            },
        )?;
        Ok(())
    }

    /// Location of the first renderer in `room` the snapshot can reach
    pub(crate) fn room_renderer_location(&self, room: &str) -> Result<String> {
        let snapshot = self.snapshot()?;
        let room_state = snapshot
            .room(room)
            .ok_or_else(|| StateError::UnknownRoom(room.to_string()))?;
        room_state
            .renderers
            .iter()
            .find_map(|id| snapshot.device_location(id))
            .map(str::to_string)
            .ok_or_else(|| SdkError::NoRenderer(room.to_string()))
    }

    // ========================================================================
    // Renderer queries
    // ========================================================================

    pub fn media_info<S: AsRef<str>>(&self, rooms: &[S]) -> Result<MediaInfo> {
        let location = self.zone_location(rooms)?;
        Ok(self
            .upnp
            .execute::<GetMediaInfoOperation>(&location, &InstanceRequest::default())?)
    }

    pub fn transport_info<S: AsRef<str>>(&self, rooms: &[S]) -> Result<TransportInfo> {
        let location = self.zone_location(rooms)?;
        Ok(self
            .upnp
            .execute::<GetTransportInfoOperation>(&location, &InstanceRequest::default())?)
    }

    pub fn position_info<S: AsRef<str>>(&self, rooms: &[S]) -> Result<PositionInfo> {
        let location = self.zone_location(rooms)?;
        Ok(self
            .upnp
            .execute::<GetPositionInfoOperation>(&location, &InstanceRequest::default())?)
    }

    /// Absolute position within the current track
    pub fn position<S: AsRef<str>>(&self, rooms: &[S]) -> Result<String> {
        Ok(self.position_info(rooms)?.abs_time)
    }

    pub fn transport_settings<S: AsRef<str>>(&self, rooms: &[S]) -> Result<TransportSettings> {
        let location = self.zone_location(rooms)?;
        Ok(self
            .upnp
            .execute::<GetTransportSettingsOperation>(&location, &InstanceRequest::default())?)
    }

    pub fn play_mode<S: AsRef<str>>(&self, rooms: &[S]) -> Result<PlayMode> {
        Ok(self.transport_settings(rooms)?.play_mode)
    }

    pub fn set_play_mode<S: AsRef<str>>(&self, rooms: &[S], mode: PlayMode) -> Result<()> {
        let location = self.zone_location(rooms)?;
        self.upnp.execute::<SetPlayModeOperation>(
            &location,
            &SetPlayModeRequest {
                instance_id: 0,
                new_play_mode: mode,
            },
        )?;
        Ok(())
    }
}
