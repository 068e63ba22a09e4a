//! Non-blocking twins of the zone, transport and media commands
//!
//! These go through the async web service and UPnP clients, which share the
//! builder's `reqwest` session when one was given. Room names are resolved
//! against the snapshot exactly like the blocking commands do.

use std::time::Instant;

use raumfeld_api::didl::{self, DEFAULT_METADATA};
use raumfeld_api::operations::av_transport::{
    NextRequest, PauseRequest, PlayRequest, PreviousRequest, SeekRequest,
    SetAVTransportURIRequest, SetPlayModeRequest, StopRequest, SEEK_ABS_TIME,
};
use raumfeld_api::operations::content_directory::{BrowseRequest, SearchRequest};
use raumfeld_api::operations::rendering_control::{
    ChangeVolumeRequest, PlaySystemSoundRequest, SetMuteRequest, SetRoomVolumeRequest,
    SetVolumeRequest, MASTER_CHANNEL,
};
use raumfeld_api::operations::{
    BrowseFlag, BrowseOperation, ChangeVolumeOperation, ChannelRequest, DirectoryResult,
    GetMediaInfoOperation, GetMuteOperation, GetPositionInfoOperation, GetTransportInfoOperation,
    GetTransportSettingsOperation, GetVolumeOperation, InstanceRequest, MediaInfo, NextOperation,
    PauseOperation, PlayMode, PlayOperation, PlaySystemSoundOperation, PositionInfo,
    PreviousOperation, SearchOperation, SeekOperation, SetAVTransportURIOperation,
    SetMuteOperation, SetPlayModeOperation, SetRoomVolumeOperation, SetVolumeOperation,
    StopOperation, SystemSound, TransportInfo, TransportSettings,
};
use raumfeld_api::UpnpOperation;
use raumfeld_state::{RoomId, ZoneId};

use crate::error::{Result, SdkError};
use crate::host::RaumfeldHost;
use crate::media::{PlayableMedia, CONTAINER_ALL_TRACKS, PLAY_SORT_CRITERIA};

impl RaumfeldHost {
    /// Run `Op` against the renderer of the zone made up of `rooms`
    async fn execute_on_zone<Op: UpnpOperation, S: AsRef<str>>(
        &self,
        rooms: &[S],
        request: &Op::Request,
    ) -> Result<Op::Response> {
        let location = self.zone_location(rooms)?;
        Ok(self.async_upnp.execute::<Op>(&location, request).await?)
    }

    // ========================================================================
    // Zone layout
    // ========================================================================

    /// See [`RaumfeldHost::create_zone`]
    pub async fn create_zone_async<S: AsRef<str>>(&self, rooms: &[S]) -> Result<ZoneId> {
        let (udns, old_zone) = {
            let snapshot = self.snapshot()?;
            let udns = snapshot.room_udns(rooms)?;
            let old_zone = snapshot.zone_for_room_ids(&udns).map(|z| z.id.clone());
            (udns, old_zone)
        };

        let udn_strs: Vec<&str> = udns.iter().map(RoomId::as_str).collect();
        self.async_web.connect_rooms_to_zone(None, &udn_strs).await?;
        tracing::info!(rooms = ?udn_strs, "Requested zone creation");

        let deadline = Instant::now() + self.zone_wait.timeout;
        loop {
            if let Some(outcome) = self.check_new_zone(&udns, old_zone.as_ref(), deadline) {
                return outcome;
            }
            tokio::time::sleep(self.zone_wait.poll).await;
        }
    }

    pub async fn drop_room_async(&self, room: &str) -> Result<()> {
        let udn = self.room_udn(room)?;
        self.async_web.drop_room_job(udn.as_str()).await?;
        Ok(())
    }

    pub async fn add_room_to_zone_async<S: AsRef<str>>(
        &self,
        zone_rooms: &[S],
        room: &str,
    ) -> Result<()> {
        let zone = self.zone_udn(zone_rooms)?;
        let udn = self.room_udn(room)?;
        self.async_web
            .connect_room_to_zone(Some(zone.as_str()), Some(udn.as_str()))
            .await?;
        Ok(())
    }

    pub async fn enter_automatic_standby_async(&self, room: &str) -> Result<()> {
        let udn = self.room_udn(room)?;
        self.async_web.enter_automatic_standby(udn.as_str()).await?;
        Ok(())
    }

    pub async fn enter_manual_standby_async(&self, room: &str) -> Result<()> {
        let udn = self.room_udn(room)?;
        self.async_web.enter_manual_standby(udn.as_str()).await?;
        Ok(())
    }

    pub async fn leave_standby_async(&self, room: &str) -> Result<()> {
        let udn = self.room_udn(room)?;
        self.async_web.leave_standby(udn.as_str()).await?;
        Ok(())
    }

    // ========================================================================
    // Transport
    // ========================================================================

    pub async fn play_async<S: AsRef<str>>(&self, rooms: &[S]) -> Result<()> {
        let request = PlayRequest {
            instance_id: 0,
            speed: "1".to_string(),
        };
        self.execute_on_zone::<PlayOperation, _>(rooms, &request).await
    }

    pub async fn pause_async<S: AsRef<str>>(&self, rooms: &[S]) -> Result<()> {
        self.execute_on_zone::<PauseOperation, _>(rooms, &PauseRequest { instance_id: 0 })
            .await
    }

    pub async fn stop_playback_async<S: AsRef<str>>(&self, rooms: &[S]) -> Result<()> {
        self.execute_on_zone::<StopOperation, _>(rooms, &StopRequest { instance_id: 0 })
            .await
    }

    pub async fn next_track_async<S: AsRef<str>>(&self, rooms: &[S]) -> Result<()> {
        self.execute_on_zone::<NextOperation, _>(rooms, &NextRequest { instance_id: 0 })
            .await
    }

    pub async fn previous_track_async<S: AsRef<str>>(&self, rooms: &[S]) -> Result<()> {
        self.execute_on_zone::<PreviousOperation, _>(rooms, &PreviousRequest { instance_id: 0 })
            .await
    }

    pub async fn seek_async<S: AsRef<str>>(&self, rooms: &[S], target: &str) -> Result<()> {
        let request = SeekRequest {
            instance_id: 0,
            unit: SEEK_ABS_TIME.to_string(),
            target: target.to_string(),
        };
        self.execute_on_zone::<SeekOperation, _>(rooms, &request).await
    }

    // ========================================================================
    // Volume
    // ========================================================================

    pub async fn volume_async<S: AsRef<str>>(&self, rooms: &[S]) -> Result<u8> {
        self.execute_on_zone::<GetVolumeOperation, _>(rooms, &ChannelRequest::default())
            .await
    }

    pub async fn set_volume_async<S: AsRef<str>>(&self, rooms: &[S], volume: u8) -> Result<()> {
        let request = SetVolumeRequest {
            instance_id: 0,
            channel: MASTER_CHANNEL.to_string(),
            desired_volume: volume,
        };
        self.execute_on_zone::<SetVolumeOperation, _>(rooms, &request).await
    }

    pub async fn change_volume_async<S: AsRef<str>>(&self, rooms: &[S], amount: i32) -> Result<()> {
        let request = ChangeVolumeRequest {
            instance_id: 0,
            amount,
        };
        self.execute_on_zone::<ChangeVolumeOperation, _>(rooms, &request).await
    }

    pub async fn set_room_volume_async<S: AsRef<str>>(
        &self,
        zone_rooms: &[S],
        volume: u8,
        rooms: Option<&[S]>,
    ) -> Result<()> {
        let (location, targets) = {
            let snapshot = self.snapshot()?;
            let location = snapshot.zone_location(zone_rooms)?.to_string();
            (location, snapshot.room_udns(rooms.unwrap_or(zone_rooms))?)
        };

        for room in targets {
            let request = SetRoomVolumeRequest {
                instance_id: 0,
                room: room.as_str().to_string(),
                desired_volume: volume,
            };
            self.async_upnp
                .execute::<SetRoomVolumeOperation>(&location, &request)
                .await?;
        }
        Ok(())
    }

    pub async fn mute_async<S: AsRef<str>>(&self, rooms: &[S]) -> Result<bool> {
        self.execute_on_zone::<GetMuteOperation, _>(rooms, &ChannelRequest::default())
            .await
    }

    pub async fn set_mute_async<S: AsRef<str>>(&self, rooms: &[S], mute: bool) -> Result<()> {
        let request = SetMuteRequest {
            instance_id: 0,
            channel: MASTER_CHANNEL.to_string(),
            desired_mute: mute,
        };
        self.execute_on_zone::<SetMuteOperation, _>(rooms, &request).await
    }

    pub async fn play_system_sound_async(&self, room: &str, sound: SystemSound) -> Result<()> {
        let location = self.room_renderer_location(room)?;
        self.async_upnp
            .execute::<PlaySystemSoundOperation>(
                &location,
                &PlaySystemSoundRequest {
                    instance_id: 0,
                    sound,
                },
            )
            .await?;
        Ok(())
    }

    // ========================================================================
    // Renderer queries
    // ========================================================================

    pub async fn media_info_async<S: AsRef<str>>(&self, rooms: &[S]) -> Result<MediaInfo> {
        self.execute_on_zone::<GetMediaInfoOperation, _>(rooms, &InstanceRequest::default())
            .await
    }

    pub async fn transport_info_async<S: AsRef<str>>(&self, rooms: &[S]) -> Result<TransportInfo> {
        self.execute_on_zone::<GetTransportInfoOperation, _>(rooms, &InstanceRequest::default())
            .await
    }

    pub async fn position_info_async<S: AsRef<str>>(&self, rooms: &[S]) -> Result<PositionInfo> {
        self.execute_on_zone::<GetPositionInfoOperation, _>(rooms, &InstanceRequest::default())
            .await
    }

    pub async fn transport_settings_async<S: AsRef<str>>(
        &self,
        rooms: &[S],
    ) -> Result<TransportSettings> {
        self.execute_on_zone::<GetTransportSettingsOperation, _>(rooms, &InstanceRequest::default())
            .await
    }

    pub async fn set_play_mode_async<S: AsRef<str>>(&self, rooms: &[S], mode: PlayMode) -> Result<()> {
        let request = SetPlayModeRequest {
            instance_id: 0,
            new_play_mode: mode,
        };
        self.execute_on_zone::<SetPlayModeOperation, _>(rooms, &request).await
    }

    // ========================================================================
    // Media server
    // ========================================================================

    pub async fn browse_async(&self, object_id: &str, flag: BrowseFlag) -> Result<DirectoryResult> {
        let location = self.media_server_location()?;
        Ok(self
            .async_upnp
            .execute::<BrowseOperation>(&location, &BrowseRequest::new(object_id, flag))
            .await?)
    }

    pub async fn search_async(&self, request: &SearchRequest) -> Result<DirectoryResult> {
        let location = self.media_server_location()?;
        Ok(self
            .async_upnp
            .execute::<SearchOperation>(&location, request)
            .await?)
    }

    pub async fn search_for_play_async(
        &self,
        container_id: &str,
        criteria: &str,
    ) -> Result<PlayableMedia> {
        let mut request = SearchRequest::new(container_id, criteria);
        request.requested_count = 1;
        request.sort_criteria = PLAY_SORT_CRITERIA.to_string();

        let result = self.search_async(&request).await?;
        let uri = didl::first_item_uri(&result.result)?;
        Ok(PlayableMedia {
            uri,
            metadata: result.result,
        })
    }

    pub async fn set_av_transport_uri_async<S: AsRef<str>>(
        &self,
        rooms: &[S],
        uri: &str,
        metadata: Option<&str>,
    ) -> Result<()> {
        let request = SetAVTransportURIRequest {
            instance_id: 0,
            current_uri: uri.to_string(),
            current_uri_metadata: metadata.unwrap_or(DEFAULT_METADATA).to_string(),
        };
        self.execute_on_zone::<SetAVTransportURIOperation, _>(rooms, &request)
            .await
    }

    pub async fn search_and_zone_play_async<S: AsRef<str>>(
        &self,
        rooms: &[S],
        criteria: &str,
        container_id: Option<&str>,
    ) -> Result<()> {
        let found = self
            .search_for_play_async(container_id.unwrap_or(CONTAINER_ALL_TRACKS), criteria)
            .await?;
        let uri = found
            .uri
            .ok_or_else(|| SdkError::NothingFound(criteria.to_string()))?;
        self.set_av_transport_uri_async(rooms, &uri, Some(&found.metadata))
            .await
    }
}
