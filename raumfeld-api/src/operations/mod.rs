//! Raumfeld UPnP operations organized by service

pub mod av_transport;
pub mod content_directory;
pub mod rendering_control;

// Re-export commonly used operations
pub use av_transport::{
    GetMediaInfoOperation, GetPositionInfoOperation, GetTransportInfoOperation,
    GetTransportSettingsOperation, InstanceRequest, MediaInfo, NextOperation, PauseOperation,
    PlayMode, PlayOperation, PositionInfo, PreviousOperation, SeekOperation,
    SetAVTransportURIOperation, SetPlayModeOperation, StopOperation, TransportInfo,
    TransportSettings, TransportState,
};
pub use content_directory::{BrowseFlag, BrowseOperation, DirectoryResult, SearchOperation};
pub use rendering_control::{
    ChangeVolumeOperation, ChannelRequest, GetMuteOperation, GetVolumeOperation,
    PlaySystemSoundOperation, SetMuteOperation, SetRoomVolumeOperation, SetVolumeOperation,
    SystemSound,
};
