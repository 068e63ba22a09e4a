//! WebServiceSource against a mock host and zone renderer

use mockito::{Matcher, Server, ServerGuard};
use raumfeld_state::{
    FetchError, PlaybackState, PowerState, UpdaterConfig, WebServiceSource, ZoneId, ZoneSource,
};

const AVT: &str = "urn:schemas-upnp-org:service:AVTransport:1";

fn envelope(body: &str) -> String {
    format!(
        r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body>{}</s:Body></s:Envelope>"#,
        body
    )
}

fn mock_host(server: &mut ServerGuard) {
    let renderer = format!("{}/zone.xml", server.url());

    server
        .mock("GET", "/getHostInfo")
        .with_status(200)
        .with_header("updateID", "1")
        .with_body("<hostInfo><hostName>teufel-host</hostName><roomName>Kitchen</roomName></hostInfo>")
        .create();
    server
        .mock("GET", "/getZones")
        .match_header("updateID", Matcher::Missing)
        .with_status(200)
        .with_header("updateID", "5")
        .with_body(
            r#"<zoneConfig>
                <zones>
                    <zone udn="uuid:zone-1">
                        <room udn="uuid:room-k" name="Kitchen" powerState="ACTIVE"/>
                        <room udn="uuid:room-b" name="Bath" powerState="MANUAL_STANDBY"/>
                    </zone>
                </zones>
                <unassignedRooms>
                    <room udn="uuid:room-a" name="Attic"/>
                </unassignedRooms>
            </zoneConfig>"#,
        )
        .create();
    server
        .mock("GET", "/listDevices")
        .with_status(200)
        .with_body(format!(
            r#"<devices>
                <device udn="uuid:zone-1" type="urn:schemas-upnp-org:device:MediaRenderer:1" location="{}">Kitchen, Bath</device>
                <device udn="uuid:ms" type="urn:schemas-upnp-org:device:MediaServer:1" location="http://127.0.0.1:9/ms.xml">Media Server</device>
            </devices>"#,
            renderer
        ))
        .create();
    server
        .mock("GET", "/SystemStateChannel")
        .with_status(200)
        .with_body(r#"<systemState><updateAvailable value="true"/></systemState>"#)
        .create();

    server
        .mock("GET", "/zone.xml")
        .with_status(200)
        .with_body(format!(
            r#"<root xmlns="urn:schemas-upnp-org:device-1-0"><device>
                <serviceList><service>
                    <serviceType>{}</serviceType>
                    <controlURL>/avt/control</controlURL>
                </service></serviceList>
            </device></root>"#,
            AVT
        ))
        .create();
    server
        .mock("POST", "/avt/control")
        .match_header("SOAPACTION", format!("\"{}#GetMediaInfo\"", AVT).as_str())
        .with_status(200)
        .with_body(envelope(&format!(
            r#"<u:GetMediaInfoResponse xmlns:u="{}">
                <NrTracks>1</NrTracks><MediaDuration>0:03:00</MediaDuration>
                <CurrentURI>http://stream/track.flac</CurrentURI>
                <CurrentURIMetaData>&lt;DIDL-Lite xmlns:dc="http://purl.org/dc/elements/1.1/"&gt;&lt;item id="1" parentID="0"&gt;&lt;dc:title&gt;Morning&lt;/dc:title&gt;&lt;/item&gt;&lt;/DIDL-Lite&gt;</CurrentURIMetaData>
                <NextURI></NextURI><NextURIMetaData></NextURIMetaData>
                <PlayMedium>NETWORK</PlayMedium>
            </u:GetMediaInfoResponse>"#,
            AVT
        )))
        .create();
    server
        .mock("POST", "/avt/control")
        .match_header("SOAPACTION", format!("\"{}#GetTransportInfo\"", AVT).as_str())
        .with_status(200)
        .with_body(envelope(&format!(
            r#"<u:GetTransportInfoResponse xmlns:u="{}">
                <CurrentTransportState>PLAYING</CurrentTransportState>
                <CurrentTransportStatus>OK</CurrentTransportStatus>
                <CurrentSpeed>1</CurrentSpeed>
            </u:GetTransportInfoResponse>"#,
            AVT
        )))
        .create();
}

#[test]
fn fetch_assembles_snapshot() {
    let mut server = Server::new();
    mock_host(&mut server);

    let mut source = WebServiceSource::new(server.url(), &UpdaterConfig::default());
    let snapshot = source.fetch().unwrap();

    assert_eq!(snapshot.host_name(), Some("teufel-host"));
    assert!(snapshot.update_available);
    assert_eq!(
        snapshot.zones(),
        vec![vec!["Bath".to_string(), "Kitchen".to_string()]]
    );
    assert_eq!(snapshot.room_names(), vec!["Kitchen", "Bath", "Attic"]);
    assert_eq!(
        snapshot.power_state("Bath").unwrap(),
        Some(&PowerState::ManualStandby)
    );
    assert_eq!(
        snapshot.media_server_location().unwrap(),
        "http://127.0.0.1:9/ms.xml"
    );

    let zone = &snapshot.zones[&ZoneId::new("uuid:zone-1")];
    assert_eq!(zone.playback, PlaybackState::Playing);
    let media = zone.media.as_ref().expect("media info recorded");
    assert_eq!(media.uri, "http://stream/track.flac");
    assert_eq!(media.title.as_deref(), Some("Morning"));
}

#[test]
fn second_fetch_sends_update_id() {
    let mut server = Server::new();
    mock_host(&mut server);
    let not_modified = server
        .mock("GET", "/getZones")
        .match_header("updateID", "5")
        .with_status(304)
        .expect(1)
        .create();

    let mut source = WebServiceSource::new(server.url(), &UpdaterConfig::default());
    let first = source.fetch().unwrap();
    let second = source.fetch().unwrap();

    not_modified.assert();
    assert_eq!(first.zones(), second.zones());
}

#[test]
fn unreachable_host_is_transient() {
    let mut source = WebServiceSource::new("http://127.0.0.1:1", &UpdaterConfig::default());
    assert!(matches!(source.fetch(), Err(FetchError::Transient(_))));
}

#[test]
fn missing_devices_document_is_incomplete() {
    let mut server = Server::new();
    server
        .mock("GET", "/getHostInfo")
        .with_status(200)
        .with_body("<hostInfo><hostName>h</hostName></hostInfo>")
        .create();
    server
        .mock("GET", "/getZones")
        .with_status(200)
        .with_body("<zoneConfig><zones/></zoneConfig>")
        .create();
    server
        .mock("GET", "/listDevices")
        .with_status(304)
        .create();
    server
        .mock("GET", "/SystemStateChannel")
        .with_status(304)
        .create();

    let mut source = WebServiceSource::new(server.url(), &UpdaterConfig::default());
    match source.fetch() {
        Err(FetchError::Incomplete(missing)) => assert_eq!(missing, vec!["devices"]),
        other => panic!("expected incomplete state, got {:?}", other),
    }
}
