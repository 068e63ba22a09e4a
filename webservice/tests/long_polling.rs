//! HTTP-level tests against a mock host web service

use std::time::Duration;

use mockito::Matcher;
use raumfeld_webservice::{
    AsyncWebServiceClient, Endpoint, PollOutcome, WebServiceClient, WebServiceError,
};

const ZONES: &str = r#"<zoneConfig>
    <zones>
        <zone udn="uuid:zone-1">
            <room name="Kitchen" udn="uuid:room-kitchen" powerState="ACTIVE"/>
        </zone>
    </zones>
</zoneConfig>"#;

#[test]
fn first_poll_sends_no_update_id() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/getZones")
        .match_header("updateID", Matcher::Missing)
        .match_header("Prefer", Matcher::Missing)
        .with_status(200)
        .with_header("updateID", "17")
        .with_body(ZONES)
        .create();

    let client = WebServiceClient::new(server.url());
    let outcome = client.poll(Endpoint::Zones, None).unwrap();

    mock.assert();
    match outcome {
        PollOutcome::Updated { update_id, body } => {
            assert_eq!(update_id.as_deref(), Some("17"));
            assert!(body.contains("uuid:zone-1"));
        }
        PollOutcome::NotModified => panic!("expected a document"),
    }
}

#[test]
fn later_poll_sends_update_id_and_prefer_wait() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/listDevices")
        .match_header("updateID", "17")
        .match_header("Prefer", "wait=2")
        .with_status(304)
        .create();

    let client = WebServiceClient::with_timeouts(
        server.url(),
        Duration::from_secs(5),
        Duration::from_secs(2),
    );
    let outcome = client.poll(Endpoint::Devices, Some("17")).unwrap();

    mock.assert();
    assert_eq!(outcome, PollOutcome::NotModified);
}

#[test]
fn server_error_is_transient_status() {
    let mut server = mockito::Server::new();
    server.mock("GET", "/getHostInfo").with_status(503).create();

    let client = WebServiceClient::new(server.url());
    let err = client.poll(Endpoint::HostInfo, None).unwrap_err();

    assert!(matches!(
        err,
        WebServiceError::Status { path: "/getHostInfo", status: 503 }
    ));
    assert!(err.is_transient());
}

#[test]
fn unreachable_host_is_network_error() {
    // Port 9 on localhost is discard; nothing listens there in test environments
    let client = WebServiceClient::with_timeouts(
        "http://127.0.0.1:9",
        Duration::from_millis(500),
        Duration::ZERO,
    );
    let err = client.poll(Endpoint::Zones, None).unwrap_err();
    assert!(matches!(err, WebServiceError::Network(_)));
}

#[test]
fn typed_getters_parse_documents() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/getZones")
        .with_status(200)
        .with_header("updateID", "1")
        .with_body(ZONES)
        .create();
    server
        .mock("GET", "/SystemStateChannel")
        .with_status(200)
        .with_body(r#"<systemState><updateAvailable value="false"/></systemState>"#)
        .create();

    let client = WebServiceClient::new(server.url());
    let zones = client.zone_config().unwrap();
    assert_eq!(zones.zones.zones[0].rooms[0].name, "Kitchen");
    assert!(!client.system_state().unwrap().update_available());
}

#[test]
fn connect_rooms_to_zone_sends_joined_udns() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/connectRoomsToZone")
        .match_query(Matcher::UrlEncoded(
            "roomUDNs".into(),
            "uuid:room-a,uuid:room-b".into(),
        ))
        .with_status(200)
        .create();

    let client = WebServiceClient::new(server.url());
    client
        .connect_rooms_to_zone(None, &["uuid:room-a", "uuid:room-b"])
        .unwrap();
    mock.assert();
}

#[test]
fn standby_calls_send_room_udn() {
    let mut server = mockito::Server::new();
    let manual = server
        .mock("GET", "/enterManualStandby")
        .match_query(Matcher::UrlEncoded("roomUDN".into(), "uuid:room-a".into()))
        .with_status(200)
        .create();
    let leave = server
        .mock("GET", "/leaveStandby")
        .match_query(Matcher::UrlEncoded("roomUDN".into(), "uuid:room-a".into()))
        .with_status(200)
        .create();

    let client = WebServiceClient::new(server.url());
    client.enter_manual_standby("uuid:room-a").unwrap();
    client.leave_standby("uuid:room-a").unwrap();
    manual.assert();
    leave.assert();
}

#[test]
fn host_is_valid_requires_host_name() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/getHostInfo")
        .with_status(200)
        .with_body("<hostInfo><hostName>raumfeld</hostName></hostInfo>")
        .create();
    assert!(WebServiceClient::new(server.url()).host_is_valid());

    let mut other = mockito::Server::new();
    other
        .mock("GET", "/getHostInfo")
        .with_status(200)
        .with_body("<hostInfo><roomName>Kitchen</roomName></hostInfo>")
        .create();
    assert!(!WebServiceClient::new(other.url()).host_is_valid());
}

#[test]
fn ping_returns_response_fields() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/Ping")
        .with_status(200)
        .with_body("<response><model>Connector</model></response>")
        .create();

    let pong = WebServiceClient::new(server.url()).ping().unwrap();
    assert_eq!(pong.get("model"), Some("Connector"));
}

#[tokio::test]
async fn async_poll_reads_update_id() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/getZones")
        .match_header("updateID", "3")
        .with_status(200)
        .with_header("updateID", "4")
        .with_body(ZONES)
        .create_async()
        .await;

    let client = AsyncWebServiceClient::with_client(server.url(), reqwest::Client::new());
    let outcome = client.poll(Endpoint::Zones, Some("3")).await.unwrap();

    mock.assert_async().await;
    assert!(matches!(
        outcome,
        PollOutcome::Updated { update_id: Some(ref id), .. } if id == "4"
    ));
}

#[tokio::test]
async fn async_not_modified_and_errors() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/getZones")
        .with_status(304)
        .create_async()
        .await;
    server
        .mock("GET", "/listDevices")
        .with_status(404)
        .create_async()
        .await;

    let client = AsyncWebServiceClient::new(server.url());
    assert_eq!(
        client.poll(Endpoint::Zones, Some("9")).await.unwrap(),
        PollOutcome::NotModified
    );
    let err = client.poll(Endpoint::Devices, None).await.unwrap_err();
    assert!(!err.is_transient());
}

#[tokio::test]
async fn async_zone_and_standby_calls() {
    let mut server = mockito::Server::new_async().await;
    let connect = server
        .mock("GET", "/connectRoomToZone")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("zoneUDN".into(), "uuid:zone-1".into()),
            Matcher::UrlEncoded("roomUDN".into(), "uuid:room-a".into()),
        ]))
        .with_status(200)
        .create_async()
        .await;
    let mut standby = Vec::new();
    for path in ["/enterAutomaticStandby", "/enterManualStandby", "/leaveStandby"] {
        standby.push(
            server
                .mock("GET", path)
                .match_query(Matcher::UrlEncoded("roomUDN".into(), "uuid:room-a".into()))
                .with_status(200)
                .create_async()
                .await,
        );
    }

    let client = AsyncWebServiceClient::new(server.url());
    client
        .connect_room_to_zone(Some("uuid:zone-1"), Some("uuid:room-a"))
        .await
        .unwrap();
    client.enter_automatic_standby("uuid:room-a").await.unwrap();
    client.enter_manual_standby("uuid:room-a").await.unwrap();
    client.leave_standby("uuid:room-a").await.unwrap();

    connect.assert_async().await;
    for mock in &standby {
        mock.assert_async().await;
    }
}
