// Integration tests for `BridgeClient` over the real HTTP transport,
// using wiremock as a stand-in bridge.

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hue_lights_rs::{
    Bridge, BridgeClient, CredentialStore, Error, Light, LightState, MemoryStore, RateLimiter,
    ReqwestTransport,
};

const DESCRIPTION: &str = "<root><device>\
    <friendlyName>Hue Bridge (192.168.1.2)</friendlyName>\
    <modelName>Philips hue bridge 2015</modelName>\
    <UDN>uuid:2f402f80-da50-11e1-9b23-001788102201</UDN>\
    </device></root>";

// ── Helpers ─────────────────────────────────────────────────────────

/// A mock bridge plus a client pointed at it. The bridge record borrows the
/// mock server's host:port as its address.
async fn setup() -> (MockServer, BridgeClient<ReqwestTransport, MemoryStore>, Bridge) {
    let server = MockServer::start().await;
    let client = BridgeClient::with_parts(
        ReqwestTransport::new(),
        CredentialStore::new(MemoryStore::new()),
        RateLimiter::default(),
    );

    let host = server.uri().trim_start_matches("http://").to_string();
    let mut bridge = Bridge::new(&host, "Hue Bridge");
    bridge.account = Some("testuser".to_string());

    (server, client, bridge)
}

fn hallway_light() -> Light {
    Light {
        id: "1".to_string(),
        name: "Hallway".to_string(),
        kind: "Extended color light".to_string(),
        state: LightState {
            on: true,
            bri: 144,
            xy: [0.3127, 0.3290],
        },
        rgb: "#ffffff".parse().unwrap(),
    }
}

// ── Identity verification ───────────────────────────────────────────

#[tokio::test]
async fn test_verify_identity_success() {
    let (server, client, _) = setup().await;

    Mock::given(method("GET"))
        .and(path("/description.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(DESCRIPTION, "text/xml"))
        .mount(&server)
        .await;

    let udn = client
        .verify_identity(&format!("{}/description.xml", server.uri()))
        .await
        .unwrap();
    assert_eq!(udn, "uuid:2f402f80-da50-11e1-9b23-001788102201");
}

#[tokio::test]
async fn test_verify_identity_rejects_non_xml() {
    let (server, client, _) = setup().await;

    Mock::given(method("GET"))
        .and(path("/description.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"not": "xml"})))
        .mount(&server)
        .await;

    let result = client
        .verify_identity(&format!("{}/description.xml", server.uri()))
        .await;
    assert!(
        matches!(result, Err(Error::UnexpectedContentType(_))),
        "expected UnexpectedContentType, got: {result:?}"
    );
}

#[tokio::test]
async fn test_verify_identity_rejects_other_devices() {
    let (server, client, _) = setup().await;

    let speaker = "<root><device><friendlyName>Kitchen Speaker</friendlyName>\
        <UDN>uuid:not-a-bridge</UDN></device></root>";
    Mock::given(method("GET"))
        .and(path("/description.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(speaker, "text/xml"))
        .mount(&server)
        .await;

    let result = client
        .verify_identity(&format!("{}/description.xml", server.uri()))
        .await;
    assert!(matches!(result, Err(Error::NotAHueBridge(_))));
}

// ── Pairing ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_pair_success() {
    let (server, client, mut bridge) = setup().await;
    bridge.account = None;

    Mock::given(method("POST"))
        .and(path("/api"))
        .and(body_json(json!({"devicetype": "hue_lights_rs"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"success": {"username": "83b7780291a6"}}])),
        )
        .mount(&server)
        .await;

    client.pair(&mut bridge).await.unwrap();

    assert_eq!(bridge.account.as_deref(), Some("83b7780291a6"));
    let stored = client.accounts().bridges();
    assert_eq!(stored.len(), 1);
    assert!(stored[0].is_paired());
}

#[tokio::test]
async fn test_pair_propagates_bridge_errors() {
    let (server, client, mut bridge) = setup().await;
    bridge.account = None;

    Mock::given(method("POST"))
        .and(path("/api"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!([{"error": {"type": 7, "address": "", "description": "invalid value"}}]),
        ))
        .mount(&server)
        .await;

    let result = client.pair(&mut bridge).await;
    assert!(
        matches!(result, Err(Error::PairingFailed(_))),
        "expected PairingFailed, got: {result:?}"
    );
    assert!(client.accounts().bridges().is_empty());
}

// ── Lights ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_lights() {
    let (server, client, bridge) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/testuser/lights"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "1": {
                "state": {
                    "on": true,
                    "bri": 254,
                    "hue": 8632,
                    "sat": 117,
                    "xy": [0.3127, 0.3290],
                    "reachable": true
                },
                "type": "Extended color light",
                "name": "Living room end table"
            }
        })))
        .mount(&server)
        .await;

    let lights = client.list_lights(&bridge).await;

    assert_eq!(lights.len(), 1);
    assert_eq!(lights[0].id, "1");
    assert_eq!(lights[0].name, "Living room end table");
    assert_eq!(lights[0].rgb.hex(), "#ffffff");
}

#[tokio::test]
async fn test_list_lights_swallows_server_failures() {
    let (server, client, bridge) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/testuser/lights"))
        .respond_with(ResponseTemplate::new(503).set_body_string("not right now"))
        .mount(&server)
        .await;

    assert!(client.list_lights(&bridge).await.is_empty());
    assert!(client.try_list_lights(&bridge).await.is_err());
}

#[tokio::test]
async fn test_toggle_light() {
    let (server, client, bridge) = setup().await;
    let mut light = hallway_light();

    Mock::given(method("PUT"))
        .and(path("/api/testuser/lights/1/state"))
        .and(body_json(json!({"on": false})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"success": {"/lights/1/state/on": false}}])),
        )
        .expect(1)
        .mount(&server)
        .await;

    client.toggle_light(&bridge, &mut light).await.unwrap();
    assert!(!light.state.on);
}

#[tokio::test]
async fn test_change_color() {
    let (server, client, bridge) = setup().await;
    let mut light = hallway_light();

    Mock::given(method("PUT"))
        .and(path("/api/testuser/lights/1/state"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"success": {"/lights/1/state/xy": [0.64, 0.33]}}])),
        )
        .expect(1)
        .mount(&server)
        .await;

    client
        .change_color(&bridge, &mut light, "#ff0000", true)
        .await
        .unwrap();

    assert_eq!(light.rgb.hex(), "#ff0000");
    assert_eq!(light.state.bri, 144, "brightness was locked");
    assert!((light.state.xy[0] - 0.6400).abs() < 0.001);
}
