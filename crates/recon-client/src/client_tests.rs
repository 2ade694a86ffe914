//! Tests for the Recon client round trip, driven through a fake transport.

use std::sync::{Arc, Mutex};

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use recon_crypto::{COMMAND_PREFIX, CryptoError, decrypt, encrypt};

use super::*;

type Reply = Box<dyn Fn(&CommandRequest) -> std::result::Result<Vec<u8>, TransportError> + Send + Sync>;

/// Records every request body and answers with `reply`.
struct FakeTransport {
    requests: Mutex<Vec<Vec<u8>>>,
    reply: Reply,
}

impl FakeTransport {
    fn new(
        reply: impl Fn(&CommandRequest) -> std::result::Result<Vec<u8>, TransportError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            reply: Box::new(reply),
        }
    }

    fn replying(body: &str) -> Self {
        let body = body.as_bytes().to_vec();
        Self::new(move |_| Ok(body.clone()))
    }

    fn sent(&self) -> Vec<Vec<u8>> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for FakeTransport {
    async fn post(
        &self,
        _endpoint: &Endpoint,
        body: Vec<u8>,
        _timeout: Duration,
    ) -> std::result::Result<Vec<u8>, TransportError> {
        let request: CommandRequest = serde_json::from_slice(&body).unwrap();
        self.requests.lock().unwrap().push(body);
        (self.reply)(&request)
    }
}

const SECRET: &str = "your_password";

fn config() -> ClientConfig {
    ClientConfig {
        user: "admin".into(),
        password: SECRET.into(),
        ..Default::default()
    }
}

fn client(transport: FakeTransport) -> ReconClient<FakeTransport> {
    ReconClient::with_transport(&config(), transport).unwrap()
}

/// Build a success body the way the server does, under the given freshness values.
fn success_body(nonce: &str, timestamp: i64, response: &str, plain: Option<&str>) -> String {
    let key = derive_key(&SharedSecret::from(SECRET), nonce, timestamp);
    let mut body = serde_json::json!({
        "success": true,
        "user": "admin",
        "nonce": nonce,
        "timestamp": timestamp,
        "response": encrypt(response, &key).unwrap(),
    });
    if let Some(plain) = plain {
        body["plainResponse"] = encrypt(plain, &key).unwrap().into();
    }
    body.to_string()
}

/// A server that decrypts the command and echoes it back under fresh values.
fn echo_server() -> FakeTransport {
    FakeTransport::new(|req| {
        let key = derive_key(&SharedSecret::from(SECRET), &req.nonce, req.timestamp);
        let command = decrypt(&req.command, &key).unwrap();
        let command = command.strip_prefix(COMMAND_PREFIX).unwrap();
        let reply_nonce = format!("srv-{}", &req.nonce[..8]);
        Ok(success_body(&reply_nonce, req.timestamp + 1, &format!("ran: {command}"), None).into_bytes())
    })
}

// =============================================================================
// Construction
// =============================================================================

#[test]
fn invalid_config_fails_before_any_request() {
    let cfg = ClientConfig {
        password: String::new(),
        ..config()
    };
    let err = ReconClient::with_transport(&cfg, FakeTransport::replying("{}")).unwrap_err();
    assert!(matches!(err, ClientError::Config(_)));
}

#[test]
fn debug_does_not_leak_secret() {
    let client = client(FakeTransport::replying("{}"));
    let rendered = format!("{client:?}");
    assert!(!rendered.contains(SECRET));
    assert!(rendered.contains("admin"));
}

// =============================================================================
// Prepare
// =============================================================================

#[test]
fn prepare_encrypts_tagged_command_under_request_key() {
    let client = client(FakeTransport::replying("{}"));
    let req = client.prepare("say hi", false, 1_700_000_000).unwrap();

    assert_eq!(req.user, "admin");
    assert_eq!(req.timestamp, 1_700_000_000);
    assert!(!req.queue);
    assert_eq!(req.nonce.len(), 32);

    let key = derive_key(&SharedSecret::from(SECRET), &req.nonce, req.timestamp);
    assert_eq!(decrypt(&req.command, &key).unwrap(), "RCON_say hi");
}

#[test]
fn prepare_uses_fresh_nonce_each_call() {
    let client = client(FakeTransport::replying("{}"));
    let a = client.prepare("list", true, 1).unwrap();
    let b = client.prepare("list", true, 1).unwrap();
    assert_ne!(a.nonce, b.nonce);
    assert_ne!(a.command, b.command);
}

// =============================================================================
// End-to-end scenarios
// =============================================================================

#[tokio::test]
async fn scenario_a_request_json_shape() {
    let transport = FakeTransport::replying(&success_body("n", 1, "ok", None));
    let client = client(transport);
    client.send_command("say hi", true).await.unwrap();

    let sent = client.transport.sent();
    assert_eq!(sent.len(), 1);
    let json: serde_json::Value = serde_json::from_slice(&sent[0]).unwrap();

    assert!(json["user"].is_string());
    assert!(json["nonce"].is_string());
    assert!(json["timestamp"].is_i64());
    assert_eq!(json["queue"], serde_json::Value::Bool(true));
    let command = json["command"].as_str().unwrap();
    assert!(
        BASE64.decode(command).unwrap().len() >= 32,
        "blob must hold IV + at least one block"
    );

    let key = derive_key(
        &SharedSecret::from(SECRET),
        json["nonce"].as_str().unwrap(),
        json["timestamp"].as_i64().unwrap(),
    );
    assert_eq!(decrypt(command, &key).unwrap(), "RCON_say hi");
}

#[tokio::test]
async fn scenario_b_success_decrypts_with_response_values() {
    let body = success_body("abc123", 1_700_000_000, "OK", None);
    let client = client(FakeTransport::replying(&body));

    let output = client.send_command("say hi", true).await.unwrap();
    assert_eq!(output.response, "OK");
    assert_eq!(output.plain_response, "OK");
}

#[tokio::test]
async fn scenario_c_protocol_failure_passes_message_through() {
    let client = client(FakeTransport::replying(r#"{"success":false,"error":"bad auth"}"#));

    let err = client.send_command("say hi", true).await.unwrap_err();
    assert!(matches!(&err, ClientError::ProtocolFailure(msg) if msg == "bad auth"));
    assert_eq!(err.to_string(), "bad auth");
}

#[tokio::test]
async fn scenario_d_connection_refused_is_transport_failure() {
    let client = client(FakeTransport::new(|_| {
        Err(TransportError::Connect("Connection refused".into()))
    }));

    let err = client.send_command("say hi", true).await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(TransportError::Connect(_))));
}

// =============================================================================
// Resolve edge cases
// =============================================================================

#[tokio::test]
async fn echo_roundtrip_with_fresh_server_values() {
    let client = client(echo_server());
    let output = client.send_command("say hello", false).await.unwrap();
    assert_eq!(output.response, "ran: say hello");
}

#[tokio::test]
async fn plain_response_is_decrypted_when_present() {
    let body = success_body("abc123", 1_700_000_000, "§aPlayers: 3", Some("Players: 3"));
    let client = client(FakeTransport::replying(&body));

    let output = client.send_command("list", true).await.unwrap();
    assert_eq!(output.response, "§aPlayers: 3");
    assert_eq!(output.plain_response, "Players: 3");
}

#[tokio::test]
async fn failure_without_message_is_unknown_error() {
    let client = client(FakeTransport::replying(r#"{"success":false}"#));
    let err = client.send_command("x", true).await.unwrap_err();
    assert_eq!(err.to_string(), "Unknown error");
}

#[tokio::test]
async fn failure_with_encrypted_output_is_not_decrypted() {
    let key = derive_key(&SharedSecret::from(SECRET), "abc123", 1_700_000_000);
    let body = serde_json::json!({
        "success": false,
        "user": "admin",
        "nonce": "abc123",
        "timestamp": 1_700_000_000,
        "response": encrypt("Unknown command. Type \"/help\" for help.", &key).unwrap(),
        "plainResponse": encrypt("Unknown command.", &key).unwrap(),
    })
    .to_string();
    let client = client(FakeTransport::replying(&body));

    let err = client.send_command("bogus", true).await.unwrap_err();
    assert!(matches!(&err, ClientError::ProtocolFailure(msg) if msg == "Unknown error"));
}

#[tokio::test]
async fn non_json_body_is_malformed_response() {
    let client = client(FakeTransport::replying("<html>502 Bad Gateway</html>"));
    let err = client.send_command("x", true).await.unwrap_err();
    assert!(matches!(err, ClientError::MalformedResponse(_)));
}

#[tokio::test]
async fn success_missing_fields_is_malformed_response() {
    let client = client(FakeTransport::replying(r#"{"success":true,"response":"AAAA"}"#));
    let err = client.send_command("x", true).await.unwrap_err();
    assert!(matches!(err, ClientError::MalformedResponse(msg) if msg.contains("missing")));
}

#[tokio::test]
async fn short_response_blob_is_decryption_error() {
    let client = client(FakeTransport::replying(
        r#"{"success":true,"nonce":"n","timestamp":1,"response":"AAAA"}"#,
    ));
    let err = client.send_command("x", true).await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Decryption(CryptoError::MalformedBlob(_))
    ));
}

#[tokio::test]
async fn response_under_wrong_values_is_not_accepted_as_sent() {
    // Encrypted for timestamp 1700000001 but labelled 1700000000.
    let key = derive_key(&SharedSecret::from(SECRET), "abc123", 1_700_000_001);
    let body = serde_json::json!({
        "success": true,
        "nonce": "abc123",
        "timestamp": 1_700_000_000,
        "response": encrypt("OK", &key).unwrap(),
    })
    .to_string();
    let client = client(FakeTransport::replying(&body));

    match client.send_command("x", true).await {
        Err(ClientError::Decryption(_)) => {}
        Ok(output) => assert_ne!(output.response, "OK"),
        Err(e) => panic!("unexpected error: {e:?}"),
    }
}

#[tokio::test]
async fn http_error_uses_server_message() {
    let client = client(FakeTransport::new(|_| {
        Err(TransportError::Status {
            status: 429,
            body: br#"{"success":false,"error":"Too many requests"}"#.to_vec(),
        })
    }));
    let err = client.send_command("x", true).await.unwrap_err();
    assert_eq!(err.status(), Some(429));
    assert_eq!(err.to_string(), "Too many requests");
}

#[tokio::test]
async fn http_error_without_body_is_generic() {
    let client = client(FakeTransport::new(|_| {
        Err(TransportError::Status {
            status: 500,
            body: Vec::new(),
        })
    }));
    let err = client.send_command("x", true).await.unwrap_err();
    assert!(matches!(
        &err,
        ClientError::ServerRejected { status: 500, message } if message == "HTTP 500"
    ));
}

#[tokio::test]
async fn test_connection_sends_recon_test() {
    let client = client(echo_server());
    let output = client.test_connection().await.unwrap();
    assert_eq!(output.response, "ran: recon test");
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_calls_are_independent() {
    let client = Arc::new(client(echo_server()));

    let handles: Vec<_> = (0..32)
        .map(|i| {
            let c = Arc::clone(&client);
            tokio::spawn(async move { c.send_command(&format!("say {i}"), true).await })
        })
        .collect();

    for (i, h) in handles.into_iter().enumerate() {
        let output = h.await.unwrap().unwrap();
        assert_eq!(output.response, format!("ran: say {i}"));
    }

    let nonces: std::collections::HashSet<String> = client
        .transport
        .sent()
        .iter()
        .map(|b| serde_json::from_slice::<CommandRequest>(b).unwrap().nonce)
        .collect();
    assert_eq!(nonces.len(), 32);
}
