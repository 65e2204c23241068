//! Integration tests for UasParser
//!
//! These tests run the parser against a wiremock remote and verify:
//! - Classification through every resolution branch
//! - The refresh protocol (version check, checksum verification, manifest)
//! - Cache freshness handling with and without downloads enabled

mod helpers;

use flate2::write::GzEncoder;
use flate2::Compression;
use helpers::*;
use std::io::Write;
use tempfile::TempDir;
use uas_parser::{RefreshError, RefreshOutcome, UasParser};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn parser(server: &MockServer, temp: &TempDir) -> UasParser {
    UasParser::new(config_for(server, temp.path()))
        .expect("Failed to create parser")
        .with_ambient_user_agent(None)
}

async fn seeded_remote() -> MockServer {
    let server = MockServer::start().await;
    let body = sample_database();
    mount_remote(&server, VERSION, &body, &md5_hex(body.as_bytes()), 1).await;
    server
}

#[tokio::test]
async fn test_first_classification_downloads_database() {
    let server = seeded_remote().await;
    let temp = TempDir::new().unwrap();
    let parser = parser(&server, &temp);

    let result = parser.classify(Some(SAFARI_UA)).await;
    assert_eq!(result.kind, "Browser");
    assert_eq!(result.ua_family, "Safari");
    assert_eq!(result.ua_version, "536.29.13");
    assert_eq!(result.ua_name, "Safari 536.29.13");
    assert_eq!(result.ua_company, "Apple Inc.");
    assert_eq!(result.ua_icon, "safari.png");
    assert_eq!(
        result.ua_info_url,
        "http://user-agent-string.info/list-of-ua/browser-detail?browser=Safari"
    );
    assert_eq!(result.os_family, "OS X");
    assert_eq!(result.os_name, "OS X 10.8 Mountain Lion");
    assert_eq!(result.os_icon, "macosx.png");

    assert_eq!(
        std::fs::read_to_string(temp.path().join("uasdata.ini")).unwrap(),
        sample_database()
    );
    assert_eq!(
        read_manifest(temp.path()),
        (VERSION.to_string(), "1".to_string())
    );

    // Served from memory, no further requests
    let again = parser.classify(Some(SAFARI_UA)).await;
    assert_eq!(again, result);
}

#[tokio::test]
async fn test_robot_is_matched_exactly() {
    let server = seeded_remote().await;
    let temp = TempDir::new().unwrap();
    let parser = parser(&server, &temp);

    let robot = parser.classify(Some(GOOGLEBOT_UA)).await;
    assert_eq!(robot.kind, "Robot");
    assert_eq!(robot.ua_family, "Googlebot");
    assert_eq!(robot.ua_name, "Googlebot/2.1");
    assert_eq!(robot.ua_company, "Google Inc.");
    assert_eq!(robot.ua_icon, "bot_googlebot.png");
    assert_eq!(robot.ua_version, "unknown");
    assert_eq!(robot.os_family, "unknown");
    assert_eq!(
        robot.ua_info_url,
        "http://user-agent-string.info/list-of-ua/bot-detail?bot=Googlebot"
    );

    let not_quite = parser
        .classify(Some(&GOOGLEBOT_UA.replace("Googlebot/2.1", "Googlebot/2.2")))
        .await;
    assert_ne!(not_quite.kind, "Robot");
}

#[tokio::test]
async fn test_linked_os_wins_over_os_signatures() {
    let server = seeded_remote().await;
    let temp = TempDir::new().unwrap();
    let parser = parser(&server, &temp);

    // OmniWeb is listed before Safari and is tied to OS X
    let result = parser.classify(Some(OMNIWEB_ON_WINDOWS_UA)).await;
    assert_eq!(result.ua_family, "OmniWeb");
    assert_eq!(result.ua_name, "OmniWeb 622");
    assert_eq!(result.os_family, "OS X");
}

#[tokio::test]
async fn test_empty_profile_fields_keep_defaults() {
    let server = seeded_remote().await;
    let temp = TempDir::new().unwrap();
    let parser = parser(&server, &temp);

    let result = parser.classify(Some(FIREFOX_ON_WINDOWS_UA)).await;
    assert_eq!(result.ua_family, "Firefox");
    assert_eq!(result.ua_version, "21.0");
    assert_eq!(result.ua_url, "unknown");
    assert_eq!(result.ua_icon, "unknown.png");
    assert_eq!(result.os_name, "Windows 7");
}

#[tokio::test]
async fn test_absent_input_never_touches_the_remote() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let temp = TempDir::new().unwrap();
    let parser = parser(&server, &temp);

    assert!(parser.classify(None).await.is_unknown());
    assert!(parser.classify(Some("")).await.is_unknown());
    assert!(!temp.path().join("cache.ini").exists());
}

#[tokio::test]
async fn test_hash_mismatch_leaves_database_unchanged() {
    let server = MockServer::start().await;
    let old = database_with_version("20130101-01");
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("uasdata.ini"), &old).unwrap();
    write_manifest(temp.path(), "20130101-01", 0, true);

    let body = sample_database();
    mount_remote(&server, VERSION, &body, &md5_hex(b"something else"), 1).await;
    let parser = parser(&server, &temp);

    // The stale database is still used for classification
    let result = parser.classify(Some(SAFARI_UA)).await;
    assert_eq!(result.ua_family, "Safari");

    assert_eq!(
        std::fs::read_to_string(temp.path().join("uasdata.ini")).unwrap(),
        old
    );
    assert_eq!(
        read_manifest(temp.path()),
        ("20130101-01".to_string(), "0".to_string())
    );
    let store = parser.signature_store().await.unwrap();
    assert_eq!(store.version(), Some("20130101-01"));
}

#[tokio::test]
async fn test_current_version_skips_download() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rpc/ver"))
        .respond_with(ResponseTemplate::new(200).set_body_string(VERSION))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rpc/ini"))
        .respond_with(ResponseTemplate::new(200).set_body_string("unused"))
        .expect(0)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("uasdata.ini"), sample_database()).unwrap();
    // Expired, so a refresh is attempted
    write_manifest(temp.path(), VERSION, now() - 2 * 86_400, true);
    let parser = parser(&server, &temp);

    assert_eq!(parser.classify(Some(SAFARI_UA)).await.ua_family, "Safari");
    assert_eq!(
        read_manifest(temp.path()),
        (VERSION.to_string(), "1".to_string())
    );
}

#[tokio::test]
async fn test_malformed_version_still_downloads() {
    let server = MockServer::start().await;
    let body = sample_database();
    mount_remote(
        &server,
        "<html>Service Unavailable</html>",
        &body,
        &md5_hex(body.as_bytes()),
        1,
    )
    .await;
    let temp = TempDir::new().unwrap();
    let parser = parser(&server, &temp);

    assert!(parser.download_data(false).await);
    assert_eq!(
        read_manifest(temp.path()),
        ("none".to_string(), "1".to_string())
    );
}

#[tokio::test]
async fn test_absent_data_downloads_even_when_downloads_disabled() {
    let server = seeded_remote().await;
    let temp = TempDir::new().unwrap();
    let mut parser = parser(&server, &temp);
    parser.set_do_downloads(false);

    let result = parser.classify(Some(SAFARI_UA)).await;
    assert_eq!(result.ua_family, "Safari");
    assert!(temp.path().join("uasdata.ini").exists());
}

#[tokio::test]
async fn test_stale_cache_is_used_when_downloads_disabled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("uasdata.ini"), sample_database()).unwrap();
    write_manifest(temp.path(), VERSION, 0, false);
    let mut parser = parser(&server, &temp);
    parser.set_do_downloads(false);

    assert_eq!(parser.classify(Some(SAFARI_UA)).await.ua_family, "Safari");
}

#[tokio::test]
async fn test_fresh_cache_makes_no_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("uasdata.ini"), sample_database()).unwrap();
    write_manifest(temp.path(), VERSION, now(), true);
    let parser = parser(&server, &temp);

    assert_eq!(parser.classify(Some(GOOGLEBOT_UA)).await.kind, "Robot");
}

#[tokio::test]
async fn test_read_only_database_fails_refresh() {
    let server = seeded_remote().await;
    let temp = TempDir::new().unwrap();
    let db_path = temp.path().join("uasdata.ini");
    let old = database_with_version("20130101-01");
    std::fs::write(&db_path, &old).unwrap();
    let mut perms = std::fs::metadata(&db_path).unwrap().permissions();
    perms.set_readonly(true);
    std::fs::set_permissions(&db_path, perms).unwrap();
    let parser = parser(&server, &temp);

    let outcome = parser.try_download_data(true).await;
    assert!(matches!(
        outcome,
        RefreshOutcome::Failed {
            error: RefreshError::Persist(_),
            ..
        }
    ));
    assert_eq!(std::fs::read_to_string(&db_path).unwrap(), old);
    assert_eq!(read_manifest(temp.path()).1, "0");
}

#[tokio::test]
async fn test_download_data_replaces_loaded_store() {
    let server = seeded_remote().await;
    let temp = TempDir::new().unwrap();
    std::fs::write(
        temp.path().join("uasdata.ini"),
        database_with_version("20130101-01"),
    )
    .unwrap();
    write_manifest(temp.path(), "20130101-01", now(), true);
    let parser = parser(&server, &temp);

    let before = parser.signature_store().await.unwrap();
    assert_eq!(before.version(), Some("20130101-01"));

    assert!(parser.download_data(false).await);
    let after = parser.signature_store().await.unwrap();
    assert_eq!(after.version(), Some(VERSION));
    // Holders of the old generation keep a complete store
    assert_eq!(before.version(), Some("20130101-01"));
}

#[tokio::test]
async fn test_gzip_transfer_is_requested() {
    let server = MockServer::start().await;
    let body = sample_database();
    for (route, payload) in [
        ("/rpc/ver", VERSION.to_string()),
        ("/rpc/ini", body.clone()),
        ("/rpc/md5", md5_hex(body.as_bytes())),
    ] {
        Mock::given(method("GET"))
            .and(path(route))
            .and(header("accept-encoding", "gzip"))
            .respond_with(ResponseTemplate::new(200).set_body_string(payload))
            .expect(1)
            .mount(&server)
            .await;
    }
    let temp = TempDir::new().unwrap();
    let parser = parser(&server, &temp);
    assert!(parser.use_zip_downloads());

    assert!(parser.download_data(false).await);
}

#[tokio::test]
async fn test_gzip_body_is_decoded_before_hash_check() {
    let server = MockServer::start().await;
    let body = sample_database();
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(body.as_bytes()).unwrap();
    let compressed = encoder.finish().unwrap();
    assert_ne!(compressed, body.as_bytes());

    Mock::given(method("GET"))
        .and(path("/rpc/ver"))
        .respond_with(ResponseTemplate::new(200).set_body_string(VERSION))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rpc/ini"))
        .and(header("accept-encoding", "gzip"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-encoding", "gzip")
                .set_body_bytes(compressed),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rpc/md5"))
        .respond_with(ResponseTemplate::new(200).set_body_string(md5_hex(body.as_bytes())))
        .mount(&server)
        .await;
    let temp = TempDir::new().unwrap();
    let parser = parser(&server, &temp);

    assert!(parser.download_data(false).await);
    assert_eq!(
        std::fs::read_to_string(temp.path().join("uasdata.ini")).unwrap(),
        body
    );
    assert_eq!(parser.classify(Some(SAFARI_UA)).await.ua_family, "Safari");
}

#[tokio::test]
async fn test_clear_cache_forces_fresh_download() {
    let server = MockServer::start().await;
    let body = sample_database();
    mount_remote(&server, VERSION, &body, &md5_hex(body.as_bytes()), 2).await;
    let temp = TempDir::new().unwrap();
    let parser = parser(&server, &temp);

    assert_eq!(parser.classify(Some(SAFARI_UA)).await.ua_family, "Safari");
    assert!(parser.clear_cache().await);
    parser.clear_data().await;
    assert!(!temp.path().join("uasdata.ini").exists());

    assert_eq!(parser.classify(Some(SAFARI_UA)).await.ua_family, "Safari");
    assert!(temp.path().join("uasdata.ini").exists());
}
