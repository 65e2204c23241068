#![allow(dead_code)]

// Shared test helpers: a small signature database and a mock remote source.
//
// The database is a trimmed copy of the user-agent-string.info layout with
// just enough rows to exercise every resolution branch.

use std::path::Path;

use uas_parser::Config;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const VERSION: &str = "20130529-01";

pub const SAFARI_UA: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_8_3) AppleWebKit/536.29.13 (KHTML, like Gecko) Version/6.0.4 Safari/536.29.13";
pub const GOOGLEBOT_UA: &str =
    "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";
pub const OMNIWEB_ON_WINDOWS_UA: &str =
    "Mozilla/5.0 (Windows NT 6.1) AppleWebKit/525.18 (KHTML, like Gecko, Safari/525.20) OmniWeb/v622.3.0.105198";
pub const FIREFOX_ON_WINDOWS_UA: &str =
    "Mozilla/5.0 (Windows NT 6.1; WOW64; rv:21.0) Gecko/20100101 Firefox/21.0";

/// Signature database served by the mock remote.
pub fn sample_database() -> String {
    database_with_version(VERSION)
}

/// Same rows as [`sample_database`] with a different version header.
pub fn database_with_version(version: &str) -> String {
    format!(
        r#"; Data (format ini) for UASparser - http://user-agent-string.info/download/UASparser
; Version: {version}
[robots]
1[] = "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)"
1[] = "Googlebot"
1[] = "Googlebot/2.1"
1[] = "http://www.google.com/bot.html"
1[] = "Google Inc."
1[] = "http://www.google.com/"
1[] = "bot_googlebot.png"
1[] = ""
1[] = "/list-of-ua/bot-detail?bot=Googlebot"
[os]
1[] = "Windows"
1[] = "Windows 7"
1[] = "http://en.wikipedia.org/wiki/Windows_7"
1[] = "Microsoft Corporation."
1[] = "http://www.microsoft.com/"
1[] = "win-2.png"
44[] = "OS X"
44[] = "OS X 10.8 Mountain Lion"
44[] = "http://en.wikipedia.org/wiki/OS_X_Mountain_Lion"
44[] = "Apple Computer, Inc."
44[] = "http://www.apple.com/"
44[] = "macosx.png"
[browser]
5[] = "1"
5[] = "Safari"
5[] = "http://en.wikipedia.org/wiki/Safari_%28web_browser%29"
5[] = "Apple Inc."
5[] = "http://www.apple.com/"
5[] = "safari.png"
5[] = "/list-of-ua/browser-detail?browser=Safari"
8[] = "1"
8[] = "OmniWeb"
8[] = "http://www.omnigroup.com/applications/omniweb/"
8[] = "The Omni Group"
8[] = "http://www.omnigroup.com/"
8[] = "omniweb.png"
8[] = "/list-of-ua/browser-detail?browser=OmniWeb"
14[] = "1"
14[] = "Firefox"
14[] = ""
14[] = "Mozilla Foundation"
14[] = "http://www.mozilla.org/"
14[] = ""
14[] = "/list-of-ua/browser-detail?browser=Firefox"
[browser_type]
1[] = "Browser"
[browser_reg]
1[] = "/OmniWeb\/v([0-9]+)/si"
1[] = "8"
2[] = "/safari\/([0-9.]+)/si"
2[] = "5"
3[] = "/firefox\/([0-9a-z\+\-\.]+).*/si"
3[] = "14"
[browser_os]
8[] = "44"
[os_reg]
1[] = "/windows nt 6\.1/si"
1[] = "1"
2[] = "/mac os x 10[._]8/si"
2[] = "44"
"#
    )
}

pub fn md5_hex(bytes: &[u8]) -> String {
    format!("{:x}", md5::compute(bytes))
}

/// Mounts the version, data and checksum endpoints, each expected `times` times.
pub async fn mount_remote(server: &MockServer, version: &str, body: &str, hash: &str, times: u64) {
    Mock::given(method("GET"))
        .and(path("/rpc/ver"))
        .respond_with(ResponseTemplate::new(200).set_body_string(version.to_string()))
        .expect(times)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rpc/ini"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body.to_string()))
        .expect(times)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rpc/md5"))
        .respond_with(ResponseTemplate::new(200).set_body_string(hash.to_string()))
        .expect(times)
        .mount(server)
        .await;
}

/// Configuration pointing at `server` and caching in `dir`.
pub fn config_for(server: &MockServer, dir: &Path) -> Config {
    let url = |suffix: &str| Url::parse(&format!("{}/rpc/{}", server.uri(), suffix)).unwrap();
    Config {
        cache_dir: Some(dir.to_path_buf()),
        ver_url: url("ver"),
        ini_url: url("ini"),
        md5_url: url("md5"),
        ..Default::default()
    }
}

/// Writes a manifest in the on-disk format.
pub fn write_manifest(dir: &Path, version: &str, last_update: i64, ok: bool) {
    let text = format!(
        "[main]\nlocalversion = \"{}\"\nlastupdate = \"{}\"\nlastupdatestatus = \"{}\"\n",
        version,
        last_update,
        if ok { "1" } else { "0" }
    );
    std::fs::write(dir.join("cache.ini"), text).expect("Failed to write manifest");
}

/// Reads `(localversion, lastupdatestatus)` back from the manifest.
pub fn read_manifest(dir: &Path) -> (String, String) {
    let text = std::fs::read_to_string(dir.join("cache.ini")).expect("Failed to read manifest");
    let field = |key: &str| {
        text.lines()
            .find_map(|line| {
                let (k, v) = line.split_once('=')?;
                (k.trim() == key).then(|| v.trim().trim_matches('"').to_string())
            })
            .unwrap_or_default()
    };
    (field("localversion"), field("lastupdatestatus"))
}

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
