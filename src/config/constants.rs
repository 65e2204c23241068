//! Configuration constants.
//!
//! Defaults for the refresh protocol and the names of the files kept in the
//! cache directory.

use std::time::Duration;

/// How old the cached database may get before a refresh is attempted (1 day)
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Per-request timeout for the version, data and hash fetches.
/// The upstream service has historically been slow, so this is generous.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Full database download
pub const DEFAULT_INI_URL: &str = "http://user-agent-string.info/rpc/get_data.php?key=free&format=ini";

/// Version tag of the current remote database
pub const DEFAULT_VER_URL: &str =
    "http://user-agent-string.info/rpc/get_data.php?key=free&format=ini&ver=y";

/// MD5 checksum of the current remote database
pub const DEFAULT_MD5_URL: &str = "http://user-agent-string.info/rpc/get_data.php?format=ini&md5=y";

/// Base that `info_url` suffixes from the database are appended to
pub const DEFAULT_INFO_URL: &str = "http://user-agent-string.info";

/// Manifest file name inside the cache directory
pub const MANIFEST_FILE: &str = "cache.ini";

/// Database file name inside the cache directory
pub const DATABASE_FILE: &str = "uasdata.ini";

/// Version recorded when the server reports something that is not `YYYYMMDD-NN`
pub const UNKNOWN_VERSION: &str = "none";

/// Environment variable consulted when no user agent is passed (CGI convention)
pub const AMBIENT_USER_AGENT_ENV: &str = "HTTP_USER_AGENT";
