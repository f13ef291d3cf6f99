use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub redirect: RedirectConfig,

    #[serde(default)]
    pub player: PlayerConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Hostnames this deployment answers on. A remote source pointing at one
    /// of them is served locally instead of redirected.
    #[serde(default)]
    pub public_hosts: Vec<String>,

    /// Expose `GET /videos/{id}/locate`.
    #[serde(default)]
    pub diagnostics: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_hosts: Vec::new(),
            diagnostics: false,
        }
    }
}

/// Role a storage root plays in the resolution chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RootKind {
    /// Block storage, files named `{slug}.mp4` or `{video_id}.mp4`.
    Canonical,
    /// Legacy direct-upload directory, files keep their upload name.
    LegacyUpload,
    /// Legacy "misc" intake directory with inconsistent names.
    Intake,
    /// Any other root (historically nested canonical variants); only visited
    /// by the exhaustive scan.
    Archive,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StorageRoot {
    pub kind: RootKind,
    pub path: PathBuf,
}

impl StorageRoot {
    pub fn new(kind: RootKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Base directory for relative `file_path` values.
    #[serde(default = "default_upload_root")]
    pub upload_root: PathBuf,

    /// Ordered storage roots. Earlier roots are scanned first.
    #[serde(default = "default_roots")]
    pub roots: Vec<StorageRoot>,

    /// Extension used by the block storage naming convention.
    #[serde(default = "default_canonical_extension")]
    pub canonical_extension: String,

    /// Filename fragments must be at least this long to be substring-matched.
    #[serde(default = "default_min_fragment_len")]
    pub min_fragment_len: usize,

    /// Digit runs shorter than this are not used as match tokens.
    #[serde(default = "default_min_numeric_token_len")]
    pub min_numeric_token_len: usize,
}

fn default_upload_root() -> PathBuf {
    PathBuf::from("./uploads")
}

fn default_roots() -> Vec<StorageRoot> {
    vec![
        StorageRoot::new(RootKind::Canonical, "./uploads/videos"),
        StorageRoot::new(RootKind::LegacyUpload, "./uploads/direct"),
        StorageRoot::new(RootKind::Intake, "./uploads/misc"),
        StorageRoot::new(RootKind::Archive, "./uploads/videos/videos"),
    ]
}

fn default_canonical_extension() -> String {
    "mp4".to_string()
}

fn default_min_fragment_len() -> usize {
    6
}

fn default_min_numeric_token_len() -> usize {
    6
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_root: default_upload_root(),
            roots: default_roots(),
            canonical_extension: default_canonical_extension(),
            min_fragment_len: default_min_fragment_len(),
            min_numeric_token_len: default_min_numeric_token_len(),
        }
    }
}

impl StorageConfig {
    /// First configured root of the given kind.
    pub fn first_root(&self, kind: RootKind) -> Option<&Path> {
        self.roots
            .iter()
            .find(|r| r.kind == kind)
            .map(|r| r.path.as_path())
    }

    /// Every distinct directory the exhaustive scan visits, in order.
    ///
    /// The configured roots come first, then the upload root.
    pub fn scan_roots(&self) -> Vec<&Path> {
        let mut seen: Vec<&Path> = Vec::new();
        let candidates = self
            .roots
            .iter()
            .map(|r| r.path.as_path())
            .chain(std::iter::once(self.upload_root.as_path()));
        for path in candidates {
            if !seen.contains(&path) {
                seen.push(path);
            }
        }
        seen
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./clipvault.db")
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedirectConfig {
    /// Host substrings marking a placeholder URL that must not be followed.
    #[serde(default = "default_mock_host_patterns")]
    pub mock_host_patterns: Vec<String>,
}

fn default_mock_host_patterns() -> Vec<String> {
    ["example.com", "example.org", "example.net", "placeholder"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            mock_host_patterns: default_mock_host_patterns(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayerConfig {
    #[serde(default = "default_player_script")]
    pub script_url: String,

    #[serde(default = "default_player_stylesheet")]
    pub stylesheet_url: String,
}

fn default_player_script() -> String {
    "https://vjs.zencdn.net/8.10.0/video.min.js".to_string()
}

fn default_player_stylesheet() -> String {
    "https://vjs.zencdn.net/8.10.0/video-js.css".to_string()
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            script_url: default_player_script(),
            stylesheet_url: default_player_stylesheet(),
        }
    }
}
