//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which creates temporary storage roots, an
//! in-memory DB and a full [`AppContext`]. The [`TestHarness::with_server`]
//! constructor starts Axum on a random port for HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use axum::Router;
use clipvault::config::{Config, RootKind, StorageConfig, StorageRoot};
use clipvault::server::{create_router, AppContext};
use clipvault_db::models::{NewVideo, VideoRecord};
use clipvault_db::pool::{init_memory_pool, DbPool};
use tempfile::TempDir;

/// Test harness wrapping a fully-constructed [`AppContext`] backed by an
/// in-memory database and a temporary storage tree:
///
/// ```text
/// {tmp}/uploads            upload root (relative file paths)
/// {tmp}/uploads/videos     canonical
/// {tmp}/uploads/direct     legacy direct upload
/// {tmp}/intake             legacy intake
/// {tmp}/uploads/videos/videos  archive
/// ```
pub struct TestHarness {
    pub ctx: AppContext,
    pub db: DbPool,
    pub tmp: TempDir,
}

fn storage_config(tmp: &Path) -> StorageConfig {
    let upload = tmp.join("uploads");
    let roots = vec![
        StorageRoot::new(RootKind::Canonical, upload.join("videos")),
        StorageRoot::new(RootKind::LegacyUpload, upload.join("direct")),
        StorageRoot::new(RootKind::Intake, tmp.join("intake")),
        StorageRoot::new(RootKind::Archive, upload.join("videos").join("videos")),
    ];
    for root in &roots {
        std::fs::create_dir_all(&root.path).expect("failed to create storage root");
    }
    StorageConfig {
        upload_root: upload,
        roots,
        ..Default::default()
    }
}

impl TestHarness {
    /// Create a new harness with default configuration.
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Create a new harness, letting the caller adjust the configuration
    /// after the storage roots are filled in.
    pub fn with_config(adjust: impl FnOnce(&mut Config)) -> Self {
        let tmp = tempfile::tempdir().expect("failed to create temp dir");
        let mut config = Config {
            storage: storage_config(tmp.path()),
            ..Default::default()
        };
        adjust(&mut config);

        let db = init_memory_pool().expect("failed to create in-memory pool");
        let ctx = AppContext::new(config, db.clone());

        Self { ctx, db, tmp }
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        Self::new().serve().await
    }

    /// Start an Axum server with adjusted config on a random port.
    pub async fn with_server_config(adjust: impl FnOnce(&mut Config)) -> (Self, SocketAddr) {
        Self::with_config(adjust).serve().await
    }

    async fn serve(self) -> (Self, SocketAddr) {
        let app = self.router();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (self, addr)
    }

    pub fn router(&self) -> Router {
        create_router(self.ctx.clone())
    }

    pub fn root(&self, kind: RootKind) -> PathBuf {
        self.ctx
            .config
            .storage
            .first_root(kind)
            .expect("root kind configured")
            .to_path_buf()
    }

    pub fn upload_root(&self) -> PathBuf {
        self.ctx.config.storage.upload_root.clone()
    }

    /// Write `data` to `dir/name` and return the full path.
    pub fn write_file(&self, dir: &Path, name: &str, data: &[u8]) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create parent dir");
        }
        std::fs::write(&path, data).expect("failed to write fixture");
        path
    }

    /// Insert a video record.
    pub fn seed(&self, video: NewVideo) -> VideoRecord {
        let conn = clipvault_db::pool::get_conn(&self.db).expect("failed to get db connection");
        clipvault_db::queries::videos::insert_video(&conn, &video).expect("failed to insert video")
    }

    /// The `VID_42` / `ab12cd34ef` record whose 1 MiB file only exists in
    /// the intake root under its old upload name. Returns the file's bytes.
    pub fn seed_legacy_42(&self) -> Vec<u8> {
        let data: Vec<u8> = (0..1_048_576u32).map(|i| (i % 253) as u8).collect();
        self.write_file(&self.root(RootKind::Intake), "old_name_42.mp4", &data);
        self.seed(
            NewVideo::new("VID_42", "misc/old_name_42.mp4")
                .slug("ab12cd34ef")
                .size(1_048_576),
        );
        data
    }
}
