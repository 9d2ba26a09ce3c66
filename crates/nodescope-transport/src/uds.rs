use std::os::unix::fs::{FileTypeExt, MetadataExt, PermissionsExt};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Result, TransportError};

/// Unix domain socket that live capture producers connect to.
///
/// The socket file is removed on drop, unless something else has replaced it.
pub struct FeedListener {
    listener: UnixListener,
    path: PathBuf,
    created_inode: (u64, u64),
}

impl FeedListener {
    /// Default permission mode for created socket paths.
    pub const DEFAULT_SOCKET_MODE: u32 = 0o600;
    /// `sockaddr_un.sun_path` is 108 bytes on Linux, 104 on macOS.
    #[cfg(target_os = "linux")]
    const MAX_PATH_LEN: usize = 108;
    #[cfg(not(target_os = "linux"))]
    const MAX_PATH_LEN: usize = 104;

    /// Bind and listen at `path`, removing a stale socket left there.
    pub fn bind(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let path_len = path.as_os_str().len();
        if path_len >= Self::MAX_PATH_LEN {
            return Err(TransportError::PathTooLong {
                path,
                len: path_len,
                max: Self::MAX_PATH_LEN,
            });
        }

        let bind_err = |path: &Path, source: std::io::Error| TransportError::Bind {
            path: path.to_path_buf(),
            source,
        };

        // Never remove a path that is not a socket.
        if let Ok(metadata) = std::fs::symlink_metadata(&path) {
            if !metadata.file_type().is_socket() {
                return Err(bind_err(
                    &path,
                    std::io::Error::new(
                        std::io::ErrorKind::AlreadyExists,
                        "existing path is not a unix socket",
                    ),
                ));
            }
            debug!(?path, "removing stale socket");
            std::fs::remove_file(&path).map_err(|e| bind_err(&path, e))?;
        }

        let listener = UnixListener::bind(&path).map_err(|e| bind_err(&path, e))?;
        std::fs::set_permissions(
            &path,
            std::fs::Permissions::from_mode(Self::DEFAULT_SOCKET_MODE),
        )
        .map_err(|e| bind_err(&path, e))?;
        let created = std::fs::symlink_metadata(&path).map_err(|e| bind_err(&path, e))?;

        info!(?path, "listening for live feeds");

        Ok(Self {
            listener,
            path,
            created_inode: (created.dev(), created.ino()),
        })
    }

    /// Accept the next producer (blocking).
    pub fn accept(&self) -> Result<UnixStream> {
        let (stream, _addr) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!("accepted live feed");
        Ok(stream)
    }

    /// Switch the listener between blocking and non-blocking accepts.
    pub fn set_nonblocking(&self, nonblocking: bool) -> Result<()> {
        self.listener
            .set_nonblocking(nonblocking)
            .map_err(TransportError::Io)
    }

    /// Accept a producer if one is waiting. Returns `None` instead of blocking when the
    /// listener is non-blocking and nobody has connected.
    pub fn try_accept(&self) -> Result<Option<UnixStream>> {
        match self.listener.accept() {
            Ok((stream, _addr)) => {
                debug!("accepted live feed");
                Ok(Some(stream))
            }
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => Ok(None),
            Err(err) => Err(TransportError::Accept(err)),
        }
    }

    /// Connect to a listening feed socket as a producer (blocking).
    pub fn connect(path: impl AsRef<Path>) -> Result<UnixStream> {
        let path = path.as_ref();
        let stream = UnixStream::connect(path).map_err(|e| TransportError::Connect {
            path: path.to_path_buf(),
            source: e,
        })?;
        debug!(?path, "connected to feed socket");
        Ok(stream)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FeedListener {
    fn drop(&mut self) {
        let Ok(metadata) = std::fs::symlink_metadata(&self.path) else {
            return;
        };
        if metadata.file_type().is_socket() && (metadata.dev(), metadata.ino()) == self.created_inode
        {
            debug!(path = ?self.path, "cleaning up socket file");
            let _ = std::fs::remove_file(&self.path);
        } else {
            debug!(path = ?self.path, "socket path identity changed; skipping cleanup");
        }
    }
}
