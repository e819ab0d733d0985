use std::time::{Duration, SystemTime};

use fuser::consts::FOPEN_DIRECT_IO;
use fuser::{
    FileAttr, FileType, Filesystem, ReplyAttr, ReplyData, ReplyEmpty, ReplyOpen, ReplyWrite,
    Request, TimeOrNow,
};
use raid5_rs::device::BlockDevice;
use tracing::warn;

pub const DEVICE_INO: u64 = 1;
const TTL: Duration = Duration::from_secs(1);

/// DeviceFs exports one `BlockDevice` as the root node of a FUSE mount: a
/// single regular file of the virtual device's size, served with direct I/O
/// so client requests reach the engine unmediated by the page cache.
pub struct DeviceFs<T: BlockDevice> {
    target: T,
    block_size: u64,
}

impl<T: BlockDevice> DeviceFs<T> {
    pub fn new(target: T, block_size: u32) -> Self {
        Self {
            target,
            block_size: u64::from(block_size),
        }
    }

    fn device_attr(&self) -> FileAttr {
        let size = self.target.size();
        FileAttr {
            ino: DEVICE_INO,
            size,
            blocks: size.div_ceil(512),
            atime: SystemTime::UNIX_EPOCH,
            mtime: SystemTime::UNIX_EPOCH,
            ctime: SystemTime::UNIX_EPOCH,
            crtime: SystemTime::UNIX_EPOCH,
            kind: FileType::RegularFile,
            perm: 0o600,
            nlink: 1,
            uid: unsafe { libc::getuid() },
            gid: unsafe { libc::getgid() },
            rdev: 0,
            blksize: u32::try_from(self.block_size).unwrap_or(u32::MAX),
            flags: 0,
        }
    }

    /// Clips a request to the device end and validates block alignment.
    /// Returns the request as `(offset, len)` or the errno to reply with.
    fn request_span(&self, offset: i64, len: usize) -> Result<(u64, usize), i32> {
        let Ok(offset) = u64::try_from(offset) else {
            return Err(libc::EINVAL);
        };
        let size = self.target.size();
        if offset >= size {
            return Ok((offset, 0));
        }
        let len = (len as u64).min(size - offset);
        if offset % self.block_size != 0 || len % self.block_size != 0 {
            return Err(libc::EINVAL);
        }
        usize::try_from(len)
            .map(|len| (offset, len))
            .map_err(|_| libc::EINVAL)
    }
}

impl<T: BlockDevice> Filesystem for DeviceFs<T> {
    fn getattr(&mut self, _req: &Request<'_>, ino: u64, _fh: Option<u64>, reply: ReplyAttr) {
        if ino == DEVICE_INO {
            reply.attr(&TTL, &self.device_attr());
        } else {
            reply.error(libc::ENOENT);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn setattr(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _mode: Option<u32>,
        _uid: Option<u32>,
        _gid: Option<u32>,
        _size: Option<u64>,
        _atime: Option<TimeOrNow>,
        _mtime: Option<TimeOrNow>,
        _ctime: Option<SystemTime>,
        _fh: Option<u64>,
        _crtime: Option<SystemTime>,
        _chgtime: Option<SystemTime>,
        _bkuptime: Option<SystemTime>,
        _flags: Option<u32>,
        reply: ReplyAttr,
    ) {
        // The device has a fixed size and no mutable attributes; truncate
        // attempts get the unchanged attr back.
        if ino == DEVICE_INO {
            reply.attr(&TTL, &self.device_attr());
        } else {
            reply.error(libc::ENOENT);
        }
    }

    fn open(&mut self, _req: &Request<'_>, ino: u64, _flags: i32, reply: ReplyOpen) {
        if ino == DEVICE_INO {
            reply.opened(0, FOPEN_DIRECT_IO);
        } else {
            reply.error(libc::ENOENT);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn read(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        if ino != DEVICE_INO {
            reply.error(libc::ENOENT);
            return;
        }
        let (offset, len) = match self.request_span(offset, size as usize) {
            Ok(span) => span,
            Err(errno) => {
                reply.error(errno);
                return;
            }
        };
        if len == 0 {
            reply.data(&[]);
            return;
        }
        let mut buf = vec![0u8; len];
        match self.target.read(&mut buf, offset) {
            Ok(()) => reply.data(&buf),
            Err(e) => {
                warn!("read at offset {offset} failed: {e:#}");
                reply.error(libc::EIO);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn write(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        data: &[u8],
        _write_flags: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyWrite,
    ) {
        if ino != DEVICE_INO {
            reply.error(libc::ENOENT);
            return;
        }
        let (offset, len) = match self.request_span(offset, data.len()) {
            Ok(span) => span,
            Err(errno) => {
                reply.error(errno);
                return;
            }
        };
        if len < data.len() {
            // Fixed-size device; nothing past the end can be written.
            reply.error(libc::ENOSPC);
            return;
        }
        match self.target.write(data, offset) {
            Ok(()) => reply.written(u32::try_from(data.len()).unwrap_or(u32::MAX)),
            Err(e) => {
                warn!("write at offset {offset} failed: {e:#}");
                reply.error(libc::EIO);
            }
        }
    }

    fn flush(&mut self, _req: &Request<'_>, ino: u64, _fh: u64, _lock_owner: u64, reply: ReplyEmpty) {
        if ino != DEVICE_INO {
            reply.error(libc::ENOENT);
            return;
        }
        match self.target.flush() {
            Ok(()) => reply.ok(),
            Err(_) => reply.error(libc::EIO),
        }
    }

    fn fsync(&mut self, _req: &Request<'_>, ino: u64, _fh: u64, _datasync: bool, reply: ReplyEmpty) {
        if ino != DEVICE_INO {
            reply.error(libc::ENOENT);
            return;
        }
        match self.target.flush() {
            Ok(()) => reply.ok(),
            Err(_) => reply.error(libc::EIO),
        }
    }

    fn release(
        &mut self,
        _req: &Request<'_>,
        _ino: u64,
        _fh: u64,
        _flags: i32,
        _lock_owner: Option<u64>,
        _flush: bool,
        reply: ReplyEmpty,
    ) {
        reply.ok();
    }

    fn destroy(&mut self) {
        self.target.disconnect();
    }
}
