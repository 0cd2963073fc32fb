//! Host-visible memory allocation.
//!
//! Guest `wl_shm_pool` file descriptors are only valid in the guest's address space; the
//! relay needs a second, host-visible file descriptor of the same size to back the pool it
//! actually hands to the host compositor. This is exactly the kind of decision the codec
//! has no opinion on, so the relay defines the allocator as its own small trait and ships
//! two implementations.

use std::{io, os::fd::OwnedFd};

/// Produces host-visible shared memory file descriptors.
pub trait HostMemoryAllocator: Send + Sync {
    /// Allocates a new file descriptor of at least `size` bytes, suitable for mapping on
    /// the host side.
    fn alloc(&self, size: usize) -> io::Result<OwnedFd>;
}

/// Allocates host memory with `memfd_create`.
///
/// Useful when the relay and the host compositor run on the same machine (development,
/// testing) since a guest `memfd` and a host `memfd` are equally "host-visible" in that
/// case.
pub struct MemfdAllocator;

impl HostMemoryAllocator for MemfdAllocator {
    fn alloc(&self, size: usize) -> io::Result<OwnedFd> {
        let fd: OwnedFd = uapi::memfd_create("wl-guest-relay-pool", 0)
            .map_err(io::Error::from)?
            .into();
        uapi::ftruncate(&fd, size as u64).map_err(io::Error::from)?;
        Ok(fd)
    }
}

/// Allocates host memory through the `virtio_wl` kernel driver.
///
/// This is the allocator a real guest/host split needs: `virtio_wl` is the virtio device
/// crosvm and similar VMMs expose to let a guest obtain memory that is actually backed by
/// host pages, which is the whole point of re-publishing a guest SHM pool on the host side
/// instead of just passing the guest fd through.
pub struct VirtioWlAllocator {
    device: OwnedFd,
}

impl VirtioWlAllocator {
    /// Opens the `virtio_wl` character device at `path` (typically `/dev/wl0`).
    pub fn open(path: &str) -> io::Result<Self> {
        let device = uapi::open(path, uapi::c::O_RDWR | uapi::c::O_CLOEXEC, 0)
            .map_err(io::Error::from)?
            .into();
        Ok(Self { device })
    }
}

/// `struct virtwl_ioctl_new` from the `virtio_wl` kernel ABI.
#[repr(C)]
struct VirtwlIoctlNew {
    ty: u32,
    fd: i32,
    flags: u32,
    size: u32,
}

const VIRTWL_IOCTL_NEW_TYPE_ALLOC: u32 = 1;

impl HostMemoryAllocator for VirtioWlAllocator {
    fn alloc(&self, size: usize) -> io::Result<OwnedFd> {
        use std::os::fd::{AsRawFd, FromRawFd};

        let mut arg = VirtwlIoctlNew {
            ty: VIRTWL_IOCTL_NEW_TYPE_ALLOC,
            fd: -1,
            flags: 0,
            size: size as u32,
        };
        // VIRTWL_IOCTL_NEW = _IOWR(0x97, 0x00, struct virtwl_ioctl_new)
        const VIRTWL_IOCTL_NEW: u64 = 0xc010_9700;
        let res =
            unsafe { uapi::c::ioctl(self.device.as_raw_fd(), VIRTWL_IOCTL_NEW, &mut arg) };
        if res < 0 {
            return Err(io::Error::last_os_error());
        }
        if arg.fd < 0 {
            return Err(io::Error::other("virtio_wl did not return a file descriptor"));
        }
        Ok(unsafe { OwnedFd::from_raw_fd(arg.fd) })
    }
}

#[cfg(test)]
mod tests {
    use {super::*, std::os::fd::AsRawFd};

    #[test]
    fn memfd_alloc_has_requested_size() {
        let fd = MemfdAllocator.alloc(4096).unwrap();
        let stat = uapi::fstat(fd.as_raw_fd()).unwrap();
        assert_eq!(stat.st_size, 4096);
    }

    #[test]
    fn memfd_alloc_is_mappable_and_writable() {
        let fd = MemfdAllocator.alloc(16).unwrap();
        let mut mapping = unsafe { memmap2::MmapOptions::new().len(16).map_mut(&fd) }.unwrap();
        mapping[..4].copy_from_slice(&[1, 2, 3, 4]);
        assert_eq!(&mapping[..4], &[1, 2, 3, 4]);
    }
}
