//! Shared memory pools and buffers are the one place the relay cannot just forward the wire
//! message: a guest file descriptor is meaningless to the host compositor, so every pool gets
//! a second, host-visible twin instead of a single paired object.

use {
    crate::host_memory::HostMemoryAllocator,
    error_reporter::Report,
    memmap2::{Mmap, MmapMut, MmapOptions},
    std::{
        cell::RefCell,
        os::fd::OwnedFd,
        rc::{Rc, Weak},
        sync::Arc,
    },
    wl_proxy::protocols::wayland::{
        wl_buffer::{WlBuffer, WlBufferHandler},
        wl_shm::{WlShm, WlShmFormat, WlShmHandler},
        wl_shm_pool::{WlShmPool, WlShmPoolHandler},
    },
};

pub struct WlShmHandlerImpl {
    pub allocator: Arc<dyn HostMemoryAllocator>,
}

impl WlShmHandler for WlShmHandlerImpl {
    fn handle_create_pool(&mut self, slf: &Rc<WlShm>, id: &Rc<WlShmPool>, fd: &Rc<OwnedFd>, size: i32) {
        let Some(mapping) = map_pool(&*self.allocator, fd, size) else {
            return;
        };
        let Ok(host_pool) = slf.new_try_send_create_pool(&mapping.host_fd, size) else {
            log::error!("could not create a host-side shm pool");
            return;
        };
        id.set_handler(GuestPoolHandlerImpl {
            allocator: self.allocator.clone(),
            shm: slf.clone(),
            guest_fd: fd.clone(),
            host_pool,
            current: RefCell::new(Rc::new(mapping)),
        });
    }
}

/// The pair of mappings backing one generation of a pool: the guest's original memory and the
/// host-visible copy the relay mirrors it into on every commit.
pub struct PoolMapping {
    guest: Mmap,
    host: RefCell<MmapMut>,
    host_fd: Rc<OwnedFd>,
}

impl PoolMapping {
    pub fn blit(&self, offset: usize, len: usize) {
        let Some(end) = offset.checked_add(len) else {
            return;
        };
        if end > self.guest.len() || end > self.host.borrow().len() {
            log::warn!("buffer range {offset}..{end} is out of bounds for its pool");
            return;
        }
        self.host.borrow_mut()[offset..end].copy_from_slice(&self.guest[offset..end]);
    }
}

fn map_pool(allocator: &dyn HostMemoryAllocator, guest_fd: &Rc<OwnedFd>, size: i32) -> Option<PoolMapping> {
    let size = size.max(0) as usize;
    let guest = match unsafe { MmapOptions::new().len(size).map(&**guest_fd) } {
        Ok(m) => m,
        Err(e) => {
            log::error!("could not map guest shm pool: {}", Report::new(e));
            return None;
        }
    };
    let host_fd = match allocator.alloc(size) {
        Ok(fd) => Rc::new(fd),
        Err(e) => {
            log::error!("could not allocate host shm memory: {}", Report::new(e));
            return None;
        }
    };
    let host = match unsafe { MmapOptions::new().len(size).map_mut(&*host_fd) } {
        Ok(m) => m,
        Err(e) => {
            log::error!("could not map host shm pool: {}", Report::new(e));
            return None;
        }
    };
    Some(PoolMapping { guest, host: RefCell::new(host), host_fd })
}

pub struct GuestPoolHandlerImpl {
    allocator: Arc<dyn HostMemoryAllocator>,
    shm: Rc<WlShm>,
    guest_fd: Rc<OwnedFd>,
    host_pool: Rc<WlShmPool>,
    current: RefCell<Rc<PoolMapping>>,
}

impl WlShmPoolHandler for GuestPoolHandlerImpl {
    fn handle_create_buffer(
        &mut self,
        _slf: &Rc<WlShmPool>,
        id: &Rc<WlBuffer>,
        offset: i32,
        width: i32,
        height: i32,
        stride: i32,
        format: WlShmFormat,
    ) {
        let len = (height.max(0) as usize).saturating_mul(stride.max(0) as usize);
        let Ok(host_buffer) = self
            .host_pool
            .new_try_send_create_buffer(offset, width, height, stride, format)
        else {
            log::error!("could not create a host-side shm buffer");
            return;
        };
        host_buffer.set_handler(HostBufferHandlerImpl { guest_buffer: Rc::downgrade(id) });
        id.set_handler(GuestBufferHandlerImpl {
            pool: self.current.borrow().clone(),
            offset: offset.max(0) as usize,
            len,
            host_buffer,
        });
    }

    fn handle_resize(&mut self, _slf: &Rc<WlShmPool>, size: i32) {
        let Some(mapping) = map_pool(&*self.allocator, &self.guest_fd, size) else {
            return;
        };
        let Ok(new_host_pool) = self.shm.new_try_send_create_pool(&mapping.host_fd, size) else {
            log::error!("could not create a resized host-side shm pool");
            return;
        };
        let old_host_pool = std::mem::replace(&mut self.host_pool, new_host_pool);
        old_host_pool.send_destroy();
        *self.current.borrow_mut() = Rc::new(mapping);
    }

    fn handle_destroy(&mut self, _slf: &Rc<WlShmPool>) {
        self.host_pool.send_destroy();
    }
}

/// The guest's buffer, backed by a slice of the pool mapping captured when it was created. It
/// keeps its generation of [`PoolMapping`] alive even after the guest resizes the pool.
pub struct GuestBufferHandlerImpl {
    pub pool: Rc<PoolMapping>,
    pub offset: usize,
    pub len: usize,
    pub host_buffer: Rc<WlBuffer>,
}

impl WlBufferHandler for GuestBufferHandlerImpl {
    fn handle_destroy(&mut self, _slf: &Rc<WlBuffer>) {
        self.host_buffer.send_destroy();
    }
}

/// The host-only peer buffer. Holds a weak back-reference to the guest buffer purely to relay
/// `release`; a strong one would keep both halves alive forever.
struct HostBufferHandlerImpl {
    guest_buffer: Weak<WlBuffer>,
}

impl WlBufferHandler for HostBufferHandlerImpl {
    fn handle_release(&mut self, _slf: &Rc<WlBuffer>) {
        if let Some(guest_buffer) = self.guest_buffer.upgrade() {
            guest_buffer.send_release();
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::host_memory::MemfdAllocator};

    /// A guest pool mapping whose backing fd already contains `pattern`, repeated to fill it.
    fn mapping_with_pattern(size: usize, pattern: u8) -> PoolMapping {
        let guest_fd = Rc::new(MemfdAllocator.alloc(size).unwrap());
        {
            let mut guest_mut = unsafe { MmapOptions::new().len(size).map_mut(&*guest_fd) }.unwrap();
            guest_mut.fill(pattern);
        }
        map_pool(&MemfdAllocator, &guest_fd, size as i32).unwrap()
    }

    #[test]
    fn blit_copies_guest_bytes_into_host_mapping() {
        let m = mapping_with_pattern(64, 0xab);
        m.host.borrow_mut().fill(0);
        m.blit(0, 64);
        assert!(m.host.borrow().iter().all(|&b| b == 0xab));
    }

    #[test]
    fn blit_only_touches_the_requested_range() {
        let m = mapping_with_pattern(64, 0xab);
        m.host.borrow_mut().fill(0);
        m.blit(16, 8);
        let host = m.host.borrow();
        assert!(host[..16].iter().all(|&b| b == 0));
        assert!(host[16..24].iter().all(|&b| b == 0xab));
        assert!(host[24..].iter().all(|&b| b == 0));
    }

    #[test]
    fn blit_rejects_out_of_bounds_range() {
        let m = mapping_with_pattern(16, 0xab);
        m.host.borrow_mut().fill(0);
        // Should not panic: a range extending past either mapping is just logged and skipped.
        m.blit(8, 16);
        m.blit(usize::MAX, 1);
        assert!(m.host.borrow().iter().all(|&b| b == 0));
    }

    #[test]
    fn blit_is_a_noop_for_a_zero_length_range() {
        let m = mapping_with_pattern(16, 0xab);
        m.host.borrow_mut().fill(0);
        m.blit(0, 0);
        assert!(m.host.borrow().iter().all(|&b| b == 0));
    }
}
