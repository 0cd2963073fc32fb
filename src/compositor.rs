//! Surfaces: mirroring guest pixel content into the host-visible pool before every commit.

use {
    crate::shm::{GuestBufferHandlerImpl, PoolMapping},
    std::rc::Rc,
    wl_proxy::{
        object::{Object, ObjectCoreApi, ObjectUtils},
        protocols::wayland::{
            wl_buffer::WlBuffer,
            wl_compositor::{WlCompositor, WlCompositorHandler},
            wl_output::WlOutputTransform,
            wl_surface::{WlSurface, WlSurfaceError, WlSurfaceHandler},
        },
    },
};

pub struct WlCompositorHandlerImpl;

impl WlCompositorHandler for WlCompositorHandlerImpl {
    fn handle_create_surface(&mut self, slf: &Rc<WlCompositor>, id: &Rc<WlSurface>) {
        id.set_handler(WlSurfaceHandlerImpl::default());
        slf.send_create_surface(id);
    }
}

struct AttachedBuffer {
    pool: Rc<PoolMapping>,
    offset: usize,
    len: usize,
    host_buffer: Rc<WlBuffer>,
}

#[derive(Default)]
pub struct WlSurfaceHandlerImpl {
    attached: Option<AttachedBuffer>,
}

impl WlSurfaceHandler for WlSurfaceHandlerImpl {
    fn handle_attach(&mut self, slf: &Rc<WlSurface>, buffer: Option<&Rc<WlBuffer>>, x: i32, y: i32) {
        self.attached = buffer.map(|buffer| {
            let handler = buffer.get_handler_ref::<GuestBufferHandlerImpl>();
            AttachedBuffer {
                pool: handler.pool.clone(),
                offset: handler.offset,
                len: handler.len,
                host_buffer: handler.host_buffer.clone(),
            }
        });
        slf.send_attach(self.attached.as_ref().map(|a| &a.host_buffer), x, y);
    }

    fn handle_commit(&mut self, slf: &Rc<WlSurface>) {
        if let Some(attached) = &self.attached {
            attached.pool.blit(attached.offset, attached.len);
        }
        slf.send_commit();
    }

    fn handle_set_buffer_transform(&mut self, slf: &Rc<WlSurface>, _transform: WlOutputTransform) {
        slf.core().state().display().send_error(
            slf.clone() as Rc<dyn Object>,
            WlSurfaceError::INVALID_TRANSFORM.0,
            "buffer transforms are not supported",
        );
    }
}
