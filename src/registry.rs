//! The registry the guest sees: a fixed catalog of globals, independent of whatever the host
//! compositor actually advertises.
//!
//! A real host registry can enumerate globals in any order, under any names, and possibly more
//! than once per interface. Exposing that directly to the guest would make its startup sequence
//! depend on host-specific ordering. Instead the relay advertises a small, fixed catalog the
//! moment the guest asks for a registry, using the catalog index as the synthetic global name,
//! and only resolves each entry to the host's real name lazily, as the host's own registry
//! stream arrives.

use {
    crate::{compositor::WlCompositorHandlerImpl, config::RelayConfig, data_device::WlDataDeviceManagerHandlerImpl, host_memory::HostMemoryAllocator, seat::WlSeatHandlerImpl, shm::WlShmHandlerImpl, xdg_shell::XdgWmBaseHandlerImpl},
    std::{cell::RefCell, collections::HashMap, rc::Rc, sync::Arc},
    wl_proxy::{
        object::{Object, ObjectCoreApi, ObjectRcUtils},
        protocols::wayland::{
            wl_compositor::WlCompositor,
            wl_data_device_manager::WlDataDeviceManager,
            wl_display::{WlDisplay, WlDisplayError, WlDisplayHandler},
            wl_registry::{WlRegistry, WlRegistryHandler},
            wl_seat::WlSeat,
            wl_shm::WlShm,
        },
        protocols::xdg_shell::xdg_wm_base::XdgWmBase,
        protocols::ObjectInterface,
    },
};

struct CatalogEntry {
    interface: ObjectInterface,
    max_version: u32,
}

const CATALOG: &[CatalogEntry] = &[
    CatalogEntry { interface: ObjectInterface::WlCompositor, max_version: 3 },
    CatalogEntry { interface: ObjectInterface::WlSubcompositor, max_version: 1 },
    CatalogEntry { interface: ObjectInterface::WlShm, max_version: 1 },
    CatalogEntry { interface: ObjectInterface::XdgWmBase, max_version: 1 },
    CatalogEntry { interface: ObjectInterface::WlSeat, max_version: 5 },
    CatalogEntry { interface: ObjectInterface::WlOutput, max_version: 2 },
    CatalogEntry { interface: ObjectInterface::WlDataDeviceManager, max_version: 3 },
    CatalogEntry { interface: ObjectInterface::ZxdgOutputManagerV1, max_version: 3 },
];

/// Installed on every client's [`WlDisplay`]; its only job is to attach the registry handler
/// the moment a registry is requested.
pub struct RelayDisplayHandlerImpl {
    pub config: RelayConfig,
    pub allocator: Arc<dyn HostMemoryAllocator>,
}

impl WlDisplayHandler for RelayDisplayHandlerImpl {
    fn handle_get_registry(&mut self, slf: &Rc<WlDisplay>, registry: &Rc<WlRegistry>) {
        registry.set_handler(WlRegistryHandlerImpl {
            config: self.config.clone(),
            allocator: self.allocator.clone(),
            host_name: RefCell::new(vec![None; CATALOG.len()]),
            index_of_host_name: RefCell::new(HashMap::new()),
        });
        slf.send_get_registry(registry);
        for (index, entry) in CATALOG.iter().enumerate() {
            registry.send_global(index as u32, entry.interface, entry.max_version);
        }
    }
}

pub struct WlRegistryHandlerImpl {
    config: RelayConfig,
    allocator: Arc<dyn HostMemoryAllocator>,
    /// `host_name[i]` is the name the host currently uses for `CATALOG[i]`, once the host has
    /// advertised a matching global.
    host_name: RefCell<Vec<Option<u32>>>,
    index_of_host_name: RefCell<HashMap<u32, usize>>,
}

impl WlRegistryHandlerImpl {
    fn reject(&self, slf: &Rc<WlRegistry>, id: &Rc<dyn Object>, code: WlDisplayError, message: &str) {
        slf.core()
            .state()
            .display()
            .send_error(id.clone(), code.0, message);
    }
}

/// A successful bind, resolved against the fixed catalog.
struct Bind {
    host_name: u32,
    interface: ObjectInterface,
}

/// The catalog/host-name checks from `handle_bind`, pulled out so they can be exercised
/// without a live registry object.
fn validate_bind(
    host_name: &[Option<u32>],
    name: u32,
    requested_version: u32,
    requested_interface: ObjectInterface,
) -> Result<Bind, (WlDisplayError, &'static str)> {
    let entry = CATALOG
        .get(name as usize)
        .ok_or((WlDisplayError::INVALID_OBJECT, "no such global"))?;
    if requested_version > entry.max_version {
        return Err((WlDisplayError::INVALID_METHOD, "version too new"));
    }
    if requested_interface != entry.interface {
        return Err((WlDisplayError::INVALID_OBJECT, "interface mismatch"));
    }
    let host_name = host_name[name as usize].ok_or((WlDisplayError::INVALID_OBJECT, "global not currently available"))?;
    Ok(Bind { host_name, interface: entry.interface })
}

impl WlRegistryHandler for WlRegistryHandlerImpl {
    fn handle_global(&mut self, _slf: &Rc<WlRegistry>, name: u32, interface: ObjectInterface, _version: u32) {
        let Some(index) = CATALOG.iter().position(|e| e.interface == interface) else {
            return;
        };
        self.host_name.borrow_mut()[index] = Some(name);
        self.index_of_host_name.borrow_mut().insert(name, index);
    }

    fn handle_global_remove(&mut self, _slf: &Rc<WlRegistry>, name: u32) {
        if let Some(index) = self.index_of_host_name.borrow_mut().remove(&name) {
            self.host_name.borrow_mut()[index] = None;
        }
    }

    fn handle_bind(&mut self, slf: &Rc<WlRegistry>, name: u32, id: Rc<dyn Object>) {
        let bind = match validate_bind(&self.host_name.borrow(), name, id.version(), id.interface()) {
            Ok(bind) => bind,
            Err((code, message)) => {
                self.reject(slf, &id, code, message);
                return;
            }
        };
        let host_name = bind.host_name;

        match bind.interface {
            ObjectInterface::WlCompositor => {
                id.downcast::<WlCompositor>()
                    .set_handler(WlCompositorHandlerImpl);
            }
            ObjectInterface::WlShm => {
                id.downcast::<WlShm>().set_handler(WlShmHandlerImpl {
                    allocator: self.allocator.clone(),
                });
            }
            ObjectInterface::WlSeat => {
                id.downcast::<WlSeat>().set_handler(WlSeatHandlerImpl);
            }
            ObjectInterface::XdgWmBase => {
                id.downcast::<XdgWmBase>().set_handler(XdgWmBaseHandlerImpl {
                    tag: self.config.tag.clone(),
                });
            }
            ObjectInterface::WlDataDeviceManager => {
                id.downcast::<WlDataDeviceManager>()
                    .set_handler(WlDataDeviceManagerHandlerImpl);
            }
            // wl_subcompositor, wl_output, zxdg_output_manager_v1: forwarded verbatim, no
            // handler needed.
            _ => {}
        }

        slf.send_bind(host_name, id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_matches_supported_entries() {
        assert_eq!(CATALOG.len(), 8);
        assert_eq!(CATALOG[0].interface, ObjectInterface::WlCompositor);
        assert_eq!(CATALOG[0].max_version, 3);
        assert_eq!(CATALOG[4].interface, ObjectInterface::WlSeat);
        assert_eq!(CATALOG[4].max_version, 5);
    }

    #[test]
    fn rejects_out_of_range_name() {
        let host_name = vec![None; CATALOG.len()];
        let err = validate_bind(&host_name, 999, 3, ObjectInterface::WlCompositor).unwrap_err();
        assert_eq!(err.0, WlDisplayError::INVALID_OBJECT);
    }

    #[test]
    fn rejects_version_too_new() {
        let host_name = vec![Some(1); CATALOG.len()];
        let err = validate_bind(&host_name, 0, 4, ObjectInterface::WlCompositor).unwrap_err();
        assert_eq!(err.0, WlDisplayError::INVALID_METHOD);
    }

    #[test]
    fn rejects_interface_mismatch() {
        let host_name = vec![Some(1); CATALOG.len()];
        let err = validate_bind(&host_name, 0, 3, ObjectInterface::WlShm).unwrap_err();
        assert_eq!(err.0, WlDisplayError::INVALID_OBJECT);
    }

    #[test]
    fn rejects_unavailable_host_global() {
        let host_name = vec![None; CATALOG.len()];
        let err = validate_bind(&host_name, 0, 3, ObjectInterface::WlCompositor).unwrap_err();
        assert_eq!(err.0, WlDisplayError::INVALID_OBJECT);
    }

    #[test]
    fn resolves_host_name() {
        let mut host_name = vec![None; CATALOG.len()];
        host_name[4] = Some(42);
        let bind = validate_bind(&host_name, 4, 5, ObjectInterface::WlSeat).unwrap();
        assert_eq!(bind.host_name, 42);
        assert_eq!(bind.interface, ObjectInterface::WlSeat);
    }
}
