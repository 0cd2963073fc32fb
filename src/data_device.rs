//! Clipboard and drag-and-drop are not relayed: the manager hands the guest inert objects
//! instead of forwarding them to the host.

use {
    std::rc::Rc,
    wl_proxy::{
        object::{Object, ObjectCoreApi},
        protocols::wayland::{
            wl_data_device::WlDataDevice,
            wl_data_device_manager::{WlDataDeviceManager, WlDataDeviceManagerHandler},
            wl_data_source::WlDataSource,
            wl_seat::WlSeat,
        },
    },
};

pub struct WlDataDeviceManagerHandlerImpl;

impl WlDataDeviceManagerHandler for WlDataDeviceManagerHandlerImpl {
    fn handle_create_data_source(&mut self, slf: &Rc<WlDataDeviceManager>, id: &Rc<WlDataSource>) {
        slf.core().state().display().send_error(
            id.clone() as Rc<dyn Object>,
            0,
            "clipboard and drag-and-drop are not supported",
        );
    }

    fn handle_get_data_device(&mut self, _slf: &Rc<WlDataDeviceManager>, id: &Rc<WlDataDevice>, _seat: &Rc<WlSeat>) {
        // Never given a server id: every request the guest sends on it is silently dropped by
        // the default handlers' forward_to_server check.
        id.set_forward_to_server(false);
    }
}
