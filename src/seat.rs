//! Touch input is not relayed: `get_touch` always fails, and `capabilities` is masked so the
//! guest never learns touch is available in the first place.

use {
    std::rc::Rc,
    wl_proxy::{
        object::{Object, ObjectCoreApi},
        protocols::wayland::{
            wl_seat::{WlSeat, WlSeatCapability, WlSeatError, WlSeatHandler},
            wl_touch::WlTouch,
        },
    },
};

pub struct WlSeatHandlerImpl;

/// Keeps only the capability bits the relay actually forwards input for.
fn mask_capabilities(capabilities: WlSeatCapability) -> WlSeatCapability {
    capabilities.intersection(WlSeatCapability::POINTER.union(WlSeatCapability::KEYBOARD))
}

impl WlSeatHandler for WlSeatHandlerImpl {
    fn handle_capabilities(&mut self, slf: &Rc<WlSeat>, capabilities: WlSeatCapability) {
        slf.send_capabilities(mask_capabilities(capabilities));
    }

    fn handle_get_touch(&mut self, slf: &Rc<WlSeat>, id: &Rc<WlTouch>) {
        slf.core().state().display().send_error(
            id.clone() as Rc<dyn Object>,
            WlSeatError::MISSING_CAPABILITY.0,
            "touch input is not supported",
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_touch() {
        let all = WlSeatCapability::POINTER
            .union(WlSeatCapability::KEYBOARD)
            .union(WlSeatCapability::TOUCH);
        let masked = mask_capabilities(all);
        assert!(masked.contains(WlSeatCapability::POINTER));
        assert!(masked.contains(WlSeatCapability::KEYBOARD));
        assert!(!masked.contains(WlSeatCapability::TOUCH));
    }

    #[test]
    fn keeps_empty() {
        assert_eq!(mask_capabilities(WlSeatCapability::empty()), WlSeatCapability::empty());
    }

    #[test]
    fn pointer_only_is_unchanged() {
        let masked = mask_capabilities(WlSeatCapability::POINTER);
        assert_eq!(masked, WlSeatCapability::POINTER);
    }
}
