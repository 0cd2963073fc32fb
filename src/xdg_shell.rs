//! Window titles get a prefix so the guest's windows are distinguishable on the host.

use {
    std::{rc::Rc, sync::Arc},
    wl_proxy::protocols::{
        wayland::wl_surface::WlSurface,
        xdg_shell::{
            xdg_surface::{XdgSurface, XdgSurfaceHandler},
            xdg_toplevel::{XdgToplevel, XdgToplevelHandler},
            xdg_wm_base::{XdgWmBase, XdgWmBaseHandler},
        },
    },
};

pub struct XdgWmBaseHandlerImpl {
    pub tag: Arc<str>,
}

impl XdgWmBaseHandler for XdgWmBaseHandlerImpl {
    fn handle_get_xdg_surface(&mut self, slf: &Rc<XdgWmBase>, id: &Rc<XdgSurface>, surface: &Rc<WlSurface>) {
        id.set_handler(XdgSurfaceHandlerImpl { tag: self.tag.clone() });
        slf.send_get_xdg_surface(id, surface);
    }
}

pub struct XdgSurfaceHandlerImpl {
    tag: Arc<str>,
}

impl XdgSurfaceHandler for XdgSurfaceHandlerImpl {
    fn handle_get_toplevel(&mut self, slf: &Rc<XdgSurface>, id: &Rc<XdgToplevel>) {
        id.set_handler(XdgToplevelHandlerImpl { tag: self.tag.clone() });
        slf.send_get_toplevel(id);
    }
}

pub struct XdgToplevelHandlerImpl {
    tag: Arc<str>,
}

fn tag_title(tag: &str, title: &str) -> String {
    format!("{tag}{title}")
}

impl XdgToplevelHandler for XdgToplevelHandlerImpl {
    fn handle_set_title(&mut self, slf: &Rc<XdgToplevel>, title: &str) {
        slf.send_set_title(&tag_title(&self.tag, title));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepends_tag() {
        assert_eq!(tag_title("[vm] ", "term"), "[vm] term");
    }

    #[test]
    fn empty_tag_is_passthrough() {
        assert_eq!(tag_title("", "term"), "term");
    }
}
