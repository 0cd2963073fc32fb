use std::sync::Arc;

/// Per-process configuration shared by every client connection.
///
/// Built once from the CLI and handed to each client's display handler by value (it is
/// cheap to clone: the tag is reference counted).
#[derive(Clone)]
pub struct RelayConfig {
    /// Prepended to every `xdg_toplevel.set_title` forwarded to the host.
    pub tag: Arc<str>,
}
