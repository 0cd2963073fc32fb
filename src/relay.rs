//! Wires up the pieces: a server socket, a guest process, and a display handler installed per
//! connection.

use {
    crate::{
        config::RelayConfig,
        error::RelayError,
        host_memory::HostMemoryAllocator,
        registry::RelayDisplayHandlerImpl,
    },
    std::{process::Command, sync::Arc},
    wl_proxy::{
        baseline::Baseline,
        simple::{SimpleCommandExt, SimpleProxy},
    },
};

pub fn main(config: RelayConfig, allocator: Arc<dyn HostMemoryAllocator>, program: Vec<String>) -> Result<(), RelayError> {
    let server = SimpleProxy::new(Baseline::ALL_OF_THEM).map_err(RelayError::CreateServer)?;
    Command::new(&program[0])
        .args(&program[1..])
        .with_wayland_display(server.display())
        .spawn_and_forward_exit_code()
        .map_err(RelayError::SpawnGuest)?;
    let err = server.run(|| RelayDisplayHandlerImpl {
        config: config.clone(),
        allocator: allocator.clone(),
    });
    Err(RelayError::ServerFailed(err))
}
