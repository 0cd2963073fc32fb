use {
    crate::{config::RelayConfig, error::RelayError, host_memory::{HostMemoryAllocator, MemfdAllocator, VirtioWlAllocator}, relay},
    clap::{CommandFactory, Parser, ValueHint},
    clap_complete::Shell,
    std::{io::stdout, sync::Arc},
};

/// Relays a guest Wayland client to the host compositor.
///
/// Starts a Wayland server on a freshly chosen socket, spawns the given program with
/// `WAYLAND_DISPLAY` pointed at it, and forwards every connection it accepts to the host
/// compositor this process itself is connected to (by the usual `WAYLAND_DISPLAY` or
/// `WAYLAND_SOCKET` rules).
#[derive(Parser, Debug)]
struct RelayArgs {
    /// Generate shell completions instead of running the program.
    #[clap(long, value_enum, value_name = "SHELL")]
    generate_completion: Option<Shell>,
    /// Prepended to every window title the guest sets on the host.
    #[clap(long, default_value = "")]
    tag: String,
    /// Path to a virtio_wl character device (e.g. /dev/wl0) used to allocate host-visible
    /// shared memory. If unset, host memory is allocated with memfd_create instead, which is
    /// only useful when the relay and the host compositor are on the same machine.
    #[clap(long, value_hint = ValueHint::FilePath, value_name = "PATH")]
    virtio_wl_device: Option<String>,
    #[clap(
        trailing_var_arg = true,
        value_hint = ValueHint::CommandWithArguments,
        required_unless_present = "generate_completion",
    )]
    /// The guest program to run.
    program: Option<Vec<String>>,
}

pub fn main() -> Result<(), RelayError> {
    env_logger::init();
    let args = RelayArgs::parse();
    if let Some(shell) = args.generate_completion {
        let stdout = stdout();
        let mut stdout = stdout.lock();
        clap_complete::generate(shell, &mut RelayArgs::command(), "wl-guest-relay", &mut stdout);
        return Ok(());
    }
    let allocator: Arc<dyn HostMemoryAllocator> = match &args.virtio_wl_device {
        Some(path) => Arc::new(VirtioWlAllocator::open(path).map_err(RelayError::OpenVirtioWl)?),
        None => Arc::new(MemfdAllocator),
    };
    let config = RelayConfig { tag: args.tag.into() };
    relay::main(config, allocator, args.program.unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tag_and_program() {
        let args = RelayArgs::try_parse_from(["wl-guest-relay", "--tag", "[vm] ", "weston-terminal", "--fullscreen"]).unwrap();
        assert_eq!(args.tag, "[vm] ");
        assert_eq!(args.program.unwrap(), vec!["weston-terminal", "--fullscreen"]);
    }

    #[test]
    fn defaults_to_an_empty_tag() {
        let args = RelayArgs::try_parse_from(["wl-guest-relay", "weston-terminal"]).unwrap();
        assert_eq!(args.tag, "");
    }

    #[test]
    fn requires_a_program_unless_generating_completions() {
        assert!(RelayArgs::try_parse_from(["wl-guest-relay"]).is_err());
        assert!(RelayArgs::try_parse_from(["wl-guest-relay", "--generate-completion", "bash"]).is_ok());
    }

    #[test]
    fn virtio_wl_device_is_optional() {
        let args = RelayArgs::try_parse_from(["wl-guest-relay", "--virtio-wl-device", "/dev/wl0", "prog"]).unwrap();
        assert_eq!(args.virtio_wl_device.as_deref(), Some("/dev/wl0"));
    }
}
