use {crate::error::RelayError, error_reporter::Report};

mod cli;
mod compositor;
mod config;
mod data_device;
mod error;
mod host_memory;
mod registry;
mod relay;
mod seat;
mod shm;
mod xdg_shell;

fn main() -> Result<(), Report<RelayError>> {
    cli::main().map_err(Report::new)
}
