use {std::io, thiserror::Error, wl_proxy::simple::SimpleProxyError};

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("could not open the virtio_wl device")]
    OpenVirtioWl(#[source] io::Error),
    #[error("could not create a simple server")]
    CreateServer(#[source] SimpleProxyError),
    #[error("could not spawn guest process")]
    SpawnGuest(#[source] io::Error),
    #[error("the server terminated")]
    ServerFailed(#[source] SimpleProxyError),
}
