//! `Acceptor`: the listener `Connection` whose handler accepts new
//! clients and hands each one to a reactor chosen by the
//! [`DistributionAgent`].

use crate::distribution::DistributionAgent;
use crate::error::Result;
use crate::net::address::NetAddress;
use crate::net::socket::Socket;
use crate::reactor::connection::Connection;
use crate::reactor::looper::Looper;
use std::sync::Arc;

/// Installed on every accepted client connection.
pub type OnHandle = Arc<dyn Fn(&mut Connection) + Send + Sync>;
/// Invoked on the listener connection itself after each successful accept.
pub type OnAccept = Arc<dyn Fn(&mut Connection) + Send + Sync>;

pub struct Acceptor {
    // Boxed so the address registered with the poller in `new` stays
    // valid no matter how many times the surrounding `Acceptor` (and
    // this field along with it) gets moved afterwards. Moving a `Box`
    // relocates the pointer, not the heap allocation it points to.
    listener: Box<Connection>,
}

impl Acceptor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        listener_looper: &Arc<Looper>,
        agent: Arc<DistributionAgent>,
        address: &NetAddress,
        on_handle: OnHandle,
        on_accept: OnAccept,
    ) -> Result<Self> {
        let mut socket = Socket::empty();
        socket.bind(address, true)?;
        socket.listen()?;
        socket.set_non_blocking()?;

        let mut listener_conn = Box::new(Connection::new_listener(socket));
        listener_conn.set_handler(Arc::new(move |listener: &mut Connection| {
            loop {
                match listener.accept() {
                    Ok(Some((client_socket, peer_addr))) => {
                        let mut client_conn = Connection::new_client(client_socket);
                        client_conn.set_handler(Arc::clone(&on_handle));

                        let (target, index) = agent.select_candidate();
                        tracing::info!(%peer_addr, reactor = index, "accepted connection");
                        if let Err(err) = target.add_connection(client_conn) {
                            tracing::warn!(error = %err, "failed to register accepted connection");
                        }

                        on_accept(listener);
                    }
                    Ok(None) => break,
                    Err(err) => {
                        tracing::warn!(error = %err, "accept failed");
                        break;
                    }
                }
            }
        }));

        // Register the listener's final, stable heap address. It must
        // already be boxed before this call, since `add_borrowed` stashes
        // the pointer it's given directly into epoll's kernel-side state.
        listener_looper.add_borrowed(listener_conn.as_mut())?;

        Ok(Self { listener: listener_conn })
    }

    pub fn listener_fd(&self) -> std::os::fd::RawFd {
        self.listener.fd()
    }
}
