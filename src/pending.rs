use log::{debug, trace, warn};
use rand::{thread_rng, Rng};
use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, Instant};

use tokio::net::UdpSocket;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::address_family::AddressFamily;
use crate::dns_parser::Message;

/// Transaction ids are drawn uniformly from `1..=MAX_ID`
pub const MAX_ID: u16 = 50000;

const RECV_BUF_SIZE: usize = 65536;

/// The table of in-flight requests sharing one socket per address family.
///
/// Cloning gives another handle to the same table. A socket is opened when
/// the first request of its family is added and closed again when the last
/// one is removed.
#[derive(Clone, Default)]
pub struct PendingRequests {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    active: HashMap<u16, Entry>,
    sockets: HashMap<AddressFamily, SharedSocket>,
}

struct Entry {
    family: AddressFamily,
    answers: mpsc::UnboundedSender<Message>,
    created: Instant,
}

struct SharedSocket {
    socket: Arc<UdpSocket>,
    reader: JoinHandle<()>,
}

impl Drop for SharedSocket {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// What a request gets back when it joins the table
pub struct Registration {
    pub id: u16,
    pub socket: Arc<UdpSocket>,
    /// Every datagram carrying `id` lands here until the entry is removed
    pub answers: mpsc::UnboundedReceiver<Message>,
}

impl PendingRequests {
    pub fn new() -> PendingRequests {
        PendingRequests::default()
    }

    fn lock(&self) -> MutexGuard<Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Assigns an id not used by any active request and records the entry.
    ///
    /// Must be called from within a tokio runtime, which hosts the receive
    /// task of a newly opened socket.
    pub fn add(&self, family: AddressFamily) -> io::Result<Registration> {
        let mut inner = self.lock();
        let socket = inner.acquire(family, Arc::downgrade(&self.inner))?;

        let mut rng = thread_rng();
        let mut id = rng.gen_range(1..=MAX_ID);
        while inner.active.contains_key(&id) {
            id = rng.gen_range(1..=MAX_ID);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        inner.active.insert(
            id,
            Entry {
                family,
                answers: tx,
                created: Instant::now(),
            },
        );
        debug!("registered request {} ({} active)", id, inner.active.len());

        Ok(Registration {
            id,
            socket,
            answers: rx,
        })
    }

    /// Drops the entry for `id`, returning how long it was active. Closes the
    /// family's socket if this was its last request.
    pub fn remove(&self, id: u16) -> Option<Duration> {
        let mut inner = self.lock();
        let entry = inner.active.remove(&id)?;
        if !inner.active.values().any(|e| e.family == entry.family) {
            inner.release(entry.family);
        }
        Some(entry.created.elapsed())
    }

    /// Routes an inbound datagram to the request with the matching id.
    ///
    /// Undecodable datagrams and unknown ids are dropped.
    pub fn handle_message(&self, data: &[u8], from: SocketAddr) {
        let message = match Message::parse(data) {
            Ok(message) => message,
            Err(error) => {
                warn!("couldn't parse packet from {:?}: {}", from, error);
                return;
            }
        };

        let inner = self.lock();
        match inner.active.get(&message.header.id) {
            Some(entry) => {
                trace!("response {} from {:?}", message.header.id, from);
                // the request may already be finishing; then nobody listens
                let _ = entry.answers.send(message);
            }
            None => trace!(
                "dropping response with unknown id {} from {:?}",
                message.header.id,
                from
            ),
        }
    }

    pub fn is_active(&self, id: u16) -> bool {
        self.lock().active.contains_key(&id)
    }

    pub fn active_ids(&self) -> Vec<u16> {
        self.lock().active.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_socket(&self, family: AddressFamily) -> bool {
        self.lock().sockets.contains_key(&family)
    }
}

impl Inner {
    fn acquire(
        &mut self,
        family: AddressFamily,
        table: Weak<Mutex<Inner>>,
    ) -> io::Result<Arc<UdpSocket>> {
        if let Some(shared) = self.sockets.get(&family) {
            return Ok(shared.socket.clone());
        }

        let runtime = Handle::try_current().map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let socket = {
            let _guard = runtime.enter();
            Arc::new(UdpSocket::from_std(family.bind()?)?)
        };
        debug!("opened {:?} socket on {:?}", family, socket.local_addr()?);

        let reader = runtime.spawn(receive(socket.clone(), table));
        self.sockets.insert(
            family,
            SharedSocket {
                socket: socket.clone(),
                reader,
            },
        );
        Ok(socket)
    }

    fn release(&mut self, family: AddressFamily) {
        if self.sockets.remove(&family).is_some() {
            debug!("closed idle {:?} socket", family);
        }
    }
}

async fn receive(socket: Arc<UdpSocket>, table: Weak<Mutex<Inner>>) {
    let mut buf = vec![0u8; RECV_BUF_SIZE];
    loop {
        match socket.recv_from(&mut buf).await {
            Ok((len, from)) => match table.upgrade() {
                Some(inner) => PendingRequests { inner }.handle_message(&buf[..len], from),
                None => return,
            },
            Err(err) if is_transient(&err) => trace!("ignoring receive error: {}", err),
            Err(err) => {
                warn!("error receiving packet, closing reader: {}", err);
                return;
            }
        }
    }
}

/// ICMP errors for earlier datagrams surface on the next read and say
/// nothing about the socket itself.
fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionRefused
    )
}
