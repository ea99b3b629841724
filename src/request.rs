use byteorder::{BigEndian, ByteOrder};
use log::{debug, trace, warn};
use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::address_family::AddressFamily;
use crate::dns_parser::{Message, Question};
use crate::error::Error;
use crate::pending::PendingRequests;
use crate::DEFAULT_TIMEOUT;

/// How a request ended. Delivered to its callback exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Answered(Message),
    TimedOut,
    Cancelled,
    /// The query could not be written to the socket
    SendFailed(io::ErrorKind),
}

type Callback = Box<dyn FnOnce(Outcome) + Send>;

/// A single query to a single server, not yet sent
#[derive(Debug, Clone)]
pub struct Request {
    question: Question,
    server: SocketAddr,
    timeout: Duration,
    recursion_desired: bool,
}

/// A sent request. Dropping the handle does not cancel it.
pub struct RequestHandle {
    completion: Arc<Completion>,
    task: JoinHandle<()>,
}

struct Completion {
    id: u16,
    table: PendingRequests,
    callback: Mutex<Option<Callback>>,
}

impl Request {
    pub fn new(question: Question, server: SocketAddr) -> Request {
        Request {
            question,
            server,
            timeout: DEFAULT_TIMEOUT,
            recursion_desired: true,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Request {
        self.timeout = timeout;
        self
    }

    pub fn with_recursion(mut self, recursion_desired: bool) -> Request {
        self.recursion_desired = recursion_desired;
        self
    }

    pub fn question(&self) -> &Question {
        &self.question
    }

    pub fn server(&self) -> SocketAddr {
        self.server
    }

    /// Registers with `table` and spawns the task that writes the query and
    /// then waits for the answer or the timeout.
    ///
    /// `callback` runs exactly once with the first matching response, a
    /// timeout, a cancellation or a failed write. Encoding errors and
    /// failing to open the socket are returned here instead and the
    /// callback is never called. Must be called from within a tokio runtime.
    pub fn send<F>(self, table: &PendingRequests, callback: F) -> Result<RequestHandle, Error>
    where
        F: FnOnce(Outcome) + Send + 'static,
    {
        // encode before registering so bad names never take an id
        let mut packet =
            Message::query(0, self.recursion_desired, self.question.clone()).to_bytes()?;

        let registration = table.add(AddressFamily::of(&self.server))?;
        let id = registration.id;
        BigEndian::write_u16(&mut packet[..2], id);

        debug!(
            "sending request {} for {} {} to {:?}",
            id, self.question.qtype, self.question.qname, self.server
        );

        let completion = Arc::new(Completion {
            id,
            table: table.clone(),
            callback: Mutex::new(Some(Box::new(callback))),
        });
        let exchange = Exchange {
            socket: registration.socket,
            packet,
            server: self.server,
            answers: registration.answers,
            timeout: self.timeout,
        };
        let task = tokio::spawn(exchange.run(completion.clone()));

        Ok(RequestHandle { completion, task })
    }

    /// Sends the request and waits for its answer.
    ///
    /// Dropping the returned future cancels the request.
    pub async fn query(self, table: &PendingRequests) -> Result<Message, Error> {
        let (tx, rx) = oneshot::channel();
        let handle = self.send(table, move |outcome| {
            let _ = tx.send(outcome);
        })?;
        let _cancel = CancelOnDrop(handle);

        match rx.await {
            Ok(Outcome::Answered(message)) => Ok(message),
            Ok(Outcome::TimedOut) => Err(Error::Timeout),
            Ok(Outcome::SendFailed(kind)) => Err(Error::Io(kind.into())),
            Ok(Outcome::Cancelled) | Err(_) => Err(Error::Cancelled),
        }
    }
}

/// The part of a sent request that lives in its task
struct Exchange {
    socket: Arc<UdpSocket>,
    packet: Vec<u8>,
    server: SocketAddr,
    answers: mpsc::UnboundedReceiver<Message>,
    timeout: Duration,
}

impl Exchange {
    async fn run(mut self, completion: Arc<Completion>) {
        // a freshly opened socket has no write readiness recorded yet
        if let Err(err) = self.socket.send_to(&self.packet, self.server).await {
            warn!(
                "error sending request {} to {:?}: {}",
                completion.id, self.server, err
            );
            completion.finish(Outcome::SendFailed(err.kind()));
            return;
        }
        trace!("sent request {} to {:?}", completion.id, self.server);

        tokio::select! {
            Some(answer) = self.answers.recv() => {
                completion.finish(Outcome::Answered(answer));
            }
            _ = tokio::time::sleep(self.timeout) => {
                completion.finish(Outcome::TimedOut);
            }
        }
    }
}

impl Completion {
    /// Runs the callback unless some earlier outcome already did. Returns
    /// whether this call was the one that finished the request.
    fn finish(&self, outcome: Outcome) -> bool {
        let callback = self
            .callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let callback = match callback {
            Some(callback) => callback,
            None => return false,
        };

        let elapsed = self.table.remove(self.id);
        match outcome {
            Outcome::Answered(..) => debug!("request {} answered after {:?}", self.id, elapsed),
            Outcome::TimedOut => debug!("request {} timed out", self.id),
            Outcome::Cancelled => debug!("request {} cancelled", self.id),
            Outcome::SendFailed(..) => debug!("request {} failed to send", self.id),
        }
        callback(outcome);
        true
    }

    fn is_finished(&self) -> bool {
        self.callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

impl RequestHandle {
    /// The transaction id; free for reuse once the request has finished
    pub fn id(&self) -> u16 {
        self.completion.id
    }

    pub fn is_finished(&self) -> bool {
        self.completion.is_finished()
    }

    /// Ends the request with `Outcome::Cancelled` unless it already ended.
    /// Returns whether it was still running.
    pub fn cancel(&self) -> bool {
        let cancelled = self.completion.finish(Outcome::Cancelled);
        self.task.abort();
        cancelled
    }
}

impl fmt::Debug for RequestHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("RequestHandle")
            .field("id", &self.id())
            .field("finished", &self.is_finished())
            .finish()
    }
}

struct CancelOnDrop(RequestHandle);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}
