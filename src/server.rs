use log::{debug, error, trace, warn};
use std::collections::VecDeque;
use std::io;
use std::io::ErrorKind::WouldBlock;
use std::net::SocketAddr;
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use tokio::{net::UdpSocket, sync::mpsc};

use crate::address_family::AddressFamily;
use crate::dns_parser::{Message, ResponseCode};

/// Fills in the response to one query.
///
/// `response` starts out as `Message::response_to(query)`.
pub trait Handler {
    fn handle(&mut self, query: &Message, response: &mut Message, from: SocketAddr);
}

impl<F> Handler for F
where
    F: FnMut(&Message, &mut Message, SocketAddr),
{
    fn handle(&mut self, query: &Message, response: &mut Message, from: SocketAddr) {
        self(query, response, from)
    }
}

#[derive(Clone, Debug)]
pub enum Command {
    Shutdown,
}

/// Answers queries arriving on one UDP socket. Runs until shut down
/// through its `ServerHandle`.
pub struct Server<H: Handler> {
    socket: UdpSocket,
    handler: H,
    commands: mpsc::UnboundedReceiver<Command>,
    outgoing: VecDeque<(Vec<u8>, SocketAddr)>,
}

#[derive(Clone, Debug)]
pub struct ServerHandle {
    commands: mpsc::UnboundedSender<Command>,
    local_addr: SocketAddr,
}

impl<H: Handler> Server<H> {
    // Will panic if called from outside the context of a runtime
    pub fn bind(addr: SocketAddr, handler: H) -> io::Result<(Server<H>, ServerHandle)> {
        let std_socket = AddressFamily::bind_to(addr)?;
        let socket = UdpSocket::from_std(std_socket)?;
        let local_addr = socket.local_addr()?;
        debug!("serving on {:?}", local_addr);

        let (tx, rx) = mpsc::unbounded_channel();

        let server = Server {
            socket,
            handler,
            commands: rx,
            outgoing: VecDeque::new(),
        };

        Ok((
            server,
            ServerHandle {
                commands: tx,
                local_addr,
            },
        ))
    }

    fn recv_packets(&mut self, cx: &mut Context) -> io::Result<()> {
        let mut recv_buf = [0u8; 65536];
        loop {
            let mut buf = tokio::io::ReadBuf::new(&mut recv_buf);
            let addr = match self.socket.poll_recv_from(cx, &mut buf) {
                Poll::Ready(Ok(addr)) => addr,
                Poll::Ready(Err(err)) => return Err(err),
                Poll::Pending => break,
            };
            self.handle_packet(buf.filled(), addr);
        }

        Ok(())
    }

    fn handle_packet(&mut self, buffer: &[u8], addr: SocketAddr) {
        trace!("received packet from {:?}", addr);

        let packet = match Message::parse(buffer) {
            Ok(packet) => packet,
            Err(error) => {
                warn!("couldn't parse packet from {:?}: {}", addr, error);
                return;
            }
        };

        if !packet.header.query {
            trace!("received packet from {:?} with no query", addr);
            return;
        }

        let mut response = Message::response_to(&packet);
        self.handler.handle(&packet, &mut response, addr);

        let bytes = match response.to_bytes() {
            Ok(bytes) => bytes,
            Err(err) => {
                error!("couldn't encode response to {:?}: {}", addr, err);
                let mut failure = Message::response_to(&packet);
                failure.header.response_code = ResponseCode::ServerFailure;
                match failure.to_bytes() {
                    Ok(bytes) => bytes,
                    Err(_) => return,
                }
            }
        };
        self.outgoing.push_back((bytes, addr));
    }
}

impl<H: Handler + Unpin> Future for Server<H> {
    type Output = ();
    fn poll(self: Pin<&mut Self>, cx: &mut Context) -> Poll<()> {
        let pinned = Pin::get_mut(self);
        while let Poll::Ready(cmd) = Pin::new(&mut pinned.commands).poll_recv(cx) {
            match cmd {
                Some(Command::Shutdown) => return Poll::Ready(()),
                None => {
                    warn!("server handle dropped without shutdown");
                    return Poll::Ready(());
                }
            }
        }

        match pinned.recv_packets(cx) {
            Ok(_) => (),
            Err(e) => error!("ServerRecvPacket Error: {:?}", e),
        }

        let socket = &pinned.socket;
        if flush(&mut pinned.outgoing, |packet, addr| {
            socket.poll_send_to(cx, packet, addr)
        }) {
            // a bare WouldBlock registers no waker
            cx.waker().wake_by_ref();
        }

        Poll::Pending
    }
}

/// Sends queued responses until the socket stops accepting them. Returns
/// true when it stopped on a `WouldBlock` rather than `Pending`.
fn flush<F>(outgoing: &mut VecDeque<(Vec<u8>, SocketAddr)>, mut send: F) -> bool
where
    F: FnMut(&[u8], SocketAddr) -> Poll<io::Result<usize>>,
{
    while let Some((response, addr)) = outgoing.pop_front() {
        trace!("sending packet to {:?}", addr);

        match send(&response, addr) {
            Poll::Ready(Ok(bytes_sent)) if bytes_sent == response.len() => (),
            Poll::Ready(Ok(_)) => warn!("failed to send entire packet"),
            Poll::Ready(Err(ref ioerr)) if ioerr.kind() == WouldBlock => {
                outgoing.push_front((response, addr));
                return true;
            }
            Poll::Ready(Err(err)) => warn!("error sending packet {:?}", err),
            Poll::Pending => {
                outgoing.push_front((response, addr));
                return false;
            }
        }
    }
    false
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns_parser::{Question, RRData, ResourceRecord, Type};
    use std::net::Ipv4Addr;
    use std::time::Duration;

    fn localhost_answers(query: &Message, response: &mut Message, _from: SocketAddr) {
        for question in &query.questions {
            response.answers.push(ResourceRecord::new(
                question.qname.clone(),
                600,
                RRData::A(Ipv4Addr::LOCALHOST),
            ));
        }
    }

    async fn exchange(server: SocketAddr, packet: &[u8]) -> Option<Message> {
        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        client.send_to(packet, server).await.unwrap();
        let mut buf = [0u8; 512];
        match tokio::time::timeout(Duration::from_millis(300), client.recv(&mut buf)).await {
            Ok(Ok(len)) => Some(Message::parse(&buf[..len]).unwrap()),
            _ => None,
        }
    }

    #[test]
    fn blocked_responses_stay_queued() {
        let to: SocketAddr = "127.0.0.1:5300".parse().unwrap();
        let mut outgoing: VecDeque<_> = vec![
            (vec![1], to),
            (vec![2, 2], to),
            (vec![3], to),
        ]
        .into();

        let mut sent = Vec::new();
        let would_block = flush(&mut outgoing, |packet, _| {
            if packet.len() == 2 {
                Poll::Ready(Err(WouldBlock.into()))
            } else {
                sent.push(packet.to_vec());
                Poll::Ready(Ok(packet.len()))
            }
        });
        assert!(would_block);
        assert_eq!(sent, vec![vec![1]]);
        assert_eq!(outgoing.len(), 2);
        assert_eq!(outgoing[0].0, vec![2, 2]);

        let would_block = flush(&mut outgoing, |packet, _| {
            sent.push(packet.to_vec());
            Poll::Ready(Ok(packet.len()))
        });
        assert!(!would_block);
        assert!(outgoing.is_empty());
        assert_eq!(sent, vec![vec![1], vec![2, 2], vec![3]]);

        outgoing.push_back((vec![4], to));
        assert!(!flush(&mut outgoing, |_, _| Poll::Pending));
        assert_eq!(outgoing.len(), 1);
    }

    #[tokio::test]
    async fn answers_queries() {
        let (server, handle) =
            Server::bind("127.0.0.1:0".parse().unwrap(), localhost_answers).unwrap();
        tokio::spawn(server);

        let query = Message::query(77, true, Question::new("printer.lan", Type::A));
        let response = exchange(handle.local_addr(), &query.to_bytes().unwrap())
            .await
            .unwrap();
        assert_eq!(response.header.id, 77);
        assert!(!response.header.query);
        assert!(response.header.recursion_desired);
        assert_eq!(response.questions, query.questions);
        assert_eq!(
            response.answers,
            vec![ResourceRecord::new(
                "printer.lan",
                600,
                RRData::A(Ipv4Addr::LOCALHOST)
            )]
        );
        handle.shutdown();
    }

    #[tokio::test]
    async fn ignores_garbage_and_responses() {
        let (server, handle) =
            Server::bind("127.0.0.1:0".parse().unwrap(), localhost_answers).unwrap();
        tokio::spawn(server);

        assert!(exchange(handle.local_addr(), b"\x00\x01\x02").await.is_none());
        let query = Message::query(5, true, Question::new("a.lan", Type::A));
        let not_a_query = Message::response_to(&query).to_bytes().unwrap();
        assert!(exchange(handle.local_addr(), &not_a_query).await.is_none());

        // still serving
        assert!(exchange(handle.local_addr(), &query.to_bytes().unwrap())
            .await
            .is_some());
        handle.shutdown();
    }

    #[tokio::test]
    async fn unencodable_answer_becomes_servfail() {
        let (server, handle) = Server::bind(
            "127.0.0.1:0".parse().unwrap(),
            |_: &Message, response: &mut Message, _: SocketAddr| {
                response.answers.push(ResourceRecord::new(
                    "x".repeat(70),
                    60,
                    RRData::A(Ipv4Addr::LOCALHOST),
                ));
            },
        )
        .unwrap();
        tokio::spawn(server);

        let query = Message::query(9, false, Question::new("a.lan", Type::A));
        let response = exchange(handle.local_addr(), &query.to_bytes().unwrap())
            .await
            .unwrap();
        assert_eq!(response.header.response_code, ResponseCode::ServerFailure);
        assert!(response.answers.is_empty());
        handle.shutdown();
    }
}
