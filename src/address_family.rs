use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};

/// The IP version of a socket. Each family gets its own shared socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    Inet,
    Inet6,
}

impl AddressFamily {
    pub fn of(addr: &SocketAddr) -> AddressFamily {
        match addr {
            SocketAddr::V4(..) => AddressFamily::Inet,
            SocketAddr::V6(..) => AddressFamily::Inet6,
        }
    }

    pub fn any_addr(self) -> IpAddr {
        match self {
            AddressFamily::Inet => Ipv4Addr::UNSPECIFIED.into(),
            AddressFamily::Inet6 => Ipv6Addr::UNSPECIFIED.into(),
        }
    }

    fn domain(self) -> Domain {
        match self {
            AddressFamily::Inet => Domain::IPV4,
            AddressFamily::Inet6 => Domain::IPV6,
        }
    }

    fn udp_socket(self) -> io::Result<Socket> {
        let socket = Socket::new(self.domain(), Type::DGRAM, Some(Protocol::UDP))?;
        if self == AddressFamily::Inet6 {
            socket.set_only_v6(true)?;
        }
        Ok(socket)
    }

    /// A non-blocking socket on the unspecified address and an ephemeral
    /// port, for sending queries.
    pub fn bind(self) -> io::Result<UdpSocket> {
        let addr: SockAddr = SocketAddr::new(self.any_addr(), 0).into();
        let socket = self.udp_socket()?;
        socket.set_nonblocking(true)?;
        socket.bind(&addr)?;
        Ok(socket.into())
    }

    /// A non-blocking socket on a fixed address, for serving.
    pub fn bind_to(addr: SocketAddr) -> io::Result<UdpSocket> {
        let socket = AddressFamily::of(&addr).udp_socket()?;
        socket.set_reuse_address(true)?;
        socket.set_nonblocking(true)?;
        socket.bind(&addr.into())?;
        Ok(socket.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_of_address() {
        let v4: SocketAddr = "8.8.8.8:53".parse().unwrap();
        let v6: SocketAddr = "[2001:4860:4860::8888]:53".parse().unwrap();
        assert_eq!(AddressFamily::of(&v4), AddressFamily::Inet);
        assert_eq!(AddressFamily::of(&v6), AddressFamily::Inet6);
    }

    #[test]
    fn binds_ephemeral_port() {
        let socket = AddressFamily::Inet.bind().unwrap();
        let local = socket.local_addr().unwrap();
        assert!(local.ip().is_unspecified());
        assert_ne!(local.port(), 0);
    }
}
