use anyhow::{Context, Result};
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::io::{self, Read};
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::time::{Duration, Instant};

/// Conexão ICMP usada pela sessão: um pedido e uma leitura por vez.
pub trait Transport {
    /// Endereço remoto resolvido.
    fn peer(&self) -> IpAddr;

    /// Limite absoluto para as próximas escritas e leituras.
    fn set_deadline(&mut self, deadline: Instant) -> io::Result<()>;

    fn send(&mut self, buf: &[u8]) -> io::Result<usize>;

    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn peer(&self) -> IpAddr {
        (**self).peer()
    }

    fn set_deadline(&mut self, deadline: Instant) -> io::Result<()> {
        (**self).set_deadline(deadline)
    }

    fn send(&mut self, buf: &[u8]) -> io::Result<usize> {
        (**self).send(buf)
    }

    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).recv(buf)
    }
}

/// Resolve o host uma única vez, ficando com o primeiro endereço IPv4.
pub fn resolve(host: &str) -> Result<IpAddr> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        anyhow::ensure!(ip.is_ipv4(), "only IPv4 targets are supported: {host}");
        return Ok(ip);
    }
    (host, 0)
        .to_socket_addrs()
        .with_context(|| format!("failed to resolve {host}"))?
        .map(|sa| sa.ip())
        .find(IpAddr::is_ipv4)
        .with_context(|| format!("no IPv4 address for {host}"))
}

/// Socket ICMP RAW conectado ao destino.
pub struct IcmpSocket {
    sock: Socket,
    peer: IpAddr,
}

impl IcmpSocket {
    /// Abre o socket RAW e conecta com timeout. Requer privilégios (CAP_NET_RAW).
    pub fn connect(host: &str, timeout: Duration) -> Result<Self> {
        let peer = resolve(host)?;

        // AF_INET + SOCK_RAW + IPPROTO_ICMP: o kernel entrega o datagrama com cabeçalho IP
        let sock = Socket::new(Domain::IPV4, Type::from(libc::SOCK_RAW), Some(Protocol::ICMPV4))
            .context("failed to create raw ICMP socket (are you root?)")?;

        // ICMP não tem porta; connect só fixa o peer
        let dst: SockAddr = SocketAddr::new(peer, 0).into();
        sock.connect_timeout(&dst, timeout)
            .with_context(|| format!("failed to connect to {peer}"))?;

        log::debug!("raw ICMP socket connected to {peer}");
        Ok(IcmpSocket { sock, peer })
    }
}

impl Transport for IcmpSocket {
    fn peer(&self) -> IpAddr {
        self.peer
    }

    fn set_deadline(&mut self, deadline: Instant) -> io::Result<()> {
        // SO_RCVTIMEO/SO_SNDTIMEO são relativos; zero significaria "sem timeout"
        let remaining = deadline
            .saturating_duration_since(Instant::now())
            .max(Duration::from_millis(1));
        self.sock.set_read_timeout(Some(remaining))?;
        self.sock.set_write_timeout(Some(remaining))
    }

    fn send(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.sock.send(buf)
    }

    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.sock.read(buf)
    }
}
