use anyhow::{Context, Result};
use log::{debug, trace};
use std::io::{self, Write};
use std::time::{Duration, Instant};

use crate::args::{PingConfig, ReplyCheck};
use crate::cancel::CancelToken;
use crate::icmp::{self, EchoReply, EchoRequest, IP_HEADER_LEN, PACKET_LEN};
use crate::net::Transport;
use crate::stats::PingStats;

/// Buffer de recepção (folgado para cabeçalho IP + ICMP).
const RECV_BUF_LEN: usize = 1024;

/// Resultado de uma iteração.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    Replied { bytes: usize, ttl: u8, rtt: Duration },
    TimedOut,
}

/// Sessão de ping: um pedido em voo por vez, até o cancelamento ou `count`.
pub struct EchoSession<'a, T, W> {
    config: &'a PingConfig,
    transport: T,
    out: W,
    cancel: CancelToken,
    identifier: u16,
    sequence: u16,
    stats: PingStats,
}

impl<'a, T: Transport, W: Write> EchoSession<'a, T, W> {
    pub fn new(config: &'a PingConfig, transport: T, out: W, cancel: CancelToken) -> Self {
        EchoSession {
            config,
            transport,
            out,
            cancel,
            identifier: icmp::identifier_from_pid(std::process::id()),
            sequence: 0,
            stats: PingStats::new(config.address.clone()),
        }
    }

    /// Executa o laço e devolve as estatísticas acumuladas.
    pub fn run(mut self) -> Result<PingStats> {
        writeln!(
            self.out,
            "PING {} ({}): {} data bytes",
            self.config.address,
            self.transport.peer(),
            PACKET_LEN
        )?;

        let mut sent = 0u64;
        loop {
            if self.cancel.is_cancelled() {
                break;
            }
            if let Some(limit) = self.config.count {
                if sent >= limit {
                    break;
                }
            }

            let outcome = self.ping_once()?;
            sent += 1;

            // Sem pausa depois de timeout, nem depois do último pedido
            if outcome == Outcome::TimedOut || self.config.count.is_some_and(|c| sent >= c) {
                continue;
            }
            if self.cancel.sleep(self.config.interval) {
                break;
            }
        }

        debug!("echo session finished after {sent} requests");
        Ok(self.stats)
    }

    /// Envia um Echo Request e espera a resposta até o prazo.
    pub fn ping_once(&mut self) -> Result<Outcome> {
        let request = EchoRequest::new(self.identifier, self.sequence);
        self.sequence = self.sequence.wrapping_add(1);
        let pkt = request.to_bytes();

        let deadline = Instant::now()
            .checked_add(self.config.timeout)
            .context("timeout too large for the system clock")?;
        self.transport
            .set_deadline(deadline)
            .context("failed to set socket deadline")?;

        self.transport
            .send(&pkt)
            .context("failed to send echo request")?;
        self.stats.record_sent();
        trace!("sent icmp_seq={} ident={:#06x}", request.sequence, request.identifier);

        let mut buf = [0u8; RECV_BUF_LEN];
        let start = Instant::now();
        let Some(n) = self.await_reply(&request, deadline, &mut buf) else {
            // Ctrl+C no meio da espera não é timeout
            if self.cancel.is_cancelled() {
                return Ok(Outcome::TimedOut);
            }
            writeln!(self.out, "Request timeout for icmp_seq {}", request.sequence)?;
            return Ok(Outcome::TimedOut);
        };

        let rtt = start.elapsed();
        self.stats.record_reply(rtt);

        let bytes = n.saturating_sub(IP_HEADER_LEN);
        let ttl = icmp::ttl(&buf[..n]);
        writeln!(
            self.out,
            "{} bytes from {}: icmp_seq={} ttl={} time={:.3} ms",
            bytes,
            self.transport.peer(),
            request.sequence,
            ttl,
            rtt.as_secs_f64() * 1000.0
        )?;

        Ok(Outcome::Replied { bytes, ttl, rtt })
    }

    fn await_reply(&mut self, request: &EchoRequest, deadline: Instant, buf: &mut [u8]) -> Option<usize> {
        loop {
            let n = match self.transport.recv(buf) {
                Ok(n) => n,
                // EINTR: sinal entregue a esta thread; volta a ler se ainda há prazo
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                    debug!("icmp_seq={}: receive interrupted", request.sequence);
                    if Instant::now() >= deadline || self.cancel.is_cancelled() {
                        return None;
                    }
                    if self.transport.set_deadline(deadline).is_err() {
                        return None;
                    }
                    continue;
                }
                Err(e) => {
                    debug!("icmp_seq={}: receive failed: {e}", request.sequence);
                    return None;
                }
            };

            if self.config.reply_check == ReplyCheck::Any {
                return Some(n);
            }

            match EchoReply::parse(&buf[..n]) {
                Some(reply) if reply.answers(request) => return Some(n),
                other => debug!("icmp_seq={}: ignoring datagram {other:?}", request.sequence),
            }

            if Instant::now() >= deadline || self.cancel.is_cancelled() {
                return None;
            }
            if let Err(e) = self.transport.set_deadline(deadline) {
                debug!("icmp_seq={}: failed to renew deadline: {e}", request.sequence);
                return None;
            }
        }
    }
}
