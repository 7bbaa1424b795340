use std::fmt;
use std::time::Duration;

/// Contadores reais da sessão, atualizados a cada iteração.
#[derive(Debug, Clone)]
pub struct PingStats {
    address: String,
    pub transmitted: u64,
    pub received: u64,
    min_ms: f64,
    max_ms: f64,
    sum_ms: f64,
    sum_sq_ms: f64,
}

impl PingStats {
    pub fn new(address: impl Into<String>) -> Self {
        PingStats {
            address: address.into(),
            transmitted: 0,
            received: 0,
            min_ms: f64::INFINITY,
            max_ms: f64::NEG_INFINITY,
            sum_ms: 0.0,
            sum_sq_ms: 0.0,
        }
    }

    pub fn record_sent(&mut self) {
        self.transmitted += 1;
    }

    pub fn record_reply(&mut self, rtt: Duration) {
        let ms = rtt.as_secs_f64() * 1000.0;
        self.received += 1;
        self.min_ms = self.min_ms.min(ms);
        self.max_ms = self.max_ms.max(ms);
        self.sum_ms += ms;
        self.sum_sq_ms += ms * ms;
    }

    pub fn loss_percent(&self) -> f64 {
        if self.transmitted == 0 {
            return 0.0;
        }
        (self.transmitted - self.received.min(self.transmitted)) as f64 / self.transmitted as f64
            * 100.0
    }

    /// (min, avg, max, stddev) em milissegundos, se houve alguma resposta.
    pub fn round_trip(&self) -> Option<(f64, f64, f64, f64)> {
        if self.received == 0 {
            return None;
        }
        let n = self.received as f64;
        let avg = self.sum_ms / n;
        let variance = (self.sum_sq_ms / n - avg * avg).max(0.0);
        Some((self.min_ms, avg, self.max_ms, variance.sqrt()))
    }
}

impl fmt::Display for PingStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n--- {} ping statistics ---", self.address)?;
        writeln!(
            f,
            "{} packets transmitted, {} packets received, {:.1}% packet loss",
            self.transmitted,
            self.received,
            self.loss_percent()
        )?;
        if let Some((min, avg, max, stddev)) = self.round_trip() {
            writeln!(
                f,
                "round-trip min/avg/max/stddev = {:.3}/{:.3}/{:.3}/{:.3} ms",
                min, avg, max, stddev
            )?;
        }
        Ok(())
    }
}
