use anyhow::{Context, Result};
use std::time::Duration;

/// Maior valor aceito para `-W` e `-i`.
const MAX_WAIT: Duration = Duration::from_secs(24 * 60 * 60);

const USAGE: &str = "usage: pingrs_echo <address> [-c <count>] [-W <timeout ms>] [-i <interval s>] [--any-reply]";

/// Como decidir se um datagrama recebido responde ao pedido pendente.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyCheck {
    /// Echo Reply com o mesmo identificador e número de sequência.
    Correlated,
    /// Qualquer datagrama conta como resposta.
    Any,
}

/// Configuração imutável, montada uma vez na inicialização.
#[derive(Debug, Clone)]
pub struct PingConfig {
    pub address: String,
    pub count: Option<u64>,
    pub timeout: Duration,
    pub interval: Duration,
    pub reply_check: ReplyCheck,
}

impl PingConfig {
    pub fn new(address: impl Into<String>) -> Self {
        PingConfig {
            address: address.into(),
            count: None,
            timeout: Duration::from_millis(1000),
            interval: Duration::from_secs(1),
            reply_check: ReplyCheck::Correlated,
        }
    }
}

pub fn parse() -> Result<PingConfig> {
    parse_from(std::env::args().skip(1))
}

pub fn parse_from<I>(args: I) -> Result<PingConfig>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    let args: Vec<String> = args.into_iter().map(Into::into).collect();
    let mut address = None;
    let mut count = None;
    let mut timeout = None;
    let mut interval = None;
    let mut reply_check = ReplyCheck::Correlated;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            flag @ ("-c" | "-W" | "-i") => {
                let val = args
                    .get(i + 1)
                    .with_context(|| format!("missing value for {flag}"))?;
                match flag {
                    "-c" => {
                        let c: u64 = val.parse().context("invalid value for -c")?;
                        count = Some(c);
                    }
                    "-W" => {
                        let ms: u64 = val.parse().context("invalid value for -W")?;
                        anyhow::ensure!(ms > 0, "timeout must be greater than zero");
                        let ms = Duration::from_millis(ms);
                        anyhow::ensure!(ms <= MAX_WAIT, "timeout must be at most {}s", MAX_WAIT.as_secs());
                        timeout = Some(ms);
                    }
                    _ => {
                        let secs: f64 = val.parse().context("invalid value for -i")?;
                        let secs = Duration::try_from_secs_f64(secs).context("invalid value for -i")?;
                        anyhow::ensure!(secs <= MAX_WAIT, "interval must be at most {}s", MAX_WAIT.as_secs());
                        interval = Some(secs);
                    }
                }
                i += 1;
            }
            "--any-reply" => reply_check = ReplyCheck::Any,
            // o último argumento posicional vence
            val => address = Some(val.to_string()),
        }
        i += 1;
    }

    let address = address.with_context(|| format!("address required\n{USAGE}"))?;

    let mut config = PingConfig::new(address);
    config.count = count;
    config.reply_check = reply_check;
    if let Some(timeout) = timeout {
        config.timeout = timeout;
    }
    if let Some(interval) = interval {
        config.interval = interval;
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = parse_from(["example.com"]).unwrap();
        assert_eq!(config.address, "example.com");
        assert_eq!(config.count, None);
        assert_eq!(config.timeout, Duration::from_millis(1000));
        assert_eq!(config.interval, Duration::from_secs(1));
        assert_eq!(config.reply_check, ReplyCheck::Correlated);
    }

    #[test]
    fn missing_address_is_an_error() {
        let err = parse_from(Vec::<String>::new()).unwrap_err();
        assert!(err.to_string().contains("address required"));
    }

    #[test]
    fn last_positional_wins() {
        let config = parse_from(["first", "10.0.0.1"]).unwrap();
        assert_eq!(config.address, "10.0.0.1");
    }

    #[test]
    fn options() {
        let config =
            parse_from(["-c", "3", "-W", "250", "-i", "0.2", "--any-reply", "127.0.0.1"]).unwrap();
        assert_eq!(config.address, "127.0.0.1");
        assert_eq!(config.count, Some(3));
        assert_eq!(config.timeout, Duration::from_millis(250));
        assert_eq!(config.interval, Duration::from_millis(200));
        assert_eq!(config.reply_check, ReplyCheck::Any);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(parse_from(["-c"]).is_err());
        assert!(parse_from(["-c", "x", "host"]).is_err());
        assert!(parse_from(["-W", "0", "host"]).is_err());
        assert!(parse_from(["-i", "-1", "host"]).is_err());
    }

    #[test]
    fn rejects_oversized_waits() {
        let err = parse_from(["-i", "1e19", "127.0.0.1"]).unwrap_err();
        assert!(err.to_string().contains("interval must be at most"));
        assert!(parse_from(["-W", "18446744073709551615", "127.0.0.1"]).is_err());
        assert!(parse_from(["-i", "86400", "-W", "86400000", "127.0.0.1"]).is_ok());
    }
}
