use anyhow::{Context, Result};
use std::io::Write;
use std::process::ExitCode;
use std::thread;

mod args;
mod cancel;
mod icmp;
mod net;
mod session;
mod stats;

use cancel::CancelToken;
use net::IcmpSocket;
use session::EchoSession;

/// Logger com nível e `arquivo:linha` em cada registro (padrão: `warn`).
fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}:{}] {}",
                record.level(),
                record.file().unwrap_or("?"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .init();
}

/// Sessão em thread de fundo; a principal espera, imprime o resumo e sai.
/// Requer privilégios de root (ou CAP_NET_RAW) para o socket RAW.
fn run() -> Result<()> {
    let config = args::parse()?;

    // Ctrl+C apenas sinaliza; a sessão encerra por conta própria
    let cancel = CancelToken::new();
    let c = cancel.clone();
    ctrlc::set_handler(move || c.cancel()).context("failed to install Ctrl+C handler")?;

    let stats = thread::scope(|s| {
        thread::Builder::new()
            .name("echo-session".into())
            .spawn_scoped(s, || {
                let sock = IcmpSocket::connect(&config.address, config.timeout)?;
                EchoSession::new(&config, sock, std::io::stdout(), cancel).run()
            })
            .context("failed to spawn echo session")?
            .join()
            .map_err(|_| anyhow::anyhow!("echo session panicked"))?
    })?;

    print!("{stats}");
    Ok(())
}

fn main() -> ExitCode {
    init_logger();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
