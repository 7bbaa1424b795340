use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

/// Sinal de cancelamento compartilhado entre o handler de Ctrl+C e a sessão.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        let (lock, cvar) = &*self.inner;
        *lock.lock().unwrap_or_else(|e| e.into_inner()) = true;
        cvar.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Dorme por `dur`, acordando antes se cancelado. Retorna `true` se cancelado.
    ///
    /// Uma duração que estoura o `Instant` espera só pelo cancelamento.
    pub fn sleep(&self, dur: Duration) -> bool {
        let deadline = Instant::now().checked_add(dur);
        let (lock, cvar) = &*self.inner;
        let mut cancelled = lock.lock().unwrap_or_else(|e| e.into_inner());
        while !*cancelled {
            let Some(deadline) = deadline else {
                cancelled = cvar.wait(cancelled).unwrap_or_else(|e| e.into_inner());
                continue;
            };
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            cancelled = match cvar.wait_timeout(cancelled, deadline - now) {
                Ok((guard, _)) => guard,
                Err(e) => e.into_inner().0,
            };
        }
        *cancelled
    }
}
