//! Señal de "vuelve a cargar la lista": un contador monótono sobre un
//! canal `watch`. Quien escucha sólo le importa que cambió, no cuántas veces.

use std::sync::Arc;
use tokio::sync::watch;

#[derive(Clone)]
pub struct RefreshTrigger {
    tx: Arc<watch::Sender<u64>>,
}

impl Default for RefreshTrigger {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshTrigger {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx: Arc::new(tx) }
    }

    /// Incrementa el contador y devuelve el nuevo valor.
    pub fn bump(&self) -> u64 {
        let mut next = 0;
        self.tx.send_modify(|v| {
            *v += 1;
            next = *v;
        });
        next
    }

    pub fn value(&self) -> u64 {
        *self.tx.borrow()
    }

    /// El listener arranca con el valor actual ya visto.
    pub fn subscribe(&self) -> RefreshListener {
        let mut rx = self.tx.subscribe();
        rx.mark_unchanged();
        RefreshListener { rx }
    }
}

pub struct RefreshListener {
    rx: watch::Receiver<u64>,
}

impl RefreshListener {
    /// Espera al próximo cambio. `None` si ya no quedan triggers vivos.
    pub async fn changed(&mut self) -> Option<u64> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }

    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Marca el valor actual como visto y lo devuelve.
    pub fn mark_seen(&mut self) -> u64 {
        *self.rx.borrow_and_update()
    }
}
