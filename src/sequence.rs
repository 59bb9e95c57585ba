use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

const MAX_VIEWS: usize = 1024;

// Only the most recently issued request of a stream publishes its result.
#[derive(Debug, Default)]
pub struct SequenceGate {
    latest: AtomicU64,
}

impl SequenceGate {
    // False if a newer seq was already recorded.
    pub fn register(&self, seq: u64) -> bool {
        self.latest.fetch_max(seq, Ordering::SeqCst) <= seq
    }

    pub fn is_current(&self, seq: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == seq
    }
}

#[derive(Debug, Default)]
pub struct ViewGates {
    gates: Mutex<HashMap<String, ViewEntry>>,
    issued: AtomicU64,
    ticks: AtomicU64,
}

#[derive(Debug)]
struct ViewEntry {
    last_used: u64,
    gate: Arc<SequenceGate>,
}

impl ViewGates {
    pub fn new_view_id(&self) -> String {
        format!("v{}", self.issued.fetch_add(1, Ordering::Relaxed) + 1)
    }

    pub fn gate(&self, view: &str) -> Arc<SequenceGate> {
        let mut gates = self.gates.lock().unwrap_or_else(PoisonError::into_inner);
        let tick = self.ticks.fetch_add(1, Ordering::Relaxed);
        if gates.len() >= MAX_VIEWS && !gates.contains_key(view) {
            // evict the least recently used view only
            let idle = gates
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(key, _)| key.clone());
            if let Some(idle) = idle {
                gates.remove(&idle);
            }
        }

        let entry = gates.entry(view.to_string()).or_insert_with(|| ViewEntry {
            last_used: tick,
            gate: Arc::default(),
        });
        entry.last_used = tick;
        entry.gate.clone()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.gates.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
