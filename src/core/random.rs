use std::collections::VecDeque;

use rand::{
    rngs::StdRng,
    Rng,
    SeedableRng,
};

/// Source of uniformly distributed draws in `[0, 1)`.
pub trait RandomSource: Send {
    fn next_f64(&mut self) -> f64;
}

pub struct SystemRandom {
    rng: StdRng,
}

impl SystemRandom {
    pub fn new() -> Self {
        Self { rng: StdRng::from_os_rng() }
    }
}

impl Default for SystemRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for SystemRandom {
    fn next_f64(&mut self) -> f64 {
        self.rng.random::<f64>()
    }
}

/// Replays scripted draws in order, then repeats `fallback` forever.
#[derive(Debug, Clone)]
pub struct SequenceRandom {
    draws: VecDeque<f64>,
    fallback: f64,
    calls: usize,
}

impl SequenceRandom {
    pub fn new(draws: impl IntoIterator<Item = f64>, fallback: f64) -> Self {
        Self { draws: draws.into_iter().collect(), fallback, calls: 0 }
    }

    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl RandomSource for SequenceRandom {
    fn next_f64(&mut self) -> f64 {
        self.calls += 1;
        self.draws.pop_front().unwrap_or(self.fallback)
    }
}

/// Maps a draw onto `0..len`, clamping draws that land on or past 1.0.
pub fn pick_index(draw: f64, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let index = (draw.max(0.0) * len as f64).floor() as usize;
    index.min(len - 1)
}
