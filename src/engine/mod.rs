//! The realtime entry point: one engine owns the chain and the receiving end
//! of the parameter channel.
//!
//! `process_block` is the only function the stream driver calls from the
//! audio callback. Everything it touches is preallocated; the only
//! cross-thread traffic is the wait-free parameter poll at the top of the
//! block.

use crate::chain::EffectChain;
use crate::control::ParamReceiver;
use crate::MAX_BLOCK_SIZE;

pub struct AudioEngine {
    chain: EffectChain,
    params: ParamReceiver,
    sample_rate: f32,
}

impl AudioEngine {
    /// Build the engine for a fixed sample rate. The rate cannot change for
    /// the lifetime of the engine; a stream renegotiating its rate must build
    /// a new engine.
    pub fn new(sample_rate: f32, params: ParamReceiver) -> Self {
        Self {
            chain: EffectChain::new(sample_rate),
            params,
            sample_rate,
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Process one mono block in place.
    ///
    /// Pending parameter updates are installed first, so a change issued at
    /// control time T is live at the first block boundary after T and a
    /// block never changes parameters mid-flight.
    pub fn process_block(&mut self, block: &mut [f32]) {
        debug_assert!(block.len() <= MAX_BLOCK_SIZE);

        let chain = &mut self.chain;
        self.params.poll(|id, params| chain.apply(id, params));

        chain.bypass = self.params.bypass();
        chain.master_gain = self.params.master_gain();
        chain.process(block);
    }

    /// Clear all signal state (filter memories, delay and reverb tails,
    /// vocoder history). Parameters stay as last published.
    pub fn reset(&mut self) {
        self.chain.reset();
    }
}
