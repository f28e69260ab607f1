//! Passive effects collected during commit.

use std::rc::Rc;

use tracing::debug;

use crate::hooks::Effect;

/// Effects waiting to run after a commit.
#[derive(Default)]
pub(crate) struct PendingPassiveEffects {
    /// Effects of unmounted components; only their cleanups run.
    pub unmount: Vec<Rc<Effect>>,
    /// Effects scheduled by this commit's renders.
    pub update: Vec<Rc<Effect>>,
}

impl PendingPassiveEffects {
    pub fn is_empty(&self) -> bool {
        self.unmount.is_empty() && self.update.is_empty()
    }

    /// Run everything, in order: every unmount cleanup, then the cleanups of
    /// re-running effects, then every effect body.
    pub fn flush(self) {
        if self.is_empty() {
            return;
        }
        debug!(
            unmount = self.unmount.len(),
            update = self.update.len(),
            "flush passive effects"
        );
        for effect in &self.unmount {
            effect.run_destroy();
        }
        for effect in &self.update {
            effect.run_destroy();
        }
        for effect in &self.update {
            effect.run_create();
        }
    }
}
