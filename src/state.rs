/// Lifecycle of a model's parameters.
///
/// `Uninitialized -> Initialized` when parameters are first created (random
/// init, first `train` call, or load), then `Initialized -> Trained` once any
/// training update has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelState {
    #[default]
    Uninitialized,
    Initialized,
    Trained,
}

impl ModelState {
    #[inline]
    pub fn is_initialized(self) -> bool {
        self != ModelState::Uninitialized
    }
}
