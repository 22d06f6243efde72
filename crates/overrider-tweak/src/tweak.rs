use crate::edit::Effect;
use crate::selection::Selection;
use tracing::warn;

/// A source transformation offered on a selection.
///
/// Implementations hold configuration only; every call gets a fresh
/// selection and must not depend on earlier calls.
pub trait Tweak {
    /// Stable identifier, unique within a registry.
    fn id(&self) -> &'static str;

    /// Human-readable label for menus.
    fn title(&self) -> String;

    /// Cheap precondition check. `false` means "do not offer", never an error.
    fn is_available(&self, selection: &Selection<'_>) -> bool;

    /// Compute the edit. Only meaningful on selections for which
    /// [`is_available`](Self::is_available) returned `true`; returns `None`
    /// otherwise.
    fn apply(&self, selection: &Selection<'_>) -> Option<Effect>;
}

/// The set of tweaks a host offers, registered explicitly at startup.
#[derive(Default)]
pub struct TweakRegistry {
    tweaks: Vec<Box<dyn Tweak>>,
}

impl TweakRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tweak; a tweak with the same id is replaced.
    pub fn register(&mut self, tweak: Box<dyn Tweak>) {
        if let Some(slot) = self.tweaks.iter_mut().find(|t| t.id() == tweak.id()) {
            warn!(id = tweak.id(), "replacing registered tweak");
            *slot = tweak;
        } else {
            self.tweaks.push(tweak);
        }
    }

    pub fn get(&self, id: &str) -> Option<&dyn Tweak> {
        self.tweaks.iter().find(|t| t.id() == id).map(|t| t.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Tweak> {
        self.tweaks.iter().map(|t| t.as_ref())
    }

    /// Tweaks to offer for `selection`, in registration order.
    pub fn available<'r>(&'r self, selection: &Selection<'_>) -> Vec<&'r dyn Tweak> {
        self.iter().filter(|t| t.is_available(selection)).collect()
    }

    pub fn len(&self) -> usize {
        self.tweaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tweaks.is_empty()
    }
}

impl std::fmt::Debug for TweakRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.tweaks.iter().map(|t| t.id())).finish()
    }
}
