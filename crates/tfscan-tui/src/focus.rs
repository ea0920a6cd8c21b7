//! FocusRing: keyboard focus cycling between panes.

use crate::action::ComponentId;

pub struct FocusRing {
    items: Vec<ComponentId>,
    current: usize,
}

impl FocusRing {
    pub fn new(items: Vec<ComponentId>) -> Self {
        Self { items, current: 0 }
    }

    pub fn current(&self) -> Option<ComponentId> {
        self.items.get(self.current).copied()
    }

    pub fn next(&mut self) -> Option<ComponentId> {
        self.step(1)
    }

    pub fn prev(&mut self) -> Option<ComponentId> {
        self.step(self.items.len().saturating_sub(1))
    }

    fn step(&mut self, by: usize) -> Option<ComponentId> {
        if self.items.is_empty() {
            return None;
        }
        self.current = (self.current + by) % self.items.len();
        self.current()
    }

    /// Focus `id` if it is part of the ring.
    pub fn set(&mut self, id: ComponentId) {
        if let Some(pos) = self.items.iter().position(|&x| x == id) {
            self.current = pos;
        }
    }

    pub fn is_focused(&self, id: ComponentId) -> bool {
        self.current() == Some(id)
    }
}

impl Default for FocusRing {
    fn default() -> Self {
        Self::new(vec![
            ComponentId::SearchPanel,
            ComponentId::SequenceEditor,
            ComponentId::ResultsPanel,
        ])
    }
}
