/// Material extracted by a single dig action.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Yield(pub u32);

/// Carried haul of one ant. Capacity policy lives here, not in the dig
/// instruction: overflow is dropped and reported through the return value.
#[derive(Clone, Debug)]
pub struct Inventory {
    held: u32,
    capacity: u32,
}

impl Inventory {
    pub const DEFAULT_CAPACITY: u32 = 64;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: u32) -> Self {
        Inventory { held: 0, capacity }
    }

    /// Accepts a dig yield. Returns false when the haul no longer fits;
    /// whatever did fit is kept.
    pub fn add(&mut self, amount: Yield) -> bool {
        let new_total = self.held.saturating_add(amount.0);
        if new_total > self.capacity {
            self.held = self.capacity;
            return false;
        }
        self.held = new_total;
        true
    }

    pub fn total(&self) -> u32 {
        self.held
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn add_accumulates() {
        let mut inv = Inventory::new();
        assert!(inv.add(Yield(1)));
        assert!(inv.add(Yield(2)));
        assert_eq!(inv.total(), 3);
    }

    #[test]
    fn overflow_is_clamped() {
        let mut inv = Inventory::with_capacity(2);
        assert!(inv.add(Yield(2)));
        assert!(!inv.add(Yield(1)));
        assert_eq!(inv.total(), 2);
    }
}
