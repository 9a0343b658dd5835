use crate::config::GridSettings;

/// Hands out grid slots left to right, wrapping to a new row when the next
/// slot would run past the configured width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCursor {
    grid: GridSettings,
    x: f64,
    y: f64,
}

impl GridCursor {
    pub fn new(grid: GridSettings) -> Self {
        Self {
            grid,
            x: grid.origin_x,
            y: grid.origin_y,
        }
    }

    pub fn next_slot(&mut self) -> (f64, f64) {
        let slot = (self.x, self.y);
        self.x += self.grid.spacing_x;
        if self.x + self.grid.node_width > self.grid.width {
            self.x = self.grid.origin_x;
            self.y += self.grid.spacing_y;
        }
        slot
    }

    /// Next slot not already holding a node at `taken`. Each taken
    /// coordinate can block at most one slot, so the search is bounded.
    pub fn next_free_slot(&mut self, taken: &[(f64, f64)]) -> (f64, f64) {
        let mut slot = self.next_slot();
        for _ in 0..taken.len() {
            if !taken.contains(&slot) {
                break;
            }
            slot = self.next_slot();
        }
        slot
    }

    pub fn reset(&mut self) {
        self.x = self.grid.origin_x;
        self.y = self.grid.origin_y;
    }
}
