/// Index of the highlighted row in the active list.
///
/// Every movement clamps to `[0, len - 1]`; with an empty list the cursor
/// stays at 0 and must not be dereferenced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionCursor {
    index: usize,
}

impl SelectionCursor {
    pub fn index(&self) -> usize {
        self.index
    }

    /// The cursor position when it points at a real row.
    pub fn selected(&self, len: usize) -> Option<usize> {
        (self.index < len).then_some(self.index)
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }

    /// Moves by `delta` rows; returns whether the position changed.
    pub fn step(&mut self, delta: isize, len: usize) -> bool {
        let next = clamp_offset(self.index, delta, len);
        let moved = next != self.index;
        self.index = next;
        moved
    }

    /// Jumps a page of `page_size` rows forward (`direction > 0`) or back.
    pub fn page(&mut self, direction: isize, page_size: usize, len: usize) -> bool {
        let magnitude = isize::try_from(page_size).unwrap_or(isize::MAX);
        self.step(direction.signum().saturating_mul(magnitude), len)
    }

    pub fn clamp_to(&mut self, len: usize) {
        self.index = clamp_offset(self.index, 0, len);
    }
}

fn clamp_offset(current: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }

    let max = len - 1;
    let target = if delta < 0 {
        current.saturating_sub(delta.unsigned_abs())
    } else {
        current.saturating_add(delta.unsigned_abs())
    };
    target.min(max)
}
