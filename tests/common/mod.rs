//! Containers and renderers shared by the integration tests.
#![allow(dead_code)]

use growth_probe::{Chart, Container, RenderError, Renderer};

/// A list that over-allocates by roughly one eighth on growth and rounds its allocation to a
/// multiple of four.
#[derive(Debug, Default)]
pub struct OverallocatingList {
    len: usize,
    allocated: usize,
}

impl OverallocatingList {
    fn resize(&mut self, new_len: usize) {
        if self.allocated >= new_len && new_len >= self.allocated >> 1 {
            self.len = new_len;
            return;
        }

        let mut allocated = (new_len + (new_len >> 3) + 6) & !3;
        if new_len - self.len > allocated - new_len {
            allocated = (new_len + 3) & !3;
        }
        self.allocated = if new_len == 0 { 0 } else { allocated };
        self.len = new_len;
    }
}

impl Container for OverallocatingList {
    type Element = u64;

    fn empty() -> Self {
        Self::default()
    }

    fn grow_by_one(&mut self) {
        self.resize(self.len + 1);
    }

    fn len(&self) -> usize {
        self.len
    }

    fn capacity(&self) -> usize {
        self.allocated
    }
}

/// Element counts whose append changed the capacity, found by growing `C` directly.
pub fn observed_transitions<C: Container>(upper_bound: usize) -> Vec<(usize, usize)> {
    let mut container = C::empty();
    let mut last = 0;
    let mut transitions = Vec::new();
    for element_count in 0..upper_bound {
        container.grow_by_one();
        if container.capacity() != last {
            last = container.capacity();
            transitions.push((element_count, last));
        }
    }
    transitions
}

/// Keeps every chart it is asked to render.
#[derive(Default)]
pub struct RecordingRenderer {
    pub charts: Vec<Chart>,
}

impl Renderer for RecordingRenderer {
    fn render(&mut self, chart: &Chart) -> Result<(), RenderError> {
        self.charts.push(chart.clone());
        Ok(())
    }
}
