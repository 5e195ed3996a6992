use log::info;

#[allow(unused_imports)]
use crate::Llrb;

/// Leaf-node depths of an [`Llrb`] tree, sampled at every absent child.
/// Depth of a leaf is the number of nodes between root and the absent
/// child, hence [`Depth::max`] is the height of the tree and
/// [`Depth::min`] is bounded below by its black height.
#[derive(Clone, Debug, Default)]
pub struct Depth {
    samples: usize,
    min: usize,
    max: usize,
    total: usize,
}

impl Depth {
    pub(crate) fn sample(&mut self, depth: usize) {
        if self.samples == 0 || depth < self.min {
            self.min = depth
        }
        self.max = self.max.max(depth);
        self.samples += 1;
        self.total += depth;
    }

    /// Return number of leaf-nodes sampled.
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Return depth of the shallowest leaf.
    pub fn min(&self) -> usize {
        self.min
    }

    /// Return depth of the deepest leaf.
    pub fn max(&self) -> usize {
        self.max
    }

    /// Return the average depth, rounded down.
    pub fn mean(&self) -> usize {
        match self.samples {
            0 => 0,
            n => self.total / n,
        }
    }

    /// Log (min, mean, max) depth, `prefix` is typically the instance name.
    pub fn pretty_print(&self, prefix: &str) {
        info!(
            "{} depth (min, mean, max): {:?} over {} leaves",
            prefix,
            (self.min, self.mean(), self.max),
            self.samples
        );
    }
}
