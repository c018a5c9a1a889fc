//! Output bookkeeping keyed by registry global name.
//!
//! Generic over the output handle and its shell-side companion so the same
//! tracker serves live proxies and the recording fixtures.

/// One advertised output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedOutput<O, W> {
    /// Registry name of the `wl_output` global
    pub name: u32,
    pub output: O,
    /// Shell extension object, once requested
    pub wf_output: Option<W>,
}

#[derive(Debug)]
pub struct OutputTracker<O, W> {
    outputs: Vec<TrackedOutput<O, W>>,
}

impl<O, W> Default for OutputTracker<O, W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O, W> OutputTracker<O, W> {
    pub fn new() -> Self {
        Self {
            outputs: Vec::new(),
        }
    }

    /// Start tracking an output. A global name that is already tracked is
    /// replaced, since the compositor never reuses a live name.
    pub fn insert(&mut self, name: u32, output: O, wf_output: Option<W>) {
        self.outputs.retain(|o| o.name != name);
        self.outputs.push(TrackedOutput {
            name,
            output,
            wf_output,
        });
    }

    /// Stop tracking the output advertised as `name`.
    pub fn remove(&mut self, name: u32) -> Option<TrackedOutput<O, W>> {
        let index = self.outputs.iter().position(|o| o.name == name)?;
        Some(self.outputs.remove(index))
    }

    /// Offer every output still missing its shell object to `f`.
    /// Returns how many were attached.
    pub fn attach_missing(&mut self, mut f: impl FnMut(u32, &O) -> Option<W>) -> usize {
        let mut attached = 0;
        for entry in self.outputs.iter_mut().filter(|o| o.wf_output.is_none()) {
            entry.wf_output = f(entry.name, &entry.output);
            if entry.wf_output.is_some() {
                attached += 1;
            }
        }
        attached
    }

    pub fn get(&self, name: u32) -> Option<&TrackedOutput<O, W>> {
        self.outputs.iter().find(|o| o.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedOutput<O, W>> {
        self.outputs.iter()
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}
