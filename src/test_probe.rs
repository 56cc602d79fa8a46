//! Fake probers shared by unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::image_probe::{ImageDimensions, ImageProbe, ImageSource, ProbeError};

/// Prober returning fixed dimensions and counting invocations.
pub(crate) struct FixedProber {
    dims: ImageDimensions,
    probes: AtomicUsize,
}

impl FixedProber {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            dims: ImageDimensions { width, height },
            probes: AtomicUsize::new(0),
        }
    }

    pub fn count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

impl ImageProbe for FixedProber {
    fn probe(&self, _source: &ImageSource) -> Result<ImageDimensions, ProbeError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        Ok(self.dims)
    }
}

/// Prober that always fails, counting invocations.
pub(crate) struct FailProber {
    probes: AtomicUsize,
}

impl FailProber {
    pub fn new() -> Self {
        Self {
            probes: AtomicUsize::new(0),
        }
    }

    #[allow(dead_code)]
    pub fn count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

impl ImageProbe for FailProber {
    fn probe(&self, source: &ImageSource) -> Result<ImageDimensions, ProbeError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        Err(ProbeError::Unsupported(format!("{source:?}")))
    }
}
