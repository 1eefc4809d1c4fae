use crate::element::ElementKind;
use crate::error::CodecError;

/// Slice width used when the caller does not pick one.
pub const DEFAULT_SLICE_WIDTH: u32 = 3;

#[derive(Debug, Clone)]
pub struct CodecConfig {
    pub slice_width: u32,
    pub run_length: bool,
    pub threads: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            slice_width: DEFAULT_SLICE_WIDTH,
            run_length: true,
            threads: num_cpus::get(),
        }
    }
}

impl CodecConfig {
    pub fn with_slice_width(mut self, slice_width: u32) -> Self {
        self.slice_width = slice_width;
        self
    }

    pub fn with_run_length(mut self, run_length: bool) -> Self {
        self.run_length = run_length;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Check the slice width against an element width before any work starts.
    pub fn validate_for(&self, kind: ElementKind) -> Result<(), CodecError> {
        if self.slice_width > kind.bits() {
            return Err(CodecError::invalid(format!(
                "slice width {} exceeds {}-bit element width",
                self.slice_width,
                kind.bits()
            )));
        }
        Ok(())
    }
}
