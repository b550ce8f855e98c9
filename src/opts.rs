use std::path::PathBuf;

/// Options that control one extraction run.
///
/// This struct represents *library-level configuration*, not CLI flags directly.
/// The CLI maps user input into this type so that:
/// - the library remains reusable outside of a CLI context
/// - tests and other frontends can construct options programmatically
///
/// What gets extracted, and into which format, lives in `Config`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOpts {
    /// Output root. Each title writes under `<out_dir>/<title>/`; scratch files go in
    /// `<out_dir>/tmp/`.
    pub out_dir: PathBuf,

    /// Maximum number of jobs running at once. `1` runs everything inline, in order.
    pub concurrency: usize,

    /// Whether to redo jobs whose output file already exists.
    pub overwrite: bool,
}

impl ExtractOpts {
    /// One worker per CPU, overwriting existing outputs.
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            concurrency: num_cpus::get().max(1),
            overwrite: true,
        }
    }

    pub fn scratch_dir(&self) -> PathBuf {
        self.out_dir.join("tmp")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_every_cpu_and_overwrite() {
        let opts = ExtractOpts::new("assets");
        assert!(opts.concurrency >= 1);
        assert!(opts.overwrite);
        assert_eq!(opts.scratch_dir(), PathBuf::from("assets/tmp"));
    }
}
