//! Flamegraph hook for `--features dev-profiling` bench runs.

use criterion::profiler::Profiler;
use pprof::ProfilerGuard;
use std::{fs::File, path::Path};

pub struct FlamegraphProfiler<'a> {
    frequency: i32,
    active: Option<ProfilerGuard<'a>>,
}

impl FlamegraphProfiler<'_> {
    pub const fn new(frequency: i32) -> Self {
        Self {
            frequency,
            active: None,
        }
    }
}

impl Profiler for FlamegraphProfiler<'_> {
    fn start_profiling(&mut self, _benchmark_id: &str, _benchmark_dir: &Path) {
        self.active = Some(ProfilerGuard::new(self.frequency).expect("failed to start sampling"));
    }

    fn stop_profiling(&mut self, benchmark_id: &str, benchmark_dir: &Path) {
        let Some(guard) = self.active.take() else {
            return;
        };

        std::fs::create_dir_all(benchmark_dir).expect("failed to create bench directory");
        let path = benchmark_dir.join("flamegraph.svg");
        let file = File::create(&path).expect("failed to create flamegraph.svg");
        guard
            .report()
            .build()
            .expect("failed to build profile report")
            .flamegraph(file)
            .unwrap_or_else(|e| panic!("failed to write flamegraph for {benchmark_id}: {e}"));
    }
}
