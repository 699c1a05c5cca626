// Sparse byte cache for partially downloaded files

use std::collections::BTreeMap;

/// Disjoint, non-adjacent byte runs keyed by their start offset
#[derive(Debug, Default)]
pub struct SparseCache {
    runs: BTreeMap<u64, Vec<u8>>,
}

impl SparseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `data` at `start`, merging with any run it touches.
    /// Newer bytes win where runs overlap.
    pub fn insert(&mut self, start: u64, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        let end = start + data.len() as u64;

        let touching: Vec<u64> = self
            .runs
            .range(..=end)
            .filter(|(run_start, run)| **run_start + run.len() as u64 >= start)
            .map(|(run_start, _)| *run_start)
            .collect();

        let mut merged_start = start;
        let mut merged_end = end;
        for run_start in &touching {
            let run_end = run_start + self.runs[run_start].len() as u64;
            merged_start = merged_start.min(*run_start);
            merged_end = merged_end.max(run_end);
        }

        let mut merged = vec![0u8; (merged_end - merged_start) as usize];
        for run_start in touching {
            if let Some(run) = self.runs.remove(&run_start) {
                let offset = (run_start - merged_start) as usize;
                merged[offset..offset + run.len()].copy_from_slice(&run);
            }
        }
        let offset = (start - merged_start) as usize;
        merged[offset..offset + data.len()].copy_from_slice(data);

        self.runs.insert(merged_start, merged);
    }

    /// Bytes `[start, start + len)` if every one of them is cached
    pub fn get(&self, start: u64, len: u64) -> Option<&[u8]> {
        let (run_start, run) = self.runs.range(..=start).next_back()?;
        let offset = (start - run_start) as usize;
        let end = offset.checked_add(len as usize)?;
        run.get(offset..end)
    }

    #[cfg(test)]
    pub fn contains(&self, start: u64, len: u64) -> bool {
        self.get(start, len).is_some()
    }

    pub fn cached_bytes(&self) -> u64 {
        self.runs.values().map(|run| run.len() as u64).sum()
    }
}
