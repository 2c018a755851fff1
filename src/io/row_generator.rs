//! Random row forest generation for demos and stress tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};

const DEFAULT_MAX_DEPTH: usize = 3;
const DEFAULT_MAX_CHILDREN: usize = 6;

const STATUSES: [&str; 4] = ["queued", "running", "done", "failed"];

/// Generates a reproducible forest of JSON rows.
///
/// Every row has a unique string `id`, a `name`, a `status` and a `size`;
/// inner rows carry `children`.
pub struct RowGenerator {
    max_depth: usize,
    max_children: usize,
    seed: u64,
}

impl Default for RowGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl RowGenerator {
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_children: DEFAULT_MAX_CHILDREN,
            seed: 42, // Default seed for reproducibility
        }
    }

    pub fn with_config(max_depth: usize, max_children: usize, seed: u64) -> Self {
        Self { max_depth, max_children, seed }
    }

    /// Generates `roots` root rows with random subtrees.
    pub fn generate(&self, roots: usize) -> Vec<Value> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut next_id = 0;
        (0..roots)
            .map(|_| self.generate_row(&mut rng, &mut next_id, 0))
            .collect()
    }

    fn generate_row(&self, rng: &mut StdRng, next_id: &mut u64, depth: usize) -> Value {
        let id = *next_id;
        *next_id += 1;

        let mut row = json!({
            "id": format!("row-{id}"),
            "name": format!("Item {id}"),
            "status": STATUSES[rng.gen_range(0..STATUSES.len())],
            "size": rng.gen_range(1..10_000),
        });

        if depth < self.max_depth && self.max_children > 0 && rng.gen_bool(0.4) {
            let count = rng.gen_range(1..=self.max_children);
            let children: Vec<Value> = (0..count)
                .map(|_| self.generate_row(rng, next_id, depth + 1))
                .collect();
            row["children"] = Value::Array(children);
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::RowValue;
    use std::collections::HashSet;

    fn collect_ids(rows: &[Value], out: &mut Vec<String>) {
        for row in rows {
            out.push(row["id"].as_str().unwrap().to_string());
            if let Some(children) = row.children() {
                collect_ids(children, out);
            }
        }
    }

    #[test]
    fn test_generation_is_reproducible() {
        let generator = RowGenerator::with_config(2, 4, 7);
        assert_eq!(generator.generate(20), generator.generate(20));
    }

    #[test]
    fn test_ids_are_unique() {
        let rows = RowGenerator::new().generate(50);
        let mut ids = Vec::new();
        collect_ids(&rows, &mut ids);
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
        assert!(ids.len() >= 50);
    }

    #[test]
    fn test_zero_depth_is_flat() {
        let rows = RowGenerator::with_config(0, 5, 1).generate(10);
        assert!(rows.iter().all(|row| row.children().is_none()));
    }
}
