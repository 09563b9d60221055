use std::collections::HashMap;

/// A single memory cell. Intcode values are at least 64 bits wide.
pub type Value = i64;

pub trait Addressable<T> {
    fn read(&self, address: usize) -> T;
    fn write(&mut self, address: usize, value: T);
    fn write_chunk(&mut self, chunk: &[T]);
}

/// Gap past the end of the dense region a write may always bridge. On top of
/// this the region may grow by a quarter of its current length per write.
pub const DENSE_SLACK: usize = 64;

/// The dense region never grows past this many cells by writes alone.
pub const DENSE_LIMIT: usize = 1 << 20;

/// Unbounded Intcode memory.
///
/// Addresses below `dense.len()` live in `dense`, everything else in `sparse`.
/// Unwritten cells read as zero.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Memory {
    dense: Vec<Value>,
    sparse: HashMap<usize, Value>,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies addresses `0..len` out of memory.
    pub fn snapshot(&self, len: usize) -> Vec<Value> {
        (0..len).map(|address| self.read(address)).collect()
    }

    fn grows_into(&self, address: usize) -> bool {
        let len = self.dense.len();
        address < DENSE_LIMIT && address - len <= len / 4 + DENSE_SLACK
    }

    fn grow_to(&mut self, len: usize) {
        self.dense.resize(len, 0);

        if self.sparse.is_empty() {
            return;
        }
        let dense = &mut self.dense;
        self.sparse.retain(|&address, value| {
            if address < len {
                dense[address] = *value;
                false
            } else {
                true
            }
        });
    }
}

impl Addressable<Value> for Memory {
    fn read(&self, address: usize) -> Value {
        match self.dense.get(address) {
            Some(value) => *value,
            None => self.sparse.get(&address).copied().unwrap_or(0),
        }
    }

    fn write(&mut self, address: usize, value: Value) {
        if address < self.dense.len() {
            self.dense[address] = value;
        } else if self.grows_into(address) {
            self.grow_to(address + 1);
            self.dense[address] = value;
        } else {
            self.sparse.insert(address, value);
        }
    }

    fn write_chunk(&mut self, chunk: &[Value]) {
        if chunk.len() > self.dense.len() {
            self.grow_to(chunk.len());
        }
        self.dense[..chunk.len()].copy_from_slice(chunk);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwritten_cells_read_zero() {
        let mut memory = Memory::new();
        memory.write_chunk(&[1, 2, 3]);
        assert_eq!(memory.read(2), 3);
        assert_eq!(memory.read(3), 0);
        assert_eq!(memory.read(1 << 40), 0);
    }

    #[test]
    fn writes_near_the_end_grow_the_dense_region() {
        let mut memory = Memory::new();
        memory.write_chunk(&[7; 4]);
        memory.write(60, 42);
        assert_eq!(memory.dense.len(), 61);
        assert!(memory.sparse.is_empty());
        assert_eq!(memory.read(60), 42);
        assert_eq!(memory.read(30), 0);
    }

    #[test]
    fn strided_writes_do_not_inflate_the_dense_region() {
        let mut memory = Memory::new();
        memory.write_chunk(&[1; 10]);
        for i in 1..=100 {
            memory.write(10 + i * 4000, i as Value);
        }
        assert_eq!(memory.dense.len(), 10);
        assert_eq!(memory.sparse.len(), 100);
        assert_eq!(memory.read(10 + 50 * 4000), 50);
    }

    #[test]
    fn dense_region_is_capped() {
        let mut memory = Memory::new();
        memory.write_chunk(&vec![0; DENSE_LIMIT]);
        memory.write(DENSE_LIMIT, 3);
        assert_eq!(memory.dense.len(), DENSE_LIMIT);
        assert_eq!(memory.read(DENSE_LIMIT), 3);
    }

    #[test]
    fn far_writes_stay_sparse() {
        let mut memory = Memory::new();
        memory.write(1_000_000_000, -5);
        assert!(memory.dense.is_empty());
        assert_eq!(memory.read(1_000_000_000), -5);
    }

    #[test]
    fn growing_absorbs_sparse_cells() {
        let mut memory = Memory::new();
        memory.write_chunk(&[0; 100]);
        memory.write(250, 9);
        assert_eq!(memory.sparse.len(), 1);

        memory.write(180, 1);
        memory.write(260, 2);
        assert_eq!(memory.dense.len(), 261);
        assert!(memory.sparse.is_empty());
        assert_eq!(memory.read(250), 9);
        assert_eq!(memory.read(260), 2);
    }

    #[test]
    fn snapshot_includes_zero_fill() {
        let mut memory = Memory::new();
        memory.write_chunk(&[1, 2]);
        assert_eq!(memory.snapshot(4), vec![1, 2, 0, 0]);
    }
}
