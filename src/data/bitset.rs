/// Mark bits for the collector: one bit per byte position in the temporaries,
/// set at the first byte of each live object.
#[derive(Clone, Debug, Default)]
pub struct BitSet {
    data: Vec<usize>,
}

impl BitSet {
    const BITS_PER_WORD: usize = usize::BITS as usize;

    /// Creates an empty bitset able to hold `bits` bits without growing.
    pub fn with_capacity(bits: usize) -> Self {
        BitSet {
            data: vec![0; bits.div_ceil(Self::BITS_PER_WORD)],
        }
    }

    /// Gets the value of the given bit.
    pub fn get(&self, idx: usize) -> bool {
        let word = idx / Self::BITS_PER_WORD;
        let bit = idx % Self::BITS_PER_WORD;
        match self.data.get(word) {
            Some(w) => w & (1 << bit) != 0,
            None => false,
        }
    }

    /// Sets the given bit.
    pub fn set(&mut self, idx: usize) {
        let word = idx / Self::BITS_PER_WORD;
        let bit = idx % Self::BITS_PER_WORD;
        if word >= self.data.len() {
            self.data.resize(word + 1, 0);
        }
        self.data[word] |= 1 << bit;
    }

    /// Number of bits set.
    pub fn count(&self) -> usize {
        self.data.iter().map(|w| w.count_ones() as usize).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::BitSet;

    #[test]
    fn exhaustive_single_bits() {
        for i in 0..255usize {
            let mut bs = BitSet::with_capacity(64);
            assert!(!bs.get(i));
            bs.set(i);
            for j in 0..255usize {
                assert_eq!(bs.get(j), i == j);
            }
            assert_eq!(bs.count(), 1);
        }
    }

    #[test]
    fn even_bits() {
        let mut bs = BitSet::default();
        for i in (0..255usize).filter(|i| i % 2 == 0) {
            bs.set(i);
        }
        assert_eq!(bs.count(), 128);
        assert!(bs.get(254));
        assert!(!bs.get(253));
        assert!(!bs.get(10_000));
    }
}
