use tracing::warn;

use crate::math;

/// The default capacity of an [`Alphabet`]. A signature has 64 bits of which one is
/// reserved for marking finality, leaving 63 usable symbol indices.
pub const MAX_ALPHABET_SIZE: usize = 63;

/// Assigns a dense index to every symbol of an alphabet, in the order in which the
/// symbols are first added. The mapping is bijective, so symbols can be recovered
/// from their indices. An alphabet is bounded: once `max_size` distinct symbols have
/// been indexed, further symbols are reported and dropped, they never receive an
/// index. The bound exists because a [`crate::dfa::Signature`] can only dedicate one
/// bit to each symbol index.
#[derive(Clone, Debug)]
pub struct Alphabet {
    indices: math::Bijection<char, usize>,
    max_size: usize,
}

impl Default for Alphabet {
    fn default() -> Self {
        Self::new(MAX_ALPHABET_SIZE)
    }
}

impl Alphabet {
    /// Creates an empty alphabet that can index at most `max_size` distinct symbols.
    pub fn new(max_size: usize) -> Self {
        Self {
            indices: math::Bijection::new(),
            max_size,
        }
    }

    /// Adds `sym` to the alphabet, assigning it the next free index. Adding a symbol
    /// that is already indexed is a no-op and returns its existing index. When the
    /// capacity is exhausted, the symbol is dropped, a diagnostic is emitted and
    /// `None` is returned; previously assigned indices are unaffected.
    pub fn add(&mut self, sym: char) -> Option<usize> {
        if let Some(&index) = self.indices.get_by_left(&sym) {
            return Some(index);
        }
        if self.indices.len() >= self.max_size {
            warn!(
                "alphabet is full ({} symbols), dropping {sym:?}",
                self.max_size
            );
            return None;
        }
        let index = self.indices.len();
        self.indices.insert(sym, index);
        Some(index)
    }

    /// Returns the index assigned to `sym`. Looking up a symbol that was never
    /// [added](Self::add) yields the zero index; it is the caller's obligation to add
    /// symbols before indexing them.
    pub fn index_of(&self, sym: char) -> usize {
        self.indices.get_by_left(&sym).copied().unwrap_or(0)
    }

    /// Returns the symbol that `index` was assigned to, if any.
    pub fn symbol_of(&self, index: usize) -> Option<char> {
        self.indices.get_by_right(&index).copied()
    }

    /// Returns the number of symbols that have been indexed so far.
    pub fn size(&self) -> usize {
        self.indices.len()
    }

    /// Returns true if no symbol has been added yet.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{Alphabet, MAX_ALPHABET_SIZE};

    #[test]
    fn first_seen_order() {
        let mut alphabet = Alphabet::default();
        assert_eq!(alphabet.add('x'), Some(0));
        assert_eq!(alphabet.add('a'), Some(1));
        assert_eq!(alphabet.add('m'), Some(2));
        assert_eq!(alphabet.index_of('a'), 1);
        assert_eq!(alphabet.symbol_of(2), Some('m'));
        assert_eq!(alphabet.size(), 3);
    }

    #[test]
    fn adding_twice_is_a_noop() {
        let mut alphabet = Alphabet::default();
        assert_eq!(alphabet.add('a'), Some(0));
        assert_eq!(alphabet.add('b'), Some(1));
        assert_eq!(alphabet.add('a'), Some(0));
        assert_eq!(alphabet.size(), 2);
    }

    #[test]
    fn bound_is_enforced() {
        let mut alphabet = Alphabet::default();
        let symbols: Vec<char> = (0..MAX_ALPHABET_SIZE as u32)
            .map(|i| char::from_u32('0' as u32 + i).unwrap())
            .collect();
        for (i, &sym) in symbols.iter().enumerate() {
            assert_eq!(alphabet.add(sym), Some(i));
        }
        // the 64th distinct symbol must be rejected without disturbing the rest
        assert_eq!(alphabet.add('€'), None);
        assert_eq!(alphabet.size(), MAX_ALPHABET_SIZE);
        assert_eq!(alphabet.index_of(symbols[0]), 0);
        assert_eq!(alphabet.symbol_of(MAX_ALPHABET_SIZE - 1), symbols.last().copied());
    }

    #[test]
    fn unseen_symbols_default_to_zero() {
        let mut alphabet = Alphabet::default();
        alphabet.add('a');
        assert_eq!(alphabet.index_of('z'), 0);
    }
}
