pub(crate) mod partition_refinement;

use crate::dfa::Dfa;

impl Dfa {
    /// Reduces `self` in place to the unique minimal automaton accepting the same
    /// language. Works by refining the final/non-final partition of the states until
    /// no transition forces a further split; states sharing a class afterwards are
    /// merged. The refinement is accelerated by the state [`crate::dfa::Signature`]s:
    /// states with distinct signatures are provably distinguishable and get separated
    /// wholesale before any transition targets are compared.
    ///
    /// Unreachable states take part in the refinement like any other state, they are
    /// not removed.
    pub fn minimize(&mut self) {
        partition_refinement::partition_refinement(self)
    }
}

#[cfg(test)]
mod tests {
    use crate::dfa::Dfa;

    #[test_log::test]
    fn textbook_six_state_dfa() {
        let mut dfa = crate::tests::wiki_dfa();
        dfa.minimize();
        assert_eq!(dfa.size(), 3);
        assert_eq!(dfa.final_state_count(), 1);
        assert_eq!(dfa.transition_count(), 6);
    }

    #[test]
    fn minimization_preserves_language() {
        let mut dfa = crate::tests::wiki_dfa();
        let words: Vec<String> = all_words("ab", 6);
        let before: Vec<bool> = words.iter().map(|w| dfa.accepts(w)).collect();
        dfa.minimize();
        let after: Vec<bool> = words.iter().map(|w| dfa.accepts(w)).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn minimization_is_idempotent() {
        let mut dfa = crate::tests::wiki_dfa();
        dfa.minimize();
        let (size, transitions, finals) =
            (dfa.size(), dfa.transition_count(), dfa.final_state_count());
        dfa.minimize();
        assert_eq!(dfa.size(), size);
        assert_eq!(dfa.transition_count(), transitions);
        assert_eq!(dfa.final_state_count(), finals);
    }

    #[test]
    fn lexicon_language_is_preserved() {
        let mut dfa = Dfa::new();
        let lexicon = ["cat", "car", "cart", "dog", "do", "done", "doner"];
        for word in lexicon {
            dfa.add_word(word);
        }
        let original = dfa.clone();
        dfa.minimize();
        assert!(dfa.size() < original.size());
        for word in all_words("cartdogne", 5) {
            assert_eq!(original.accepts(&word), dfa.accepts(&word), "word {word:?}");
        }
    }

    /// All words over `symbols` up to the given length.
    fn all_words(symbols: &str, max_len: usize) -> Vec<String> {
        let mut words = vec![String::new()];
        let mut layer = vec![String::new()];
        for _ in 0..max_len {
            layer = layer
                .iter()
                .flat_map(|w| {
                    symbols.chars().map(move |c| {
                        let mut next = w.clone();
                        next.push(c);
                        next
                    })
                })
                .collect();
            words.extend(layer.iter().cloned());
        }
        words
    }
}
