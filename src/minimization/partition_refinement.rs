//! Signature-accelerated partition refinement.
//!
//! Minimization runs in four phases. First, every state gets a [`StateRecord`]
//! listing the targets of its outgoing transitions ordered by symbol index, and the
//! initial two-class partition (final vs. non-final) is laid down; both happen in a
//! parallel fan-out over the states, each state writing only its own slot. The
//! records are then sorted globally by `(class, signature, target classes)`. Second,
//! a single linear sweep over the sorted records assigns a fresh class at every
//! boundary where the class, the signature or the target-class sequence changes;
//! this fuses the final/non-final split with the signature distinction, so that
//! afterwards all states of a class agree on their defined symbols. Third, sorting
//! and sweeping (now without the signature, which no longer discriminates within a
//! class) repeat until the number of classes stops growing. Since every sweep
//! refines the previous partition, the class count is non-decreasing and bounded by
//! the state count, so the loop terminates. Fourth, the quotient automaton is
//! assembled and installed into the model.
//!
//! A record stores the *state indices* of its transition targets; which class a
//! target currently belongs to is looked up through the live partition table at
//! comparison time. Records do not store symbols: positional comparison of two
//! target sequences is only meaningful once both states are known to define the
//! same symbols in the same order, which the signature check guarantees.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::trace;

use crate::dfa::{Dfa, Signature};
use crate::math;

/// Pairs a state with the targets of its outgoing transitions, ordered by the
/// symbols' alphabet indices. Lives only for the duration of one minimization run.
struct StateRecord {
    state: usize,
    targets: Vec<usize>,
}

/// Minimizes `dfa` in place.
pub(crate) fn partition_refinement(dfa: &mut Dfa) {
    let mut partition = initial_partition(dfa);
    let mut records = build_records(dfa);
    let signatures = dfa.signatures();
    records.par_sort_unstable_by(|l, r| initial_cmp(l, r, &partition, signatures));

    let mut next = vec![0; partition.len()];
    let class_count = first_refinement(&records, &mut partition, &mut next, signatures);
    trace!("first refinement sweep produced {} classes", class_count + 1);
    let class_count = refine(&mut records, &mut partition, &mut next, class_count);
    trace!("fixpoint reached at {} classes", class_count + 1);

    construct(dfa, &partition, class_count);
}

/// Lays down the initial partition: class 0 for non-final, class 1 for final states.
fn initial_partition(dfa: &Dfa) -> Vec<usize> {
    (0..dfa.size())
        .into_par_iter()
        .map(|q| usize::from(dfa.is_final(q)))
        .collect()
}

/// Builds the per-state records. The transition table is keyed by symbol, so the
/// targets are reordered to follow the alphabet indices of their symbols.
fn build_records(dfa: &Dfa) -> Vec<StateRecord> {
    (0..dfa.size())
        .into_par_iter()
        .map(|q| {
            let mut targets: Vec<(usize, usize)> = dfa
                .transitions_from(q)
                .iter()
                .map(|(&sym, &target)| (dfa.alphabet().index_of(sym), target))
                .collect();
            targets.sort_unstable_by_key(|&(index, _)| index);
            StateRecord {
                state: q,
                targets: targets.into_iter().map(|(_, target)| target).collect(),
            }
        })
        .collect()
}

/// Compares two records positionally through the current partition table, shorter
/// target sequences first. Only meaningful as a tiebreak between states that define
/// the same symbols.
fn record_cmp(lhs: &StateRecord, rhs: &StateRecord, partition: &[usize]) -> Ordering {
    lhs.targets
        .len()
        .cmp(&rhs.targets.len())
        .then_with(|| {
            lhs.targets
                .iter()
                .zip(&rhs.targets)
                .map(|(&l, &r)| partition[l].cmp(&partition[r]))
                .find(|ord| ord.is_ne())
                .unwrap_or(Ordering::Equal)
        })
}

/// Sort order for the initial sweep: class, then signature, then target classes.
fn initial_cmp(
    lhs: &StateRecord,
    rhs: &StateRecord,
    partition: &[usize],
    signatures: &[Signature],
) -> Ordering {
    partition[lhs.state]
        .cmp(&partition[rhs.state])
        .then_with(|| signatures[lhs.state].cmp(&signatures[rhs.state]))
        .then_with(|| record_cmp(lhs, rhs, partition))
}

/// Sort order for the refinement sweeps. The signature is left out: after the first
/// sweep all states of a class share one signature already.
fn refining_cmp(lhs: &StateRecord, rhs: &StateRecord, partition: &[usize]) -> Ordering {
    partition[lhs.state]
        .cmp(&partition[rhs.state])
        .then_with(|| record_cmp(lhs, rhs, partition))
}

/// The first sweep over the sorted records. Walks them once, carrying the class,
/// signature and representative record of the run so far; a new output class is
/// opened whenever one of the three differs. Returns the highest class id assigned.
fn first_refinement(
    records: &[StateRecord],
    partition: &mut Vec<usize>,
    next: &mut Vec<usize>,
    signatures: &[Signature],
) -> usize {
    let mut class_count = 0;
    let mut current_class = partition[records[0].state];
    let mut current_signature = signatures[records[0].state];
    let mut representative = &records[0];

    for record in records {
        if partition[record.state] != current_class {
            class_count += 1;
            current_class = partition[record.state];
            current_signature = signatures[record.state];
            representative = record;
        } else if signatures[record.state] != current_signature {
            class_count += 1;
            current_signature = signatures[record.state];
            representative = record;
        } else if record_cmp(representative, record, partition).is_ne() {
            class_count += 1;
            representative = record;
        }
        next[record.state] = class_count;
    }

    std::mem::swap(partition, next);
    class_count
}

/// Repeats sort-and-sweep until the class count of a sweep equals that of the sweep
/// before it. Equal counts mean no class was split, so the new assignment is a mere
/// renaming of the previous one and the partition is stable.
fn refine(
    records: &mut [StateRecord],
    partition: &mut Vec<usize>,
    next: &mut Vec<usize>,
    mut class_count: usize,
) -> usize {
    loop {
        records.par_sort_unstable_by(|l, r| refining_cmp(l, r, partition));

        let previous = class_count;
        class_count = 0;
        let mut current_class = partition[records[0].state];
        let mut representative = &records[0];

        for record in records.iter() {
            if partition[record.state] != current_class {
                class_count += 1;
                current_class = partition[record.state];
                representative = record;
            } else if record_cmp(representative, record, partition).is_ne() {
                class_count += 1;
                representative = record;
            }
            next[record.state] = class_count;
        }

        std::mem::swap(partition, next);
        if class_count == previous {
            return class_count;
        }
        trace!(
            "refinement sweep split {} classes into {}",
            previous + 1,
            class_count + 1
        );
    }
}

/// Assembles the quotient automaton and installs it into the model. Every class
/// becomes one state; the first original state of a class to define a symbol writes
/// the transition, which is safe since refinement guarantees that all members of a
/// class agree on the target's class for every defined symbol.
fn construct(dfa: &mut Dfa, partition: &[usize], class_count: usize) {
    let size = class_count + 1;
    let mut signatures = vec![Signature::default(); size];
    let mut transitions: Vec<BTreeMap<char, usize>> = vec![BTreeMap::new(); size];
    let mut final_states = math::Set::default();
    let mut transition_count = 0;
    let start_state = partition[dfa.start_state()];

    for q in 0..dfa.size() {
        let class = partition[q];
        if dfa.is_final(q) {
            final_states.insert(class);
            signatures[class].set_final();
        }
        for (&sym, &target) in dfa.transitions_from(q) {
            if !transitions[class].contains_key(&sym) {
                transitions[class].insert(sym, partition[target]);
                transition_count += 1;
                signatures[class].insert(dfa.alphabet().index_of(sym));
            }
        }
    }

    dfa.replace_with(signatures, transitions, final_states, start_state, transition_count);
}

#[cfg(test)]
mod tests {
    use crate::dfa::Dfa;
    use crate::math;

    /// Runs `dfa` on `word` starting from an arbitrary state instead of the start state.
    fn accepts_from(dfa: &Dfa, mut state: usize, word: &str) -> bool {
        for sym in word.chars() {
            match dfa.transitions_from(state).get(&sym) {
                Some(&target) => state = target,
                None => return false,
            }
        }
        dfa.is_final(state)
    }

    #[test]
    fn chain_of_three_states_is_already_minimal() {
        let mut dfa = Dfa::try_from("0 1 a\n1 2 a\n2").unwrap();
        dfa.minimize();
        assert_eq!(dfa.size(), 3);
        assert_eq!(dfa.transition_count(), 2);
        assert!(dfa.accepts("aa"));
        assert!(!dfa.accepts("a"));
    }

    #[test]
    fn trie_leaves_with_equal_behavior_collapse() {
        let mut dfa = Dfa::new();
        dfa.add_word("a");
        dfa.add_word("b");
        assert_eq!(dfa.size(), 3);
        dfa.minimize();
        // both leaves are final with no outgoing transitions, they merge
        assert_eq!(dfa.size(), 2);
        assert_eq!(dfa.final_state_count(), 1);
        assert!(dfa.accepts("a"));
        assert!(dfa.accepts("b"));
        assert!(!dfa.accepts(""));
        assert!(!dfa.accepts("ab"));
    }

    #[test]
    fn divergent_prefixes_with_equal_suffix_behavior() {
        let mut dfa = Dfa::new();
        dfa.add_word("cat");
        dfa.add_word("car");
        assert_eq!(dfa.size(), 5);
        dfa.minimize();
        assert_eq!(dfa.size(), 4);
        assert!(dfa.accepts("cat"));
        assert!(dfa.accepts("car"));
        assert!(!dfa.accepts("ca"));
    }

    #[test]
    fn states_with_distinct_signatures_never_merge() {
        let dfa = crate::tests::wiki_dfa();
        let signatures: Vec<_> = dfa.state_indices().map(|q| dfa.signature(q)).collect();
        let partition = super::refined_partition(&dfa);
        for p in 0..signatures.len() {
            for q in p + 1..signatures.len() {
                if signatures[p] != signatures[q] {
                    assert_ne!(partition[p], partition[q], "states {p} and {q}");
                }
            }
        }
    }

    #[test]
    fn no_two_states_of_the_result_are_equivalent() {
        let mut dfa = crate::tests::wiki_dfa();
        dfa.minimize();
        // every pair must be separated by some word of bounded length
        let words: Vec<String> = ["", "a", "b", "aa", "ab", "ba", "bb", "aab", "abb", "bab"]
            .map(String::from)
            .to_vec();
        for p in dfa.state_indices() {
            for q in dfa.state_indices().filter(|&q| q > p) {
                assert!(
                    words
                        .iter()
                        .any(|w| accepts_from(&dfa, p, w) != accepts_from(&dfa, q, w)),
                    "states {p} and {q} are equivalent"
                );
            }
        }
    }

    #[test]
    fn symmetric_states_refine_apart() {
        // two disjoint cycles of coprime lengths over the same single symbol; the
        // class counts agree pass by pass only while classes genuinely match, so
        // the count fixpoint must still tell all five states apart
        let mut dfa = Dfa::try_from("0 1 a\n1 0 a\n2 3 a\n3 4 a\n4 2 a\n0\n2").unwrap();
        dfa.minimize();
        assert_eq!(dfa.size(), 5);
    }

    #[test]
    fn unreachable_states_are_kept_but_refined() {
        // state 3 is unreachable and behaves exactly like state 1
        let mut dfa = Dfa::try_from("0 1 a\n1 2 a\n3 2 a\n2").unwrap();
        dfa.minimize();
        assert_eq!(dfa.size(), 3);
        assert!(dfa.accepts("aa"));
    }

    #[test]
    fn class_sizes_cover_all_states() {
        let dfa = crate::tests::wiki_dfa();
        let partition = super::refined_partition(&dfa);
        let mut sizes: math::Map<usize, usize> = math::Map::default();
        for &class in &partition {
            *sizes.entry(class).or_default() += 1;
        }
        assert_eq!(sizes.values().sum::<usize>(), 6);
        assert_eq!(sizes.len(), 3);
    }
}

/// Runs the refinement phases without constructing the quotient, exposing the final
/// state-to-class assignment. Only used by tests.
#[cfg(test)]
fn refined_partition(dfa: &Dfa) -> Vec<usize> {
    let mut partition = initial_partition(dfa);
    let mut records = build_records(dfa);
    let signatures = dfa.signatures();
    records.par_sort_unstable_by(|l, r| initial_cmp(l, r, &partition, signatures));
    let mut next = vec![0; partition.len()];
    let class_count = first_refinement(&records, &mut partition, &mut next, signatures);
    refine(&mut records, &mut partition, &mut next, class_count);
    partition
}
