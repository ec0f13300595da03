//! Greedy positional alignment of a reference line list against a
//! translated one that may miss lines, carry extras, or be locally shuffled.

use crate::{
    functions::{classify, normalize},
    types::{Category, LineKind, MissingLine},
};

/// How many positions past the cursor the aligner searches, in either list.
pub const LOOKAHEAD: usize = 3;

/// Monotonic partial mapping from reference indices to target indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    mapping: Vec<Option<usize>>,
    target_len: usize,
}

impl Alignment {
    pub fn reference_len(&self) -> usize {
        self.mapping.len()
    }

    pub fn target_len(&self) -> usize {
        self.target_len
    }

    pub fn target_of(&self, reference: usize) -> Option<usize> {
        self.mapping.get(reference).copied().flatten()
    }

    pub fn is_matched(&self, reference: usize) -> bool {
        self.target_of(reference).is_some()
    }

    /// `(reference, target)` pairs in reference order.
    pub fn matched(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.mapping
            .iter()
            .enumerate()
            .filter_map(|(reference, target)| target.map(|target: usize| (reference, target)))
    }

    pub fn unmatched(&self) -> impl Iterator<Item = usize> + '_ {
        self.mapping
            .iter()
            .enumerate()
            .filter_map(|(reference, target)| target.is_none().then_some(reference))
    }

    /// Target indices no reference line was mapped to (echoes, duplicates, leaks).
    pub fn extras(&self) -> Vec<usize> {
        let mut used: Vec<bool> = vec![false; self.target_len];

        for (_, target) in self.matched() {
            used[target] = true;
        }

        used.iter()
            .enumerate()
            .filter_map(|(target, used)| (!used).then_some(target))
            .collect()
    }

    /// First matched pair whose reference index is greater than `reference`.
    pub fn next_matched_after(&self, reference: usize) -> Option<(usize, usize)> {
        self.matched().find(|(matched, _)| *matched > reference)
    }

    /// Builds an alignment from an explicit mapping. Returns `None` when the
    /// mapping is not strictly increasing or points past `target_len`.
    pub fn from_mapping(mapping: Vec<Option<usize>>, target_len: usize) -> Option<Self> {
        let mut last: Option<usize> = None;

        for target in mapping.iter().flatten() {
            if *target >= target_len || last.is_some_and(|last: usize| *target <= last) {
                return None;
            }

            last = Some(*target);
        }

        Some(Alignment { mapping, target_len })
    }
}

/// Aligns `reference` against `target`.
///
/// For every reference line, in order, with a cursor into the target:
/// 1. equal comparison keys match;
/// 2. a target line that equals one of the next [`LOOKAHEAD`] reference lines
///    anchors there, so the current reference line is left unmatched;
/// 3. two commands or two logic lines match by kind;
/// 4. a key match up to [`LOOKAHEAD`] target lines ahead matches, the lines in
///    between are skipped as extras;
/// 5. two content lines are assumed to be translations of each other;
/// 6. otherwise the reference line stays unmatched and the cursor stays put.
///
/// Step 5 has no correctness bound: when both lists drift at once it can pair
/// unrelated lines. Results are meant for human review.
pub fn align<R: AsRef<str>, T: AsRef<str>>(reference: &[R], target: &[T]) -> Alignment {
    let reference_keys: Vec<String> = reference.iter().map(|line: &R| normalize(line.as_ref())).collect();
    let reference_kinds: Vec<LineKind> = reference.iter().map(|line: &R| classify(line.as_ref())).collect();
    let target_keys: Vec<String> = target.iter().map(|line: &T| normalize(line.as_ref())).collect();
    let target_kinds: Vec<LineKind> = target.iter().map(|line: &T| classify(line.as_ref())).collect();

    let mut mapping: Vec<Option<usize>> = vec![None; reference.len()];
    let mut cursor: usize = 0;

    for ri in 0..reference.len() {
        if cursor >= target.len() {
            break;
        }

        if reference_keys[ri] == target_keys[cursor] {
            mapping[ri] = Some(cursor);
            cursor += 1;
            continue;
        }

        let anchored_later: bool = reference_keys
            .iter()
            .skip(ri + 1)
            .take(LOOKAHEAD)
            .any(|key: &String| *key == target_keys[cursor]);

        let reference_kind: LineKind = reference_kinds[ri];
        let target_kind: LineKind = target_kinds[cursor];

        if !anchored_later && reference_kind.is_special() && reference_kind == target_kind {
            mapping[ri] = Some(cursor);
            cursor += 1;
            continue;
        }

        let found_ahead: Option<usize> = (1..=LOOKAHEAD)
            .map(|look: usize| cursor + look)
            .take_while(|position: &usize| *position < target.len())
            .find(|position: &usize| target_keys[*position] == reference_keys[ri]);

        if let Some(position) = found_ahead {
            mapping[ri] = Some(position);
            cursor = position + 1;
            continue;
        }

        if anchored_later {
            continue;
        }

        if reference_kind.is_content() && target_kind.is_content() {
            mapping[ri] = Some(cursor);
            cursor += 1;
        }
    }

    Alignment {
        mapping,
        target_len: target.len(),
    }
}

/// Unmatched reference lines with their category and reference-side neighbours.
pub fn missing_lines<R: AsRef<str>>(reference: &[R], alignment: &Alignment) -> Vec<MissingLine> {
    alignment
        .unmatched()
        .map(|position: usize| {
            let text: &str = reference[position].as_ref();
            let context_before: String = match position.checked_sub(1) {
                Some(before) => reference[before].as_ref().to_string(),
                None => String::new(),
            };
            let context_after: String = reference
                .get(position + 1)
                .map_or_else(String::new, |after: &R| after.as_ref().to_string());

            MissingLine {
                category: Category::from(classify(text)),
                text: text.to_string(),
                position,
                context_before,
                context_after,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_monotonic(alignment: &Alignment) -> bool {
        alignment
            .matched()
            .zip(alignment.matched().skip(1))
            .all(|((_, a), (_, b))| a < b)
    }

    #[test]
    fn reports_line_missing_between_command_and_content() {
        let reference: [&str; 4] = ["A", "$$CMD$$", "B", "C"];
        let target: [&str; 3] = ["A", "$$CMD$$", "C"];

        let alignment: Alignment = align(&reference, &target);
        let missing: Vec<MissingLine> = missing_lines(&reference, &alignment);

        assert_eq!(
            missing,
            vec![MissingLine {
                category: Category::MissingText,
                text: String::from("B"),
                position: 2,
                context_before: String::from("$$CMD$$"),
                context_after: String::from("C"),
            }]
        );
        assert_eq!(alignment.target_of(3), Some(2));
    }

    #[test]
    fn skips_echo_line_through_lookahead() {
        let reference: [&str; 2] = ["X", "Y"];
        let target: [&str; 3] = ["X", "extra-echo", "Y"];

        let alignment: Alignment = align(&reference, &target);

        assert_eq!(alignment.target_of(0), Some(0));
        assert_eq!(alignment.target_of(1), Some(2));
        assert_eq!(alignment.unmatched().count(), 0);
        assert_eq!(alignment.extras(), vec![1]);
    }

    #[test]
    fn matches_translated_content_positionally() {
        let reference: [&str; 3] = ["ALPH : \"Good evening.\"", "$$ anim: SMILE $$", "The meter ticks."];
        let target: [&str; 3] = ["АЛЬФ : «Добрый вечер.»", "$$ anim: SMILE $$", "Счётчик тикает."];

        let alignment: Alignment = align(&reference, &target);

        assert_eq!(alignment.matched().collect::<Vec<_>>(), vec![(0, 0), (1, 1), (2, 2)]);
    }

    #[test]
    fn commands_pair_by_kind_unless_anchored_later() {
        let differing: Alignment = align(&["$$ anim: A $$"], &["$$ anim: A-translated $$"]);
        assert_eq!(differing.target_of(0), Some(0));

        let reference: [&str; 2] = ["$$ anim: A $$", "$$ anim: B $$"];
        let target: [&str; 1] = ["$$ anim: B $$"];
        let anchored: Alignment = align(&reference, &target);

        assert_eq!(anchored.target_of(0), None);
        assert_eq!(anchored.target_of(1), Some(0));
    }

    #[test]
    fn command_is_not_paired_with_content() {
        let reference: [&str; 2] = ["$$ music-control: stop $$", "Silence."];
        let target: [&str; 1] = ["Тишина."];

        let alignment: Alignment = align(&reference, &target);

        assert_eq!(alignment.target_of(0), None);
        assert_eq!(alignment.target_of(1), Some(0));
        assert_eq!(
            missing_lines(&reference, &alignment)[0].category,
            Category::MissingCommand
        );
    }

    #[test]
    fn exhausted_target_leaves_the_rest_unmatched() {
        let reference: [&str; 3] = ["one", "two", "_Driver.Met.X=1"];
        let target: [&str; 1] = ["один"];

        let alignment: Alignment = align(&reference, &target);
        let missing: Vec<MissingLine> = missing_lines(&reference, &alignment);

        assert_eq!(alignment.unmatched().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(missing[1].category, Category::MissingLogic);
        assert_eq!(missing[1].context_after, "");
    }

    #[test]
    fn empty_inputs() {
        let empty: [&str; 0] = [];

        assert_eq!(align(&empty, &["x"]).reference_len(), 0);
        assert_eq!(align(&["x"], &empty).unmatched().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn every_line_is_classified_once_and_mapping_is_monotonic() {
        let reference: Vec<&str> = vec![
            "$$ anim: IN $$",
            "ALPH : \"Where to?\"",
            "_Driver.Met.Alph=1",
            "He looks away.",
            "$$ reveal: clue $$",
            "\"Left here.\"",
            "interruptions+=1",
            "The end.",
        ];
        let target: Vec<&str> = vec![
            "$$ anim: IN $$",
            "\"Left here.\"",
            "Он отворачивается.",
            "Он отворачивается.",
            "$$ reveal: clue $$",
            "Конец.",
        ];

        let alignment: Alignment = align(&reference, &target);
        let matched: usize = alignment.matched().count();
        let unmatched: usize = alignment.unmatched().count();

        assert_eq!(matched + unmatched, reference.len());
        assert!(is_monotonic(&alignment));
        assert_eq!(alignment.matched().count() + alignment.extras().len(), target.len());
    }

    #[test]
    fn alignment_is_deterministic() {
        let reference: [&str; 4] = ["a", "$$ b $$", "c", "d"];
        let target: [&str; 3] = ["a", "c", "d"];

        assert_eq!(align(&reference, &target), align(&reference, &target));
    }

    #[test]
    fn next_matched_after_skips_unmatched() {
        let alignment: Alignment = Alignment::from_mapping(vec![Some(0), None, None, Some(7)], 8).unwrap();

        assert_eq!(alignment.next_matched_after(1), Some((3, 7)));
        assert_eq!(alignment.next_matched_after(3), None);
    }

    #[test]
    fn from_mapping_rejects_crossing_pairs() {
        assert!(Alignment::from_mapping(vec![Some(2), Some(1)], 3).is_none());
        assert!(Alignment::from_mapping(vec![Some(0), Some(3)], 3).is_none());
        assert!(Alignment::from_mapping(vec![None, Some(0), None, Some(2)], 3).is_some());
    }
}
