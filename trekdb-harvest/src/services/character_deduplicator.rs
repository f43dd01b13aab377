//! Character deduplication
//!
//! Groups records that describe the same character and marks exactly one
//! per group as canonical (`keep = true`). Nothing is removed; suppressed
//! records stay in the list with `keep = false` so later runs can re-score.
//!
//! **Grouping** (union of all three):
//! 1. Byte-identical `name`
//! 2. Equal normalized name (see [`crate::names::normalize_name`])
//! 3. Curated alias tables for the main cast ("Bones" joins "Leonard McCoy")
//!
//! **Selection:** strictly highest completeness score wins; ties go to the
//! record seen first. Singletons always keep. The pass needs the whole list
//! in memory and is deterministic, so running it on its own output changes
//! nothing.

use crate::names::{important_group_key, normalize_name};
use crate::validators::CompletenessScorer;
use std::collections::HashMap;
use trekdb_common::models::CharacterRecord;

/// Outcome summary for logging
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DedupReport {
    /// Records examined
    pub records: usize,
    /// Identity groups with more than one member
    pub duplicate_groups: usize,
    /// Records marked `keep = false`
    pub suppressed: usize,
}

/// Minimal union-find over record indices
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Union keeping the smaller index as root, so roots are first-seen members
    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            let (low, high) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[high] = low;
        }
    }
}

/// Character Deduplicator
#[derive(Debug, Clone, Default)]
pub struct CharacterDeduplicator {
    scorer: CompletenessScorer,
}

impl CharacterDeduplicator {
    pub fn new(scorer: CompletenessScorer) -> Self {
        Self { scorer }
    }

    /// Identity groups as lists of indices, each in encounter order
    ///
    /// Groups are ordered by their first member.
    pub fn identity_groups(&self, records: &[CharacterRecord]) -> Vec<Vec<usize>> {
        let mut set = DisjointSet::new(records.len());
        let mut first_by_name: HashMap<&str, usize> = HashMap::new();
        let mut first_by_normalized: HashMap<String, usize> = HashMap::new();
        let mut first_by_curated: HashMap<&'static str, usize> = HashMap::new();

        for (index, record) in records.iter().enumerate() {
            let first = *first_by_name.entry(record.name.as_str()).or_insert(index);
            set.union(first, index);

            let normalized = normalize_name(&record.name);
            if normalized.is_empty() {
                continue;
            }

            if let Some(key) = important_group_key(&normalized) {
                let first = *first_by_curated.entry(key).or_insert(index);
                set.union(first, index);
            }

            let first = *first_by_normalized.entry(normalized).or_insert(index);
            set.union(first, index);
        }

        let mut groups: Vec<Vec<usize>> = Vec::new();
        let mut group_of_root: HashMap<usize, usize> = HashMap::new();
        for index in 0..records.len() {
            let root = set.find(index);
            match group_of_root.get(&root) {
                Some(&group) => groups[group].push(index),
                None => {
                    group_of_root.insert(root, groups.len());
                    groups.push(vec![index]);
                }
            }
        }
        groups
    }

    /// Set `keep` (and the curated `important` flag) on every record
    pub fn resolve_duplicates(&self, records: &mut [CharacterRecord]) -> DedupReport {
        for record in records.iter_mut() {
            if important_group_key(&normalize_name(&record.name)).is_some() {
                record.important = true;
            }
        }

        let groups = self.identity_groups(records);
        let mut report = DedupReport {
            records: records.len(),
            ..DedupReport::default()
        };

        for group in groups {
            if group.len() == 1 {
                records[group[0]].keep = true;
                continue;
            }

            report.duplicate_groups += 1;

            let mut winner = group[0];
            let mut best = self.scorer.score(&records[winner]);
            for &index in &group[1..] {
                let score = self.scorer.score(&records[index]);
                if score > best {
                    best = score;
                    winner = index;
                }
            }

            for &index in &group {
                let keep = index == winner;
                records[index].keep = keep;
                if !keep {
                    report.suppressed += 1;
                }
            }

            tracing::debug!(
                name = %records[winner].name,
                uid = %records[winner].uid,
                members = group.len(),
                score = best,
                "Resolved identity group"
            );
        }

        tracing::info!(
            records = report.records,
            duplicate_groups = report.duplicate_groups,
            suppressed = report.suppressed,
            "Deduplication complete"
        );

        report
    }
}

/// Run the pass with default weights and return the updated list
pub fn resolve_duplicates(mut records: Vec<CharacterRecord>) -> Vec<CharacterRecord> {
    CharacterDeduplicator::default().resolve_duplicates(&mut records);
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(uid: &str, name: &str) -> CharacterRecord {
        CharacterRecord::new(uid, name)
    }

    fn keep_of(records: &[CharacterRecord], uid: &str) -> bool {
        records.iter().find(|r| r.uid == uid).unwrap().keep
    }

    #[test]
    fn test_more_complete_spock_wins() {
        let a = record("A", "Spock");
        let mut b = record("B", "Spock");
        b.wiki_image = Some("/x.jpg".to_string());
        b.gender = Some("Male".to_string());

        let out = resolve_duplicates(vec![a, b]);
        assert!(!keep_of(&out, "A"));
        assert!(keep_of(&out, "B"));
    }

    #[test]
    fn test_tie_goes_to_first_seen() {
        let out = resolve_duplicates(vec![record("A", "Morn"), record("B", "Morn")]);
        assert!(keep_of(&out, "A"));
        assert!(!keep_of(&out, "B"));
    }

    #[test]
    fn test_singletons_always_keep() {
        let mut lonely = record("A", "Garak");
        lonely.keep = false;
        let out = resolve_duplicates(vec![lonely, record("B", "Nog")]);
        assert!(out.iter().all(|r| r.keep));
    }

    #[test]
    fn test_normalized_names_group() {
        let mut full = record("A", "Captain James T. Kirk");
        full.gender = Some("M".to_string());
        let out = resolve_duplicates(vec![record("B", "James Kirk"), full]);
        assert!(!keep_of(&out, "B"));
        assert!(keep_of(&out, "A"));
    }

    #[test]
    fn test_curated_alias_union() {
        let mut mccoy = record("A", "Leonard McCoy");
        mccoy.gender = Some("M".to_string());
        let bones = record("B", "Bones");

        let dedup = CharacterDeduplicator::default();
        let records = vec![bones, mccoy];
        let groups = dedup.identity_groups(&records);
        assert_eq!(groups, vec![vec![0, 1]]);

        let out = resolve_duplicates(records);
        assert!(keep_of(&out, "A"));
        assert!(!keep_of(&out, "B"));
        assert!(out.iter().all(|r| r.important));
    }

    #[test]
    fn test_thomas_riker_is_not_will_riker() {
        let records = vec![
            record("W", "William T. Riker"),
            record("T", "Thomas Riker"),
            record("N", "Number One"),
        ];

        let groups = CharacterDeduplicator::default().identity_groups(&records);
        assert_eq!(groups, vec![vec![0], vec![1], vec![2]]);

        let out = resolve_duplicates(records);
        assert!(out.iter().all(|r| r.keep));
    }

    #[test]
    fn test_exactly_one_keep_per_group() {
        let mut records = vec![
            record("1", "Worf"),
            record("2", "Lieutenant Worf"),
            record("3", "Quark"),
            record("4", "Worf"),
            record("5", "Rom"),
        ];
        records[3].height = Some(195);

        let dedup = CharacterDeduplicator::default();
        let report = dedup.resolve_duplicates(&mut records);
        assert_eq!(report.duplicate_groups, 1);
        assert_eq!(report.suppressed, 2);

        for group in dedup.identity_groups(&records) {
            let kept = group.iter().filter(|&&i| records[i].keep).count();
            assert_eq!(kept, 1, "group {:?}", group);
        }
        assert!(keep_of(&records, "4"));
    }

    #[test]
    fn test_second_pass_is_stable() {
        let mut b = record("B", "Spock");
        b.wiki_image = Some("/x.jpg".to_string());
        let records = vec![
            record("A", "Spock"),
            b,
            record("C", "Mr. Spock"),
            record("D", "Tuvok"),
        ];

        let first = resolve_duplicates(records);
        let second = resolve_duplicates(first.clone());
        let flags = |rs: &[CharacterRecord]| rs.iter().map(|r| r.keep).collect::<Vec<_>>();
        assert_eq!(flags(&first), flags(&second));
    }

    #[test]
    fn test_empty_input() {
        let mut records: Vec<CharacterRecord> = Vec::new();
        let report = CharacterDeduplicator::default().resolve_duplicates(&mut records);
        assert_eq!(report, DedupReport::default());
    }
}
