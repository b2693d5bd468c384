//! Tag co-occurrence analysis.
//!
//! # Invariants
//! - Archived notes never contribute to a cluster.
//! - Cluster order, note-id order and related-tag tie order all follow first
//!   appearance in the input, so identical input yields identical output.
//! - `common_notes` is the raw shared-note count. The normalized ratio lives
//!   in `tag_similarity` and does not feed graph output.

use crate::model::graph::{RelatedTag, TagCluster};
use crate::model::note::{Note, NoteId};
use std::collections::{HashMap, HashSet};

/// Insertion-ordered mapping from tag to the ids of notes carrying it.
#[derive(Debug, Default)]
struct TagIndex {
    entries: Vec<(String, Vec<NoteId>)>,
    positions: HashMap<String, usize>,
}

impl TagIndex {
    fn build(notes: &[Note]) -> Self {
        let mut index = Self::default();
        for note in notes.iter().filter(|note| !note.is_archived) {
            for tag in &note.tags {
                index.push(tag, note.id);
            }
        }
        index
    }

    fn push(&mut self, tag: &str, note_id: NoteId) {
        let position = match self.positions.get(tag) {
            Some(position) => *position,
            None => {
                self.entries.push((tag.to_string(), Vec::new()));
                self.positions.insert(tag.to_string(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        let ids = &mut self.entries[position].1;
        // Notes are visited one at a time, so a repeat within one note's tag
        // list can only be the last element.
        if ids.last() != Some(&note_id) {
            ids.push(note_id);
        }
    }
}

/// Groups non-archived notes by tag and ranks each tag's related tags.
///
/// Clusters are sorted by note count, largest first; equal counts keep first
/// appearance order.
pub fn analyze_tag_clusters(notes: &[Note]) -> Vec<TagCluster> {
    let index = TagIndex::build(notes);
    let id_sets: Vec<HashSet<NoteId>> = index
        .entries
        .iter()
        .map(|(_, ids)| ids.iter().copied().collect())
        .collect();

    let mut clusters: Vec<TagCluster> = index
        .entries
        .iter()
        .enumerate()
        .map(|(position, (tag, ids))| {
            let mut related_tags: Vec<RelatedTag> = index
                .entries
                .iter()
                .enumerate()
                .filter(|(other, _)| *other != position)
                .filter_map(|(other, (other_tag, _))| {
                    let common_notes = ids
                        .iter()
                        .filter(|id| id_sets[other].contains(*id))
                        .count();
                    (common_notes > 0).then(|| RelatedTag {
                        tag: other_tag.clone(),
                        common_notes,
                    })
                })
                .collect();
            related_tags.sort_by(|a, b| b.common_notes.cmp(&a.common_notes));

            TagCluster {
                tag: tag.clone(),
                note_ids: ids.clone(),
                related_tags,
            }
        })
        .collect();

    clusters.sort_by(|a, b| b.note_ids.len().cmp(&a.note_ids.len()));
    clusters
}

/// Raw number of ids present in both sequences.
pub fn common_note_count(a: &[NoteId], b: &[NoteId]) -> usize {
    let other: HashSet<&NoteId> = b.iter().collect();
    a.iter().filter(|id| other.contains(id)).count()
}

/// Jaccard ratio `|a ∩ b| / |a ∪ b|` of two note-id sets.
///
/// Returns `0.0` when both are empty. Not used by mind map generation.
pub fn tag_similarity(a: &[NoteId], b: &[NoteId]) -> f64 {
    let left: HashSet<&NoteId> = a.iter().collect();
    let right: HashSet<&NoteId> = b.iter().collect();
    let union = left.union(&right).count();
    if union == 0 {
        return 0.0;
    }
    left.intersection(&right).count() as f64 / union as f64
}

/// Non-archived notes carrying `tag`, in input order.
pub fn notes_for_tag<'a>(notes: &'a [Note], tag: &str) -> Vec<&'a Note> {
    notes
        .iter()
        .filter(|note| !note.is_archived && note.has_tag(tag))
        .collect()
}

/// Sorted, de-duplicated tags across non-archived notes.
pub fn all_tags(notes: &[Note]) -> Vec<String> {
    let mut tags: Vec<String> = notes
        .iter()
        .filter(|note| !note.is_archived)
        .flat_map(|note| note.tags.iter().cloned())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    tags.sort();
    tags
}
