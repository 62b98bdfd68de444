use super::*;
use crate::document::color::Color;
use crate::document::model::OrderedLayer;

fn doc_with(n: usize) -> Document {
    let mut doc = Document::new(64, 64, Color::WHITE).unwrap();
    for i in 0..n {
        doc.layers.push(OrderedLayer::image(format!("l{i}"), format!("img{i}.png")));
    }
    doc
}

#[test]
fn empty_history_has_nothing_to_step_to() {
    let mut h = HistoryManager::with_capacity(4);
    assert!(h.is_empty());
    assert!(!h.can_undo());
    assert!(!h.can_redo());
    assert!(h.undo().unwrap().is_none());
    assert!(h.redo().unwrap().is_none());
    assert!(h.current().is_none());
}

#[test]
fn capacity_is_at_least_one() {
    assert_eq!(HistoryManager::with_capacity(0).capacity(), 1);
    assert_eq!(HistoryManager::default().capacity(), DEFAULT_HISTORY_CAPACITY);
}

#[test]
fn undo_then_redo_restores_each_state() {
    let mut h = HistoryManager::with_capacity(10);
    let states: Vec<Document> = (0..4).map(doc_with).collect();
    for d in &states {
        h.snapshot(d).unwrap();
    }
    assert_eq!(h.cursor(), 3);

    for k in (0..3).rev() {
        assert_eq!(h.undo().unwrap().as_ref(), Some(&states[k]));
    }
    assert!(h.undo().unwrap().is_none());
    assert_eq!(h.cursor(), 0);

    for k in 1..4 {
        assert_eq!(h.redo().unwrap().as_ref(), Some(&states[k]));
    }
    assert!(h.redo().unwrap().is_none());
}

#[test]
fn snapshot_after_undo_prunes_the_redo_branch() {
    let mut h = HistoryManager::with_capacity(10);
    for n in 0..3 {
        h.snapshot(&doc_with(n)).unwrap();
    }
    h.undo().unwrap();
    h.undo().unwrap();
    h.snapshot(&doc_with(7)).unwrap();

    assert_eq!(h.len(), 2);
    assert_eq!(h.cursor(), 1);
    assert!(!h.can_redo());
    assert!(h.redo().unwrap().is_none());
    assert_eq!(h.undo().unwrap(), Some(doc_with(0)));
}

#[test]
fn overflow_evicts_the_oldest_snapshot() {
    let mut h = HistoryManager::with_capacity(3);
    for n in 0..5 {
        h.snapshot(&doc_with(n)).unwrap();
    }
    assert_eq!(h.len(), 3);
    assert_eq!(h.cursor(), 2);
    let seqs: Vec<u64> = h.snapshots().map(HistorySnapshot::seq).collect();
    assert_eq!(seqs, vec![2, 3, 4]);

    assert_eq!(h.undo().unwrap(), Some(doc_with(3)));
    assert_eq!(h.undo().unwrap(), Some(doc_with(2)));
    assert!(h.undo().unwrap().is_none());
}

#[test]
fn capacity_one_keeps_only_the_latest() {
    let mut h = HistoryManager::with_capacity(1);
    h.snapshot(&doc_with(0)).unwrap();
    h.snapshot(&doc_with(1)).unwrap();
    assert_eq!(h.len(), 1);
    assert_eq!(h.cursor(), 0);
    assert!(!h.can_undo());
    let current = h.current().unwrap();
    assert_eq!(Document::from_json(current.json()).unwrap(), doc_with(1));
}

#[test]
fn unreadable_snapshot_is_a_serde_error_and_keeps_the_cursor() {
    let mut h = HistoryManager::with_capacity(5);
    h.snapshot(&doc_with(0)).unwrap();
    h.snapshot(&doc_with(1)).unwrap();
    h.snapshots[0].json = "{not json".to_owned();

    let err = h.undo().unwrap_err();
    assert!(matches!(err, CoverError::Serde(_)));
    assert_eq!(h.cursor(), 1);
    assert!(h.can_undo());
}

#[test]
fn clear_resets_but_sequence_keeps_growing() {
    let mut h = HistoryManager::with_capacity(5);
    h.snapshot(&doc_with(0)).unwrap();
    h.snapshot(&doc_with(1)).unwrap();
    h.clear();
    assert!(h.is_empty());
    assert_eq!(h.cursor(), 0);
    h.snapshot(&doc_with(2)).unwrap();
    assert_eq!(h.current().map(HistorySnapshot::seq), Some(2));
}
