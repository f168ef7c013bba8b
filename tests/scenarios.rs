use std::cell::Cell;
use std::cmp::Ordering;
use std::fmt::Write;

use avlt::{InsertError, Tree};

#[derive(Debug, PartialEq)]
struct Word {
    word: String,
    freq: usize,
}

impl Word {
    fn new(word: &str) -> Self {
        Self {
            word: word.to_string(),
            freq: 1,
        }
    }
}

fn compare_by_word(lhs: &Word, rhs: &Word) -> Ordering {
    lhs.word.cmp(&rhs.word)
}

fn increase_freq(word: &mut Word) {
    word.freq += 1;
}

fn word_tree(words: &[&str]) -> Tree<Word, fn(&Word, &Word) -> Ordering> {
    let mut tree = Tree::with_comparator(compare_by_word as fn(&Word, &Word) -> Ordering);
    for word in words {
        let _ = tree.insert_with(Word::new(word), increase_freq);
    }
    tree
}

fn shape<C>(tree: &Tree<Word, C>) -> String {
    let mut out = String::new();
    tree.pretty_print(&mut out, |out, word| out.write_str(&word.word)).unwrap();
    out
}

#[test]
fn ascending_inserts_rotate_left_once() {
    let tree = word_tree(&["a", "b", "c"]);
    assert_eq!(tree.len(), 3);
    assert_eq!(tree.height(), 1);
    assert_eq!(shape(&tree), "\tc\nb\n\ta\n");
}

#[test]
fn left_right_inserts_rotate_twice() {
    let tree = word_tree(&["c", "a", "b"]);
    assert_eq!(tree.height(), 1);
    assert_eq!(shape(&tree), "\tc\nb\n\ta\n");
}

#[test]
fn duplicate_word_bumps_frequency() {
    let mut tree = word_tree(&["apple"]);
    let hook_calls = Cell::new(0);
    let result = tree.insert_with(Word::new("apple"), |existing| {
        hook_calls.set(hook_calls.get() + 1);
        increase_freq(existing);
    });

    // Rejected payload comes back untouched
    match result {
        Err(InsertError::Duplicate(rejected)) => assert_eq!(rejected, Word::new("apple")),
        other => panic!("expected duplicate, got {:?}", other),
    }
    assert_eq!(hook_calls.get(), 1);
    assert_eq!(tree.len(), 1);
    assert_eq!(tree.get(&Word::new("apple")).map(|w| w.freq), Some(2));
}

#[test]
fn thousand_ascending_inserts_stay_shallow() {
    let mut tree = Tree::new();
    for value in 1..=1000 {
        tree.insert(value).unwrap();
    }
    assert_eq!(tree.len(), 1000);
    assert!(tree.height() <= 15);
    assert!(tree.iter().copied().eq(1..=1000));
}

#[test]
fn removing_root_of_three_leaves_two() {
    let mut tree = word_tree(&["a", "b", "c"]);
    let removed = tree.remove(&Word::new("b"));
    assert_eq!(removed, Some(Word::new("b")));
    assert_eq!(tree.len(), 2);
    assert_eq!(tree.height(), 1);
    assert_eq!(shape(&tree), "c\n\ta\n");
    assert!(tree.get(&Word::new("b")).is_none());
}

#[test]
fn remove_missing_word_leaves_tree_unchanged() {
    let mut empty = word_tree(&[]);
    assert!(empty.remove(&Word::new("a")).is_none());
    assert_eq!(empty.len(), 0);

    let mut tree = word_tree(&["d", "b", "f", "a"]);
    let before = shape(&tree);
    assert!(tree.remove(&Word::new("e")).is_none());
    assert_eq!(tree.len(), 4);
    assert_eq!(shape(&tree), before);
}

#[test]
fn search_after_insert_and_remove() {
    let text = "it was the best of times it was the worst of times";
    let mut tree = word_tree(&text.split_whitespace().collect::<Vec<_>>());
    assert_eq!(tree.len(), 7);

    let times = tree.get(&Word::new("times")).unwrap();
    assert_eq!(times.freq, 2);

    let worst = tree.remove(&Word::new("worst")).unwrap();
    assert_eq!(worst, Word::new("worst"));
    assert!(tree.get(&Word::new("worst")).is_none());
    assert_eq!(tree.len(), 6);
}

#[test]
fn traversals_are_sorted_and_mirrored() {
    let tree = word_tree(&["kiwi", "fig", "pear", "apple", "lime", "date", "plum"]);

    let mut ascending = Vec::new();
    tree.traverse_ascending(|word| ascending.push(word.word.clone()));
    let mut descending = Vec::new();
    tree.traverse_descending(|word| descending.push(word.word.clone()));

    assert_eq!(ascending.len(), tree.len());
    assert!(ascending.windows(2).all(|pair| pair[0] < pair[1]));
    descending.reverse();
    assert_eq!(ascending, descending);
}

#[test]
fn destroy_releases_every_word_once() {
    let words = ["to", "be", "or", "not", "to", "be", "that", "is", "the", "question"];
    let tree = word_tree(&words);
    let count = tree.len();

    let mut released = Vec::new();
    tree.destroy(|word| released.push(word));
    assert_eq!(released.len(), count);

    released.sort_by(compare_by_word);
    released.dedup_by(|a, b| a.word == b.word);
    assert_eq!(released.len(), count);
    let total: usize = released.iter().map(|word| word.freq).sum();
    assert_eq!(total, words.len());
}

#[test]
fn drop_releases_every_payload() {
    use std::rc::Rc;

    let token = Rc::new(());
    {
        let mut tree = Tree::with_comparator(|a: &(u32, Rc<()>), b: &(u32, Rc<()>)| a.0.cmp(&b.0));
        for key in 0..100 {
            tree.insert((key, Rc::clone(&token))).unwrap();
        }
        // Duplicates handed back, not stored
        let rejected = tree.insert((7, Rc::clone(&token))).unwrap_err().into_inner();
        assert_eq!(Rc::strong_count(&token), 102);
        drop(rejected);
        for key in 0..50 {
            tree.remove(&(key, Rc::clone(&token)));
        }
        assert_eq!(Rc::strong_count(&token), 51);
    }
    assert_eq!(Rc::strong_count(&token), 1);
}
