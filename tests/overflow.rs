use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;
use std::fmt::Write;
use std::ptr;

use avlt::{InsertError, Tree};

// Allocation fails on the current thread while set; other test threads are unaffected
thread_local! {
    static OUT_OF_MEMORY: Cell<bool> = const { Cell::new(false) };
}

struct FailingAlloc;

unsafe impl GlobalAlloc for FailingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if OUT_OF_MEMORY.try_with(Cell::get).unwrap_or(false) {
            return ptr::null_mut();
        }
        System.alloc(layout)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout)
    }
}

#[global_allocator]
static GLOBAL: FailingAlloc = FailingAlloc;

fn out_of_memory<R>(f: impl FnOnce() -> R) -> R {
    OUT_OF_MEMORY.with(|flag| flag.set(true));
    let result = f();
    OUT_OF_MEMORY.with(|flag| flag.set(false));
    result
}

fn shape(tree: &Tree<String>) -> String {
    let mut out = String::new();
    tree.pretty_print(&mut out, |out, word| out.write_str(word)).unwrap();
    out
}

fn check(tree: &Tree<String>) {
    #[cfg(feature = "consistency_check")]
    tree.check_consistency();
    assert!(tree.iter().zip(tree.iter().skip(1)).all(|(a, b)| a < b));
}

#[test]
fn insert_into_empty_tree_without_memory() {
    let mut tree = Tree::new();
    let word = String::from("apple");

    let result = out_of_memory(|| tree.insert(word));

    assert!(matches!(result, Err(InsertError::Overflow(_))));
    assert_eq!(result.unwrap_err().into_inner(), "apple");
    assert!(tree.is_empty());
    assert_eq!(tree.len(), 0);
    assert_eq!(tree.height(), -1);
    check(&tree);
}

#[test]
fn insert_without_memory_leaves_tree_unchanged() {
    let mut tree = Tree::new();
    for word in ["d", "b", "f", "a", "c", "e", "g", "h"] {
        tree.insert(String::from(word)).unwrap();
    }
    let len = tree.len();
    let height = tree.height();
    let before = shape(&tree);

    // Would rebalance below "g" if it were inserted
    let words = [String::from("i"), String::from("bb"), String::from("0")];
    for word in words {
        let expected = word.clone();
        let result = out_of_memory(|| tree.insert(word));
        match result {
            Err(InsertError::Overflow(rejected)) => assert_eq!(rejected, expected),
            other => panic!("expected overflow, got {:?}", other),
        }
        assert_eq!(tree.len(), len);
        assert_eq!(tree.height(), height);
        assert_eq!(shape(&tree), before);
        check(&tree);
    }

    // Duplicates need no node, so they are still detected
    let duplicate = String::from("c");
    let mut hook_calls = 0;
    let result = out_of_memory(|| tree.insert_with(duplicate, |_| hook_calls += 1));
    assert!(result.unwrap_err().is_duplicate());
    assert_eq!(hook_calls, 1);

    // Memory is back
    tree.insert(String::from("i")).unwrap();
    assert_eq!(tree.len(), len + 1);
    check(&tree);
}

#[test]
fn extend_stops_at_first_overflow() {
    let mut tree: Tree<String> = ["m", "k"].into_iter().map(String::from).collect();
    let mut words = vec![String::from("x"), String::from("y"), String::from("z")].into_iter();

    out_of_memory(|| tree.extend(words.by_ref()));

    assert_eq!(tree.len(), 2);
    assert_eq!(shape(&tree), "m\n\tk\n");
    // First word was rejected and dropped, the rest is left unconsumed
    assert_eq!(words.len(), 2);
    check(&tree);
}
