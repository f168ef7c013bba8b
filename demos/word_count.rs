//! Counts word frequencies of a text file (or stdin) with an AVL tree.
//!
//! Usage: cargo run --example word_count -- [FILE] [-s WORD]... [-d WORD]...

use std::cmp::Ordering;
use std::fmt::Write;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;

use clap::Parser;

use avlt::{InsertError, Tree};

/// Word frequency counter
#[derive(Parser, Debug)]
#[command(name = "word_count")]
#[command(about = "Counts word frequencies with an AVL tree")]
struct Args {
    /// Text file to read (stdin if omitted)
    file: Option<PathBuf>,

    /// Look up a word after counting
    #[arg(short = 's', long = "search", value_name = "WORD")]
    search: Vec<String>,

    /// Delete a word after counting, before printing the tree
    #[arg(short = 'd', long = "delete", value_name = "WORD")]
    delete: Vec<String>,
}

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

fn print_word(word: &Word) {
    println!("{}\t{}", word.word, word.freq);
}

fn read_input(file: Option<&PathBuf>) -> io::Result<String> {
    match file {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

fn main() {
    let args = Args::parse();

    let text = match read_input(args.file.as_ref()) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("Error: cannot read input: {}", err);
            process::exit(2);
        }
    };

    let mut tree = Tree::with_comparator(compare_by_word);
    for word in text.split_whitespace() {
        match tree.insert_with(Word::new(word), increase_freq) {
            Ok(()) | Err(InsertError::Duplicate(_)) => {}
            Err(err @ InsertError::Overflow(_)) => {
                eprintln!("Error: {}", err);
                process::exit(100);
            }
        }
    }

    if !args.search.is_empty() {
        println!("# search");
        for word in &args.search {
            match tree.get(&Word::new(word)) {
                Some(found) => print_word(found),
                None => println!("{} not found", word),
            }
        }
    }

    if !args.delete.is_empty() {
        println!("# delete");
        for word in &args.delete {
            match tree.remove(&Word::new(word)) {
                Some(removed) => println!("({}, {}) deleted", removed.word, removed.freq),
                None => println!("{} not found", word),
            }
        }
    }

    println!("# ascending");
    tree.traverse_ascending(print_word);
    println!("# descending");
    tree.traverse_descending(print_word);

    println!("# tree");
    let mut diagram = String::new();
    let printed = tree.pretty_print(&mut diagram, |out, word| out.write_str(&word.word));
    if printed.is_ok() {
        print!("{}", diagram);
    }

    println!("# count\n{}", tree.len());
    println!("# height\n{}", tree.height());

    let mut released = 0;
    tree.destroy(|_| released += 1);
    eprintln!("released {} words", released);
}
