use std::collections::hash_map::RandomState;

use cellar_hash::HashSet;
use clap::Parser;

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'c', long = "target_capacity", default_value_t = 1000)]
    target_capacity: usize,

    /// Remove every n-th value after filling, to leave tombstones behind.
    #[arg(short = 'r', long = "remove_every", default_value_t = 0)]
    remove_every: usize,

    /// Print the slot-by-slot dump after the statistics.
    #[arg(short = 'd', long = "dump")]
    dump: bool,
}

fn main() {
    let args = Args::parse();

    println!(
        "Creating HashSet with target capacity: {}",
        args.target_capacity
    );

    let mut set: HashSet<u64, RandomState> =
        HashSet::with_capacity_and_hasher(args.target_capacity, RandomState::new());

    println!(
        "Actual capacity: {} ({} primary + {} cellar slots)",
        set.capacity(),
        set.primary_capacity(),
        set.cellar_capacity()
    );
    println!("Filling set with u64 values...");

    let num_values = set.capacity() as u64;
    set.extend(0..num_values);

    println!("Inserted {} values into set", set.len());

    if args.remove_every > 0 {
        let removed = (0..num_values)
            .step_by(args.remove_every)
            .filter(|value| set.remove(value))
            .count();
        println!("Removed {} values", removed);
    }

    println!(
        "Final load factor: {:.2}%",
        (set.len() as f64 / set.primary_capacity() as f64) * 100.0
    );

    set.probe_histogram().print();
    set.debug_stats().print();

    if args.dump {
        print!("{}", set.dump());
    }
}
