//! Ids command: print identifiers

use rltp::{ids, Context, DebugFlags};

/// Print `count` fresh identifiers, or the one derived from `hash`
pub fn handle(count: usize, hash: Option<&str>, seed: Option<u64>) {
    if let Some(text) = hash {
        println!("{}", ids::sha24(text));
        return;
    }

    let mut ctx = Context::new(DebugFlags::default(), seed);
    for _ in 0..count {
        println!("{}", ids::generate(&mut ctx.rng));
    }
}
