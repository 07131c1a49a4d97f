#![cfg(feature = "memory-store")]

use futures::executor::block_on;
use rs_orgtree::provision::{ensure_node, ensure_user};
use rs_orgtree::{
    DirectoryBuilder, Email, Identity, ListQuery, MemoryStore, Node, NodeKind, Role, UserDraft,
    UserId,
};
use std::hint::black_box;
use std::sync::Arc;
use std::time::Instant;

const REPEATS: usize = 5;

fn benchmark_sync<F>(name: &str, iterations: usize, mut op: F)
where
    F: FnMut(),
{
    let mut samples = Vec::with_capacity(REPEATS);

    for _ in 0..REPEATS {
        let start = Instant::now();
        for _ in 0..iterations {
            op();
        }
        samples.push(start.elapsed());
    }

    samples.sort_unstable();
    let median = samples[REPEATS / 2];
    let total_ms = median.as_secs_f64() * 1_000.0;
    let ns_per_op = median.as_secs_f64() * 1_000_000_000.0 / iterations as f64;
    let ops_per_sec = iterations as f64 / median.as_secs_f64();

    println!(
        "{name}: median={total_ms:.3} ms, ns/op={ns_per_op:.1}, ops/s={ops_per_sec:.0} (iters={iterations}, repeats={REPEATS})"
    );
}

fn benchmark_parallel<F>(name: &str, threads: usize, iterations_per_thread: usize, op_factory: F)
where
    F: Fn() -> Box<dyn FnMut() + Send> + Send + Sync + 'static,
{
    let op_factory = Arc::new(op_factory);
    let mut samples = Vec::with_capacity(REPEATS);

    for _ in 0..REPEATS {
        let start = Instant::now();
        let mut joins = Vec::with_capacity(threads);
        for _ in 0..threads {
            let factory = Arc::clone(&op_factory);
            joins.push(std::thread::spawn(move || {
                let mut op = factory();
                for _ in 0..iterations_per_thread {
                    op();
                }
            }));
        }
        for join in joins {
            join.join().expect("thread panicked");
        }
        samples.push(start.elapsed());
    }

    samples.sort_unstable();
    let median = samples[REPEATS / 2];
    let total_ops = threads * iterations_per_thread;
    let total_ms = median.as_secs_f64() * 1_000.0;
    let ns_per_op = median.as_secs_f64() * 1_000_000_000.0 / total_ops as f64;
    let ops_per_sec = total_ops as f64 / median.as_secs_f64();

    println!(
        "{name}: median={total_ms:.3} ms, ns/op={ns_per_op:.1}, ops/s={ops_per_sec:.0} (threads={threads}, total_ops={total_ops}, repeats={REPEATS})"
    );
}

// Chain of offices `depth` deep with `width` stores hanging off each office.
fn setup_comb_store(depth: usize, width: usize) -> (MemoryStore, Vec<Node>) {
    let store = MemoryStore::new();
    let mut spine = Vec::with_capacity(depth + 1);
    let mut current = block_on(ensure_node(&store, "office_0", NodeKind::Office, None)).unwrap();
    spine.push(current.clone());

    for d in 1..=depth {
        for w in 0..width {
            let name = format!("store_{d}_{w}");
            let shop = block_on(ensure_node(&store, &name, NodeKind::Store, Some(&current))).unwrap();
            block_on(ensure_user(
                &store,
                UserDraft {
                    name: name.clone(),
                    email: Email::new(format!("{name}@perf.rs")).unwrap(),
                    role: Role::Employee,
                    credential_hash: "hash".to_string(),
                    node_id: shop.id,
                },
            ))
            .unwrap();
        }
        current = block_on(ensure_node(
            &store,
            &format!("office_{d}"),
            NodeKind::Office,
            Some(&current),
        ))
        .unwrap();
        spine.push(current.clone());
    }

    (store, spine)
}

fn identity_at(node: &Node) -> Identity {
    Identity::new(
        UserId::try_from("perf_caller").unwrap(),
        Role::Manager,
        node.id.clone(),
    )
}

#[test]
#[ignore = "manual performance test; run with --ignored --nocapture"]
fn perf_authenticate_and_list() {
    let iterations = 20_000;

    let (store, spine) = setup_comb_store(8, 16);
    let directory = DirectoryBuilder::new(store).build();
    let root = identity_at(&spine[0]);
    let leaf = identity_at(&spine[spine.len() - 1]);

    benchmark_sync("authenticate_root", iterations, || {
        let ctx = block_on(directory.authenticate(root.clone())).unwrap();
        black_box(ctx);
    });
    benchmark_sync("authenticate_leaf", iterations, || {
        let ctx = block_on(directory.authenticate(leaf.clone())).unwrap();
        black_box(ctx);
    });

    let ctx = block_on(directory.authenticate(root.clone())).unwrap();
    let all = block_on(directory.list_users(
        &ctx,
        ListQuery::new(Role::Employee).include_descendants(true),
    ))
    .unwrap();
    assert_eq!(all.len(), 8 * 16);
    benchmark_sync("list_whole_tree", iterations / 4, || {
        let users = block_on(directory.list_users(
            &ctx,
            ListQuery::new(Role::Employee).include_descendants(true),
        ))
        .unwrap();
        black_box(users);
    });

    let threads = std::thread::available_parallelism()
        .map(|n| n.get().min(8))
        .unwrap_or(4);
    let directory = Arc::new(directory);
    let directory_for_parallel = Arc::clone(&directory);
    benchmark_parallel(
        "authenticate_and_list_parallel",
        threads,
        iterations / 4,
        move || {
            let directory = Arc::clone(&directory_for_parallel);
            let identity = root.clone();
            Box::new(move || {
                let ctx = block_on(directory.authenticate(identity.clone())).unwrap();
                let users = block_on(directory.list_users(&ctx, ListQuery::new(Role::Employee)))
                    .unwrap();
                black_box(users);
            })
        },
    );
}
