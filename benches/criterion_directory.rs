#![cfg(all(feature = "criterion-bench", feature = "memory-store"))]

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use futures::executor::block_on;
use rs_orgtree::provision::{ensure_node, ensure_user};
use rs_orgtree::{
    Directory, DirectoryBuilder, Email, Identity, ListQuery, MemoryStore, Node, NodeKind, Role,
    UserDraft, UserId, is_allowed,
};

// Builds a tree `depth` levels below the root with `fanout` children per
// office; the last level is stores. Returns nodes in creation order.
fn setup_tree(depth: usize, fanout: usize, users_per_node: usize) -> (MemoryStore, Vec<Node>) {
    let store = MemoryStore::new();
    let root = block_on(ensure_node(&store, "root", NodeKind::Office, None)).unwrap();
    let mut nodes = vec![root.clone()];
    let mut level = vec![root];

    for d in 0..depth {
        let kind = if d + 1 == depth {
            NodeKind::Store
        } else {
            NodeKind::Office
        };
        let mut next = Vec::with_capacity(level.len() * fanout);
        for parent in &level {
            for i in 0..fanout {
                let name = format!("{}-{i}", parent.name);
                let node = block_on(ensure_node(&store, &name, kind, Some(parent))).unwrap();
                next.push(node);
            }
        }
        nodes.extend(next.iter().cloned());
        level = next;
    }

    for (n, node) in nodes.iter().enumerate() {
        for u in 0..users_per_node {
            block_on(ensure_user(
                &store,
                UserDraft {
                    name: format!("user {n}-{u}"),
                    email: Email::new(format!("u{n}.{u}@bench.rs")).unwrap(),
                    role: Role::Employee,
                    credential_hash: "hash".to_string(),
                    node_id: node.id.clone(),
                },
            ))
            .unwrap();
        }
    }

    (store, nodes)
}

fn identity_at(node: &Node) -> Identity {
    Identity::new(
        UserId::try_from("bench_caller").unwrap(),
        Role::Manager,
        node.id.clone(),
    )
}

fn bench_authenticate(c: &mut Criterion) {
    let mut group = c.benchmark_group("authenticate_tree_size");
    group.sample_size(30);
    group.throughput(Throughput::Elements(1));

    for depth in [1usize, 2, 3, 4] {
        let (store, nodes) = setup_tree(depth, 4, 0);
        let directory = DirectoryBuilder::new(store).build();
        let identity = identity_at(&nodes[0]);
        let id = BenchmarkId::from_parameter(nodes.len());
        group.bench_with_input(id, &depth, |b, _| {
            b.iter(|| {
                let ctx = block_on(directory.authenticate(identity.clone())).unwrap();
                black_box(ctx);
            });
        });
    }

    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");
    group.sample_size(30);
    group.throughput(Throughput::Elements(1));

    let (store, nodes) = setup_tree(4, 4, 0);
    let directory = DirectoryBuilder::new(store).build();
    let ctx = block_on(directory.authenticate(identity_at(&nodes[0]))).unwrap();
    let subtree = block_on(directory.resolve_scope(&nodes[1].id, true)).unwrap();
    let single = block_on(directory.resolve_scope(&nodes[nodes.len() - 1].id, false)).unwrap();

    group.bench_function("subtree_target", |b| {
        b.iter(|| black_box(is_allowed(ctx.scope(), &subtree)));
    });
    group.bench_function("single_target", |b| {
        b.iter(|| black_box(is_allowed(ctx.scope(), &single)));
    });

    group.finish();
}

fn list_from(directory: &Directory<MemoryStore>, caller: &Node, descend: bool) -> usize {
    let ctx = block_on(directory.authenticate(identity_at(caller))).unwrap();
    block_on(directory.list_users(
        &ctx,
        ListQuery::new(Role::Employee).include_descendants(descend),
    ))
    .unwrap()
    .len()
}

fn bench_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("list_users");
    group.sample_size(30);
    group.throughput(Throughput::Elements(1));

    let (store, nodes) = setup_tree(3, 4, 3);
    let directory = DirectoryBuilder::new(store).build();

    group.bench_function("own_node", |b| {
        b.iter(|| black_box(list_from(&directory, &nodes[1], false)));
    });
    group.bench_function("subtree", |b| {
        b.iter(|| black_box(list_from(&directory, &nodes[1], true)));
    });
    group.bench_function("whole_tree", |b| {
        b.iter(|| black_box(list_from(&directory, &nodes[0], true)));
    });

    group.finish();
}

criterion_group!(benches, bench_authenticate, bench_evaluate, bench_list);
criterion_main!(benches);
