use super::*;

use proptest::prelude::*;
use std::collections::{BTreeMap, HashMap, HashSet};

fn validate_tree<P: Parser, D: Dweller>(c: &Cellar<P, D>) {
    let mut seen = HashSet::new();
    let mut stack = vec![c.root()];
    while let Some(id) = stack.pop() {
        assert!(seen.insert(id), "node {id:?} reachable twice");
        let node = c.node(id).expect("reachable node must exist");
        if let Some(d) = node.dweller() {
            assert_eq!(d.node(), Some(id), "dweller must point back at its node");
        }
        for &child in node.children().values() {
            let child_node = c.node(child).expect("child must exist");
            assert_eq!(child_node.parent(), Some(id), "child parent mismatch");
            stack.push(child);
        }
    }
    assert_eq!(seen.len(), c.len(), "every node must be reachable from root");
    assert!(c.node(c.root()).unwrap().parent().is_none());
}

#[derive(Clone, Debug)]
enum Op {
    Count(Vec<String>, u64),
    Subresource(Vec<String>, String),
    Aggregate(Vec<String>, Option<Vec<String>>),
    AggregateAvoidingStart(Vec<String>),
}

fn path_strategy() -> impl Strategy<Value = Vec<String>> + Clone {
    // Small alphabet so paths share prefixes often.
    prop::collection::vec(prop::sample::select(vec!["a", "b", "c", "beer"]), 0..=4)
        .prop_map(|segs| segs.into_iter().map(str::to_owned).collect())
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let path = path_strategy();
    let op = prop_oneof![
        50 => (path.clone(), 0u64..100).prop_map(|(p, n)| Op::Count(p, n)),
        20 => (path.clone(), prop::sample::select(vec!["/x.png", "/y.css"]))
            .prop_map(|(p, s)| Op::Subresource(p, s.to_owned())),
        30 => (path.clone(), prop::option::of(path.clone()))
            .prop_map(|(p, avoid)| Op::Aggregate(p, avoid)),
        10 => path.clone().prop_map(Op::AggregateAvoidingStart),
    ];
    prop::collection::vec(op, 0..=200)
}

/// Render segments as a URL with some noise the parser must ignore.
fn to_url(path: &[String], noisy: bool) -> String {
    if noisy {
        format!("http://pub.example//{}/?q=1", path.join("//"))
    } else {
        format!("/{}", path.join("/"))
    }
}

#[derive(Default)]
struct Model {
    counts: BTreeMap<Vec<String>, u64>,
    subresources: BTreeMap<Vec<String>, HashMap<String, u64>>,
}

impl Model {
    fn total(&self, start: &[String], avoid: Option<&[String]>) -> (u64, HashMap<String, u64>) {
        if avoid == Some(start) {
            return (0, HashMap::new());
        }
        // Avoiding an ancestor of the start excludes nothing below it.
        let avoid = avoid.filter(|a| a.starts_with(start));
        let included = |path: &Vec<String>| {
            path.starts_with(start) && !avoid.is_some_and(|a| path.starts_with(a))
        };
        let count = self
            .counts
            .iter()
            .filter(|(p, _)| included(*p))
            .map(|(_, n)| *n)
            .sum::<u64>();
        let mut subs = HashMap::new();
        for (_, m) in self.subresources.iter().filter(|(p, _)| included(*p)) {
            subs = merge_counts(&subs, m);
        }
        subs.retain(|_, n| *n > 0);
        (count, subs)
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence_counts(ops in ops_strategy()) {
        let mut c = BeerCellar::default();
        let mut m = Model::default();

        for (i, op) in ops.into_iter().enumerate() {
            let noisy = i % 2 == 0;
            match op {
                Op::Count(path, n) => {
                    c.get(&to_url(&path, noisy)).unwrap().add(n);
                    *m.counts.entry(path).or_insert(0) += n;
                }
                Op::Subresource(path, sub) => {
                    c.get(&to_url(&path, noisy)).unwrap().add_subresource(sub.clone(), 1);
                    *m.subresources.entry(path).or_default().entry(sub).or_insert(0) += 1;
                }
                Op::Aggregate(path, avoid) => {
                    let avoided: HashSet<NodeId> = avoid
                        .as_ref()
                        .and_then(|a| c.find(&to_url(a, noisy)).unwrap())
                        .into_iter()
                        .collect();
                    let start = c.get(&to_url(&path, noisy)).unwrap().node();

                    // An avoided path that has no node yet excludes nothing.
                    let effective = avoid.as_deref().filter(|_| !avoided.is_empty());
                    let (count, subs) = m.total(&path, effective);

                    let got = c.get_down(start, &avoided).unwrap();
                    prop_assert_eq!(got.count, count);
                    let mut got_subs = got.subresource_counts.clone();
                    got_subs.retain(|_, n| *n > 0);
                    prop_assert_eq!(got_subs, subs);
                }
                Op::AggregateAvoidingStart(path) => {
                    // The path may have no node yet; it is created first and
                    // then avoided, so nothing below it is counted.
                    let url = to_url(&path, noisy);
                    let got = c.aggregate(&url, &[url.as_str()]).unwrap();
                    prop_assert_eq!(got.count, 0);
                    prop_assert!(got.subresource_counts.is_empty());
                    prop_assert_eq!(got.node(), None);
                    prop_assert!(c.find(&url).unwrap().is_some());
                }
            }
        }

        validate_tree(&c);
    }

    #[test]
    fn prop_barrel_aggregate_commutes(
        a in (0u64..1000, prop::collection::hash_map("[a-c]", 0u64..10, 0..4)),
        b in (0u64..1000, prop::collection::hash_map("[a-c]", 0u64..10, 0..4)),
        d in (0u64..1000, prop::collection::hash_map("[a-c]", 0u64..10, 0..4)),
    ) {
        let barrel = |(count, subresource_counts): (u64, HashMap<String, u64>)| {
            let mut b = Barrel::new(None, &());
            b.count = count;
            b.subresource_counts = subresource_counts;
            b
        };
        let (a, b, d) = (barrel(a), barrel(b), barrel(d));

        prop_assert_eq!(a.aggregate(&b), b.aggregate(&a));
        prop_assert_eq!(a.aggregate(&b).aggregate(&d), a.aggregate(&b.aggregate(&d)));
    }

    #[test]
    fn prop_same_segments_same_dweller(path in path_strategy()) {
        let mut c = BeerCellar::default();
        let clean = c.get(&to_url(&path, false)).unwrap().node();
        let len = c.len();
        let noisy = c.get(&to_url(&path, true)).unwrap().node();
        prop_assert_eq!(clean, noisy);
        prop_assert_eq!(c.len(), len);
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

#[test]
fn exhaustive_insert_order_small_set() {
    let entries: Vec<(&str, u64, &str)> = vec![
        ("/a", 3, "/logo.png"),
        ("/a/b", 5, "/logo.png"),
        ("/a/b/c", 2, "/ale.png"),
        ("/a/d", 7, "/stout.png"),
        ("/a/d/e", 1, "/logo.png"),
        ("/a/f", 4, "/ale.png"),
    ];

    let mut expected_subs: HashMap<String, u64> = HashMap::new();
    for &(_, _, sub) in &entries {
        *expected_subs.entry(sub.to_owned()).or_insert(0) += 1;
    }

    for_each_permutation(&entries, |perm| {
        let mut c = BeerCellar::default();
        for (url, n, sub) in perm {
            let barrel = c.get(url).unwrap();
            barrel.add(n);
            barrel.add_subresource(sub, 1);
        }

        validate_tree(&c);
        let total = c.aggregate("/a", &[]).unwrap();
        assert_eq!(total.count, 22);
        assert_eq!(total.subresource_counts, expected_subs);

        let pruned = c.aggregate("/a", &["/a/b", "/a/d/e"]).unwrap();
        assert_eq!(pruned.count, 14);
    });
}

#[test]
fn deep_path_aggregates() {
    const DEPTH: usize = 50_000;
    let segs = vec!["s"; DEPTH];
    let url = |depth: usize| format!("/{}", segs[..depth].join("/"));

    let mut c = BeerCellar::default();
    c.get(&url(DEPTH)).unwrap().add(2);
    c.get(&url(DEPTH / 2)).unwrap().add(3);
    c.get(&url(DEPTH / 2)).unwrap().add_subresource("/x.png", 1);
    assert_eq!(c.len(), DEPTH + 1);

    let all = c.aggregate("/", &[]).unwrap();
    assert_eq!(all.count, 5);
    assert_eq!(all.subresource("/x.png"), 1);

    let middle = url(DEPTH / 2);
    let below = url(DEPTH / 2 + 1);
    assert_eq!(c.aggregate(&middle, &[]).unwrap().count, 5);
    assert_eq!(c.aggregate("/", &[below.as_str()]).unwrap().count, 3);
    assert_eq!(c.aggregate(&below, &[]).unwrap().count, 2);

    validate_tree(&c);
}

#[test]
fn exhaustive_jump_up_matches_prefix() {
    let mut c = BeerCellar::default();
    let paths = ["/a/b/c/d", "/a/x", "/q"];
    for p in paths {
        c.get(p).unwrap();
    }

    for p in paths {
        let mut node = c.get(p).unwrap().node();
        let mut depth = split_path(p).len();
        while let Some(parent) = c.jump_up(node).unwrap() {
            node = parent.node();
            depth -= 1;
            let segs = split_path(p);
            let prefix = format!("/{}", segs[..depth].join("/"));
            assert_eq!(c.find(&prefix).unwrap(), node);
        }
        assert_eq!(depth, 0);
        assert_eq!(node, Some(c.root()));
    }
    validate_tree(&c);
}
