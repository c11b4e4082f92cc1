use std::collections::HashMap;

use balancer::{new_balancer, Balancer, Error, Family, Items, Mode};
use rstest::rstest;
use strum::IntoEnumIterator;

fn ordered() -> Items {
    Items::from(vec!["A", "B", "C", "D"])
}

fn weighted() -> Items {
    Items::from([("A", 5), ("B", 1), ("C", 4), ("D", 0)])
}

fn seeded(mode: Mode) -> Box<dyn Balancer> {
    let items = match mode.family() {
        Family::Ordered => ordered(),
        Family::Weighted => weighted(),
    };
    new_balancer(mode, Some(items)).unwrap()
}

#[rstest]
#[case(Mode::WeightedRoundRobin)]
#[case(Mode::SmoothWeightedRoundRobin)]
#[case(Mode::WeightedRandom)]
#[case(Mode::ConsistentHash)]
#[case(Mode::RoundRobin)]
#[case(Mode::Random)]
fn update_then_all_round_trips(#[case] mode: Mode) {
    let balancer = seeded(mode);
    let expected = match mode.family() {
        Family::Ordered => ordered(),
        Family::Weighted => weighted(),
    };
    assert_eq!(balancer.all(), expected);
}

#[rstest]
#[case(Mode::WeightedRoundRobin)]
#[case(Mode::SmoothWeightedRoundRobin)]
#[case(Mode::WeightedRandom)]
#[case(Mode::ConsistentHash)]
#[case(Mode::RoundRobin)]
#[case(Mode::Random)]
fn wrong_shape_is_rejected_and_state_kept(#[case] mode: Mode) {
    let balancer = seeded(mode);
    let before = balancer.all();
    let wrong = match mode.family() {
        Family::Ordered => weighted(),
        Family::Weighted => ordered(),
    };

    let err = balancer.update(wrong).unwrap_err();
    assert!(matches!(err, Error::ShapeMismatch { strategy, .. } if strategy == mode));
    assert_eq!(balancer.all(), before);
}

#[test]
fn zero_weight_is_never_selected_by_weighted_modes() {
    for mode in Mode::iter().filter(|m| m.family() == Family::Weighted) {
        let balancer = seeded(mode);
        for _ in 0..1_000 {
            assert_ne!(balancer.select(&[]).as_deref(), Some("D"), "{mode}");
        }
    }
}

#[test]
fn remove_all_empties_every_mode() {
    for mode in Mode::iter() {
        let balancer = seeded(mode);
        balancer.remove_all();
        assert!(balancer.all().is_empty(), "{mode}");
        assert_eq!(balancer.select(&["key"]), None, "{mode}");
    }
}

#[test]
fn removed_items_are_never_selected() {
    for mode in Mode::iter() {
        let balancer = seeded(mode);
        assert!(balancer.remove("A", false), "{mode}");
        for i in 0..500 {
            let key = format!("user-{i}");
            assert_ne!(balancer.select(&[key.as_str()]).as_deref(), Some("A"), "{mode}");
        }
    }
}

#[test]
fn round_robin_cycles_in_insertion_order() {
    let balancer = seeded(Mode::RoundRobin);
    let picks: Vec<String> = (0..5).filter_map(|_| balancer.select(&[])).collect();
    assert_eq!(picks, ["A", "B", "C", "D", "A"]);

    balancer.reset();
    assert_eq!(balancer.select(&[]).as_deref(), Some("A"));
}

#[test]
fn weighted_round_robin_counts_over_cycles() {
    let balancer = seeded(Mode::WeightedRoundRobin);
    let mut counts: HashMap<String, u32> = HashMap::new();
    for _ in 0..1_000 {
        *counts.entry(balancer.select(&[]).unwrap()).or_default() += 1;
    }
    assert_eq!(counts.get("A"), Some(&500));
    assert_eq!(counts.get("B"), Some(&100));
    assert_eq!(counts.get("C"), Some(&400));
    assert_eq!(counts.get("D"), None);
}

#[test]
fn parsed_items_seed_the_matching_family() {
    let weighted = Items::parse_weighted("A:5,B:1,C:4,D:0").unwrap();
    let balancer = new_balancer(Mode::SmoothWeightedRoundRobin, Some(weighted)).unwrap();
    assert_eq!(balancer.all().len(), 4);

    let balancer =
        new_balancer(Mode::ConsistentHash, Some(Items::parse_ordered("A:5,B,C"))).unwrap();
    assert_eq!(balancer.all(), Items::from(vec!["A", "B", "C"]));
}
