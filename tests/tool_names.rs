use std::collections::HashSet;

use chatwire::protocol::tool_names::{
    build_short_name_map, reverse_map, shorten_name_if_needed, TOOL_NAME_LIMIT,
};

fn name_lists() -> Vec<Vec<String>> {
    let long_plain = "t".repeat(100);
    let long_mcp = |server: &str| format!("mcp__{server}__{}", "segment_".repeat(10));
    vec![
        vec![],
        vec!["read".to_string()],
        vec![long_plain.clone(), long_plain.clone(), long_plain.clone()],
        (0..25).map(|i| format!("{}{i}", "p".repeat(70))).collect(),
        (0..12).map(|i| long_mcp(&format!("srv{i}"))).collect(),
        vec![
            long_mcp("a"),
            shorten_name_if_needed(&long_mcp("a")),
            format!("{}~1", &shorten_name_if_needed(&long_mcp("a"))[..TOOL_NAME_LIMIT - 2]),
            "short".to_string(),
        ],
        vec!["é".repeat(40), "é".repeat(41), "é".repeat(50)],
    ]
}

#[test]
fn short_names_are_distinct_and_bounded() {
    for names in name_lists() {
        let map = build_short_name_map(&names);
        let distinct_inputs: HashSet<&String> = names.iter().collect();
        assert_eq!(map.len(), distinct_inputs.len());

        let values: HashSet<&String> = map.values().collect();
        assert_eq!(values.len(), map.len(), "collision in {names:?}");
        for short in map.values() {
            assert!(short.len() <= TOOL_NAME_LIMIT, "{short} exceeds limit");
        }
        for name in &names {
            assert!(map.contains_key(name));
        }
    }
}

#[test]
fn map_is_deterministic() {
    for names in name_lists() {
        assert_eq!(build_short_name_map(&names), build_short_name_map(&names));
    }
}

#[test]
fn shorten_is_idempotent() {
    for names in name_lists() {
        for name in names {
            let once = shorten_name_if_needed(&name);
            assert_eq!(shorten_name_if_needed(&once), once);
        }
    }
}

#[test]
fn mcp_names_keep_last_segment() {
    let name = "mcp__server__really_long_tool_name_that_exceeds_the_limit_of_sixty_four_characters";
    assert!(name.len() > TOOL_NAME_LIMIT);
    let expected = "mcp__really_long_tool_name_that_exceeds_the_limit_of_sixty_four_characters";
    assert_eq!(shorten_name_if_needed(name), &expected[..TOOL_NAME_LIMIT]);
}

#[test]
fn reverse_map_inverts_forward_map() {
    for names in name_lists() {
        let forward = build_short_name_map(&names);
        let reverse = reverse_map(&forward);
        for (original, short) in &forward {
            assert_eq!(reverse.get(short), Some(original));
        }
    }
}
