// Shared fixtures for unit tests
use crate::cache::{CacheSnapshot, DetailRecord};
use crate::pokeapi::CatalogEntry;
use serde_json::json;

/// Detail response body shaped like PokeAPI's `/pokemon/{id}/`
pub fn detail_body(name: &str, types: &[&str], height: i64, weight: i64) -> String {
    let slots: Vec<_> = types
        .iter()
        .enumerate()
        .map(|(i, t)| {
            json!({
                "slot": i + 1,
                "type": { "name": t, "url": format!("https://pokeapi.co/api/v2/type/{}/", t) }
            })
        })
        .collect();

    json!({
        "name": name,
        "height": height,
        "weight": weight,
        "sprites": {
            "front_default": format!("https://img.example/front/{}.png", name),
            "other": {
                "official-artwork": {
                    "front_default": format!("https://img.example/art/{}.png", name)
                }
            }
        },
        "types": slots
    })
    .to_string()
}

/// Index response body whose detail URLs point at `base_url/pokemon/{n}/`
pub fn index_body(base_url: &str, names: &[&str]) -> String {
    let results: Vec<_> = names
        .iter()
        .enumerate()
        .map(|(i, name)| json!({ "name": name, "url": format!("{}/pokemon/{}/", base_url, i + 1) }))
        .collect();
    json!({ "count": 1302, "next": null, "results": results }).to_string()
}

/// Complete snapshot built from `(name, types)` pairs
pub fn snapshot(items: &[(&str, &[&str])]) -> CacheSnapshot {
    let mut snapshot = CacheSnapshot::empty();
    for (i, (name, types)) in items.iter().enumerate() {
        let entry = CatalogEntry {
            name: name.to_string(),
            url: format!("https://pokeapi.co/api/v2/pokemon/{}/", i + 1),
        };
        let record = DetailRecord {
            image_url: format!("https://img.example/art/{}.png", name),
            categories: types.iter().map(|t| t.to_string()).collect(),
            height: 7 + i as i64,
            weight: 69 + i as i64,
        };
        snapshot.insert(entry, record);
    }
    snapshot
}

/// Snapshot with `count` generated names, all of type `normal`
pub fn numbered_snapshot(count: usize) -> CacheSnapshot {
    let names: Vec<String> = (0..count).map(|i| format!("mon-{:03}", i)).collect();
    const NORMAL: &[&str] = &["normal"];
    let items: Vec<(&str, &[&str])> = names.iter().map(|n| (n.as_str(), NORMAL)).collect();
    snapshot(&items)
}
