//! Transitive dependency resolution.
//!
//! Version requirements on dependencies are not considered, a dependency always resolves to the
//! latest known release of the mod it names.

use std::collections::{HashMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};

use super::{ModCatalog, ModIdentifier, Release, ReleaseCoordinates};

/// Every release `release` depends on, directly or transitively.
///
/// Dependencies missing from the catalog are logged and skipped.
/// A dependency cycle back to `release` includes `release` itself in the result.
pub fn all_dependencies_of<C: ModCatalog + ?Sized>(catalog: &C, release: &Release) -> HashSet<Release> {
	let mut seen = HashSet::new();
	collect_dependencies(catalog, release, &mut seen);
	seen
}

fn collect_dependencies<C: ModCatalog + ?Sized>(catalog: &C, release: &Release, seen: &mut HashSet<Release>) {
	for dependency in &release.manifest.dependencies {
		let id = dependency.id();
		let Some(latest) = catalog.get_latest_release(&id) else {
			log::warn!("dependency {} of {} not found in catalog, skipping", id, release);
			continue;
		};
		if seen.insert(latest.clone()) {
			collect_dependencies(catalog, latest, seen);
		}
	}
}

/// Every release needed to launch with `enabled`, ordered so dependencies come before their dependents.
///
/// Only one release per mod is returned. An explicitly enabled release is used over the latest
/// release when something else depends on that mod.
pub fn install_closure<C: ModCatalog + ?Sized>(catalog: &C, enabled: &[ReleaseCoordinates]) -> Vec<Release> {
	let mut order = Vec::<Release>::new();
	let mut index = HashMap::<ModIdentifier, usize>::new();

	for coordinates in enabled {
		match catalog.get_release(coordinates) {
			Some(release) if !index.contains_key(&coordinates.id) => {
				index.insert(coordinates.id.clone(), order.len());
				order.push(release.clone());
			},
			Some(_) => log::warn!("more than one release of {} enabled, using the first", coordinates.id),
			None => log::warn!("enabled release {} not found in catalog, skipping", coordinates),
		}
	}

	/* Breadth first so the discovery order is stable for identical inputs */
	let mut i = 0;
	while i < order.len() {
		for dependency in order[i].manifest.dependencies.clone() {
			let id = dependency.id();
			if index.contains_key(&id) {
				continue;
			}
			match catalog.get_latest_release(&id) {
				Some(latest) => {
					index.insert(id, order.len());
					order.push(latest.clone());
				},
				None => log::warn!("dependency {} of {} not found in catalog, skipping", id, order[i]),
			}
		}
		i += 1;
	}

	let mut graph = DiGraph::<usize, ()>::with_capacity(order.len(), 0);
	let nodes: Vec<NodeIndex> = (0..order.len()).map(|i| graph.add_node(i)).collect();
	for (dependent, release) in order.iter().enumerate() {
		for dependency in &release.manifest.dependencies {
			if let Some(&d) = index.get(&dependency.id()) {
				if d != dependent {
					graph.add_edge(nodes[d], nodes[dependent], ());
				}
			}
		}
	}

	/* tarjan_scc yields dependents first, members of a cycle keep reverse discovery order */
	let mut components = petgraph::algo::tarjan_scc(&graph);
	components.reverse();
	components.into_iter()
		.flat_map(|mut component| {
			if component.len() > 1 {
				log::warn!("dependency cycle involving {}", order[graph[component[0]]]);
			}
			component.sort_by_key(|n| std::cmp::Reverse(graph[*n]));
			component
		})
		.map(|n| order[graph[n]].clone())
		.collect()
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::mods::Mod;
	use crate::mods::release::fixtures::*;

	fn position(releases: &[Release], module: &str) -> usize {
		releases.iter().position(|r| r.manifest.name == module).unwrap()
	}

	#[test]
	fn transitive_dependencies() {
		let catalog: Vec<Mod> = vec![
			single("Org", "A", "v1.0.0", &[("Org", "B")]),
			single("Org", "B", "v1.0.0", &[("Org", "C")]),
			single("Org", "C", "v1.0.0", &[]),
		];
		let deps = all_dependencies_of(&catalog, &catalog[0].releases[0]);
		assert_eq!(deps.len(), 2);
		assert!(deps.contains(&catalog[1].releases[0]));
		assert!(deps.contains(&catalog[2].releases[0]));
	}

	#[test]
	fn cycle_terminates() {
		let catalog: Vec<Mod> = vec![
			single("Org", "A", "v1.0.0", &[("Org", "B")]),
			single("Org", "B", "v1.0.0", &[("Org", "A")]),
		];
		let deps = all_dependencies_of(&catalog, &catalog[0].releases[0]);
		assert_eq!(deps, HashSet::from([catalog[0].releases[0].clone(), catalog[1].releases[0].clone()]));
	}

	#[test]
	fn missing_dependency_is_dropped() {
		let catalog: Vec<Mod> = vec![single("Org", "A", "v1.0.0", &[("Org", "Gone"), ("Org", "B")]), single("Org", "B", "v1.0.0", &[])];
		assert_eq!(all_dependencies_of(&catalog, &catalog[0].releases[0]).len(), 1);
	}

	#[test]
	fn dependency_resolves_to_latest() {
		let mut b = single("Org", "B", "v1.0.0", &[]);
		b.releases.push(release("Org", "B", "v2.0.0", &[]));
		let catalog: Vec<Mod> = vec![single("Org", "A", "v1.0.0", &[("Org", "B")]), b];
		let deps = all_dependencies_of(&catalog, &catalog[0].releases[0]);
		assert!(deps.iter().all(|r| r.tag == "v2.0.0"));
	}

	#[test]
	fn closure_orders_dependencies_first() {
		let catalog: Vec<Mod> = vec![
			single("Org", "App", "v1.0.0", &[("Org", "Mid")]),
			single("Org", "Mid", "v1.0.0", &[("Org", "Base")]),
			single("Org", "Base", "v1.0.0", &[]),
		];
		let closure = install_closure(&catalog, &[ReleaseCoordinates::new("Org", "App", "v1.0.0")]);
		assert_eq!(closure.len(), 3);
		assert!(position(&closure, "Base") < position(&closure, "Mid"));
		assert!(position(&closure, "Mid") < position(&closure, "App"));
	}

	#[test]
	fn closure_prefers_enabled_release() {
		let mut lib = single("Org", "Lib", "v1.0.0", &[]);
		lib.releases.push(release("Org", "Lib", "v2.0.0", &[]));
		let catalog: Vec<Mod> = vec![single("Org", "App", "v1.0.0", &[("Org", "Lib")]), lib];
		let closure = install_closure(&catalog, &[
			ReleaseCoordinates::new("Org", "App", "v1.0.0"),
			ReleaseCoordinates::new("Org", "Lib", "v1.0.0"),
		]);
		assert_eq!(closure.len(), 2);
		assert_eq!(closure[position(&closure, "Lib")].tag, "v1.0.0");
	}

	#[test]
	fn closure_with_cycle_is_finite() {
		let catalog: Vec<Mod> = vec![
			single("Org", "A", "v1.0.0", &[("Org", "B")]),
			single("Org", "B", "v1.0.0", &[("Org", "A")]),
		];
		assert_eq!(install_closure(&catalog, &[ReleaseCoordinates::new("Org", "A", "v1.0.0")]).len(), 2);
	}

	#[test]
	fn cycle_keeps_order_of_unrelated_chain() {
		let catalog: Vec<Mod> = vec![
			single("Org", "B", "v1.0.0", &[]),
			single("Org", "A", "v1.0.0", &[("Org", "B")]),
			single("Org", "X", "v1.0.0", &[("Org", "Y")]),
			single("Org", "Y", "v1.0.0", &[("Org", "X")]),
		];
		let closure = install_closure(&catalog, &[
			ReleaseCoordinates::new("Org", "B", "v1.0.0"),
			ReleaseCoordinates::new("Org", "A", "v1.0.0"),
			ReleaseCoordinates::new("Org", "X", "v1.0.0"),
		]);
		assert_eq!(closure.len(), 4);
		assert!(position(&closure, "B") < position(&closure, "A"));
	}

	#[test]
	fn chain_into_cycle_loads_cycle_first() {
		let catalog: Vec<Mod> = vec![
			single("Org", "App", "v1.0.0", &[("Org", "X")]),
			single("Org", "X", "v1.0.0", &[("Org", "Y")]),
			single("Org", "Y", "v1.0.0", &[("Org", "X")]),
		];
		let closure = install_closure(&catalog, &[ReleaseCoordinates::new("Org", "App", "v1.0.0")]);
		assert_eq!(position(&closure, "App"), 2);
	}
}
