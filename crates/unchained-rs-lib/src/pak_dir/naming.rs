//! File names for installed paks.
//!
//! The game applies paks in reverse lexicographic order of their file names, so load order is
//! encoded as a sortable token at the front of each name.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::fetcher::PakTarget;

pub const FORCED_SORT_DIVIDER: &str = "__-__";
const TOKEN_PREFIX: char = 'q';

/// Base-26 digits, reversed so index 0 sorts last.
const ALPHABET: &[u8; 26] = b"zyxwvutsrqponmlkjihgfedcba";

/// Digits needed so every index below `count` has the same width.
///
/// Smallest `w` where `26^w >= count`.
pub fn token_width(count: usize) -> usize {
	let mut width = 0;
	let mut capacity = 1usize;
	while capacity < count {
		capacity = capacity.saturating_mul(ALPHABET.len());
		width += 1;
	}
	width
}

/// `i` written with [`ALPHABET`], most significant digit first. Zero is the empty string.
fn rep_using_alphabet(mut i: usize) -> String {
	let mut digits = Vec::new();
	while i > 0 {
		digits.push(ALPHABET[i % ALPHABET.len()] as char);
		i /= ALPHABET.len();
	}
	digits.iter().rev().collect()
}

pub fn ordering_token(index: usize, width: usize) -> String {
	let rep = rep_using_alphabet(index);
	let padding = width.saturating_sub(rep.len());
	let mut token = String::with_capacity(1 + width);
	token.push(TOKEN_PREFIX);
	token.extend(std::iter::repeat(ALPHABET[0] as char).take(padding));
	token.push_str(&rep);
	token
}

/// Removes a previously applied ordering token.
pub fn strip_ordering_token(name: &str) -> &str {
	match name.rfind(FORCED_SORT_DIVIDER) {
		Some(i) => &name[i + FORCED_SORT_DIVIDER.len()..],
		None => name,
	}
}

/// Prefixes each name with an ordering token for its position.
///
/// Sorting the results in reverse reproduces the input order.
pub fn apply_sorted_lexicographically<S: AsRef<str>>(names: &[S]) -> Vec<String> {
	let width = token_width(names.len());
	names.iter().enumerate()
		.map(|(i, name)| format!("{}{}{}", ordering_token(i, width), FORCED_SORT_DIVIDER, strip_ordering_token(name.as_ref())))
		.collect()
}

/// `{module}.pak`, or `{org}_{module}.pak` when another target shares the module name.
pub fn base_pak_names(targets: &[PakTarget]) -> Vec<String> {
	let mut counts = HashMap::<&str, usize>::new();
	for target in targets {
		*counts.entry(target.coordinates.id.module_name.as_str()).or_default() += 1;
	}

	targets.iter()
		.map(|target| {
			let id = &target.coordinates.id;
			if counts.get(id.module_name.as_str()).copied().unwrap_or_default() > 1 {
				format!("{}_{}.pak", id.org, id.module_name)
			} else {
				format!("{}.pak", id.module_name)
			}
		})
		.collect()
}

/// Final file names for an ordered install list.
pub fn install_names(targets: &[PakTarget]) -> Vec<String> {
	apply_sorted_lexicographically(&base_pak_names(targets))
}

fn counter_regex() -> &'static Regex {
	static COUNTER: OnceLock<Regex> = OnceLock::new();
	COUNTER.get_or_init(|| Regex::new(r"\((\s*)(\d+)(\s*)\)").expect("counter regex is valid"))
}

/// Increments every parenthesised counter in `text`, or appends ` (1)` if there is none.
///
/// `"Core (1)"` becomes `"Core (2)"`, `"Core"` becomes `"Core (1)"`.
pub fn textual_successor(text: &str) -> String {
	let re = counter_regex();
	if !re.is_match(text) {
		return format!("{} (1)", text)
	}
	re.replace_all(text, |caps: &regex::Captures| {
		let n: u64 = caps[2].parse().unwrap_or(0);
		format!("({}{}{})", &caps[1], n.saturating_add(1), &caps[3])
	}).into_owned()
}
