//! Small formatting and ordering helpers

use std::cmp::Ordering;

const SIZE_UNITS: [&str; 5] = ["bytes", "KB", "MB", "GB", "TB"];

/// Human-readable size with two decimals, in binary multiples
///
/// Everything from 1024 TB up stays in TB.
pub fn format_size(bytes: u64) -> String {
	let mut size = bytes as f64;
	for unit in &SIZE_UNITS[..SIZE_UNITS.len() - 1] {
		if size < 1024.0 {
			return format!("{:.2} {}", size, unit);
		}
		size /= 1024.0;
	}
	format!("{:.2} {}", size, SIZE_UNITS[SIZE_UNITS.len() - 1])
}

/// One run of a name split into text and digits
#[derive(Debug, Clone, PartialEq, Eq)]
enum Chunk {
	Text(String),
	/// Digit run with leading zeros stripped, so arbitrarily long runs compare
	/// as numbers without overflowing
	Number(String),
}

impl Ord for Chunk {
	fn cmp(&self, other: &Self) -> Ordering {
		match (self, other) {
			(Chunk::Number(a), Chunk::Number(b)) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
			(Chunk::Text(a), Chunk::Text(b)) => a.cmp(b),
			(Chunk::Number(_), Chunk::Text(_)) => Ordering::Less,
			(Chunk::Text(_), Chunk::Number(_)) => Ordering::Greater,
		}
	}
}

impl PartialOrd for Chunk {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

/// Sort key comparing digit runs numerically and text case-insensitively
///
/// `tile_2` sorts before `tile_10`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct NaturalKey(Vec<Chunk>);

pub fn natural_key(name: &str) -> NaturalKey {
	let mut chunks = Vec::new();
	let mut current = String::new();
	let mut in_digits = false;

	for c in name.chars() {
		let is_digit = c.is_ascii_digit();
		if is_digit != in_digits && !current.is_empty() {
			chunks.push(make_chunk(std::mem::take(&mut current), in_digits));
		}
		in_digits = is_digit;
		current.push(c);
	}
	if !current.is_empty() {
		chunks.push(make_chunk(current, in_digits));
	}
	NaturalKey(chunks)
}

fn make_chunk(run: String, digits: bool) -> Chunk {
	if digits {
		let trimmed = run.trim_start_matches('0');
		Chunk::Number(if trimmed.is_empty() { "0".to_string() } else { trimmed.to_string() })
	} else {
		Chunk::Text(run.to_lowercase())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_format_size_units() {
		assert_eq!(format_size(0), "0.00 bytes");
		assert_eq!(format_size(1023), "1023.00 bytes");
		assert_eq!(format_size(1024), "1.00 KB");
		assert_eq!(format_size(1536), "1.50 KB");
		assert_eq!(format_size(10 * 1024 * 1024), "10.00 MB");
		assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.00 GB");
		assert_eq!(format_size(2048 * 1024 * 1024 * 1024 * 1024), "2048.00 TB");
	}

	#[test]
	fn test_natural_order() {
		let mut names = vec!["tile_10.tif", "Tile_2.tif", "tile_1.tif", "10.0.4", "2.0.4", "2.0.10"];
		names.sort_by_key(|n| natural_key(n));
		assert_eq!(names, vec!["2.0.4", "2.0.10", "10.0.4", "tile_1.tif", "Tile_2.tif", "tile_10.tif"]);
	}

	#[test]
	fn test_natural_key_long_digit_runs() {
		let big = "scan_123456789012345678901234567890";
		let bigger = "scan_1234567890123456789012345678901";
		assert!(natural_key(big) < natural_key(bigger));
		assert_eq!(natural_key("a007"), natural_key("a7"));
	}
}

// vim: ts=4
