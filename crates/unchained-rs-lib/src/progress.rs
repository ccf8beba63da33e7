//! Download progress reporting.

use std::sync::{Arc, Mutex};

/// Anything that accepts percentage updates.
pub trait ProgressSink: Send + Sync {
	fn report(&self, percentage: f64);
}

/// Remembers the last reported percentage, clamped to `0..=100`.
///
/// Clones share the same value.
#[derive(Debug, Clone, Default)]
pub struct MemoryProgress {
	value: Arc<Mutex<f64>>,
}

impl MemoryProgress {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn percentage(&self) -> f64 {
		self.value.lock().map(|v| *v).unwrap_or_default()
	}
}

impl ProgressSink for MemoryProgress {
	fn report(&self, percentage: f64) {
		if let Ok(mut v) = self.value.lock() {
			*v = if percentage.is_nan() { 0.0 } else { percentage.clamp(0.0, 100.0) };
		}
	}
}

/// Averages every tracked [`MemoryProgress`].
#[derive(Debug, Clone, Default)]
pub struct AccumulatedProgress {
	tracked: Arc<Mutex<Vec<MemoryProgress>>>,
}

impl AccumulatedProgress {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn also_track(&self, progress: MemoryProgress) {
		if let Ok(mut tracked) = self.tracked.lock() {
			tracked.push(progress);
		}
	}

	/// 100 when nothing is tracked.
	pub fn percentage(&self) -> f64 {
		let Ok(tracked) = self.tracked.lock() else { return 100.0 };
		if tracked.is_empty() {
			return 100.0
		}
		tracked.iter().map(MemoryProgress::percentage).sum::<f64>() / tracked.len() as f64
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn clamps_high() { let p = MemoryProgress::new(); p.report(150.0); assert_eq!(p.percentage(), 100.0) }
	#[test]
	fn clamps_low() { let p = MemoryProgress::new(); p.report(-3.0); assert_eq!(p.percentage(), 0.0) }
	#[test]
	fn empty_accumulation_is_complete() { assert_eq!(AccumulatedProgress::new().percentage(), 100.0) }

	#[test]
	fn averages_tracked() {
		let acc = AccumulatedProgress::new();
		let a = MemoryProgress::new();
		let b = MemoryProgress::new();
		acc.also_track(a.clone());
		acc.also_track(b.clone());
		a.report(100.0);
		b.report(50.0);
		assert_eq!(acc.percentage(), 75.0);
	}
}
