//! Composable pre-launch steps.
//!
//! A [`Preparer`] takes the launch state and either hands back the state to launch with or an
//! [`Abort`]. Steps are combined into one pipeline and always run one after another, later steps
//! may rely on files left behind by earlier ones.

use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};

/// Stops the launch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("launch aborted: {reason}")]
pub struct Abort {
	pub reason: String,
}

impl Abort {
	pub fn new(reason: impl Into<String>) -> Self {
		Self { reason: reason.into() }
	}
}

type PrepareFn<T> = dyn Fn(T) -> BoxFuture<'static, Result<T, Abort>> + Send + Sync;

pub struct Preparer<T> {
	f: Arc<PrepareFn<T>>,
}

impl<T> Clone for Preparer<T> {
	fn clone(&self) -> Self {
		Self { f: self.f.clone() }
	}
}

impl<T: Send + 'static> Preparer<T> {
	pub fn new<F, Fut>(f: F) -> Self
	where
		F: Fn(T) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = Result<T, Abort>> + Send + 'static,
	{
		Self { f: Arc::new(move |state| f(state).boxed()) }
	}

	/// Passes the state through untouched.
	pub fn noop() -> Self {
		Self::new(|state| futures::future::ready(Ok(state)))
	}

	pub async fn prepare(&self, state: T) -> Result<T, Abort> {
		(self.f)(state).await
	}

	/// Runs a preparer that does not care about the state, passing the state through.
	pub fn ignore_state(unit: Preparer<()>) -> Self {
		Self::new(move |state| {
			let unit = unit.clone();
			async move {
				unit.prepare(()).await?;
				Ok(state)
			}
		})
	}

	/// Feeds this preparer's output into `next`.
	pub fn then(self, next: Preparer<T>) -> Self {
		Self::new(move |state| {
			let (first, next) = (self.clone(), next.clone());
			async move {
				let state = first.prepare(state).await?;
				next.prepare(state).await
			}
		})
	}

	/// Adapts this preparer to another state type through a pair of conversions.
	pub fn invariant_map<U, ToInner, FromInner>(self, to_inner: ToInner, from_inner: FromInner) -> Preparer<U>
	where
		U: Send + 'static,
		ToInner: Fn(U) -> T + Send + Sync + 'static,
		FromInner: Fn(T) -> U + Send + Sync + 'static,
	{
		let from_inner = Arc::new(from_inner);
		Preparer::new(move |outer| {
			let (inner, from_inner) = (self.clone(), from_inner.clone());
			let state = to_inner(outer);
			async move { inner.prepare(state).await.map(|s| (*from_inner)(s)) }
		})
	}
}

impl<T: Clone + Send + 'static> Preparer<T> {
	/// Runs this preparer then `other`, both given the original state.
	///
	/// The result is `other`'s, and an [`Abort`] from either ends the chain.
	pub fn and_then(self, other: Preparer<T>) -> Self {
		Self::new(move |state: T| {
			let (first, second) = (self.clone(), other.clone());
			async move {
				first.prepare(state.clone()).await?;
				second.prepare(state).await
			}
		})
	}

	/// Runs this preparer then `other` on a projection of the original state.
	///
	/// `other`'s output is discarded, the original state is returned when it succeeds.
	pub fn sub<U, P>(self, other: Preparer<U>, project: P) -> Self
	where
		U: Send + 'static,
		P: Fn(&T) -> U + Send + Sync + 'static,
	{
		let lifted = Preparer::new(move |state: T| {
			let other = other.clone();
			let projected = project(&state);
			async move {
				other.prepare(projected).await?;
				Ok(state)
			}
		});
		self.and_then(lifted)
	}

	/// [`Preparer::and_then`] with `other` adapted through [`Preparer::invariant_map`].
	pub fn sub_invariant<U, ToInner, FromInner>(self, other: Preparer<U>, to_inner: ToInner, from_inner: FromInner) -> Self
	where
		U: Send + 'static,
		ToInner: Fn(T) -> U + Send + Sync + 'static,
		FromInner: Fn(U) -> T + Send + Sync + 'static,
	{
		self.and_then(other.invariant_map(to_inner, from_inner))
	}
}
