//! Uniform random picks over candidate lists.
//!
//! The random source is always passed in, so a run can be replayed with a
//! seeded generator.

use rand::seq::SliceRandom;
use rand::Rng;

/// Picks one element uniformly at random, or `None` for an empty slice.
///
/// The input is only read; the chosen element is cloned out.
///
/// # Examples
///
/// ```
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
/// use songslike::sampler::pick_random;
///
/// let mut rng = StdRng::seed_from_u64(7);
/// assert_eq!(pick_random::<u8, _>(&[], &mut rng), None);
/// assert_eq!(pick_random(&["only"], &mut rng), Some("only"));
/// ```
pub fn pick_random<T, R>(candidates: &[T], rng: &mut R) -> Option<T>
where
    T: Clone,
    R: Rng + ?Sized,
{
    candidates.choose(rng).cloned()
}
