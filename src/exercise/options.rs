use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;

/// Build a shuffled multiple-choice set containing `correct` exactly once.
///
/// Distractors are the distinct candidates different from `correct`; up to
/// `count - 1` of them are sampled uniformly without replacement. With too
/// few distractors the result is simply shorter than `count`.
pub fn generate_options<R, S>(correct: &str, candidates: &[S], count: usize, rng: &mut R) -> Vec<String>
where
  R: Rng + ?Sized,
  S: AsRef<str>,
{
  if count == 0 {
    return Vec::new();
  }

  let mut seen: HashSet<&str> = HashSet::new();
  let mut distractors: Vec<String> = candidates
    .iter()
    .map(|candidate| candidate.as_ref())
    .filter(|candidate| *candidate != correct && seen.insert(*candidate))
    .map(str::to_string)
    .collect();

  distractors.shuffle(rng);
  distractors.truncate(count - 1);

  let mut options = distractors;
  options.push(correct.to_string());
  options.shuffle(rng);
  options
}
