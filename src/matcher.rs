use nucleo_matcher::pattern::{CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Matcher, Utf32Str};

pub struct FuzzyMatcher {
    matcher: Matcher,
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl FuzzyMatcher {
    pub fn new() -> Self {
        Self {
            matcher: Matcher::new(nucleo_matcher::Config::DEFAULT),
        }
    }

    /// Returns indices into `names` of the names matching `query`, best match first.
    ///
    /// An empty query matches everything in the given order; equal scores keep it too.
    pub fn rank<S: AsRef<str>>(&mut self, query: &str, names: &[S]) -> Vec<usize> {
        if query.trim().is_empty() {
            return (0..names.len()).collect();
        }

        let pattern = Pattern::parse(query, CaseMatching::Smart, Normalization::Smart);
        let mut buf = Vec::new();
        let mut scored: Vec<(usize, u32)> = names.iter().enumerate()
            .filter_map(|(i, name)| {
                let haystack = Utf32Str::new(name.as_ref(), &mut buf);
                pattern.score(haystack, &mut self.matcher).map(|score| (i, score))
            })
            .collect();

        // sort_by is stable
        scored.sort_by(|a, b| b.1.cmp(&a.1));
        scored.into_iter().map(|(i, _)| i).collect()
    }
}
