use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

pub const ACTION_VERBS: [&str; 12] = [
    "create", "implement", "open", "contact", "draft", "request", "schedule", "setup",
    "configure", "test", "verify", "follow",
];

/// Lowercases, maps everything outside `[a-z0-9 ]` to a space, then collapses whitespace.
pub fn normalize(input: &str) -> String {
    let lowered = input.to_lowercase();
    let replaced: String = lowered
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == ' ' {
                c
            } else {
                ' '
            }
        })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True when a verb leads the title or appears as a whole word in it.
pub fn is_actionable(title: &str) -> bool {
    let normalized = normalize(title);
    ACTION_VERBS.iter().any(|verb| {
        normalized.starts_with(&format!("{verb} "))
            || normalized.split(' ').any(|word| word == *verb)
    })
}

fn checkbox_prefix() -> &'static Regex {
    static CHECKBOX: OnceLock<Regex> = OnceLock::new();
    CHECKBOX.get_or_init(|| Regex::new(r"^- \[ \]\s*").expect("Valid regex pattern"))
}

/// Strips a leading `- [ ]` checkbox and keeps the first line.
pub fn extract_title(suggested_text: &str) -> String {
    let stripped = checkbox_prefix().replace(suggested_text, "");
    stripped.split('\n').next().unwrap_or_default().to_string()
}

/// Matching-blocks similarity ratio, `2 * matches / (len(a) + len(b))`.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matcher = BlockMatcher::new(&a, &b);
    2.0 * matcher.matched_chars() as f64 / total as f64
}

struct BlockMatcher<'a> {
    a: &'a [char],
    b: &'a [char],
    b2j: HashMap<char, Vec<usize>>,
}

impl<'a> BlockMatcher<'a> {
    fn new(a: &'a [char], b: &'a [char]) -> Self {
        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, ch) in b.iter().enumerate() {
            b2j.entry(*ch).or_default().push(j);
        }

        // Characters that are too common in long inputs do not seed matches.
        let n = b.len();
        if n >= 200 {
            let limit = n / 100 + 1;
            b2j.retain(|_, positions| positions.len() <= limit);
        }

        Self { a, b, b2j }
    }

    fn matched_chars(&self) -> usize {
        let mut queue = vec![(0, self.a.len(), 0, self.b.len())];
        let mut matched = 0;
        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let (i, j, k) = self.longest_match(alo, ahi, blo, bhi);
            if k == 0 {
                continue;
            }
            matched += k;
            if alo < i && blo < j {
                queue.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                queue.push((i + k, ahi, j + k, bhi));
            }
        }
        matched
    }

    fn longest_match(
        &self,
        alo: usize,
        ahi: usize,
        blo: usize,
        bhi: usize,
    ) -> (usize, usize, usize) {
        let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);
        let mut j2len: HashMap<usize, usize> = HashMap::new();

        for i in alo..ahi {
            let mut next: HashMap<usize, usize> = HashMap::new();
            if let Some(positions) = self.b2j.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let run = if j > 0 {
                        j2len.get(&(j - 1)).copied().unwrap_or(0)
                    } else {
                        0
                    };
                    let k = run + 1;
                    next.insert(j, k);
                    if k > best_size {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_size = k;
                    }
                }
            }
            j2len = next;
        }

        // Grow across characters that were excluded as popular.
        while best_i > alo && best_j > blo && self.a[best_i - 1] == self.b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_size += 1;
        }
        while best_i + best_size < ahi
            && best_j + best_size < bhi
            && self.a[best_i + best_size] == self.b[best_j + best_size]
        {
            best_size += 1;
        }

        (best_i, best_j, best_size)
    }
}
