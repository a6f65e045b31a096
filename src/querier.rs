//! Declarative text-extraction pipelines over parsed HTML nodes.
//!
//! A [`Querier`] describes where on a page a piece of information lives and
//! how to reshape the raw text into something the fetchers can use: a CSS
//! selector, optional pre-split filters, at most one splitter, and post-split
//! filters applied to each fragment. Executing a querier never fails the
//! caller out of a pipeline: a selector miss yields `[""]` and a debug-level
//! diagnostic, so element 0 is always safe to index.

use regex::Regex;
use scraper::{ElementRef, Selector};
use tracing::debug;

use crate::dom;

type TextFilter = Box<dyn Fn(&str) -> String + Send + Sync>;
type Splitter = Box<dyn Fn(&str) -> Vec<String> + Send + Sync>;
type ListFilter = Box<dyn Fn(Vec<String>) -> Vec<String> + Send + Sync>;

pub struct Querier {
    raw_selector: String,
    selector: Option<Selector>,
    select_all: bool,
    end_selector: Option<Selector>,
    pre: Vec<TextFilter>,
    splitter: Option<Splitter>,
    post: Vec<TextFilter>,
    list: Vec<ListFilter>,
}

impl Querier {
    /// Selects the first match of `selector` and extracts its inner text.
    pub fn new(selector: &str) -> Self {
        Self {
            raw_selector: selector.to_string(),
            selector: Selector::parse(selector).ok(),
            select_all: false,
            end_selector: None,
            pre: Vec::new(),
            splitter: None,
            post: Vec::new(),
            list: Vec::new(),
        }
    }

    /// Selects every match of `selector`; each match's inner text becomes one
    /// element of the result. Splitters are bypassed in this mode, filters
    /// still run on each element.
    pub fn all(selector: &str) -> Self {
        let mut q = Self::new(selector);
        q.select_all = true;
        q
    }

    fn filter(mut self, f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        if self.splitter.is_none() {
            self.pre.push(Box::new(f));
        } else {
            self.post.push(Box::new(f));
        }
        self
    }

    fn set_splitter(mut self, f: impl Fn(&str) -> Vec<String> + Send + Sync + 'static) -> Self {
        // Last write wins; filters already registered keep their position.
        self.splitter = Some(Box::new(f));
        self
    }

    /// Removes leading and trailing whitespace from each fragment.
    pub fn trim(self) -> Self {
        self.filter(|s| s.trim().to_string())
    }

    pub fn trim_prefix(self, prefix: &str) -> Self {
        let prefix = prefix.to_string();
        self.filter(move |s| s.strip_prefix(&prefix).unwrap_or(s).to_string())
    }

    pub fn trim_suffix(self, suffix: &str) -> Self {
        let suffix = suffix.to_string();
        self.filter(move |s| s.strip_suffix(&suffix).unwrap_or(s).to_string())
    }

    /// Removes a wrapping prefix and suffix, only if both are present.
    pub fn cut_wrapper(self, prefix: &str, suffix: &str) -> Self {
        let prefix = prefix.to_string();
        let suffix = suffix.to_string();
        self.filter(move |s| {
            match s.strip_prefix(&prefix).and_then(|rest| rest.strip_suffix(&suffix)) {
                Some(inner) => inner.to_string(),
                None => s.to_string(),
            }
        })
    }

    /// Keeps only text before the first occurrence of `sep`.
    pub fn before(self, sep: &str) -> Self {
        let sep = sep.to_string();
        self.filter(move |s| match s.split_once(&sep) {
            Some((head, _)) => head.to_string(),
            None => s.to_string(),
        })
    }

    /// Keeps only text after the first occurrence of `sep`.
    pub fn after(self, sep: &str) -> Self {
        let sep = sep.to_string();
        self.filter(move |s| match s.split_once(&sep) {
            Some((_, tail)) => tail.to_string(),
            None => s.to_string(),
        })
    }

    /// Prepends `p` to each fragment.
    pub fn prefix(self, p: &str) -> Self {
        let p = p.to_string();
        self.filter(move |s| format!("{p}{s}"))
    }

    pub fn replace_all(self, from: &str, to: &str) -> Self {
        let from = from.to_string();
        let to = to.to_string();
        self.filter(move |s| s.replace(&from, &to))
    }

    /// Regex replacement; use `$1`, `$2`, ... for capture groups. An invalid
    /// expression degrades to the identity filter.
    pub fn replace_all_regex(self, exp: &str, rep: &str) -> Self {
        let re = Regex::new(exp).ok();
        let rep = rep.to_string();
        self.filter(move |s| match &re {
            Some(re) => re.replace_all(s, rep.as_str()).into_owned(),
            None => s.to_string(),
        })
    }

    /// Forces fullwidth alphanumerics (and a few siblings) to halfwidth.
    /// Useful for sites that write dates and times as ２０２５ or １８：３０.
    pub fn half_width(self) -> Self {
        self.filter(|s| half_width(s))
    }

    /// Truncates the matched node's text at the text of the first node
    /// matching `selector` within it.
    pub fn before_selector(mut self, selector: &str) -> Self {
        self.end_selector = Selector::parse(selector).ok();
        self
    }

    /// Splits each fragment on `sep`.
    pub fn split(self, sep: &str) -> Self {
        let sep = sep.to_string();
        self.set_splitter(move |s| s.split(&sep as &str).map(str::to_string).collect())
    }

    /// Splits on a regular expression. An invalid expression leaves the
    /// fragment whole.
    pub fn split_regex(self, exp: &str) -> Self {
        let re = Regex::new(exp).ok();
        self.set_splitter(move |s| match &re {
            Some(re) => re.split(s).map(str::to_string).collect(),
            None => vec![s.to_string()],
        })
    }

    /// Splits on `sep` and keeps only the fragment at index `i`, or the empty
    /// string if there is no such fragment.
    pub fn split_index(self, sep: &str, i: usize) -> Self {
        let sep = sep.to_string();
        self.set_splitter(move |s| {
            vec![s
                .split(&sep as &str)
                .nth(i)
                .map(str::to_string)
                .unwrap_or_default()]
        })
    }

    /// Like [`Querier::split_index`], with a regex separator.
    pub fn split_regex_index(self, exp: &str, i: usize) -> Self {
        let re = Regex::new(exp).ok();
        self.set_splitter(move |s| match &re {
            Some(re) => vec![re.split(s).nth(i).map(str::to_string).unwrap_or_default()],
            None => vec![s.to_string()],
        })
    }

    /// Keeps only the fragment at index `i` of the final fragment list; a
    /// negative `i` counts from the end. Out of range yields the empty
    /// string. Runs after splitting and per-fragment filters.
    pub fn keep_index(mut self, i: isize) -> Self {
        self.list.push(Box::new(move |arr| {
            let idx = if i < 0 {
                arr.len().checked_sub(i.unsigned_abs())
            } else {
                Some(i as usize).filter(|&i| i < arr.len())
            };
            vec![idx
                .and_then(|i| arr.into_iter().nth(i))
                .unwrap_or_default()]
        }));
        self
    }

    /// Collapses all fragments into one, joined with `sep`. Runs after
    /// splitting and per-fragment filters.
    pub fn join(mut self, sep: &str) -> Self {
        let sep = sep.to_string();
        self.list.push(Box::new(move |arr| vec![arr.join(&sep)]));
        self
    }

    /// Splits on `sep`, except while inside a `l`..`r` bracket pair.
    ///
    /// Sites commonly separate artists with a slash but also use slashes
    /// inside parentheses on a single artist (`A / B（feat. C / D）`); the
    /// bracketed span must stay attached to the artist it annotates.
    /// Nested brackets are tracked by depth.
    pub fn split_ignore_within(self, sep: &str, l: char, r: char) -> Self {
        let sep = sep.to_string();
        self.set_splitter(move |s| split_ignore_within(s, &sep, l, r))
    }

    /// Executes the pipeline against a node. Always returns at least one
    /// element; on a selector miss the single element is the empty string.
    pub fn execute(&self, node: ElementRef<'_>) -> Vec<String> {
        let mut fragments = match self.collect_fragments(node) {
            Some(f) => f,
            None => {
                debug!(selector = %self.raw_selector, "selector matched nothing");
                return vec![String::new()];
            }
        };

        for f in &self.pre {
            for frag in fragments.iter_mut() {
                *frag = f(frag);
            }
        }

        if !self.select_all {
            if let Some(splitter) = &self.splitter {
                fragments = fragments.iter().flat_map(|s| splitter(s)).collect();
            }
        }

        for f in &self.post {
            for frag in fragments.iter_mut() {
                *frag = f(frag);
            }
        }

        for f in &self.list {
            fragments = f(fragments);
        }

        let cleaned: Vec<String> = fragments
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if cleaned.is_empty() {
            vec![String::new()]
        } else {
            cleaned
        }
    }

    fn collect_fragments(&self, node: ElementRef<'_>) -> Option<Vec<String>> {
        let selector = self.selector.as_ref()?;
        if self.select_all {
            let matches = dom::query_all(node, selector);
            if matches.is_empty() {
                return None;
            }
            Some(matches.into_iter().map(dom::inner_text).collect())
        } else {
            let matched = dom::query_first(node, selector)?;
            let mut text = dom::inner_text(matched);
            if let Some(end) = &self.end_selector {
                if let Some(end_node) = dom::query_first(matched, end) {
                    let end_text = dom::inner_text(end_node);
                    if !end_text.is_empty() {
                        if let Some((head, _)) = text.split_once(&end_text) {
                            text = head.to_string();
                        }
                    }
                }
            }
            Some(vec![text])
        }
    }
}

fn half_width(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\u{ff01}'..='\u{ff5e}' => {
                char::from_u32(c as u32 - 0xfee0).unwrap_or(c)
            }
            '\u{3000}' => ' ',
            '\u{ffe5}' => '¥',
            _ => c,
        })
        .collect()
}

fn split_ignore_within(s: &str, sep: &str, l: char, r: char) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut rest = s;
    while let Some(c) = rest.chars().next() {
        if depth == 0 && !sep.is_empty() && rest.starts_with(sep) {
            out.push(std::mem::take(&mut current));
            rest = &rest[sep.len()..];
            continue;
        }
        if c == l {
            depth += 1;
        } else if c == r {
            depth = depth.saturating_sub(1);
        }
        current.push(c);
        rest = &rest[c.len_utf8()..];
    }
    out.push(current);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    const PAGE: &str = r#"<html><body>
        <p id="splitter">one - two - three</p>
        <p id="multisplit">one-two/three-four</p>
        <p id="ignorewithin">one / two / three（four / five）</p>
        <p id="wrapper">「one - two」</p>
        <p id="wrapperfail">one 「two」</p>
        <p id="fullwidth">ＯＮＥ２３</p>
        <p id="complex">onetwo<span>three</span></p>
        <ul id="list"><li>a</li><li> </li><li>b</li></ul>
        <p id="boiler">keep
OPEN 18:00
also keep</p>
    </body></html>"#;

    fn run(q: Querier) -> Vec<String> {
        let doc = Html::parse_document(PAGE);
        q.execute(doc.root_element())
    }

    #[test]
    fn miss_yields_single_empty_string() {
        let got = run(Querier::new("p#nope").split(" - "));
        assert_eq!(got, vec![String::new()]);
    }

    #[test]
    fn split_and_trim() {
        let got = run(Querier::new("p#splitter").split("-").trim());
        assert_eq!(got, vec!["one", "two", "three"]);
    }

    #[test]
    fn before_and_after() {
        assert_eq!(run(Querier::new("p#splitter").after(" - ")), vec!["two - three"]);
        assert_eq!(run(Querier::new("p#splitter").before(" - ")), vec!["one"]);
        // Separator absent: fragment passes through untouched.
        assert_eq!(
            run(Querier::new("p#splitter").after("hehe")),
            vec!["one - two - three"]
        );
    }

    #[test]
    fn filters_after_split_run_per_fragment() {
        let got = run(Querier::new("p#multisplit").split("/").after("-"));
        assert_eq!(got, vec!["two", "four"]);
    }

    #[test]
    fn split_ignore_within_keeps_bracketed_group() {
        let got = run(Querier::new("p#ignorewithin").split_ignore_within(" / ", '（', '）'));
        assert_eq!(got, vec!["one", "two", "three（four / five）"]);
    }

    #[test]
    fn split_ignore_within_handles_nesting() {
        let got = split_ignore_within(
            "one / two（three / four（five / six） seven）/ eight",
            " / ",
            '（',
            '）',
        );
        assert_eq!(
            got,
            vec!["one", "two（three / four（five / six） seven）/ eight"]
        );
    }

    #[test]
    fn split_index_out_of_range_is_empty() {
        assert_eq!(run(Querier::new("p#splitter").split_index(" - ", 1)), vec!["two"]);
        assert_eq!(
            run(Querier::new("p#splitter").split_index(" - ", 3)),
            vec![String::new()]
        );
    }

    #[test]
    fn split_regex_index() {
        assert_eq!(
            run(Querier::new("p#multisplit").split_regex_index("[/-]", 2)),
            vec!["three"]
        );
        assert_eq!(run(Querier::new("p#multisplit").split_regex("[/-]")).len(), 4);
    }

    #[test]
    fn last_splitter_wins() {
        let got = run(Querier::new("p#splitter").split("@").split(" - "));
        assert_eq!(got, vec!["one", "two", "three"]);
    }

    #[test]
    fn cut_wrapper_requires_both_sides() {
        assert_eq!(run(Querier::new("p#wrapper").cut_wrapper("「", "」")), vec!["one - two"]);
        assert_eq!(
            run(Querier::new("p#wrapperfail").cut_wrapper("「", "」")),
            vec!["one 「two」"]
        );
    }

    #[test]
    fn half_width_normalizes_fullwidth() {
        assert_eq!(run(Querier::new("p#fullwidth").half_width()), vec!["ONE23"]);
        assert_eq!(half_width("１８：３０"), "18:30");
    }

    #[test]
    fn replace_all_regex() {
        assert_eq!(
            run(Querier::new("p#multisplit").replace_all_regex("[-/]", "")),
            vec!["onetwothreefour"]
        );
    }

    #[test]
    fn before_selector_truncates_at_nested_node() {
        let got = run(Querier::new("p#complex").before_selector("span"));
        assert_eq!(got, vec!["onetwo"]);
    }

    #[test]
    fn select_all_yields_one_element_per_match() {
        let got = run(Querier::all("ul#list li"));
        // The whitespace-only item is dropped after trimming.
        assert_eq!(got, vec!["a", "b"]);
    }

    #[test]
    fn keep_index_counts_from_either_end() {
        assert_eq!(
            run(Querier::new("p#splitter").split(" - ").keep_index(1)),
            vec!["two"]
        );
        assert_eq!(
            run(Querier::new("p#splitter").split(" - ").keep_index(-1)),
            vec!["three"]
        );
        assert_eq!(
            run(Querier::new("p#splitter").split(" - ").keep_index(5)),
            vec![String::new()]
        );
    }

    #[test]
    fn join_collapses_fragments() {
        assert_eq!(
            run(Querier::new("p#splitter").split(" - ").join("/")),
            vec!["one/two/three"]
        );
    }

    #[test]
    fn fragments_filtered_to_empty_are_dropped() {
        let got = run(Querier::new("p#boiler")
            .split("\n")
            .replace_all_regex(r"(?i)open\s*\d{2}:\d{2}", ""));
        assert_eq!(got, vec!["keep", "also keep"]);
    }
}
