use crate::rules::{exact_num, RuleClass};
use thiserror::Error;

/// Characters that keep their literal form in normalized query keys.
const QUERY_RESERVED: [char; 2] = ['=', '&'];

#[derive(Debug, Error)]
pub enum InvalidUrl {
    #[error("malformed query string")]
    MalformedQuery,
    #[error("url has no path segments")]
    EmptyPath,
}

/// Structural key of a URL: path depth, normalized query keys in order, and
/// fragment presence. Two URLs can only ever cluster together if their Shapes
/// are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape {
    path_depth: usize,
    query_keys: Vec<String>,
    has_fragment: bool,
}

impl Shape {
    pub fn new(path_depth: usize, query_keys: Vec<String>, has_fragment: bool) -> Self {
        Self { path_depth, query_keys, has_fragment }
    }

    pub fn path_depth(&self) -> usize {
        self.path_depth
    }

    pub fn query_keys(&self) -> &[String] {
        &self.query_keys
    }

    pub fn query_depth(&self) -> usize {
        self.query_keys.len()
    }

    pub fn has_fragment(&self) -> bool {
        self.has_fragment
    }

    /// Total number of tree levels below the virtual root.
    pub fn depth(&self) -> usize {
        self.path_depth + self.query_keys.len() + usize::from(self.has_fragment)
    }

    /// Canonical string form: depth, then `?` + joined keys when any, then a
    /// `#` marker when a fragment is present.
    pub fn canonical(&self) -> String {
        let mut s = self.path_depth.to_string();
        if !self.query_keys.is_empty() {
            s.push('?');
            s.push_str(&self.query_keys.join("&"));
        }
        if self.has_fragment {
            s.push('#');
        }
        s
    }
}

struct SplitUrl<'a> {
    path: &'a str,
    query: Option<&'a str>,
    fragment: Option<&'a str>,
}

/// Split a raw URL, distinguishing an absent query/fragment from a
/// present-but-empty one: a trailing bare `?` or `#` still yields an empty
/// component.
fn split_url(url: &str) -> SplitUrl<'_> {
    let (rest, fragment) = match url.find('#') {
        Some(i) => (&url[..i], Some(&url[i + 1..])),
        None => (url, None),
    };
    let (rest, query) = match rest.find('?') {
        Some(i) => (&rest[..i], Some(&rest[i + 1..])),
        None => (rest, None),
    };
    let path = if let Some(i) = rest.find("://") {
        let after = &rest[i + 3..];
        match after.find('/') {
            Some(j) => &after[j..],
            None => "",
        }
    } else if let Some(stripped) = rest.strip_prefix("//") {
        match stripped.find('/') {
            Some(j) => &stripped[j..],
            None => "",
        }
    } else {
        rest
    };
    SplitUrl { path, query, fragment }
}

/// Scan a query string for unescaped `=`/`&`. Keys keep a trailing `=` when
/// one was present, so value-less keys stay distinct from empty-valued ones.
/// A lone value-only pair is swapped into a key-less one.
fn parse_query(query: Option<&str>) -> Result<(Vec<String>, Vec<String>), InvalidUrl> {
    let query = match query {
        None => return Ok((Vec::new(), Vec::new())),
        Some("") => return Ok((vec![String::new()], vec![String::new()])),
        Some(q) => q,
    };
    if query.ends_with('&') {
        return Err(InvalidUrl::MalformedQuery);
    }
    let mut keys: Vec<String> = Vec::new();
    let mut values: Vec<String> = Vec::new();
    let mut buf = String::new();
    let mut in_key = true;
    let mut last: Option<char> = None;
    for c in query.chars() {
        match c {
            '=' if in_key => {
                buf.push('=');
                keys.push(std::mem::take(&mut buf));
                in_key = false;
            }
            '&' => {
                if last.is_none() || last == Some('&') {
                    return Err(InvalidUrl::MalformedQuery);
                }
                if in_key {
                    // value-less key
                    keys.push(std::mem::take(&mut buf));
                    values.push(String::new());
                } else {
                    values.push(std::mem::take(&mut buf));
                    in_key = true;
                }
            }
            _ => buf.push(c),
        }
        last = Some(c);
    }
    if in_key {
        keys.push(buf);
        values.push(String::new());
    } else {
        values.push(buf);
    }
    if keys.len() == 1 && !keys[0].ends_with('=') {
        std::mem::swap(&mut keys[0], &mut values[0]);
    }
    Ok((keys, values))
}

/// Normalize a query key through the rule-run alphabet: runs of identical
/// non-digit characters become exact-count bracket rules, digit runs and
/// reserved characters stay literal. Structurally equivalent key names
/// produce the same normalized form and therefore the same Shape.
pub fn normalize_key(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut frag = String::new();
    let mut last: Option<char> = None;

    fn flush(out: &mut String, frag: &mut String) {
        if let Some(first) = frag.chars().next() {
            if !first.is_ascii_digit() && !QUERY_RESERVED.contains(&first) {
                let rule = RuleClass::of(first).rule_str();
                out.push_str(&exact_num(&rule, frag.chars().count()));
            } else {
                out.push_str(frag);
            }
            frag.clear();
        }
    }

    for c in raw.chars() {
        let boundary = if c.is_ascii_digit() {
            last.is_some_and(|l| !l.is_ascii_digit())
        } else {
            last != Some(c)
        };
        if boundary {
            flush(&mut out, &mut frag);
        }
        frag.push(c);
        last = Some(c);
    }
    flush(&mut out, &mut frag);
    out
}

/// Decompose a raw URL into its Shape and ordered raw pieces: path segments,
/// then query values in key order, then the fragment when present.
pub fn decompose(url: &str) -> Result<(Shape, Vec<String>), InvalidUrl> {
    let split = split_url(url);
    let mut pieces: Vec<String> = split
        .path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if pieces.is_empty() {
        return Err(InvalidUrl::EmptyPath);
    }
    let path_depth = pieces.len();
    let (keys, values) = parse_query(split.query)?;
    let query_keys = keys.iter().map(|k| normalize_key(k)).collect();
    let shape = Shape::new(path_depth, query_keys, split.fragment.is_some());
    pieces.extend(values);
    if let Some(f) = split.fragment {
        pieces.push(f.to_string());
    }
    debug_assert_eq!(pieces.len(), shape.depth());
    Ok((shape, pieces))
}

/// Reassemble one per-level value sequence into a URL-pattern string. Query
/// keys already carry their `=` where one was present.
pub fn pack<S: AsRef<str>>(shape: &Shape, values: &[S]) -> String {
    let mut out = String::from("/");
    let path_end = shape.path_depth().min(values.len());
    out.push_str(
        &values[..path_end]
            .iter()
            .map(|v| v.as_ref())
            .collect::<Vec<_>>()
            .join("/"),
    );
    let query_end = path_end + shape.query_depth().min(values.len() - path_end);
    if shape.query_depth() > 0 {
        out.push_str("[\\?]");
        let pairs: Vec<String> = shape
            .query_keys()
            .iter()
            .zip(&values[path_end..query_end])
            .map(|(k, v)| format!("{}{}", k, v.as_ref()))
            .collect();
        out.push_str(&pairs.join("&"));
    }
    if shape.has_fragment() {
        out.push('#');
        for v in &values[query_end..] {
            out.push_str(v.as_ref());
        }
    }
    out
}
