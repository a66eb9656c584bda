//! Per-feed text normalization rules applied to titles, links and bodies.

use crate::domain::{ExcludeRange, RawItem};

const EPISODE_PREFIXES: [&str; 2] = ["Episode ", "Ep "];

/// Strips the feed title, conventional episode prefixes, then the custom
/// prefixes and suffixes, each at most once and in that order.
pub fn normalize_title(
    raw: &str,
    feed_title: &str,
    prefixes: &[String],
    suffixes: &[String],
) -> String {
    let mut title = raw.strip_prefix(feed_title).unwrap_or(raw).trim();

    for prefix in EPISODE_PREFIXES {
        title = title.strip_prefix(prefix).unwrap_or(title).trim();
    }
    for prefix in prefixes {
        title = title.strip_prefix(prefix.as_str()).unwrap_or(title).trim();
    }
    for suffix in suffixes {
        title = title.strip_suffix(suffix.as_str()).unwrap_or(title).trim();
    }

    title.trim().to_string()
}

/// Allow-list first (when configured), then deny-list, both by substring.
pub fn passes_episode_filters(title: &str, allow: &[String], deny: &[String]) -> bool {
    let allowed = allow.is_empty() || allow.iter().any(|word| title.contains(word.as_str()));
    allowed && !deny.iter().any(|word| title.contains(word.as_str()))
}

/// Attached media wins over the item's own link.
pub fn resolve_link(item: &RawItem) -> Option<String> {
    item.enclosures
        .first()
        .or(item.link.as_ref())
        .filter(|url| !url.is_empty())
        .cloned()
}

/// Keeps only the text before the first occurrence of each marker, applied
/// in order against the already truncated text.
pub fn trim_at_marks(content: &str, marks: &[String]) -> String {
    marks
        .iter()
        .filter(|mark| !mark.is_empty())
        .fold(content.to_string(), |text, mark| match text.split_once(mark.as_str()) {
            Some((before, _)) => before.to_string(),
            None => text,
        })
}

/// Removes the first line starting with `range.from` through the next line
/// starting with `range.to`. Text is returned untouched unless both are found.
pub fn exclude_range(content: &str, range: &ExcludeRange) -> String {
    let lines: Vec<&str> = content.split('\n').collect();

    let Some(start) = lines.iter().position(|l| l.starts_with(&range.from)) else {
        return content.to_string();
    };
    let Some(end) = lines[start + 1..]
        .iter()
        .position(|l| l.starts_with(&range.to))
        .map(|offset| start + 1 + offset)
    else {
        return content.to_string();
    };

    lines[..start]
        .iter()
        .chain(lines[end + 1..].iter())
        .copied()
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn exclude_ranges(content: &str, ranges: &[ExcludeRange]) -> String {
    ranges
        .iter()
        .fold(content.to_string(), |text, range| exclude_range(&text, range))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(from: &str, to: &str) -> ExcludeRange {
        ExcludeRange {
            from: from.into(),
            to: to.into(),
        }
    }

    #[test]
    fn test_title_strips_feed_title_and_episode() {
        assert_eq!(
            normalize_title("My Show Episode 12: Topic", "My Show", &[], &[]),
            "12: Topic"
        );
        assert_eq!(normalize_title("Ep 3 - Intro", "", &[], &[]), "3 - Intro");
    }

    #[test]
    fn test_title_custom_prefix_and_suffix() {
        let prefixes = vec!["#".to_string()];
        let suffixes = vec!["| Podcast".to_string()];
        assert_eq!(
            normalize_title("#42 Rust in prod | Podcast", "Other", &prefixes, &suffixes),
            "42 Rust in prod"
        );
    }

    #[test]
    fn test_title_stripping_is_case_sensitive_and_single() {
        assert_eq!(normalize_title("episode 5", "", &[], &[]), "episode 5");
        let prefixes = vec!["x".to_string()];
        assert_eq!(normalize_title("xxy", "", &prefixes, &[]), "xy");
    }

    #[test]
    fn test_title_trimmed_after_episode_prefix() {
        let prefixes = vec!["#".to_string()];
        assert_eq!(normalize_title("Ep  #5", "", &prefixes, &[]), "5");
        assert_eq!(normalize_title("Episode   12", "", &[], &[]), "12");
    }

    #[test]
    fn test_episode_filters() {
        let allow = vec!["Interview".to_string()];
        let deny = vec!["Trailer".to_string()];

        assert!(passes_episode_filters("Interview with Ana", &allow, &deny));
        assert!(!passes_episode_filters("Solo episode", &allow, &deny));
        assert!(!passes_episode_filters("Interview Trailer", &allow, &deny));
        assert!(passes_episode_filters("Anything", &[], &[]));
        assert!(!passes_episode_filters("Season Trailer", &[], &deny));
    }

    #[test]
    fn test_resolve_link_prefers_enclosure() {
        let mut item = RawItem {
            link: Some("https://x/post".into()),
            ..RawItem::default()
        };
        assert_eq!(resolve_link(&item), Some("https://x/post".into()));

        item.enclosures = vec!["https://x/audio.mp3".into(), "https://x/other.mp3".into()];
        assert_eq!(resolve_link(&item), Some("https://x/audio.mp3".into()));

        assert_eq!(resolve_link(&RawItem::default()), None);
    }

    #[test]
    fn test_trim_at_marks() {
        let marks = vec!["== STOP ==".to_string()];
        assert_eq!(trim_at_marks("keep this== STOP ==drop this", &marks), "keep this");
        assert_eq!(trim_at_marks("no marker here", &marks), "no marker here");
    }

    #[test]
    fn test_trim_at_marks_applies_in_order() {
        let marks = vec!["--".to_string(), "Sponsor".to_string()];
        assert_eq!(trim_at_marks("intro Sponsor body -- footer", &marks), "intro ");
    }

    #[test]
    fn test_exclude_range_removes_inclusive_span() {
        let content = "A\nSTART\nB\nC\nEND\nD";
        assert_eq!(exclude_range(content, &range("START", "END")), "A\nD");
    }

    #[test]
    fn test_exclude_range_missing_boundary_is_noop() {
        assert_eq!(exclude_range("A\nSTART\nB", &range("START", "END")), "A\nSTART\nB");
        assert_eq!(exclude_range("A\nB\nEND", &range("START", "END")), "A\nB\nEND");
    }

    #[test]
    fn test_exclude_range_end_must_follow_start() {
        let content = "END\nA\nSTART\nB";
        assert_eq!(exclude_range(content, &range("START", "END")), content);
    }

    #[test]
    fn test_exclude_ranges_progressive() {
        let content = "A\n<ads>\nx\n</ads>\nB\nLinks:\ny\nEOF\nC";
        let ranges = vec![range("<ads>", "</ads>"), range("Links:", "EOF")];
        assert_eq!(exclude_ranges(content, &ranges), "A\nB\nC");
    }
}
