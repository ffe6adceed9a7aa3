use crate::backend::document::IdTags;
use crate::backend::document::LyricsDocument;
use crate::backend::document::LyricsLine;

/// Lines of a translation are matched to the original within this many seconds.
const TRANSLATION_TOLERANCE: f64 = 0.01;

/// Largest `[offset:N]` accepted, in milliseconds either way.
pub const MAX_OFFSET: i64 = 3_600_000;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedLrc {
    pub lines: Vec<LyricsLine>,
    pub tags: IdTags,
    pub offset: i64
}

/// Parse a time tag body such as `01:23.45`, `01:23`, `01:23:45` or `01:23.456` into seconds.
pub fn parse_time_tag(tag: &str) -> Option<f64> {
    let (minutes, rest) = tag.split_once(':')?;
    if minutes.is_empty() || !minutes.chars().all(|c| c.is_ascii_digit()) { return None; }

    let (seconds, fraction) = match rest.split_once(['.', ':']) {
        Some((seconds, fraction)) => (seconds, Some(fraction)),
        None => (rest, None)
    };
    if seconds.is_empty() || !seconds.chars().all(|c| c.is_ascii_digit()) { return None; }

    let mut position = minutes.parse::<u64>().ok()? as f64 * 60.0 + seconds.parse::<u64>().ok()? as f64;

    if let Some(fraction) = fraction {
        if fraction.is_empty() || !fraction.chars().all(|c| c.is_ascii_digit()) { return None; }
        let digits = fraction.len().min(6);
        let value = fraction[..digits].parse::<u64>().ok()? as f64;
        position += value / 10f64.powi(digits as i32);
    }

    Some(position)
}

/// Millisecond precision, so `[mm:ss.xxx]` tags survive a save and reload.
pub fn format_time(position: f64) -> String {
    let millis = (position.max(0.0) * 1000.0).round() as u64;
    format!("{:02}:{:02}.{:03}", millis / 60_000, (millis / 1000) % 60, millis % 1000)
}

fn apply_id_tag(parsed: &mut ParsedLrc, key: &str, value: &str) {
    let value = value.trim();
    if value.is_empty() { return; }
    match key.trim().to_lowercase().as_str() {
        "ti" => parsed.tags.title = Some(value.to_string()),
        "ar" => parsed.tags.artist = Some(value.to_string()),
        "al" => parsed.tags.album = Some(value.to_string()),
        "by" => parsed.tags.author = Some(value.to_string()),
        "length" => parsed.tags.length = parse_time_tag(value).or_else(|| value.parse::<f64>().ok()),
        "offset" => if let Ok(offset) = value.trim_start_matches('+').parse::<i64>() {
            parsed.offset = offset.clamp(-MAX_OFFSET, MAX_OFFSET)
        },
        _ => {}
    }
}

/// Parse LRC text. Returns `None` when the text has no timed line at all.
pub fn parse(text: &str) -> Option<ParsedLrc> {
    let mut parsed = ParsedLrc::default();
    let mut timed: Vec<(f64, String)> = Vec::new();

    for raw in text.lines() {
        let mut rest = raw.trim();
        let mut times: Vec<f64> = Vec::new();

        while rest.starts_with('[') {
            let close = match rest.find(']') {
                Some(close) => close,
                None => break
            };
            let tag = &rest[1..close];

            if let Some(time) = parse_time_tag(tag) {
                times.push(time);
            } else if times.is_empty() {
                if let Some((key, value)) = tag.split_once(':') {
                    apply_id_tag(&mut parsed, key, value);
                }
            } else {
                break;
            }
            rest = &rest[close + 1..];
        }

        let content = rest.trim();
        for time in times {
            timed.push((time, content.to_string()));
        }
    }

    if timed.is_empty() { return None; }

    // Stable, so bilingual pairs keep their order.
    timed.sort_by(|a, b| a.0.total_cmp(&b.0));

    for (position, content) in timed {
        if let Some(previous) = parsed.lines.last_mut() {
            let same_time = (previous.position - position).abs() < 1e-6;
            if same_time && previous.translation.is_none() && !previous.content.is_empty() && !content.is_empty() {
                previous.translation = Some(content);
                continue;
            }
        }
        parsed.lines.push(LyricsLine::new(position, content));
    }

    Some(parsed)
}

/// Attach a separately delivered translation to lines that share its timestamps.
pub fn merge_translation(lines: &mut [LyricsLine], translation: &str) {
    let translated = match parse(translation) {
        Some(translated) => translated,
        None => return
    };

    for source in translated.lines.into_iter().filter(|line| !line.content.is_empty()) {
        if let Some(line) = lines.iter_mut().find(
            |line| (line.position - source.position).abs() <= TRANSLATION_TOLERANCE
        ) {
            if !line.content.is_empty() {
                line.translation = Some(source.content);
            }
        }
    }
}

pub fn serialise(document: &LyricsDocument) -> String {
    let mut output = String::new();

    let tags = [
        ("ti", document.tags.title.as_deref()),
        ("ar", document.tags.artist.as_deref()),
        ("al", document.tags.album.as_deref()),
        ("by", document.tags.author.as_deref())
    ];
    for (key, value) in tags {
        if let Some(value) = value {
            output.push_str(&format!("[{key}:{value}]\n"));
        }
    }
    if let Some(length) = document.tags.length {
        output.push_str(&format!("[length:{}]\n", format_time(length)));
    }
    if document.offset != 0 {
        output.push_str(&format!("[offset:{}]\n", document.offset));
    }

    for line in &document.lines {
        let time = format_time(line.position);
        output.push_str(&format!("[{time}]{}\n", line.content));
        if let Some(translation) = line.translation.as_ref() {
            output.push_str(&format!("[{time}]{translation}\n"));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::document::LyricsSource;

    #[test]
    fn time_tags_in_common_shapes() {
        assert_eq!(parse_time_tag("01:02.50"), Some(62.5));
        assert_eq!(parse_time_tag("00:10"), Some(10.0));
        assert_eq!(parse_time_tag("00:10:25"), Some(10.25));
        assert_eq!(parse_time_tag("02:00.125"), Some(120.125));
        assert_eq!(parse_time_tag("ar:Queen"), None);
        assert_eq!(parse_time_tag("-1:00"), None);
        assert_eq!(parse_time_tag("00:"), None);
    }

    #[test]
    fn format_time_keeps_milliseconds() {
        assert_eq!(format_time(62.5), "01:02.500");
        assert_eq!(format_time(59.999), "00:59.999");
        assert_eq!(format_time(59.9996), "01:00.000");
        assert_eq!(format_time(0.0), "00:00.000");
    }

    #[test]
    fn oversized_offset_is_clamped() {
        let parsed = parse("[offset:9223372036854775807]\n[00:01.00]x\n").unwrap();
        assert_eq!(parsed.offset, MAX_OFFSET);

        let parsed = parse("[offset:-99999999]\n[00:01.00]x\n").unwrap();
        assert_eq!(parsed.offset, -MAX_OFFSET);
    }

    #[test]
    fn close_millisecond_lines_stay_apart() {
        let document = LyricsDocument::from_lrc(
            "[00:01.001]first\n[00:01.004]second\n", LyricsSource::Import
        ).unwrap();

        let parsed = parse(&serialise(&document)).unwrap();
        assert_eq!(parsed.lines.len(), 2);
        assert!(parsed.lines[0].translation.is_none());
        assert_eq!(parsed.lines[1].content, "second");
    }

    #[test]
    fn parses_tags_offset_and_repeated_time_tags() {
        let text = "[ti:Song]\n[ar:Artist]\n[offset:+250]\n[00:05.00][00:20.00]Chorus\n[00:10.00]Verse\n";
        let parsed = parse(text).unwrap();

        assert_eq!(parsed.tags.title.as_deref(), Some("Song"));
        assert_eq!(parsed.tags.artist.as_deref(), Some("Artist"));
        assert_eq!(parsed.offset, 250);

        let positions: Vec<f64> = parsed.lines.iter().map(|line| line.position).collect();
        assert_eq!(positions, vec![5.0, 10.0, 20.0]);
        assert_eq!(parsed.lines[2].content, "Chorus");
    }

    #[test]
    fn same_timestamp_becomes_translation() {
        let parsed = parse("[00:01.00]こんにちは\n[00:01.00]Hello\n[00:02.00]\n").unwrap();
        assert_eq!(parsed.lines.len(), 2);
        assert_eq!(parsed.lines[0].translation.as_deref(), Some("Hello"));
        assert_eq!(parsed.lines[1].content, "");
    }

    #[test]
    fn text_without_time_tags_is_rejected() {
        assert_eq!(parse("just some words\nand more"), None);
        assert_eq!(parse("[ti:Only tags]"), None);
        assert_eq!(parse(""), None);
    }

    #[test]
    fn merges_translation_by_timestamp() {
        let mut lines = parse("[00:01.00]one\n[00:02.00]two\n").unwrap().lines;
        merge_translation(&mut lines, "[00:01.00]uno\n[00:02.005]dos\n[00:09.00]nueve\n");
        assert_eq!(lines[0].translation.as_deref(), Some("uno"));
        assert_eq!(lines[1].translation.as_deref(), Some("dos"));
    }

    #[test]
    fn serialised_document_parses_back() {
        let mut document = LyricsDocument::from_lrc(
            "[ar:Artist]\n[00:01.00]one\n[00:01.00]uno\n[00:02.50]two\n", LyricsSource::Import
        ).unwrap();
        document.offset = -300;

        let parsed = parse(&serialise(&document)).unwrap();
        assert_eq!(parsed.lines, document.lines);
        assert_eq!(parsed.offset, -300);
        assert_eq!(parsed.tags.artist.as_deref(), Some("Artist"));
    }
}
