//! Text cleanup shared by the fetchers: artist deny-lists, price heuristics
//! and the Japanese-to-English price-term translation.

use once_cell::sync::Lazy;
use regex::Regex;

/// Label lines that venues mix into artist listings. Compared lowercase,
/// after wrapper removal and trimming.
const BANNED_ARTISTS: &[&str] = &[
    "",
    "---",
    "…and more!!!",
    "and more!",
    "and more…",
    "and more・・・",
    "and more",
    "and more...",
    "guest act：",
    "guest dj",
    "guest",
    "w/",
    "live：",
    "live:",
    "live :",
    "live",
    "【guest band】",
    "［dj］",
    "[live]",
    "＜live＞",
    "＜dj＞",
    "[band]",
    "-band-",
    "[dj]",
    "-live-",
    "◉live◉",
    "【出演】",
    "＜出演＞",
    "〈出演〉",
    "他",
    "【ゲスト】",
    "【司会】",
    "【dj】",
    "【vj】",
    "【shop】",
    "転換dj",
    "◉転換dj◉",
    "【メインアクト】",
    "【support band】",
    "【support】",
    "act",
    "act:",
    "-act-",
    "◉act◉",
    "■live",
    "■dj",
    "■food",
    "■one man",
    "■act",
    "■guest",
    "■guest act",
    "■one man show",
    "■bar",
    "■vj",
    "■solo",
    "■host",
    "■shop",
    "dj",
    "dj:",
    "dj :",
    "-dj-",
    "◉dj◉",
    "host dj:",
    "host dj",
    "judge",
    "judge:",
    "-judge-",
    "mc",
    "mc:",
    "-mc-",
    "[selectas]",
    "[on stage]",
    "-selector-",
    "-mtr live-",
    "・料金",
    "料金",
    "ライブ情報",
    "＋1d",
    "+1d",
];

/// Substrings that mark a line as promo or venue boilerplate rather than an
/// artist name.
const BANNED_SUBSTRINGS: &[&str] = &[
    "http://",
    "https://",
    "コメント",
    "リリース",
    "album",
    "アルバム",
    "vol.",
    "food:",
    "【food】",
    "出演者",
    "and more.",
    "【最終】",
];

/// Embedded prices, clocks, date ranges and open/start labels. Lines
/// matching these are schedule furniture, not artists.
static BANNED_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?:(?:¥[\d,]+)|(?:[\d,]+円))",
        r"\d{2}:\d{2}",
        r"\d{2}：\d{2}",
        r"adv.*door",
        r"door.*adv",
        r"open.*start",
        r"start.*open",
        r"\d{2}[/. ]\s*\d{2}[/. ]",
        r"\d{2}[/. ]\s*\d{2}\s*\(.*\)",
        r"【第.弾】",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Known wrappers venues put around otherwise clean artist names.
const REMOVABLE_WRAPPERS: &[&str] = &[
    "＜ONE MAN＞",
    "■出演",
    "( GUEST ACT )",
    "GUEST DJ : ",
    "DJ：",
    "スペシャルゲスト：",
    "GUEST：",
    "【ゲスト】",
    "【LIVE】",
];

const BULLET_PREFIXES: &[&str] = &["●", "•", "・", "✰", "■"];

/// Cleans a raw artist list: strips known wrappers and bullets, then drops
/// boilerplate entries via the deny-lists.
pub fn process_artists<I>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut artists = Vec::new();
    'entries: for mut artist in raw {
        for wrapper in REMOVABLE_WRAPPERS {
            artist = artist.replace(wrapper, "");
        }
        let mut artist = artist.trim().to_string();
        let lower = artist.to_lowercase();
        if BANNED_ARTISTS.contains(&lower.as_str()) {
            continue;
        }
        for sub in BANNED_SUBSTRINGS {
            if lower.contains(sub) {
                continue 'entries;
            }
        }
        for re in BANNED_PATTERNS.iter() {
            if re.is_match(&lower) {
                continue 'entries;
            }
        }
        for prefix in BULLET_PREFIXES {
            if let Some(stripped) = artist.strip_prefix(prefix) {
                artist = stripped.to_string();
            }
        }
        artists.push(artist);
    }
    artists
}

static PRICE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r"[^\s]*\s?(?:(?:[¥￥][\d,]+)|(?:[\d,]+(?:円|(?:yen))))(?:(?:\s|\()*\+\d?(?:(?:D)|(?:ドリンク))(?:\))?)?",
    )
    .ok()
});

/// Scans unstructured detail fragments for something that looks like a price
/// (at most two amounts, typically adv/door), returning them joined.
pub fn find_price(fragments: &[String]) -> String {
    let re = match PRICE.as_ref() {
        Some(re) => re,
        None => return String::new(),
    };
    for s in fragments {
        let found: Vec<&str> = re.find_iter(s).take(2).map(|m| m.as_str()).collect();
        if !found.is_empty() {
            let mut joined = found.join("、");
            for prefix in BULLET_PREFIXES {
                if let Some(stripped) = joined.strip_prefix(prefix) {
                    joined = stripped.to_string();
                }
            }
            return joined;
        }
    }
    String::new()
}

/// Replacement table for common Japanese ticketing terms. Order matters:
/// longer phrases come before the fragments they contain.
const PRICE_TERMS: &[(&str, &str)] = &[
    ("前売り", "Reservation"),
    ("前売", "Reservation"),
    ("スタンディング", "Standing"),
    ("税込", "Incl. Tax"),
    ("税抜", "Excl. Tax"),
    ("当日", "Door"),
    ("一般前売", "Ordinary Reservation"),
    ("予約", "Reservation"),
    ("事前", "Reservation"),
    ("ドリンク別", "Drinks sold separately"),
    ("ドリンク", "Drink"),
    ("Sチケット", "S-Ticket"),
    ("高校生以下", "High School Students and Below"),
    ("高校生", "High School Students"),
    ("大学生・専門学生", "College Students"),
    ("一般", "Ordinary Ticket"),
    ("無料", "Free"),
    ("入場", "Entry"),
    ("イベント", "Event"),
    ("チケット", " Ticket"),
    ("学生", "Students"),
    ("女性", "Women"),
    ("男性", "Men"),
    ("込み", "Included"),
    ("無制限飲み放題", "Unlimited drinks"),
    ("飲み放題", "All-you-can-drink"),
    ("別途", "Separately"),
    ("2D別", "2 Drink purchases required"),
    ("1D別", "1 Drink purchase required"),
    ("D別", "Drinks sold separately"),
    ("別", "Separately"),
    ("未定", "TBA"),
    ("カメラ登録料", "Camera fee"),
    ("前方エリア", "Front area"),
    ("優先", "Priority entry"),
];

/// Translates the Japanese ticketing vocabulary in a price string, leaving
/// amounts and anything unrecognized as-is.
pub fn english_price(p: &str) -> String {
    let mut price = p.to_string();
    for (jp, en) in PRICE_TERMS {
        price = price.replace(jp, en);
    }
    price
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strs(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn boilerplate_lines_are_dropped() {
        let got = process_artists(strs(&[
            "【LIVE】BAND A",
            "LIVE:",
            "and more...",
            "OPEN 18:00 / START 19:00",
            "ADV ¥2,500 / DOOR ¥3,000",
            "・BAND B",
            "https://example.com/flyer.jpg",
        ]));
        assert_eq!(got, vec!["BAND A", "BAND B"]);
    }

    #[test]
    fn find_price_takes_first_two_amounts() {
        let fragments = strs(&[
            "BAND A / BAND B",
            "ADV ¥2,500 DOOR ¥3,000 (+1D)",
        ]);
        assert_eq!(find_price(&fragments), "ADV ¥2,500、DOOR ¥3,000 (+1D)");
        assert_eq!(find_price(&strs(&["no amounts"])), "");
    }

    #[test]
    fn price_terms_translate() {
        assert_eq!(
            english_price("前売 ¥2,500 / 当日 ¥3,000 (1D別)"),
            "Reservation ¥2,500 / Door ¥3,000 (1 Drink purchase required)"
        );
        assert_eq!(english_price("無料"), "Free");
    }
}
