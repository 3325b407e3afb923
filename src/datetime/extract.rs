//! Finding a date and a time in a spoken sentence

use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};

const ARTICLES: [&str; 3] = ["a", "an", "the"];
/// Words that belong to a date when they come right before it ("on friday")
const DATE_CONNECTORS: [&str; 2] = ["on", "for"];
/// Words that belong to a time when they come right before it ("at 3pm", "in the morning")
const TIME_CONNECTORS: [&str; 4] = ["at", "in", "this", "by"];

/// The result of a successful extraction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Extraction {
    /// The date and time that was found. A date without a time is at midnight
    pub when: NaiveDateTime,
    /// The normalized sentence, without the words that made the date
    pub remainder: String,
    /// The original sentence, without the words that made the date
    pub stripped: String,
}

impl Extraction {
    pub fn has_time(&self) -> bool {
        has_time(&self.when)
    }
}

/// Whether a date-time carries an actual time. Midnight means "the whole day"
pub fn has_time(when: &NaiveDateTime) -> bool {
    when.time() != NaiveTime::MIN
}

struct Token {
    raw: String,
    norm: String,
}

impl Token {
    fn is_article(&self) -> bool {
        ARTICLES.contains(&self.norm.as_str())
    }
}

fn tokenize(text: &str) -> Vec<Token> {
    text.split_whitespace()
        .map(|raw| Token { raw: raw.to_string(), norm: normalize_word(raw) })
        .filter(|token| token.norm.is_empty() == false)
        .collect()
}

fn normalize_word(word: &str) -> String {
    let lower = word.to_lowercase();
    let cleaned: String = lower.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ':' | '\'' | '-'))
        .collect();
    let cleaned = cleaned.trim_matches(|c| matches!(c, ':' | '\'' | '-'));
    match number_word(cleaned) {
        Some(digits) => digits.to_string(),
        None => cleaned.to_string(),
    }
}

fn number_word(word: &str) -> Option<&'static str> {
    let digits = match word {
        "zero" => "0", "one" => "1", "two" => "2", "three" => "3", "four" => "4",
        "five" => "5", "six" => "6", "seven" => "7", "eight" => "8", "nine" => "9",
        "ten" => "10", "eleven" => "11", "twelve" => "12", "thirteen" => "13",
        "fourteen" => "14", "fifteen" => "15", "sixteen" => "16", "seventeen" => "17",
        "eighteen" => "18", "nineteen" => "19", "twenty" => "20", "thirty" => "30",
        "forty" => "40", "fifty" => "50",
        "first" => "1st", "second" => "2nd", "third" => "3rd", "fourth" => "4th",
        "fifth" => "5th", "sixth" => "6th", "seventh" => "7th", "eighth" => "8th",
        "ninth" => "9th", "tenth" => "10th", "eleventh" => "11th", "twelfth" => "12th",
        "thirteenth" => "13th", "fourteenth" => "14th", "fifteenth" => "15th",
        "sixteenth" => "16th", "seventeenth" => "17th", "eighteenth" => "18th",
        "nineteenth" => "19th", "twentieth" => "20th", "thirtieth" => "30th",
        _ => return None,
    };
    Some(digits)
}

/// Lower-case the text, drop punctuation and articles, and spell numbers with digits
pub fn normalize(text: &str) -> String {
    tokenize(text)
        .iter()
        .filter(|token| token.is_article() == false)
        .map(|token| token.norm.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Look for a date and/or a time in `text`, relative to `anchor`.
///
/// Returns `None` when no word of the text describes a date or a time.
pub fn extract_datetime(text: &str, anchor: NaiveDateTime) -> Option<Extraction> {
    let tokens = tokenize(text);
    let kept: Vec<usize> = (0..tokens.len()).filter(|&t| tokens[t].is_article() == false).collect();
    let words: Vec<&str> = kept.iter().map(|&t| tokens[t].norm.as_str()).collect();
    let mut consumed = vec![false; words.len()];

    let mut date: Option<DateMatch> = None;
    let mut time: Option<TimeMatch> = None;

    let mut i = 0;
    while i < words.len() {
        if date.is_none() {
            if let Some(m) = match_date(&words, i, anchor) {
                consume(&words, &mut consumed, i, m.len, &DATE_CONNECTORS);
                i += m.len;
                date = Some(m);
                continue;
            }
        }
        if time.is_none() {
            if let Some(m) = match_time(&words, i) {
                consume(&words, &mut consumed, i, m.len, &TIME_CONNECTORS);
                i += m.len;
                time = Some(m);
                continue;
            }
        }
        i += 1;
    }

    if date.is_none() && time.is_none() {
        return None;
    }

    let day = date.as_ref().map(|d| d.date).unwrap_or_else(|| anchor.date());
    let evening = date.as_ref().map(|d| d.evening).unwrap_or(false);
    let clock = match (&time, &date) {
        (Some(t), _) => {
            if t.ambiguous && evening && t.time.hour() < 12 {
                t.time + Duration::hours(12)
            } else {
                t.time
            }
        },
        (None, Some(d)) => d.time.unwrap_or(NaiveTime::MIN),
        (None, None) => NaiveTime::MIN,
    };

    let remainder = words.iter()
        .zip(&consumed)
        .filter(|&(_, &used)| used == false)
        .map(|(word, _)| *word)
        .collect::<Vec<_>>()
        .join(" ");

    // Map back to the original tokens. An article goes away with the word it introduces
    let mut token_consumed = vec![false; tokens.len()];
    for (k, &t) in kept.iter().enumerate() {
        token_consumed[t] = consumed[k];
    }
    for t in (0..tokens.len()).rev() {
        if tokens[t].is_article() && t + 1 < tokens.len() && token_consumed[t + 1] {
            token_consumed[t] = true;
        }
    }
    let stripped = tokens.iter()
        .zip(&token_consumed)
        .filter(|&(_, &used)| used == false)
        .map(|(token, _)| token.raw.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    Some(Extraction { when: day.and_time(clock), remainder, stripped })
}

/// Resolve the day a query is about. Without any date in the text, this is the anchor's day
pub fn resolve_day(text: &str, anchor: NaiveDateTime) -> NaiveDate {
    match extract_datetime(text, anchor) {
        Some(extraction) => extraction.when.date(),
        None => {
            log::info!("No date found in {:?}, defaulting to today", text);
            anchor.date()
        },
    }
}

fn consume(words: &[&str], consumed: &mut [bool], start: usize, len: usize, connectors: &[&str]) {
    for used in consumed.iter_mut().skip(start).take(len) {
        *used = true;
    }
    if start > 0 && consumed[start - 1] == false && connectors.contains(&words[start - 1]) {
        consumed[start - 1] = true;
    }
}


struct DateMatch {
    date: NaiveDate,
    /// A time implied by the date words themselves ("tonight", "in 2 hours")
    time: Option<NaiveTime>,
    /// Whether a bare hour should be read in the evening ("tonight at 8")
    evening: bool,
    len: usize,
}

impl DateMatch {
    fn day(date: NaiveDate, len: usize) -> Self {
        Self { date, time: None, evening: false, len }
    }
}

fn match_date(words: &[&str], i: usize, anchor: NaiveDateTime) -> Option<DateMatch> {
    let today = anchor.date();
    let word = words[i];
    let next = words.get(i + 1).copied();

    if words[i..].starts_with(&["day", "after", "tomorrow"]) {
        return Some(DateMatch::day(today + Duration::days(2), 3));
    }

    match word {
        "today" => return Some(DateMatch::day(today, 1)),
        "tomorrow" => return Some(DateMatch::day(today + Duration::days(1), 1)),
        "yesterday" => return Some(DateMatch::day(today - Duration::days(1), 1)),
        "tonight" => return Some(DateMatch { date: today, time: NaiveTime::from_hms_opt(22, 0, 0), evening: true, len: 1 }),
        "now" => return Some(DateMatch { date: today, time: Some(anchor.time()), evening: false, len: 1 }),
        _ => {},
    }

    if let Some(target) = weekday(word) {
        let ahead = days_until(today, target);
        return Some(DateMatch::day(today + Duration::days(ahead), 1));
    }

    if let Some(next) = next {
        match (word, weekday(next)) {
            ("this", Some(target)) | ("coming", Some(target)) => {
                return Some(DateMatch::day(today + Duration::days(days_until(today, target)), 2));
            },
            ("next", Some(target)) => {
                let ahead = match days_until(today, target) {
                    0 => 7,
                    n => n,
                };
                return Some(DateMatch::day(today + Duration::days(ahead), 2));
            },
            ("last", Some(target)) => {
                let back = match (7 - days_until(today, target)) % 7 {
                    0 => 7,
                    n => n,
                };
                return Some(DateMatch::day(today - Duration::days(back), 2));
            },
            _ => {},
        }

        if word == "next" {
            let date = match next {
                "week" => Some(today + Duration::days(7)),
                "month" => today.checked_add_months(Months::new(1)),
                "year" => today.checked_add_months(Months::new(12)),
                _ => None,
            };
            if let Some(date) = date {
                return Some(DateMatch::day(date, 2));
            }
        }
    }

    if word == "in" {
        if let Some(m) = match_in_duration(words, i, anchor) {
            return Some(m);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(word, "%Y-%m-%d") {
        return Some(DateMatch::day(date, 1));
    }

    match_calendar_date(words, i, today)
}

/// "in 3 days", "in two weeks", "in an hour"
fn match_in_duration(words: &[&str], i: usize, anchor: NaiveDateTime) -> Option<DateMatch> {
    let (amount, unit, len) = match words.get(i + 1).and_then(|w| w.parse::<u32>().ok()) {
        Some(amount) => (amount, *words.get(i + 2)?, 3),
        // The article was dropped: "in an hour"
        None => (1, *words.get(i + 1)?, 2),
    };

    let today = anchor.date();
    let date = match unit {
        "day" | "days" => today.checked_add_signed(Duration::days(amount as i64))?,
        "week" | "weeks" => today.checked_add_signed(Duration::days(7 * amount as i64))?,
        "month" | "months" => today.checked_add_months(Months::new(amount))?,
        "year" | "years" => today.checked_add_months(Months::new(amount.checked_mul(12)?))?,
        "hour" | "hours" | "minute" | "minutes" => {
            let delta = if unit.starts_with("hour") {
                Duration::hours(amount as i64)
            } else {
                Duration::minutes(amount as i64)
            };
            let moment = anchor.checked_add_signed(delta)?;
            return Some(DateMatch { date: moment.date(), time: Some(moment.time()), evening: false, len });
        },
        _ => return None,
    };
    Some(DateMatch::day(date, len))
}

/// "march 5", "march 5th 2027", "5th of march", "5 march", or a bare "5th"
fn match_calendar_date(words: &[&str], i: usize, today: NaiveDate) -> Option<DateMatch> {
    let word = words[i];

    if let Some(month) = month_number(word) {
        let day = words.get(i + 1).and_then(|w| day_of_month(w))?;
        let year = words.get(i + 2).and_then(|w| parse_year(w));
        let len = if year.is_some() { 3 } else { 2 };
        let date = build_date(today, year, month, day)?;
        return Some(DateMatch::day(date, len));
    }

    let day = day_of_month(word)?;
    let mut j = i + 1;
    if words.get(j) == Some(&"of") {
        j += 1;
    }
    if let Some(month) = words.get(j).and_then(|w| month_number(w)) {
        let year = words.get(j + 1).and_then(|w| parse_year(w));
        let len = j + 1 - i + if year.is_some() { 1 } else { 0 };
        let date = build_date(today, year, month, day)?;
        return Some(DateMatch::day(date, len));
    }

    // A bare number is too ambiguous, only ordinals introduced by "on" make a day of the current month ("on the 5th")
    if word.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if i == 0 || DATE_CONNECTORS.contains(&words[i - 1]) == false {
        return None;
    }
    let mut date = NaiveDate::from_ymd_opt(today.year(), today.month(), day)?;
    if date < today {
        date = date.checked_add_months(Months::new(1))?;
    }
    Some(DateMatch::day(date, 1))
}

/// Dates without a year are in the future
fn build_date(today: NaiveDate, year: Option<i32>, month: u32, day: u32) -> Option<NaiveDate> {
    match year {
        Some(year) => NaiveDate::from_ymd_opt(year, month, day),
        None => {
            let date = NaiveDate::from_ymd_opt(today.year(), month, day)?;
            if date < today {
                NaiveDate::from_ymd_opt(today.year() + 1, month, day)
            } else {
                Some(date)
            }
        },
    }
}

fn days_until(from: NaiveDate, target: Weekday) -> i64 {
    let from = from.weekday().num_days_from_monday() as i64;
    let target = target.num_days_from_monday() as i64;
    (7 + target - from) % 7
}

fn weekday(word: &str) -> Option<Weekday> {
    match word {
        "monday" | "mondays" => Some(Weekday::Mon),
        "tuesday" | "tuesdays" => Some(Weekday::Tue),
        "wednesday" | "wednesdays" => Some(Weekday::Wed),
        "thursday" | "thursdays" => Some(Weekday::Thu),
        "friday" | "fridays" => Some(Weekday::Fri),
        "saturday" | "saturdays" => Some(Weekday::Sat),
        "sunday" | "sundays" => Some(Weekday::Sun),
        _ => None,
    }
}

fn month_number(word: &str) -> Option<u32> {
    let month = match word {
        "january" | "jan" => 1,
        "february" | "feb" => 2,
        "march" | "mar" => 3,
        "april" | "apr" => 4,
        "may" => 5,
        "june" | "jun" => 6,
        "july" | "jul" => 7,
        "august" | "aug" => 8,
        "september" | "sep" | "sept" => 9,
        "october" | "oct" => 10,
        "november" | "nov" => 11,
        "december" | "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// "5", "5th", "1st", "22nd"
fn day_of_month(word: &str) -> Option<u32> {
    let digits = ["st", "nd", "rd", "th"].iter()
        .find_map(|suffix| word.strip_suffix(suffix))
        .unwrap_or(word);
    let day: u32 = digits.parse().ok()?;
    if (1..=31).contains(&day) { Some(day) } else { None }
}

fn parse_year(word: &str) -> Option<i32> {
    if word.len() != 4 {
        return None;
    }
    word.parse().ok().filter(|y| (1900..=2999).contains(y))
}


struct TimeMatch {
    time: NaiveTime,
    /// An hour said without am/pm ("at 8"), that the surrounding words may move to the evening
    ambiguous: bool,
    len: usize,
}

#[derive(Clone, Copy, PartialEq)]
enum DayPart {
    Morning,
    Afternoon,
    Evening,
    Night,
}

fn day_part(word: &str) -> Option<DayPart> {
    match word {
        "morning" => Some(DayPart::Morning),
        "afternoon" => Some(DayPart::Afternoon),
        "evening" => Some(DayPart::Evening),
        "night" => Some(DayPart::Night),
        _ => None,
    }
}

impl DayPart {
    fn default_time(self) -> NaiveTime {
        let hour = match self {
            DayPart::Morning => 8,
            DayPart::Afternoon => 15,
            DayPart::Evening => 19,
            DayPart::Night => 22,
        };
        NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN)
    }
}

fn match_time(words: &[&str], i: usize) -> Option<TimeMatch> {
    let word = words[i];

    match word {
        "noon" | "midday" => return Some(TimeMatch { time: NaiveTime::from_hms_opt(12, 0, 0)?, ambiguous: false, len: 1 }),
        "midnight" => return Some(TimeMatch { time: NaiveTime::MIN, ambiguous: false, len: 1 }),
        _ => {},
    }
    if let Some(part) = day_part(word) {
        return Some(TimeMatch { time: part.default_time(), ambiguous: false, len: 1 });
    }

    let (hour, minute, len, meridiem) = match_clock(words, i)?;

    let mut m = if let Some(pm) = meridiem {
        if !(1..=12).contains(&hour) {
            return None;
        }
        let hour = match (hour, pm) {
            (12, false) => 0,
            (12, true) => 12,
            (h, true) => h + 12,
            (h, false) => h,
        };
        TimeMatch { time: NaiveTime::from_hms_opt(hour, minute, 0)?, ambiguous: false, len }
    } else {
        TimeMatch { time: NaiveTime::from_hms_opt(hour, minute, 0)?, ambiguous: (1..=12).contains(&hour), len }
    };

    // "3 in the afternoon", "8 tonight" is handled by the date, "9 at night"
    let mut j = i + m.len;
    if words.get(j).map(|w| TIME_CONNECTORS.contains(w)).unwrap_or(false) && words.get(j + 1).and_then(|w| day_part(w)).is_some() {
        j += 1;
    }
    if let Some(part) = words.get(j).and_then(|w| day_part(w)) {
        m.len = j + 1 - i;
        if m.ambiguous {
            let hour = m.time.hour();
            m.time = match part {
                DayPart::Morning if hour == 12 => m.time - Duration::hours(12),
                DayPart::Afternoon | DayPart::Evening | DayPart::Night if hour < 12 => m.time + Duration::hours(12),
                _ => m.time,
            };
            m.ambiguous = false;
        }
        return Some(m);
    }

    // Nobody sets an appointment at 3 in the night
    if m.ambiguous && (1..=7).contains(&m.time.hour()) {
        m.time = m.time + Duration::hours(12);
    }
    Some(m)
}

/// Returns `(hour, minute, words used, Some(is_pm))`
fn match_clock(words: &[&str], i: usize) -> Option<(u32, u32, usize, Option<bool>)> {
    let word = words[i];

    for (suffix, pm) in [("am", false), ("pm", true)] {
        if let Some(digits) = word.strip_suffix(suffix) {
            let (h, m) = hour_minute(digits)?;
            return Some((h, m, 1, Some(pm)));
        }
    }

    let (h, m) = hour_minute(word)?;
    match words.get(i + 1).copied() {
        Some("am") => return Some((h, m, 2, Some(false))),
        Some("pm") => return Some((h, m, 2, Some(true))),
        Some("o'clock") | Some("oclock") => return Some((h, m, 2, None)),
        _ => {},
    }

    // "15:00" stands for itself, a bare "3" needs to be introduced by "at"
    if word.contains(':') || (i > 0 && words[i - 1] == "at") {
        return Some((h, m, 1, None));
    }
    None
}

fn hour_minute(s: &str) -> Option<(u32, u32)> {
    let (h, m) = match s.split_once(':') {
        Some((h, m)) => (h.parse::<u32>().ok()?, m.parse::<u32>().ok()?),
        None => (s.parse::<u32>().ok()?, 0),
    };
    if h > 23 || m > 59 {
        return None;
    }
    Some((h, m))
}
