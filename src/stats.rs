//! Aggregate statistics over a [`ChatTable`].
//!
//! All aggregates are computed from the table alone; nothing is cached.
//!
//! # Example
//!
//! ```rust
//! use kakaopack::parser::KakaoParser;
//! use kakaopack::stats::ChatStats;
//!
//! let export = "2024년 1월 20일 토요일\n오후 4:25, 철수 : 안녕\n오후 4:26, 영희 : ㅇㅇ\n";
//! let table = KakaoParser::new().parse_str(export)?;
//! let stats = ChatStats::compute(&table);
//!
//! assert_eq!(stats.total_messages, 2);
//! assert_eq!(stats.threads.len(), 1);
//! assert_eq!(stats.time.hourly[16], 2);
//! # Ok::<(), kakaopack::KakaopackError>(())
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use chrono::{Datelike, NaiveDateTime, TimeDelta, Timelike};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::table::ChatTable;

/// Silence longer than this starts a new conversation thread.
pub const DEFAULT_THREAD_GAP_MINUTES: i64 = 30;

/// A reply must follow the previous message within this many seconds.
pub const RESPONSE_WINDOW_SECONDS: i64 = 3600;

/// Shortest keyword counted, in characters.
pub const DEFAULT_KEYWORD_MIN_LENGTH: usize = 2;

/// Keywords kept in [`ChatStats::keywords`].
pub const DEFAULT_TOP_KEYWORDS: usize = 20;

/// Particles, copulas and filler never counted as keywords.
pub const STOPWORDS: &[&str] = &[
    "이", "그", "저", "것", "들", "은", "는", "가", "을", "를", "에", "의", "와", "과", "도",
    "만", "부터", "까지", "로", "으로", "에서", "한테", "께", "한테서", "께서", "이다",
    "아니다", "있다", "없다", "되다", "하다", "좋다", "나쁘다", "크다", "작다",
];

static HANGUL_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[가-힣]+").expect("valid regex"));

static MENTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@(\S+)").expect("valid regex"));

static HASHTAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#(\S+)").expect("valid regex"));

/// Weekday labels, Monday first.
pub const WEEKDAY_NAMES: [&str; 7] = ["월", "화", "수", "목", "금", "토", "일"];

/// Per-author activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStat {
    /// Author display name.
    pub author: String,
    /// Messages sent.
    pub message_count: usize,
    /// Mean message length in characters.
    pub avg_length: f64,
    /// Timestamp of the first message.
    pub first_seen: NaiveDateTime,
    /// Timestamp of the last message.
    pub last_seen: NaiveDateTime,
    /// Hour of day with the most messages (earliest hour on ties).
    pub peak_hour: u32,
}

/// Message counts bucketed by time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeStats {
    /// Messages per hour of day, index 0 = 00:00-00:59.
    pub hourly: [usize; 24],
    /// Messages per weekday, index 0 = Monday.
    pub weekday: [usize; 7],
    /// Messages per calendar month, keyed `YYYY-MM`.
    pub monthly: BTreeMap<String, usize>,
}

impl TimeStats {
    /// Hour with the most messages, or `None` for an empty table.
    pub fn busiest_hour(&self) -> Option<u32> {
        peak_index(&self.hourly).map(|i| i as u32)
    }

    /// Weekday label with the most messages.
    pub fn busiest_weekday(&self) -> Option<&'static str> {
        peak_index(&self.weekday).map(|i| WEEKDAY_NAMES[i])
    }
}

/// A run of messages with no gap longer than the threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationThread {
    /// 1-based thread number in time order.
    pub id: usize,
    /// First message timestamp.
    pub start: NaiveDateTime,
    /// Last message timestamp.
    pub end: NaiveDateTime,
    /// Messages in the thread.
    pub message_count: usize,
    /// Authors in order of first appearance.
    pub participants: Vec<String>,
    /// Text of the opening message.
    pub first_message: String,
}

impl ConversationThread {
    /// Span between first and last message, in minutes.
    pub fn duration_minutes(&self) -> f64 {
        (self.end - self.start).num_seconds() as f64 / 60.0
    }
}

/// Replies from one author to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponsePair {
    /// Author of the message replied to.
    pub from: String,
    /// Author of the reply.
    pub to: String,
    /// Replies counted.
    pub count: usize,
    /// Mean reply delay in seconds.
    pub avg_seconds: f64,
}

/// How quickly authors answer each other.
///
/// A reply is a message whose author differs from the previous message's
/// author and that follows it within [`RESPONSE_WINDOW_SECONDS`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseStats {
    /// Replies counted.
    pub total_responses: usize,
    /// Mean reply delay in seconds, 0 without replies.
    pub avg_response_seconds: f64,
    /// Per author pair, most replies first.
    pub pairs: Vec<ResponsePair>,
}

/// A Hangul word and how often it occurs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordCount {
    pub word: String,
    pub count: usize,
}

/// All aggregates for one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatStats {
    /// Number of messages.
    pub total_messages: usize,
    /// First and last timestamps.
    pub date_range: Option<(NaiveDateTime, NaiveDateTime)>,
    /// Per-author statistics, busiest first.
    pub users: Vec<UserStat>,
    /// Time buckets.
    pub time: TimeStats,
    /// Conversation threads with the default gap.
    pub threads: Vec<ConversationThread>,
    /// Reply timing between authors.
    pub responses: ResponseStats,
    /// Most frequent Hangul words.
    pub keywords: Vec<KeywordCount>,
    /// `@name` mentions and their counts.
    pub mentions: BTreeMap<String, usize>,
    /// `#tag` hashtags and their counts.
    pub hashtags: BTreeMap<String, usize>,
}

impl ChatStats {
    /// Computes every aggregate using the default thread gap.
    pub fn compute(table: &ChatTable) -> Self {
        Self::compute_with_gap(table, TimeDelta::minutes(DEFAULT_THREAD_GAP_MINUTES))
    }

    /// Computes every aggregate using a custom thread gap.
    pub fn compute_with_gap(table: &ChatTable, gap: TimeDelta) -> Self {
        Self {
            total_messages: table.len(),
            date_range: table.date_range(),
            users: user_stats(table),
            time: time_stats(table),
            threads: conversation_threads(table, gap),
            responses: response_stats(table),
            keywords: keyword_frequency(table, DEFAULT_KEYWORD_MIN_LENGTH, DEFAULT_TOP_KEYWORDS),
            mentions: mentions(table),
            hashtags: hashtags(table),
        }
    }
}

#[derive(Default)]
struct UserAccumulator {
    count: usize,
    chars: usize,
    first: Option<NaiveDateTime>,
    last: Option<NaiveDateTime>,
    hours: [usize; 24],
}

/// Per-author statistics, sorted by message count (descending) then name.
pub fn user_stats(table: &ChatTable) -> Vec<UserStat> {
    let mut by_author: HashMap<&str, UserAccumulator> = HashMap::new();

    // The table is sorted, so the first timestamp seen is the minimum.
    for msg in table {
        let acc = by_author.entry(msg.author.as_str()).or_default();
        acc.count += 1;
        acc.chars += msg.length();
        acc.first.get_or_insert(msg.timestamp);
        acc.last = Some(msg.timestamp);
        acc.hours[msg.timestamp.hour() as usize] += 1;
    }

    let mut stats: Vec<UserStat> = by_author
        .into_iter()
        .filter_map(|(author, acc)| {
            Some(UserStat {
                author: author.to_string(),
                message_count: acc.count,
                avg_length: acc.chars as f64 / acc.count as f64,
                first_seen: acc.first?,
                last_seen: acc.last?,
                peak_hour: peak_index(&acc.hours).unwrap_or(0) as u32,
            })
        })
        .collect();

    stats.sort_by(|a, b| {
        b.message_count
            .cmp(&a.message_count)
            .then_with(|| a.author.cmp(&b.author))
    });
    stats
}

/// Hourly, weekday and monthly message counts.
pub fn time_stats(table: &ChatTable) -> TimeStats {
    table.iter().fold(TimeStats::default(), |mut stats, msg| {
        let ts = msg.timestamp;
        stats.hourly[ts.hour() as usize] += 1;
        stats.weekday[ts.weekday().num_days_from_monday() as usize] += 1;
        *stats
            .monthly
            .entry(ts.format("%Y-%m").to_string())
            .or_insert(0) += 1;
        stats
    })
}

/// Splits the table into threads wherever consecutive messages are more
/// than `gap` apart.
pub fn conversation_threads(table: &ChatTable, gap: TimeDelta) -> Vec<ConversationThread> {
    let mut threads: Vec<ConversationThread> = Vec::new();

    for msg in table {
        match threads.last_mut() {
            Some(thread) if msg.timestamp - thread.end <= gap => {
                thread.end = msg.timestamp;
                thread.message_count += 1;
                if !thread.participants.iter().any(|p| *p == msg.author) {
                    thread.participants.push(msg.author.clone());
                }
            }
            _ => threads.push(ConversationThread {
                id: threads.len() + 1,
                start: msg.timestamp,
                end: msg.timestamp,
                message_count: 1,
                participants: vec![msg.author.clone()],
                first_message: msg.text.clone(),
            }),
        }
    }

    threads
}

/// Reply counts and delays between consecutive messages of different authors.
pub fn response_stats(table: &ChatTable) -> ResponseStats {
    let window = TimeDelta::seconds(RESPONSE_WINDOW_SECONDS);
    let mut by_pair: BTreeMap<(&str, &str), (usize, i64)> = BTreeMap::new();

    for pair in table.messages().windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        let delay = next.timestamp - prev.timestamp;
        if prev.author == next.author || delay >= window {
            continue;
        }
        let entry = by_pair
            .entry((prev.author.as_str(), next.author.as_str()))
            .or_default();
        entry.0 += 1;
        entry.1 += delay.num_seconds();
    }

    let total_responses: usize = by_pair.values().map(|(count, _)| count).sum();
    let total_seconds: i64 = by_pair.values().map(|(_, seconds)| seconds).sum();

    let mut pairs: Vec<ResponsePair> = by_pair
        .into_iter()
        .map(|((from, to), (count, seconds))| ResponsePair {
            from: from.to_string(),
            to: to.to_string(),
            count,
            avg_seconds: seconds as f64 / count as f64,
        })
        .collect();
    // Stable: ties keep the (from, to) order of the map.
    pairs.sort_by(|a, b| b.count.cmp(&a.count));

    ResponseStats {
        total_responses,
        avg_response_seconds: if total_responses == 0 {
            0.0
        } else {
            total_seconds as f64 / total_responses as f64
        },
        pairs,
    }
}

/// The `top_n` most frequent Hangul words of at least `min_length`
/// characters, excluding [`STOPWORDS`]. Ties are ordered by word.
pub fn keyword_frequency(table: &ChatTable, min_length: usize, top_n: usize) -> Vec<KeywordCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for msg in table {
        for word in HANGUL_WORD.find_iter(&msg.text).map(|m| m.as_str()) {
            if word.chars().count() >= min_length && !STOPWORDS.contains(&word) {
                *counts.entry(word).or_insert(0) += 1;
            }
        }
    }

    let mut keywords: Vec<KeywordCount> = counts
        .into_iter()
        .map(|(word, count)| KeywordCount {
            word: word.to_string(),
            count,
        })
        .collect();
    keywords.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.word.cmp(&b.word)));
    keywords.truncate(top_n);
    keywords
}

/// Counts of `@name` mentions.
pub fn mentions(table: &ChatTable) -> BTreeMap<String, usize> {
    count_captures(table, &MENTION)
}

/// Counts of `#tag` hashtags.
pub fn hashtags(table: &ChatTable) -> BTreeMap<String, usize> {
    count_captures(table, &HASHTAG)
}

fn count_captures(table: &ChatTable, pattern: &Regex) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for msg in table {
        for caps in pattern.captures_iter(&msg.text) {
            *counts.entry(caps[1].to_string()).or_insert(0) += 1;
        }
    }
    counts
}

/// Index of the largest bucket, earliest on ties. `None` when all are zero.
fn peak_index(buckets: &[usize]) -> Option<usize> {
    let (index, &max) = buckets
        .iter()
        .enumerate()
        .rev()
        .max_by_key(|(_, count)| **count)?;
    (max > 0).then_some(index)
}
