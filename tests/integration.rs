//! Integration tests: parse real-looking export files end to end.

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use kakaopack::core::{FilterConfig, apply_filters, to_csv};
use kakaopack::format::{OutputFormat, write_to_format};
use kakaopack::prelude::*;
use kakaopack::table::ParseSource;
use std::fs;
use tempfile::{TempDir, tempdir};

// ============================================================================
// Fixtures
// ============================================================================

/// Mobile export: date headers followed by `오전/오후 H:MM, author : text`.
const MOBILE_EXPORT: &str = "\
철수 님과 카카오톡 대화
저장한 날짜 : 2024-01-22 09:12

--------------- 2024년 1월 20일 토요일 ---------------
오후 4:25, 철수 : 안녕
오후 4:26, 영희 : ㅇㅇ
오후 4:40, 철수 : 저녁 뭐 먹을래?
오후 11:59, 영희 : 자러 간다
--------------- 2024년 1월 21일 일요일 ---------------
오전 12:00, 철수 : 벌써 자정
오전 9:05, 영희 : 좋은 아침
오전 11:30, 철수 : 점심 먹자
오후 12:00, 영희 : 좋아
오후 12:15, 철수 : 국밥 어때
오후 1:00, 영희 : 배부르다
";

/// Desktop export: `[author] [time] text`.
const PC_EXPORT: &str = "\
2024년 1월 20일 토요일
[철수] [오후 4:25] 안녕
[영희] [오후 4:26] ㅇㅇ
[철수] [오후 4:27] 링크 보냄 https://example.com/a:b
";

/// Every line carries its own date.
const FULL_DATETIME_EXPORT: &str = "\
2024년 1월 20일 오후 4:25, 철수 : 안녕
2024년 1월 20일 오후 4:26, 영희 : ㅇㅇ
2024. 1. 21. 오전 9:00, 철수 : 좋은 아침
";

fn lenient() -> KakaoParser {
    KakaoParser::with_config(ParserConfig::new().with_min_line_rows(1))
}

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

fn write_fixture(dir: &TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, bytes).unwrap();
    path
}

// ============================================================================
// Line exports
// ============================================================================

#[test]
fn test_mobile_export() {
    let dir = tempdir().unwrap();
    let path = write_fixture(&dir, "KakaoTalk_Chat.txt", MOBILE_EXPORT.as_bytes());

    let table = KakaoParser::new().parse_file(&path).unwrap();
    assert_eq!(table.len(), 10);
    assert_eq!(table.report().source, ParseSource::Lines);
    assert_eq!(table.report().date_headers, 2);
    assert_eq!(table.report().sentinel_count, 0);

    let msgs = table.messages();
    assert_eq!(msgs[0].timestamp, at(2024, 1, 20, 16, 25));
    assert_eq!(msgs[3].timestamp, at(2024, 1, 20, 23, 59));
    // 오전 12:00 is midnight, 오후 12:00 is noon.
    assert_eq!(msgs[4].timestamp, at(2024, 1, 21, 0, 0));
    assert_eq!(msgs[7].timestamp, at(2024, 1, 21, 12, 0));
    assert_eq!(msgs[9].author, "영희");
    assert_eq!(msgs[9].text, "배부르다");
}

#[test]
fn test_pc_export() {
    let table = lenient().parse_str(PC_EXPORT).unwrap();
    assert_eq!(table.len(), 3);
    assert_eq!(table.messages()[0].author, "철수");
    assert_eq!(table.messages()[1].timestamp.hour(), 16);
    assert_eq!(table.messages()[2].text, "링크 보냄 https://example.com/a:b");
}

#[test]
fn test_full_datetime_export() {
    let table = lenient().parse_str(FULL_DATETIME_EXPORT).unwrap();
    assert_eq!(table.len(), 3);
    assert_eq!(table.messages()[2].timestamp, at(2024, 1, 21, 9, 0));
    assert_eq!(table.report().defaulted_date_count, 0);
}

#[test]
fn test_output_is_sorted_even_when_input_is_not() {
    let export = "\
2024년 1월 21일 오전 9:00, 철수 : 둘째
2024년 1월 20일 오후 4:25, 영희 : 첫째
";
    let table = lenient().parse_str(export).unwrap();
    assert_eq!(table.messages()[0].text, "첫째");
    assert!(table.iter().is_sorted_by_key(|m| m.timestamp));
}

#[test]
fn test_euc_kr_file() {
    let (bytes, _, _) = encoding_rs::EUC_KR.encode(MOBILE_EXPORT);
    let dir = tempdir().unwrap();
    let path = write_fixture(&dir, "legacy.txt", &bytes);

    let table = KakaoParser::new().parse_file(&path).unwrap();
    assert_eq!(table.len(), 10);
    assert_eq!(table.report().encoding, "EUC-KR");
    assert!(!table.report().lossy);
    assert_eq!(table.messages()[1].text, "ㅇㅇ");
}

// ============================================================================
// Tabular exports
// ============================================================================

#[test]
fn test_korean_csv_export() {
    let csv = "날짜,사용자,메시지\n\
               2024-01-20 16:25:00,철수,안녕\n\
               2024-01-20 16:26:00,영희,\"쉼표, 포함\"\n";
    let table = KakaoParser::new().parse_str(csv).unwrap();

    assert_eq!(table.report().source, ParseSource::Tabular);
    assert_eq!(table.len(), 2);
    assert_eq!(table.messages()[1].text, "쉼표, 포함");
    assert_eq!(table.messages()[1].timestamp, at(2024, 1, 20, 16, 26));
}

#[test]
fn test_english_tsv_export() {
    let tsv = "Date\tUser\tMessage\n2024.01.20 16:25\tAlice\tHi\n2024.01.20 16:26\tBob\tHey\n";
    let table = KakaoParser::new().parse_str(tsv).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.messages()[0].author, "Alice");
}

#[test]
fn test_table_without_required_columns() {
    let csv = "when,who,what\n2024-01-20,a,b\n";
    let err = KakaoParser::new().parse_str(csv).unwrap_err();
    assert!(err.is_missing_columns());
}

#[test]
fn test_unrecognizable_input() {
    let err = KakaoParser::new()
        .parse_str("just some notes\nnothing to see here\n")
        .unwrap_err();
    assert!(err.is_unsupported_format());
}

// ============================================================================
// Downstream: filter, stats, output
// ============================================================================

#[test]
fn test_filter_and_stats_pipeline() {
    let table = KakaoParser::new().parse_str(MOBILE_EXPORT).unwrap();

    let lunch = apply_filters(
        table.clone(),
        &FilterConfig::new()
            .with_date_from("2024-01-21")
            .unwrap()
            .with_keywords_csv("점심,국밥"),
    );
    assert_eq!(lunch.len(), 2);

    let stats = ChatStats::compute(&table);
    assert_eq!(stats.total_messages, 10);
    assert_eq!(stats.users[0].message_count, 5);
    assert_eq!(stats.time.monthly.get("2024-01"), Some(&10));
    assert!(stats.threads.len() >= 3);
}

#[test]
fn test_write_every_format() {
    let table = KakaoParser::new().parse_str(MOBILE_EXPORT).unwrap();
    let dir = tempdir().unwrap();

    for format in OutputFormat::all() {
        let path = dir.path().join(format!("out.{}", format.extension()));
        write_to_format(&table, &path, *format, &OutputConfig::new()).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("좋은 아침"), "{format} output misses a message");
    }

    let jsonl = fs::read_to_string(dir.path().join("out.jsonl")).unwrap();
    assert_eq!(jsonl.lines().count(), 10);
    let first: serde_json::Value = serde_json::from_str(jsonl.lines().next().unwrap()).unwrap();
    assert_eq!(first["author"], "철수");
    assert_eq!(first["timestamp"], "2024-01-20T16:25:00");
}

#[test]
fn test_csv_with_bom_and_length() {
    let table = lenient().parse_str(PC_EXPORT).unwrap();
    let csv = to_csv(&table, &OutputConfig::new().with_bom().with_length()).unwrap();
    assert!(csv.starts_with('\u{feff}'));
    assert!(csv.contains("timestamp,author,text,length"));
    assert!(csv.contains(",안녕,2"));
}

#[test]
fn test_csv_output_reparses_as_table() {
    let table = KakaoParser::new().parse_str(MOBILE_EXPORT).unwrap();
    let csv = to_csv(&table, &OutputConfig::new()).unwrap();

    // Written headers are not the import aliases, so rename them.
    let renamed = csv.replacen("timestamp,author,text", "Date,User,Message", 1);
    let reparsed = KakaoParser::new().parse_str(&renamed).unwrap();
    assert_eq!(reparsed.report().source, ParseSource::Tabular);
    assert_eq!(reparsed.messages(), table.messages());
}
